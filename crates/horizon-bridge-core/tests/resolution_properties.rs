//! Property tests for commit resolution.
//!
//! Random commit batches, resolve orders and mode switches are run against
//! the adaptor and against a small model that applies only the batches that
//! were resolved. The container must always match the model.

use horizon_bridge_core::testing::render;
use horizon_bridge_core::{AdaptorError, HostElement, HostNode, InstanceId, Mutation, RenderId};
use proptest::prelude::*;
use proptest::sample::Index;

/// A mutation as drawn by the strategy. Insert ids are assigned when the
/// commit is made so they never collide.
#[derive(Debug, Clone)]
enum Step {
    Insert,
    SetText(u64, String),
    Remove(u64),
}

#[derive(Debug, Clone)]
enum Op {
    Commit(Vec<Step>),
    /// Resolve the oldest entry, or a chosen pending entry.
    Resolve(Option<Index>),
    /// Resolve an id that was already resolved.
    ResolveAgain(Index),
    SetManual(bool),
}

#[derive(Debug, Clone, PartialEq)]
enum Change {
    Insert(u64),
    SetText(u64, String),
    Remove(u64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Insert),
        2 => (1..16u64, "[a-z]{1,4}").prop_map(|(raw, text)| Step::SetText(raw, text)),
        1 => (1..16u64).prop_map(Step::Remove),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::collection::vec(step_strategy(), 1..4).prop_map(Op::Commit),
        3 => any::<Option<Index>>().prop_map(Op::Resolve),
        1 => any::<Index>().prop_map(Op::ResolveAgain),
        1 => any::<bool>().prop_map(Op::SetManual),
    ]
}

fn to_mutation(change: &Change) -> Mutation {
    match change {
        Change::Insert(raw) => Mutation::append(
            InstanceId::CONTAINER,
            HostElement::new(InstanceId::new(*raw), "view"),
        ),
        Change::SetText(raw, text) => Mutation::set_text(InstanceId::new(*raw), text.clone()),
        Change::Remove(raw) => Mutation::remove(InstanceId::new(*raw)),
    }
}

fn children_of(container: &HostNode) -> Vec<(u64, Option<String>)> {
    container
        .children
        .iter()
        .map(|c| (c.id.as_u64(), c.text.clone()))
        .collect()
}

/// Flat model of the container's children plus the pending queue.
#[derive(Debug, Default)]
struct Model {
    manual: bool,
    children: Vec<(u64, Option<String>)>,
    pending: Vec<(String, Vec<Change>)>,
    resolved: Vec<String>,
}

impl Model {
    /// Apply a batch all or nothing.
    fn apply(&mut self, batch: &[Change]) -> bool {
        let mut staged = self.children.clone();
        for change in batch {
            match change {
                Change::Insert(raw) => staged.push((*raw, None)),
                Change::SetText(raw, text) => match staged.iter_mut().find(|(id, _)| id == raw) {
                    Some((_, current)) => *current = Some(text.clone()),
                    None => return false,
                },
                Change::Remove(raw) => match staged.iter().position(|(id, _)| id == raw) {
                    Some(position) => {
                        staged.remove(position);
                    }
                    None => return false,
                },
            }
        }
        self.children = staged;
        true
    }

    /// Resolve the pending entry at `position`; it stays pending on failure.
    fn resolve(&mut self, position: usize) -> bool {
        let (render_id, batch) = self.pending[position].clone();
        if !self.apply(&batch) {
            return false;
        }
        self.pending.remove(position);
        self.resolved.push(render_id);
        true
    }

    fn pending_ids(&self) -> Vec<RenderId> {
        self.pending
            .iter()
            .map(|(id, _)| RenderId::from(id.as_str()))
            .collect()
    }
}

proptest! {
    /// The container equals the model after every commit, resolve and mode
    /// switch. Failed and repeated resolves leave the container as it was.
    #[test]
    fn prop_container_matches_resolved_batches(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let result = render(None).unwrap();
        let mut model = Model::default();
        let mut next_raw = 1u64;

        for (i, op) in ops.into_iter().enumerate() {
            let before = result.container();
            match op {
                Op::Commit(steps) => {
                    let render_id = format!("c{i}");
                    let batch: Vec<Change> = steps
                        .into_iter()
                        .map(|step| match step {
                            Step::Insert => {
                                next_raw += 1;
                                Change::Insert(next_raw - 1)
                            }
                            Step::SetText(raw, text) => Change::SetText(raw, text),
                            Step::Remove(raw) => Change::Remove(raw),
                        })
                        .collect();
                    let outcome = result.commit_with_id(
                        render_id.as_str(),
                        batch.iter().map(to_mutation).collect(),
                    );
                    model.pending.push((render_id, batch));

                    if model.manual {
                        prop_assert!(outcome.is_ok(), "manual commit rejected at op {}", i);
                        prop_assert_eq!(&result.container(), &before, "manual commit applied at op {}", i);
                    } else {
                        let applied = model.resolve(model.pending.len() - 1);
                        prop_assert_eq!(outcome.is_ok(), applied, "automatic commit outcome at op {}", i);
                        if !applied {
                            prop_assert_eq!(&result.container(), &before, "failed commit changed tree at op {}", i);
                        }
                    }
                }
                Op::Resolve(choice) => {
                    if model.pending.is_empty() {
                        let outcome = result.resolve_update_callback(choice.map(|_| "never-committed"));
                        let expected = match choice {
                            Some(_) => AdaptorError::UnknownRenderId("never-committed".into()),
                            None => AdaptorError::NoPendingUpdate,
                        };
                        prop_assert_eq!(outcome, Err(expected));
                    } else {
                        let position = choice.map_or(0, |index| index.index(model.pending.len()));
                        let render_id = model.pending[position].0.clone();
                        let outcome = result.resolve_update_callback(
                            choice.map(|_| render_id.as_str()),
                        );
                        if model.resolve(position) {
                            prop_assert_eq!(outcome, Ok(RenderId::from(render_id.as_str())));
                        } else {
                            prop_assert!(
                                matches!(outcome, Err(AdaptorError::Tree(_))),
                                "resolve of failing batch returned {:?} at op {}", outcome, i
                            );
                            prop_assert_eq!(&result.container(), &before, "failed resolve changed tree at op {}", i);
                        }
                    }
                }
                Op::ResolveAgain(index) => {
                    if model.resolved.is_empty() {
                        continue;
                    }
                    let render_id = model.resolved[index.index(model.resolved.len())].clone();
                    prop_assert_eq!(
                        result.resolve_update_callback(Some(render_id.as_str())),
                        Err(AdaptorError::UnknownRenderId(render_id.as_str().into()))
                    );
                    prop_assert_eq!(&result.container(), &before, "repeated resolve changed tree at op {}", i);
                }
                Op::SetManual(manual) => {
                    result.set_manually_resolved_update_callback(manual);
                    model.manual = manual;
                    prop_assert_eq!(&result.container(), &before, "mode switch changed tree at op {}", i);
                }
            }

            prop_assert_eq!(children_of(&result.container()), model.children.clone(), "container diverged at op {}", i);
            prop_assert_eq!(result.pending_render_ids(), model.pending_ids(), "pending diverged at op {}", i);
        }
    }

    /// Manual commits resolved in any order build the container in
    /// resolution order, and each id resolves exactly once.
    #[test]
    fn prop_manual_resolution_in_any_order(
        order in (1..8usize).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let result = render(None).unwrap();
        result.set_manually_resolved_update_callback(true);
        for i in 0..order.len() {
            let element = HostElement::new(InstanceId::new(i as u64 + 1), "view");
            result
                .commit_with_id(format!("c{i}"), vec![Mutation::append(InstanceId::CONTAINER, element)])
                .unwrap();
        }
        prop_assert!(result.container().is_empty());

        for (step, &i) in order.iter().enumerate() {
            let render_id = format!("c{i}");
            prop_assert_eq!(
                result.resolve_update_callback(Some(render_id.as_str())),
                Ok(RenderId::from(render_id.as_str()))
            );
            let snapshot = result.container();
            prop_assert_eq!(
                result.resolve_update_callback(Some(render_id.as_str())),
                Err(AdaptorError::UnknownRenderId(render_id.as_str().into()))
            );
            prop_assert_eq!(&result.container(), &snapshot);

            let expected: Vec<InstanceId> = order[..=step]
                .iter()
                .map(|&j| InstanceId::new(j as u64 + 1))
                .collect();
            prop_assert_eq!(result.container().child_ids(), expected);
        }
        prop_assert!(result.pending_render_ids().is_empty());
    }
}
