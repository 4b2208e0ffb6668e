//! Integration tests for commit resolution through the test harness.

use horizon_bridge_core::testing::{render, render_with, RenderOptions};
use horizon_bridge_core::{
    AdaptorConfig, AdaptorError, HostElement, HostNode, InstanceId, Mutation, RenderId,
    ResolutionMode, TextUpdate, TreeError, UpdateState, MAX_DEPTH, RESOLVED_HISTORY,
};
use serde_json::Value;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn id(raw: u64) -> InstanceId {
    InstanceId::new(raw)
}

fn insert(raw: u64, tag: &str) -> Vec<Mutation> {
    vec![Mutation::append(
        InstanceId::CONTAINER,
        HostElement::new(id(raw), tag),
    )]
}

#[test]
fn test_render_null_returns_empty_container() {
    let result = render(None).unwrap();
    let container = result.container();

    assert_eq!(container, HostNode::empty_container());
    assert_eq!(container.id, InstanceId::CONTAINER);
    assert!(container.children.is_empty());
}

#[test]
fn test_render_root_element() {
    let root = HostElement::new(id(1), "view")
        .attr("class", "page")
        .child(HostElement::new(id(2), "text").text("Hello"));
    let result = render(Some(root)).unwrap();

    let container = result.container();
    assert_eq!(container.child_ids(), vec![id(1)]);
    assert_eq!(container.descendant_count(), 2);
    assert_eq!(
        container.find(id(1)).and_then(|n| n.attribute("class")),
        Some(&Value::from("page"))
    );
}

#[test]
fn test_manual_out_of_order_resolution() {
    init_tracing();
    let result = render(None).unwrap();
    result.set_manually_resolved_update_callback(true);

    result.commit_with_id("a", insert(1, "x")).unwrap();
    result.commit_with_id("b", insert(2, "y")).unwrap();
    assert!(result.container().is_empty());

    result.resolve_update_callback(Some("b")).unwrap();
    assert_eq!(result.container().child_ids(), vec![id(2)]);

    result.resolve_update_callback(Some("a")).unwrap();
    let ids = result.container().child_ids();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&id(1)));
    assert!(ids.contains(&id(2)));
}

#[test]
fn test_resolve_without_id_is_fifo() {
    let result = render(None).unwrap();
    result.set_manually_resolved_update_callback(true);

    result.commit_with_id("a", insert(1, "x")).unwrap();
    result.commit_with_id("b", insert(2, "y")).unwrap();

    assert_eq!(result.resolve_update_callback(None).unwrap(), RenderId::from("a"));
    assert_eq!(result.container().child_ids(), vec![id(1)]);
    assert_eq!(result.resolve_update_callback(None).unwrap(), RenderId::from("b"));
    assert_eq!(result.container().child_ids(), vec![id(1), id(2)]);
}

#[test]
fn test_resolve_twice_fails_and_leaves_tree() {
    let result = render(None).unwrap();
    result.set_manually_resolved_update_callback(true);
    result.commit_with_id("a", insert(1, "x")).unwrap();
    result.resolve_update_callback(Some("a")).unwrap();
    let before = result.container();

    assert_eq!(
        result.resolve_update_callback(Some("a")).unwrap_err(),
        AdaptorError::UnknownRenderId("a".into())
    );
    assert_eq!(
        result.resolve_update_callback(Some("missing")).unwrap_err(),
        AdaptorError::UnknownRenderId("missing".into())
    );
    assert_eq!(result.container(), before);
}

#[test]
fn test_resolve_empty_queue_fails() {
    let result = render(None).unwrap();
    assert_eq!(
        result.resolve_update_callback(None).unwrap_err(),
        AdaptorError::NoPendingUpdate
    );

    // Automatic commits never linger in the queue.
    result.commit(insert(1, "x")).unwrap();
    assert_eq!(
        result.resolve_update_callback(None).unwrap_err(),
        AdaptorError::NoPendingUpdate
    );
}

#[test]
fn test_automatic_commits_are_atomic() {
    init_tracing();
    let result = render(Some(HostElement::new(id(1), "view"))).unwrap();
    let before = result.container();

    let err = result
        .commit(vec![
            Mutation::append(id(1), HostElement::new(id(2), "text")),
            Mutation::Move {
                id: id(1),
                parent: id(2),
                before: None,
            },
        ])
        .unwrap_err();

    assert_eq!(err, AdaptorError::Tree(TreeError::CircularParentage(id(1))));
    assert_eq!(result.container(), before);
}

#[test]
fn test_each_automatic_commit_is_visible_after_return() {
    let result = render(Some(HostElement::new(id(1), "view"))).unwrap();

    result
        .commit(vec![Mutation::append(id(1), HostElement::new(id(2), "text"))])
        .unwrap();
    assert_eq!(result.container().find(id(1)).unwrap().child_ids(), vec![id(2)]);

    result
        .commit(vec![Mutation::Update {
            id: id(2),
            set_attributes: Vec::new(),
            remove_attributes: Vec::new(),
            text: TextUpdate::Set("count: 1".into()),
        }])
        .unwrap();
    assert_eq!(
        result.container().find(id(2)).unwrap().text.as_deref(),
        Some("count: 1")
    );

    result.commit(vec![Mutation::remove(id(2))]).unwrap();
    assert!(result.container().find(id(2)).is_none());
}

#[test]
fn test_mode_switch_does_not_resolve_or_unresolve() {
    let result = render(None).unwrap();

    result.commit_with_id("a", insert(1, "x")).unwrap();
    result.set_manually_resolved_update_callback(true);
    result.commit_with_id("b", insert(2, "y")).unwrap();
    result.set_manually_resolved_update_callback(false);

    assert_eq!(result.instance().resolution_mode(), ResolutionMode::Automatic);
    assert_eq!(result.container().child_ids(), vec![id(1)]);
    assert_eq!(result.pending_render_ids(), vec![RenderId::from("b")]);

    result.commit_with_id("c", insert(3, "z")).unwrap();
    assert_eq!(result.container().child_ids(), vec![id(1), id(3)]);

    result.resolve_update_callback(Some("b")).unwrap();
    assert_eq!(result.container().child_ids(), vec![id(1), id(3), id(2)]);
}

#[test]
fn test_duplicate_render_id_rejected() {
    let result = render(None).unwrap();
    result.commit_with_id("a", insert(1, "x")).unwrap();
    assert_eq!(
        result.commit_with_id("a", insert(2, "y")).unwrap_err(),
        AdaptorError::DuplicateRenderId("a".into())
    );
    assert_eq!(result.container().child_ids(), vec![id(1)]);
}

#[test]
fn test_manual_from_mount() {
    let result = render_with(
        Some(HostElement::new(id(1), "view")),
        RenderOptions {
            config: AdaptorConfig::manual(),
            ..Default::default()
        },
    )
    .unwrap();

    assert!(result.container().is_empty());
    let resolved = result.resolve_update_callback(None).unwrap();
    assert_eq!(resolved.as_str(), "render-1");
    assert_eq!(result.container().child_ids(), vec![id(1)]);
}

#[test]
fn test_container_serializes_as_render_data() {
    let result = render(Some(
        HostElement::new(id(1), "view").child(HostElement::new(id(2), "text").text("hi")),
    ))
    .unwrap();

    let json = serde_json::to_string(&result.container()).unwrap();
    let back: HostNode = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result.container());
}

#[test]
fn test_deep_chain_stops_at_depth_limit() {
    let result = render(None).unwrap();
    let depth = MAX_DEPTH as u64;
    for raw in 1..=depth {
        let parent = if raw == 1 { InstanceId::CONTAINER } else { id(raw - 1) };
        result
            .commit(vec![Mutation::append(parent, HostElement::new(id(raw), "view"))])
            .unwrap();
    }

    let err = result
        .commit(vec![Mutation::append(id(depth), HostElement::new(id(depth + 1), "view"))])
        .unwrap_err();
    assert_eq!(
        err,
        AdaptorError::Tree(TreeError::TooDeep {
            id: id(depth + 1),
            depth: MAX_DEPTH + 1,
        })
    );

    let container = result.container();
    assert_eq!(container.descendant_count(), MAX_DEPTH);
    assert!(container.find(id(depth)).is_some());
    assert!(container.find(id(depth + 1)).is_none());
    assert!(result.instance().debug_tree().lines().count() > MAX_DEPTH);
}

#[test]
fn test_resolved_history_is_a_window() {
    let result = render(None).unwrap();
    let mut ids = Vec::new();
    for _ in 0..RESOLVED_HISTORY {
        ids.push(result.commit(insert(1, "view")).unwrap());
        ids.push(result.commit(vec![Mutation::remove(id(1))]).unwrap());
    }

    let instance = result.instance();
    assert!(result.container().is_empty());
    assert!(result.pending_render_ids().is_empty());
    assert_eq!(instance.update_state(&ids[0]), None);
    assert_eq!(
        instance.update_state(&ids[ids.len() - RESOLVED_HISTORY]),
        Some(UpdateState::Resolved)
    );
    assert_eq!(
        result.commit_with_id(ids[ids.len() - 1].clone(), Vec::new()),
        Err(AdaptorError::DuplicateRenderId(ids[ids.len() - 1].clone()))
    );
}
