//! Logging and debugging facilities for Horizon Bridge.
//!
//! This module provides:
//! - Target names for filtering `tracing` output per subsystem
//! - Debug visualization for host trees
//!
//! # Tracing Integration
//!
//! Horizon Bridge uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in the host integration or test:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_bridge_core::adaptor=debug")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! ```
//! use horizon_bridge_core::logging::HostTreeDebug;
//! use horizon_bridge_core::HostNode;
//!
//! let output = HostTreeDebug::new().format(&HostNode::empty_container());
//! assert!(output.contains("#container"));
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::node::HostNode;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_bridge_core";
    /// Host adaptor target.
    pub const ADAPTOR: &str = "horizon_bridge_core::adaptor";
    /// Update queue target.
    pub const QUEUE: &str = "horizon_bridge_core::queue";
    /// Host tree target.
    pub const NODE: &str = "horizon_bridge_core::node";
    /// Lifecycle bus target.
    pub const LIFECYCLE: &str = "horizon_bridge_core::lifecycle";
    /// Host event proxy target.
    pub const EVENT: &str = "horizon_bridge_core::event";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for host tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show instance ids.
    pub show_ids: bool,
    /// Whether to show attributes.
    pub show_attributes: bool,
    /// Whether to show text payloads.
    pub show_text: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_attributes: false,
            show_text: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_attributes: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_attributes: false,
            show_text: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing host trees.
#[derive(Debug, Clone, Default)]
pub struct HostTreeDebug {
    options: TreeFormatOptions,
}

impl HostTreeDebug {
    /// Create a new visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format a tree into a string.
    pub fn format(&self, root: &HostNode) -> String {
        self.display(root).to_string()
    }

    /// A [`fmt::Display`] adapter for `root`, usable directly in log fields.
    pub fn display<'a>(&'a self, root: &'a HostNode) -> impl fmt::Display + 'a {
        DisplayTree { debug: self, root }
    }

    /// Write `root` and its subtree, depth first, one node per line.
    fn write_tree(&self, out: &mut dyn FmtWrite, root: &HostNode) -> fmt::Result {
        let mut stack = vec![(root, 0, true)];
        while let Some((node, depth, is_last)) = stack.pop() {
            self.write_node(out, node, depth, is_last)?;

            if self.options.max_depth.is_some_and(|max| depth + 1 > max) {
                continue;
            }
            let child_count = node.children.len();
            for (i, child) in node.children.iter().enumerate().rev() {
                stack.push((child, depth + 1, i + 1 == child_count));
            }
        }
        Ok(())
    }

    fn write_node(
        &self,
        out: &mut dyn FmtWrite,
        node: &HostNode,
        depth: usize,
        is_last: bool,
    ) -> fmt::Result {
        out.write_str(&self.build_prefix(depth, is_last))?;
        out.write_str(&node.tag)?;

        if self.options.show_ids {
            write!(out, " [{}]", node.id)?;
        }
        if self.options.show_text {
            if let Some(text) = &node.text {
                write!(out, " {text:?}")?;
            }
        }
        out.write_char('\n')?;

        if self.options.show_attributes {
            let attr_prefix = self.build_attribute_prefix(depth);
            for (key, value) in &node.attributes {
                writeln!(out, "{attr_prefix}  .{key} = {value}")?;
            }
        }
        Ok(())
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    fn build_attribute_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };
        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix
    }
}

struct DisplayTree<'a> {
    debug: &'a HostTreeDebug,
    root: &'a HostNode,
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.debug.write_tree(f, self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{HostElement, Mutation};
    use crate::node::{HostTree, InstanceId};

    fn sample() -> HostNode {
        let mut tree = HostTree::new();
        tree.apply_batch(&[Mutation::append(
            InstanceId::CONTAINER,
            HostElement::new(InstanceId::new(1), "view")
                .attr("class", "page")
                .child(HostElement::new(InstanceId::new(2), "text").text("hi"))
                .child(HostElement::new(InstanceId::new(3), "button")),
        )])
        .unwrap();
        tree.snapshot()
    }

    #[test]
    fn test_tree_format_empty() {
        let output = HostTreeDebug::new().format(&HostNode::empty_container());
        assert_eq!(output, "#container [#0]\n");
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let output = HostTreeDebug::new().format(&sample());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "#container [#0]");
        assert_eq!(lines[1], "\u{2514}\u{2500}\u{2500} view [#1]");
        assert!(lines[2].contains("text [#2] \"hi\""));
        assert!(lines[3].contains("\u{2514}\u{2500}\u{2500} button [#3]"));
    }

    #[test]
    fn test_tree_format_minimal() {
        let output = HostTreeDebug::with_options(TreeFormatOptions::minimal()).format(&sample());
        assert!(output.contains("view"));
        assert!(!output.contains('['));
        assert!(!output.contains("hi"));
    }

    #[test]
    fn test_tree_format_detailed_ascii() {
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::detailed()
        };
        let output = HostTreeDebug::with_options(options).format(&sample());
        assert!(output.contains(".class = \"page\""));
        assert!(output.contains("+-- text"));
        assert!(output.contains("`-- button"));
    }

    #[test]
    fn test_max_depth() {
        let options = TreeFormatOptions {
            max_depth: Some(1),
            ..Default::default()
        };
        let output = HostTreeDebug::with_options(options).format(&sample());
        assert!(output.contains("view"));
        assert!(!output.contains("button"));
    }

    #[test]
    fn test_format_deep_chain() {
        let mut chain = HostNode::empty_container();
        for raw in (1..=2_000).rev() {
            let mut parent = HostNode::empty_container();
            parent.id = InstanceId::new(raw);
            parent.tag = "view".to_string();
            parent.children.push(chain);
            chain = parent;
        }

        let options = TreeFormatOptions {
            style: TreeStyle::Compact,
            indent_size: 0,
            ..TreeFormatOptions::minimal()
        };
        let output = HostTreeDebug::with_options(options).format(&chain);
        assert_eq!(output.lines().count(), 2_001);
        assert!(output.lines().last().is_some_and(|l| l.ends_with("#container")));

        let mut next = Some(chain);
        while let Some(mut node) = next {
            next = node.children.pop();
        }
    }
}
