//! The traceability layer: link graph, directional traversal, sibling
//! ordering and headless diagnostics.
//!
//! Traversal never stores direct references between requirements. Links stay
//! code strings and are resolved against the [`RequirementIndex`] at walk
//! time, so cyclic or dangling inputs cannot create ownership problems; they
//! are bounded (cycles) or skipped (dangling) instead.

use std::collections::HashSet;

/// Headless diagnostic scans over the full index.
pub mod diagnostics;
pub use diagnostics::{diagnose, CategoryFindings, Diagnostics};

mod graph;
pub use graph::LinkGraph;

mod sort;
pub use sort::{sort_siblings, SORT_ATTRIBUTES};

use crate::domain::{Category, Chapter, Code, Requirement, RequirementIndex};

/// Which way a trace tree is grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDirection {
    /// From business needs down to system requirements, following declared
    /// links.
    TopDown,
    /// From system requirements up to business needs, following reverse
    /// lookups one level up.
    BottomUp,
}

impl TraceDirection {
    /// The category whose chapters seed the trees for this direction.
    #[must_use]
    pub const fn root_category(self) -> Category {
        match self {
            Self::TopDown => Category::Business,
            Self::BottomUp => Category::System,
        }
    }

    /// Short name used in file names and sheet titles.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopDown => "topdown",
            Self::BottomUp => "bottomup",
        }
    }
}

/// One node of a resolved trace tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceNode {
    /// The requirement code at this node.
    pub code: Code,
    /// Child nodes, sibling-sorted, one link level further along the
    /// traversal direction.
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    /// Total number of nodes in this subtree, including this one.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }
}

/// A trace tree rooted at one chapter of the traversal's root category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTrace<'a> {
    /// The source chapter.
    pub chapter: &'a Chapter,
    /// One tree per chapter member, sibling-sorted.
    pub roots: Vec<TraceNode>,
}

/// Direction-aware recursive traversal over the index.
///
/// Both directions share one algorithm parameterized by the next-level
/// lookup: top-down follows a requirement's own declared links; bottom-up
/// scans one category up for requirements whose links point back at it.
/// Unresolved (dangling) targets are skipped silently: no node, no error.
#[derive(Debug)]
pub struct Traversal<'a> {
    index: &'a RequirementIndex,
    graph: LinkGraph<'a>,
    direction: TraceDirection,
    max_depth: Option<usize>,
}

impl<'a> Traversal<'a> {
    /// Prepares a traversal, deriving the link graph from the index.
    #[must_use]
    pub fn new(index: &'a RequirementIndex, direction: TraceDirection) -> Self {
        Self {
            index,
            graph: LinkGraph::build(index),
            direction,
            max_depth: None,
        }
    }

    /// Caps recursion at `depth` link levels below each root.
    ///
    /// A cap of 0 yields childless roots. Without a cap, depth is bounded
    /// only by the cycle guard.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// The traversal direction.
    #[must_use]
    pub const fn direction(&self) -> TraceDirection {
        self.direction
    }

    /// Grows one tree per chapter of the root category, in chapter order.
    ///
    /// Chapters of other categories are ignored by this direction.
    #[must_use]
    pub fn chapter_traces(&self) -> Vec<ChapterTrace<'a>> {
        let root_category = self.direction.root_category();
        self.index
            .chapters()
            .iter()
            .filter(|chapter| chapter.category() == root_category)
            .map(|chapter| {
                let members: Vec<&str> = chapter.codes().map(Code::as_str).collect();
                ChapterTrace {
                    chapter,
                    roots: self.trees(&members),
                }
            })
            .collect()
    }

    /// Resolves and sibling-sorts a code list, then grows a tree from each.
    ///
    /// Dangling codes produce no tree.
    #[must_use]
    pub fn trees(&self, codes: &[&str]) -> Vec<TraceNode> {
        let mut path = HashSet::new();
        self.grow(codes, 0, &mut path)
    }

    fn grow(&self, codes: &[&str], depth: usize, path: &mut HashSet<&'a str>) -> Vec<TraceNode> {
        let resolved: Vec<&Requirement> = codes
            .iter()
            .filter_map(|code| self.index.get(code))
            .collect();

        sort_siblings(resolved)
            .into_iter()
            .filter_map(|requirement| self.node(requirement, depth, path))
            .collect()
    }

    fn node(
        &self,
        requirement: &'a Requirement,
        depth: usize,
        path: &mut HashSet<&'a str>,
    ) -> Option<TraceNode> {
        let code = requirement.code().as_str();

        // Cycle guard: a requirement already on the current path is treated
        // like an unresolved target and skipped.
        if !path.insert(code) {
            tracing::warn!("link cycle through {code}; not expanding it again");
            return None;
        }

        let children = if self.max_depth.is_some_and(|max| depth >= max) {
            Vec::new()
        } else {
            let next = self.next_level(requirement);
            self.grow(&next, depth + 1, path)
        };

        path.remove(code);

        Some(TraceNode {
            code: requirement.code().clone(),
            children,
        })
    }

    /// The codes one link level along the traversal direction.
    fn next_level(&self, requirement: &'a Requirement) -> Vec<&'a str> {
        match self.direction {
            TraceDirection::TopDown => {
                requirement.links().iter().map(String::as_str).collect()
            }
            TraceDirection::BottomUp => self
                .graph
                .reverse_links(requirement)
                .into_iter()
                .map(Code::as_str)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        test_support::{requirement, requirement_with_attrs},
        Config,
    };

    fn chain_index() -> RequirementIndex {
        let config = Config::default();
        let mut index = RequirementIndex::new();
        index.insert(requirement(&config, "B1", Category::Business, &["U1"]));
        index.insert(requirement(&config, "U1", Category::User, &["S1"]));
        index.insert(requirement(&config, "S1", Category::System, &[]));
        index
    }

    fn flatten(node: &TraceNode, into: &mut Vec<String>) {
        into.push(node.code.to_string());
        for child in &node.children {
            flatten(child, into);
        }
    }

    #[test]
    fn top_down_visits_business_then_user_then_system() {
        let index = chain_index();
        let traversal = Traversal::new(&index, TraceDirection::TopDown);

        let trees = traversal.trees(&["B1"]);
        assert_eq!(trees.len(), 1);

        let mut visited = Vec::new();
        flatten(&trees[0], &mut visited);
        assert_eq!(visited, ["B1", "U1", "S1"]);
    }

    #[test]
    fn bottom_up_visits_system_then_user_then_business() {
        let index = chain_index();
        let traversal = Traversal::new(&index, TraceDirection::BottomUp);

        let trees = traversal.trees(&["S1"]);
        let mut visited = Vec::new();
        flatten(&trees[0], &mut visited);
        assert_eq!(visited, ["S1", "U1", "B1"]);
    }

    #[test]
    fn dangling_link_is_skipped_without_error() {
        let config = Config::default();
        let mut index = RequirementIndex::new();
        index.insert(requirement(&config, "B1", Category::Business, &["GHOST"]));

        let traversal = Traversal::new(&index, TraceDirection::TopDown);
        let trees = traversal.trees(&["B1"]);

        assert_eq!(trees.len(), 1);
        assert!(trees[0].children.is_empty());
    }

    #[test]
    fn dangling_root_produces_no_tree() {
        let index = chain_index();
        let traversal = Traversal::new(&index, TraceDirection::TopDown);
        assert!(traversal.trees(&["GHOST"]).is_empty());
    }

    #[test]
    fn cyclic_links_terminate() {
        let config = Config::default();
        let mut index = RequirementIndex::new();
        index.insert(requirement(&config, "B1", Category::Business, &["U1"]));
        index.insert(requirement(&config, "U1", Category::User, &["B1"]));

        let traversal = Traversal::new(&index, TraceDirection::TopDown);
        let trees = traversal.trees(&["B1"]);

        let mut visited = Vec::new();
        flatten(&trees[0], &mut visited);
        // each node appears at most once on any path
        assert_eq!(visited, ["B1", "U1"]);
    }

    #[test]
    fn max_depth_caps_descent() {
        let index = chain_index();
        let traversal = Traversal::new(&index, TraceDirection::TopDown).with_max_depth(1);

        let trees = traversal.trees(&["B1"]);
        let mut visited = Vec::new();
        flatten(&trees[0], &mut visited);
        assert_eq!(visited, ["B1", "U1"]);

        let childless = Traversal::new(&index, TraceDirection::TopDown).with_max_depth(0);
        let trees = childless.trees(&["B1"]);
        assert!(trees[0].children.is_empty());
    }

    #[test]
    fn siblings_are_sorted_at_every_level() {
        let config = Config::default();
        let mut index = RequirementIndex::new();
        index.insert(requirement(
            &config,
            "B1",
            Category::Business,
            &["U-high", "U-low"],
        ));
        index.insert(requirement_with_attrs(
            &config,
            "U-high",
            Category::User,
            &[],
            &[("Priority", "High")],
        ));
        index.insert(requirement_with_attrs(
            &config,
            "U-low",
            Category::User,
            &[],
            &[("Priority", "Low")],
        ));

        let traversal = Traversal::new(&index, TraceDirection::TopDown);
        let trees = traversal.trees(&["B1"]);

        let children: Vec<_> = trees[0]
            .children
            .iter()
            .map(|child| child.code.as_str())
            .collect();
        assert_eq!(children, ["U-low", "U-high"]);
    }

    #[test]
    fn chapter_traces_follow_root_category() {
        let config = Config::default();
        let mut index = chain_index();
        index.push_chapter(
            Chapter::new(
                "Needs".to_string(),
                Category::Business,
                vec!["B1".parse().unwrap()],
            )
            .unwrap(),
        );
        index.push_chapter(
            Chapter::new(
                "Components".to_string(),
                Category::System,
                vec!["S1".parse().unwrap()],
            )
            .unwrap(),
        );

        let top_down = Traversal::new(&index, TraceDirection::TopDown);
        let traces = top_down.chapter_traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].chapter.name(), "Needs");
        assert_eq!(traces[0].roots[0].size(), 3);

        let bottom_up = Traversal::new(&index, TraceDirection::BottomUp);
        let traces = bottom_up.chapter_traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].chapter.name(), "Components");
    }
}
