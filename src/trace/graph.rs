use std::collections::HashMap;

use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graphmap::DiGraphMap,
};

use crate::domain::{Code, Requirement, RequirementIndex};

/// The derived link graph over a [`RequirementIndex`].
///
/// Nodes are requirement codes; an edge `A → B` exists when `B`'s code
/// appears in `A`'s declared links and `B` resolves against the index.
/// Dangling links contribute no edge and no error. Nothing guarantees
/// acyclicity or that edges only connect adjacent levels; consumers must
/// tolerate both.
///
/// The graph is derived on demand and borrows the index; it is never the
/// source of truth for link data.
#[derive(Debug)]
pub struct LinkGraph<'a> {
    index: &'a RequirementIndex,
    graph: DiGraphMap<u32, ()>,
    ids: HashMap<&'a str, u32>,
    codes: Vec<&'a Code>,
}

impl<'a> LinkGraph<'a> {
    /// Materializes the graph from the index.
    #[must_use]
    pub fn build(index: &'a RequirementIndex) -> Self {
        let mut graph = DiGraphMap::new();
        let mut ids = HashMap::new();
        let mut codes = Vec::new();

        // Node ids follow index (code) order, so sorting ids sorts codes.
        for requirement in index.iter() {
            let id = u32::try_from(codes.len()).expect("more than u32::MAX requirements");
            ids.insert(requirement.code().as_str(), id);
            codes.push(requirement.code());
            graph.add_node(id);
        }

        for requirement in index.iter() {
            let source = ids[requirement.code().as_str()];
            for link in requirement.links() {
                if let Some(id) = ids.get(link.as_str()) {
                    graph.add_edge(source, *id, ());
                }
            }
        }

        Self {
            index,
            graph,
            ids,
            codes,
        }
    }

    /// Codes of requirements one category level above the given requirement
    /// whose links contain its code, in code order.
    ///
    /// This is the bottom-up `next level` lookup. Links from non-adjacent
    /// levels are ignored here (unlike top-down traversal, which follows
    /// declared links wherever they point).
    #[must_use]
    pub fn reverse_links(&self, requirement: &Requirement) -> Vec<&'a Code> {
        let Some(above) = requirement.category().level_above() else {
            return Vec::new();
        };
        let Some(&node) = self.ids.get(requirement.code().as_str()) else {
            return Vec::new();
        };

        let mut sources: Vec<u32> = self
            .graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .filter(|source| {
                self.index
                    .get(self.codes[*source as usize].as_str())
                    .is_some_and(|req| req.category() == above)
            })
            .collect();
        sources.sort_unstable();

        sources
            .into_iter()
            .map(|source| self.codes[source as usize])
            .collect()
    }

    /// Whether any requirement one category level above links to this one.
    ///
    /// A requirement at a non-apex level with no such referrer is an orphan.
    #[must_use]
    pub fn is_referenced_from_above(&self, requirement: &Requirement) -> bool {
        !self.reverse_links(requirement).is_empty()
    }

    /// Whether the link graph contains any cycle.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// All cycles in the graph as sorted groups of codes.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<Code>> {
        let mut cycles = Vec::new();

        for component in tarjan_scc(&self.graph) {
            if component.len() > 1 {
                let mut codes: Vec<Code> = component
                    .iter()
                    .map(|node| self.codes[*node as usize].clone())
                    .collect();
                codes.sort();
                cycles.push(codes);
                continue;
            }

            let Some(&node) = component.first() else {
                continue;
            };

            if self.graph.contains_edge(node, node) {
                cycles.push(vec![self.codes[node as usize].clone()]);
            }
        }

        cycles.sort();
        cycles
    }
}
