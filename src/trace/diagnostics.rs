use crate::{
    domain::{Category, Code, RequirementIndex, PROGRESSION},
    trace::LinkGraph,
};

/// Codes flagged by one diagnostic scan, grouped by offending category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFindings {
    /// The category the finding applies to.
    pub category: Category,
    /// Offending requirement codes, in code order.
    pub codes: Vec<Code>,
}

/// The full diagnostic report over an index.
///
/// Produced by whole-index scans, not by walking the rendered trees, so
/// requirements a traversal never visits are still caught. The report is
/// rendering-agnostic and can be produced headlessly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// Requirements never referenced from the category above, per category.
    pub orphans: Vec<CategoryFindings>,
    /// Requirements with no outgoing links where links are expected.
    pub no_links: Vec<CategoryFindings>,
    /// Codes inserted more than once, one entry per duplicate occurrence.
    pub duplicates: Vec<Code>,
    /// Link cycles, as sorted groups of codes.
    pub cycles: Vec<Vec<Code>>,
}

impl Diagnostics {
    /// Whether no diagnostic fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
            && self.no_links.is_empty()
            && self.duplicates.is_empty()
            && self.cycles.is_empty()
    }

    /// Total number of findings across all scans.
    #[must_use]
    pub fn count(&self) -> usize {
        let orphans: usize = self.orphans.iter().map(|f| f.codes.len()).sum();
        let no_links: usize = self.no_links.iter().map(|f| f.codes.len()).sum();
        orphans + no_links + self.duplicates.len() + self.cycles.len()
    }
}

/// Runs every diagnostic scan over the index.
#[must_use]
pub fn diagnose(index: &RequirementIndex) -> Diagnostics {
    let graph = LinkGraph::build(index);
    Diagnostics {
        orphans: orphans(index, &graph),
        no_links: no_links(index),
        duplicates: index.duplicates().to_vec(),
        cycles: graph.cycles(),
    }
}

/// Finds orphaned requirements: members of a non-apex category that no
/// requirement one level up links to.
///
/// Scanned categories are `system` and `user` (bottom-up order). Categories
/// with no findings are omitted.
#[must_use]
pub fn orphans(index: &RequirementIndex, graph: &LinkGraph<'_>) -> Vec<CategoryFindings> {
    // every level but the apex
    PROGRESSION[..2]
        .iter()
        .copied()
        .filter_map(|category| {
            let codes: Vec<Code> = index
                .in_category(category)
                .filter(|req| !graph.is_referenced_from_above(req))
                .map(|req| req.code().clone())
                .collect();
            (!codes.is_empty()).then_some(CategoryFindings { category, codes })
        })
        .collect()
}

/// Finds requirements with an empty link sequence in categories where at
/// least one outgoing link is expected.
///
/// Scanned categories are `user` and `business` (bottom-up order, skipping
/// the leaf level). Categories with no findings are omitted.
#[must_use]
pub fn no_links(index: &RequirementIndex) -> Vec<CategoryFindings> {
    // every level but the leaf
    PROGRESSION[1..]
        .iter()
        .copied()
        .filter_map(|category| {
            let codes: Vec<Code> = index
                .in_category(category)
                .filter(|req| req.links().is_empty())
                .map(|req| req.code().clone())
                .collect();
            (!codes.is_empty()).then_some(CategoryFindings { category, codes })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{test_support::requirement, Config};

    fn index() -> RequirementIndex {
        let config = Config::default();
        let mut index = RequirementIndex::new();
        index.insert(requirement(
            &config,
            "B-001",
            Category::Business,
            &["U-001"],
        ));
        index.insert(requirement(&config, "B-002", Category::Business, &[]));
        index.insert(requirement(&config, "U-001", Category::User, &["S-001"]));
        index.insert(requirement(&config, "U-002", Category::User, &[]));
        index.insert(requirement(&config, "S-001", Category::System, &[]));
        index.insert(requirement(&config, "S-002", Category::System, &[]));
        index
    }

    #[test]
    fn unreferenced_requirements_are_orphans() {
        let index = index();
        let graph = LinkGraph::build(&index);
        let findings = orphans(&index, &graph);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].category, Category::System);
        let system: Vec<_> = findings[0].codes.iter().map(Code::as_str).collect();
        assert_eq!(system, ["S-002"]);

        assert_eq!(findings[1].category, Category::User);
        let user: Vec<_> = findings[1].codes.iter().map(Code::as_str).collect();
        assert_eq!(user, ["U-002"]);
    }

    #[test]
    fn referenced_requirements_are_not_orphans() {
        let index = index();
        let graph = LinkGraph::build(&index);
        let findings = orphans(&index, &graph);

        for finding in &findings {
            assert!(!finding.codes.iter().any(|code| code.as_str() == "U-001"));
            assert!(!finding.codes.iter().any(|code| code.as_str() == "S-001"));
        }
    }

    #[test]
    fn empty_link_sequences_are_flagged_for_non_leaf_levels() {
        let index = index();
        let findings = no_links(&index);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].category, Category::User);
        let user: Vec<_> = findings[0].codes.iter().map(Code::as_str).collect();
        assert_eq!(user, ["U-002"]);

        assert_eq!(findings[1].category, Category::Business);
        let business: Vec<_> = findings[1].codes.iter().map(Code::as_str).collect();
        assert_eq!(business, ["B-002"]);
    }

    #[test]
    fn leaf_level_is_never_flagged_for_missing_links() {
        let index = index();
        let findings = no_links(&index);
        assert!(findings
            .iter()
            .all(|finding| finding.category != Category::System));
    }

    #[test]
    fn clean_index_reports_nothing() {
        let config = Config::default();
        let mut clean = RequirementIndex::new();
        clean.insert(requirement(&config, "B-001", Category::Business, &["U-001"]));
        clean.insert(requirement(&config, "U-001", Category::User, &["S-001"]));
        clean.insert(requirement(&config, "S-001", Category::System, &[]));

        let report = diagnose(&clean);
        assert!(report.is_empty());
        assert_eq!(report.count(), 0);
    }

    #[test]
    fn diagnose_collects_duplicates_and_cycles() {
        let config = Config::default();
        let mut index = RequirementIndex::new();
        index.insert(requirement(&config, "B-001", Category::Business, &["U-001"]));
        index.insert(requirement(&config, "B-001", Category::Business, &["U-001"]));
        index.insert(requirement(&config, "U-001", Category::User, &["U-002"]));
        index.insert(requirement(&config, "U-002", Category::User, &["U-001"]));

        let report = diagnose(&index);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.cycles.len(), 1);
        assert!(!report.is_empty());
    }
}
