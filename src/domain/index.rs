use std::collections::BTreeMap;

use nonempty::NonEmpty;

use crate::domain::{Category, Code, Requirement};

/// A named grouping of requirement codes in source presentation order.
///
/// Chapters with zero requirements cannot be represented: construction
/// requires at least one member, so empty chapters are dropped at the
/// parsing boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    name: String,
    category: Category,
    codes: NonEmpty<Code>,
}

impl Chapter {
    /// Creates a chapter from its member codes, or `None` if there are none.
    #[must_use]
    pub fn new(name: String, category: Category, codes: Vec<Code>) -> Option<Self> {
        NonEmpty::from_vec(codes).map(|codes| Self {
            name,
            category,
            codes,
        })
    }

    /// The chapter heading from the source table.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The category of the source file this chapter came from.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Member requirement codes in source order.
    pub fn codes(&self) -> impl Iterator<Item = &Code> {
        self.codes.iter()
    }

    /// Number of member requirements. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Always `false`; present for API symmetry with collection types.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// The full collection of parsed requirements, keyed by code, plus the
/// ordered chapter structure from the sources.
///
/// The index is write-once: it is appended to while source files are merged
/// and read-only from then on. Duplicate codes follow a last-writer-wins
/// policy: the later insertion replaces the earlier one, a warning is
/// logged, and the occurrence is recorded for diagnostics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequirementIndex {
    by_code: BTreeMap<Code, Requirement>,
    chapters: Vec<Chapter>,
    duplicates: Vec<Code>,
}

impl RequirementIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a requirement, replacing any previous holder of its code.
    ///
    /// A replaced code is logged and recorded once per duplicate occurrence.
    pub fn insert(&mut self, requirement: Requirement) {
        let code = requirement.code().clone();
        if self.by_code.contains_key(&code) {
            tracing::warn!("requirement {code} has a duplicate code; the later definition wins");
            self.duplicates.push(code.clone());
        }
        self.by_code.insert(code, requirement);
    }

    /// Appends a chapter, preserving merge order.
    pub fn push_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Resolves a code (or raw link string) to a requirement.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Requirement> {
        self.by_code.get(code)
    }

    /// Iterates all requirements in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.by_code.values()
    }

    /// Iterates the requirements of one category, in code order.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Requirement> {
        self.iter().filter(move |req| req.category() == category)
    }

    /// The chapters in merge order.
    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Codes that were inserted more than once, one entry per duplicate
    /// occurrence, in merge order.
    #[must_use]
    pub fn duplicates(&self) -> &[Code] {
        &self.duplicates
    }

    /// Number of distinct requirements held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether the index holds no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
