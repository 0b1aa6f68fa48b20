//! Rendering: turns traversal trees into mind-map documents.
//!
//! The renderers compose the trace layer with the document sink: top-down
//! and bottom-up sheets, diagnostic sections, and a legend describing the
//! style and marker conventions. Rendering failures are deliberately soft:
//! a missing marker or an unknown category degrades the output and logs a
//! warning instead of aborting the run.

use std::{
    collections::BTreeSet,
    io,
    path::PathBuf,
};

mod document;
pub use document::{Document, Sheet, TopicId};

mod markers;
pub use markers::{MarkerTable, UnrenderableAttribute};

use crate::{
    domain::{Config, Requirement, RequirementIndex},
    trace::{diagnostics, LinkGraph, TraceDirection, TraceNode, Traversal},
};

/// Knobs shared by all renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether to append orphan / no-link sections to directional documents.
    pub render_orphans: bool,
    /// Whether requirement topics start folded.
    pub render_folded: bool,
    /// Optional cap on traversal depth below each chapter root.
    pub max_depth: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            render_orphans: true,
            render_folded: true,
            max_depth: None,
        }
    }
}

/// Renders the requirement index as one or more mind-map documents.
///
/// One facade covers both directions plus the unified multi-sheet document,
/// so the style and legend model is shared.
#[derive(Debug)]
pub struct TreeRenderer<'a> {
    index: &'a RequirementIndex,
    config: &'a Config,
    options: RenderOptions,
}

impl<'a> TreeRenderer<'a> {
    /// Creates a renderer with default [`RenderOptions`].
    #[must_use]
    pub const fn new(index: &'a RequirementIndex, config: &'a Config) -> Self {
        Self {
            index,
            config,
            options: RenderOptions {
                render_orphans: true,
                render_folded: true,
                max_depth: None,
            },
        }
    }

    /// Replaces the render options.
    #[must_use]
    pub const fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Renders two independent documents, one per direction.
    ///
    /// Output paths are `{stem}-topdown.md` and `{stem}-bottomup.md`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written.
    pub fn render_independent(&self, stem: &str) -> io::Result<(PathBuf, PathBuf)> {
        let mut paths = [TraceDirection::TopDown, TraceDirection::BottomUp]
            .into_iter()
            .map(|direction| {
                let mut doc = self.document();
                self.render_direction_sheet(&mut doc, direction, self.options.render_orphans);
                let path = PathBuf::from(format!("{stem}-{}.md", direction.as_str()));
                doc.save(&path)?;
                Ok(path)
            })
            .collect::<io::Result<Vec<_>>>()?
            .into_iter();

        let top_down = paths.next().expect("two documents were rendered");
        let bottom_up = paths.next().expect("two documents were rendered");
        Ok((top_down, bottom_up))
    }

    /// Renders one unified document with both directions, an issues sheet
    /// and a legend.
    ///
    /// The output path is `{stem}.md`. Orphan and no-link sections always go
    /// to the dedicated issues sheet here, never to the direction sheets.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn render_unified(&self, stem: &str) -> io::Result<PathBuf> {
        let doc = self.unified_document();
        let path = PathBuf::from(format!("{stem}.md"));
        doc.save(&path)?;
        Ok(path)
    }

    /// Builds the unified document without saving it. Exposed for headless
    /// inspection.
    #[must_use]
    pub fn unified_document(&self) -> Document {
        let mut doc = self.document();
        self.render_direction_sheet(&mut doc, TraceDirection::TopDown, false);
        self.render_direction_sheet(&mut doc, TraceDirection::BottomUp, false);

        let issues = doc.create_sheet("Issues", "Issues");
        issues.set_label(issues.root_topic(), "Requirements Issues");
        self.render_orphans(issues);
        self.render_no_links(issues);

        let conventions = doc.create_sheet("Conventions", "Conventions");
        self.render_legend(conventions);
        doc
    }

    /// Builds the document for one direction without saving it.
    #[must_use]
    pub fn direction_document(&self, direction: TraceDirection) -> Document {
        let mut doc = self.document();
        self.render_direction_sheet(&mut doc, direction, self.options.render_orphans);
        doc
    }

    fn document(&self) -> Document {
        let mut doc = Document::create("Requirement Trees");
        for (name, style) in self.config.styles.iter() {
            doc.define_style(name, style.clone());
        }
        doc
    }

    fn render_direction_sheet(&self, doc: &mut Document, direction: TraceDirection, with_issues: bool) {
        let (title, root_label) = match direction {
            TraceDirection::TopDown => ("TopDown", "TopDown Requirements tree"),
            TraceDirection::BottomUp => ("BottomUp", "BottomUp Requirements tree"),
        };

        let sheet = doc.create_sheet(title, "text");
        sheet.set_label(sheet.root_topic(), root_label);
        self.render_content(sheet, direction);

        if with_issues {
            self.render_orphans(sheet);
            self.render_no_links(sheet);
        }
    }

    fn render_content(&self, sheet: &mut Sheet, direction: TraceDirection) {
        let mut traversal = Traversal::new(self.index, direction);
        if let Some(depth) = self.options.max_depth {
            traversal = traversal.with_max_depth(depth);
        }

        let mut warned = BTreeSet::new();
        let category = direction.root_category();

        for trace in traversal.chapter_traces() {
            // chapter topics are always folded, independent of render_folded
            let chapter_topic = sheet.add_subtopic(sheet.root_topic(), trace.chapter.name(), true);
            sheet.set_style(chapter_topic, self.config.styles.style_id_for(category));

            for root in &trace.roots {
                self.emit(sheet, chapter_topic, root, &mut warned);
            }
        }
    }

    fn emit(
        &self,
        sheet: &mut Sheet,
        parent: TopicId,
        node: &TraceNode,
        warned: &mut BTreeSet<String>,
    ) {
        let Some(requirement) = self.index.get(&node.code) else {
            return;
        };

        let topic = self.create_topic(sheet, parent, requirement, warned);
        for child in &node.children {
            self.emit(sheet, topic, child, warned);
        }
    }

    fn create_topic(
        &self,
        sheet: &mut Sheet,
        parent: TopicId,
        requirement: &Requirement,
        warned: &mut BTreeSet<String>,
    ) -> TopicId {
        let topic = sheet.add_subtopic(parent, requirement.text(), self.options.render_folded);
        sheet.set_style(topic, self.config.styles.style_id_for(requirement.category()));
        sheet.set_note(
            topic,
            format!("{}\n{}", requirement.code(), requirement.full_text()),
        );

        let markers = MarkerTable::new(&self.config.attributes);
        for attribute in requirement.attributes() {
            match markers.marker_for(attribute) {
                Ok(marker) => sheet.add_marker(topic, marker),
                Err(issue) => {
                    // one warning per requirement, and only for values that
                    // actually resolved (invalid ones were already handled at
                    // parse time)
                    if attribute.is_valid()
                        && warned.insert(requirement.code().to_string())
                    {
                        tracing::warn!(
                            "requirement {}: {issue}; rendering without the marker",
                            requirement.code()
                        );
                    }
                }
            }
        }

        topic
    }

    fn render_orphans(&self, sheet: &mut Sheet) {
        let graph = LinkGraph::build(self.index);
        let mut warned = BTreeSet::new();

        for findings in diagnostics::orphans(self.index, &graph) {
            let section = sheet.add_subtopic(
                sheet.root_topic(),
                format!("Orphaned {} Requirements", findings.category),
                false,
            );
            for code in &findings.codes {
                if let Some(requirement) = self.index.get(code) {
                    self.create_topic(sheet, section, requirement, &mut warned);
                }
            }
        }
    }

    fn render_no_links(&self, sheet: &mut Sheet) {
        let mut warned = BTreeSet::new();

        for findings in diagnostics::no_links(self.index) {
            let section = sheet.add_subtopic(
                sheet.root_topic(),
                format!("{} Requirements without links", findings.category),
                false,
            );
            for code in &findings.codes {
                if let Some(requirement) = self.index.get(code) {
                    self.create_topic(sheet, section, requirement, &mut warned);
                }
            }
        }
    }

    fn render_legend(&self, sheet: &mut Sheet) {
        let root = sheet.root_topic();

        let types = sheet.add_subtopic(root, "Requirement types", false);
        for (name, _) in self.config.styles.iter() {
            if name == "unknown" {
                continue;
            }
            let topic = sheet.add_subtopic(types, format!("{name} Requirements"), false);
            sheet.set_style(topic, name);
        }

        let attributes = sheet.add_subtopic(root, "Requirement attributes", false);
        let marker_names: Vec<String> = self
            .config
            .attributes
            .marker_attribute_names()
            .map(ToString::to_string)
            .collect();
        for name in marker_names {
            let topic = sheet.add_subtopic(attributes, name.clone(), true);
            if let Some(description) = self.config.attributes.description(&name) {
                if !description.is_empty() {
                    sheet.set_note(topic, description.to_string());
                }
            }

            let Some(values) = self.config.attributes.vocabulary(&name) else {
                continue;
            };
            let Some(markers) = self.config.attributes.markers_for(&name) else {
                continue;
            };
            for (value, marker) in values.iter().zip(markers) {
                let level = sheet.add_subtopic(topic, format!("indicates {value}"), false);
                sheet.add_marker(level, marker.clone());
            }
        }

        let issues = sheet.add_subtopic(root, "Requirements issues", false);
        let orphans = sheet.add_subtopic(
            issues,
            "Orphans: requirements never referenced from the category above",
            false,
        );
        sheet.set_style(orphans, "unknown");
        sheet.set_note(
            orphans,
            "A user requirement no business requirement links to has no foundation in a \
             business need. A system requirement no user requirement links to may not be \
             needed at all.",
        );
        let no_links = sheet.add_subtopic(
            issues,
            "NoLinks: requirements with no outgoing links",
            false,
        );
        sheet.set_style(no_links, "unknown");
        sheet.set_note(
            no_links,
            "A business requirement without links expresses a need the project will not \
             address. A user requirement without links to system requirements will not be \
             implemented.",
        );

        let traceability = sheet.add_subtopic(root, "Requirements traceability", false);
        let top_down = sheet.add_subtopic(
            traceability,
            "TopDown: from business needs down to system requirements",
            false,
        );
        sheet.set_style(top_down, "unknown");
        let bottom_up = sheet.add_subtopic(
            traceability,
            "BottomUp: from system requirements up to business needs",
            false,
        );
        sheet.set_style(bottom_up, "unknown");
    }
}
