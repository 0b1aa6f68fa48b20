use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::domain::TopicStyle;

/// Handle to a topic within one [`Sheet`].
///
/// Handles are only meaningful for the sheet that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
struct TopicData {
    label: String,
    folded: bool,
    style: Option<String>,
    markers: Vec<String>,
    note: Option<String>,
    children: Vec<usize>,
}

impl TopicData {
    fn new(label: String, folded: bool) -> Self {
        Self {
            label,
            folded,
            style: None,
            markers: Vec::new(),
            note: None,
            children: Vec::new(),
        }
    }
}

/// One sheet of a mind-map document: a topic tree grown from a single root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    title: String,
    kind: String,
    topics: Vec<TopicData>,
}

impl Sheet {
    fn new(title: String, kind: String) -> Self {
        let root = TopicData::new(title.clone(), false);
        Self {
            title,
            kind,
            topics: vec![root],
        }
    }

    /// The sheet title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replaces the sheet title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// The root topic of this sheet.
    #[must_use]
    pub const fn root_topic(&self) -> TopicId {
        TopicId(0)
    }

    /// Adds a child topic under `parent` and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this sheet.
    pub fn add_subtopic(
        &mut self,
        parent: TopicId,
        label: impl Into<String>,
        folded: bool,
    ) -> TopicId {
        let id = self.topics.len();
        self.topics.push(TopicData::new(label.into(), folded));
        self.topics[parent.0].children.push(id);
        TopicId(id)
    }

    /// Replaces a topic's label.
    ///
    /// # Panics
    ///
    /// Panics if `topic` does not belong to this sheet.
    pub fn set_label(&mut self, topic: TopicId, label: impl Into<String>) {
        self.topics[topic.0].label = label.into();
    }

    /// Assigns a named style to a topic.
    ///
    /// # Panics
    ///
    /// Panics if `topic` does not belong to this sheet.
    pub fn set_style(&mut self, topic: TopicId, style: impl Into<String>) {
        self.topics[topic.0].style = Some(style.into());
    }

    /// Appends a marker to a topic.
    ///
    /// # Panics
    ///
    /// Panics if `topic` does not belong to this sheet.
    pub fn add_marker(&mut self, topic: TopicId, marker: impl Into<String>) {
        self.topics[topic.0].markers.push(marker.into());
    }

    /// Attaches a note to a topic, replacing any existing note.
    ///
    /// # Panics
    ///
    /// Panics if `topic` does not belong to this sheet.
    pub fn set_note(&mut self, topic: TopicId, note: impl Into<String>) {
        self.topics[topic.0].note = Some(note.into());
    }

    /// The label of a topic.
    ///
    /// # Panics
    ///
    /// Panics if `topic` does not belong to this sheet.
    #[must_use]
    pub fn label(&self, topic: TopicId) -> &str {
        &self.topics[topic.0].label
    }

    /// The child handles of a topic, in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if `topic` does not belong to this sheet.
    #[must_use]
    pub fn children(&self, topic: TopicId) -> Vec<TopicId> {
        self.topics[topic.0].children.iter().map(|&id| TopicId(id)).collect()
    }

    /// The markers attached to a topic.
    ///
    /// # Panics
    ///
    /// Panics if `topic` does not belong to this sheet.
    #[must_use]
    pub fn markers(&self, topic: TopicId) -> &[String] {
        &self.topics[topic.0].markers
    }

    fn write_topic<W: Write>(&self, writer: &mut W, id: usize, depth: usize) -> io::Result<()> {
        let topic = &self.topics[id];
        let indent = "  ".repeat(depth);

        let style = topic
            .style
            .as_ref()
            .map(|style| format!("[{style}] "))
            .unwrap_or_default();
        let markers: String = topic
            .markers
            .iter()
            .map(|marker| format!(" @{marker}"))
            .collect();
        let folded = if topic.folded { " [+]" } else { "" };

        writeln!(writer, "{indent}- {style}{}{markers}{folded}", topic.label)?;

        if let Some(note) = &topic.note {
            for line in note.lines() {
                writeln!(writer, "{indent}  > {line}")?;
            }
        }

        for &child in &topic.children {
            self.write_topic(writer, child, depth + 1)?;
        }

        Ok(())
    }
}

/// An owned mind-map document: sheets of topic trees plus a shared style
/// table.
///
/// This is the sink the renderers drive. Serialization is a markdown
/// outline; the topic-building interface (`create_sheet`, `add_subtopic`,
/// `set_style`, `add_marker`, `set_note`, `save`) is independent of that
/// choice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    title: String,
    styles: BTreeMap<String, TopicStyle>,
    sheets: Vec<Sheet>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn create(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            styles: BTreeMap::new(),
            sheets: Vec::new(),
        }
    }

    /// Registers a named topic style shared by all sheets.
    pub fn define_style(&mut self, id: impl Into<String>, style: TopicStyle) {
        self.styles.insert(id.into(), style);
    }

    /// The registered styles, keyed by style id.
    #[must_use]
    pub const fn styles(&self) -> &BTreeMap<String, TopicStyle> {
        &self.styles
    }

    /// Appends a sheet and returns a mutable handle to it.
    ///
    /// The sheet's root topic is labelled with the sheet title until
    /// [`Sheet::set_label`] replaces it.
    pub fn create_sheet(&mut self, title: impl Into<String>, kind: impl Into<String>) -> &mut Sheet {
        self.sheets.push(Sheet::new(title.into(), kind.into()));
        self.sheets
            .last_mut()
            .expect("a sheet was just pushed")
    }

    /// The first sheet, if any sheet has been created.
    pub fn first_sheet(&mut self) -> Option<&mut Sheet> {
        self.sheets.first_mut()
    }

    /// All sheets in creation order.
    #[must_use]
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Serializes the document as a markdown outline.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)
    }

    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "# {}", self.title)?;

        for sheet in &self.sheets {
            writeln!(writer)?;
            writeln!(writer, "## {} ({})", sheet.title, sheet.kind)?;
            writeln!(writer)?;
            sheet.write_topic(writer, 0, 0)?;
        }

        if !self.styles.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "## Styles")?;
            writeln!(writer)?;
            for (id, style) in &self.styles {
                writeln!(
                    writer,
                    "- {id}: fill {}, shape {}, line {} ({})",
                    style.fill, style.shape, style.line_color, style.line_width
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TopicStyle {
        TopicStyle {
            fill: "#CC9933".to_string(),
            shape: "rect".to_string(),
            line_color: "#994C00".to_string(),
            line_width: "2pt".to_string(),
        }
    }

    #[test]
    fn topics_nest_under_their_parents() {
        let mut doc = Document::create("Requirement Trees");
        let sheet = doc.create_sheet("TopDown", "text");
        let root = sheet.root_topic();

        let chapter = sheet.add_subtopic(root, "Authentication", true);
        let requirement = sheet.add_subtopic(chapter, "Users must sign in", true);
        sheet.add_marker(requirement, "priority-high");
        sheet.set_note(requirement, "B-001\nUsers must sign in");

        assert_eq!(sheet.children(root), vec![chapter]);
        assert_eq!(sheet.children(chapter), vec![requirement]);
        assert_eq!(sheet.label(requirement), "Users must sign in");
        assert_eq!(sheet.markers(requirement), ["priority-high"]);
    }

    #[test]
    fn saved_outline_nests_and_annotates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("map.md");

        let mut doc = Document::create("Requirement Trees");
        doc.define_style("business", style());

        let sheet = doc.create_sheet("TopDown", "text");
        sheet.set_label(sheet.root_topic(), "TopDown Requirements tree");
        let root = sheet.root_topic();
        let topic = sheet.add_subtopic(root, "Users must sign in", true);
        sheet.set_style(topic, "business");
        sheet.add_marker(topic, "priority-high");
        sheet.set_note(topic, "B-001\nUsers must sign in");

        doc.save(&path).unwrap();
        let rendered = std::fs::read_to_string(&path).unwrap();

        assert!(rendered.starts_with("# Requirement Trees\n"));
        assert!(rendered.contains("## TopDown (text)"));
        assert!(rendered.contains("- TopDown Requirements tree\n"));
        assert!(rendered.contains("  - [business] Users must sign in @priority-high [+]\n"));
        assert!(rendered.contains("    > B-001\n"));
        assert!(rendered.contains("    > Users must sign in\n"));
        assert!(rendered.contains("- business: fill #CC9933, shape rect, line #994C00 (2pt)"));
    }

    #[test]
    fn sheets_render_in_creation_order() {
        let mut doc = Document::create("Requirement Trees");
        doc.create_sheet("TopDown", "text");
        doc.create_sheet("BottomUp", "text");
        doc.create_sheet("Issues", "Issues");

        let titles: Vec<_> = doc.sheets().iter().map(Sheet::title).collect();
        assert_eq!(titles, ["TopDown", "BottomUp", "Issues"]);
    }
}
