use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    domain::{
        requirement::BuildError, Category, Chapter, Code, ParseMode, Requirement, Schema,
        schema::ESSENTIAL_ATTRIBUTES,
    },
    storage::Table,
};

/// Maps configured attribute names to column indexes, built once from the
/// header row.
///
/// For each attribute the header cells are probed with the configured
/// spellings; matching is exact after trimming whitespace, and the first
/// matching column wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<String, usize>,
}

impl ColumnMap {
    /// Probes a header row against the schema's column-name spellings.
    #[must_use]
    pub fn probe(header: &[String], schema: &Schema) -> Self {
        let mut columns = HashMap::new();

        for (name, probes) in schema.col_name_probes() {
            let found = header.iter().position(|cell| {
                let sanitized = cell.trim();
                probes.iter().any(|probe| sanitized == probe)
            });
            if let Some(index) = found {
                columns.insert(name.to_string(), index);
            }
        }

        tracing::debug!("column indexes: {columns:?}");
        Self { columns }
    }

    /// The cell value for an attribute in the given row.
    ///
    /// Returns `None` when no column was probed for the attribute. A row
    /// shorter than the header yields an empty value for the missing cells.
    #[must_use]
    pub fn value<'r>(&self, row: &'r [String], name: &str) -> Option<&'r str> {
        let index = *self.columns.get(name)?;
        Some(row.get(index).map_or("", String::as_str))
    }

    /// Whether a column was found for the attribute.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

/// Everything parsed out of one source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    /// The category assigned to the source.
    pub category: Category,
    /// Parsed requirements, in source row order.
    pub requirements: Vec<Requirement>,
    /// Chapters in source order; empty chapters have already been dropped.
    pub chapters: Vec<Chapter>,
    /// Codes of non-leaf requirements with no links, in source order.
    pub no_links: Vec<Code>,
    /// Codes that appeared more than once within this source, one entry per
    /// repeat occurrence.
    pub duplicates: Vec<Code>,
}

/// Parses one source table into requirements and chapters.
///
/// The first row is the header and drives column probing. A data row whose
/// code cell trims to one character or fewer is a chapter heading (named by
/// its `Requirement` cell) and closes the chapter before it; every other row
/// is a requirement.
///
/// # Errors
///
/// Returns [`SourceDataError::MissingColumn`] if the table has data rows but
/// no column could be probed for an essential attribute, and
/// [`SourceDataError::Row`] if a requirement row fails to build (for
/// example, an unrepairable attribute value in strict mode).
pub fn parse_table(
    table: &Table,
    category: Category,
    mode: ParseMode,
    schema: &Schema,
) -> Result<ParsedSource, SourceDataError> {
    let mut parsed = ParsedSource {
        category,
        requirements: Vec::new(),
        chapters: Vec::new(),
        no_links: Vec::new(),
        duplicates: Vec::new(),
    };

    let Some(header) = table.header() else {
        return Ok(parsed);
    };
    if table.is_empty() {
        return Ok(parsed);
    }

    let columns = ColumnMap::probe(header, schema);
    for name in ESSENTIAL_ATTRIBUTES {
        if !columns.contains(name) {
            return Err(SourceDataError::MissingColumn(name));
        }
    }

    let mut seen = BTreeSet::new();
    let mut chapter_name = "Default".to_string();
    let mut chapter_codes: Vec<Code> = Vec::new();

    for (offset, row) in table.data_rows().enumerate() {
        // data rows start right after the header
        let row_number = offset + 2;

        let code_cell = columns.value(row, "CodeName").unwrap_or("");
        if code_cell.trim().chars().count() <= 1 {
            // chapter heading: close the previous chapter (dropped if empty)
            let codes = std::mem::take(&mut chapter_codes);
            let name = std::mem::replace(
                &mut chapter_name,
                columns.value(row, "Requirement").unwrap_or("").to_string(),
            );
            if let Some(chapter) = Chapter::new(name, category, codes) {
                parsed.chapters.push(chapter);
            }
            continue;
        }

        let mut values: BTreeMap<String, String> = BTreeMap::new();
        for name in header_attribute_names(&columns, schema) {
            if let Some(value) = columns.value(row, name) {
                values.insert(name.to_string(), value.to_string());
            }
        }

        let requirement = Requirement::from_row(schema, category, mode, &values)
            .map_err(|source| SourceDataError::Row {
                row: row_number,
                source,
            })?;

        if requirement.links().is_empty() && category != Category::System {
            parsed.no_links.push(requirement.code().clone());
        }

        if !seen.insert(requirement.code().clone()) {
            parsed.duplicates.push(requirement.code().clone());
        }

        chapter_codes.push(requirement.code().clone());
        parsed.requirements.push(requirement);
    }

    if let Some(chapter) = Chapter::new(chapter_name, category, chapter_codes) {
        parsed.chapters.push(chapter);
    }

    tracing::info!(
        "parsed {} ({category}) requirements, {} with no links, {} with a duplicate code",
        parsed.requirements.len(),
        parsed.no_links.len(),
        parsed.duplicates.len()
    );

    Ok(parsed)
}

fn header_attribute_names<'s>(
    columns: &'s ColumnMap,
    schema: &'s Schema,
) -> impl Iterator<Item = &'s str> {
    schema
        .col_name_probes()
        .map(|(name, _)| name)
        .filter(|name| columns.contains(name))
}

/// A source table that cannot be parsed. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum SourceDataError {
    /// No column was probed for an essential attribute.
    #[error("no column found for essential attribute '{0}'")]
    MissingColumn(&'static str),

    /// A requirement row failed to build.
    #[error("row {row}: {source}")]
    Row {
        /// 1-based row number in the source table (the header is row 1).
        row: usize,
        /// The underlying build failure.
        source: BuildError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Config;

    fn schema() -> Schema {
        Config::default().attributes
    }

    const HEADER: &str = "ID\tCode Name\tRequirement\tLink\tPriority";

    #[test]
    fn parses_requirements_in_source_order() {
        let content = format!(
            "{HEADER}\n\
             1\tB-001\tFirst need\tU-001\\nU-002\tHigh\n\
             2\tB-002\tSecond need\t\tLow\n"
        );
        let table = Table::parse(&content);
        let parsed =
            parse_table(&table, Category::Business, ParseMode::Lenient, &schema()).unwrap();

        assert_eq!(parsed.requirements.len(), 2);
        assert_eq!(parsed.requirements[0].code().as_str(), "B-001");
        assert_eq!(parsed.requirements[0].links(), ["U-001", "U-002"]);
        assert_eq!(
            parsed.requirements[0].attribute("Priority").unwrap().value(),
            Some("High")
        );

        // B-002 has no links and business is not the leaf category
        let no_links: Vec<_> = parsed.no_links.iter().map(Code::as_str).collect();
        assert_eq!(no_links, ["B-002"]);
    }

    #[test]
    fn chapter_rows_split_the_sequence() {
        let content = format!(
            "{HEADER}\n\
             \t\tAuthentication\t\t\n\
             1\tU-001\tSign in\tS-001\t\n\
             \t\tReporting\t\t\n\
             2\tU-002\tExport data\tS-002\t\n\
             3\tU-003\tPrint data\tS-003\t\n"
        );
        let table = Table::parse(&content);
        let parsed =
            parse_table(&table, Category::User, ParseMode::Lenient, &schema()).unwrap();

        // the initial "Default" chapter is empty and dropped
        assert_eq!(parsed.chapters.len(), 2);
        assert_eq!(parsed.chapters[0].name(), "Authentication");
        let first: Vec<_> = parsed.chapters[0].codes().map(Code::as_str).collect();
        assert_eq!(first, ["U-001"]);

        assert_eq!(parsed.chapters[1].name(), "Reporting");
        let second: Vec<_> = parsed.chapters[1].codes().map(Code::as_str).collect();
        assert_eq!(second, ["U-002", "U-003"]);
    }

    #[test]
    fn requirements_before_any_heading_fall_into_the_default_chapter() {
        let content = format!("{HEADER}\n1\tS-001\tBoot quickly\t\t\n");
        let table = Table::parse(&content);
        let parsed =
            parse_table(&table, Category::System, ParseMode::Lenient, &schema()).unwrap();

        assert_eq!(parsed.chapters.len(), 1);
        assert_eq!(parsed.chapters[0].name(), "Default");
    }

    #[test]
    fn leaf_category_is_not_flagged_for_missing_links() {
        let content = format!("{HEADER}\n1\tS-001\tBoot quickly\t\t\n");
        let table = Table::parse(&content);
        let parsed =
            parse_table(&table, Category::System, ParseMode::Lenient, &schema()).unwrap();
        assert!(parsed.no_links.is_empty());
    }

    #[test]
    fn intra_source_duplicates_are_recorded() {
        let content = format!(
            "{HEADER}\n\
             1\tU-001\tSign in\tS-001\t\n\
             2\tU-001\tSign in again\tS-002\t\n"
        );
        let table = Table::parse(&content);
        let parsed =
            parse_table(&table, Category::User, ParseMode::Lenient, &schema()).unwrap();

        assert_eq!(parsed.requirements.len(), 2);
        let duplicates: Vec<_> = parsed.duplicates.iter().map(Code::as_str).collect();
        assert_eq!(duplicates, ["U-001"]);
    }

    #[test]
    fn missing_essential_column_fails() {
        let table = Table::parse("ID\tRequirement\tLink\n1\tNo code column\t\n");
        let err = parse_table(&table, Category::User, ParseMode::Lenient, &schema())
            .unwrap_err();
        assert!(matches!(err, SourceDataError::MissingColumn("CodeName")));
    }

    #[test]
    fn strict_attribute_failure_carries_the_row_number() {
        let content = format!("{HEADER}\n1\tU-001\tSign in\tS-001\turgent\n");
        let table = Table::parse(&content);
        let err =
            parse_table(&table, Category::User, ParseMode::Strict, &schema()).unwrap_err();

        match err {
            SourceDataError::Row { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_table_parses_to_nothing() {
        let table = Table::parse("");
        let parsed =
            parse_table(&table, Category::User, ParseMode::Lenient, &schema()).unwrap();
        assert!(parsed.requirements.is_empty());
        assert!(parsed.chapters.is_empty());
    }

    #[test]
    fn header_only_table_ignores_missing_columns() {
        let table = Table::parse("Completely\tUnrelated\n");
        let parsed =
            parse_table(&table, Category::User, ParseMode::Lenient, &schema()).unwrap();
        assert!(parsed.requirements.is_empty());
    }

    #[test]
    fn header_cells_are_trimmed_before_probing() {
        let content = "ID \t Code Name\t Requirement \tLink\n1\tU-001\tSign in\tS-001\n";
        let table = Table::parse(content);
        let parsed =
            parse_table(&table, Category::User, ParseMode::Lenient, &schema()).unwrap();
        assert_eq!(parsed.requirements.len(), 1);
    }
}
