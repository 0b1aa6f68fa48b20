use std::{io, path::Path};

/// A tabular source file held in memory.
///
/// Sources are tab-separated text exports: one row per line, cells split on
/// tabs, with the first row carrying the column headers. Cells un-escape
/// `\n`, `\t` and `\\` sequences, so multi-line values (notably link lists)
/// survive the flat file format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Reads a table from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(path: &Path) -> io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parses a table from text. Trailing empty lines are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let rows = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| line.split('\t').map(unescape).collect())
            .collect();
        Self { rows }
    }

    /// The header row, if the table has any rows at all.
    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// The data rows (everything after the header).
    pub fn data_rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().skip(1).map(Vec::as_slice)
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unescape(cell: &str) -> String {
    let mut result = String::with_capacity(cell.len());
    let mut chars = cell.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}
