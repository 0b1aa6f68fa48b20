use std::{
    io,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use walkdir::WalkDir;

use crate::{
    domain::{Category, ParseMode, RequirementIndex, Schema},
    storage::{parse_table, ParsedSource, SourceDataError, Table},
};

/// Per-file summary of one parsed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// The source file.
    pub path: PathBuf,
    /// The category assigned from the file name.
    pub category: Category,
    /// Number of requirements parsed.
    pub requirements: usize,
    /// Number of non-leaf requirements with no links.
    pub no_links: usize,
    /// Number of intra-file duplicate code occurrences.
    pub duplicates: usize,
}

/// Summary of a whole directory load, one entry per source file in the
/// order the files were merged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Per-file summaries.
    pub files: Vec<FileReport>,
}

impl LoadReport {
    /// Total number of requirement rows parsed across all files, before
    /// duplicate merging.
    #[must_use]
    pub fn total_parsed(&self) -> usize {
        self.files.iter().map(|file| file.requirements).sum()
    }
}

/// A source file that could not be loaded. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The offending file.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The file could not be parsed.
    #[error("invalid source data in {path}: {source}")]
    Source {
        /// The offending file.
        path: PathBuf,
        /// The underlying parse failure.
        source: SourceDataError,
    },
}

/// Loads every `.tsv` source under `root` into one index.
///
/// Files are discovered recursively and parsed in parallel, then merged in
/// sorted path order so the last-writer-wins duplicate policy is
/// deterministic. Each file's category comes from the leading character of
/// its file name (`B`/`U`/`S`).
///
/// # Errors
///
/// Returns the first [`LoadError`] encountered. There is no partial result:
/// a run either loads every source or fails.
pub fn load_directory(
    root: &Path,
    schema: &Schema,
    mode: ParseMode,
) -> Result<(RequirementIndex, LoadReport), LoadError> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|extension| extension == "tsv")
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    paths.sort();

    let sources: Vec<(PathBuf, ParsedSource)> = paths
        .par_iter()
        .map(|path| {
            let name = path
                .file_name()
                .and_then(std::ffi::OsStr::to_str)
                .unwrap_or("");
            let category = Category::from_source_name(name);
            tracing::info!("parsing {} for category {category}", path.display());

            let table = Table::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let parsed =
                parse_table(&table, category, mode, schema).map_err(|source| {
                    LoadError::Source {
                        path: path.clone(),
                        source,
                    }
                })?;
            Ok((path.clone(), parsed))
        })
        .collect::<Result<_, LoadError>>()?;

    let mut index = RequirementIndex::new();
    let mut report = LoadReport::default();

    for (path, source) in sources {
        report.files.push(FileReport {
            path,
            category: source.category,
            requirements: source.requirements.len(),
            no_links: source.no_links.len(),
            duplicates: source.duplicates.len(),
        });

        for requirement in source.requirements {
            index.insert(requirement);
        }
        for chapter in source.chapters {
            index.push_chapter(chapter);
        }
    }

    Ok((index, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Config;

    fn schema() -> Schema {
        Config::default().attributes
    }

    fn write_source(dir: &Path, name: &str, body: &str) {
        let content = format!("ID\tCode Name\tRequirement\tLink\n{body}");
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_and_merges_a_source_tree() {
        let tmp = tempfile::tempdir().unwrap();
        write_source(
            tmp.path(),
            "B-needs.tsv",
            "1\tB-001\tFirst need\tU-001\n",
        );
        write_source(
            tmp.path(),
            "U-features.tsv",
            "1\tU-001\tSign in\tS-001\n",
        );
        write_source(tmp.path(), "S-components.tsv", "1\tS-001\tAuth service\t\n");

        let (index, report) =
            load_directory(tmp.path(), &schema(), ParseMode::Lenient).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(report.total_parsed(), 3);
        assert_eq!(report.files.len(), 3);
        assert_eq!(index.get("B-001").unwrap().category(), Category::Business);
        assert_eq!(index.get("U-001").unwrap().category(), Category::User);
        assert_eq!(index.get("S-001").unwrap().category(), Category::System);
        assert_eq!(index.chapters().len(), 3);
    }

    #[test]
    fn merge_order_is_sorted_by_path() {
        let tmp = tempfile::tempdir().unwrap();
        // both files define U-001; the later path must win
        write_source(tmp.path(), "U-a.tsv", "1\tU-001\tFrom file a\tS-001\n");
        write_source(tmp.path(), "U-b.tsv", "1\tU-001\tFrom file b\tS-001\n");

        let (index, _) = load_directory(tmp.path(), &schema(), ParseMode::Lenient).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("U-001").unwrap().text(), "From file b");
        assert_eq!(index.duplicates().len(), 1);
    }

    #[test]
    fn non_tsv_files_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "not a source").unwrap();
        write_source(tmp.path(), "S-components.tsv", "1\tS-001\tAuth service\t\n");

        let (index, report) =
            load_directory(tmp.path(), &schema(), ParseMode::Lenient).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn unrecognised_prefix_maps_to_unknown_category() {
        let tmp = tempfile::tempdir().unwrap();
        write_source(tmp.path(), "misc.tsv", "1\tX-001\tMystery\t\n");

        let (index, _) = load_directory(tmp.path(), &schema(), ParseMode::Lenient).unwrap();
        assert_eq!(index.get("X-001").unwrap().category(), Category::Unknown);
    }

    #[test]
    fn unreadable_source_data_aborts_the_load() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("U-bad.tsv"), "ID\tRequirement\n1\tNo code\n")
            .unwrap();

        let err = load_directory(tmp.path(), &schema(), ParseMode::Lenient).unwrap_err();
        assert!(matches!(err, LoadError::Source { .. }));
    }

    #[test]
    fn empty_directory_loads_an_empty_index() {
        let tmp = tempfile::tempdir().unwrap();
        let (index, report) =
            load_directory(tmp.path(), &schema(), ParseMode::Lenient).unwrap();
        assert!(index.is_empty());
        assert!(report.files.is_empty());
    }
}
