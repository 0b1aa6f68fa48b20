use std::process;

use clap::Parser;
use reqmap::trace::{self, CategoryFindings, Diagnostics};
use tracing::instrument;

use super::{
    terminal::{is_narrow, Colorize},
    Context,
};

/// Headless diagnostics over the parsed sources.
#[derive(Debug, Parser)]
#[command(about = "Report orphans, missing links, duplicates and cycles")]
pub struct Validate {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress everything except the summary line
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Validate {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let (index, _report) = context.load_index()?;
        let diagnostics = trace::diagnose(&index);

        match self.output {
            OutputFormat::Json => Self::output_json(&diagnostics)?,
            OutputFormat::Table => self.output_table(&diagnostics),
        }

        // Exit with code 2 when the sources need attention (for CI).
        if !diagnostics.is_empty() {
            process::exit(2);
        }

        Ok(())
    }

    fn output_json(diagnostics: &Diagnostics) -> anyhow::Result<()> {
        use serde_json::json;

        let findings = |groups: &[CategoryFindings]| {
            groups
                .iter()
                .map(|group| {
                    let codes: Vec<_> =
                        group.codes.iter().map(ToString::to_string).collect();
                    json!({ "category": group.category.to_string(), "codes": codes })
                })
                .collect::<Vec<_>>()
        };

        let duplicates: Vec<_> = diagnostics
            .duplicates
            .iter()
            .map(ToString::to_string)
            .collect();
        let cycles: Vec<Vec<String>> = diagnostics
            .cycles
            .iter()
            .map(|cycle| cycle.iter().map(ToString::to_string).collect())
            .collect();

        let output = json!({
            "orphans": findings(&diagnostics.orphans),
            "no_links": findings(&diagnostics.no_links),
            "duplicates": duplicates,
            "cycles": cycles,
            "summary": {
                "total_issues": diagnostics.count(),
            }
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(&self, diagnostics: &Diagnostics) {
        if !self.quiet {
            Self::findings_section("Orphaned requirements", &diagnostics.orphans);
            Self::findings_section("Requirements without links", &diagnostics.no_links);

            if diagnostics.duplicates.is_empty() {
                println!("Duplicates: {} ✅", "0".success());
            } else {
                println!(
                    "Duplicates: {} ⚠️",
                    diagnostics.duplicates.len().to_string().warning()
                );
                for code in &diagnostics.duplicates {
                    println!("  - {code}");
                }
            }

            if diagnostics.cycles.is_empty() {
                println!("Cycles: {} ✅", "0".success());
            } else {
                println!(
                    "Cycles: {} ⚠️",
                    diagnostics.cycles.len().to_string().warning()
                );
                for cycle in &diagnostics.cycles {
                    let members: Vec<_> = cycle.iter().map(ToString::to_string).collect();
                    println!("  - {}", members.join(" -> "));
                }
                println!(
                    "{}",
                    "Traversal bounds cycles, but the links should be untangled.".dim()
                );
            }

            println!();
        }

        let total = diagnostics.count();
        if total == 0 {
            println!("{}", "Sources are healthy (0 issues)".success());
        } else {
            println!("{}", format!("Summary: {total} issues found").warning());
        }
    }

    fn findings_section(title: &str, groups: &[CategoryFindings]) {
        if groups.is_empty() {
            println!("{title}: {} ✅", "0".success());
            return;
        }

        let total: usize = groups.iter().map(|group| group.codes.len()).sum();
        println!("{title}: {} ⚠️", total.to_string().warning());
        for group in groups {
            if is_narrow() {
                println!("  [{}]", group.category);
                for code in &group.codes {
                    println!("    - {code}");
                }
            } else {
                let codes: Vec<_> = group.codes.iter().map(ToString::to_string).collect();
                println!("  [{}] {}", group.category, codes.join(", "));
            }
        }
    }
}
