use clap::Parser;
use indicatif::ProgressBar;
use reqmap::semantic::{SemanticChecker, TokenOverlap};
use tracing::instrument;

use super::Context;

/// Parse a similarity score, bounded to `[0, 1]`.
fn parse_score(s: &str) -> Result<f64, String> {
    let score: f64 = s
        .parse()
        .map_err(|_| format!("{s} should be a decimal value between 0 and 1"))?;
    if (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(format!("{s} should be a decimal value between 0 and 1"))
    }
}

/// Scan requirement texts for semantic duplicates.
#[derive(Debug, Parser)]
#[command(about = "Check requirements for potential duplicates by text similarity")]
pub struct Check {
    /// Minimum semantic similarity score to report. Lower it to see more
    /// results.
    #[arg(short = 's', long, default_value_t = 0.8, value_parser = parse_score)]
    min_score: f64,

    /// Maximum semantic similarity score to report. Lower it to cut exact
    /// duplicates out of the report.
    #[arg(short, long, default_value_t = 1.0, value_parser = parse_score)]
    max_score: f64,
}

impl Check {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let (index, _report) = context.load_index()?;

        println!("Running a semantic scan on the requirements to identify potential duplicates.");
        println!("Using threshold {} to {}", self.min_score, self.max_score);

        let checker =
            SemanticChecker::new(&index, TokenOverlap::new(), self.min_score, self.max_score);

        let bar = ProgressBar::new(index.len() as u64);
        let report = checker.check_with(|done| bar.set_position(done as u64));
        bar.finish_and_clear();

        println!();
        println!("Similarity ranges (every requirement is checked against all the others):");
        for (decile, count) in &report.ranges {
            println!("Percentile {decile}: {count} matches");
        }
        println!();

        for found in &report.matches {
            let first = index
                .get(&found.first)
                .map_or_else(|| found.first.to_string(), ToString::to_string);
            let second = index
                .get(&found.second)
                .map_or_else(|| found.second.to_string(), ToString::to_string);
            println!("Req1: {first}\nReq2: {second}\n*** Score: {:.3}\n", found.score);
        }

        if report.matches.is_empty() {
            println!("No pairs scored inside the configured window.");
        }

        Ok(())
    }
}
