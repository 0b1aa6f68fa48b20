use clap::Parser;
use reqmap::render::{RenderOptions, TreeRenderer};
use tracing::instrument;

use super::Context;

/// Render the traceability mind maps.
#[derive(Debug, Parser)]
#[command(about = "Render traceability mind maps from the parsed sources")]
pub struct Render {
    /// The filename stem for the rendered map(s)
    #[arg(short, long, default_value = "requirements")]
    filename: String,

    /// Produce two separate maps, one for topdown and the other for
    /// bottomup traceability. Requirements are always the same; the two
    /// maps trace them in opposite directions.
    #[arg(short, long)]
    independent: bool,

    /// Do not show issues such as orphaned and non-linked requirements
    #[arg(short = 'p', long)]
    no_orphans: bool,

    /// Do not render requirement topics as folded
    #[arg(short, long)]
    no_folded: bool,

    /// Cap traversal depth below each chapter root
    #[arg(long, value_name = "LEVELS")]
    max_depth: Option<usize>,
}

impl Default for Render {
    fn default() -> Self {
        Self {
            filename: "requirements".to_string(),
            independent: false,
            no_orphans: false,
            no_folded: false,
            max_depth: None,
        }
    }
}

impl Render {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let (index, report) = context.load_index()?;

        for file in &report.files {
            println!(
                "Parsed {} ({}) requirements from {}: {} without links, {} duplicate code(s)",
                file.requirements,
                file.category,
                file.path.display(),
                file.no_links,
                file.duplicates
            );
        }
        println!("{} total requirements parsed\n", index.len());

        let options = RenderOptions {
            render_orphans: !self.no_orphans,
            render_folded: !self.no_folded,
            max_depth: self.max_depth,
        };
        let renderer = TreeRenderer::new(&index, &context.config).with_options(options);

        if self.independent {
            let (top_down, bottom_up) = renderer.render_independent(&self.filename)?;
            println!(
                "Rendered to files {} and {}.",
                top_down.display(),
                bottom_up.display()
            );
        } else {
            let path = renderer.render_unified(&self.filename)?;
            println!("Rendered to {}", path.display());
        }

        Ok(())
    }
}
