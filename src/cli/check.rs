use std::path::{Path, PathBuf};

use clap::Parser;
use reqkit::{LoadError, storage};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Default, Parser)]
#[command(about = "Parse every document and report errors")]
pub struct Check {
    /// Documents to check (default: every document under the root)
    paths: Vec<PathBuf>,

    /// Only report failures
    #[arg(long, short)]
    quiet: bool,
}

impl Check {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let paths = super::resolve_paths(root, &self.paths);
        if paths.is_empty() {
            println!("{}", "No requirements documents found".dim());
            return Ok(());
        }

        let results = storage::load_all(&paths);
        let mut failures = 0;
        for result in &results {
            match result {
                Ok(document) => {
                    if !self.quiet {
                        let examples: usize = document
                            .requirements
                            .iter()
                            .map(|requirement| requirement.examples.len())
                            .sum();
                        println!(
                            "{} {} {}",
                            "ok".success(),
                            document.source.display(),
                            format!(
                                "({} requirements, {examples} examples)",
                                document.requirements.len()
                            )
                            .dim()
                        );
                    }
                }
                Err(error) => {
                    failures += 1;
                    println!("{} {}", "error".failure(), describe(error));
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} of {} documents failed to parse", results.len());
        }
        Ok(())
    }
}

/// Formats parse errors as `path:line: message` so editors can jump to them.
fn describe(error: &LoadError) -> String {
    match error {
        LoadError::Parse { path, source } => {
            format!("{}:{}: {}", path.display(), source.line, source.message)
        }
        other => other.to_string(),
    }
}
