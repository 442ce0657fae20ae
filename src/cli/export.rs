use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use reqkit::{export::to_reqsml, storage};
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Print a document as canonical ReqsML")]
pub struct Export {
    /// The document to export
    file: PathBuf,

    /// Print nothing, and fail if the document is not already canonical
    #[arg(long)]
    check: bool,
}

impl Export {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let path = root.join(&self.file);
        let document = storage::load(&path)?;
        let canonical = to_reqsml(&document);

        if self.check {
            let original = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if original != canonical {
                anyhow::bail!("{} is not in canonical form", path.display());
            }
            tracing::info!("{} is in canonical form", path.display());
        } else {
            print!("{canonical}");
        }
        Ok(())
    }
}
