use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use regex::Regex;
use reqkit::{ExampleCase, LabelExpression, storage};
use serde::Serialize;
use tracing::instrument;

use super::terminal::Colorize;

/// Command arguments for `reqs list`.
#[derive(Debug, Parser)]
#[command(about = "List example cases and whether they are selected")]
pub struct List {
    /// Documents to list (default: every document under the root)
    paths: Vec<PathBuf>,

    /// Label expression selecting examples, e.g. "fast and not flaky"
    /// (default: `match_labels` from the config file)
    #[arg(long, value_name = "EXPR")]
    labels: Option<LabelExpression>,

    /// Only list examples whose requirement or example description matches
    #[arg(long)]
    regex: Option<String>,

    /// Hide examples the label expression excludes
    #[arg(long)]
    included_only: bool,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Output format options.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Entry {
    path: PathBuf,
    requirement: String,
    example: String,
    labels: Vec<String>,
    included: bool,
}

impl Entry {
    fn new(case: &ExampleCase<'_>) -> Self {
        Self {
            path: case.document.source.clone(),
            requirement: case.requirement.description.clone(),
            example: case
                .example
                .description
                .clone()
                .unwrap_or_else(|| case.test_name()),
            labels: case.example.labels.clone().unwrap_or_default(),
            included: case.included,
        }
    }
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let filter = self
            .labels
            .or_else(|| super::load_config(root).match_labels);
        if let Some(filter) = &filter {
            tracing::debug!(%filter, "selecting examples");
        }
        let regex = self
            .regex
            .as_deref()
            .map(|pattern| Regex::new(pattern).with_context(|| format!("invalid regex: {pattern}")))
            .transpose()?;

        let paths = super::resolve_paths(root, &self.paths);
        let mut entries = Vec::new();
        for result in storage::load_all(&paths) {
            let document = result?;
            entries.extend(
                document
                    .cases(filter.as_ref())
                    .filter(|case| case.included || !self.included_only)
                    .filter(|case| {
                        regex.as_ref().is_none_or(|regex| {
                            regex.is_match(&case.requirement.description)
                                || case
                                    .example
                                    .description
                                    .as_deref()
                                    .is_some_and(|description| regex.is_match(description))
                        })
                    })
                    .map(|case| Entry::new(&case)),
            );
        }

        match self.output {
            OutputFormat::Table => output_table(&entries),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        }
        Ok(())
    }
}

fn output_table(entries: &[Entry]) {
    if entries.is_empty() {
        println!("{}", "No examples found".dim());
        return;
    }
    let included = entries.iter().filter(|entry| entry.included).count();
    let mut current: Option<&Path> = None;
    for entry in entries {
        if current != Some(entry.path.as_path()) {
            println!("{}", entry.path.display().to_string().info());
            current = Some(&entry.path);
        }
        let marker = if entry.included {
            "✓".success()
        } else {
            "✗".dim()
        };
        let labels = if entry.labels.is_empty() {
            String::new()
        } else {
            format!(" [{}]", entry.labels.join(", ")).dim()
        };
        println!("  {marker} {} › {}{labels}", entry.requirement, entry.example);
    }
    println!(
        "\n{}",
        format!("{included} of {} examples selected", entries.len()).dim()
    );
}
