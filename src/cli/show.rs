use std::path::{Path, PathBuf};

use clap::Parser;
use reqkit::{Data, Document, Example, Statement, storage};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Display the parsed model of a document")]
pub struct Show {
    /// The document to display
    file: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Yaml,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let document = storage::load(&root.join(&self.file))?;

        match self.output {
            OutputFormat::Pretty => output_pretty(&document),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&document)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&document)?),
        }

        Ok(())
    }
}

fn labels(labels: Option<&[String]>) -> String {
    labels.map_or_else(String::new, |labels| {
        format!(" [{}]", labels.join(", ")).dim()
    })
}

fn output_pretty(document: &Document) {
    println!(
        "{} {}{}",
        document.description.as_deref().unwrap_or_else(|| document.name()),
        format!("({})", document.source.display()).dim(),
        labels(document.labels.as_deref())
    );

    for requirement in &document.requirements {
        let identifier = requirement
            .identifier
            .as_deref()
            .map(|identifier| format!("#{identifier} "))
            .unwrap_or_default();
        println!(
            "\n{}{}{}",
            identifier.info(),
            requirement.description,
            labels(requirement.labels.as_deref())
        );
        for example in &requirement.examples {
            output_example(example);
        }
    }
}

fn output_example(example: &Example) {
    let description = example.description.as_deref().unwrap_or("(example)");
    println!(
        "  • {}{}",
        description,
        labels(example.labels.as_deref())
    );
    for statement in &example.statements {
        output_statement(statement);
    }
}

fn output_statement(statement: &Statement) {
    println!(
        "      {} {}",
        format!("{:>6}", statement.kind.keyword()).info(),
        statement.description
    );
    let Some(data) = &statement.data else {
        return;
    };
    let summary = match data {
        Data::Text(text) => format!("text, {} lines", text.lines().count()),
        Data::List(items) => format!("list, {} items", items.len()),
        Data::KeyValues(pairs) => format!("key values, {} entries", pairs.len()),
        Data::Table(rows) => format!("table, {} rows", rows.len()),
        Data::Matrix(rows) => format!("matrix, {} rows", rows.len()),
    };
    println!("             {}", format!("({summary})").dim());
}
