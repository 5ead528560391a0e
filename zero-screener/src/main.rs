//! Zero Screener - command-line access to the filter expression tools.
//!
//! Every command prints JSON to stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use zero_common::config::Config;
use zero_common::logging::init_logging;
use zero_screener::expression::{self, RenderOptions};
use zero_screener::{
    ConditionList, Diagnostic, FieldCategory, FieldDescriptor, FieldDictionary, Operator,
};

/// Validate, parse and render stock screener filter expressions.
#[derive(Parser, Debug)]
#[command(name = "zero-screener")]
#[command(version)]
#[command(about = "Stock screener filter expression tools", long_about = None)]
struct Cli {
    /// Config file (default: ~/.codecoder/screener.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Field dictionary JSON, overriding the configured one
    #[arg(long, global = true)]
    dictionary: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check an expression and print the diagnostic
    Validate {
        /// Expression text
        expression: String,
    },

    /// Recover a condition list from an expression
    Parse {
        /// Expression text
        expression: String,
    },

    /// Render a condition list (JSON file) as expression text
    Serialize {
        /// JSON array of conditions
        rules: PathBuf,

        /// Keep everything on one line
        #[arg(long)]
        single_line: bool,

        /// Render ranges as `BETWEEN [min, max]`
        #[arg(long)]
        keyword: bool,
    },

    /// List dictionary fields with their applicable operators
    Fields {
        /// basic, technical or fundamental
        #[arg(long)]
        category: Option<FieldCategory>,
    },

    /// List operators
    Operators,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldRow<'a> {
    #[serde(flatten)]
    field: &'a FieldDescriptor,
    operators: Vec<Operator>,
}

#[derive(Serialize)]
struct SerializeOutput {
    expression: String,
    diagnostic: Diagnostic,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env_overrides();
            config
        }
        None => Config::load_with_env()?,
    };
    if let Some(path) = cli.dictionary.clone() {
        config.screener.dictionary_path = Some(path);
    }
    config.validate().context("Invalid configuration")?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );
    tracing::debug!("Zero Screener v{}", env!("CARGO_PKG_VERSION"));

    let dictionary = FieldDictionary::from_config(&config.screener)?;

    match cli.command {
        Commands::Validate { expression } => {
            let diagnostic = expression::validate(&expression);
            print_json(&diagnostic)?;
            if !diagnostic.valid {
                std::process::exit(1);
            }
        }
        Commands::Parse { expression } => {
            let outcome = expression::parse(&expression, &dictionary);
            print_json(&outcome)?;
        }
        Commands::Serialize {
            rules,
            single_line,
            keyword,
        } => {
            let content = std::fs::read_to_string(&rules)
                .with_context(|| format!("Failed to read rules from {}", rules.display()))?;
            let conditions: ConditionList = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse rules from {}", rules.display()))?;

            let mut options = RenderOptions::from(&config.screener);
            if single_line {
                options.layout = RenderOptions::single_line().layout;
            }
            if keyword {
                options.range_style = RenderOptions::keyword().range_style;
            }

            let expression = expression::serialize_with(&conditions, &dictionary, options);
            let diagnostic = expression::validate(&expression);
            print_json(&SerializeOutput {
                expression,
                diagnostic,
            })?;
        }
        Commands::Fields { category } => {
            print_json(&field_rows(&dictionary, category))?;
        }
        Commands::Operators => {
            let descriptors: Vec<_> = Operator::ALL.iter().map(|op| op.descriptor()).collect();
            print_json(&descriptors)?;
        }
    }

    Ok(())
}

fn field_rows(dictionary: &FieldDictionary, category: Option<FieldCategory>) -> Vec<FieldRow<'_>> {
    dictionary
        .fields()
        .iter()
        .filter(|field| category.map_or(true, |c| field.category == c))
        .map(|field| FieldRow {
            field,
            operators: dictionary.operators_for(&field.key),
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
