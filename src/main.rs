use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use ruleflow_rs::rule::{Filter, Rule, RuleSetLoader};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Which rule to apply: an inline condition, or a named rule from a rule set
#[derive(clap::Args, Debug)]
struct RuleArgs {
    /// Inline condition, e.g. "counter > 0 and counter < 10"
    #[arg(short, long, conflicts_with = "rule")]
    when: Option<String>,

    /// Rule set file (defaults to $RULEFLOW_RULES)
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Name of the rule inside the rule set
    #[arg(long)]
    rule: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print whether each record satisfies the rule
    Check {
        #[command(flatten)]
        selector: RuleArgs,

        /// JSON or YAML file holding one record or a list of records
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the records that satisfy the rule
    Filter {
        #[command(flatten)]
        selector: RuleArgs,

        /// JSON or YAML file holding one record or a list of records
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the condition a rule compiles to
    Explain {
        #[command(flatten)]
        selector: RuleArgs,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Check { selector, input } => {
            let rule = load_rule(&selector)?;
            for (i, record) in load_records(&input)?.iter().enumerate() {
                println!("{}: {}", i, rule.is_satisfied(record));
            }
        }
        Commands::Filter { selector, input } => {
            let rule = load_rule(&selector)?;
            let records = load_records(&input)?;
            let kept: Vec<&Value> = records.iter().satisfying(&rule).collect();
            log::info!("{} of {} records matched", kept.len(), records.len());
            println!("{}", serde_json::to_string_pretty(&kept)?);
        }
        Commands::Explain { selector } => {
            let rule = load_rule(&selector)?;
            println!("condition: {}", rule.predicate().to_condition()?);
            if let Some(description) = rule.description() {
                println!("description: {}", description);
            }
        }
    }

    Ok(())
}

fn load_rule(args: &RuleArgs) -> anyhow::Result<Rule<Value>> {
    if let Some(condition) = &args.when {
        return Rule::parse(condition).with_context(|| format!("Invalid condition: {}", condition));
    }

    let Some(name) = &args.rule else {
        bail!("Either --when or --rule must be given");
    };
    let path = match &args.rules {
        Some(path) => path.clone(),
        None => std::env::var("RULEFLOW_RULES")
            .map(PathBuf::from)
            .context("No rule set given: pass --rules or set RULEFLOW_RULES")?,
    };

    log::info!("Using rule '{}' from {}", name, path.display());
    let book = RuleSetLoader::new()
        .load_rule_set(&path)
        .with_context(|| format!("Failed to load rule set {}", path.display()))?
        .build::<Value>()?;
    Ok(book.get(name)?.clone())
}

fn load_records(path: &Path) -> anyhow::Result<Vec<Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    Ok(match value {
        Value::Array(records) => records,
        single => vec![single],
    })
}
