use anyhow::{Context, Result};
use clap::Parser;
use hello_crew::config::{ConfigFile, DEFAULT_CONFIG_FILE};
use hello_crew::crew::{self, CrewInputs, DEFAULT_TOPIC};
use hello_crew::{error, logging};
use hello_crew::{smoke, switcher, sync};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "hello-crew",
    about = "LM Studio model profiles, sync and a two-agent research crew"
)]
struct Cli {
    /// Path to the model configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List configured models or switch the default: list | help | <number>
    Switch {
        #[arg(allow_hyphen_values = true)]
        selection: Option<String>,
    },

    /// Inspect LM Studio or reconcile the config with it: list | sync | help
    Sync {
        #[arg(allow_hyphen_values = true)]
        action: Option<String>,
    },

    /// Run the research crew and write the report
    Run {
        /// Model profile key (defaults to settings.default_model)
        #[arg(long)]
        model: Option<String>,

        /// Research topic
        #[arg(long, default_value = DEFAULT_TOPIC)]
        topic: String,

        /// Where to write the final report
        #[arg(short, long, default_value = "report.md")]
        output: PathBuf,
    },

    /// Check that LM Studio answers with the selected model
    Smoke {
        /// Model profile key (defaults to settings.default_model)
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Switch { selection } => {
            print!("{}", switcher::run(&cli.config, selection.as_deref()));
            Ok(())
        }
        Command::Sync { action } => {
            print!("{}", sync::run(&cli.config, action.as_deref()).await);
            Ok(())
        }
        Command::Run {
            model,
            topic,
            output,
        } => run_crew(&cli.config, model.as_deref(), topic, &output).await,
        Command::Smoke { model } => {
            smoke_command(&cli.config, model.as_deref()).await;
            Ok(())
        }
    }
}

async fn run_crew(
    config_path: &Path,
    model: Option<&str>,
    topic: String,
    output: &Path,
) -> Result<()> {
    let file = ConfigFile::locate(config_path)?;
    let config = file.load()?;
    let model = config.model_config(model)?;
    println!("+ Using model: {} ({})", model.key, model.name);

    let inputs = CrewInputs::new(topic);
    let outputs = crew::run(&model, &inputs, output)
        .await
        .context("crew run failed")?;

    for out in &outputs {
        println!("+ {} finished ({}): {} chars", out.task, out.agent, out.raw.len());
    }
    println!("+ Report written to {}", output.display());
    Ok(())
}

async fn smoke_command(config_path: &Path, model: Option<&str>) {
    let model = match ConfigFile::locate(config_path)
        .and_then(|f| f.load())
        .and_then(|c| c.model_config(model))
    {
        Ok(model) => model,
        Err(e) => {
            println!("* ERROR: Failed to load configuration: {e}");
            return;
        }
    };

    println!("# Using model: {} ({})", model.key, model.name);
    println!("# Timeout: {}s", model.timeout_secs);
    println!("# Base URL: {}", model.base_url);
    println!();

    match smoke::run_checks(&model).await {
        Ok(results) => print!("{}", smoke::render_results(&results)),
        Err(e) => print!("{}", error::report(&e)),
    }
}
