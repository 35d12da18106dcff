pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use logex_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "logex",
    about = "Logex customer-service assistant CLI",
    long_about = concat!(
        "Ask the Logex assistant questions, chat with it, exercise its logistics tools ",
        "offline, and inspect configuration."
    ),
    after_help = concat!(
        "Examples:\n",
        "  logex ask \"Where is order ORD123456?\"\n",
        "  logex call calculate_shipping_cost ",
        "--args '{\"length\":10,\"width\":10,\"height\":10,\"weight\":2}'\n",
        "  logex doctor --json"
    )
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a logex.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the configured log level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer a single question and print the reply")]
    Ask {
        query: String,
        #[arg(long, help = "Customer contact identifier passed to the assistant")]
        contact_id: Option<String>,
    },
    #[command(about = "Interactive session over stdin (/history prints the log, /exit quits)")]
    Chat {
        #[arg(long, help = "Customer contact identifier passed to the assistant")]
        contact_id: Option<String>,
    },
    #[command(about = "Print the tool catalog offered to the model")]
    Tools,
    #[command(about = "Invoke one tool directly with JSON arguments, without a model")]
    Call {
        tool: String,
        #[arg(long, default_value = "{}", help = "Tool arguments as a JSON object")]
        args: String,
        #[arg(long, help = "Seed for the tools that roll dice")]
        seed: Option<u64>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, model client readiness, and the tool catalog")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self, contact_id: Option<String>) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                log_level: self.log_level.clone(),
                contact_id,
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let base_options = cli.load_options(None);
    let logging = AppConfig::load(base_options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    if let Err(error) = logging::init(&logging, cli.log_level.as_deref()) {
        eprintln!("logex: {error:#}");
    }

    let result = match &cli.command {
        Command::Ask { query, contact_id } => {
            commands::ask::run(&cli.load_options(contact_id.clone()), query)
        }
        Command::Chat { contact_id } => commands::chat::run(&cli.load_options(contact_id.clone())),
        Command::Tools => commands::tools::run(),
        Command::Call { tool, args, seed } => commands::call::run(tool, args, *seed),
        Command::Config => commands::config::run(&base_options),
        Command::Doctor { json } => commands::doctor::run(&base_options, *json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
