//! hclast CLI entry point.

use std::io::Read;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hclast_core::{AstConfig, bridge};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hclast")]
#[command(about = "Serialize HCL expressions as JSON ASTs")]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Spaces per indentation level (overrides the config file)
    #[arg(long, global = true)]
    indent: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lift a JSON-syntax expression and print its AST
    ExpressionAst {
        /// Input file (or - for stdin)
        file: String,

        /// Filename used in diagnostics
        #[arg(long)]
        filename: Option<String>,
    },

    /// Parse a native-syntax expression and print its AST
    NativeAst {
        /// Input file (or - for stdin)
        file: String,

        /// Filename used in diagnostics
        #[arg(long)]
        filename: Option<String>,
    },

    /// Invoke a host function by name
    Call {
        /// Function name, e.g. getExpressionAst
        name: String,

        /// Function arguments
        args: Vec<String>,
    },
}

fn read_input(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
    }
}

fn run(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AstConfig::from_file(path)?,
        None => AstConfig::default(),
    };
    if let Some(indent) = cli.indent {
        config.indent = indent;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log.parse()?))
        .init();
    debug!(?config, "loaded configuration");

    let out = match cli.command {
        Commands::ExpressionAst { file, filename } => {
            let source = read_input(&file)?;
            let filename = filename.unwrap_or(file);
            info!(filename = %filename, "serializing JSON expression");
            bridge::expression_ast(&filename, &source, &config)?
        }
        Commands::NativeAst { file, filename } => {
            let source = read_input(&file)?;
            let filename = filename.unwrap_or(file);
            info!(filename = %filename, "serializing native expression");
            bridge::native_expression_ast(&filename, &source, &config)?
        }
        Commands::Call { name, args } => bridge::call(&name, &args, &config)?,
    };
    Ok(out)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
