// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Porchlight - a community question-answering router.
//!
//! This is the binary entry point for the Porchlight server and shell.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod shell;
mod wiring;

/// Porchlight - a community question-answering router.
#[derive(Parser, Debug)]
#[command(name = "porchlight", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Porchlight HTTP server.
    Serve,
    /// Launch an interactive question-answering session.
    Shell,
    /// Print the effective configuration and any validation problems.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match porchlight_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Shell => shell::run_shell(config).await,
        Commands::Config => {
            print_config(&config);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &porchlight_config::PorchlightConfig) {
    match toml_like_summary(config) {
        Ok(summary) => println!("{summary}"),
        Err(e) => eprintln!("error: could not render configuration: {e}"),
    }

    let errors = porchlight_config::validate(config);
    if !errors.is_empty() {
        eprintln!("\nconfiguration problems:");
        for error in errors {
            eprintln!("  - {error}");
        }
    }
}

fn toml_like_summary(
    config: &porchlight_config::PorchlightConfig,
) -> Result<String, serde_json::Error> {
    // Secrets stay out of the summary.
    let mut value = serde_json::to_value(config)?;
    if let Some(llm) = value.get_mut("llm").and_then(|v| v.as_object_mut()) {
        if llm.get("api_key").map(|k| !k.is_null()).unwrap_or(false) {
            llm.insert("api_key".into(), serde_json::json!("[redacted]"));
        }
    }
    serde_json::to_string_pretty(&value)
}
