// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - a webhook relay between Chatwoot and AI completion providers.
//!
//! This is the binary entry point for the relay.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Courier - a webhook relay between Chatwoot and AI completion providers.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay HTTP server.
    Serve,
    /// Print the resolved configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match courier_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("courier: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => print_config(config),
        None => {
            println!("courier: use --help for available commands");
        }
    }
}

/// Render the resolved configuration as TOML, with secrets replaced by a
/// presence marker.
fn print_config(config: courier_config::CourierConfig) {
    match toml::to_string_pretty(&redact(config)) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => {
            eprintln!("courier: failed to render config: {e}");
            std::process::exit(1);
        }
    }
}

fn redact(mut config: courier_config::CourierConfig) -> courier_config::CourierConfig {
    config.ai.token = config.ai.token.map(|_| "[redacted]".to_string());
    config.chatwoot.bot_token = config.chatwoot.bot_token.map(|_| "[redacted]".to_string());
    config
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn redacted_config_renders_without_secrets() {
        let mut config = courier_config::CourierConfig::default();
        config.ai.token = Some("sk-very-secret".to_string());
        config.chatwoot.bot_token = Some("cw-very-secret".to_string());

        let rendered = toml::to_string_pretty(&super::redact(config)).unwrap();
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("cw-very-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
