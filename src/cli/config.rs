//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::Result;
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "device.source")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    if args.path {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }

    if args.reset {
        Config::default().save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;

    match (&args.key, &args.value) {
        (None, None) => show_all_config(&config),

        (Some(key), None) => match config.get(key) {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("Unknown config key: {}", key);
                eprintln!("\nAvailable keys:");
                for k in Config::available_keys() {
                    eprintln!("  {}", k);
                }
                std::process::exit(1);
            }
        },

        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }

        (None, Some(_)) => {
            eprintln!("Error: Must specify a key to set a value");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Display all configuration values, grouped by section
fn show_all_config(config: &Config) {
    let mut section = "";
    for key in Config::available_keys() {
        let (prefix, name) = key.split_once('.').unwrap_or(("", key));
        if prefix != section {
            if !section.is_empty() {
                println!();
            }
            println!("[{}]", prefix);
            section = prefix;
        }

        let value = config.get(key).unwrap_or_default();
        if key == "api_keys.google" && !value.is_empty() {
            println!("{} = \"***\" # configured", name);
        } else {
            println!("{} = \"{}\"", name, value);
        }
    }

    println!();
    println!("[url.providers]");
    for (name, template) in &config.url.providers {
        println!("{} = \"{}\"", name, template);
    }
}
