use clap::Subcommand;
use haptic_timer_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get {
        /// Dot-separated key, see `config keys`
        key: String,
    },
    /// Change one setting and save
    Set {
        /// Dot-separated key, see `config keys`
        key: String,
        /// New value ("none" clears `feedback.sounds_dir`)
        value: String,
    },
    /// Print every setting as `key = value`
    List {
        /// Print the whole config as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Print the settable keys
    Keys,
    /// Restore the defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = lookup(&config, &key)?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            match config.set(&key, &value) {
                Err(ConfigError::UnknownKey(_)) => return Err(unknown_key(&config, &key)),
                other => other?,
            }
            println!("{key} = {}", lookup(&config, &key)?);
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for key in config.keys() {
                    println!("{key} = {}", lookup(&config, &key)?);
                }
            }
        }
        ConfigAction::Keys => {
            for key in Config::default().keys() {
                println!("{key}");
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

/// Value of a leaf key, with an unset optional shown as "none".
fn lookup(config: &Config, key: &str) -> Result<String, Box<dyn std::error::Error>> {
    if !config.keys().iter().any(|k| k == key) {
        return Err(unknown_key(config, key));
    }
    match config.get(key) {
        Some(value) if value == "null" => Ok("none".to_string()),
        Some(value) => Ok(value),
        None => Err(unknown_key(config, key)),
    }
}

fn unknown_key(config: &Config, key: &str) -> Box<dyn std::error::Error> {
    format!(
        "unknown key: {key}\nvalid keys:\n  {}",
        config.keys().join("\n  ")
    )
    .into()
}
