use clap::Subcommand;
use haptic_timer_core::interval::IntervalTag;
use haptic_timer_core::Config;

#[derive(Subcommand)]
pub enum IntervalsAction {
    /// Show every interval and whether it is enabled
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enable feedback for an interval
    Enable {
        /// Interval (every_second, every_5s, every_10s, every_60s)
        tag: IntervalTag,
    },
    /// Disable feedback for an interval
    Disable {
        /// Interval (every_second, every_5s, every_10s, every_60s)
        tag: IntervalTag,
    },
}

pub fn run(action: IntervalsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        IntervalsAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config.intervals)?);
            } else {
                for tag in IntervalTag::ALL {
                    let state = if config.intervals.is_enabled(tag) { "on" } else { "off" };
                    println!("{:<13} {:<10} {state}", tag.key(), tag.label());
                }
            }
        }
        IntervalsAction::Enable { tag } => set(tag, true)?,
        IntervalsAction::Disable { tag } => set(tag, false)?,
    }
    Ok(())
}

fn set(tag: IntervalTag, enabled: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    config.intervals.set(tag, enabled);
    config.save()?;
    println!("{tag}: {}", if enabled { "on" } else { "off" });
    Ok(())
}
