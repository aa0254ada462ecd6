use std::sync::Arc;

use clap::Args;
use haptic_timer_core::events::Event;
use haptic_timer_core::feedback::FeedbackDispatcher;
use haptic_timer_core::liveness::{LivenessSession, ProcessLiveness};
use haptic_timer_core::timer::{Command, CountdownClock, TimerDriver, TimerDuration};
use haptic_timer_core::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::channels;

const EXPLANATION: &str = "To keep the countdown signalling while this process may be \
suspended, the timer schedules notifications as a fallback. Type `allow` or `deny`.";

#[derive(Args)]
pub struct RunArgs {
    /// Countdown length in seconds (1-3600). Defaults to the configured duration
    #[arg(long)]
    duration: Option<u64>,
    /// Start immediately instead of waiting for `start`
    #[arg(long)]
    start: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(args));
    // a pending stdin read cannot be cancelled; don't wait for it
    runtime.shutdown_background();
    result
}

async fn session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let duration = match args.duration {
        Some(secs) => TimerDuration::new(secs)?,
        None => config.duration(),
    };

    let dispatcher = FeedbackDispatcher::new(channels::from_config(&config));
    let liveness = LivenessSession::new(Arc::new(ProcessLiveness), dispatcher.notifications())
        .with_max_pending(config.notifications.max_pending);
    let initial_permission = config.permission_gate();
    let clock = CountdownClock::new(duration, dispatcher, liveness)
        .with_toggles(config.intervals)
        .with_permission(initial_permission);

    let (event_tx, mut events) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    // a terminal process is never suspended; the channel just stays open
    let (_liveness_tx, liveness_rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(TimerDriver::new(clock, event_tx).run(command_rx, liveness_rx));

    if args.start {
        command_tx.send(Command::Start)?;
    } else {
        command_tx.send(Command::Snapshot)?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut running = args.start;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => match parse_command(&line) {
                        Ok(Some(command)) => send(&command_tx, command),
                        Ok(None) => {}
                        Err(msg) => eprintln!("{msg}"),
                    },
                    None => {
                        stdin_open = false;
                        if !running {
                            send(&command_tx, Command::Shutdown);
                        }
                    }
                }
            }
            event = events.recv() => {
                // the driver closes the stream when it stops
                let Some(event) = event else { break };
                println!("{}", serde_json::to_string(&event)?);
                match event {
                    Event::TimerStarted { .. } | Event::TimerResumed { .. } => running = true,
                    Event::TimerPaused { .. } | Event::TimerReset { .. } => {
                        running = false;
                        if !stdin_open {
                            send(&command_tx, Command::Shutdown);
                        }
                    }
                    Event::TimerFinished { .. } => {
                        running = false;
                        send(&command_tx, Command::Shutdown);
                    }
                    Event::PermissionExplanationRequested { .. } => eprintln!("{EXPLANATION}"),
                    _ => {}
                }
            }
        }
    }

    let clock = driver.await?;
    if config.record_permission(clock.permission()) {
        if let Err(e) = config.save() {
            warn!(error = %e, "could not persist notification permission");
        }
    }
    Ok(())
}

/// The driver may already have stopped; its event stream closing ends the
/// session either way.
fn send(commands: &mpsc::UnboundedSender<Command>, command: Command) {
    let _ = commands.send(command);
}

/// Map one line of stdin to a driver command. Blank lines are ignored.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "start" | "resume" => Command::Start,
        "pause" => Command::Pause,
        "toggle" => Command::Toggle,
        "stop" => Command::Stop,
        "reset" => Command::Reset,
        "allow" => Command::ConfirmPermission,
        "deny" => Command::DeclinePermission,
        "status" => Command::Snapshot,
        "quit" | "exit" => Command::Shutdown,
        "duration" => {
            let secs = words
                .next()
                .ok_or("usage: duration <seconds>")?
                .parse::<u64>()
                .map_err(|e| format!("invalid duration: {e}"))?;
            Command::SetDuration(secs)
        }
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timer_commands() {
        assert_eq!(parse_command("start"), Ok(Some(Command::Start)));
        assert_eq!(parse_command("  Pause "), Ok(Some(Command::Pause)));
        assert_eq!(parse_command("allow"), Ok(Some(Command::ConfirmPermission)));
        assert_eq!(parse_command("quit"), Ok(Some(Command::Shutdown)));
        assert_eq!(parse_command("duration 90"), Ok(Some(Command::SetDuration(90))));
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn rejects_unknown_and_malformed_commands() {
        assert!(parse_command("launch").is_err());
        assert!(parse_command("duration").is_err());
        assert!(parse_command("duration soon").is_err());
    }
}
