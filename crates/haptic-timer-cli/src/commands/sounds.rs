use std::path::PathBuf;

use clap::Args;
use haptic_timer_core::feedback::sounds;
use haptic_timer_core::storage::data_dir;

#[derive(Args)]
pub struct SoundsArgs {
    /// Output directory. Defaults to `sounds/` in the config directory
    #[arg(long)]
    dir: Option<PathBuf>,
}

pub fn run(args: SoundsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => data_dir()?.join("sounds"),
    };
    for path in sounds::generate_all(&dir)? {
        println!("{}", path.display());
    }
    println!("set `feedback.sounds_dir` to {} to require these files", dir.display());
    Ok(())
}
