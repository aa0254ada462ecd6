use clap::Args;
use haptic_timer_core::interval::IntervalPolicy;
use haptic_timer_core::liveness::fallback;
use haptic_timer_core::Config;
use serde_json::json;

#[derive(Args)]
pub struct PlanArgs {
    /// Remaining seconds to plan for
    remaining: u32,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let policy = IntervalPolicy::new(config.intervals);
    let tier = policy.tier_for(args.remaining);
    let notifications = fallback::plan(
        args.remaining,
        config.intervals,
        config.notifications.max_pending,
        0,
    );

    if args.json {
        let out = json!({
            "remaining_secs": args.remaining,
            "tier": tier,
            "fallback": notifications,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match tier {
        Some(tier) => println!("tier at {}s: {tier}", args.remaining),
        None => println!("tier at {}s: none", args.remaining),
    }
    println!("fallback notifications: {}", notifications.len());
    for n in &notifications {
        println!("  +{:>4}s  {}", n.delay_secs, n.body);
    }
    Ok(())
}
