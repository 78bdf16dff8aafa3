//! Parkour headless runner
//!
//! Loads a config (or the built-in demo), resolves assets, and lets the
//! autopilot play one session.
//!
//! ```text
//! parkour [options.json] [--seed N] [--max-ticks N] [--assets DIR] [--realtime] [--trace]
//! ```

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use parkour_sim::assets::{AssetEvent, AssetRef, FsAssetResolver};
use parkour_sim::render::{JsonLinesRenderer, LogRenderer, Renderer};
use parkour_sim::schedule::{Clock, ManualClock, SystemClock};
use parkour_sim::{Autopilot, GameEvent, GameOptions, RunSummary, Scheduler, Session, Settings};

/// Headless endless-runner demo driven by the autopilot
#[derive(Debug, Parser)]
#[command(name = "parkour", version, about)]
struct Args {
    /// JSON game options; the built-in demo when omitted
    #[arg(value_name = "OPTIONS")]
    options: Option<PathBuf>,
    /// World seed; random (or the config's) when omitted
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Stop the session after this many ticks
    #[arg(
        long = "max-ticks",
        value_name = "TICKS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    max_ticks: Option<u64>,
    /// Resolve asset ids as files under this directory
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,
    /// Sleep between ticks instead of running as fast as possible
    #[arg(long)]
    realtime: bool,
    /// Write one JSON snapshot per tick to stdout
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let options = match &args.options {
        Some(path) => GameOptions::load(path)?,
        None => {
            log::info!("No config given, using the demo settings");
            GameOptions::demo()
        }
    };
    let settings = Settings::from_options(&options)?;
    let mut session = match args.seed {
        Some(seed) => Session::with_seed(settings, seed),
        None => Session::new(settings),
    };

    match &args.assets {
        Some(root) => session.load_assets(&mut FsAssetResolver::new(root)),
        // Nothing to draw, so every asset counts as loaded
        None => session.load_assets(&mut |asset: &AssetRef| AssetEvent::Loaded(asset.id.clone())),
    }
    if !session.asset_state().failed().is_empty() {
        log::warn!(
            "{} assets failed to load",
            session.asset_state().failed().len()
        );
    }

    let viewport = session.settings().viewport;
    let summary = match (args.trace, args.realtime) {
        (true, true) => play(
            &mut session,
            JsonLinesRenderer::new(viewport, io::stdout().lock()),
            SystemClock,
            args.max_ticks,
        )?,
        (true, false) => play(
            &mut session,
            JsonLinesRenderer::new(viewport, io::stdout().lock()),
            ManualClock::default(),
            args.max_ticks,
        )?,
        (false, true) => play(
            &mut session,
            LogRenderer::new(viewport, 300),
            SystemClock,
            args.max_ticks,
        )?,
        (false, false) => play(
            &mut session,
            LogRenderer::new(viewport, 300),
            ManualClock::default(),
            args.max_ticks,
        )?,
    };

    eprintln!(
        "{:?}: score {} in {} ticks ({:.1}s simulated)",
        summary.phase,
        summary.score,
        summary.ticks,
        summary.elapsed_ms / 1000.0
    );
    Ok(())
}

fn play(
    session: &mut Session,
    renderer: impl Renderer,
    clock: impl Clock,
    max_ticks: Option<u64>,
) -> Result<RunSummary, Box<dyn Error>> {
    let mut scheduler = Scheduler::new(renderer, clock).with_max_ticks(max_ticks);
    let summary = scheduler.run(session, &mut Autopilot::default(), |event| match event {
        GameEvent::Won | GameEvent::Lost | GameEvent::Died => log::info!("{event:?}"),
        GameEvent::Jumped { .. } | GameEvent::Landed | GameEvent::Fell => log::trace!("{event:?}"),
        _ => log::debug!("{event:?}"),
    })?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = Args::try_parse_from([
            "parkour",
            "level.json",
            "--seed",
            "7",
            "--max-ticks",
            "120",
            "--trace",
        ])
        .unwrap();
        assert_eq!(args.options, Some(PathBuf::from("level.json")));
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.max_ticks, Some(120));
        assert!(args.trace);
        assert!(!args.realtime);
        assert_eq!(args.assets, None);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Args::try_parse_from(["parkour", "--max-ticks", "0"]).is_err());
        assert!(Args::try_parse_from(["parkour", "--seed"]).is_err());
        assert!(Args::try_parse_from(["parkour", "--warp"]).is_err());
    }
}
