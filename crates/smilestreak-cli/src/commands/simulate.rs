use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Args;
use smilestreak_core::session::ScriptedFrames;
use smilestreak_core::storage::{self, MemoryStore, ScoreStore};
use smilestreak_core::{
    run_frame_loop, Clock, Config, ManualClock, ScoreEngine, SessionController, SystemClock,
    ThresholdClassifier,
};

use super::CmdResult;

#[derive(Args)]
pub struct SimulateArgs {
    /// JSON frame script: [{"atMs": 0, "scores": {"44": 0.9}}, {"atMs": 100, "face": false}]
    pub script: PathBuf,
    /// Record results in the configured store instead of a throwaway one
    #[arg(long)]
    pub persist: bool,
    /// Calendar day the replay happens on (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run(args: SimulateArgs) -> CmdResult {
    let config = Config::load()?;
    let json = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("cannot read {}: {e}", args.script.display()))?;

    let today = match args.date {
        Some(date) => date,
        None => SystemClock::new(config.calendar.day_boundary).today(),
    };
    let clock = Arc::new(ManualClock::new(today));
    let mut source = ScriptedFrames::from_json(clock.clone(), &json)?;

    let store: Box<dyn ScoreStore> = if args.persist {
        storage::open_store(&config.storage)?
    } else {
        Box::new(MemoryStore::new())
    };
    let engine = ScoreEngine::new(store, config.storage.key.clone(), clock.clone());
    let classifier = ThresholdClassifier::from_config(&config.detection);
    let mut controller =
        SessionController::from_config(&config, engine, Box::new(classifier), clock.clone());

    controller.subscribe_all(|event| match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!("could not encode event: {e}"),
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let processed = runtime.block_on(async {
        controller.start_camera(&mut source)?;
        run_frame_loop(&mut controller, &mut source).await
    })?;
    tracing::info!(processed, "frame script finished");

    // Let a celebration still running at the end of the script finish.
    if controller.has_pending_celebration() {
        clock.advance(config.celebration.delay());
        controller.poll();
    }
    controller.stop_camera(&mut source);
    Ok(())
}
