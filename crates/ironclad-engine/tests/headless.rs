//! End-to-end runs of the headless loop.

use ironclad_engine::{app, EngineConfig, HeadlessApp};

fn config(ticks: u64) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.world.chunk_size_cells = 32;
    config.run.ticks = ticks;
    config.run.log_every = 0;
    config
}

#[test]
fn test_runs_are_reproducible() {
    let a = app::run(config(240)).expect("valid config");
    let b = app::run(config(240)).expect("valid config");
    assert_eq!(a, b);
}

#[test]
fn test_slow_frames_run_several_ticks() {
    let mut config = config(120);
    config.apply_overrides(None, None, Some(20.0));
    let summary = app::run(config).expect("valid config");
    assert_eq!(summary.ticks, 120);
    // 20 fps against a 60 Hz tick is about three ticks per frame.
    assert!((40..=41).contains(&summary.frames), "frames = {}", summary.frames);
}

#[test]
fn test_frame_cap_stops_the_run() {
    let mut config = config(1_000);
    config.run.max_frames = 10;
    config.run.enemies = 0;
    config.run.landmines = 0;
    let mut app = HeadlessApp::new(config).expect("valid config");
    let summary = app.run();
    assert_eq!(summary.frames, 10);
    assert_eq!(summary.ticks, 10);
    assert_eq!(app.world().tick(), 10);
}
