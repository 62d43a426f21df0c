//! Offline walk-through of the click assist engine.
//!
//! This demo shows how to:
//! 1. Build an engine on a manual clock with a recording injector
//! 2. Feed it a simulated 6 CPS burst on the left button
//! 3. Watch the readouts while assist ramps up and shuts off
//!
//! Run with: cargo run --example assist_demo
//!
//! Nothing is injected into the OS; no permissions are needed.

use std::sync::Arc;
use std::time::Duration;

use click_assist::{
    collector::{MouseButton, RawButton, RawClick},
    config::{AssistConfig, Config},
    core::ManualClock,
    engine::AssistEngine,
    synthesizer::RecordingSynthesizer,
    ASSIST_NOTICE,
};

const TICK: Duration = Duration::from_millis(5);
const USER_CPS: f64 = 6.0;
const BURST: Duration = Duration::from_secs(2);
const END: Duration = Duration::from_millis(2600);

fn main() {
    println!("Click Assist - Simulation Demo");
    println!("==============================");
    println!("{ASSIST_NOTICE}");

    let mut config = Config::default();
    config.global.set_threshold_cps(3.0);
    config.global.set_idle_timeout(Duration::from_millis(200));
    config.left = AssistConfig::new(10.0, 12.0, true);

    for warning in config.warnings() {
        println!("Warning: {warning}");
    }
    println!(
        "Threshold {:.0} CPS, idle timeout {:.1}s, left target [{:.0}, {:.0}]",
        config.global.threshold_cps(),
        config.global.idle_timeout().as_secs_f64(),
        config.left.min_cps(),
        config.left.max_cps()
    );
    println!("Simulating a {USER_CPS} CPS user for {:.1}s...", BURST.as_secs_f64());
    println!();

    let clock = Arc::new(ManualClock::new());
    let synth = Arc::new(RecordingSynthesizer::new());
    let engine = AssistEngine::with_clock(&config, synth.clone(), clock.clone(), 2024);

    let period = Duration::from_secs_f64(1.0 / USER_CPS);
    let mut next_click = Duration::ZERO;
    let mut offset = Duration::ZERO;

    while offset <= END {
        let now = clock.set_offset(offset);

        while next_click <= offset && next_click < BURST {
            engine.ingest(RawClick::at(RawButton::Left, true, clock.origin() + next_click));
            next_click += period;
        }

        engine.tick_all(now);

        if offset.as_millis() % 100 == 0 {
            let readout = engine.readout(MouseButton::Left, now);
            println!(
                "t={:>4}ms  {}  target {:>4.1}  phase {:?}",
                offset.as_millis(),
                readout.summary(),
                readout.target_cps,
                engine.phase(MouseButton::Left)
            );
        }

        offset += TICK;
    }

    println!();
    println!(
        "Injected {} left / {} right clicks",
        synth.count(MouseButton::Left),
        synth.count(MouseButton::Right)
    );
    println!();
    println!("{}", engine.stats().summary());
}
