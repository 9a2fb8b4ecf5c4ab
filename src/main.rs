//! Hoop Shot headless runner
//!
//! The browser build is driven by a JS WebXR host through `platform::web`.
//! Natively there is no XR runtime, so this binary plays a seeded demo
//! session with the auto-thrower and prints the analytics stream.
//!
//! Usage: `hoop-shot [tuning.json] [seconds] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use hoop_shot::analytics::{EventSink, GameEvent, LogSink, RecordingSink};
    use hoop_shot::sim::{Game, ThrowBot};
    use hoop_shot::tuning::Tuning;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let tuning = match args.first().filter(|a| a.as_str() != "-") {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => match Tuning::from_json(&json) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("{path}: {e}");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                log::error!("Failed to read {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };
    let seconds: f32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(30.0);
    let seed: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(42);

    /// Logs and records every event
    struct DemoSink {
        log: LogSink,
        record: RecordingSink,
    }

    impl EventSink for DemoSink {
        fn emit(&mut self, event: &GameEvent) {
            self.log.emit(event);
            self.record.emit(event);
        }
    }

    log::info!("Hoop Shot (native) starting: {seconds}s demo, seed {seed}");
    let sink = DemoSink {
        log: LogSink,
        record: RecordingSink::new(),
    };
    let mut game = Game::new(tuning, sink);
    let mut bot = ThrowBot::new(seed, 0.12);

    const FRAME_DT: f32 = 1.0 / 72.0;
    let frames = (seconds / FRAME_DT).ceil() as u64;

    game.begin_session();
    for _ in 0..frames {
        let input = bot.next_input(game.state(), game.tuning(), FRAME_DT);
        game.tick(&input);
    }
    game.end_session();

    for event in &game.sink().record.events {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => log::warn!("Failed to encode {}: {e}", event.name()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Entry point is `platform::web::start`
}
