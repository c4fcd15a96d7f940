//! Shmup Zero entry point
//!
//! Native: headless autopilot runs with file-backed high scores.
//! Web: the page drives `platform::web::WebSession` from JS; `main` is empty.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fs;
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;

    use shmup_zero::autopilot::Autopilot;
    use shmup_zero::consts::FRAME_DT;
    use shmup_zero::persistence::FileStore;
    use shmup_zero::platform;
    use shmup_zero::sim::GameEvent;
    use shmup_zero::{Session, Tuning};

    #[derive(Parser)]
    #[command(name = "shmup-zero", about = "Headless autopilot runs of the Shmup Zero simulation")]
    pub struct Cli {
        /// Frames to simulate in total (60 per second)
        #[arg(long, default_value = "36000")]
        frames: u64,

        /// Session seed (default: from the clock)
        #[arg(long)]
        seed: Option<u64>,

        /// Runs to play; each game over restarts until this many have ended
        #[arg(long, default_value = "1")]
        runs: u32,

        /// Tuning file (JSON); missing fields take defaults
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Directory for high scores and settings
        #[arg(long, default_value = ".shmup-zero")]
        save_dir: PathBuf,

        /// Print the final render snapshot as JSON
        #[arg(long)]
        snapshot: bool,
    }

    #[derive(Debug, Default)]
    struct Summary {
        runs: u32,
        kills: u32,
        pickups: u32,
        bosses: u32,
        stages_cleared: u32,
        best: u64,
    }

    pub fn run() -> Result<()> {
        platform::init_logging();
        let cli = Cli::parse();

        let tuning = match &cli.tuning {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading tuning file {}", path.display()))?;
                Tuning::from_json(&text).with_context(|| format!("loading {}", path.display()))?
            }
            None => Tuning::default(),
        };

        let store = FileStore::new(&cli.save_dir)
            .with_context(|| format!("opening save dir {}", cli.save_dir.display()))?;
        let seed = cli.seed.unwrap_or_else(platform::session_seed);
        let mut session = Session::new(store, tuning, seed);
        let pilot = Autopilot::default();
        let mut summary = Summary::default();

        log::info!("Shmup Zero headless: {} frames, seed {}, best {}", cli.frames, seed, session.high_score());
        session.start(seed);

        'frames: for _ in 0..cli.frames {
            let input = pilot.decide(session.state());
            for event in session.frame(&input, FRAME_DT) {
                match event {
                    GameEvent::EnemyDestroyed { .. } => summary.kills += 1,
                    GameEvent::PickupCollected { .. } => summary.pickups += 1,
                    GameEvent::BossSpawned { .. } => summary.bosses += 1,
                    GameEvent::StageCleared { stage } => {
                        summary.stages_cleared += 1;
                        log::info!("Stage {} clear, continuing", stage);
                        session.acknowledge_stage_clear();
                    }
                    GameEvent::GameOver { score, stage } => {
                        summary.runs += 1;
                        summary.best = summary.best.max(score);
                        log::info!("Run {} over: score {} at stage {}", summary.runs, score, stage);
                        if summary.runs >= cli.runs {
                            break 'frames;
                        }
                        session.restart(seed.wrapping_add(summary.runs as u64));
                    }
                    GameEvent::PlayerHit { .. } | GameEvent::ShieldAbsorbed => {}
                }
            }
        }

        let state = session.state();
        summary.best = summary.best.max(state.world.score);
        log::info!(
            "Done after {} frames: {} runs, {} kills, {} pickups, {} bosses, {} stages cleared, best {} (all-time {})",
            session.frames(),
            summary.runs,
            summary.kills,
            summary.pickups,
            summary.bosses,
            summary.stages_cleared,
            summary.best,
            session.high_score()
        );

        if cli.snapshot {
            println!("{}", session.snapshot().to_json()?);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is WebSession, this is just to satisfy the compiler
}
