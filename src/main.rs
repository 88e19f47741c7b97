//! Headless replay: feeds a tilt trace through steering and ball physics
//! and logs where the ball goes.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process;
    use std::time::Duration;

    use anyhow::{bail, Context, Result};
    use clap::Parser;
    use glam::{Vec2, Vec3};

    use ballerone::controller::{InputEvent, SteeringController};
    use ballerone::model::{BallSpec, DetectedPlane, PlaneId};
    use ballerone::platform::{RunLoop, TraceMotion};
    use ballerone::{logging, trace, BallScene, FrameLoopContext, SteeringConfig};

    const VIEWPORT: Vec2 = Vec2::new(750.0, 1334.0);

    #[derive(Debug, Parser)]
    #[command(name = "ballerone", about = "Replay a tilt trace against a simulated ball")]
    struct Args {
        /// CSV trace (`t,x,y,z` per line); a built-in demo tilt is used when omitted
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Simulated seconds; defaults to the trace length plus one second
        #[arg(long)]
        duration: Option<f64>,

        /// Impulse per latch/release edge
        #[arg(long)]
        force_factor: Option<f64>,

        /// Steering ticks per second
        #[arg(long)]
        tick_hz: Option<f64>,

        /// Physics frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
    }

    pub fn main() {
        logging::init();
        if let Err(err) = run(Args::parse()) {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }

    fn run(args: Args) -> Result<()> {
        let mut config = SteeringConfig::from_env().context("invalid BALLERONE_* environment")?;
        if let Some(force_factor) = args.force_factor {
            config = config.with_force_factor(force_factor);
        }
        if let Some(hz) = args.tick_hz {
            config = config.with_tick_hz(hz)?;
        }
        config.validate()?;
        if !(args.fps.is_finite() && args.fps > 0.0) {
            bail!("--fps must be positive, got {}", args.fps);
        }

        let samples = match &args.trace {
            Some(path) => trace::load_trace(path)?,
            None => trace::demo_trace(config.sample_interval),
        };

        let run_loop = RunLoop::new();
        let motion = TraceMotion::new(samples, run_loop.clock());
        let trace_len = motion.duration();
        let duration = match args.duration {
            Some(secs) if secs.is_finite() && secs > 0.0 => Duration::from_secs_f64(secs),
            Some(secs) => bail!("--duration must be positive, got {secs}"),
            None => trace_len + Duration::from_secs(1),
        };

        let steering = SteeringController::new(motion, run_loop.clone(), config);
        let mut scene = BallScene::new(steering, BallSpec::default(), VIEWPORT);
        let floor = Vec3::new(0.0, -1.2, -1.5);
        scene.camera_mut().set_look_at(floor);

        let mut ctx = FrameLoopContext::new(run_loop, scene);
        ctx.push_event(InputEvent::PlaneAdded(DetectedPlane::new(PlaneId(1), floor, Vec2::new(6.0, 6.0))));
        ctx.push_event(InputEvent::touch(VIEWPORT * 0.5));

        tracing::info!(
            force_factor = config.force_factor,
            tick = ?config.tick_interval,
            ?duration,
            "replay starting"
        );

        let frame = Duration::from_secs_f64(1.0 / args.fps);
        let frames_per_report = args.fps.round().max(1.0) as u64;
        let mut elapsed = Duration::ZERO;
        let mut start: Option<Vec3> = None;

        while elapsed < duration {
            ctx.update(frame);
            elapsed += frame;

            let Some(pos) = ctx.scene.ball_position() else {
                if ctx.frames() == 1 {
                    bail!("the ball could not be placed on the floor plane");
                }
                tracing::warn!(t = elapsed.as_secs_f64(), "ball lost, stopping replay");
                break;
            };
            start.get_or_insert(pos);

            if ctx.frames() % frames_per_report == 0 {
                let direction = ctx.scene.steering().direction();
                tracing::info!(
                    t = %format!("{:.1}", elapsed.as_secs_f64()),
                    x = %format!("{:+.3}", pos.x),
                    z = %format!("{:+.3}", pos.z),
                    ?direction,
                    "ball"
                );
            }
        }

        let ticks = ctx.scene.steering().total_ticks();
        match (start, ctx.scene.ball_position()) {
            (Some(from), Some(to)) => {
                let travelled = (to - from) * Vec3::new(1.0, 0.0, 1.0);
                tracing::info!(
                    ticks,
                    dx = %format!("{:+.3}", travelled.x),
                    dz = %format!("{:+.3}", travelled.z),
                    "replay finished"
                );
            }
            _ => tracing::info!(ticks, "replay finished without a ball"),
        }
        Ok(())
    }
}
