mod sim;

use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use agv_core::{
    mk_static,
    utils::{
        config::AgvConfig,
        controllers::{AgvController, DifferentialDrive, DriveCommand, QuadratureDecoder, Wheel},
        DRIVE_CHANNEL,
    },
};
use clap::Parser;
use sim::SimWheel;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// JSON configuration, e.g. '{"encoder":{"right_inverted":true}}'
    #[clap(long)]
    config: Option<String>,
    /// JSON array of drive commands to run instead of the demo sequence
    #[clap(long)]
    script: Option<String>,
    /// how long each command is held, in milliseconds
    #[clap(long, default_value_t = 500)]
    hold_ms: u64,
}

static RUNNING: AtomicBool = AtomicBool::new(true);

fn demo_script() -> Vec<DriveCommand> {
    vec![
        DriveCommand::SetPwmLimits { min: 40, max: 220 },
        DriveCommand::Forward { l: 255, r: 255 },
        DriveCommand::Backward { l: 128, r: 128 },
        DriveCommand::RotateCw { l: 200, r: 200 },
        DriveCommand::RotateCcw { l: 10, r: 10 },
        DriveCommand::Stop,
        DriveCommand::ResetEncoders { w: None },
        DriveCommand::Forward { l: 100, r: 220 },
        DriveCommand::Stop,
    ]
}

fn main() -> Result<(), serde_json::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts: Opts = Opts::parse();
    let config: AgvConfig = match &opts.config {
        Some(json) => serde_json::from_str(json)?,
        None => AgvConfig::default(),
    };
    let script: Vec<DriveCommand> = match &opts.script {
        Some(json) => serde_json::from_str(json)?,
        None => demo_script(),
    };

    // right encoder sits mirrored on the chassis
    let wheels: &'static [SimWheel; 2] =
        mk_static!([SimWheel; 2], [SimWheel::new(false), SimWheel::new(true)]);
    let decoder: &'static QuadratureDecoder =
        mk_static!(QuadratureDecoder, QuadratureDecoder::new());

    let plants: Vec<_> = Wheel::BOTH
        .into_iter()
        .zip(wheels.iter())
        .map(|(wheel, sim)| {
            let handler = decoder.edge_handler(wheel, sim.channel_a(), sim.channel_b());
            thread::spawn(move || sim::run_plant(sim, handler, &RUNNING))
        })
        .collect();

    let drive = DifferentialDrive::new(
        wheels[0].pwm(),
        wheels[0].dir(),
        wheels[1].pwm(),
        wheels[1].dir(),
    );
    let mut ctrl = AgvController::new(drive, decoder, config);
    info!(?config, "Controller ready");

    let hold = Duration::from_millis(opts.hold_ms);
    for command in script {
        if DRIVE_CHANNEL.try_send(command).is_err() {
            warn!(?command, "Drive channel full, dropping command");
        }
        ctrl.poll_commands(&DRIVE_CHANNEL);
        thread::sleep(hold);

        let (left, right) = ctrl.counts();
        info!(
            ?command,
            left,
            right,
            left_rev = decoder.revolutions(Wheel::Left),
            right_rev = decoder.revolutions(Wheel::Right),
            "Encoder counts"
        );
    }

    if let Err(e) = ctrl.execute_command(DriveCommand::Stop) {
        warn!("Final stop failed: {:?}", e);
    }
    RUNNING.store(false, Ordering::Release);
    for plant in plants {
        if plant.join().is_err() {
            warn!("Plant thread panicked");
        }
    }
    Ok(())
}
