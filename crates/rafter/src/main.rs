use clap::Parser;
use glam::{UVec2, Vec2};
use log::*;
use rafter::{
    config::Config,
    demo,
    game_state::GameState,
    input::InputSnapshot,
    render::headless::HeadlessDevice,
    VERSION,
};
use rafter_utils::AnyResult;
use std::{io::Cursor, time::Duration};

mod cli;

fn main() {
    pretty_env_logger::formatted_builder()
        .format_indent(None)
        .format_timestamp(None)
        .filter_level(LevelFilter::Trace)
        .parse_default_env()
        .init();

    let args = cli::Args::parse_from(wild::args());

    info!("Welcome to Rafter {VERSION}");

    if let Err(error) = run(&args) {
        error!("{error:#}");
        std::process::exit(1);
    }
}

fn run(args: &cli::Args) -> AnyResult {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut assets = demo::demo_assets();
    let mut device = HeadlessDevice::new();
    let mut game = GameState::initialize(UVec2::new(1280, 720), config, &assets)?;

    game.load_rails(&args.rails)?;
    match &args.level {
        Some(path) => {
            game.load_level_file(path)?;
        }
        None => {
            info!("no level given, loading the demo level");
            let rail = demo::demo_rail().to_bytes()?;
            game.rails_mut()
                .load_rail_from_reader(demo::DEMO_RAIL, &mut Cursor::new(rail))?;
            game.load_level(&demo::demo_level()?);
        }
    }

    let delta = Duration::from_millis(args.frame_time);
    let input = InputSnapshot {
        // A slow pan, so that the player's aim sweeps around
        look_delta: Vec2::new(2.0, 0.0),
        fire: args.fire,
    };

    let input_config = game.input_config().clone();

    let mut total_draws = 0;
    for _ in 0..args.frames {
        game.update(delta, &input, &input_config);
        let report = game.render(&mut device, &mut assets);
        total_draws += report.shadow_draws + report.main_draws;

        trace!(
            "frame {}: {} entities, {} shadow draws, {} main draws",
            report.frame,
            game.universe().entity_count(),
            report.shadow_draws,
            report.main_draws
        );
        device.take_commands();
    }

    info!(
        "simulated {} frames, {} entities left, {} draws, {} shader define refreshes",
        args.frames,
        game.universe().entity_count(),
        total_draws,
        game.renderer().define_refreshes()
    );
    Ok(())
}
