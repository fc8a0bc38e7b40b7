use clap::Parser;
use std::path::PathBuf;

/// User-specified command line parameters
#[derive(Debug, Parser)]
#[clap(name = "Rafter", about)]
pub struct Args {
    #[clap(long, short = 'c')]
    /// Path to a TOML configuration file. Defaults are used for anything it leaves out.
    pub config: Option<PathBuf>,

    #[clap(long, short = 'l')]
    /// Level file to load. The built-in demo level is used if none is given.
    pub level: Option<PathBuf>,

    #[clap(long = "rail", short = 'r')]
    /// Rail file to load, can be repeated.
    pub rails: Vec<PathBuf>,

    #[clap(long, short = 'n', default_value_t = 600)]
    /// Amount of frames to simulate.
    pub frames: u64,

    #[clap(long, default_value_t = 16)]
    /// Simulated frame time, in milliseconds.
    pub frame_time: u64,

    #[clap(long)]
    /// Holds the fire button for the whole run.
    pub fire: bool,
}
