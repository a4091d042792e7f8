use clap::Parser;

use comfort_player::{serve, Args, Config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cwd = std::env::current_dir()?;
    let config = Config::from_args(args, &cwd)?;

    serve(config)
}
