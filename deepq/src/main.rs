use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use deepq::DqnAtariConfig;
use std::path::PathBuf;

#[derive(Args, Debug)]
struct Common {
    /// YAML configuration of the run
    #[arg(long)]
    config: PathBuf,

    /// Show the configuration and exit
    #[arg(long, default_value_t = false)]
    show_config: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a DQN agent
    Train {
        #[command(flatten)]
        common: Common,
    },

    /// Evaluate a trained agent
    Eval {
        #[command(flatten)]
        common: Common,

        /// Directory of the checkpoint, e.g. `<model_dir>/best`
        #[arg(long)]
        model: PathBuf,
    },

    /// Evaluate a uniformly random agent
    Random {
        #[command(flatten)]
        common: Common,
    },
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[cfg(feature = "ale")]
fn run(command: Command, config: &DqnAtariConfig) -> Result<()> {
    use deepq_atari_env::AleEmulator;

    match command {
        Command::Train { .. } => {
            deepq::train::<AleEmulator>(config)?;
        }
        Command::Eval { model, .. } => {
            deepq::eval::<AleEmulator>(config, &model)?;
        }
        Command::Random { .. } => {
            deepq::random::<AleEmulator>(config)?;
        }
    }
    Ok(())
}

#[cfg(not(feature = "ale"))]
fn run(_command: Command, _config: &DqnAtariConfig) -> Result<()> {
    anyhow::bail!("deepq was built without an emulator, rebuild with `--features ale`")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let common = match &cli.command {
        Command::Train { common } | Command::Eval { common, .. } | Command::Random { common } => {
            common
        }
    };
    let config = DqnAtariConfig::load(&common.config)?;

    if common.show_config {
        print!("{}", deepq::show_config(&config)?);
        return Ok(());
    }

    run(cli.command, &config)
}
