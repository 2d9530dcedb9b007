//! FeUdal demo: train the reference manager/worker network on a corridor.
//!
//! ```bash
//! cargo run --release -p feudal_demos -- --iterations 2000
//! cargo run --release -p feudal_demos -- --config feudal.json --csv loss.csv
//! RUST_LOG=debug cargo run -p feudal_demos -- --iterations 20
//! ```

mod corridor;

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::backend::{Autodiff, NdArray};
use clap::Parser;

use feudal_rl::{
    create_optimizer, CSVLogger, ConsoleLogger, FeudalConfig, FeudalNet, FeudalNetConfig,
    FeudalTrainer, MultiLogger,
};

use corridor::{Corridor, N_ACTIONS};

type B = Autodiff<NdArray<f32>>;

#[derive(Parser, Debug)]
#[command(name = "feudal_demo", about = "Train a FeUdal agent on a corridor task")]
struct Args {
    /// JSON training configuration; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of updates; runs until interrupted when omitted
    #[arg(long)]
    iterations: Option<usize>,

    /// Action-sampling seed (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Corridor length
    #[arg(long, default_value_t = 12)]
    corridor: usize,

    /// Manager horizon c
    #[arg(long, default_value_t = 10)]
    horizon: usize,

    /// Print every N updates
    #[arg(long, default_value_t = 10)]
    log_interval: usize,

    /// Also write every update to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn default_config() -> FeudalConfig {
    // lr, alpha, entropy_coef, tau_worker, gamma_worker, gamma_manager,
    // num_steps, max_episode_length, max_grad_norm
    FeudalConfig::new(1e-3, 0.5, 0.01, 1.0, 0.95, 0.99, 40, 200, 40.0)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let mut config = match &args.config {
        Some(path) => FeudalConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => default_config(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    log::info!("config: {:?}", config);

    let device = Default::default();
    let mut env = Corridor::new(args.corridor);
    let model: FeudalNet<B> = FeudalNetConfig::new(args.corridor, N_ACTIONS)
        .with_horizon(args.horizon)
        .init(&device);

    let mut trainer = FeudalTrainer::new(config, model, create_optimizer::<B, FeudalNet<B>>(), device)?;
    let mut state = trainer.initial_state(&mut env)?;

    let mut logger = MultiLogger::new().add(ConsoleLogger::new(args.log_interval));
    if let Some(path) = &args.csv {
        let csv = CSVLogger::new(path).with_context(|| format!("creating {}", path.display()))?;
        logger = logger.add(csv);
    }

    trainer.run(&mut env, &mut state, args.iterations, &mut logger)?;

    let metrics = trainer.metrics();
    println!(
        "done: {} updates, {} episodes, avg return {:.3}",
        metrics.train_steps(),
        metrics.episodes(),
        metrics.avg_reward()
    );
    Ok(())
}
