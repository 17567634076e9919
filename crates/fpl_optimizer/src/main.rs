use anyhow::{Context, Result};
use clap::Parser;
use fpl_optimizer::{
    Config, HighsBackend, log_report, optimise_squad, read_current_squad_csv, read_players_csv,
    read_predictions_csv, save_report_json,
};
use log::{info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about = "Multi-gameweek fantasy football squad optimiser", long_about = None)]
struct Args {
    /// Players CSV (name, club, position, cost)
    #[arg(short = 'p', long = "players")]
    players: PathBuf,

    /// Predictions CSV (gameweek, name, expected_points[, variance])
    #[arg(short = 'e', long = "predictions")]
    predictions: PathBuf,

    /// Current squad CSV (name); omit to pick an initial squad
    #[arg(short = 's', long = "current-squad")]
    current_squad: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", default_value = "config/default.toml")]
    config: PathBuf,

    /// Number of gameweeks to plan
    #[arg(long = "horizon")]
    horizon: Option<usize>,

    /// Solver time limit in seconds
    #[arg(short = 't', long = "time-limit")]
    time_limit: Option<f64>,

    /// Captain points multiplier (2.0 doubles the captain)
    #[arg(long = "captain-multiplier")]
    captain_multiplier: Option<f64>,

    /// Write the plan as JSON
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    let args = Args::parse();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load_from_file(&args.config)?
    } else {
        warn!(
            "Config file not found: {}, using default settings",
            args.config.display()
        );
        Config::default()
    };
    if let Some(horizon) = args.horizon {
        config.solver.horizon = horizon;
    }
    if let Some(limit) = args.time_limit {
        config.solver.time_limit_secs = limit;
    }
    if let Some(multiplier) = args.captain_multiplier {
        config.scoring.captain_multiplier = multiplier;
    }

    // 入力データの読み込み
    let pool = read_players_csv(&args.players)
        .with_context(|| format!("reading players from {}", args.players.display()))?;
    info!("Loaded {} players", pool.len());

    let predictions = read_predictions_csv(&args.predictions)
        .with_context(|| format!("reading predictions from {}", args.predictions.display()))?;
    info!("Loaded {} forecasts", predictions.len());

    let current = args
        .current_squad
        .as_ref()
        .map(|path| {
            read_current_squad_csv(path, &pool)
                .with_context(|| format!("reading current squad from {}", path.display()))
        })
        .transpose()?;
    if current.is_none() {
        info!("No current squad given, selecting an initial squad");
    }

    let report = optimise_squad(&pool, &predictions, &config, current.as_ref(), &HighsBackend::new())?;
    log_report(&report);

    if let Some(output) = &args.output {
        save_report_json(output, &report, &config)?;
    }

    Ok(if report.status.has_solution() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
