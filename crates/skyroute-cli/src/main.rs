//! SkyRoute command-line tools.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;

use skyroute_core::{
    compute_metrics, plan_route, AvoidanceMode, HazardSet, PlannerConfig, RouteOutcome,
};
use skyroute_feeds::{
    HistoryClient, HistoryConfig, SigmetClient, StationClient, DEFAULT_AVWX_BASE_URL,
    DEFAULT_SIGMET_BASE_URL,
};
use skyroute_model::{VisibilityModel, DEFAULT_TRAIN_SEED};

#[derive(Parser)]
#[command(name = "skyroute", about = "Flight routing around convective weather")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a route between two airports and print the summary.
    Route {
        origin: String,
        dest: String,
        /// Flag hazardous routes instead of searching for a detour.
        #[arg(long)]
        flag_only: bool,
    },
    /// Fit the visibility model on 90 days of history for a coordinate.
    Train {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
        /// Where to store the fitted model.
        #[arg(long, default_value = "visibility_model.json")]
        model: PathBuf,
    },
    /// Predict visibility from current conditions with a saved model.
    Predict {
        #[arg(long)]
        temperature: f64,
        #[arg(long)]
        humidity: f64,
        #[arg(long)]
        wind: f64,
        #[arg(long, default_value = "visibility_model.json")]
        model: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Route {
            origin,
            dest,
            flag_only,
        } => run_route(&origin, &dest, flag_only).await,
        Command::Train { lat, lon, model } => run_train(lat, lon, &model).await,
        Command::Predict {
            temperature,
            humidity,
            wind,
            model,
        } => run_predict(temperature, humidity, wind, &model),
    }
}

async fn run_route(origin: &str, dest: &str, flag_only: bool) -> Result<()> {
    let client = http_client()?;
    let stations = StationClient::new(
        client.clone(),
        DEFAULT_AVWX_BASE_URL,
        std::env::var("AVWX_API_TOKEN").ok(),
    );
    let sigmets = SigmetClient::new(client, DEFAULT_SIGMET_BASE_URL);

    if stations.is_offline() {
        tracing::warn!("AVWX_API_TOKEN not set; resolving from the built-in station table");
    }

    let start = stations
        .resolve(origin)
        .await
        .with_context(|| format!("resolving {}", origin.to_uppercase()))?;
    let end = stations
        .resolve(dest)
        .await
        .with_context(|| format!("resolving {}", dest.to_uppercase()))?;

    let hazards = match sigmets.fetch_hazards().await {
        Ok(polygons) => HazardSet::new(polygons),
        Err(err) => {
            tracing::warn!("hazard feed unavailable, continuing with no hazards: {err}");
            HazardSet::empty()
        }
    };

    let config = PlannerConfig {
        mode: if flag_only {
            AvoidanceMode::FlagOnly
        } else {
            AvoidanceMode::Reroute
        },
        ..PlannerConfig::default()
    };
    let result = plan_route(start, end, &hazards, &config)?;
    let metrics = compute_metrics(&result.path);

    println!("{} -> {}", origin.to_uppercase(), dest.to_uppercase());
    println!("  points:   {}", result.path.len());
    println!("  hazards:  {}", result.hazards.len());
    println!("  distance: {:.1} nm", metrics.distance_nm);
    println!("  ete:      {}", metrics.ete());
    match result.outcome {
        RouteOutcome::Safe => println!("  status:   clear of known hazards"),
        RouteOutcome::Rerouted => println!("  status:   rerouted around hazards"),
        RouteOutcome::FlaggedUnsafe => {
            println!("  status:   WARNING - route crosses hazardous weather")
        }
    }
    Ok(())
}

async fn run_train(lat: f64, lon: f64, model_path: &Path) -> Result<()> {
    let history = HistoryClient::new(http_client()?, HistoryConfig::default());
    let rows = history
        .fetch_training_rows(lat, lon)
        .await
        .context("fetching historical weather")?;

    let (model, report) = VisibilityModel::fit(&rows, DEFAULT_TRAIN_SEED)?;
    model
        .save(model_path)
        .with_context(|| format!("saving model to {}", model_path.display()))?;

    println!("trained on {} samples, r2 {:.2}", report.samples, report.r2);
    println!("model saved to {}", model_path.display());
    Ok(())
}

fn run_predict(temperature: f64, humidity: f64, wind: f64, model_path: &Path) -> Result<()> {
    let model = VisibilityModel::load(model_path)
        .with_context(|| format!("loading model from {}", model_path.display()))?;
    let visibility = model.predict(temperature, humidity, wind);
    println!("predicted visibility: {visibility:.1} m");
    Ok(())
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("building HTTP client")
}
