use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use wally_core::{
    metadata, schedule, Config, DesktopBackend, MarkerStore, RunReport, UpdatePipeline,
    WallpaperBackend, WebClient, WebClientBuilder,
};

#[derive(Parser)]
#[command(name = "wally")]
#[command(about = "Keeps your desktop wallpaper on today's astronomy picture", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest picture and apply it if it is new
    Update {
        /// Apply even if the picture has not changed
        #[arg(long)]
        force: bool,
        /// Print a machine-readable JSON report
        #[arg(long)]
        json: bool,
        /// Override the download directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Poll for new pictures during the nightly publication window
    Watch {
        /// Minutes between polls
        #[arg(long, default_value_t = 15)]
        interval: u64,
        /// Override the download directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Show the stored marker and the current wallpaper
    Status {
        /// Override the download directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Update { force, json, dir } => update(force, json, dir).await,
        Commands::Watch { interval, dir } => watch(interval, dir).await,
        Commands::Status { dir } => status(dir),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(dir: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(dir) = dir {
        config.download_dir = dir;
    }
    Ok(config)
}

fn build_pipeline(dir: Option<PathBuf>) -> Result<UpdatePipeline<WebClient, DesktopBackend>> {
    let config = load_config(dir)?;
    let client = WebClientBuilder::new()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(UpdatePipeline::new(client, DesktopBackend, config))
}

async fn update(force: bool, json: bool, dir: Option<PathBuf>) -> Result<ExitCode> {
    let pipeline = build_pipeline(dir)?;
    let result = pipeline.run(force).await;
    let report = RunReport::from_result(&result);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(path) = &report.path {
        println!("applied {}", path.display());
    } else if let Some(error) = &report.error {
        println!("failed ({}): {}", report.state, error);
    } else {
        println!("{}", report.state);
    }

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn watch(interval_minutes: u64, dir: Option<PathBuf>) -> Result<ExitCode> {
    let pipeline = build_pipeline(dir)?;

    // Catch up immediately on start, then poll on the timer.
    run_once(&pipeline).await;

    let mut timer = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
    timer.tick().await;
    loop {
        timer.tick().await;
        if schedule::in_publication_window(chrono::Utc::now()) {
            run_once(&pipeline).await;
        }
    }
}

async fn run_once(pipeline: &UpdatePipeline<WebClient, DesktopBackend>) {
    match pipeline.run(false).await {
        Ok(outcome) => info!(?outcome, "update finished"),
        Err(e) => error!(error = %e, "update failed"),
    }
}

fn status(dir: Option<PathBuf>) -> Result<ExitCode> {
    let config = load_config(dir)?;

    let store = MarkerStore::new(config.download_dir.clone());
    match store.load() {
        Some(marker) => {
            println!("last image:  {}", marker.last_image_url);
            println!("last update: {}", marker.last_update);
        }
        None => println!("no update recorded yet"),
    }

    let current = DesktopBackend.current();
    match &current {
        Some(path) => println!("wallpaper:   {}", path.display()),
        None => println!("wallpaper:   unknown"),
    }

    match metadata::describe_current(current.as_deref(), &config.download_dir)? {
        Some((source, meta)) => {
            println!("metadata:    {}", source.display());
            if let Some(title) = meta.title {
                println!("title:       {title}");
            }
            if let Some(date) = meta.date {
                println!("date:        {date}");
            }
        }
        None => println!("metadata:    none"),
    }

    Ok(ExitCode::SUCCESS)
}
