use clap::{Parser, Subcommand};
use redpost_core::{DataLayout, Mode, PipelineConfig};
use redpost_pipeline::{PublishLog, RunOptions};

mod bridge;
mod run;

#[derive(Debug, Parser)]
#[command(name = "redpost")]
#[command(about = "Trending-driven content pipeline for Xiaohongshu")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the pipeline once (scrape → select → generate → preview/publish).
    Run {
        /// Override the configured mode (auto | preview).
        #[arg(long)]
        mode: Option<Mode>,
        /// Trending category to scan.
        #[arg(long)]
        category: Option<String>,
        /// Search keyword instead of a category.
        #[arg(long)]
        keyword: Option<String>,
        /// Skip the trending scrape and reuse the latest saved snapshot.
        #[arg(long)]
        skip_trending: bool,
    },
    /// Show or change the pipeline configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the current configuration and today's post count.
    Show,
    /// Switch the pipeline mode.
    SetMode { mode: Mode },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let app_config = redpost_core::load_app_config_from_env()?;
    let layout = DataLayout::new(app_config.data_dir.clone());
    let pipeline_config = PipelineConfig::load(&layout.config_path())?;

    match cli.command {
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            let today_posts = PublishLog::new(layout.published_dir())
                .count_today()
                .unwrap_or(0);
            let record = serde_json::json!({
                "status": "info",
                "message": "当前配置",
                "config": pipeline_config,
                "today_posts": today_posts,
            });
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Config {
            action: ConfigAction::SetMode { mode },
        } => {
            let mut updated = pipeline_config;
            updated.mode = mode;
            updated.save(&layout.config_path())?;
            let record = serde_json::json!({
                "status": "success",
                "message": format!("模式已切换为: {mode}"),
                "config": updated,
            });
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Run {
            mode,
            category,
            keyword,
            skip_trending,
        } => {
            let options = RunOptions {
                mode,
                category,
                keyword,
                skip_trending,
            };
            let report = run::run(&app_config, &pipeline_config, options).await?;
            if report.outcome.is_failure() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
