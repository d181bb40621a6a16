use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use autosouk::enrich::{self, HttpImageFetcher};
use autosouk::fetch::{BrowserSession, SessionConfig};
use autosouk::harvest;
use autosouk::politeness::Politeness;
use autosouk::sites::{self, SiteProfile};

#[derive(Parser)]
#[command(
    name = "autosouk",
    about = "Polite, resumable harvester for Moroccan used-car classifieds"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Source site: avito, auto24, moteur or wandaloo
    #[arg(long)]
    site: String,
    /// Root directory for tables and images
    #[arg(long, default_value = "data")]
    data_root: PathBuf,
    /// Run the browser headless
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    headless: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest search pages into a fresh listings table (overwrites)
    Harvest {
        #[command(flatten)]
        common: CommonArgs,
        /// Number of search pages to walk
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Visit each listing of a table, append details and download images
    Enrich {
        #[command(flatten)]
        common: CommonArgs,
        /// Listings table to read; defaults to this site's harvested table
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Harvest then enrich in one pass
    Run {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    // Best-effort process: failures are logged, not unwound. The browser
    // session lives inside dispatch, so it is released on every path.
    if let Err(e) = dispatch(cli.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn resolve_site(name: &str) -> Result<&'static SiteProfile> {
    sites::by_name(name).ok_or_else(|| {
        anyhow!(
            "unknown site `{}`, expected one of: {}",
            name,
            sites::all()
                .iter()
                .map(|p| p.name)
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Harvest { common, pages } => {
            let profile = resolve_site(&common.site)?;
            let session =
                BrowserSession::open(SessionConfig::default().with_headless(common.headless))?;
            let (path, count) = harvest::run(
                &session,
                profile,
                pages,
                &common.data_root,
                Politeness::default(),
            )
            .await?;
            info!("Harvest finished: {} listings in {}", count, path.display());
            write_run_report(
                &common.data_root,
                profile,
                serde_json::json!({ "stage": "harvest", "listings": count }),
            )
            .await?;
        }
        Command::Enrich { common, input } => {
            let profile = resolve_site(&common.site)?;
            let input_path =
                input.unwrap_or_else(|| harvest::listings_path(&common.data_root, profile));
            let mut session =
                BrowserSession::open(SessionConfig::default().with_headless(common.headless))?;
            let fetcher = HttpImageFetcher::new()?;
            let report = enrich::run(
                &mut session,
                &fetcher,
                profile,
                &input_path,
                &common.data_root,
                Politeness::default(),
            )
            .await?;
            info!(
                "Enrichment finished: {} new rows, {} images",
                report.rows_written, report.images_downloaded
            );
            write_run_report(
                &common.data_root,
                profile,
                serde_json::json!({
                    "stage": "enrich",
                    "rows_written": report.rows_written,
                    "skipped_seen": report.skipped_seen,
                    "images_downloaded": report.images_downloaded,
                }),
            )
            .await?;
        }
        Command::Run { common, pages } => {
            let profile = resolve_site(&common.site)?;
            let mut session =
                BrowserSession::open(SessionConfig::default().with_headless(common.headless))?;
            let (listings_path, count) = harvest::run(
                &session,
                profile,
                pages,
                &common.data_root,
                Politeness::default(),
            )
            .await?;
            info!("Harvest finished: {} listings", count);

            let fetcher = HttpImageFetcher::new()?;
            let report = enrich::run(
                &mut session,
                &fetcher,
                profile,
                &listings_path,
                &common.data_root,
                Politeness::default(),
            )
            .await?;
            info!(
                "Run finished: {} listings, {} detail rows, {} images",
                count, report.rows_written, report.images_downloaded
            );
            write_run_report(
                &common.data_root,
                profile,
                serde_json::json!({
                    "stage": "run",
                    "listings": count,
                    "rows_written": report.rows_written,
                    "images_downloaded": report.images_downloaded,
                }),
            )
            .await?;
        }
    }
    Ok(())
}

async fn write_run_report(
    data_root: &std::path::Path,
    profile: &SiteProfile,
    mut report: serde_json::Value,
) -> Result<()> {
    if let Some(map) = report.as_object_mut() {
        map.insert("site".to_string(), profile.name.into());
        map.insert(
            "finished_at".to_string(),
            chrono::Local::now().to_rfc3339().into(),
        );
    }
    let dir = data_root.join(profile.name);
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join("run_report.json");
    tokio::fs::write(&path, serde_json::to_string_pretty(&report)?).await?;
    info!("Saved run report to {}", path.display());
    Ok(())
}
