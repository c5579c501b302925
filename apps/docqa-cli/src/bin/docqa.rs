use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_cli::{repl, Cli, Command};
use docqa_core::config::{resolve_with_base, Config};
use docqa_rag::{IngestEvent, Indexer, Pipeline};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();
}

async fn ingest_with_progress(indexer: &Indexer, paths: &[PathBuf]) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")?
            .progress_chars("#>-"),
    );
    let mut current: Option<PathBuf> = None;
    let result = indexer
        .ingest_with(paths, |event| match event {
            IngestEvent::Discovered(n) => pb.set_length(n as u64),
            IngestEvent::Started(path) => {
                pb.set_message(path.display().to_string());
                current = Some(path.to_path_buf());
            }
            IngestEvent::Finished(_) => pb.inc(1),
        })
        .await;
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            pb.abandon();
            return Err(match current {
                Some(path) => anyhow::Error::new(err).context(format!("ingesting {}", path.display())),
                None => err.into(),
            });
        }
    };
    pb.finish_with_message("done");
    if report.documents.is_empty() {
        println!("No documents found");
        return Ok(());
    }
    println!(
        "Indexed {} documents ({} chunks) into '{}'",
        report.documents.len(),
        report.total_chunks(),
        indexer.collection().name()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let env_name = cli.env.clone().unwrap_or_else(|| std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string()));
    let config = Config::load_for_env(&cli.config_dir, &env_name)?;
    let mut settings = config.settings()?;
    // relative store paths are relative to the config directory
    settings.store.uri = resolve_with_base(&cli.config_dir, &settings.store.uri).to_string_lossy().into_owned();
    info!(env = config.env_name(), "configuration loaded");

    match cli.command {
        Command::Ingest { paths } => {
            let indexer = Pipeline::indexer_from_settings(&settings).await?;
            ingest_with_progress(&indexer, &paths).await?
        }
        Command::Ask { question } => {
            let pipeline = Pipeline::from_settings(&settings).await?;
            let answer = pipeline.chatbot.answer(&question).await?;
            println!("{answer}");
        }
        Command::Chat { ingest } => {
            let pipeline = Pipeline::from_settings(&settings).await?;
            if !ingest.is_empty() {
                ingest_with_progress(&pipeline.indexer, &ingest).await?;
            }
            let mut stdout = std::io::stdout();
            repl::run(&pipeline.chatbot, BufReader::new(tokio::io::stdin()), &mut stdout).await?;
        }
    }
    Ok(())
}
