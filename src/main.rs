use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use notice_sentiment::config::{Config, Selectors};
use notice_sentiment::fetch::HttpFetcher;
use notice_sentiment::pipeline::Pipeline;
use notice_sentiment::report;
use notice_sentiment::sentiment::SentimentAnalyzer;

/// Harvests public comment threads for a batch of regulatory notices and
/// writes per-comment and per-notice sentiment/summary CSVs.
#[derive(Parser)]
struct Cli {
    /// CSV listing the notice identifiers to process (column `notice_title`
    /// or `notice_id`)
    input: PathBuf,
    /// Directory the two output CSVs are written into
    #[arg(long, default_value = ".")]
    outdir: PathBuf,
    /// Optional TOML file overriding the site/selector/threshold defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = Config::load(cli.config.as_deref())?;
    let selectors = Selectors::compile(&cfg.selectors)?;
    let notice_ids = report::read_notice_ids(&cli.input, &cfg.id_columns)?;
    tracing::info!(notices = notice_ids.len(), "starting batch");

    let fetcher = HttpFetcher::new(cfg.timeout_secs)?;
    // tokenizer-free analyzer, but still built once up front and injected as
    // a read-only dependency
    let analyzer = SentimentAnalyzer::new();

    let pipeline = Pipeline::new(&cfg, &selectors, &fetcher, &analyzer);
    let out = pipeline.run(&notice_ids).await;

    // the only writes of the run: both collections, once, at the end
    let mut detailed = report::detailed_frame(&out.detailed)?;
    let mut aggregated = report::aggregate_frame(&out.aggregated)?;
    std::fs::create_dir_all(&cli.outdir)?;
    report::write_csv(&mut detailed, &cli.outdir.join("comments_detailed.csv"))?;
    report::write_csv(&mut aggregated, &cli.outdir.join("comments_aggregated.csv"))?;

    println!(
        "Saved {} summaries and {} comments.",
        out.aggregated.len(),
        out.detailed.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install tracing subscriber");
    }

    let cli = Cli::parse();
    match run(cli).await {
        // exit status reflects whether the batch completed, not whether every
        // notice in it succeeded
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let chain = format!("{e:#}");
            tracing::error!(error = %chain, "batch aborted");
            ExitCode::FAILURE
        }
    }
}
