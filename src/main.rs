use anyhow::Context;
use argrisk_api::RestApi;
use argrisk_core::export::{BULK_EXPORT_FILENAME, RISK_EXPORT_FILENAME};
use argrisk_core::{
    bulk_table, compute, lookup, parse_pasted, parse_query_lines, parse_table, record_table,
    resolve_all, risk_table, ClampPolicy, DatasetHandle, LookupOutcome, ReferenceDataset,
    ResultTable, Settings,
};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Antimicrobial-resistance gene risk lookup
#[derive(Parser, Debug)]
#[command(name = "argrisk")]
#[command(about = "Look up ARG risk scores and compute sample risk indices", long_about = None)]
struct Args {
    /// Reference dataset (CSV or TSV)
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct MatchArgs {
    /// Match gene keys exactly instead of fuzzily
    #[arg(long)]
    exact: bool,

    /// Fuzzy match cutoff (50-95)
    #[arg(long)]
    cutoff: Option<u8>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// HTTP API port
        #[arg(long, default_value_t = 8080)]
        http_port: u16,
    },
    /// Look up a single gene
    Lookup {
        query: String,

        #[command(flatten)]
        matching: MatchArgs,

        /// Number of similar matches to report
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Resolve one gene per line from a file or stdin
    Bulk {
        /// Query file; stdin when omitted
        input: Option<PathBuf>,

        #[command(flatten)]
        matching: MatchArgs,

        /// Write the CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute the risk index of a sample
    Risk {
        /// Abundance table (Genes, Abundance); stdin when omitted
        input: Option<PathBuf>,

        /// Read `gene, abundance` lines instead of a table
        #[arg(long)]
        pasted: bool,

        /// Score column to weight by
        #[arg(long)]
        score: Option<String>,

        /// Score clamp policy (none, unit)
        #[arg(long)]
        clamp: Option<ClampPolicy>,

        #[command(flatten)]
        matching: MatchArgs,

        /// Write the breakdown CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List display and score columns of the dataset
    Columns,
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("reading settings from {:?}", path))?,
        None => Settings::default(),
    };
    if let Some(path) = &args.dataset {
        settings.dataset = Some(path.to_string_lossy().into_owned());
    }
    Ok(settings)
}

fn apply_match_args(settings: &mut Settings, matching: &MatchArgs) -> anyhow::Result<()> {
    if matching.exact {
        settings.matching.fuzzy = false;
    }
    if let Some(cutoff) = matching.cutoff {
        settings.matching.cutoff = cutoff;
    }
    settings.validate()?;
    Ok(())
}

fn load_dataset(settings: &Settings) -> anyhow::Result<ReferenceDataset> {
    let path = settings.dataset_path();
    ReferenceDataset::load(path).with_context(|| format!("loading reference dataset {}", path))
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))
        }
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn write_table(table: &ResultTable, output: Option<&Path>, default_name: &str) -> anyhow::Result<()> {
    let csv = table.to_csv()?;
    match output {
        Some(path) => {
            std::fs::write(path, csv).with_context(|| format!("writing {:?}", path))?;
            info!("Wrote {} rows to {:?}", table.len(), path);
        }
        None => {
            print!("{}", csv);
            info!("Wrote {} rows (save as {})", table.len(), default_name);
        }
    }
    Ok(())
}

async fn serve(settings: Settings, http_port: u16) -> anyhow::Result<()> {
    let dataset = Arc::new(DatasetHandle::new(settings.dataset_path()));
    info!("Reference dataset: {}", settings.dataset_path());

    let preload = dataset.clone();
    match tokio::task::spawn_blocking(move || preload.get_or_load()).await? {
        Ok(loaded) => info!("Reference dataset ready: {} genes", loaded.len()),
        Err(e) => warn!("Reference dataset not loaded, retrying on first request: {}", e),
    }
    info!("HTTP API port: {}", http_port);

    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(dataset, settings, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut settings = load_settings(&args)?;

    match &args.command {
        Command::Serve { http_port } => {
            settings.validate()?;
            info!("Starting argrisk v{}", env!("CARGO_PKG_VERSION"));
            serve(settings, *http_port).await?;
        }
        Command::Lookup { query, matching, limit } => {
            apply_match_args(&mut settings, matching)?;
            if let Some(limit) = limit {
                settings.matching.limit = (*limit).max(1);
            }
            let dataset = load_dataset(&settings)?;
            let body = match lookup(&dataset, query, &settings.matching) {
                LookupOutcome::Empty => anyhow::bail!("query is empty"),
                LookupOutcome::Hit { record, note, similar } => serde_json::json!({
                    "query": query,
                    "note": note,
                    "match": record.genes,
                    "risk_percent": record.risk_percent(),
                    "record": record_table(&dataset, record),
                    "similar": similar,
                }),
                LookupOutcome::Miss { note } => serde_json::json!({ "query": query, "note": note }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Bulk { input, matching, output } => {
            apply_match_args(&mut settings, matching)?;
            let dataset = load_dataset(&settings)?;
            let queries = parse_query_lines(&read_input(input.as_deref())?);
            let results = resolve_all(&dataset, &queries, &settings.matching);
            write_table(&bulk_table(&dataset, &results), output.as_deref(), BULK_EXPORT_FILENAME)?;
        }
        Command::Risk { input, pasted, score, clamp, matching, output } => {
            apply_match_args(&mut settings, matching)?;
            let dataset = load_dataset(&settings)?;
            let text = read_input(input.as_deref())?;
            let entries = if *pasted { parse_pasted(&text) } else { parse_table(&text)? };
            if entries.is_empty() {
                anyhow::bail!("no abundance entries found");
            }

            let score = score.as_deref().unwrap_or(&settings.risk.score_attribute);
            let clamp = clamp.unwrap_or(settings.risk.clamp);
            let index = compute(&dataset, &entries, score, &settings.matching, clamp)?;

            write_table(&risk_table(&dataset, &index), output.as_deref(), RISK_EXPORT_FILENAME)?;
            eprintln!("Risk Index ({}): {}", index.score_column, index.display_total());
        }
        Command::Columns => {
            let dataset = load_dataset(&settings)?;
            let body = serde_json::json!({
                "rows": dataset.len(),
                "display_columns": dataset.display_columns(),
                "score_columns": dataset.score_columns(),
                "default_score_column": dataset.default_score_column(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
