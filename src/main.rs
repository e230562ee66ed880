use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use property_core::config::{AppConfig, EngineConfig};
use property_core::error::AppError;
use property_core::resolution::{
    CachedGeocoder, CanonicalProperty, InMemoryPropertyRepository, IngestOutcome, NoGeocoder,
    RawExternalRecord, ResolutionError, ResolutionService,
};
use property_core::scoring::{
    DealScoreResult, DealScoringEngine, LhaRateTable, TaAssessor, TaSuitabilityResult,
};
use property_core::telemetry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "deal-finder",
    about = "Resolve property records from many sources and score them as investment targets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score canonical properties: deal score, HMO classification and TA verdict
    Score(ScoreArgs),
    /// Ingest raw source records into a canonical property store
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// JSON file holding one canonical property or an array of them
    #[arg(long)]
    property: PathBuf,
    /// LHA rate table (city,bedrooms,monthly_rate,weekly_rate,outcode)
    #[arg(long)]
    lha: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// JSON array of raw source records, processed in order
    #[arg(long)]
    records: PathBuf,
    /// Canonical property store; loaded when present and rewritten after ingestion
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PropertyInput {
    One(Box<CanonicalProperty>),
    Many(Vec<CanonicalProperty>),
}

impl PropertyInput {
    fn into_vec(self) -> Vec<CanonicalProperty> {
        match self {
            PropertyInput::One(property) => vec![*property],
            PropertyInput::Many(properties) => properties,
        }
    }
}

#[derive(Debug, Serialize)]
struct PropertyReport {
    property_id: String,
    address: String,
    deal: DealScoreResult,
    ta: TaSuitabilityResult,
}

#[derive(Debug, Serialize)]
struct RecordReport {
    index: usize,
    source: String,
    #[serde(flatten)]
    result: RecordResult,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RecordResult {
    Resolved(IngestOutcome),
    Rejected { outcome: &'static str, error: String },
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    records: Vec<RecordReport>,
    properties: Vec<CanonicalProperty>,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(?config.environment, "deal finder starting");

    let output = match cli.command {
        Command::Score(args) => serde_json::to_string_pretty(&run_score(&config.engine, args)?)?,
        Command::Resolve(args) => {
            serde_json::to_string_pretty(&run_resolve(&config.engine, args)?)?
        }
    };
    println!("{output}");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn run_score(engine: &EngineConfig, args: ScoreArgs) -> Result<Vec<PropertyReport>, AppError> {
    let properties = read_json::<PropertyInput>(&args.property)?.into_vec();
    let lha = match &args.lha {
        Some(path) => LhaRateTable::from_path(path)?,
        None => {
            warn!("no LHA table supplied; TA budget checks will fail");
            LhaRateTable::default()
        }
    };
    info!(properties = properties.len(), lha_rates = lha.len(), "scoring properties");

    Ok(score_properties(engine, &properties, &lha))
}

fn score_properties(
    engine: &EngineConfig,
    properties: &[CanonicalProperty],
    lha: &LhaRateTable,
) -> Vec<PropertyReport> {
    let scorer = DealScoringEngine::new(engine.deal.clone());
    let assessor = TaAssessor::new(engine.ta.clone());

    properties
        .iter()
        .map(|property| PropertyReport {
            property_id: property.id.to_string(),
            address: property.address.clone(),
            deal: scorer.score_and_classify(property, &engine.hmo),
            ta: assessor.assess(property, lha),
        })
        .collect()
}

fn run_resolve(engine: &EngineConfig, args: ResolveArgs) -> Result<ResolveReport, AppError> {
    let records: Vec<RawExternalRecord> = read_json(&args.records)?;
    let existing: Vec<CanonicalProperty> = match &args.store {
        Some(path) if path.exists() => read_json(path)?,
        _ => Vec::new(),
    };
    info!(
        records = records.len(),
        existing = existing.len(),
        "resolving records"
    );

    let report = resolve_records(engine, existing, &records);

    if let Some(path) = &args.store {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &report.properties)?;
        info!(path = %path.display(), properties = report.properties.len(), "store written");
    }
    Ok(report)
}

fn resolve_records(
    engine: &EngineConfig,
    existing: Vec<CanonicalProperty>,
    records: &[RawExternalRecord],
) -> ResolveReport {
    let repository = Arc::new(InMemoryPropertyRepository::with_properties(existing));
    let geocoder = Arc::new(CachedGeocoder::new(NoGeocoder, engine.cache.clone()));
    let service = ResolutionService::new(repository.clone(), geocoder, engine.matching.clone());

    let reports = records
        .iter()
        .zip(service.ingest_all(records))
        .enumerate()
        .map(|(index, (record, result))| RecordReport {
            index,
            source: record.source.to_string(),
            result: match result {
                Ok(outcome) => RecordResult::Resolved(outcome),
                Err(err) => RecordResult::Rejected {
                    outcome: rejection_label(&err),
                    error: err.to_string(),
                },
            },
        })
        .collect();

    ResolveReport {
        records: reports,
        properties: repository.all(),
    }
}

fn rejection_label(err: &ResolutionError) -> &'static str {
    match err {
        ResolutionError::Rejected(_) => "rejected",
        ResolutionError::Repository(_) => "failed",
    }
}
