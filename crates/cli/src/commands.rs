use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use redzone_catalog::AvailableFields;
use redzone_core::{Config, Record};
use redzone_rules::audit_log::{LogEntry, LogQueryParams};
use redzone_rules::engine::{CustomerRecord, RedZoneEngine, ScanReport};
use redzone_rules::evaluator::RuleEvaluator;
use redzone_rules::loader::{load_catalog, LoadStatus, RuleLoader};
use redzone_rules::schema::Rule;
use redzone_rules::validation::validate_document;
use serde::Serialize;
use tracing::info;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_catalog(path: &Path) -> Result<AvailableFields> {
    let doc = load_catalog(path)
        .with_context(|| format!("failed to load field catalog '{}'", path.display()))?;
    Ok(doc.resolver().resolve())
}

/// Load every rule document under `dir`, reporting files that failed.
fn load_rules(dir: &Path) -> Result<Vec<Rule>> {
    if !dir.is_dir() {
        bail!("rules directory '{}' does not exist", dir.display());
    }
    let loader = RuleLoader::new(dir.to_path_buf());
    for result in loader
        .load_all()
        .with_context(|| format!("failed to scan '{}'", dir.display()))?
    {
        if let LoadStatus::Failed { error } = &result.status {
            eprintln!("skipping {}: {error}", result.path.display());
        }
    }
    let rules = loader.red_zone_rules();
    info!(count = rules.len(), dir = %dir.display(), "rules loaded");
    Ok(rules)
}

pub fn fields(config: &Config, catalog: Option<PathBuf>) -> Result<ExitCode> {
    let path = catalog.unwrap_or_else(|| config.catalog.catalog_path.clone());
    let fields = resolve_catalog(&path)?;
    print_json(&fields)?;
    Ok(if fields.is_partial() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

pub fn validate(
    config: &Config,
    rules: Option<PathBuf>,
    catalog: Option<PathBuf>,
    strict: bool,
) -> Result<ExitCode> {
    let dir = rules.unwrap_or_else(|| config.rules.rules_dir.clone());
    if !dir.is_dir() {
        bail!("rules directory '{}' does not exist", dir.display());
    }
    let fields = catalog.as_deref().map(resolve_catalog).transpose()?;

    let loader = RuleLoader::new(dir.clone());
    let results = loader
        .load_all()
        .with_context(|| format!("failed to scan '{}'", dir.display()))?;

    let (mut loaded, mut failed, mut warned) = (0, 0, 0);
    for result in &results {
        let shown = result
            .path
            .strip_prefix(&dir)
            .unwrap_or(result.path.as_path())
            .display();
        match &result.status {
            LoadStatus::Loaded { rule_id } => {
                loaded += 1;
                println!("ok      {shown} ({rule_id})");
                let Some(doc) = loader.get(rule_id) else {
                    continue;
                };
                let report = validate_document(&doc, fields.as_ref());
                for warning in &report.warnings {
                    warned += 1;
                    println!("  warn  {}: {}", warning.path, warning.message);
                }
            }
            LoadStatus::Skipped { reason } => println!("skip    {shown} ({reason})"),
            LoadStatus::Failed { error } => {
                failed += 1;
                println!("FAILED  {shown}");
                println!("  error {error}");
            }
        }
    }

    println!("\n{loaded} loaded, {failed} failed, {warned} warnings");
    Ok(if failed > 0 || (strict && warned > 0) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub fn evaluate(
    config: &Config,
    rules: Option<PathBuf>,
    record: &Path,
    all: bool,
) -> Result<ExitCode> {
    let rules = load_rules(&rules.unwrap_or_else(|| config.rules.rules_dir.clone()))?
        .iter()
        .map(Rule::compile)
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to compile rules")?;
    let text = fs::read_to_string(record)
        .with_context(|| format!("failed to read record '{}'", record.display()))?;
    let record = Record::from_json(&text)
        .with_context(|| format!("'{}' is not a record object", record.display()))?;

    if all {
        print_json(&RuleEvaluator::matching(&rules, &record))?;
    } else {
        print_json(&RuleEvaluator::most_severe(&rules, &record))?;
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    #[serde(flatten)]
    report: &'a ScanReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    audit: Option<Vec<LogEntry>>,
}

pub fn scan(
    config: &Config,
    rules: Option<PathBuf>,
    records: &Path,
    threads: Option<usize>,
    audit: bool,
) -> Result<ExitCode> {
    let rules = load_rules(&rules.unwrap_or_else(|| config.rules.rules_dir.clone()))?;
    let text = fs::read_to_string(records)
        .with_context(|| format!("failed to read records '{}'", records.display()))?;
    let batch: Vec<CustomerRecord> = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not an array of {{customer_id, record}}", records.display()))?;

    let mut engine_config = config.engine.clone();
    if let Some(threads) = threads {
        engine_config.scan_threads = threads;
    }
    let mut engine = RedZoneEngine::new(Vec::new()).configured(&engine_config);
    engine.load_rules(&rules).context("failed to compile rules")?;
    let report = engine.scan(&batch);

    let log = engine.audit_log();
    let audit = audit.then(|| {
        let params = LogQueryParams::default();
        log.rule_ids()
            .iter()
            .flat_map(|id| log.query(id, &params))
            .collect()
    });
    print_json(&ScanOutput {
        report: &report,
        audit,
    })?;
    Ok(ExitCode::SUCCESS)
}
