//! Core [`RuleLoader`] struct: filesystem-backed document loading with optional hot-reload.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::evaluator::CompiledRule;
use crate::schema::{FieldCatalogDocument, Rule, RuleDocument, RuleEnvelope};
use crate::validation::{validate_document, SchemaError};

use super::error::{LoadResult, LoadStatus, Result, RuleError};
use super::watcher::handle_fs_event;

pub(super) type DocumentMap = Arc<RwLock<HashMap<String, RuleDocument>>>;

pub(super) const RULE_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

pub(super) fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RULE_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

pub(super) fn read_map(map: &DocumentMap) -> RwLockReadGuard<'_, HashMap<String, RuleDocument>> {
    map.read().unwrap_or_else(PoisonError::into_inner)
}

pub(super) fn write_map(map: &DocumentMap) -> RwLockWriteGuard<'_, HashMap<String, RuleDocument>> {
    map.write().unwrap_or_else(PoisonError::into_inner)
}

/// Parse and validate one document (YAML or JSON text).
///
/// First pass reads the envelope for `kind`, second pass the concrete type.
/// Documents with validation errors are rejected; warnings are logged.
pub fn parse_document(contents: &str) -> Result<RuleDocument> {
    let envelope: RuleEnvelope = serde_yaml::from_str(contents)?;
    if envelope.metadata.id.is_empty() {
        return Err(RuleError::Invalid("metadata.id must not be empty".to_string()));
    }

    let doc = envelope.parse_full().map_err(|e| {
        RuleError::Invalid(format!("failed to parse '{}': {}", envelope.metadata.id, e))
    })?;

    let result = validate_document(&doc, None);
    for warning in &result.warnings {
        warn!(rule_id = %doc.metadata().id, path = %warning.path, "{}", warning.message);
    }
    if !result.valid {
        return Err(SchemaError::Invalid {
            rule_id: doc.metadata().id.clone(),
            errors: result.errors,
        }
        .into());
    }
    Ok(doc)
}

/// Read a standalone `FieldCatalog` document.
pub fn load_catalog(path: &Path) -> Result<FieldCatalogDocument> {
    let doc = parse_document(&fs::read_to_string(path)?)?;
    match doc {
        RuleDocument::FieldCatalog(catalog) => Ok(catalog),
        other => Err(RuleError::Invalid(format!(
            "{} is a {} document, expected FieldCatalog",
            path.display(),
            other.kind()
        ))),
    }
}

/// Filesystem-backed document loader with optional hot-reload.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` / `*.json` files
/// and keeps an in-memory map keyed by `metadata.id`.
pub struct RuleLoader {
    rules_dir: PathBuf,
    documents: DocumentMap,
    /// Held to keep the watcher alive.
    _watcher: Option<RecommendedWatcher>,
}

impl RuleLoader {
    /// Create a loader for `rules_dir`, creating the directory if needed.
    pub fn new(rules_dir: PathBuf) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            documents: Arc::new(RwLock::new(HashMap::new())),
            _watcher: None,
        }
    }

    /// Recursively load every document under the rules directory.
    ///
    /// Per-file problems are reported in the results and never abort the scan.
    /// Files are visited in path order; a file whose id was already loaded
    /// from another file in the same pass is reported as failed.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        let mut origins = HashMap::new();
        self.scan_dir_recursive(&self.rules_dir, &mut origins, &mut results)?;
        results.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(results)
    }

    fn scan_dir_recursive(
        &self,
        dir: &Path,
        origins: &mut HashMap<String, PathBuf>,
        results: &mut Vec<LoadResult>,
    ) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, origins, results)?;
                continue;
            }

            if !is_rule_file(&path) {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML or JSON file".to_string(),
                    },
                });
                continue;
            }

            let status = match self.load_file(&path) {
                Ok(doc) => {
                    let rule_id = doc.metadata().id.clone();
                    if let Some(first) = origins.get(&rule_id) {
                        let error = format!(
                            "duplicate id '{}' (already loaded from {})",
                            rule_id,
                            first.display()
                        );
                        warn!(rule_id = %rule_id, path = %path.display(), "{error}");
                        LoadStatus::Failed { error }
                    } else {
                        info!(rule_id = %rule_id, kind = %doc.kind(), path = %path.display(), "loaded document");
                        origins.insert(rule_id.clone(), path.clone());
                        write_map(&self.documents).insert(rule_id.clone(), doc);
                        LoadStatus::Loaded { rule_id }
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load document");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Parse and validate a single file without touching the in-memory set.
    pub fn load_file(&self, path: &Path) -> Result<RuleDocument> {
        parse_document(&fs::read_to_string(path)?)
    }

    /// Start a recursive filesystem watcher.
    ///
    /// Created or modified files are re-parsed and upserted; deleted files
    /// are removed. Invalid edits are logged and the previous version kept.
    pub fn watch(&mut self) -> Result<()> {
        let documents = Arc::clone(&self.documents);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &documents),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;
        watcher.watch(&self.rules_dir, RecursiveMode::Recursive)?;
        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.rules_dir.display(), "watching rules directory for changes");
        self._watcher = Some(watcher);
        Ok(())
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Shared map of all loaded documents.
    pub fn documents(&self) -> DocumentMap {
        Arc::clone(&self.documents)
    }

    pub fn get(&self, id: &str) -> Option<RuleDocument> {
        read_map(&self.documents).get(id).cloned()
    }

    pub fn len(&self) -> usize {
        read_map(&self.documents).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All loaded Red Zone rules, ordered by id.
    pub fn red_zone_rules(&self) -> Vec<Rule> {
        let mut rules: Vec<Rule> = read_map(&self.documents)
            .values()
            .filter_map(|doc| doc.as_red_zone().map(|d| d.to_rule()))
            .collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules
    }

    /// Compile every loaded Red Zone rule, ordered by id.
    pub fn compiled_rules(&self) -> std::result::Result<Vec<CompiledRule>, SchemaError> {
        self.red_zone_rules().iter().map(Rule::compile).collect()
    }

    /// All loaded field catalog documents, ordered by id.
    pub fn field_catalogs(&self) -> Vec<FieldCatalogDocument> {
        let mut catalogs: Vec<FieldCatalogDocument> = read_map(&self.documents)
            .values()
            .filter_map(|doc| doc.as_field_catalog().cloned())
            .collect();
        catalogs.sort_by(|a, b| a.metadata.id.cmp(&b.metadata.id));
        catalogs
    }

    /// Validate and atomically write a document as `<id>.yml`.
    ///
    /// Writes to a dot-prefixed `.tmp` file first, then renames it into place.
    pub fn write_document(&self, doc: &RuleDocument) -> Result<PathBuf> {
        let result = validate_document(doc, None);
        if !result.valid {
            return Err(SchemaError::Invalid {
                rule_id: doc.metadata().id.clone(),
                errors: result.errors,
            }
            .into());
        }

        let meta = doc.metadata();
        let final_path = self.rules_dir.join(format!("{}.yml", meta.id));
        let tmp_path = self.rules_dir.join(format!(".{}.tmp", meta.id));

        fs::write(&tmp_path, doc.to_yaml()?)?;
        fs::rename(&tmp_path, &final_path)?;

        info!(rule_id = %meta.id, kind = %doc.kind(), path = %final_path.display(), "wrote document");
        write_map(&self.documents).insert(meta.id.clone(), doc.clone());
        Ok(final_path)
    }

    /// Write a Red Zone rule as a `v1` document.
    pub fn write_rule(&self, rule: &Rule) -> Result<PathBuf> {
        self.write_document(&RuleDocument::RedZone(
            crate::schema::RedZoneRuleDocument::from_rule(rule),
        ))
    }

    /// Delete the file for `id` (any supported extension) and forget the document.
    pub fn delete_rule(&self, id: &str) -> Result<()> {
        let path = RULE_EXTENSIONS
            .iter()
            .map(|ext| self.rules_dir.join(format!("{id}.{ext}")))
            .find(|p| p.exists())
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;

        fs::remove_file(&path)?;
        write_map(&self.documents).remove(id);
        info!(rule_id = %id, path = %path.display(), "deleted document");
        Ok(())
    }
}
