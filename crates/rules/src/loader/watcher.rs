//! Filesystem event handler for the notify watcher (hot-reload).

use std::fs;
use std::path::Path;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{is_rule_file, parse_document, write_map, DocumentMap};
use super::error::RuleError;

pub(super) fn handle_fs_event(event: &Event, documents: &DocumentMap) {
    for path in &event.paths {
        if !is_rule_file(path) {
            continue;
        }
        // Dotfiles include our own .tmp writes.
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(true, |name| name.starts_with('.'))
        {
            continue;
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_)) => reload(path, documents),
            EventKind::Remove(RemoveKind::File) => remove_by_path(path, documents),
            _ => {}
        }
    }
}

fn reload(path: &Path, documents: &DocumentMap) {
    let parsed = fs::read_to_string(path)
        .map_err(RuleError::from)
        .and_then(|contents| parse_document(&contents));

    match parsed {
        Ok(doc) => {
            let rule_id = doc.metadata().id.clone();
            info!(rule_id = %rule_id, kind = %doc.kind(), path = %path.display(), "hot-reloaded document");
            write_map(documents).insert(rule_id, doc);
        }
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "failed to reload document, keeping previous version"
        ),
    }
}

/// Documents are keyed by id, and files are named `<id>.<ext>`.
fn remove_by_path(path: &Path, documents: &DocumentMap) {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return;
    };
    if write_map(documents).remove(stem).is_some() {
        info!(rule_id = %stem, path = %path.display(), "removed document after file deletion");
    }
}
