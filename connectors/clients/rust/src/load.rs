// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Bulk loading of node documents from JSON files.

use std::path::{Path, PathBuf};

use awaredb_model::NodeDocument;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::client::AwareDbClient;
use crate::error::{AwareDbError, Result};

/// How [`AwareDbClient::load`] walks the file system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Descend into sub-folders.
    pub recursive: bool,
    /// Flush the database before writing.
    pub flush: bool,
}

impl AwareDbClient {
    /// Write every node found at `path` with a single `update`.
    ///
    /// `path` is either a JSON file or a folder of `*.json` files, read in
    /// file-name order. A file holds one node object or a list of them.
    /// Everything is decoded before anything is sent, so a malformed file
    /// leaves the database untouched, even with [`LoadOptions::flush`].
    ///
    /// # Errors
    ///
    /// Returns [`AwareDbError::Validation`] if `path` does not exist,
    /// [`AwareDbError::Io`] if a file cannot be read, and a model error if a
    /// document is malformed.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), recursive = options.recursive, flush = options.flush))]
    pub async fn load(&self, path: impl AsRef<Path>, options: LoadOptions) -> Result<Vec<NodeDocument>> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|_| {
            AwareDbError::Validation(format!("path '{}' does not exist", path.display()))
        })?;

        let files = if metadata.is_dir() {
            json_files(path, options.recursive).await?
        } else {
            vec![path.to_path_buf()]
        };

        let mut documents = Vec::new();
        for file in &files {
            documents.extend(read_documents(file).await?);
        }
        info!(files = files.len(), documents = documents.len(), "Collected documents");

        if options.flush {
            self.flush().await?;
        }
        if documents.is_empty() {
            warn!("Nothing to load");
            return Ok(Vec::new());
        }
        self.update(&documents, false).await
    }
}

/// `*.json` files under `root`, sorted by name within each folder. Files of a
/// folder come before its sub-folders.
async fn json_files(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(folder) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&folder)
            .await
            .map_err(|e| AwareDbError::io(&folder, e))?;
        let mut files = Vec::new();
        let mut folders = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AwareDbError::io(&folder, e))?
        {
            let entry_path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| AwareDbError::io(&entry_path, e))?;
            if file_type.is_dir() {
                if recursive {
                    folders.push(entry_path);
                }
            } else if is_json(&entry_path) {
                files.push(entry_path);
            }
        }
        files.sort();
        found.extend(files);
        folders.sort();
        pending.extend(folders.into_iter().rev());
    }
    Ok(found)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

async fn read_documents(file: &Path) -> Result<Vec<NodeDocument>> {
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| AwareDbError::io(file, e))?;
    let raw: Value = serde_json::from_str(&text)?;
    let items = match raw {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(AwareDbError::Validation(format!(
                "{}: expected a node object or a list of them, got {other}",
                file.display()
            )))
        }
    };
    debug!(file = %file.display(), nodes = items.len(), "Read file");
    items
        .iter()
        .map(|item| {
            NodeDocument::from_json(item).map_err(|e| {
                warn!(file = %file.display(), error = %e, "Malformed document");
                AwareDbError::Model(e)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_json() {
        assert!(is_json(Path::new("nodes.json")));
        assert!(is_json(Path::new("NODES.JSON")));
        assert!(!is_json(Path::new("nodes.json.bak")));
        assert!(!is_json(Path::new("json")));
    }
}
