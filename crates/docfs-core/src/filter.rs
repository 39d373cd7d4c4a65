//! Client-side hiding of categorized and dismissed documents, and the bulk
//! metadata edits that feed it.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::adapter::DocumentFs;
use crate::error::FsError;
use crate::path::{self, Depth, DOCUMENT_SUFFIX};
use crate::record::fields;

/// Result of patching several documents.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub patched: Vec<String>,
    /// Entries that needed no change.
    pub skipped: Vec<String>,
    pub failed: Vec<(String, FsError)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    Categorized,
    Dismissed,
}

/// A collection listing as shown to a user, with the hide toggles applied.
///
/// Turning a toggle on filters the listing already held, using the metadata
/// cached by the last directory read. Turning it off always relists.
pub struct CategoryFilter {
    fs: Arc<DocumentFs>,
    path: String,
    database: String,
    collection: String,
    visible: IndexSet<String>,
    categorized_snapshot: Option<IndexSet<String>>,
    dismissed_snapshot: Option<IndexSet<String>>,
    refreshes: u64,
}

impl CategoryFilter {
    /// Start filtering the collection at `path`, loading its listing.
    pub async fn open(fs: Arc<DocumentFs>, path: &str) -> Result<Self, FsError> {
        let parsed = path::parse(path);
        let (database, collection) = match (parsed.depth(), parsed.database, parsed.collection) {
            (Depth::Collection, Some(db), Some(coll)) => (db, coll),
            _ => {
                return Err(FsError::InvalidArgument(format!(
                    "Not a collection: {}",
                    path
                )))
            }
        };

        let mut filter = CategoryFilter {
            fs,
            path: format!("/{}/{}", database, collection),
            database,
            collection,
            visible: IndexSet::new(),
            categorized_snapshot: None,
            dismissed_snapshot: None,
            refreshes: 0,
        };
        filter.refresh().await?;
        Ok(filter)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Filenames currently shown.
    pub fn visible(&self) -> Vec<String> {
        self.visible.iter().cloned().collect()
    }

    /// Filenames removed from view since a toggle was turned on.
    pub fn hidden(&self) -> Vec<String> {
        let mut hidden = IndexSet::new();
        for snapshot in [&self.categorized_snapshot, &self.dismissed_snapshot]
            .into_iter()
            .flatten()
        {
            hidden.extend(
                snapshot
                    .iter()
                    .filter(|name| !self.visible.contains(*name))
                    .cloned(),
            );
        }
        hidden.into_iter().collect()
    }

    /// How many full relists have been issued.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    /// Relist the collection from the store.
    pub async fn refresh(&mut self) -> Result<(), FsError> {
        self.visible = self.fs.readdir(&self.path).await?.into_iter().collect();
        self.refreshes += 1;
        debug!(path = %self.path, entries = self.visible.len(), "listing refreshed");
        Ok(())
    }

    /// Flip "hide categorized". Returns the new state.
    pub async fn toggle_hide_categorized(&mut self) -> Result<bool, FsError> {
        let hide = !self.fs.hide_categorized();
        self.set_hiding(Flag::Categorized, hide).await?;
        Ok(hide)
    }

    /// Flip "hide dismissed". Returns the new state.
    pub async fn toggle_hide_dismissed(&mut self) -> Result<bool, FsError> {
        let hide = !self.fs.hide_dismissed();
        self.set_hiding(Flag::Dismissed, hide).await?;
        Ok(hide)
    }

    /// Force "hide categorized" on or off. Setting the current state is a no-op.
    pub async fn set_hide_categorized(&mut self, hide: bool) -> Result<(), FsError> {
        self.set_hiding(Flag::Categorized, hide).await
    }

    /// Force "hide dismissed" on or off. Setting the current state is a no-op.
    pub async fn set_hide_dismissed(&mut self, hide: bool) -> Result<(), FsError> {
        self.set_hiding(Flag::Dismissed, hide).await
    }

    async fn set_hiding(&mut self, flag: Flag, hide: bool) -> Result<(), FsError> {
        let current = match flag {
            Flag::Categorized => self.fs.hide_categorized(),
            Flag::Dismissed => self.fs.hide_dismissed(),
        };
        if current == hide {
            debug!(?flag, hide, "hide flag unchanged");
            return Ok(());
        }
        match flag {
            Flag::Categorized => self.fs.set_hide_categorized(hide),
            Flag::Dismissed => self.fs.set_hide_dismissed(hide),
        }

        if !hide {
            // categories may have changed while hidden
            *self.snapshot_mut(flag) = None;
            return self.refresh().await;
        }

        *self.snapshot_mut(flag) = Some(self.visible.clone());

        let cached = match flag {
            Flag::Categorized => self.fs.cached_categorized(&self.path).await,
            Flag::Dismissed => self.fs.cached_dismissed(&self.path).await,
        };

        match cached {
            Some(identifiers) => {
                self.visible
                    .retain(|name| !identifiers.contains(identifier_of(name)));
                debug!(?flag, remaining = self.visible.len(), "filtered from cached metadata");
            }
            None => {
                debug!(?flag, "no cached metadata, relisting");
                self.refresh().await?;
            }
        }
        Ok(())
    }

    fn snapshot_mut(&mut self, flag: Flag) -> &mut Option<IndexSet<String>> {
        match flag {
            Flag::Categorized => &mut self.categorized_snapshot,
            Flag::Dismissed => &mut self.dismissed_snapshot,
        }
    }

    async fn cached_categories(&self) -> Option<HashMap<String, Option<String>>> {
        self.fs
            .cache()
            .metadata(&self.database, &self.collection)
            .await
            .map(|listing| {
                listing
                    .into_iter()
                    .map(|meta| (meta.identifier, meta.category))
                    .collect()
            })
    }

    /// The category to pre-fill when editing `entries`: set only when every
    /// entry has the same cached category, ignoring case.
    pub async fn suggested_category(&self, entries: &[String]) -> Option<String> {
        let categories = self.cached_categories().await?;
        let mut shared: Option<&String> = None;

        for entry in entries {
            let category = categories.get(identifier_of(entry))?.as_ref()?;
            match shared {
                None => shared = Some(category),
                Some(first) if first.to_lowercase() == category.to_lowercase() => {}
                Some(_) => return None,
            }
        }

        shared.cloned()
    }

    /// Merge comma-separated labels from `input` into each entry's category.
    ///
    /// Entries that already carry every label are skipped. Existing categories
    /// are read before any patch is issued.
    pub async fn set_category(
        &mut self,
        entries: &[String],
        input: &str,
    ) -> Result<BatchOutcome, FsError> {
        let labels = parse_labels(input);
        if labels.is_empty() {
            return Ok(BatchOutcome {
                skipped: entries.to_vec(),
                ..Default::default()
            });
        }

        let existing: HashMap<String, Option<String>> = self
            .fs
            .collection_metadata(&self.path)
            .await?
            .into_iter()
            .map(|meta| (meta.identifier, meta.category))
            .collect();

        let mut outcome = BatchOutcome::default();
        let mut plans = Vec::new();
        for entry in entries {
            let current = existing.get(identifier_of(entry)).and_then(|c| c.as_deref());
            match merge_labels(current, &labels) {
                Some(merged) => plans.push((entry.clone(), merged)),
                None => outcome.skipped.push(entry.clone()),
            }
        }

        let updates: Vec<(String, Map<String, Value>)> = plans
            .into_iter()
            .map(|(entry, merged)| {
                let mut update = Map::new();
                update.insert(fields::CATEGORY.to_string(), Value::String(merged));
                (entry, update)
            })
            .collect();

        self.apply(updates, &mut outcome).await;
        Ok(outcome)
    }

    /// Mark entries as dismissed. With "hide dismissed" on they leave the
    /// listing at once, without waiting for the store.
    pub async fn dismiss(&mut self, entries: &[String]) -> BatchOutcome {
        let updates = entries
            .iter()
            .map(|entry| {
                let mut update = Map::new();
                update.insert(fields::DISMISSED.to_string(), Value::Bool(true));
                (entry.clone(), update)
            })
            .collect();

        let mut outcome = BatchOutcome::default();
        self.apply(updates, &mut outcome).await;

        if self.fs.hide_dismissed() {
            self.visible.retain(|name| !entries.contains(name));
        }
        outcome
    }

    async fn apply(&self, updates: Vec<(String, Map<String, Value>)>, outcome: &mut BatchOutcome) {
        let fs = &self.fs;
        let results = join_all(updates.iter().map(|(entry, update)| {
            let path = format!("{}/{}", self.path, entry);
            async move { fs.patch_document(&path, update).await }
        }))
        .await;

        for ((entry, _), result) in updates.into_iter().zip(results) {
            match result {
                Ok(_) => outcome.patched.push(entry),
                Err(err) => {
                    warn!(entry = %entry, error = %err, "metadata patch failed");
                    outcome.failed.push((entry, err));
                }
            }
        }
    }
}

fn identifier_of(filename: &str) -> &str {
    filename.strip_suffix(DOCUMENT_SUFFIX).unwrap_or(filename)
}

/// Lower-cased, trimmed, non-empty labels of a comma-separated input.
pub fn parse_labels(input: &str) -> Vec<String> {
    let labels: IndexSet<String> = input
        .to_lowercase()
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect();
    labels.into_iter().collect()
}

/// Append the labels missing from `existing`. `None` when nothing is added.
pub fn merge_labels(existing: Option<&str>, labels: &[String]) -> Option<String> {
    let mut merged: IndexSet<String> = existing
        .unwrap_or_default()
        .split(',')
        .map(|label| label.trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .collect();

    let before = merged.len();
    merged.extend(labels.iter().cloned());
    if merged.len() == before {
        return None;
    }

    Some(merged.into_iter().collect::<Vec<_>>().join(", "))
}
