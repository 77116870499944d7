// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loading and saving a whole annotation document.
//!
//! A document is a JSON array of flat attribute objects, one per annotation, bottom to top.
//! Loading is forgiving: a record that cannot be reconstructed is skipped and reported, and
//! the rest still load.

use markup_model::{Annotation, AnnotationId, AttributeError, AttributeMap};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{ActionLog, AnnotationStore, Command};

/// A document that could not be read or written at all.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The text is not a JSON array, or serialization failed.
    #[error("malformed annotation document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single record was skipped.
#[derive(Debug, Error)]
pub enum SkipReason {
    /// The record is not an object of string values.
    #[error("record is not a flat string map: {0}")]
    Shape(#[source] serde_json::Error),
    /// The record's attributes do not describe a valid annotation.
    #[error(transparent)]
    Attributes(#[from] AttributeError),
}

/// A record that was not loaded.
#[derive(Debug)]
pub struct SkippedRecord {
    /// Position of the record in the document.
    pub index: usize,
    /// What was wrong with it.
    pub reason: SkipReason,
}

/// Outcome of a load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Ids of the loaded annotations, bottom to top.
    pub loaded: Vec<AnnotationId>,
    /// Records that were skipped.
    pub skipped: Vec<SkippedRecord>,
}

fn insert_loaded(
    mut annotation: Annotation,
    store: &mut AnnotationStore,
    log: &mut ActionLog,
) -> AnnotationId {
    if store.contains(annotation.id()) {
        let fresh = store.allocate_id();
        debug!(old = %annotation.id(), new = %fresh, "duplicate id on load; reassigned");
        annotation = annotation.duplicate(fresh);
    }
    let id = annotation.id();
    log.execute(store, Command::create(annotation).without_history());
    id
}

/// Load already-parsed attribute records on top of the store, without recording history.
pub fn load_records(
    records: &[AttributeMap],
    store: &mut AnnotationStore,
    log: &mut ActionLog,
) -> LoadReport {
    let mut report = LoadReport::default();
    for (index, map) in records.iter().enumerate() {
        match Annotation::from_attributes(map) {
            Ok(annotation) => report.loaded.push(insert_loaded(annotation, store, log)),
            Err(err) => {
                warn!(index, error = %err, "skipping annotation record");
                report.skipped.push(SkippedRecord {
                    index,
                    reason: err.into(),
                });
            }
        }
    }
    report
}

/// Parse a JSON document and load it on top of the store, without recording history.
///
/// Fails only when the text is not a JSON array; bad records are skipped.
pub fn load_document(
    json: &str,
    store: &mut AnnotationStore,
    log: &mut ActionLog,
) -> Result<LoadReport, DocumentError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut report = LoadReport::default();
    for (index, value) in values.into_iter().enumerate() {
        let map: AttributeMap = match serde_json::from_value(value) {
            Ok(map) => map,
            Err(err) => {
                warn!(index, error = %err, "skipping annotation record");
                report.skipped.push(SkippedRecord {
                    index,
                    reason: SkipReason::Shape(err),
                });
                continue;
            }
        };
        let partial = load_records(core::slice::from_ref(&map), store, log);
        report.loaded.extend(partial.loaded);
        report
            .skipped
            .extend(partial.skipped.into_iter().map(|skipped| SkippedRecord {
                index,
                reason: skipped.reason,
            }));
    }
    debug!(
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        "loaded annotation document"
    );
    Ok(report)
}

/// Serialize every live annotation, bottom to top.
pub fn save_document(store: &AnnotationStore) -> Result<String, DocumentError> {
    let records: Vec<AttributeMap> = store.iter().map(Annotation::to_attributes).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
