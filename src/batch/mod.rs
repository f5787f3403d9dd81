//! Batch conversion pipeline: many XML inputs → rendered PDF artifacts →
//! packaged archive.
//!
//! Items are fanned out over rayon's bounded worker pool; normalization of
//! one document never depends on another. The success collection keeps
//! input order regardless of completion order, and one item's failure is
//! caught at the item boundary — it becomes a failure entry, never an
//! aborted batch.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::core::{FiscalDocument, FiscalError, RenderAdapter};
use crate::xml::normalize;

/// Intake cap. Inputs beyond this are rejected before any processing.
pub const MAX_BATCH_INPUTS: usize = 100;

/// One raw input: display name plus XML text.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub name: String,
    pub xml: String,
}

impl BatchInput {
    pub fn new(name: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xml: xml.into(),
        }
    }
}

/// A successfully converted item.
#[derive(Debug, Clone)]
pub struct BatchArtifact {
    /// Original display name.
    pub name: String,
    /// The normalized document.
    pub document: FiscalDocument,
    /// Rendered DANFE bytes.
    pub pdf: Vec<u8>,
}

/// A failed item: display name plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub name: String,
    pub reason: String,
}

/// Result of a batch run. Both collections are always reported — a batch
/// is never an all-or-nothing outcome.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Successes, in input order (failed items are simply absent).
    pub artifacts: Vec<BatchArtifact>,
    /// One entry per failing item.
    pub failures: Vec<BatchFailure>,
    /// True when a cancellation was observed before all items ran.
    pub cancelled: bool,
}

/// Cooperative cancellation flag, checked between items: the in-flight
/// item finishes, queued items are abandoned.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

enum ItemResult {
    Ok(Box<BatchArtifact>),
    Failed(BatchFailure),
    Skipped,
}

/// Convert every input to a DANFE PDF with per-item failure isolation.
///
/// # Errors
///
/// Only [`FiscalError::BatchLimitExceeded`] — and only at intake, before
/// any item is processed. Item-level failures are reported through
/// [`BatchOutcome::failures`].
pub fn convert_batch(
    inputs: &[BatchInput],
    renderer: &dyn RenderAdapter,
    cancel: &CancelToken,
) -> Result<BatchOutcome, FiscalError> {
    if inputs.len() > MAX_BATCH_INPUTS {
        return Err(FiscalError::BatchLimitExceeded {
            count: inputs.len(),
            max: MAX_BATCH_INPUTS,
        });
    }

    // Fan-out: completion order is whatever the pool gives us, but
    // `collect` keeps the results aligned with input order.
    let results: Vec<ItemResult> = inputs
        .par_iter()
        .map(|input| {
            if cancel.is_cancelled() {
                return ItemResult::Skipped;
            }
            match convert_one(input, renderer) {
                Ok(artifact) => {
                    debug!(name = %input.name, "converted");
                    ItemResult::Ok(Box::new(artifact))
                }
                Err(e) => {
                    warn!(name = %input.name, error = %e, "conversion failed");
                    ItemResult::Failed(BatchFailure {
                        name: input.name.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        })
        .collect();

    // Fan-in, input order preserved.
    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            ItemResult::Ok(artifact) => outcome.artifacts.push(*artifact),
            ItemResult::Failed(failure) => outcome.failures.push(failure),
            ItemResult::Skipped => outcome.cancelled = true,
        }
    }
    Ok(outcome)
}

fn convert_one(
    input: &BatchInput,
    renderer: &dyn RenderAdapter,
) -> Result<BatchArtifact, FiscalError> {
    let document = normalize(&input.xml)?;
    let pdf = renderer.render(&document)?;
    Ok(BatchArtifact {
        name: input.name.clone(),
        document,
        pdf,
    })
}

/// Bundle all artifacts into one ZIP, each entry named after its source
/// with the extension replaced by `.pdf`, no directories.
///
/// An empty artifact set is a distinct [`FiscalError::NothingToPackage`]
/// condition — an empty archive is never produced silently.
pub fn package_archive(artifacts: &[BatchArtifact]) -> Result<Vec<u8>, FiscalError> {
    if artifacts.is_empty() {
        return Err(FiscalError::NothingToPackage);
    }

    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for artifact in artifacts {
        writer
            .start_file(pdf_entry_name(&artifact.name), options)
            .map_err(|e| FiscalError::Archive(e.to_string()))?;
        writer
            .write_all(&artifact.pdf)
            .map_err(|e| FiscalError::Archive(e.to_string()))?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| FiscalError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// `nota.xml` → `nota.pdf`; a name without an extension just gains one.
fn pdf_entry_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.pdf"),
        _ => format!("{name}.pdf"),
    }
}
