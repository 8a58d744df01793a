//! Scan ingestion: image → OCR → cleaned lines → new items.

mod normalize;
mod ocr;

pub use normalize::{clean_line, normalize};
pub use ocr::{OcrEngine, TesseractEngine};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::Item;

/// Errors that end a scan. A failed scan never produces items.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Recognition timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("A scan is already in progress")]
    Busy,
}

/// Builds one new item per cleaned line of `raw`, in line order.
pub fn items_from_text(raw: &str) -> Vec<Item> {
    normalize(raw).map(Item::new).collect()
}

/// Runs OCR with a timeout and turns the result into items.
///
/// Only one recognition may be outstanding at a time; a second call while
/// one is running fails with [`ScanError::Busy`].
pub struct Scanner {
    engine: Arc<dyn OcrEngine>,
    language: String,
    timeout: Duration,
    in_flight: Mutex<()>,
}

impl Scanner {
    pub fn new(engine: Arc<dyn OcrEngine>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            engine,
            language: language.into(),
            timeout,
            in_flight: Mutex::new(()),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub async fn scan(&self, image: &Path) -> Result<Vec<Item>, ScanError> {
        let _guard = self.in_flight.try_lock().map_err(|_| ScanError::Busy)?;

        let raw = tokio::time::timeout(self.timeout, self.engine.recognize(image, &self.language))
            .await
            .map_err(|_| ScanError::Timeout(self.timeout))??;

        let items = items_from_text(&raw);
        tracing::info!(image = %image.display(), items = items.len(), "Scan recognized");
        Ok(items)
    }
}
