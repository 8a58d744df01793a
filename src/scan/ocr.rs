//! OCR engine boundary.

use futures::future::BoxFuture;
use std::path::Path;

use super::ScanError;

/// Turns an image into raw recognized text.
pub trait OcrEngine: Send + Sync {
    fn recognize<'a>(
        &'a self,
        image: &'a Path,
        language: &'a str,
    ) -> BoxFuture<'a, Result<String, ScanError>>;
}

/// Runs the `tesseract` command-line tool.
///
/// Invoked as `tesseract <image> stdout -l <language>`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: String,
}

impl TesseractEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize<'a>(
        &'a self,
        image: &'a Path,
        language: &'a str,
    ) -> BoxFuture<'a, Result<String, ScanError>> {
        Box::pin(async move {
            if !image.is_file() {
                return Err(ScanError::Recognition(format!(
                    "image not found: {}",
                    image.display()
                )));
            }

            tracing::debug!(command = %self.command, image = %image.display(), language, "Running OCR");

            let output = tokio::process::Command::new(&self.command)
                .arg(image)
                .arg("stdout")
                .arg("-l")
                .arg(language)
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| {
                    ScanError::Recognition(format!("failed to run {}: {}", self.command, e))
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ScanError::Recognition(stderr.trim().to_string()));
            }

            String::from_utf8(output.stdout)
                .map_err(|_| ScanError::Recognition("OCR output is not valid UTF-8".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_image_is_recognition_error() {
        let temp_dir = tempdir().unwrap();
        let engine = TesseractEngine::default();

        let result = engine
            .recognize(&temp_dir.path().join("missing.png"), "eng")
            .await;

        assert!(matches!(result, Err(ScanError::Recognition(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_recognition_error() {
        let temp_dir = tempdir().unwrap();
        let image = temp_dir.path().join("page.png");
        std::fs::write(&image, b"not really a png").unwrap();

        let engine = TesseractEngine::new("scanlist-no-such-ocr-binary");
        let result = engine.recognize(&image, "eng").await;

        match result {
            Err(ScanError::Recognition(msg)) => {
                assert!(msg.contains("scanlist-no-such-ocr-binary"))
            }
            other => panic!("expected recognition error, got {:?}", other),
        }
    }
}
