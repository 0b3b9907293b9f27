//! Pipeline entry points: OCR text (or an image) in, domain analyses out.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::extract_domains;
use crate::enrichment::Enricher;
use crate::error_handling::{EnrichmentError, PipelineError};
use crate::models::{DomainAnalysis, TrafficQuery};
use crate::ocr::TextRecognizer;

/// Extraction followed by enrichment, optionally preceded by OCR.
pub struct Pipeline {
    enricher: Arc<Enricher>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl Pipeline {
    /// Creates a text-only pipeline; image input needs `with_recognizer`.
    pub fn new(enricher: Arc<Enricher>) -> Self {
        Self {
            enricher,
            recognizer: None,
        }
    }

    /// Enables image input.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// The orchestrator, for its limiter and stats.
    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Whether [`Pipeline::analyze_image`] can run.
    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Analyzes the domains mentioned in OCR text lines.
    ///
    /// Lines with no valid domain contribute nothing; an input without any
    /// domain yields an empty result.
    ///
    /// # Errors
    ///
    /// Fails only when the invocation is cancelled.
    pub async fn analyze<S>(
        &self,
        lines: &[S],
        query: &TrafficQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<DomainAnalysis>, PipelineError>
    where
        S: AsRef<str> + Sync,
    {
        let domains = extract_domains(lines);
        if domains.is_empty() {
            log::info!("No domains found in {} line(s)", lines.len());
            return Ok(Vec::new());
        }
        Ok(self.enricher.enrich(&domains, query, cancel).await?)
    }

    /// Recognizes the text in `image`, then analyzes it like [`Pipeline::analyze`].
    ///
    /// # Errors
    ///
    /// - `PipelineError::OcrNotConfigured` when no recognizer was attached
    /// - `PipelineError::Ocr` when the image is empty, unreadable or the OCR service fails
    /// - `PipelineError::Enrichment` when the invocation is cancelled
    pub async fn analyze_image(
        &self,
        image: &[u8],
        query: &TrafficQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<DomainAnalysis>, PipelineError> {
        let recognizer = self
            .recognizer
            .as_ref()
            .ok_or(PipelineError::OcrNotConfigured)?;

        let lines = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(EnrichmentError::Cancelled { completed: 0, total: 0 }.into());
            }
            lines = recognizer.recognize(image) => lines?,
        };
        log::debug!("OCR returned {} line(s)", lines.len());

        self.analyze(lines.as_slice(), query, cancel).await
    }
}
