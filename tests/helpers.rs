// Shared fakes for the lookup ports and the OCR collaborator.
//
// Every test file that needs them declares `mod helpers;`, so not every
// helper is used by every file.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use domain_analyzer::{
    ArchiveLookup, ArchiveRecord, DomainCandidate, Enricher, EnrichmentOptions, LookupError,
    OcrError, TextRecognizer, TrafficLookup, TrafficQuery, TrafficRecord, TrafficRequestMeta,
    VisitPoint,
};

/// Archive record captured on 2010-06-15 for `host`.
pub fn archive_record(host: &str) -> ArchiveRecord {
    ArchiveRecord {
        captured_at: Utc.with_ymd_and_hms(2010, 6, 15, 14, 29, 33).unwrap(),
        original: format!("http://{host}/"),
    }
}

/// Traffic record with one monthly point per value, starting 2023-01.
pub fn traffic_record(host: &str, values: &[f64]) -> TrafficRecord {
    TrafficRecord {
        visits: values
            .iter()
            .enumerate()
            .map(|(i, visits)| VisitPoint {
                date: format!("2023-{:02}-01", i + 1),
                visits: *visits,
            })
            .collect(),
        request: TrafficRequestMeta {
            domain: host.to_string(),
            granularity: "monthly".to_string(),
            ..Default::default()
        },
        status: Some("Success".to_string()),
        last_updated: None,
    }
}

pub fn enricher<A, T>(archive: A, traffic: T, max_concurrency: usize, timeout: Duration) -> Enricher
where
    A: ArchiveLookup + 'static,
    T: TrafficLookup + 'static,
{
    Enricher::new(
        Arc::new(archive),
        Arc::new(traffic),
        EnrichmentOptions {
            max_concurrency,
            lookup_timeout: timeout,
        },
    )
}

/// How a fake lookup should behave for one host.
#[derive(Clone)]
pub enum Behavior {
    Succeed,
    Fail(LookupError),
    /// Never completes
    Hang,
    /// Succeeds after the delay
    Delay(Duration),
}

/// Fake implementing both lookup ports.
///
/// Hosts without an explicit behavior use the default. Tracks how many lookups
/// are running at once so tests can check the concurrency ceiling.
#[derive(Clone)]
pub struct FakeLookup {
    default: Behavior,
    per_host: Arc<HashMap<String, Behavior>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeLookup {
    pub fn new(default: Behavior) -> Self {
        Self {
            default,
            per_host: Arc::new(HashMap::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Behavior::Succeed)
    }

    pub fn failing(error: LookupError) -> Self {
        Self::new(Behavior::Fail(error))
    }

    pub fn with_host(mut self, host: &str, behavior: Behavior) -> Self {
        Arc::make_mut(&mut self.per_host).insert(host.to_string(), behavior);
        self
    }

    /// Highest number of lookups observed running at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn run(&self, domain: &DomainCandidate) -> Result<(), LookupError> {
        self.calls.lock().unwrap().push(domain.to_string());
        let behavior = self
            .per_host
            .get(domain.as_str())
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        match behavior {
            Behavior::Succeed => {
                // Yield so concurrent lookups overlap
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            }
            Behavior::Fail(error) => Err(error),
            Behavior::Hang => std::future::pending().await,
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArchiveLookup for FakeLookup {
    async fn lookup_earliest_capture(
        &self,
        domain: &DomainCandidate,
    ) -> Result<ArchiveRecord, LookupError> {
        self.run(domain).await?;
        Ok(archive_record(domain.as_str()))
    }
}

#[async_trait]
impl TrafficLookup for FakeLookup {
    async fn lookup_traffic(
        &self,
        domain: &DomainCandidate,
        _query: &TrafficQuery,
    ) -> Result<TrafficRecord, LookupError> {
        self.run(domain).await?;
        Ok(traffic_record(domain.as_str(), &[1000.0, 2000.0]))
    }
}

/// Recognizer returning fixed lines (or a fixed error) for any image.
pub struct FakeRecognizer {
    result: Result<Vec<String>, OcrError>,
}

impl FakeRecognizer {
    pub fn lines(lines: &[&str]) -> Self {
        Self {
            result: Ok(lines.iter().map(|line| line.to_string()).collect()),
        }
    }

    pub fn error(error: OcrError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl TextRecognizer for FakeRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError> {
        if image.is_empty() {
            return Err(OcrError::EmptyImage);
        }
        self.result.clone()
    }
}

/// Smallest byte string the format sniffer accepts as a PNG.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
