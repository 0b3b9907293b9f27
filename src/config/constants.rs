//! Configuration constants.
//!
//! This module defines the constants used throughout the application,
//! including timeouts, size limits, retry parameters and provider endpoints.

/// Default path of the JSON configuration document.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

/// Default HTTP listen port.
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// Default directory holding the upload page template and its assets.
pub const DEFAULT_WEB_ROOT: &str = "web";

// Enrichment fan-out
/// Maximum number of provider lookups in flight at once (semaphore limit).
/// Shared by every request served by one orchestrator, so a burst of uploads
/// cannot open more than this many provider connections.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Per-lookup timeout in seconds, measured from the moment a limiter slot is held.
/// Covers the provider request and its retries.
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 20;
/// Per-request HTTP timeout for provider clients in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// Retry strategy
/// Base of the exponential backoff (delay grows by this factor each retry).
pub const RETRY_BACKOFF_BASE: u64 = 2;
/// Multiplier applied to the backoff, giving delays of 500ms, 1s, 2s, ...
pub const RETRY_FACTOR_MS: u64 = 250;
/// Maximum delay between retries in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 4;
/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: usize = 2;

// Upload limits
/// Maximum accepted upload body (32 MiB).
pub const MAX_UPLOAD_BYTES: usize = 32 << 20;
/// Multipart field carrying the screenshot.
pub const IMAGE_FIELD: &str = "image";

// Provider endpoints
/// Internet Archive host serving the CDX API.
pub const WAYBACK_BASE_URL: &str = "https://web.archive.org";
/// SimilarWeb REST API host.
pub const SIMILARWEB_BASE_URL: &str = "https://api.similarweb.com";
/// Tencent Cloud OCR endpoint host.
pub const TENCENT_OCR_HOST: &str = "ocr.tencentcloudapi.com";
/// Default Tencent Cloud region.
pub const DEFAULT_TENCENT_REGION: &str = "ap-guangzhou";

/// User-Agent sent to providers.
pub const DEFAULT_USER_AGENT: &str = concat!("domain_analyzer/", env!("CARGO_PKG_VERSION"));

/// CDX capture timestamp layout (UTC).
pub const CDX_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// HTTP 429, treated as a transient failure and retried.
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
