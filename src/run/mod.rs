//! Wiring of configuration into a running pipeline.
//!
//! Provider clients are built once here and injected into the orchestrator;
//! nothing below this module reads the configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::app::{cancel_on_ctrl_c, print_lookup_statistics};
use crate::config::{AnalyzeArgs, AppConfig, DEFAULT_USER_AGENT};
use crate::enrichment::Enricher;
use crate::error_handling::InitializationError;
use crate::initialization::{init_client, init_rate_limiter};
use crate::lookup::{SimilarWebClient, WaybackClient};
use crate::models::{DomainAnalysis, QueryOverrides};
use crate::ocr::TencentOcr;
use crate::pipeline::Pipeline;
use crate::server::{self, AppState};

/// Builds the provider clients, the orchestrator and the pipeline.
///
/// OCR is only attached when Tencent Cloud credentials are configured.
/// Must be called from within a Tokio runtime (rate limiters spawn a task).
///
/// # Errors
///
/// Returns `InitializationError` when an HTTP client cannot be built or the
/// OCR endpoint override is invalid.
pub fn build_pipeline(config: &AppConfig) -> Result<Pipeline, InitializationError> {
    let timeout = config.request_timeout();
    let rps = config.enrichment.rate_limit_rps;
    let burst = std::cmp::min(
        config.enrichment.max_concurrency,
        rps.saturating_mul(2) as usize,
    );

    let archive_client = init_client(
        timeout,
        DEFAULT_USER_AGENT,
        config.web_archive.proxy_url.as_deref(),
    )?;
    let mut archive = WaybackClient::new(archive_client)
        .with_max_retries(config.enrichment.max_retries)
        .with_rate_limiter(init_rate_limiter(rps, burst));
    if let Some(base_url) = &config.web_archive.base_url {
        archive = archive.with_base_url(base_url.as_str());
    }

    let traffic_client = init_client(timeout, DEFAULT_USER_AGENT, None)?;
    if config.similarweb.api_key.trim().is_empty() {
        log::warn!("No SimilarWeb API key configured; traffic lookups will fail");
    }
    let mut traffic = SimilarWebClient::new(traffic_client, config.similarweb.api_key.clone())
        .with_max_retries(config.enrichment.max_retries)
        .with_rate_limiter(init_rate_limiter(rps, burst));
    if let Some(base_url) = &config.similarweb.base_url {
        traffic = traffic.with_base_url(base_url.as_str());
    }

    let enricher = Enricher::new(
        Arc::new(archive),
        Arc::new(traffic),
        config.enrichment_options(),
    )
    .with_thresholds(config.analysis);
    let mut pipeline = Pipeline::new(Arc::new(enricher));

    match config.tencent_credentials() {
        Some(credentials) => {
            let ocr_client = init_client(timeout, DEFAULT_USER_AGENT, None)?;
            let mut ocr = TencentOcr::new(ocr_client, credentials)?;
            if let Some(endpoint) = &config.tencent_cloud.endpoint {
                ocr = ocr.with_endpoint(endpoint)?;
            }
            pipeline = pipeline.with_recognizer(Arc::new(ocr));
        }
        None => log::warn!("No Tencent Cloud credentials configured; image uploads are disabled"),
    }

    Ok(pipeline)
}

/// Runs the HTTP server until Ctrl-C.
pub async fn run_server(config: AppConfig, port: Option<u16>, web_root: PathBuf) -> Result<()> {
    let pipeline = build_pipeline(&config).context("Failed to initialize providers")?;
    let port = port.unwrap_or(config.server.port);

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    let state = AppState::new(Arc::new(pipeline), config.traffic_query.clone(), web_root)
        .with_shutdown(shutdown);
    let listener = server::bind(port).await?;
    server::serve(listener, state).await
}

/// Analyzes one input (text lines or an image) and returns the analyses.
///
/// Ctrl-C cancels the run.
pub async fn run_analyze(config: AppConfig, args: AnalyzeArgs) -> Result<Vec<DomainAnalysis>> {
    let query = config
        .traffic_query
        .with_overrides(QueryOverrides::from(args.query))
        .context("Invalid traffic query")?;
    let pipeline = build_pipeline(&config).context("Failed to initialize providers")?;

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let input = args.input.as_deref();
    let result = if args.image {
        let image = read_bytes(input).await?;
        pipeline.analyze_image(&image, &query, &cancel).await
    } else {
        let lines = read_lines(input).await?;
        pipeline.analyze(&lines, &query, &cancel).await
    };

    ctrl_c.abort();
    print_lookup_statistics(pipeline.enricher().stats());
    Ok(result?)
}

fn is_stdin(input: Option<&Path>) -> bool {
    input.map_or(true, |path| path.as_os_str() == "-")
}

async fn read_lines(input: Option<&Path>) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    match input.filter(|_| !is_stdin(input)) {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            let mut reader = BufReader::new(file).lines();
            while let Some(line) = reader.next_line().await? {
                lines.push(line);
            }
        }
        None => {
            log::info!("Reading text lines from stdin");
            let mut reader = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = reader.next_line().await? {
                lines.push(line);
            }
        }
    }
    Ok(lines)
}

async fn read_bytes(input: Option<&Path>) -> Result<Vec<u8>> {
    match input.filter(|_| !is_stdin(input)) {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display())),
        None => {
            log::info!("Reading image from stdin");
            let mut bytes = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut bytes)
                .await
                .context("Failed to read image from stdin")?;
            Ok(bytes)
        }
    }
}
