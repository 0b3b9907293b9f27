//! Screenshot upload handler.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, State},
    Json,
};

use super::super::error::ApiError;
use super::super::types::{failure_summary, ApiResponse, AppState};
use crate::config::IMAGE_FIELD;
use crate::error_handling::QueryError;
use crate::models::{DomainAnalysis, Granularity, QueryOverrides};

/// Text fields that may override the default traffic query.
const QUERY_FIELDS: &[&str] = &[
    "granularity",
    "start_date",
    "end_date",
    "country",
    "main_domain_only",
    "mtd",
    "show_verified",
];

/// `POST /upload`: multipart form with an `image` file and optional query fields.
///
/// Responds with the analyses of every domain found in the image, in the
/// order the OCR text mentioned them.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<DomainAnalysis>>>, ApiError> {
    let mut image = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            image = Some(field.bytes().await?);
        } else if QUERY_FIELDS.contains(&name.as_str()) {
            fields.insert(name, field.text().await?);
        } else {
            log::debug!("Ignoring unknown upload field '{name}'");
        }
    }

    let image = image.ok_or_else(|| {
        ApiError::BadRequest(format!("missing '{IMAGE_FIELD}' file in upload"))
    })?;
    let query = state
        .default_query
        .with_overrides(overrides_from_form(&fields)?)?;
    log::info!("Received {} byte upload", image.len());

    let cancel = state.shutdown.child_token();
    let analyses = state
        .pipeline
        .analyze_image(&image, &query, &cancel)
        .await?;

    let msg = failure_summary(&analyses);
    Ok(Json(ApiResponse::success(analyses, msg)))
}

/// Parses the optional query fields. Blank values count as absent.
fn overrides_from_form(fields: &HashMap<String, String>) -> Result<QueryOverrides, QueryError> {
    let get = |name: &str| {
        fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    };

    let granularity = get("granularity")
        .map(|value| {
            value
                .parse::<Granularity>()
                .map_err(|_| QueryError::InvalidGranularity(value.to_string()))
        })
        .transpose()?;

    Ok(QueryOverrides {
        granularity,
        start_date: get("start_date").map(str::parse).transpose()?,
        end_date: get("end_date").map(str::parse).transpose()?,
        country: get("country").map(str::parse).transpose()?,
        main_domain_only: get("main_domain_only").map(parse_flag),
        month_to_date: get("mtd").map(parse_flag),
        show_verified: get("show_verified").map(parse_flag),
    })
}

/// HTML checkboxes send `on`; API clients tend to send `true` or `1`.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}
