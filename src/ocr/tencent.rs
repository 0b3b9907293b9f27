//! Tencent Cloud OCR adapter (`GeneralBasicOCR`, API version 2018-11-19).
//!
//! Requests are signed with TC3-HMAC-SHA256 over the JSON body.

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{check_image, TextRecognizer};
use crate::config::{DEFAULT_TENCENT_REGION, TENCENT_OCR_HOST};
use crate::error_handling::{InitializationError, OcrError};

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "ocr";
const ACTION: &str = "GeneralBasicOCR";
const VERSION: &str = "2018-11-19";
const ALGORITHM: &str = "TC3-HMAC-SHA256";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

/// Error code returned when the image simply has no text in it.
const NO_TEXT_CODE: &str = "FailedOperation.ImageNoText";
/// Error codes that blame the uploaded image rather than the service.
const INVALID_IMAGE_CODES: &[&str] = &[
    "FailedOperation.ImageDecodeFailed",
    "FailedOperation.ImageSizeTooLarge",
    "FailedOperation.DownLoadError",
    "LimitExceeded.TooLargeFileError",
];

/// API credentials for Tencent Cloud.
#[derive(Clone)]
pub struct TencentCredentials {
    /// `SecretId` of the API key
    pub secret_id: String,
    /// `SecretKey` of the API key
    pub secret_key: String,
    /// Region such as `ap-guangzhou`; blank means the default
    pub region: String,
}

impl std::fmt::Debug for TencentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TencentCredentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OcrEnvelope {
    #[serde(rename = "Response")]
    response: OcrResponse,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(rename = "TextDetections", default)]
    text_detections: Vec<TextDetection>,
    #[serde(rename = "Error")]
    error: Option<ApiErrorBody>,
    #[serde(rename = "RequestId")]
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextDetection {
    #[serde(rename = "DetectedText")]
    detected_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// OCR via Tencent Cloud `GeneralBasicOCR`.
pub struct TencentOcr {
    client: reqwest::Client,
    credentials: TencentCredentials,
    endpoint: String,
    host: String,
}

impl TencentOcr {
    /// Creates a client for the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ProviderSetupError` when the secret id or
    /// key is empty.
    pub fn new(
        client: reqwest::Client,
        mut credentials: TencentCredentials,
    ) -> Result<Self, InitializationError> {
        if credentials.secret_id.trim().is_empty() || credentials.secret_key.trim().is_empty() {
            return Err(InitializationError::ProviderSetupError(
                "Tencent Cloud secret_id and secret_key are required for OCR".into(),
            ));
        }
        if credentials.region.trim().is_empty() {
            credentials.region = DEFAULT_TENCENT_REGION.to_string();
        }
        Ok(Self {
            client,
            credentials,
            endpoint: format!("https://{TENCENT_OCR_HOST}"),
            host: TENCENT_OCR_HOST.to_string(),
        })
    }

    /// Sends requests to `endpoint` instead (e.g. a regional host or a test server).
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ProviderSetupError` when `endpoint` is not
    /// an absolute URL with a host.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, InitializationError> {
        let parsed = url::Url::parse(endpoint).map_err(|e| {
            InitializationError::ProviderSetupError(format!("invalid OCR endpoint '{endpoint}': {e}"))
        })?;
        let host = parsed.host_str().ok_or_else(|| {
            InitializationError::ProviderSetupError(format!("OCR endpoint '{endpoint}' has no host"))
        })?;
        self.host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        Ok(self)
    }

    fn authorization(&self, payload: &str, now: DateTime<Utc>) -> Result<String, OcrError> {
        let canonical_request = format!(
            "POST\n/\n\ncontent-type:{CONTENT_TYPE}\nhost:{}\nx-tc-action:{}\n\n{SIGNED_HEADERS}\n{}",
            self.host,
            ACTION.to_ascii_lowercase(),
            sha256_hex(payload.as_bytes())
        );

        let date = now.format("%Y-%m-%d").to_string();
        let credential_scope = format!("{date}/{SERVICE}/tc3_request");
        let string_to_sign = format!(
            "{ALGORITHM}\n{}\n{credential_scope}\n{}",
            now.timestamp(),
            sha256_hex(canonical_request.as_bytes())
        );

        let secret_date = hmac_sha256(
            format!("TC3{}", self.credentials.secret_key).as_bytes(),
            date.as_bytes(),
        )?;
        let secret_service = hmac_sha256(&secret_date, SERVICE.as_bytes())?;
        let secret_signing = hmac_sha256(&secret_service, b"tc3_request")?;
        let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes())?);

        Ok(format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.credentials.secret_id
        ))
    }
}

#[async_trait]
impl TextRecognizer for TencentOcr {
    async fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError> {
        let format = check_image(image)?;
        log::debug!("Sending {} byte {format} image to Tencent OCR", image.len());

        let payload = serde_json::json!({
            "ImageBase64": base64::engine::general_purpose::STANDARD.encode(image),
        })
        .to_string();
        let now = Utc::now();
        let authorization = self.authorization(&payload, now)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", authorization)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-TC-Action", ACTION)
            .header("X-TC-Version", VERSION)
            .header("X-TC-Timestamp", now.timestamp().to_string())
            .header("X-TC-Region", &self.credentials.region)
            .body(payload)
            .send()
            .await
            .map_err(|e| OcrError::Service(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrError::Service(format!("reading response: {e}")))?;
        if !status.is_success() {
            return Err(OcrError::Service(format!("HTTP {status}")));
        }

        parse_detections(&body)
    }
}

/// Decodes a `GeneralBasicOCR` response into text lines in detection order.
fn parse_detections(body: &str) -> Result<Vec<String>, OcrError> {
    let envelope: OcrEnvelope = serde_json::from_str(body)
        .map_err(|e| OcrError::Service(format!("undecodable OCR response: {e}")))?;
    let response = envelope.response;

    if let Some(error) = response.error {
        let request_id = response.request_id.unwrap_or_default();
        if error.code == NO_TEXT_CODE {
            log::debug!("OCR found no text (request {request_id})");
            return Ok(Vec::new());
        }
        let detail = format!("{}: {} (request {request_id})", error.code, error.message);
        if INVALID_IMAGE_CODES.contains(&error.code.as_str()) {
            return Err(OcrError::InvalidImage(detail));
        }
        return Err(OcrError::Service(detail));
    }

    Ok(response
        .text_detections
        .into_iter()
        .filter_map(|detection| detection.detected_text)
        .collect())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, OcrError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| OcrError::Service(format!("signing key rejected: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials() -> TencentCredentials {
        TencentCredentials {
            secret_id: "AKIDEXAMPLE".into(),
            secret_key: "secret".into(),
            region: String::new(),
        }
    }

    #[test]
    fn test_new_requires_credentials() {
        let missing = TencentCredentials {
            secret_key: String::new(),
            ..credentials()
        };
        assert!(TencentOcr::new(reqwest::Client::new(), missing).is_err());
    }

    #[test]
    fn test_new_defaults_region() {
        let ocr = TencentOcr::new(reqwest::Client::new(), credentials()).unwrap();
        assert_eq!(ocr.credentials.region, DEFAULT_TENCENT_REGION);
        assert_eq!(ocr.host, TENCENT_OCR_HOST);
    }

    #[test]
    fn test_with_endpoint_keeps_port_in_signed_host() {
        let ocr = TencentOcr::new(reqwest::Client::new(), credentials())
            .unwrap()
            .with_endpoint("http://127.0.0.1:9000/")
            .unwrap();
        assert_eq!(ocr.host, "127.0.0.1:9000");
        assert_eq!(ocr.endpoint, "http://127.0.0.1:9000");
        assert!(TencentOcr::new(reqwest::Client::new(), credentials())
            .unwrap()
            .with_endpoint("not a url")
            .is_err());
    }

    #[test]
    fn test_authorization_header_shape() {
        let ocr = TencentOcr::new(reqwest::Client::new(), credentials()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let header = ocr.authorization("{}", now).unwrap();
        assert!(header.starts_with(
            "TC3-HMAC-SHA256 Credential=AKIDEXAMPLE/2024-03-01/ocr/tc3_request, SignedHeaders=content-type;host;x-tc-action, Signature="
        ));
        let signature = header.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        // deterministic for the same payload and time
        assert_eq!(header, ocr.authorization("{}", now).unwrap());
        assert_ne!(header, ocr.authorization("{\"a\":1}", now).unwrap());
    }

    #[test]
    fn test_hmac_sha256_known_vector() {
        // RFC 4231 test case 2
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_parse_detections_in_order() {
        let body = r#"{"Response": {"TextDetections": [
            {"DetectedText": "Visit example.com today!"},
            {"DetectedText": null},
            {"DetectedText": "sub-domain.co"}
        ], "RequestId": "abc"}}"#;
        assert_eq!(
            parse_detections(body).unwrap(),
            vec!["Visit example.com today!", "sub-domain.co"]
        );
    }

    #[test]
    fn test_parse_detections_error_codes() {
        let no_text = r#"{"Response": {"Error": {"Code": "FailedOperation.ImageNoText", "Message": "no text"}, "RequestId": "r1"}}"#;
        assert_eq!(parse_detections(no_text).unwrap(), Vec::<String>::new());

        let bad_image = r#"{"Response": {"Error": {"Code": "FailedOperation.ImageDecodeFailed", "Message": "decode"}}}"#;
        assert!(matches!(
            parse_detections(bad_image),
            Err(OcrError::InvalidImage(_))
        ));

        let auth = r#"{"Response": {"Error": {"Code": "AuthFailure.SignatureFailure", "Message": "bad sig"}}}"#;
        let err = parse_detections(auth).unwrap_err();
        assert!(matches!(err, OcrError::Service(ref m) if m.contains("AuthFailure")));

        assert!(matches!(
            parse_detections("gateway timeout"),
            Err(OcrError::Service(_))
        ));
    }
}
