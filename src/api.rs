//! HTTP client for the analysis service.
//!
//! Every call runs on its own background thread with a blocking `reqwest`
//! client and delivers its result to the UI thread over an `mpsc` channel;
//! the app drains the channel each frame. One request per action is in
//! flight at a time (the triggering control is disabled while busy), so no
//! further coordination is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::data::{Peak, PeakParams, Segment, SegmentParams, SegmentPoint, SessionData};
use crate::data::session::PressureRow;
use crate::error::ApiError;

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub data: SessionData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub pressure: Vec<PressureRow>,
    pub expected_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_budget: Option<usize>,
}

/// One scored parameter set from the suggestion sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestCandidate {
    pub params: PeakParams,
    pub peaks: Vec<Peak>,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct SuggestResponse {
    pub best: SuggestCandidate,
    #[serde(default)]
    pub candidates: Vec<SuggestCandidate>,
}

#[derive(Debug, Serialize)]
pub struct RunRequest {
    pub pressure: Vec<PressureRow>,
    pub params: PeakParams,
}

#[derive(Debug, Deserialize)]
pub struct RunResponse {
    pub peaks: Vec<Peak>,
    #[serde(rename = "paramsUsed")]
    pub params_used: PeakParams,
}

#[derive(Debug, Serialize)]
pub struct DeriveRequest {
    pub data: SessionData,
    pub peaks: Vec<Peak>,
    pub params: SegmentParams,
}

#[derive(Debug, Deserialize)]
pub struct DerivePoints {
    pub onset: Vec<SegmentPoint>,
    pub peak: Vec<SegmentPoint>,
    pub empty: Vec<SegmentPoint>,
}

#[derive(Debug, Deserialize)]
pub struct DeriveResponse {
    pub points: DerivePoints,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub data: SessionData,
    pub peaks: Vec<Peak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept_interval_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ReportResponse {
    pub download_url: String,
    pub filename: String,
}

/// Error body shape the service uses for non-2xx answers.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses delivered to the UI thread
// ─────────────────────────────────────────────────────────────────────────────

/// A completed backend call, drained by the app each frame.
#[derive(Debug)]
pub enum ApiResponse {
    Health(Result<bool, ApiError>),
    Upload(Result<SessionData, ApiError>),
    Suggest(Result<SuggestResponse, ApiError>),
    Run(Result<RunResponse, ApiError>),
    Derive(Result<DeriveResponse, ApiError>),
    Report(Result<ReportResponse, ApiError>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Fire-and-forget client; results arrive on the channel given at creation.
#[derive(Clone)]
pub struct ApiClient {
    base: String,
    http: reqwest::blocking::Client,
    tx: Sender<ApiResponse>,
}

impl ApiClient {
    pub fn new(base: &str, tx: Sender<ApiResponse>) -> Result<Self, ApiError> {
        let base = base.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err(ApiError::Config(
                "no analysis service endpoint configured".into(),
            ));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { base, http, tx })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Probe the service once in the background. The returned flag cancels
    /// delivery of the result (used on teardown); the request itself is
    /// simply left to finish and be discarded.
    pub fn spawn_health_check(&self) -> Arc<AtomicBool> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let client = self.clone();
        std::thread::spawn(move || {
            debug!("health check against {}", client.base);
            let result = client
                .http
                .get(client.url("/health"))
                .send()
                .map_err(ApiError::from)
                .and_then(parse_json::<HealthResponse>)
                .map(|r| r.ok);
            if !flag.load(Ordering::Relaxed) {
                let _ = client.tx.send(ApiResponse::Health(result));
            }
        });
        cancelled
    }

    /// Upload a recording file for parsing into a session dataset.
    pub fn spawn_upload(&self, file_name: String, bytes: Vec<u8>) {
        let client = self.clone();
        std::thread::spawn(move || {
            debug!("uploading {} ({} bytes)", file_name, bytes.len());
            let form = reqwest::blocking::multipart::Form::new().part(
                "file",
                reqwest::blocking::multipart::Part::bytes(bytes).file_name(file_name),
            );
            let result = client
                .http
                .post(client.url("/api/upload"))
                .multipart(form)
                .send()
                .map_err(ApiError::from)
                .and_then(parse_json::<UploadResponse>)
                .map(|r| r.data);
            let _ = client.tx.send(ApiResponse::Upload(result));
        });
    }

    /// Ask the service to sweep detection parameters toward an expected
    /// peak count.
    pub fn spawn_suggest(&self, request: SuggestRequest) {
        let client = self.clone();
        std::thread::spawn(move || {
            let result = client.post_json("/api/peaks/suggest", &request);
            let _ = client.tx.send(ApiResponse::Suggest(result));
        });
    }

    /// Run detection with explicit parameters.
    pub fn spawn_run(&self, request: RunRequest) {
        let client = self.clone();
        std::thread::spawn(move || {
            let result = client.post_json("/api/peaks/run", &request);
            let _ = client.tx.send(ApiResponse::Run(result));
        });
    }

    /// Derive segments from the windowed dataset and confirmed peaks.
    pub fn spawn_derive(&self, request: DeriveRequest) {
        let client = self.clone();
        std::thread::spawn(move || {
            let result = client.post_json("/api/segments/derive", &request);
            let _ = client.tx.send(ApiResponse::Derive(result));
        });
    }

    /// Generate the downloadable report.
    pub fn spawn_report(&self, request: ReportRequest) {
        let client = self.clone();
        std::thread::spawn(move || {
            let result = client.post_json("/api/generate-report", &request);
            let _ = client.tx.send(ApiResponse::Report(result));
        });
    }

    fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, ApiError> {
        debug!("POST {}", path);
        let response = self.http.post(self.url(path)).json(request).send()?;
        parse_json(response)
    }
}

/// Fold a response into the expected body, turning non-2xx answers into a
/// server error carrying the `{ "error": … }` message when present.
fn parse_json<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>()?);
    }
    let message = match response.text() {
        Ok(body) => match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.error,
            Err(_) if !body.is_empty() => body,
            Err(_) => status.to_string(),
        },
        Err(err) => {
            warn!("failed to read error body: {err}");
            status.to_string()
        }
    };
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_request_uses_camel_case_names() {
        let req = SuggestRequest {
            pressure: vec![PressureRow {
                elapsed_time: 0.0,
                pressure: Some(1.0),
            }],
            expected_count: 8,
            search_budget: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["expectedCount"], 8);
        assert!(json.get("searchBudget").is_none());
        assert_eq!(json["pressure"][0]["Elapsed Time"], 0.0);
    }

    #[test]
    fn run_response_parses_params_used() {
        let json = r#"{
            "peaks": [{"time": 10.0, "value": 42.5, "index": 3, "source": "auto"}],
            "paramsUsed": {"height": 30.0, "distance": 50.0}
        }"#;
        let resp: RunResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.peaks.len(), 1);
        assert_eq!(resp.peaks[0].index, Some(3));
        assert_eq!(resp.params_used.height, Some(30.0));
        assert_eq!(resp.params_used.prominence, None);
    }

    #[test]
    fn derive_response_parses_nullable_markers() {
        let json = r#"{
            "points": {
                "onset": [{"time": 1.0, "value": 2.0, "index": 0}],
                "peak": [{"time": 3.0, "value": 9.0, "index": 2}],
                "empty": [{"time": null, "value": null}]
            },
            "segments": [{
                "i": 0,
                "onsetTime": 1.0,
                "peakTime": 3.0,
                "emptyTime": 5.0,
                "metrics": {
                    "imiSec": null,
                    "maxPressure": 9.0,
                    "avgPressureBetweenEmptyAndNextOnset": null,
                    "deltaVolume": 0.1
                }
            }]
        }"#;
        let resp: DeriveResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.points.empty[0].is_set());
        assert_eq!(resp.segments[0].metrics.max_pressure, Some(9.0));
        assert_eq!(resp.segments[0].metrics.imi_sec, None);
    }

    #[test]
    fn report_response_shape() {
        let json = r#"{"download_url": "/reports/r1.xlsx", "filename": "r1.xlsx"}"#;
        let resp: ReportResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.filename, "r1.xlsx");
    }
}
