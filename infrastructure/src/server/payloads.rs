//! HTTP request and response bodies
//!
//! Every `/prompt` caller receives a JSON [`PromptResponse`] — success
//! or failure — so a phone on a flaky mesh link can always distinguish
//! "never started" from "started, outcome unknown".

use axum::http::StatusCode;
use council_application::{CouncilReply, SubmitCouncilError, SubmitCouncilInput};
use council_domain::{
    ChairmanSynthesis, CouncilMetadata, PeerRanking, ProviderResponse, RequestId,
};
use serde::{Deserialize, Serialize};

/// POST /prompt request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequestBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub chairman: Option<ChairmanSelector>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl PromptRequestBody {
    pub fn into_input(self) -> SubmitCouncilInput {
        SubmitCouncilInput {
            query: self.query,
            tier: self.tier,
            chairmen: self.chairman.map(ChairmanSelector::into_names),
            timeout_ms: self.timeout_ms,
        }
    }
}

/// `chairman` accepts a single name or a list of names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChairmanSelector {
    One(String),
    Many(Vec<String>),
}

impl ChairmanSelector {
    fn into_names(self) -> Vec<String> {
        match self {
            ChairmanSelector::One(name) => vec![name],
            ChairmanSelector::Many(names) => names,
        }
    }
}

/// Machine-readable error codes for `/prompt` failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    NoExtension,
    Timeout,
    CouncilError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidRequest => write!(f, "INVALID_REQUEST"),
            ErrorCode::NoExtension => write!(f, "NO_EXTENSION"),
            ErrorCode::Timeout => write!(f, "TIMEOUT"),
            ErrorCode::CouncilError => write!(f, "COUNCIL_ERROR"),
        }
    }
}

/// Response body for the /prompt endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage1: Option<Vec<ProviderResponse>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage2: Option<Vec<PeerRanking>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage3: Option<Vec<ChairmanSynthesis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CouncilMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl PromptResponse {
    /// Success body carrying the staged payload through verbatim.
    pub fn from_reply(reply: CouncilReply) -> Self {
        Self {
            success: true,
            request_id: Some(reply.request_id),
            stage1: Some(reply.outcome.stage1),
            stage2: Some(reply.outcome.stage2),
            stage3: Some(reply.outcome.stage3),
            metadata: reply.outcome.metadata,
            error: None,
            error_code: None,
            duration_ms: Some(reply.duration_ms),
        }
    }

    /// Failure body plus the HTTP status it travels with.
    pub fn failure(error: &SubmitCouncilError) -> (StatusCode, Self) {
        let (status, code) = match error {
            SubmitCouncilError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest)
            }
            SubmitCouncilError::NoExtension => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::NoExtension)
            }
            SubmitCouncilError::Timeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, ErrorCode::Timeout)
            }
            // A mid-flight disconnect means there is no extension now;
            // the closed error-code set maps it to NO_EXTENSION.
            SubmitCouncilError::Disconnected { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::NoExtension)
            }
            SubmitCouncilError::Council { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::CouncilError)
            }
        };

        let body = Self {
            success: false,
            request_id: error.request_id().cloned(),
            stage1: None,
            stage2: None,
            stage3: None,
            metadata: None,
            error: Some(error.to_string()),
            error_code: Some(code.to_string()),
            duration_ms: None,
        };
        (status, body)
    }
}

/// GET /health response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub extension_connected: bool,
    pub uptime_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::CouncilOutcome;

    #[test]
    fn chairman_accepts_string_or_array() {
        let single: PromptRequestBody =
            serde_json::from_str(r#"{"query":"q","chairman":"claude"}"#).unwrap();
        assert_eq!(
            single.into_input().chairmen,
            Some(vec!["claude".to_string()])
        );

        let many: PromptRequestBody =
            serde_json::from_str(r#"{"query":"q","chairman":["claude","gemini"]}"#).unwrap();
        assert_eq!(
            many.into_input().chairmen,
            Some(vec!["claude".to_string(), "gemini".to_string()])
        );

        let absent: PromptRequestBody = serde_json::from_str(r#"{"query":"q"}"#).unwrap();
        assert_eq!(absent.into_input().chairmen, None);
    }

    #[test]
    fn timeout_field_is_camel_case() {
        let body: PromptRequestBody =
            serde_json::from_str(r#"{"query":"q","timeoutMs":50}"#).unwrap();
        assert_eq!(body.timeout_ms, Some(50));
    }

    #[test]
    fn success_body_shape() {
        let reply = CouncilReply {
            request_id: RequestId::new("req-1"),
            outcome: CouncilOutcome::default(),
            duration_ms: 1234,
        };
        let json = serde_json::to_value(PromptResponse::from_reply(reply)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["requestId"], "req-1");
        assert_eq!(json["durationMs"], 1234);
        assert!(json.get("error").is_none());
        assert!(json.get("errorCode").is_none());
    }

    #[test]
    fn failure_status_mapping() {
        let cases = [
            (
                SubmitCouncilError::InvalidRequest("bad".into()),
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
            ),
            (
                SubmitCouncilError::NoExtension,
                StatusCode::SERVICE_UNAVAILABLE,
                "NO_EXTENSION",
            ),
            (
                SubmitCouncilError::Timeout {
                    request_id: RequestId::new("r"),
                    timeout_ms: 50,
                },
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
            ),
            (
                SubmitCouncilError::Disconnected {
                    request_id: RequestId::new("r"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
                "NO_EXTENSION",
            ),
            (
                SubmitCouncilError::Council {
                    request_id: RequestId::new("r"),
                    message: "failed".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "COUNCIL_ERROR",
            ),
        ];

        for (error, expected_status, expected_code) in cases {
            let (status, body) = PromptResponse::failure(&error);
            assert_eq!(status, expected_status);
            assert!(!body.success);
            assert_eq!(body.error_code.as_deref(), Some(expected_code));
            assert!(body.error.is_some());
        }
    }
}
