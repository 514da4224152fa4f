//! `/predict` response decoding

use serde::{Deserialize, Serialize};

use super::error::InferenceError;
use super::explanations::recommendation_for;
use crate::data::Diagnosis;

/// Structured inference result returned by the analysis service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisPayload {
    /// Subtype label, e.g. "Papillary Thyroid Carcinoma"
    pub result: String,
    pub diagnosis: Diagnosis,
    pub confidence: String,
    pub recommendation: String,
    /// Server-relative path of the Grad-CAM overlay
    pub heatmap_url: String,
    /// Server-relative path of the uploaded image
    pub original_url: String,
}

/// Wire shape of a `/predict` response; success and error share one object
#[derive(Debug, Default, Deserialize)]
struct PredictResponse {
    result: Option<String>,
    diagnosis: Option<String>,
    confidence: Option<String>,
    recommendation: Option<String>,
    heatmap_url: Option<String>,
    original_url: Option<String>,
    error: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl DiagnosisPayload {
    /// Decode a `/predict` body.
    ///
    /// A non-2xx status or a missing `result` is a failure; the server's
    /// `error` message wins when present.
    pub fn from_response(success: bool, body: &str) -> Result<Self, InferenceError> {
        let response: PredictResponse = match serde_json::from_str(body) {
            Ok(response) => response,
            Err(e) if success => {
                return Err(InferenceError::Validation(format!("response is not JSON: {e}")))
            }
            Err(_) => PredictResponse::default(),
        };

        if let Some(message) = non_empty(response.error) {
            return Err(InferenceError::Service(message));
        }
        if !success {
            return Err(InferenceError::Validation(
                "service rejected the request without an error message".to_string(),
            ));
        }

        let result = non_empty(response.result)
            .ok_or_else(|| InferenceError::Validation("missing `result`".to_string()))?;
        let diagnosis = non_empty(response.diagnosis)
            .map(|d| Diagnosis::parse(&d))
            .ok_or_else(|| InferenceError::Validation("missing `diagnosis`".to_string()))?;
        let heatmap_url = non_empty(response.heatmap_url)
            .ok_or_else(|| InferenceError::Validation("missing `heatmap_url`".to_string()))?;
        let original_url = non_empty(response.original_url)
            .ok_or_else(|| InferenceError::Validation("missing `original_url`".to_string()))?;

        let recommendation = non_empty(response.recommendation)
            .unwrap_or_else(|| recommendation_for(&result).to_string());

        Ok(Self {
            result,
            diagnosis,
            confidence: non_empty(response.confidence).unwrap_or_else(|| "N/A".to_string()),
            recommendation,
            heatmap_url,
            original_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let body = r#"{"result":"Papillary","diagnosis":"Malignant","confidence":"92%","recommendation":"See oncologist","heatmap_url":"/h.png","original_url":"/o.png"}"#;
        let payload = DiagnosisPayload::from_response(true, body).unwrap();
        assert_eq!(payload.result, "Papillary");
        assert_eq!(payload.diagnosis, Diagnosis::Malignant);
        assert_eq!(payload.confidence, "92%");
        assert_eq!(payload.heatmap_url, "/h.png");
    }

    #[test]
    fn test_error_message_is_preserved() {
        let err = DiagnosisPayload::from_response(false, r#"{"error":"model unavailable"}"#)
            .unwrap_err();
        assert_eq!(err, InferenceError::Service("model unavailable".to_string()));
        assert_eq!(err.user_message(), "model unavailable");
    }

    #[test]
    fn test_error_field_wins_even_on_2xx() {
        let err = DiagnosisPayload::from_response(true, r#"{"error":"Grad-CAM failed"}"#)
            .unwrap_err();
        assert_eq!(err.user_message(), "Grad-CAM failed");
    }

    #[test]
    fn test_missing_result_uses_default_message() {
        let err = DiagnosisPayload::from_response(true, r#"{"diagnosis":"Benign"}"#).unwrap_err();
        assert!(matches!(err, InferenceError::Validation(_)));
        assert_eq!(err.user_message(), "Unknown error");
    }

    #[test]
    fn test_non_2xx_without_body() {
        let err = DiagnosisPayload::from_response(false, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.user_message(), "Unknown error");
    }

    #[test]
    fn test_missing_recommendation_falls_back_to_table() {
        let body = r#"{"result":"Benign","diagnosis":"Benign","confidence":"88.10%","heatmap_url":"/h.png","original_url":"/o.png"}"#;
        let payload = DiagnosisPayload::from_response(true, body).unwrap();
        assert_eq!(payload.recommendation, "Follow-up scan / Routine monitoring");
    }
}
