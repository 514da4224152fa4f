//! Data models for profiles and scan records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;
use crate::inference::DiagnosisPayload;

/// High-level classification of a scan
///
/// The service currently reports `Benign` or `Malignant`; any other label is
/// kept verbatim so newer categories survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Diagnosis {
    Benign,
    Malignant,
    Other(String),
}

impl Diagnosis {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            v if v.eq_ignore_ascii_case("benign") => Diagnosis::Benign,
            v if v.eq_ignore_ascii_case("malignant") => Diagnosis::Malignant,
            other => Diagnosis::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Diagnosis::Benign => "Benign",
            Diagnosis::Malignant => "Malignant",
            Diagnosis::Other(label) => label,
        }
    }

    pub fn is_malignant(&self) -> bool {
        matches!(self, Diagnosis::Malignant)
    }
}

impl From<String> for Diagnosis {
    fn from(value: String) -> Self {
        Diagnosis::parse(&value)
    }
}

impl From<Diagnosis> for String {
    fn from(value: Diagnosis) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted outcome of one diagnosis submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Assigned by the repository
    pub id: Uuid,
    pub user_id: UserId,
    /// None when the stored value is missing or unparsable
    pub timestamp: Option<DateTime<Utc>>,
    pub diagnosis: Diagnosis,
    /// Subtype label, e.g. "Papillary Thyroid Carcinoma"
    pub subtype: String,
    /// Display string, e.g. "92.40%"
    pub confidence: String,
    pub recommendation: String,
    pub heatmap_url: String,
    pub original_url: String,
}

/// A scan record before the repository has assigned an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewScanRecord {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub diagnosis: Diagnosis,
    pub subtype: String,
    pub confidence: String,
    pub recommendation: String,
    pub heatmap_url: String,
    pub original_url: String,
}

impl NewScanRecord {
    /// Copy the persisted subset of an inference result
    pub fn from_payload(user_id: UserId, payload: &DiagnosisPayload, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            timestamp,
            diagnosis: payload.diagnosis.clone(),
            subtype: payload.result.clone(),
            confidence: payload.confidence.clone(),
            recommendation: payload.recommendation.clone(),
            heatmap_url: payload.heatmap_url.clone(),
            original_url: payload.original_url.clone(),
        }
    }

    pub fn into_record(self, id: Uuid) -> ScanRecord {
        ScanRecord {
            id,
            user_id: self.user_id,
            timestamp: Some(self.timestamp),
            diagnosis: self.diagnosis,
            subtype: self.subtype,
            confidence: self.confidence,
            recommendation: self.recommendation,
            heatmap_url: self.heatmap_url,
            original_url: self.original_url,
        }
    }
}

impl ScanRecord {
    /// Rebuild a payload for report export from a stored record
    pub fn to_payload(&self) -> DiagnosisPayload {
        DiagnosisPayload {
            result: self.subtype.clone(),
            diagnosis: self.diagnosis.clone(),
            confidence: self.confidence.clone(),
            recommendation: self.recommendation.clone(),
            heatmap_url: self.heatmap_url.clone(),
            original_url: self.original_url.clone(),
        }
    }
}

/// Per-identity profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub phone: String,
    pub address: String,
    /// Whether submissions use the guided (staged) path
    pub show_process_flow: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// The profile an identity has before its first write
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            phone: String::new(),
            address: String::new(),
            show_process_flow: false,
            updated_at: None,
        }
    }

    /// Merge a partial write; absent fields are preserved
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(phone) = &patch.phone {
            self.phone = phone.clone();
        }
        if let Some(address) = &patch.address {
            self.address = address.clone();
        }
        if let Some(show) = patch.show_process_flow {
            self.show_process_flow = show;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = Some(updated_at);
        }
    }
}

/// Partial profile document for merge-writes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub show_process_flow: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    pub fn contact(phone: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            phone: Some(phone.into()),
            address: Some(address.into()),
            show_process_flow: None,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn process_flow(show: bool) -> Self {
        Self {
            show_process_flow: Some(show),
            ..Self::default()
        }
    }
}
