//! Submission data as delivered by the paged retrieval service.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::survey::{QuestionId, SurveyCatalog};

/// Rendering pattern for long date/time metadata values.
pub const LONG_DATE_FORMAT: &str = "%-d-%-m-%Y %H:%M:%S";

/// One stored answer value. Repeating sections record one response per
/// repeat pass, distinguished by `instance` (0 = first pass).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub value: String,
    #[serde(default)]
    pub instance: u32,
}

/// Every response a submission holds for one question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResponse {
    pub responses: Vec<Response>,
}

impl FieldResponse {
    /// First response matching the requested instance, or simply the first
    /// response when no instance is required.
    pub fn first_for_instance(&self, instance: Option<u32>) -> Option<&Response> {
        self.responses
            .iter()
            .find(|response| instance.is_none_or(|wanted| response.instance == wanted))
    }

    pub fn first(&self) -> Option<&Response> {
        self.responses.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// 36-character submission identifier.
    pub id: String,
    pub fieldworker_name: String,
    pub fieldworker_id: String,
    pub device_model: String,
    #[serde(default)]
    pub device_asset: Option<String>,
    pub received: NaiveDateTime,
    pub started: NaiveDateTime,
    pub ended: NaiveDateTime,
    pub duration_seconds: i64,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub language: String,
    pub survey_version: i64,
    pub modified_by: String,
    pub modified_on: NaiveDateTime,
    pub complete: bool,
    #[serde(default)]
    pub responses: BTreeMap<QuestionId, FieldResponse>,
}

impl Submission {
    /// Handset description combining the device model with its asset code.
    pub fn handset_label(&self) -> String {
        match self.device_asset.as_deref() {
            Some(asset) if !asset.is_empty() => {
                format!("{} ({})", self.device_model, asset)
            }
            _ => self.device_model.clone(),
        }
    }

    pub fn field_response(&self, question: QuestionId) -> Option<&FieldResponse> {
        self.responses.get(&question)
    }
}

/// One page of retrieval results. `total_count` reflects the whole filter,
/// not the page, and the catalog rides along with every page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPage {
    pub submissions: Vec<Submission>,
    pub total_count: usize,
    pub catalog: SurveyCatalog,
}

/// Precomputed highest repeat instance observed for a question, used to
/// bound column expansion at plan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxQuestionInstance {
    pub question: QuestionId,
    pub max_instance: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: &str, instance: u32) -> Response {
        Response {
            value: value.to_string(),
            instance,
        }
    }

    #[test]
    fn first_for_instance_filters() {
        let field = FieldResponse {
            responses: vec![response("a", 0), response("b", 2)],
        };
        assert_eq!(field.first_for_instance(None).unwrap().value, "a");
        assert_eq!(field.first_for_instance(Some(2)).unwrap().value, "b");
        assert!(field.first_for_instance(Some(1)).is_none());
    }

    #[test]
    fn handset_label_includes_asset_code() {
        let mut submission = test_submission();
        assert_eq!(submission.handset_label(), "Nokia 2720 (FW-031)");
        submission.device_asset = None;
        assert_eq!(submission.handset_label(), "Nokia 2720");
    }

    pub(crate) fn test_submission() -> Submission {
        Submission {
            id: "3e9f0f6a-8c1d-4a22-9b4e-5f70b7a21c44".to_string(),
            fieldworker_name: "Amahle N".to_string(),
            fieldworker_id: "7d1d2c9e-2f4b-4a57-8a83-c2a9f8f21d10".to_string(),
            device_model: "Nokia 2720".to_string(),
            device_asset: Some("FW-031".to_string()),
            received: "2024-03-07T09:15:02".parse().unwrap(),
            started: "2024-03-07T08:41:10".parse().unwrap(),
            ended: "2024-03-07T09:02:55".parse().unwrap(),
            duration_seconds: 1305,
            location: None,
            language: "en".to_string(),
            survey_version: 4,
            modified_by: "sync".to_string(),
            modified_on: "2024-03-07T09:15:02".parse().unwrap(),
            complete: true,
            responses: BTreeMap::new(),
        }
    }
}
