//! Shared fixtures for the engine integration tests.

use std::collections::BTreeMap;

use survex_core::source::{MaxInstanceSource, SubmissionSource};
use survex_model::{
    ExportError, FieldResponse, MaxQuestionInstance, Question, QuestionId, QuestionOption,
    QuestionType, Response, Result, Section, SectionId, Submission, SubmissionPage, SurveyCatalog,
    SurveyId,
};

/// Survey with one non-repeating single-choice question and one repeating
/// free-text question.
pub fn catalog() -> SurveyCatalog {
    SurveyCatalog {
        survey_id: SurveyId(42),
        questions: vec![
            Question {
                id: QuestionId(1),
                name: "consent".to_string(),
                label: "Consent given".to_string(),
                question_type: QuestionType::Single,
                section: Some(SectionId(1)),
                options: vec![
                    QuestionOption {
                        value: "1".to_string(),
                        text: "Yes".to_string(),
                    },
                    QuestionOption {
                        value: "2".to_string(),
                        text: "No".to_string(),
                    },
                ],
            },
            Question {
                id: QuestionId(2),
                name: "visit_note".to_string(),
                label: "Visit note".to_string(),
                question_type: QuestionType::FreeText,
                section: Some(SectionId(2)),
                options: vec![],
            },
        ],
        sections: vec![
            Section {
                id: SectionId(1),
                title: "Intake".to_string(),
                display_order: 0,
                is_repeating: false,
                repeat_trigger: None,
            },
            Section {
                id: SectionId(2),
                title: "Visits".to_string(),
                display_order: 1,
                is_repeating: true,
                repeat_trigger: Some(QuestionId(2)),
            },
        ],
    }
}

pub fn submission(id: &str) -> Submission {
    Submission {
        id: id.to_string(),
        fieldworker_name: "Amahle N".to_string(),
        fieldworker_id: "fw-1".to_string(),
        device_model: "Nokia 2720".to_string(),
        device_asset: None,
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

pub fn respond(submission: &mut Submission, question: i64, values: &[(&str, u32)]) {
    submission.responses.insert(
        QuestionId(question),
        FieldResponse {
            responses: values
                .iter()
                .map(|(value, instance)| Response {
                    value: (*value).to_string(),
                    instance: *instance,
                })
                .collect(),
        },
    );
}

/// Retrieval stub with explicit page contents and a simulated failure hook.
pub struct PagedSource {
    pub catalog: SurveyCatalog,
    pub pages: Vec<Vec<Submission>>,
    pub total_count: usize,
    pub max_instances: Vec<MaxQuestionInstance>,
    pub fail_on_page: Option<usize>,
}

impl PagedSource {
    pub fn single_page(catalog: SurveyCatalog, submissions: Vec<Submission>) -> Self {
        let total_count = submissions.len();
        Self {
            catalog,
            pages: vec![submissions],
            total_count,
            max_instances: Vec::new(),
            fail_on_page: None,
        }
    }
}

impl SubmissionSource for PagedSource {
    fn fetch_page(&mut self, page: usize, _page_size: usize) -> Result<SubmissionPage> {
        if self.fail_on_page == Some(page) {
            return Err(ExportError::Message(
                "simulated retrieval failure".to_string(),
            ));
        }
        Ok(SubmissionPage {
            submissions: self.pages.get(page).cloned().unwrap_or_default(),
            total_count: self.total_count,
            catalog: self.catalog.clone(),
        })
    }
}

impl MaxInstanceSource for PagedSource {
    fn max_instances(&mut self, _survey: SurveyId) -> Result<Vec<MaxQuestionInstance>> {
        Ok(self.max_instances.clone())
    }
}
