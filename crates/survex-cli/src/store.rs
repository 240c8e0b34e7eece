//! JSON-backed submission store for the CLI.
//!
//! Stands in for the production retrieval service: a survey definition
//! document plus a submissions document, paged in memory with a stable
//! order. The whole document is the filter; the reported total always
//! reflects it.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};

use survex_core::source::{MaxInstanceSource, SubmissionSource};
use survex_model::{
    MaxQuestionInstance, QuestionId, Submission, SubmissionPage, SurveyCatalog, SurveyId,
};

pub struct JsonStore {
    catalog: SurveyCatalog,
    submissions: Vec<Submission>,
}

impl JsonStore {
    pub fn load(survey_path: &Path, submissions_path: &Path) -> Result<Self> {
        let survey_file = File::open(survey_path)
            .with_context(|| format!("open survey document: {}", survey_path.display()))?;
        let catalog: SurveyCatalog = serde_json::from_reader(BufReader::new(survey_file))
            .with_context(|| format!("parse survey document: {}", survey_path.display()))?;

        let submissions_file = File::open(submissions_path).with_context(|| {
            format!(
                "open submissions document: {}",
                submissions_path.display()
            )
        })?;
        let submissions: Vec<Submission> =
            serde_json::from_reader(BufReader::new(submissions_file)).with_context(|| {
                format!(
                    "parse submissions document: {}",
                    submissions_path.display()
                )
            })?;

        Ok(Self {
            catalog,
            submissions,
        })
    }

    pub fn new(catalog: SurveyCatalog, submissions: Vec<Submission>) -> Self {
        Self {
            catalog,
            submissions,
        }
    }

    pub fn catalog(&self) -> &SurveyCatalog {
        &self.catalog
    }

    pub fn survey_id(&self) -> SurveyId {
        self.catalog.survey_id
    }
}

impl SubmissionSource for JsonStore {
    fn fetch_page(&mut self, page: usize, page_size: usize) -> survex_model::Result<SubmissionPage> {
        let start = page.saturating_mul(page_size).min(self.submissions.len());
        let end = start.saturating_add(page_size).min(self.submissions.len());
        Ok(SubmissionPage {
            submissions: self.submissions[start..end].to_vec(),
            total_count: self.submissions.len(),
            catalog: self.catalog.clone(),
        })
    }
}

impl MaxInstanceSource for JsonStore {
    /// Aggregate the highest observed instance per question, mirroring the
    /// precomputed store-side aggregate.
    fn max_instances(
        &mut self,
        _survey: SurveyId,
    ) -> survex_model::Result<Vec<MaxQuestionInstance>> {
        let mut highest: BTreeMap<QuestionId, u32> = BTreeMap::new();
        for submission in &self.submissions {
            for (question, field) in &submission.responses {
                for response in &field.responses {
                    if response.instance > 0 {
                        let entry = highest.entry(*question).or_insert(0);
                        if response.instance > *entry {
                            *entry = response.instance;
                        }
                    }
                }
            }
        }
        Ok(highest
            .into_iter()
            .map(|(question, max_instance)| MaxQuestionInstance {
                question,
                max_instance,
            })
            .collect())
    }
}
