use std::path::PathBuf;

use survex_model::{ExportFormat, SurveyId};

#[derive(Debug)]
pub struct ExportRunResult {
    pub survey_id: SurveyId,
    pub format: ExportFormat,
    pub output_dir: PathBuf,
    pub submissions: usize,
    pub pages: usize,
    pub data_files: Vec<DataFileSummary>,
    pub structural_files: Vec<String>,
}

#[derive(Debug)]
pub struct DataFileSummary {
    pub file_name: String,
    pub columns: usize,
}
