//! End-to-end tests for the CLI export pipeline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use survex_cli::archive::DirArchive;
use survex_cli::pipeline::{PipelineConfig, run_export_pipeline};
use survex_cli::store::JsonStore;
use survex_core::pipeline::ExportRequest;
use survex_core::source::{MaxInstanceSource, NullObserver, PrecomputedInstances, SubmissionSource};
use survex_model::{
    ColumnModel, ExportFormat, FieldResponse, NameStyle, Question, QuestionId, QuestionOption,
    QuestionType, Response, Section, SectionId, Submission, SurveyCatalog, SurveyId,
    ValueRendering,
};

fn catalog() -> SurveyCatalog {
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

fn submission(id: &str, consent: &str, notes: &[(&str, u32)]) -> Submission {
    let mut responses = BTreeMap::new();
    responses.insert(
        QuestionId(1),
        FieldResponse {
            responses: vec![Response {
                value: consent.to_string(),
                instance: 0,
            }],
        },
    );
    if !notes.is_empty() {
        responses.insert(
            QuestionId(2),
            FieldResponse {
                responses: notes
                    .iter()
                    .map(|(value, instance)| Response {
                        value: (*value).to_string(),
                        instance: *instance,
                    })
                    .collect(),
            },
        );
    }
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
        responses,
    }
}

fn request<'a>(
    format: ExportFormat,
    model: &'a ColumnModel,
    work_dir: &'a Path,
) -> ExportRequest<'a> {
    ExportRequest {
        format,
        naming: NameStyle::Short,
        values: ValueRendering::Codes,
        survey_id: SurveyId(42),
        column_model: model,
        work_dir,
        base_name: "export.zip",
        legacy_merged_name: false,
        page_size: 100,
    }
}

#[test]
fn delimited_export_packages_data_and_structural_files() {
    let temp = tempfile::tempdir().expect("tempdir");
    let work_dir = temp.path().join("work");
    let out_dir = temp.path().join("out");

    let mut store = JsonStore::new(
        catalog(),
        vec![
            submission("sub-a", "1", &[("first", 0), ("second", 1)]),
            submission("sub-b", "2", &[]),
        ],
    );
    let model = ColumnModel::all_visible(store.catalog());
    let mut instances = PrecomputedInstances(Vec::new());
    let mut archive = DirArchive::create(&out_dir).expect("archive");

    let outcome = run_export_pipeline(
        &PipelineConfig {
            request: request(ExportFormat::CsvRowExpanded, &model, &work_dir),
            keep_work_dir: false,
        },
        &mut store,
        &mut instances,
        &mut archive,
        &mut NullObserver,
    )
    .expect("pipeline");

    assert_eq!(outcome.submissions, 2);
    assert_eq!(
        outcome.structural_files,
        vec!["Code Book.csv".to_string(), "Questions.csv".to_string()]
    );

    let data = fs::read_to_string(out_dir.join("Responses.csv")).expect("data file");
    // Header, A's primary row, A's repeat row, B's primary row.
    assert_eq!(data.lines().count(), 4);
    assert!(data.contains("\"sub-a\""));
    assert!(data.contains("second"));

    let codebook = fs::read_to_string(out_dir.join("Code Book.csv")).expect("codebook");
    assert!(codebook.contains("\"consent\",\"consent\",\"1\",\"Yes\""));
    assert!(codebook.contains("\"consent\",\"consent\",\"2\",\"No\""));

    let questions = fs::read_to_string(out_dir.join("Questions.csv")).expect("questions");
    assert!(questions.contains("\"consent\",\"1\",\"Intake\",\"1\",\"Consent given\",\"Single select\""));
    assert!(questions.contains("\"visit_note\",\"2\",\"Visits\",\"2\",\"Visit note\",\"Free text\""));

    // The working copies are gone once the archive holds everything.
    assert!(!work_dir.join("Responses.csv").exists());
    assert!(!work_dir.exists());
}

#[test]
fn stat_export_emits_schema_and_keeps_workflow_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    let work_dir = temp.path().join("work");
    let out_dir = temp.path().join("out");

    let mut store = JsonStore::new(
        catalog(),
        vec![submission("sub-a", "1", &[("first", 0)])],
    );
    let model = ColumnModel::all_visible(store.catalog());
    let mut instances = PrecomputedInstances(Vec::new());
    let mut archive = DirArchive::create(&out_dir).expect("archive");

    run_export_pipeline(
        &PipelineConfig {
            request: request(ExportFormat::StatRowExpanded, &model, &work_dir),
            keep_work_dir: true,
        },
        &mut store,
        &mut instances,
        &mut archive,
        &mut NullObserver,
    )
    .expect("pipeline");

    let schema = fs::read_to_string(out_dir.join("Responses.stsd")).expect("schema");
    assert!(schema.starts_with("ENCODING UTF-8\n"));
    assert!(schema.contains("VALUE LABELS"));
    assert!(out_dir.join("Responses.dat").exists());

    // Workflow exports keep the (emptied) working directory for reuse.
    assert!(work_dir.exists());
    assert!(!work_dir.join("Responses.dat").exists());
}

#[test]
fn json_store_round_trips_documents_and_pages() {
    let temp = tempfile::tempdir().expect("tempdir");
    let survey_path = temp.path().join("survey.json");
    let submissions_path = temp.path().join("submissions.json");

    let submissions = vec![
        submission("sub-a", "1", &[("first", 0), ("second", 1), ("third", 2)]),
        submission("sub-b", "2", &[]),
        submission("sub-c", "1", &[]),
    ];
    fs::write(
        &survey_path,
        serde_json::to_vec_pretty(&catalog()).expect("serialize survey"),
    )
    .expect("write survey");
    fs::write(
        &submissions_path,
        serde_json::to_vec_pretty(&submissions).expect("serialize submissions"),
    )
    .expect("write submissions");

    let mut store = JsonStore::load(&survey_path, &submissions_path).expect("load");
    assert_eq!(store.survey_id(), SurveyId(42));

    let page = store.fetch_page(0, 2).expect("page 0");
    assert_eq!(page.submissions.len(), 2);
    assert_eq!(page.total_count, 3);
    let page = store.fetch_page(1, 2).expect("page 1");
    assert_eq!(page.submissions.len(), 1);
    assert_eq!(page.submissions[0].id, "sub-c");

    let aggregates = store.max_instances(SurveyId(42)).expect("aggregate");
    assert_eq!(aggregates.len(), 1);
    assert_eq!(aggregates[0].question, QuestionId(2));
    assert_eq!(aggregates[0].max_instance, 2);
}
