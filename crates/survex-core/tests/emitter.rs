//! End-to-end tests for the planning and emitting phases.

mod common;

use csv::ReaderBuilder;
use survex_core::pipeline::{ExportRequest, run_data_phase};
use survex_core::source::NullObserver;
use survex_model::{
    ColumnModel, ColumnRef, ExportFormat, MaxQuestionInstance, MetaSelector, NameStyle,
    QuestionId, SurveyId, ValueRendering,
};

use crate::common::{PagedSource, catalog, respond, submission};

fn narrow_model() -> ColumnModel {
    let mut model = ColumnModel::new();
    model.set_visible(ColumnRef::Meta(MetaSelector::SubmissionId));
    model.set_visible(ColumnRef::Question(QuestionId(1)));
    model.set_visible(ColumnRef::Question(QuestionId(2)));
    model
}

fn request<'a>(
    format: ExportFormat,
    model: &'a ColumnModel,
    work_dir: &'a std::path::Path,
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
        page_size: 50,
    }
}

fn read_rows(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .expect("open data file");
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .collect();
    (headers, rows)
}

#[test]
fn merged_row_expanded_delimited_export() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = catalog();
    let model = narrow_model();

    // Submission A answers the repeating question twice, B not at all.
    let mut a = submission("sub-a");
    respond(&mut a, 1, &[("1", 0)]);
    respond(&mut a, 2, &[("first visit", 0), ("second visit", 1)]);
    let mut b = submission("sub-b");
    respond(&mut b, 1, &[("2", 0)]);

    let mut source = PagedSource::single_page(catalog, vec![a, b]);
    let phase = run_data_phase(
        &request(ExportFormat::CsvRowExpanded, &model, temp.path()),
        &mut source,
        &mut PagedSource::single_page(common::catalog(), vec![]),
        &mut NullObserver,
    )
    .expect("export");

    assert_eq!(phase.submissions, 2);
    assert_eq!(phase.plans.len(), 1);
    let plan = &phase.plans[0];
    assert_eq!(plan.file_name, "Responses.csv");

    let (headers, rows) = read_rows(&plan.path);
    assert_eq!(headers, vec!["Submission Id", "consent", "visit_note"]);
    // A's primary row, A's one extra repeat row, B's primary row.
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], vec!["sub-a", "1", "first visit"]);
    // The non-repeating consent answer is duplicated into the repeat row.
    assert_eq!(rows[1], vec!["sub-a", "1", "second visit"]);
    assert_eq!(rows[2], vec!["sub-b", "2", ""]);

    // Width statistics reflect the widest written value.
    let note = plan
        .columns
        .iter()
        .find(|column| column.name == "visit_note")
        .expect("note column");
    assert_eq!(note.width, "second visit".len());
    let consent = plan
        .columns
        .iter()
        .find(|column| column.name == "consent")
        .expect("consent column");
    assert!(consent.all_numeric);
}

#[test]
fn row_expansion_fills_instance_gaps() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = catalog();
    let model = narrow_model();

    let mut a = submission("sub-a");
    respond(&mut a, 1, &[("1", 0)]);
    respond(
        &mut a,
        2,
        &[("v0", 0), ("v1", 1), ("v3", 3)],
    );

    let mut source = PagedSource::single_page(catalog, vec![a]);
    let phase = run_data_phase(
        &request(ExportFormat::CsvRowExpanded, &model, temp.path()),
        &mut source,
        &mut PagedSource::single_page(common::catalog(), vec![]),
        &mut NullObserver,
    )
    .expect("export");

    let (_, rows) = read_rows(&phase.plans[0].path);
    // Primary plus rows for instances 1, 2 (empty) and 3.
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0][2], "v0");
    assert_eq!(rows[1][2], "v1");
    assert_eq!(rows[2][2], "");
    assert_eq!(rows[3][2], "v3");
}

#[test]
fn column_expansion_bounds_and_drops_excess_instances() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = catalog();
    let model = narrow_model();

    let mut a = submission("sub-a");
    respond(&mut a, 1, &[("1", 0)]);
    // Instance 2 exceeds the precomputed bound of 1 and must vanish.
    respond(&mut a, 2, &[("v0", 0), ("v1", 1), ("overflowing", 2)]);

    let mut source = PagedSource::single_page(catalog, vec![a]);
    source.max_instances = vec![MaxQuestionInstance {
        question: QuestionId(2),
        max_instance: 1,
    }];
    let mut instances = PagedSource::single_page(common::catalog(), vec![]);
    instances.max_instances = source.max_instances.clone();

    let phase = run_data_phase(
        &request(ExportFormat::CsvColumnExpanded, &model, temp.path()),
        &mut source,
        &mut instances,
        &mut NullObserver,
    )
    .expect("export");

    let plan = &phase.plans[0];
    let (headers, rows) = read_rows(&plan.path);
    assert_eq!(
        headers,
        vec!["Submission Id", "consent", "visit_note_0", "visit_note_1"]
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], vec!["sub-a", "1", "v0", "v1"]);

    // The dropped instance contributes nothing to the statistics either.
    let widest = plan
        .columns
        .iter()
        .filter(|column| column.name.starts_with("visit_note"))
        .map(|column| column.width)
        .max()
        .unwrap();
    assert_eq!(widest, 2);
}

#[test]
fn per_section_export_writes_section_files_with_repeat_rows() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = catalog();
    let mut model = narrow_model();
    model.set_visible(ColumnRef::Meta(MetaSelector::SectionIndex));

    let mut a = submission("sub-a");
    respond(&mut a, 1, &[("1", 0)]);
    respond(&mut a, 2, &[("first", 0), ("second", 1)]);

    let mut source = PagedSource::single_page(catalog, vec![a]);
    let phase = run_data_phase(
        &request(ExportFormat::CsvPerSection, &model, temp.path()),
        &mut source,
        &mut PagedSource::single_page(common::catalog(), vec![]),
        &mut NullObserver,
    )
    .expect("export");

    let names: Vec<_> = phase
        .plans
        .iter()
        .map(|plan| plan.file_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Submissions.csv", "1 Intake.csv", "2 Visits.csv"]
    );

    let visits = &phase.plans[2];
    let (headers, rows) = read_rows(&visits.path);
    assert_eq!(
        headers,
        vec![
            "Submission Id",
            "Repeats On Question",
            "Repeat Question Value",
            "Repeating Index",
            "visit_note"
        ]
    );
    assert_eq!(rows.len(), 2);
    // Primary row carries repeating index 0, the extra row 1; both name
    // the trigger question.
    assert_eq!(rows[0][1], "visit_note");
    assert_eq!(rows[0][3], "0");
    assert_eq!(rows[0][4], "first");
    assert_eq!(rows[1][3], "1");
    assert_eq!(rows[1][4], "second");
}

#[test]
fn stat_package_quotes_only_string_metadata_and_text() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = catalog();
    let mut model = narrow_model();
    model.set_visible(ColumnRef::Meta(MetaSelector::DurationSeconds));

    let mut a = submission("sub-a");
    respond(&mut a, 1, &[("1", 0)]);
    respond(&mut a, 2, &[("note text", 0)]);

    let mut source = PagedSource::single_page(catalog, vec![a]);
    let phase = run_data_phase(
        &request(ExportFormat::StatRowExpanded, &model, temp.path()),
        &mut source,
        &mut PagedSource::single_page(common::catalog(), vec![]),
        &mut NullObserver,
    )
    .expect("export");

    let plan = &phase.plans[0];
    assert_eq!(plan.file_name, "Responses.dat");
    let contents = std::fs::read_to_string(&plan.path).expect("read dat");
    let data_line = contents.lines().nth(1).expect("data row");
    // Submission id stays quoted even without mandated encapsulation; the
    // numeric duration does not; text answers keep their quotes.
    assert_eq!(data_line, "\"sub-a\",1305,\"1\",\"note text\"");
}
