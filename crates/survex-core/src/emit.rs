//! Streaming submission writer.
//!
//! One buffered append-only stream per planned file, held open for the
//! whole data phase. Rows are written in plan column order; the emitter
//! only mutates each column's running width/numeric statistics.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use tracing::trace;

use survex_model::{
    FieldResponse, FileGrouping, GeoFix, LONG_DATE_FORMAT, MetaField, QuestionId, QuestionType,
    Response, Result, Submission, SurveyCatalog, Topology,
};

use crate::plan::{Column, ColumnKind, ColumnType, FilePlan, GpsPart, QuestionBinding};
use crate::sanitize::{is_all_digits, sanitize};

struct OpenFile {
    plan: FilePlan,
    writer: BufWriter<File>,
    first_column: bool,
}

/// Writes pages of submissions into the planned output files.
pub struct DataEmitter {
    topology: Topology,
    files: Vec<OpenFile>,
}

impl DataEmitter {
    /// Create the data files and write their header rows.
    pub fn open(topology: Topology, plans: Vec<FilePlan>) -> Result<Self> {
        let mut files = Vec::with_capacity(plans.len());
        for plan in plans {
            let mut writer = BufWriter::new(File::create(&plan.path)?);
            let header = plan
                .columns
                .iter()
                .map(|column| format!("\"{}\"", column.header))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(writer, "{header}")?;
            writer.flush()?;
            files.push(OpenFile {
                plan,
                writer,
                first_column: true,
            });
        }
        Ok(Self { topology, files })
    }

    /// Paths of every data file, for failure-path cleanup.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|file| file.plan.path.clone()).collect()
    }

    /// Write one page of submissions to every file, then flush.
    pub fn write_page(&mut self, catalog: &SurveyCatalog, submissions: &[Submission]) -> Result<()> {
        let topology = self.topology;
        for submission in submissions {
            trace!(submission_id = %submission.id, "writing submission");
            for file in &mut self.files {
                write_submission(&topology, catalog, submission, file)?;
            }
        }
        for file in &mut self.files {
            file.writer.flush()?;
        }
        Ok(())
    }

    /// Flush and close every stream, handing back the plans with their
    /// final statistics. Statistics are complete only after this returns.
    pub fn finish(self) -> Result<Vec<FilePlan>> {
        let mut plans = Vec::with_capacity(self.files.len());
        for mut file in self.files {
            file.writer.flush()?;
            plans.push(file.plan);
        }
        Ok(plans)
    }
}

fn write_submission(
    topology: &Topology,
    catalog: &SurveyCatalog,
    submission: &Submission,
    file: &mut OpenFile,
) -> Result<()> {
    let OpenFile {
        plan,
        writer,
        first_column,
    } = file;
    let repeat_trigger = plan.repeat_trigger;
    let row_expanding =
        plan.is_repeating && topology.grouping != FileGrouping::ColumnExpanded;

    // Sparse buffer of repeating answers beyond the primary row, keyed by
    // (instance, column name).
    let mut overflow: BTreeMap<u32, BTreeMap<String, Response>> = BTreeMap::new();

    *first_column = true;
    for column in plan.columns.iter_mut() {
        delimiter(writer, first_column)?;
        let (question, planned_instance) = match &column.kind {
            ColumnKind::Meta(_) => {
                write_meta_value(writer, topology, catalog, submission, column, 0, repeat_trigger)?;
                continue;
            }
            ColumnKind::Question(binding) => (binding.id, binding.instance),
        };
        let Some(field) = submission.field_response(question) else {
            continue;
        };
        if row_expanding {
            write_question_value(writer, topology, column, field, Some(0))?;
            for response in &field.responses {
                if response.instance > 0 && !response.value.is_empty() {
                    overflow
                        .entry(response.instance)
                        .or_default()
                        .insert(column.name.clone(), response.clone());
                }
            }
        } else {
            // Column-expanded files already planned one column per
            // instance; anything beyond the planned count finds no column
            // and is dropped.
            write_question_value(writer, topology, column, field, planned_instance)?;
        }
    }

    if let Some(max_instance) = overflow.keys().next_back().copied() {
        for instance in 1..=max_instance {
            writeln!(writer)?;
            *first_column = true;
            for column in plan.columns.iter_mut() {
                delimiter(writer, first_column)?;
                let (question, section_repeating) = match &column.kind {
                    ColumnKind::Meta(_) => {
                        write_meta_value(
                            writer,
                            topology,
                            catalog,
                            submission,
                            column,
                            instance,
                            repeat_trigger,
                        )?;
                        continue;
                    }
                    ColumnKind::Question(binding) => (binding.id, binding.section_repeating),
                };
                if let Some(response) =
                    overflow.get(&instance).and_then(|row| row.get(&column.name))
                {
                    write_response_value(writer, topology, column, response)?;
                } else if !section_repeating {
                    // Fixed non-repeating question duplicated into a
                    // repeating file: re-emit the submission's value.
                    if let Some(field) = submission.field_response(question) {
                        write_question_value(writer, topology, column, field, None)?;
                    }
                }
            }
        }
    }

    writeln!(writer)?;
    Ok(())
}

fn delimiter<W: Write>(writer: &mut W, first_column: &mut bool) -> io::Result<()> {
    if *first_column {
        *first_column = false;
    } else {
        write!(writer, ",")?;
    }
    Ok(())
}

fn write_meta_value<W: Write>(
    writer: &mut W,
    topology: &Topology,
    catalog: &SurveyCatalog,
    submission: &Submission,
    column: &mut Column,
    instance: u32,
    repeat_trigger: Option<QuestionId>,
) -> io::Result<()> {
    let Some(field) = column.meta() else {
        return Ok(());
    };
    let enclose = topology.encapsulate_all || field.always_string();
    if enclose {
        write!(writer, "\"")?;
    }
    match field {
        MetaField::SubmissionId => write!(writer, "{}", submission.id)?,
        MetaField::FieldworkerName => {
            let value = sanitize(&submission.fieldworker_name);
            write!(writer, "{value}")?;
            column.note_width(value.len());
        }
        MetaField::FieldworkerId => write!(writer, "{}", submission.fieldworker_id)?,
        MetaField::Device => {
            let value = sanitize(&submission.handset_label());
            write!(writer, "{value}")?;
            column.note_width(value.len());
        }
        MetaField::Received => {
            write!(writer, "{}", submission.received.format(LONG_DATE_FORMAT))?;
        }
        MetaField::Start => {
            write!(writer, "{}", submission.started.format(LONG_DATE_FORMAT))?;
        }
        MetaField::End => write!(writer, "{}", submission.ended.format(LONG_DATE_FORMAT))?,
        MetaField::DurationSeconds => write!(writer, "{}", submission.duration_seconds)?,
        MetaField::Latitude => {
            if let Some(location) = submission.location {
                write!(writer, "{}", location.latitude)?;
            }
        }
        MetaField::Longitude => {
            if let Some(location) = submission.location {
                write!(writer, "{}", location.longitude)?;
            }
        }
        MetaField::Language => {
            let value = sanitize(&submission.language);
            write!(writer, "{value}")?;
            column.note_width(value.len());
        }
        MetaField::SurveyVersion => write!(writer, "{}", submission.survey_version)?,
        MetaField::ModifiedBy => {
            let value = sanitize(&submission.modified_by);
            write!(writer, "{value}")?;
            column.note_width(value.len());
        }
        MetaField::ModifiedOn => {
            write!(writer, "{}", submission.modified_on.format(LONG_DATE_FORMAT))?;
        }
        MetaField::RepeatsOnQuestion => {
            if let Some(trigger) = repeat_trigger
                && let Some(question) = catalog.question(trigger)
            {
                let value = sanitize(&question.name);
                write!(writer, "{value}")?;
                column.note_width(value.len());
            }
        }
        MetaField::RepeatQuestionValue => {
            if let Some(trigger) = repeat_trigger
                && let Some(response) = submission
                    .field_response(trigger)
                    .and_then(FieldResponse::first)
            {
                write!(writer, "{}", response.value)?;
            }
        }
        MetaField::RepeatingIndex => write!(writer, "{instance}")?,
        MetaField::Complete => {
            let value = if submission.complete { "Yes" } else { "No" };
            write!(writer, "{value}")?;
            column.note_width(value.len());
        }
    }
    if enclose {
        write!(writer, "\"")?;
    }
    Ok(())
}

fn write_question_value<W: Write>(
    writer: &mut W,
    topology: &Topology,
    column: &mut Column,
    field: &FieldResponse,
    instance: Option<u32>,
) -> io::Result<()> {
    let Some(response) = field.first_for_instance(instance) else {
        return Ok(());
    };
    write_response_value(writer, topology, column, response)
}

fn write_response_value<W: Write>(
    writer: &mut W,
    topology: &Topology,
    column: &mut Column,
    response: &Response,
) -> io::Result<()> {
    // A missing value leaves the cell completely empty, quotes included.
    if response.value.is_empty() {
        return Ok(());
    }
    let rendered = match &column.kind {
        ColumnKind::Meta(_) => return Ok(()),
        ColumnKind::Question(binding) => {
            render_question_value(topology, binding, column.column_type, response)
        }
    };
    let enclose = topology.encapsulate_all || column.column_type == ColumnType::Text;
    if enclose {
        write!(writer, "\"")?;
    }
    write!(writer, "{}", rendered.value)?;
    if enclose {
        write!(writer, "\"")?;
    }
    if rendered.measure {
        column.note_width(rendered.value.len());
    }
    if rendered.check_numeric && !is_all_digits(&rendered.value) {
        column.all_numeric = false;
    }
    Ok(())
}

struct RenderedValue {
    value: String,
    /// Counts toward the column's observed width.
    measure: bool,
    /// Participates in the all-numeric check.
    check_numeric: bool,
}

impl RenderedValue {
    fn plain(value: String) -> Self {
        Self {
            value,
            measure: false,
            check_numeric: false,
        }
    }

    fn measured(value: String) -> Self {
        Self {
            value,
            measure: true,
            check_numeric: false,
        }
    }
}

fn render_question_value(
    topology: &Topology,
    binding: &QuestionBinding,
    column_type: ColumnType,
    response: &Response,
) -> RenderedValue {
    match binding.question_type {
        QuestionType::Multiple => {
            let selected = response
                .value
                .split("||")
                .map(str::trim)
                .any(|value| Some(value) == binding.option_value.as_deref());
            RenderedValue::plain(if selected { "1" } else { "0" }.to_string())
        }
        QuestionType::Single => {
            let decoded = if topology.decode_single_labels() {
                binding
                    .options
                    .iter()
                    .find(|option| option.value == response.value)
                    .map(|option| option.text.as_str())
                    .unwrap_or(response.value.as_str())
            } else {
                response.value.as_str()
            };
            RenderedValue {
                value: sanitize(decoded),
                measure: true,
                check_numeric: true,
            }
        }
        QuestionType::Gps => {
            let Some(fix) = GeoFix::parse(&response.value) else {
                return RenderedValue::plain(String::new());
            };
            match binding.gps {
                Some(GpsPart::Summary) | None => RenderedValue::measured(fix.summary()),
                Some(GpsPart::Latitude) => RenderedValue::plain(fix.latitude.to_string()),
                Some(GpsPart::Longitude) => RenderedValue::plain(fix.longitude.to_string()),
                Some(GpsPart::Altitude) => RenderedValue::plain(fix.altitude.to_string()),
                Some(GpsPart::Timestamp) => RenderedValue::plain(
                    fix.timestamp
                        .map(|timestamp| timestamp.format(LONG_DATE_FORMAT).to_string())
                        .unwrap_or_default(),
                ),
            }
        }
        _ => match column_type {
            ColumnType::Numeric
            | ColumnType::LongDate
            | ColumnType::ShortDate
            | ColumnType::Time => RenderedValue::plain(response.value.clone()),
            ColumnType::Text => RenderedValue::measured(sanitize(&response.value)),
        },
    }
}
