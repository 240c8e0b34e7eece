//! Schema planning: derive the set of output files and their column
//! layouts from survey structure and the resolved topology.
//!
//! Plans are produced once per export. Column order within a file is fixed
//! here and never changes during writing; the emitter only mutates the
//! per-column running statistics.

use std::path::{Path, PathBuf};

use tracing::debug;

use survex_model::{
    ColumnModel, ColumnRef, ComputedKind, ExportError, FileGrouping, MaxQuestionInstance,
    MetaField, MetaSelector, NameStyle, Question, QuestionId, QuestionOption, QuestionType,
    Result, Section, SectionId, SurveyCatalog, Topology,
};

use crate::sanitize::{column_name, sanitize};

/// Semantic type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Numeric,
    LongDate,
    ShortDate,
    Time,
}

/// Which piece of a GPS capture a column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsPart {
    Summary,
    Latitude,
    Longitude,
    Altitude,
    Timestamp,
}

impl GpsPart {
    fn name_suffix(&self) -> &'static str {
        match self {
            GpsPart::Summary => "",
            GpsPart::Latitude => "Latitude",
            GpsPart::Longitude => "Longitude",
            GpsPart::Altitude => "Altitude",
            GpsPart::Timestamp => "Time",
        }
    }

    fn header_suffix(&self) -> &'static str {
        match self {
            GpsPart::Summary => "",
            GpsPart::Latitude => " Latitude",
            GpsPart::Longitude => " Longitude",
            GpsPart::Altitude => " Altitude",
            GpsPart::Timestamp => " Time",
        }
    }
}

/// Everything the emitter and the structural generator need to know about
/// a question-bound column, denormalized from the catalog at plan time.
#[derive(Debug, Clone)]
pub struct QuestionBinding {
    pub id: QuestionId,
    pub question_type: QuestionType,
    /// Question label as carried by the catalog (schema declarations).
    pub label: String,
    /// Instance index for column-expanded repeats.
    pub instance: Option<u32>,
    /// Option code for a multi-choice membership column.
    pub option_value: Option<String>,
    /// Option text for a multi-choice membership column.
    pub option_text: Option<String>,
    /// Codebook "Question" label for multi-choice columns.
    pub codebook_question: Option<String>,
    pub gps: Option<GpsPart>,
    /// Owning section repeats; governs value duplication in row-expanded
    /// extra rows.
    pub section_repeating: bool,
    /// Full option list for single-choice columns (decoding, codebook and
    /// value-label candidates).
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone)]
pub enum ColumnKind {
    Meta(MetaField),
    Question(QuestionBinding),
}

/// A single output field with its mutable running statistics.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub header: String,
    pub column_type: ColumnType,
    pub kind: ColumnKind,
    /// Widest value written so far. Only ever grows.
    pub width: usize,
    /// Single-choice columns start true and flip false on the first
    /// non-digit value; never flips back.
    pub all_numeric: bool,
}

impl Column {
    pub fn meta(&self) -> Option<MetaField> {
        match &self.kind {
            ColumnKind::Meta(field) => Some(*field),
            ColumnKind::Question(_) => None,
        }
    }

    pub fn question(&self) -> Option<&QuestionBinding> {
        match &self.kind {
            ColumnKind::Meta(_) => None,
            ColumnKind::Question(binding) => Some(binding),
        }
    }

    pub fn note_width(&mut self, len: usize) {
        if len > self.width {
            self.width = len;
        }
    }
}

/// One planned output file.
#[derive(Debug, Clone)]
pub struct FilePlan {
    /// Logical name; also the value-label scope for non-section files.
    pub name: String,
    /// On-disk file name, extension included.
    pub file_name: String,
    pub path: PathBuf,
    pub columns: Vec<Column>,
    pub section: Option<SectionId>,
    /// Repeating answers in this file become extra rows.
    pub is_repeating: bool,
    /// Repeat trigger question for section files of repeating sections.
    pub repeat_trigger: Option<QuestionId>,
}

impl FilePlan {
    fn new(name: impl Into<String>, file_name: impl Into<String>, work_dir: &Path) -> Self {
        let file_name = file_name.into();
        let path = work_dir.join(&file_name);
        Self {
            name: name.into(),
            file_name,
            path,
            columns: Vec::new(),
            section: None,
            is_repeating: false,
            repeat_trigger: None,
        }
    }
}

/// Inputs to the planning pass.
pub struct PlanRequest<'a> {
    pub topology: &'a Topology,
    pub catalog: &'a SurveyCatalog,
    pub column_model: &'a ColumnModel,
    pub max_instances: &'a [MaxQuestionInstance],
    pub work_dir: &'a Path,
    /// Caller's export file name; used for legacy merged-file naming.
    pub base_name: &'a str,
    /// Name the merged file after `base_name` instead of "Responses".
    pub legacy_merged_name: bool,
}

/// Plan the ordered list of output files and columns.
pub fn plan_files(request: &PlanRequest<'_>) -> Result<Vec<FilePlan>> {
    let planner = Planner { request };
    let plans = planner.plan()?;
    debug!(
        files = plans.len(),
        columns = plans.iter().map(|plan| plan.columns.len()).sum::<usize>(),
        "export plan ready"
    );
    Ok(plans)
}

struct Planner<'a> {
    request: &'a PlanRequest<'a>,
}

impl Planner<'_> {
    fn topology(&self) -> &Topology {
        self.request.topology
    }

    fn plan(&self) -> Result<Vec<FilePlan>> {
        let mut files = Vec::new();
        if self.topology().grouping == FileGrouping::PerSection {
            files.push(self.plan_submissions_file()?);
        } else {
            files.push(self.plan_merged_file());
        }
        if self.topology().uses_section_files() {
            files.extend(self.plan_section_files()?);
        }
        Ok(files)
    }

    /// Metadata-only "Submissions" file used when every section gets its
    /// own file, plus any pinned question columns.
    fn plan_submissions_file(&self) -> Result<FilePlan> {
        let extension = self.topology().output_kind.data_extension();
        let mut file = FilePlan::new(
            "Submissions",
            format!("Submissions.{extension}"),
            self.request.work_dir,
        );
        for selector in MetaSelector::STANDARD {
            file.columns.extend(self.meta_columns(selector));
        }
        for pinned in self.request.column_model.fixed() {
            if let ColumnRef::Question(id) = pinned {
                let question = self.lookup_question(*id)?;
                file.columns.extend(self.question_columns(question, None));
            }
        }
        Ok(file)
    }

    /// Merged responses file carrying metadata plus question columns in
    /// section order.
    fn plan_merged_file(&self) -> FilePlan {
        let extension = self.topology().output_kind.data_extension();
        let file_name = if self.topology().grouping == FileGrouping::SplitRepeating {
            format!("Non-Repeating Responses.{extension}")
        } else if self.request.legacy_merged_name {
            let stem = Path::new(self.request.base_name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("Responses");
            format!("{stem}.{extension}")
        } else {
            format!("Responses.{extension}")
        };
        let mut file = FilePlan::new("Responses", file_name, self.request.work_dir);
        for selector in MetaSelector::STANDARD {
            file.columns.extend(self.meta_columns(selector));
        }

        for question in self.visible_questions() {
            let repeating = self.request.catalog.in_repeating_section(question);
            if !repeating {
                file.columns.extend(self.question_columns(question, None));
                continue;
            }
            match self.topology().grouping {
                // Repeating sections get dedicated files instead.
                FileGrouping::SplitRepeating => {}
                FileGrouping::RowExpanded => {
                    file.columns.extend(self.question_columns(question, None));
                    file.is_repeating = true;
                }
                FileGrouping::ColumnExpanded => {
                    let max_instance = self.max_instance_for(question.id);
                    for instance in 0..=max_instance {
                        file.columns
                            .extend(self.question_columns(question, Some(instance)));
                    }
                }
                FileGrouping::PerSection => {}
            }
        }
        file
    }

    /// Dedicated section files: every section under per-section grouping,
    /// repeating sections only under split-repeating grouping.
    fn plan_section_files(&self) -> Result<Vec<FilePlan>> {
        let split_repeating = self.topology().grouping == FileGrouping::SplitRepeating;
        let mut files = Vec::new();
        let mut current: Option<SectionId> = None;
        let mut open: Option<FilePlan> = None;

        for question in self.visible_questions() {
            let Some(section_id) = question.section else {
                continue;
            };
            let Some(section) = self.request.catalog.section(section_id) else {
                continue;
            };

            if current != Some(section_id) {
                if let Some(finished) = open.take() {
                    files.push(finished);
                }
                current = Some(section_id);
                if split_repeating && !section.is_repeating {
                    // Only repeating sections get their own file here.
                    continue;
                }
                open = Some(self.new_section_file(section)?);
            }

            if split_repeating && !section.is_repeating {
                continue;
            }
            if let Some(file) = open.as_mut() {
                file.columns.extend(self.question_columns(question, None));
            }
        }
        if let Some(finished) = open.take() {
            files.push(finished);
        }
        Ok(files)
    }

    fn new_section_file(&self, section: &Section) -> Result<FilePlan> {
        let extension = self.topology().output_kind.data_extension();
        let order = section.display_order + 1;
        let mut file = FilePlan::new(
            format!("{order}_{}", section_logical_title(&section.title)),
            format!(
                "{order} {}.{extension}",
                section_file_title(&section.title)
            ),
            self.request.work_dir,
        );
        file.section = Some(section.id);
        file.is_repeating = section.is_repeating;
        file.repeat_trigger = section.repeat_trigger;

        file.columns
            .extend(self.meta_columns(MetaSelector::SubmissionId));
        file.columns
            .extend(self.meta_columns(MetaSelector::FieldworkerName));
        if section.is_repeating {
            file.columns
                .extend(self.meta_columns(MetaSelector::SectionIndex));
        }
        for pinned in self.request.column_model.fixed() {
            match pinned {
                ColumnRef::Question(id) => {
                    let question = self.lookup_question(*id)?;
                    // A fixed question native to this section is already
                    // covered by the section's own columns.
                    if question.section != Some(section.id) {
                        file.columns.extend(self.question_columns(question, None));
                    }
                }
                ColumnRef::Meta(selector) => {
                    if !matches!(
                        selector,
                        MetaSelector::SubmissionId | MetaSelector::FieldworkerName
                    ) {
                        file.columns.extend(self.meta_columns(*selector));
                    }
                }
            }
        }
        Ok(file)
    }

    fn visible_questions(&self) -> impl Iterator<Item = &Question> {
        self.request.catalog.questions.iter().filter(|question| {
            question.section.is_some()
                && self
                    .request
                    .column_model
                    .is_visible(ColumnRef::Question(question.id))
        })
    }

    fn lookup_question(&self, id: QuestionId) -> Result<&Question> {
        self.request
            .catalog
            .question(id)
            .ok_or(ExportError::UnknownQuestion(id))
    }

    fn max_instance_for(&self, id: QuestionId) -> u32 {
        self.request
            .max_instances
            .iter()
            .find(|entry| entry.question == id)
            .map(|entry| entry.max_instance)
            .unwrap_or(0)
    }

    fn meta_columns(&self, selector: MetaSelector) -> Vec<Column> {
        if !self
            .request
            .column_model
            .is_visible(ColumnRef::Meta(selector))
        {
            return Vec::new();
        }
        selector
            .fields()
            .iter()
            .map(|field| {
                // Companion fields carried along by a selector keep their
                // plain names; the selector's primary field is overridable.
                let header = match field {
                    MetaField::FieldworkerId
                    | MetaField::RepeatsOnQuestion
                    | MetaField::RepeatQuestionValue => field.name().to_string(),
                    _ => sanitize(
                        &self
                            .request
                            .column_model
                            .header_for(ColumnRef::Meta(selector), field.name()),
                    ),
                };
                Column {
                    name: field.name().to_string(),
                    header,
                    column_type: meta_column_type(*field),
                    kind: ColumnKind::Meta(*field),
                    width: field.default_width(),
                    all_numeric: false,
                }
            })
            .collect()
    }

    fn question_columns(&self, question: &Question, instance: Option<u32>) -> Vec<Column> {
        let valid_name = column_name(&question.name);
        let header = sanitize(
            &self
                .request
                .column_model
                .header_for(ColumnRef::Question(question.id), &valid_name),
        );
        let section_repeating = self.request.catalog.in_repeating_section(question);
        let base = BindingBase {
            question,
            valid_name: &valid_name,
            header: &header,
            instance,
            section_repeating,
        };

        match question.question_type {
            QuestionType::Binary
            | QuestionType::Canvas
            | QuestionType::PhotoCapture
            | QuestionType::Instruction => Vec::new(),
            QuestionType::EmailAddress
            | QuestionType::FreeText
            | QuestionType::Multiline
            | QuestionType::Password
            | QuestionType::PhoneNumber
            | QuestionType::NumericIdentifier
            | QuestionType::Pin
            | QuestionType::Predictive
            | QuestionType::Rank
            | QuestionType::SingleLine
            | QuestionType::Unknown => vec![base.plain_column(ColumnType::Text)],
            QuestionType::Single => {
                let mut column = base.plain_column(ColumnType::Text);
                column.all_numeric = true;
                if let ColumnKind::Question(binding) = &mut column.kind {
                    binding.options = question.options.clone();
                }
                vec![column]
            }
            QuestionType::Date => vec![base.plain_column(ColumnType::ShortDate)],
            QuestionType::Decimal | QuestionType::Integer | QuestionType::Gs1Identifier => {
                vec![base.plain_column(ColumnType::Numeric)]
            }
            QuestionType::Time => vec![base.plain_column(ColumnType::Time)],
            QuestionType::Multiple => self.multiple_columns(&base),
            QuestionType::Variable => match question.computed_kind() {
                // Binary and operator variables never reach the output.
                ComputedKind::Binary | ComputedKind::Operator => Vec::new(),
                ComputedKind::Numeric | ComputedKind::Decimal => {
                    vec![base.plain_column(ColumnType::Numeric)]
                }
                ComputedKind::Text => vec![base.plain_column(ColumnType::Text)],
            },
            QuestionType::Gps => vec![
                base.gps_column(GpsPart::Summary, ColumnType::Text),
                base.gps_column(GpsPart::Latitude, ColumnType::Numeric),
                base.gps_column(GpsPart::Longitude, ColumnType::Numeric),
                base.gps_column(GpsPart::Altitude, ColumnType::Numeric),
                base.gps_column(GpsPart::Timestamp, ColumnType::LongDate),
            ],
        }
    }

    /// One 0/1 membership column per option.
    fn multiple_columns(&self, base: &BindingBase<'_>) -> Vec<Column> {
        let short_naming = self.topology().naming == NameStyle::Short;
        let codebook_base = base
            .header
            .chars()
            .map(|ch| if matches!(ch, '{' | '}') { '_' } else { ch })
            .collect::<String>();
        base.question
            .options
            .iter()
            .map(|option| {
                let suffix = sanitize(if short_naming {
                    &option.value
                } else {
                    &option.text
                });
                let name = match base.instance {
                    Some(instance) => format!("{}_{instance}_{suffix}", base.valid_name),
                    None => format!("{}_{suffix}", base.valid_name),
                };
                let header = match base.instance {
                    Some(instance) => format!("{}_{instance}_{suffix}", base.header),
                    None => format!("{}_{suffix}", base.header),
                };
                let codebook_question = match base.instance {
                    Some(instance) => format!("{codebook_base}_{instance}"),
                    None => codebook_base.clone(),
                };
                Column {
                    name,
                    header,
                    column_type: ColumnType::Numeric,
                    kind: ColumnKind::Question(QuestionBinding {
                        id: base.question.id,
                        question_type: base.question.question_type,
                        label: base.question.label.clone(),
                        instance: base.instance,
                        option_value: Some(option.value.trim().to_string()),
                        option_text: Some(option.text.clone()),
                        codebook_question: Some(codebook_question),
                        gps: None,
                        section_repeating: base.section_repeating,
                        options: Vec::new(),
                    }),
                    width: 0,
                    all_numeric: false,
                }
            })
            .collect()
    }
}

/// Shared pieces of one question's column set.
struct BindingBase<'a> {
    question: &'a Question,
    valid_name: &'a str,
    header: &'a str,
    instance: Option<u32>,
    section_repeating: bool,
}

impl BindingBase<'_> {
    fn binding(&self, gps: Option<GpsPart>) -> QuestionBinding {
        QuestionBinding {
            id: self.question.id,
            question_type: self.question.question_type,
            label: self.question.label.clone(),
            instance: self.instance,
            option_value: None,
            option_text: None,
            codebook_question: None,
            gps,
            section_repeating: self.section_repeating,
            options: Vec::new(),
        }
    }

    fn plain_column(&self, column_type: ColumnType) -> Column {
        Column {
            name: with_instance(self.valid_name, self.instance),
            header: with_instance(self.header, self.instance),
            column_type,
            kind: ColumnKind::Question(self.binding(None)),
            width: 0,
            all_numeric: false,
        }
    }

    fn gps_column(&self, part: GpsPart, column_type: ColumnType) -> Column {
        let name = format!("{}{}", self.valid_name, part.name_suffix());
        let header = format!("{}{}", self.header, part.header_suffix());
        Column {
            name: with_instance(&name, self.instance),
            header: with_instance(&header, self.instance),
            column_type,
            kind: ColumnKind::Question(self.binding(Some(part))),
            width: 0,
            all_numeric: false,
        }
    }
}

fn with_instance(base: &str, instance: Option<u32>) -> String {
    match instance {
        Some(instance) => format!("{base}_{instance}"),
        None => base.to_string(),
    }
}

fn meta_column_type(field: MetaField) -> ColumnType {
    match field {
        MetaField::SubmissionId
        | MetaField::FieldworkerName
        | MetaField::FieldworkerId
        | MetaField::Device
        | MetaField::Language
        | MetaField::ModifiedBy
        | MetaField::RepeatsOnQuestion
        | MetaField::Complete => ColumnType::Text,
        MetaField::DurationSeconds
        | MetaField::Latitude
        | MetaField::Longitude
        | MetaField::SurveyVersion
        | MetaField::RepeatQuestionValue
        | MetaField::RepeatingIndex => ColumnType::Numeric,
        MetaField::Received | MetaField::Start | MetaField::End | MetaField::ModifiedOn => {
            ColumnType::LongDate
        }
    }
}

/// Section title restricted to `[A-Za-z0-9 _-]` with spaces as underscores,
/// used for the logical file name.
fn section_logical_title(title: &str) -> String {
    title
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '_' | '-'))
        .map(|ch| if ch == ' ' { '_' } else { ch })
        .collect()
}

/// Section title with path separators replaced, used on disk.
fn section_file_title(title: &str) -> String {
    title
        .chars()
        .map(|ch| if matches!(ch, '\\' | '/' | ':') { '_' } else { ch })
        .collect()
}
