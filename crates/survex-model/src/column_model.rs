//! The caller's column-selection model: which columns are visible, header
//! overrides, and columns pinned into every section file.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::ExportError;
use crate::survey::{QuestionId, SurveyCatalog};

/// Selectable metadata column indices, as exposed to callers.
///
/// A selector may expand to more than one output column (fieldworker name
/// carries the fieldworker id along; the section index expands to the
/// repeat trio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaSelector {
    SubmissionId,
    FieldworkerName,
    DeviceName,
    ReceivedDate,
    StartDate,
    EndDate,
    DurationSeconds,
    Latitude,
    Longitude,
    Language,
    SurveyVersion,
    ModifiedBy,
    ModifiedOn,
    IsComplete,
    SectionIndex,
}

impl MetaSelector {
    /// The standard metadata block, in the order it appears in the merged
    /// and submissions files. The section index is not part of it; section
    /// files add it for repeating sections only.
    pub const STANDARD: [MetaSelector; 14] = [
        MetaSelector::SubmissionId,
        MetaSelector::FieldworkerName,
        MetaSelector::DeviceName,
        MetaSelector::ReceivedDate,
        MetaSelector::StartDate,
        MetaSelector::EndDate,
        MetaSelector::DurationSeconds,
        MetaSelector::Latitude,
        MetaSelector::Longitude,
        MetaSelector::Language,
        MetaSelector::SurveyVersion,
        MetaSelector::ModifiedBy,
        MetaSelector::ModifiedOn,
        MetaSelector::IsComplete,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            MetaSelector::SubmissionId => "submission_id",
            MetaSelector::FieldworkerName => "fieldworker_name",
            MetaSelector::DeviceName => "device_name",
            MetaSelector::ReceivedDate => "received_date",
            MetaSelector::StartDate => "start_date",
            MetaSelector::EndDate => "end_date",
            MetaSelector::DurationSeconds => "duration_seconds",
            MetaSelector::Latitude => "latitude",
            MetaSelector::Longitude => "longitude",
            MetaSelector::Language => "language",
            MetaSelector::SurveyVersion => "survey_version",
            MetaSelector::ModifiedBy => "modified_by",
            MetaSelector::ModifiedOn => "modified_on",
            MetaSelector::IsComplete => "is_complete",
            MetaSelector::SectionIndex => "section_index",
        }
    }

    /// The output variables this selector expands to.
    pub fn fields(&self) -> &'static [MetaField] {
        match self {
            MetaSelector::SubmissionId => &[MetaField::SubmissionId],
            MetaSelector::FieldworkerName => {
                &[MetaField::FieldworkerName, MetaField::FieldworkerId]
            }
            MetaSelector::DeviceName => &[MetaField::Device],
            MetaSelector::ReceivedDate => &[MetaField::Received],
            MetaSelector::StartDate => &[MetaField::Start],
            MetaSelector::EndDate => &[MetaField::End],
            MetaSelector::DurationSeconds => &[MetaField::DurationSeconds],
            MetaSelector::Latitude => &[MetaField::Latitude],
            MetaSelector::Longitude => &[MetaField::Longitude],
            MetaSelector::Language => &[MetaField::Language],
            MetaSelector::SurveyVersion => &[MetaField::SurveyVersion],
            MetaSelector::ModifiedBy => &[MetaField::ModifiedBy],
            MetaSelector::ModifiedOn => &[MetaField::ModifiedOn],
            MetaSelector::IsComplete => &[MetaField::Complete],
            MetaSelector::SectionIndex => &[
                MetaField::RepeatsOnQuestion,
                MetaField::RepeatQuestionValue,
                MetaField::RepeatingIndex,
            ],
        }
    }
}

impl FromStr for MetaSelector {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        MetaSelector::STANDARD
            .iter()
            .chain([MetaSelector::SectionIndex].iter())
            .find(|selector| selector.token() == token)
            .copied()
            .ok_or_else(|| ExportError::InvalidColumnRef(s.to_string()))
    }
}

impl fmt::Display for MetaSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Concrete metadata output variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaField {
    SubmissionId,
    FieldworkerName,
    FieldworkerId,
    Device,
    Received,
    Start,
    End,
    DurationSeconds,
    Latitude,
    Longitude,
    Language,
    SurveyVersion,
    ModifiedBy,
    ModifiedOn,
    RepeatsOnQuestion,
    RepeatQuestionValue,
    RepeatingIndex,
    Complete,
}

impl MetaField {
    /// Variable name as written to headers and schema files.
    pub fn name(&self) -> &'static str {
        match self {
            MetaField::SubmissionId => "Submission Id",
            MetaField::FieldworkerName => "Fieldworker Name",
            MetaField::FieldworkerId => "Fieldworker Id",
            MetaField::Device => "Device",
            MetaField::Received => "Received",
            MetaField::Start => "Start",
            MetaField::End => "End",
            MetaField::DurationSeconds => "Duration (seconds)",
            MetaField::Latitude => "Latitude",
            MetaField::Longitude => "Longitude",
            MetaField::Language => "Language",
            MetaField::SurveyVersion => "Survey Version",
            MetaField::ModifiedBy => "Modified By",
            MetaField::ModifiedOn => "Modified On",
            MetaField::RepeatsOnQuestion => "Repeats On Question",
            MetaField::RepeatQuestionValue => "Repeat Question Value",
            MetaField::RepeatingIndex => "Repeating Index",
            MetaField::Complete => "Complete",
        }
    }

    /// String-typed metadata stays quoted even when the output kind does
    /// not mandate encapsulation.
    pub fn always_string(&self) -> bool {
        matches!(
            self,
            MetaField::SubmissionId
                | MetaField::FieldworkerName
                | MetaField::FieldworkerId
                | MetaField::Device
                | MetaField::Language
                | MetaField::ModifiedBy
                | MetaField::RepeatsOnQuestion
                | MetaField::Complete
        )
    }

    /// Width known up front (identifier fields are fixed-size).
    pub fn default_width(&self) -> usize {
        match self {
            MetaField::SubmissionId | MetaField::FieldworkerId => 36,
            _ => 0,
        }
    }
}

/// A reference into the column space: either a metadata selector or a
/// question column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnRef {
    Meta(MetaSelector),
    Question(QuestionId),
}

const QUESTION_PREFIX: &str = "Question_";

impl FromStr for ColumnRef {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix(QUESTION_PREFIX) {
            let id = rest
                .parse::<i64>()
                .map_err(|_| ExportError::InvalidColumnRef(s.to_string()))?;
            return Ok(ColumnRef::Question(QuestionId(id)));
        }
        Ok(ColumnRef::Meta(trimmed.parse()?))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Meta(selector) => f.write_str(selector.token()),
            ColumnRef::Question(id) => write!(f, "{QUESTION_PREFIX}{id}"),
        }
    }
}

/// Column selection for one export: visibility, header overrides and
/// pinned ("fixed") columns that repeat into every section file.
#[derive(Debug, Clone, Default)]
pub struct ColumnModel {
    visible: BTreeSet<ColumnRef>,
    headers: BTreeMap<ColumnRef, String>,
    fixed: Vec<ColumnRef>,
}

impl ColumnModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model with every metadata selector and every catalog question
    /// visible, no overrides and no pins.
    pub fn all_visible(catalog: &SurveyCatalog) -> Self {
        let mut model = Self::new();
        for selector in MetaSelector::STANDARD {
            model.set_visible(ColumnRef::Meta(selector));
        }
        model.set_visible(ColumnRef::Meta(MetaSelector::SectionIndex));
        for question in &catalog.questions {
            model.set_visible(ColumnRef::Question(question.id));
        }
        model
    }

    pub fn set_visible(&mut self, column: ColumnRef) {
        self.visible.insert(column);
    }

    pub fn is_visible(&self, column: ColumnRef) -> bool {
        self.visible.contains(&column)
    }

    pub fn set_header(&mut self, column: ColumnRef, header: impl Into<String>) {
        self.headers.insert(column, header.into());
    }

    /// Header override for a column, falling back to the given default.
    pub fn header_for(&self, column: ColumnRef, default: &str) -> String {
        self.headers
            .get(&column)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn pin(&mut self, column: ColumnRef) {
        self.fixed.push(column);
    }

    pub fn fixed(&self) -> &[ColumnRef] {
        &self.fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_refs_round_trip_through_strings() {
        let question: ColumnRef = "Question_42".parse().unwrap();
        assert_eq!(question, ColumnRef::Question(QuestionId(42)));
        assert_eq!(question.to_string(), "Question_42");

        let meta: ColumnRef = "submission_id".parse().unwrap();
        assert_eq!(meta, ColumnRef::Meta(MetaSelector::SubmissionId));
        assert_eq!(meta.to_string(), "submission_id");
    }

    #[test]
    fn bad_column_refs_are_rejected() {
        assert!("Question_".parse::<ColumnRef>().is_err());
        assert!("Question_x".parse::<ColumnRef>().is_err());
        assert!("no_such_meta".parse::<ColumnRef>().is_err());
    }

    #[test]
    fn fieldworker_selector_expands_to_name_and_id() {
        let fields = MetaSelector::FieldworkerName.fields();
        assert_eq!(
            fields,
            &[MetaField::FieldworkerName, MetaField::FieldworkerId]
        );
    }

    #[test]
    fn section_index_expands_to_repeat_trio() {
        assert_eq!(MetaSelector::SectionIndex.fields().len(), 3);
    }

    #[test]
    fn header_override_wins_over_default() {
        let mut model = ColumnModel::new();
        let column = ColumnRef::Meta(MetaSelector::DeviceName);
        assert_eq!(model.header_for(column, "Device"), "Device");
        model.set_header(column, "Handset");
        assert_eq!(model.header_for(column, "Device"), "Handset");
    }
}
