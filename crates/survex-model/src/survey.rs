//! Survey structure: questions, sections and the catalog handed to the
//! export planner by the retrieval service.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SurveyId(pub i64);

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QuestionId(pub i64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SectionId(pub i64);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Question kinds as captured by the survey designer.
///
/// The variants mirror the designer's full palette; several of them
/// (binary blobs, canvases, photos, instructions) never contribute export
/// columns but still appear in survey definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Binary,
    Canvas,
    Date,
    Decimal,
    EmailAddress,
    FreeText,
    Gps,
    Gs1Identifier,
    Instruction,
    Integer,
    Multiline,
    Multiple,
    NumericIdentifier,
    Password,
    PhoneNumber,
    PhotoCapture,
    Pin,
    Predictive,
    Rank,
    Single,
    SingleLine,
    Time,
    Unknown,
    Variable,
}

impl QuestionType {
    /// Display name used in the questions listing file.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Binary => "Binary",
            QuestionType::Canvas => "Canvas",
            QuestionType::Date => "Date",
            QuestionType::Decimal => "Decimal",
            QuestionType::EmailAddress => "Email address",
            QuestionType::FreeText => "Free text",
            QuestionType::Gps => "GPS",
            QuestionType::Gs1Identifier => "GS1 identifier",
            QuestionType::Instruction => "Instruction",
            QuestionType::Integer => "Integer",
            QuestionType::Multiline => "Multiline",
            QuestionType::Multiple => "Multiple select",
            QuestionType::NumericIdentifier => "Numeric identifier",
            QuestionType::Password => "Password",
            QuestionType::PhoneNumber => "Phone number",
            QuestionType::PhotoCapture => "Photo capture",
            QuestionType::Pin => "PIN",
            QuestionType::Predictive => "Predictive",
            QuestionType::Rank => "Rank",
            QuestionType::Single => "Single select",
            QuestionType::SingleLine => "Single line",
            QuestionType::Time => "Time",
            QuestionType::Unknown => "Unknown",
            QuestionType::Variable => "Variable",
        }
    }

    /// Returns true for the coded choice kinds that carry option lists.
    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::Single | QuestionType::Multiple)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-type of a computed "variable" question.
///
/// The designer stores the sub-type tag in the question's label, so the
/// exporter recovers it from there rather than from a dedicated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedKind {
    Numeric,
    Decimal,
    Binary,
    Operator,
    Text,
}

impl ComputedKind {
    /// Recover the sub-type from a variable question's label.
    /// Unrecognized tags fall back to `Text`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "numeric" => ComputedKind::Numeric,
            "decimal" => ComputedKind::Decimal,
            "binary" => ComputedKind::Binary,
            "operator" => ComputedKind::Operator,
            _ => ComputedKind::Text,
        }
    }
}

/// A single selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Raw designer name; sanitized into a column name at plan time.
    pub name: String,
    /// Display label. For `Variable` questions this carries the computed
    /// sub-type tag instead of prose.
    pub label: String,
    pub question_type: QuestionType,
    /// Owning section. Questions without a section are not exported.
    pub section: Option<SectionId>,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Option display text for a stored code, if the code is known.
    pub fn option_text(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.text.as_str())
    }

    /// Computed sub-type for `Variable` questions.
    pub fn computed_kind(&self) -> ComputedKind {
        ComputedKind::from_label(&self.label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    /// Zero-based designer ordering; section files are numbered from one.
    pub display_order: u32,
    #[serde(default)]
    pub is_repeating: bool,
    /// The question whose answer drives the repeat count, when repeating.
    #[serde(default)]
    pub repeat_trigger: Option<QuestionId>,
}

/// Survey structure as returned by the retrieval service: questions in
/// section order plus the section metadata they reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyCatalog {
    pub survey_id: SurveyId,
    pub questions: Vec<Question>,
    pub sections: Vec<Section>,
}

impl SurveyCatalog {
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    /// True when the question's owning section repeats.
    pub fn in_repeating_section(&self, question: &Question) -> bool {
        question
            .section
            .and_then(|id| self.section(id))
            .map(|section| section.is_repeating)
            .unwrap_or(false)
    }
}
