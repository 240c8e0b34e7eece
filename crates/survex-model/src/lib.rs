pub mod column_model;
pub mod error;
pub mod geo;
pub mod options;
pub mod submission;
pub mod survey;

pub use column_model::{ColumnModel, ColumnRef, MetaField, MetaSelector};
pub use error::{ExportError, Result};
pub use geo::{GeoFix, GeoPoint};
pub use options::{
    ExportFormat, FileGrouping, NameStyle, OutputKind, Topology, ValueRendering,
};
pub use submission::{
    FieldResponse, LONG_DATE_FORMAT, MaxQuestionInstance, Response, Submission, SubmissionPage,
};
pub use survey::{
    ComputedKind, Question, QuestionId, QuestionOption, QuestionType, Section, SectionId,
    SurveyCatalog, SurveyId,
};
