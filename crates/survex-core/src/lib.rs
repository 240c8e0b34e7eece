//! Export planning and streaming write engine for survey submissions.
//!
//! The engine turns a resolved [`survex_model::Topology`] plus survey
//! structure into a set of planned output files, then streams paged
//! submissions through them while accumulating per-column statistics.
//! External collaborators (retrieval, repeat-instance aggregates, archive
//! packaging) enter through the traits in [`source`].

pub mod emit;
pub mod pipeline;
pub mod plan;
pub mod sanitize;
pub mod source;
pub mod value_labels;

pub use emit::DataEmitter;
pub use pipeline::{DataPhase, ExportRequest, remove_files, run_data_phase};
pub use plan::{
    Column, ColumnKind, ColumnType, FilePlan, GpsPart, PlanRequest, QuestionBinding, plan_files,
};
pub use source::{
    ArchiveSink, MaxInstanceSource, NullObserver, PageObserver, PrecomputedInstances,
    SubmissionSource,
};
pub use value_labels::{ValueLabelPair, ValueLabelRegistry, ValueLabelSet};
