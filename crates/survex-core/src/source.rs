//! Seams to the export engine's external collaborators.
//!
//! The engine only ever sees these traits: the paged retrieval service,
//! the precomputed repeat-instance aggregate, the archive container the
//! caller supplies, and an optional page-boundary observer.

use std::io::Read;

use survex_model::{MaxQuestionInstance, Result, SubmissionPage, SurveyId};

/// Paged retrieval of submissions for a fixed filter.
///
/// Must be callable repeatedly with increasing `page` and the same filter;
/// `total_count` reflects the filter, not the page. Ordering across
/// reissued queries is not guaranteed stable, so callers guard against
/// boundary duplication themselves.
pub trait SubmissionSource {
    fn fetch_page(&mut self, page: usize, page_size: usize) -> Result<SubmissionPage>;
}

/// Precomputed highest repeat instance per question, consulted once before
/// planning when column expansion is requested.
pub trait MaxInstanceSource {
    fn max_instances(&mut self, survey: SurveyId) -> Result<Vec<MaxQuestionInstance>>;
}

/// An aggregate that was materialized ahead of the export.
pub struct PrecomputedInstances(pub Vec<MaxQuestionInstance>);

impl MaxInstanceSource for PrecomputedInstances {
    fn max_instances(&mut self, _survey: SurveyId) -> Result<Vec<MaxQuestionInstance>> {
        Ok(self.0.clone())
    }
}

/// Destination container for finished files. Compression level and
/// ownership of the underlying stream are the implementor's concern.
pub trait ArchiveSink {
    fn put_entry(&mut self, name: &str, reader: &mut dyn Read) -> Result<()>;
}

/// Invoked after each page of submissions has been written and flushed.
/// Not part of the correctness contract.
pub trait PageObserver {
    fn page_written(&mut self, page: usize, submissions_written: usize);
}

/// Observer that ignores every page boundary.
#[derive(Debug, Default)]
pub struct NullObserver;

impl PageObserver for NullObserver {
    fn page_written(&mut self, _page: usize, _submissions_written: usize) {}
}
