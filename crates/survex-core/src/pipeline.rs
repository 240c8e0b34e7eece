//! Sequential driver for the data-writing phase: resolve the topology,
//! plan the files, then stream pages of submissions until the store is
//! exhausted. Structural files and packaging happen after this phase, on
//! statistics that are final once [`run_data_phase`] returns.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use survex_model::{
    ColumnModel, ExportFormat, FileGrouping, NameStyle, Result, SubmissionPage, SurveyCatalog,
    SurveyId, Topology, ValueRendering,
};

use crate::emit::DataEmitter;
use crate::plan::{FilePlan, PlanRequest, plan_files};
use crate::source::{MaxInstanceSource, PageObserver, SubmissionSource};

/// Inputs for one export run.
pub struct ExportRequest<'a> {
    pub format: ExportFormat,
    pub naming: NameStyle,
    pub values: ValueRendering,
    pub survey_id: SurveyId,
    pub column_model: &'a ColumnModel,
    /// Working directory for data and structural files. Reused across
    /// invocations when the caller supplies a workflow id.
    pub work_dir: &'a Path,
    /// Caller's export file name, used for legacy merged-file naming.
    pub base_name: &'a str,
    pub legacy_merged_name: bool,
    pub page_size: usize,
}

/// Outcome of the data phase: finished plans with final statistics.
pub struct DataPhase {
    pub topology: Topology,
    pub catalog: SurveyCatalog,
    pub plans: Vec<FilePlan>,
    pub submissions: usize,
    pub pages: usize,
}

/// Plan the output files and stream every page of submissions into them.
///
/// On any failure after planning, every data file written so far is
/// removed before the error propagates; no partial output survives.
pub fn run_data_phase(
    request: &ExportRequest<'_>,
    source: &mut dyn SubmissionSource,
    instances: &mut dyn MaxInstanceSource,
    observer: &mut dyn PageObserver,
) -> Result<DataPhase> {
    let topology = Topology::resolve(request.format, request.naming, request.values);
    info!(
        format = %request.format,
        survey_id = %request.survey_id,
        "export topology resolved"
    );

    let first = source.fetch_page(0, request.page_size)?;
    let catalog = first.catalog.clone();
    let max_instances = if topology.grouping == FileGrouping::ColumnExpanded {
        instances.max_instances(request.survey_id)?
    } else {
        Vec::new()
    };

    fs::create_dir_all(request.work_dir)?;
    let plans = plan_files(&PlanRequest {
        topology: &topology,
        catalog: &catalog,
        column_model: request.column_model,
        max_instances: &max_instances,
        work_dir: request.work_dir,
        base_name: request.base_name,
        legacy_merged_name: request.legacy_merged_name,
    })?;

    let planned: Vec<PathBuf> = plans.iter().map(|plan| plan.path.clone()).collect();
    let emitter = match DataEmitter::open(topology, plans) {
        Ok(emitter) => emitter,
        Err(error) => {
            remove_files(&planned);
            return Err(error);
        }
    };
    let written = emitter.paths();
    match stream_pages(request, source, observer, &catalog, emitter, first) {
        Ok((plans, submissions, pages)) => {
            info!(submissions, pages, files = plans.len(), "data phase complete");
            Ok(DataPhase {
                topology,
                catalog,
                plans,
                submissions,
                pages,
            })
        }
        Err(error) => {
            remove_files(&written);
            Err(error)
        }
    }
}

fn stream_pages(
    request: &ExportRequest<'_>,
    source: &mut dyn SubmissionSource,
    observer: &mut dyn PageObserver,
    catalog: &SurveyCatalog,
    mut emitter: DataEmitter,
    first: SubmissionPage,
) -> Result<(Vec<FilePlan>, usize, usize)> {
    let mut page = 0usize;
    let mut current = first;
    let mut written = 0usize;
    let mut pages = 0usize;
    let mut remaining = !current.submissions.is_empty();
    while remaining {
        emitter.write_page(catalog, &current.submissions)?;
        written += current.submissions.len();
        pages += 1;
        observer.page_written(page, written);
        debug!(page, written, "page flushed");

        if current.total_count > (page + 1) * request.page_size {
            page += 1;
            // Ordering across reissued queries is not guaranteed stable;
            // drop anything already written from the preceding page.
            let previous: BTreeSet<String> = current
                .submissions
                .iter()
                .map(|submission| submission.id.clone())
                .collect();
            let mut next = source.fetch_page(page, request.page_size)?;
            next.submissions
                .retain(|submission| !previous.contains(&submission.id));
            current = next;
        } else {
            remaining = false;
        }
    }
    let plans = emitter.finish()?;
    Ok((plans, written, pages))
}

/// Best-effort removal of output files on a failed export.
pub fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(error) = fs::remove_file(path)
            && path.exists()
        {
            warn!(path = %path.display(), %error, "failed to remove partial output");
        }
    }
}
