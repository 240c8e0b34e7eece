//! Full export pipeline: data phase, structural phase, packaging, and the
//! cleanup guarantees around them.
//!
//! Phases run strictly in sequence. The structural phase only ever sees
//! plans returned by a finished emitter, and any failure after the first
//! file is created removes everything written so far.

use std::fs::{self, File};
use std::path::PathBuf;

use tracing::{info, info_span};

use survex_core::pipeline::{ExportRequest, remove_files, run_data_phase};
use survex_core::source::{ArchiveSink, MaxInstanceSource, PageObserver, SubmissionSource};
use survex_model::Result;
use survex_report::{StructuralFile, write_structural_files};

use crate::types::DataFileSummary;

pub struct PipelineConfig<'a> {
    pub request: ExportRequest<'a>,
    /// Keep the working directory after packaging so a workflow can reuse
    /// it across invocations.
    pub keep_work_dir: bool,
}

pub struct PipelineOutcome {
    pub submissions: usize,
    pub pages: usize,
    pub data_files: Vec<DataFileSummary>,
    pub structural_files: Vec<String>,
}

/// Run one complete export into the supplied archive sink.
pub fn run_export_pipeline(
    config: &PipelineConfig<'_>,
    source: &mut dyn SubmissionSource,
    instances: &mut dyn MaxInstanceSource,
    archive: &mut dyn ArchiveSink,
    observer: &mut dyn PageObserver,
) -> Result<PipelineOutcome> {
    let data = {
        let span = info_span!("data_phase");
        let _guard = span.enter();
        run_data_phase(&config.request, source, instances, observer)?
    };
    let data_paths: Vec<PathBuf> = data.plans.iter().map(|plan| plan.path.clone()).collect();

    let structural = {
        let span = info_span!("structural_phase");
        let _guard = span.enter();
        match write_structural_files(
            &data.topology,
            config.request.survey_id,
            &data.plans,
            &data.catalog,
            config.request.column_model,
            config.request.work_dir,
        ) {
            Ok(files) => files,
            Err(error) => {
                remove_files(&data_paths);
                return Err(error);
            }
        }
    };

    let mut all_paths = data_paths;
    all_paths.extend(structural.iter().map(|file| file.path.clone()));
    if let Err(error) = package(archive, &data.plans, &structural) {
        remove_files(&all_paths);
        return Err(error);
    }

    // The archive holds everything now; drop the working copies, and the
    // working directory itself unless a workflow pinned it.
    remove_files(&all_paths);
    if !config.keep_work_dir {
        let _ = fs::remove_dir(config.request.work_dir);
    }

    info!(
        submissions = data.submissions,
        data_files = data.plans.len(),
        structural_files = structural.len(),
        "export packaged"
    );
    Ok(PipelineOutcome {
        submissions: data.submissions,
        pages: data.pages,
        data_files: data
            .plans
            .iter()
            .map(|plan| DataFileSummary {
                file_name: plan.file_name.clone(),
                columns: plan.columns.len(),
            })
            .collect(),
        structural_files: structural
            .into_iter()
            .map(|file| file.file_name)
            .collect(),
    })
}

fn package(
    archive: &mut dyn ArchiveSink,
    plans: &[survex_core::plan::FilePlan],
    structural: &[StructuralFile],
) -> Result<()> {
    for plan in plans {
        let mut file = File::open(&plan.path)?;
        archive.put_entry(&plan.file_name, &mut file)?;
    }
    for entry in structural {
        let mut file = File::open(&entry.path)?;
        archive.put_entry(&entry.file_name, &mut file)?;
    }
    Ok(())
}
