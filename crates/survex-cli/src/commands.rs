use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};
use uuid::Uuid;

use survex_core::pipeline::ExportRequest;
use survex_core::source::{MaxInstanceSource, PageObserver, PrecomputedInstances};
use survex_model::{ColumnModel, ExportFormat};

use survex_cli::archive::DirArchive;
use survex_cli::columns::load_column_model;
use survex_cli::pipeline::{PipelineConfig, run_export_pipeline};
use survex_cli::store::JsonStore;
use survex_cli::types::ExportRunResult;

use crate::cli::ExportArgs;
use crate::summary::apply_table_style;

pub fn run_formats() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Format", "Kind", "Layout"]);
    apply_table_style(&mut table);
    for format in ExportFormat::ALL {
        table.add_row(vec![
            format.as_str().to_string(),
            format!("{:?}", format.output_kind()),
            format!("{:?}", format.grouping()),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Logs each flushed page; the engine treats this as an opaque observer.
struct ProgressLogger;

impl PageObserver for ProgressLogger {
    fn page_written(&mut self, page: usize, submissions_written: usize) {
        info!(page, submissions_written, "page written");
    }
}

pub fn run_export(args: &ExportArgs) -> Result<ExportRunResult> {
    let span = info_span!("export", survey = %args.survey.display());
    let _guard = span.enter();

    let mut store =
        JsonStore::load(&args.survey, &args.submissions).context("load submission store")?;
    let survey_id = store.survey_id();
    let column_model = match &args.column_model {
        Some(path) => load_column_model(path).context("load column model")?,
        None => ColumnModel::all_visible(store.catalog()),
    };

    let run_id = args
        .workflow_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let work_dir = std::env::temp_dir().join(format!("survex-{run_id}"));
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("export"));

    let mut instances =
        PrecomputedInstances(store.max_instances(survey_id).context("aggregate instances")?);
    let mut archive = DirArchive::create(&output_dir).context("create output directory")?;

    let format: ExportFormat = args.format.into();
    let config = PipelineConfig {
        request: ExportRequest {
            format,
            naming: args.naming.into(),
            values: args.values.into(),
            survey_id,
            column_model: &column_model,
            work_dir: &work_dir,
            base_name: &args.base_name,
            legacy_merged_name: args.legacy_merged_name,
            page_size: args.page_size,
        },
        keep_work_dir: args.workflow_id.is_some(),
    };
    let outcome = run_export_pipeline(
        &config,
        &mut store,
        &mut instances,
        &mut archive,
        &mut ProgressLogger,
    )
    .context("run export")?;

    Ok(ExportRunResult {
        survey_id,
        format,
        output_dir,
        submissions: outcome.submissions,
        pages: outcome.pages,
        data_files: outcome.data_files,
        structural_files: outcome.structural_files,
    })
}
