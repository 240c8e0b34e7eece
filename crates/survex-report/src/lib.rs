//! Structural file generation for survey exports.
//!
//! Runs strictly after the data phase: every generator here reads the
//! final per-column statistics accumulated while streaming, so plans must
//! come from a finished emitter.

use std::path::{Path, PathBuf};

use tracing::info;

use survex_core::plan::FilePlan;
use survex_model::{ColumnModel, OutputKind, Result, SurveyCatalog, SurveyId, Topology};

pub mod codebook;
pub mod schema;

pub use codebook::{write_codebook, write_delimited_files, write_questions};
pub use schema::{write_schema, write_schema_files};

/// A generated non-data output describing the shape of the data files.
#[derive(Debug, Clone)]
pub struct StructuralFile {
    pub file_name: String,
    pub path: PathBuf,
}

/// Write the structural files matching the topology's output kind: a
/// schema per data file for the stat-package kind, the codebook and
/// questions listing for the delimited kind.
pub fn write_structural_files(
    topology: &Topology,
    survey: SurveyId,
    plans: &[FilePlan],
    catalog: &SurveyCatalog,
    column_model: &ColumnModel,
    work_dir: &Path,
) -> Result<Vec<StructuralFile>> {
    let result = match topology.output_kind {
        OutputKind::Delimited => {
            codebook::write_delimited_files(plans, catalog, column_model, work_dir)
        }
        OutputKind::StatPackage => schema::write_schema_files(survey, plans, work_dir),
    };
    match result {
        Ok(files) => {
            info!(files = files.len(), "structural files written");
            Ok(files)
        }
        Err(error) => {
            // Leave no partially written structural file behind.
            for path in expected_paths(topology, plans, work_dir) {
                let _ = std::fs::remove_file(path);
            }
            Err(error)
        }
    }
}

fn expected_paths(topology: &Topology, plans: &[FilePlan], work_dir: &Path) -> Vec<PathBuf> {
    match topology.output_kind {
        OutputKind::Delimited => vec![
            work_dir.join(codebook::CODEBOOK_FILE_NAME),
            work_dir.join(codebook::QUESTIONS_FILE_NAME),
        ],
        OutputKind::StatPackage => plans
            .iter()
            .map(|plan| {
                let stem = Path::new(&plan.file_name)
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or(&plan.file_name);
                work_dir.join(format!("{stem}.stsd"))
            })
            .collect(),
    }
}
