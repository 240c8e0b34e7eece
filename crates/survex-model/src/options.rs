//! Export options and the resolved output topology.
//!
//! The topology is computed once per export from the requested format,
//! naming and value options, then treated as immutable for the whole run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The export formats served by this engine.
///
/// The two `*FlatLong` / `*Long` variants are legacy aliases that lay data
/// out exactly like the column-expanded variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    CsvPerSection,
    CsvSplitRepeating,
    CsvRowExpanded,
    CsvColumnExpanded,
    CsvFlatLong,
    StatPerSection,
    StatSplitRepeating,
    StatRowExpanded,
    StatColumnExpanded,
    StatLong,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 10] = [
        ExportFormat::CsvPerSection,
        ExportFormat::CsvSplitRepeating,
        ExportFormat::CsvRowExpanded,
        ExportFormat::CsvColumnExpanded,
        ExportFormat::CsvFlatLong,
        ExportFormat::StatPerSection,
        ExportFormat::StatSplitRepeating,
        ExportFormat::StatRowExpanded,
        ExportFormat::StatColumnExpanded,
        ExportFormat::StatLong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::CsvPerSection => "csv-per-section",
            ExportFormat::CsvSplitRepeating => "csv-split-repeating",
            ExportFormat::CsvRowExpanded => "csv-row-expanded",
            ExportFormat::CsvColumnExpanded => "csv-column-expanded",
            ExportFormat::CsvFlatLong => "csv-flat-long",
            ExportFormat::StatPerSection => "stat-per-section",
            ExportFormat::StatSplitRepeating => "stat-split-repeating",
            ExportFormat::StatRowExpanded => "stat-row-expanded",
            ExportFormat::StatColumnExpanded => "stat-column-expanded",
            ExportFormat::StatLong => "stat-long",
        }
    }

    pub fn output_kind(&self) -> OutputKind {
        match self {
            ExportFormat::CsvPerSection
            | ExportFormat::CsvSplitRepeating
            | ExportFormat::CsvRowExpanded
            | ExportFormat::CsvColumnExpanded
            | ExportFormat::CsvFlatLong => OutputKind::Delimited,
            ExportFormat::StatPerSection
            | ExportFormat::StatSplitRepeating
            | ExportFormat::StatRowExpanded
            | ExportFormat::StatColumnExpanded
            | ExportFormat::StatLong => OutputKind::StatPackage,
        }
    }

    pub fn grouping(&self) -> FileGrouping {
        match self {
            ExportFormat::CsvPerSection | ExportFormat::StatPerSection => {
                FileGrouping::PerSection
            }
            ExportFormat::CsvSplitRepeating | ExportFormat::StatSplitRepeating => {
                FileGrouping::SplitRepeating
            }
            ExportFormat::CsvRowExpanded | ExportFormat::StatRowExpanded => {
                FileGrouping::RowExpanded
            }
            ExportFormat::CsvColumnExpanded
            | ExportFormat::CsvFlatLong
            | ExportFormat::StatColumnExpanded
            | ExportFormat::StatLong => FileGrouping::ColumnExpanded,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column naming verbosity. Short naming suffixes multi-choice columns with
/// the option code; long naming uses the option text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
    #[default]
    Short,
    Long,
}

/// Whether coded single-choice answers are written as raw codes or decoded
/// through the option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueRendering {
    #[default]
    Codes,
    Labels,
}

/// The physical flavor of the data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// Comma-separated text with full-field quoting.
    Delimited,
    /// Stat-package transfer data plus a declared schema file per data file.
    StatPackage,
}

impl OutputKind {
    pub fn data_extension(&self) -> &'static str {
        match self {
            OutputKind::Delimited => "csv",
            OutputKind::StatPackage => "dat",
        }
    }
}

/// How questions are distributed over output files and how repeating
/// sections are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileGrouping {
    /// One file per section plus a submissions metadata file.
    PerSection,
    /// Merged non-repeating file plus one file per repeating section.
    SplitRepeating,
    /// Single merged file; repeating answers become extra rows.
    RowExpanded,
    /// Single merged file; repeating answers become per-instance columns,
    /// bounded by the precomputed maximum instance.
    ColumnExpanded,
}

/// Resolved shape of one export run. Derived once, immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub output_kind: OutputKind,
    pub grouping: FileGrouping,
    pub naming: NameStyle,
    pub values: ValueRendering,
    /// Every field is quoted. Only the delimited kind mandates this; the
    /// stat-package kind relies on schema-declared types instead, apart
    /// from the always-string metadata fields.
    pub encapsulate_all: bool,
}

impl Topology {
    /// Derive the topology from the requested options. Pure and total.
    pub fn resolve(format: ExportFormat, naming: NameStyle, values: ValueRendering) -> Self {
        let output_kind = format.output_kind();
        Self {
            output_kind,
            grouping: format.grouping(),
            naming,
            values,
            encapsulate_all: output_kind == OutputKind::Delimited,
        }
    }

    /// Groupings that route questions into dedicated section files.
    pub fn uses_section_files(&self) -> bool {
        matches!(
            self.grouping,
            FileGrouping::PerSection | FileGrouping::SplitRepeating
        )
    }

    /// Single-choice answers decode through the option list only for the
    /// delimited kind; the stat-package kind always keeps raw codes and
    /// decodes via schema value labels.
    pub fn decode_single_labels(&self) -> bool {
        self.output_kind == OutputKind::Delimited && self.values == ValueRendering::Labels
    }
}
