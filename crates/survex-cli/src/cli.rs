//! CLI argument definitions for the survey exporter.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use survex_model::{ExportFormat, NameStyle, ValueRendering};

#[derive(Parser)]
#[command(
    name = "survex",
    version,
    about = "Survey analytics exporter - stream submissions to flat tabular formats",
    long_about = "Stream paginated survey submissions into delimited-text or\n\
                  Stat/Transfer data files, with generated schema, codebook and\n\
                  question-list files alongside."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Raise or lower log verbosity (-v debug, -vv trace, -q errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// When to use ANSI colors (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Set the log level directly, overriding -v/-q.
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Append logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export submissions into data and structural files.
    Export(ExportArgs),

    /// List the supported export formats.
    Formats,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Survey definition document (JSON).
    #[arg(value_name = "SURVEY_JSON")]
    pub survey: PathBuf,

    /// Submissions document (JSON).
    #[arg(value_name = "SUBMISSIONS_JSON")]
    pub submissions: PathBuf,

    /// Export format to produce.
    #[arg(long = "format", value_enum, default_value = "csv-row-expanded")]
    pub format: FormatArg,

    /// Multi-choice column naming: option codes (short) or option text (long).
    #[arg(long = "naming", value_enum, default_value = "short")]
    pub naming: NamingArg,

    /// Write coded answers as raw codes or decoded labels.
    #[arg(long = "values", value_enum, default_value = "codes")]
    pub values: ValuesArg,

    /// Directory receiving the packaged export (default: ./export).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Submissions fetched per retrieval page.
    #[arg(long = "page-size", value_name = "N", default_value_t = 500)]
    pub page_size: usize,

    /// Reuse a working directory across invocations of the same export.
    #[arg(long = "workflow-id", value_name = "ID")]
    pub workflow_id: Option<String>,

    /// Export base name, used by legacy merged-file naming.
    #[arg(long = "base-name", value_name = "NAME", default_value = "export")]
    pub base_name: String,

    /// Name the merged data file after the base name instead of "Responses".
    #[arg(long = "legacy-merged-name")]
    pub legacy_merged_name: bool,

    /// Column model CSV (column,visible,header,fixed) restricting and
    /// renaming exported columns.
    #[arg(long = "column-model", value_name = "CSV")]
    pub column_model: Option<PathBuf>,
}

/// CLI export format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
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

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::CsvPerSection => ExportFormat::CsvPerSection,
            FormatArg::CsvSplitRepeating => ExportFormat::CsvSplitRepeating,
            FormatArg::CsvRowExpanded => ExportFormat::CsvRowExpanded,
            FormatArg::CsvColumnExpanded => ExportFormat::CsvColumnExpanded,
            FormatArg::CsvFlatLong => ExportFormat::CsvFlatLong,
            FormatArg::StatPerSection => ExportFormat::StatPerSection,
            FormatArg::StatSplitRepeating => ExportFormat::StatSplitRepeating,
            FormatArg::StatRowExpanded => ExportFormat::StatRowExpanded,
            FormatArg::StatColumnExpanded => ExportFormat::StatColumnExpanded,
            FormatArg::StatLong => ExportFormat::StatLong,
        }
    }
}

/// CLI naming verbosity choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum NamingArg {
    Short,
    Long,
}

impl From<NamingArg> for NameStyle {
    fn from(value: NamingArg) -> Self {
        match value {
            NamingArg::Short => NameStyle::Short,
            NamingArg::Long => NameStyle::Long,
        }
    }
}

/// CLI coded-value rendering choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum ValuesArg {
    Codes,
    Labels,
}

impl From<ValuesArg> for ValueRendering {
    fn from(value: ValuesArg) -> Self {
        match value {
            ValuesArg::Codes => ValueRendering::Codes,
            ValuesArg::Labels => ValueRendering::Labels,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
