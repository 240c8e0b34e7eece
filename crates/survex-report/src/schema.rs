//! Stat-package schema (`.stsd`) files: one per data file, declaring the
//! encoding, the delimiter dialect and every column with its final width
//! and numeric statistics, plus shared value-label dictionaries.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use survex_core::plan::{Column, ColumnType, FilePlan};
use survex_core::sanitize::{is_all_digits, schema_label};
use survex_core::value_labels::{ValueLabelPair, ValueLabelRegistry};
use survex_model::{QuestionType, Result, SurveyId};

use crate::StructuralFile;

/// Write one `.stsd` schema file next to each data file.
pub fn write_schema_files(
    survey: SurveyId,
    plans: &[FilePlan],
    work_dir: &Path,
) -> Result<Vec<StructuralFile>> {
    let mut files = Vec::with_capacity(plans.len());
    for plan in plans {
        let stem = Path::new(&plan.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&plan.file_name);
        let file_name = format!("{stem}.stsd");
        let path = work_dir.join(&file_name);
        let mut writer = BufWriter::new(File::create(&path)?);
        write_schema(&mut writer, survey, plan)?;
        writer.flush()?;
        files.push(StructuralFile { file_name, path });
    }
    Ok(files)
}

/// Write the schema for one data file.
pub fn write_schema<W: Write>(writer: &mut W, survey: SurveyId, plan: &FilePlan) -> Result<()> {
    writeln!(writer, "ENCODING UTF-8")?;
    writeln!(writer)?;
    writeln!(writer, "FORMAT delimited commas")?;
    writeln!(writer)?;
    writeln!(writer, "FIRST LINE 2")?;
    writeln!(writer)?;
    writeln!(writer, "VARIABLES")?;

    // Value-label tags are scoped per file: section id for section files,
    // the logical file name otherwise.
    let scope = plan
        .section
        .map(|section| section.to_string())
        .unwrap_or_else(|| plan.name.clone());
    let mut registry = ValueLabelRegistry::new(survey, &scope);
    let tags: Vec<Option<String>> = plan
        .columns
        .iter()
        .map(|column| {
            label_candidate(column)
                .filter(|pairs| !pairs.is_empty())
                .map(|pairs| registry.intern(pairs))
        })
        .collect();

    for (column, tag) in plan.columns.iter().zip(&tags) {
        let code = type_code(column);
        match (column.question(), tag) {
            (Some(binding), Some(tag)) => writeln!(
                writer,
                "\t\"{}\"\t({})\t{{{}}}\t\\{}",
                column.header,
                code,
                schema_label(&binding.label),
                tag
            )?,
            (Some(binding), None) => writeln!(
                writer,
                "\t\"{}\"\t({})\t{{{}}}",
                column.header,
                code,
                schema_label(&binding.label)
            )?,
            (None, _) => writeln!(writer, "\t\"{}\"\t({})", column.header, code)?,
        }
    }

    if !registry.sets().is_empty() {
        writeln!(writer)?;
        writeln!(writer, "VALUE LABELS")?;
        for set in registry.sets() {
            writeln!(writer, "\t\\{}", set.tag)?;
            for pair in &set.pairs {
                writeln!(writer, "\t\t{}\t\"{}\"", pair.value, pair.label)?;
            }
        }
    }
    Ok(())
}

/// Candidate value-label pairs for a coded column. Multi-choice columns
/// always carry the fixed Y/N pair; single-choice columns qualify only
/// when every written value stayed numeric.
fn label_candidate(column: &Column) -> Option<Vec<ValueLabelPair>> {
    let binding = column.question()?;
    match binding.question_type {
        QuestionType::Multiple => {
            let text = binding.option_text.as_deref().unwrap_or_default();
            Some(vec![
                ValueLabelPair::new("1", format!("Y - {text}")),
                ValueLabelPair::new("0", format!("N - {text}")),
            ])
        }
        QuestionType::Single if column.all_numeric => Some(
            binding
                .options
                .iter()
                .filter(|option| is_all_digits(&option.value))
                .map(|option| ValueLabelPair::new(option.value.clone(), option.text.clone()))
                .collect(),
        ),
        _ => None,
    }
}

/// Declared type: `F` for numeric and coded-numeric columns, `A<width>`
/// for text, or a date/time pattern.
fn type_code(column: &Column) -> String {
    if let Some(binding) = column.question()
        && binding.question_type == QuestionType::Single
        && column.all_numeric
    {
        return "F".to_string();
    }
    match column.column_type {
        ColumnType::Text => format!("A{}", column.width),
        ColumnType::Numeric => "F".to_string(),
        ColumnType::LongDate => "%d-%m-%Y %H:%M:%S".to_string(),
        ColumnType::ShortDate => "%d-%m-%Y".to_string(),
        ColumnType::Time => "%H:%M".to_string(),
    }
}
