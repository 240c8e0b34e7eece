//! Delimited-kind structural files: the codebook of coded values and the
//! flat questions listing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use survex_core::plan::FilePlan;
use survex_core::sanitize::sanitize;
use survex_model::{ColumnModel, ColumnRef, QuestionType, Result, SurveyCatalog};

use crate::StructuralFile;

pub const CODEBOOK_FILE_NAME: &str = "Code Book.csv";
pub const QUESTIONS_FILE_NAME: &str = "Questions.csv";

/// Write `Code Book.csv` and `Questions.csv` into the working directory.
pub fn write_delimited_files(
    plans: &[FilePlan],
    catalog: &SurveyCatalog,
    column_model: &ColumnModel,
    work_dir: &Path,
) -> Result<Vec<StructuralFile>> {
    let codebook_path = work_dir.join(CODEBOOK_FILE_NAME);
    let mut writer = BufWriter::new(File::create(&codebook_path)?);
    write_codebook(&mut writer, plans)?;
    writer.flush()?;

    let questions_path = work_dir.join(QUESTIONS_FILE_NAME);
    let mut writer = BufWriter::new(File::create(&questions_path)?);
    write_questions(&mut writer, catalog, column_model)?;
    writer.flush()?;

    Ok(vec![
        StructuralFile {
            file_name: CODEBOOK_FILE_NAME.to_string(),
            path: codebook_path,
        },
        StructuralFile {
            file_name: QUESTIONS_FILE_NAME.to_string(),
            path: questions_path,
        },
    ])
}

/// One row per coded value across every single- and multi-choice column.
pub fn write_codebook<W: Write>(writer: &mut W, plans: &[FilePlan]) -> Result<()> {
    writeln!(writer, "\"Question\",\"Variable\",\"Value\",\"Label\"")?;
    for plan in plans {
        for column in &plan.columns {
            let Some(binding) = column.question() else {
                continue;
            };
            match binding.question_type {
                QuestionType::Multiple => {
                    let question = binding.codebook_question.as_deref().unwrap_or_default();
                    let text = binding.option_text.as_deref().unwrap_or_default();
                    writeln!(
                        writer,
                        "\"{question}\",\"{}\",\"1\",\"Y - {text}\"",
                        column.header
                    )?;
                    writeln!(
                        writer,
                        "\"{question}\",\"{}\",\"0\",\"N - {text}\"",
                        column.header
                    )?;
                }
                QuestionType::Single => {
                    for option in &binding.options {
                        writeln!(
                            writer,
                            "\"{0}\",\"{0}\",\"{1}\",\"{2}\"",
                            column.header,
                            option.value,
                            sanitize(&option.text)
                        )?;
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Flat listing of every visible question in section order, with a
/// 1-based sequence number.
pub fn write_questions<W: Write>(
    writer: &mut W,
    catalog: &SurveyCatalog,
    column_model: &ColumnModel,
) -> Result<()> {
    writeln!(
        writer,
        "\"Question name\",\"#\",\"Section\",\"Question Id\",\"Question text\",\"Question type\""
    )?;
    let mut index = 1usize;
    for question in &catalog.questions {
        if question.section.is_none()
            || !column_model.is_visible(ColumnRef::Question(question.id))
        {
            continue;
        }
        let default_name = sanitize(&question.name);
        let name = sanitize(&column_model.header_for(ColumnRef::Question(question.id), &default_name));
        let section_title = question
            .section
            .and_then(|id| catalog.section(id))
            .map(|section| section.title.as_str())
            .unwrap_or_default();
        writeln!(
            writer,
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"",
            name,
            index,
            sanitize(section_title),
            question.id,
            sanitize(&question.label),
            question.question_type.as_str()
        )?;
        index += 1;
    }
    Ok(())
}
