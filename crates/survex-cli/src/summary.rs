use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use survex_cli::types::ExportRunResult;

pub fn print_summary(result: &ExportRunResult) {
    println!("Survey: {}", result.survey_id);
    println!("Format: {}", result.format);
    println!("Output: {}", result.output_dir.display());
    println!(
        "Submissions: {} ({} page{})",
        result.submissions,
        result.pages,
        if result.pages == 1 { "" } else { "s" }
    );

    let mut table = Table::new();
    table.set_header(vec!["File", "Kind", "Columns"]);
    apply_table_style(&mut table);
    if let Some(column) = table.column_mut(2) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    for file in &result.data_files {
        table.add_row(vec![
            Cell::new(&file.file_name),
            Cell::new("data"),
            Cell::new(file.columns),
        ]);
    }
    for name in &result.structural_files {
        table.add_row(vec![
            Cell::new(name),
            Cell::new("structural"),
            Cell::new("-"),
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}
