use anyhow::{Context, Result};
use std::path::Path;

use complaint_lens::i18n::ConsoleLabel;
use complaint_lens::storage::{self, InputFormat};

pub fn columns(input: &Path, sheet: Option<&str>) -> Result<()> {
    if InputFormat::from_path(input)? == InputFormat::Spreadsheet {
        let sheets = storage::list_sheets(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        println!("{}: {}", ConsoleLabel::Sheets.localized(), sheets.join(", "));
    }

    let dataset = storage::load_dataset(input, sheet)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let filled_label = ConsoleLabel::Filled.localized();
    println!("{}: {}", ConsoleLabel::Records.localized(), dataset.len());
    println!("{}:", ConsoleLabel::Columns.localized());
    for (i, name) in dataset.columns().iter().enumerate() {
        let filled = dataset
            .column_values(i)
            .filter(|cell| !cell.is_empty())
            .count();
        println!("  {:>3}. {name} ({filled} {filled_label})", i + 1);
    }

    Ok(())
}
