use anyhow::Result;

use complaint_lens::config::Config;
use complaint_lens::i18n::ConsoleLabel;

pub fn categories(config: &Config) -> Result<()> {
    let categories = config.build_categories()?;

    println!(
        "{}: {}",
        ConsoleLabel::MatchMode.localized(),
        config.analysis.match_mode
    );
    for category in &categories {
        println!();
        println!("{} [{}]", category.label(), category.name());
        println!("  {}: {}", ConsoleLabel::Sheet.localized(), category.sheet_name());
        println!(
            "  {}: {}",
            ConsoleLabel::Keywords.localized(),
            category.keywords().join(", ")
        );
    }

    Ok(())
}
