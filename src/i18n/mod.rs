//! Internationalization (i18n) support for complaint-lens
//!
//! Rendered reports, console summaries and error descriptions are available in
//! English (en) and Russian (ru). Category labels are not translated; they come
//! from configuration as written.
//!
//! # Environment Variables
//!
//! - `COMPLAINT_LENS_LANG`: Set the preferred language (en, ru). Defaults to English.
//!
//! # Usage
//!
//! ```rust,ignore
//! use complaint_lens::i18n::{t, set_locale};
//!
//! set_locale("ru");
//! let heading = t!("report.summary");
//! ```

// Note: rust_i18n::i18n! macro is declared in lib.rs (crate root)

/// Set the current locale for translations
///
/// # Arguments
///
/// * `locale` - Language code (en, ru) or a variant such as `ru_RU.UTF-8`
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(normalize_locale(locale));
}

/// Get the current locale
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// Initialize i18n from environment variables
///
/// Reads `COMPLAINT_LENS_LANG` to set the locale.
/// Falls back to English if not set or unknown.
pub fn init_from_env() {
    let locale = std::env::var("COMPLAINT_LENS_LANG").unwrap_or_else(|_| "en".to_string());
    set_locale(&locale);
}

/// Normalize locale code to supported format
///
/// - ru-RU, ru_RU.UTF-8, russian -> ru
/// - everything else -> en
fn normalize_locale(locale: &str) -> &'static str {
    let lower = locale.to_lowercase();

    if lower.starts_with("ru") || lower == "russian" {
        "ru"
    } else {
        "en"
    }
}

/// Translate a key with optional parameters
///
/// This is a re-export of rust_i18n::t! for convenience.
///
/// ```rust,ignore
/// use complaint_lens::i18n::t;
///
/// let msg = t!("errors.column_not_found", column = "Текст");
/// ```
#[doc(inline)]
pub use rust_i18n::t;

/// Labels printed by the command-line front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLabel {
    Export,
    Report,
    Json,
    Sheets,
    Records,
    Columns,
    Filled,
    More,
    MatchMode,
    Sheet,
    Keywords,
}

impl ConsoleLabel {
    /// Label text in the current locale
    pub fn localized(&self) -> String {
        match self {
            Self::Export => t!("console.export").to_string(),
            Self::Report => t!("console.report").to_string(),
            Self::Json => t!("console.json").to_string(),
            Self::Sheets => t!("console.sheets").to_string(),
            Self::Records => t!("console.records").to_string(),
            Self::Columns => t!("console.columns").to_string(),
            Self::Filled => t!("console.filled").to_string(),
            Self::More => t!("console.more").to_string(),
            Self::MatchMode => t!("console.match_mode").to_string(),
            Self::Sheet => t!("console.sheet").to_string(),
            Self::Keywords => t!("console.keywords").to_string(),
        }
    }
}
