//! Report generator: pagination, print documents, CSV export.
//!
//! Everything here is a pure transformation from rows to an artifact. The
//! only side effects go through an [`ArtifactSink`].

pub mod csv;
pub mod paginate;
pub mod print;
pub mod sink;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::config::ReportConfig;
use crate::model::Cadence;

pub use csv::{CsvLayout, to_csv};
pub use paginate::{Page, paginate};
pub use print::{PrintDocument, PrintLine, PrintPage, UnitCell};
pub use sink::{Artifact, ArtifactSink, DirectorySink, MemorySink, document_file_name};

/// Substituted for any zero or unset quantity in printed/exported output.
pub const PLACEHOLDER: &str = "----";

/// Document families. Each has its own page size; callers never mix them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "cadence")]
pub enum DocumentKind {
    CountSheet(Cadence),
    MaterialsList,
}

impl DocumentKind {
    #[must_use]
    pub const fn page_size(self, config: &ReportConfig) -> usize {
        match self {
            Self::CountSheet(_) => config.count_sheet_page_size,
            Self::MaterialsList => config.materials_page_size,
        }
    }

    /// Label embedded in artifact file names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CountSheet(cadence) => cadence.as_str(),
            Self::MaterialsList => "materials",
        }
    }

    /// Title printed on the first page and in the CSV preamble.
    #[must_use]
    pub fn title(self) -> String {
        match self {
            Self::CountSheet(cadence) => {
                let period = match cadence {
                    Cadence::Daily => "Deň",
                    Cadence::Weekly => "Týždeň",
                    Cadence::Monthly => "Mesiac",
                };
                format!("Formulár inventúry / {period} (Dynamický) / Umiestnenie všetkých položiek")
            }
            Self::MaterialsList => "Zoznam materiálov / Všetky inventúry".to_string(),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Artifact extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Csv,
    Html,
}

impl ArtifactFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }
}

/// Deterministic artifact name: `inventura_<label>_<YYYY-MM-DD>.<ext>`.
#[must_use]
pub fn file_name(kind: DocumentKind, date: NaiveDate, format: ArtifactFormat) -> String {
    format!(
        "inventura_{}_{}.{}",
        kind.label(),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Date and time strings as printed in headers. An invalid configured
/// pattern falls back to the built-in one.
#[must_use]
pub fn format_stamp(at: NaiveDateTime, config: &ReportConfig) -> (String, String) {
    (
        render_pattern(at, &config.date_format, "%-d. %-m. %Y"),
        render_pattern(at, &config.time_format, "%H:%M:%S"),
    )
}

fn render_pattern(at: NaiveDateTime, pattern: &str, fallback: &str) -> String {
    let items = StrftimeItems::new(pattern);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        warn!(pattern, "invalid report date pattern; using default");
        return at.format(fallback).to_string();
    }
    at.format_with_items(items).to_string()
}

/// Printed form of one quantity cell.
#[must_use]
pub fn cell_value(value: f64) -> String {
    if value > 0.0 {
        crate::numeric::format_quantity(value)
    } else {
        PLACEHOLDER.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 7)
            .and_then(|d| d.and_hms_opt(8, 5, 9))
            .expect("valid timestamp")
    }

    #[test]
    fn file_name_embeds_label_and_iso_date() {
        let date = at().date();
        assert_eq!(
            file_name(DocumentKind::CountSheet(Cadence::Weekly), date, ArtifactFormat::Csv),
            "inventura_weekly_2025-03-07.csv"
        );
        assert_eq!(
            file_name(DocumentKind::MaterialsList, date, ArtifactFormat::Html),
            "inventura_materials_2025-03-07.html"
        );
    }

    #[test]
    fn stamp_uses_configured_formats() {
        let (date, time) = format_stamp(at(), &ReportConfig::default());
        assert_eq!(date, "7. 3. 2025");
        assert_eq!(time, "08:05:09");
    }

    #[test]
    fn invalid_pattern_falls_back() {
        let config = ReportConfig {
            date_format: "%Q".into(),
            ..ReportConfig::default()
        };
        assert_eq!(format_stamp(at(), &config).0, "7. 3. 2025");
    }

    #[test]
    fn zero_and_negative_cells_use_placeholder() {
        assert_eq!(cell_value(0.0), PLACEHOLDER);
        assert_eq!(cell_value(-2.0), PLACEHOLDER);
        assert_eq!(cell_value(3.0), "3");
        assert_eq!(cell_value(1.5), "1.5");
    }

    #[test]
    fn page_size_follows_document_kind() {
        let config = ReportConfig::default();
        assert_eq!(DocumentKind::CountSheet(Cadence::Daily).page_size(&config), 35);
        assert_eq!(DocumentKind::MaterialsList.page_size(&config), 25);
    }
}
