//! CSV export of a full, unpaginated row set.
//!
//! Output is UTF-8 with a leading byte-order mark, `\n` line endings, and
//! every field double-quoted (embedded quotes doubled).

use chrono::NaiveDateTime;
use serde::Serialize;

use super::{DocumentKind, cell_value, format_stamp};
use crate::config::ReportConfig;
use crate::model::InventoryRow;
use crate::numeric::format_quantity;

pub const BOM: &str = "\u{feff}";

const SHEET_HEADER: [&str; 10] = [
    "IL.",
    "Číslo položky",
    "Stav",
    "Popis",
    "Baliaca jednotka",
    "Hodnota J1",
    "Čiastková jednotka",
    "Hodnota J2",
    "Jednotka",
    "Hodnota J3",
];

const DETAILED_HEADER: [&str; 11] = [
    "Číslo položky",
    "Popis",
    "Baliaca jednotka",
    "Hodnota1",
    "Čiastková jednotka",
    "Hodnota2",
    "Jednotka",
    "Hodnota3",
    "Celkom",
    "Poznámka",
    "Uzamknuté",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvLayout {
    /// Mirrors the printed count sheet, with a title preamble.
    #[default]
    Sheet,
    /// Raw values, total, note, and lock state per row.
    Detailed,
}

/// Serialize `rows` in the given layout.
#[must_use]
pub fn to_csv(
    kind: DocumentKind,
    rows: &[InventoryRow],
    layout: CsvLayout,
    generated_at: NaiveDateTime,
    config: &ReportConfig,
) -> String {
    let mut out = String::from(BOM);
    match layout {
        CsvLayout::Sheet => {
            let (date, _) = format_stamp(generated_at, config);
            out.push_str(&kind.title());
            out.push('\n');
            out.push_str(&date);
            out.push_str("\n\n");
            out.push_str(&config.section_name);
            out.push_str("\n\n");
            push_record(&mut out, SHEET_HEADER.iter().copied());
            for row in rows {
                let [label1, label2, label3] = row.unit_labels();
                let fields = [
                    config.sequence_code.clone(),
                    row.item_number().to_string(),
                    config.status_literal.clone(),
                    row.description().to_string(),
                    label1.clone(),
                    cell_value(row.value1()),
                    label2.clone(),
                    cell_value(row.value2()),
                    label3.clone(),
                    cell_value(row.value3()),
                ];
                push_record(&mut out, fields.iter().map(String::as_str));
            }
        }
        CsvLayout::Detailed => {
            push_record(&mut out, DETAILED_HEADER.iter().copied());
            for row in rows {
                let [label1, label2, label3] = row.unit_labels();
                let fields = [
                    row.item_number().to_string(),
                    row.description().to_string(),
                    label1.clone(),
                    format_quantity(row.value1()),
                    label2.clone(),
                    format_quantity(row.value2()),
                    label3.clone(),
                    format_quantity(row.value3()),
                    format_quantity(row.total()),
                    row.note().to_string(),
                    if row.locked() { "Áno" } else { "Nie" }.to_string(),
                ];
                push_record(&mut out, fields.iter().map(String::as_str));
            }
        }
    }
    out
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
    out.push('\n');
}
