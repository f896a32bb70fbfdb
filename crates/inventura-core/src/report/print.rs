//! Print document model and its HTML rendering.
//!
//! A [`PrintDocument`] is plain data: the caller decides whether to write it
//! to disk, hand it to a browser, or inspect it in tests.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::Write as _;

use super::{DocumentKind, cell_value, format_stamp, paginate};
use crate::config::ReportConfig;
use crate::model::InventoryRow;

/// One unit column: the unit label plus the printed value or placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitCell {
    pub label: String,
    pub value: String,
}

/// One table line. The column set is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintLine {
    pub sequence_code: String,
    pub item_number: String,
    pub status: String,
    pub description: String,
    pub units: [UnitCell; 3],
}

impl PrintLine {
    #[must_use]
    pub fn from_row(row: &InventoryRow, config: &ReportConfig) -> Self {
        let labels = row.unit_labels();
        let values = row.slot_values();
        Self {
            sequence_code: config.sequence_code.clone(),
            item_number: row.item_number().to_string(),
            status: config.status_literal.clone(),
            description: row.description().to_string(),
            units: [0, 1, 2].map(|slot| UnitCell {
                label: labels[slot].clone(),
                value: cell_value(values[slot]),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintPage {
    pub index: usize,
    pub total_pages: usize,
    /// Only the first page carries the title block.
    pub show_title: bool,
    pub lines: Vec<PrintLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintDocument {
    pub kind: DocumentKind,
    pub title: String,
    pub section_name: String,
    pub date: String,
    pub time: String,
    pub location_lines: Vec<String>,
    /// Count of the whole row set, shown on every page.
    pub item_count: usize,
    pub pages: Vec<PrintPage>,
}

impl PrintDocument {
    #[must_use]
    pub fn build(
        kind: DocumentKind,
        rows: &[InventoryRow],
        generated_at: NaiveDateTime,
        config: &ReportConfig,
    ) -> Self {
        let (date, time) = format_stamp(generated_at, config);
        let pages = paginate(rows, kind.page_size(config))
            .into_iter()
            .map(|page| PrintPage {
                index: page.index,
                total_pages: page.total_pages,
                show_title: page.is_first(),
                lines: page
                    .rows
                    .iter()
                    .map(|row| PrintLine::from_row(row, config))
                    .collect(),
            })
            .collect();

        Self {
            kind,
            title: kind.title(),
            section_name: config.section_name.clone(),
            date,
            time,
            location_lines: config.location_lines.clone(),
            item_count: rows.len(),
            pages,
        }
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Render the A4 print markup.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(4096 + self.item_count * 512);
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>{}</title>", escape_html(&self.title));
        out.push_str(PRINT_STYLE);
        out.push_str("</head>\n<body>\n");
        for page in &self.pages {
            self.write_page(&mut out, page);
        }
        out.push_str("</body>\n</html>\n");
        out
    }

    fn write_page(&self, out: &mut String, page: &PrintPage) {
        let page_label = format!("{} / {}", page.index, page.total_pages);
        out.push_str("<div class=\"page-container\">\n<div class=\"document-header\">\n");
        let _ = writeln!(
            out,
            "<div class=\"header-left\"><div>Dátum: <strong>{}</strong></div><div>Čas: <strong>{}</strong></div></div>",
            escape_html(&self.date),
            escape_html(&self.time)
        );
        out.push_str("<div class=\"header-center\">");
        for line in &self.location_lines {
            let _ = write!(out, "<div><strong>{}</strong></div>", escape_html(line));
        }
        out.push_str("</div>\n");
        let _ = writeln!(
            out,
            "<div class=\"header-right\"><div>Stránka <strong>{page_label}</strong></div><div>Rešt.: <strong>{}</strong></div></div>",
            self.item_count
        );
        out.push_str("</div>\n");

        if page.show_title {
            let _ = writeln!(
                out,
                "<div class=\"document-title\"><div class=\"title-main\">{}</div><div class=\"title-date\">{}</div></div>",
                escape_html(&self.title),
                escape_html(&self.date)
            );
            let _ = writeln!(
                out,
                "<div class=\"section-name\">{}</div>",
                escape_html(&self.section_name)
            );
        }

        out.push_str("<table class=\"document-table\">\n<thead><tr>");
        for heading in TABLE_HEADINGS {
            let _ = write!(out, "<th>{heading}</th>");
        }
        out.push_str("</tr></thead>\n<tbody>\n");
        for line in &page.lines {
            let _ = write!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
                escape_html(&line.sequence_code),
                escape_html(&line.item_number),
                escape_html(&line.status),
                escape_html(&line.description)
            );
            for cell in &line.units {
                let _ = write!(
                    out,
                    "<td><div class=\"unit-cell\"><span class=\"unit-label\">{}</span> <span class=\"unit-value\">{}</span></div></td>",
                    escape_html(&cell.label),
                    escape_html(&cell.value)
                );
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>\n");
        let _ = writeln!(
            out,
            "<div class=\"document-footer\">Stránka <strong>{page_label}</strong></div>"
        );
        out.push_str("</div>\n");
    }
}

const TABLE_HEADINGS: [&str; 7] = [
    "IL.",
    "Číslo položky",
    "Stav",
    "Popis",
    "Baliaca jednotka",
    "Čiastková jednotka",
    "Jednotka",
];

const PRINT_STYLE: &str = r"<style>
@page { size: A4; margin: 0.5cm; }
body { font-family: Arial, sans-serif; font-size: 12px; margin: 0; }
.page-container { padding: 1cm; page-break-after: always; }
.page-container:last-child { page-break-after: auto; }
.document-header { display: flex; justify-content: space-between; margin-bottom: 0.5rem; }
.header-center { text-align: center; }
.header-right { text-align: right; }
.document-title { text-align: center; margin: 0.5rem 0; }
.title-main { font-weight: bold; font-size: 14px; }
.section-name { font-weight: bold; margin: 0.5rem 0; }
.document-table { width: 100%; border-collapse: collapse; font-size: 11px; }
.document-table th, .document-table td { border: 1px solid #000; padding: 2px 4px; text-align: left; }
.unit-label { font-size: 10px; }
.unit-value { font-weight: bold; }
.document-footer { text-align: center; margin-top: 0.5rem; }
</style>
";

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
