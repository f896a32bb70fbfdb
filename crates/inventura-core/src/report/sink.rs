//! Artifact sinks: where rendered documents and exports end up.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{ArtifactFormat, PrintDocument, file_name};

/// Narrow side-effect boundary for the report generator.
pub trait ArtifactSink {
    /// Hand a print document to whatever surface renders it.
    fn render_document(&mut self, document: &PrintDocument, name: &str) -> Result<PathBuf>;

    /// Deliver a finished file.
    fn download_file(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn render_document(&mut self, document: &PrintDocument, name: &str) -> Result<PathBuf> {
        self.download_file(name, document.to_html().as_bytes())
    }

    fn download_file(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(path)
    }
}

/// One captured artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Collects artifacts in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub documents: Vec<PrintDocument>,
    pub files: Vec<Artifact>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactSink for MemorySink {
    fn render_document(&mut self, document: &PrintDocument, name: &str) -> Result<PathBuf> {
        self.documents.push(document.clone());
        Ok(PathBuf::from(name))
    }

    fn download_file(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.files.push(Artifact {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(PathBuf::from(name))
    }
}

/// Default name for a rendered print document.
#[must_use]
pub fn document_file_name(document: &PrintDocument, date: chrono::NaiveDate) -> String {
    file_name(document.kind, date, ArtifactFormat::Html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::model::Cadence;
    use crate::report::DocumentKind;
    use chrono::NaiveDate;

    fn document() -> PrintDocument {
        let at = NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("valid timestamp");
        PrintDocument::build(
            DocumentKind::CountSheet(Cadence::Monthly),
            &[],
            at,
            &ReportConfig::default(),
        )
    }

    #[test]
    fn directory_sink_writes_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sink = DirectorySink::new(dir.path().join("exports"));
        let path = sink.download_file("a.csv", b"\"x\"\n").expect("write");
        assert_eq!(fs::read(&path).expect("read"), b"\"x\"\n");

        let doc = document();
        let name = document_file_name(&doc, NaiveDate::from_ymd_opt(2025, 6, 1).expect("date"));
        assert_eq!(name, "inventura_monthly_2025-06-01.html");
        let html_path = sink.render_document(&doc, &name).expect("render");
        assert!(fs::read_to_string(html_path).expect("read").starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn memory_sink_captures_everything() {
        let mut sink = MemorySink::new();
        sink.render_document(&document(), "doc.html").expect("render");
        sink.download_file("a.csv", b"abc").expect("download");
        assert_eq!(sink.documents.len(), 1);
        assert_eq!(sink.files[0].name, "a.csv");
    }
}
