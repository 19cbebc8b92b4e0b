//! The on-disk JSON shape for corpus files (§6.2).

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CorpusFile {
    pub feature: String,
    pub dimension: Vec<usize>,
    #[serde(default)]
    pub labels: Vec<LabelDescriptor>,
    pub pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
pub struct LabelDescriptor {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: String,
    pub data: Vec<SequenceEntry>,
}

/// One sequence entry: its rows, and (training data only) its gold
/// segmentation as `[start, end, label]` triples — the crate's own choice
/// for a detail the spec leaves unsaid (see DESIGN.md).
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceEntry {
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub segments: Option<Vec<[i64; 3]>>,
}

/// Mirrors `CorpusFile`/`Page`/`SequenceEntry` but for writing a predicted
/// dataset back out, always carrying `segments` (the decoded path rather
/// than ground truth).
#[derive(Debug, Serialize)]
pub struct OutputFile {
    pub feature: String,
    pub dimension: Vec<usize>,
    pub pages: Vec<OutputPage>,
}

#[derive(Debug, Serialize)]
pub struct OutputPage {
    pub title: String,
    pub data: Vec<OutputEntry>,
}

#[derive(Debug, Serialize)]
pub struct OutputEntry {
    pub rows: Vec<Vec<String>>,
    pub segments: Vec<[i64; 3]>,
}
