//! Corpus file parsing — a thin external-interface adapter, not part of the
//! specified Semi-CRF core. Training/inference data is read from one JSON
//! file (§6.2) into the core's `DataSet`/`Sequence` types.
//!
//! This module owns its own error type rather than folding into
//! [`crate::error::CrfError`], since it is a separate, replaceable
//! collaborator (the spec explicitly places "corpus parsing from JSON"
//! out of scope for the core, §1).

mod schema;

use std::collections::HashMap;
use std::path::Path;

use statrs::statistics::Statistics;
use thiserror::Error;

use crate::data::{DataSet, DurationStats, Segment, Sequence};
use crate::label::Label;

use schema::{CorpusFile, OutputEntry, OutputFile, OutputPage, SequenceEntry};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed corpus JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corpus error: {0}")]
    Malformed(String),
}

type Result<T> = std::result::Result<T, CorpusError>;

/// Reads a corpus file (§6.2). `require_segments` should be `true` when
/// loading training data and `false` for plain inference input.
pub fn load(path: &Path, require_segments: bool) -> Result<DataSet> {
    let text = std::fs::read_to_string(path)?;
    let file: CorpusFile = serde_json::from_str(&text)?;

    if file.dimension.len() != 2 {
        return Err(CorpusError::Malformed(
            "dimension must be a [xDim, yDim] pair".into(),
        ));
    }
    let x_dim = file.dimension[0];
    let y_dim = file.dimension[1];

    let mut raw_sequences: Vec<SequenceEntry> = Vec::new();
    for page in &file.pages {
        raw_sequences.extend(page.data.iter().cloned());
    }
    if raw_sequences.is_empty() {
        return Err(CorpusError::Malformed("corpus has no sequences".into()));
    }

    let duration_stats = if require_segments {
        fit_duration_stats(&raw_sequences)?
    } else {
        DurationStats::default()
    };

    let mut sequences = Vec::with_capacity(raw_sequences.len());
    for entry in raw_sequences {
        let mut seq = Sequence::new(entry.rows).with_duration_stats(duration_stats.clone());
        if let Some(raw_segments) = entry.segments {
            let segments: std::result::Result<Vec<Segment>, CorpusError> = raw_segments
                .into_iter()
                .map(|[start, end, label]| {
                    Ok(Segment::new(start as usize, end as usize, Label::new(label as u16)))
                })
                .collect();
            seq = seq
                .with_segments(segments?)
                .map_err(|e| CorpusError::Malformed(e.to_string()))?;
        } else if require_segments {
            return Err(CorpusError::Malformed(
                "training sequence is missing ground-truth segments".into(),
            ));
        }
        sequences.push(seq);
    }

    Ok(DataSet {
        x_dim,
        y_dim,
        feature: file.feature,
        sequences,
    })
}

/// Writes a decoded `DataSet` (every sequence must carry `segments`, as
/// `Predictor::compute` leaves them) to `path` in the same page-oriented
/// JSON shape corpus files are read from (§6.2).
pub fn write_predictions(dataset: &DataSet, path: &Path) -> Result<()> {
    let mut data = Vec::with_capacity(dataset.len());
    for seq in &dataset.sequences {
        let segments = seq
            .segments()
            .ok_or_else(|| CorpusError::Malformed("predicted sequence has no segments".into()))?;
        let triples = segments
            .iter()
            .map(|s| [s.start as i64, s.end as i64, s.label.as_usize() as i64])
            .collect();
        data.push(OutputEntry {
            rows: seq.rows().to_vec(),
            segments: triples,
        });
    }

    let file = OutputFile {
        feature: dataset.feature.clone(),
        dimension: vec![dataset.x_dim, dataset.y_dim],
        pages: vec![OutputPage {
            title: "predictions".to_string(),
            data,
        }],
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Fits per-label duration mean/variance from the gold segments across all
/// sequences, using `statrs`'s `Statistics` extension over the sample
/// durations collected per label.
fn fit_duration_stats(entries: &[SequenceEntry]) -> Result<DurationStats> {
    let mut durations_by_label: HashMap<Label, Vec<f64>> = HashMap::new();

    for entry in entries {
        let Some(segments) = &entry.segments else {
            continue;
        };
        for [start, end, label] in segments {
            let duration = (*end as f64) - (*start as f64) + 1.0;
            durations_by_label
                .entry(Label::new(*label as u16))
                .or_default()
                .push(duration);
        }
    }

    let mut mean = HashMap::new();
    let mut variance = HashMap::new();
    for (label, samples) in durations_by_label {
        mean.insert(label, samples.clone().mean());
        variance.insert(label, samples.population_variance());
    }
    Ok(DurationStats::new(mean, variance))
}
