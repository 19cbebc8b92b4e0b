//! Sequence (Data), TokenRow, Segment, and per-label duration statistics.
//!
//! Ground truth: §3 of the spec.

use std::collections::HashMap;

use crate::error::{CrfError, Result};
use crate::label::Label;

/// One row of token attributes; the last column is the surface token.
pub type TokenRow = Vec<String>;

/// A closed, labeled span `[start, end]`. `duration = end - start + 1`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub label: Label,
}

impl Segment {
    pub fn new(start: usize, end: usize, label: Label) -> Self {
        Self { start, end, label }
    }

    pub fn duration(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Per-label duration statistics, used by duration-shape features.
#[derive(Debug, Clone, Default)]
pub struct DurationStats {
    mean: HashMap<Label, f64>,
    variance: HashMap<Label, f64>,
}

impl DurationStats {
    pub fn new(mean: HashMap<Label, f64>, variance: HashMap<Label, f64>) -> Self {
        Self { mean, variance }
    }

    pub fn mean(&self, label: Label) -> f64 {
        self.mean.get(&label).copied().unwrap_or(0.0)
    }

    pub fn variance(&self, label: Label) -> f64 {
        self.variance.get(&label).copied().unwrap_or(0.0)
    }

    pub fn mean_map(&self) -> &HashMap<Label, f64> {
        &self.mean
    }

    pub fn variance_map(&self) -> &HashMap<Label, f64> {
        &self.variance
    }
}

/// One sequence: its token rows, its ground-truth segmentation (training
/// only), and the duration statistics shared across the dataset.
#[derive(Debug, Clone)]
pub struct Sequence {
    rows: Vec<TokenRow>,
    segments: Option<Vec<Segment>>,
    duration_stats: DurationStats,
}

impl Sequence {
    pub fn new(rows: Vec<TokenRow>) -> Self {
        Self {
            rows,
            segments: None,
            duration_stats: DurationStats::default(),
        }
    }

    pub fn with_segments(mut self, segments: Vec<Segment>) -> Result<Self> {
        validate_cover(&segments, self.rows.len())?;
        self.segments = Some(segments);
        Ok(self)
    }

    pub fn with_duration_stats(mut self, stats: DurationStats) -> Self {
        self.duration_stats = stats;
        self
    }

    pub fn rows(&self) -> &[TokenRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn segments(&self) -> Option<&[Segment]> {
        self.segments.as_deref()
    }

    pub fn duration_stats(&self) -> &DurationStats {
        &self.duration_stats
    }

    pub fn set_segments(&mut self, segments: Vec<Segment>) {
        self.segments = Some(segments);
    }
}

/// Checks invariant 2 (§8): the cover is contiguous, starts at 0, ends at
/// `len - 1`, and every duration is at least 1.
pub fn validate_cover(segments: &[Segment], len: usize) -> Result<()> {
    if segments.is_empty() {
        return Err(CrfError::Input("empty segmentation".into()));
    }
    if segments[0].start != 0 {
        return Err(CrfError::Input(format!(
            "segmentation must start at 0, got {}",
            segments[0].start
        )));
    }
    for pair in segments.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start != prev.end + 1 {
            return Err(CrfError::Input(format!(
                "segments must be contiguous: {:?} followed by {:?}",
                prev, next
            )));
        }
    }
    let last = segments.last().expect("checked non-empty above");
    if last.end + 1 != len {
        return Err(CrfError::Input(format!(
            "segmentation must cover the full sequence: last end {} but len {}",
            last.end, len
        )));
    }
    for seg in segments {
        if seg.duration() == 0 {
            return Err(CrfError::Input("zero-duration segment".into()));
        }
    }
    Ok(())
}

/// A collection of sequences sharing `x_dim`/`y_dim`/feature name/duration
/// statistics, as read from one corpus file (§6.2).
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    pub x_dim: usize,
    pub y_dim: usize,
    pub feature: String,
    pub sequences: Vec<Sequence>,
}

impl DataSet {
    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: usize, end: usize, label: u16) -> Segment {
        Segment::new(start, end, Label::new(label))
    }

    #[test]
    fn valid_cover_passes() {
        let segs = vec![seg(0, 1, 0), seg(2, 2, 1)];
        assert!(validate_cover(&segs, 3).is_ok());
    }

    #[test]
    fn gap_is_rejected() {
        let segs = vec![seg(0, 0, 0), seg(2, 2, 1)];
        assert!(validate_cover(&segs, 3).is_err());
    }

    #[test]
    fn must_start_at_zero() {
        let segs = vec![seg(1, 2, 0)];
        assert!(validate_cover(&segs, 3).is_err());
    }

    #[test]
    fn must_cover_full_length() {
        let segs = vec![seg(0, 1, 0)];
        assert!(validate_cover(&segs, 3).is_err());
    }

    #[test]
    fn segment_duration() {
        assert_eq!(seg(2, 4, 0).duration(), 3);
    }
}
