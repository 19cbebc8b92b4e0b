//! Weight vector and metadata, with JSON persistence (§4.7, §6.1).

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CrfError, Result};
use crate::label::Label;

/// Metadata persisted alongside the weight vector.
#[derive(Debug, Clone)]
pub struct WeightsMeta {
    pub x_dim: usize,
    pub y_dim: usize,
    pub feature: String,
    pub max_length: usize,
    pub mean: HashMap<Label, f64>,
    pub variance: HashMap<Label, f64>,
}

impl Default for WeightsMeta {
    fn default() -> Self {
        Self {
            x_dim: 0,
            y_dim: 0,
            feature: String::new(),
            max_length: 0,
            mean: HashMap::new(),
            variance: HashMap::new(),
        }
    }
}

/// The log-linear weight vector plus metadata. `dim = values.len()` and must
/// equal the feature function's `get_dim()` (invariant 1, §8).
#[derive(Debug, Clone)]
pub struct Weights {
    values: Vec<f64>,
    pub meta: WeightsMeta,
}

impl Weights {
    pub fn zeros(dim: usize) -> Self {
        Self {
            values: vec![0.0; dim],
            meta: WeightsMeta::default(),
        }
    }

    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(CrfError::Input("empty weights".into()));
        }
        Ok(Self {
            values,
            meta: WeightsMeta::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn set_from_slice(&mut self, x: &[f64]) {
        self.values.copy_from_slice(x);
    }

    pub fn l2_norm_sq(&self) -> f64 {
        self.values.iter().map(|w| w * w).sum()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let file: WeightsFile = serde_json::from_str(&text)?;
        file.into_weights()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = WeightsFile::from_weights(self);
        let json = serde_json::to_string_pretty(&file)?;
        let mut f = std::fs::File::create(path)?;
        f.write_all(json.as_bytes())?;
        f.write_all(b"\n")?;
        Ok(())
    }
}

/// The self-describing on-disk JSON shape (§4.7, §6.1). Field names and
/// nesting match the original `Weights::writeJson`/`readJson` exactly.
#[derive(Debug, Serialize, Deserialize)]
struct WeightsFile {
    title: String,
    dimension: [usize; 2],
    feature: String,
    max_length: usize,
    mean: Vec<(u16, f64)>,
    variance: Vec<(u16, f64)>,
    weights: Vec<f64>,
}

impl WeightsFile {
    fn from_weights(w: &Weights) -> Self {
        let mut mean: Vec<(u16, f64)> = w.meta.mean.iter().map(|(l, v)| (l.0, *v)).collect();
        mean.sort_by_key(|(l, _)| *l);
        let mut variance: Vec<(u16, f64)> =
            w.meta.variance.iter().map(|(l, v)| (l.0, *v)).collect();
        variance.sort_by_key(|(l, _)| *l);
        Self {
            title: "Semi-CRF Weights".to_string(),
            dimension: [w.meta.x_dim, w.meta.y_dim],
            feature: w.meta.feature.clone(),
            max_length: w.meta.max_length,
            mean,
            variance,
            weights: w.values.clone(),
        }
    }

    fn into_weights(self) -> Result<Weights> {
        if self.weights.is_empty() {
            return Err(CrfError::Input("empty weights".into()));
        }
        let mean = self.mean.into_iter().map(|(l, v)| (Label(l), v)).collect();
        let variance = self
            .variance
            .into_iter()
            .map(|(l, v)| (Label(l), v))
            .collect();
        Ok(Weights {
            values: self.weights,
            meta: WeightsMeta {
                x_dim: self.dimension[0],
                y_dim: self.dimension[1],
                feature: self.feature,
                max_length: self.max_length,
                mean,
                variance,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_weights_rejected() {
        assert!(Weights::from_values(vec![]).is_err());
    }

    #[test]
    fn round_trip_preserves_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.json");

        let mut w = Weights::from_values(vec![0.5, -0.25, 1.0]).unwrap();
        w.meta.x_dim = 4;
        w.meta.y_dim = 2;
        w.meta.feature = "DIGIT".to_string();
        w.meta.max_length = 5;
        w.meta.mean.insert(Label::new(1), 3.2);
        w.meta.variance.insert(Label::new(1), 0.8);

        w.save(&path).unwrap();
        let loaded = Weights::load(&path).unwrap();

        assert_eq!(loaded.as_slice(), w.as_slice());
        assert_eq!(loaded.meta.x_dim, 4);
        assert_eq!(loaded.meta.y_dim, 2);
        assert_eq!(loaded.meta.feature, "DIGIT");
        assert_eq!(loaded.meta.max_length, 5);
        assert_eq!(loaded.meta.mean.get(&Label::new(1)), Some(&3.2));
    }

    #[test]
    fn save_is_newline_terminated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let w = Weights::from_values(vec![1.0]).unwrap();
        w.save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(*bytes.last().unwrap(), b'\n');
    }

    #[test]
    fn load_rejects_empty_weights_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(
            &path,
            r#"{"title":"x","dimension":[1,1],"feature":"DIGIT","max_length":1,"mean":[],"variance":[],"weights":[]}"#,
        )
        .unwrap();
        assert!(Weights::load(&path).is_err());
    }
}
