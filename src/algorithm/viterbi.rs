//! The Viterbi recursion V(i, y) and backtrack (§4.6).
//!
//! ```text
//! V(-1, y) = 0
//! V(i, y)  = max_{d, y'} [ V(i-d, y') + wg(y', y, i, d) ]
//! ```
//!
//! Back-pointers (`duration`, `prev_label`) are stored alongside each `V`
//! entry so the optimal segmentation can be recovered by walking backward
//! from the best `(y, d)` at `i = n-1` without re-deriving it.

use crate::algorithm::Algorithm;
use crate::cache::{VTable, WgCache};
use crate::data::{Segment, Sequence};
use crate::error::{CrfError, Result};
use crate::label::Label;
use crate::numeric::FeatureVec;

/// The decoded best path for one sequence: its score and the segments that
/// achieve it, in left-to-right order.
pub struct ViterbiResult {
    pub score: f64,
    pub segments: Vec<Segment>,
}

impl<'a> Algorithm<'a> {
    pub fn viterbi(&self, data: &Sequence, cache: &mut WgCache) -> Result<ViterbiResult> {
        let n = data.len();
        if n == 0 {
            return Err(CrfError::Input("empty sequence".into()));
        }
        let mut table = VTable::new(self.labels().len(), n);
        let mut gs = FeatureVec::zeros(self.feature_dim());

        for i in 0..n {
            for y in self.labels().iter() {
                let mut best_v = f64::NEG_INFINITY;
                let mut best_d = 0usize;
                let mut best_prev = Label::ZERO;

                for d in 1..=self.max_duration_at(i) {
                    for y_prev in self.labels().iter() {
                        if i == 0 && y_prev != Label::ZERO {
                            continue;
                        }
                        let base = if d == i + 1 {
                            0.0
                        } else {
                            match table.get(i - d, y_prev) {
                                Some(entry) => entry.value,
                                None => continue,
                            }
                        };
                        let wg = self.wg(
                            cache,
                            data,
                            y.as_usize(),
                            y_prev.as_usize(),
                            i,
                            d,
                            &mut gs,
                        )?;
                        let v = base + wg;
                        if v > best_v {
                            best_v = v;
                            best_d = d;
                            best_prev = y_prev;
                        }
                    }
                }

                if best_d == 0 {
                    // The duration upper bound (`max_duration_at`) always
                    // admits `d = i + 1` with the base case `V(-1, ·) = 0`,
                    // so every `(i, y)` has at least one reachable
                    // predecessor. Reaching here means that invariant broke.
                    return Err(CrfError::Fatal(format!(
                        "V({i}, {y}) has no reachable predecessor"
                    )));
                }
                table.set(i, y, best_v, best_d, best_prev);
            }
        }

        let mut best_y = Label::ZERO;
        let mut best_v = f64::NEG_INFINITY;
        for y in self.labels().iter() {
            let entry = table
                .get(n - 1, y)
                .expect("every (n-1, y) slot is filled by the loop above");
            if entry.value > best_v {
                best_v = entry.value;
                best_y = y;
            }
        }

        let segments = backtrack(&table, n, best_y);
        Ok(ViterbiResult {
            score: best_v,
            segments,
        })
    }
}

fn backtrack(table: &VTable, n: usize, best_y: Label) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut i = n - 1;
    let mut y = best_y;

    loop {
        let entry = table.get(i, y).expect("visited position must be filled");
        let start = i + 1 - entry.duration;
        segments.push(Segment::new(start, i, y));

        if start == 0 {
            break;
        }
        let next_i = start - 1;
        let next_y = entry.prev_label;
        i = next_i;
        y = next_y;
    }

    segments.reverse();
    segments
}
