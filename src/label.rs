//! Label: a small 0-based enumeration value with a distinguished ZERO.

use std::fmt;

/// A segmentation label. 0-based, dense over `0..y_dim`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Label(pub u16);

impl Label {
    /// The conventional "prior label before position 0" — required so that
    /// `y_prev` is well-defined at the recursion boundary.
    pub const ZERO: Label = Label(0);

    pub fn new(value: u16) -> Self {
        Label(value)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Label {
    fn from(value: u16) -> Self {
        Label(value)
    }
}

/// The closed set of labels `0..y_dim`, in iteration order.
#[derive(Debug, Clone)]
pub struct Labels {
    y_dim: u16,
}

impl Labels {
    pub fn new(y_dim: usize) -> Self {
        Self {
            y_dim: y_dim as u16,
        }
    }

    pub fn len(&self) -> usize {
        self.y_dim as usize
    }

    pub fn is_empty(&self) -> bool {
        self.y_dim == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        (0..self.y_dim).map(Label)
    }
}
