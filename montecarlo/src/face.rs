use serde::{Deserialize, Serialize};
use std::{
    cmp, fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

/// Anything that can label a die face. Faces are identifiers (so `Eq + Hash`)
/// and get sorted into canonical combinations (so `Ord`).
pub trait Face: Clone + Ord + Hash + fmt::Debug {}

impl<T> Face for T where T: Clone + Ord + Hash + fmt::Debug {}

/// A scalar face label: an integer, a float, or a short text token.
///
/// `f64` has no total order, so `FaceValue` supplies one: numbers compare by
/// value (an `Int` sorts before a `Float` of equal value), and all numbers sort
/// before text. `Eq` and `Hash` agree with that ordering.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FaceValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FaceValue {
    fn variant_rank(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(x) => Some(x as f64),
            Self::Float(x) => Some(x),
            Self::Text(_) => None,
        }
    }
}

impl cmp::PartialEq for FaceValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == cmp::Ordering::Equal
    }
}

impl cmp::Eq for FaceValue {}

impl cmp::PartialOrd for FaceValue {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl cmp::Ord for FaceValue {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a
                    .total_cmp(&b)
                    .then_with(|| self.variant_rank().cmp(&other.variant_rank())),
                _ => self.variant_rank().cmp(&other.variant_rank()),
            },
        }
    }
}

impl Hash for FaceValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_rank().hash(state);
        match self {
            Self::Int(x) => x.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
        }
    }
}

impl From<i64> for FaceValue {
    fn from(x: i64) -> Self {
        Self::Int(x)
    }
}

impl From<f64> for FaceValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for FaceValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FaceValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Parse a face label. Tries an integer first, then a finite float, and falls
/// back to a text token.
impl FromStr for FaceValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("face label can't be empty".to_owned());
        }

        if let Ok(x) = s.parse::<i64>() {
            return Ok(Self::Int(x));
        }

        match s.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Self::Float(x)),
            _ => Ok(Self::Text(s.to_owned())),
        }
    }
}

impl fmt::Display for FaceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{x}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

///////////
// Tests //
///////////
