use crate::{die::Die, face::FaceValue};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

const SPLITTERS: &[char] = &[',', ' ', '\n', '\t'];

/// Strip the optional surrounding `[..]` and split on commas and whitespace.
fn list_items(s: &str) -> impl Iterator<Item = &str> {
    let s = s.trim();
    let s = s.strip_prefix('[').unwrap_or(s);
    let s = s.strip_suffix(']').unwrap_or(s);
    s.split(SPLITTERS).filter(|item| !item.is_empty())
}

/////////////////////
// parse::FaceList //
/////////////////////

/// A list of face labels, e.g., `[1,2,3,4,5,6]` or `[H,T]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceList(Vec<FaceValue>);

impl FaceList {
    pub fn faces(&self) -> &[FaceValue] {
        &self.0
    }

    pub fn into_faces(self) -> Vec<FaceValue> {
        self.0
    }
}

impl FromStr for FaceList {
    type Err = String;

    // [1,2,3] or [H, T] or 1 2 3

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut faces = Vec::new();
        let mut seen = BTreeSet::new();

        for face_str in list_items(s) {
            let face = FaceValue::from_str(face_str)?;
            if !seen.insert(face.clone()) {
                return Err(format!("the faces can't contain duplicates: '{face}'"));
            }
            faces.push(face);
        }

        if faces.is_empty() {
            return Err("need at least one face".to_owned());
        }

        Ok(Self(faces))
    }
}

impl fmt::Display for FaceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}

///////////////////////
// parse::WeightList //
///////////////////////

/// Per-face weight overrides, e.g., `[6:5,1:0.5]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightList(Vec<(FaceValue, f64)>);

impl WeightList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FaceValue, f64)> + '_ {
        self.0.iter().map(|(face, weight)| (face, *weight))
    }

    /// Apply each weight override to `die`, in order.
    pub fn apply(&self, die: &Die<FaceValue>) -> Result<(), String> {
        for (face, weight) in self.iter() {
            die.change_weight(face, weight)
                .map_err(|err| format!("can't set weight for face '{face}': {err}"))?;
        }
        Ok(())
    }
}

impl FromStr for WeightList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut weights = Self::new();

        for face_weight_str in list_items(s) {
            // split on the last ':' so text faces can contain one
            let (face_str, weight_str) = face_weight_str.rsplit_once(':').ok_or_else(|| {
                format!("expected '<face>:<weight>', got: '{face_weight_str}'")
            })?;

            let face = FaceValue::from_str(face_str)?;
            let weight = weight_str.parse::<f64>().map_err(|err| {
                format!("failed to parse weight: '{weight_str}', error: {err}")
            })?;

            weights.0.push((face, weight));
        }

        Ok(weights)
    }
}

impl fmt::Display for WeightList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pieces = self
            .0
            .iter()
            .map(|(face, weight)| format!("{face}:{weight}"))
            .join(", ");
        write!(f, "[{pieces}]")
    }
}

////////////////////
// parse::DieSpec //
////////////////////

/// Everything needed to build one die from the command line: its faces and
/// any weight overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DieSpec {
    pub faces: FaceList,
    pub weights: WeightList,
}

impl DieSpec {
    pub fn new(faces: FaceList, weights: WeightList) -> Self {
        Self { faces, weights }
    }

    /// Build a fresh die with these faces and weights.
    pub fn to_die(&self) -> Result<Die<FaceValue>, String> {
        let die = Die::new(self.faces.faces().iter().cloned()).map_err(|err| err.to_string())?;
        self.weights.apply(&die)?;
        Ok(die)
    }
}

impl fmt::Display for DieSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weights.is_empty() {
            write!(f, "{}", self.faces)
        } else {
            write!(f, "{} w/ {}", self.faces, self.weights)
        }
    }
}
