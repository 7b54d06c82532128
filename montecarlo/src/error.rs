use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The broad class of an [`Error`]. Callers should match on this rather than
/// on the error message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input at a constructor or method boundary.
    Validation,
    /// A reference to a face that doesn't exist on a die.
    Lookup,
    /// The operation needs some prior state that isn't there (yet).
    State,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation error",
            Self::Lookup => "lookup error",
            Self::State => "state error",
        };
        f.write_str(s)
    }
}

/// Errors from building, rolling, playing, and analyzing dice.
///
/// Face labels are captured in their `Debug` rendering so this type doesn't
/// need to be generic over the face type.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("a die needs at least one face")]
    NoFaces,

    #[error("the faces must be unique values: {0} appears more than once")]
    DuplicateFace(String),

    #[error("weight must be a finite, non-negative number: {0}")]
    InvalidWeight(f64),

    #[error("the weights must sum to a finite total: a weight of {0} would overflow it")]
    WeightOverflow(f64),

    #[error("a game needs at least one die")]
    NoDice,

    #[error("'{0}' is not an acceptable format, expected 'wide' or 'narrow'")]
    UnknownFormat(String),

    #[error("the game hasn't been played yet, so there's nothing to analyze")]
    GameNotPlayed,

    #[error("rows must all have the same length: row {row} has {len} values, expected {expected}")]
    RaggedRows {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("{0} is not one of the die's faces")]
    UnknownFace(String),

    #[error("no play result yet; call play first")]
    NoPlayResult,

    #[error("can't roll a die where every face has zero weight")]
    ZeroTotalWeight,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoFaces
            | Self::DuplicateFace(_)
            | Self::InvalidWeight(_)
            | Self::WeightOverflow(_)
            | Self::NoDice
            | Self::UnknownFormat(_)
            | Self::GameNotPlayed
            | Self::RaggedRows { .. } => ErrorKind::Validation,
            Self::UnknownFace(_) => ErrorKind::Lookup,
            Self::NoPlayResult | Self::ZeroTotalWeight => ErrorKind::State,
        }
    }

    pub(crate) fn duplicate_face(face: &impl fmt::Debug) -> Self {
        Self::DuplicateFace(format!("{face:?}"))
    }

    pub(crate) fn unknown_face(face: &impl fmt::Debug) -> Self {
        Self::UnknownFace(format!("{face:?}"))
    }
}
