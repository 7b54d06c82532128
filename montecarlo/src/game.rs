use crate::{
    die::Die,
    error::{Error, Result},
    face::Face,
};
use log::{debug, warn};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

////////////////
// PlayFormat //
////////////////

/// How [`Game::show_last_play`] lays out the result table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayFormat {
    /// roll × die grid, one face per cell.
    Wide,
    /// one row per (roll, die) pair.
    Narrow,
}

impl Default for PlayFormat {
    #[inline]
    fn default() -> Self {
        Self::Wide
    }
}

impl PlayFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wide => "wide",
            Self::Narrow => "narrow",
        }
    }
}

impl FromStr for PlayFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wide" => Ok(Self::Wide),
            "narrow" => Ok(Self::Narrow),
            _ => Err(Error::UnknownFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for PlayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///////////////
// WideTable //
///////////////

/// The outcome of a play: rows are indexed by roll number, columns by die
/// position, and each cell is the face that die showed on that roll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WideTable<F> {
    outcomes: Array2<F>,
}

impl<F: Face> WideTable<F> {
    /// Assemble a table from one column of rolled faces per die. Every column
    /// must hold `nrolls` faces.
    fn from_columns(nrolls: usize, columns: &[Vec<F>]) -> Self {
        debug_assert!(columns.iter().all(|col| col.len() == nrolls));

        let outcomes =
            Array2::from_shape_fn((nrolls, columns.len()), |(roll, die)| {
                columns[die][roll].clone()
            });
        Self { outcomes }
    }

    /// Build a table by hand, one row per roll. All rows must be the same
    /// length.
    pub fn from_rows(rows: Vec<Vec<F>>) -> Result<Self> {
        let nrolls = rows.len();
        let ndice = rows.first().map(Vec::len).unwrap_or(0);

        for (row, faces) in rows.iter().enumerate() {
            if faces.len() != ndice {
                return Err(Error::RaggedRows {
                    row,
                    len: faces.len(),
                    expected: ndice,
                });
            }
        }

        let outcomes = Array2::from_shape_fn((nrolls, ndice), |(roll, die)| {
            rows[roll][die].clone()
        });
        Ok(Self { outcomes })
    }

    #[inline]
    pub fn nrolls(&self) -> usize {
        self.outcomes.nrows()
    }

    #[inline]
    pub fn ndice(&self) -> usize {
        self.outcomes.ncols()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, roll: usize, die: usize) -> Option<&F> {
        self.outcomes.get((roll, die))
    }

    pub fn view(&self) -> ArrayView2<'_, F> {
        self.outcomes.view()
    }

    /// Iterate over the rolls, each a view over the faces shown by every die.
    pub fn rolls(&self) -> impl Iterator<Item = ArrayView1<'_, F>> + '_ {
        self.outcomes.rows().into_iter()
    }

    /// Everything die `die` rolled, in roll order.
    pub fn die_column(&self, die: usize) -> Option<ArrayView1<'_, F>> {
        (die < self.ndice()).then(|| self.outcomes.column(die))
    }

    /// Reshape into long form: one row per (roll, die) pair, grouped by die
    /// then ordered by roll.
    pub fn to_narrow(&self) -> NarrowTable<F> {
        let rows = self
            .outcomes
            .columns()
            .into_iter()
            .enumerate()
            .flat_map(|(die, column)| {
                column
                    .into_iter()
                    .enumerate()
                    .map(move |(roll, face)| NarrowRow {
                        die,
                        roll,
                        face: face.clone(),
                    })
            })
            .collect();

        NarrowTable {
            ndice: self.ndice(),
            nrolls: self.nrolls(),
            rows,
        }
    }
}

/////////////////
// NarrowTable //
/////////////////

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NarrowRow<F> {
    pub die: usize,
    pub roll: usize,
    pub face: F,
}

/// A long-form view of a [`WideTable`], with exactly one row per cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NarrowTable<F> {
    ndice: usize,
    nrolls: usize,
    rows: Vec<NarrowRow<F>>,
}

impl<F: Face> NarrowTable<F> {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[NarrowRow<F>] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NarrowRow<F>> {
        self.rows.iter()
    }

    /// Reshape back into a wide table.
    pub fn to_wide(&self) -> WideTable<F> {
        let mut columns = vec![Vec::with_capacity(self.nrolls); self.ndice];
        for row in &self.rows {
            columns[row.die].push(row.face.clone());
        }
        WideTable::from_columns(self.nrolls, &columns)
    }
}

//////////////
// PlayView //
//////////////

/// The last play, in the layout asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayView<F> {
    Wide(WideTable<F>),
    Narrow(NarrowTable<F>),
}

impl<F> PlayView<F> {
    pub fn format(&self) -> PlayFormat {
        match self {
            Self::Wide(_) => PlayFormat::Wide,
            Self::Narrow(_) => PlayFormat::Narrow,
        }
    }

    pub fn into_wide(self) -> Option<WideTable<F>> {
        match self {
            Self::Wide(table) => Some(table),
            Self::Narrow(_) => None,
        }
    }

    pub fn into_narrow(self) -> Option<NarrowTable<F>> {
        match self {
            Self::Wide(_) => None,
            Self::Narrow(table) => Some(table),
        }
    }
}

//////////
// Game //
//////////

/// A collection of dice rolled together. The dice are meant to share a face
/// set, but nothing enforces that.
pub struct Game<F> {
    dice: Vec<Die<F>>,
    last_play: Option<WideTable<F>>,
}

impl<F: Face> Game<F> {
    pub fn new(dice: Vec<Die<F>>) -> Result<Self> {
        let first = dice.first().ok_or(Error::NoDice)?;

        if dice.iter().any(|die| die.faces() != first.faces()) {
            warn!(
                "Game::new: dice don't all share the same faces; jackpots may be \
                 impossible and face counts will span every die's faces"
            );
        }

        Ok(Self {
            dice,
            last_play: None,
        })
    }

    pub fn dice(&self) -> &[Die<F>] {
        &self.dice
    }

    #[inline]
    pub fn ndice(&self) -> usize {
        self.dice.len()
    }

    /// Roll every die `rolls` times and keep the table as the last play.
    ///
    /// Each die is rolled with its weights as they are at this call. If any die
    /// can't be rolled the previous play is kept.
    pub fn play<R: Rng + ?Sized>(&mut self, rolls: usize, rng: &mut R) -> Result<()> {
        let columns = self
            .dice
            .iter()
            .map(|die| die.roll(rolls, rng))
            .collect::<Result<Vec<_>>>()?;

        self.last_play = Some(WideTable::from_columns(rolls, &columns));

        debug!("Game::play: rolls: {rolls}, ndice: {}", self.ndice());
        Ok(())
    }

    pub fn has_played(&self) -> bool {
        self.last_play.is_some()
    }

    /// The most recent play, in wide form.
    pub fn last_play(&self) -> Result<&WideTable<F>> {
        self.last_play.as_ref().ok_or(Error::NoPlayResult)
    }

    pub fn show_last_play(&self, format: PlayFormat) -> Result<PlayView<F>> {
        let table = self.last_play()?;
        Ok(match format {
            PlayFormat::Wide => PlayView::Wide(table.clone()),
            PlayFormat::Narrow => PlayView::Narrow(table.to_narrow()),
        })
    }
}

impl<F: Face> fmt::Debug for Game<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("dice", &self.dice)
            .field("last_play", &self.last_play)
            .finish()
    }
}

cfg_test! {
    pub mod prop {
        use super::*;
        use crate::die::prop::int_die;

        /// `ndice` separate dice, all with the same faces.
        pub fn int_game(faces: &[i64], ndice: usize) -> Game<i64> {
            Game::new((0..ndice).map(|_| int_die(faces)).collect()).unwrap()
        }
    }
}

///////////
// Tests //
///////////
