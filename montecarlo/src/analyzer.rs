use crate::{
    error::{Error, Result},
    face::Face,
    game::{Game, WideTable},
    is_sorted_by,
};
use itertools::Itertools;
use ndarray::{Array2, ArrayView1, Axis};
use serde::Serialize;
use std::{
    collections::{BTreeSet, HashMap},
    ops::AddAssign,
};

////////////////
// FaceCounts //
////////////////

/// How many times each face shows up in each roll.
///
/// Columns cover every face seen anywhere in the table, in ascending order, so
/// a face missing from some roll just gets a zero there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceCounts<F> {
    faces: Vec<F>,
    // nrolls × faces.len()
    counts: Array2<usize>,
}

impl<F: Face> FaceCounts<F> {
    pub fn faces(&self) -> &[F] {
        &self.faces
    }

    #[inline]
    pub fn nrolls(&self) -> usize {
        self.counts.nrows()
    }

    /// The count for `face` on `roll`. Faces never rolled count as zero;
    /// `None` only if `roll` is out of range.
    pub fn get(&self, roll: usize, face: &F) -> Option<usize> {
        if roll >= self.nrolls() {
            return None;
        }
        match self.faces.binary_search(face) {
            Ok(idx) => Some(self.counts[(roll, idx)]),
            Err(_) => Some(0),
        }
    }

    /// Counts for a single roll, aligned with [`FaceCounts::faces`].
    pub fn roll_counts(&self, roll: usize) -> Option<ArrayView1<'_, usize>> {
        (roll < self.nrolls()).then(|| self.counts.row(roll))
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, usize>> + '_ {
        self.counts.rows().into_iter()
    }

    /// Total count of each face across every roll.
    pub fn totals(&self) -> Vec<(F, usize)> {
        self.faces
            .iter()
            .cloned()
            .zip(self.counts.sum_axis(Axis(0)).into_raw_vec())
            .collect()
    }
}

///////////////
// KeyCounts //
///////////////

/// Distinct per-roll keys (face tuples) and how many rolls produced each.
///
/// Ordered by count, most common first, with ties broken by ascending key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyCounts<F: Face> {
    counts: Vec<(Vec<F>, usize)>,
    #[serde(skip)]
    index: HashMap<Vec<F>, usize>,
}

impl<F: Face> KeyCounts<F> {
    fn from_keys(keys: impl Iterator<Item = Vec<F>>) -> Self {
        let mut index = HashMap::<Vec<F>, usize>::new();
        for key in keys {
            index.entry(key).or_insert(0).add_assign(1);
        }

        let mut counts = index
            .iter()
            .map(|(key, &count)| (key.clone(), count))
            .collect::<Vec<_>>();
        counts.sort_unstable_by(|(k1, c1), (k2, c2)| c2.cmp(c1).then_with(|| k1.cmp(k2)));
        Self { counts, index }
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// How many rolls produced `key`. Zero for keys never seen.
    pub fn get(&self, key: &[F]) -> usize {
        self.index.get(key).copied().unwrap_or(0)
    }

    /// Sum of all counts, i.e., the number of rolls.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[F], usize)> + '_ {
        self.counts.iter().map(|(key, count)| (key.as_slice(), *count))
    }

    pub fn keys(&self) -> impl Iterator<Item = &[F]> + '_ {
        self.counts.iter().map(|(key, _)| key.as_slice())
    }
}

//////////////
// Analyzer //
//////////////

/// Statistics over a single play. The table is copied out of the game when the
/// analyzer is built; play again and build a new analyzer to refresh.
#[derive(Clone, Debug)]
pub struct Analyzer<F> {
    data: WideTable<F>,
}

impl<F: Face> Analyzer<F> {
    /// Capture the game's last play. The game must have been played.
    pub fn new(game: &Game<F>) -> Result<Self> {
        let data = game.last_play().map_err(|_| Error::GameNotPlayed)?.clone();
        Ok(Self { data })
    }

    pub fn from_table(data: WideTable<F>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &WideTable<F> {
        &self.data
    }

    /// The number of rolls where every die shows the same face.
    pub fn count_jackpots(&self) -> usize {
        if self.data.ndice() == 0 {
            return 0;
        }
        self.data
            .rolls()
            .filter(|roll| roll.iter().all_equal())
            .count()
    }

    /// Per roll, how many dice showed each face.
    pub fn count_faces(&self) -> FaceCounts<F> {
        let faces = self
            .data
            .view()
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let face_idxs = faces
            .iter()
            .enumerate()
            .map(|(idx, face)| (face, idx))
            .collect::<HashMap<_, _>>();

        let mut counts = Array2::<usize>::zeros((self.data.nrolls(), faces.len()));
        for (mut row_counts, roll) in counts.rows_mut().into_iter().zip(self.data.rolls()) {
            for face in roll.iter() {
                row_counts[face_idxs[face]] += 1;
            }
        }

        FaceCounts { faces, counts }
    }

    /// Count distinct order-independent combinations: each roll is keyed by its
    /// faces sorted ascending.
    pub fn count_combos(&self) -> KeyCounts<F> {
        let combos = KeyCounts::from_keys(self.data.rolls().map(|roll| {
            let mut key = roll.to_vec();
            key.sort_unstable();
            key
        }));

        debug_assert!(combos
            .keys()
            .all(|key| is_sorted_by(key.iter(), |a, b| a.partial_cmp(b))));

        combos
    }

    /// Count distinct order-dependent permutations: each roll is keyed by its
    /// faces in die order.
    pub fn count_permutations(&self) -> KeyCounts<F> {
        KeyCounts::from_keys(self.data.rolls().map(|roll| roll.to_vec()))
    }
}

///////////
// Tests //
///////////
