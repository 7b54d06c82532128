//! # montecarlo
//!
//! A small toolkit for exploring dice probabilities empirically, by simulation
//! rather than by formula.
//!
//! ## Overview
//!
//! * A [`Die`] has a fixed set of unique faces and a mutable weight on each
//!   face. Rolling samples faces in proportion to the weights as they are at
//!   the time of the roll.
//! * A [`Game`] rolls a collection of dice together some number of times and
//!   keeps the resulting roll × die table.
//! * An [`Analyzer`] takes a played game's table and counts jackpots (rolls
//!   where every die agrees), faces per roll, and distinct face combinations
//!   and permutations.
//!
//! Every roll takes an explicit random source, so seeding the generator makes a
//! simulation reproducible.
//!
//! ```
//! use montecarlo::{Analyzer, Die, Game};
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoroshiro64Star;
//!
//! let mut rng = Xoroshiro64Star::seed_from_u64(0xd15c0);
//!
//! let loaded = Die::new([1, 2, 3, 4, 5, 6]).unwrap();
//! loaded.change_weight(&6, 5.0).unwrap();
//!
//! let mut game = Game::new(vec![loaded.clone(), loaded.clone(), loaded]).unwrap();
//! game.play(1_000, &mut rng).unwrap();
//!
//! let analyzer = Analyzer::new(&game).unwrap();
//! assert_eq!(1_000, analyzer.count_combos().total());
//! ```

#[macro_use]
mod macros;

pub mod analyzer;
pub mod cli;
pub mod die;
pub mod error;
pub mod face;
pub mod game;
pub mod parse;
pub mod stats;

pub use crate::{
    analyzer::{Analyzer, FaceCounts, KeyCounts},
    die::{Die, DieState},
    error::{Error, ErrorKind, Result},
    face::{Face, FaceValue},
    game::{Game, NarrowRow, NarrowTable, PlayFormat, PlayView, WideTable},
};

use rand::SeedableRng;
use rand_xoshiro::Xoroshiro64Star;
use std::cmp;

pub(crate) const DEFAULT_ROLLS: usize = 1_000;
pub(crate) const DEFAULT_NDICE: usize = 3;
pub(crate) const DEFAULT_FORMAT: PlayFormat = PlayFormat::Wide;

/// The random source used by the command line tool.
pub type SimRng = Xoroshiro64Star;

/// A seeded generator if `seed` is given, otherwise one seeded from the OS.
pub fn sim_rng(seed: Option<u64>) -> SimRng {
    match seed {
        Some(seed) => SimRng::seed_from_u64(seed),
        None => SimRng::from_entropy(),
    }
}

///////////////////
// Combinatorics //
///////////////////

/// count `n choose k` without replacement. `None` on overflow.
pub fn num_combinations(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    // C(n, k) == C(n, n - k); take the shorter product.
    let k = cmp::min(k, n - k);

    // multiply and divide in lock-step so every intermediate value is itself
    // a binomial coefficient: C(n - k + i, i).
    (1..=k).try_fold(1_u64, |acc, i| {
        acc.checked_mul(n - k + i).map(|x| x / i)
    })
}

/// count `n choose k` with replacement. also known as `n multichoose k`. This
/// is the number of distinct combos `k` dice with `n` faces can show.
#[inline]
pub fn num_multisets(n: u64, k: u64) -> Option<u64> {
    if n == 0 {
        return Some(if k == 0 { 1 } else { 0 });
    }
    num_combinations(n + k - 1, k)
}

/// The number of ordered outcomes (permutations with repetition) of `k` dice
/// with `n` faces, `n^k`. `None` on overflow.
#[inline]
pub fn num_permutations(n: u64, k: u64) -> Option<u64> {
    u32::try_from(k).ok().and_then(|k| n.checked_pow(k))
}

/// Returns `true` if the iterator `iter` is sorted, according to the comparator
/// function `compare`, i.e., `x_1 <= x2 <= ... <= x_n`.
pub(crate) fn is_sorted_by<T, F>(mut iter: impl Iterator<Item = T>, mut compare: F) -> bool
where
    F: FnMut(&T, &T) -> Option<cmp::Ordering>,
{
    let mut prev = match iter.next() {
        Some(first) => first,
        None => return true,
    };

    for next in iter {
        if let Some(cmp::Ordering::Greater) | None = compare(&prev, &next) {
            return false;
        }
        prev = next;
    }

    true
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn factorial_ref(n: u64) -> u64 {
        (1..=n).product()
    }

    fn num_combinations_ref(n: u64, k: u64) -> u64 {
        factorial_ref(n) / (factorial_ref(k) * factorial_ref(n - k))
    }

    #[test]
    fn test_num_combinations() {
        assert_eq!(Some(1), num_combinations(0, 0));
        assert_eq!(Some(0), num_combinations(3, 4));
        assert_eq!(Some(20), num_combinations(6, 3));
        // 50 choose 25 still fits; 68 choose 34 doesn't.
        assert_eq!(Some(126_410_606_437_752), num_combinations(50, 25));
        assert_eq!(None, num_combinations(68, 34));
    }

    #[test]
    fn test_num_multisets() {
        // 4 dice with 4 faces
        assert_eq!(Some(35), num_multisets(4, 4));
        // 6 dice with 6 faces
        assert_eq!(Some(462), num_multisets(6, 6));
        assert_eq!(Some(1), num_multisets(0, 0));
        assert_eq!(Some(0), num_multisets(0, 3));
        assert_eq!(Some(1), num_multisets(5, 0));
    }

    #[test]
    fn test_num_permutations() {
        assert_eq!(Some(256), num_permutations(4, 4));
        assert_eq!(Some(1), num_permutations(6, 0));
        assert_eq!(None, num_permutations(10, 20));
    }

    #[test]
    fn test_is_sorted_by() {
        let cmp = |a: &i32, b: &i32| a.partial_cmp(b);
        assert!(is_sorted_by([].into_iter(), cmp));
        assert!(is_sorted_by([1].into_iter(), cmp));
        assert!(is_sorted_by([1, 1, 2, 5].into_iter(), cmp));
        assert!(!is_sorted_by([1, 3, 2].into_iter(), cmp));
    }

    #[test]
    fn test_sim_rng_seeded() {
        use rand::Rng;
        let a = sim_rng(Some(7)).gen::<u64>();
        let b = sim_rng(Some(7)).gen::<u64>();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn test_prop_num_combinations(n in 0_u64..=20, k in 0_u64..=20) {
            prop_assume!(k <= n);
            prop_assert_eq!(Some(num_combinations_ref(n, k)), num_combinations(n, k));
        }
    }
}
