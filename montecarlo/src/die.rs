use crate::{
    error::{Error, Result},
    face::Face,
    stats,
};
use approx::relative_eq;
use log::trace;
use ndarray::Array1;
use rand::{
    distributions::{Distribution, Open01},
    Rng,
};
use serde::Serialize;
use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

pub(crate) const DEFAULT_WEIGHT: f64 = 1.0;

/// A die's face distribution, as a cumulative sum over its (unnormalized)
/// weights, for efficient sampling. Built fresh from the current weights on
/// every roll.
#[derive(Clone)]
pub struct FaceDistr {
    cumulative: Vec<f64>,
}

impl FaceDistr {
    pub fn from_weights(weights: &[f64]) -> Result<Self> {
        let mut total = 0.0;
        let cumulative = weights
            .iter()
            .map(|&w| {
                total += w;
                total
            })
            .collect::<Vec<_>>();

        if !total.is_finite() {
            return Err(Error::WeightOverflow(total));
        }
        if total <= 0.0 {
            return Err(Error::ZeroTotalWeight);
        }

        Ok(Self { cumulative })
    }

    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Pr[face_idx]
    pub fn p_face(&self, face_idx: usize) -> f64 {
        let prev = if face_idx == 0 {
            0.0
        } else {
            self.cumulative[face_idx - 1]
        };
        (self.cumulative[face_idx] - prev) / self.total_weight()
    }

    pub fn into_pmf(self) -> Array1<f64> {
        (0..self.cumulative.len())
            .map(|idx| self.p_face(idx))
            .collect()
    }

    /// convert a standard sample r ∈ (0, 1) to a face index. Face `i` owns the
    /// interval `(cum[i-1], cum[i]]`, so zero-weight faces own nothing.
    #[inline]
    fn sample_to_face_idx(&self, r: f64) -> usize {
        let x = r * self.total_weight();
        let idx = self.cumulative.partition_point(|&c| c < x);

        // `x` can only overshoot the last bucket through rounding; give it to
        // the last face that can actually be drawn.
        if idx >= self.cumulative.len() {
            self.last_drawable_idx()
        } else {
            idx
        }
    }

    fn last_drawable_idx(&self) -> usize {
        let total = self.total_weight();
        self.cumulative.partition_point(|&c| c < total)
    }
}

impl Distribution<usize> for FaceDistr {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        // sample r ∈ (0, 1)
        let r = Open01.sample(rng);
        self.sample_to_face_idx(r)
    }
}

impl fmt::Debug for FaceDistr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pmf = (0..self.cumulative.len())
            .map(|idx| self.p_face(idx))
            .collect::<Vec<_>>();
        write!(f, "{:?}", pmf)
    }
}

struct DieInner<F> {
    faces: Vec<F>,
    face_idxs: HashMap<F, usize>,
    weights: RefCell<Vec<f64>>,
}

/// A die with a fixed set of unique faces and a mutable weight per face.
///
/// `Die` is a cheap, shared handle: cloning it gives another handle onto the
/// same weights. A [`Game`](crate::Game) holds handles, so weight changes made
/// through any handle are seen by the next play.
pub struct Die<F> {
    inner: Rc<DieInner<F>>,
}

impl<F> Clone for Die<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<F: Face> Die<F> {
    /// Create a die from its faces, in canonical order. Every face starts with
    /// a weight of `1.0`.
    pub fn new(faces: impl IntoIterator<Item = F>) -> Result<Self> {
        let faces = faces.into_iter().collect::<Vec<_>>();
        if faces.is_empty() {
            return Err(Error::NoFaces);
        }

        let mut face_idxs = HashMap::with_capacity(faces.len());
        for (idx, face) in faces.iter().enumerate() {
            if face_idxs.insert(face.clone(), idx).is_some() {
                return Err(Error::duplicate_face(face));
            }
        }

        let weights = RefCell::new(vec![DEFAULT_WEIGHT; faces.len()]);

        Ok(Self {
            inner: Rc::new(DieInner {
                faces,
                face_idxs,
                weights,
            }),
        })
    }

    #[inline]
    pub fn faces(&self) -> &[F] {
        &self.inner.faces
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.inner.faces.len()
    }

    pub fn has_face(&self, face: &F) -> bool {
        self.inner.face_idxs.contains_key(face)
    }

    fn face_idx(&self, face: &F) -> Result<usize> {
        self.inner
            .face_idxs
            .get(face)
            .copied()
            .ok_or_else(|| Error::unknown_face(face))
    }

    pub fn weight(&self, face: &F) -> Result<f64> {
        let idx = self.face_idx(face)?;
        Ok(self.inner.weights.borrow()[idx])
    }

    /// Replace the weight on a single face. The weight must be finite and
    /// non-negative, and the die's total weight must stay finite; on error the
    /// die is left unchanged.
    pub fn change_weight(&self, face: &F, new_weight: f64) -> Result<()> {
        let idx = self.face_idx(face)?;
        if !new_weight.is_finite() || new_weight < 0.0 {
            return Err(Error::InvalidWeight(new_weight));
        }

        let mut weights = self.inner.weights.borrow_mut();
        let others: f64 = weights
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != idx)
            .map(|(_, w)| w)
            .sum();
        if !(others + new_weight).is_finite() {
            return Err(Error::WeightOverflow(new_weight));
        }

        weights[idx] = new_weight;
        Ok(())
    }

    /// The face distribution implied by the die's current weights.
    pub fn distr(&self) -> Result<FaceDistr> {
        FaceDistr::from_weights(&self.inner.weights.borrow())
    }

    /// Roll the die `n` times, independently and with replacement, using the
    /// weights as they are right now.
    pub fn roll<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<F>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let distr = self.distr()?;
        trace!("Die::roll: n: {n}, distr: {distr:?}");

        Ok((0..n)
            .map(|_| self.inner.faces[distr.sample(rng)].clone())
            .collect())
    }

    pub fn roll_once<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<F> {
        let distr = self.distr()?;
        Ok(self.inner.faces[distr.sample(rng)].clone())
    }

    /// A snapshot of the die's faces and weights. Later weight changes don't
    /// affect the snapshot, and vice versa.
    pub fn current_state(&self) -> DieState<F> {
        let weights = self.inner.weights.borrow();
        DieState(
            self.inner
                .faces
                .iter()
                .cloned()
                .zip(weights.iter().copied())
                .collect(),
        )
    }

    /// Returns a p-value for the hypothesis that `samples` were drawn from this
    /// die with its current weights. Small values mean the samples look
    /// inconsistent with the weights.
    pub fn fit_pvalue(&self, samples: &[F]) -> Result<f64> {
        let mut counts = vec![0_usize; self.num_faces()];
        for face in samples {
            counts[self.face_idx(face)?] += 1;
        }

        let p = self.distr()?.into_pmf();
        let p_hat = stats::pmf_from_counts(&counts);

        Ok(stats::multinomial_test(samples.len(), p.view(), p_hat.view()))
    }

    /// Returns `true` if both handles point at the same die.
    pub fn same_die(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<F: Face> fmt::Debug for Die<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Die").field(&self.current_state()).finish()
    }
}

/// A copy of a die's faces and weights, in the die's canonical face order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DieState<F>(Vec<(F, f64)>);

impl<F: Face> DieState<F> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, face: &F) -> Option<f64> {
        self.0
            .iter()
            .find(|(f, _)| f == face)
            .map(|(_, weight)| *weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&F, f64)> + '_ {
        self.0.iter().map(|(face, weight)| (face, *weight))
    }

    pub fn faces(&self) -> impl Iterator<Item = &F> + '_ {
        self.0.iter().map(|(face, _)| face)
    }

    pub fn total_weight(&self) -> f64 {
        self.0.iter().map(|(_, weight)| weight).sum()
    }

    /// Normalized probability per face. Empty if every weight is zero or the
    /// total isn't finite.
    pub fn pmf(&self) -> Vec<(F, f64)> {
        let total = self.total_weight();
        if total <= 0.0 || !total.is_finite() {
            return Vec::new();
        }

        let pmf = self
            .0
            .iter()
            .map(|(face, weight)| (face.clone(), weight / total))
            .collect::<Vec<_>>();

        debug_assert!(relative_eq!(
            1.0,
            pmf.iter().map(|(_, p)| p).sum::<f64>(),
            epsilon = 1e-9
        ));

        pmf
    }

    /// Set a weight on the snapshot only. Doesn't touch the die it came from.
    pub fn set(&mut self, face: &F, weight: f64) -> Option<f64> {
        self.0
            .iter_mut()
            .find(|(f, _)| f == face)
            .map(|(_, w)| std::mem::replace(w, weight))
    }
}

cfg_test! {
    pub mod prop {
        use super::*;
        use crate::face::FaceValue;
        use proptest::{collection::btree_set, prelude::*};
        use rand::SeedableRng;
        use rand_xoshiro::Xoroshiro64Star;

        pub fn small_rng(seed: u64) -> Xoroshiro64Star {
            Xoroshiro64Star::seed_from_u64(seed)
        }

        pub fn arb_rng() -> impl Strategy<Value = Xoroshiro64Star> {
            any::<u64>().prop_map(Xoroshiro64Star::seed_from_u64)
        }

        /// Between 1 and 8 unique integer faces.
        pub fn arb_faces() -> impl Strategy<Value = Vec<i64>> {
            btree_set(-20_i64..20, 1..=8).prop_map(|faces| faces.into_iter().collect())
        }

        pub fn int_die(faces: &[i64]) -> Die<i64> {
            Die::new(faces.iter().copied()).unwrap()
        }

        pub fn face_value_die(faces: &[i64]) -> Die<FaceValue> {
            Die::new(faces.iter().map(|&x| FaceValue::Int(x))).unwrap()
        }
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::{prop::*, *};
    use crate::{error::ErrorKind, face::FaceValue};
    use approx::assert_relative_eq;
    use claim::{assert_gt, assert_lt};
    use proptest::{prelude::*, sample::Index};

    #[test]
    fn test_new_die() {
        let die = int_die(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(&[1, 2, 3, 4, 5, 6], die.faces());
        assert_eq!(6, die.num_faces());

        let state = die.current_state();
        assert_eq!(6, state.len());
        for (_face, weight) in state.iter() {
            assert_eq!(1.0, weight);
        }
    }

    #[test]
    fn test_new_die_keeps_face_order() {
        let die = Die::new(["tails", "heads"]).unwrap();
        assert_eq!(&["tails", "heads"], die.faces());
        assert_eq!(
            vec![&"tails", &"heads"],
            die.current_state().faces().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_new_die_rejects_bad_faces() {
        let err = Die::new([1, 2, 2, 3]).unwrap_err();
        assert_eq!(Error::DuplicateFace("2".into()), err);
        assert_eq!(ErrorKind::Validation, err.kind());

        let err = Die::<i64>::new([]).unwrap_err();
        assert_eq!(ErrorKind::Validation, err.kind());

        // distinct as faces
        Die::new([FaceValue::Int(1), FaceValue::Float(1.0), FaceValue::from("1.0")]).unwrap();
    }

    #[test]
    fn test_change_weight() {
        let die = int_die(&[1, 2, 3, 4, 5, 6]);
        die.change_weight(&2, 100.0).unwrap();

        let state = die.current_state();
        assert_eq!(Some(100.0), state.get(&2));
        for face in [1, 3, 4, 5, 6] {
            assert_eq!(Some(1.0), state.get(&face));
        }
        assert_eq!(100.0, die.weight(&2).unwrap());
    }

    #[test]
    fn test_change_weight_errors_leave_die_intact() {
        let die = int_die(&[1, 2, 3]);
        die.change_weight(&1, 3.0).unwrap();

        let err = die.change_weight(&7, 2.0).unwrap_err();
        assert_eq!(ErrorKind::Lookup, err.kind());

        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = die.change_weight(&1, bad).unwrap_err();
            assert_eq!(ErrorKind::Validation, err.kind());
        }

        assert_eq!(3.0, die.weight(&1).unwrap());
        assert_eq!(ErrorKind::Lookup, die.weight(&9).unwrap_err().kind());
    }

    #[test]
    fn test_change_weight_keeps_total_finite() {
        let mut rng = small_rng(0xd15c0);
        let die = int_die(&[1, 2]);
        die.change_weight(&1, f64::MAX).unwrap();

        let err = die.change_weight(&2, f64::MAX).unwrap_err();
        assert_eq!(Error::WeightOverflow(f64::MAX), err);
        assert_eq!(ErrorKind::Validation, err.kind());
        assert_eq!(1.0, die.weight(&2).unwrap());

        // a huge but finite total still samples in proportion to the weights
        die.change_weight(&1, f64::MAX / 2.0).unwrap();
        die.change_weight(&2, f64::MAX / 4.0).unwrap();
        let ones = die
            .roll(3_000, &mut rng)
            .unwrap()
            .iter()
            .filter(|&&face| face == 1)
            .count();
        assert_gt!(ones, 1_800);
        assert_lt!(ones, 2_200);

        let pmf = die.current_state().pmf();
        assert_relative_eq!(2.0 / 3.0, pmf[0].1, epsilon = 1e-9);
        assert_relative_eq!(1.0 / 3.0, pmf[1].1, epsilon = 1e-9);

        // a snapshot can overflow on its own; it just has no pmf
        let mut state = die.current_state();
        state.set(&2, f64::MAX);
        assert!(state.pmf().is_empty());
    }

    #[test]
    fn test_current_state_is_a_copy() {
        let die = int_die(&[1, 2]);
        let mut state = die.current_state();
        assert_eq!(Some(1.0), state.set(&1, 50.0));
        assert_eq!(1.0, die.weight(&1).unwrap());

        die.change_weight(&2, 7.0).unwrap();
        assert_eq!(Some(1.0), state.get(&2));
    }

    #[test]
    fn test_clone_shares_weights() {
        let die = int_die(&[1, 2, 3]);
        let handle = die.clone();
        handle.change_weight(&3, 0.0).unwrap();

        assert!(die.same_die(&handle));
        assert_eq!(0.0, die.weight(&3).unwrap());
        assert!(!die.same_die(&int_die(&[1, 2, 3])));
    }

    #[test]
    fn test_roll_zero_times() {
        let mut rng = small_rng(0xd15c0);
        let die = int_die(&[1, 2, 3]);
        assert!(die.roll(0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_roll_never_draws_zero_weight_faces() {
        let mut rng = small_rng(0xd15c0);
        let die = int_die(&[1, 2, 3, 4, 5, 6]);
        die.change_weight(&1, 0.0).unwrap();
        die.change_weight(&4, 0.0).unwrap();
        die.change_weight(&6, 0.0).unwrap();

        let rolls = die.roll(20_000, &mut rng).unwrap();
        assert_eq!(20_000, rolls.len());
        assert!(rolls.iter().all(|face| ![1, 4, 6].contains(face)));
    }

    #[test]
    fn test_roll_all_zero_weights_is_an_error() {
        let mut rng = small_rng(1);
        let die = int_die(&[1, 2]);
        die.change_weight(&1, 0.0).unwrap();
        die.change_weight(&2, 0.0).unwrap();

        let err = die.roll(3, &mut rng).unwrap_err();
        assert_eq!(Error::ZeroTotalWeight, err);
        assert_eq!(ErrorKind::State, err.kind());
        assert_eq!(Error::ZeroTotalWeight, die.roll_once(&mut rng).unwrap_err());
    }

    #[test]
    fn test_roll_reads_current_weights() {
        let mut rng = small_rng(42);
        let die = int_die(&[1, 2]);

        die.change_weight(&2, 0.0).unwrap();
        assert!(die.roll(100, &mut rng).unwrap().iter().all(|&f| f == 1));

        die.change_weight(&2, 1.0).unwrap();
        die.change_weight(&1, 0.0).unwrap();
        assert!(die.roll(100, &mut rng).unwrap().iter().all(|&f| f == 2));
    }

    #[test]
    fn test_face_distr() {
        let distr = FaceDistr::from_weights(&[1.0, 0.0, 3.0]).unwrap();
        assert_relative_eq!(4.0, distr.total_weight());
        assert_relative_eq!(0.25, distr.p_face(0));
        assert_relative_eq!(0.0, distr.p_face(1));
        assert_relative_eq!(0.75, distr.p_face(2));

        assert_eq!(0, distr.sample_to_face_idx(0.1));
        assert_eq!(0, distr.sample_to_face_idx(0.25));
        assert_eq!(2, distr.sample_to_face_idx(0.2500001));
        assert_eq!(2, distr.sample_to_face_idx(0.99999));

        // trailing zero-weight faces never get the rounding overshoot
        let distr = FaceDistr::from_weights(&[1.0, 1.0, 0.0]).unwrap();
        assert_eq!(1, distr.sample_to_face_idx(1.0 + 1e-12));

        assert_eq!(
            Error::ZeroTotalWeight,
            FaceDistr::from_weights(&[0.0, 0.0]).unwrap_err()
        );
        assert_eq!(
            ErrorKind::Validation,
            FaceDistr::from_weights(&[f64::MAX, f64::MAX])
                .unwrap_err()
                .kind()
        );
    }

    #[test]
    fn test_state_pmf() {
        let die = int_die(&[1, 2, 3, 4]);
        die.change_weight(&4, 5.0).unwrap();

        let state = die.current_state();
        assert_relative_eq!(8.0, state.total_weight());

        let pmf = state.pmf();
        assert_eq!(4, pmf.len());
        assert_relative_eq!(0.125, pmf[0].1);
        assert_relative_eq!(0.625, pmf[3].1);

        for face in [1, 2, 3, 4] {
            die.change_weight(&face, 0.0).unwrap();
        }
        assert!(die.current_state().pmf().is_empty());
    }

    #[test]
    fn test_fit_pvalue() {
        let mut rng = small_rng(0xd15c0);

        let loaded = int_die(&[1, 2, 3, 4, 5, 6]);
        loaded.change_weight(&6, 5.0).unwrap();
        let fair = int_die(&[1, 2, 3, 4, 5, 6]);

        let samples = loaded.roll(10_000, &mut rng).unwrap();

        // samples look like they came from the loaded die, not the fair one.
        assert_gt!(loaded.fit_pvalue(&samples).unwrap(), 1e-4);
        assert_lt!(fair.fit_pvalue(&samples).unwrap(), 1e-4);

        let err = fair.fit_pvalue(&[1, 9]).unwrap_err();
        assert_eq!(ErrorKind::Lookup, err.kind());
    }

    #[test]
    fn test_face_value_die() {
        let mut rng = small_rng(11);
        let die = face_value_die(&[1, 2, 3]);
        die.change_weight(&FaceValue::Int(2), 0.0).unwrap();

        // a float face with the same value is a different face
        let err = die.change_weight(&FaceValue::Float(2.0), 1.0).unwrap_err();
        assert_eq!(Error::UnknownFace("Float(2.0)".into()), err);

        let rolls = die.roll(100, &mut rng).unwrap();
        assert!(!rolls.contains(&FaceValue::Int(2)));
    }

    proptest! {
        #[test]
        fn test_prop_roll_len_and_support(
            faces in arb_faces(),
            n in 0_usize..200,
            mut rng in arb_rng(),
        ) {
            let die = int_die(&faces);
            let rolls = die.roll(n, &mut rng).unwrap();
            prop_assert_eq!(n, rolls.len());
            prop_assert!(rolls.iter().all(|face| die.has_face(face)));
        }

        #[test]
        fn test_prop_zero_weight_face_not_drawn(
            faces in arb_faces(),
            zero_idx in any::<Index>(),
            mut rng in arb_rng(),
        ) {
            prop_assume!(faces.len() > 1);
            let die = int_die(&faces);
            let zero_face = faces[zero_idx.index(faces.len())];
            die.change_weight(&zero_face, 0.0).unwrap();

            let rolls = die.roll(500, &mut rng).unwrap();
            prop_assert!(!rolls.contains(&zero_face));
        }
    }
}
