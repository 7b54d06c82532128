use claim::debug_assert_le;
use log::debug;
use ndarray::{Array1, ArrayView1, Zip};
use statrs::distribution::{ChiSquared, ContinuousCDF};

const EPS: f64 = 1e-10;

/// Normalize raw counts into a dense PMF. All zeros if there are no counts.
pub fn pmf_from_counts(counts: &[usize]) -> Array1<f64> {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return Array1::zeros(counts.len());
    }
    counts
        .iter()
        .map(|&count| (count as f64) / (n as f64))
        .collect()
}

/// Return true iff `supp(p) ⊆ supp(q)` for dense PMFs `p` and `q`.
pub fn is_pmf_subset(p: ArrayView1<f64>, q: ArrayView1<f64>) -> bool {
    Zip::from(p).and(q).all(|&p_i, &q_i| {
        // A = (q_i == 0.0)
        // B = (p_i == 0.0)
        // (A ==> B) <==> (¬A ∨ B)
        (q_i > 0.0) || (p_i <= 0.0)
    })
}

/// Compute the [KL-divergence](https://www.wikiwand.com/en/Kullback%E2%80%93Leibler_divergence).
/// between dense PMFs `p` and `q`.
///
/// `D_{KL}(p || q) = \sum_i p_i * \ln(p_i / q_i)`
///
/// Note: p's support must be a subset of q's support, i.e., `q_i = 0` implies
///       `p_i = 0`.
pub fn kl_divergence(p: ArrayView1<f64>, q: ArrayView1<f64>) -> f64 {
    // caller should check this before
    debug_assert!(is_pmf_subset(p, q));

    Zip::from(p)
        .and(q)
        .fold(0.0, |sum, &p_i, &q_i| sum + kl_div_term(p_i, q_i))
}

#[inline]
fn kl_div_term(p_i: f64, q_i: f64) -> f64 {
    if p_i <= EPS {
        0.0
    } else if q_i > EPS {
        p_i * (p_i / q_i).ln()
    } else {
        f64::INFINITY
    }
}

/// The G-test statistic, comparing an observed multinomial distribution
/// `p_hat` (from `n` samples) with the expected distribution `p`. Approximates
/// the chi^2-test statistic for large `n`.
///
/// G-test: https://www.wikiwand.com/en/G-test
pub fn g_test(n: usize, p: ArrayView1<f64>, p_hat: ArrayView1<f64>) -> f64 {
    (n as f64) * (2.0 * kl_divergence(p_hat, p))
}

/// The CDF of the Chi^2-distribution with `dof` degrees of freedom. `None` if
/// `dof` isn't positive.
pub fn chisq_cdf(dof: f64, x: f64) -> Option<f64> {
    ChiSquared::new(dof).ok().map(|distr| distr.cdf(x))
}

/// A goodness-of-fit test between a hypothesized multinomial distribution, `p`,
/// and an experimentally observed distribution, `p_hat`, both dense PMFs. `n`
/// is the number of samples behind `p_hat`.
///
/// Returns a p-value, `Pr[G(x) >= g | H_0: x ~ p]`.
pub fn multinomial_test(n: usize, p: ArrayView1<f64>, p_hat: ArrayView1<f64>) -> f64 {
    // impossible to draw p_hat from p
    if !is_pmf_subset(p_hat, p) {
        return 0.0;
    }

    // no samples, no evidence against p
    if n == 0 {
        return 1.0;
    }

    // want to compute the DOF (nnz of p)
    let nnz = p.fold(0.0, |nnz, &x| nnz + if x > 0.0 { 1.0 } else { 0.0 });
    let dof = nnz - 1.0;
    debug_assert_le!(nnz, p.dim() as f64);

    let g = g_test(n, p, p_hat);

    // with a single possible outcome, the support check above already decided.
    let pvalue = match chisq_cdf(dof, g) {
        Some(cdf) => 1.0 - cdf,
        None => 1.0,
    };

    debug!(
        "multinomial_test: n: {n}, |p|: {}, dof: {dof}, g: {g}, p-value: {pvalue}",
        p.dim()
    );

    pvalue
}
