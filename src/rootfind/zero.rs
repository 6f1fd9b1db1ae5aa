//! Bisection/secant hybrid zero finder with sign-change probing.
//!
//! The solver keeps a bracket `[lo, hi]` with `f(lo)` and `f(hi)` of
//! opposite signs. Each iteration proposes a secant step from the bracket
//! endpoints; when the proposal falls outside the open bracket (or the
//! secant denominator degenerates) the iteration falls back to the
//! midpoint, so the bracket width shrinks under all inputs.
//!
//! ## Failure semantics
//! Every failure path returns `f64::NAN`: no sign change found after the
//! probing budget, a non-finite function value at an endpoint, or an
//! exhausted iteration cap. Callers MUST treat a non-finite result as
//! failure and fall back to a moment-based estimate; the sentinel must
//! never be propagated into parameters.
use statrs::function::gamma::digamma;

/// Explicit per-call configuration for [`find_zero`].
///
/// - `tol`: absolute tolerance; the solver returns once `|f(x)| < tol` or
///   the bracket width falls below `tol`.
/// - `max_iter`: cap on bisection/secant iterations after bracketing.
/// - `max_probe`: cap on outward bracket expansions before giving up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOptions {
    pub tol: f64,
    pub max_iter: usize,
    pub max_probe: usize,
}

impl Default for RootOptions {
    /// `tol = 1e-8`, `max_iter = 100`, `max_probe = 60`.
    fn default() -> Self {
        RootOptions { tol: 1e-8, max_iter: 100, max_probe: 60 }
    }
}

/// Find a zero of a monotone continuous `f` near the bracket guess
/// `[lower, upper]`.
///
/// # Behavior
/// 1. If either guess already satisfies `|f(x)| < tol`, it is returned
///    immediately.
/// 2. If the guesses do not bracket a sign change, the bracket is probed
///    outward (lower endpoint halved, upper endpoint doubled — monotone
///    functions with a positive domain lower bound keep their sign change
///    reachable this way) up to `max_probe` times.
/// 3. With a sign change in hand, secant proposals are taken whenever they
///    land strictly inside the bracket, with midpoint bisection as the
///    fallback, until `|f| < tol`, the bracket is narrower than `tol`, or
///    `max_iter` is exhausted.
///
/// # Returns
/// A value within `tol` of the root, or `f64::NAN` when no sign change is
/// found or the iteration cap is reached.
pub fn find_zero<F>(f: F, lower: f64, upper: f64, opts: &RootOptions) -> f64
where
    F: Fn(f64) -> f64,
{
    let (mut lo, mut hi) = if lower <= upper { (lower, upper) } else { (upper, lower) };
    let mut flo = f(lo);
    let mut fhi = f(hi);
    if flo.is_nan() || fhi.is_nan() {
        return f64::NAN;
    }
    if flo.abs() < opts.tol {
        return lo;
    }
    if fhi.abs() < opts.tol {
        return hi;
    }

    // Probe outward until the endpoints straddle the root.
    let mut probe = 0;
    while flo.signum() == fhi.signum() {
        if probe >= opts.max_probe {
            return f64::NAN;
        }
        probe += 1;
        if flo.abs() <= fhi.abs() {
            lo *= 0.5;
            flo = f(lo);
            if flo.is_nan() {
                return f64::NAN;
            }
            if flo.abs() < opts.tol {
                return lo;
            }
        } else {
            hi *= 2.0;
            fhi = f(hi);
            if fhi.is_nan() {
                return f64::NAN;
            }
            if fhi.abs() < opts.tol {
                return hi;
            }
        }
    }

    for _ in 0..opts.max_iter {
        // Secant proposal from the bracket endpoints; midpoint fallback
        // keeps the bracket shrinking when the proposal is unusable.
        let denom = fhi - flo;
        let mut x = if denom != 0.0 && denom.is_finite() {
            hi - fhi * (hi - lo) / denom
        } else {
            f64::NAN
        };
        if !x.is_finite() || x <= lo || x >= hi {
            x = 0.5 * (lo + hi);
        }

        let fx = f(x);
        if fx.is_nan() {
            return f64::NAN;
        }
        if fx.abs() < opts.tol || (hi - lo) < opts.tol {
            return x;
        }
        if fx.signum() == flo.signum() {
            lo = x;
            flo = fx;
        } else {
            hi = x;
            fhi = fx;
        }
    }

    f64::NAN
}

/// Solve `digamma(a) = target` for `a > 0`.
///
/// `guess` seeds the bracket (typically the caller's moment estimate); an
/// invalid guess falls back to the classical asymptotic seed
/// `exp(target) + 1/2` for large targets and `-1/(target + γ)` near the
/// pole. Returns `f64::NAN` when the underlying solve fails; the Gamma
/// M-step then degrades gracefully to its moment estimate.
pub fn inverse_digamma(target: f64, guess: f64, opts: &RootOptions) -> f64 {
    if !target.is_finite() {
        return f64::NAN;
    }
    const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;
    let seed = if guess.is_finite() && guess > 0.0 {
        guess
    } else if target >= -2.22 {
        target.exp() + 0.5
    } else {
        -1.0 / (target + EULER_MASCHERONI)
    };
    let seed = if seed.is_finite() && seed > 0.0 { seed } else { 1.0 };
    find_zero(|a| digamma(a) - target, 0.5 * seed, 2.0 * seed, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Root recovery for bracketing and non-bracketing (probed) guesses.
    // - The NaN sentinel for functions with no root in reach.
    // - The immediate-return edge case when a guess already satisfies the
    //   tolerance.
    // - Digamma inversion round-trips.
    //
    // They intentionally DO NOT cover:
    // - The Gamma family's fallback policy on a NaN result; that is tested
    //   with the family.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify root recovery for a monotone function when the guesses bracket
    // the sign change.
    //
    // Given
    // -----
    // - f(x) = x^2 - 4 on [0.1, 5.0] (monotone there, root at 2).
    //
    // Expect
    // ------
    // - The returned value is within tolerance of 2.
    fn find_zero_recovers_bracketed_root() {
        // Arrange
        let opts = RootOptions::default();

        // Act
        let root = find_zero(|x| x * x - 4.0, 0.1, 5.0, &opts);

        // Assert
        assert!((root - 2.0).abs() < 1e-6, "root = {root}");
    }

    #[test]
    // Purpose
    // -------
    // Verify that non-bracketing guesses are rescued by outward probing.
    //
    // Given
    // -----
    // - f(x) = ln(x) with guesses [2, 3] (both positive values of f; the
    //   root x = 1 lies below the bracket).
    //
    // Expect
    // ------
    // - The lower endpoint is probed downward and the root 1 is found.
    fn find_zero_probes_outward_for_sign_change() {
        // Arrange
        let opts = RootOptions::default();

        // Act
        let root = find_zero(|x| x.ln(), 2.0, 3.0, &opts);

        // Assert
        assert!((root - 1.0).abs() < 1e-6, "root = {root}");
    }

    #[test]
    // Purpose
    // -------
    // Ensure a function with no root returns the NaN sentinel rather than
    // an out-of-bracket value.
    //
    // Given
    // -----
    // - f(x) = exp(x), strictly positive everywhere, on [1, 2].
    //
    // Expect
    // ------
    // - `f64::NAN` after the probing budget is exhausted.
    fn find_zero_returns_sentinel_without_root() {
        // Arrange
        let opts = RootOptions { tol: 1e-10, max_iter: 50, max_probe: 30 };

        // Act
        let root = find_zero(|x| x.exp(), 1.0, 2.0, &opts);

        // Assert
        assert!(root.is_nan());
    }

    #[test]
    // Purpose
    // -------
    // Verify the immediate-return edge case when a starting guess already
    // satisfies the tolerance.
    //
    // Given
    // -----
    // - f(x) = x - 2 with the lower guess exactly at the root.
    //
    // Expect
    // ------
    // - The guess itself is returned.
    fn find_zero_returns_satisfying_guess_immediately() {
        // Arrange
        let opts = RootOptions::default();

        // Act
        let root = find_zero(|x| x - 2.0, 2.0, 10.0, &opts);

        // Assert
        assert_eq!(root, 2.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify digamma inversion round-trips through well-conditioned shapes,
    // both with a good seed and with an invalid one.
    //
    // Given
    // -----
    // - Targets digamma(3.5) and digamma(0.7).
    //
    // Expect
    // ------
    // - Recovered shapes within 1e-6 of 3.5 and 0.7; no NaN sentinel.
    fn inverse_digamma_round_trips() {
        // Arrange
        let opts = RootOptions::default();

        // Act + Assert
        let a = inverse_digamma(digamma(3.5), 3.0, &opts);
        assert!((a - 3.5).abs() < 1e-6, "a = {a}");

        // Invalid guess falls back to the asymptotic seed.
        let b = inverse_digamma(digamma(0.7), f64::NAN, &opts);
        assert!((b - 0.7).abs() < 1e-6, "b = {b}");
    }
}
