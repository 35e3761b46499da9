//! Secant root finder with best-candidate tracking.

use tracing::{debug, warn};

/// Secant solver configuration.
#[derive(Clone, Debug)]
pub struct SecantConfig {
    /// Maximum secant updates after the two seeds
    pub max_iterations: usize,
    /// Converged when |r| falls below this
    pub abs_tol: f64,
    /// Stop when the update is smaller than this
    pub step_tol: f64,
    /// Optional closed interval every iterate is clamped into
    pub bounds: Option<(f64, f64)>,
    /// Halvings toward the last finite iterate after a non-finite residual
    pub max_backtracks: usize,
}

impl Default for SecantConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-3,
            step_tol: 1e-6,
            bounds: None,
            max_backtracks: 30,
        }
    }
}

/// Secant result. `x` is the candidate with the smallest |residual| seen.
#[derive(Clone, Debug, PartialEq)]
pub struct SecantResult {
    pub x: f64,
    pub residual: f64,
    /// Residual evaluations, seeds included
    pub evaluations: usize,
    pub converged: bool,
}

#[derive(Clone, Copy)]
struct Candidate {
    x: f64,
    r: f64,
}

impl Candidate {
    fn is_finite(&self) -> bool {
        self.r.is_finite()
    }

    fn better_than(&self, other: &Candidate) -> bool {
        self.is_finite() && (!other.is_finite() || self.r.abs() < other.r.abs())
    }
}

struct Search<'a, F> {
    f: F,
    config: &'a SecantConfig,
    evaluations: usize,
}

impl<F, E> Search<'_, F>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    fn clamp(&self, x: f64) -> f64 {
        match self.config.bounds {
            Some((lo, hi)) => x.clamp(lo, hi),
            None => x,
        }
    }

    fn eval(&mut self, x: f64) -> Result<Candidate, E> {
        let x = self.clamp(x);
        let r = (self.f)(x)?;
        self.evaluations += 1;
        Ok(Candidate { x, r })
    }

    /// Halve the distance from `bad` to the finite `anchor` until the
    /// residual is finite or the backtrack budget runs out.
    fn backtrack(&mut self, mut bad: Candidate, anchor: Candidate) -> Result<Candidate, E> {
        for _ in 0..self.config.max_backtracks {
            if bad.is_finite() {
                break;
            }
            let x = 0.5 * (bad.x + anchor.x);
            if x == bad.x || x == anchor.x {
                break;
            }
            bad = self.eval(x)?;
            debug!(x = bad.x, r = bad.r, "secant backtrack");
        }
        Ok(bad)
    }

    /// Two finite seeds, or `None` when no finite residual is found.
    fn seeds(&mut self, x0: f64, x1: f64) -> Result<Option<(Candidate, Candidate)>, E> {
        let mut prev = self.eval(x0)?;
        let mut curr = self.eval(x1)?;
        if !prev.is_finite() && !curr.is_finite() {
            let Some((lo, hi)) = self.config.bounds else {
                return Ok(None);
            };
            let mut anchor = None;
            for x in [lo, hi] {
                let c = self.eval(x)?;
                if c.is_finite() {
                    anchor = Some(c);
                    break;
                }
            }
            let Some(anchor) = anchor else {
                return Ok(None);
            };
            prev = self.backtrack(prev, anchor)?;
            curr = anchor;
        }
        if !prev.is_finite() {
            prev = self.backtrack(prev, curr)?;
        } else if !curr.is_finite() {
            curr = self.backtrack(curr, prev)?;
        }
        if !prev.is_finite() || !curr.is_finite() {
            return Ok(None);
        }
        Ok(Some((prev, curr)))
    }
}

/// Find a root of `f` starting from seeds `x0`, `x1`.
///
/// Errors returned by `f` abort the search. A non-finite residual marks an
/// infeasible trial: the iterate is pulled back toward the last finite one
/// by bisection. Exhausting the iteration cap, a vanishing secant slope, a
/// stalled step or an infeasible trial that cannot be recovered end the
/// search with `converged = false`; the best candidate is returned either
/// way. Its residual is non-finite only when no trial was feasible.
pub fn secant_solve<F, E>(x0: f64, x1: f64, f: F, config: &SecantConfig) -> Result<SecantResult, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let mut search = Search {
        f,
        config,
        evaluations: 0,
    };

    let Some((mut prev, mut curr)) = search.seeds(x0, x1)? else {
        warn!(
            evaluations = search.evaluations,
            "secant search found no finite residual"
        );
        return Ok(SecantResult {
            x: search.clamp(x1),
            residual: f64::NAN,
            evaluations: search.evaluations,
            converged: false,
        });
    };

    let mut best = if curr.better_than(&prev) { curr } else { prev };

    for iter in 0..config.max_iterations {
        if best.r.abs() < config.abs_tol {
            break;
        }
        let slope = curr.r - prev.r;
        if slope == 0.0 || !slope.is_finite() {
            debug!(iter, x = curr.x, "secant slope vanished");
            break;
        }
        let mut next = search.eval(curr.x - curr.r * (curr.x - prev.x) / slope)?;
        if !next.is_finite() {
            next = search.backtrack(next, curr)?;
        }
        debug!(iter, x = next.x, r = next.r, "secant iteration");

        if next.better_than(&best) {
            best = next;
        }
        if !next.is_finite() || (next.x - curr.x).abs() < config.step_tol {
            break;
        }
        prev = curr;
        curr = next;
    }

    let converged = best.r.abs() < config.abs_tol;
    if !converged {
        warn!(
            x = best.x,
            residual = best.r,
            evaluations = search.evaluations,
            "secant search did not reach tolerance; returning best candidate"
        );
    }
    Ok(SecantResult {
        x: best.x,
        residual: best.r,
        evaluations: search.evaluations,
        converged,
    })
}
