// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time evaluator.  This is the per-pixel unit of work, and
//! the reason the scheduler hands out rows on demand: its cost runs
//! anywhere from a single step to the full iteration cap depending on
//! where the point sits relative to the boundary of the set.

use num::Complex;

use buffer::UNWRITTEN;
use defaults;
use errors::RenderError;

/// The fixed parameters of the iteration: how long we are willing to
/// wait for a point to escape, and what counts as escaping.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EscapeParams {
    /// The iteration cap.  Points that have not escaped after this
    /// many steps are treated as members of the set.
    pub max_iterations: u32,
    /// Escape threshold, compared against the *squared* magnitude of
    /// the orbit.
    pub threshold: f64,
}

impl EscapeParams {
    /// Builds a parameter set, rejecting caps that collide with the
    /// unwritten-cell sentinel and thresholds that can't be compared.
    pub fn new(max_iterations: u32, threshold: f64) -> Result<Self, RenderError> {
        if max_iterations >= UNWRITTEN {
            return Err(RenderError::CapTooLarge(max_iterations));
        }
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(RenderError::BadThreshold(threshold));
        }
        Ok(EscapeParams {
            max_iterations,
            threshold,
        })
    }

    /// Evaluate a single point under these parameters.
    #[inline]
    pub fn escape_time(&self, c: Complex<f64>) -> u32 {
        escape_time(c, self.max_iterations, self.threshold)
    }
}

impl Default for EscapeParams {
    fn default() -> Self {
        EscapeParams {
            max_iterations: defaults::MAX_ITERATIONS,
            threshold: defaults::THRESHOLD,
        }
    }
}

/// Iterate z -> z^2 + c, starting from z = c, and count the updates
/// that stayed inside the threshold.  A point whose very first update
/// escapes yields 0; a point that never escapes yields `max_iterations`.
#[inline]
pub fn escape_time(c: Complex<f64>, max_iterations: u32, threshold: f64) -> u32 {
    let (mut zr, mut zi) = (c.re, c.im);
    let mut iterations = 0;
    while iterations < max_iterations {
        let next_re = zr * zr - zi * zi + c.re;
        zi = 2.0 * zr * zi + c.im;
        zr = next_re;
        if zr * zr + zi * zi > threshold {
            break;
        }
        iterations += 1;
    }
    iterations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 100, 4.0), 100);
    }

    #[test]
    fn far_points_escape_immediately() {
        assert!(escape_time(Complex::new(1000.0, 1000.0), 100, 4.0) <= 2);
        assert_eq!(escape_time(Complex::new(1000.0, 1000.0), 100, 4.0), 0);
    }

    #[test]
    fn zero_cap_skips_the_recurrence() {
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 0, 4.0), 0);
        assert_eq!(escape_time(Complex::new(1000.0, 0.0), 0, 4.0), 0);
    }

    #[test]
    fn main_cardioid_reaches_the_cap() {
        assert_eq!(escape_time(Complex::new(-0.5, 0.0), 50, 4.0), 50);
        assert_eq!(escape_time(Complex::new(-1.0, 0.0), 500, 4.0), 500);
    }

    #[test]
    fn corner_of_the_default_view_escapes_at_once() {
        // z1 = (4 - 1 - 2, 4 - 1) = (1, 3), well past 4.
        assert_eq!(escape_time(Complex::new(-2.0, -1.0), 50, 4.0), 0);
    }

    #[test]
    fn counts_updates_before_escape() {
        // c = 1: z goes 2, 5, ...  |2|^2 = 4 is not > 4, |5|^2 is.
        assert_eq!(escape_time(Complex::new(1.0, 0.0), 10, 4.0), 1);
        // Lowering the threshold lets the first update escape.
        assert_eq!(escape_time(Complex::new(1.0, 0.0), 10, 3.9), 0);
    }

    #[test]
    fn params_reject_sentinel_cap() {
        assert!(EscapeParams::new(UNWRITTEN, 4.0).is_err());
        assert!(EscapeParams::new(UNWRITTEN - 1, 4.0).is_ok());
    }

    #[test]
    fn params_reject_bad_thresholds() {
        assert!(EscapeParams::new(10, 0.0).is_err());
        assert!(EscapeParams::new(10, -4.0).is_err());
        assert!(EscapeParams::new(10, ::std::f64::NAN).is_err());
        assert!(EscapeParams::new(10, ::std::f64::INFINITY).is_err());
    }

    #[test]
    fn default_params_are_valid() {
        let params = EscapeParams::default();
        assert_eq!(
            EscapeParams::new(params.max_iterations, params.threshold).unwrap(),
            params
        );
    }

    #[test]
    fn params_delegate_to_the_free_function() {
        let params = EscapeParams::new(64, 4.0).unwrap();
        let c = Complex::new(-0.75, 0.1);
        assert_eq!(params.escape_time(c), escape_time(c, 64, 4.0));
    }
}
