// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong around a render.  The escape-time
//! computation itself is total; these are the checks made before the
//! workers start, plus the one thing that can go wrong while they run.

use num::Complex;

/// The error type returned by every fallible operation in this crate.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The real part of the left-lower corner is greater than that of
    /// the right-upper corner.
    #[fail(display = "The left lower corner is not to the left of the right upper corner.")]
    NotLeftOf,

    /// The imaginary part of the left-lower corner is greater than that
    /// of the right-upper corner.
    #[fail(display = "The left lower corner is not lower than the right upper corner.")]
    NotBelow,

    /// A coordinate of one of the corners is infinite or NaN.
    #[fail(display = "Plane corners must be finite, got {} and {}", leftlower, rightupper)]
    NonFiniteCorner {
        /// The left-lower corner as given.
        leftlower: Complex<f64>,
        /// The right-upper corner as given.
        rightupper: Complex<f64>,
    },

    /// The corners share a real or an imaginary part, so the view has
    /// no area and every pixel would land on the same line.
    #[fail(display = "Plane corners {} and {} enclose no area", leftlower, rightupper)]
    EmptyPlane {
        /// The left-lower corner as given.
        leftlower: Complex<f64>,
        /// The right-upper corner as given.
        rightupper: Complex<f64>,
    },

    /// One of the image dimensions is zero.
    #[fail(display = "Image dimensions must be non-zero, got {}x{}", width, height)]
    EmptyImage {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },

    /// The iteration cap would be indistinguishable from an unwritten
    /// cell.
    #[fail(display = "Iteration cap {} is reserved for unwritten cells", _0)]
    CapTooLarge(u32),

    /// The escape threshold is zero, negative, infinite or NaN.
    #[fail(display = "Escape threshold must be a finite positive number, got {}", _0)]
    BadThreshold(f64),

    /// The buffer for the image could not be allocated.
    #[fail(display = "Could not allocate a {}x{} escape buffer", width, height)]
    Allocation {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },

    /// A row worker panicked before the cursor was exhausted.
    #[fail(display = "A row worker panicked")]
    WorkerPanicked,
}
