#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Row-scheduled Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points c on the complex plane for
//! which the orbit z -> z^2 + c stays bounded.  For every pixel of an
//! image we map the pixel to such a point and count how many steps its
//! orbit takes to leave a circle around the origin.  That count, the
//! escape time, is what the image is made of.
//!
//! The count is cheap far from the set and expensive close to it, so
//! the rows of an image differ in cost by orders of magnitude.  Rather
//! than carve the image into equal slabs, the renderer lets a pool of
//! workers claim rows one at a time from a shared atomic cursor until
//! none are left, and hands back the finished buffer once every worker
//! has been joined.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

pub mod buffer;
pub mod errors;
pub mod escape;
pub mod planes;
pub mod renderer;
pub mod scheduler;

pub use buffer::{EscapeBuffer, UNWRITTEN};
pub use errors::RenderError;
pub use escape::{escape_time, EscapeParams};
pub use planes::{IntegralPlane, Pixel, PlaneMapper};
pub use renderer::RowRenderer;
pub use scheduler::{drain_rows, worker_count, Cancellation, RowCursor, Schedule};

/// The view and parameters the renderer starts from when nobody says
/// otherwise.
pub mod defaults {
    /// Real part of the left edge of the view.
    pub const MIN_RE: f64 = -2.5;
    /// Real part of the right edge of the view.
    pub const MAX_RE: f64 = 1.0;
    /// Imaginary part of the bottom edge of the view.
    pub const MIN_IM: f64 = -1.0;
    /// Imaginary part of the top edge of the view.
    pub const MAX_IM: f64 = 1.0;
    /// Iteration cap.
    pub const MAX_ITERATIONS: u32 = 1000;
    /// Squared-magnitude escape threshold.
    pub const THRESHOLD: f64 = 4.0;
    /// Pixels per unit of the complex plane, used to size the image
    /// from the view.
    pub const SCALE: f64 = 400.0;
}
