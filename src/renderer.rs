// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time renderer
//!
//! Ties the plane mapping, the evaluator and the row scheduler together:
//! a render allocates the whole buffer, lets the workers fill it row by
//! row, and only hands it back once every worker has been joined.

use itertools::iproduct;
use num::Complex;
use std::sync::atomic::AtomicU32;

use buffer::{EscapeBuffer, RowStore};
use errors::RenderError;
use escape::EscapeParams;
use planes::{Pixel, PlaneMapper};
use scheduler::{drain_rows, Cancellation, RowCursor, Schedule};

/// Takes a plane and a set of escape parameters and computes the
/// escape time of every pixel.  Once built it is never mutated, so a
/// single renderer can be shared by any number of threads.
#[derive(Copy, Clone, Debug)]
pub struct RowRenderer {
    plane: PlaneMapper,
    params: EscapeParams,
}

impl RowRenderer {
    /// Requires the width and height of the image, the left-lower and
    /// right-upper corners of the complex plane where the calculation
    /// will take place, and the escape parameters.
    pub fn new(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
        params: EscapeParams,
    ) -> Result<Self, RenderError> {
        let plane = PlaneMapper::new(width, height, leftlower, rightupper)?;
        Ok(RowRenderer { plane, params })
    }

    /// The pixel-to-point mapping this renderer uses.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// The escape parameters this renderer uses.
    pub fn params(&self) -> &EscapeParams {
        &self.params
    }

    /// The per-row unit of work: evaluate every column of `row` and
    /// store the results in `cells`, which must be that row.
    pub fn render_row(&self, row: usize, cells: &[AtomicU32]) {
        for (column, cell) in cells.iter().enumerate() {
            let point = self.plane.pixel_to_point(&Pixel(column, row));
            RowStore::write(cell, self.params.escape_time(point));
        }
    }

    /// The reference implementation: one thread, row-major sweep.
    pub fn render_single(&self) -> Result<EscapeBuffer, RenderError> {
        let store = RowStore::allocate(self.plane.width(), self.plane.height())?;
        for (row, column) in iproduct!(0..self.plane.height(), 0..self.plane.width()) {
            let point = self.plane.pixel_to_point(&Pixel(column, row));
            RowStore::write(&store.row(row)[column], self.params.escape_time(point));
        }
        Ok(store.finish())
    }

    /// Render with `threads` workers and hand back the finished buffer.
    pub fn render(&self, threads: usize) -> Result<EscapeBuffer, RenderError> {
        self.render_with(threads, &Cancellation::new())
            .map(|(buffer, _)| buffer)
    }

    /// Render with `threads` workers, stopping early if `cancel` is
    /// raised.  Rows that were never claimed hold `UNWRITTEN`.  Also
    /// returns how the rows were spread over the workers.
    pub fn render_with(
        &self,
        threads: usize,
        cancel: &Cancellation,
    ) -> Result<(EscapeBuffer, Schedule), RenderError> {
        let store = RowStore::allocate(self.plane.width(), self.plane.height())?;
        let cursor = RowCursor::new(store.height());
        info!(
            "rendering {}x{} at up to {} iterations",
            self.plane.width(),
            self.plane.height(),
            self.params.max_iterations
        );

        let schedule = {
            let store = &store;
            drain_rows(&cursor, threads, Some(cancel), |row| {
                self.render_row(row, store.row(row))
            })?
        };

        debug!("rows per worker: {:?}", schedule.rows_per_worker);
        Ok((store.finish(), schedule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buffer::UNWRITTEN;

    fn scenario(max_iterations: u32) -> RowRenderer {
        RowRenderer::new(
            100,
            50,
            Complex::new(-2.0, -1.0),
            Complex::new(1.0, 1.0),
            EscapeParams::new(max_iterations, 4.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_bad_planes() {
        let params = EscapeParams::new(10, 4.0).unwrap();
        assert!(RowRenderer::new(10, 10, Complex::new(1.0, 0.0), Complex::new(0.0, 1.0), params).is_err());
        assert!(RowRenderer::new(0, 10, Complex::new(0.0, 0.0), Complex::new(1.0, 1.0), params).is_err());
    }

    #[test]
    fn rejects_non_finite_views() {
        let params = EscapeParams::new(10, 4.0).unwrap();
        let upper = Complex::new(1.0, 1.0);
        let nan = RowRenderer::new(8, 4, Complex::new(::std::f64::NAN, -1.0), upper, params);
        match nan {
            Err(RenderError::NonFiniteCorner { .. }) => (),
            other => panic!("expected a non-finite corner error, got {:?}", other),
        }
        let inf = RowRenderer::new(8, 4, Complex::new(::std::f64::NEG_INFINITY, -1.0), upper, params);
        assert!(inf.is_err());
    }

    #[test]
    fn scenario_corner_and_center() {
        let buffer = scenario(50).render(4).unwrap();
        assert_eq!(buffer.width(), 100);
        assert_eq!(buffer.height(), 50);
        assert_eq!(buffer.get(0, 0), Some(0));
        assert_eq!(buffer.get(50, 25), Some(50));
    }

    #[test]
    fn values_stay_within_the_cap() {
        let buffer = scenario(50).render(3).unwrap();
        assert!(buffer.is_complete());
        assert!(buffer.as_slice().iter().all(|&v| v <= 50));
    }

    #[test]
    fn parallel_matches_single() {
        let renderer = scenario(200);
        let reference = renderer.render_single().unwrap();
        assert_eq!(renderer.render(1).unwrap(), reference);
        assert_eq!(renderer.render(7).unwrap(), reference);
    }

    #[test]
    fn zero_cap_is_all_zero() {
        let buffer = scenario(0).render(4).unwrap();
        assert!(buffer.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn render_row_fills_one_row() {
        let renderer = scenario(50);
        let store = RowStore::allocate(100, 50).unwrap();
        renderer.render_row(25, store.row(25));
        let buffer = store.finish();
        assert!(buffer.row(25).unwrap().iter().all(|&v| v != UNWRITTEN));
        assert_eq!(buffer.unwritten(), 100 * 49);
    }

    #[test]
    fn cancelled_render_leaves_rows_unwritten() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let (buffer, schedule) = scenario(50).render_with(2, &cancel).unwrap();
        assert!(schedule.cancelled);
        assert_eq!(schedule.rows(), 0);
        assert_eq!(buffer.unwritten(), buffer.len());
    }
}
