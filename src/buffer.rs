// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Storage for escape-time results.
//!
//! A render owns a `RowStore` while its workers are running: every
//! cell starts out holding `UNWRITTEN`, and each row is written by the
//! single worker that claimed it.  Once every worker has been joined
//! the store is finalised into an `EscapeBuffer`, which is what the
//! consumer of a render gets to read.

use std::slice::Chunks;
use std::sync::atomic::{AtomicU32, Ordering};

use errors::RenderError;

/// The value held by a cell no worker has written.  No iteration cap
/// is allowed to reach it.
pub const UNWRITTEN: u32 = ::std::u32::MAX;

/// Write side of the result buffer, shared by reference among the
/// workers.  Cells are write-once, and no worker reads them, so a
/// relaxed store is all a row needs; the join at the end of a render
/// publishes them.
#[derive(Debug)]
pub struct RowStore {
    width: usize,
    height: usize,
    cells: Vec<AtomicU32>,
}

impl RowStore {
    /// Allocate a `width` x `height` store, every cell `UNWRITTEN`.
    /// Fails up front, before any worker exists, if the memory isn't
    /// there.
    pub fn allocate(width: usize, height: usize) -> Result<Self, RenderError> {
        let len = width
            .checked_mul(height)
            .ok_or(RenderError::Allocation { width, height })?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| RenderError::Allocation { width, height })?;
        cells.extend((0..len).map(|_| AtomicU32::new(UNWRITTEN)));
        Ok(RowStore {
            width,
            height,
            cells,
        })
    }

    /// Number of rows, which is also the range of the work cursor.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The cells of one row.  Panics if `row` is out of range, which
    /// the cursor never lets happen.
    pub fn row(&self, row: usize) -> &[AtomicU32] {
        let start = row * self.width;
        &self.cells[start..start + self.width]
    }

    /// Store a result.  Only the worker owning the row calls this.
    #[inline]
    pub fn write(cell: &AtomicU32, value: u32) {
        cell.store(value, Ordering::Relaxed);
    }

    /// Hand the results over to the reader.  Taking `self` by value
    /// means no worker can still hold a reference to a row.
    pub fn finish(self) -> EscapeBuffer {
        EscapeBuffer {
            width: self.width,
            height: self.height,
            cells: self.cells.into_iter().map(AtomicU32::into_inner).collect(),
        }
    }
}

/// A finished render: one iteration count per pixel, row-major, row 0
/// first.
#[derive(Clone, Debug, PartialEq)]
pub struct EscapeBuffer {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl EscapeBuffer {
    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the buffer holds no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The iteration count at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    /// One row of iteration counts.
    pub fn row(&self, y: usize) -> Option<&[u32]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&self.cells[start..start + self.width])
    }

    /// Iterate over the rows, row 0 first.
    pub fn rows(&self) -> Chunks<u32> {
        self.cells.chunks(self.width.max(1))
    }

    /// The whole buffer as a flat row-major slice.
    pub fn as_slice(&self) -> &[u32] {
        &self.cells
    }

    /// Give up the buffer as a flat row-major vector.
    pub fn into_vec(self) -> Vec<u32> {
        self.cells
    }

    /// How many cells were never written.  Only a cancelled render
    /// leaves any.
    pub fn unwritten(&self) -> usize {
        self.cells.iter().filter(|&&v| v == UNWRITTEN).count()
    }

    /// True if every cell holds a result.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|&v| v != UNWRITTEN)
    }
}
