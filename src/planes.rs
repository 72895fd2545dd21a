// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners defining its leftlower and rightupper corners.
use num::Complex;

use errors::RenderError;

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.  Row 0 is the row nearest the *lower* edge of the
/// complex plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

impl IntegralPlane {
    /// Size an integral plane to cover the given corners at a fixed
    /// number of pixels per unit of the complex plane.  Fractional
    /// pixels are dropped.
    pub fn from_scale(leftlower: Complex<f64>, rightupper: Complex<f64>, scale: f64) -> Self {
        IntegralPlane(
            ((rightupper.re - leftlower.re).abs() * scale) as usize,
            ((rightupper.im - leftlower.im).abs() * scale) as usize,
        )
    }
}

/// Describes the lower-left corner and upper-right corner of the
/// Complex plane, treating the real part of each value as the
/// x-component and the imaginary part of each value as the
/// y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

/// Describes the column, row of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Contains the definitions of two planes, an integral cartesian plane
/// and a complex cartesian plane, and maps pixels from the first onto
/// points in the second.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The two coordinates defining the complex cartesian plane,
    /// left-lower and right-upper
    pub complex_plane: ComplexPlane,
    // The width and height, respectively, of one pixel on the complex
    // plane.
    steps: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane, and two
    /// points describing the complex plane.
    pub fn new(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<PlaneMapper, RenderError> {
        let corners = [leftlower.re, leftlower.im, rightupper.re, rightupper.im];
        if corners.iter().any(|v| !v.is_finite()) {
            return Err(RenderError::NonFiniteCorner {
                leftlower,
                rightupper,
            });
        }

        if rightupper.re < leftlower.re {
            return Err(RenderError::NotLeftOf);
        }

        if rightupper.im < leftlower.im {
            return Err(RenderError::NotBelow);
        }

        if rightupper.re == leftlower.re || rightupper.im == leftlower.im {
            return Err(RenderError::EmptyPlane {
                leftlower,
                rightupper,
            });
        }

        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage { width, height });
        }

        let steps = (
            (rightupper.re - leftlower.re) / (width as f64),
            (rightupper.im - leftlower.im) / (height as f64),
        );

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            complex_plane: ComplexPlane(leftlower, rightupper),
            steps,
        })
    }

    /// The number of columns in the integral plane.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// The number of rows in the integral plane.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// Given a pixel on the integral cartesian plane, map it to the
    /// point of the complex plane at the pixel's lower-left corner.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.complex_plane.0.re + (pixel.0 as f64) * self.steps.0,
            self.complex_plane.0.im + (pixel.1 as f64) * self.steps.1,
        )
    }
}
