/*
For copyright information see the COPYRIGHT file included in the top-level
directory of this distribution.

Redistribution and use in source and binary forms, with or without modification,
are permitted provided that the following conditions are met:

     1. Redistributions of source code must retain the included copyright notice,
        this list of conditions and the following disclaimer.

     2. Redistributions in binary form must reproduce the included copyright
        notice, this list of conditions and the following disclaimer in the
        documentation and/or other materials provided with the distribution.

     3. Neither the names of the copyright holders nor the names of their
        contributors may be used to endorse or promote products derived from
        this software without specific prior written permission.

 THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND
 ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED
 WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
 DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDERS OR CONTRIBUTORS BE LIABLE
 FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
 DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
 SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
 CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
 OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
 OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
 */

//! Explicit Perona-Malik diffusion on a single scalar field.
//!
//! The update is `u' = u + dt * div(g(|grad u|) grad u)` discretized with
//! four-neighbour differences. Each of the north, south, east and west
//! differences carries its own conductance, so a strong step in one direction
//! stops the flux across it without affecting the other three. Neighbour
//! accesses are clamped to the image, which makes the difference across the
//! border zero (no flux through the border).

use std::cmp;

use ndarray::prelude::*;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, NdFloat, Zip};

use crate::error::{InpaintError, Result};
use crate::field::{check_positive, lit};

/// Largest `dt` for which the explicit four-neighbour update stays stable.
pub const STABILITY_LIMIT: f64 = 0.25;

/// Edge-stopping function `g` applied to the directional gradient magnitude.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeStop {
    /// `g(s) = exp(-(s/K)^2)`, strong edge preservation.
    #[default]
    Exponential,
    /// `g(s) = 1 / (1 + (s/K)^2)`, favours wide regions over small ones.
    Rational,
}

impl EdgeStop {
    /// Conductance for a gradient magnitude `gradient` and contrast `k`.
    #[inline]
    pub fn conductance<T: NdFloat>(self, gradient: T, k: T) -> T {
        let ratio = (gradient / k).powi(2);
        match self {
            Self::Exponential => (-ratio).exp(),
            Self::Rational => T::one() / (T::one() + ratio),
        }
    }
}

pub(crate) fn check_step(k: f64, dt: f64) -> Result<()> {
    check_positive("k", k)?;
    check_positive("dt", dt)?;
    if dt > STABILITY_LIMIT {
        return Err(InpaintError::invalid_parameter(
            "dt",
            format!("{dt} exceeds the explicit stability bound {STABILITY_LIMIT}"),
        ));
    }
    Ok(())
}

/// Apply one diffusion step to `field` and return the updated copy.
///
/// `k` must be positive and `dt` must lie in `(0, 1/4]`; values outside are
/// rejected with [`InpaintError::InvalidParameter`] instead of being clamped.
pub fn diffusion_step<T: NdFloat>(
    field: ArrayView2<T>,
    k: f64,
    dt: f64,
    edge_stop: EdgeStop,
) -> Result<Array2<T>> {
    check_step(k, dt)?;
    let mut output = Array2::<T>::zeros(field.dim());
    diffuse_region(field, output.view_mut(), None, lit(k), lit(dt), edge_stop);
    Ok(output)
}

/// Write one diffusion step of `input` into `output`.
///
/// Pixels outside `region` are copied unchanged. Neighbours outside the region
/// are still read, so values flow from the rest of the field into the region.
pub(crate) fn diffuse_region<T: NdFloat>(
    input: ArrayView2<T>,
    output: ArrayViewMut2<T>,
    region: Option<ArrayView2<bool>>,
    k: T,
    dt: T,
    edge_stop: EdgeStop,
) {
    let mut output = output;
    let (height, width) = input.dim();

    for row in 0..height {
        let north = row.saturating_sub(1);
        let south = cmp::min(row + 1, height - 1);
        for col in 0..width {
            let do_pixel = match &region {
                Some(r) => r[(row, col)],
                None => true,
            };

            let centre = input[(row, col)];
            if do_pixel {
                let west = col.saturating_sub(1);
                let east = cmp::min(col + 1, width - 1);
                let deltas = [
                    input[(north, col)] - centre,
                    input[(south, col)] - centre,
                    input[(row, east)] - centre,
                    input[(row, west)] - centre,
                ];
                let flux = deltas.iter().fold(T::zero(), |acc, &delta| {
                    acc + edge_stop.conductance(delta.abs(), k) * delta
                });
                output[(row, col)] = centre + dt * flux;
            } else {
                output[(row, col)] = centre;
            }
        }
    }
}

/// Anisotropic total variation: sum of absolute horizontal and vertical
/// neighbour differences.
pub fn total_variation<T: NdFloat>(field: ArrayView2<T>) -> T {
    let (height, width) = field.dim();
    let mut total = T::zero();
    if width > 1 {
        total = Zip::from(field.slice(s![.., 1..]))
            .and(field.slice(s![.., ..-1]))
            .fold(total, |acc, &a, &b| acc + (a - b).abs());
    }
    if height > 1 {
        total = Zip::from(field.slice(s![1.., ..]))
            .and(field.slice(s![..-1, ..]))
            .fold(total, |acc, &a, &b| acc + (a - b).abs());
    }
    total
}
