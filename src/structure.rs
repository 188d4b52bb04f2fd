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

//! Structural inpainting: extend the geometry surrounding a hole into it.
//!
//! The hole is seeded with a neutral value and then relaxed towards the
//! harmonic extension of its boundary. Every outer iteration first runs a few
//! Perona-Malik passes over the hole grown by `dilation_radius`, which carries
//! edges that cross the hole border inwards, then one weighted four-neighbour
//! average over the hole itself. Pixels outside the hole are restored from the
//! input after every iteration, so they never drift.

use std::cmp;
use std::mem;

use ndarray::prelude::*;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, NdFloat, Zip};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::cancel::CancelToken;
use crate::diffusion::{diffuse_region, EdgeStop, STABILITY_LIMIT};
use crate::error::{InpaintError, Result};
use crate::field::{check_mask, check_positive, hole_size, lit, Channels};
use crate::frames::{FrameCapture, FrameRecorder};
use crate::morphology::dilate;

/// Value the hole starts from before any relaxation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitialFill {
    /// Mean of the known pixels that touch the hole.
    #[default]
    BoundaryMean,
    /// Boundary mean plus seeded gaussian noise of deviation `sigma`.
    Noise { seed: u64, sigma: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuralParams {
    /// Number of outer iterations. There is no convergence test.
    pub max_iters: usize,
    /// Perona-Malik passes per outer iteration.
    pub anisotropic_iters: usize,
    /// Relaxation weight, in `(0, 1]`.
    pub dt: f64,
    pub dilation_radius: usize,
    pub diffusion_k: f64,
    pub dt_anisotropic: f64,
    pub edge_stop: EdgeStop,
    pub initial_fill: InitialFill,
    pub capture: Option<FrameCapture>,
}

impl Default for StructuralParams {
    fn default() -> Self {
        StructuralParams {
            max_iters: 30000,
            anisotropic_iters: 1,
            dt: 0.545,
            dilation_radius: 1,
            diffusion_k: 0.06,
            dt_anisotropic: 1.0 / 45.0,
            edge_stop: EdgeStop::default(),
            initial_fill: InitialFill::default(),
            capture: None,
        }
    }
}

impl StructuralParams {
    pub fn validate(&self) -> Result<()> {
        check_positive("dt", self.dt)?;
        if self.dt > 1.0 {
            return Err(InpaintError::invalid_parameter(
                "dt",
                format!("relaxation weight {} is larger than 1", self.dt),
            ));
        }
        check_positive("diffusion_k", self.diffusion_k)?;
        check_positive("dt_anisotropic", self.dt_anisotropic)?;
        if self.dt_anisotropic > STABILITY_LIMIT {
            return Err(InpaintError::invalid_parameter(
                "dt_anisotropic",
                format!(
                    "{} exceeds the explicit stability bound {STABILITY_LIMIT}",
                    self.dt_anisotropic
                ),
            ));
        }
        if let InitialFill::Noise { sigma, .. } = self.initial_fill {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(InpaintError::invalid_parameter(
                    "sigma",
                    format!("must be finite and >= 0, got {sigma}"),
                ));
            }
        }
        if let Some(capture) = &self.capture {
            capture.validate()?;
        }
        Ok(())
    }
}

/// Output of [`inpaint_structure`].
#[derive(Clone, Debug)]
pub struct StructureInpainting<T> {
    pub field: Array2<T>,
    /// Seeded field followed by the field at every captured iteration.
    pub frames: Vec<Array2<T>>,
}

/// Fill the pixels of `field` where `mask` is true.
///
/// Values of `field` inside the hole are never read. Outside the hole the
/// output is a bitwise copy of the input.
pub fn inpaint_structure<T: NdFloat>(
    field: ArrayView2<T>,
    mask: ArrayView2<bool>,
    params: &StructuralParams,
) -> Result<StructureInpainting<T>> {
    inpaint_structure_with_cancel(field, mask, params, &CancelToken::new())
}

/// [`inpaint_structure`] that checks `cancel` once per outer iteration.
pub fn inpaint_structure_with_cancel<T: NdFloat>(
    field: ArrayView2<T>,
    mask: ArrayView2<bool>,
    params: &StructuralParams,
    cancel: &CancelToken,
) -> Result<StructureInpainting<T>> {
    params.validate()?;
    check_mask(field.dim(), &mask)?;
    inpaint_channel(field, mask, params, cancel, 0)
}

/// Run [`inpaint_structure`] on three channels at once.
///
/// The channels never read each other, so the three calls run in parallel.
pub fn inpaint_structure_channels<T: NdFloat>(
    channels: &Channels<T>,
    mask: ArrayView2<bool>,
    params: &StructuralParams,
    cancel: &CancelToken,
) -> Result<[StructureInpainting<T>; 3]> {
    params.validate()?;
    for channel in channels {
        check_mask(channel.dim(), &mask)?;
    }

    let run = |c: usize| inpaint_channel(channels[c].view(), mask, params, cancel, c);
    let (first, (second, third)) = rayon::join(|| run(0), || rayon::join(|| run(1), || run(2)));
    Ok([first?, second?, third?])
}

fn inpaint_channel<T: NdFloat>(
    field: ArrayView2<T>,
    mask: ArrayView2<bool>,
    params: &StructuralParams,
    cancel: &CancelToken,
    channel: usize,
) -> Result<StructureInpainting<T>> {
    let holes = hole_size(&mask);
    if holes == 0 {
        log::warn!("channel {channel}: empty mask, nothing to inpaint");
        return Ok(StructureInpainting {
            field: field.to_owned(),
            frames: Vec::new(),
        });
    }
    if holes == mask.len() {
        return Err(InpaintError::invalid_mask(
            "mask covers the whole field, no boundary to extend from",
        ));
    }
    log::debug!(
        "channel {channel}: structural inpainting of {holes} pixels, {} iterations",
        params.max_iters
    );

    let region = dilate(mask, params.dilation_radius);
    let (rows, cols) = active_window(&region);

    let mut u = field.to_owned();
    seed_hole(u.view_mut(), mask, params.initial_fill)?;
    let mut scratch = u.clone();
    let mut recorder = FrameRecorder::new(params.capture.as_ref(), params.max_iters, u.view());

    let k = lit::<T>(params.diffusion_k);
    let dt_anisotropic = lit::<T>(params.dt_anisotropic);
    let dt = lit::<T>(params.dt);
    let window_mask = mask.slice(s![rows.0..rows.1, cols.0..cols.1]);
    let window_region = region.slice(s![rows.0..rows.1, cols.0..cols.1]);
    let window_known = field.slice(s![rows.0..rows.1, cols.0..cols.1]);

    for n in 0..params.max_iters {
        cancel.check(n)?;

        for _ in 0..params.anisotropic_iters {
            diffuse_region(
                u.slice(s![rows.0..rows.1, cols.0..cols.1]),
                scratch.slice_mut(s![rows.0..rows.1, cols.0..cols.1]),
                Some(window_region),
                k,
                dt_anisotropic,
                params.edge_stop,
            );
            mem::swap(&mut u, &mut scratch);
        }

        relax(
            u.slice(s![rows.0..rows.1, cols.0..cols.1]),
            scratch.slice_mut(s![rows.0..rows.1, cols.0..cols.1]),
            window_mask,
            dt,
        );
        mem::swap(&mut u, &mut scratch);

        let mut window = u.slice_mut(s![rows.0..rows.1, cols.0..cols.1]);
        Zip::from(&mut window)
            .and(&window_known)
            .and(&window_mask)
            .for_each(|value, &known, &hole| {
                if !hole {
                    *value = known;
                }
            });

        let finite = Zip::from(&window)
            .and(&window_mask)
            .all(|value, &hole| !hole || value.is_finite());
        if !finite {
            log::debug!("channel {channel}: hole diverged at iteration {n}");
            return Err(InpaintError::NumericalInstability {
                iteration: n,
                channel,
            });
        }

        if recorder.is_due(n) {
            log::trace!("channel {channel}: iteration {n} of {}", params.max_iters);
        }
        recorder.record(n, u.view());
    }

    Ok(StructureInpainting {
        field: u,
        frames: recorder.into_frames(),
    })
}

/// One weighted four-neighbour average over the hole:
/// `u' = u + dt * (mean4(u) - u)`.
fn relax<T: NdFloat>(
    input: ArrayView2<T>,
    output: ArrayViewMut2<T>,
    hole: ArrayView2<bool>,
    dt: T,
) {
    let mut output = output;
    let (height, width) = input.dim();
    let quarter = lit::<T>(0.25);

    for row in 0..height {
        let north = row.saturating_sub(1);
        let south = cmp::min(row + 1, height - 1);
        for col in 0..width {
            let centre = input[(row, col)];
            if hole[(row, col)] {
                let west = col.saturating_sub(1);
                let east = cmp::min(col + 1, width - 1);
                let mean = (input[(north, col)]
                    + input[(south, col)]
                    + input[(row, east)]
                    + input[(row, west)])
                    * quarter;
                output[(row, col)] = centre + dt * (mean - centre);
            } else {
                output[(row, col)] = centre;
            }
        }
    }
}

/// Row and column ranges of the smallest window holding `region` plus a
/// one-pixel margin, clipped to the field.
fn active_window(region: &Array2<bool>) -> ((usize, usize), (usize, usize)) {
    let (height, width) = region.dim();
    let mut rows = (height, 0);
    let mut cols = (width, 0);
    for ((i, j), &active) in region.indexed_iter() {
        if active {
            rows = (cmp::min(rows.0, i), cmp::max(rows.1, i));
            cols = (cmp::min(cols.0, j), cmp::max(cols.1, j));
        }
    }
    (
        (rows.0.saturating_sub(1), cmp::min(rows.1 + 2, height)),
        (cols.0.saturating_sub(1), cmp::min(cols.1 + 2, width)),
    )
}

fn seed_hole<T: NdFloat>(
    field: ArrayViewMut2<T>,
    mask: ArrayView2<bool>,
    initial_fill: InitialFill,
) -> Result<()> {
    let mut field = field;
    let mean = boundary_mean(field.view(), mask);
    match initial_fill {
        InitialFill::BoundaryMean => {
            Zip::from(&mut field).and(&mask).for_each(|value, &hole| {
                if hole {
                    *value = mean;
                }
            });
        }
        InitialFill::Noise { seed, sigma } => {
            let mean = mean.to_f64().unwrap_or(f64::NAN);
            let normal = Normal::new(mean, sigma)
                .map_err(|e| InpaintError::invalid_parameter("sigma", e.to_string()))?;
            let mut rng = StdRng::seed_from_u64(seed);
            // raster order keeps the draw sequence stable
            for (value, &hole) in field.iter_mut().zip(mask.iter()) {
                if hole {
                    *value = lit(normal.sample(&mut rng));
                }
            }
        }
    }
    Ok(())
}

/// Mean of the known pixels with at least one four-neighbour in the hole.
fn boundary_mean<T: NdFloat>(field: ArrayView2<T>, mask: ArrayView2<bool>) -> T {
    let (height, width) = field.dim();
    let mut sum = T::zero();
    let mut count = 0usize;
    for ((row, col), &hole) in mask.indexed_iter() {
        if hole {
            continue;
        }
        let touches_hole = (row > 0 && mask[(row - 1, col)])
            || (row + 1 < height && mask[(row + 1, col)])
            || (col > 0 && mask[(row, col - 1)])
            || (col + 1 < width && mask[(row, col + 1)]);
        if touches_hole {
            sum += field[(row, col)];
            count += 1;
        }
    }
    sum / lit(count as f64)
}
