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

//! Structure/texture split of a color image.
//!
//! Every channel is brought to `[0, 1]` and diffused on its own for a fixed
//! number of Perona-Malik steps. The diffused field is the structure, and
//! what diffusion removed (`normalized - structure`) is the texture.

use std::mem;

use ndarray::prelude::*;
use ndarray::{Array2, Array3, ArrayView3, NdFloat};

use crate::cancel::CancelToken;
use crate::diffusion::{check_step, diffuse_region, EdgeStop};
use crate::error::{InpaintError, Result};
use crate::field::{all_finite, lit, split_channels, ValueRange};
use crate::frames::{FrameCapture, FrameRecorder};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecomposeParams {
    /// Contrast parameter of the edge-stopping function.
    pub k: f64,
    pub dt: f64,
    pub max_iters: usize,
    pub edge_stop: EdgeStop,
    /// Range of the input values, used for normalization.
    pub range: ValueRange,
    pub capture: Option<FrameCapture>,
}

impl Default for DecomposeParams {
    fn default() -> Self {
        DecomposeParams {
            k: 0.04,
            dt: 1.0 / 45.0,
            max_iters: 2000,
            edge_stop: EdgeStop::default(),
            range: ValueRange::default(),
            capture: None,
        }
    }
}

impl DecomposeParams {
    pub fn validate(&self) -> Result<()> {
        check_step(self.k, self.dt)?;
        if let Some(capture) = &self.capture {
            capture.validate()?;
        }
        Ok(())
    }
}

/// Result of [`decompose`]. All arrays are `H x W x 3` in normalized units.
#[derive(Clone, Debug)]
pub struct Decomposition<T> {
    pub structure: Array3<T>,
    pub texture: Array3<T>,
    /// Normalized input followed by the structure at every captured
    /// iteration. Empty unless frame capture was requested.
    pub frames: Vec<Array3<T>>,
}

impl<T: NdFloat> Decomposition<T> {
    /// Texture removed up to each captured frame (`frames[0] - frames[i]`).
    pub fn texture_frames(&self) -> Vec<Array3<T>> {
        match self.frames.first() {
            Some(original) => self.frames.iter().map(|frame| original - frame).collect(),
            None => Vec::new(),
        }
    }
}

/// Split `image` (`H x W x 3`) into structure and texture.
pub fn decompose<T: NdFloat>(
    image: ArrayView3<T>,
    params: &DecomposeParams,
) -> Result<Decomposition<T>> {
    decompose_with_cancel(image, params, &CancelToken::new())
}

/// [`decompose`] that checks `cancel` before every diffusion step.
pub fn decompose_with_cancel<T: NdFloat>(
    image: ArrayView3<T>,
    params: &DecomposeParams,
    cancel: &CancelToken,
) -> Result<Decomposition<T>> {
    params.validate()?;
    let channels = split_channels(image)?;
    let (height, width) = channels[0].dim();
    log::debug!(
        "Decomposing {height}x{width} image: K={}, dt={}, {} iterations",
        params.k,
        params.dt,
        params.max_iters
    );

    let k = lit::<T>(params.k);
    let dt = lit::<T>(params.dt);
    let max_value = lit::<T>(params.range.max_value());

    let mut structure = Array3::<T>::zeros((height, width, 3));
    let mut texture = Array3::<T>::zeros((height, width, 3));
    let mut channel_frames: [Vec<Array2<T>>; 3] = Default::default();

    for (c, channel) in channels.iter().enumerate() {
        let normalized = channel.mapv(|v| v / max_value);
        let mut u = normalized.clone();
        let mut next = Array2::<T>::zeros(u.dim());
        let mut recorder =
            FrameRecorder::new(params.capture.as_ref(), params.max_iters, normalized.view());

        for n in 0..params.max_iters {
            cancel.check(n)?;
            diffuse_region(u.view(), next.view_mut(), None, k, dt, params.edge_stop);
            mem::swap(&mut u, &mut next);
            if !all_finite(u.view()) {
                log::debug!("channel {c} diverged at iteration {n}");
                return Err(InpaintError::NumericalInstability {
                    iteration: n,
                    channel: c,
                });
            }
            if recorder.is_due(n) {
                log::trace!("channel {c}: iteration {n} of {}", params.max_iters);
            }
            recorder.record(n, u.view());
        }

        texture
            .index_axis_mut(Axis(2), c)
            .assign(&(&normalized - &u));
        structure.index_axis_mut(Axis(2), c).assign(&u);
        channel_frames[c] = recorder.into_frames();
    }

    let frames = stack_frames(channel_frames);
    log::debug!("Decomposition done, {} frames captured", frames.len());
    Ok(Decomposition {
        structure,
        texture,
        frames,
    })
}

fn stack_frames<T: NdFloat>(channel_frames: [Vec<Array2<T>>; 3]) -> Vec<Array3<T>> {
    let count = channel_frames[0].len();
    (0..count)
        .map(|i| {
            let (height, width) = channel_frames[0][i].dim();
            let mut frame = Array3::<T>::zeros((height, width, 3));
            for (c, frames) in channel_frames.iter().enumerate() {
                frame.index_axis_mut(Axis(2), c).assign(&frames[i]);
            }
            frame
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_delta;

    fn unit_params(max_iters: usize) -> DecomposeParams {
        DecomposeParams {
            k: 0.06,
            dt: 1.0 / 45.0,
            max_iters,
            range: ValueRange::Unit,
            ..Default::default()
        }
    }

    fn striped(height: usize, width: usize) -> Array3<f64> {
        Array3::from_shape_fn((height, width, 3), |(i, j, c)| {
            let stripe = if (i / 2 + j) % 2 == 0 { 40.0 } else { 200.0 };
            stripe + 10.0 * c as f64
        })
    }

    #[test]
    fn flat_gray_image_is_pure_structure() {
        let image = Array3::from_elem((16, 16, 3), 0.5f64);
        let result = decompose(image.view(), &unit_params(100)).unwrap();
        for (&s, &i) in result.structure.iter().zip(image.iter()) {
            assert_delta!(s, i, 1e-6);
        }
        for &t in result.texture.iter() {
            assert_delta!(t, 0.0, 1e-6);
        }
        assert!(result.frames.is_empty());
    }

    #[test]
    fn structure_plus_texture_is_the_normalized_input() {
        let image = striped(12, 10);
        let params = DecomposeParams {
            max_iters: 30,
            ..Default::default()
        };
        let result = decompose(image.view(), &params).unwrap();
        for ((&s, &t), &i) in result
            .structure
            .iter()
            .zip(result.texture.iter())
            .zip(image.iter())
        {
            assert_delta!(s + t, i / 255.0, 1e-12);
        }
        let energy: f64 = result.texture.iter().map(|t| t * t).sum();
        assert!(energy > 0.0);
    }

    #[test]
    fn zero_iterations_leave_texture_empty() {
        let image = striped(6, 6);
        let mut params = unit_params(0);
        params.range = ValueRange::Byte;
        let result = decompose(image.view(), &params).unwrap();
        assert!(result.texture.iter().all(|&t| t == 0.0));
    }

    #[test]
    fn frames_follow_the_stride_rule() {
        let image = striped(8, 8);
        let capture = FrameCapture {
            fps: 2.0,
            duration_secs: 3.0,
        };
        let mut params = unit_params(20);
        params.capture = Some(capture);
        let result = decompose(image.view(), &params).unwrap();
        // stride floor(20 / 6) = 3 -> initial + iterations 0,3,...,18
        assert_eq!(result.frames.len(), 8);
        assert_eq!(result.frames.len(), capture.frame_count(20));
        assert_eq!(result.frames[0], image);
        let texture_frames = result.texture_frames();
        assert!(texture_frames[0].iter().all(|&t| t == 0.0));
        assert_eq!(texture_frames.len(), result.frames.len());
    }

    #[test]
    fn invalid_parameters_are_rejected_before_iterating() {
        let image = striped(4, 4);
        for params in [
            DecomposeParams { dt: 0.0, ..Default::default() },
            DecomposeParams { dt: 0.5, ..Default::default() },
            DecomposeParams { k: -1.0, ..Default::default() },
            DecomposeParams {
                capture: Some(FrameCapture { fps: 24.0, duration_secs: 0.0 }),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                decompose(image.view(), &params),
                Err(InpaintError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn non_finite_values_abort_the_run() {
        let mut image = Array3::from_elem((5, 5, 3), 0.5f64);
        image[(2, 2, 1)] = f64::NAN;
        assert_eq!(
            decompose(image.view(), &unit_params(10)).unwrap_err(),
            InpaintError::NumericalInstability {
                iteration: 0,
                channel: 1
            }
        );
    }

    #[test]
    fn cancelled_token_stops_before_first_step() {
        let image = striped(4, 4);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            decompose_with_cancel(image.view(), &unit_params(5), &cancel).unwrap_err(),
            InpaintError::Cancelled { iteration: 0 }
        );
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let image = striped(9, 7);
        let params = DecomposeParams {
            max_iters: 25,
            ..Default::default()
        };
        let a = decompose(image.view(), &params).unwrap();
        let b = decompose(image.view(), &params).unwrap();
        assert_eq!(a.structure, b.structure);
        assert_eq!(a.texture, b.texture);
    }
}
