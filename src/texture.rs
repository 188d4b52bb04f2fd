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

//! Exemplar-based texture inpainting over three correlated channels.
//!
//! The hole is covered by a grid of `block_size` square target blocks. Blocks
//! are filled one at a time in onion-peel order: the block with the fewest
//! missing pixels and the most known surroundings goes first, so later blocks
//! can match against texture synthesized earlier. Each block is matched
//! against every window that lies entirely in the originally known region,
//! comparing R, G and B together, and the unknown pixels are copied from the
//! winning window in all three channels at once.

use std::cmp::{self, Reverse};

use ndarray::prelude::*;
use ndarray::{Array2, ArrayView2, NdFloat};
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::error::{InpaintError, Result};
use crate::field::{check_channels, check_mask, hole_size, lit, Channels};

/// Number of source windows scored in parallel before checking for an
/// acceptable match.
const SEARCH_CHUNK: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureParams {
    pub block_size: usize,
    /// Mean joint squared error under which a window is accepted at once.
    /// The first window in raster order at or below it wins; when none is,
    /// the best window wins, ties going to raster order.
    pub acceptable_error: f64,
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            block_size: 8,
            acceptable_error: 1.1,
        }
    }
}

impl TextureParams {
    /// Check the parameters against a field of shape `dim`.
    pub fn validate(&self, dim: (usize, usize)) -> Result<()> {
        let limit = cmp::min(dim.0, dim.1);
        if self.block_size == 0 || self.block_size >= limit {
            return Err(InpaintError::invalid_parameter(
                "block_size",
                format!("must be in 1..{limit}, got {}", self.block_size),
            ));
        }
        if !self.acceptable_error.is_finite() || self.acceptable_error < 0.0 {
            return Err(InpaintError::invalid_parameter(
                "acceptable_error",
                format!("must be finite and >= 0, got {}", self.acceptable_error),
            ));
        }
        Ok(())
    }
}

/// Channel values plus the known/unknown status of every pixel.
struct SynthesisBuffer<T> {
    values: Channels<T>,
    known: Array2<bool>,
}

impl<T: NdFloat> SynthesisBuffer<T> {
    fn new(channels: &Channels<T>, mask: ArrayView2<bool>) -> Self {
        SynthesisBuffer {
            values: channels.clone(),
            known: mask.mapv(|hole| !hole),
        }
    }

    /// `(unknown pixels inside, known pixels in the one-pixel surround)`
    fn block_status(&self, origin: (usize, usize), block: usize) -> (usize, usize) {
        let (height, width) = self.known.dim();
        let unknown = self
            .known
            .slice(s![origin.0..origin.0 + block, origin.1..origin.1 + block])
            .iter()
            .filter(|&&k| !k)
            .count();

        let rows = origin.0.saturating_sub(1)..cmp::min(origin.0 + block + 1, height);
        let cols = origin.1.saturating_sub(1)..cmp::min(origin.1 + block + 1, width);
        let surround = self
            .known
            .slice(s![rows, cols])
            .iter()
            .filter(|&&k| k)
            .count();
        let inside = block * block - unknown;
        (unknown, surround - inside)
    }

    /// Smallest margin around the block whose window holds a known pixel.
    fn comparison_margin(&self, origin: (usize, usize), block: usize) -> usize {
        let (height, width) = self.known.dim();
        let mut margin = 0;
        loop {
            let rows = origin.0.saturating_sub(margin)..cmp::min(origin.0 + block + margin, height);
            let cols = origin.1.saturating_sub(margin)..cmp::min(origin.1 + block + margin, width);
            let covers_field = rows.len() == height && cols.len() == width;
            if self.known.slice(s![rows, cols]).iter().any(|&k| k) || covers_field {
                return margin;
            }
            margin += 1;
        }
    }

    /// Mean joint squared difference between the target window and the source
    /// window, over pixels known at both positions.
    fn window_error(
        &self,
        target: (usize, usize),
        source: (usize, usize),
        block: usize,
        margin: usize,
    ) -> T {
        let (height, width) = self.known.dim();
        let (height, width) = (height as isize, width as isize);
        let (m, b) = (margin as isize, block as isize);
        let mut sum = T::zero();
        let mut count = 0usize;

        for dy in -m..b + m {
            let ty = target.0 as isize + dy;
            let sy = source.0 as isize + dy;
            if ty < 0 || sy < 0 || ty >= height || sy >= height {
                continue;
            }
            for dx in -m..b + m {
                let tx = target.1 as isize + dx;
                let sx = source.1 as isize + dx;
                if tx < 0 || sx < 0 || tx >= width || sx >= width {
                    continue;
                }
                let t = (ty as usize, tx as usize);
                let s = (sy as usize, sx as usize);
                if !self.known[t] || !self.known[s] {
                    continue;
                }
                sum += self.values.iter().fold(T::zero(), |acc, channel| {
                    let d = channel[t] - channel[s];
                    acc + d * d
                });
                count += 1;
            }
        }

        if count == 0 {
            T::infinity()
        } else {
            sum / lit(count as f64)
        }
    }

    /// Copy the source block into the unknown pixels of the target block.
    fn copy_block(&mut self, source: (usize, usize), target: (usize, usize), block: usize) {
        for dy in 0..block {
            for dx in 0..block {
                let t = (target.0 + dy, target.1 + dx);
                if self.known[t] {
                    continue;
                }
                let s = (source.0 + dy, source.1 + dx);
                for channel in self.values.iter_mut() {
                    channel[t] = channel[s];
                }
                self.known[t] = true;
            }
        }
    }
}

/// Fill the hole of three channels jointly from matching known blocks.
///
/// Outside the hole every channel is returned bitwise unchanged.
pub fn inpaint_texture<T: NdFloat>(
    channels: &Channels<T>,
    mask: ArrayView2<bool>,
    params: &TextureParams,
) -> Result<Channels<T>> {
    inpaint_texture_with_cancel(channels, mask, params, &CancelToken::new())
}

/// [`inpaint_texture`] that checks `cancel` before every target block.
pub fn inpaint_texture_with_cancel<T: NdFloat>(
    channels: &Channels<T>,
    mask: ArrayView2<bool>,
    params: &TextureParams,
    cancel: &CancelToken,
) -> Result<Channels<T>> {
    let dim = check_channels(channels)?;
    check_mask(dim, &mask)?;
    params.validate(dim)?;

    let holes = hole_size(&mask);
    if holes == 0 {
        log::warn!("empty mask, nothing to inpaint");
        return Ok(channels.clone());
    }
    if holes == mask.len() {
        return Err(InpaintError::invalid_mask(
            "mask covers the whole field, no texture to sample from",
        ));
    }

    let block = params.block_size;
    let sources = source_windows(mask, block);
    if sources.is_empty() {
        return Err(InpaintError::invalid_mask(format!(
            "no {block}x{block} window lies entirely outside the hole"
        )));
    }
    let mut targets = target_blocks(mask, block);
    log::debug!(
        "Texture inpainting of {holes} pixels: {} target blocks, {} source windows",
        targets.len(),
        sources.len()
    );

    let threshold = lit::<T>(params.acceptable_error);
    let mut buffer = SynthesisBuffer::new(channels, mask);
    let mut filled = 0;

    while !targets.is_empty() {
        cancel.check(filled)?;

        let next = next_target(&buffer, &targets, block);
        let target = targets.remove(next);
        if buffer.block_status(target, block).0 == 0 {
            continue;
        }

        let margin = buffer.comparison_margin(target, block);
        let source = best_source(&buffer, target, &sources, block, margin, threshold);
        log::trace!("block {target:?} <- {source:?} (margin {margin})");
        buffer.copy_block(source, target, block);
        filled += 1;
    }

    log::debug!("Texture inpainting done after {filled} blocks");
    Ok(buffer.values)
}

/// Origins of all windows made only of known pixels, in raster order.
fn source_windows(mask: ArrayView2<bool>, block: usize) -> Vec<(usize, usize)> {
    let (height, width) = mask.dim();
    // summed-area table of hole pixels
    let mut table = Array2::<usize>::zeros((height + 1, width + 1));
    for row in 0..height {
        for col in 0..width {
            table[(row + 1, col + 1)] = table[(row, col + 1)] + table[(row + 1, col)]
                - table[(row, col)]
                + usize::from(mask[(row, col)]);
        }
    }

    let mut windows = Vec::new();
    for row in 0..=height - block {
        for col in 0..=width - block {
            let holes = table[(row + block, col + block)] + table[(row, col)]
                - table[(row, col + block)]
                - table[(row + block, col)];
            if holes == 0 {
                windows.push((row, col));
            }
        }
    }
    windows
}

/// Grid blocks touching the hole, in raster order. Blocks on the last row and
/// column are shifted inwards so every block lies inside the field.
fn target_blocks(mask: ArrayView2<bool>, block: usize) -> Vec<(usize, usize)> {
    let (height, width) = mask.dim();
    let origins = |size: usize| -> Vec<usize> {
        let mut starts: Vec<usize> = (0..size.div_ceil(block))
            .map(|k| cmp::min(k * block, size - block))
            .collect();
        starts.dedup();
        starts
    };

    let mut blocks = Vec::new();
    for &row in &origins(height) {
        for &col in &origins(width) {
            let touches_hole = mask
                .slice(s![row..row + block, col..col + block])
                .iter()
                .any(|&m| m);
            if touches_hole {
                blocks.push((row, col));
            }
        }
    }
    blocks
}

/// Onion-peel order: fewest unknown pixels, then most known surroundings,
/// then raster order.
fn next_target<T: NdFloat>(
    buffer: &SynthesisBuffer<T>,
    targets: &[(usize, usize)],
    block: usize,
) -> usize {
    targets
        .iter()
        .enumerate()
        .min_by_key(|&(index, &origin)| {
            let (unknown, surround) = buffer.block_status(origin, block);
            (unknown, Reverse(surround), index)
        })
        .map(|(index, _)| index)
        .unwrap_or(0)
}

fn best_source<T: NdFloat>(
    buffer: &SynthesisBuffer<T>,
    target: (usize, usize),
    sources: &[(usize, usize)],
    block: usize,
    margin: usize,
    threshold: T,
) -> (usize, usize) {
    let mut scan = CandidateScan::new(threshold);
    let mut offset = 0;
    for chunk in sources.chunks(SEARCH_CHUNK) {
        let scored: Vec<T> = chunk
            .par_iter()
            .map(|&source| buffer.window_error(target, source, block, margin))
            .collect();
        let accepted = scored
            .iter()
            .enumerate()
            .any(|(index, &error)| scan.offer(offset + index, error));
        if accepted {
            break;
        }
        offset += chunk.len();
    }
    sources[scan.winner()]
}

/// Candidate choice over errors offered in raster order.
struct CandidateScan<T> {
    threshold: T,
    best: Option<(usize, T)>,
}

impl<T: NdFloat> CandidateScan<T> {
    fn new(threshold: T) -> Self {
        CandidateScan {
            threshold,
            best: None,
        }
    }

    /// Record the error of candidate `index`. Returns true once a candidate
    /// at or below the threshold is found; later offers must not be made.
    fn offer(&mut self, index: usize, error: T) -> bool {
        if error <= self.threshold {
            self.best = Some((index, error));
            return true;
        }
        match self.best {
            Some((_, best)) if error >= best || error.is_nan() => {}
            _ => self.best = Some((index, error)),
        }
        false
    }

    fn winner(&self) -> usize {
        self.best.map_or(0, |(index, _)| index)
    }
}
