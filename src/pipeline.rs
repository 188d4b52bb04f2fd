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

//! End-to-end restoration built from the three engines.

use ndarray::{Array3, ArrayView2, ArrayView3, NdFloat};

use crate::cancel::CancelToken;
use crate::decompose::{decompose_with_cancel, DecomposeParams};
use crate::error::{InpaintError, Result};
use crate::field::{check_mask, hole_size, lit, merge_channels, split_channels};
use crate::structure::{inpaint_structure_channels, StructuralParams};
use crate::texture::{inpaint_texture_with_cancel, TextureParams};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestoreParams {
    pub decompose: DecomposeParams,
    pub structure: StructuralParams,
    pub texture: TextureParams,
}

impl Default for RestoreParams {
    fn default() -> Self {
        RestoreParams {
            decompose: DecomposeParams {
                k: 0.06,
                max_iters: 3500,
                ..Default::default()
            },
            structure: StructuralParams::default(),
            texture: TextureParams::default(),
        }
    }
}

impl RestoreParams {
    pub fn validate(&self, dim: (usize, usize)) -> Result<()> {
        self.decompose.validate()?;
        self.structure.validate()?;
        self.texture.validate(dim)
    }
}

/// Output of [`restore`].
#[derive(Clone, Debug)]
pub struct Restoration<T> {
    /// Restored image in the caller's value range.
    pub image: Array3<T>,
    /// Inpainted structure, normalized to `[0, 1]`.
    pub structure: Array3<T>,
    /// Inpainted texture residual, normalized units.
    pub texture: Array3<T>,
}

/// Restore the pixels of `image` (`H x W x 3`) where `mask` is true.
///
/// The image is decomposed, the structure is inpainted channel by channel,
/// the texture is inpainted jointly, and the two are summed and scaled back
/// to the input range. Pixels outside the mask are copied from `image`.
///
/// The decomposition runs on the damaged image, so values inside the hole
/// must be finite.
pub fn restore<T: NdFloat>(
    image: ArrayView3<T>,
    mask: ArrayView2<bool>,
    params: &RestoreParams,
) -> Result<Restoration<T>> {
    restore_with_cancel(image, mask, params, &CancelToken::new())
}

pub fn restore_with_cancel<T: NdFloat>(
    image: ArrayView3<T>,
    mask: ArrayView2<bool>,
    params: &RestoreParams,
    cancel: &CancelToken,
) -> Result<Restoration<T>> {
    let (height, width, _) = image.dim();
    check_mask((height, width), &mask)?;
    params.validate((height, width))?;
    if hole_size(&mask) == mask.len() {
        return Err(InpaintError::invalid_mask(
            "mask covers the whole image, nothing to restore from",
        ));
    }
    log::info!("Restoring {} pixels of a {height}x{width} image", hole_size(&mask));

    let decomposition = decompose_with_cancel(image, &params.decompose, cancel)?;

    let structure_channels = split_channels(decomposition.structure.view())?;
    let [r, g, b] =
        inpaint_structure_channels(&structure_channels, mask, &params.structure, cancel)?;
    let structure = merge_channels(&[r.field, g.field, b.field]);

    let texture_channels = split_channels(decomposition.texture.view())?;
    let texture = merge_channels(&inpaint_texture_with_cancel(
        &texture_channels,
        mask,
        &params.texture,
        cancel,
    )?);

    let max_value = lit::<T>(params.decompose.range.max_value());
    let mut restored = (&structure + &texture).mapv(|v| v * max_value);
    for ((row, col, c), value) in restored.indexed_iter_mut() {
        if !mask[(row, col)] {
            *value = image[(row, col, c)];
        }
    }

    log::info!("Restoration done");
    Ok(Restoration {
        image: restored,
        structure,
        texture,
    })
}
