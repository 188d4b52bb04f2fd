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

//! Structure/texture image inpainting.
//!
//! A damaged region of an image is restored by splitting the image into a
//! smooth structure component and a high-frequency texture residual, then
//! filling each component inside the hole with a method suited to it:
//!
//! - [`decompose`]: per-channel Perona-Malik diffusion yields the structure,
//!   the residual is the texture.
//! - [`inpaint_structure`]: constrained diffusion extends the geometry around
//!   the hole inwards, one channel at a time.
//! - [`inpaint_texture`]: exemplar-based synthesis copies matching blocks of
//!   known texture, all three channels jointly.
//! - [`restore`] chains the three and recombines the components.
//!
//! Every engine takes immutable input arrays and returns newly owned arrays.
//! Pixels outside the mask are returned bitwise unchanged, and identical
//! inputs give bit-identical outputs.
//!
//! # Example
//!
//! ```
//! use inpaintoxide::{inpaint_structure, StructuralParams};
//! use ndarray::Array2;
//!
//! let field = Array2::from_shape_fn((16, 16), |(_, j)| j as f64 / 15.0);
//! let mask = Array2::from_shape_fn((16, 16), |(i, j)| {
//!     (6..9).contains(&i) && (6..9).contains(&j)
//! });
//! let params = StructuralParams { max_iters: 200, ..Default::default() };
//! let filled = inpaint_structure(field.view(), mask.view(), &params)?.field;
//!
//! assert_eq!(filled[(0, 0)], field[(0, 0)]);
//! assert!((filled[(7, 7)] - field[(7, 7)]).abs() < 1e-6);
//! # Ok::<(), inpaintoxide::InpaintError>(())
//! ```

mod cancel;
mod decompose;
mod diffusion;
mod error;
mod field;
mod frames;
mod morphology;
mod pipeline;
mod structure;
mod texture;

#[cfg(test)]
mod test_utils;

pub use cancel::CancelToken;
pub use decompose::{decompose, decompose_with_cancel, DecomposeParams, Decomposition};
pub use diffusion::{diffusion_step, total_variation, EdgeStop, STABILITY_LIMIT};
pub use error::{InpaintError, Result};
pub use field::{merge_channels, split_channels, Channels, ValueRange};
pub use frames::FrameCapture;
pub use morphology::dilate;
pub use pipeline::{restore, restore_with_cancel, Restoration, RestoreParams};
pub use structure::{
    inpaint_structure, inpaint_structure_channels, inpaint_structure_with_cancel, InitialFill,
    StructuralParams, StructureInpainting,
};
pub use texture::{inpaint_texture, inpaint_texture_with_cancel, TextureParams};
