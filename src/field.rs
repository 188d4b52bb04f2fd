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

//! Channel containers shared by all engines, plus the shape and value checks
//! every engine runs before it starts iterating.

use ndarray::prelude::*;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, NdFloat};
use num_traits::NumCast;

use crate::error::{InpaintError, Result};

/// Three scalar fields, one per color channel, in caller-defined order.
pub type Channels<T> = [Array2<T>; 3];

/// Convert an `f64` literal into the working float type.
#[inline]
pub(crate) fn lit<T: NdFloat>(value: f64) -> T {
    // every literal used in this crate is representable in f32 and f64
    <T as NumCast>::from(value).unwrap()
}

/// Range of the pixel values supplied by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueRange {
    /// Values already lie in `[0, 1]`.
    Unit,
    /// 8-bit style values in `[0, 255]`.
    #[default]
    Byte,
}

impl ValueRange {
    /// Largest representable value; dividing by it maps the range onto `[0, 1]`.
    pub fn max_value(self) -> f64 {
        match self {
            Self::Unit => 1.0,
            Self::Byte => 255.0,
        }
    }
}

/// Split an `H x W x 3` image into three owned channel fields.
pub fn split_channels<T: NdFloat>(image: ArrayView3<T>) -> Result<Channels<T>> {
    let depth = image.dim().2;
    if depth != 3 {
        return Err(InpaintError::invalid_parameter(
            "image",
            format!("expected 3 color channels, got {depth}"),
        ));
    }
    Ok([0, 1, 2].map(|c| image.index_axis(Axis(2), c).to_owned()))
}

/// Stack three channel fields back into an `H x W x 3` image.
///
/// # Panics
///
/// Panics if the three fields do not share the same shape.
pub fn merge_channels<T: NdFloat>(channels: &Channels<T>) -> Array3<T> {
    let (height, width) = channels[0].dim();
    let mut image = Array3::<T>::zeros((height, width, 3));
    for (c, channel) in channels.iter().enumerate() {
        image.index_axis_mut(Axis(2), c).assign(channel);
    }
    image
}

pub(crate) fn check_mask(field: (usize, usize), mask: &ArrayView2<bool>) -> Result<()> {
    if mask.is_empty() {
        return Err(InpaintError::invalid_mask("mask has no elements"));
    }
    if mask.dim() != field {
        return Err(InpaintError::ShapeMismatch {
            expected: field,
            got: mask.dim(),
        });
    }
    Ok(())
}

pub(crate) fn check_channels<T: NdFloat>(channels: &Channels<T>) -> Result<(usize, usize)> {
    let dim = channels[0].dim();
    for channel in &channels[1..] {
        if channel.dim() != dim {
            return Err(InpaintError::ShapeMismatch {
                expected: dim,
                got: channel.dim(),
            });
        }
    }
    Ok(dim)
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(InpaintError::invalid_parameter(
            name,
            format!("must be finite and > 0, got {value}"),
        ));
    }
    Ok(())
}

/// Number of pixels flagged for restoration.
pub(crate) fn hole_size(mask: &ArrayView2<bool>) -> usize {
    mask.iter().filter(|&&m| m).count()
}

pub(crate) fn all_finite<T: NdFloat>(field: ArrayView2<T>) -> bool {
    field.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn split_then_merge_keeps_channel_order() {
        let image = Array3::from_shape_fn((2, 3, 3), |(i, j, c)| (i * 10 + j + 100 * c) as f64);
        let channels = split_channels(image.view()).unwrap();
        assert_eq!(channels[2][(1, 2)], 212.0);
        assert_eq!(merge_channels(&channels), image);
    }

    #[test]
    fn split_rejects_grayscale() {
        let image = Array3::<f32>::zeros((4, 4, 1));
        assert!(matches!(
            split_channels(image.view()),
            Err(InpaintError::InvalidParameter { name: "image", .. })
        ));
    }

    #[test]
    fn mask_shape_is_checked() {
        let mask = Array2::from_elem((3, 4), false);
        assert!(check_mask((3, 4), &mask.view()).is_ok());
        assert_eq!(
            check_mask((4, 3), &mask.view()),
            Err(InpaintError::ShapeMismatch {
                expected: (4, 3),
                got: (3, 4)
            })
        );
        let empty = Array2::<bool>::from_elem((0, 0), false);
        assert!(matches!(
            check_mask((0, 0), &empty.view()),
            Err(InpaintError::InvalidMask(_))
        ));
    }

    #[test]
    fn byte_range_divides_by_255() {
        assert_eq!(ValueRange::Byte.max_value(), 255.0);
        assert_eq!(ValueRange::default(), ValueRange::Byte);
    }
}
