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

//! Binary dilation of hole masks.

use ndarray::prelude::*;
use ndarray::{Array2, ArrayView2, Zip};

/// Dilate `mask` with a `(2 * radius + 1)` square structuring element.
///
/// The square is separable, so the mask is dilated along rows and then along
/// columns. Each pass ORs shifted copies of the whole grid into the result.
pub fn dilate(mask: ArrayView2<bool>, radius: usize) -> Array2<bool> {
    if radius == 0 {
        return mask.to_owned();
    }
    let horizontal = dilate_axis(mask, radius, Axis(1));
    dilate_axis(horizontal.view(), radius, Axis(0))
}

fn dilate_axis(input: ArrayView2<bool>, radius: usize, axis: Axis) -> Array2<bool> {
    let (rows, cols) = input.dim();
    let mut result = input.to_owned();
    let r = radius as isize;

    for offset in (-r..=r).filter(|&o| o != 0) {
        let (row_shift, col_shift) = if axis == Axis(1) { (0, offset) } else { (offset, 0) };
        let (src_r, dst_r, h) = shift_range(row_shift, rows);
        let (src_c, dst_c, w) = shift_range(col_shift, cols);
        if h == 0 || w == 0 {
            continue;
        }
        Zip::from(result.slice_mut(s![dst_r..dst_r + h, dst_c..dst_c + w]))
            .and(input.slice(s![src_r..src_r + h, src_c..src_c + w]))
            .for_each(|dst, &src| *dst |= src);
    }
    result
}

/// Source start, destination start and overlap length for a shift.
#[inline]
fn shift_range(offset: isize, size: usize) -> (usize, usize, usize) {
    let magnitude = offset.unsigned_abs();
    if magnitude >= size {
        return (0, 0, 0);
    }
    let len = size - magnitude;
    if offset >= 0 {
        (0, magnitude, len)
    } else {
        (magnitude, 0, len)
    }
}
