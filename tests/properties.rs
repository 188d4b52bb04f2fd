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

use inpaintoxide::{
    decompose, diffusion_step, inpaint_structure, inpaint_texture, total_variation, Channels,
    DecomposeParams, EdgeStop, InpaintError, StructuralParams, TextureParams, ValueRange,
};
use ndarray::{Array2, Array3};

const PLACEHOLDER: f64 = -1000.0;

fn pattern(height: usize, width: usize, seed: usize) -> Array2<f64> {
    Array2::from_shape_fn((height, width), |(i, j)| {
        ((i * 31 + j * 17 + seed * 7) % 23) as f64 / 23.0
    })
}

fn blob_mask(height: usize, width: usize) -> Array2<bool> {
    Array2::from_shape_fn((height, width), |(i, j)| {
        let (di, dj) = (i as f64 - 9.5, j as f64 - 11.0);
        di * di + dj * dj < 12.0
    })
}

fn with_placeholder(field: &Array2<f64>, mask: &Array2<bool>) -> Array2<f64> {
    let mut damaged = field.clone();
    damaged.zip_mut_with(mask, |v, &m| {
        if m {
            *v = PLACEHOLDER;
        }
    });
    damaged
}

fn structural(max_iters: usize) -> StructuralParams {
    StructuralParams {
        max_iters,
        ..Default::default()
    }
}

fn texture_params() -> TextureParams {
    TextureParams {
        block_size: 4,
        acceptable_error: 1.1,
    }
}

#[test]
fn flat_gray_decomposes_into_structure_only() {
    let image = Array3::from_elem((16, 16, 3), 0.5f64);
    let params = DecomposeParams {
        k: 0.06,
        dt: 1.0 / 45.0,
        max_iters: 100,
        range: ValueRange::Unit,
        ..Default::default()
    };
    let result = decompose(image.view(), &params).unwrap();
    assert!(result.structure.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    assert!(result.texture.iter().all(|&t| t.abs() < 1e-6));
}

#[test]
fn diffusion_does_not_sharpen_a_profile() {
    let mut u = Array2::from_shape_fn((3, 24), |(_, j)| ((j * 7) % 5) as f64 / 4.0);
    let mut tv = total_variation(u.view());
    for _ in 0..100 {
        u = diffusion_step(u.view(), 0.4, 0.2, EdgeStop::Exponential).unwrap();
        let next = total_variation(u.view());
        assert!(next <= tv + 1e-12);
        tv = next;
    }
}

#[test]
fn diffusion_does_not_sharpen_a_two_dimensional_field() {
    let mut u = Array2::from_shape_fn((16, 16), |(i, j)| {
        (1.7 * i as f64).sin() * (2.3 * j as f64).cos()
    });
    let mut tv = total_variation(u.view());
    for _ in 0..100 {
        u = diffusion_step(u.view(), 0.2, 0.25, EdgeStop::Rational).unwrap();
        let next = total_variation(u.view());
        assert!(next <= tv + 1e-12);
        tv = next;
    }
}

#[test]
fn structural_inpainting_keeps_known_pixels_and_replaces_the_hole() {
    let field = pattern(20, 22, 1);
    let mask = blob_mask(20, 22);
    let damaged = with_placeholder(&field, &mask);
    let out = inpaint_structure(damaged.view(), mask.view(), &structural(300))
        .unwrap()
        .field;
    for ((idx, &value), &input) in out.indexed_iter().zip(damaged.iter()) {
        if mask[idx] {
            assert_ne!(value, PLACEHOLDER);
            assert!((0.0..=1.0).contains(&value), "{idx:?} = {value}");
        } else {
            assert_eq!(value.to_bits(), input.to_bits());
        }
    }
}

#[test]
fn texture_inpainting_keeps_known_pixels_and_replaces_the_hole() {
    let mask = blob_mask(20, 22);
    let channels: Channels<f64> = [0, 1, 2].map(|c| with_placeholder(&pattern(20, 22, c), &mask));
    let out = inpaint_texture(&channels, mask.view(), &texture_params()).unwrap();
    for c in 0..3 {
        for ((idx, &value), &input) in out[c].indexed_iter().zip(channels[c].iter()) {
            if mask[idx] {
                assert_ne!(value, PLACEHOLDER);
            } else {
                assert_eq!(value.to_bits(), input.to_bits());
            }
        }
    }
}

#[test]
fn both_inpainters_are_deterministic() {
    let mask = blob_mask(20, 22);
    let field = with_placeholder(&pattern(20, 22, 4), &mask);
    let a = inpaint_structure(field.view(), mask.view(), &structural(120)).unwrap();
    let b = inpaint_structure(field.view(), mask.view(), &structural(120)).unwrap();
    assert_eq!(a.field, b.field);

    let channels: Channels<f64> = [0, 1, 2].map(|c| pattern(20, 22, c + 5));
    let x = inpaint_texture(&channels, mask.view(), &texture_params()).unwrap();
    let y = inpaint_texture(&channels, mask.view(), &texture_params()).unwrap();
    assert_eq!(x, y);
}

#[test]
fn empty_mask_is_a_no_op_for_both_inpainters() {
    let field = pattern(12, 12, 2);
    let mask = Array2::from_elem((12, 12), false);
    let out = inpaint_structure(field.view(), mask.view(), &structural(10)).unwrap();
    assert_eq!(out.field, field);

    let channels: Channels<f64> = [0, 1, 2].map(|c| pattern(12, 12, c));
    assert_eq!(
        inpaint_texture(&channels, mask.view(), &texture_params()).unwrap(),
        channels
    );
}

#[test]
fn fully_masked_field_is_invalid_for_both_inpainters() {
    let field = pattern(12, 12, 2);
    let mask = Array2::from_elem((12, 12), true);
    assert!(matches!(
        inpaint_structure(field.view(), mask.view(), &structural(10)),
        Err(InpaintError::InvalidMask(_))
    ));

    let channels: Channels<f64> = [0, 1, 2].map(|c| pattern(12, 12, c));
    assert!(matches!(
        inpaint_texture(&channels, mask.view(), &texture_params()),
        Err(InpaintError::InvalidMask(_))
    ));
}

#[test]
fn checkerboard_hole_takes_the_first_exact_exterior_match() {
    let checker = |offset: f64| {
        Array2::from_shape_fn((32, 32), |(i, j)| {
            if (i / 2 + j / 2) % 2 == 0 {
                offset
            } else {
                1.0 - offset
            }
        })
    };
    let original: Channels<f64> = [checker(0.0), checker(0.2), checker(0.4)];
    let mask = Array2::from_shape_fn((32, 32), |(i, j)| (14..18).contains(&i) && (14..18).contains(&j));
    let damaged: Channels<f64> = original.clone().map(|c| with_placeholder(&c, &mask));
    let params = TextureParams {
        block_size: 8,
        acceptable_error: 1.1,
    };

    let first = inpaint_texture(&damaged, mask.view(), &params).unwrap();
    let second = inpaint_texture(&damaged, mask.view(), &params).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, original);
}
