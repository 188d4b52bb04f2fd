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

//! Sampling of intermediate fields for animations.
//!
//! Frames are never written anywhere by this crate. The stride rule below is
//! what callers rely on to bound how many snapshots a long run produces.

use ndarray::{Array2, ArrayView2, NdFloat};

use crate::error::Result;
use crate::field::check_positive;

/// Target frame rate and duration of the animation built from a run.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameCapture {
    pub fps: f64,
    pub duration_secs: f64,
}

impl Default for FrameCapture {
    fn default() -> Self {
        FrameCapture {
            fps: 24.0,
            duration_secs: 10.0,
        }
    }
}

impl FrameCapture {
    pub fn validate(&self) -> Result<()> {
        check_positive("fps", self.fps)?;
        check_positive("duration_secs", self.duration_secs)
    }

    /// Iterations between two captured frames:
    /// `floor(max_iters / (fps * duration))`, but at least one.
    pub fn stride(&self, max_iters: usize) -> usize {
        let stride = (max_iters as f64 / (self.fps * self.duration_secs)).floor() as usize;
        stride.max(1)
    }

    /// Number of frames a run of `max_iters` iterations yields, including the
    /// initial field.
    pub fn frame_count(&self, max_iters: usize) -> usize {
        1 + max_iters.div_ceil(self.stride(max_iters))
    }
}

/// Collects snapshots of one field during an engine loop.
pub(crate) struct FrameRecorder<T> {
    stride: Option<usize>,
    frames: Vec<Array2<T>>,
}

impl<T: NdFloat> FrameRecorder<T> {
    pub(crate) fn new(
        capture: Option<&FrameCapture>,
        max_iters: usize,
        initial: ArrayView2<T>,
    ) -> Self {
        match capture {
            Some(capture) => {
                if max_iters > 0 && (max_iters as f64) < capture.fps * capture.duration_secs {
                    log::warn!(
                        "{max_iters} iterations cannot fill {} frames, capturing every iteration",
                        capture.fps * capture.duration_secs
                    );
                }
                FrameRecorder {
                    stride: Some(capture.stride(max_iters)),
                    frames: vec![initial.to_owned()],
                }
            }
            None => FrameRecorder {
                stride: None,
                frames: Vec::new(),
            },
        }
    }

    #[inline]
    pub(crate) fn is_due(&self, iteration: usize) -> bool {
        matches!(self.stride, Some(stride) if iteration % stride == 0)
    }

    pub(crate) fn record(&mut self, iteration: usize, field: ArrayView2<T>) {
        if self.is_due(iteration) {
            self.frames.push(field.to_owned());
        }
    }

    pub(crate) fn into_frames(self) -> Vec<Array2<T>> {
        self.frames
    }
}
