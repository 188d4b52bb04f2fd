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

/*! Helpers shared by the unit tests of every engine.
*/

use ndarray::{ArrayView2, NdFloat, Zip};

// allow unused_macros below because the macro is only expanded inside other
// modules' test code.

/// Assert that two floats differ by less than `delta`. NaN on either side
/// always fails.
#[allow(unused_macros)]
macro_rules! assert_delta {
    ($x:expr, $y:expr, $d:expr) => {
        let (x, y, d) = ($x, $y, $d);
        if !(x - y < d && y - x < d) {
            panic!("value {} is different than {} by greater than {} delta", x, y, d);
        }
    };
}

// makes the macro reachable through the normal module path
#[allow(unused_imports)]
pub(crate) use assert_delta;

/// Largest absolute difference between two fields of the same shape.
#[allow(dead_code)]
pub(crate) fn max_abs_difference<T: NdFloat>(a: ArrayView2<T>, b: ArrayView2<T>) -> T {
    Zip::from(&a)
        .and(&b)
        .fold(T::zero(), |acc, &x, &y| acc.max((x - y).abs()))
}
