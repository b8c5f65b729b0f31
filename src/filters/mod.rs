//! Stateless pixel transforms over 8-bit RGB frames.
//!
//! Every function borrows its input and returns a freshly allocated image of the
//! same width and height. Gradient intermediates are kept as signed 16-bit
//! three channel images so that the Sobel responses never overflow.

pub mod blur;
pub mod color;
pub mod sobel;

use image::{ImageBuffer, Rgb};

pub use blur::{
    blur5x5_naive, blur5x5_separable, blur_quantize, compare_blur_strategies, quantize,
    BlurComparison, BlurStrategy,
};
pub use color::{desaturate, luma, luma_grayscale, sepia};
pub use sobel::{abs_saturate, magnitude, sobel_x, sobel_y};

/// Signed gradient image produced by the Sobel operators.
pub type GradientImage = ImageBuffer<Rgb<i16>, Vec<i16>>;

/// A rank-1 integer kernel applied as a horizontal pass followed by a
/// vertical pass. Each pass divides its sums by `divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparableKernel<const N: usize> {
    pub horizontal: [i32; N],
    pub vertical: [i32; N],
    pub divisor: i32,
}

impl<const N: usize> SeparableKernel<N> {
    /// Number of pixels the kernel reaches on each side of its centre.
    pub const fn radius(&self) -> usize {
        N / 2
    }

    /// The equivalent full 2D kernel (`vertical[row] * horizontal[col]`).
    pub fn outer(&self) -> [[i32; N]; N] {
        let mut kernel = [[0; N]; N];
        for (row, v) in self.vertical.iter().enumerate() {
            for (col, h) in self.horizontal.iter().enumerate() {
                kernel[row][col] = v * h;
            }
        }
        kernel
    }
}

/// Approximate 5x5 gaussian, [1 2 4 2 1] / 10 in both directions.
pub const GAUSSIAN_5: SeparableKernel<5> = SeparableKernel {
    horizontal: [1, 2, 4, 2, 1],
    vertical: [1, 2, 4, 2, 1],
    divisor: 10,
};

/// Sobel X, positive to the right.
pub const SOBEL_X_3: SeparableKernel<3> = SeparableKernel {
    horizontal: [-1, 0, 1],
    vertical: [1, 2, 1],
    divisor: 1,
};

/// Sobel Y, positive upwards.
pub const SOBEL_Y_3: SeparableKernel<3> = SeparableKernel {
    horizontal: [1, 2, 1],
    vertical: [1, 0, -1],
    divisor: 1,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_outer_kernel_sums_to_squared_divisor() {
        let kernel = GAUSSIAN_5.outer();
        let total: i32 = kernel.iter().flatten().sum();
        assert_eq!(total, GAUSSIAN_5.divisor * GAUSSIAN_5.divisor);
        assert_eq!(kernel[2], [4, 8, 16, 8, 4]);
        assert_eq!(kernel[0], [1, 2, 4, 2, 1]);
    }

    #[test]
    fn sobel_kernels_are_antisymmetric() {
        assert_eq!(SOBEL_X_3.outer()[1], [-2, 0, 2]);
        assert_eq!(SOBEL_Y_3.outer()[0], [1, 2, 1]);
        assert_eq!(SOBEL_Y_3.outer()[2], [-1, -2, -1]);
        assert_eq!(SOBEL_X_3.radius(), 1);
        assert_eq!(GAUSSIAN_5.radius(), 2);
    }
}
