//! Sum of squared errors between byte buffers and planes.

use crate::simd::Kernels;

/// Sum of `(a[i] - b[i])^2` over both buffers.
///
/// Both slices must have the same length (asserted in debug builds). The
/// result is exact on every dispatch path.
///
/// ```rust
/// use planecmp::compute_sum_square_error;
///
/// assert_eq!(compute_sum_square_error(b"test0123test4567", b"tick0123tock4567"), 790);
/// ```
pub fn compute_sum_square_error(a: &[u8], b: &[u8]) -> u64 {
    Kernels::current().sum_square_error(a, b)
}

/// Sum of squared errors over the visible `width x height` region of two
/// strided planes. Row padding never participates.
pub fn compute_sum_square_error_plane(
    a: &[u8],
    stride_a: usize,
    b: &[u8],
    stride_b: usize,
    width: usize,
    height: usize,
) -> u64 {
    Kernels::current().sum_square_error_plane(a, stride_a, b, stride_b, width, height)
}

impl Kernels {
    /// Plane form of [`Kernels::sum_square_error`].
    pub fn sum_square_error_plane(
        &self,
        a: &[u8],
        stride_a: usize,
        b: &[u8],
        stride_b: usize,
        width: usize,
        height: usize,
    ) -> u64 {
        debug_assert!(stride_a >= width, "stride_a {stride_a} < width {width}");
        debug_assert!(stride_b >= width, "stride_b {stride_b} < width {width}");
        if width == 0 || height == 0 {
            return 0;
        }

        // Coalesce contiguous planes into a single run
        if stride_a == width && stride_b == width {
            let len = width * height;
            return self.sum_square_error(&a[..len], &b[..len]);
        }

        (0..height)
            .map(|y| {
                let row_a = &a[y * stride_a..y * stride_a + width];
                let row_b = &b[y * stride_b..y * stride_b + width];
                self.sum_square_error(row_a, row_b)
            })
            .sum()
    }
}
