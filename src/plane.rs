//! Validated views over caller-owned pixel planes.
//!
//! The raw metric functions trust their stride/width/height arguments.
//! [`Plane`] checks them once up front so the metric methods on it can be
//! called without any preconditions.

use crate::error::{Error, Result};
use crate::simd::Kernels;
use crate::ssim::SsimOptions;

/// A borrowed, row-major, byte-per-sample image plane.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    data: &'a [u8],
    stride: usize,
    width: usize,
    height: usize,
}

/// Bytes a plane of these dimensions must cover. The last row needs only
/// `width` bytes, not a full stride.
fn required_len(stride: usize, width: usize, height: usize) -> Option<usize> {
    if height == 0 || width == 0 {
        return Some(0);
    }
    stride.checked_mul(height - 1)?.checked_add(width)
}

impl<'a> Plane<'a> {
    /// Wrap `data` as a plane with the given layout.
    ///
    /// # Errors
    ///
    /// Returns an error if `stride < width` or `data` is too short.
    pub fn new(data: &'a [u8], stride: usize, width: usize, height: usize) -> Result<Self> {
        if stride < width {
            return Err(Error::InvalidStride { stride, width });
        }
        let required = required_len(stride, width, height).ok_or(Error::BufferTooSmall {
            required: usize::MAX,
            actual: data.len(),
        })?;
        if data.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            stride,
            width,
            height,
        })
    }

    /// Wrap tightly packed rows (`stride == width`).
    pub fn packed(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(data, width, width, height)
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Visible pixels of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height, "row {y} out of range for height {}", self.height);
        if self.width == 0 {
            return &[];
        }
        &self.data[y * self.stride..y * self.stride + self.width]
    }

    /// Iterate over the visible pixels of each row.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    fn check_same_size(&self, other: &Plane<'_>) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::DimensionMismatch {
                a_width: self.width,
                a_height: self.height,
                b_width: other.width,
                b_height: other.height,
            });
        }
        Ok(())
    }

    /// DJB2 hash of the visible pixels.
    pub fn hash_djb2(&self, seed: u32) -> u32 {
        crate::hash::hash_plane_with(
            &Kernels::current(),
            self.data,
            self.stride,
            self.width,
            self.height,
            seed,
        )
    }

    /// Sum of squared errors against `other`.
    pub fn sum_square_error(&self, other: &Plane<'_>) -> Result<u64> {
        self.check_same_size(other)?;
        Ok(Kernels::current().sum_square_error_plane(
            self.data,
            self.stride,
            other.data,
            other.stride,
            self.width,
            self.height,
        ))
    }

    /// PSNR in decibels against `other`.
    pub fn psnr(&self, other: &Plane<'_>) -> Result<f64> {
        self.check_same_size(other)?;
        Ok(Kernels::current().frame_psnr(
            self.data,
            self.stride,
            other.data,
            other.stride,
            self.width,
            self.height,
        ))
    }

    /// SSIM against `other` with default options.
    pub fn ssim(&self, other: &Plane<'_>) -> Result<f64> {
        self.ssim_with(other, &SsimOptions::default())
    }

    /// SSIM against `other` with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] for options that
    /// [`SsimOptionsBuilder::try_build`](crate::ssim::SsimOptionsBuilder::try_build)
    /// would reject, and [`Error::DimensionMismatch`] for differing sizes.
    pub fn ssim_with(&self, other: &Plane<'_>, options: &SsimOptions) -> Result<f64> {
        options.validate()?;
        self.check_same_size(other)?;
        Ok(Kernels::current().frame_ssim(
            self.data,
            self.stride,
            other.data,
            other.stride,
            self.width,
            self.height,
            options,
        ))
    }
}

/// The three planes of a 4:2:0 frame.
#[derive(Debug, Clone, Copy)]
pub struct I420<'a> {
    pub y: Plane<'a>,
    pub u: Plane<'a>,
    pub v: Plane<'a>,
}

impl<'a> I420<'a> {
    /// Group planes into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChroma`] unless both chroma planes are
    /// `ceil(w/2) x ceil(h/2)` for a `w x h` luma plane.
    pub fn new(y: Plane<'a>, u: Plane<'a>, v: Plane<'a>) -> Result<Self> {
        let expected_width = (y.width + 1) / 2;
        let expected_height = (y.height + 1) / 2;
        for chroma in [&u, &v] {
            if chroma.width != expected_width || chroma.height != expected_height {
                return Err(Error::InvalidChroma {
                    width: chroma.width,
                    height: chroma.height,
                    expected_width,
                    expected_height,
                });
            }
        }
        Ok(Self { y, u, v })
    }

    pub fn planes(&self) -> [Plane<'a>; 3] {
        [self.y, self.u, self.v]
    }

    /// Total samples across all three planes.
    pub fn sample_count(&self) -> usize {
        self.planes().iter().map(|p| p.width * p.height).sum()
    }

    pub(crate) fn check_same_size(&self, other: &I420<'_>) -> Result<()> {
        self.y.check_same_size(&other.y)
    }
}
