//! # planecmp
//!
//! Compare 8-bit image planes: DJB2 hashing, sum of squared errors, PSNR
//! and SSIM, with SIMD kernels chosen at runtime.
//!
//! - **Hash**: DJB2 over raw buffers or strided planes, for exact-match checks.
//! - **Error**: exact `u64` sum of squared errors and PSNR in decibels.
//! - **Structure**: SSIM over overlapping 8x8 windows.
//! - **Dispatch**: SSE2/SSE4.1/AVX2 on x86_64 and NEON on aarch64, each
//!   bit-identical to the scalar reference in [`simd::fallback`].
//!
//! ## Quickstart
//!
//! ```rust
//! use planecmp::{calc_frame_psnr, calc_frame_ssim, hash_djb2, DJB2_SEED};
//!
//! let (w, h) = (64, 48);
//! let a: Vec<u8> = (0..w * h).map(|i| (i % 256) as u8).collect();
//! let mut b = a.clone();
//! b[100] ^= 0x10;
//!
//! assert_ne!(hash_djb2(&a, DJB2_SEED), hash_djb2(&b, DJB2_SEED));
//! assert!(calc_frame_psnr(&a, w, &b, w, w, h) > 40.0);
//! assert!(calc_frame_ssim(&a, w, &b, w, w, h) > 0.99);
//! ```
//!
//! ### Checked planes
//!
//! The free functions trust their stride and size arguments. [`Plane`]
//! validates them once and its methods return [`Result`].
//!
//! ```rust
//! use planecmp::{Plane, I420};
//!
//! # fn main() -> planecmp::Result<()> {
//! let luma = vec![16u8; 16 * 16];
//! let chroma = vec![128u8; 8 * 8];
//! let frame = I420::new(
//!     Plane::packed(&luma, 16, 16)?,
//!     Plane::packed(&chroma, 8, 8)?,
//!     Plane::packed(&chroma, 8, 8)?,
//! )?;
//! assert_eq!(planecmp::i420_ssim(&frame, &frame)?, 1.0);
//! # Ok(())
//! # }
//! ```
//!
//! ### Forcing the scalar path
//!
//! ```rust
//! use planecmp::{compute_sum_square_error, mask_cpu_flags};
//!
//! mask_cpu_flags(0); // scalar only, on this thread
//! let scalar = compute_sum_square_error(b"test0123test4567", b"tick0123tock4567");
//! mask_cpu_flags(-1); // everything the CPU reports
//! assert_eq!(scalar, compute_sum_square_error(b"test0123test4567", b"tick0123tock4567"));
//! ```
//!
//! ## Feature flags
//! - `simd` (default): Compile the vectorized kernels. Without it only the
//!   scalar reference is built.
//!
//! ## Safety
//! - Unsafe is only compiled when `simd` is enabled; otherwise
//!   `forbid(unsafe_code)` is applied.
//! - A vectorized kernel is only reachable through a [`Kernels`] table
//!   resolved from flags the hardware reported.

#![cfg_attr(docsrs, feature(doc_cfg))]
// Allow unsafe code only when the SIMD feature is enabled
#![cfg_attr(not(feature = "simd"), forbid(unsafe_code))]

pub mod cpu;
pub mod error;
pub mod hash;
pub mod plane;
pub mod psnr;
pub mod simd;
pub mod sse;
pub mod ssim;

pub use cpu::{cpu_flags, mask_cpu_flags, CpuFlags};
pub use error::{Error, Result};
pub use hash::{hash_djb2, hash_djb2_plane, DJB2_SEED};
pub use plane::{Plane, I420};
pub use psnr::{calc_frame_psnr, i420_psnr, sum_square_error_to_psnr, MAX_PSNR};
pub use simd::{Kernels, WindowSums};
pub use sse::{compute_sum_square_error, compute_sum_square_error_plane};
pub use ssim::{calc_frame_ssim, calc_frame_ssim_with, i420_ssim, SsimOptions};
