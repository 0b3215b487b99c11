//! Kernel selection.
//!
//! Every kernel has an ordered list of candidates, each tagged with the
//! [`CpuFlags`] it needs. Resolving a [`Kernels`] table walks each list and
//! keeps the first candidate whose requirement is met; the scalar kernel
//! requires nothing and always closes the list.
//!
//! The integer kernels are exact, so every candidate returns the same value
//! as [`fallback`] for every input. PSNR and SSIM only do floating point on
//! top of those integer results, which makes them identical across paths
//! too.

pub mod fallback;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub mod x86_64;

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
pub mod aarch64;

use std::fmt;

use crate::cpu::{cpu_flags, detected_flags, CpuFlags};

/// Window edge length used by the SSIM kernels.
pub const WINDOW_SIZE: usize = 8;

/// Integer moments of one SSIM window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSums {
    pub sum_a: u32,
    pub sum_b: u32,
    pub sum_sq_a: u32,
    pub sum_sq_b: u32,
    pub sum_axb: u32,
}

pub type HashFn = fn(&[u8], u32) -> u32;
pub type SumSquareErrorFn = fn(&[u8], &[u8]) -> u64;
/// Gathers the moments of the 8x8 window at the start of both slices.
pub type WindowSumsFn = fn(&[u8], usize, &[u8], usize) -> WindowSums;

/// `33^n` modulo 2^32.
pub(crate) const fn djb2_multiplier(n: usize) -> u32 {
    let mut acc = 1u32;
    let mut i = 0;
    while i < n {
        acc = acc.wrapping_mul(33);
        i += 1;
    }
    acc
}

/// Per-byte weights of an `N`-byte DJB2 block: byte `i` contributes
/// `b[i] * 33^(N-1-i)`.
pub(crate) const fn djb2_weights<const N: usize>() -> [u32; N] {
    let mut weights = [0u32; N];
    let mut acc = 1u32;
    let mut i = N;
    while i > 0 {
        i -= 1;
        weights[i] = acc;
        acc = acc.wrapping_mul(33);
    }
    weights
}

struct Candidate<F> {
    requires: CpuFlags,
    name: &'static str,
    kernel: F,
}

fn select<F: Copy>(candidates: &[Candidate<F>], flags: CpuFlags) -> (F, &'static str) {
    candidates
        .iter()
        .find(|c| flags.contains(c.requires))
        .map(|c| (c.kernel, c.name))
        .unwrap_or_else(|| unreachable!("scalar candidate requires no flags"))
}

const HASH_CANDIDATES: &[Candidate<HashFn>] = &[
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    Candidate {
        requires: CpuFlags::AVX2,
        name: "avx2",
        kernel: hash_djb2_avx2,
    },
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    Candidate {
        requires: CpuFlags::SSE41,
        name: "sse4.1",
        kernel: hash_djb2_sse41,
    },
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    Candidate {
        requires: CpuFlags::NEON,
        name: "neon",
        kernel: hash_djb2_neon,
    },
    Candidate {
        requires: CpuFlags::NONE,
        name: "scalar",
        kernel: fallback::hash_djb2,
    },
];

const SUM_SQUARE_ERROR_CANDIDATES: &[Candidate<SumSquareErrorFn>] = &[
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    Candidate {
        requires: CpuFlags::AVX2,
        name: "avx2",
        kernel: sum_square_error_avx2,
    },
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    Candidate {
        requires: CpuFlags::SSE2,
        name: "sse2",
        kernel: sum_square_error_sse2,
    },
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    Candidate {
        requires: CpuFlags::NEON,
        name: "neon",
        kernel: sum_square_error_neon,
    },
    Candidate {
        requires: CpuFlags::NONE,
        name: "scalar",
        kernel: fallback::sum_square_error,
    },
];

const WINDOW_SUMS_CANDIDATES: &[Candidate<WindowSumsFn>] = &[
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    Candidate {
        requires: CpuFlags::SSE2,
        name: "sse2",
        kernel: window_sums_sse2,
    },
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    Candidate {
        requires: CpuFlags::NEON,
        name: "neon",
        kernel: window_sums_neon,
    },
    Candidate {
        requires: CpuFlags::NONE,
        name: "scalar",
        kernel: fallback::window_sums_8x8,
    },
];

// Safe entry points for the table. Each is only ever stored in a `Kernels`
// resolved from flags that the hardware actually reported.

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn hash_djb2_avx2(data: &[u8], seed: u32) -> u32 {
    // SAFETY: selected only when AVX2 was detected.
    unsafe { x86_64::hash_djb2_avx2(data, seed) }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn hash_djb2_sse41(data: &[u8], seed: u32) -> u32 {
    // SAFETY: selected only when SSE4.1 was detected.
    unsafe { x86_64::hash_djb2_sse41(data, seed) }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn sum_square_error_avx2(a: &[u8], b: &[u8]) -> u64 {
    // SAFETY: selected only when AVX2 was detected.
    unsafe { x86_64::sum_square_error_avx2(a, b) }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn sum_square_error_sse2(a: &[u8], b: &[u8]) -> u64 {
    // SAFETY: selected only when SSE2 was detected.
    unsafe { x86_64::sum_square_error_sse2(a, b) }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn window_sums_sse2(a: &[u8], stride_a: usize, b: &[u8], stride_b: usize) -> WindowSums {
    // SAFETY: selected only when SSE2 was detected.
    unsafe { x86_64::window_sums_sse2(a, stride_a, b, stride_b) }
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
fn hash_djb2_neon(data: &[u8], seed: u32) -> u32 {
    // SAFETY: selected only when NEON was detected.
    unsafe { aarch64::hash_djb2_neon(data, seed) }
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
fn sum_square_error_neon(a: &[u8], b: &[u8]) -> u64 {
    // SAFETY: selected only when NEON was detected.
    unsafe { aarch64::sum_square_error_neon(a, b) }
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
fn window_sums_neon(a: &[u8], stride_a: usize, b: &[u8], stride_b: usize) -> WindowSums {
    // SAFETY: selected only when NEON was detected.
    unsafe { aarch64::window_sums_neon(a, stride_a, b, stride_b) }
}

/// A resolved set of kernels.
///
/// This is the explicit form of the capability gate: resolve it once and
/// pass it around, or use the crate-level functions which resolve from
/// [`cpu_flags`] on every call.
#[derive(Clone, Copy)]
pub struct Kernels {
    flags: CpuFlags,
    hash_djb2: (HashFn, &'static str),
    sum_square_error: (SumSquareErrorFn, &'static str),
    window_sums: (WindowSumsFn, &'static str),
}

impl Kernels {
    /// Kernels for `flags`, restricted to what the hardware supports.
    pub fn for_flags(flags: CpuFlags) -> Self {
        let flags = flags.intersection(detected_flags());
        let kernels = Self {
            flags,
            hash_djb2: select(HASH_CANDIDATES, flags),
            sum_square_error: select(SUM_SQUARE_ERROR_CANDIDATES, flags),
            window_sums: select(WINDOW_SUMS_CANDIDATES, flags),
        };
        tracing::trace!(?kernels, "resolved kernels");
        kernels
    }

    /// Scalar reference kernels.
    pub fn scalar() -> Self {
        Self::for_flags(CpuFlags::NONE)
    }

    /// Fastest kernels the hardware supports, ignoring any thread mask.
    pub fn detected() -> Self {
        Self::for_flags(CpuFlags::ALL)
    }

    /// Kernels for the calling thread's effective flags.
    pub fn current() -> Self {
        Self::for_flags(cpu_flags())
    }

    /// Flags this table was resolved from.
    pub fn flags(&self) -> CpuFlags {
        self.flags
    }

    /// True when every kernel is the scalar reference.
    pub fn is_scalar(&self) -> bool {
        self.hash_djb2.1 == "scalar"
            && self.sum_square_error.1 == "scalar"
            && self.window_sums.1 == "scalar"
    }

    #[inline]
    pub fn hash_djb2(&self, data: &[u8], seed: u32) -> u32 {
        (self.hash_djb2.0)(data, seed)
    }

    #[inline]
    pub fn sum_square_error(&self, a: &[u8], b: &[u8]) -> u64 {
        debug_assert_eq!(a.len(), b.len(), "sum_square_error length mismatch");
        (self.sum_square_error.0)(a, b)
    }

    /// Moments of the 8x8 window at the start of `a` and `b`.
    ///
    /// Both slices must hold at least `7 * stride + 8` bytes.
    #[inline]
    pub fn window_sums(&self, a: &[u8], stride_a: usize, b: &[u8], stride_b: usize) -> WindowSums {
        debug_assert!(a.len() >= 7 * stride_a + WINDOW_SIZE);
        debug_assert!(b.len() >= 7 * stride_b + WINDOW_SIZE);
        (self.window_sums.0)(a, stride_a, b, stride_b)
    }
}

impl fmt::Debug for Kernels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernels")
            .field("flags", &self.flags.to_string())
            .field("hash_djb2", &self.hash_djb2.1)
            .field("sum_square_error", &self.sum_square_error.1)
            .field("window_sums", &self.window_sums.1)
            .finish()
    }
}

/// DJB2 hash using the calling thread's kernels.
pub fn hash_djb2(data: &[u8], seed: u32) -> u32 {
    Kernels::current().hash_djb2(data, seed)
}

/// Sum of squared errors using the calling thread's kernels.
pub fn sum_square_error(a: &[u8], b: &[u8]) -> u64 {
    Kernels::current().sum_square_error(a, b)
}

/// 8x8 window moments using the calling thread's kernels.
pub fn window_sums(a: &[u8], stride_a: usize, b: &[u8], stride_b: usize) -> WindowSums {
    Kernels::current().window_sums(a, stride_a, b, stride_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_djb2_weights_match_fold() {
        let weights = djb2_weights::<16>();
        assert_eq!(weights[15], 1);
        assert_eq!(weights[14], 33);
        assert_eq!(weights[0], djb2_multiplier(15));

        // One block of the unrolled form equals sixteen fold steps.
        let data: Vec<u8> = (0..16).map(|i| (i * 29 + 3) as u8).collect();
        let seed = 5381u32;
        let unrolled = data
            .iter()
            .zip(weights)
            .fold(seed.wrapping_mul(djb2_multiplier(16)), |acc, (&b, w)| {
                acc.wrapping_add((b as u32).wrapping_mul(w))
            });
        assert_eq!(unrolled, fallback::hash_djb2(&data, seed));
    }

    #[test]
    fn test_scalar_kernels_are_scalar() {
        let kernels = Kernels::scalar();
        assert!(kernels.is_scalar());
        assert_eq!(kernels.flags(), CpuFlags::NONE);
    }

    #[test]
    fn test_for_flags_never_exceeds_hardware() {
        let kernels = Kernels::for_flags(CpuFlags::ALL);
        assert_eq!(kernels.flags(), detected_flags());
    }

    #[test]
    fn test_current_follows_thread_mask() {
        crate::mask_cpu_flags(0);
        assert!(Kernels::current().is_scalar());
        crate::mask_cpu_flags(-1);
        assert_eq!(Kernels::current().flags(), detected_flags());
    }

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    #[test]
    fn test_selection_order_x86() {
        let debug = format!("{:?}", Kernels::for_flags(CpuFlags::SSE2));
        assert!(debug.contains("hash_djb2: \"scalar\""));
        if is_x86_feature_detected!("avx2") {
            let debug = format!("{:?}", Kernels::detected());
            assert!(debug.contains("sum_square_error: \"avx2\""));
        }
    }

    #[test]
    fn test_mask_only_flags_do_not_change_selection() {
        let mask_only = CpuFlags::SSSE3.union(CpuFlags::SSE42).union(CpuFlags::AVX);
        for base in [CpuFlags::NONE, CpuFlags::SSE2, CpuFlags::SSE41, CpuFlags::NEON] {
            let plain = Kernels::for_flags(base);
            let widened = Kernels::for_flags(base.union(mask_only));
            assert_eq!(plain.hash_djb2.1, widened.hash_djb2.1, "base={base}");
            assert_eq!(plain.sum_square_error.1, widened.sum_square_error.1, "base={base}");
            assert_eq!(plain.window_sums.1, widened.window_sums.1, "base={base}");
        }
    }

    #[test]
    fn test_dispatched_matches_fallback() {
        let a: Vec<u8> = (0..1000).map(|i| (i * 7 % 256) as u8).collect();
        let b: Vec<u8> = (0..1000).map(|i| (i * 13 % 256) as u8).collect();
        let kernels = Kernels::detected();
        assert_eq!(kernels.hash_djb2(&a, 5381), fallback::hash_djb2(&a, 5381));
        assert_eq!(
            kernels.sum_square_error(&a, &b),
            fallback::sum_square_error(&a, &b)
        );
        assert_eq!(
            kernels.window_sums(&a, 32, &b, 40),
            fallback::window_sums_8x8(&a, 32, &b, 40)
        );
    }
}
