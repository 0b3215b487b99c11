//! CPU capability gate.
//!
//! Hardware features are detected once per process and cached. Dispatch
//! decisions read the *effective* flags: the detected set intersected with a
//! per-thread mask set through [`mask_cpu_flags`]. Masking with `0` forces
//! every metric through the scalar kernels; `-1` restores everything the
//! hardware offers. A mask can only remove features, never add them.
//!
//! ```rust
//! use planecmp::{cpu_flags, mask_cpu_flags, CpuFlags};
//!
//! mask_cpu_flags(0);
//! assert_eq!(cpu_flags(), CpuFlags::NONE);
//!
//! mask_cpu_flags(-1);
//! assert_eq!(cpu_flags(), planecmp::cpu::detected_flags());
//! ```

use std::cell::Cell;
use std::fmt;
use std::sync::OnceLock;

/// Set of vector instruction extensions usable by the kernels.
///
/// Bit values are fixed, so a raw `i32` mask keeps its meaning across
/// releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CpuFlags(u32);

impl CpuFlags {
    /// No vector extensions: scalar kernels only.
    pub const NONE: CpuFlags = CpuFlags(0);
    /// ARM NEON (mandatory on aarch64).
    pub const NEON: CpuFlags = CpuFlags(0x4);
    pub const SSE2: CpuFlags = CpuFlags(0x20);
    /// No kernel requires this flag; it is detected so masks keep their
    /// bit layout.
    pub const SSSE3: CpuFlags = CpuFlags(0x40);
    pub const SSE41: CpuFlags = CpuFlags(0x80);
    /// Detected for the mask layout only, like [`CpuFlags::SSSE3`].
    pub const SSE42: CpuFlags = CpuFlags(0x100);
    /// Detected for the mask layout only, like [`CpuFlags::SSSE3`].
    pub const AVX: CpuFlags = CpuFlags(0x200);
    pub const AVX2: CpuFlags = CpuFlags(0x400);
    /// Every flag this crate knows about.
    pub const ALL: CpuFlags = CpuFlags(0x4 | 0x20 | 0x40 | 0x80 | 0x100 | 0x200 | 0x400);

    const NAMED: [(CpuFlags, &'static str); 7] = [
        (CpuFlags::NEON, "neon"),
        (CpuFlags::SSE2, "sse2"),
        (CpuFlags::SSSE3, "ssse3"),
        (CpuFlags::SSE41, "sse4.1"),
        (CpuFlags::SSE42, "sse4.2"),
        (CpuFlags::AVX, "avx"),
        (CpuFlags::AVX2, "avx2"),
    ];

    /// Query the host for supported extensions (uncached).
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            Self::detect_x86()
        }

        #[cfg(target_arch = "aarch64")]
        {
            Self::detect_arm()
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Self::NONE
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn detect_x86() -> Self {
        let mut flags = Self::NONE;
        let probes = [
            (is_x86_feature_detected!("sse2"), Self::SSE2),
            (is_x86_feature_detected!("ssse3"), Self::SSSE3),
            (is_x86_feature_detected!("sse4.1"), Self::SSE41),
            (is_x86_feature_detected!("sse4.2"), Self::SSE42),
            (is_x86_feature_detected!("avx"), Self::AVX),
            (is_x86_feature_detected!("avx2"), Self::AVX2),
        ];
        for (present, flag) in probes {
            if present {
                flags = flags.union(flag);
            }
        }
        flags
    }

    #[cfg(target_arch = "aarch64")]
    fn detect_arm() -> Self {
        if std::arch::is_aarch64_feature_detected!("neon") {
            Self::NEON
        } else {
            Self::NONE
        }
    }

    /// Build flags from a raw mask, dropping unknown bits.
    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        CpuFlags(bits & Self::ALL.0)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every flag in `other` is also set in `self`.
    #[inline]
    pub const fn contains(self, other: CpuFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: CpuFlags) -> Self {
        CpuFlags(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: CpuFlags) -> Self {
        CpuFlags(self.0 & other.0)
    }

    /// Apply an `i32` override mask: `0` clears everything, `-1` keeps all.
    #[inline]
    pub const fn masked(self, mask: i32) -> Self {
        CpuFlags(self.0 & mask as u32)
    }
}

impl fmt::Display for CpuFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("scalar");
        }
        let mut first = true;
        for (flag, name) in Self::NAMED {
            if self.contains(flag) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

static DETECTED: OnceLock<CpuFlags> = OnceLock::new();

thread_local! {
    static CPU_MASK: Cell<i32> = const { Cell::new(-1) };
}

/// Hardware flags, detected on first use and cached for the process.
pub fn detected_flags() -> CpuFlags {
    *DETECTED.get_or_init(|| {
        let flags = CpuFlags::detect();
        tracing::debug!(flags = %flags, "detected cpu features");
        flags
    })
}

/// Flags the dispatcher currently honours on this thread.
#[inline]
pub fn cpu_flags() -> CpuFlags {
    detected_flags().masked(CPU_MASK.with(Cell::get))
}

/// Restrict the flags used by dispatch on the calling thread.
///
/// `0` forces the scalar kernels, `-1` re-enables every detected feature,
/// anything else keeps only the detected features whose bits are set. The
/// mask is thread-local, so parallel tests cannot observe each other's
/// overrides.
pub fn mask_cpu_flags(mask: i32) {
    CPU_MASK.with(|cell| cell.set(mask));
    tracing::trace!(mask, effective = %cpu_flags(), "cpu feature mask updated");
}
