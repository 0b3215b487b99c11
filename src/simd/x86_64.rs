//! x86_64 SIMD implementations using SSE2, SSE4.1, and AVX2.

use crate::simd::{djb2_multiplier, djb2_weights, fallback, WindowSums};
use std::arch::x86_64::*;

/// Bytes per SSE accumulation block. Per-lane `u32` partial sums cannot
/// overflow within one block: 32768 * 65025 < 2^32.
const SSE_BLOCK_SIZE: usize = 1 << 15;

// ============================================================================
// DJB2 hash
// ============================================================================

/// Weights for one 16-byte step: byte `i` is multiplied by `33^(15-i)`.
static DJB2_WEIGHTS_16: [u32; 16] = djb2_weights::<16>();
/// Weights for one 32-byte step: byte `i` is multiplied by `33^(31-i)`.
static DJB2_WEIGHTS_32: [u32; 32] = djb2_weights::<32>();

const DJB2_MUL_16: u32 = djb2_multiplier(16);
const DJB2_MUL_32: u32 = djb2_multiplier(32);

/// Sum the four 32-bit lanes with wrapping arithmetic.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn hsum_epi32(v: __m128i) -> u32 {
    let v = _mm_add_epi32(v, _mm_shuffle_epi32(v, 0b01_00_11_10));
    let v = _mm_add_epi32(v, _mm_shuffle_epi32(v, 0b10_11_00_01));
    _mm_cvtsi128_si32(v) as u32
}

/// Compute the DJB2 hash 16 bytes at a time using SSE4.1.
///
/// Each step applies `hash = hash * 33^16 + sum(b[i] * 33^(15-i))`, which is
/// exactly sixteen iterations of the scalar recurrence modulo 2^32.
///
/// # Safety
/// Caller must ensure SSE4.1 is available on the current CPU.
#[target_feature(enable = "sse4.1")]
pub unsafe fn hash_djb2_sse41(data: &[u8], seed: u32) -> u32 {
    let zero = _mm_setzero_si128();
    let w = DJB2_WEIGHTS_16.as_ptr() as *const __m128i;
    let w0 = _mm_loadu_si128(w);
    let w1 = _mm_loadu_si128(w.add(1));
    let w2 = _mm_loadu_si128(w.add(2));
    let w3 = _mm_loadu_si128(w.add(3));

    let mut hash = seed;
    let mut chunks = data.chunks_exact(16);
    for chunk in &mut chunks {
        let v = _mm_loadu_si128(chunk.as_ptr() as *const __m128i);

        // Widen bytes 0..16 to four vectors of u32
        let lo = _mm_unpacklo_epi8(v, zero);
        let hi = _mm_unpackhi_epi8(v, zero);
        let b0 = _mm_unpacklo_epi16(lo, zero);
        let b1 = _mm_unpackhi_epi16(lo, zero);
        let b2 = _mm_unpacklo_epi16(hi, zero);
        let b3 = _mm_unpackhi_epi16(hi, zero);

        let sum = _mm_add_epi32(
            _mm_add_epi32(_mm_mullo_epi32(b0, w0), _mm_mullo_epi32(b1, w1)),
            _mm_add_epi32(_mm_mullo_epi32(b2, w2), _mm_mullo_epi32(b3, w3)),
        );

        hash = hash.wrapping_mul(DJB2_MUL_16).wrapping_add(hsum_epi32(sum));
    }

    fallback::hash_djb2(chunks.remainder(), hash)
}

/// Compute the DJB2 hash 32 bytes at a time using AVX2.
///
/// # Safety
/// Caller must ensure AVX2 is available on the current CPU.
#[target_feature(enable = "avx2")]
pub unsafe fn hash_djb2_avx2(data: &[u8], seed: u32) -> u32 {
    let w = DJB2_WEIGHTS_32.as_ptr() as *const __m256i;
    let w0 = _mm256_loadu_si256(w);
    let w1 = _mm256_loadu_si256(w.add(1));
    let w2 = _mm256_loadu_si256(w.add(2));
    let w3 = _mm256_loadu_si256(w.add(3));

    let mut hash = seed;
    let mut chunks = data.chunks_exact(32);
    for chunk in &mut chunks {
        let p = chunk.as_ptr();

        // Zero-extend 8 bytes at a time into eight u32 lanes
        let b0 = _mm256_cvtepu8_epi32(_mm_loadl_epi64(p as *const __m128i));
        let b1 = _mm256_cvtepu8_epi32(_mm_loadl_epi64(p.add(8) as *const __m128i));
        let b2 = _mm256_cvtepu8_epi32(_mm_loadl_epi64(p.add(16) as *const __m128i));
        let b3 = _mm256_cvtepu8_epi32(_mm_loadl_epi64(p.add(24) as *const __m128i));

        let sum = _mm256_add_epi32(
            _mm256_add_epi32(_mm256_mullo_epi32(b0, w0), _mm256_mullo_epi32(b1, w1)),
            _mm256_add_epi32(_mm256_mullo_epi32(b2, w2), _mm256_mullo_epi32(b3, w3)),
        );
        let folded = _mm_add_epi32(
            _mm256_castsi256_si128(sum),
            _mm256_extracti128_si256(sum, 1),
        );

        hash = hash.wrapping_mul(DJB2_MUL_32).wrapping_add(hsum_epi32(folded));
    }

    // At most 31 bytes left
    hash_djb2_sse41(chunks.remainder(), hash)
}

// ============================================================================
// Sum of squared errors
// ============================================================================

/// Sum of squared byte differences using SSE2, 16 bytes at a time.
///
/// # Safety
/// Caller must ensure SSE2 is available on the current CPU.
#[target_feature(enable = "sse2")]
pub unsafe fn sum_square_error_sse2(a: &[u8], b: &[u8]) -> u64 {
    let zero = _mm_setzero_si128();
    let mut total = 0u64;

    for (block_a, block_b) in a.chunks(SSE_BLOCK_SIZE).zip(b.chunks(SSE_BLOCK_SIZE)) {
        let mut acc = _mm_setzero_si128();
        let mut chunks_a = block_a.chunks_exact(16);
        let mut chunks_b = block_b.chunks_exact(16);

        for (ca, cb) in (&mut chunks_a).zip(&mut chunks_b) {
            let va = _mm_loadu_si128(ca.as_ptr() as *const __m128i);
            let vb = _mm_loadu_si128(cb.as_ptr() as *const __m128i);

            // |a - b| via two saturating subtractions
            let diff = _mm_or_si128(_mm_subs_epu8(va, vb), _mm_subs_epu8(vb, va));
            let lo = _mm_unpacklo_epi8(diff, zero);
            let hi = _mm_unpackhi_epi8(diff, zero);

            acc = _mm_add_epi32(acc, _mm_madd_epi16(lo, lo));
            acc = _mm_add_epi32(acc, _mm_madd_epi16(hi, hi));
        }

        let mut lanes = [0u32; 4];
        _mm_storeu_si128(lanes.as_mut_ptr() as *mut __m128i, acc);
        total += lanes.iter().map(|&x| x as u64).sum::<u64>();

        // Remainder scalar
        total += fallback::sum_square_error(chunks_a.remainder(), chunks_b.remainder());
    }

    total
}

/// Sum of squared byte differences using AVX2, 32 bytes at a time.
///
/// # Safety
/// Caller must ensure AVX2 is available on the current CPU.
#[target_feature(enable = "avx2")]
pub unsafe fn sum_square_error_avx2(a: &[u8], b: &[u8]) -> u64 {
    let zero = _mm256_setzero_si256();
    let mut total = 0u64;

    for (block_a, block_b) in a.chunks(SSE_BLOCK_SIZE).zip(b.chunks(SSE_BLOCK_SIZE)) {
        let mut acc = _mm256_setzero_si256();
        let mut chunks_a = block_a.chunks_exact(32);
        let mut chunks_b = block_b.chunks_exact(32);

        for (ca, cb) in (&mut chunks_a).zip(&mut chunks_b) {
            let va = _mm256_loadu_si256(ca.as_ptr() as *const __m256i);
            let vb = _mm256_loadu_si256(cb.as_ptr() as *const __m256i);

            let diff = _mm256_or_si256(_mm256_subs_epu8(va, vb), _mm256_subs_epu8(vb, va));
            // In-lane unpack; lane order does not matter for a sum
            let lo = _mm256_unpacklo_epi8(diff, zero);
            let hi = _mm256_unpackhi_epi8(diff, zero);

            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(lo, lo));
            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(hi, hi));
        }

        let mut lanes = [0u32; 8];
        _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, acc);
        total += lanes.iter().map(|&x| x as u64).sum::<u64>();

        // Fall back to SSE2 for the remaining bytes (at most 31)
        total += sum_square_error_sse2(chunks_a.remainder(), chunks_b.remainder());
    }

    total
}

// ============================================================================
// SSIM window moments
// ============================================================================

/// Gather the moments of the 8x8 window at the start of `a` and `b`.
///
/// Each row is eight bytes; sums come from `_mm_sad_epu8`, squares and
/// cross products from `_mm_madd_epi16` on zero-extended pixels.
///
/// # Safety
/// Caller must ensure SSE2 is available on the current CPU. Both slices
/// must cover seven strides plus eight bytes (checked by slicing).
#[target_feature(enable = "sse2")]
pub unsafe fn window_sums_sse2(a: &[u8], stride_a: usize, b: &[u8], stride_b: usize) -> WindowSums {
    let zero = _mm_setzero_si128();
    let mut sum_a = _mm_setzero_si128();
    let mut sum_b = _mm_setzero_si128();
    let mut sq_a = _mm_setzero_si128();
    let mut sq_b = _mm_setzero_si128();
    let mut axb = _mm_setzero_si128();

    for row in 0..8 {
        let ra = &a[row * stride_a..row * stride_a + 8];
        let rb = &b[row * stride_b..row * stride_b + 8];
        let va = _mm_loadl_epi64(ra.as_ptr() as *const __m128i);
        let vb = _mm_loadl_epi64(rb.as_ptr() as *const __m128i);

        sum_a = _mm_add_epi64(sum_a, _mm_sad_epu8(va, zero));
        sum_b = _mm_add_epi64(sum_b, _mm_sad_epu8(vb, zero));

        let wa = _mm_unpacklo_epi8(va, zero);
        let wb = _mm_unpacklo_epi8(vb, zero);
        sq_a = _mm_add_epi32(sq_a, _mm_madd_epi16(wa, wa));
        sq_b = _mm_add_epi32(sq_b, _mm_madd_epi16(wb, wb));
        axb = _mm_add_epi32(axb, _mm_madd_epi16(wa, wb));
    }

    // Upper eight bytes of each load are zero, so the high SAD lane is zero
    WindowSums {
        sum_a: _mm_cvtsi128_si32(sum_a) as u32,
        sum_b: _mm_cvtsi128_si32(sum_b) as u32,
        sum_sq_a: hsum_epi32(sq_a),
        sum_sq_b: hsum_epi32(sq_b),
        sum_axb: hsum_epi32(axb),
    }
}
