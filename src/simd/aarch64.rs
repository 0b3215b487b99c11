//! aarch64 NEON implementations.

use crate::simd::{djb2_multiplier, djb2_weights, fallback, WindowSums};
use std::arch::aarch64::*;

/// Bytes per SSE accumulation block, as on x86_64.
const SSE_BLOCK_SIZE: usize = 1 << 15;

static DJB2_WEIGHTS_16: [u32; 16] = djb2_weights::<16>();
const DJB2_MUL_16: u32 = djb2_multiplier(16);

/// Compute the DJB2 hash 16 bytes at a time using NEON.
///
/// # Safety
/// Caller must ensure NEON is available on the current CPU.
#[target_feature(enable = "neon")]
pub unsafe fn hash_djb2_neon(data: &[u8], seed: u32) -> u32 {
    let w = DJB2_WEIGHTS_16.as_ptr();
    let w0 = vld1q_u32(w);
    let w1 = vld1q_u32(w.add(4));
    let w2 = vld1q_u32(w.add(8));
    let w3 = vld1q_u32(w.add(12));

    let mut hash = seed;
    let mut chunks = data.chunks_exact(16);
    for chunk in &mut chunks {
        let v = vld1q_u8(chunk.as_ptr());
        let lo = vmovl_u8(vget_low_u8(v));
        let hi = vmovl_high_u8(v);

        let mut sum = vmulq_u32(vmovl_u16(vget_low_u16(lo)), w0);
        sum = vmlaq_u32(sum, vmovl_high_u16(lo), w1);
        sum = vmlaq_u32(sum, vmovl_u16(vget_low_u16(hi)), w2);
        sum = vmlaq_u32(sum, vmovl_high_u16(hi), w3);

        hash = hash.wrapping_mul(DJB2_MUL_16).wrapping_add(vaddvq_u32(sum));
    }

    fallback::hash_djb2(chunks.remainder(), hash)
}

/// Sum of squared byte differences using NEON, 16 bytes at a time.
///
/// # Safety
/// Caller must ensure NEON is available on the current CPU.
#[target_feature(enable = "neon")]
pub unsafe fn sum_square_error_neon(a: &[u8], b: &[u8]) -> u64 {
    let mut total = 0u64;

    for (block_a, block_b) in a.chunks(SSE_BLOCK_SIZE).zip(b.chunks(SSE_BLOCK_SIZE)) {
        let mut acc = vdupq_n_u32(0);
        let mut chunks_a = block_a.chunks_exact(16);
        let mut chunks_b = block_b.chunks_exact(16);

        for (ca, cb) in (&mut chunks_a).zip(&mut chunks_b) {
            let diff = vabdq_u8(vld1q_u8(ca.as_ptr()), vld1q_u8(cb.as_ptr()));
            // 255^2 fits in u16; pairwise-accumulate into u32 lanes
            acc = vpadalq_u16(acc, vmull_u8(vget_low_u8(diff), vget_low_u8(diff)));
            acc = vpadalq_u16(acc, vmull_high_u8(diff, diff));
        }

        total += vaddlvq_u32(acc);
        total += fallback::sum_square_error(chunks_a.remainder(), chunks_b.remainder());
    }

    total
}

/// Gather the moments of the 8x8 window at the start of `a` and `b`.
///
/// # Safety
/// Caller must ensure NEON is available on the current CPU. Both slices
/// must cover seven strides plus eight bytes (checked by slicing).
#[target_feature(enable = "neon")]
pub unsafe fn window_sums_neon(a: &[u8], stride_a: usize, b: &[u8], stride_b: usize) -> WindowSums {
    let mut sum_a = 0u32;
    let mut sum_b = 0u32;
    let mut sq_a = vdupq_n_u32(0);
    let mut sq_b = vdupq_n_u32(0);
    let mut axb = vdupq_n_u32(0);

    for row in 0..8 {
        let ra = &a[row * stride_a..row * stride_a + 8];
        let rb = &b[row * stride_b..row * stride_b + 8];
        let va = vld1_u8(ra.as_ptr());
        let vb = vld1_u8(rb.as_ptr());

        sum_a += vaddlv_u8(va) as u32;
        sum_b += vaddlv_u8(vb) as u32;
        sq_a = vpadalq_u16(sq_a, vmull_u8(va, va));
        sq_b = vpadalq_u16(sq_b, vmull_u8(vb, vb));
        axb = vpadalq_u16(axb, vmull_u8(va, vb));
    }

    WindowSums {
        sum_a,
        sum_b,
        sum_sq_a: vaddvq_u32(sq_a),
        sum_sq_b: vaddvq_u32(sq_b),
        sum_axb: vaddvq_u32(axb),
    }
}
