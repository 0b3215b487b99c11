//! Reference values for the comparison metrics on a bordered 128x72 plane.
//!
//! Every check runs twice: once with the thread restricted to scalar
//! kernels and once with everything the CPU reports, and both runs must
//! agree exactly.

use planecmp::{
    calc_frame_psnr, calc_frame_ssim, compute_sum_square_error, hash_djb2, mask_cpu_flags, Plane,
    DJB2_SEED, MAX_PSNR,
};

const WIDTH: usize = 128;
const HEIGHT: usize = 72;
const BORDER: usize = 128;
const STRIDE: usize = WIDTH + 2 * BORDER;
const PLANE_SIZE: usize = STRIDE * (HEIGHT + 2 * BORDER);
const ORIGIN: usize = BORDER * STRIDE + BORDER;
const MAX_WIDTH: usize = 4096 * 3;

/// Bordered test plane with every byte set to `value`.
fn filled(value: u8) -> Vec<u8> {
    vec![value; PLANE_SIZE]
}

/// Run `f` under the scalar mask and the full mask, check both agree.
fn scalar_and_simd<T, F>(f: F) -> T
where
    T: PartialEq + std::fmt::Debug,
    F: Fn() -> T,
{
    mask_cpu_flags(0);
    let scalar = f();
    mask_cpu_flags(-1);
    let simd = f();
    assert_eq!(scalar, simd, "scalar and SIMD paths disagree");
    simd
}

fn psnr(a: &[u8], b: &[u8]) -> f64 {
    scalar_and_simd(|| {
        calc_frame_psnr(&a[ORIGIN..], STRIDE, &b[ORIGIN..], STRIDE, WIDTH, HEIGHT)
    })
}

fn ssim(a: &[u8], b: &[u8]) -> f64 {
    scalar_and_simd(|| {
        calc_frame_ssim(&a[ORIGIN..], STRIDE, &b[ORIGIN..], STRIDE, WIDTH, HEIGHT)
    })
}

#[test]
fn test_sum_square_error_reference_string() {
    let sse = scalar_and_simd(|| compute_sum_square_error(b"test0123test4567", b"tick0123tock4567"));
    assert_eq!(sse, 790);
}

#[test]
fn test_sum_square_error_wide_rows() {
    let zeros = vec![0u8; MAX_WIDTH];
    let ones = vec![1u8; MAX_WIDTH];
    let a = vec![190u8; MAX_WIDTH];
    let b = vec![193u8; MAX_WIDTH];

    assert_eq!(scalar_and_simd(|| compute_sum_square_error(&zeros, &zeros)), 0);
    assert_eq!(
        scalar_and_simd(|| compute_sum_square_error(&ones, &zeros)),
        MAX_WIDTH as u64
    );
    assert_eq!(
        scalar_and_simd(|| compute_sum_square_error(&a, &b)),
        9 * MAX_WIDTH as u64
    );

    let a: Vec<u8> = (0..MAX_WIDTH).map(|i| (i % 256) as u8).collect();
    let b: Vec<u8> = (0..MAX_WIDTH).map(|i| (i * 7 % 256) as u8).collect();
    scalar_and_simd(|| compute_sum_square_error(&a, &b));
}

#[test]
fn test_hash_reference_buffers() {
    let data: Vec<u8> = (0..MAX_WIDTH + 1).map(|i| (i * 31 % 256) as u8).collect();
    for offset in [0, 1] {
        for len in [0, 1, 16, 31, 1000, MAX_WIDTH] {
            let slice = &data[offset..offset + len];
            let expected = slice
                .iter()
                .fold(DJB2_SEED, |h, &b| h.wrapping_mul(33).wrapping_add(b as u32));
            assert_eq!(
                scalar_and_simd(|| hash_djb2(slice, DJB2_SEED)),
                expected,
                "offset={offset}, len={len}"
            );
        }
    }
}

#[test]
fn test_psnr_reference_frames() {
    let zeros = filled(0);
    let ones = filled(1);
    let full = filled(255);

    assert_eq!(psnr(&zeros, &zeros), MAX_PSNR);
    assert_eq!(psnr(&full, &zeros), 0.0);

    let bias = psnr(&ones, &zeros);
    assert!(bias > 48.0 && bias < 49.0, "psnr={bias}");

    let ramp: Vec<u8> = (0..PLANE_SIZE).map(|i| (i % 256) as u8).collect();
    let ramp_psnr = psnr(&ramp, &zeros);
    assert!(ramp_psnr > 4.0 && ramp_psnr < 5.0, "psnr={ramp_psnr}");
}

#[test]
fn test_ssim_reference_frames() {
    let zeros = filled(0);
    let ones = filled(1);
    let full = filled(255);

    assert_eq!(ssim(&zeros, &zeros), 1.0);

    let extreme = ssim(&full, &zeros);
    assert!(extreme < 0.0001, "ssim={extreme}");

    let bias = ssim(&ones, &zeros);
    assert!(bias > 0.0001 && bias < 0.9, "ssim={bias}");

    let ramp: Vec<u8> = (0..PLANE_SIZE).map(|i| (i % 256) as u8).collect();
    let ramp_ssim = ssim(&ramp, &zeros);
    assert!(ramp_ssim > 0.0 && ramp_ssim < 0.009, "ssim={ramp_ssim}");
    assert_eq!(ssim(&ramp, &ramp), 1.0);
}

#[test]
fn test_border_does_not_participate() {
    let mut a = filled(255);
    let mut b = filled(0);
    for y in 0..HEIGHT {
        let row = ORIGIN + y * STRIDE;
        a[row..row + WIDTH].fill(77);
        b[row..row + WIDTH].fill(77);
    }

    assert_eq!(psnr(&a, &b), MAX_PSNR);
    assert_eq!(ssim(&a, &b), 1.0);

    let pa = Plane::new(&a[ORIGIN..], STRIDE, WIDTH, HEIGHT).unwrap();
    let pb = Plane::new(&b[ORIGIN..], STRIDE, WIDTH, HEIGHT).unwrap();
    assert_eq!(pa.hash_djb2(DJB2_SEED), pb.hash_djb2(DJB2_SEED));
    assert_eq!(pa.sum_square_error(&pb).unwrap(), 0);
}
