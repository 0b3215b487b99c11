use planecmp::{Kernels, Plane, SsimOptions, DJB2_SEED};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let noise = args
        .get(1)
        .map(|s| s.parse::<u8>())
        .transpose()?
        .map_or(8, i16::from);

    let (width, height, stride) = (640, 360, 704);
    let mut rng = StdRng::seed_from_u64(2024);

    // Diagonal gradient with padding bytes past the visible width
    let reference: Vec<u8> = (0..stride * height)
        .map(|i| {
            let (x, y) = (i % stride, i / stride);
            if x < width {
                ((x + 2 * y) / 4 % 256) as u8
            } else {
                0xEE
            }
        })
        .collect();
    let distorted: Vec<u8> = reference
        .iter()
        .map(|&p| (p as i16 + rng.gen_range(-noise..=noise)).clamp(0, 255) as u8)
        .collect();

    let a = Plane::new(&reference, stride, width, height)?;
    let b = Plane::new(&distorted, stride, width, height)?;

    println!("Frame: {width}x{height} (stride {stride}), noise +/-{noise}");
    println!("Hash (reference): {:#010x}", a.hash_djb2(DJB2_SEED));
    println!("Hash (distorted): {:#010x}", b.hash_djb2(DJB2_SEED));
    println!("SSE:  {}", a.sum_square_error(&b)?);
    println!("PSNR: {:.3} dB", a.psnr(&b)?);
    println!("SSIM: {:.5}", a.ssim(&b)?);

    let dense = SsimOptions::builder().step(1).try_build()?;
    println!("SSIM (step 1): {:.5}", a.ssim_with(&b, &dense)?);

    for kernels in [Kernels::scalar(), Kernels::detected()] {
        let psnr = kernels.frame_psnr(&reference, stride, &distorted, stride, width, height);
        println!("{kernels:?}: PSNR {psnr:.3} dB");
    }

    Ok(())
}
