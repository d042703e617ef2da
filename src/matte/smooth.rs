use image::{Rgba, RgbaImage};

/// Runs one alpha-smoothing pass.
///
/// Reads only from `src` and writes into a fresh buffer, so every pixel sees
/// the same pre-pass state. Only interior pixels whose alpha is strictly
/// between 0 and 255 change: their alpha becomes the mean of itself and the
/// floored average of its eight neighbours. Border pixels are never touched.
pub fn smooth_pass(src: &RgbaImage) -> RgbaImage {
    let (width, height) = src.dimensions();
    let mut out = src.clone();

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let Rgba([r, g, b, a]) = *src.get_pixel(x, y);
            if a == 0 || a == 255 {
                continue;
            }

            let mut sum = 0u32;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    if nx == x && ny == y {
                        continue;
                    }
                    sum += u32::from(src.get_pixel(nx, ny).0[3]);
                }
            }
            let avg_alpha = sum / 8;
            let new_alpha = (u32::from(a) + avg_alpha) / 2;
            out.put_pixel(x, y, Rgba([r, g, b, new_alpha as u8]));
        }
    }
    out
}

/// Applies `passes` rounds of [`smooth_pass`], each on the previous output.
pub fn smooth_edges(src: &RgbaImage, passes: usize) -> RgbaImage {
    let mut img = src.clone();
    for _ in 0..passes {
        img = smooth_pass(&img);
    }
    img
}
