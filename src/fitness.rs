//─────────────────────────────────────────────────────────────────────────────
// error metrics between a rendered canvas and the target
//─────────────────────────────────────────────────────────────────────────────

use crate::canvas::Canvas;
use crate::error::{Error, Result};

/// mean of squared per-channel differences over every RGB component.
/// a zero-pixel canvas has zero error; mismatched sizes are an error, never truncated.
pub fn mse(rendered: &Canvas, target: &Canvas) -> Result<f64> {
    profiling::scope!("mse");
    if rendered.dimensions() != target.dimensions() {
        return Err(Error::DimensionMismatch {
            rendered: rendered.dimensions(),
            target: target.dimensions(),
        });
    }
    let components = rendered.pixel_count() * 3;
    if components == 0 {
        return Ok(0.0);
    }

    // u64 accumulation is exact; worst case is 255^2 per component
    let acc: u64 = rendered.rgb[..components]
        .iter()
        .zip(&target.rgb[..components])
        .map(|(&a, &b)| {
            let d = a as i32 - b as i32;
            (d * d) as u64
        })
        .sum();

    Ok(acc as f64 / components as f64)
}

/// PSNR in decibels for 8-bit channels. higher is better:
///   - 30 dB = acceptable
///   - 35 dB = good
///   - 40+ dB = very good
#[inline]
pub fn psnr_from_mse(mse: f64) -> f64 {
    const PEAK: f64 = 255.0;
    let mse = mse.max(1e-12);
    10.0 * ((PEAK * PEAK) / mse).log10()
}

/// relative improvement of `after` over `before` in percent; 0 when `before` is not positive
#[inline]
pub fn improvement_percent(before: f64, after: f64) -> f64 {
    if before > 0.0 && before.is_finite() {
        (before - after) / before * 100.0
    } else {
        0.0
    }
}
