use crate::rng::SearchRng;
use crate::stroke::{Attribute, Stroke, ROTATION_FULL_TURN};

// base perturbation amplitudes at step scale 1.0
pub const POSITION_STEP: f32 = 0.10;
pub const SIZE_STEP: f32 = 0.30;
pub const ROTATION_STEP: f32 = 30.0;
pub const COLOR_STEP: f32 = 0.30;

// size bounds after perturbation (wider than the sampling range on purpose)
pub const SIZE_MIN: f32 = 0.01;
pub const SIZE_MAX: f32 = 1.5;

/// pick the attribute a neighbour move touches.
/// position 40%, size 25%, rotation 20%, color 10%, brush 5%
pub fn select_attribute(rng: &mut SearchRng) -> Attribute {
    let p = rng.uniform_float(0.0, 1.0);
    if p < 0.40 {
        Attribute::Position
    } else if p < 0.65 {
        Attribute::Size
    } else if p < 0.85 {
        Attribute::Rotation
    } else if p < 0.95 {
        Attribute::Color
    } else {
        Attribute::Brush
    }
}

/// wrap an angle into [0, 360)
#[inline]
pub fn wrap_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(ROTATION_FULL_TURN);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= ROTATION_FULL_TURN { 0.0 } else { wrapped }
}

/// copy of `base` with only `attr` perturbed. amplitudes scale linearly with `step_scale`.
/// `brush_count` bounds the brush index; with an empty catalog the brush move is a no-op.
pub fn perturb(base: &Stroke, attr: Attribute, rng: &mut SearchRng, step_scale: f32, brush_count: usize) -> Stroke {
    profiling::scope!("perturb");
    let mut s = *base;

    match attr {
        Attribute::Position => {
            let delta = POSITION_STEP * step_scale;
            s.x = (base.x + rng.uniform_float(-delta, delta)).clamp(0.0, 1.0);
            s.y = (base.y + rng.uniform_float(-delta, delta)).clamp(0.0, 1.0);
        }
        Attribute::Size => {
            let delta = SIZE_STEP * step_scale;
            let factor = 1.0 + rng.uniform_float(-delta, delta);
            s.size = (base.size * factor).clamp(SIZE_MIN, SIZE_MAX);
        }
        Attribute::Rotation => {
            let delta = ROTATION_STEP * step_scale;
            s.rotation = wrap_degrees(base.rotation + rng.uniform_float(-delta, delta));
        }
        Attribute::Color => {
            let delta = (255.0 * COLOR_STEP * step_scale) as i32;
            for (out, &chan) in s.color.iter_mut().zip(base.color.iter()) {
                *out = (chan as i32 + rng.uniform_int(-delta, delta)).clamp(0, 255) as u8;
            }
        }
        Attribute::Brush => {
            if brush_count > 0 {
                let max_index = brush_count as i32 - 1;
                let shifted = base.brush as i32 + rng.uniform_int(-1, 1);
                s.brush = shifted.clamp(0, max_index) as usize;
            }
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Stroke {
        Stroke {
            x: 0.98,
            y: 0.02,
            size: 0.011,
            rotation: 359.5,
            brush: 3,
            color: [250, 5, 128],
        }
    }

    #[test]
    fn test_attribute_distribution() {
        let mut rng = SearchRng::new(2024);
        let mut counts = [0usize; 5];
        let n = 20_000;
        for _ in 0..n {
            let a = select_attribute(&mut rng);
            let i = Attribute::ALL.iter().position(|&x| x == a).unwrap();
            counts[i] += 1;
        }
        let expected = [0.40, 0.25, 0.20, 0.10, 0.05];
        for (c, e) in counts.iter().zip(expected) {
            let freq = *c as f64 / n as f64;
            assert!((freq - e).abs() < 0.02, "freq {freq} vs {e}");
        }
    }

    #[test]
    fn test_only_selected_attribute_changes() {
        let mut rng = SearchRng::new(5);
        let b = base();
        for _ in 0..200 {
            let p = perturb(&b, Attribute::Position, &mut rng, 1.0, 4);
            assert_eq!((p.size, p.rotation, p.brush, p.color), (b.size, b.rotation, b.brush, b.color));

            let s = perturb(&b, Attribute::Size, &mut rng, 1.0, 4);
            assert_eq!((s.x, s.y, s.rotation, s.brush, s.color), (b.x, b.y, b.rotation, b.brush, b.color));

            let r = perturb(&b, Attribute::Rotation, &mut rng, 1.0, 4);
            assert_eq!((r.x, r.y, r.size, r.brush, r.color), (b.x, b.y, b.size, b.brush, b.color));

            let c = perturb(&b, Attribute::Color, &mut rng, 1.0, 4);
            assert_eq!((c.x, c.y, c.size, c.rotation, c.brush), (b.x, b.y, b.size, b.rotation, b.brush));

            let t = perturb(&b, Attribute::Brush, &mut rng, 1.0, 4);
            assert_eq!((t.x, t.y, t.size, t.rotation, t.color), (b.x, b.y, b.size, b.rotation, b.color));
        }
    }

    #[test]
    fn test_clamped_attributes_stay_in_range() {
        let mut rng = SearchRng::new(11);
        let mut s = base();
        for i in 0..5000 {
            let attr = Attribute::ALL[i % Attribute::ALL.len()];
            s = perturb(&s, attr, &mut rng, 2.0, 4);
            assert!((0.0..=1.0).contains(&s.x));
            assert!((0.0..=1.0).contains(&s.y));
            assert!((SIZE_MIN..=SIZE_MAX).contains(&s.size));
            assert!((0.0..ROTATION_FULL_TURN).contains(&s.rotation));
            assert!(s.brush < 4);
        }
    }

    #[test]
    fn test_perturbation_amplitude_follows_scale() {
        let mut rng = SearchRng::new(8);
        let b = Stroke { x: 0.5, y: 0.5, rotation: 180.0, color: [128, 128, 128], ..Stroke::default() };
        for _ in 0..500 {
            let p = perturb(&b, Attribute::Position, &mut rng, 0.5, 4);
            assert!((p.x - 0.5).abs() <= 0.05 + 1e-6);
            assert!((p.y - 0.5).abs() <= 0.05 + 1e-6);

            let r = perturb(&b, Attribute::Rotation, &mut rng, 0.1, 4);
            assert!((r.rotation - 180.0).abs() <= 3.0 + 1e-4);

            // floor(255 * 0.3 * 0.1) = 7
            let c = perturb(&b, Attribute::Color, &mut rng, 0.1, 4);
            assert!(c.color.iter().all(|&v| (v as i32 - 128).abs() <= 7));
        }
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(370.0), 10.0);
        assert_eq!(wrap_degrees(-30.0), 330.0);
        assert_eq!(wrap_degrees(-1e-9), 0.0);
        assert!(wrap_degrees(-720.5) >= 0.0);
    }

    #[test]
    fn test_size_floor() {
        let mut rng = SearchRng::new(4);
        let b = Stroke { size: SIZE_MIN, ..Stroke::default() };
        for _ in 0..500 {
            assert!(perturb(&b, Attribute::Size, &mut rng, 2.0, 1).size >= SIZE_MIN);
        }
    }

    #[test]
    fn test_brush_move_is_noop_without_catalog() {
        let mut rng = SearchRng::new(1);
        let b = base();
        for _ in 0..50 {
            assert_eq!(perturb(&b, Attribute::Brush, &mut rng, 1.0, 0), b);
        }
    }

    #[test]
    fn test_brush_move_steps_by_one() {
        let mut rng = SearchRng::new(6);
        let b = Stroke { brush: 1, ..Stroke::default() };
        for _ in 0..200 {
            let t = perturb(&b, Attribute::Brush, &mut rng, 1.0, 4);
            assert!((t.brush as i32 - 1).abs() <= 1);
        }
        let edge = Stroke { brush: 0, ..Stroke::default() };
        for _ in 0..200 {
            assert!(perturb(&edge, Attribute::Brush, &mut rng, 1.0, 4).brush <= 1);
        }
    }
}
