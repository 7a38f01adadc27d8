use serde::{Deserialize, Serialize};

use crate::brush::BrushCatalog;
use crate::error::{Error, Result};
use crate::rng::SearchRng;

// sampling ranges for fresh strokes
pub const SIZE_SAMPLE_MIN: f32 = 0.05;
pub const SIZE_SAMPLE_MAX: f32 = 0.8;
pub const ROTATION_FULL_TURN: f32 = 360.0;

/// one brush placement. coordinates and size are relative to the canvas so a
/// stroke list renders the same way at any resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// horizontal centre in [0, 1]
    pub x: f32,
    /// vertical centre in [0, 1]
    pub y: f32,
    /// longer mask side as a fraction of max(width, height)
    pub size: f32,
    /// degrees in [0, 360)
    pub rotation: f32,
    /// index into the brush catalog
    pub brush: usize,
    pub color: [u8; 3],
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            size: 0.25,
            rotation: 0.0,
            brush: 0,
            color: [0, 0, 0],
        }
    }
}

/// stroke attribute category touched by a single tabu move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Position,
    Size,
    Rotation,
    Color,
    Brush,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Position,
        Attribute::Size,
        Attribute::Rotation,
        Attribute::Color,
        Attribute::Brush,
    ];
}

impl Stroke {
    /// draw every attribute independently and uniformly from the fresh-stroke ranges.
    /// this is the only place new strokes come from; the tabu phase only perturbs.
    pub fn sample_random(rng: &mut SearchRng, brushes: &BrushCatalog) -> Result<Self> {
        profiling::scope!("Stroke::sample_random");
        if brushes.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        let x = rng.uniform_float(0.0, 1.0);
        let y = rng.uniform_float(0.0, 1.0);
        let size = rng.uniform_float(SIZE_SAMPLE_MIN, SIZE_SAMPLE_MAX);
        let rotation = rng.uniform_float(0.0, ROTATION_FULL_TURN);
        let brush = rng.uniform_int(0, brushes.max_index() as i32) as usize;
        let color = [
            rng.uniform_int(0, 255) as u8,
            rng.uniform_int(0, 255) as u8,
            rng.uniform_int(0, 255) as u8,
        ];
        Ok(Self { x, y, size, rotation, brush, color })
    }
}
