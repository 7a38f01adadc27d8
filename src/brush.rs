use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use image::imageops::{self, FilterType};
use log::info;

use crate::error::{Error, Result};

/// ordered list of mask files making up the default catalog
pub const DEFAULT_BRUSH_FILES: [&str; 4] = ["1.jpg", "2.jpg", "3.jpg", "4.jpg"];

/// masks larger than this on their longer side are downsampled on load
pub const MAX_MASK_SIDE: u32 = 64;

/// grayscale coverage mask, 0 = untouched, 255 = fully painted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrushMask {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

impl BrushMask {
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut coverage = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                coverage.push(f(x, y));
            }
        }
        Self { width, height, coverage }
    }

    /// decode a mask image. dark ink on light paper, so coverage is inverted luma
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let mut luma = img.to_luma8();
        let longest = luma.width().max(luma.height());
        if longest > MAX_MASK_SIDE {
            let f = MAX_MASK_SIDE as f32 / longest as f32;
            let w = ((luma.width() as f32 * f).round() as u32).max(1);
            let h = ((luma.height() as f32 * f).round() as u32).max(1);
            luma = imageops::resize(&luma, w, h, FilterType::Triangle);
        }
        if luma.width() == 0 || luma.height() == 0 {
            return Err(Error::InvalidConfig(format!("brush mask {} is empty", path.display())));
        }
        let coverage = luma.as_raw().iter().map(|&v| 255 - v).collect();
        Ok(Self {
            width: luma.width(),
            height: luma.height(),
            coverage,
        })
    }
}

/// read-only set of brush masks indexed 0..len. built once before any search
/// and handed to every component that needs it.
#[derive(Clone, Debug, Default)]
pub struct BrushCatalog {
    masks: Vec<BrushMask>,
}

impl BrushCatalog {
    pub fn new(masks: Vec<BrushMask>) -> Self {
        Self { masks }
    }

    /// load masks in the given order; fails on the first unreadable file
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        profiling::scope!("BrushCatalog::load");
        let masks = paths.iter().map(BrushMask::load).collect::<Result<Vec<_>>>()?;
        Ok(Self::new(masks))
    }

    /// load `1.jpg`..`4.jpg` from a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let paths: Vec<PathBuf> = DEFAULT_BRUSH_FILES.iter().map(|f| dir.join(f)).collect();
        Self::load(&paths)
    }

    /// four built-in masks: hard disc, soft disc, square, flat ellipse
    pub fn procedural() -> Self {
        const N: u32 = 32;
        // soft disc falloff is steepened so the pixels around the centre saturate
        const SOFT_GAIN: f32 = 1.25;
        let c = (N as f32 - 1.0) / 2.0;
        let r = N as f32 / 2.0;

        let hard = BrushMask::from_fn(N, N, |x, y| {
            let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
            if d <= r { 255 } else { 0 }
        });
        let soft = BrushMask::from_fn(N, N, |x, y| {
            let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt() / r;
            (255.0 * ((1.0 - d) * SOFT_GAIN).clamp(0.0, 1.0)).round() as u8
        });
        let square = BrushMask::from_fn(N, N, |_, _| 255);
        let ellipse = BrushMask::from_fn(N, N / 2, |x, y| {
            let cy = (N as f32 / 2.0 - 1.0) / 2.0;
            let nx = (x as f32 - c) / r;
            let ny = (y as f32 - cy) / (r / 2.0);
            if nx * nx + ny * ny <= 1.0 { 255 } else { 0 }
        });

        Self::new(vec![hard, soft, square, ellipse])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// largest valid brush index. only meaningful for a non-empty catalog
    #[inline]
    pub fn max_index(&self) -> usize {
        self.masks.len().saturating_sub(1)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&BrushMask> {
        self.masks.get(index)
    }

    pub fn masks(&self) -> &[BrushMask] {
        &self.masks
    }
}

/// process-wide catalog slot that is populated at most once.
/// later calls to `ensure_loaded` hand back the existing catalog without touching the loader.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    slot: OnceLock<Arc<BrushCatalog>>,
}

impl SharedCatalog {
    pub const fn new() -> Self {
        Self { slot: OnceLock::new() }
    }

    pub fn ensure_loaded<F>(&self, loader: F) -> Result<Arc<BrushCatalog>>
    where
        F: FnOnce() -> Result<BrushCatalog>,
    {
        if let Some(existing) = self.slot.get() {
            return Ok(Arc::clone(existing));
        }
        let catalog = loader()?;
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        info!("loaded {} brush masks", catalog.len());
        // a racing initialiser may have won; either way the slot is now set
        let _ = self.slot.set(Arc::new(catalog));
        self.slot.get().cloned().ok_or(Error::EmptyCatalog)
    }

    pub fn get(&self) -> Option<Arc<BrushCatalog>> {
        self.slot.get().cloned()
    }
}
