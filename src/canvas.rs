use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::{Error, Result};

/// background every render starts from
pub const BACKGROUND: [u8; 3] = [255, 255, 255];

/// fixed-size RGB pixel buffer, row-major, 3 bytes per pixel.
/// used both for the target image and for scratch renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Canvas {
    /// blank canvas filled with the background colour
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, BACKGROUND)
    }

    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut rgb = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            rgb.extend_from_slice(&color);
        }
        Self { width, height, rgb }
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        self.rgb[i..i + 3].copy_from_slice(&color);
    }

    /// reset every pixel to the background colour without reallocating
    pub fn clear(&mut self) {
        for px in self.rgb.chunks_exact_mut(3) {
            px.copy_from_slice(&BACKGROUND);
        }
    }

    pub fn from_image(img: &RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            rgb: img.as_raw().clone(),
        }
    }

    pub fn to_image(&self) -> RgbImage {
        ImageBuffer::from_fn(self.width, self.height, |x, y| Rgb(self.pixel(x, y)))
    }

    /// decode any supported image file into an RGB canvas
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        profiling::scope!("Canvas::load");
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(&img.to_rgb8()))
    }

    /// encode the canvas; format follows the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        profiling::scope!("Canvas::save");
        let path = path.as_ref();
        self.to_image().save(path).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_background() {
        let c = Canvas::new(3, 2);
        assert_eq!(c.rgb.len(), 18);
        assert!(c.rgb.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_pixel_access() {
        let mut c = Canvas::filled(4, 4, [0, 0, 0]);
        c.set_pixel(2, 3, [10, 20, 30]);
        assert_eq!(c.pixel(2, 3), [10, 20, 30]);
        assert_eq!(c.pixel(3, 2), [0, 0, 0]);
        c.clear();
        assert_eq!(c.pixel(2, 3), BACKGROUND);
    }

    #[test]
    fn test_image_conversion_keeps_layout() {
        let mut c = Canvas::new(5, 3);
        c.set_pixel(4, 0, [1, 2, 3]);
        let back = Canvas::from_image(&c.to_image());
        assert_eq!(back, c);
    }

    #[test]
    fn test_save_then_load_png() {
        let mut c = Canvas::filled(6, 4, [12, 200, 90]);
        c.set_pixel(0, 0, [0, 0, 0]);
        let path = std::env::temp_dir().join(format!("brushtrace-canvas-{}.png", std::process::id()));
        c.save(&path).unwrap();
        let loaded = Canvas::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, c);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = Canvas::load("/definitely/not/here.png").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }
}
