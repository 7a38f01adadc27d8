use std::sync::Arc;

use tiny_skia as sk;

use crate::brush::{BrushCatalog, BrushMask};
use crate::canvas::{Canvas, BACKGROUND};
use crate::error::{Error, Result};
use crate::stroke::Stroke;

/// paints an ordered stroke list onto a canvas, later strokes over earlier ones.
/// implementations must be deterministic for identical inputs.
pub trait StrokeRenderer {
    fn render(&mut self, strokes: &[Stroke], canvas: &mut Canvas) -> Result<()>;
}

/// cpu compositor built on tiny-skia. each stroke is its brush mask tinted with
/// the stroke colour, scaled, rotated about its centre and drawn source-over.
pub struct BrushRenderer {
    brushes: Arc<BrushCatalog>,
    // scratch pixmap reused across calls, resized when the canvas changes
    scratch: Option<sk::Pixmap>,
    // one tint buffer per brush, recoloured in place per stroke
    tints: Vec<sk::Pixmap>,
}

impl BrushRenderer {
    pub fn new(brushes: Arc<BrushCatalog>) -> Result<Self> {
        let tints = brushes
            .masks()
            .iter()
            .map(|m| {
                sk::Pixmap::new(m.width, m.height).ok_or(Error::InvalidConfig(format!(
                    "brush mask has zero area ({}x{})",
                    m.width, m.height
                )))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { brushes, scratch: None, tints })
    }
}

/// write premultiplied rgba for `color` at mask coverage into the tint buffer.
/// (x * a + 127) / 255 is a rounded divide-by-255
fn tint_mask(mask: &BrushMask, color: [u8; 3], tint: &mut sk::Pixmap) {
    profiling::scope!("tint_mask");
    let dst = tint.data_mut();
    for (px, &a) in dst.chunks_exact_mut(4).zip(mask.coverage.iter()) {
        let a16 = a as u16;
        px[0] = ((color[0] as u16 * a16 + 127) / 255) as u8;
        px[1] = ((color[1] as u16 * a16 + 127) / 255) as u8;
        px[2] = ((color[2] as u16 * a16 + 127) / 255) as u8;
        px[3] = a;
    }
}

/// maps mask pixel space onto the canvas: centre the mask on the origin, scale
/// its longer side to size * max(w, h), rotate, then move to the stroke centre
pub fn stroke_transform(stroke: &Stroke, mask: &BrushMask, width: u32, height: u32) -> sk::Transform {
    let longest_canvas = width.max(height) as f32;
    let longest_mask = mask.width.max(mask.height).max(1) as f32;
    let scale = stroke.size * longest_canvas / longest_mask;
    let cx = stroke.x * width as f32;
    let cy = stroke.y * height as f32;

    sk::Transform::from_translate(cx, cy)
        .pre_concat(sk::Transform::from_rotate(stroke.rotation))
        .pre_concat(sk::Transform::from_scale(scale, scale))
        .pre_concat(sk::Transform::from_translate(
            -(mask.width as f32) / 2.0,
            -(mask.height as f32) / 2.0,
        ))
}

impl StrokeRenderer for BrushRenderer {
    fn render(&mut self, strokes: &[Stroke], canvas: &mut Canvas) -> Result<()> {
        profiling::scope!("BrushRenderer::render");
        let (w, h) = canvas.dimensions();
        let brushes = Arc::clone(&self.brushes);

        // validate before touching the scratch buffers
        for s in strokes {
            if brushes.get(s.brush).is_none() {
                return Err(Error::UnknownBrush { index: s.brush, len: brushes.len() });
            }
        }

        let need_new = match self.scratch.as_ref() {
            Some(pm) => pm.width() != w || pm.height() != h,
            None => true,
        };
        if need_new {
            self.scratch = Some(sk::Pixmap::new(w, h).ok_or(Error::InvalidProblem { width: w, height: h })?);
        }
        let pix = self.scratch.as_mut().ok_or(Error::InvalidProblem { width: w, height: h })?;

        let bg = sk::Color::from_rgba8(BACKGROUND[0], BACKGROUND[1], BACKGROUND[2], 255);
        pix.fill(bg);

        let paint = sk::PixmapPaint {
            quality: sk::FilterQuality::Bilinear,
            ..sk::PixmapPaint::default()
        };

        for s in strokes {
            let mask = &brushes.masks()[s.brush];
            let tint = &mut self.tints[s.brush];
            tint_mask(mask, s.color, tint);
            let transform = stroke_transform(s, mask, w, h);
            pix.draw_pixmap(0, 0, tint.as_ref(), &paint, transform, None);
        }

        // background is opaque so premultiplied == straight rgb
        for (dst, src) in canvas.rgb.chunks_exact_mut(3).zip(pix.data().chunks_exact(4)) {
            dst.copy_from_slice(&src[..3]);
        }
        Ok(())
    }
}
