use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use bytemuck::{cast_slice, cast_slice_mut};
use menux_cache::{Atom, intern_label, label};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};
use tracing::{debug, warn};

/// Looked up in order when no font path is configured.
const SYSTEM_FONTS: &[&str] = &[
    "assets/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads the configured font, falling back to common system locations.
/// Without a font the renderer still draws menus, just without labels.
pub fn load_font(preferred: Option<&Path>) -> Option<FontVec> {
    let candidates = preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                debug!(path = %path.display(), "font loaded");
                return Some(font);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "unreadable font"),
        }
    }
    warn!("no usable font found; labels will not be drawn");
    None
}

/// Rasterises `text` into a tightly cropped, premultiplied pixmap.
pub fn render_text_pixmap(text: &str, font_size: f32, font: &FontVec, color: Color) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if outlines.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    let cu = [
        (color.red() * 255.0) as u8,
        (color.green() * 255.0) as u8,
        (color.blue() * 255.0) as u8,
        (color.alpha() * 255.0) as u8,
    ];

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            let a_lin = (cov * cu[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let bg = dst[i];
            // over, premultiplied: out = src + bg * (1 - src.a)
            let inv = 1.0 - (sa as f32 / 255.0);
            let blended = PremultipliedColorU8::from_rgba(
                ((cu[0] as f32 * a_lin) as u8).saturating_add((bg.red() as f32 * inv) as u8),
                ((cu[1] as f32 * a_lin) as u8).saturating_add((bg.green() as f32 * inv) as u8),
                ((cu[2] as f32 * a_lin) as u8).saturating_add((bg.blue() as f32 * inv) as u8),
                sa.saturating_add((bg.alpha() as f32 * inv) as u8),
            );
            if let Some(px) = blended {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Rendered label pixmaps keyed by interned text and pixel size.
pub struct TextCache {
    font: Option<FontVec>,
    color: Color,
    map: HashMap<(Atom, u32), Option<Arc<Pixmap>>>,
}

impl TextCache {
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            color: Color::WHITE,
            map: HashMap::new(),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Pixmap for `text` at `size_px`, rendering it on first use. `None`
    /// without a font or for text with no visible glyphs.
    pub fn get(&mut self, text: &str, size_px: f32) -> Option<Arc<Pixmap>> {
        let font = self.font.as_ref()?;
        let atom = label(intern_label(text))?;
        let key = (atom, size_px.round() as u32);
        if let Some(cached) = self.map.get(&key) {
            return cached.clone();
        }
        let rendered = render_text_pixmap(text, size_px, font, self.color).map(Arc::new);
        self.map.insert(key, rendered.clone());
        rendered
    }
}

/// Blends a premultiplied `src` onto `dst` with its top-left at `(x, y)`.
/// Returns the clipped destination rectangle, if anything was drawn.
pub fn blend_pixmap(dst: &mut Pixmap, src: &Pixmap, x: i32, y: i32) -> Option<(u32, u32, u32, u32)> {
    let (cw, ch) = (dst.width() as i32, dst.height() as i32);
    let (w, h) = (src.width() as i32, src.height() as i32);
    if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
        return None;
    }

    let dst_x = x.max(0) as usize;
    let dst_y = y.max(0) as usize;
    let src_x = (-x).max(0) as usize;
    let src_y = (-y).max(0) as usize;
    let copy_w = (w as usize - src_x).min(cw as usize - dst_x);
    let copy_h = (h as usize - src_y).min(ch as usize - dst_y);

    let src_stride = src.width() as usize;
    let dst_stride = cw as usize;
    let src_px: &[[u8; 4]] = cast_slice(src.data());
    let dst_px: &mut [[u8; 4]] = cast_slice_mut(dst.data_mut());

    for row in 0..copy_h {
        let s_off = (src_y + row) * src_stride + src_x;
        let d_off = (dst_y + row) * dst_stride + dst_x;
        let s_row = &src_px[s_off..s_off + copy_w];
        let d_row = &mut dst_px[d_off..d_off + copy_w];
        for (d, s) in d_row.iter_mut().zip(s_row) {
            let inv = 255 - s[3] as u32;
            if inv == 255 {
                continue;
            }
            for (dc, sc) in d.iter_mut().zip(s) {
                *dc = (*sc as u32 + (*dc as u32 * inv + 127) / 255).min(255) as u8;
            }
        }
    }
    Some((dst_x as u32, dst_y as u32, copy_w as u32, copy_h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Pixmap {
        let mut pm = Pixmap::new(w, h).unwrap();
        pm.fill(Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
        pm
    }

    #[test]
    fn opaque_source_replaces_destination() {
        let mut dst = solid(4, 4, [0, 0, 0, 255]);
        let src = solid(2, 2, [255, 0, 0, 255]);
        let drawn = blend_pixmap(&mut dst, &src, 1, 1);
        assert_eq!(drawn, Some((1, 1, 2, 2)));
        assert_eq!(dst.pixel(1, 1).unwrap().red(), 255);
        assert_eq!(dst.pixel(0, 0).unwrap().red(), 0);
    }

    #[test]
    fn blend_clips_at_edges() {
        let mut dst = solid(4, 4, [0, 0, 0, 255]);
        let src = solid(3, 3, [0, 255, 0, 255]);
        assert_eq!(blend_pixmap(&mut dst, &src, -2, 3), Some((0, 3, 1, 1)));
        assert_eq!(blend_pixmap(&mut dst, &src, 4, 0), None);
    }

    #[test]
    fn transparent_source_is_skipped() {
        let mut dst = solid(2, 2, [10, 20, 30, 255]);
        let src = Pixmap::new(2, 2).unwrap();
        blend_pixmap(&mut dst, &src, 0, 0);
        let px = dst.pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (10, 20, 30));
    }

    #[test]
    fn cache_without_font_renders_nothing() {
        let mut cache = TextCache::new(None);
        assert!(!cache.has_font());
        assert!(cache.get("Selected 4", 24.0).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_font_path_falls_back() {
        // whatever the machine has, a bogus path must not be fatal
        let _ = load_font(Some(Path::new("/no/such/font.ttf")));
    }
}
