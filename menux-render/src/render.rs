use crate::text::{TextCache, blend_pixmap};
use ab_glyph::FontVec;
use anyhow::{Result, anyhow, bail};
use menux_core::shape::TEXT_SIZE_RATIO;
use menux_core::{DisplayMetrics, MenuShape, Point, RenderRequest};
use menux_timing::{FrameTimeStats, FrameTimes, Timer};
use std::collections::HashMap;
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

const BACKGROUND: [u8; 4] = [24, 24, 28, 255];
const CELL: [u8; 4] = [64, 64, 72, 255];
const HIGHLIGHT: [u8; 4] = [200, 40, 40, 255];
const OUTLINE: [u8; 4] = [210, 210, 210, 255];

/// Segments used to approximate one radial sector's arc.
const ARC_STEPS: usize = 24;

/// Everything shown in one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scene<'a> {
    /// Instruction line at the top of the screen.
    pub prompt: Option<&'a str>,
    /// `(current, total)` trial counter.
    pub progress: Option<(usize, usize)>,
    /// The open menu, if a gesture is in progress.
    pub menu: Option<&'a RenderRequest>,
    /// Status line at the bottom (mode, last announcement).
    pub banner: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub dirty_count: usize,
}

/// Software renderer: draws into an offscreen canvas and copies only the
/// regions that changed into the window's frame buffer.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    text_px: f32,
    canvas: Pixmap,
    text: TextCache,
    dirty_regions: Vec<Rect>,
    first_frame: bool,
    component_times: HashMap<&'static str, FrameTimes>,
}

fn color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color(color(rgba));
    p.anti_alias = true;
    p
}

fn blank_canvas(width: u32, height: u32) -> Result<Pixmap> {
    let mut canvas = Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("cannot allocate a {width}x{height} canvas"))?;
    canvas.fill(color(BACKGROUND));
    Ok(canvas)
}

/// Point at `radius` from `origin`, `degrees` clockwise from north.
fn compass(origin: Point, radius: f32, degrees: f32) -> (f32, f32) {
    let a = degrees.to_radians();
    (origin.x + radius * a.sin(), origin.y - radius * a.cos())
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self> {
        Ok(Self {
            width,
            height,
            text_px: ui_text_px(width, height),
            canvas: blank_canvas(width, height)?,
            text: TextCache::new(font),
            dirty_regions: Vec::with_capacity(16),
            first_frame: true,
            component_times: ["clear", "draw", "copy", "total"]
                .into_iter()
                .map(|k| (k, FrameTimes::default()))
                .collect(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.text_px = ui_text_px(width, height);
        self.canvas = blank_canvas(width, height)?;
        self.dirty_regions.clear();
        self.first_frame = true;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn has_font(&self) -> bool {
        self.text.has_font()
    }

    /// Rolling timing per pipeline stage.
    pub fn timing_report(&self) -> Vec<(&'static str, FrameTimeStats)> {
        let mut report: Vec<_> = self
            .component_times
            .iter()
            .map(|(k, v)| (*k, v.stats()))
            .collect();
        report.sort_by_key(|(k, _)| *k);
        report
    }

    /// Draws `scene` and copies the changed regions into `frame_buffer`,
    /// which must be RGBA8 at the renderer's size.
    pub fn render_frame<T: Timer>(
        &mut self,
        scene: &Scene<'_>,
        frame_buffer: &mut [u8],
        timer: &T,
    ) -> Result<FrameStats> {
        if frame_buffer.len() != self.canvas.data().len() {
            bail!(
                "frame buffer holds {} bytes, canvas needs {}",
                frame_buffer.len(),
                self.canvas.data().len()
            );
        }
        let frame_start = timer.now();

        let mut present = std::mem::take(&mut self.dirty_regions);
        if self.first_frame {
            self.first_frame = false;
            present.clear();
            present.extend(Rect::from_xywh(0.0, 0.0, self.width as f32, self.height as f32));
        }

        let t = timer.now();
        self.clear_dirty(&present);
        let clear = timer.elapsed(t);

        let t = timer.now();
        self.draw_scene(scene);
        let draw = timer.elapsed(t);

        present.extend_from_slice(&self.dirty_regions);
        coalesce_dirty(&mut present);

        let t = timer.now();
        for rect in &present {
            self.copy_dirty_region(*rect, frame_buffer);
        }
        let copy = timer.elapsed(t);

        let total = timer.elapsed(frame_start);
        for (key, d) in [("clear", clear), ("draw", draw), ("copy", copy), ("total", total)] {
            if let Some(times) = self.component_times.get_mut(key) {
                times.record(d);
            }
        }

        Ok(FrameStats {
            clear,
            draw,
            copy,
            total,
            dirty_count: self.dirty_regions.len(),
        })
    }

    fn draw_scene(&mut self, scene: &Scene<'_>) {
        let (w, h) = (self.width as f32, self.height as f32);
        if let Some(request) = scene.menu {
            self.draw_menu(request);
        }
        if let Some(prompt) = scene.prompt {
            self.draw_text(prompt, self.text_px, (w * 0.5, h * 0.06));
        }
        if let Some((current, total)) = scene.progress {
            let counter = format!("Trial: {current}/{total}");
            self.draw_text(&counter, self.text_px * 0.8, (w * 0.08, h * 0.06));
        }
        if let Some(banner) = scene.banner {
            self.draw_text(banner, self.text_px * 0.8, (w * 0.5, h * 0.94));
        }
    }

    fn draw_menu(&mut self, request: &RenderRequest) {
        let n = request.items.len();
        if n == 0 {
            return;
        }
        let o = request.origin;
        let text_px = request.layout.text_size;
        match request.layout.shape {
            MenuShape::Linear {
                cell_width,
                cell_height,
            } => {
                for i in 0..n {
                    let y = o.y + cell_height * i as f32;
                    self.draw_cell(o.x, y, cell_width, cell_height, request.current == Some(i));
                }
                for (i, label) in request.items.iter().enumerate() {
                    let centre = (o.x + cell_width * 0.5, o.y + cell_height * (i as f32 + 0.5));
                    self.draw_text(label, text_px, centre);
                }
                self.mark_dirty(o.x, o.y, cell_width, cell_height * n as f32);
            }
            MenuShape::Radial { radius } => {
                self.draw_radial(o, radius, n, request.current);
                let sector = 360.0 / n as f32;
                for (i, label) in request.items.iter().enumerate() {
                    let centre = compass(o, radius * 0.68, sector * i as f32);
                    self.draw_text(label, text_px, centre);
                }
                self.mark_dirty(o.x - radius, o.y - radius, radius * 2.0, radius * 2.0);
            }
            MenuShape::Grid {
                cell_width,
                cells_per_row,
            } => {
                let per_row = cells_per_row.max(1);
                for i in 0..n {
                    let x = o.x + cell_width * (i % per_row) as f32;
                    let y = o.y + cell_width * (i / per_row) as f32;
                    self.draw_cell(x, y, cell_width, cell_width, request.current == Some(i));
                }
                for (i, label) in request.items.iter().enumerate() {
                    let centre = (
                        o.x + cell_width * ((i % per_row) as f32 + 0.5),
                        o.y + cell_width * ((i / per_row) as f32 + 0.5),
                    );
                    self.draw_text(label, text_px, centre);
                }
                let rows = n.div_ceil(per_row);
                self.mark_dirty(
                    o.x,
                    o.y,
                    cell_width * per_row.min(n) as f32,
                    cell_width * rows as f32,
                );
            }
        }
    }

    fn draw_cell(&mut self, x: f32, y: f32, w: f32, h: f32, highlighted: bool) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let fill = if highlighted { HIGHLIGHT } else { CELL };
        self.canvas
            .fill_rect(rect, &paint(fill), Transform::identity(), None);
        let outline = PathBuilder::from_rect(rect);
        self.stroke(&outline);
    }

    fn draw_radial(&mut self, o: Point, radius: f32, n: usize, current: Option<usize>) {
        if let Some(disc) = PathBuilder::from_circle(o.x, o.y, radius) {
            self.canvas.fill_path(
                &disc,
                &paint(CELL),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
            self.stroke(&disc);
        }

        let sector = 360.0 / n as f32;
        if let Some(index) = current {
            let start = sector * (index as f32 - 0.5);
            let mut pb = PathBuilder::new();
            pb.move_to(o.x, o.y);
            for step in 0..=ARC_STEPS {
                let (x, y) = compass(o, radius, start + sector * step as f32 / ARC_STEPS as f32);
                pb.line_to(x, y);
            }
            pb.close();
            if let Some(slice) = pb.finish() {
                self.canvas.fill_path(
                    &slice,
                    &paint(HIGHLIGHT),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }

        if n > 1 {
            let mut pb = PathBuilder::new();
            for i in 0..n {
                let (x, y) = compass(o, radius, sector * (i as f32 - 0.5));
                pb.move_to(o.x, o.y);
                pb.line_to(x, y);
            }
            if let Some(dividers) = pb.finish() {
                self.stroke(&dividers);
            }
        }
    }

    fn stroke(&mut self, path: &Path) {
        let stroke = Stroke {
            width: 2.0,
            ..Stroke::default()
        };
        self.canvas
            .stroke_path(path, &paint(OUTLINE), &stroke, Transform::identity(), None);
    }

    /// Draws `text` centred on `pos`. A no-op without a font.
    fn draw_text(&mut self, text: &str, size_px: f32, pos: (f32, f32)) {
        if size_px < 1.0 || text.is_empty() {
            return;
        }
        let Some(pm) = self.text.get(text, size_px) else {
            return;
        };
        let x = (pos.0 - pm.width() as f32 * 0.5).floor() as i32;
        let y = (pos.1 - pm.height() as f32 * 0.5).floor() as i32;
        if let Some((x, y, w, h)) = blend_pixmap(&mut self.canvas, &pm, x, y) {
            self.mark_dirty(x as f32, y as f32, w as f32, h as f32);
        }
    }

    /// Records a changed region, padded for strokes and anti-aliasing.
    fn mark_dirty(&mut self, x: f32, y: f32, w: f32, h: f32) {
        const PAD: f32 = 3.0;
        let x0 = (x - PAD).max(0.0);
        let y0 = (y - PAD).max(0.0);
        let x1 = (x + w + PAD).min(self.width as f32);
        let y1 = (y + h + PAD).min(self.height as f32);
        if let Some(r) = Rect::from_ltrb(x0, y0, x1, y1) {
            self.dirty_regions.push(r);
        }
    }

    fn clear_dirty(&mut self, dirty: &[Rect]) {
        let stride = self.width as usize * 4;
        let (width, height) = (self.width as f32, self.height as f32);
        let data = self.canvas.data_mut();
        for rect in dirty {
            let Some((x0, y0, x1, y1)) = pixel_span(rect, width, height) else {
                continue;
            };
            for y in y0..y1 {
                let off = y * stride + x0 * 4;
                for px in data[off..off + (x1 - x0) * 4].chunks_exact_mut(4) {
                    px.copy_from_slice(&BACKGROUND);
                }
            }
        }
    }

    fn copy_dirty_region(&self, dirty: Rect, frame_buffer: &mut [u8]) {
        let Some((x0, y0, x1, y1)) = pixel_span(&dirty, self.width as f32, self.height as f32)
        else {
            return;
        };
        let stride = self.width as usize * 4;
        let bytes = (x1 - x0) * 4;
        let data = self.canvas.data();
        for row in y0..y1 {
            let off = row * stride + x0 * 4;
            frame_buffer[off..off + bytes].copy_from_slice(&data[off..off + bytes]);
        }
    }
}

fn ui_text_px(width: u32, height: u32) -> f32 {
    DisplayMetrics::new(width, height)
        .scaled(TEXT_SIZE_RATIO)
        .max(12.0)
}

/// Integer pixel bounds of `rect`, clamped to the canvas.
fn pixel_span(rect: &Rect, width: f32, height: f32) -> Option<(usize, usize, usize, usize)> {
    let x0 = rect.left().floor().clamp(0.0, width) as usize;
    let y0 = rect.top().floor().clamp(0.0, height) as usize;
    let x1 = rect.right().ceil().clamp(0.0, width) as usize;
    let y1 = rect.bottom().ceil().clamp(0.0, height) as usize;
    (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
}

/// Merges rectangles on the same row band that touch.
fn coalesce_dirty(rects: &mut Vec<Rect>) {
    rects.sort_by(|a, b| a.y().total_cmp(&b.y()).then(a.x().total_cmp(&b.x())));
    let mut out: Vec<Rect> = Vec::with_capacity(rects.len());
    for r in rects.drain(..) {
        if let Some(last) = out.last_mut() {
            let same_row = (r.y() - last.y()).abs() < 1.0 && (r.height() - last.height()).abs() < 1.0;
            let touching = r.x() <= last.right() + 1.0;
            if same_row && touching {
                if let Some(merged) =
                    Rect::from_ltrb(last.x().min(r.x()), last.y(), last.right().max(r.right()), last.bottom())
                {
                    *last = merged;
                    continue;
                }
            }
        }
        out.push(r);
    }
    *rects = out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use menux_core::{ItemList, MenuKind, MenuLayout};
    use menux_timing::ManualTimer;

    const W: u32 = 320;
    const H: u32 = 240;

    fn renderer() -> SkiaRenderer {
        SkiaRenderer::new(W, H, None).unwrap()
    }

    fn frame() -> Vec<u8> {
        vec![0u8; (W * H * 4) as usize]
    }

    fn pixel(fb: &[u8], x: u32, y: u32) -> [u8; 4] {
        let i = ((y * W + x) * 4) as usize;
        [fb[i], fb[i + 1], fb[i + 2], fb[i + 3]]
    }

    fn request(kind: MenuKind, current: Option<usize>) -> RenderRequest {
        RenderRequest {
            layout: MenuLayout::new(kind, DisplayMetrics::new(W, H)),
            items: ItemList::from_slashed("1/2/4/8/16"),
            current,
            origin: Point::new(100.0, 60.0),
        }
    }

    #[test]
    fn first_frame_paints_background_everywhere() {
        let mut r = renderer();
        let mut fb = frame();
        r.render_frame(&Scene::default(), &mut fb, &ManualTimer::new(0))
            .unwrap();
        assert_eq!(pixel(&fb, 0, 0), BACKGROUND);
        assert_eq!(pixel(&fb, W - 1, H - 1), BACKGROUND);
    }

    #[test]
    fn rejects_mismatched_frame_buffer() {
        let mut r = renderer();
        let mut fb = vec![0u8; 16];
        assert!(r
            .render_frame(&Scene::default(), &mut fb, &ManualTimer::new(0))
            .is_err());
    }

    #[test]
    fn highlighted_linear_cell_is_red() {
        let mut r = renderer();
        let mut fb = frame();
        let req = request(MenuKind::Linear, Some(1));
        let MenuShape::Linear {
            cell_width,
            cell_height,
        } = req.layout.shape
        else {
            unreachable!()
        };
        let scene = Scene {
            menu: Some(&req),
            ..Scene::default()
        };
        let stats = r
            .render_frame(&scene, &mut fb, &ManualTimer::new(0))
            .unwrap();
        assert!(stats.dirty_count >= 1);

        let x = (100.0 + cell_width * 0.25) as u32;
        let y = (60.0 + cell_height * 1.5) as u32;
        assert_eq!(pixel(&fb, x, y), HIGHLIGHT);
        let y0 = (60.0 + cell_height * 0.5) as u32;
        assert_eq!(pixel(&fb, x, y0), CELL);
    }

    #[test]
    fn closed_menu_is_cleared_next_frame() {
        let mut r = renderer();
        let mut fb = frame();
        let timer = ManualTimer::new(0);
        let req = request(MenuKind::Grid, Some(0));
        let open = Scene {
            menu: Some(&req),
            ..Scene::default()
        };
        r.render_frame(&open, &mut fb, &timer).unwrap();
        assert_eq!(pixel(&fb, 110, 70), HIGHLIGHT);

        r.render_frame(&Scene::default(), &mut fb, &timer).unwrap();
        assert_eq!(pixel(&fb, 110, 70), BACKGROUND);
    }

    #[test]
    fn radial_highlight_covers_north_sector() {
        let mut r = renderer();
        let mut fb = frame();
        let mut req = request(MenuKind::Radial, Some(0));
        req.origin = Point::new(160.0, 120.0);
        let MenuShape::Radial { radius } = req.layout.shape else {
            unreachable!()
        };
        let scene = Scene {
            menu: Some(&req),
            ..Scene::default()
        };
        r.render_frame(&scene, &mut fb, &ManualTimer::new(0)).unwrap();

        let north = (160, (120.0 - radius * 0.5) as u32);
        // due east lies inside sector 1, clear of the dividers
        let east = ((160.0 + radius * 0.5) as u32, 120);
        assert_eq!(pixel(&fb, north.0, north.1), HIGHLIGHT);
        assert_eq!(pixel(&fb, east.0, east.1), CELL);
    }

    #[test]
    fn resize_reallocates_canvas() {
        let mut r = renderer();
        r.resize(64, 32).unwrap();
        assert_eq!(r.size(), (64, 32));
        assert_eq!(r.canvas().width(), 64);
        let mut fb = vec![0u8; 64 * 32 * 4];
        r.render_frame(&Scene::default(), &mut fb, &ManualTimer::new(0))
            .unwrap();
    }

    #[test]
    fn records_stage_timings() {
        let mut r = renderer();
        let mut fb = frame();
        r.render_frame(&Scene::default(), &mut fb, &ManualTimer::new(0))
            .unwrap();
        let names: Vec<_> = r.timing_report().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["clear", "copy", "draw", "total"]);
    }

    #[test]
    fn coalesce_merges_touching_rects() {
        let mut rects = vec![
            Rect::from_xywh(10.0, 0.0, 5.0, 4.0).unwrap(),
            Rect::from_xywh(0.0, 0.0, 10.0, 4.0).unwrap(),
            Rect::from_xywh(0.0, 20.0, 3.0, 3.0).unwrap(),
        ];
        coalesce_dirty(&mut rects);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0], Rect::from_xywh(0.0, 0.0, 15.0, 4.0).unwrap());
    }
}
