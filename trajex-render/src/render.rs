use crate::text::render_text_pixmap;
use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Transform};
use trajex_core::{HostError, Point, Presenter, Scene, Stimulus, StimulusKind};
use trajex_timing::{FrameStats, HighPrecisionTimer, Timer};

/// Height of the end ticks drawn on line stimuli.
const TICK_HEIGHT: f32 = 20.0;

/// Maps scene coordinates (origin at the centre, y up) to canvas pixels.
pub fn to_pixel(p: Point, width: u32, height: u32) -> (f32, f32) {
    (width as f32 / 2.0 + p.x as f32, height as f32 / 2.0 - p.y as f32)
}

fn color(c: [u8; 4]) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

type TextKey = (String, u32, [u8; 4]);

/// Software presenter: draws each scene into an RGBA canvas.
///
/// The canvas is premultiplied RGBA8; with opaque backgrounds it can be
/// copied straight into a window frame buffer.
pub struct SkiaPresenter {
    width: u32,
    height: u32,
    canvas: Pixmap,
    font: Option<FontVec>,
    text_cache: HashMap<TextKey, Arc<Pixmap>>,
    timer: HighPrecisionTimer,
    frames: u64,
}

impl SkiaPresenter {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let canvas = Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        Ok(Self {
            width,
            height,
            canvas,
            font: None,
            text_cache: HashMap::new(),
            timer: HighPrecisionTimer::new(),
            frames: 0,
        })
    }

    /// Loads a TrueType/OpenType font for text stimuli.
    pub fn with_font_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))?;
        self.font = Some(font);
        self.text_cache.clear();
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA bytes of the last rendered frame.
    pub fn frame(&self) -> &[u8] {
        self.canvas.data()
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Draw times of recent frames.
    pub fn frame_stats(&self) -> FrameStats {
        self.timer.frame_stats()
    }

    pub fn render(&mut self, scene: &Scene) -> Result<()> {
        let start = self.timer.now();
        self.canvas.fill(color(scene.background));
        for stimulus in scene.visible() {
            self.draw(stimulus)?;
        }
        let elapsed = self.timer.elapsed(start);
        self.timer.record_frame(elapsed);
        self.frames += 1;
        Ok(())
    }

    fn draw(&mut self, stimulus: &Stimulus) -> Result<()> {
        let (cx, cy) = to_pixel(stimulus.position, self.width, self.height);
        let mut paint = Paint::default();
        paint.anti_alias = true;

        match &stimulus.kind {
            StimulusKind::Circle { radius, color: c } => {
                paint.set_color(color(*c));
                let mut pb = PathBuilder::new();
                pb.push_circle(cx, cy, *radius);
                if let Some(path) = pb.finish() {
                    self.canvas
                        .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
                }
            }
            StimulusKind::Rectangle { width, height, color: c } => {
                paint.set_color(color(*c));
                if let Some(rect) = Rect::from_xywh(cx - width / 2.0, cy - height / 2.0, *width, *height) {
                    self.canvas.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
            StimulusKind::Line {
                length,
                thickness,
                color: c,
            } => {
                paint.set_color(color(*c));
                let left = cx - length / 2.0;
                let bars = [
                    Rect::from_xywh(left, cy - thickness / 2.0, *length, *thickness),
                    Rect::from_xywh(left - thickness / 2.0, cy - TICK_HEIGHT / 2.0, *thickness, TICK_HEIGHT),
                    Rect::from_xywh(left + length - thickness / 2.0, cy - TICK_HEIGHT / 2.0, *thickness, TICK_HEIGHT),
                ];
                for rect in bars.into_iter().flatten() {
                    self.canvas.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
            StimulusKind::Text { content, size, color: c } => {
                let Some(pm) = self.text_pixmap(content, *size, *c) else {
                    return Ok(());
                };
                let x = (cx - pm.width() as f32 / 2.0).round() as i32;
                let y = (cy - pm.height() as f32 / 2.0).round() as i32;
                self.canvas
                    .draw_pixmap(x, y, Pixmap::as_ref(&pm), &PixmapPaint::default(), Transform::identity(), None);
            }
        }
        Ok(())
    }

    fn text_pixmap(&mut self, content: &str, size: f32, c: [u8; 4]) -> Option<Arc<Pixmap>> {
        if content.is_empty() {
            return None;
        }
        let Some(font) = &self.font else {
            tracing::trace!(text = content, "no font loaded, text skipped");
            return None;
        };
        let key = (content.to_string(), size.to_bits(), c);
        if let Some(pm) = self.text_cache.get(&key) {
            return Some(Arc::clone(pm));
        }
        let pm = Arc::new(render_text_pixmap(content, size, font, color(c))?);
        self.text_cache.insert(key, Arc::clone(&pm));
        Some(pm)
    }
}

impl Presenter for SkiaPresenter {
    fn present(&mut self, scene: &Scene) -> Result<(), HostError> {
        self.render(scene).map_err(|e| HostError::Present(e.to_string()))
    }
}

impl std::fmt::Debug for SkiaPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkiaPresenter")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_font", &self.font.is_some())
            .field("cached_texts", &self.text_cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn pixel(p: &SkiaPresenter, x: u32, y: u32) -> [u8; 4] {
        let c = p.canvas().pixel(x, y).unwrap();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn shown(id: &str, kind: StimulusKind, at: Point) -> Stimulus {
        let mut s = Stimulus::new(id, kind, at);
        s.visible = true;
        s
    }

    #[test]
    fn y_axis_points_up() {
        assert_eq!(to_pixel(Point::new(0.0, 0.0), 100, 100), (50.0, 50.0));
        assert_eq!(to_pixel(Point::new(10.0, 30.0), 100, 100), (60.0, 20.0));
    }

    #[test]
    fn draws_visible_stimuli_only() {
        let mut scene = Scene::new(BLACK);
        scene.add(shown(
            "box",
            StimulusKind::Rectangle {
                width: 10.0,
                height: 10.0,
                color: RED,
            },
            Point::new(0.0, 30.0),
        ));
        scene.add(Stimulus::new(
            "hidden",
            StimulusKind::Circle { radius: 5.0, color: RED },
            Point::new(0.0, -30.0),
        ));

        let mut p = SkiaPresenter::new(100, 100).unwrap();
        p.present(&scene).unwrap();
        assert_eq!(pixel(&p, 50, 20), RED);
        assert_eq!(pixel(&p, 50, 80), BLACK);
        assert_eq!(p.frames_rendered(), 1);
        assert_eq!(p.frame().len(), 100 * 100 * 4);
    }

    #[test]
    fn line_has_end_ticks() {
        let mut scene = Scene::new(BLACK);
        scene.add(shown(
            "line",
            StimulusKind::Line {
                length: 60.0,
                thickness: 2.0,
                color: RED,
            },
            Point::ORIGIN,
        ));
        let mut p = SkiaPresenter::new(100, 100).unwrap();
        p.present(&scene).unwrap();
        assert_eq!(pixel(&p, 50, 50), RED);
        // left tick, 8 px above the line
        assert_eq!(pixel(&p, 20, 42), RED);
        assert_eq!(pixel(&p, 50, 42), BLACK);
    }

    #[test]
    fn text_without_font_is_skipped() {
        let mut scene = Scene::new(BLACK);
        scene.add(shown(
            "label",
            StimulusKind::Text {
                content: "42".into(),
                size: 24.0,
                color: RED,
            },
            Point::ORIGIN,
        ));
        let mut p = SkiaPresenter::new(64, 64).unwrap();
        assert!(!p.has_font());
        p.present(&scene).unwrap();
        assert_eq!(pixel(&p, 32, 32), BLACK);
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let p = SkiaPresenter::new(8, 8).unwrap();
        assert!(p.with_font_file("/nonexistent/font.ttf").is_err());
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        assert!(SkiaPresenter::new(0, 10).is_err());
    }
}
