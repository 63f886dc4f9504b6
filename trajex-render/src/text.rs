use ab_glyph::{Font, Glyph, PxScale, ScaleFont, point};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

/// Rasterizes one line of text into a tight transparent pixmap.
///
/// Returns `None` when nothing in `text` has an outline.
pub fn render_text_pixmap<F: Font>(text: &str, font_size: f32, font: &F, color: Color) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // layout with the baseline at the ascent
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

    let outlines: Vec<_> = glyphs.into_iter().filter_map(|g| font.outline_glyph(g)).collect();
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

    let cu = color.to_color_u8();
    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i64;
            let iy = (y as f32 + b.min.y - min_y).floor() as i64;
            if ix < 0 || iy < 0 || ix >= w as i64 || iy >= h as i64 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // premultiplied source over the existing pixel
            let a = (cov * cu.alpha() as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let inv = 1.0 - sa as f32 / 255.0;
            let bg = dst[i];
            let mix = |s: u8, d: u8| ((s as f32 * a) as u8).saturating_add((d as f32 * inv) as u8);
            let r = mix(cu.red(), bg.red());
            let g = mix(cu.green(), bg.green());
            let bl = mix(cu.blue(), bg.blue());
            let al = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(al), g.min(al), bl.min(al), al) {
                dst[i] = px;
            }
        });
    }
    Some(pm)
}
