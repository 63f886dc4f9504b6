mod render;
mod text;

pub use render::{SkiaPresenter, to_pixel};
pub use text::render_text_pixmap;
