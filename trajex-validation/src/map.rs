//! Pixel classification lookup for location and gradient validators.
//!
//! The map covers `width` x `height` screen pixels centred on `center`.
//! Each cell holds a packed `0xRRGGBB` colour; alpha is dropped.

use image::RgbaImage;
use std::path::Path;
use trajex_core::Point;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to load classification image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

pub fn unpack_rgb(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationMap {
    width: u32,
    height: u32,
    center: Point,
    cells: Vec<u32>,
}

impl ClassificationMap {
    /// Builds a map by evaluating `f(column, row)` for every cell, row 0 at the top.
    pub fn from_fn(width: u32, height: u32, center: Point, mut f: impl FnMut(u32, u32) -> u32) -> Self {
        let mut cells = Vec::with_capacity((width * height) as usize);
        for row in 0..height {
            for col in 0..width {
                cells.push(f(col, row) & 0x00ff_ffff);
            }
        }
        Self {
            width,
            height,
            center,
            cells,
        }
    }

    pub fn from_image(img: &RgbaImage, center: Point) -> Self {
        Self::from_fn(img.width(), img.height(), center, |x, y| {
            let [r, g, b, _] = img.get_pixel(x, y).0;
            pack_rgb(r, g, b)
        })
    }

    pub fn load(path: impl AsRef<Path>, center: Point) -> Result<Self, MapError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| MapError::Image {
            path: path.display().to_string(),
            source,
        })?;
        let map = Self::from_image(&img.to_rgba8(), center);
        tracing::debug!(path = %path.display(), width = map.width, height = map.height, "loaded classification map");
        Ok(map)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn center_mut(&mut self) -> &mut Point {
        &mut self.center
    }

    /// Every cell's colour, row by row from the top.
    pub fn colors(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.iter().copied()
    }

    /// Colour under a screen position, or `None` off the map.
    pub fn class_at(&self, p: Point) -> Option<u32> {
        let px = (p.x - (self.center.x - f64::from(self.width) / 2.0)).floor();
        let py = ((self.center.y + f64::from(self.height) / 2.0) - p.y).floor();
        if px < 0.0 || py < 0.0 || px >= f64::from(self.width) || py >= f64::from(self.height) {
            return None;
        }
        self.cells.get(py as usize * self.width as usize + px as usize).copied()
    }
}
