//! CPU-side output surface

use image::{Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

/// RGBA colour, one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba(color.0)
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        Self(pixel.0)
    }
}

/// The image every frame is composited into before presentation
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Reallocate to a new size; contents are cleared when the size changes
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.size() != (width, height) {
            self.image = RgbaImage::new(width, height);
        }
    }

    pub fn fill(&mut self, color: Color) {
        let pixel = Rgba::from(color);
        for p in self.image.pixels_mut() {
            *p = pixel;
        }
    }

    /// Alpha-blend `image` with its top-left corner at `(x, y)`
    ///
    /// Parts outside the surface are clipped.
    pub fn blit(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.image, image, x, y);
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).map(|p| Color::from(*p))
    }

    #[must_use]
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }
}
