//! Presentation adapters

use image::RgbaImage;

use super::surface::Surface;

#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    #[error("surface is {actual:?}, presenter expects {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("presentation failed: {0}")]
    Backend(String),
}

/// Shows a composited surface somewhere
pub trait Presenter {
    /// Show one finished frame
    ///
    /// # Errors
    ///
    /// Implementation specific; the runtime stops the tick on failure
    fn present(&mut self, surface: &Surface) -> Result<(), PresentError>;

    /// Size the next surface should have
    fn surface_size(&self) -> (u32, u32);

    /// The output was resized, e.g. the window changed size
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Presenter without an output, keeping the last frame for inspection
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    size: (u32, u32),
    frames: u64,
    last_frame: Option<RgbaImage>,
}

impl HeadlessPresenter {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            frames: 0,
            last_frame: None,
        }
    }

    /// Number of frames presented so far
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.last_frame.as_ref()
    }
}

impl Presenter for HeadlessPresenter {
    fn present(&mut self, surface: &Surface) -> Result<(), PresentError> {
        if surface.size() != self.size {
            return Err(PresentError::SizeMismatch {
                expected: self.size,
                actual: surface.size(),
            });
        }
        self.frames += 1;
        self.last_frame = Some(surface.as_image().clone());
        Ok(())
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;

    #[test]
    fn test_headless_keeps_last_frame() {
        let mut presenter = HeadlessPresenter::new(2, 2);
        let mut surface = Surface::new(2, 2);
        surface.fill(Color::WHITE);

        presenter.present(&surface).unwrap();
        presenter.present(&surface).unwrap();

        assert_eq!(presenter.frames(), 2);
        let frame = presenter.last_frame().unwrap();
        assert_eq!(frame.get_pixel(1, 1).0, Color::WHITE.0);
    }

    #[test]
    fn test_size_mismatch() {
        let mut presenter = HeadlessPresenter::new(4, 4);
        let err = presenter.present(&Surface::new(2, 2)).unwrap_err();
        assert!(matches!(err, PresentError::SizeMismatch { .. }));
        assert_eq!(presenter.frames(), 0);
    }
}
