use image::RgbaImage;

use super::Surface;
use crate::geometry::ImageBounds;

/// The four surfaces of one editing session.
///
/// `base` holds the loaded image and is never painted on; `committed` is base
/// plus every finalized edit; `live` holds only the stroke in progress;
/// `display` is what the host presents, rebuilt by every draw.
#[derive(Debug, Clone)]
pub struct SurfaceStack {
    base: Surface,
    committed: Surface,
    live: Surface,
    display: Surface,
}

impl Default for SurfaceStack {
    fn default() -> Self {
        Self::new(RgbaImage::new(0, 0), 0, 0)
    }
}

impl SurfaceStack {
    pub fn new(image: RgbaImage, display_width: u32, display_height: u32) -> Self {
        let base = Surface::from_image(image);
        let committed = base.clone();
        let live = Surface::new(base.width(), base.height());
        Self {
            base,
            committed,
            live,
            display: Surface::new(display_width, display_height),
        }
    }

    /// Replaces the base image and resets committed and live to match it.
    pub fn load(&mut self, image: RgbaImage) {
        self.base = Surface::from_image(image);
        self.committed = self.base.clone();
        self.live = Surface::new(self.base.width(), self.base.height());
        self.display.clear();
    }

    pub fn image_bounds(&self) -> ImageBounds {
        self.base.bounds()
    }

    pub fn has_image(&self) -> bool {
        self.base.width() > 0 && self.base.height() > 0
    }

    pub fn base(&self) -> &Surface {
        &self.base
    }

    pub fn committed(&self) -> &Surface {
        &self.committed
    }

    pub fn committed_mut(&mut self) -> &mut Surface {
        &mut self.committed
    }

    /// Clears the committed surface and redraws the base image onto it.
    pub fn reset_committed(&mut self) {
        self.committed.copy_from(&self.base);
    }

    pub fn restore_committed(&mut self, snapshot: &Surface) {
        self.committed.copy_from(snapshot);
    }

    pub fn live(&self) -> &Surface {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut Surface {
        &mut self.live
    }

    pub fn clear_live(&mut self) {
        self.live.clear();
    }

    pub fn display(&self) -> &Surface {
        &self.display
    }

    pub fn resize_display(&mut self, width: u32, height: u32) {
        self.display.resize(width, height);
    }

    /// Borrows display mutably alongside committed and live for compositing.
    pub fn compose_parts(&mut self) -> (&mut Surface, &Surface, &Surface) {
        (&mut self.display, &self.committed, &self.live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Color, Rect};
    use crate::surface::CompositeMode;
    use image::Rgba;

    #[test]
    fn reset_committed_restores_base_after_painting() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
        let mut stack = SurfaceStack::new(image, 4, 4);
        stack.committed_mut().fill_rect(
            Rect::new(0.0, 0.0, 2.0, 2.0),
            Color::rgb(255, 0, 0),
            1.0,
            CompositeMode::PaintOver,
        );
        assert_ne!(stack.committed(), stack.base());

        stack.reset_committed();
        assert_eq!(stack.committed(), stack.base());
    }

    #[test]
    fn load_resets_every_surface_to_new_image_size() {
        let mut stack = SurfaceStack::default();
        assert!(!stack.has_image());

        stack.load(RgbaImage::from_pixel(7, 3, Rgba([1, 1, 1, 255])));
        assert!(stack.has_image());
        assert_eq!(stack.image_bounds(), ImageBounds::new(7, 3));
        assert_eq!(stack.live().width(), 7);
        assert_eq!(stack.committed(), stack.base());
        assert!(stack.live().as_image().pixels().all(|pixel| pixel[3] == 0));
    }
}
