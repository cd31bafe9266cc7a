use std::fmt;

use crate::Rect;

/// A pixel width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::new(self.width, self.height)
    }

    /// Computes the largest [`Rect`], centered inside `self`, that has the given aspect ratio.
    ///
    /// Used to letterbox/pillarbox an image of a different aspect ratio into this resolution
    /// without distortion.
    pub fn fit_aspect_ratio(&self, ratio: AspectRatio) -> Rect {
        let self_ratio = self.aspect_ratio().as_f32();
        let target_ratio = ratio.as_f32();

        let (w, h) = if target_ratio > self_ratio {
            // target is wider than self: fit width, letterbox top/bottom
            let w = self.width;
            let h = (w as f32 / target_ratio).round() as u32;
            (w, h.min(self.height))
        } else {
            // target is taller than (or equal to) self: fit height, pillarbox left/right
            let h = self.height;
            let w = (h as f32 * target_ratio).round() as u32;
            (w.min(self.width), h)
        };

        let x = (self.width as i32 - w as i32) / 2;
        let y = (self.height as i32 - h as i32) / 2;
        Rect::from_top_left(x, y, w.max(1), h.max(1))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The ratio of a [`Resolution`]'s width to its height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio(f32);

impl AspectRatio {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(height > 0, "AspectRatio: height must be nonzero");
        Self(width as f32 / height as f32)
    }

    pub fn as_f32(&self) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_aspect_ratio_letterboxes_wider_target() {
        // 420x560 is 3:4 (portrait); fitting a 16:9 rect into it should letterbox top/bottom.
        let res = Resolution::new(420, 560);
        let rect = res.fit_aspect_ratio(AspectRatio::new(16, 9));
        assert_eq!(rect.width(), 420);
        assert!(rect.height() < 560);
    }

    #[test]
    fn fit_aspect_ratio_matching_fills_exactly() {
        let res = Resolution::new(420, 560);
        let rect = res.fit_aspect_ratio(AspectRatio::new(420, 560));
        assert_eq!(rect.width(), 420);
        assert_eq!(rect.height(), 560);
    }
}
