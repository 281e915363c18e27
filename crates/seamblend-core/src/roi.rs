//! Axis-aligned bounding boxes in panorama pixel space.
//!
//! A box spans `[x0, x1) x [y0, y1)`. Zero-area boxes are valid values and
//! stand for "nothing here"; they act as the identity for [`BoundingBox::unite`].

use ndarray::{s, Array2, ArrayView2, ArrayViewMut2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl BoundingBox {
    /// Build a box from two corners. A lower-right corner above or left of
    /// the upper-left one collapses to an empty box at the upper-left.
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self {
            x0,
            y0,
            x1: x1.max(x0),
            y1: y1.max(y0),
        }
    }

    pub fn from_size(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Box covering a whole `(height, width)` buffer.
    pub fn from_dim((height, width): (usize, usize)) -> Self {
        Self::from_size(0, 0, width, height)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    /// `(height, width)`, the ndarray shape of a buffer covering this box.
    pub fn dim(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    pub fn upper_left(&self) -> (usize, usize) {
        (self.x0, self.y0)
    }

    /// Smallest box containing both `self` and `other`.
    pub fn unite(&self, other: &BoundingBox) -> BoundingBox {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Overlap of the two boxes, or `None` when they share no pixel.
    pub fn intersect(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x1 > x0 && y1 > y0 {
            Some(BoundingBox { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    /// Intersection, or an empty box when the two do not overlap.
    pub fn clip_to(&self, bounds: &BoundingBox) -> BoundingBox {
        self.intersect(bounds).unwrap_or_default()
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.is_empty()
            || (other.x0 >= self.x0
                && other.y0 >= self.y0
                && other.x1 <= self.x1
                && other.y1 <= self.y1)
    }

    pub fn contains_point(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Express this box in the frame whose zero is `origin`'s upper-left corner.
    ///
    /// `self` must not extend above or left of `origin`; coordinates saturate at 0.
    pub fn relative_to(&self, origin: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.saturating_sub(origin.x0),
            y0: self.y0.saturating_sub(origin.y0),
            x1: self.x1.saturating_sub(origin.x0),
            y1: self.y1.saturating_sub(origin.y0),
        }
    }

    /// Shift the box by a non-negative offset.
    pub fn translate(&self, dx: usize, dy: usize) -> BoundingBox {
        BoundingBox {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    /// Grow by `border` pixels on every side. The upper-left saturates at 0;
    /// callers clip the result against the enclosing box.
    pub fn add_border(&self, border: usize) -> BoundingBox {
        BoundingBox {
            x0: self.x0.saturating_sub(border),
            y0: self.y0.saturating_sub(border),
            x1: self.x1 + border,
            y1: self.y1 + border,
        }
    }

    /// View of this box within `data`, whose origin is the frame's zero.
    pub fn view<'a, P>(&self, data: &'a Array2<P>) -> ArrayView2<'a, P> {
        data.slice(s![self.y0..self.y1, self.x0..self.x1])
    }

    pub fn view_mut<'a, P>(&self, data: &'a mut Array2<P>) -> ArrayViewMut2<'a, P> {
        data.slice_mut(s![self.y0..self.y1, self.x0..self.x1])
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{})-({},{}) {}x{}",
            self.x0,
            self.y0,
            self.x1,
            self.y1,
            self.width(),
            self.height()
        )
    }
}

/// Tight bounding box of the `true` entries of a mask, empty if none.
pub fn mask_bounds(alpha: &Array2<bool>) -> BoundingBox {
    let (h, w) = alpha.dim();
    let (mut x0, mut y0, mut x1, mut y1) = (w, h, 0, 0);
    for ((row, col), &set) in alpha.indexed_iter() {
        if set {
            x0 = x0.min(col);
            y0 = y0.min(row);
            x1 = x1.max(col + 1);
            y1 = y1.max(row + 1);
        }
    }
    if x1 == 0 {
        BoundingBox::empty()
    } else {
        BoundingBox::new(x0, y0, x1, y1)
    }
}
