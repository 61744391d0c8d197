//! Viewport intersection for rendered images

use std::collections::HashSet;

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grow by `margin` on every side
    pub fn expand(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Overlap with non-zero area. Unrendered (zero-size) rects never intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// An image element as laid out on the page
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    /// `src` attribute as written (may be relative or a data URL)
    pub src: String,
    pub rect: Rect,
}

impl ImageElement {
    pub fn new(src: impl Into<String>, rect: Rect) -> Self {
        Self {
            src: src.into(),
            rect,
        }
    }
}

/// Layout snapshot: viewport plus every image element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSnapshot {
    pub viewport: Rect,
    pub images: Vec<ImageElement>,
}

/// Tracks which images are inside the viewport expanded by a root margin
#[derive(Debug)]
pub struct ImageObserver {
    root_margin: f64,
    visible: HashSet<String>,
}

impl ImageObserver {
    pub fn new(root_margin: f64) -> Self {
        Self {
            root_margin,
            visible: HashSet::new(),
        }
    }

    /// Re-evaluate intersections, returning the sources that became
    /// visible since the previous snapshot, in document order
    pub fn observe(&mut self, snapshot: &PageSnapshot) -> Vec<String> {
        let root = snapshot.viewport.expand(self.root_margin);
        let mut now_visible = HashSet::new();
        let mut entered = Vec::new();

        for image in &snapshot.images {
            if image.src.is_empty() || !image.rect.intersects(&root) {
                continue;
            }
            if now_visible.insert(image.src.clone()) && !self.visible.contains(&image.src) {
                entered.push(image.src.clone());
            }
        }

        self.visible = now_visible;
        entered
    }

    pub fn reset(&mut self) {
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 1080.0, 1920.0)
    }

    #[test]
    fn zero_size_never_intersects() {
        let hidden = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert!(!hidden.intersects(&viewport()));
    }

    #[test]
    fn margin_pre_triggers() {
        let mut observer = ImageObserver::new(200.0);
        let below_fold = ImageElement::new("/assets/mugs/a.jpg", Rect::new(0.0, 2000.0, 300.0, 300.0));
        let far_below = ImageElement::new("/assets/mugs/b.jpg", Rect::new(0.0, 2500.0, 300.0, 300.0));

        let entered = observer.observe(&PageSnapshot {
            viewport: viewport(),
            images: vec![below_fold, far_below],
        });
        assert_eq!(entered, vec!["/assets/mugs/a.jpg"]);
    }

    #[test]
    fn reports_only_transitions() {
        let mut observer = ImageObserver::new(0.0);
        let image = ImageElement::new("/a.jpg", Rect::new(0.0, 100.0, 100.0, 100.0));
        let snapshot = PageSnapshot {
            viewport: viewport(),
            images: vec![image],
        };

        assert_eq!(observer.observe(&snapshot).len(), 1);
        assert!(observer.observe(&snapshot).is_empty());

        // Scrolled away and back
        let away = PageSnapshot {
            viewport: Rect::new(0.0, 5000.0, 1080.0, 1920.0),
            ..snapshot.clone()
        };
        assert!(observer.observe(&away).is_empty());
        assert_eq!(observer.observe(&snapshot).len(), 1);
    }

    #[test]
    fn duplicate_sources_reported_once() {
        let mut observer = ImageObserver::new(0.0);
        let rect = Rect::new(0.0, 0.0, 50.0, 50.0);
        let entered = observer.observe(&PageSnapshot {
            viewport: viewport(),
            images: vec![ImageElement::new("/a.jpg", rect), ImageElement::new("/a.jpg", rect)],
        });
        assert_eq!(entered.len(), 1);
    }
}
