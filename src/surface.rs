//! Display primitives and the surfaces slides render into.
//!
//! A surface only collects `DisplayItem`s; how they reach the screen is up to
//! whoever owns the surface (the egui viewer paints a [`Scene`] every frame).

use crate::properties::{Color, Point, Size};
use log::trace;
use std::path::PathBuf;

/// Border line style of a rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PenStyle {
    NoPen,
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
}

impl PenStyle {
    /// Maps a stored `borderStyle` code. Unknown codes mean no border.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PenStyle::Solid,
            2 => PenStyle::Dash,
            3 => PenStyle::Dot,
            4 => PenStyle::DashDot,
            5 => PenStyle::DashDotDot,
            _ => PenStyle::NoPen,
        }
    }
}

/// Fill pattern of a rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushStyle {
    NoBrush,
    Solid,
    /// Graduated density, 1 (densest) to 7 (sparsest).
    Dense(u8),
    Horizontal,
    Vertical,
    Cross,
    BackwardDiagonal,
    ForwardDiagonal,
    DiagonalCross,
}

impl BrushStyle {
    /// Maps a stored `bgStyle` code. Unknown codes mean no fill.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => BrushStyle::Solid,
            2..=8 => BrushStyle::Dense((code - 1) as u8),
            9 => BrushStyle::Horizontal,
            10 => BrushStyle::Vertical,
            11 => BrushStyle::Cross,
            12 => BrushStyle::BackwardDiagonal,
            13 => BrushStyle::ForwardDiagonal,
            14 => BrushStyle::DiagonalCross,
            _ => BrushStyle::NoBrush,
        }
    }
}

/// Something a surface can display.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayItem {
    /// Fills the whole surface.
    Background(Color),
    Rect {
        position: Point,
        size: Size,
        fill: Color,
        brush: BrushStyle,
        border: Color,
        pen: PenStyle,
        border_width: i64,
    },
    Image {
        position: Point,
        size: Size,
        src: PathBuf,
        keep_ratio: bool,
    },
    /// A video area. `live` is false for editing previews without a player.
    Video {
        position: Point,
        size: Size,
        src: PathBuf,
        live: bool,
    },
}

/// Identifies an item within the surface that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

pub trait RenderSurface {
    /// Adds `item` on top of everything already present.
    fn add_item(&mut self, item: DisplayItem) -> ItemId;
    fn has_content(&self) -> bool;
    fn clear(&mut self);
}

/// In-memory surface keeping items in paint order.
#[derive(Debug, Default)]
pub struct Scene {
    size: Size,
    items: Vec<(ItemId, DisplayItem)>,
    next_id: u64,
}

impl Scene {
    pub fn new(size: Size) -> Self {
        Self { size, items: Vec::new(), next_id: 0 }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn items(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items.iter().map(|(_, item)| item)
    }

    pub fn item(&self, id: ItemId) -> Option<&DisplayItem> {
        self.items.iter().find(|(item_id, _)| *item_id == id).map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl RenderSurface for Scene {
    fn add_item(&mut self, item: DisplayItem) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        trace!("Scene: adding item {:?}: {:?}", id, item);
        self.items.push((id, item));
        id
    }

    fn has_content(&self) -> bool {
        !self.items.is_empty()
    }

    fn clear(&mut self) {
        trace!("Scene: clearing {} item(s)", self.items.len());
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pen_mapping_is_total() {
        assert_eq!(PenStyle::from_code(0), PenStyle::NoPen);
        assert_eq!(PenStyle::from_code(1), PenStyle::Solid);
        assert_eq!(PenStyle::from_code(3), PenStyle::Dot);
        assert_eq!(PenStyle::from_code(5), PenStyle::DashDotDot);
        for code in [-1, 6, 99, i64::MIN, i64::MAX] {
            assert_eq!(PenStyle::from_code(code), PenStyle::NoPen, "code {}", code);
        }
    }

    #[test]
    fn brush_mapping_is_total() {
        assert_eq!(BrushStyle::from_code(0), BrushStyle::NoBrush);
        assert_eq!(BrushStyle::from_code(1), BrushStyle::Solid);
        assert_eq!(BrushStyle::from_code(2), BrushStyle::Dense(1));
        assert_eq!(BrushStyle::from_code(8), BrushStyle::Dense(7));
        assert_eq!(BrushStyle::from_code(9), BrushStyle::Horizontal);
        assert_eq!(BrushStyle::from_code(14), BrushStyle::DiagonalCross);
        for code in [-1, 15, 1000, i64::MIN, i64::MAX] {
            assert_eq!(BrushStyle::from_code(code), BrushStyle::NoBrush, "code {}", code);
        }
    }

    #[test]
    fn scene_tracks_content() {
        let mut scene = Scene::new(Size::new(640, 480));
        assert!(!scene.has_content());
        let first = scene.add_item(DisplayItem::Background(Color::WHITE));
        let second = scene.add_item(DisplayItem::Background(Color::BLACK));
        assert_ne!(first, second);
        assert!(scene.has_content());
        assert_eq!(scene.item(second), Some(&DisplayItem::Background(Color::BLACK)));

        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.size(), Size::new(640, 480));
    }
}
