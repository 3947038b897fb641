//! Core data types for the circle-grouping diagram.
//!
//! This module defines the fundamental records held by the entity store: items,
//! the circles that contain them, and the identifiers that link the two.

use crate::geometry::Disc;
use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for circles, both leaf and composite.
pub type CircleId = Uuid;

/// Unique identifier for items.
pub type ItemId = Uuid;

/// Presentation colour of an item. Has no influence on layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ItemColor {
    /// Green
    Green,
    /// Blue
    Blue,
    /// Red
    Red,
    /// Orange
    Orange,
    /// Purple
    Purple,
    /// Teal
    Teal,
    /// Pink
    Pink,
}

impl ItemColor {
    /// Colours handed out to new items, in order.
    pub const PALETTE: [ItemColor; 7] = [
        ItemColor::Green,
        ItemColor::Blue,
        ItemColor::Red,
        ItemColor::Orange,
        ItemColor::Purple,
        ItemColor::Teal,
        ItemColor::Pink,
    ];

    /// Picks the palette colour for the item created after `index` others.
    pub fn for_index(index: usize) -> Self {
        Self::PALETTE[index % Self::PALETTE.len()]
    }

    /// Lower-case colour name.
    pub fn name(self) -> &'static str {
        match self {
            ItemColor::Green => "green",
            ItemColor::Blue => "blue",
            ItemColor::Red => "red",
            ItemColor::Orange => "orange",
            ItemColor::Purple => "purple",
            ItemColor::Teal => "teal",
            ItemColor::Pink => "pink",
        }
    }
}

/// A single unit of content placed inside a leaf circle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Unique identifier for this item
    pub id: ItemId,
    /// Width and height in world units
    pub size: (f32, f32),
    /// Fill colour
    pub color: ItemColor,
    /// Circles the item belongs to; always the single leaf circle it was created in
    pub member_circles: Vec<CircleId>,
}

impl Item {
    /// Creates an item that lives in `circle`.
    pub fn new(circle: CircleId, size: (f32, f32), color: ItemColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            size,
            color,
            member_circles: vec![circle],
        }
    }

    /// Size as a vector, convenient for centring.
    pub fn size_vec(&self) -> Vec2 {
        Vec2::new(self.size.0, self.size.1)
    }
}

/// A leaf circle holding one item, or a composite circle owning other circles.
///
/// For composite circles `items` is the transitive union of all descendants'
/// items, and `radius` is always derived from `items.len()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Circle {
    /// Unique identifier for this circle
    pub id: CircleId,
    /// Centre in world space
    pub position: Pos2,
    /// Radius derived from the total item count
    pub radius: f32,
    /// Every item contained, directly or through descendants
    pub items: Vec<ItemId>,
    /// Direct children, present only for circles produced by a merge
    pub children: Option<Vec<CircleId>>,
    /// True only while held by a pointer
    pub is_dragging: bool,
    /// Creation order assigned by the store
    pub seq: u64,
}

impl Circle {
    /// Creates a leaf circle around a single item.
    pub fn leaf(id: CircleId, position: Pos2, item: ItemId, radius: f32, seq: u64) -> Self {
        Self {
            id,
            position,
            radius,
            items: vec![item],
            children: None,
            is_dragging: false,
            seq,
        }
    }

    /// Creates a composite circle owning `children`.
    pub fn composite(
        position: Pos2,
        children: Vec<CircleId>,
        items: Vec<ItemId>,
        radius: f32,
        seq: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            radius,
            items,
            children: Some(children),
            is_dragging: false,
            seq,
        }
    }

    /// True for circles produced by a merge.
    pub fn is_composite(&self) -> bool {
        self.children.is_some()
    }

    /// Direct children, empty for leaves.
    pub fn child_ids(&self) -> &[CircleId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// The circle's geometry.
    pub fn disc(&self) -> Disc {
        Disc::new(self.position, self.radius)
    }
}
