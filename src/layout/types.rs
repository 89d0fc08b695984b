use std::collections::BTreeMap;

use serde::Serialize;

use crate::ir::PersonId;

pub type Point = (f32, f32);

/// Placed bounding box of one person card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRect {
    pub id: PersonId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub depth: i32,
}

impl NodeRect {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Top-centre attachment point, `offset` above the card edge.
    pub fn top_port(&self, offset: f32) -> Point {
        (self.center_x(), self.y - offset)
    }

    /// Bottom-centre attachment point, `offset` below the card edge.
    pub fn bottom_port(&self, offset: f32) -> Point {
        (self.center_x(), self.bottom() + offset)
    }

    pub fn overlaps_x(&self, other: &NodeRect) -> bool {
        self.x < other.right() && other.x < self.right()
    }
}

/// A union after placement: partners in visual left/right order plus the
/// bar geometry derived from their final positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedUnion {
    pub id: String,
    pub left: PersonId,
    pub right: PersonId,
    pub children: Vec<PersonId>,
    pub depth: i32,
    pub mid_x: f32,
    pub bar_y: f32,
    /// Bar lane on this row; 0 sits right under the stems.
    pub lane: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeLayout {
    pub focus: Option<PersonId>,
    pub nodes: BTreeMap<PersonId, NodeRect>,
    pub unions: Vec<PositionedUnion>,
    /// Row-top y per depth.
    pub rows: BTreeMap<i32, f32>,
    pub bounds: Bounds,
}

impl TreeLayout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn union(&self, id: &str) -> Option<&PositionedUnion> {
        self.unions.iter().find(|u| u.id == id)
    }

    pub fn row_top(&self, depth: i32) -> Option<f32> {
        self.rows.get(&depth).copied()
    }

    /// Cards of one row, left to right.
    pub fn row_rects(&self, depth: i32) -> Vec<&NodeRect> {
        let mut rects: Vec<&NodeRect> = self
            .nodes
            .values()
            .filter(|rect| rect.depth == depth)
            .collect();
        rects.sort_by(|a, b| a.x.total_cmp(&b.x));
        rects
    }
}
