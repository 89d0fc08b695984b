use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::graph::{FamilyGraph, FamilyGroup};
use crate::ir::PersonId;

use super::routing::{compress_path, rounded_path_data};
use super::{Point, TreeLayout};

// ── Rail lanes ──────────────────────────────────────────────────────
/// Rails closer than this at one depth count as sharing a lane.
const LANE_EPSILON: f32 = 0.5;
/// Maximum extra `rail_jitter` steps applied to clear a shared lane.
const MAX_LANE_NUDGES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    Married,
    Divorced,
    Unmarried,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorPath {
    pub points: Vec<Point>,
    /// SVG path data with rounded corners.
    pub d: String,
}

impl ConnectorPath {
    fn new(points: &[Point], radius: f32) -> Self {
        let points = compress_path(points);
        let d = rounded_path_data(&points, radius);
        Self { points, d }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildDrop {
    pub child: PersonId,
    pub port: Point,
    /// From the trunk foot along the rail, then down to the child's top port.
    pub path: ConnectorPath,
}

/// Shared horizontal line above one child row, with the trunk that feeds it
/// and one drop per child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rail {
    pub depth: i32,
    pub y: f32,
    pub x_min: f32,
    pub x_max: f32,
    pub trunk: ConnectorPath,
    pub line: ConnectorPath,
    pub drops: Vec<ChildDrop>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectorKind {
    Couple {
        left: PersonId,
        right: PersonId,
        left_port: Point,
        right_port: Point,
        marker: MarkerStyle,
        marker_at: Point,
        stems: [ConnectorPath; 2],
        bar: ConnectorPath,
    },
    SingleParent {
        parent: PersonId,
        port: Point,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorGeometry {
    pub key: String,
    #[serde(flatten)]
    pub kind: ConnectorKind,
    pub rails: Vec<Rail>,
}

impl ConnectorGeometry {
    pub fn marker(&self) -> Option<MarkerStyle> {
        match &self.kind {
            ConnectorKind::Couple { marker, .. } => Some(*marker),
            ConnectorKind::SingleParent { .. } => None,
        }
    }
}

/// Marker for a couple, looked up in the graph's relationship sets.
pub fn marker_for(graph: &FamilyGraph, a: &str, b: &str) -> MarkerStyle {
    if graph.are_divorced(a, b) {
        MarkerStyle::Divorced
    } else if graph.are_unmarried(a, b) {
        MarkerStyle::Unmarried
    } else {
        MarkerStyle::Married
    }
}

/// 32-bit FNV-1a; stable across platforms and releases.
fn stable_hash(key: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in key.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Per-group vertical rail offset: one to three jitter units, sign from the
/// low hash bit.
pub(super) fn rail_offset(key: &str, jitter: f32) -> f32 {
    let hash = stable_hash(key);
    let magnitude = (hash % 3 + 1) as f32 * jitter;
    if hash & 1 == 0 { magnitude } else { -magnitude }
}

struct RailDraft {
    depth: i32,
    y: f32,
    x_min: f32,
    x_max: f32,
    children: Vec<(PersonId, Point)>,
}

struct Draft {
    key: String,
    kind: ConnectorKind,
    origin: Point,
    rails: Vec<RailDraft>,
}

pub fn compute_connectors(
    graph: &FamilyGraph,
    layout: &TreeLayout,
    config: &LayoutConfig,
) -> Vec<ConnectorGeometry> {
    let mut drafts: Vec<Draft> = graph
        .groups()
        .filter_map(|group| draft_group(group, graph, layout, config))
        .collect();
    separate_rail_lanes(&mut drafts, config);
    drafts
        .into_iter()
        .map(|draft| finish_draft(draft, config))
        .collect()
}

fn draft_group(
    group: FamilyGroup<'_>,
    graph: &FamilyGraph,
    layout: &TreeLayout,
    config: &LayoutConfig,
) -> Option<Draft> {
    let radius = config.corner_radius;
    let (kind, origin) = match group {
        FamilyGroup::Couple(union) => {
            let placed = layout.union(&union.id)?;
            let left = layout.nodes.get(&placed.left)?;
            let right = layout.nodes.get(&placed.right)?;
            let left_port = left.bottom_port(config.port_offset);
            let right_port = right.bottom_port(config.port_offset);
            let bar_y = placed.bar_y;
            let kind = ConnectorKind::Couple {
                left: placed.left.clone(),
                right: placed.right.clone(),
                left_port,
                right_port,
                marker: marker_for(graph, &union.partner_a, &union.partner_b),
                marker_at: (placed.mid_x, bar_y),
                stems: [
                    ConnectorPath::new(&[left_port, (left_port.0, bar_y)], radius),
                    ConnectorPath::new(&[right_port, (right_port.0, bar_y)], radius),
                ],
                bar: ConnectorPath::new(&[(left_port.0, bar_y), (right_port.0, bar_y)], radius),
            };
            (kind, (placed.mid_x, bar_y))
        }
        FamilyGroup::SingleParent(single) => {
            let parent = layout.nodes.get(&single.parent)?;
            let port = parent.bottom_port(config.port_offset);
            let kind = ConnectorKind::SingleParent {
                parent: single.parent.clone(),
                port,
            };
            (kind, port)
        }
    };

    let mut by_depth: BTreeMap<i32, Vec<(PersonId, Point)>> = BTreeMap::new();
    for child in group.children() {
        if let Some(rect) = layout.nodes.get(child) {
            by_depth
                .entry(rect.depth)
                .or_default()
                .push((child.clone(), rect.top_port(config.port_offset)));
        }
    }
    if by_depth.is_empty() && matches!(kind, ConnectorKind::SingleParent { .. }) {
        return None;
    }

    let offset = rail_offset(group.key(), config.rail_jitter);
    let rails = by_depth
        .into_iter()
        .rev()
        .map(|(depth, children)| {
            let port_y = children
                .iter()
                .map(|(_, port)| port.1)
                .fold(f32::INFINITY, f32::min);
            let x_min = children
                .iter()
                .map(|(_, port)| port.0)
                .fold(origin.0, f32::min);
            let x_max = children
                .iter()
                .map(|(_, port)| port.0)
                .fold(origin.0, f32::max);
            RailDraft {
                depth,
                y: port_y - config.rail_clearance + offset,
                x_min,
                x_max,
                children,
            }
        })
        .collect();

    Some(Draft {
        key: group.key().to_string(),
        kind,
        origin,
        rails,
    })
}

/// Nudges any rail that still shares a lane with an x-overlapping rail of
/// the same depth after the hash offset.
fn separate_rail_lanes(drafts: &mut [Draft], config: &LayoutConfig) {
    let mut order: Vec<(usize, usize)> = drafts
        .iter()
        .enumerate()
        .flat_map(|(di, draft)| (0..draft.rails.len()).map(move |ri| (di, ri)))
        .collect();
    order.sort_by(|a, b| {
        let ra = &drafts[a.0].rails[a.1];
        let rb = &drafts[b.0].rails[b.1];
        ra.depth
            .cmp(&rb.depth)
            .then_with(|| ra.x_min.total_cmp(&rb.x_min))
            .then_with(|| drafts[a.0].key.cmp(&drafts[b.0].key))
    });

    let step = config.rail_jitter.max(1.0);
    let mut settled: Vec<(i32, f32, f32, f32)> = Vec::new();
    for (di, ri) in order {
        let rail = &mut drafts[di].rails[ri];
        for _ in 0..MAX_LANE_NUDGES {
            let clash = settled.iter().any(|&(depth, y, x_min, x_max)| {
                depth == rail.depth
                    && (y - rail.y).abs() < LANE_EPSILON
                    && x_min <= rail.x_max
                    && rail.x_min <= x_max
            });
            if !clash {
                break;
            }
            rail.y += step;
        }
        settled.push((rail.depth, rail.y, rail.x_min, rail.x_max));
    }
}

fn finish_draft(draft: Draft, config: &LayoutConfig) -> ConnectorGeometry {
    let radius = config.corner_radius;
    let origin = draft.origin;
    let rails = draft
        .rails
        .into_iter()
        .map(|rail| {
            let y = rail.y;
            let drops = rail
                .children
                .into_iter()
                .map(|(child, port)| ChildDrop {
                    path: ConnectorPath::new(&[(origin.0, y), (port.0, y), port], radius),
                    child,
                    port,
                })
                .collect();
            Rail {
                depth: rail.depth,
                y,
                x_min: rail.x_min,
                x_max: rail.x_max,
                trunk: ConnectorPath::new(&[origin, (origin.0, y)], radius),
                line: ConnectorPath::new(&[(rail.x_min, y), (rail.x_max, y)], radius),
                drops,
            }
        })
        .collect();
    ConnectorGeometry {
        key: draft.key,
        kind: draft.kind,
        rails,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::ir::{Person, RelationshipEdge};
    use crate::layout::layout_graph;

    #[test]
    fn rail_offset_is_stable_and_bounded() {
        let a = rail_offset("u:p1:p2", 3.0);
        assert_eq!(a, rail_offset("u:p1:p2", 3.0));
        assert!(a.abs() >= 3.0 && a.abs() <= 9.0);
        assert_eq!(rail_offset("anything", 0.0), 0.0);
    }

    #[test]
    fn fnv_matches_reference_vectors() {
        assert_eq!(stable_hash(""), 0x811c_9dc5);
        assert_eq!(stable_hash("a"), 0xe40c_292c);
    }

    #[test]
    fn childless_couple_gets_bar_without_rails() {
        let people = vec![
            Person::new("a", "Al", "X").born("1950"),
            Person::new("b", "Bea", "X").born("1951"),
        ];
        let graph = build_graph(&people, &[RelationshipEdge::unmarried("a", "b")], "a");
        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, "a", &config);
        let connectors = compute_connectors(&graph, &layout, &config);
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].marker(), Some(MarkerStyle::Unmarried));
        assert!(connectors[0].rails.is_empty());
    }

    #[test]
    fn drops_are_orthogonal_and_end_at_top_ports() {
        let people = vec![
            Person::new("a", "Al", "X").born("1950"),
            Person::new("b", "Bea", "X").born("1951"),
            Person::new("c", "Cy", "X").born("1980"),
            Person::new("d", "Di", "X").born("1982"),
            Person::new("e", "Ed", "X").born("1984"),
        ];
        let mut edges = vec![RelationshipEdge::spouse("a", "b")];
        for child in ["c", "d", "e"] {
            edges.push(RelationshipEdge::parent("a", child));
            edges.push(RelationshipEdge::parent("b", child));
        }
        let graph = build_graph(&people, &edges, "c");
        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, "c", &config);
        let connectors = compute_connectors(&graph, &layout, &config);
        assert_eq!(connectors.len(), 1);
        let rail = &connectors[0].rails[0];
        assert_eq!(rail.drops.len(), 3);
        for drop in &rail.drops {
            let rect = &layout.nodes[&drop.child];
            assert_eq!(drop.port, rect.top_port(config.port_offset));
            assert_eq!(drop.path.points.last(), Some(&drop.port));
            for segment in drop.path.points.windows(2) {
                let horizontal = (segment[0].1 - segment[1].1).abs() < 1e-4;
                let vertical = (segment[0].0 - segment[1].0).abs() < 1e-4;
                assert!(horizontal || vertical);
            }
        }
        assert!(rail.y < layout.nodes["c"].y);
    }

    #[test]
    fn union_children_on_two_rows_get_one_rail_each() {
        // d is recorded as a's partner as well as a's child, which puts d on
        // a's row while the sibling c sits one row down.
        let people = vec![
            Person::new("a", "Al", "X").born("1950"),
            Person::new("b", "Bea", "X").born("1951"),
            Person::new("c", "Cy", "X").born("1980"),
            Person::new("d", "Di", "X").born("1982"),
        ];
        let edges = vec![
            RelationshipEdge::spouse("a", "b"),
            RelationshipEdge::unmarried("a", "d"),
            RelationshipEdge::parent("a", "c"),
            RelationshipEdge::parent("b", "c"),
            RelationshipEdge::parent("a", "d"),
            RelationshipEdge::parent("b", "d"),
        ];
        let graph = build_graph(&people, &edges, "a");
        assert_eq!(graph.depth["c"], -1);
        assert_eq!(graph.depth["d"], 0);

        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, "a", &config);
        let connectors = compute_connectors(&graph, &layout, &config);
        let parents = connectors
            .iter()
            .find(|c| c.key == "u:a:b")
            .expect("parents connector");
        let depths: Vec<i32> = parents.rails.iter().map(|rail| rail.depth).collect();
        assert_eq!(depths, vec![0, -1]);
        for rail in &parents.rails {
            assert_eq!(rail.drops.len(), 1);
            let child = &rail.drops[0].child;
            assert_eq!(layout.nodes[child].depth, rail.depth);
        }
    }

    fn lone_draft(key: &str, depth: i32, y: f32, x_min: f32, x_max: f32) -> Draft {
        Draft {
            key: key.to_string(),
            kind: ConnectorKind::SingleParent {
                parent: key.to_string(),
                port: (x_min, y - 40.0),
            },
            origin: (x_min, y - 40.0),
            rails: vec![RailDraft {
                depth,
                y,
                x_min,
                x_max,
                children: Vec::new(),
            }],
        }
    }

    #[test]
    fn shared_lane_is_nudged_apart() {
        let config = LayoutConfig::default();
        let mut drafts = vec![
            lone_draft("s:a", -1, 100.0, 0.0, 100.0),
            lone_draft("s:b", -1, 100.0, 50.0, 150.0),
            lone_draft("s:c", -1, 100.0, 500.0, 600.0),
            lone_draft("s:d", -2, 100.0, 0.0, 100.0),
        ];
        separate_rail_lanes(&mut drafts, &config);
        let ys: Vec<f32> = drafts.iter().map(|d| d.rails[0].y).collect();
        assert_eq!(ys[0], 100.0);
        assert_eq!(ys[1], 100.0 + config.rail_jitter);
        // Disjoint in x, or on another row: left alone.
        assert_eq!(ys[2], 100.0);
        assert_eq!(ys[3], 100.0);
    }
}
