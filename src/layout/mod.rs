mod connectors;
mod packing;
mod routing;
pub(crate) mod types;
pub use connectors::*;
pub use types::*;
use packing::*;

use crate::config::LayoutConfig;
use crate::graph::{FamilyGraph, FamilyGroup};
use crate::ir::PersonId;
use crate::log::debug;
use std::collections::BTreeMap;

/// Bars whose ends come this close share a lane visually.
const BAR_TOUCH: f32 = 0.5;

/// Places every person with a depth on a generation row and derives the
/// union bars from the final positions. `focus` is the card to highlight; it
/// is dropped from the result when that person was not placed.
pub fn layout_graph(graph: &FamilyGraph, focus: &str, config: &LayoutConfig) -> TreeLayout {
    if graph.is_empty() {
        return TreeLayout::default();
    }
    if !graph.depth.contains_key(focus) {
        debug!(focus, "focus is not part of the graph");
    }

    let mut rows: BTreeMap<i32, Vec<PersonId>> = BTreeMap::new();
    for (id, depth) in &graph.depth {
        rows.entry(*depth).or_default().push(id.clone());
    }
    for members in rows.values_mut() {
        members.sort_by(|a, b| graph.order_key(a).cmp_name_asc(&graph.order_key(b)));
    }

    let mut row_clusters: BTreeMap<i32, Vec<Cluster>> = BTreeMap::new();
    let mut xs: BTreeMap<PersonId, f32> = BTreeMap::new();
    for (depth, members) in &rows {
        let clusters = cluster_row(graph, members, *depth);
        let lefts = pack_row(&clusters, config);
        assign_member_xs(&clusters, &lefts, &mut xs, config);
        row_clusters.insert(*depth, clusters);
    }

    // Second pass, top row first, so each row hangs under final parent x.
    for (depth, clusters) in row_clusters.iter().rev() {
        recenter_row(graph, *depth, clusters, &mut xs, config);
    }

    let mut nodes = BTreeMap::new();
    for (id, depth) in &graph.depth {
        let Some(&x) = xs.get(id) else {
            continue;
        };
        nodes.insert(
            id.clone(),
            NodeRect {
                id: id.clone(),
                x,
                y: row_top(*depth, config),
                width: config.card_width,
                height: config.card_height,
                depth: *depth,
            },
        );
    }
    let rows: BTreeMap<i32, f32> = rows
        .keys()
        .map(|depth| (*depth, row_top(*depth, config)))
        .collect();
    let unions = position_unions(graph, &nodes, config);

    let mut layout = TreeLayout {
        focus: graph
            .depth
            .contains_key(focus)
            .then(|| focus.to_string()),
        nodes,
        unions,
        rows,
        bounds: Bounds::default(),
    };
    normalize_layout(&mut layout, config);
    layout
}

fn row_top(depth: i32, config: &LayoutConfig) -> f32 {
    -(depth as f32) * config.row_height
}

fn assign_member_xs(
    clusters: &[Cluster],
    lefts: &[f32],
    xs: &mut BTreeMap<PersonId, f32>,
    config: &LayoutConfig,
) {
    for (cluster, &left) in clusters.iter().zip(lefts) {
        for (id, x) in cluster.member_lefts(left, config) {
            xs.insert(id, x);
        }
    }
}

/// Horizontal point that a group's children hang under: the midpoint of the
/// partners for a union, the parent's centre for a single parent.
fn group_anchor(
    group: FamilyGroup<'_>,
    xs: &BTreeMap<PersonId, f32>,
    config: &LayoutConfig,
) -> Option<f32> {
    let half = config.card_width / 2.0;
    match group {
        FamilyGroup::Couple(union) => {
            let a = xs.get(&union.partner_a)?;
            let b = xs.get(&union.partner_b)?;
            Some((a + b) / 2.0 + half)
        }
        FamilyGroup::SingleParent(single) => xs.get(&single.parent).map(|x| x + half),
    }
}

/// Moves each sibling block (children plus their clustered partners) under
/// its parents, then sweeps the row so nothing overlaps.
fn recenter_row(
    graph: &FamilyGraph,
    depth: i32,
    clusters: &[Cluster],
    xs: &mut BTreeMap<PersonId, f32>,
    config: &LayoutConfig,
) {
    let mut cluster_of: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, cluster) in clusters.iter().enumerate() {
        for member in &cluster.members {
            cluster_of.insert(member.as_str(), idx);
        }
    }

    let mut anchored: Vec<(f32, FamilyGroup<'_>)> = graph
        .groups()
        .filter(|group| group.depth() == depth + 1)
        .filter_map(|group| group_anchor(group, xs, config).map(|x| (x, group)))
        .collect();
    anchored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.key().cmp(b.1.key())));

    let mut claimed = vec![false; clusters.len()];
    let mut items = Vec::new();
    for (anchor, group) in anchored {
        let mut block = Vec::new();
        for child in group.children() {
            if graph.depth.get(child) != Some(&depth) {
                continue;
            }
            if let Some(&idx) = cluster_of.get(child.as_str())
                && !claimed[idx]
            {
                claimed[idx] = true;
                block.push(idx);
            }
        }
        if !block.is_empty() {
            items.push(RowItem::centered(block, anchor, clusters, config));
        }
    }
    if items.is_empty() {
        return;
    }

    for (idx, cluster) in clusters.iter().enumerate() {
        if claimed[idx] {
            continue;
        }
        let left = cluster
            .members
            .first()
            .and_then(|id| xs.get(id))
            .copied()
            .unwrap_or(config.canvas_center_x);
        items.push(RowItem::at(idx, left, clusters, config));
    }

    let lefts = sweep_row(items, clusters, config);
    assign_member_xs(clusters, &lefts, xs, config);
}

fn position_unions(
    graph: &FamilyGraph,
    nodes: &BTreeMap<PersonId, NodeRect>,
    config: &LayoutConfig,
) -> Vec<PositionedUnion> {
    let mut unions = Vec::new();
    for union in &graph.unions {
        let (Some(a), Some(b)) = (nodes.get(&union.partner_a), nodes.get(&union.partner_b)) else {
            debug!(union = union.id.as_str(), "partner not placed; union skipped");
            continue;
        };
        let (left, right) = if (a.x, &a.id) <= (b.x, &b.id) { (a, b) } else { (b, a) };
        unions.push(PositionedUnion {
            id: union.id.clone(),
            left: left.id.clone(),
            right: right.id.clone(),
            children: union.children.clone(),
            depth: union.depth,
            mid_x: (left.center_x() + right.center_x()) / 2.0,
            bar_y: left.bottom().max(right.bottom()) + config.port_offset + config.stem_length,
            lane: 0,
        });
    }
    assign_bar_lanes(&mut unions, nodes, config);
    unions
}

/// Drops a bar to a lower lane while it would touch or overlap another bar of
/// the same row. Narrow bars take the upper lanes.
fn assign_bar_lanes(
    unions: &mut [PositionedUnion],
    nodes: &BTreeMap<PersonId, NodeRect>,
    config: &LayoutConfig,
) {
    let span = |union: &PositionedUnion| -> (f32, f32) {
        let left = nodes.get(&union.left).map_or(union.mid_x, NodeRect::center_x);
        let right = nodes.get(&union.right).map_or(union.mid_x, NodeRect::center_x);
        (left, right)
    };

    let mut order: Vec<usize> = (0..unions.len()).collect();
    order.sort_by(|&a, &b| {
        let (al, ar) = span(&unions[a]);
        let (bl, br) = span(&unions[b]);
        unions[a]
            .depth
            .cmp(&unions[b].depth)
            .then_with(|| (ar - al).total_cmp(&(br - bl)))
            .then_with(|| unions[a].id.cmp(&unions[b].id))
    });

    let mut taken: Vec<(i32, usize, f32, f32)> = Vec::new();
    for idx in order {
        let depth = unions[idx].depth;
        let (left, right) = span(&unions[idx]);
        let mut lane = 0;
        while taken.iter().any(|&(d, l, x0, x1)| {
            d == depth && l == lane && x0 <= right + BAR_TOUCH && left <= x1 + BAR_TOUCH
        }) {
            lane += 1;
        }
        taken.push((depth, lane, left, right));
        let union = &mut unions[idx];
        union.lane = lane;
        union.bar_y += lane as f32 * config.bar_lane_gap;
    }
}

/// Shifts everything so the top-left card sits `margin` from the origin and
/// records the bounding box.
fn normalize_layout(layout: &mut TreeLayout, config: &LayoutConfig) {
    if layout.nodes.is_empty() {
        layout.bounds = Bounds::default();
        return;
    }
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    for rect in layout.nodes.values() {
        min_x = min_x.min(rect.x);
        min_y = min_y.min(rect.y);
    }
    let shift_x = config.margin - min_x;
    let shift_y = config.margin - min_y;

    let mut max_x: f32 = 0.0;
    let mut max_y: f32 = 0.0;
    for rect in layout.nodes.values_mut() {
        rect.x += shift_x;
        rect.y += shift_y;
        max_x = max_x.max(rect.right());
        max_y = max_y.max(rect.bottom());
    }
    for top in layout.rows.values_mut() {
        *top += shift_y;
    }
    for union in &mut layout.unions {
        union.mid_x += shift_x;
        union.bar_y += shift_y;
        max_y = max_y.max(union.bar_y);
    }
    layout.bounds = Bounds {
        width: max_x + config.margin,
        height: max_y + config.margin,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::ir::{Person, RelationshipEdge};

    fn family() -> (Vec<Person>, Vec<RelationshipEdge>) {
        let people = vec![
            Person::new("gp1", "George", "Old").born("1920"),
            Person::new("gp2", "Grace", "Old").born("1922"),
            Person::new("p1", "Paul", "Old").born("1950"),
            Person::new("p2", "Petra", "New").born("1952"),
            Person::new("u", "Uma", "Old").born("1948"),
            Person::new("f", "Finn", "Old").born("1980"),
            Person::new("s", "Sara", "Old").born("1983"),
        ];
        let edges = vec![
            RelationshipEdge::spouse("gp1", "gp2"),
            RelationshipEdge::parent("gp1", "p1"),
            RelationshipEdge::parent("gp2", "p1"),
            RelationshipEdge::parent("gp1", "u"),
            RelationshipEdge::parent("gp2", "u"),
            RelationshipEdge::spouse("p1", "p2"),
            RelationshipEdge::parent("p1", "f"),
            RelationshipEdge::parent("p2", "f"),
            RelationshipEdge::parent("p1", "s"),
            RelationshipEdge::parent("p2", "s"),
        ];
        (people, edges)
    }

    #[test]
    fn rows_run_from_ancestors_down() {
        let (people, edges) = family();
        let graph = build_graph(&people, &edges, "f");
        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, "f", &config);
        assert_eq!(layout.nodes.len(), 7);
        assert!(layout.nodes["gp1"].y < layout.nodes["p1"].y);
        assert!(layout.nodes["p1"].y < layout.nodes["f"].y);
        assert_eq!(layout.nodes["f"].y - layout.nodes["p1"].y, config.row_height);
        assert_eq!(layout.row_top(0), Some(layout.nodes["f"].y));
    }

    #[test]
    fn spouses_are_adjacent_and_children_centred_under_union() {
        let (people, edges) = family();
        let graph = build_graph(&people, &edges, "f");
        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, "f", &config);
        let p1 = &layout.nodes["p1"];
        let p2 = &layout.nodes["p2"];
        assert_eq!((p2.x - p1.right()).abs(), config.spouse_gap);

        let union = layout.union("u:p1:p2").expect("positioned union");
        let f = &layout.nodes["f"];
        let s = &layout.nodes["s"];
        let children_mid = (f.x + s.right()) / 2.0;
        assert!((children_mid - union.mid_x).abs() < 1e-3);
    }

    #[test]
    fn layout_starts_at_margin() {
        let (people, edges) = family();
        let graph = build_graph(&people, &edges, "f");
        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, "f", &config);
        let min_x = layout.nodes.values().map(|r| r.x).fold(f32::MAX, f32::min);
        let min_y = layout.nodes.values().map(|r| r.y).fold(f32::MAX, f32::min);
        assert!((min_x - config.margin).abs() < 1e-3);
        assert!((min_y - config.margin).abs() < 1e-3);
        let max_x = layout.nodes.values().map(|r| r.right()).fold(0.0, f32::max);
        assert!((layout.bounds.width - (max_x + config.margin)).abs() < 1e-3);
    }

    #[test]
    fn empty_graph_has_zero_bounds() {
        let graph = build_graph(&[], &[], "nobody");
        let layout = layout_graph(&graph, "nobody", &LayoutConfig::default());
        assert!(layout.is_empty());
        assert_eq!(layout.bounds, Bounds::default());
    }

    #[test]
    fn single_parent_children_hang_under_parent() {
        let people = vec![
            Person::new("m", "Mia", "X").born("1960"),
            Person::new("a", "Ana", "X").born("1990"),
            Person::new("b", "Ben", "X").born("1992"),
        ];
        let edges = vec![
            RelationshipEdge::parent("m", "a"),
            RelationshipEdge::parent("m", "b"),
        ];
        let graph = build_graph(&people, &edges, "m");
        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, "m", &config);
        let m = &layout.nodes["m"];
        let mid = (layout.nodes["a"].x + layout.nodes["b"].right()) / 2.0;
        assert!((mid - m.center_x()).abs() < 1e-3);
    }

    #[test]
    fn overlapping_couple_bars_take_separate_lanes() {
        let people = vec![
            Person::new("p1", "Paul", "X").born("1950"),
            Person::new("p2", "Pia", "X").born("1952"),
            Person::new("s1", "Sara", "X").born("1955"),
            Person::new("s2", "Stig", "X").born("1956"),
        ];
        let edges = vec![
            RelationshipEdge::divorced("p1", "p2"),
            RelationshipEdge::spouse("p1", "s1"),
            RelationshipEdge::spouse("p2", "s2"),
        ];
        let graph = build_graph(&people, &edges, "p1");
        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, "p1", &config);

        let divorced = layout.union("u:p1:p2").expect("divorced union");
        let first = layout.union("u:p1:s1").expect("first marriage");
        let second = layout.union("u:p2:s2").expect("second marriage");
        assert_eq!(first.lane, 0);
        assert_eq!(second.lane, 0);
        assert_eq!(divorced.lane, 1);
        assert_eq!(first.bar_y, second.bar_y);
        assert!((divorced.bar_y - first.bar_y - config.bar_lane_gap).abs() < 1e-3);
    }

    #[test]
    fn layout_focus_follows_argument() {
        let (people, edges) = family();
        let graph = build_graph(&people, &edges, "f");
        let config = LayoutConfig::default();
        assert_eq!(
            layout_graph(&graph, "p1", &config).focus.as_deref(),
            Some("p1")
        );
        assert_eq!(layout_graph(&graph, "ghost", &config).focus, None);
    }
}
