use std::collections::{BTreeMap, BTreeSet};

use crate::config::LayoutConfig;
use crate::graph::FamilyGraph;
use crate::ir::PersonId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ClusterKind {
    Single,
    Spouses,
    Divorced,
}

/// One or two cards that always travel together within a row.
#[derive(Debug, Clone)]
pub(super) struct Cluster {
    pub(super) kind: ClusterKind,
    pub(super) members: Vec<PersonId>,
}

impl Cluster {
    pub(super) fn inner_gap(&self, config: &LayoutConfig) -> f32 {
        match self.kind {
            ClusterKind::Single => 0.0,
            ClusterKind::Spouses => config.spouse_gap,
            ClusterKind::Divorced => config.divorced_gap,
        }
    }

    pub(super) fn width(&self, config: &LayoutConfig) -> f32 {
        let count = self.members.len();
        count as f32 * config.card_width + count.saturating_sub(1) as f32 * self.inner_gap(config)
    }

    /// Left x of every member when the cluster starts at `left`.
    pub(super) fn member_lefts(&self, left: f32, config: &LayoutConfig) -> Vec<(PersonId, f32)> {
        let step = config.card_width + self.inner_gap(config);
        self.members
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), left + idx as f32 * step))
            .collect()
    }
}

/// Groups a row (already in birth order) into spouse pairs, divorced pairs
/// and singletons.
pub(super) fn cluster_row(graph: &FamilyGraph, row: &[PersonId], depth: i32) -> Vec<Cluster> {
    let mut taken: BTreeSet<PersonId> = BTreeSet::new();
    let mut clusters = Vec::new();
    for id in row {
        if taken.contains(id) {
            continue;
        }
        taken.insert(id.clone());
        if let Some(spouse) = pick_partner(graph, &graph.spouses, id, depth, &taken) {
            taken.insert(spouse.clone());
            let mut members = vec![id.clone(), spouse];
            members.sort_by(|a, b| graph.order_key(a).cmp_name_asc(&graph.order_key(b)));
            clusters.push(Cluster {
                kind: ClusterKind::Spouses,
                members,
            });
        } else if let Some(former) = pick_partner(graph, &graph.divorced, id, depth, &taken) {
            taken.insert(former.clone());
            let mut members = vec![id.clone(), former];
            members.sort_by(|a, b| graph.order_key(a).cmp_name_desc(&graph.order_key(b)));
            clusters.push(Cluster {
                kind: ClusterKind::Divorced,
                members,
            });
        } else {
            clusters.push(Cluster {
                kind: ClusterKind::Single,
                members: vec![id.clone()],
            });
        }
    }
    clusters
}

fn pick_partner(
    graph: &FamilyGraph,
    partners: &BTreeMap<PersonId, BTreeSet<PersonId>>,
    id: &str,
    depth: i32,
    taken: &BTreeSet<PersonId>,
) -> Option<PersonId> {
    partners
        .get(id)?
        .iter()
        .filter(|p| graph.depth.get(*p) == Some(&depth) && !taken.contains(*p))
        .min_by(|a, b| graph.order_key(a).cmp_name_asc(&graph.order_key(b)))
        .cloned()
}

fn span_width(clusters: &[Cluster], indices: &[usize], config: &LayoutConfig) -> f32 {
    let cards: f32 = indices.iter().map(|&idx| clusters[idx].width(config)).sum();
    cards + indices.len().saturating_sub(1) as f32 * config.cluster_gap
}

/// First pass: clusters left to right, the row centred on the canvas centre.
pub(super) fn pack_row(clusters: &[Cluster], config: &LayoutConfig) -> Vec<f32> {
    let all: Vec<usize> = (0..clusters.len()).collect();
    let total = span_width(clusters, &all, config);
    let mut cursor = config.canvas_center_x - total / 2.0;
    let mut lefts = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        lefts.push(cursor);
        cursor += cluster.width(config) + config.cluster_gap;
    }
    lefts
}

/// A run of clusters that wants to start at `desired_left`: either a sibling
/// block hanging under its parents or a single free cluster.
#[derive(Debug, Clone)]
pub(super) struct RowItem {
    pub(super) clusters: Vec<usize>,
    pub(super) desired_left: f32,
    pub(super) width: f32,
}

impl RowItem {
    pub(super) fn centered(
        clusters: Vec<usize>,
        center: f32,
        all: &[Cluster],
        config: &LayoutConfig,
    ) -> Self {
        let width = span_width(all, &clusters, config);
        Self {
            clusters,
            desired_left: center - width / 2.0,
            width,
        }
    }

    pub(super) fn at(cluster: usize, left: f32, all: &[Cluster], config: &LayoutConfig) -> Self {
        Self {
            clusters: vec![cluster],
            desired_left: left,
            width: all[cluster].width(config),
        }
    }

    fn desired_center(&self) -> f32 {
        self.desired_left + self.width / 2.0
    }
}

/// Places items in order of their desired centres, pushing each one right
/// just enough to keep `cluster_gap` from its left neighbour.
pub(super) fn sweep_row(
    mut items: Vec<RowItem>,
    clusters: &[Cluster],
    config: &LayoutConfig,
) -> Vec<f32> {
    items.sort_by(|a, b| {
        a.desired_center()
            .total_cmp(&b.desired_center())
            .then_with(|| a.clusters.first().cmp(&b.clusters.first()))
    });
    let mut lefts = vec![0.0; clusters.len()];
    let mut cursor = f32::NEG_INFINITY;
    for item in &items {
        let start = item.desired_left.max(cursor);
        let mut left = start;
        for &idx in &item.clusters {
            lefts[idx] = left;
            left += clusters[idx].width(config) + config.cluster_gap;
        }
        cursor = start + item.width + config.cluster_gap;
    }
    lefts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::ir::{Person, RelationshipEdge};

    fn row_of(graph: &FamilyGraph, depth: i32) -> Vec<PersonId> {
        let mut row: Vec<PersonId> = graph
            .depth
            .iter()
            .filter(|(_, d)| **d == depth)
            .map(|(id, _)| id.clone())
            .collect();
        row.sort_by(|a, b| graph.order_key(a).cmp_name_asc(&graph.order_key(b)));
        row
    }

    #[test]
    fn prefers_spouse_over_divorced_partner() {
        let people = vec![
            Person::new("a", "Al", "X").born("1950"),
            Person::new("b", "Bea", "X").born("1952"),
            Person::new("c", "Cy", "X").born("1951"),
        ];
        let edges = vec![
            RelationshipEdge::divorced("a", "b"),
            RelationshipEdge::spouse("a", "c"),
        ];
        let graph = build_graph(&people, &edges, "a");
        let clusters = cluster_row(&graph, &row_of(&graph, 0), 0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].kind, ClusterKind::Spouses);
        assert_eq!(clusters[0].members, vec!["a", "c"]);
        assert_eq!(clusters[1].kind, ClusterKind::Single);
    }

    #[test]
    fn divorced_pair_breaks_name_ties_descending() {
        let people = vec![
            Person::new("a", "Ann", "X").born("1950"),
            Person::new("b", "Bob", "X").born("1950"),
        ];
        let graph = build_graph(&people, &[RelationshipEdge::divorced("a", "b")], "a");
        let clusters = cluster_row(&graph, &row_of(&graph, 0), 0);
        assert_eq!(clusters[0].kind, ClusterKind::Divorced);
        assert_eq!(clusters[0].members, vec!["b", "a"]);

        let graph = build_graph(&people, &[RelationshipEdge::spouse("a", "b")], "a");
        let clusters = cluster_row(&graph, &row_of(&graph, 0), 0);
        assert_eq!(clusters[0].members, vec!["a", "b"]);
    }

    #[test]
    fn packed_row_is_centred() {
        let config = LayoutConfig::default();
        let clusters = vec![
            Cluster {
                kind: ClusterKind::Single,
                members: vec!["a".into()],
            },
            Cluster {
                kind: ClusterKind::Spouses,
                members: vec!["b".into(), "c".into()],
            },
        ];
        let lefts = pack_row(&clusters, &config);
        let right = lefts[1] + clusters[1].width(&config);
        assert!((lefts[0] + right - 2.0 * config.canvas_center_x).abs() < 1e-3);
        assert_eq!(lefts[1] - lefts[0], config.card_width + config.cluster_gap);
    }

    #[test]
    fn sweep_keeps_gap_between_competing_blocks() {
        let config = LayoutConfig::default();
        let clusters: Vec<Cluster> = (0..3)
            .map(|i| Cluster {
                kind: ClusterKind::Single,
                members: vec![format!("p{i}")],
            })
            .collect();
        let items = vec![
            RowItem::centered(vec![0, 1], 0.0, &clusters, &config),
            RowItem::at(2, -10.0, &clusters, &config),
        ];
        let lefts = sweep_row(items, &clusters, &config);
        let mut sorted = lefts.clone();
        sorted.sort_by(f32::total_cmp);
        for pair in sorted.windows(2) {
            assert!(pair[1] - pair[0] >= config.card_width + config.cluster_gap - 1e-3);
        }
    }
}
