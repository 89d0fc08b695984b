use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;

use crate::ir::{OrderKey, Person, PersonId, RelationshipEdge};
use crate::log::{debug, warn};

/// Couple pseudo-node: two partners at one depth and the children they share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Union {
    pub id: String,
    pub partner_a: PersonId,
    pub partner_b: PersonId,
    pub children: Vec<PersonId>,
    pub depth: i32,
}

/// Children hanging from a single recorded parent, outside any union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleParentGroup {
    pub id: String,
    pub parent: PersonId,
    pub children: Vec<PersonId>,
    pub depth: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FamilyGroup<'a> {
    Couple(&'a Union),
    SingleParent(&'a SingleParentGroup),
}

impl<'a> FamilyGroup<'a> {
    pub fn key(&self) -> &'a str {
        match self {
            Self::Couple(union) => &union.id,
            Self::SingleParent(group) => &group.id,
        }
    }

    pub fn depth(&self) -> i32 {
        match self {
            Self::Couple(union) => union.depth,
            Self::SingleParent(group) => group.depth,
        }
    }

    pub fn children(&self) -> &'a [PersonId] {
        match self {
            Self::Couple(union) => &union.children,
            Self::SingleParent(group) => &group.children,
        }
    }
}

/// Non-fatal findings about the input data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Two recorded parents of a child sit at different depths, so no union
    /// holds the child.
    UnmatchedParentPair {
        child: PersonId,
        parents: [PersonId; 2],
    },
    /// The person is recorded as their own ancestor.
    AncestryCycle { person: PersonId },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FamilyGraph {
    pub focus: Option<PersonId>,
    pub people: BTreeMap<PersonId, Person>,
    pub children_of: BTreeMap<PersonId, Vec<PersonId>>,
    pub parents_of: BTreeMap<PersonId, Vec<PersonId>>,
    pub spouses: BTreeMap<PersonId, BTreeSet<PersonId>>,
    pub divorced: BTreeMap<PersonId, BTreeSet<PersonId>>,
    pub unmarried: BTreeMap<PersonId, BTreeSet<PersonId>>,
    pub depth: BTreeMap<PersonId, i32>,
    pub unions: Vec<Union>,
    pub single_parent_groups: Vec<SingleParentGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FamilyGraph {
    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn order_key(&self, id: &str) -> OrderKey {
        match self.people.get(id) {
            Some(person) => OrderKey::of(person),
            None => OrderKey {
                birth_year: i32::MAX,
                name: id.to_string(),
                id: id.to_string(),
            },
        }
    }

    pub fn are_spouses(&self, a: &str, b: &str) -> bool {
        linked(&self.spouses, a, b)
    }

    pub fn are_divorced(&self, a: &str, b: &str) -> bool {
        linked(&self.divorced, a, b)
    }

    pub fn are_unmarried(&self, a: &str, b: &str) -> bool {
        linked(&self.unmarried, a, b)
    }

    /// Unions first, then single-parent groups, each in build order.
    pub fn groups(&self) -> impl Iterator<Item = FamilyGroup<'_>> {
        self.unions
            .iter()
            .map(FamilyGroup::Couple)
            .chain(self.single_parent_groups.iter().map(FamilyGroup::SingleParent))
    }

    pub fn union_for(&self, a: &str, b: &str) -> Option<&Union> {
        self.unions.iter().find(|u| {
            (u.partner_a == a && u.partner_b == b) || (u.partner_a == b && u.partner_b == a)
        })
    }
}

fn linked(map: &BTreeMap<PersonId, BTreeSet<PersonId>>, a: &str, b: &str) -> bool {
    map.get(a).is_some_and(|set| set.contains(b))
}

#[derive(Debug, Clone, Default)]
struct Adjacency {
    children_of: BTreeMap<PersonId, Vec<PersonId>>,
    parents_of: BTreeMap<PersonId, Vec<PersonId>>,
    spouses: BTreeMap<PersonId, BTreeSet<PersonId>>,
    divorced: BTreeMap<PersonId, BTreeSet<PersonId>>,
    unmarried: BTreeMap<PersonId, BTreeSet<PersonId>>,
}

impl Adjacency {
    fn from_edges(people: &BTreeMap<PersonId, Person>, edges: &[RelationshipEdge]) -> Self {
        let mut adj = Self::default();
        for edge in edges {
            let (a, b) = edge.endpoints();
            if a == b {
                debug!(person = a, "ignoring self relationship");
                continue;
            }
            if !people.contains_key(a) || !people.contains_key(b) {
                debug!(a, b, "ignoring relationship to unknown person");
                continue;
            }
            match edge {
                RelationshipEdge::Parent { parent, child } => {
                    push_unique(adj.children_of.entry(parent.clone()).or_default(), child);
                    push_unique(adj.parents_of.entry(child.clone()).or_default(), parent);
                }
                RelationshipEdge::Spouse { a, b } => link(&mut adj.spouses, a, b),
                RelationshipEdge::Divorced { a, b } => link(&mut adj.divorced, a, b),
                RelationshipEdge::Unmarried { a, b } => link(&mut adj.unmarried, a, b),
            }
        }
        adj
    }

    fn parents(&self, id: &str) -> &[PersonId] {
        self.parents_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn children(&self, id: &str) -> &[PersonId] {
        self.children_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn partners<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a PersonId> {
        [&self.spouses, &self.divorced, &self.unmarried]
            .into_iter()
            .filter_map(move |map| map.get(id))
            .flatten()
    }

    /// Every unordered couple pair once, as (smaller id, larger id).
    fn couple_pairs(&self) -> BTreeSet<(PersonId, PersonId)> {
        let mut pairs = BTreeSet::new();
        for map in [&self.spouses, &self.divorced, &self.unmarried] {
            for (a, partners) in map {
                for b in partners {
                    pairs.insert(ordered_pair(a, b));
                }
            }
        }
        pairs
    }

    fn retain(&self, keep: &BTreeSet<PersonId>) -> Self {
        let lists = |map: &BTreeMap<PersonId, Vec<PersonId>>| {
            map.iter()
                .filter(|(id, _)| keep.contains(*id))
                .map(|(id, list)| {
                    let kept: Vec<PersonId> =
                        list.iter().filter(|o| keep.contains(*o)).cloned().collect();
                    (id.clone(), kept)
                })
                .filter(|(_, list)| !list.is_empty())
                .collect::<BTreeMap<_, _>>()
        };
        let sets = |map: &BTreeMap<PersonId, BTreeSet<PersonId>>| {
            map.iter()
                .filter(|(id, _)| keep.contains(*id))
                .map(|(id, set)| {
                    let kept: BTreeSet<PersonId> =
                        set.iter().filter(|o| keep.contains(*o)).cloned().collect();
                    (id.clone(), kept)
                })
                .filter(|(_, set)| !set.is_empty())
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            children_of: lists(&self.children_of),
            parents_of: lists(&self.parents_of),
            spouses: sets(&self.spouses),
            divorced: sets(&self.divorced),
            unmarried: sets(&self.unmarried),
        }
    }
}

fn push_unique(list: &mut Vec<PersonId>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}

fn link(map: &mut BTreeMap<PersonId, BTreeSet<PersonId>>, a: &str, b: &str) {
    map.entry(a.to_string()).or_default().insert(b.to_string());
    map.entry(b.to_string()).or_default().insert(a.to_string());
}

fn ordered_pair(a: &str, b: &str) -> (PersonId, PersonId) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

pub fn build_graph(people: &[Person], edges: &[RelationshipEdge], focus: &str) -> FamilyGraph {
    build_graph_with_depth_cap(people, edges, focus, None)
}

/// Builds the full reachable graph, then keeps only people within `max_depth`
/// breadth-first steps of the focus (measured on that full graph).
pub fn build_graph_with_depth_cap(
    people: &[Person],
    edges: &[RelationshipEdge],
    focus: &str,
    max_depth: Option<u32>,
) -> FamilyGraph {
    let all: BTreeMap<PersonId, Person> = people
        .iter()
        .map(|person| (person.id.clone(), person.clone()))
        .collect();
    if !all.contains_key(focus) {
        if !all.is_empty() {
            warn!(focus, "focus person not found; nothing to lay out");
        }
        return FamilyGraph {
            focus: None,
            ..FamilyGraph::default()
        };
    }

    let adj = Adjacency::from_edges(&all, edges);
    let (mut depth, distance) = assign_depths(&adj, focus);

    let mut diagnostics = Vec::new();
    for person in ancestry_cycles(&adj, depth.keys()) {
        warn!(person = person.as_str(), "person is recorded as their own ancestor");
        diagnostics.push(Diagnostic::AncestryCycle { person });
    }

    if let Some(cap) = max_depth {
        #[cfg(feature = "tracing")]
        let reached = depth.len();
        depth.retain(|id, _| distance.get(id).is_some_and(|hops| *hops <= cap));
        debug!(cap, reached, kept = depth.len(), "pruned graph by distance from focus");
    }
    let keep: BTreeSet<PersonId> = depth.keys().cloned().collect();
    let adj = adj.retain(&keep);

    let (unions, single_parent_groups) = synthesize_groups(&adj, &depth, &all, &mut diagnostics);
    let people = all
        .into_iter()
        .filter(|(id, _)| keep.contains(id))
        .collect();

    FamilyGraph {
        focus: Some(focus.to_string()),
        people,
        children_of: adj.children_of,
        parents_of: adj.parents_of,
        spouses: adj.spouses,
        divorced: adj.divorced,
        unmarried: adj.unmarried,
        depth,
        unions,
        single_parent_groups,
        diagnostics,
    }
}

/// Breadth-first depth assignment from the focus. Partners and siblings keep
/// the depth, parents add one, children subtract one; first visit wins. Also
/// returns the number of steps each person was reached in.
fn assign_depths(
    adj: &Adjacency,
    focus: &str,
) -> (BTreeMap<PersonId, i32>, BTreeMap<PersonId, u32>) {
    let mut depth = BTreeMap::new();
    let mut distance = BTreeMap::new();
    let mut queue = VecDeque::new();
    depth.insert(focus.to_string(), 0);
    distance.insert(focus.to_string(), 0);
    queue.push_back(focus.to_string());

    while let Some(current) = queue.pop_front() {
        let d = depth.get(&current).copied().unwrap_or(0);
        let hops = distance.get(&current).copied().unwrap_or(0) + 1;
        let mut visit = |id: &PersonId, next: i32| {
            if !depth.contains_key(id) {
                depth.insert(id.clone(), next);
                distance.insert(id.clone(), hops);
                queue.push_back(id.clone());
            }
        };
        for partner in adj.partners(&current) {
            visit(partner, d);
        }
        for parent in adj.parents(&current) {
            for sibling in adj.children(parent) {
                visit(sibling, d);
            }
        }
        for parent in adj.parents(&current) {
            visit(parent, d + 1);
        }
        for child in adj.children(&current) {
            visit(child, d - 1);
        }
    }
    (depth, distance)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// People reachable from `roots` that appear again on their own ancestor chain.
fn ancestry_cycles<'a>(
    adj: &Adjacency,
    roots: impl Iterator<Item = &'a PersonId>,
) -> BTreeSet<PersonId> {
    let mut marks: BTreeMap<PersonId, Mark> = BTreeMap::new();
    let mut found = BTreeSet::new();
    for root in roots {
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root.clone(), Mark::Active);
        let mut stack: Vec<(PersonId, usize)> = vec![(root.clone(), 0)];
        while let Some(top) = stack.last_mut() {
            let parents = adj.parents(&top.0);
            if top.1 < parents.len() {
                let next = parents[top.1].clone();
                top.1 += 1;
                match marks.get(&next) {
                    Some(Mark::Active) => {
                        found.insert(next);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next.clone(), Mark::Active);
                        stack.push((next, 0));
                    }
                }
            } else if let Some((node, _)) = stack.pop() {
                marks.insert(node, Mark::Done);
            }
        }
    }
    found
}

fn synthesize_groups(
    adj: &Adjacency,
    depth: &BTreeMap<PersonId, i32>,
    people: &BTreeMap<PersonId, Person>,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<Union>, Vec<SingleParentGroup>) {
    let mut pairs: BTreeMap<(PersonId, PersonId), Vec<PersonId>> = BTreeMap::new();
    let mut covered: BTreeSet<(PersonId, PersonId)> = BTreeSet::new();

    for (child, parents) in &adj.parents_of {
        match parents.as_slice() {
            [first, second] => {
                let (a, b) = ordered_pair(first, second);
                if depth.get(&a) == depth.get(&b) {
                    covered.insert((a.clone(), child.clone()));
                    covered.insert((b.clone(), child.clone()));
                    pairs.entry((a, b)).or_default().push(child.clone());
                } else {
                    warn!(
                        child = child.as_str(),
                        a = a.as_str(),
                        b = b.as_str(),
                        "parents sit in different generations; no union formed"
                    );
                    diagnostics.push(Diagnostic::UnmatchedParentPair {
                        child: child.clone(),
                        parents: [a, b],
                    });
                }
            }
            list if list.len() > 2 => {
                debug!(
                    child = child.as_str(),
                    parents = list.len(),
                    "more than two recorded parents; excluded from unions"
                );
            }
            _ => {}
        }
    }

    for (a, b) in adj.couple_pairs() {
        if depth.get(&a) != depth.get(&b) {
            debug!(
                a = a.as_str(),
                b = b.as_str(),
                "couple spans generations; no union formed"
            );
            continue;
        }
        pairs.entry((a, b)).or_default();
    }

    let sort_children = |children: &mut Vec<PersonId>| {
        children.sort_by(|x, y| order_key(people, x).cmp_name_asc(&order_key(people, y)));
    };

    let unions = pairs
        .into_iter()
        .map(|((a, b), mut children)| {
            sort_children(&mut children);
            Union {
                id: format!("u:{a}:{b}"),
                depth: depth.get(&a).copied().unwrap_or(0),
                partner_a: a,
                partner_b: b,
                children,
            }
        })
        .collect();

    let mut single_parent_groups = Vec::new();
    for (parent, children) in &adj.children_of {
        let mut loose: Vec<PersonId> = children
            .iter()
            .filter(|child| !covered.contains(&(parent.clone(), (*child).clone())))
            .cloned()
            .collect();
        if loose.is_empty() {
            continue;
        }
        sort_children(&mut loose);
        single_parent_groups.push(SingleParentGroup {
            id: format!("s:{parent}"),
            parent: parent.clone(),
            children: loose,
            depth: depth.get(parent).copied().unwrap_or(0),
        });
    }

    (unions, single_parent_groups)
}

fn order_key(people: &BTreeMap<PersonId, Person>, id: &str) -> OrderKey {
    match people.get(id) {
        Some(person) => OrderKey::of(person),
        None => OrderKey {
            birth_year: i32::MAX,
            name: id.to_string(),
            id: id.to_string(),
        },
    }
}
