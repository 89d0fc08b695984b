use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kinchart::config::LayoutConfig;
use kinchart::graph::build_graph;
use kinchart::ir::{ChartInput, Person, RelationshipEdge};
use kinchart::layout::{compute_connectors, layout_graph};
use kinchart::render::render_svg;
use kinchart::theme::Theme;
use kinchart::compute_chart;
use std::hint::black_box;

/// A full binary pedigree `generations` deep above one focus person, each
/// ancestral couple also carrying `siblings` extra children.
fn pedigree(generations: usize, siblings: usize) -> ChartInput {
    let mut people = vec![Person::new("x", "Focus", "Bench").born("2000")];
    let mut relationships = Vec::new();
    let mut frontier = vec!["x".to_string()];
    for generation in 1..=generations {
        let year = 2000 - 28 * generation as i32;
        let mut next = Vec::new();
        for child in &frontier {
            let father = format!("{child}f");
            let mother = format!("{child}m");
            people.push(Person::new(&father, "F", child).born(&year.to_string()));
            people.push(Person::new(&mother, "M", child).born(&(year + 2).to_string()));
            relationships.push(RelationshipEdge::spouse(&father, &mother));
            relationships.push(RelationshipEdge::parent(&father, child));
            relationships.push(RelationshipEdge::parent(&mother, child));
            for s in 0..siblings {
                let sibling = format!("{child}s{s}");
                people.push(Person::new(&sibling, "S", child).born(&(year + 30 + s as i32).to_string()));
                relationships.push(RelationshipEdge::parent(&father, &sibling));
                relationships.push(RelationshipEdge::parent(&mother, &sibling));
            }
            next.push(father);
            next.push(mother);
        }
        frontier = next;
    }
    ChartInput {
        people,
        relationships,
        focus: Some("x".to_string()),
        max_depth: None,
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("chart_pipeline");
    let config = LayoutConfig::default();
    for (generations, siblings) in [(3usize, 1usize), (5, 2), (7, 2)] {
        let name = format!("pedigree_{}_{}", generations, siblings);
        let input = pedigree(generations, siblings);
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, input| {
            b.iter(|| {
                let chart = compute_chart(black_box(input), &config);
                black_box(chart.connectors.len());
            });
        });
    }
    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("chart_stages");
    let config = LayoutConfig::default();
    let input = pedigree(6, 2);

    group.bench_function("build_graph", |b| {
        b.iter(|| {
            let graph = build_graph(black_box(&input.people), &input.relationships, "x");
            black_box(graph.unions.len());
        });
    });

    let graph = build_graph(&input.people, &input.relationships, "x");
    group.bench_function("layout_graph", |b| {
        b.iter(|| {
            let layout = layout_graph(black_box(&graph), "x", &config);
            black_box(layout.nodes.len());
        });
    });

    let layout = layout_graph(&graph, "x", &config);
    group.bench_function("compute_connectors", |b| {
        b.iter(|| {
            let connectors = compute_connectors(black_box(&graph), &layout, &config);
            black_box(connectors.len());
        });
    });

    let chart = compute_chart(&input, &config);
    let theme = Theme::classic();
    group.bench_function("render_svg", |b| {
        b.iter(|| {
            let svg = render_svg(black_box(&chart), &theme, &config);
            black_box(svg.len());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_stages);
criterion_main!(benches);
