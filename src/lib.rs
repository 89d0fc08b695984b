#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod log;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use error::ChartError;
pub use graph::{
    Diagnostic, FamilyGraph, FamilyGroup, SingleParentGroup, Union, build_graph,
    build_graph_with_depth_cap,
};
pub use ir::{ChartInput, Person, PersonId, RelationshipEdge, Sex};
pub use layout::{
    ConnectorGeometry, ConnectorKind, MarkerStyle, NodeRect, PositionedUnion, TreeLayout,
    compute_connectors, layout_graph,
};
pub use render::render_svg;
pub use theme::Theme;

/// Everything the three stages produce for one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chart {
    pub graph: FamilyGraph,
    pub layout: TreeLayout,
    pub connectors: Vec<ConnectorGeometry>,
}

/// Runs graph building, layout and connector geometry for `input`. A missing
/// focus or empty input yields an empty chart.
pub fn compute_chart(input: &ChartInput, config: &LayoutConfig) -> Chart {
    let Some(focus) = input.focus_id() else {
        return Chart::default();
    };
    let graph =
        build_graph_with_depth_cap(&input.people, &input.relationships, focus, input.max_depth);
    let layout = layout_graph(&graph, focus, config);
    let connectors = compute_connectors(&graph, &layout, config);
    Chart {
        graph,
        layout,
        connectors,
    }
}

/// Parses a JSON chart document and renders it to an SVG preview.
pub fn render_json_to_svg(json: &str, config: &Config) -> Result<String, ChartError> {
    let input: ChartInput = serde_json::from_str(json)?;
    let chart = compute_chart(&input, &config.layout);
    Ok(render_svg(&chart, &config.theme, &config.layout))
}
