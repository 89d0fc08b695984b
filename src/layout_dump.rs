use crate::Chart;
use crate::graph::Diagnostic;
use crate::ir::PersonId;
use crate::layout::{Bounds, ConnectorGeometry, NodeRect, PositionedUnion};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Serialisable view of a computed chart for external drawing layers.
#[derive(Debug, Serialize)]
pub struct ChartDump<'a> {
    pub focus: Option<&'a str>,
    pub bounds: Bounds,
    pub rows: Vec<RowDump>,
    pub nodes: Vec<NodeDump<'a>>,
    pub unions: &'a [PositionedUnion],
    pub connectors: &'a [ConnectorGeometry],
    pub diagnostics: &'a [Diagnostic],
}

#[derive(Debug, Serialize)]
pub struct RowDump {
    pub depth: i32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump<'a> {
    #[serde(flatten)]
    pub rect: &'a NodeRect,
    pub name: String,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
}

impl<'a> ChartDump<'a> {
    pub fn from_chart(chart: &'a Chart) -> Self {
        let nodes = chart
            .layout
            .nodes
            .values()
            .map(|rect| {
                let person = chart.graph.person(&rect.id);
                NodeDump {
                    rect,
                    name: person
                        .map(|p| p.display_name())
                        .unwrap_or_else(|| rect.id.clone()),
                    birth_year: person.and_then(|p| p.birth_year()),
                    death_year: person.and_then(|p| p.death_year()),
                }
            })
            .collect();

        let rows = chart
            .layout
            .rows
            .iter()
            .rev()
            .map(|(depth, y)| RowDump {
                depth: *depth,
                y: *y,
            })
            .collect();

        ChartDump {
            focus: chart.layout.focus.as_deref(),
            bounds: chart.layout.bounds,
            rows,
            nodes,
            unions: &chart.layout.unions,
            connectors: &chart.connectors,
            diagnostics: &chart.graph.diagnostics,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeDump<'a>> {
        self.nodes.iter().find(|node| node.rect.id == id)
    }
}

pub fn chart_to_json(chart: &Chart) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&ChartDump::from_chart(chart))?)
}

pub fn write_chart_dump(path: &Path, chart: &Chart) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &ChartDump::from_chart(chart))?;
    Ok(())
}

/// Ids of every placed person, in dump order.
pub fn dumped_ids(dump: &ChartDump<'_>) -> Vec<PersonId> {
    dump.nodes.iter().map(|node| node.rect.id.clone()).collect()
}
