use crate::Chart;
use crate::config::LayoutConfig;
#[cfg(feature = "png")]
use crate::config::RenderConfig;
use crate::layout::{ConnectorGeometry, ConnectorKind, ConnectorPath, MarkerStyle, NodeRect};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Plain SVG preview: card outlines with name and years, then every
/// connector path and couple marker.
pub fn render_svg(chart: &Chart, theme: &Theme, config: &LayoutConfig) -> String {
    let mut svg = String::new();
    let width = chart.layout.bounds.width.max(200.0);
    let height = chart.layout.bounds.height.max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    for connector in &chart.connectors {
        svg.push_str(&connector_svg(connector, theme));
    }

    for rect in chart.layout.nodes.values() {
        let focused = chart.layout.focus.as_deref() == Some(rect.id.as_str());
        svg.push_str(&card_svg(chart, rect, focused, theme, config));
    }

    svg.push_str("</svg>");
    svg
}

fn path_svg(path: &ConnectorPath, theme: &Theme, dasharray: Option<&str>) -> String {
    if path.points.len() < 2 {
        return String::new();
    }
    let dash = dasharray
        .map(|value| format!(" stroke-dasharray=\"{value}\""))
        .unwrap_or_default();
    format!(
        "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{dash}/>",
        path.d, theme.line_color, theme.line_width
    )
}

fn connector_svg(connector: &ConnectorGeometry, theme: &Theme) -> String {
    let mut out = String::new();
    if let ConnectorKind::Couple {
        marker,
        marker_at,
        stems,
        bar,
        ..
    } = &connector.kind
    {
        let dash = match marker {
            MarkerStyle::Married => None,
            MarkerStyle::Divorced => Some(theme.divorced_dasharray.as_str()),
            MarkerStyle::Unmarried => Some(theme.unmarried_dasharray.as_str()),
        };
        for stem in stems {
            out.push_str(&path_svg(stem, theme, None));
        }
        out.push_str(&path_svg(bar, theme, dash));
        out.push_str(&marker_svg(*marker, *marker_at, theme));
    }
    for rail in &connector.rails {
        out.push_str(&path_svg(&rail.trunk, theme, None));
        out.push_str(&path_svg(&rail.line, theme, None));
        for drop in &rail.drops {
            out.push_str(&path_svg(&drop.path, theme, None));
        }
    }
    out
}

fn marker_svg(marker: MarkerStyle, at: (f32, f32), theme: &Theme) -> String {
    let (x, y) = at;
    match marker {
        MarkerStyle::Married => format!(
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"3.5\" fill=\"{}\"/>",
            theme.line_color
        ),
        MarkerStyle::Unmarried => format!(
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"3.5\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            theme.background, theme.line_color, theme.line_width
        ),
        MarkerStyle::Divorced => {
            let mut out = String::new();
            for dx in [-3.0f32, 3.0] {
                out.push_str(&format!(
                    "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\"/>",
                    x + dx - 3.0,
                    y + 5.0,
                    x + dx + 3.0,
                    y - 5.0,
                    theme.line_color,
                    theme.line_width
                ));
            }
            out
        }
    }
}

fn card_svg(
    chart: &Chart,
    rect: &NodeRect,
    focused: bool,
    theme: &Theme,
    config: &LayoutConfig,
) -> String {
    let stroke = if focused {
        theme.focus_stroke.as_str()
    } else {
        theme.card_stroke.as_str()
    };
    let mut out = format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        theme.card_fill,
        stroke,
        if focused { 2.4 } else { 1.2 }
    );
    let Some(person) = chart.graph.person(&rect.id) else {
        return out;
    };
    let center_x = rect.center_x();
    let name_y = rect.y + config.card_height / 2.0 - 2.0;
    out.push_str(&format!(
        "<text x=\"{center_x:.2}\" y=\"{name_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        theme.font_family,
        theme.font_size,
        theme.text_color,
        escape_xml(&person.display_name())
    ));
    let years = life_span(person.birth_year(), person.death_year());
    if !years.is_empty() {
        let years_y = name_y + theme.font_size + 2.0;
        out.push_str(&format!(
            "<text x=\"{center_x:.2}\" y=\"{years_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.font_size * 0.85,
            theme.secondary_text_color,
            years
        ));
    }
    out
}

fn life_span(birth: Option<i32>, death: Option<i32>) -> String {
    match (birth, death) {
        (Some(b), Some(d)) => format!("{b} - {d}"),
        (Some(b), None) => format!("b. {b}"),
        (None, Some(d)) => format!("d. {d}"),
        (None, None) => String::new(),
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }
    opt.font_family = "Georgia".to_string();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
