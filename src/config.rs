use crate::error::ChartError;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry profile threaded through layout and connector computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub card_width: f32,
    pub card_height: f32,
    /// Distance between the tops of consecutive generation rows.
    pub row_height: f32,
    /// Horizontal gap between clusters in a row.
    pub cluster_gap: f32,
    /// Gap between the two cards of a married pair.
    pub spouse_gap: f32,
    /// Gap between the two cards of a divorced pair.
    pub divorced_gap: f32,
    pub canvas_center_x: f32,
    pub margin: f32,
    /// Distance of a port outside the card edge.
    pub port_offset: f32,
    /// Length of a partner stem below the bottom port.
    pub stem_length: f32,
    /// Extra drop per lane when couple bars on one row would overlap.
    pub bar_lane_gap: f32,
    /// Distance of a rail above the top port of the child row.
    pub rail_clearance: f32,
    /// Unit of the per-group vertical rail offset.
    pub rail_jitter: f32,
    pub corner_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            card_width: 160.0,
            card_height: 64.0,
            row_height: 150.0,
            cluster_gap: 40.0,
            spouse_gap: 24.0,
            divorced_gap: 56.0,
            canvas_center_x: 0.0,
            margin: 40.0,
            port_offset: 4.0,
            stem_length: 14.0,
            bar_lane_gap: 8.0,
            rail_clearance: 26.0,
            rail_jitter: 3.0,
            corner_radius: 8.0,
        }
    }
}

impl LayoutConfig {
    pub fn compact() -> Self {
        Self {
            card_width: 120.0,
            card_height: 48.0,
            row_height: 110.0,
            cluster_gap: 24.0,
            spouse_gap: 14.0,
            divorced_gap: 36.0,
            margin: 24.0,
            stem_length: 10.0,
            bar_lane_gap: 6.0,
            rail_clearance: 20.0,
            rail_jitter: 2.0,
            corner_radius: 6.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    card_fill: Option<String>,
    card_stroke: Option<String>,
    text_color: Option<String>,
    secondary_text_color: Option<String>,
    focus_stroke: Option<String>,
    line_color: Option<String>,
    line_width: Option<f32>,
    divorced_dasharray: Option<String>,
    unmarried_dasharray: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOverrides {
    profile: Option<String>,
    card_width: Option<f32>,
    card_height: Option<f32>,
    row_height: Option<f32>,
    cluster_gap: Option<f32>,
    spouse_gap: Option<f32>,
    divorced_gap: Option<f32>,
    canvas_center_x: Option<f32>,
    margin: Option<f32>,
    port_offset: Option<f32>,
    stem_length: Option<f32>,
    bar_lane_gap: Option<f32>,
    rail_clearance: Option<f32>,
    rail_jitter: Option<f32>,
    corner_radius: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutOverrides>,
}

/// Loads a JSON (or JSON5) config file and merges it onto the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ChartError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path).map_err(|source| ChartError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<Config, ChartError> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.card_fill {
            config.theme.card_fill = v;
        }
        if let Some(v) = vars.card_stroke {
            config.theme.card_stroke = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.secondary_text_color {
            config.theme.secondary_text_color = v;
        }
        if let Some(v) = vars.focus_stroke {
            config.theme.focus_stroke = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.line_width {
            config.theme.line_width = v;
        }
        if let Some(v) = vars.divorced_dasharray {
            config.theme.divorced_dasharray = v;
        }
        if let Some(v) = vars.unmarried_dasharray {
            config.theme.unmarried_dasharray = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if layout.profile.as_deref() == Some("compact") {
            config.layout = LayoutConfig::compact();
        }
        let target = &mut config.layout;
        if let Some(v) = layout.card_width {
            target.card_width = v;
        }
        if let Some(v) = layout.card_height {
            target.card_height = v;
        }
        if let Some(v) = layout.row_height {
            target.row_height = v;
        }
        if let Some(v) = layout.cluster_gap {
            target.cluster_gap = v;
        }
        if let Some(v) = layout.spouse_gap {
            target.spouse_gap = v;
        }
        if let Some(v) = layout.divorced_gap {
            target.divorced_gap = v;
        }
        if let Some(v) = layout.canvas_center_x {
            target.canvas_center_x = v;
        }
        if let Some(v) = layout.margin {
            target.margin = v;
        }
        if let Some(v) = layout.port_offset {
            target.port_offset = v;
        }
        if let Some(v) = layout.stem_length {
            target.stem_length = v;
        }
        if let Some(v) = layout.bar_lane_gap {
            target.bar_lane_gap = v;
        }
        if let Some(v) = layout.rail_clearance {
            target.rail_clearance = v;
        }
        if let Some(v) = layout.rail_jitter {
            target.rail_jitter = v;
        }
        if let Some(v) = layout.corner_radius {
            target.corner_radius = v;
        }
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
