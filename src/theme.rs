use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub card_fill: String,
    pub card_stroke: String,
    pub text_color: String,
    pub secondary_text_color: String,
    pub focus_stroke: String,
    pub line_color: String,
    pub line_width: f32,
    pub divorced_dasharray: String,
    pub unmarried_dasharray: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Georgia, \"Times New Roman\", serif".to_string(),
            font_size: 14.0,
            card_fill: "#FFFDF5".to_string(),
            card_stroke: "#8B7355".to_string(),
            text_color: "#2B2118".to_string(),
            secondary_text_color: "#6F6254".to_string(),
            focus_stroke: "#B5472D".to_string(),
            line_color: "#5C4B3A".to_string(),
            line_width: 1.5,
            divorced_dasharray: "6 4".to_string(),
            unmarried_dasharray: "2 3".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            card_fill: "#F8FAFF".to_string(),
            card_stroke: "#C7D2E5".to_string(),
            text_color: "#1C2430".to_string(),
            secondary_text_color: "#5B6B82".to_string(),
            focus_stroke: "#3B6FD8".to_string(),
            line_color: "#7A8AA6".to_string(),
            line_width: 1.4,
            divorced_dasharray: "6 4".to_string(),
            unmarried_dasharray: "2 3".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}
