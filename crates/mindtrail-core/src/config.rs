//! Editor configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the interaction core.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Opacity of the preview node and edge during a create-node drag.
    pub preview_opacity: f64,
    /// Width of a node body in world units.
    pub node_width: f64,
    /// Height of a node body in world units.
    pub node_height: f64,
    /// Radius of the add/color handles in world units.
    pub handle_radius: f64,
    /// Zoom change per wheel notch or zoom menu command, in percent.
    pub zoom_step: i32,
    /// Minimum zoom in percent.
    pub min_zoom_percent: i32,
    /// Maximum zoom in percent.
    pub max_zoom_percent: i32,
    /// Extension of saved documents, without the dot.
    pub file_extension: String,
    /// Suggested export size is the content size times this factor.
    pub export_scale: f64,
    /// Exclusive upper bound for exported image width and height.
    pub max_export_size: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            preview_opacity: 0.5,
            node_width: 200.0,
            node_height: 75.0,
            handle_radius: 18.0,
            zoom_step: 10,
            min_zoom_percent: 10,
            max_zoom_percent: 200,
            file_extension: "mtrail".to_string(),
            export_scale: 2.0,
            max_export_size: 99_999,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON, falling back to defaults for missing fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Node body size as a kurbo size.
    pub fn node_size(&self) -> kurbo::Size {
        kurbo::Size::new(self.node_width, self.node_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "preview_opacity": 0.25 }"#).unwrap();
        assert!((config.preview_opacity - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.zoom_step, 10);
        assert_eq!(config.file_extension, "mtrail");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
