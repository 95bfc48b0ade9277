//! Saved project files: canvas size plus every layer as a PNG data URL.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::{encode_png, EncodedImage};
use crate::command::history::{HistoryEntry, LayerSnapshot};
use crate::config::EngineConfig;
use crate::error::PaintResult;
use crate::layer::LayerStack;
use crate::util::time::timestamp_secs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLayer {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    pub data: EncodedImage,
}

fn default_visible() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<ProjectLayer>,
}

impl ProjectData {
    /// Encode every layer of the stack. Lock state is not saved.
    pub fn from_stack(stack: &LayerStack) -> PaintResult<Self> {
        let layers = stack
            .layers()
            .iter()
            .map(|layer| {
                Ok(ProjectLayer {
                    name: layer.name.clone(),
                    visible: layer.visible,
                    opacity: layer.opacity,
                    data: encode_png(&layer.buffer)?,
                })
            })
            .collect::<PaintResult<Vec<_>>>()?;
        Ok(Self {
            width: stack.width(),
            height: stack.height(),
            layers,
        })
    }

    pub fn to_json(&self) -> PaintResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and check the canvas size against `config`.
    pub fn from_json(json: &str, config: &EngineConfig) -> PaintResult<Self> {
        let project: Self = serde_json::from_str(json)?;
        config.validate_dimensions(project.width, project.height)?;
        Ok(project)
    }

    /// The document state this project describes: fresh layer ids, all
    /// layers unlocked, the bottom layer active.
    pub fn to_entry(&self) -> HistoryEntry {
        let layers = self
            .layers
            .iter()
            .map(|layer| LayerSnapshot {
                id: Uuid::new_v4(),
                data: layer.data.clone(),
                name: layer.name.clone(),
                visible: layer.visible,
                opacity: if layer.opacity.is_finite() { layer.opacity.clamp(0.0, 1.0) } else { 1.0 },
                locked: false,
            })
            .collect();
        HistoryEntry {
            layers,
            current_layer_index: 0,
            width: self.width,
            height: self.height,
            timestamp: timestamp_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut stack = LayerStack::new(4, 3);
        stack.add_layer();
        stack.set_opacity(1, 0.5).unwrap();
        let json = ProjectData::from_stack(&stack).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["width"], 4);
        assert_eq!(value["layers"][1]["name"], "Layer 2");
        assert_eq!(value["layers"][1]["opacity"], 0.5);
        assert!(value["layers"][0]["data"].as_str().unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_rejects_oversized_project() {
        let json = r#"{"width": 5000, "height": 10, "layers": []}"#;
        assert!(ProjectData::from_json(json, &EngineConfig::default()).is_err());
        assert!(ProjectData::from_json("not json", &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_entry_sanitizes_metadata() {
        let json = r#"{"width": 2, "height": 2, "layers": [{"name": "Ink", "opacity": 3.0, "data": "x"}]}"#;
        let entry = ProjectData::from_json(json, &EngineConfig::default()).unwrap().to_entry();
        assert_eq!(entry.layers[0].opacity, 1.0);
        assert!(entry.layers[0].visible);
        assert!(!entry.layers[0].locked);
    }
}
