use serde::{Deserialize, Serialize};

use crate::error::{PaintError, PaintResult};

/// Engine-wide tunables.
///
/// Missing fields fall back to their defaults when deserializing, so a
/// partial JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Width of a new document in buffer pixels
    pub canvas_width: u32,
    /// Height of a new document in buffer pixels
    pub canvas_height: u32,
    /// Largest accepted canvas dimension
    pub max_dimension: u32,
    /// Maximum number of history entries kept
    pub history_limit: usize,
    /// Euclidean RGBA distance accepted by the flood fill
    pub fill_tolerance: f32,
    /// Pixels with alpha below this are always fillable
    pub fill_alpha_threshold: u8,
    /// Grid line spacing in pixels
    pub grid_spacing: u32,
    /// Width of the ruler bands in pixels
    pub ruler_size: u32,
    /// Fixed seed for the randomized brush kernels (None = entropy)
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1920,
            canvas_height: 1080,
            max_dimension: 4096,
            history_limit: 50,
            fill_tolerance: 100.0,
            fill_alpha_threshold: 200,
            grid_spacing: 50,
            ruler_size: 20,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> PaintResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate_dimensions(config.canvas_width, config.canvas_height)?;
        Ok(config)
    }

    /// Check that a canvas size is usable.
    pub fn validate_dimensions(&self, width: u32, height: u32) -> PaintResult<()> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension {
            return Err(PaintError::InvalidDimensions {
                width,
                height,
                max: self.max_dimension,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "history_limit": 10, "rng_seed": 7 }"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.grid_spacing, 50);
        assert_eq!(config.fill_alpha_threshold, 200);
    }

    #[test]
    fn test_dimension_validation() {
        let config = EngineConfig::default();
        assert!(config.validate_dimensions(800, 600).is_ok());
        assert!(config.validate_dimensions(0, 600).is_err());
        assert!(config.validate_dimensions(4097, 10).is_err());
    }
}
