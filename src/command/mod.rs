pub mod history;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{PaintError, PaintResult};
use crate::event::{DocumentEvent, EditorEvent, LayerEvent, Notification, Severity};
use crate::layer::LayerStack;

pub use history::{HistoryEntry, HistoryManager, LayerSnapshot, PendingRestore, RestoreDirection};

/// Document edits that are not pointer gestures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    AddLayer,
    DeleteLayer { index: usize },
    SelectLayer { index: usize },
    SetLayerVisibility { index: usize, visible: bool },
    ToggleLayerVisibility { index: usize },
    SetLayerOpacity { index: usize, opacity: f32 },
    SetLayerLocked { index: usize, locked: bool },
    RenameLayer { index: usize, name: String },
    /// Scale every layer to the new size
    ResizeCanvas { width: u32, height: u32 },
    /// Clear every layer, locked or not
    ClearAll,
}

/// What a successfully applied command changed.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub event: EditorEvent,
    pub notification: Option<Notification>,
}

impl CommandOutcome {
    fn silent(event: EditorEvent) -> Self {
        Self {
            event,
            notification: None,
        }
    }

    fn announced(event: EditorEvent, message: impl Into<String>) -> Self {
        Self {
            event,
            notification: Some(Notification::new(Severity::Success, message)),
        }
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddLayer => "add layer",
            Command::DeleteLayer { .. } => "delete layer",
            Command::SelectLayer { .. } => "select layer",
            Command::SetLayerVisibility { .. } => "set layer visibility",
            Command::ToggleLayerVisibility { .. } => "toggle layer visibility",
            Command::SetLayerOpacity { .. } => "set layer opacity",
            Command::SetLayerLocked { .. } => "set layer lock",
            Command::RenameLayer { .. } => "rename layer",
            Command::ResizeCanvas { .. } => "resize canvas",
            Command::ClearAll => "clear all layers",
        }
    }

    /// Whether a successful application is recorded as a history entry.
    /// Layer metadata edits are not.
    pub fn records_history(&self) -> bool {
        matches!(
            self,
            Command::AddLayer | Command::DeleteLayer { .. } | Command::ResizeCanvas { .. } | Command::ClearAll
        )
    }

    /// Apply to `stack`. On error the stack is unchanged.
    pub fn apply(&self, stack: &mut LayerStack, config: &EngineConfig) -> PaintResult<CommandOutcome> {
        let outcome = match self {
            Command::AddLayer => {
                let index = stack.add_layer();
                CommandOutcome::announced(EditorEvent::LayerChanged(LayerEvent::Added { index }), "New layer added")
            }
            Command::DeleteLayer { index } => {
                stack.delete_layer(*index)?;
                CommandOutcome::announced(
                    EditorEvent::LayerChanged(LayerEvent::Removed { index: *index }),
                    "Layer deleted",
                )
            }
            Command::SelectLayer { index } => {
                stack.select(*index)?;
                CommandOutcome::silent(EditorEvent::LayerChanged(LayerEvent::Selected { index: *index }))
            }
            Command::SetLayerVisibility { index, visible } => {
                stack.set_visible(*index, *visible)?;
                CommandOutcome::silent(EditorEvent::LayerChanged(LayerEvent::VisibilityChanged {
                    index: *index,
                    visible: *visible,
                }))
            }
            Command::ToggleLayerVisibility { index } => {
                let visible = stack.toggle_visible(*index)?;
                CommandOutcome::silent(EditorEvent::LayerChanged(LayerEvent::VisibilityChanged {
                    index: *index,
                    visible,
                }))
            }
            Command::SetLayerOpacity { index, opacity } => {
                stack.set_opacity(*index, *opacity)?;
                let opacity = stack.layer(*index).map_or(*opacity, |layer| layer.opacity);
                CommandOutcome::silent(EditorEvent::LayerChanged(LayerEvent::OpacityChanged {
                    index: *index,
                    opacity,
                }))
            }
            Command::SetLayerLocked { index, locked } => {
                stack.set_locked(*index, *locked)?;
                CommandOutcome::silent(EditorEvent::LayerChanged(LayerEvent::LockChanged {
                    index: *index,
                    locked: *locked,
                }))
            }
            Command::RenameLayer { index, name } => {
                stack.rename(*index, name)?;
                CommandOutcome::silent(EditorEvent::LayerChanged(LayerEvent::Renamed {
                    index: *index,
                    name: name.trim().to_string(),
                }))
            }
            Command::ResizeCanvas { width, height } => {
                config.validate_dimensions(*width, *height)?;
                stack.resize(*width, *height);
                CommandOutcome::announced(
                    EditorEvent::DocumentChanged(DocumentEvent::Resized {
                        width: *width,
                        height: *height,
                    }),
                    format!("Canvas resized to {width}x{height}"),
                )
            }
            Command::ClearAll => {
                stack.clear_all();
                CommandOutcome::announced(EditorEvent::DocumentChanged(DocumentEvent::Cleared), "All layers cleared")
            }
        };
        log::debug!("Applied {}", self.name());
        Ok(outcome)
    }
}

/// Parse a `WIDTHxHEIGHT` size such as `1600x1200`.
pub fn parse_dimensions(text: &str) -> PaintResult<(u32, u32)> {
    let invalid = || PaintError::InvalidInput("invalid size format, use WIDTHxHEIGHT".to_string());
    let (width, height) = text
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width = width.trim().parse().map_err(|_| invalid())?;
    let height = height.trim().parse().map_err(|_| invalid())?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("1600x1200").unwrap(), (1600, 1200));
        assert_eq!(parse_dimensions(" 800 X 600 ").unwrap(), (800, 600));
        assert!(parse_dimensions("800").is_err());
        assert!(parse_dimensions("axb").is_err());
        assert!(parse_dimensions("-1x5").is_err());
    }

    #[test]
    fn test_resize_validates() {
        let mut stack = LayerStack::new(10, 10);
        let config = EngineConfig::default();
        let bad = Command::ResizeCanvas { width: 5000, height: 10 };
        assert!(matches!(
            bad.apply(&mut stack, &config),
            Err(PaintError::InvalidDimensions { .. })
        ));
        assert_eq!(stack.width(), 10);
        let good = Command::ResizeCanvas { width: 20, height: 5 };
        let outcome = good.apply(&mut stack, &config).unwrap();
        assert_eq!((stack.width(), stack.height()), (20, 5));
        assert_eq!(outcome.notification.unwrap().message, "Canvas resized to 20x5");
    }

    #[test]
    fn test_metadata_edits_skip_history() {
        assert!(Command::AddLayer.records_history());
        assert!(Command::ClearAll.records_history());
        assert!(!Command::SelectLayer { index: 0 }.records_history());
        assert!(!Command::SetLayerOpacity { index: 0, opacity: 0.5 }.records_history());
    }

    #[test]
    fn test_toggle_reports_new_visibility() {
        let mut stack = LayerStack::new(4, 4);
        let outcome = Command::ToggleLayerVisibility { index: 0 }
            .apply(&mut stack, &EngineConfig::default())
            .unwrap();
        assert_eq!(
            outcome.event,
            EditorEvent::LayerChanged(LayerEvent::VisibilityChanged { index: 0, visible: false })
        );
    }
}
