//! The gesture state machine of a document session.
//!
//! ```text
//!              ┌─────────────┐
//!        ┌─────►   Drawing   ├─────┐
//!        │     └─────────────┘     │
//! ┌──────┴───┐                 ┌───▼──────┐
//! │   Idle   │                 │   Idle   │
//! └──────┬───┘                 └───▲──────┘
//!        │     ┌─────────────┐     │
//!        └─────►   Panning   ├─────┘
//!              └─────────────┘
//! ```
//!
//! A gesture always returns to `Idle` before another can start.
use egui::Pos2;

use crate::tools::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EditorState {
    /// No gesture in progress
    #[default]
    Idle,
    /// A layer-editing tool owns the pointer
    Drawing { tool: ToolKind },
    /// Dragging the view; `last` is the previous pointer position
    Panning { last: Pos2 },
}

impl EditorState {
    /// Validates whether a transition to the new state is allowed
    pub fn can_transition_to(&self, new_state: &EditorState) -> bool {
        match (self, new_state) {
            (EditorState::Idle, _) => true,
            (EditorState::Drawing { .. }, EditorState::Idle) => true,
            (EditorState::Panning { .. }, EditorState::Idle) => true,
            // Pan moves update the anchor in place.
            (EditorState::Panning { .. }, EditorState::Panning { .. }) => true,
            _ => false,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, EditorState::Idle)
    }

    pub fn is_panning(&self) -> bool {
        matches!(self, EditorState::Panning { .. })
    }

    /// Returns the current drawing tool if in drawing state
    pub fn current_drawing_tool(&self) -> Option<ToolKind> {
        match self {
            EditorState::Drawing { tool } => Some(*tool),
            _ => None,
        }
    }
}
