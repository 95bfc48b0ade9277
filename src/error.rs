use thiserror::Error;

use crate::codec::CodecError;
use crate::event::Severity;

/// Errors reported by document operations.
///
/// Every variant is recovered at the boundary of the operation that raised
/// it: the document is left unchanged (or reverted) and the error is also
/// published as a notification.
#[derive(Debug, Error)]
pub enum PaintError {
    #[error("Point ({x}, {y}) is outside the canvas")]
    OutOfBounds { x: f32, y: f32 },

    #[error("Invalid canvas size {width}x{height} (max {max}x{max})")]
    InvalidDimensions { width: u32, height: u32, max: u32 },

    #[error("No layer at index {0}")]
    InvalidLayerIndex(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot delete the last layer")]
    LastLayer,

    #[error("Layer is locked")]
    LayerLocked,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("A restore is already in progress")]
    RestoreInProgress,

    #[error("Another gesture is in progress")]
    GestureInProgress,

    #[error("Failed to restore layer image: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid project data: {0}")]
    Project(#[from] serde_json::Error),
}

/// Result type for document operations
pub type PaintResult<T> = Result<T, PaintError>;

impl PaintError {
    /// Severity used when the error is shown to the user.
    pub fn severity(&self) -> Severity {
        match self {
            PaintError::Codec(_) | PaintError::Project(_) => Severity::Error,
            PaintError::InvalidDimensions { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}
