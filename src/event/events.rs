use egui::Vec2;

use crate::tools::ToolKind;

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A short user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Notification(Notification),
    ToolChanged {
        old: ToolKind,
        new: ToolKind,
    },
    StrokeStarted {
        layer_index: usize,
        tool: ToolKind,
    },
    StrokeCompleted {
        layer_index: usize,
        changed: bool,
    },
    LayerChanged(LayerEvent),
    DocumentChanged(DocumentEvent),
    HistoryChanged {
        step: isize,
        len: usize,
    },
    ColorPicked {
        hex: String,
    },
    ViewChanged {
        zoom: f32,
        pan: Vec2,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    Added { index: usize },
    Removed { index: usize },
    Selected { index: usize },
    VisibilityChanged { index: usize, visible: bool },
    OpacityChanged { index: usize, opacity: f32 },
    LockChanged { index: usize, locked: bool },
    Renamed { index: usize, name: String },
    ContentChanged { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    Modified,
    Resized { width: u32, height: u32 },
    Cleared,
    Restored,
    Loaded,
    Created,
}
