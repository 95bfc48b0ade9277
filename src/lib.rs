#![warn(clippy::all, rust_2018_idioms)]

pub mod brush;
pub mod codec;
pub mod command;
pub mod compositor;
pub mod config;
pub mod error;
pub mod event;
pub mod fill;
pub mod layer;
pub mod pixel_buffer;
pub mod project;
pub mod raster;
pub mod session;
pub mod settings;
pub mod state;
pub mod stroke;
pub mod text;
pub mod tools;
pub mod util;
pub mod view;

pub use brush::{BrushKernel, BrushKind};
pub use codec::{CodecError, DecodeHandle, EncodedImage, ImageDecoder, PngDecoder};
pub use command::{Command, HistoryEntry, HistoryManager};
pub use compositor::{Compositor, Guides};
pub use config::EngineConfig;
pub use error::{PaintError, PaintResult};
pub use event::{EditorEvent, EventBus, EventHandler, Notification, NotificationLog, Severity};
pub use layer::{Layer, LayerStack};
pub use pixel_buffer::{PixelBuffer, Rgba8};
pub use project::{ProjectData, ProjectLayer};
pub use session::{DecodedRestore, DocumentSession, RestoreTask};
pub use settings::ToolSettings;
pub use state::EditorState;
pub use stroke::{BrushSettings, StrokeState};
pub use text::{TextLayout, TextRenderer};
pub use tools::{Tool, ToolKind};
pub use view::ViewState;
