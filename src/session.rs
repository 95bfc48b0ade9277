//! One open document and everything that edits it.
//!
//! A `DocumentSession` owns the layer stack, the undo log, the tool settings
//! and the view. Every operation either succeeds, or leaves the document
//! unchanged and reports why through the event bus.
//!
//! Undo, redo and project loading decode layer snapshots asynchronously.
//! They run in two phases: `begin_*` moves the history cursor and returns a
//! [`RestoreTask`], whose decode is awaited by the caller and handed back to
//! [`DocumentSession::finish_restore`]. Until then the session rejects every
//! other mutation with [`PaintError::RestoreInProgress`].
//!
//! ```rust,no_run
//! use futures::executor::block_on;
//! use raster_paint::DocumentSession;
//!
//! let mut session = DocumentSession::with_size(800, 600)?;
//! session.pointer_down(egui::pos2(10.0, 10.0))?;
//! session.pointer_move(egui::pos2(90.0, 40.0));
//! session.pointer_up()?;
//! block_on(session.undo())?;
//! # Ok::<(), raster_paint::PaintError>(())
//! ```

use std::sync::Arc;

use egui::{Color32, Pos2, Vec2};
use futures::future::{AbortHandle, Abortable, Aborted};
use image::ImageFormat;

use crate::brush::BrushKind;
use crate::codec::{encode_bytes, CodecError, ImageDecoder, PngDecoder};
use crate::command::{parse_dimensions, Command, HistoryEntry, HistoryManager, PendingRestore, RestoreDirection};
use crate::compositor::{Compositor, Guides};
use crate::config::EngineConfig;
use crate::error::{PaintError, PaintResult};
use crate::event::{
    DocumentEvent, EditorEvent, EventBus, EventHandler, LayerEvent, LogHandler, Notification, Severity,
};
use crate::fill::{fill_color, FillOptions};
use crate::layer::{default_layer_name, Layer, LayerStack};
use crate::pixel_buffer::PixelBuffer;
use crate::project::ProjectData;
use crate::settings::{to_hex, ToolSettings};
use crate::state::EditorState;
use crate::raster::Paint;
use crate::stroke::{BrushSettings, StrokeState};
use crate::text::{TextLayout, TextRenderer};
use crate::tools::{Tool, ToolContext, ToolKind, ToolType};
use crate::util::time::now_millis;
use crate::view::ViewState;

/// A restore whose snapshots still have to be decoded.
pub struct RestoreTask {
    pending: PendingRestore,
    entry: Arc<HistoryEntry>,
    decoder: Arc<dyn ImageDecoder>,
}

impl std::fmt::Debug for RestoreTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreTask")
            .field("direction", &self.pending.direction())
            .field("layers", &self.entry.layers.len())
            .finish()
    }
}

impl RestoreTask {
    pub fn direction(&self) -> RestoreDirection {
        self.pending.direction()
    }

    /// Handle that aborts the decode; the restore then fails with
    /// [`CodecError::Cancelled`] and the document is left as it was.
    pub fn canceller(&self) -> AbortHandle {
        self.pending.canceller()
    }

    /// Decode every layer snapshot, one after the other.
    pub async fn decode(mut self) -> DecodedRestore {
        let registration = self.pending.registration.take();
        let entry = Arc::clone(&self.entry);
        let decoder = Arc::clone(&self.decoder);
        let work = async move {
            let mut buffers = Vec::with_capacity(entry.layers.len());
            for snapshot in &entry.layers {
                buffers.push(decoder.submit(&snapshot.data).await?);
            }
            Ok::<_, CodecError>(buffers)
        };
        let result = match registration {
            Some(registration) => match Abortable::new(work, registration).await {
                Ok(result) => result,
                Err(Aborted) => Err(CodecError::Cancelled),
            },
            None => work.await,
        };
        DecodedRestore {
            pending: self.pending,
            entry: self.entry,
            result,
        }
    }
}

/// Outcome of [`RestoreTask::decode`], ready to be applied.
#[derive(Debug)]
pub struct DecodedRestore {
    pending: PendingRestore,
    entry: Arc<HistoryEntry>,
    result: Result<Vec<PixelBuffer>, CodecError>,
}

impl DecodedRestore {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct DocumentSession {
    layers: LayerStack,
    history: HistoryManager,
    settings: ToolSettings,
    brush: BrushSettings,
    stroke: StrokeState,
    state: EditorState,
    active_tool: Option<ToolType>,
    view: ViewState,
    compositor: Compositor,
    text: TextRenderer,
    config: EngineConfig,
    decoder: Arc<dyn ImageDecoder>,
    event_bus: EventBus,
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("layers", &self.layers)
            .field("history_step", &self.history.step())
            .field("history_len", &self.history.len())
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("view", &self.view)
            .field("text", &self.text)
            .field("decoder", &"<dyn ImageDecoder>")
            .field("event_bus", &self.event_bus)
            .finish()
    }
}

impl DocumentSession {
    /// Blank document at the configured size. The initial state is the first
    /// history entry.
    pub fn new(config: EngineConfig) -> PaintResult<Self> {
        config.validate_dimensions(config.canvas_width, config.canvas_height)?;
        let settings = ToolSettings::default();
        let brush = settings.brush_settings()?;
        let event_bus = EventBus::new();
        event_bus.subscribe(Box::new(LogHandler));
        let mut session = Self {
            layers: LayerStack::new(config.canvas_width, config.canvas_height),
            history: HistoryManager::new(config.history_limit),
            settings,
            brush,
            stroke: StrokeState::new(config.rng_seed),
            state: EditorState::Idle,
            active_tool: None,
            view: ViewState::default(),
            compositor: Compositor::new(&config),
            text: TextRenderer::builtin()?,
            config,
            decoder: Arc::new(PngDecoder),
            event_bus,
        };
        session.commit_history()?;
        log::info!(
            "📄 New document {}x{}",
            session.layers.width(),
            session.layers.height()
        );
        Ok(session)
    }

    pub fn with_size(width: u32, height: u32) -> PaintResult<Self> {
        Self::new(EngineConfig {
            canvas_width: width,
            canvas_height: height,
            ..Default::default()
        })
    }

    /// Replace the snapshot decoder used by undo, redo and project loading.
    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the font used by [`DocumentSession::commit_text`].
    pub fn with_font(mut self, text: TextRenderer) -> Self {
        self.text = text;
        self
    }

    /// Register an additional event handler.
    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.event_bus.subscribe(handler);
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_restoring(&self) -> bool {
        self.history.is_restoring()
    }

    // Pointer input

    pub fn pointer_down(&mut self, pos: Pos2) -> PaintResult<()> {
        self.pointer_down_at(pos, now_millis())
    }

    /// Start a gesture with the current tool. `time_ms` drives the
    /// speed-sensitive brushes.
    ///
    /// Pan mode reads pointer positions as screen coordinates; every other
    /// tool reads them as buffer pixels.
    pub fn pointer_down_at(&mut self, pos: Pos2, time_ms: f64) -> PaintResult<()> {
        let ready = self.ensure_editable().and_then(|()| self.ensure_idle());
        self.reported(ready)?;

        match self.settings.tool {
            ToolKind::Eyedropper => self.pick_color(pos).map(|_| ()),
            ToolKind::Pan => self.transition_to(EditorState::Panning { last: pos }),
            kind => {
                let Some(mut tool) = ToolType::for_kind(kind, self.settings.brush) else {
                    return Ok(());
                };
                let result = tool.on_pointer_down(pos, &mut self.tool_context(time_ms));
                self.reported(result)?;
                self.transition_to(EditorState::Drawing { tool: kind })?;
                self.active_tool = Some(tool);
                self.event_bus.emit(EditorEvent::StrokeStarted {
                    layer_index: self.layers.current_index(),
                    tool: kind,
                });
                Ok(())
            }
        }
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        self.pointer_move_at(pos, now_millis());
    }

    /// Continue the current gesture. Ignored when no gesture is active.
    pub fn pointer_move_at(&mut self, pos: Pos2, time_ms: f64) {
        match self.state {
            EditorState::Drawing { .. } => {
                if let Some(mut tool) = self.active_tool.take() {
                    tool.on_pointer_move(pos, &mut self.tool_context(time_ms));
                    self.active_tool = Some(tool);
                }
            }
            EditorState::Panning { last } => {
                self.view.pan_by(pos - last);
                self.state = EditorState::Panning { last: pos };
                self.emit_view();
            }
            EditorState::Idle => {}
        }
    }

    /// Finish the gesture; commits a history entry if the layer changed.
    pub fn pointer_up(&mut self) -> PaintResult<()> {
        self.end_gesture(false)
    }

    /// The pointer left the canvas. Freehand strokes keep what was drawn;
    /// shape previews are discarded.
    pub fn pointer_cancel(&mut self) -> PaintResult<()> {
        self.end_gesture(true)
    }

    fn end_gesture(&mut self, cancelled: bool) -> PaintResult<()> {
        if self.state.is_panning() {
            return self.transition_to(EditorState::Idle);
        }
        let Some(kind) = self.state.current_drawing_tool() else {
            return Ok(());
        };
        let changed = match self.active_tool.take() {
            Some(mut tool) => {
                let mut ctx = self.tool_context(now_millis());
                if cancelled {
                    tool.on_cancel(&mut ctx)
                } else {
                    tool.on_pointer_up(&mut ctx)
                }
            }
            None => false,
        };
        self.transition_to(EditorState::Idle)?;
        let layer_index = self.layers.current_index();
        self.event_bus.emit(EditorEvent::StrokeCompleted { layer_index, changed });
        if !changed {
            return Ok(());
        }
        self.event_bus
            .emit(EditorEvent::LayerChanged(LayerEvent::ContentChanged { index: layer_index }));
        if kind == ToolKind::Fill {
            self.notify(Severity::Success, "Fill complete");
        }
        self.record_edit()
    }

    fn tool_context(&mut self, time_ms: f64) -> ToolContext<'_> {
        ToolContext {
            layers: &mut self.layers,
            stroke: &mut self.stroke,
            brush: self.brush,
            fill_options: FillOptions::from(&self.config),
            fill_color: fill_color(self.brush.rgb(), self.settings.opacity),
            time_ms,
        }
    }

    fn transition_to(&mut self, new_state: EditorState) -> PaintResult<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(PaintError::GestureInProgress);
        }
        self.state = new_state;
        Ok(())
    }

    /// Sample the composited image (without guides) and make it the current colour.
    pub fn pick_color(&mut self, pos: Pos2) -> PaintResult<String> {
        let frame = self.compositor.composite(&self.layers, Guides::default());
        let sample = frame
            .get(pos.x.floor() as i64, pos.y.floor() as i64)
            .ok_or(PaintError::OutOfBounds { x: pos.x, y: pos.y });
        let [r, g, b, _] = self.reported(sample)?;
        let color = Color32::from_rgb(r, g, b);
        let hex = to_hex(color);
        self.settings.color = hex.clone();
        self.brush.color = color;
        self.event_bus.emit(EditorEvent::ColorPicked { hex: hex.clone() });
        self.notify(Severity::Success, format!("Colour: {hex}"));
        Ok(hex)
    }

    /// Render `text` into the active layer with the current colour and
    /// opacity, then commit it as one undo step.
    ///
    /// `pos` is the top-left corner of the text; `rotation_deg` turns it
    /// clockwise about its centre. Returns false when no pixel of the text
    /// lands on the canvas, in which case nothing is committed.
    pub fn commit_text(&mut self, pos: Pos2, text: &str, font_size: f32, rotation_deg: f32) -> PaintResult<bool> {
        let ready = self.ensure_editable().and_then(|()| self.ensure_idle());
        self.reported(ready)?;
        let checked = if text.trim().is_empty() {
            Err(PaintError::InvalidInput("text is empty".to_string()))
        } else if !(font_size.is_finite() && font_size > 0.0) {
            Err(PaintError::InvalidInput(format!("font size {font_size}")))
        } else if !rotation_deg.is_finite() {
            Err(PaintError::InvalidInput(format!("rotation {rotation_deg}")))
        } else if self.layers.active().locked {
            Err(PaintError::LayerLocked)
        } else {
            Ok(())
        };
        self.reported(checked)?;

        let width = self.text.measure(text, font_size);
        let centre = pos + Vec2::new(width / 2.0, font_size / 2.0);
        let layout = TextLayout::new(pos, font_size).rotated(rotation_deg.to_radians(), centre);
        let paint = Paint::new(self.brush.color, self.brush.opacity);
        let touched = self
            .text
            .draw(&mut self.layers.active_mut().buffer, text, &layout, &paint);
        if touched == 0 {
            log::debug!("Text at {pos:?} fell outside the canvas");
            return Ok(false);
        }

        let index = self.layers.current_index();
        self.event_bus
            .emit(EditorEvent::LayerChanged(LayerEvent::ContentChanged { index }));
        self.notify(Severity::Success, "Text applied");
        self.record_edit()?;
        Ok(true)
    }

    // Settings

    /// Replace the tool settings. Invalid settings are rejected as a whole;
    /// the tool cannot change in the middle of a gesture.
    pub fn apply_settings(&mut self, settings: ToolSettings) -> PaintResult<()> {
        let checked = settings.validate().and_then(|()| settings.brush_settings());
        let brush = self.reported(checked)?;
        let old = self.settings.tool;
        if settings.tool != old && !self.state.is_idle() {
            return self.reported(Err(PaintError::GestureInProgress));
        }
        let brush_changed = settings.brush != self.settings.brush;
        self.settings = settings;
        self.brush = brush;
        if old != self.settings.tool {
            self.event_bus.emit(EditorEvent::ToolChanged {
                old,
                new: self.settings.tool,
            });
            self.notify(Severity::Info, self.settings.tool.name());
        } else if brush_changed {
            self.notify(Severity::Info, self.settings.brush.name());
        }
        Ok(())
    }

    pub fn set_tool(&mut self, tool: ToolKind) -> PaintResult<()> {
        self.apply_settings(ToolSettings {
            tool,
            ..self.settings.clone()
        })
    }

    pub fn set_brush(&mut self, brush: BrushKind) -> PaintResult<()> {
        self.apply_settings(ToolSettings {
            brush,
            ..self.settings.clone()
        })
    }

    /// Set the colour from `#rrggbb`.
    pub fn set_color(&mut self, hex: &str) -> PaintResult<()> {
        self.apply_settings(ToolSettings {
            color: hex.to_string(),
            ..self.settings.clone()
        })
    }

    // Document commands

    /// Apply a document command, committing history when it changes pixels
    /// or the layer list.
    pub fn execute(&mut self, command: Command) -> PaintResult<()> {
        let ready = self.ensure_editable().and_then(|()| self.ensure_idle());
        self.reported(ready)?;
        let result = command.apply(&mut self.layers, &self.config);
        let outcome = self.reported(result)?;
        self.event_bus.emit(outcome.event);
        if let Some(notification) = outcome.notification {
            self.event_bus.emit(EditorEvent::Notification(notification));
        }
        if command.records_history() {
            self.record_edit()?;
        }
        Ok(())
    }

    /// Add a layer on top and select it. Returns its index.
    pub fn add_layer(&mut self) -> PaintResult<usize> {
        self.execute(Command::AddLayer)?;
        Ok(self.layers.current_index())
    }

    pub fn delete_layer(&mut self, index: usize) -> PaintResult<()> {
        self.execute(Command::DeleteLayer { index })
    }

    pub fn select_layer(&mut self, index: usize) -> PaintResult<()> {
        self.execute(Command::SelectLayer { index })
    }

    pub fn set_layer_visibility(&mut self, index: usize, visible: bool) -> PaintResult<()> {
        self.execute(Command::SetLayerVisibility { index, visible })
    }

    pub fn toggle_layer_visibility(&mut self, index: usize) -> PaintResult<()> {
        self.execute(Command::ToggleLayerVisibility { index })
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) -> PaintResult<()> {
        self.execute(Command::SetLayerOpacity { index, opacity })
    }

    pub fn set_layer_locked(&mut self, index: usize, locked: bool) -> PaintResult<()> {
        self.execute(Command::SetLayerLocked { index, locked })
    }

    pub fn rename_layer(&mut self, index: usize, name: &str) -> PaintResult<()> {
        self.execute(Command::RenameLayer {
            index,
            name: name.to_string(),
        })
    }

    pub fn resize_canvas(&mut self, width: u32, height: u32) -> PaintResult<()> {
        self.execute(Command::ResizeCanvas { width, height })
    }

    /// Resize from user text such as `1600x1200`.
    pub fn resize_canvas_from_str(&mut self, text: &str) -> PaintResult<()> {
        let parsed = parse_dimensions(text);
        let (width, height) = self.reported(parsed)?;
        self.resize_canvas(width, height)
    }

    /// Clear every layer as one undoable step.
    pub fn clear_all(&mut self) -> PaintResult<()> {
        self.execute(Command::ClearAll)
    }

    /// Clear every layer and start the undo log over.
    pub fn clear_canvas(&mut self) -> PaintResult<()> {
        let ready = self.ensure_editable().and_then(|()| self.ensure_idle());
        self.reported(ready)?;
        self.layers.clear_all();
        self.reset_history()?;
        self.event_bus
            .emit(EditorEvent::DocumentChanged(DocumentEvent::Cleared));
        self.notify(Severity::Success, "Canvas cleared");
        Ok(())
    }

    /// Replace the document with a single empty layer at the current size.
    pub fn new_project(&mut self) -> PaintResult<()> {
        let ready = self.ensure_editable().and_then(|()| self.ensure_idle());
        self.reported(ready)?;
        self.layers = LayerStack::new(self.layers.width(), self.layers.height());
        self.reset_history()?;
        self.event_bus
            .emit(EditorEvent::DocumentChanged(DocumentEvent::Created));
        self.notify(Severity::Success, "New project created");
        Ok(())
    }

    // History

    /// Step back one entry. See [`DocumentSession::finish_restore`].
    pub fn begin_undo(&mut self) -> PaintResult<RestoreTask> {
        self.begin_restore(RestoreDirection::Undo)
    }

    pub fn begin_redo(&mut self) -> PaintResult<RestoreTask> {
        self.begin_restore(RestoreDirection::Redo)
    }

    pub async fn undo(&mut self) -> PaintResult<()> {
        let task = self.begin_undo()?;
        self.finish_restore(task.decode().await)
    }

    pub async fn redo(&mut self) -> PaintResult<()> {
        let task = self.begin_redo()?;
        self.finish_restore(task.decode().await)
    }

    fn begin_restore(&mut self, direction: RestoreDirection) -> PaintResult<RestoreTask> {
        let ready = self.ensure_idle();
        self.reported(ready)?;
        let pending = match direction {
            RestoreDirection::Redo => self.history.begin_redo(),
            _ => self.history.begin_undo(),
        };
        let pending = self.reported(pending)?;
        let Some(entry) = pending.entry.clone() else {
            self.history.finish_restore(pending, false);
            return self.reported(Err(PaintError::InvalidInput("history entry missing".to_string())));
        };
        Ok(self.restore_task(pending, entry))
    }

    fn restore_task(&self, pending: PendingRestore, entry: Arc<HistoryEntry>) -> RestoreTask {
        RestoreTask {
            pending,
            entry,
            decoder: Arc::clone(&self.decoder),
        }
    }

    /// Apply a decoded restore. If any snapshot failed to decode, the
    /// document is untouched and the history cursor moves back.
    pub fn finish_restore(&mut self, decoded: DecodedRestore) -> PaintResult<()> {
        let DecodedRestore { pending, entry, result } = decoded;
        let direction = pending.direction();
        match result {
            Ok(buffers) => {
                self.history.finish_restore(pending, true);
                self.apply_entry(&entry, buffers);
                match direction {
                    RestoreDirection::Undo | RestoreDirection::Redo => {
                        self.event_bus
                            .emit(EditorEvent::DocumentChanged(DocumentEvent::Restored));
                        self.emit_history();
                        let message = if direction == RestoreDirection::Undo { "Undo" } else { "Redo" };
                        self.notify(Severity::Success, message);
                    }
                    RestoreDirection::Load => {
                        self.reset_history()?;
                        self.event_bus
                            .emit(EditorEvent::DocumentChanged(DocumentEvent::Loaded));
                        self.notify(Severity::Success, "Project loaded");
                    }
                }
                Ok(())
            }
            Err(error) => {
                self.history.finish_restore(pending, false);
                let error = PaintError::from(error);
                let action = match direction {
                    RestoreDirection::Undo => "Undo",
                    RestoreDirection::Redo => "Redo",
                    RestoreDirection::Load => "Project load",
                };
                self.notify(error.severity(), format!("{action} failed: {error}"));
                Err(error)
            }
        }
    }

    /// Make the stack match `entry`, using the decoded pixels in layer order.
    fn apply_entry(&mut self, entry: &HistoryEntry, buffers: Vec<PixelBuffer>) {
        let (width, height) = (entry.width, entry.height);
        self.layers.set_size(width, height);
        self.layers.reconcile_count(entry.layers.len());
        let mut decoded = buffers.into_iter();
        for index in 0..self.layers.len() {
            let Some(layer) = self.layers.layer_at_mut(index) else {
                continue;
            };
            match (entry.layers.get(index), decoded.next()) {
                (Some(snapshot), Some(pixels)) => {
                    let mut buffer = PixelBuffer::new(width, height);
                    buffer.draw_at_origin(&pixels);
                    layer.id = snapshot.id;
                    layer.name = snapshot.name.clone();
                    layer.visible = snapshot.visible;
                    layer.opacity = snapshot.opacity;
                    layer.locked = snapshot.locked;
                    layer.buffer = buffer;
                }
                _ => *layer = Layer::new(&default_layer_name(index), width, height),
            }
        }
        self.layers.set_current_index(entry.current_layer_index);
    }

    fn commit_history(&mut self) -> PaintResult<()> {
        let captured = HistoryEntry::capture(&self.layers);
        let entry = self.reported(captured)?;
        if self.history.commit(entry) {
            self.emit_history();
        }
        Ok(())
    }

    /// Commit a user edit to the undo log.
    fn record_edit(&mut self) -> PaintResult<()> {
        self.commit_history()?;
        self.event_bus
            .emit(EditorEvent::DocumentChanged(DocumentEvent::Modified));
        Ok(())
    }

    fn reset_history(&mut self) -> PaintResult<()> {
        self.history.clear();
        self.commit_history()
    }

    // Projects

    pub fn to_project(&self) -> PaintResult<ProjectData> {
        let project = ProjectData::from_stack(&self.layers);
        self.reported(project)
    }

    pub fn save_project_json(&self) -> PaintResult<String> {
        let json = self.to_project().and_then(|project| project.to_json());
        let json = self.reported(json)?;
        self.notify(Severity::Success, "Project saved");
        Ok(json)
    }

    /// Parse a project and start decoding its layers.
    pub fn begin_load_project(&mut self, json: &str) -> PaintResult<RestoreTask> {
        let ready = self.ensure_idle();
        self.reported(ready)?;
        let parsed = ProjectData::from_json(json, &self.config);
        let project = self.reported(parsed)?;
        let pending = self.history.begin_external();
        let pending = self.reported(pending)?;
        Ok(self.restore_task(pending, Arc::new(project.to_entry())))
    }

    /// Replace the document with a saved project. The undo log restarts
    /// from the loaded state.
    pub async fn load_project(&mut self, json: &str) -> PaintResult<()> {
        let task = self.begin_load_project(json)?;
        self.finish_restore(task.decode().await)
    }

    // Output

    /// The display frame: background, enabled guides, visible layers.
    pub fn composite(&self) -> PixelBuffer {
        let guides = Guides {
            grid: self.view.show_grid,
            ruler: self.view.show_ruler,
        };
        self.compositor.composite(&self.layers, guides)
    }

    /// [`DocumentSession::composite`] plus the preview of the gesture in progress.
    pub fn render(&self) -> PixelBuffer {
        let mut frame = self.composite();
        if let Some(tool) = &self.active_tool {
            tool.draw_preview(&mut frame, &self.brush);
        }
        frame
    }

    /// Encode the flattened image (no guides) as PNG or JPEG file bytes.
    pub fn export_image(&self, format: ImageFormat) -> PaintResult<Vec<u8>> {
        let frame = self.compositor.composite(&self.layers, Guides::default());
        let encoded = encode_bytes(&frame, format).map_err(PaintError::from);
        let bytes = self.reported(encoded)?;
        let name = format.extensions_str().first().copied().unwrap_or("image");
        self.notify(Severity::Success, format!("Image exported as {}", name.to_uppercase()));
        Ok(bytes)
    }

    // View

    pub fn zoom_in(&mut self) -> f32 {
        let zoom = self.view.zoom_in();
        self.announce_zoom();
        zoom
    }

    pub fn zoom_out(&mut self) -> f32 {
        let zoom = self.view.zoom_out();
        self.announce_zoom();
        zoom
    }

    /// Ctrl + wheel zoom.
    pub fn wheel_zoom(&mut self, delta_y: f32) -> f32 {
        let zoom = self.view.wheel(delta_y);
        self.emit_view();
        zoom
    }

    pub fn reset_zoom(&mut self) {
        self.view.reset();
        self.emit_view();
        self.notify(Severity::Success, "Zoom reset");
    }

    pub fn pan_view(&mut self, delta: Vec2) {
        self.view.pan_by(delta);
        self.emit_view();
    }

    pub fn center_canvas(&mut self) {
        self.view.center();
        self.emit_view();
        self.notify(Severity::Success, "Canvas centred");
    }

    /// Fit the canvas inside a container of the given screen size.
    pub fn fit_to_screen(&mut self, container: Vec2) -> f32 {
        let zoom = self
            .view
            .fit_to(container, self.layers.width(), self.layers.height());
        self.emit_view();
        self.notify(Severity::Success, "Canvas fitted to screen");
        zoom
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.view.show_grid = visible;
    }

    pub fn set_ruler_visible(&mut self, visible: bool) {
        self.view.show_ruler = visible;
    }

    fn announce_zoom(&self) {
        self.emit_view();
        self.notify(Severity::Info, format!("Zoom: {}%", self.view.zoom_percent()));
    }

    // Guards and notifications

    fn ensure_editable(&self) -> PaintResult<()> {
        if self.history.is_restoring() {
            return Err(PaintError::RestoreInProgress);
        }
        Ok(())
    }

    fn ensure_idle(&self) -> PaintResult<()> {
        if !self.state.is_idle() {
            return Err(PaintError::GestureInProgress);
        }
        Ok(())
    }

    /// Publish the error of a failed result, then pass the result on.
    fn reported<T>(&self, result: PaintResult<T>) -> PaintResult<T> {
        if let Err(error) = &result {
            self.notify(error.severity(), error.to_string());
        }
        result
    }

    fn notify(&self, severity: Severity, message: impl Into<String>) {
        self.event_bus
            .emit(EditorEvent::Notification(Notification::new(severity, message)));
    }

    fn emit_history(&self) {
        self.event_bus.emit(EditorEvent::HistoryChanged {
            step: self.history.step(),
            len: self.history.len(),
        });
    }

    fn emit_view(&self) {
        self.event_bus.emit(EditorEvent::ViewChanged {
            zoom: self.view.zoom,
            pan: self.view.pan,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NotificationLog;
    use egui::{pos2, vec2};
    use futures::executor::block_on;

    fn session() -> (DocumentSession, NotificationLog) {
        let session = DocumentSession::new(EngineConfig {
            canvas_width: 64,
            canvas_height: 48,
            rng_seed: Some(1),
            ..Default::default()
        })
        .unwrap();
        let log = NotificationLog::new();
        session.subscribe(log.handler());
        (session, log)
    }

    #[test]
    fn test_new_session_has_initial_entry() {
        let (session, _) = session();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().step(), 0);
        assert!(session.state().is_idle());
    }

    #[test]
    fn test_second_gesture_rejected_while_drawing() {
        let (mut session, log) = session();
        session.pointer_down_at(pos2(10.0, 10.0), 0.0).unwrap();
        assert!(matches!(
            session.pointer_down_at(pos2(12.0, 12.0), 16.0),
            Err(PaintError::GestureInProgress)
        ));
        assert!(matches!(session.add_layer(), Err(PaintError::GestureInProgress)));
        assert_eq!(log.last().unwrap().severity, Severity::Warning);
        session.pointer_up().unwrap();
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_mutations_rejected_during_restore() {
        let (mut session, _) = session();
        session.add_layer().unwrap();
        let task = session.begin_undo().unwrap();
        assert!(session.is_restoring());
        assert!(matches!(session.add_layer(), Err(PaintError::RestoreInProgress)));
        assert!(matches!(
            session.pointer_down(pos2(1.0, 1.0)),
            Err(PaintError::RestoreInProgress)
        ));
        assert!(matches!(session.begin_redo(), Err(PaintError::RestoreInProgress)));
        session.finish_restore(block_on(task.decode())).unwrap();
        assert_eq!(session.layers().len(), 1);
        assert!(!session.is_restoring());
    }

    #[test]
    fn test_cancelled_restore_reverts_step() {
        let (mut session, log) = session();
        session.add_layer().unwrap();
        let task = session.begin_undo().unwrap();
        task.canceller().abort();
        let decoded = block_on(task.decode());
        assert!(!decoded.is_ok());
        assert!(session.finish_restore(decoded).is_err());
        assert_eq!(session.history().step(), 1);
        assert_eq!(session.layers().len(), 2);
        assert_eq!(log.last().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_eyedropper_sets_colour() {
        let (mut session, log) = session();
        session.set_tool(ToolKind::Eyedropper).unwrap();
        // Empty canvas composites over white.
        session.pointer_down(pos2(5.0, 5.0)).unwrap();
        assert_eq!(session.settings().color, "#ffffff");
        assert_eq!(log.last().unwrap().message, "Colour: #ffffff");
        assert!(session.state().is_idle());
        assert!(session.pick_color(pos2(-1.0, 5.0)).is_err());
    }

    #[test]
    fn test_pan_gesture_moves_view() {
        let (mut session, _) = session();
        session.set_tool(ToolKind::Pan).unwrap();
        session.pointer_down(pos2(100.0, 100.0)).unwrap();
        session.pointer_move(pos2(130.0, 90.0));
        session.pointer_up().unwrap();
        assert_eq!(session.view().pan, vec2(30.0, -10.0));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_tool_change_blocked_mid_gesture() {
        let (mut session, _) = session();
        session.pointer_down_at(pos2(10.0, 10.0), 0.0).unwrap();
        assert!(session.set_tool(ToolKind::Fill).is_err());
        assert!(session.set_color("#ff0000").is_ok());
        session.pointer_cancel().unwrap();
        assert!(session.set_tool(ToolKind::Fill).is_ok());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let (mut session, _) = session();
        assert!(session.set_color("red").is_err());
        assert_eq!(session.settings().color, "#000000");
    }

    #[test]
    fn test_shape_cancel_discards() {
        let (mut session, _) = session();
        session.set_tool(ToolKind::Rectangle).unwrap();
        session.pointer_down(pos2(5.0, 5.0)).unwrap();
        session.pointer_move(pos2(30.0, 30.0));
        assert!(session.render() != session.composite());
        session.pointer_cancel().unwrap();
        assert!(session.layers().active().buffer.is_blank());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_clear_canvas_resets_history() {
        let (mut session, _) = session();
        session.pointer_down_at(pos2(10.0, 10.0), 0.0).unwrap();
        session.pointer_up().unwrap();
        session.add_layer().unwrap();
        session.clear_canvas().unwrap();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.layers().len(), 2);
        assert!(session.layers().layers().iter().all(|l| l.buffer.is_blank()));
    }

    #[test]
    fn test_new_project_keeps_size() {
        let (mut session, _) = session();
        session.add_layer().unwrap();
        session.resize_canvas(32, 32).unwrap();
        session.new_project().unwrap();
        assert_eq!(session.layers().len(), 1);
        assert_eq!((session.layers().width(), session.layers().height()), (32, 32));
        assert!(!session.history().can_undo());
    }

    #[derive(Clone, Default)]
    struct EventRecorder(Arc<parking_lot::Mutex<Vec<EditorEvent>>>);

    impl EventHandler for EventRecorder {
        fn handle_event(&mut self, event: &EditorEvent) {
            self.0.lock().push(event.clone());
        }
    }

    impl EventRecorder {
        fn modified_count(&self) -> usize {
            self.0
                .lock()
                .iter()
                .filter(|event| matches!(event, EditorEvent::DocumentChanged(DocumentEvent::Modified)))
                .count()
        }
    }

    #[test]
    fn test_recorded_edits_emit_modified() {
        let (mut session, _) = session();
        let recorder = EventRecorder::default();
        session.subscribe(Box::new(recorder.clone()));

        session.pointer_down_at(pos2(10.0, 10.0), 0.0).unwrap();
        session.pointer_up().unwrap();
        assert_eq!(recorder.modified_count(), 1);

        session.add_layer().unwrap();
        session.rename_layer(1, "Ink").unwrap();
        assert_eq!(recorder.modified_count(), 2);

        session.zoom_in();
        session.clear_canvas().unwrap();
        assert_eq!(recorder.modified_count(), 2);
    }

    #[test]
    fn test_zoom_notifications() {
        let (mut session, log) = session();
        session.zoom_in();
        assert_eq!(log.last().unwrap().message, "Zoom: 110%");
        session.center_canvas();
        assert_eq!(session.view().zoom_percent(), 110);
    }
}
