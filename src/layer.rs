use uuid::Uuid;

use crate::error::{PaintError, PaintResult};
use crate::pixel_buffer::PixelBuffer;

/// One paintable layer of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Unique identifier for the layer
    pub id: Uuid,
    /// Display name of the layer
    pub name: String,
    /// Whether the layer is currently visible
    pub visible: bool,
    /// Opacity applied when compositing, in [0, 1]
    pub opacity: f32,
    /// Locked layers reject freehand and shape drawing
    pub locked: bool,
    /// Pixel content, always the size of the canvas
    pub buffer: PixelBuffer,
}

impl Layer {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            visible: true,
            opacity: 1.0,
            locked: false,
            buffer: PixelBuffer::new(width, height),
        }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Default name for the layer at `index`.
pub fn default_layer_name(index: usize) -> String {
    format!("Layer {}", index + 1)
}

/// Ordered layers, bottom first, plus the active layer index.
///
/// Never empty, and every layer buffer matches the stack size.
#[derive(Debug, Clone)]
pub struct LayerStack {
    layers: Vec<Layer>,
    current_index: usize,
    width: u32,
    height: u32,
}

impl LayerStack {
    /// A stack with one empty default layer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layers: vec![Layer::new(&default_layer_name(0), width, height)],
            current_index: 0,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    fn layer_mut(&mut self, index: usize) -> PaintResult<&mut Layer> {
        self.layers.get_mut(index).ok_or(PaintError::InvalidLayerIndex(index))
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn active(&self) -> &Layer {
        &self.layers[self.current_index]
    }

    pub fn active_mut(&mut self) -> &mut Layer {
        &mut self.layers[self.current_index]
    }

    /// Append an empty layer on top and make it active. Returns its index.
    pub fn add_layer(&mut self) -> usize {
        let index = self.layers.len();
        self.layers
            .push(Layer::new(&default_layer_name(index), self.width, self.height));
        self.current_index = index;
        index
    }

    /// Remove a layer. The last remaining layer cannot be deleted.
    pub fn delete_layer(&mut self, index: usize) -> PaintResult<Layer> {
        if index >= self.layers.len() {
            return Err(PaintError::InvalidLayerIndex(index));
        }
        if self.layers.len() == 1 {
            return Err(PaintError::LastLayer);
        }
        let removed = self.layers.remove(index);
        self.current_index = self.current_index.min(self.layers.len() - 1);
        Ok(removed)
    }

    pub fn select(&mut self, index: usize) -> PaintResult<()> {
        if index >= self.layers.len() {
            return Err(PaintError::InvalidLayerIndex(index));
        }
        self.current_index = index;
        Ok(())
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> PaintResult<()> {
        self.layer_mut(index)?.visible = visible;
        Ok(())
    }

    /// Flip visibility and return the new value.
    pub fn toggle_visible(&mut self, index: usize) -> PaintResult<bool> {
        let layer = self.layer_mut(index)?;
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }

    pub fn set_opacity(&mut self, index: usize, opacity: f32) -> PaintResult<()> {
        if !opacity.is_finite() {
            return Err(PaintError::InvalidInput(format!("opacity {opacity}")));
        }
        self.layer_mut(index)?.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn set_locked(&mut self, index: usize, locked: bool) -> PaintResult<()> {
        self.layer_mut(index)?.locked = locked;
        Ok(())
    }

    pub fn rename(&mut self, index: usize, name: &str) -> PaintResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PaintError::InvalidInput("layer name is empty".to_string()));
        }
        self.layer_mut(index)?.set_name(name.to_string());
        Ok(())
    }

    /// Rescale every layer to the new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        for layer in &mut self.layers {
            layer.buffer.resize(width, height);
        }
        self.width = width;
        self.height = height;
    }

    /// Clear every layer's pixels, keeping the layers themselves.
    pub fn clear_all(&mut self) {
        for layer in &mut self.layers {
            layer.buffer.clear();
        }
    }

    /// Make the stack hold exactly `count` layers: default layers are
    /// appended, extra layers dropped from the top.
    pub(crate) fn reconcile_count(&mut self, count: usize) {
        let count = count.max(1);
        while self.layers.len() < count {
            let index = self.layers.len();
            self.layers
                .push(Layer::new(&default_layer_name(index), self.width, self.height));
        }
        self.layers.truncate(count);
        self.current_index = self.current_index.min(self.layers.len() - 1);
    }

    /// Change the canvas size without scaling content (buffers are replaced by the caller).
    pub(crate) fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub(crate) fn layer_at_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub(crate) fn set_current_index(&mut self, index: usize) {
        self.current_index = index.min(self.layers.len().saturating_sub(1));
    }
}
