use egui::{Color32, Pos2};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Appearance parameters handed to a brush kernel for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    pub color: Color32,
    /// Brush diameter in buffer pixels
    pub size: f32,
    /// Opacity in [0, 1]
    pub opacity: f32,
    /// Join interpolated points with midpoint curves instead of straight segments
    pub smoothing: bool,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            size: 5.0,
            opacity: 1.0,
            smoothing: true,
        }
    }
}

impl BrushSettings {
    pub fn rgb(&self) -> [u8; 3] {
        [self.color.r(), self.color.g(), self.color.b()]
    }
}

/// Per-gesture state shared by every freehand kernel.
///
/// `points` grows with the resampled positions of the current stroke. The
/// timing and angle fields are only read by the speed-sensitive kernels.
pub struct StrokeState {
    pub(crate) is_drawing: bool,
    pub(crate) points: Vec<Pos2>,
    /// Time of the sample currently being applied (ms)
    pub(crate) sample_time: f64,
    pub(crate) last_draw_time: f64,
    pub(crate) last_speed: f32,
    pub(crate) last_angle: f32,
    pub(crate) marked: bool,
    pub(crate) rng: StdRng,
}

impl std::fmt::Debug for StrokeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeState")
            .field("is_drawing", &self.is_drawing)
            .field("points", &self.points.len())
            .field("last_speed", &self.last_speed)
            .field("marked", &self.marked)
            .finish()
    }
}

impl StrokeState {
    /// Create stroke state; `seed` makes the randomized kernels reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            is_drawing: false,
            points: Vec::new(),
            sample_time: 0.0,
            last_draw_time: 0.0,
            last_speed: 0.0,
            last_angle: 0.0,
            marked: false,
            rng,
        }
    }

    /// Start a new gesture, forgetting the previous stroke.
    pub fn begin(&mut self, time_ms: f64) {
        self.is_drawing = true;
        self.points.clear();
        self.sample_time = time_ms;
        self.last_draw_time = time_ms;
        self.last_speed = 0.0;
        self.last_angle = 0.0;
        self.marked = false;
    }

    /// End the gesture. Returns true when anything was drawn.
    pub fn end(&mut self) -> bool {
        let marked = self.marked;
        self.is_drawing = false;
        self.points.clear();
        self.marked = false;
        marked
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn last_point(&self) -> Option<Pos2> {
        self.points.last().copied()
    }

    pub fn last_speed(&self) -> f32 {
        self.last_speed
    }

    pub(crate) fn set_sample_time(&mut self, time_ms: f64) {
        self.sample_time = time_ms;
    }

    /// Update speed and direction from the segment ending at `to`.
    /// A zero elapsed time counts as one 16 ms frame.
    pub(crate) fn track_motion(&mut self, from: Pos2, to: Pos2) {
        let elapsed = self.sample_time - self.last_draw_time;
        let elapsed = if elapsed > 0.0 { elapsed } else { 16.0 };
        self.last_speed = from.distance(to) / elapsed as f32;
        self.last_angle = (to.y - from.y).atan2(to.x - from.x);
        self.last_draw_time = self.sample_time;
    }
}
