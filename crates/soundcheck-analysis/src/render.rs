//! Renderer seam between the estimator and whatever draws the chart.
//!
//! The analysis crate never touches a drawing surface. After each permitted
//! rebuild the chart slots and axis metadata are handed to a
//! [`SpectrumRenderer`].

use std::sync::{Arc, Mutex};

use crate::chart::{ChartAxes, ChartPoint};

/// Consumer of rebuilt charts.
///
/// `render` is called from the tick path. Implementations must not block.
pub trait SpectrumRenderer: Send {
    /// Receives the chart after a rebuild.
    fn render(&mut self, axes: &ChartAxes, slots: &[Option<ChartPoint>]);
}

impl<F> SpectrumRenderer for F
where
    F: FnMut(&ChartAxes, &[Option<ChartPoint>]) + Send,
{
    fn render(&mut self, axes: &ChartAxes, slots: &[Option<ChartPoint>]) {
        self(axes, slots);
    }
}

/// Renderer that discards every chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl SpectrumRenderer for NullRenderer {
    fn render(&mut self, _axes: &ChartAxes, _slots: &[Option<ChartPoint>]) {}
}

/// Copy of a chart taken at one rebuild.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSnapshot {
    /// Axis metadata, `None` before the first rebuild.
    pub axes: Option<ChartAxes>,
    /// Slot values.
    pub slots: Vec<Option<ChartPoint>>,
    /// Number of rebuilds published so far.
    pub frame: u64,
}

/// Handle for reading the latest published snapshot.
pub type SharedSnapshot = Arc<Mutex<ChartSnapshot>>;

/// Renderer publishing into a shared snapshot.
///
/// Publishing uses `try_lock`; if a reader holds the lock the frame is
/// skipped. After the first frame no allocation happens while slot counts
/// stay the same.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRenderer {
    shared: SharedSnapshot,
    frame: u64,
}

impl SnapshotRenderer {
    /// Creates a renderer with an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the published snapshot.
    pub fn handle(&self) -> SharedSnapshot {
        Arc::clone(&self.shared)
    }
}

impl SpectrumRenderer for SnapshotRenderer {
    fn render(&mut self, axes: &ChartAxes, slots: &[Option<ChartPoint>]) {
        self.frame += 1;
        if let Ok(mut snapshot) = self.shared.try_lock() {
            snapshot.axes = Some(*axes);
            snapshot.slots.clear();
            snapshot.slots.extend_from_slice(slots);
            snapshot.frame = self.frame;
        }
    }
}
