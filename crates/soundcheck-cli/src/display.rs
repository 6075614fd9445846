//! Text rendering of spectrum charts.
//!
//! Charts are drawn as bar graphs of `cols` columns and `rows` rows. Each
//! column shows the loudest slot that falls into it; bar height is the
//! chart's own log-magnitude scale, full scale at `N / 8`.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use soundcheck_analysis::{ChartAxes, ChartPoint, SpectrumRenderer};

const BAR: char = '#';
/// ANSI sequence that clears the screen and homes the cursor.
pub const CLEAR: &str = "\x1b[2J\x1b[H";

/// Draws slots as a text bar chart.
pub fn draw_chart(
    axes: &ChartAxes,
    slots: &[Option<ChartPoint>],
    cols: usize,
    rows: usize,
) -> String {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let levels = column_levels(axes, slots, cols);

    let mut text = String::with_capacity((cols + 1) * (rows + 2));
    for row in (0..rows).rev() {
        let threshold = (row as f64 + 0.5) / rows as f64;
        for level in &levels {
            text.push(if *level >= threshold { BAR } else { ' ' });
        }
        text.push('\n');
    }
    text.push_str(&"-".repeat(cols));
    text.push('\n');

    let left = format_hz(axes.low_hz);
    let right = format_hz(axes.high_hz);
    let gap = cols.saturating_sub(left.len() + right.len()).max(1);
    let _ = writeln!(text, "{left}{}{right}", " ".repeat(gap));
    text
}

/// Bar height in `[0, 1]` for each of `cols` columns.
///
/// Every column covers at least one slot, so narrow charts stretch.
pub fn column_levels(axes: &ChartAxes, slots: &[Option<ChartPoint>], cols: usize) -> Vec<f64> {
    let mut levels = vec![0.0f64; cols];
    let len = slots.len();
    if len == 0 || axes.height == 0 {
        return levels;
    }
    for (col, level) in levels.iter_mut().enumerate() {
        let start = (col * len / cols).min(len - 1);
        let end = ((col + 1) * len / cols).clamp(start + 1, len);
        *level = slots[start..end]
            .iter()
            .flatten()
            .map(|point| point_level(axes, point))
            .fold(0.0, f64::max);
    }
    levels
}

fn point_level(axes: &ChartAxes, point: &ChartPoint) -> f64 {
    let y = axes.magnitude_y(point.magnitude);
    if y.is_finite() {
        (1.0 - y / axes.height as f64).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn format_hz(hz: f64) -> String {
    if hz >= 1000.0 {
        format!("{:.1} kHz", hz / 1000.0)
    } else {
        format!("{hz:.0} Hz")
    }
}

/// Renderer that draws every chart straight to a writer.
pub struct TerminalRenderer<W> {
    out: W,
    label: String,
    cols: usize,
    rows: usize,
    clear: bool,
    frames: u64,
}

impl<W: Write + Send> TerminalRenderer<W> {
    /// Creates a renderer writing `cols` x `rows` charts to `out`.
    pub fn new(out: W, label: impl Into<String>, cols: usize, rows: usize) -> Self {
        Self {
            out,
            label: label.into(),
            cols,
            rows,
            clear: false,
            frames: 0,
        }
    }

    /// Clears the screen before each chart.
    pub fn clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }
}

impl<W: Write + Send> SpectrumRenderer for TerminalRenderer<W> {
    fn render(&mut self, axes: &ChartAxes, slots: &[Option<ChartPoint>]) {
        self.frames += 1;
        let chart = draw_chart(axes, slots, self.cols, self.rows);
        let prefix = if self.clear { CLEAR } else { "" };
        let result = write!(
            self.out,
            "{prefix}{} (frame {})\n{chart}",
            self.label, self.frames
        )
        .and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::debug!(error = %e, "terminal write failed");
        }
    }
}

/// One chart handed from the audio thread to the display thread.
#[derive(Debug, Clone)]
pub struct ChartFrame {
    /// Spectrum stage that produced the chart.
    pub stage: Arc<str>,
    /// Axis metadata.
    pub axes: ChartAxes,
    /// Slot values.
    pub slots: Vec<Option<ChartPoint>>,
}

impl ChartFrame {
    /// Draws the frame as a text chart.
    pub fn draw(&self, cols: usize, rows: usize) -> String {
        draw_chart(&self.axes, &self.slots, cols, rows)
    }
}

/// Renderer that publishes charts over a bounded channel without blocking.
///
/// Frames are dropped when the display falls behind. Slot buffers come
/// back through a recycle channel, and a rejected frame's buffer is kept
/// for the next render, so steady state does not allocate.
pub struct ChannelRenderer {
    stage: Arc<str>,
    tx: Sender<ChartFrame>,
    recycle: Receiver<Vec<Option<ChartPoint>>>,
    spare: Vec<Option<ChartPoint>>,
    dropped: Arc<AtomicU64>,
}

impl ChannelRenderer {
    /// Creates a renderer for `stage`.
    pub fn new(
        stage: impl Into<Arc<str>>,
        tx: Sender<ChartFrame>,
        recycle: Receiver<Vec<Option<ChartPoint>>>,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            stage: stage.into(),
            tx,
            recycle,
            spare: Vec::new(),
            dropped,
        }
    }
}

impl SpectrumRenderer for ChannelRenderer {
    fn render(&mut self, axes: &ChartAxes, slots: &[Option<ChartPoint>]) {
        let mut buf = self
            .recycle
            .try_recv()
            .unwrap_or_else(|_| std::mem::take(&mut self.spare));
        buf.clear();
        buf.extend_from_slice(slots);
        let frame = ChartFrame {
            stage: Arc::clone(&self.stage),
            axes: *axes,
            slots: buf,
        };
        match self.tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(frame) | TrySendError::Disconnected(frame)) => {
                self.spare = frame.slots;
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
