/// Peak-per-bin waveform computation and bar layout.
///
/// The buffer's written range `[0, cursor)` is split into `bins` spans of
/// `cursor / bins` samples (truncating; trailing samples are not shown). Each
/// span collapses to its signed maximum. A zero-width span keeps the running
/// maximum at `i16::MIN`, so very early frames report the most negative peak.
use crate::traits::draw_surface::DrawSurface;

/// Default number of bars painted per frame.
pub const DEFAULT_BINS: usize = 100;

/// Samples per block in [`PeakIndex`].
pub const PEAK_BLOCK_LEN: usize = 1024;

/// Reference peak computation: rescans every written sample.
pub fn bin_peaks(samples: &[i16], bins: usize) -> Vec<i16> {
    if bins == 0 {
        return Vec::new();
    }
    let span = samples.len() / bins;
    (0..bins)
        .map(|i| span_peak(&samples[i * span..(i + 1) * span]))
        .collect()
}

fn span_peak(samples: &[i16]) -> i16 {
    samples.iter().copied().fold(i16::MIN, i16::max)
}

/// Block maxima maintained as samples are appended.
///
/// Answers range-peak queries from whole blocks plus a scan of the ragged
/// edges, so a frame costs `O(cursor / PEAK_BLOCK_LEN + bins * PEAK_BLOCK_LEN)`
/// instead of `O(cursor)`.
#[derive(Debug, Clone)]
pub struct PeakIndex {
    block_len: usize,
    block_peaks: Vec<i16>,
    running_peak: i16,
    running_len: usize,
}

impl PeakIndex {
    pub fn new(block_len: usize) -> Self {
        assert!(block_len > 0, "block length must be non-zero");
        Self {
            block_len,
            block_peaks: Vec::new(),
            running_peak: i16::MIN,
            running_len: 0,
        }
    }

    /// Account for samples appended to the indexed buffer.
    pub fn extend(&mut self, appended: &[i16]) {
        for &sample in appended {
            self.running_peak = self.running_peak.max(sample);
            self.running_len += 1;
            if self.running_len == self.block_len {
                self.block_peaks.push(self.running_peak);
                self.running_peak = i16::MIN;
                self.running_len = 0;
            }
        }
    }

    /// Number of samples indexed so far.
    pub fn len(&self) -> usize {
        self.block_peaks.len() * self.block_len + self.running_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Peak of `samples[start..end]`; `samples` must be the indexed buffer.
    pub fn range_peak(&self, samples: &[i16], start: usize, end: usize) -> i16 {
        debug_assert_eq!(samples.len(), self.len());
        if end <= start {
            return i16::MIN;
        }
        let first_block = start.div_ceil(self.block_len);
        let last_block = end / self.block_len;
        if first_block >= last_block {
            return span_peak(&samples[start..end]);
        }

        let head = span_peak(&samples[start..first_block * self.block_len]);
        let body = span_peak(&self.block_peaks[first_block..last_block]);
        let tail = span_peak(&samples[last_block * self.block_len..end]);
        head.max(body).max(tail)
    }

    /// Same partition and result as [`bin_peaks`].
    pub fn bin_peaks(&self, samples: &[i16], bins: usize) -> Vec<i16> {
        if bins == 0 {
            return Vec::new();
        }
        let span = samples.len() / bins;
        (0..bins)
            .map(|i| self.range_peak(samples, i * span, (i + 1) * span))
            .collect()
    }
}

impl Default for PeakIndex {
    fn default() -> Self {
        Self::new(PEAK_BLOCK_LEN)
    }
}

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// One painted bar. `h` is not clamped; it is negative for a negative peak
/// and exceeds the area height for peaks above half scale.
pub type Bar = Rect;

/// Lays out peaks as bars inside a fixed drawing area.
#[derive(Debug, Clone)]
pub struct WaveformRenderer {
    pub bins: usize,
    pub area: Rect,
}

impl WaveformRenderer {
    pub fn new(bins: usize, area: Rect) -> Self {
        Self { bins, area }
    }

    /// Bar height for a peak: linear in `peak / (i16::MAX / 2)`.
    pub fn bar_height(&self, peak: i16) -> i32 {
        peak as i32 * self.area.h / (i16::MAX as i32 / 2)
    }

    pub fn bars(&self, peaks: &[i16]) -> Vec<Bar> {
        let width = if self.bins == 0 { 0 } else { self.area.w / self.bins as i32 };
        peaks
            .iter()
            .enumerate()
            .map(|(i, &peak)| Rect {
                x: self.area.x + width * i as i32,
                y: self.area.y,
                w: width,
                h: self.bar_height(peak),
            })
            .collect()
    }

    /// Paint one frame: background area, then every bar.
    pub fn paint<S: DrawSurface + ?Sized>(&self, peaks: &[i16], surface: &mut S, status: &str) {
        surface.clear();
        surface.fill_background(&self.area);
        for bar in self.bars(peaks) {
            surface.fill_bar(&bar);
        }
        surface.present(status);
    }
}

impl Default for WaveformRenderer {
    fn default() -> Self {
        Self::new(
            DEFAULT_BINS,
            Rect {
                x: 100,
                y: 100,
                w: 440,
                h: 300,
            },
        )
    }
}
