/// Terminal rendition of the waveform: one block glyph per bin on a single
/// redrawn line of stderr.
use std::io::{self, Write};
use std::time::Duration;

use audio_sidecar_core::processing::waveform::{Bar, Rect};
use audio_sidecar_core::traits::draw_surface::DrawSurface;

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Draws bars as block glyphs. Heights are truncated to the area: negative
/// heights (no data yet) are blank and anything at or above the area height
/// is a full block.
pub struct TerminalSurface<W: Write = io::Stderr> {
    out: W,
    area: Rect,
    columns: String,
    last_line: String,
}

impl TerminalSurface {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            area: Rect { x: 0, y: 0, w: 0, h: 0 },
            columns: String::new(),
            last_line: String::new(),
        }
    }

    /// Move past the waveform line so later output starts clean.
    pub fn finish(&mut self) {
        if !self.last_line.is_empty() {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
    }

    fn glyph(&self, height: i32) -> char {
        if height < 0 || self.area.h <= 0 {
            return ' ';
        }
        let level = (height as i64 * LEVELS.len() as i64 / self.area.h as i64) as usize;
        LEVELS[level.min(LEVELS.len() - 1)]
    }
}

impl<W: Write> DrawSurface for TerminalSurface<W> {
    fn clear(&mut self) {
        self.columns.clear();
    }

    fn fill_background(&mut self, area: &Rect) {
        self.area = *area;
    }

    fn fill_bar(&mut self, bar: &Bar) {
        let glyph = self.glyph(bar.h);
        self.columns.push(glyph);
    }

    fn present(&mut self, status: &str) {
        let line = format!("{} {}", self.columns, status);
        if line == self.last_line {
            return;
        }
        // Carriage return plus erase-to-end-of-line redraws in place.
        if write!(self.out, "\r{}\x1b[K", line).and_then(|_| self.out.flush()).is_ok() {
            self.last_line = line;
        }
    }
}

/// Record time as shown next to the waveform: `4.2s`, `3m 7.0s`, `1h 2m 3.0s`.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();

    let minutes = (seconds / 60.0).floor();
    let seconds = seconds % 60.0;

    let hours = (minutes / 60.0).floor();
    let minutes = minutes % 60.0;

    if hours > 0.0 {
        format!("{}h {}m {:.1}s", hours, minutes, seconds)
    } else if minutes > 0.0 {
        format!("{}m {:.1}s", minutes, seconds)
    } else {
        format!("{:.1}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_sidecar_core::processing::waveform::WaveformRenderer;

    fn rendered(peaks: &[i16]) -> String {
        let renderer = WaveformRenderer::new(peaks.len(), Rect { x: 0, y: 0, w: 80, h: 300 });
        let mut surface = TerminalSurface::new(Vec::new());
        renderer.paint(peaks, &mut surface, "1.0s");
        String::from_utf8(surface.out).unwrap()
    }

    #[test]
    fn heights_are_truncated_to_the_area() {
        let line = rendered(&[i16::MIN, 0, i16::MAX / 4, i16::MAX / 2, i16::MAX]);
        assert_eq!(line, "\r ▁▄██ 1.0s\x1b[K");
    }

    #[test]
    fn identical_frames_are_not_rewritten() {
        let renderer = WaveformRenderer::new(2, Rect { x: 0, y: 0, w: 10, h: 100 });
        let mut surface = TerminalSurface::new(Vec::new());
        renderer.paint(&[0, 0], &mut surface, "0.0s");
        let first = surface.out.len();
        renderer.paint(&[0, 0], &mut surface, "0.0s");
        assert_eq!(surface.out.len(), first);
        renderer.paint(&[0, 0], &mut surface, "0.1s");
        assert!(surface.out.len() > first);
    }

    #[test]
    fn formats_record_time() {
        assert_eq!(format_duration(Duration::from_millis(4_200)), "4.2s");
        assert_eq!(format_duration(Duration::from_secs(187)), "3m 7.0s");
        assert_eq!(format_duration(Duration::from_secs(3_723)), "1h 2m 3.0s");
    }
}
