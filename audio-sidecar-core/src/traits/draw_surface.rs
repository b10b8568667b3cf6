use crate::processing::waveform::{Bar, Rect};

/// Target of one waveform frame.
///
/// [`WaveformRenderer::paint`](crate::processing::waveform::WaveformRenderer::paint)
/// calls `clear`, `fill_background`, `fill_bar` once per bin, then `present`.
/// Coordinates are the renderer's own; a surface scales or clips them as it
/// sees fit.
pub trait DrawSurface {
    /// Fill the whole surface with the clear colour.
    fn clear(&mut self);

    /// Fill the waveform area with the background colour.
    fn fill_background(&mut self, area: &Rect);

    /// Fill one bar with the foreground colour.
    fn fill_bar(&mut self, bar: &Bar);

    /// Show the finished frame, with a one-line status.
    fn present(&mut self, status: &str);
}
