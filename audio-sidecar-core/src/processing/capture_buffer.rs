use super::waveform::PeakIndex;

/// Result of a saturating append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendOutcome {
    pub written: usize,
    pub dropped: usize,
}

/// Bounded, append-only session buffer of 16-bit samples.
///
/// The cursor is the number of samples written. Appends never grow the
/// buffer past `capacity`: whatever does not fit is dropped (newest audio is
/// lost, what was already captured is kept).
#[derive(Debug)]
pub struct CaptureBuffer {
    samples: Vec<i16>,
    capacity: usize,
    peaks: PeakIndex,
}

/// Initial allocation cap, so short sessions do not reserve the full hour.
const INITIAL_RESERVE: usize = 44_100 * 60;

impl CaptureBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::with_peak_index(capacity, PeakIndex::default())
    }

    pub fn with_peak_index(capacity: usize, peaks: PeakIndex) -> Self {
        Self {
            samples: Vec::with_capacity(capacity.min(INITIAL_RESERVE)),
            capacity,
            peaks,
        }
    }

    /// Append samples in order until the buffer is full.
    pub fn append(&mut self, samples: &[i16]) -> AppendOutcome {
        let room = self.remaining();
        let written = samples.len().min(room);
        let accepted = &samples[..written];
        self.samples.extend_from_slice(accepted);
        self.peaks.extend(accepted);
        AppendOutcome {
            written,
            dropped: samples.len() - written,
        }
    }

    /// Number of samples written so far.
    pub fn cursor(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.samples.len()
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The written range `[0, cursor)`.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Per-bin peaks of the written range, answered from the peak index.
    pub fn bin_peaks(&self, bins: usize) -> Vec<i16> {
        self.peaks.bin_peaks(&self.samples, bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::waveform;

    #[test]
    fn append_in_order() {
        let mut buf = CaptureBuffer::new(10);
        assert_eq!(buf.append(&[1, 2, 3]), AppendOutcome { written: 3, dropped: 0 });
        buf.append(&[4]);
        assert_eq!(buf.samples(), &[1, 2, 3, 4]);
        assert_eq!(buf.cursor(), 4);
        assert_eq!(buf.remaining(), 6);
    }

    #[test]
    fn overflow_drops_newest() {
        let mut buf = CaptureBuffer::new(4);
        buf.append(&[1, 2, 3]);
        let outcome = buf.append(&[4, 5, 6]);

        assert_eq!(outcome, AppendOutcome { written: 1, dropped: 2 });
        assert_eq!(buf.samples(), &[1, 2, 3, 4]);
        assert!(buf.is_full());
    }

    #[test]
    fn full_buffer_accepts_nothing() {
        let mut buf = CaptureBuffer::new(2);
        buf.append(&[1, 2]);
        assert_eq!(buf.append(&[3]), AppendOutcome { written: 0, dropped: 1 });
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn cursor_never_exceeds_capacity() {
        let mut buf = CaptureBuffer::new(1000);
        let chunk: Vec<i16> = (0..377).map(|i| i as i16).collect();
        for _ in 0..10 {
            buf.append(&chunk);
            assert!(buf.cursor() <= buf.capacity());
        }
        assert_eq!(buf.cursor(), 1000);
    }

    #[test]
    fn capacity_plus_one_keeps_capacity() {
        let mut buf = CaptureBuffer::new(100);
        let samples: Vec<i16> = (0..101).collect();
        let outcome = buf.append(&samples);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(buf.samples(), &samples[..100]);
    }

    #[test]
    fn zero_capacity_buffer() {
        let mut buf = CaptureBuffer::new(0);
        assert_eq!(buf.append(&[1]), AppendOutcome { written: 0, dropped: 1 });
        assert!(buf.is_empty());
        assert!(buf.is_full());
    }

    #[test]
    fn peaks_track_only_written_samples() {
        let mut buf = CaptureBuffer::new(200);
        let quiet = vec![10i16; 150];
        let loud = vec![i16::MAX; 100];
        buf.append(&quiet);
        buf.append(&loud);

        assert_eq!(buf.bin_peaks(2), waveform::bin_peaks(buf.samples(), 2));
        assert_eq!(buf.bin_peaks(2), vec![10, i16::MAX]);
    }
}
