/// Incremental float to 16-bit mono conversion between the capture thread and
/// the polling thread.
///
/// ```text
/// capture thread                         polling thread
/// ConverterInput::push ─► SPSC ring (f32)  ─► StreamConverter::pull
///   (downmix to mono)  ─► SPSC ring (rate)      (resample, f32 to i16)
/// ```
///
/// Every change of source rate is queued as a marker carrying the sample
/// position it takes effect at, so audio already in the ring is resampled
/// at the rate it was captured with.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::models::audio_models::StreamSpec;

/// Samples moved out of the ring per `pop_slice` call.
const DRAIN_BLOCK: usize = 4096;

/// Rate changes that can be queued between two drains.
const RATE_MARKERS: usize = 16;

/// Source rate in effect from sample `position` (counted since start) onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RateMarker {
    position: u64,
    rate: u32,
}

/// Producer half, owned by the capture callback.
pub struct ConverterInput {
    producer: HeapProd<f32>,
    markers: HeapProd<RateMarker>,
    overruns: Arc<AtomicU64>,
    written: u64,
    rate: u32,
    mono: Vec<f32>,
}

impl ConverterInput {
    /// Push one interleaved buffer from the device. Never blocks; samples
    /// that do not fit in the ring are counted and discarded.
    pub fn push(&mut self, samples: &[f32], sample_rate: f64, channels: u16) {
        if samples.is_empty() {
            return;
        }

        let mono = if channels > 1 {
            downmix_to_mono_into(samples, channels as usize, &mut self.mono);
            &self.mono[..]
        } else {
            samples
        };

        let rate = sample_rate.round() as u32;
        if rate > 0 && rate != self.rate {
            let marker = RateMarker {
                position: self.written,
                rate,
            };
            if self.markers.try_push(marker).is_err() {
                // Without its marker the batch would be resampled at the wrong rate.
                self.overruns.fetch_add(mono.len() as u64, Ordering::Relaxed);
                return;
            }
            self.rate = rate;
        }

        let pushed = self.producer.push_slice(mono);
        self.written += pushed as u64;
        let lost = mono.len() - pushed;
        if lost > 0 {
            self.overruns.fetch_add(lost as u64, Ordering::Relaxed);
        }
    }
}

/// Consumer half: converts whatever the capture thread delivered so far.
pub struct StreamConverter {
    consumer: HeapCons<f32>,
    markers: HeapCons<RateMarker>,
    overruns: Arc<AtomicU64>,
    consumed: u64,
    source_rate: u32,
    resampler: LinearResampler,
    ready: VecDeque<i16>,
    scratch: Vec<f32>,
}

impl StreamConverter {
    /// Create a converter whose ring holds `ring_capacity` mono source samples.
    pub fn new(spec: StreamSpec, ring_capacity: usize) -> (ConverterInput, StreamConverter) {
        let (producer, consumer) = HeapRb::<f32>::new(ring_capacity.max(1)).split();
        let (marker_producer, marker_consumer) = HeapRb::<RateMarker>::new(RATE_MARKERS).split();
        let overruns = Arc::new(AtomicU64::new(0));

        let input = ConverterInput {
            producer,
            markers: marker_producer,
            overruns: Arc::clone(&overruns),
            written: 0,
            rate: 0,
            mono: Vec::new(),
        };
        let converter = StreamConverter {
            consumer,
            markers: marker_consumer,
            overruns,
            consumed: 0,
            source_rate: spec.sample_rate,
            resampler: LinearResampler::new(spec.sample_rate),
            ready: VecDeque::new(),
            scratch: vec![0.0; DRAIN_BLOCK],
        };
        (input, converter)
    }

    /// Return up to `max` converted samples. Zero means nothing is ready yet.
    pub fn pull(&mut self, max: usize) -> Vec<i16> {
        self.drain_ring();
        let count = max.min(self.ready.len());
        self.ready.drain(..count).collect()
    }

    /// Push samples held back for interpolation through conversion, so the
    /// tail of the capture is not lost. Call after the source has stopped.
    pub fn flush(&mut self) {
        self.drain_ring();
        let tail = self.resampler.flush();
        self.ready.extend(tail.iter().map(|&s| to_i16(s)));
    }

    /// Converted samples waiting to be pulled.
    pub fn available(&self) -> usize {
        self.ready.len()
    }

    /// Source samples delivered but not yet converted.
    pub fn pending(&self) -> usize {
        self.consumer.occupied_len() + self.resampler.held_back()
    }

    /// Source samples lost because the ring was full.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    fn drain_ring(&mut self) {
        loop {
            // Read the sample count first: every marker pushed before those
            // samples is then visible too.
            let occupied = self.consumer.occupied_len();
            if occupied == 0 {
                break;
            }

            while let Some(marker) = self.markers.try_peek().copied() {
                if marker.position > self.consumed {
                    break;
                }
                let _ = self.markers.try_pop();
                self.source_rate = marker.rate;
            }

            let mut limit = occupied.min(DRAIN_BLOCK);
            if let Some(next) = self.markers.try_peek() {
                limit = limit.min((next.position - self.consumed) as usize);
            }

            let read = self.consumer.pop_slice(&mut self.scratch[..limit]);
            if read == 0 {
                break;
            }
            self.consumed += read as u64;
            let converted = self.resampler.process(&self.scratch[..read], self.source_rate);
            self.ready.extend(converted.iter().map(|&s| to_i16(s)));
        }
    }
}

/// Streaming linear-interpolation resampler for mono audio.
///
/// Keeps the last source sample(s) between calls so interpolation is
/// continuous across buffer boundaries.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    target_rate: u32,
    source_rate: u32,
    carry: Vec<f32>,
    position: f64,
}

impl LinearResampler {
    pub fn new(target_rate: u32) -> Self {
        Self {
            target_rate,
            source_rate: target_rate,
            carry: Vec::new(),
            position: 0.0,
        }
    }

    /// Resample `samples` recorded at `source_rate` to the target rate.
    pub fn process(&mut self, samples: &[f32], source_rate: u32) -> Vec<f32> {
        let mut output = Vec::new();
        if source_rate != self.source_rate && source_rate > 0 {
            output.extend(self.flush());
            self.source_rate = source_rate;
        }

        if self.is_passthrough() && self.carry.is_empty() {
            output.extend_from_slice(samples);
            return output;
        }

        self.carry.extend_from_slice(samples);
        let step = self.step();
        loop {
            let index = self.position as usize;
            if index + 1 >= self.carry.len() {
                break;
            }
            let fraction = (self.position - index as f64) as f32;
            output.push(self.carry[index] * (1.0 - fraction) + self.carry[index + 1] * fraction);
            self.position += step;
        }

        let consumed = (self.position as usize).min(self.carry.len());
        self.carry.drain(..consumed);
        self.position -= consumed as f64;
        output
    }

    /// Emit everything still held back, holding the last sample where there
    /// is no right-hand neighbour.
    pub fn flush(&mut self) -> Vec<f32> {
        let mut output = Vec::new();
        let step = self.step();
        while (self.position as usize) < self.carry.len() {
            output.push(self.carry[self.position as usize]);
            self.position += step;
        }
        self.carry.clear();
        self.position = 0.0;
        output
    }

    /// Source samples kept for the next call.
    pub fn held_back(&self) -> usize {
        self.carry.len()
    }

    fn is_passthrough(&self) -> bool {
        self.source_rate == self.target_rate
    }

    fn step(&self) -> f64 {
        self.source_rate as f64 / self.target_rate as f64
    }
}

/// Convert a float sample in `[-1.0, 1.0]` to 16-bit, clamping out-of-range values.
pub fn to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    let mut mono = Vec::new();
    downmix_to_mono_into(samples, channels, &mut mono);
    mono
}

fn downmix_to_mono_into(samples: &[f32], channels: usize, mono: &mut Vec<f32>) {
    mono.clear();
    if channels <= 1 {
        mono.extend_from_slice(samples);
        return;
    }
    let scale = 1.0 / channels as f32;
    mono.extend(
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale),
    );
}
