pub mod capture_buffer;
pub mod stream_converter;
pub mod wav_format;
pub mod waveform;
