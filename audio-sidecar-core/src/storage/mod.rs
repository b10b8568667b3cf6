pub mod summary;
pub mod transcoder;
pub mod wav_writer;
