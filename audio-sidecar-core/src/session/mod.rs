pub mod device_selector;
pub mod output_path;
pub mod recording;
