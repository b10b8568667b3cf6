use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;

use crate::models::audio_models::StreamSpec;
use crate::models::error::CaptureError;
use crate::processing::wav_format::max_wav_samples;
use crate::storage::transcoder::EncoderCommand;

/// Default location of the line-oriented config file.
pub const DEFAULT_CONFIG_PATH: &str = "./audio-sidecar-config";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "AUDIO_SIDECAR_CONFIG";

/// Log file written next to the console output unless `LogFile` says otherwise.
pub const DEFAULT_LOG_FILE: &str = "audioSidecar.log";

/// Longest session whose WAV size fields fit in 32 bits, in seconds.
pub fn max_session_secs() -> f64 {
    let spec = StreamSpec::default();
    spec.duration_of(max_wav_samples(&spec))
}

/// Which device wins when several enumerated names contain the fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    FirstMatch,
    #[default]
    LastMatch,
}

impl FromStr for MatchPolicy {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Self::FirstMatch),
            "last" => Ok(Self::LastMatch),
            other => Err(CaptureError::ConfigurationFailed(format!(
                "unknown match policy: {other}"
            ))),
        }
    }
}

/// What to do when the archive file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingFileStrategy {
    /// Overwrite it.
    #[default]
    Replace,
    /// Pick the next free `<prefix>-audio<N>.<ext>`.
    RenameToLast,
}

impl FromStr for ExistingFileStrategy {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "rename-to-last" => Ok(Self::RenameToLast),
            other => Err(CaptureError::ConfigurationFailed(format!(
                "unknown existing file strategy: {other}"
            ))),
        }
    }
}

/// Runtime configuration of a recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarConfig {
    /// Case-insensitive fragment of the input device name (None matches nothing).
    pub interface: Option<String>,

    pub match_policy: MatchPolicy,

    /// Default log filter for the binary (default: info).
    pub log_level: LevelFilter,

    /// File receiving a copy of every log line (None = console only).
    pub log_file: Option<PathBuf>,

    /// Upper bound on the session length; sizes the capture buffer.
    pub max_duration_secs: f64,

    /// Intermediate WAV handed to the encoder.
    pub temp_wav_path: PathBuf,

    /// Extension of the archive file (default: flac).
    pub output_extension: String,

    pub encoder: EncoderCommand,

    /// Kill the encoder after this long (None = wait forever).
    pub encoder_timeout: Option<Duration>,

    pub existing_file_strategy: ExistingFileStrategy,
}

impl SidecarConfig {
    /// Read and parse the config file at `path`.
    ///
    /// A missing or unreadable file is an error; the caller keeps defaults.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CaptureError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&text);
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }

    /// Config path from the environment, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Parse `Key value` lines. Comments start with `#`; unknown keys and
    /// invalid values are logged and leave the default in place.
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();
        let mut encoder_args: Option<Vec<String>> = None;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (line.trim(), ""),
            };

            match key {
                "Interface" => {
                    config.interface = if value.is_empty() { None } else { Some(value.to_string()) };
                }
                "MatchPolicy" => match value.parse() {
                    Ok(policy) => config.match_policy = policy,
                    Err(e) => log::warn!("Ignoring MatchPolicy: {}", e),
                },
                "LogLevel" => match value.parse() {
                    Ok(level) => config.log_level = level,
                    Err(_) => log::warn!("Ignoring LogLevel: unknown level {:?}", value),
                },
                "LogFile" => {
                    config.log_file = match value {
                        "" | "none" => None,
                        path => Some(PathBuf::from(path)),
                    };
                }
                "MaxDurationSecs" => match value.parse::<f64>() {
                    Ok(secs) if secs > 0.0 && secs.is_finite() => {
                        let limit = max_session_secs();
                        if secs > limit {
                            log::warn!(
                                "MaxDurationSecs {} exceeds the WAV size limit; using {:.0}",
                                secs,
                                limit
                            );
                        }
                        config.max_duration_secs = secs.min(limit);
                    }
                    _ => log::warn!("Ignoring MaxDurationSecs: {:?} is not a positive number", value),
                },
                "TempWav" if !value.is_empty() => config.temp_wav_path = PathBuf::from(value),
                "OutputExtension" => match value.trim_start_matches('.') {
                    "" => log::warn!("Ignoring OutputExtension: empty extension"),
                    ext => config.output_extension = ext.to_string(),
                },
                "Encoder" if !value.is_empty() => config.encoder.program = value.to_string(),
                "EncoderArgs" => {
                    let args: Vec<String> = value.split_whitespace().map(str::to_string).collect();
                    match check_encoder_args(&args) {
                        Ok(()) => encoder_args = Some(args),
                        Err(e) => log::warn!("Ignoring EncoderArgs: {}", e),
                    }
                }
                "EncoderTimeoutSecs" => match value.parse::<f64>() {
                    Ok(secs) if secs > 0.0 && secs.is_finite() => {
                        config.encoder_timeout = Some(Duration::from_secs_f64(secs));
                    }
                    _ => log::warn!("Ignoring EncoderTimeoutSecs: {:?} is not a positive number", value),
                },
                "ExistingFileStrategy" => match value.parse() {
                    Ok(strategy) => config.existing_file_strategy = strategy,
                    Err(e) => log::warn!("Ignoring ExistingFileStrategy: {}", e),
                },
                other => log::debug!("Ignoring config line with key {:?}", other),
            }
        }

        if let Some(args) = encoder_args {
            config.encoder.args = args;
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_duration_secs > 0.0) {
            return Err("max duration must be positive".into());
        }
        if self.max_duration_secs > max_session_secs() {
            return Err(format!(
                "max duration must not exceed {:.0}s, the largest WAV file",
                max_session_secs()
            ));
        }
        if self.output_extension.is_empty() {
            return Err("output extension must not be empty".into());
        }
        if self.encoder.program.is_empty() {
            return Err("encoder program must not be empty".into());
        }
        check_encoder_args(&self.encoder.args)
    }
}

fn check_encoder_args(args: &[String]) -> Result<(), String> {
    for placeholder in [EncoderCommand::INPUT, EncoderCommand::OUTPUT] {
        if !args.iter().any(|a| a.contains(placeholder)) {
            return Err(format!("encoder arguments must reference {}", placeholder));
        }
    }
    Ok(())
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            interface: None,
            match_policy: MatchPolicy::default(),
            log_level: LevelFilter::Info,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            max_duration_secs: 60.0 * 60.0,
            temp_wav_path: PathBuf::from("/tmp/output.wav"),
            output_extension: "flac".into(),
            encoder: EncoderCommand::default(),
            encoder_timeout: None,
            existing_file_strategy: ExistingFileStrategy::default(),
        }
    }
}
