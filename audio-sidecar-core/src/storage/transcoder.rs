use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

/// How often a timed encoder run checks whether the child has exited.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// External encoder invocation, as an argument vector with placeholders.
///
/// Arguments are passed to the program directly, never through a shell, so
/// paths containing quotes or spaces need no escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EncoderCommand {
    /// Replaced by the intermediate WAV path.
    pub const INPUT: &'static str = "{input}";
    /// Replaced by the archive path.
    pub const OUTPUT: &'static str = "{output}";
    /// Replaced by the stream sample rate in Hz.
    pub const RATE: &'static str = "{rate}";

    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Arguments with every placeholder substituted.
    pub fn expand_args(&self, input: &Path, output: &Path, sample_rate: u32) -> Vec<OsString> {
        let rate = sample_rate.to_string();
        self.args
            .iter()
            .map(|arg| match arg.as_str() {
                Self::INPUT => input.as_os_str().to_owned(),
                Self::OUTPUT => output.as_os_str().to_owned(),
                _ => OsString::from(
                    arg.replace(Self::INPUT, &input.to_string_lossy())
                        .replace(Self::OUTPUT, &output.to_string_lossy())
                        .replace(Self::RATE, &rate),
                ),
            })
            .collect()
    }

    /// Build the process. Stdin is closed so the encoder can never block
    /// on a prompt.
    pub fn command(&self, input: &Path, output: &Path, sample_rate: u32) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.expand_args(input, output, sample_rate))
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        cmd
    }

    /// Human-readable command line for logs.
    pub fn describe(&self, input: &Path, output: &Path, sample_rate: u32) -> String {
        let mut line = self.program.clone();
        for arg in self.expand_args(input, output, sample_rate) {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

impl Default for EncoderCommand {
    /// `ffmpeg -y -i {input} -af aformat=s16:{rate} -compression_level 12 {output}`
    fn default() -> Self {
        Self::new(
            "ffmpeg",
            [
                "-y",
                "-i",
                Self::INPUT,
                "-af",
                "aformat=s16:{rate}",
                "-compression_level",
                "12",
                Self::OUTPUT,
            ],
        )
    }
}

/// Result of one encoder run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranscodeOutcome {
    Succeeded,
    /// Exited unsuccessfully; `code` is `None` when killed by a signal.
    Failed { code: Option<i32> },
    TimedOut,
    SpawnFailed { reason: String },
}

impl TranscodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Runs the encoder once, synchronously, and reports how it ended.
#[derive(Debug, Clone, Default)]
pub struct Transcoder {
    command: EncoderCommand,
    timeout: Option<Duration>,
}

impl Transcoder {
    pub fn new(command: EncoderCommand, timeout: Option<Duration>) -> Self {
        Self { command, timeout }
    }

    /// Encode `input` into `output`. Blocks until the encoder exits, or
    /// until the timeout elapses and the encoder is killed.
    pub fn run(&self, input: &Path, output: &Path, sample_rate: u32) -> TranscodeOutcome {
        log::info!(
            "Running encoder: {}",
            self.command.describe(input, output, sample_rate)
        );

        let mut child = match self.command.command(input, output, sample_rate).spawn() {
            Ok(child) => child,
            Err(e) => {
                log::error!("Failed to spawn encoder {:?}: {}", self.command.program, e);
                return TranscodeOutcome::SpawnFailed { reason: e.to_string() };
            }
        };

        let status = match self.timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout),
            None => child.wait().map(Some),
        };

        let outcome = match status {
            Ok(Some(status)) if status.success() => TranscodeOutcome::Succeeded,
            Ok(Some(status)) => TranscodeOutcome::Failed { code: status.code() },
            Ok(None) => TranscodeOutcome::TimedOut,
            Err(e) => {
                log::error!("Failed to wait for encoder: {}", e);
                TranscodeOutcome::Failed { code: None }
            }
        };

        match &outcome {
            TranscodeOutcome::Succeeded => log::info!("Encoder finished: {}", output.display()),
            TranscodeOutcome::Failed { code } => log::warn!("Encoder exited with status {:?}", code),
            TranscodeOutcome::TimedOut => log::warn!("Encoder killed after {:?}", self.timeout),
            TranscodeOutcome::SpawnFailed { .. } => {}
        }
        outcome
    }
}

/// `Ok(None)` means the child was killed at the deadline.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            if let Err(e) = child.kill() {
                log::warn!("Failed to kill encoder: {}", e);
            }
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn paths() -> (PathBuf, PathBuf) {
        (PathBuf::from("/tmp/output.wav"), PathBuf::from("/home/me/talk-audio.flac"))
    }

    #[test]
    fn default_command_expands_placeholders() {
        let (input, output) = paths();
        let args = EncoderCommand::default().expand_args(&input, &output, 44_100);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "/tmp/output.wav",
                "-af",
                "aformat=s16:44100",
                "-compression_level",
                "12",
                "/home/me/talk-audio.flac"
            ]
        );
    }

    #[test]
    fn paths_with_quotes_stay_one_argument() {
        let input = PathBuf::from("/tmp/output.wav");
        let output = PathBuf::from("/home/me/it's a talk-audio.flac");
        let args = EncoderCommand::default().expand_args(&input, &output, 44_100);
        assert_eq!(args.last().unwrap(), output.as_os_str());
        assert_eq!(args.len(), 8);
    }

    #[test]
    fn embedded_placeholders_are_substituted() {
        let cmd = EncoderCommand::new("enc", ["--in={input}", "--out={output}"]);
        let (input, output) = paths();
        let line = cmd.describe(&input, &output, 48_000);
        assert_eq!(line, "enc --in=/tmp/output.wav --out=/home/me/talk-audio.flac");
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let transcoder = Transcoder::new(
            EncoderCommand::new("/nonexistent/encoder-binary", [EncoderCommand::INPUT]),
            None,
        );
        let (input, output) = paths();
        assert!(matches!(
            transcoder.run(&input, &output, 44_100),
            TranscodeOutcome::SpawnFailed { .. }
        ));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(TranscodeOutcome::Failed { code: Some(1) }).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["code"], 1);
        let json = serde_json::to_value(TranscodeOutcome::Succeeded).unwrap();
        assert_eq!(json["status"], "succeeded");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        #[test]
        fn zero_exit_is_success() {
            let (input, output) = paths();
            let transcoder = Transcoder::new(EncoderCommand::new("true", Vec::<String>::new()), None);
            assert_eq!(transcoder.run(&input, &output, 44_100), TranscodeOutcome::Succeeded);
        }

        #[test]
        fn non_zero_exit_is_failure() {
            let (input, output) = paths();
            let transcoder = Transcoder::new(EncoderCommand::new("false", Vec::<String>::new()), None);
            assert_eq!(
                transcoder.run(&input, &output, 44_100),
                TranscodeOutcome::Failed { code: Some(1) }
            );
        }

        #[test]
        fn slow_encoder_is_killed() {
            let (input, output) = paths();
            let transcoder = Transcoder::new(
                EncoderCommand::new("sleep", ["5"]),
                Some(Duration::from_millis(100)),
            );
            let started = Instant::now();
            assert_eq!(transcoder.run(&input, &output, 44_100), TranscodeOutcome::TimedOut);
            assert!(started.elapsed() < Duration::from_secs(4));
        }

        #[test]
        fn copy_encoder_produces_output() {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("in.wav");
            let output = dir.path().join("out.wav");
            std::fs::write(&input, b"RIFF").unwrap();

            let transcoder = Transcoder::new(
                EncoderCommand::new("cp", [EncoderCommand::INPUT, EncoderCommand::OUTPUT]),
                Some(Duration::from_secs(10)),
            );
            assert!(transcoder.run(&input, &output, 44_100).is_success());
            assert_eq!(std::fs::read(&output).unwrap(), b"RIFF");
        }
    }
}
