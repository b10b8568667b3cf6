/// Line commands read from stdin on a background thread.
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Quit,
}

/// Map one input line to a command. Unknown input is ignored.
pub fn parse_line(line: &str) -> Option<Command> {
    match line.trim() {
        "" | "q" | "quit" => Some(Command::Quit),
        "p" | "pause" => Some(Command::TogglePause),
        _ => None,
    }
}

/// Read commands from `input` until it closes. End of input is a quit.
pub fn spawn_reader<R>(input: R) -> std::io::Result<Receiver<Command>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-commands".into())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!("Failed to read stdin: {}", e);
                        break;
                    }
                };
                match parse_line(&line) {
                    Some(command) => {
                        if tx.send(command).is_err() || command == Command::Quit {
                            return;
                        }
                    }
                    None => log::info!("Unknown command {:?}; 'p' pauses, Enter or 'q' stops", line.trim()),
                }
            }
            let _ = tx.send(Command::Quit);
        })?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line(""), Some(Command::Quit));
        assert_eq!(parse_line("q\r"), Some(Command::Quit));
        assert_eq!(parse_line(" p "), Some(Command::TogglePause));
        assert_eq!(parse_line("record"), None);
    }

    #[test]
    fn reader_forwards_until_quit() {
        let rx = spawn_reader(Cursor::new("p\nhello\np\n\np\n")).unwrap();
        let received: Vec<Command> = rx.iter().collect();
        assert_eq!(
            received,
            vec![Command::TogglePause, Command::TogglePause, Command::Quit]
        );
    }

    #[test]
    fn end_of_input_quits() {
        let rx = spawn_reader(Cursor::new("p")).unwrap();
        let received: Vec<Command> = rx.iter().collect();
        assert_eq!(received, vec![Command::TogglePause, Command::Quit]);
    }
}
