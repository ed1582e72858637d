use super::command::Command;
use crate::error::Result;
use std::io::{BufRead, BufReader, Read};

/// Reads commands from a JSON-lines source.
///
/// Blank lines and lines starting with `#` are skipped. Each remaining line
/// yields its own `Result`, so one malformed line does not end the stream.
pub struct CommandReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader.lines().filter_map(|line| match line {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    None
                } else {
                    Some(serde_json::from_str(line).map_err(Into::into))
                }
            }
            Err(e) => Some(Err(e.into())),
        })
    }
}
