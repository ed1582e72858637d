use super::command::Outcome;
use crate::error::Result;
use std::io::Write;

/// Writes outcomes as JSON lines.
pub struct OutcomeWriter<W: Write> {
    writer: W,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serializes one outcome and terminates it with a newline.
    pub fn write_outcome(&mut self, outcome: &Outcome) -> Result<()> {
        serde_json::to_writer(&mut self.writer, outcome)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
