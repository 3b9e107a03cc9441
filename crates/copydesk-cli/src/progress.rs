use std::io::{self, Write};

use copydesk::types::GenerationEvent;

/// Renders live generation progress: status lines, then the streamed text
pub struct ProgressPrinter<W: Write> {
    out: W,
    last_status: Option<String>,
    mid_line: bool,
}

impl<W: Write> ProgressPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_status: None,
            mid_line: false,
        }
    }

    pub fn on_event(&mut self, event: &GenerationEvent) -> io::Result<()> {
        match event {
            GenerationEvent::Status { status, agent } => {
                let message = status.message().to_string();
                if self.last_status.as_deref() == Some(message.as_str()) {
                    return Ok(());
                }
                self.end_line()?;
                match agent {
                    Some(agent) => writeln!(self.out, "[{}] {}", agent, message)?,
                    None => writeln!(self.out, "{}", message)?,
                }
                self.last_status = Some(message);
            }
            GenerationEvent::Chunk { content } => {
                if !content.is_empty() {
                    write!(self.out, "{}", content)?;
                    self.mid_line = !content.ends_with('\n');
                }
            }
            GenerationEvent::Done { .. } => {
                self.end_line()?;
                writeln!(self.out, "Done.")?;
            }
            // reported from the settled outcome
            GenerationEvent::Error { .. } => self.end_line()?,
        }
        self.out.flush()
    }

    /// Finish a partially printed line, e.g. after a cancel
    pub fn end_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
