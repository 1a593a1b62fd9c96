use std::io::{self, Write};

use ratatui::crossterm::clipboard::CopyToClipboard;
use ratatui::crossterm::execute;
use tracing::debug;

use crate::error::{AppError, Result};

/// Destination for copied text.
pub trait Clipboard {
    fn copy_text(&mut self, text: &str) -> Result<()>;
}

/// Copies through the terminal with an OSC 52 escape sequence, which works
/// over SSH and inside multiplexers that forward it.
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl Osc52Clipboard<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        execute!(self.out, CopyToClipboard::to_clipboard_from(text))
            .map_err(|err| AppError::Clipboard(err.to_string()))?;
        debug!(len = text.len(), "copied to clipboard");
        Ok(())
    }
}

/// Clipboard that records what it was given. Clones share the record.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingClipboard {
    copied: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingClipboard {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn copied(&self) -> Vec<String> {
        self.copied.borrow().clone()
    }
}

#[cfg(test)]
impl Clipboard for RecordingClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        if self.fail {
            return Err(AppError::Clipboard("clipboard unavailable".into()));
        }
        self.copied.borrow_mut().push(text.to_string());
        Ok(())
    }
}
