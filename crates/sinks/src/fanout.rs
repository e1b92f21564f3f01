//! FanOut - duplicate every write to several writers

use std::io::{self, Write};

/// Writes each buffer to every inner writer
///
/// A failing writer does not stop the others; the first error is returned
/// once all writers have been tried.
pub struct FanOut {
    writers: Vec<Box<dyn Write + Send>>,
}

impl FanOut {
    pub fn new(writers: Vec<Box<dyn Write + Send>>) -> Self {
        Self { writers }
    }

    pub fn push(&mut self, writer: Box<dyn Write + Send>) {
        self.writers.push(writer);
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl Write for FanOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut first_err = None;
        for writer in &mut self.writers {
            if let Err(e) = writer.write_all(buf) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut first_err = None;
        for writer in &mut self.writers {
            if let Err(e) = writer.flush() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
