use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// In-memory stand-in for the serial link.
///
/// Replays queued device replies and records everything the host writes.
/// Reading past the queued replies behaves like a serial read timeout.
#[derive(Debug, Default)]
pub struct ScriptedLink {
    replies: VecDeque<u8>,
    written: Vec<u8>,
    /// Size of every individual write call, in order
    pub writes: Vec<usize>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: &[u8]) -> Self {
        let mut link = Self::new();
        link.queue(replies);
        link
    }

    pub fn queue(&mut self, replies: &[u8]) {
        self.replies.extend(replies);
    }

    /// Queues a well formed status reply carrying `code`.
    pub fn queue_status(&mut self, code: u8) {
        self.queue(&[code, 0xA5]);
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn unread(&self) -> usize {
        self.replies.len()
    }
}

impl Read for ScriptedLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.replies.is_empty() && !buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply queued"));
        }
        let n = buf.len().min(self.replies.len());
        for (slot, byte) in buf.iter_mut().zip(self.replies.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        self.writes.push(buf.len());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
