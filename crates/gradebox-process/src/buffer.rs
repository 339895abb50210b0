//! Accumulation buffer for child output.
//!
//! Raw reads land here in whatever chunks the pipe hands back; lines are
//! cut out at [`DELIMITER`]. Stored bytes always start at offset 0:
//! extracting a line shifts the remainder left instead of wrapping around.
//!
//! ## Growth
//!
//! When an append does not fit, capacity grows to the larger of twice the
//! current capacity and exactly what the append needs. Nothing else is
//! reserved ahead of time.
//!
//! ## Scanning
//!
//! The buffer remembers how far it has already looked for a delimiter, so
//! a long line arriving in many chunks is scanned once, not once per chunk.

/// Line delimiter for child output.
pub const DELIMITER: u8 = b'\n';

/// Growable byte accumulator with delimiter-based extraction.
#[derive(Debug, Default)]
pub struct LineBuffer {
    data: Vec<u8>,
    /// Prefix of `data` known to hold no delimiter.
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn append(&mut self, bytes: &[u8]) {
        let needed = self.data.len() + bytes.len();
        if needed > self.data.capacity() {
            let target = needed.max(self.data.capacity() * 2);
            self.data.reserve_exact(target - self.data.len());
        }
        self.data.extend_from_slice(bytes);
    }

    /// Remove and return the first complete line, without its delimiter.
    pub fn extract_line(&mut self) -> Option<Vec<u8>> {
        let Some(offset) = self.data[self.scanned..].iter().position(|&b| b == DELIMITER) else {
            self.scanned = self.data.len();
            return None;
        };
        let pos = self.scanned + offset;
        let line = self.data[..pos].to_vec();
        self.data.drain(..=pos);
        self.scanned = 0;
        Some(line)
    }

    /// Remove and return everything left as one final line.
    ///
    /// Used once the stream is drained; an empty buffer yields `None`, so a
    /// trailing fragment is handed out exactly once.
    pub fn take_rest(&mut self) -> Option<Vec<u8>> {
        if self.data.is_empty() {
            return None;
        }
        self.scanned = 0;
        Some(self.data.drain(..).collect())
    }

    /// Drop the contents and give the allocation back.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.scanned = 0;
    }
}
