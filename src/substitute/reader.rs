use std::io::{self, BufRead, BufReader, Read};

use super::{Encoding, VariableSubstitutor};
use crate::Snapshot;

/// Forward-only [`Read`] adapter that substitutes variables in the wrapped
/// byte stream, line by line.
///
/// Variable values are read once, when the reader is created. Created by
/// [`VariableSubstitutor::reader()`].
#[derive(Debug)]
pub struct SubstitutingReader<'s, R> {
    substitutor: &'s VariableSubstitutor,
    snapshot: Snapshot,
    encoding: Encoding,
    inner: BufReader<R>,
    line: Vec<u8>,
    pending: Vec<u8>,
    pos: usize,
}

impl<'s, R: Read> SubstitutingReader<'s, R> {
    pub(crate) fn new(substitutor: &'s VariableSubstitutor, input: R, encoding: Encoding) -> Self {
        Self {
            substitutor,
            snapshot: substitutor.store().snapshot(),
            encoding,
            inner: BufReader::new(input),
            line: Vec::new(),
            pending: Vec::new(),
            pos: 0,
        }
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Unwrap the underlying reader. Buffered but unread input is lost.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    /// Refill `pending` with the next substituted line. `false` at end of input.
    fn fill(&mut self) -> io::Result<bool> {
        self.line.clear();
        if self.inner.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(false);
        }
        let text = self.encoding.decode(&self.line)?;
        let replaced = self.substitutor.substitute_in(&text, &self.snapshot);
        self.pending.clear();
        self.pending.extend_from_slice(&self.encoding.encode(&replaced));
        self.pos = 0;
        Ok(true)
    }
}

impl<R: Read> Read for SubstitutingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.pending.len() {
            if !self.fill()? {
                return Ok(0);
            }
        }
        let available = &self.pending[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}
