//! Bounded walk over a RIFX-style container.
//!
//! Layout: every chunk is a 4-byte tag, a big-endian `u32` payload length and the payload. The
//! root chunk's payload begins with a 4-byte form type followed by a flat run of child chunks.
//! Children with an unregistered tag are skipped by length.

use std::iter::FusedIterator;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use byteorder::{BigEndian, ByteOrder};

use crate::container::signature::{ChunkRole, FourCc, SignatureRegistry};
use crate::foundation::config::ConvertConfig;
use crate::foundation::error::{AeplanError, AeplanResult};

/// Tag plus length field.
pub const CHUNK_HEADER_LEN: usize = 8;
/// Form type at the start of the root payload.
pub const FORM_TYPE_LEN: usize = 4;

/// A registered chunk: a borrowed view into the scanned buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Raw tag bytes.
    pub tag: FourCc,
    /// Role the registry assigns to `tag`.
    pub role: ChunkRole,
    /// Offset of the chunk header in the buffer.
    pub offset: usize,
    /// Declared payload length.
    pub length: u32,
    /// Payload bytes.
    pub payload: &'a [u8],
}

/// Cooperative cancellation flag, observed at chunk boundaries.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Scans observing this token stop at their next chunk boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Return `true` once [`CancelToken::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Validated root of a container, ready to iterate.
#[derive(Clone, Debug)]
pub struct ChunkScanner<'a> {
    buf: &'a [u8],
    registry: &'a SignatureRegistry,
    root_tag: FourCc,
    root_offset: usize,
    form_type: FourCc,
    body: Range<usize>,
    max_analysis_bytes: u64,
    timeout: Duration,
    cancel: Option<CancelToken>,
}

impl<'a> ChunkScanner<'a> {
    /// Check the byte-size ceiling and locate the root chunk.
    ///
    /// No chunk is read when the buffer exceeds `max_file_bytes`.
    pub fn new(buf: &'a [u8], config: &'a ConvertConfig) -> AeplanResult<Self> {
        let limits = &config.limits;
        let size = buf.len() as u64;
        if size > limits.max_file_bytes {
            return Err(AeplanError::SizeLimitExceeded {
                limit: "max_file_bytes",
                actual: size,
                max: limits.max_file_bytes,
            });
        }

        let registry = &config.signatures;
        let window = limits.root_search_window.min(buf.len());
        let (root_offset, root_tag) = find_root(buf, window, registry)
            .ok_or(AeplanError::UnsupportedFormat { searched: window })?;

        let header_end = root_offset + CHUNK_HEADER_LEN;
        if header_end > buf.len() {
            return Err(AeplanError::TruncatedChunk {
                tag: root_tag.to_string(),
                offset: root_offset,
                declared: CHUNK_HEADER_LEN as u64,
                available: (buf.len() - root_offset) as u64,
            });
        }
        let declared = BigEndian::read_u32(&buf[root_offset + 4..header_end]) as usize;
        let available = buf.len() - header_end;
        if declared > available || declared < FORM_TYPE_LEN {
            return Err(AeplanError::TruncatedChunk {
                tag: root_tag.to_string(),
                offset: root_offset,
                declared: declared as u64,
                available: available as u64,
            });
        }

        let mut form = [0u8; 4];
        form.copy_from_slice(&buf[header_end..header_end + FORM_TYPE_LEN]);
        let form_type = FourCc(form);
        tracing::debug!(
            offset = root_offset,
            tag = %root_tag,
            form = %form_type,
            length = declared,
            "located container root"
        );

        Ok(Self {
            buf,
            registry,
            root_tag,
            root_offset,
            form_type,
            body: header_end + FORM_TYPE_LEN..header_end + declared,
            max_analysis_bytes: limits.max_analysis_bytes,
            timeout: limits.timeout(),
            cancel: None,
        })
    }

    /// Observe `token` at every chunk boundary.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Tag the root was found under.
    pub fn root_tag(&self) -> FourCc {
        self.root_tag
    }

    /// Offset of the root chunk header.
    pub fn root_offset(&self) -> usize {
        self.root_offset
    }

    /// Form type declared by the root payload.
    pub fn form_type(&self) -> FourCc {
        self.form_type
    }

    /// Start a fresh pass over the root's children.
    ///
    /// Each call restarts from the first child with a new deadline and a zeroed inspection
    /// budget.
    pub fn chunks(&self) -> ChunkIter<'a> {
        ChunkIter {
            buf: self.buf,
            registry: self.registry,
            pos: self.body.start,
            end: self.body.end,
            inspected: (CHUNK_HEADER_LEN + FORM_TYPE_LEN) as u64,
            max_analysis_bytes: self.max_analysis_bytes,
            started: Instant::now(),
            timeout: self.timeout,
            cancel: self.cancel.clone(),
            done: false,
        }
    }

    /// Collect every registered child, stopping at the first error.
    pub fn scan_all(&self) -> AeplanResult<Vec<Chunk<'a>>> {
        self.chunks().collect()
    }
}

fn find_root(buf: &[u8], window: usize, registry: &SignatureRegistry) -> Option<(usize, FourCc)> {
    let roots: Vec<FourCc> = registry.root_tags().collect();
    if window < 4 {
        return None;
    }
    (0..=window - 4).find_map(|off| {
        let tag = FourCc([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]);
        roots.contains(&tag).then_some((off, tag))
    })
}

/// Lazy iterator over registered child chunks. Fused after the first error.
#[derive(Debug)]
pub struct ChunkIter<'a> {
    buf: &'a [u8],
    registry: &'a SignatureRegistry,
    pos: usize,
    end: usize,
    inspected: u64,
    max_analysis_bytes: u64,
    started: Instant,
    timeout: Duration,
    cancel: Option<CancelToken>,
    done: bool,
}

impl ChunkIter<'_> {
    /// Bytes counted against the analysis ceiling so far.
    pub fn inspected_bytes(&self) -> u64 {
        self.inspected
    }

    fn check_deadline(&self) -> AeplanResult<()> {
        let elapsed = self.started.elapsed();
        let cancelled = self.cancel.as_ref().is_some_and(CancelToken::is_cancelled);
        if cancelled || elapsed > self.timeout {
            return Err(AeplanError::Timeout {
                offset: self.pos,
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            });
        }
        Ok(())
    }

    fn charge(&mut self, bytes: u64) -> AeplanResult<()> {
        self.inspected = self.inspected.saturating_add(bytes);
        if self.inspected > self.max_analysis_bytes {
            return Err(AeplanError::SizeLimitExceeded {
                limit: "max_analysis_bytes",
                actual: self.inspected,
                max: self.max_analysis_bytes,
            });
        }
        Ok(())
    }
}

impl<'a> ChunkIter<'a> {
    fn advance(&mut self) -> AeplanResult<Option<Chunk<'a>>> {
        loop {
            if self.pos >= self.end {
                return Ok(None);
            }
            self.check_deadline()?;

            let remaining = self.end - self.pos;
            if remaining < CHUNK_HEADER_LEN {
                return Err(AeplanError::TruncatedChunk {
                    tag: "????".to_string(),
                    offset: self.pos,
                    declared: CHUNK_HEADER_LEN as u64,
                    available: remaining as u64,
                });
            }

            let buf = self.buf;
            let header = &buf[self.pos..self.pos + CHUNK_HEADER_LEN];
            let tag = FourCc([header[0], header[1], header[2], header[3]]);
            let length = BigEndian::read_u32(&header[4..]);
            let payload_start = self.pos + CHUNK_HEADER_LEN;
            let available = self.end - payload_start;
            if length as usize > available {
                return Err(AeplanError::TruncatedChunk {
                    tag: tag.to_string(),
                    offset: self.pos,
                    declared: u64::from(length),
                    available: available as u64,
                });
            }

            let offset = self.pos;
            let payload_end = payload_start + length as usize;
            self.pos = payload_end;

            match self.registry.role(tag) {
                Some(role) => {
                    self.charge(CHUNK_HEADER_LEN as u64 + u64::from(length))?;
                    return Ok(Some(Chunk {
                        tag,
                        role,
                        offset,
                        length,
                        payload: &buf[payload_start..payload_end],
                    }));
                }
                None => {
                    self.charge(CHUNK_HEADER_LEN as u64)?;
                    tracing::trace!(offset, tag = %tag, length, "skipping unregistered chunk");
                }
            }
        }
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = AeplanResult<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.advance();
        match &res {
            Ok(None) | Err(_) => self.done = true,
            Ok(Some(_)) => {}
        }
        res.transpose()
    }
}

impl FusedIterator for ChunkIter<'_> {}

#[cfg(test)]
#[path = "../../tests/unit/container/scanner.rs"]
mod tests;
