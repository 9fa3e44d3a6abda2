use std::io::{Read, Seek, SeekFrom};

const DEFAULT_BLOCK_SIZE: usize = 8192;

/// A block-buffered reader over a seekable binary input.
///
/// The underlying reader's own position moves in whole blocks; this layer
/// tracks the per-byte position itself, so [`ByteSource::tell`] always names
/// the offset of the next byte a read would return. A [`ByteSource::seek`]
/// invalidates the buffer and the next read refills it from the target
/// offset.
pub struct ByteSource<R: Read + Seek> {
    inner: R,
    blk_sz: usize,
    buf: Vec<u8>,
    pos: usize,
    offset: u64
}

impl<R: Read + Seek> ByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self::with_block_size(inner, DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(inner: R, blk_sz: usize) -> Self {
        assert!(blk_sz > 0);
        Self { inner, blk_sz, buf: Vec::new(), pos: 0, offset: 0 }
    }

    fn refill(&mut self) -> std::io::Result<bool> {
        self.buf.resize(self.blk_sz, 0);
        self.pos = 0;
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => {
                    self.buf.clear();
                    return Ok(false);
                },
                Ok(n) => {
                    self.buf.truncate(n);
                    return Ok(true);
                },
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err)
            }
        }
    }

    /// Returns the next byte, or `None` at the end of input.
    pub fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        if self.pos == self.buf.len() && !self.refill()? {
            return Ok(None);
        }
        let c = self.buf[self.pos];
        self.pos += 1;
        self.offset += 1;
        Ok(Some(c))
    }

    /// Returns exactly `n` bytes, spanning blocks as needed.
    ///
    /// If the input ends first this returns `None` and the position is left
    /// wherever the partial read stopped; callers recover with
    /// [`ByteSource::seek`]. A short read is never returned.
    pub fn read_bytes(&mut self, n: usize) -> std::io::Result<Option<Vec<u8>>> {
        let mut out = Vec::with_capacity(n.min(self.blk_sz));
        while out.len() < n {
            if self.pos == self.buf.len() && !self.refill()? {
                return Ok(None);
            }
            let take = (n - out.len()).min(self.buf.len() - self.pos);
            out.extend_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
            self.offset += take as u64;
        }
        Ok(Some(out))
    }

    /// Absolute offset of the next byte to be read.
    pub fn tell(&self) -> u64 {
        self.offset
    }

    pub fn seek(&mut self, offset: u64) -> std::io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.buf.clear();
        self.pos = 0;
        self.offset = offset;
        Ok(())
    }

    /// Total length of the input. Invalidates the buffer and leaves the
    /// position at the end; callers are expected to `seek` afterwards.
    pub fn stream_len(&mut self) -> std::io::Result<u64> {
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.buf.clear();
        self.pos = 0;
        self.offset = end;
        Ok(end)
    }
}
