/// Growable byte queue used as the read/write cursor of a message.
///
/// Bytes are appended at the back and extracted from the front. Extraction
/// shifts the remainder down, so it costs O(remaining). Payloads are capped at
/// [`MAX_PACKET_SIZE`](super::MAX_PACKET_SIZE) so that is fine.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("requested {requested} bytes but only {available} available")]
    Underflow { requested: usize, available: usize },
    #[error("position {index} is outside the buffer (size {size})")]
    OutOfBounds { index: usize, size: usize },
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_capacity(n: usize) -> Self {
        Self { data: Vec::with_capacity(n) }
    }
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self { data: bytes.to_vec() }
    }
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
    pub fn push(&mut self, byte: u8) {
        self.data.push(byte);
    }
    pub fn pop_front(&mut self) -> Result<u8, BufferError> {
        let mut b = [0];
        self.extract_front(&mut b)?;
        Ok(b[0])
    }
    /// Fills `dst` from the front of the buffer. On underflow nothing is
    /// consumed and `dst` is left untouched.
    pub fn extract_front(&mut self, dst: &mut [u8]) -> Result<(), BufferError> {
        if dst.len() > self.data.len() {
            let err = BufferError::Underflow { requested: dst.len(), available: self.data.len() };
            log::error!("{err}");
            return Err(err);
        }
        dst.copy_from_slice(&self.data[..dst.len()]);
        self.data.drain(..dst.len());
        Ok(())
    }
    /// Patches a byte that was already written, e.g. the length header.
    pub fn overwrite_position(&mut self, index: usize, byte: u8) -> Result<(), BufferError> {
        match self.data.get_mut(index) {
            Some(b) => {
                *b = byte;
                Ok(())
            }
            None => {
                let err = BufferError::OutOfBounds { index, size: self.data.len() };
                log::error!("{err}, skipping");
                Err(err)
            }
        }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}
