//! Byte chunk FIFOs between serial and radio

use heapless::Deque;

use crate::packet::MAX_PAYLOAD_LEN;

/// Payload of a single data packet
pub type Chunk = heapless::Vec<u8, MAX_PAYLOAD_LEN>;

/// Default number of chunks buffered in each direction
pub const QUEUE_DEPTH: usize = 16;

/// Chunks read from serial waiting for transmission
pub type OutboundQueue = ChunkQueue<QUEUE_DEPTH>;
/// Accepted payloads waiting to be written to serial
pub type InboundQueue = ChunkQueue<QUEUE_DEPTH>;

/// Queue is full, the rejected chunk is handed back
#[derive(PartialEq, Eq, Debug)]
pub struct Full(pub Chunk);

/// Bounded FIFO of whole chunks; a chunk is never split or merged
pub struct ChunkQueue<const N: usize> {
    chunks: Deque<Chunk, N>,
}

impl<const N: usize> Default for ChunkQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChunkQueue<N> {
    pub const fn new() -> Self {
        Self { chunks: Deque::new() }
    }

    pub fn push(&mut self, chunk: Chunk) -> Result<(), Full> {
        self.chunks.push_back(chunk).map_err(Full)
    }

    /// Copy `data` into a new chunk and push it
    ///
    /// Returns `false` if `data` is longer than a chunk or there is no space.
    pub fn push_slice(&mut self, data: &[u8]) -> bool {
        match Chunk::from_slice(data) {
            Ok(chunk) => self.push(chunk).is_ok(),
            Err(_) => false,
        }
    }

    pub fn pop(&mut self) -> Option<Chunk> {
        self.chunks.pop_front()
    }

    pub fn front(&self) -> Option<&Chunk> {
        self.chunks.front()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.chunks.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}
