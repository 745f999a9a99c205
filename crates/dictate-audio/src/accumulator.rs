/// Byte buffer holding the tail of the capture subprocess's stdout that has
/// not yet formed a complete chunk (spec §3 Audio Accumulator). Never
/// exposed outside the pipeline; `take_ready_chunks` slices off exactly
/// `chunk_bytes`-sized pieces from the front, leaving any remainder in
/// place, which is what guarantees uniform chunk size.
#[derive(Default)]
pub struct Accumulator {
    buf: Vec<u8>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Slices off as many `chunk_bytes`-sized chunks as the buffer currently
    /// holds, in order, leaving the remainder (< `chunk_bytes`) buffered.
    pub fn take_ready_chunks(&mut self, chunk_bytes: usize) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        while self.buf.len() >= chunk_bytes {
            let rest = self.buf.split_off(chunk_bytes);
            chunks.push(std::mem::replace(&mut self.buf, rest));
        }
        chunks
    }

    /// Flush whatever remains (< `chunk_bytes`) as one short final chunk, or
    /// `None` if nothing is buffered (spec §4.2 stop_session step 1).
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_exact_size_chunks_in_order() {
        let mut acc = Accumulator::new();
        acc.push(&[0u8; 10]);
        acc.push(&[1u8; 10]);
        acc.push(&[2u8; 5]);
        let chunks = acc.take_ready_chunks(10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], vec![0u8; 10]);
        assert_eq!(chunks[1], vec![1u8; 10]);
        assert_eq!(acc.len(), 5);
    }

    #[test]
    fn flush_returns_none_when_empty() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.flush(), None);
    }

    #[test]
    fn flush_returns_remainder_as_short_chunk() {
        let mut acc = Accumulator::new();
        acc.push(&[9u8; 3]);
        assert_eq!(acc.flush(), Some(vec![9u8; 3]));
        assert!(acc.is_empty());
    }

    #[test]
    fn round_trip_chunking_preserves_all_bytes() {
        let mut acc = Accumulator::new();
        let input: Vec<u8> = (0..=255u8).cycle().take(10_037).collect();
        acc.push(&input);
        let mut reassembled = Vec::new();
        for chunk in acc.take_ready_chunks(4_096) {
            reassembled.extend(chunk);
        }
        if let Some(tail) = acc.flush() {
            reassembled.extend(tail);
        }
        assert_eq!(reassembled, input);
    }
}
