use tracing::debug;

/// Append-only byte pool that reuses any existing exact occurrence of a
/// sequence instead of appending it again.
#[derive(Debug, Clone)]
pub struct BytePool {
    name: &'static str,
    bytes: Vec<u8>,
    saved: usize,
}

impl BytePool {
    pub fn new(name: &'static str) -> Self {
        Self { name, bytes: Vec::new(), saved: 0 }
    }

    /// Lowest offset at which `needle` occurs. The empty sequence occurs at 0.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        self.bytes.windows(needle.len()).position(|w| w == needle)
    }

    /// Offset of `needle` in the pool, appending it only when absent.
    pub fn place(&mut self, needle: &[u8]) -> usize {
        if let Some(offset) = self.find(needle) {
            if !needle.is_empty() {
                self.saved += needle.len();
                debug!(pool = self.name, offset, bytes = needle.len(), "reused bytes");
            }
            return offset;
        }
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(needle);
        offset
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes that did not need appending thanks to reuse.
    pub fn saved(&self) -> usize {
        self.saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_new_and_reuses_existing() {
        let mut pool = BytePool::new("vertex");
        assert_eq!(pool.place(&[1, 3, 0x43]), 0);
        assert_eq!(pool.place(&[4, 5]), 3);
        // spans the boundary of two earlier sequences
        assert_eq!(pool.place(&[0x43, 4]), 2);
        assert_eq!(pool.place(&[3, 0x43]), 1);
        assert_eq!(pool.as_slice(), &[1, 3, 0x43, 4, 5]);
        assert_eq!(pool.saved(), 4);
    }

    #[test]
    fn lowest_offset_wins() {
        let mut pool = BytePool::new("normal");
        pool.place(&[0, 0, 1]);
        pool.place(&[7, 0, 0]);
        assert_eq!(pool.find(&[0, 0]), Some(0));
        assert_eq!(pool.find(&[1, 7, 0]), Some(2));
        assert_eq!(pool.find(&[9]), None);
    }

    #[test]
    fn empty_sequence_never_grows_the_pool() {
        let mut pool = BytePool::new("portal");
        assert_eq!(pool.place(&[]), 0);
        pool.place(&[0xC0]);
        assert_eq!(pool.place(&[]), 0);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.saved(), 0);
    }

    #[test]
    fn needle_longer_than_pool() {
        let mut pool = BytePool::new("door");
        pool.place(&[0x60]);
        assert_eq!(pool.find(&[0x60, 0x00]), None);
        assert_eq!(pool.place(&[0x60, 0x00]), 1);
    }
}
