// rust/feed-core/src/dataset/cursor.rs

/// A cursor over `0..len` that wraps back to the start instead of ending.
///
/// The cursor starts before the first index; the first [`advance`] yields 0.
///
/// [`advance`]: CyclicCursor::advance
#[derive(Debug, Clone)]
pub struct CyclicCursor {
    len: usize,
    position: Option<usize>,
    wraps: u64,
}

impl CyclicCursor {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            position: None,
            wraps: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The index returned by the last [`advance`](Self::advance), if any.
    pub fn current_index(&self) -> Option<usize> {
        self.position
    }

    /// Move to the next index and return it.
    ///
    /// Returns `None` only when the cursor covers no indices.
    pub fn advance(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }

        let next = match self.position {
            None => 0,
            Some(pos) if pos + 1 >= self.len => {
                self.wraps += 1;
                0
            }
            Some(pos) => pos + 1,
        };

        self.position = Some(next);
        Some(next)
    }

    /// Number of times the cursor has wrapped from the last index to 0.
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    /// Reset the cursor to its initial position before the first index.
    pub fn reset(&mut self) {
        self.position = None;
        self.wraps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_before_first_index() {
        let cursor = CyclicCursor::new(3);
        assert_eq!(cursor.current_index(), None);
        assert_eq!(cursor.wraps(), 0);
    }

    #[test]
    fn test_advance_wraps_to_zero() {
        let mut cursor = CyclicCursor::new(3);

        assert_eq!(cursor.advance(), Some(0));
        assert_eq!(cursor.advance(), Some(1));
        assert_eq!(cursor.advance(), Some(2));
        assert_eq!(cursor.wraps(), 0);

        // Past the last index
        assert_eq!(cursor.advance(), Some(0));
        assert_eq!(cursor.current_index(), Some(0));
        assert_eq!(cursor.wraps(), 1);
    }

    #[test]
    fn test_single_element_always_zero() {
        let mut cursor = CyclicCursor::new(1);
        for _ in 0..5 {
            assert_eq!(cursor.advance(), Some(0));
        }
        assert_eq!(cursor.wraps(), 4);
    }

    #[test]
    fn test_empty_cursor() {
        let mut cursor = CyclicCursor::new(0);
        assert!(cursor.is_empty());
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.current_index(), None);
    }

    #[test]
    fn test_reset() {
        let mut cursor = CyclicCursor::new(2);
        cursor.advance();
        cursor.advance();
        cursor.advance();

        cursor.reset();
        assert_eq!(cursor.current_index(), None);
        assert_eq!(cursor.wraps(), 0);
        assert_eq!(cursor.advance(), Some(0));
    }
}
