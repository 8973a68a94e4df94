//! Byte-offset to (line, column) translation.
//!
//! Grounded on the general shape of `types::Range` in this crate's lineage
//! but built as a proper O(log n) table rather than a raw pair of
//! coordinates, since the Source Store must own translation for
//! arbitrarily large files.

#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// 1-based line, 1-based column (byte offset within the line + 1).
    pub fn position_of(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        let column = byte_offset.saturating_sub(line_start) + 1;
        ((line_idx + 1) as u32, column)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_first_column() {
        let map = LineMap::new("abc\ndef\n");
        assert_eq!(map.position_of(0), (1, 1));
    }

    #[test]
    fn second_line_offset() {
        let map = LineMap::new("abc\ndef\n");
        // 'd' is byte 4
        assert_eq!(map.position_of(4), (2, 1));
        assert_eq!(map.position_of(6), (2, 3));
    }

    #[test]
    fn no_trailing_newline() {
        let map = LineMap::new("one\ntwo");
        assert_eq!(map.position_of(4), (2, 1));
        assert_eq!(map.position_of(6), (2, 3));
    }
}
