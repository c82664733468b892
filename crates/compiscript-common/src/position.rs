//! Line/column conversion for rendering diagnostics to humans.
//!
//! Spans (and the checker/generator internals) work in byte offsets; this
//! module converts an offset into a 1-indexed (line, column) pair for
//! display, which is the only place line/column numbers matter.

/// A 1-indexed source position, for human-readable diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to 1-indexed (line, column) positions.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    #[must_use]
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        Self { line_starts }
    }

    #[must_use]
    pub fn offset_to_position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let column = offset.saturating_sub(line_start) + 1;
        Position::new(u32::try_from(line).unwrap_or(u32::MAX) + 1, column)
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_offsets() {
        let map = LineMap::build("let x = 1;");
        assert_eq!(map.offset_to_position(0), Position::new(1, 1));
        assert_eq!(map.offset_to_position(4), Position::new(1, 5));
    }

    #[test]
    fn multi_line_offsets() {
        let src = "let x = 1;\nlet y = 2;\n";
        let map = LineMap::build(src);
        assert_eq!(map.line_count(), 3);
        let second_line_start = src.find("let y").unwrap() as u32;
        assert_eq!(map.offset_to_position(second_line_start), Position::new(2, 1));
    }
}
