// src/util.rs
//! Small shared helpers.

/// 1-based line and column of a byte offset in `source`.
///
/// Offsets past the end resolve to the position just after the last
/// character, which is where end-of-file errors point.
pub fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut column = 1u32;
    for (index, c) in source.char_indices() {
        if index >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_tracks_newlines() {
        let source = "ab\ncd";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 1), (1, 2));
        assert_eq!(line_col(source, 3), (2, 1));
        assert_eq!(line_col(source, 4), (2, 2));
    }

    #[test]
    fn line_col_past_end() {
        assert_eq!(line_col("ab", 10), (1, 3));
    }
}
