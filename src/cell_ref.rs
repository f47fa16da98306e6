//! Utilities for Excel-style cell references.

/// Columns on an Excel sheet (`A` through `XFD`).
pub const MAX_COLS: u32 = 16_384;
/// Rows on an Excel sheet.
pub const MAX_ROWS: u32 = 1_048_576;

/// Parse a cell reference from raw bytes (ASCII) into (col, row) where col and row are 0-indexed.
///
/// Accepts absolute markers (`$A$1`). Returns `None` when either the column
/// letters or the row digits are missing.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            let upper = b.to_ascii_uppercase();
            col = col
                .saturating_mul(26)
                .saturating_add(u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            saw_row = true;
        }
    }

    if !saw_col || !saw_row {
        return None;
    }

    Some((col.saturating_sub(1), row.saturating_sub(1)))
}

/// Parse a cell reference like "A1" into (col, row), both 0-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Convert a 0-indexed column number to its letter form (0 -> "A", 26 -> "AA").
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = u64::from(col) + 1; // Convert to 1-based
    while n > 0 {
        n -= 1;
        let offset = u8::try_from(n % 26).unwrap_or(0);
        result.insert(0, char::from(b'A' + offset));
        n /= 26;
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A1", Some((0, 0)))]
    #[test_case("B10", Some((1, 9)))]
    #[test_case("$AA$100", Some((26, 99)))]
    #[test_case("xfd1", Some((16383, 0)))]
    #[test_case("A", None)]
    #[test_case("12", None)]
    fn test_parse_cell_ref(input: &str, expected: Option<(u32, u32)>) {
        assert_eq!(parse_cell_ref(input), expected);
    }

    #[test_case(0, "A")]
    #[test_case(25, "Z")]
    #[test_case(26, "AA")]
    #[test_case(27, "AB")]
    #[test_case(701, "ZZ")]
    #[test_case(702, "AAA")]
    fn test_col_to_letter(col: u32, expected: &str) {
        assert_eq!(col_to_letter(col), expected);
    }

    #[test]
    fn test_letters_roundtrip() {
        for col in [0, 5, 25, 26, 51, 52, 700, 16383] {
            let r = format!("{}1", col_to_letter(col));
            assert_eq!(parse_cell_ref(&r), Some((col, 0)));
        }
    }
}
