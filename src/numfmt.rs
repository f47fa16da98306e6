//! Number format helpers.
//!
//! The splitter does not render numbers; it only needs to know which cells
//! hold dates (so they stay dates in the output) and how to print a date
//! serial as a chunk label.

/// Format code used for date-time cells in written workbooks.
pub const DATE_TIME_FORMAT_CODE: &str = "yyyy-mm-dd hh:mm:ss";

/// Days between the 1900 and 1904 date-system epochs.
pub const DATE1904_OFFSET: f64 = 1462.0;

/// Built-in number format IDs (0-49 are predefined by Excel)
/// See: ECMA-376 Part 1, Section 18.8.30
pub const fn get_builtin_format(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        5 => Some("$#,##0_);($#,##0)"),
        6 => Some("$#,##0_);[Red]($#,##0)"),
        7 => Some("$#,##0.00_);($#,##0.00)"),
        8 => Some("$#,##0.00_);[Red]($#,##0.00)"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        41 => Some("_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)"),
        42 => Some("_($* #,##0_);_($* (#,##0);_($* \"-\"_);_(@_)"),
        43 => Some("_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)"),
        44 => Some("_($* #,##0.00_);_($* (#,##0.00);_($* \"-\"??_);_(@_)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

/// Check if a format code is a date/time format
pub fn is_date_format(format_code: &str) -> bool {
    let lower = format_code.to_lowercase();

    // Skip text in quotes and brackets
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;
    let mut cleaned = String::new();

    for c in lower.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            _ if !in_quotes && !in_brackets => cleaned.push(c),
            _ => {}
        }
    }

    if cleaned == "general" {
        return false;
    }

    // Check for date/time tokens
    cleaned.contains('y') ||
    cleaned.contains('m') && !cleaned.contains('#') ||  // m is month if no # (number format)
    cleaned.contains('d') ||
    cleaned.contains('h') ||
    cleaned.contains('s') && cleaned.contains(':') // s is seconds if with colon
}

/// Whether a number format (built-in id or custom code) formats dates.
pub fn is_date_format_id(id: u32, custom_code: Option<&str>) -> bool {
    custom_code
        .or(get_builtin_format(id))
        .is_some_and(is_date_format)
}

/// Convert an Excel 1900-system serial to (year, month, day, hour, minute, second).
#[allow(clippy::cast_possible_truncation)]
fn excel_date_to_components(serial: f64) -> (i64, u32, u32, u32, u32, u32) {
    let total_seconds = (serial * 86_400.0).round() as i64;
    let days = total_seconds.div_euclid(86_400);
    let secs = u32::try_from(total_seconds.rem_euclid(86_400)).unwrap_or(0);

    // Serial 1 = Jan 1, 1900 = JDN 2415021. Excel keeps a phantom
    // Feb 29, 1900 at serial 60, so later serials are one day ahead.
    let jdn = if days <= 60 {
        days + 2_415_020
    } else {
        days + 2_415_019
    };

    let (year, month, day) = jdn_to_ymd(jdn);
    (year, month, day, secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Convert Julian Day Number to (year, month, day) in proleptic Gregorian calendar
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn jdn_to_ymd(jdn: i64) -> (i64, u32, u32) {
    // Algorithm from: https://en.wikipedia.org/wiki/Julian_day#Julian_or_Gregorian_calendar_from_Julian_day_number
    let y = 4716;
    let j = 1401;
    let m = 2;
    let n = 12;
    let r = 4;
    let p = 1461;
    let v = 3;
    let u = 5;
    let s = 153;
    let w = 2;
    let b = 274_277;
    let c = -38;

    let f = jdn + j + (((4 * jdn + b) / 146_097) * 3) / 4 + c;
    let e = r * f + v;
    let g = (e % p) / r;
    let h = u * g + w;

    let day = (h % s) / u + 1;
    let month = ((h / s + m) % n) + 1;
    let year = (e / p) - y + (n + m - month) / n;

    (year, month as u32, day as u32)
}

/// Format a 1900-system date serial as `YYYY-MM-DD HH:MM:SS`.
pub fn format_datetime(serial: f64) -> String {
    let (year, month, day, hour, minute, second) = excel_date_to_components(serial);
    format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
}

/// Float text with a decimal point or an exponent always present: shortest
/// round-trip digits, positional for exponents -4 through 15 (`1.0`, `0.0001`),
/// scientific outside that range (`1e+16`, `1.5e-05`).
pub fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sci = format!("{n:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..16).contains(&exp) {
        let plain = n.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Parse an ISO 8601 date or date-time (`t="d"` cells) into a 1900-system serial.
#[allow(clippy::cast_precision_loss)]
pub fn parse_iso_datetime(s: &str) -> Option<f64> {
    let s = s.trim().trim_end_matches('Z');
    let (date, time) = s.split_once('T').unwrap_or((s, ""));

    let mut parts = date.splitn(3, '-');
    let year: i64 = parts.next()?.parse().ok()?;
    let month: i64 = parts.next()?.parse().ok()?;
    let day: i64 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let mut seconds = 0.0;
    if !time.is_empty() {
        let mut hms = time.splitn(3, ':');
        let h: f64 = hms.next()?.parse().ok()?;
        let m: f64 = hms.next().unwrap_or("0").parse().ok()?;
        let sec: f64 = hms.next().unwrap_or("0").parse().ok()?;
        seconds = h * 3600.0 + m * 60.0 + sec;
    }

    // 1970-01-01 is serial 25569; serials before March 1900 skip the phantom leap day
    let mut serial = (days_from_civil(year, month, day) + 25_569) as f64;
    if serial < 61.0 {
        serial -= 1.0;
    }
    Some(serial + seconds / 86_400.0)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_date_detection() {
        assert!(is_date_format("yyyy-mm-dd"));
        assert!(is_date_format("m/d/yy"));
        assert!(is_date_format("[$-409]d-mmm-yyyy"));
        assert!(!is_date_format("#,##0.00"));
        assert!(!is_date_format("General"));
        assert!(!is_date_format("0.00\"days\""));
        assert!(!is_date_format("@"));
    }

    #[test_case(14, None, true)]
    #[test_case(22, None, true)]
    #[test_case(46, None, true)]
    #[test_case(0, None, false)]
    #[test_case(4, None, false)]
    #[test_case(164, Some("dd/mm/yyyy"), true)]
    #[test_case(165, Some("0.000"), false)]
    fn test_is_date_format_id(id: u32, code: Option<&str>, expected: bool) {
        assert_eq!(is_date_format_id(id, code), expected);
    }

    #[test_case(1.0, "1900-01-01 00:00:00")]
    #[test_case(59.0, "1900-02-28 00:00:00")]
    #[test_case(61.0, "1900-03-01 00:00:00")]
    #[test_case(45_292.0, "2024-01-01 00:00:00")]
    #[test_case(45_292.5, "2024-01-01 12:00:00")]
    #[test_case(45_292.999_999_9, "2024-01-02 00:00:00")]
    fn test_format_datetime(serial: f64, expected: &str) {
        assert_eq!(format_datetime(serial), expected);
    }

    #[test_case(1.0, "1.0")]
    #[test_case(-2.0, "-2.0")]
    #[test_case(2.5, "2.5")]
    #[test_case(0.1 + 0.2, "0.30000000000000004")]
    #[test_case(0.0001, "0.0001")]
    #[test_case(0.000_015, "1.5e-05")]
    #[test_case(1e15, "1000000000000000.0")]
    #[test_case(1e16, "1e+16")]
    #[test_case(-1.5e300, "-1.5e+300")]
    #[test_case(-0.0, "-0.0")]
    #[test_case(f64::NAN, "nan")]
    #[test_case(f64::NEG_INFINITY, "-inf")]
    fn test_format_float(n: f64, expected: &str) {
        assert_eq!(format_float(n), expected);
    }

    #[test_case("2024-01-01", 45_292.0)]
    #[test_case("2024-01-01T12:00:00", 45_292.5)]
    #[test_case("2024-01-01T12:00:00Z", 45_292.5)]
    #[test_case("1900-03-01", 61.0)]
    #[test_case("1900-01-01", 1.0)]
    fn test_parse_iso_datetime(input: &str, expected: f64) {
        let serial = parse_iso_datetime(input).unwrap();
        assert!((serial - expected).abs() < 1e-9, "{input} -> {serial}");
    }

    #[test]
    fn test_parse_iso_datetime_rejects_garbage() {
        assert_eq!(parse_iso_datetime("yesterday"), None);
        assert_eq!(parse_iso_datetime("2024-13-01"), None);
    }

    #[test]
    fn test_iso_and_serial_agree() {
        for input in ["1999-12-31T23:59:59", "2024-02-29T06:30:00", "1900-03-01T00:00:00"] {
            let serial = parse_iso_datetime(input).unwrap();
            assert_eq!(format_datetime(serial), input.replace('T', " "));
        }
    }

    #[test]
    fn test_builtin_format_lookup() {
        assert_eq!(get_builtin_format(14), Some("mm-dd-yy"));
        assert_eq!(get_builtin_format(100), None);
    }
}
