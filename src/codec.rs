//! Conversions between the native string representations used by the two
//! enumeration subsystems.
//!
//! Display-configuration and GDI structs carry NUL-terminated fixed-size
//! UTF-16 buffers; instrumentation descriptors carry NUL-padded `uint16`
//! arrays where the padding can be interleaved with real data.

/// Decodes a NUL-terminated wide-character buffer, truncating at the first
/// NUL.
pub fn wide_to_string(s: &[u16]) -> String {
    let end = s.iter().position(|&x| x == 0).unwrap_or(s.len());
    let truncated = &s[0..end];
    from_wide_lossy(truncated)
}

/// Decodes an instrumentation `uint16[]` property (manufacturer, serial,
/// product code). These are fixed-width fields where unused cells are NUL;
/// every NUL is dropped rather than treated as a terminator.
pub fn decode_utf16_field(values: &[u16]) -> String {
    let units: Vec<u16> = values.iter().copied().filter(|&c| c != 0).collect();
    from_wide_lossy(&units)
}

/// Escapes a string for interpolation into a single-quoted WQL literal.
/// Instance names contain backslashes, which WQL treats as escape leads.
pub fn escape_wql(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(windows)]
fn from_wide_lossy(units: &[u16]) -> String {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    OsString::from_wide(units).to_string_lossy().into()
}

#[cfg(not(windows))]
fn from_wide_lossy(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_string_truncates_at_first_nul() {
        let buf: Vec<u16> = "\\\\.\\DISPLAY1\0garbage\0".encode_utf16().collect();
        assert_eq!(wide_to_string(&buf), "\\\\.\\DISPLAY1");
    }

    #[test]
    fn wide_string_without_nul_uses_whole_buffer() {
        let buf: Vec<u16> = "GSM59F2".encode_utf16().collect();
        assert_eq!(wide_to_string(&buf), "GSM59F2");
    }

    #[test]
    fn utf16_field_drops_embedded_nuls() {
        let field = [b'G' as u16, 0, b'S' as u16, 0, b'M' as u16, 0, 0, 0];
        assert_eq!(decode_utf16_field(&field), "GSM");
    }

    #[test]
    fn utf16_field_empty_when_all_padding() {
        assert_eq!(decode_utf16_field(&[0_u16; 16]), "");
    }

    #[test]
    fn wql_escape_doubles_backslashes() {
        assert_eq!(
            escape_wql("DISPLAY\\GSM59F2\\5&1a2b3c&0&UID4357_0"),
            "DISPLAY\\\\GSM59F2\\\\5&1a2b3c&0&UID4357_0"
        );
    }

    #[test]
    fn wql_escape_quotes_and_control_characters() {
        assert_eq!(escape_wql("it's\n"), "it\\'s\\n");
    }
}
