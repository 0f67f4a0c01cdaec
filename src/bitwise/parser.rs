// nom parsers for fixed-width text fields
//
// Game text is stored as NUL-terminated ASCII inside a fixed-width slot.
// Bytes after the terminator are leftover padding and are ignored.

use nom::{bytes::complete::take, IResult};

/// Parse a fixed-width, NUL-padded text field of `width` bytes
pub fn parse_padded_text(width: usize) -> impl Fn(&[u8]) -> IResult<&[u8], String> {
    move |input: &[u8]| {
        let (input, bytes) = take(width)(input)?;
        Ok((input, decode_text(bytes)))
    }
}

/// Decode the bytes of a text slot.
///
/// The slot is cut at the first NUL, bytes above 0x7F become U+FFFD and
/// surrounding whitespace is trimmed, including VT and the 0x1C-0x1F
/// separators. Other control characters are kept.
pub fn decode_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

    let text: String = bytes[..end]
        .iter()
        .map(|&b| {
            if b.is_ascii() {
                b as char
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect();

    text.trim_matches(is_pad_char).to_string()
}

/// ASCII whitespace plus VT and the FS/GS/RS/US separators
fn is_pad_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0b' | '\x0c' | '\r' | '\x1c'..='\x1f' | ' ')
}
