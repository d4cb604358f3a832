//! UTF-16 buffer decoding shared by the text-bearing engine calls.

/// Decode a little-endian UTF-16 byte buffer, dropping the trailing NUL
/// terminator the engine includes in its reported lengths.
pub(crate) fn from_utf16le_bytes(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let units = match units.last() {
        Some(0) => &units[..units.len() - 1],
        _ => &units[..],
    };
    String::from_utf16_lossy(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str, terminated: bool) -> Vec<u8> {
        let mut bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        if terminated {
            bytes.extend_from_slice(&[0, 0]);
        }
        bytes
    }

    #[test]
    fn strips_trailing_terminator() {
        assert_eq!(from_utf16le_bytes(&encode("Chapter 1", true)), "Chapter 1");
    }

    #[test]
    fn unterminated_buffers_decode_fully() {
        assert_eq!(from_utf16le_bytes(&encode("título", false)), "título");
    }

    #[test]
    fn empty_buffer_is_empty_string() {
        assert_eq!(from_utf16le_bytes(&[]), "");
    }
}
