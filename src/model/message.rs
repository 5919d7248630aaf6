//! Decoded message content.

/// The raw RFC 5322 bytes of one message, as extracted from its container.
///
/// The bytes are kept exactly as stored; nothing is re-encoded. The header
/// block ends at the first blank line. A message without a blank line is all
/// headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedMessage<'a> {
    content: &'a [u8],
}

impl<'a> DecodedMessage<'a> {
    pub fn new(content: &'a [u8]) -> Self {
        Self { content }
    }

    /// The full message, headers and body.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.content
    }

    /// Header block, including the terminator of the last header line.
    pub fn header_block(&self) -> &'a [u8] {
        match find_blank_line(self.content) {
            Some(header_end) => &self.content[..header_end],
            None => self.content,
        }
    }
}

/// Locate the first blank line.
///
/// The header block is `data[..header_end]`, keeping its final line
/// terminator. Accepts `\n` and `\r\n` terminators in any combination.
fn find_blank_line(data: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while let Some(offset) = data[pos..].iter().position(|&b| b == b'\n') {
        let line_end = pos + offset + 1;
        let rest = &data[line_end..];
        if rest.starts_with(b"\n") || rest.starts_with(b"\r\n") {
            return Some(line_end);
        }
        pos = line_end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lf() {
        let msg = DecodedMessage::new(b"From: a@b.com\nSubject: Hi\n\nBody\n");
        assert_eq!(msg.header_block(), b"From: a@b.com\nSubject: Hi\n");
    }

    #[test]
    fn test_split_crlf() {
        let msg = DecodedMessage::new(b"From: a@b.com\r\nSubject: Hi\r\n\r\nBody");
        assert_eq!(msg.header_block(), b"From: a@b.com\r\nSubject: Hi\r\n");
    }

    #[test]
    fn test_mixed_terminators() {
        let msg = DecodedMessage::new(b"From: a@b.com\nSubject: Hi\r\n\r\nFrom: body\n");
        assert_eq!(msg.header_block(), b"From: a@b.com\nSubject: Hi\r\n");
    }

    #[test]
    fn test_no_separator_is_all_headers() {
        let msg = DecodedMessage::new(b"This is not a valid email format");
        assert_eq!(msg.header_block(), b"This is not a valid email format");
    }

    #[test]
    fn test_as_bytes_is_untouched() {
        let raw: &[u8] = b"Subject: x\n\n\nfirst\n\nsecond";
        assert_eq!(DecodedMessage::new(raw).as_bytes(), raw);
    }
}
