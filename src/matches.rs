//! Byte classes used by the scanners.
//!
//! Every class is a 256 entry lookup table computed at compile time.

macro_rules! byte_map {
    {
        $(
            $(#[$meta:meta])*
            $vis:vis const fn $fn_id:ident($byte:ident) { $e:expr }
        )*
    } => {
        $(
            $(#[$meta])*
            #[inline]
            $vis const fn $fn_id($byte: u8) -> bool {
                static PAT: [bool; 256] = {
                    let mut bytes = [false; 256];
                    let mut $byte = 0u8;
                    const fn filter($byte: u8) -> bool {
                        $e
                    }
                    loop {
                        bytes[$byte as usize] = filter($byte);
                        if $byte == 255 {
                            break;
                        }
                        $byte += 1;
                    }
                    bytes
                };
                PAT[$byte as usize]
            }
        )*
    };
}

byte_map! {
    /// [`tchar`][rfc], the bytes allowed in a header field name and a method token.
    ///
    /// [rfc]: <https://www.rfc-editor.org/rfc/rfc9110#name-tokens>
    pub const fn is_token(byte) {
        matches!(
            byte,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
                | b'^' | b'_' | b'`' | b'|' | b'~'
                | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z'
        )
    }

    /// Bytes allowed in a request target, the visible ASCII range and obs-text.
    pub const fn is_target(byte) {
        matches!(byte, 0x21..=0x7e | 0x80..=0xff)
    }

    /// [`field-vchar`][rfc] plus SP and HTAB.
    ///
    /// [rfc]: <https://www.rfc-editor.org/rfc/rfc9110#name-field-values>
    pub const fn is_field_value(byte) {
        matches!(byte, b'\t' | 0x20..=0x7e | 0x80..=0xff)
    }

    /// Optional whitespace, SP or HTAB.
    pub const fn is_ows(byte) {
        matches!(byte, b' ' | b'\t')
    }
}
