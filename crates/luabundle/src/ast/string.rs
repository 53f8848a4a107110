use std::{iter::Peekable, str::Chars};

/**
    Decodes the escape sequences in the contents of a quoted Lua string literal.

    The given string must be the raw text between the quotes, exactly as it
    appears in source code. Unknown escape sequences are kept as written.

    Lua strings are byte strings, so numeric escapes such as `\xC3\xA9`
    produce raw bytes, and byte sequences that are not valid UTF-8 are
    replaced with `U+FFFD`.
*/
pub fn unescape_string(raw: &str) -> String {
    let mut decoded = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut decoded, c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            decoded.push(b'\\');
            break;
        };
        match escaped {
            'a' => decoded.push(0x07),
            'b' => decoded.push(0x08),
            'f' => decoded.push(0x0C),
            'n' | '\n' => decoded.push(b'\n'),
            'r' => decoded.push(b'\r'),
            't' => decoded.push(b'\t'),
            'v' => decoded.push(0x0B),
            '\\' | '"' | '\'' => push_char(&mut decoded, escaped),
            'z' => {
                while chars.next_if(|c| c.is_ascii_whitespace()).is_some() {}
            }
            'x' => match take_hex(&mut chars, 2).and_then(|value| u8::try_from(value).ok()) {
                Some(byte) => decoded.push(byte),
                None => decoded.extend_from_slice(b"\\x"),
            },
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let code = take_hex(&mut chars, 8);
                match (code.and_then(char::from_u32), chars.next()) {
                    (Some(c), Some('}')) => push_char(&mut decoded, c),
                    _ => decoded.extend_from_slice(b"\\u{"),
                }
            }
            d if d.is_ascii_digit() => {
                let mut digits = String::from(d);
                while digits.len() < 3 {
                    match chars.next_if(char::is_ascii_digit) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                match digits.parse::<u8>() {
                    Ok(byte) => decoded.push(byte),
                    Err(_) => {
                        decoded.push(b'\\');
                        decoded.extend_from_slice(digits.as_bytes());
                    }
                }
            }
            other => {
                decoded.push(b'\\');
                push_char(&mut decoded, other);
            }
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn push_char(bytes: &mut Vec<u8>, c: char) {
    let mut buffer = [0; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buffer).as_bytes());
}

fn take_hex(chars: &mut Peekable<Chars<'_>>, max_digits: usize) -> Option<u32> {
    let mut value = None;
    for _ in 0..max_digits {
        match chars.next_if(char::is_ascii_hexdigit) {
            Some(h) => value = Some(value.unwrap_or(0) * 16 + h.to_digit(16).unwrap_or_default()),
            None => break,
        }
    }
    value
}

/**
    Quotes the given string as a double-quoted Lua string literal,
    escaping any characters that may not appear in it verbatim.
*/
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            // NOTE: Decimal escapes must always use three digits here,
            // otherwise a digit following them would be consumed too
            c if c.is_ascii_control() => quoted.push_str(&format!("\\{:03}", u32::from(c))),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
