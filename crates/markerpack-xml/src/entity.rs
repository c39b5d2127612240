//! Permissive character entity decoding.

use std::borrow::Cow;

use quick_xml::escape::resolve_html5_entity;

/// Longest entity body we look for a terminating `;` in. The longest HTML5
/// name is `CounterClockwiseContourIntegral`.
const MAX_ENTITY_LEN: usize = 32;

/// Decode character references in an attribute value or text run.
///
/// Handles every HTML5 named entity (`&amp;`, `&nbsp;`, `&eacute;`, ..) and
/// decimal / hexadecimal character references. Anything unrecognised
/// (including a bare `&`) is kept verbatim instead of failing, matching how
/// overlay loaders have always treated hand-written packs.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    let Some(first) = memchr::memchr(b'&', raw.as_bytes()) else {
        return Cow::Borrowed(raw);
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..first]);

    let mut rest = &raw[first..];
    while let Some(amp) = memchr::memchr(b'&', rest.as_bytes()) {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        match decode_one(rest) {
            Some((Decoded::Char(ch), consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            Some((Decoded::Str(text), consumed)) => {
                out.push_str(text);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

enum Decoded {
    Char(char),
    Str(&'static str),
}

/// Decode the reference at the start of `s` (which begins with `&`).
///
/// Returns the replacement and the number of bytes consumed.
fn decode_one(s: &str) -> Option<(Decoded, usize)> {
    let window = &s.as_bytes()[1..s.len().min(MAX_ENTITY_LEN + 2)];
    let semi = memchr::memchr(b';', window)?;
    let body = &s[1..1 + semi];

    let decoded = match body.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            Decoded::Char(char::from_u32(code)?)
        }
        None => Decoded::Str(resolve_html5_entity(body)?),
    };

    Some((decoded, semi + 2))
}
