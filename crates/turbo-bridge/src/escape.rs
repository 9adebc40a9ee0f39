//! CSS identifier escaping, equivalent to the browser's `CSS.escape()`.

use std::fmt::Write;

/// Escape `ident` so it can be used as a CSS identifier segment
/// (after `#` or `.` in a selector).
///
/// Follows the CSSOM serialization rules for identifiers.
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());

    for (index, &c) in chars.iter().enumerate() {
        let code = c as u32;

        if code == 0 {
            out.push('\u{FFFD}');
            continue;
        }

        let leading_digit = index == 0 && c.is_ascii_digit();
        let digit_after_dash = index == 1 && c.is_ascii_digit() && chars[0] == '-';

        if (0x01..=0x1F).contains(&code) || code == 0x7F || leading_digit || digit_after_dash {
            push_code_point(&mut out, code);
            continue;
        }

        if index == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
            continue;
        }

        if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
            continue;
        }

        out.push('\\');
        out.push(c);
    }

    out
}

fn push_code_point(out: &mut String, code: u32) {
    // Infallible for String.
    let _ = write!(out, "\\{:x} ", code);
}
