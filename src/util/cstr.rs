//! C-string style escaping used by MI scalar values and error messages.

/// Escape `"` as `\"` and newline as `\n`, per the MI value tree's scalar
/// serialization rule.
pub fn escape_c_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_newlines() {
        assert_eq!(escape_c_string("a\"b\nc"), "a\\\"b\\nc");
    }

    #[test]
    fn escapes_backslash() {
        assert_eq!(escape_c_string("a\\b"), "a\\\\b");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(escape_c_string("hello world"), "hello world");
    }
}
