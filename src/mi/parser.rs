//! MI command line parsing: `[<id-digits>][-]<name> <args…>`.

use crate::util::split_args;

/// One parsed input line, before it is matched against the command
/// table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    /// Numeric id, when the line began with ASCII digits.
    pub id: Option<u64>,
    /// The id-digit run overflowed a `u64`.
    pub overflow: bool,
    /// Whether a leading `-` (stripped from `tokens`) was present — GDB/MI
    /// form commands are never echoed.
    pub is_mi_form: bool,
    /// The remainder of the line after the id, trimmed, used for the
    /// CLI-form echo record.
    pub echo_text: String,
    /// Shell-split tokens of the command and its arguments, with the `-`
    /// already stripped. Empty for a no-op line (blank, bare id, bare
    /// `-`).
    pub tokens: Vec<String>,
}

impl ParsedLine {
    pub fn is_noop(&self) -> bool {
        self.tokens.is_empty()
    }
}

pub fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim_end_matches(['\r', '\n']);

    let digit_count = trimmed.chars().take_while(char::is_ascii_digit).count();
    let (digits, rest) = trimmed.split_at(digit_count);

    let (id, overflow) = if digits.is_empty() {
        (None, false)
    } else {
        match digits.parse::<u64>() {
            Ok(n) => (Some(n), false),
            Err(_) => (None, true),
        }
    };

    let rest_trimmed = rest.trim();
    if overflow || rest_trimmed.is_empty() || rest_trimmed == "-" {
        return ParsedLine {
            id,
            overflow,
            is_mi_form: false,
            echo_text: rest_trimmed.to_string(),
            tokens: Vec::new(),
        };
    }

    let is_mi_form = rest.starts_with('-');
    let body = if is_mi_form { &rest[1..] } else { rest };
    let tokens = split_args(body);

    ParsedLine {
        id,
        overflow,
        is_mi_form,
        echo_text: rest_trimmed.to_string(),
        tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_and_dash_form() {
        let p = parse_line("2-target-attach 12345\n");
        assert_eq!(p.id, Some(2));
        assert!(p.is_mi_form);
        assert_eq!(p.tokens, vec!["target-attach", "12345"]);
    }

    #[test]
    fn parses_cli_form_without_id() {
        let p = parse_line("foo\n");
        assert_eq!(p.id, None);
        assert!(!p.is_mi_form);
        assert_eq!(p.tokens, vec!["foo"]);
        assert_eq!(p.echo_text, "foo");
    }

    #[test]
    fn bare_number_is_a_noop_with_id() {
        let p = parse_line("22\n");
        assert_eq!(p.id, Some(22));
        assert!(p.is_noop());
    }

    #[test]
    fn empty_line_is_a_noop() {
        let p = parse_line("\n");
        assert!(p.is_noop());
        assert_eq!(p.id, None);
    }

    #[test]
    fn bare_dash_is_a_noop() {
        let p = parse_line("-\n");
        assert!(p.is_noop());
    }

    #[test]
    fn overflowing_id_is_reported() {
        let p = parse_line("99999999999999999999999foo\n");
        assert!(p.overflow);
        assert!(p.is_noop());
    }
}
