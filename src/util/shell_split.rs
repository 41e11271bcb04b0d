//! Shell-like argument splitter used by the MI parser.
//!
//! Recognizes single and double quotes (no escape processing inside quotes
//! beyond the closing quote itself), collapses runs of whitespace, and
//! terminates at the first newline.

/// Split `input` into whitespace-separated tokens, honoring single and
/// double quoted spans as single tokens. Quotes are stripped from the
/// resulting token; unterminated quotes consume the rest of the input.
pub fn split_args(input: &str) -> Vec<String> {
    let line = match input.find('\n') {
        Some(idx) => &input[..idx],
        None => input,
    };

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => {
                quote = None;
            }
            Some(_) => current.push(c),
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    in_token = true;
                } else if c.is_whitespace() {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else {
                    current.push(c);
                    in_token = true;
                }
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
