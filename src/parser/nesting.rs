//! Nesting estimate taken before the grammar runs.
//!
//! pest descends one stack frame per rule, and every nested expression costs
//! the whole precedence ladder, so deep input could exhaust the parser
//! thread's stack before pest reports anything. This scan bounds that
//! recursion from a rough token stream. Each open bracket is one level. So is
//! each keyword or label whose operand is parsed as a nested expression
//! (`if`, `else`, `return`, `throw`, `name@`), until the statement holding it
//! ends.
//!
//! The estimate errs high: a newline only ends a statement when nothing on
//! either side of it lets the grammar carry on to the next line.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    If,
    Else,
    When,
    While,
    For,
    Do,
    Try,
    Catch,
    Finally,
    Return,
    Throw,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "if" => Self::If,
            "else" => Self::Else,
            "when" => Self::When,
            "while" => Self::While,
            "for" => Self::For,
            "do" => Self::Do,
            "try" => Self::Try,
            "catch" => Self::Catch,
            "finally" => Self::Finally,
            "return" => Self::Return,
            "throw" => Self::Throw,
            _ => return None,
        })
    }

    /// Its operand is a bare expression rather than a bracketed one.
    fn nests(self) -> bool {
        matches!(self, Self::If | Self::Else | Self::Return | Self::Throw)
    }

    /// A `(` right after it holds a condition, and the body may follow on the
    /// next line.
    fn takes_condition(self) -> bool {
        matches!(self, Self::If | Self::When | Self::While | Self::For | Self::Catch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Open { condition: bool },
    Close,
    Keyword(Keyword),
    Label,
    /// Names, literals and label references.
    Operand,
    /// `.` or `?.`, which may start a continuation line.
    Dot,
    IncDec,
    Comma,
    /// A newline or `;`.
    Break,
    Operator,
}

#[derive(Debug, Clone, Copy)]
struct Lexeme {
    token: Token,
    offset: usize,
}

#[derive(Debug, Default)]
struct Frame {
    nested: usize,
    condition: bool,
}

/// Byte offset at which the nesting estimate first exceeds `limit`.
pub(crate) fn first_excess(source: &str, limit: usize) -> Option<usize> {
    let lexemes = lex(source);
    let mut frames = vec![Frame::default()];
    let mut depth = 1;

    // what the last significant token leaves behind
    let mut ends_operand = false;
    let mut may_end = true;

    for (i, lexeme) in lexemes.iter().enumerate() {
        let same_line = i > 0 && lexemes[i - 1].token != Token::Break;
        match lexeme.token {
            Token::Break => {
                if may_end && !continues_from(&lexemes[i + 1..]) {
                    if let Some(frame) = frames.last_mut() {
                        depth -= frame.nested;
                        frame.nested = 0;
                    }
                }
                continue;
            }
            Token::Open { condition } => {
                frames.push(Frame { nested: 0, condition });
                depth += 1;
                (ends_operand, may_end) = (false, false);
            }
            Token::Close => {
                let condition = match frames.len() {
                    1 => false,
                    _ => frames.pop().map_or(false, |frame| {
                        depth -= 1 + frame.nested;
                        frame.condition
                    }),
                };
                (ends_operand, may_end) = (!condition, !condition);
            }
            Token::Keyword(keyword) => {
                if keyword.nests() {
                    nest(&mut frames, &mut depth);
                }
                (ends_operand, may_end) = (false, matches!(keyword, Keyword::Return | Keyword::Throw));
            }
            Token::Label => {
                nest(&mut frames, &mut depth);
                (ends_operand, may_end) = (false, false);
            }
            Token::Operand => {
                // `a to` still expects the right side of an infix call
                let infix = same_line && ends_operand;
                (ends_operand, may_end) = (true, !infix);
            }
            Token::IncDec => {
                let postfix = same_line && ends_operand;
                (ends_operand, may_end) = (postfix, postfix);
            }
            Token::Comma => {
                if let Some(frame) = frames.last_mut() {
                    depth -= frame.nested;
                    frame.nested = 0;
                }
                (ends_operand, may_end) = (false, false);
            }
            Token::Dot | Token::Operator => (ends_operand, may_end) = (false, false),
        }
        if depth > limit {
            return Some(lexeme.offset);
        }
    }
    None
}

fn nest(frames: &mut [Frame], depth: &mut usize) {
    if let Some(frame) = frames.last_mut() {
        frame.nested += 1;
        *depth += 1;
    }
}

/// The next line continues the statement before the break.
fn continues_from(rest: &[Lexeme]) -> bool {
    let next = rest.iter().find(|l| l.token != Token::Break);
    matches!(
        next.map(|l| l.token),
        Some(Token::Dot | Token::Keyword(Keyword::Else | Keyword::Catch | Keyword::Finally | Keyword::While))
    )
}

// =====================
// Lexing
// =====================

fn lex(source: &str) -> Vec<Lexeme> {
    let bytes = source.as_bytes();
    let mut lexemes: Vec<Lexeme> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let next = bytes.get(i + 1).copied();
        let token = match bytes[i] {
            b' ' | b'\t' | b'\r' => {
                i += 1;
                continue;
            }
            b'/' if next == Some(b'/') => {
                i = find_byte(bytes, i, b'\n');
                continue;
            }
            b'/' if next == Some(b'*') => {
                i = source[i + 2..].find("*/").map_or(bytes.len(), |end| i + 2 + end + 2);
                continue;
            }
            b'\n' | b';' => {
                i += 1;
                Token::Break
            }
            b'"' => {
                i = skip_string(bytes, i + 1);
                Token::Operand
            }
            b'`' => {
                i = (find_byte(bytes, i + 1, b'`') + 1).min(bytes.len());
                Token::Operand
            }
            b'(' | b'[' | b'{' => {
                i += 1;
                let condition = matches!(
                    lexemes.last().map(|l| l.token),
                    Some(Token::Keyword(keyword)) if keyword.takes_condition()
                );
                Token::Open { condition }
            }
            b')' | b']' | b'}' => {
                i += 1;
                Token::Close
            }
            b',' => {
                i += 1;
                Token::Comma
            }
            b'.' if next == Some(b'.') => {
                i += 2;
                Token::Operator
            }
            b'.' => {
                i += 1;
                Token::Dot
            }
            b'?' if next == Some(b'.') => {
                i += 2;
                Token::Dot
            }
            b @ (b'+' | b'-') if next == Some(b) => {
                i += 2;
                Token::IncDec
            }
            b'@' => {
                i = skip_word(bytes, i + 1);
                Token::Operand
            }
            b if b.is_ascii_digit() => {
                i = skip_number(bytes, i);
                Token::Operand
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                i = skip_word(bytes, i);
                let word = &source[start..i];
                match Keyword::from_word(word) {
                    Some(keyword) => Token::Keyword(keyword),
                    None if bytes.get(i) == Some(&b'@') => {
                        i += 1;
                        Token::Label
                    }
                    None if matches!(word, "in" | "is" | "as") => Token::Operator,
                    None => Token::Operand,
                }
            }
            b if !b.is_ascii() => {
                while i < bytes.len() && !bytes[i].is_ascii() {
                    i += 1;
                }
                Token::Operand
            }
            _ => {
                i += 1;
                Token::Operator
            }
        };
        lexemes.push(Lexeme { token, offset: start });
    }
    lexemes
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_word(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_word_byte(bytes[i]) {
        i += 1;
    }
    i
}

/// Digits and suffixes, plus a fraction when a digit follows the dot.
fn skip_number(bytes: &[u8], mut i: usize) -> usize {
    loop {
        i = skip_word(bytes, i);
        match (bytes.get(i), bytes.get(i + 1)) {
            (Some(b'.'), Some(d)) if d.is_ascii_digit() => i += 1,
            _ => return i,
        }
    }
}

/// Past the closing quote; an unterminated string stops at the line end.
fn skip_string(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn find_byte(bytes: &[u8], from: usize, target: u8) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|&b| b == target)
        .map_or(bytes.len(), |p| from + p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets_count_as_levels() {
        assert_eq!(first_excess("((((x))))", 3), Some(2));
        assert_eq!(first_excess("((x))[0]", 3), None);
        assert_eq!(first_excess("f(g(h(1)), i(2))", 4), None);
    }

    #[test]
    fn test_statements_do_not_accumulate() {
        let flat = "if (a) b\nreturn x\nthrow e\n".repeat(500);
        assert_eq!(first_excess(&flat, 8), None);
        assert_eq!(first_excess(&"f(if (a) b, if (c) d, return)\n".repeat(50), 8), None);
    }

    #[test]
    fn test_keyword_chains_nest() {
        let inline = format!("{}x", "if (a) ".repeat(20));
        assert!(first_excess(&inline, 10).is_some());

        // then branches may sit on the following line
        let stacked = format!("{}x", "if (a)\n".repeat(20));
        assert!(first_excess(&stacked, 10).is_some());

        let labels = format!("{}x", "l@ ".repeat(20));
        assert!(first_excess(&labels, 10).is_some());
    }

    #[test]
    fn test_else_if_chain_stays_shallow() {
        let chain = "if (a) b else if (c) d else if (e) f else g";
        assert_eq!(first_excess(chain, 8), None);
    }

    #[test]
    fn test_strings_and_comments_are_skipped() {
        let source = "\"((((((\" // ((((((\n/* ((((( */ `((((` x";
        assert_eq!(first_excess(source, 2), None);
    }

    #[test]
    fn test_postfix_increment_ends_line() {
        let source = "i++\nif (a) b\n".repeat(100);
        assert_eq!(first_excess(&source, 6), None);
    }

    #[test]
    fn test_unbalanced_closers_are_harmless() {
        assert_eq!(first_excess(")))} x", 2), None);
    }
}
