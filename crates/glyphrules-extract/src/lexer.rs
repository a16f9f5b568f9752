// this_file: crates/glyphrules-extract/src/lexer.rs

//! Tokenizer for the Python-shaped patcher source.
//!
//! Produces logical lines: physical lines joined across open brackets and
//! backslash continuations, each tagged with the indentation column of its
//! first token. Comments and blank lines are dropped.

use thiserror::Error;

/// Tokenizer failure with the physical line it occurred on.
#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {message}")]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Op(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        matches!(self.kind, TokenKind::Op(o) if o == op)
    }

    pub fn is_name(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Name(n) if n == name)
    }
}

/// One logical line of source.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// Indentation column of the first token
    pub indent: usize,
    /// Physical line the logical line starts on (1-based)
    pub line: usize,
    pub tokens: Vec<Token>,
}

const OPS3: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const OPS2: &[&str] = &[
    "**", "//", "==", "!=", "<=", ">=", "<<", ">>", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "@=", "->", ":=",
];
const OPS1: &[&str] = &[
    "+", "-", "*", "/", "%", "@", "&", "|", "^", "~", "<", ">", "(", ")", "[", "]", "{", "}", ",",
    ":", ".", ";", "=", "!",
];

const TAB_SIZE: usize = 8;

/// Split `source` into logical lines of tokens.
pub fn logical_lines(source: &str) -> Result<Vec<LogicalLine>, LexError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    depth: usize,
    lines: Vec<LogicalLine>,
    current: Option<LogicalLine>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            depth: 0,
            lines: Vec::new(),
            current: None,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            line: self.line,
            message: message.into(),
        }
    }

    fn run(mut self) -> Result<Vec<LogicalLine>, LexError> {
        let mut at_line_start = true;
        while self.pos < self.chars.len() {
            if at_line_start && self.depth == 0 {
                let indent = self.skip_indentation();
                match self.peek(0) {
                    None => break,
                    Some('\n') | Some('\r') | Some('#') => {
                        self.skip_to_line_end();
                        continue;
                    }
                    Some(_) => {
                        at_line_start = false;
                        self.current = Some(LogicalLine {
                            indent,
                            line: self.line,
                            tokens: Vec::new(),
                        });
                        continue;
                    }
                }
            }

            let Some(c) = self.peek(0) else { break };
            match c {
                '#' => self.skip_comment(),
                '\\' if matches!(self.peek(1), Some('\n')) => {
                    self.pos += 2;
                    self.line += 1;
                }
                '\\' if matches!((self.peek(1), self.peek(2)), (Some('\r'), Some('\n'))) => {
                    self.pos += 3;
                    self.line += 1;
                }
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                    if self.depth == 0 {
                        self.finish_line();
                        at_line_start = true;
                    }
                }
                c if c.is_whitespace() => self.pos += 1,
                '"' | '\'' => {
                    let s = self.read_string(false)?;
                    self.push(TokenKind::Str(s));
                }
                c if c.is_ascii_digit() => {
                    let kind = self.read_number()?;
                    self.push(kind);
                }
                '.' if matches!(self.peek(1), Some(d) if d.is_ascii_digit()) => {
                    let kind = self.read_number()?;
                    self.push(kind);
                }
                c if c == '_' || c.is_alphabetic() => {
                    if let Some(raw) = self.string_prefix() {
                        let s = self.read_string(raw)?;
                        self.push(TokenKind::Str(s));
                    } else {
                        let name = self.read_name();
                        self.push(TokenKind::Name(name));
                    }
                }
                _ => {
                    let op = self.read_op()?;
                    match op {
                        "(" | "[" | "{" => self.depth += 1,
                        ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
                        _ => {}
                    }
                    self.push(TokenKind::Op(op));
                }
            }
        }
        if self.depth != 0 {
            return Err(self.error("unexpected end of input inside brackets"));
        }
        self.finish_line();
        Ok(self.lines)
    }

    fn push(&mut self, kind: TokenKind) {
        let line = self.line;
        if let Some(current) = self.current.as_mut() {
            current.tokens.push(Token { kind, line });
        }
    }

    fn finish_line(&mut self) {
        if let Some(current) = self.current.take() {
            if !current.tokens.is_empty() {
                self.lines.push(current);
            }
        }
    }

    fn skip_indentation(&mut self) -> usize {
        let mut col = 0;
        while let Some(c) = self.peek(0) {
            match c {
                ' ' => col += 1,
                '\t' => col = (col / TAB_SIZE + 1) * TAB_SIZE,
                '\x0c' => col = 0,
                _ => break,
            }
            self.pos += 1;
        }
        col
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_to_line_end(&mut self) {
        self.skip_comment();
        if self.peek(0).is_some() {
            self.pos += 1;
            self.line += 1;
        }
    }

    /// If a string prefix (`r`, `b`, `f`, `u` and combinations) starts here,
    /// consume it and return whether the string is raw.
    fn string_prefix(&mut self) -> Option<bool> {
        let mut len = 0;
        while len < 2 {
            match self.peek(len) {
                Some(c) if "rRbBfFuU".contains(c) => len += 1,
                _ => break,
            }
        }
        if len == 0 || !matches!(self.peek(len), Some('"') | Some('\'')) {
            return None;
        }
        let prefix: String = self.chars[self.pos..self.pos + len].iter().collect();
        let prefix = prefix.to_ascii_lowercase();
        let valid = matches!(
            prefix.as_str(),
            "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
        );
        if !valid {
            return None;
        }
        self.pos += len;
        Some(prefix.contains('r'))
    }

    fn read_string(&mut self, raw: bool) -> Result<String, LexError> {
        let quote = self.peek(0).ok_or_else(|| self.error("expected string"))?;
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut out = String::new();
        loop {
            let Some(c) = self.peek(0) else {
                return Err(self.error("unterminated string literal"));
            };
            if c == quote {
                if !triple {
                    self.pos += 1;
                    return Ok(out);
                }
                if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                    self.pos += 3;
                    return Ok(out);
                }
            }
            match c {
                '\n' if !triple => return Err(self.error("newline in single-quoted string")),
                '\n' => {
                    self.line += 1;
                    out.push('\n');
                    self.pos += 1;
                }
                '\\' => {
                    let Some(next) = self.peek(1) else {
                        return Err(self.error("unterminated string literal"));
                    };
                    if next == '\n' {
                        self.line += 1;
                    }
                    if raw {
                        out.push('\\');
                        out.push(next);
                        self.pos += 2;
                    } else {
                        self.pos += 2;
                        self.read_escape(next, &mut out)?;
                    }
                }
                _ => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn read_escape(&mut self, esc: char, out: &mut String) -> Result<(), LexError> {
        match esc {
            '\n' => {}
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' | '\'' | '"' => out.push(esc),
            'x' => out.push(self.read_hex_escape(2)?),
            'u' => out.push(self.read_hex_escape(4)?),
            'U' => out.push(self.read_hex_escape(8)?),
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek(0).and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).ok_or_else(|| self.error("invalid octal escape"))?);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn read_hex_escape(&mut self, digits: usize) -> Result<char, LexError> {
        let end = self.pos + digits;
        if end > self.chars.len() {
            return Err(self.error("truncated hex escape"));
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        let value =
            u32::from_str_radix(&hex, 16).map_err(|_| self.error(format!("bad escape '{hex}'")))?;
        self.pos = end;
        char::from_u32(value).ok_or_else(|| self.error(format!("invalid code point {value:#x}")))
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            if c == '_' || c.is_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_number(&mut self) -> Result<TokenKind, LexError> {
        let radix = match (self.peek(0), self.peek(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            self.pos += 2;
            let digits = self.take_digits(|c| c.is_digit(radix));
            return i64::from_str_radix(&digits, radix)
                .map(TokenKind::Int)
                .map_err(|e| self.error(format!("invalid integer literal: {e}")));
        }

        let mut text = self.take_digits(|c| c.is_ascii_digit());
        let mut is_float = false;
        if self.peek(0) == Some('.') {
            is_float = true;
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_digits(|c| c.is_ascii_digit()));
        }
        if matches!(self.peek(0), Some('e' | 'E')) {
            let sign = matches!(self.peek(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if matches!(self.peek(digit_at), Some(d) if d.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                if sign {
                    text.push(self.peek(1).unwrap_or('+'));
                }
                self.pos += digit_at;
                text.push_str(&self.take_digits(|c| c.is_ascii_digit()));
            }
        }
        if matches!(self.peek(0), Some('j' | 'J')) {
            return Err(self.error("complex literals are not supported"));
        }

        if is_float {
            let text = if text.starts_with('.') {
                format!("0{text}")
            } else {
                text
            };
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|e| self.error(format!("invalid float literal: {e}")))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|e| self.error(format!("invalid integer literal: {e}")))
        }
    }

    fn take_digits(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek(0) {
            if c == '_' {
                self.pos += 1;
            } else if accept(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn read_op(&mut self) -> Result<&'static str, LexError> {
        for table in [OPS3, OPS2, OPS1] {
            for op in table {
                let len = op.chars().count();
                let matches = op
                    .chars()
                    .enumerate()
                    .all(|(i, c)| self.peek(i) == Some(c));
                if matches {
                    self.pos += len;
                    return Ok(op);
                }
            }
        }
        let c = self.peek(0).unwrap_or(' ');
        Err(self.error(format!("unexpected character '{c}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &LogicalLine) -> Vec<TokenKind> {
        line.tokens.iter().map(|t| t.kind.clone()).collect()
    }

    #[test]
    fn joins_lines_inside_brackets() {
        let src = "x = [\n    1,  # one\n    0x2_0,\n]\ny = 2\n";
        let lines = logical_lines(src).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            kinds(&lines[0]),
            vec![
                TokenKind::Name("x".into()),
                TokenKind::Op("="),
                TokenKind::Op("["),
                TokenKind::Int(1),
                TokenKind::Op(","),
                TokenKind::Int(0x20),
                TokenKind::Op(","),
                TokenKind::Op("]"),
            ]
        );
        assert_eq!(lines[1].line, 5);
    }

    #[test]
    fn records_indentation() {
        let src = "class A:\n    def f(self):\n\n        # note\n        a = 1\n";
        let lines = logical_lines(src).unwrap();
        let indents: Vec<usize> = lines.iter().map(|l| l.indent).collect();
        assert_eq!(indents, vec![0, 4, 8]);
    }

    #[test]
    fn reads_strings_and_escapes() {
        let src = r#"s = 'a\tb' + "q\"" + r'\d' + f"{x}" + '''multi
line'''"#;
        let lines = logical_lines(src).unwrap();
        let strings: Vec<String> = lines[0]
            .tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Str(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["a\tb", "q\"", "\\d", "{x}", "multi\nline"]);
    }

    #[test]
    fn reads_numbers() {
        let lines = logical_lines("a = 0.7, 1e-3, .5, 10, 0o17, 0b101").unwrap();
        let numbers: Vec<TokenKind> = kinds(&lines[0])
            .into_iter()
            .filter(|k| matches!(k, TokenKind::Int(_) | TokenKind::Float(_)))
            .collect();
        assert_eq!(
            numbers,
            vec![
                TokenKind::Float(0.7),
                TokenKind::Float(0.001),
                TokenKind::Float(0.5),
                TokenKind::Int(10),
                TokenKind::Int(15),
                TokenKind::Int(5),
            ]
        );
    }

    #[test]
    fn backslash_continuation_joins_lines() {
        let lines = logical_lines("a = 1 + \\\n    2\nb = 3").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].tokens.len(), 5);
    }

    #[test]
    fn crlf_line_endings_match_lf() {
        let crlf = "class A:\r\n    a = [1,\r\n         2]\r\n\r\n    b = 3 + \\\r\n        4\r\n";
        let lf = crlf.replace("\r\n", "\n");
        let from_crlf = logical_lines(crlf).unwrap();
        let from_lf = logical_lines(&lf).unwrap();
        assert_eq!(from_crlf.len(), 3);
        assert_eq!(
            from_crlf.iter().map(kinds).collect::<Vec<_>>(),
            from_lf.iter().map(kinds).collect::<Vec<_>>()
        );
        let shape: Vec<(usize, usize)> = from_crlf.iter().map(|l| (l.indent, l.line)).collect();
        assert_eq!(shape, vec![(0, 1), (4, 2), (4, 5)]);
    }

    #[test]
    fn integer_wider_than_i64_fails_the_whole_source() {
        for src in [
            "a = 1\nb = 99999999999999999999\n",
            "a = 1\nb = 0x1ffffffffffffffff\n",
        ] {
            let err = logical_lines(src).unwrap_err();
            assert_eq!(err.line, 2, "{src}");
            assert!(err.message.contains("invalid integer literal"), "{src}");
        }
        assert_eq!(
            kinds(&logical_lines("a = 9223372036854775807").unwrap()[0])[2],
            TokenKind::Int(i64::MAX)
        );
    }

    #[test]
    fn rejects_unbalanced_brackets() {
        let err = logical_lines("a = [1, 2").unwrap_err();
        assert!(err.message.contains("brackets"));
    }
}
