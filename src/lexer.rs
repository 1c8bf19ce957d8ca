//! Scanner for ES5 source text.
//!
//! The lexer skips whitespace and comments itself and reports whether a line
//! terminator was crossed, which is all automatic semicolon insertion needs.
//! A `/` is always scanned as a punctuator; the parser asks for a rescan as a
//! regular expression literal where the grammar expects an expression.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Finally,
    For,
    Function,
    If,
    In,
    Instanceof,
    New,
    Return,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    // future reserved words
    Class,
    Const,
    Enum,
    Export,
    Extends,
    Import,
    Super,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("break", Keyword::Break),
    ("case", Keyword::Case),
    ("catch", Keyword::Catch),
    ("continue", Keyword::Continue),
    ("debugger", Keyword::Debugger),
    ("default", Keyword::Default),
    ("delete", Keyword::Delete),
    ("do", Keyword::Do),
    ("else", Keyword::Else),
    ("finally", Keyword::Finally),
    ("for", Keyword::For),
    ("function", Keyword::Function),
    ("if", Keyword::If),
    ("in", Keyword::In),
    ("instanceof", Keyword::Instanceof),
    ("new", Keyword::New),
    ("return", Keyword::Return),
    ("switch", Keyword::Switch),
    ("this", Keyword::This),
    ("throw", Keyword::Throw),
    ("try", Keyword::Try),
    ("typeof", Keyword::Typeof),
    ("var", Keyword::Var),
    ("void", Keyword::Void),
    ("while", Keyword::While),
    ("with", Keyword::With),
    ("class", Keyword::Class),
    ("const", Keyword::Const),
    ("enum", Keyword::Enum),
    ("export", Keyword::Export),
    ("extends", Keyword::Extends),
    ("import", Keyword::Import),
    ("super", Keyword::Super),
];

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS.iter().find(|(text, _)| *text == word).map(|&(_, k)| k)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, k)| *k == self)
            .map_or("", |(text, _)| text)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Semicolon,
    Comma,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Plus,
    Minus,
    Star,
    Percent,
    PlusPlus,
    MinusMinus,
    Shl,
    Sar,
    Shr,
    Amp,
    Pipe,
    Caret,
    Bang,
    Tilde,
    AmpAmp,
    PipePipe,
    Question,
    Colon,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    PercentEq,
    ShlEq,
    SarEq,
    ShrEq,
    AmpEq,
    PipeEq,
    CaretEq,
    Slash,
    SlashEq,
}

/// Ordered longest first: the first entry that prefixes the input is the token.
const PUNCTUATORS: &[(&str, Punct)] = &[
    (">>>=", Punct::ShrEq),
    ("===", Punct::EqEqEq),
    ("!==", Punct::NotEqEq),
    (">>>", Punct::Shr),
    ("<<=", Punct::ShlEq),
    (">>=", Punct::SarEq),
    ("<=", Punct::LessEq),
    (">=", Punct::GreaterEq),
    ("==", Punct::EqEq),
    ("!=", Punct::NotEq),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("<<", Punct::Shl),
    (">>", Punct::Sar),
    ("&&", Punct::AmpAmp),
    ("||", Punct::PipePipe),
    ("+=", Punct::PlusEq),
    ("-=", Punct::MinusEq),
    ("*=", Punct::StarEq),
    ("%=", Punct::PercentEq),
    ("&=", Punct::AmpEq),
    ("|=", Punct::PipeEq),
    ("^=", Punct::CaretEq),
    ("/=", Punct::SlashEq),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    (".", Punct::Dot),
    (";", Punct::Semicolon),
    (",", Punct::Comma),
    ("<", Punct::Less),
    (">", Punct::Greater),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("%", Punct::Percent),
    ("&", Punct::Amp),
    ("|", Punct::Pipe),
    ("^", Punct::Caret),
    ("!", Punct::Bang),
    ("~", Punct::Tilde),
    ("?", Punct::Question),
    (":", Punct::Colon),
    ("=", Punct::Eq),
    ("/", Punct::Slash),
];

impl Punct {
    pub fn as_str(self) -> &'static str {
        PUNCTUATORS
            .iter()
            .find(|(_, p)| *p == self)
            .map_or("", |(text, _)| text)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Identifier(String),
    Keyword(Keyword),
    Punct(Punct),
    Number(f64),
    /// `017`, or a decimal written with a leading zero such as `09`.
    LegacyOctal(f64),
    String {
        units: Vec<u16>,
        /// Holds an octal escape such as `\101`, which strict code rejects.
        legacy_octal: bool,
    },
    Boolean(bool),
    Null,
    RegExp {
        pattern: String,
        flags: String,
    },
    Eof,
}

/// A token with its byte span in the source.
#[derive(Clone, Debug)]
pub struct Lexeme {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    /// A line terminator (possibly inside a comment) precedes the token.
    pub newline_before: bool,
}

#[derive(Clone, Debug)]
pub struct LexError {
    pub message: String,
    pub line: u32,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.message, self.line)
    }
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0, line: 1 }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn next_lexeme(&mut self) -> Result<Lexeme, LexError> {
        let newline_before = self.skip_trivia()?;
        let start = self.pos;
        let token = self.scan_token()?;
        Ok(Lexeme { token, start, end: self.pos, newline_before })
    }

    /// Rescans the `/` or `/=` punctuator starting at `start` as a regular
    /// expression literal.
    pub fn scan_regexp(&mut self, start: usize) -> Result<Lexeme, LexError> {
        self.pos = start + 1;
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            let c = match self.bump() {
                Some(c) if !is_line_terminator(c) => c,
                _ => return Err(self.error("Unterminated regular expression literal")),
            };
            match c {
                '/' if !in_class => break,
                '\\' => {
                    pattern.push(c);
                    match self.bump() {
                        Some(escaped) if !is_line_terminator(escaped) => pattern.push(escaped),
                        _ => return Err(self.error("Unterminated regular expression literal")),
                    }
                    continue;
                }
                '[' => in_class = true,
                ']' => in_class = false,
                _ => {}
            }
            pattern.push(c);
        }
        let flags = self.take_while(is_identifier_part).to_string();
        Ok(Lexeme {
            token: Token::RegExp { pattern, flags },
            start,
            end: self.pos,
            newline_before: false,
        })
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError { message: message.into(), line: self.line }
    }

    /// Skips whitespace, line terminators and comments. Returns whether a line
    /// terminator was among them.
    fn skip_trivia(&mut self) -> Result<bool, LexError> {
        let mut newline = false;
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                self.take_while(|c| !is_line_terminator(c));
            } else if let Some(comment) = rest.strip_prefix("/*") {
                let Some(len) = comment.find("*/") else {
                    return Err(self.error("Unterminated comment"));
                };
                let breaks = count_line_breaks(&comment[..len]);
                if breaks > 0 {
                    newline = true;
                    self.line += breaks;
                }
                self.pos += len + 4;
            } else {
                match self.peek() {
                    Some(c) if is_line_terminator(c) => {
                        self.bump();
                        if c == '\r' {
                            self.eat('\n');
                        }
                        self.line += 1;
                        newline = true;
                    }
                    Some(c) if is_whitespace(c) => {
                        self.bump();
                    }
                    _ => return Ok(newline),
                }
            }
        }
    }

    fn scan_token(&mut self) -> Result<Token, LexError> {
        match self.peek() {
            None => Ok(Token::Eof),
            Some('"' | '\'') => self.scan_string(),
            Some(c) if c.is_ascii_digit() => self.scan_number(),
            Some('.') if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            Some(c) if c == '\\' || is_identifier_start(c) => self.scan_word(),
            Some(c) => {
                let rest = self.rest();
                match PUNCTUATORS.iter().find(|(text, _)| rest.starts_with(text)) {
                    Some(&(text, punct)) => {
                        self.pos += text.len();
                        Ok(Token::Punct(punct))
                    }
                    None => Err(self.error(format!("Unexpected character '{c}'"))),
                }
            }
        }
    }

    fn scan_word(&mut self) -> Result<Token, LexError> {
        let mut name = String::new();
        let mut escaped = false;
        loop {
            match self.peek() {
                Some('\\') => {
                    self.bump();
                    let c = self.scan_identifier_escape(name.is_empty())?;
                    name.push(c);
                    escaped = true;
                }
                Some(c) if name.is_empty() && is_identifier_start(c) => {
                    self.bump();
                    name.push(c);
                }
                Some(c) if !name.is_empty() && is_identifier_part(c) => {
                    self.bump();
                    name.push(c);
                }
                _ => break,
            }
        }
        // An escaped reserved word is still an Identifier token; the parser rejects it
        // wherever an identifier is required.
        if escaped {
            return Ok(Token::Identifier(name));
        }
        let reserved = match name.as_str() {
            "null" => Some(Token::Null),
            "true" => Some(Token::Boolean(true)),
            "false" => Some(Token::Boolean(false)),
            word => Keyword::lookup(word).map(Token::Keyword),
        };
        Ok(reserved.unwrap_or_else(|| Token::Identifier(name)))
    }

    fn scan_identifier_escape(&mut self, first: bool) -> Result<char, LexError> {
        if !self.eat('u') {
            return Err(self.error("Invalid Unicode escape sequence in identifier"));
        }
        let unit = self.scan_hex_digits(4)?;
        char::from_u32(u32::from(unit))
            .filter(|&c| if first { is_identifier_start(c) } else { is_identifier_part(c) })
            .ok_or_else(|| self.error("Invalid Unicode escape sequence in identifier"))
    }

    fn scan_number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            let digits = self.take_while(|c| c.is_ascii_hexdigit());
            if digits.is_empty() {
                return Err(self.error("Missing hexadecimal digits"));
            }
            return self.end_number(Token::Number(digits_value(digits, 16)));
        }
        let digits = self.take_while(|c| c.is_ascii_digit());
        let leading_zero = digits.len() > 1 && digits.starts_with('0');
        if leading_zero && digits.bytes().all(|b| b < b'8') {
            return self.end_number(Token::LegacyOctal(digits_value(&digits[1..], 8)));
        }
        if self.eat('.') {
            self.take_while(|c| c.is_ascii_digit());
        }
        if self.eat('e') || self.eat('E') {
            if !self.eat('+') {
                self.eat('-');
            }
            if self.take_while(|c| c.is_ascii_digit()).is_empty() {
                return Err(self.error("Missing exponent digits"));
            }
        }
        let text = &self.src[start..self.pos];
        let value: f64 = text
            .parse()
            .map_err(|_| self.error(format!("Invalid number '{text}'")))?;
        if leading_zero {
            self.end_number(Token::LegacyOctal(value))
        } else {
            self.end_number(Token::Number(value))
        }
    }

    /// A numeric literal may not run straight into an identifier or another digit.
    fn end_number(&self, token: Token) -> Result<Token, LexError> {
        match self.peek() {
            Some(c) if c == '\\' || c.is_ascii_digit() || is_identifier_start(c) => {
                Err(self.error("Identifier starts immediately after numeric literal"))
            }
            _ => Ok(token),
        }
    }

    fn scan_string(&mut self) -> Result<Token, LexError> {
        let quote = self.bump();
        let mut units = Vec::new();
        let mut legacy_octal = false;
        loop {
            match self.bump() {
                c if c == quote => break,
                Some('\\') => self.scan_escape(&mut units, &mut legacy_octal)?,
                Some(c) if !is_line_terminator(c) => push_char(&mut units, c),
                _ => return Err(self.error("Unterminated string literal")),
            }
        }
        Ok(Token::String { units, legacy_octal })
    }

    fn scan_escape(&mut self, units: &mut Vec<u16>, legacy_octal: &mut bool) -> Result<(), LexError> {
        let Some(c) = self.bump() else {
            return Err(self.error("Unterminated string literal"));
        };
        let unit = match c {
            'b' => 0x08,
            't' => 0x09,
            'n' => 0x0A,
            'v' => 0x0B,
            'f' => 0x0C,
            'r' => 0x0D,
            'x' => self.scan_hex_digits(2)?,
            'u' => self.scan_hex_digits(4)?,
            '0' if !self.peek().is_some_and(|d| d.is_ascii_digit()) => 0,
            '0'..='7' => {
                *legacy_octal = true;
                self.scan_octal_escape(c)
            }
            // line continuation
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => {
                if c == '\r' {
                    self.eat('\n');
                }
                self.line += 1;
                return Ok(());
            }
            other => {
                push_char(units, other);
                return Ok(());
            }
        };
        units.push(unit);
        Ok(())
    }

    /// Up to three octal digits, the first already consumed; `\400` and above
    /// stop after two.
    fn scan_octal_escape(&mut self, first: char) -> u16 {
        let max_digits = if first <= '3' { 3 } else { 2 };
        let mut value = first.to_digit(8).unwrap_or(0);
        for _ in 1..max_digits {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(d) => {
                    self.bump();
                    value = value * 8 + d;
                }
                None => break,
            }
        }
        value as u16
    }

    fn scan_hex_digits(&mut self, count: usize) -> Result<u16, LexError> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self.peek().and_then(|c| c.to_digit(16));
            let Some(d) = digit else {
                return Err(self.error("Invalid hexadecimal escape sequence"));
            };
            self.bump();
            value = value * 16 + d;
        }
        Ok(value as u16)
    }
}

fn push_char(units: &mut Vec<u16>, c: char) {
    let mut buf = [0u16; 2];
    units.extend_from_slice(c.encode_utf16(&mut buf));
}

fn digits_value(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d))
}

fn count_line_breaks(text: &str) -> u32 {
    let terminators = text.chars().filter(|&c| is_line_terminator(c)).count();
    (terminators - text.matches("\r\n").count()) as u32
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_whitespace(c: char) -> bool {
    c == '\u{FEFF}' || (c.is_whitespace() && !is_line_terminator(c))
}

fn is_identifier_start(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_alphabetic() || c == '$' || c == '_'
    } else {
        unicode_ident::is_xid_start(c)
    }
}

fn is_identifier_part(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_alphanumeric() || c == '$' || c == '_'
    } else {
        c == '\u{200C}' || c == '\u{200D}' || unicode_ident::is_xid_continue(c)
    }
}
