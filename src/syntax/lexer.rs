use crate::error::{ExitForgeError, Result};

/// One lexical token of the strategy dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    Assign,
    Pipe,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    LtE,
    Gt,
    GtE,
    EqEq,
    NotEq,
}

/// Tokenize a single logical line. `#` starts a comment running to the
/// end of the line.
pub fn tokenize_line(line: &str, line_no: usize) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '#' => break,
            '(' => push_single(&mut tokens, &mut chars, Token::LParen),
            ')' => push_single(&mut tokens, &mut chars, Token::RParen),
            '[' => push_single(&mut tokens, &mut chars, Token::LBracket),
            ']' => push_single(&mut tokens, &mut chars, Token::RBracket),
            ',' => push_single(&mut tokens, &mut chars, Token::Comma),
            ':' => push_single(&mut tokens, &mut chars, Token::Colon),
            '.' => push_single(&mut tokens, &mut chars, Token::Dot),
            '|' => push_single(&mut tokens, &mut chars, Token::Pipe),
            '+' => push_single(&mut tokens, &mut chars, Token::Plus),
            '-' => push_single(&mut tokens, &mut chars, Token::Minus),
            '*' => push_single(&mut tokens, &mut chars, Token::Star),
            '/' => push_single(&mut tokens, &mut chars, Token::Slash),
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::EqEq);
                } else {
                    tokens.push(Token::Assign);
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::LtE);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::GtE);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::NotEq);
                } else {
                    return Err(ExitForgeError::Parse(format!(
                        "line {}: unexpected '!'",
                        line_no
                    )));
                }
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    if ch == quote {
                        closed = true;
                        break;
                    }
                    s.push(ch);
                }
                if !closed {
                    return Err(ExitForgeError::Parse(format!(
                        "line {}: unterminated string literal",
                        line_no
                    )));
                }
                tokens.push(Token::Str(s));
            }
            _ if c.is_ascii_digit() => {
                let mut text = String::new();
                let mut is_float = false;
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        text.push(d);
                        chars.next();
                    } else if d == '.' && !is_float {
                        is_float = true;
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if is_float {
                    let value = text.parse::<f64>().map_err(|_| {
                        ExitForgeError::Parse(format!(
                            "line {}: invalid number '{}'",
                            line_no, text
                        ))
                    })?;
                    tokens.push(Token::Float(value));
                } else {
                    let value = text.parse::<i64>().map_err(|_| {
                        ExitForgeError::Parse(format!(
                            "line {}: invalid number '{}'",
                            line_no, text
                        ))
                    })?;
                    tokens.push(Token::Int(value));
                }
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            _ => {
                return Err(ExitForgeError::Parse(format!(
                    "line {}: unexpected character '{}'",
                    line_no, c
                )));
            }
        }
    }

    Ok(tokens)
}

fn push_single(
    tokens: &mut Vec<Token>,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    token: Token,
) {
    chars.next();
    tokens.push(token);
}
