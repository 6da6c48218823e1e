use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    /// `[4101]`: substitute the raw value of a register
    Register(u16),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Shl,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    Question,
    Colon,
}

/// A token and the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, EvalError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let token = match c {
            b'0'..=b'9' | b'.' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                number(source, &source[start..i], start)?
            }
            b'[' => {
                i += 1;
                let digits_start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i == digits_start || i >= bytes.len() || bytes[i] != b']' {
                    return Err(EvalError::syntax(
                        source,
                        format!("malformed register reference at offset {}", start),
                    ));
                }
                let register = source[digits_start..i].parse::<u16>().map_err(|_| {
                    EvalError::syntax(
                        source,
                        format!("register number out of range at offset {}", start),
                    )
                })?;
                i += 1;
                Token::Register(register)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                Token::Ident(source[start..i].to_ascii_lowercase())
            }
            _ => {
                let next = bytes.get(i + 1).copied();
                let (token, width) = match (c, next) {
                    (b'<', Some(b'<')) => (Token::Shl, 2),
                    (b'<', Some(b'=')) => (Token::Le, 2),
                    (b'>', Some(b'=')) => (Token::Ge, 2),
                    (b'=', Some(b'=')) => (Token::EqEq, 2),
                    (b'!', Some(b'=')) => (Token::Ne, 2),
                    (b'<', _) => (Token::Lt, 1),
                    (b'>', _) => (Token::Gt, 1),
                    (b'(', _) => (Token::LParen, 1),
                    (b')', _) => (Token::RParen, 1),
                    (b',', _) => (Token::Comma, 1),
                    (b'+', _) => (Token::Plus, 1),
                    (b'-', _) => (Token::Minus, 1),
                    (b'*', _) => (Token::Star, 1),
                    (b'/', _) => (Token::Slash, 1),
                    (b'?', _) => (Token::Question, 1),
                    (b':', _) => (Token::Colon, 1),
                    _ => {
                        let ch = source[start..].chars().next().unwrap_or('?');
                        return Err(EvalError::syntax(
                            source,
                            format!("unexpected character '{}' at offset {}", ch, start),
                        ));
                    }
                };
                i += width;
                token
            }
        };

        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    Ok(tokens)
}

fn number(source: &str, text: &str, offset: usize) -> Result<Token, EvalError> {
    let invalid = || EvalError::syntax(source, format!("invalid number '{}' at offset {}", text, offset));
    if text.contains('.') {
        if text.matches('.').count() > 1 || text == "." {
            return Err(invalid());
        }
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Token::Float)
            .ok_or_else(invalid)
    } else {
        text.parse::<i64>().map(Token::Int).map_err(|_| invalid())
    }
}
