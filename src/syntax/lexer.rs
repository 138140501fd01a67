use smol_str::SmolStr;

use crate::ast::{Pos, Span};

use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Str,
    Num,
    // Keywords
    Function,
    Return,
    Var,
    Let,
    Const,
    If,
    Else,
    While,
    True,
    False,
    Null,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Dot,
    Arrow,
    Eq,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AndAnd,
    OrOr,
    Not,
    Eof,
}

impl TokenKind {
    /// How the token is described in "expected ..., found ..." parse errors
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Str => "string",
            TokenKind::Num => "number",
            TokenKind::Function => "`function`",
            TokenKind::Return => "`return`",
            TokenKind::Var => "`var`",
            TokenKind::Let => "`let`",
            TokenKind::Const => "`const`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::While => "`while`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Null => "`null`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semi => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Dot => "`.`",
            TokenKind::Arrow => "`=>`",
            TokenKind::Eq => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::EqEqEq => "`===`",
            TokenKind::NotEq => "`!=`",
            TokenKind::NotEqEq => "`!==`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::Le => "`<=`",
            TokenKind::Ge => "`>=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Not => "`!`",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A lexed token. `text` is the identifier name, the unquoted string value,
/// or the raw number spelling; empty for punctuation and keywords.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    pub span: Span,
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    i: usize,
    pos: Pos,
}

/// Lex a whole source unit, ending with an [TokenKind::Eof] token
pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer {
        source,
        chars: source.chars().collect(),
        i: 0,
        pos: Pos { line: 1, column: 0 },
    }
    .run()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    text: SmolStr::default(),
                    span: Span { start, end: start },
                });
                return Ok(tokens);
            };
            let token = if is_ident_start(c) {
                self.ident(start)
            } else if c.is_ascii_digit() {
                self.number(start)
            } else if c == '"' || c == '\'' {
                self.string(start)?
            } else {
                self.punct(start)?
            };
            tokens.push(token);
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.chars.get(self.i + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += 1;
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 0;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, at: Pos, message: String) -> ParseError {
        ParseError::new(at, message, self.source)
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.pos;
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.error(start, "unterminated comment".to_owned()))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn ident(&mut self, start: Pos) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            name.push(c);
            self.bump();
        }
        let kind = match name.as_str() {
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident,
        };
        let text = if kind == TokenKind::Ident { SmolStr::new(&name) } else { SmolStr::default() };
        Token { kind, text, span: Span { start, end: self.pos } }
    }

    fn number(&mut self, start: Pos) -> Token {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            raw.push(c);
            self.bump();
        }
        if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
            raw.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                raw.push(c);
                self.bump();
            }
        }
        Token {
            kind: TokenKind::Num,
            text: SmolStr::new(&raw),
            span: Span { start, end: self.pos },
        }
    }

    fn string(&mut self, start: Pos) -> Result<Token, ParseError> {
        let quote = self.bump().unwrap_or_default();
        let mut raw = String::from(quote);
        loop {
            match self.bump() {
                Some('\\') => {
                    raw.push('\\');
                    match self.bump() {
                        Some(c) => raw.push(c),
                        None => {
                            return Err(self.error(start, "unterminated string literal".to_owned()))
                        }
                    }
                }
                Some(c) if c == quote => {
                    raw.push(c);
                    break;
                }
                Some('\n') | None => {
                    return Err(self.error(start, "unterminated string literal".to_owned()))
                }
                Some(c) => raw.push(c),
            }
        }
        let cooked = enquote::unquote(&raw)
            .map_err(|err| self.error(start, format!("invalid string literal: {}", err)))?;
        Ok(Token {
            kind: TokenKind::Str,
            text: SmolStr::new(&cooked),
            span: Span { start, end: self.pos },
        })
    }

    fn punct(&mut self, start: Pos) -> Result<Token, ParseError> {
        let c = self.bump().unwrap_or_default();
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semi,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::NotEqEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AndAnd
                } else {
                    return Err(self.error(start, "unexpected character `&`".to_owned()));
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::OrOr
                } else {
                    return Err(self.error(start, "unexpected character `|`".to_owned()));
                }
            }
            other => {
                return Err(self.error(start, format!("unexpected character `{}`", other)));
            }
        };
        Ok(Token {
            kind,
            text: SmolStr::default(),
            span: Span { start, end: self.pos },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_defer_binding() {
        assert_eq!(
            kinds("defer: x = F(a, 2);"),
            vec![
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Num,
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_multi_char_operators() {
        assert_eq!(
            kinds("=== !== => <= && ||"),
            vec![
                TokenKind::EqEqEq,
                TokenKind::NotEqEq,
                TokenKind::Arrow,
                TokenKind::Le,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unquotes_strings() {
        let tokens = lex(r#"f("a\nb");"#).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Str);
        assert_eq!(tokens[2].text.as_str(), "a\nb");
    }

    #[test]
    fn tracks_lines_and_columns() {
        let tokens = lex("a();\nb();\n").unwrap();
        let b = &tokens[4];
        assert_eq!(b.span.start.line, 2);
        assert_eq!(b.span.start.column, 0);
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = lex("f('oops").unwrap_err();
        assert!(err.message.contains("unterminated string"));
        assert_eq!(err.pos.line, 1);
    }
}
