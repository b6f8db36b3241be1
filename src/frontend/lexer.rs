// src/frontend/lexer.rs

use crate::errors::LexerError;
use crate::frontend::{Span, Token, TokenType};

/// Lex an entire source file into a token stream ending with `Eof`.
///
/// Lexing stops at the first invalid construct and reports it; the
/// parser never sees a partially lexed file.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.ty == TokenType::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'src> {
    source: &'src str,
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    start_line: u32,
    start_column: u32,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
        }
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace();

        self.start = self.current;
        self.start_line = self.line;
        self.start_column = self.column;

        let Some(c) = self.advance() else {
            return Ok(self.make_token(TokenType::Eof));
        };

        match c {
            '(' => Ok(self.make_token(TokenType::LParen)),
            ')' => Ok(self.make_token(TokenType::RParen)),
            '{' => Ok(self.make_token(TokenType::LBrace)),
            '}' => Ok(self.make_token(TokenType::RBrace)),
            '[' => Ok(self.make_token(TokenType::LBracket)),
            ']' => Ok(self.make_token(TokenType::RBracket)),
            ',' => Ok(self.make_token(TokenType::Comma)),
            ';' => Ok(self.make_token(TokenType::Semicolon)),
            ':' => Ok(self.make_token(TokenType::Colon)),
            '.' => Ok(self.make_token(TokenType::Dot)),

            '+' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenType::PlusEq))
                } else {
                    Ok(self.make_token(TokenType::Plus))
                }
            }
            '-' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenType::MinusEq))
                } else {
                    Ok(self.make_token(TokenType::Minus))
                }
            }
            '*' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenType::StarEq))
                } else {
                    Ok(self.make_token(TokenType::Star))
                }
            }
            '=' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenType::EqEq))
                } else {
                    Ok(self.make_token(TokenType::Eq))
                }
            }
            '<' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenType::LtEq))
                } else {
                    Ok(self.make_token(TokenType::Lt))
                }
            }
            '>' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenType::GtEq))
                } else {
                    Ok(self.make_token(TokenType::Gt))
                }
            }

            // Slash, assignment form, or comment
            '/' => {
                if self.match_char('/') {
                    self.line_comment();
                    self.next_token()
                } else if self.match_char('*') {
                    self.block_comment()?;
                    self.next_token()
                } else if self.match_char('=') {
                    Ok(self.make_token(TokenType::SlashEq))
                } else {
                    Ok(self.make_token(TokenType::Slash))
                }
            }

            // Hash comments run to the end of the line
            '#' => {
                self.line_comment();
                self.next_token()
            }

            // Either quote style delimits a string
            '\'' | '"' => self.string(c),

            c if c.is_ascii_digit() => Ok(self.number()),

            // Identifiers are strictly alphanumeric; no underscores
            c if c.is_ascii_alphabetic() => Ok(self.identifier()),

            _ => Err(LexerError::UnexpectedCharacter {
                ch: c,
                span: self.span().into(),
            }),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ') | Some('\t') | Some('\r') | Some('\n') = self.peek() {
            self.advance();
        }
    }

    /// Advance to the next character and return it
    fn advance(&mut self) -> Option<char> {
        if let Some((idx, c)) = self.chars.next() {
            self.current = idx + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }

    /// Peek at the next character without consuming it
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Consume the next character if it matches the expected character
    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn span(&self) -> Span {
        Span::new(self.start, self.current, self.start_line, self.start_column)
    }

    /// Create a token from start to current position
    fn make_token(&self, ty: TokenType) -> Token {
        let lexeme = &self.source[self.start..self.current];
        Token::new(ty, lexeme, self.span())
    }

    /// Skip to the end of the line without consuming the newline
    fn line_comment(&mut self) {
        while self.peek() != Some('\n') && self.peek().is_some() {
            self.advance();
        }
    }

    /// Skip a `/* ... */` comment, which may span lines
    fn block_comment(&mut self) -> Result<(), LexerError> {
        loop {
            match self.advance() {
                None => {
                    return Err(LexerError::UnterminatedBlockComment {
                        span: self.span().into(),
                    });
                }
                Some('*') => {
                    if self.match_char('/') {
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Scan a string literal delimited by `quote`.
    ///
    /// Strings may span multiple lines and have no escape sequences;
    /// the token's lexeme is the content without the quotes.
    fn string(&mut self, quote: char) -> Result<Token, LexerError> {
        loop {
            match self.advance() {
                None => {
                    return Err(LexerError::UnterminatedString {
                        span: self.span().into(),
                    });
                }
                Some(c) if c == quote => {
                    let lexeme = &self.source[self.start + 1..self.current - 1];
                    return Ok(Token::new(TokenType::Str, lexeme, self.span()));
                }
                Some(_) => {}
            }
        }
    }

    /// Scan a number literal.
    ///
    /// Digits alone make an integer; a trailing dot switches to a
    /// scalar whether or not fractional digits follow, so `5.` is a
    /// valid scalar literal.
    fn number(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        if self.match_char('.') {
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
            return self.make_token(TokenType::Scalar);
        }

        self.make_token(TokenType::Integer)
    }

    /// Scan an identifier or keyword
    fn identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[self.start..self.current];
        let ty = Self::keyword_type(text).unwrap_or(TokenType::Identifier);
        self.make_token(ty)
    }

    /// Check if a string is a keyword and return its token type
    fn keyword_type(text: &str) -> Option<TokenType> {
        match text {
            "import" => Some(TokenType::KwImport),
            "export" => Some(TokenType::KwExport),
            "function" => Some(TokenType::KwFunction),
            "object" => Some(TokenType::KwObject),
            "as" => Some(TokenType::KwAs),
            "syscall" => Some(TokenType::KwSyscall),
            "ptr" => Some(TokenType::KwPtr),
            "if" => Some(TokenType::KwIf),
            "for" => Some(TokenType::KwFor),
            "while" => Some(TokenType::KwWhile),
            "else" => Some(TokenType::KwElse),
            "return" => Some(TokenType::KwReturn),
            "type" => Some(TokenType::KwType),
            "let" => Some(TokenType::KwLet),
            "const" => Some(TokenType::KwConst),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_types(source: &str) -> Vec<TokenType> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.ty)
            .collect()
    }

    #[test]
    fn lex_single_char_tokens() {
        assert_eq!(
            token_types("( ) { } [ ] , ; : ."),
            vec![
                TokenType::LParen,
                TokenType::RParen,
                TokenType::LBrace,
                TokenType::RBrace,
                TokenType::LBracket,
                TokenType::RBracket,
                TokenType::Comma,
                TokenType::Semicolon,
                TokenType::Colon,
                TokenType::Dot,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lex_operators() {
        assert_eq!(
            token_types("+ - * / == <= >= += -= *= /= < > ="),
            vec![
                TokenType::Plus,
                TokenType::Minus,
                TokenType::Star,
                TokenType::Slash,
                TokenType::EqEq,
                TokenType::LtEq,
                TokenType::GtEq,
                TokenType::PlusEq,
                TokenType::MinusEq,
                TokenType::StarEq,
                TokenType::SlashEq,
                TokenType::Lt,
                TokenType::Gt,
                TokenType::Eq,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lex_keywords() {
        assert_eq!(
            token_types("import export function object as syscall ptr"),
            vec![
                TokenType::KwImport,
                TokenType::KwExport,
                TokenType::KwFunction,
                TokenType::KwObject,
                TokenType::KwAs,
                TokenType::KwSyscall,
                TokenType::KwPtr,
                TokenType::Eof,
            ]
        );
        assert_eq!(
            token_types("if for while else return type let const"),
            vec![
                TokenType::KwIf,
                TokenType::KwFor,
                TokenType::KwWhile,
                TokenType::KwElse,
                TokenType::KwReturn,
                TokenType::KwType,
                TokenType::KwLet,
                TokenType::KwConst,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn lex_numbers() {
        let tokens = tokenize("42 3.25 5.").unwrap();
        assert_eq!(tokens[0].ty, TokenType::Integer);
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].ty, TokenType::Scalar);
        assert_eq!(tokens[1].lexeme, "3.25");
        assert_eq!(tokens[2].ty, TokenType::Scalar);
        assert_eq!(tokens[2].lexeme, "5.");
    }

    #[test]
    fn lex_digits_then_dot_always_scalar() {
        // The dot binds to the number, so the rest lexes separately
        assert_eq!(
            token_types("5.x"),
            vec![TokenType::Scalar, TokenType::Identifier, TokenType::Eof]
        );
    }

    #[test]
    fn lex_strings_either_quote() {
        let tokens = tokenize("'exit' \"status\"").unwrap();
        assert_eq!(tokens[0].ty, TokenType::Str);
        assert_eq!(tokens[0].lexeme, "exit");
        assert_eq!(tokens[1].ty, TokenType::Str);
        assert_eq!(tokens[1].lexeme, "status");
    }

    #[test]
    fn lex_strings_span_lines() {
        let tokens = tokenize("'first\nsecond'").unwrap();
        assert_eq!(tokens[0].ty, TokenType::Str);
        assert_eq!(tokens[0].lexeme, "first\nsecond");
    }

    #[test]
    fn lex_unterminated_string() {
        let result = tokenize("'never closed");
        assert!(matches!(
            result,
            Err(LexerError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn lex_comments() {
        assert_eq!(
            token_types("// slashes\n# hash\n/* block\nspanning */ 7"),
            vec![TokenType::Integer, TokenType::Eof]
        );
    }

    #[test]
    fn lex_unterminated_block_comment() {
        let result = tokenize("/* never closed");
        assert!(matches!(
            result,
            Err(LexerError::UnterminatedBlockComment { .. })
        ));
    }

    #[test]
    fn lex_underscore_rejected() {
        let result = tokenize("foo_bar");
        assert!(matches!(
            result,
            Err(LexerError::UnexpectedCharacter { ch: '_', .. })
        ));
    }

    #[test]
    fn lex_bang_rejected() {
        let result = tokenize("a != b");
        assert!(matches!(
            result,
            Err(LexerError::UnexpectedCharacter { ch: '!', .. })
        ));
    }

    #[test]
    fn lex_spans_track_lines() {
        let tokens = tokenize("let\n  exit").unwrap();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.column, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
    }
}
