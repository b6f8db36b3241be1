// src/frontend/token.rs

/// All token types in the Spinel language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Literals
    Integer,
    Scalar,
    Str,
    Identifier,

    // Keywords
    KwImport,
    KwExport,
    KwFunction,
    KwObject,
    KwAs,
    KwSyscall,
    KwPtr,
    KwIf,
    KwFor,
    KwWhile,
    KwElse,
    KwReturn,
    KwType,
    KwLet,
    KwConst,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    LtEq,
    GtEq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    Lt,
    Gt,
    Eq,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,

    // Special
    Eof,
}

impl TokenType {
    /// Get string representation for error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Scalar => "scalar",
            Self::Str => "string",
            Self::Identifier => "identifier",
            Self::KwImport => "import",
            Self::KwExport => "export",
            Self::KwFunction => "function",
            Self::KwObject => "object",
            Self::KwAs => "as",
            Self::KwSyscall => "syscall",
            Self::KwPtr => "ptr",
            Self::KwIf => "if",
            Self::KwFor => "for",
            Self::KwWhile => "while",
            Self::KwElse => "else",
            Self::KwReturn => "return",
            Self::KwType => "type",
            Self::KwLet => "let",
            Self::KwConst => "const",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::EqEq => "==",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::PlusEq => "+=",
            Self::MinusEq => "-=",
            Self::StarEq => "*=",
            Self::SlashEq => "/=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "=",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Eof => "end of file",
        }
    }

    /// Get precedence for binary operators (Pratt parsing).
    ///
    /// `>` and `>=` are lexed but are not operators in the grammar, so they
    /// stay at precedence 0 along with the compound-assignment tokens.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::EqEq => 1,
            Self::Lt | Self::LtEq => 2,
            Self::Plus | Self::Minus => 3,
            Self::Star | Self::Slash => 4,
            _ => 0,
        }
    }
}

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize, // Byte offset
    pub end: usize,   // Byte offset (exclusive)
    pub line: u32,    // Start line (1-indexed)
    pub column: u32,  // Start column (1-indexed)
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Span covering both inputs, anchored at `self`'s start position.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            line: self.line,
            column: self.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len().max(1)).into()
    }
}

/// A token with its location in source code
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub ty: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(ty: TokenType, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            ty,
            lexeme: lexeme.into(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge_keeps_start_and_extends_end() {
        let a = Span::new(0, 5, 1, 1);
        let b = Span::new(8, 12, 2, 3);
        let merged = a.merge(b);

        assert_eq!(merged.start, 0);
        assert_eq!(merged.end, 12);
        assert_eq!(merged.line, 1);
        assert_eq!(merged.column, 1);
    }

    #[test]
    fn precedence_orders_binary_operators() {
        assert!(TokenType::Star.precedence() > TokenType::Plus.precedence());
        assert!(TokenType::Plus.precedence() > TokenType::Lt.precedence());
        assert!(TokenType::Lt.precedence() > TokenType::EqEq.precedence());
        assert!(TokenType::EqEq.precedence() > 0);
    }

    #[test]
    fn unparsed_tokens_have_no_precedence() {
        assert_eq!(TokenType::Gt.precedence(), 0);
        assert_eq!(TokenType::GtEq.precedence(), 0);
        assert_eq!(TokenType::PlusEq.precedence(), 0);
        assert_eq!(TokenType::Eq.precedence(), 0);
    }

    #[test]
    fn source_span_conversion_never_empty() {
        let span = Span::new(4, 4, 1, 5);
        let converted: miette::SourceSpan = span.into();
        assert_eq!(converted.offset(), 4);
        assert_eq!(converted.len(), 1);
    }
}
