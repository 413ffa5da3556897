//! Token kinds of the policy language.

use super::lexer::LogosToken;

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // Trivia
    WHITESPACE,
    COMMENT,

    WORD,

    // Punctuation
    EQ,
    COMMA,
    SEMICOLON,
    L_BRACE,
    R_BRACE,
    L_BRACKET,
    R_BRACKET,
    AMP,
    BANG,

    ERROR,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::COMMENT)
    }

    /// Human readable form used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::WHITESPACE => "whitespace",
            Self::COMMENT => "comment",
            Self::WORD => "name",
            Self::EQ => "'='",
            Self::COMMA => "','",
            Self::SEMICOLON => "';'",
            Self::L_BRACE => "'{'",
            Self::R_BRACE => "'}'",
            Self::L_BRACKET => "'['",
            Self::R_BRACKET => "']'",
            Self::AMP => "'&'",
            Self::BANG => "'!'",
            Self::ERROR => "invalid character",
        }
    }
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => Self::WHITESPACE,
            LogosToken::Comment => Self::COMMENT,
            LogosToken::Word => Self::WORD,
            LogosToken::Eq => Self::EQ,
            LogosToken::Comma => Self::COMMA,
            LogosToken::Semicolon => Self::SEMICOLON,
            LogosToken::LBrace => Self::L_BRACE,
            LogosToken::RBrace => Self::R_BRACE,
            LogosToken::LBracket => Self::L_BRACKET,
            LogosToken::RBracket => Self::R_BRACKET,
            LogosToken::Amp => Self::AMP,
            LogosToken::Bang => Self::BANG,
        }
    }
}
