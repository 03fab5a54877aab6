//! Tokenizer for reference text and canonical IDs.
//!
//! Arity markers stay attached to the identifier they follow (`List`1`,
//! `Convert``1`); a backtick run with no identifier in front is a positional
//! generic backreference instead.

use std::fmt;

use crate::error::{Error, Malformed};

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was recognised.
    pub kind: TokenKind,
    /// Byte offset of the first character in the input.
    pub offset: usize,
}

/// Token tags. Payloads hold identifier text, backreference positions, or array ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `[]` or `[0:,0:]`, carrying the rank.
    ArraySuffix(u32),
    /// `@`
    At,
    /// `}`
    CloseBrace,
    /// `)`
    CloseParen,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// End of input; always the last token.
    EndOfInput,
    /// ``` ``n ``` with no identifier in front.
    MethodGenericRef(u32),
    /// Identifier, arity marker kept verbatim.
    Name(String),
    /// `{`
    OpenBrace,
    /// `(`
    OpenParen,
    /// `*`
    Star,
    /// `~`, introduces a conversion operator's return type.
    Tilde,
    /// `` `n `` with no identifier in front.
    TypeGenericRef(u32),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            TokenKind::ArraySuffix(rank) => write!(f, "array suffix of rank {rank}"),
            TokenKind::At => write!(f, "`@`"),
            TokenKind::CloseBrace => write!(f, "`}}`"),
            TokenKind::CloseParen => write!(f, "`)`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Dot => write!(f, "`.`"),
            TokenKind::EndOfInput => write!(f, "end of input"),
            TokenKind::MethodGenericRef(n) => write!(f, "`{}{n}`", "``"),
            TokenKind::Name(text) => write!(f, "name `{text}`"),
            TokenKind::OpenBrace => write!(f, "`{{`"),
            TokenKind::OpenParen => write!(f, "`(`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::Tilde => write!(f, "`~`"),
            TokenKind::TypeGenericRef(n) => write!(f, "`{}{n}`", '`'),
        };
    }
}

/// Cursor over the input. Offsets always sit on a char boundary.
struct Lexer<'src> {
    /// Full input text, kept for error reporting.
    input: &'src str,
    /// Byte offset of the next unread character.
    offset: usize,
}

impl<'src> Lexer<'src> {
    /// Advance past `len` bytes.
    const fn advance(&mut self, len: usize) {
        self.offset = self.offset.saturating_add(len);
    }

    /// Build a lexical error at the current offset.
    fn error(&self, reason: Malformed) -> Error {
        return Error::MalformedReference {
            input: self.input.to_string(),
            position: self.offset,
            reason,
        };
    }

    /// Lex `[]` or `[0:` (`,0:`)* `]`.
    ///
    /// # Errors
    ///
    /// Returns `Malformed::UnexpectedCharacter('[')` for any other bracket form.
    fn lex_array_suffix(&mut self) -> Result<TokenKind, Error> {
        let rest = self.rest();
        if rest.starts_with("[]") {
            self.advance(2);
            return Ok(TokenKind::ArraySuffix(1));
        }

        let Some(mut tail) = rest.strip_prefix("[0:") else {
            return Err(self.error(Malformed::UnexpectedCharacter('[')));
        };
        let mut rank = 1_u32;
        while let Some(next) = tail.strip_prefix(",0:") {
            rank = rank.saturating_add(1);
            tail = next;
        }
        let Some(after) = tail.strip_prefix(']') else {
            return Err(self.error(Malformed::UnexpectedCharacter('[')));
        };

        let consumed = rest.len().saturating_sub(after.len());
        self.advance(consumed);
        return Ok(TokenKind::ArraySuffix(rank));
    }

    /// Lex a free-standing backreference: one or two backticks then digits.
    ///
    /// # Errors
    ///
    /// Returns `Malformed::UnexpectedCharacter('`')` when no digits follow.
    fn lex_backreference(&mut self) -> Result<TokenKind, Error> {
        let rest = self.rest();
        let (ticks, digits_start) = if rest.starts_with("``") { (2, 2) } else { (1, 1) };
        let digits = leading_digits(rest.get(digits_start..).unwrap_or(""));
        if digits.is_empty() {
            return Err(self.error(Malformed::UnexpectedCharacter('`')));
        }

        let position = digits.parse::<u32>().map_err(|_err| return self.error(Malformed::NumberOutOfRange))?;
        self.advance(digits_start.saturating_add(digits.len()));

        if ticks == 2 {
            return Ok(TokenKind::MethodGenericRef(position));
        }
        return Ok(TokenKind::TypeGenericRef(position));
    }

    /// Lex an identifier run and an attached arity marker, if any.
    fn lex_name(&mut self) -> TokenKind {
        let rest = self.rest();
        let word_len = rest
            .char_indices()
            .find(|&(_, c)| return !is_word_char(c))
            .map_or(rest.len(), |(i, _)| return i);
        let after_word = rest.get(word_len..).unwrap_or("");

        let marker_len = arity_marker_len(after_word);
        let total = word_len.saturating_add(marker_len);
        let text = rest.get(..total).unwrap_or(rest).to_string();

        self.advance(total);
        return TokenKind::Name(text);
    }

    /// Produce the next token, skipping whitespace.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedReference` for characters that start no token.
    fn next_token(&mut self) -> Result<Token, Error> {
        let trimmed = self.rest().trim_start();
        let skipped = self.rest().len().saturating_sub(trimmed.len());
        self.advance(skipped);

        let offset = self.offset;
        let Some(c) = self.rest().chars().next() else {
            return Ok(Token { kind: TokenKind::EndOfInput, offset });
        };

        let kind = match c {
            '`' => self.lex_backreference()?,
            '[' => self.lex_array_suffix()?,
            _ if is_identifier_start(c) => self.lex_name(),
            _ => {
                let kind = single_char_token(c).ok_or_else(|| return self.error(Malformed::UnexpectedCharacter(c)))?;
                self.advance(c.len_utf8());
                kind
            },
        };

        return Ok(Token { kind, offset });
    }

    /// The unread remainder of the input.
    fn rest(&self) -> &'src str {
        return self.input.get(self.offset..).unwrap_or("");
    }
}

/// Length of an arity marker (`` `n `` or ``` ``n ```) at the start of `text`, or 0.
fn arity_marker_len(text: &str) -> usize {
    let ticks = text.chars().take(2).take_while(|&c| return c == '`').count();
    if ticks == 0 {
        return 0;
    }
    let digits = leading_digits(text.get(ticks..).unwrap_or(""));
    if digits.is_empty() {
        return 0;
    }
    return ticks.saturating_add(digits.len());
}

/// Identifiers start with a letter, `_`, or `#` (`#ctor`), never a digit.
fn is_identifier_start(c: char) -> bool {
    return c.is_alphabetic() || c == '_' || c == '#';
}

/// Characters allowed inside an identifier run. `#` stands in for `.` in
/// explicit interface implementation names.
fn is_word_char(c: char) -> bool {
    return c.is_alphanumeric() || c == '_' || c == '#';
}

/// The run of ASCII digits at the start of `text`.
fn leading_digits(text: &str) -> &str {
    let len = text.find(|c: char| return !c.is_ascii_digit()).unwrap_or(text.len());
    return text.get(..len).unwrap_or("");
}

/// Map punctuation to its token.
const fn single_char_token(c: char) -> Option<TokenKind> {
    return match c {
        '(' => Some(TokenKind::OpenParen),
        ')' => Some(TokenKind::CloseParen),
        '*' => Some(TokenKind::Star),
        ',' => Some(TokenKind::Comma),
        '.' => Some(TokenKind::Dot),
        '@' => Some(TokenKind::At),
        '{' => Some(TokenKind::OpenBrace),
        '}' => Some(TokenKind::CloseBrace),
        '~' => Some(TokenKind::Tilde),
        _ => None,
    };
}

/// Tokenize the whole input. The result always ends with `EndOfInput`.
///
/// # Errors
///
/// Returns `Error::MalformedReference` naming the first offending character.
pub fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    return tokenize_from(input, 0);
}

/// Tokenize `input` starting at byte offset `start`, so that offsets in the
/// tokens and in errors stay relative to the full text.
///
/// # Errors
///
/// Returns `Error::MalformedReference` naming the first offending character.
pub fn tokenize_from(input: &str, start: usize) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer { input, offset: start };
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::EndOfInput;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        return tokenize(input).unwrap().into_iter().map(|t| return t.kind).collect();
    }

    #[test]
    fn arity_markers_stay_on_names() {
        assert_eq!(
            kinds("List`1.Convert``2"),
            vec![
                TokenKind::Name("List`1".to_string()),
                TokenKind::Dot,
                TokenKind::Name("Convert``2".to_string()),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn detached_backticks_are_backreferences() {
        assert_eq!(
            kinds("(`0,``12)"),
            vec![
                TokenKind::OpenParen,
                TokenKind::TypeGenericRef(0),
                TokenKind::Comma,
                TokenKind::MethodGenericRef(12),
                TokenKind::CloseParen,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn array_suffix_ranks() {
        assert_eq!(kinds("[]"), vec![TokenKind::ArraySuffix(1), TokenKind::EndOfInput]);
        assert_eq!(kinds("[0:]"), vec![TokenKind::ArraySuffix(1), TokenKind::EndOfInput]);
        assert_eq!(kinds("[0:,0:,0:]"), vec![TokenKind::ArraySuffix(3), TokenKind::EndOfInput]);
    }

    #[test]
    fn constructor_and_interface_names_are_single_tokens() {
        assert_eq!(kinds("#ctor"), vec![TokenKind::Name("#ctor".to_string()), TokenKind::EndOfInput]);
        assert_eq!(
            kinds("System#IDisposable#Dispose"),
            vec![TokenKind::Name("System#IDisposable#Dispose".to_string()), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn whitespace_between_tokens_is_skipped() {
        let tokens = tokenize("Resize( int , int )").unwrap();
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens.get(2).map(|t| return t.offset), Some(8));
    }

    #[test]
    fn unknown_character_reports_position() {
        let err = tokenize("Widget.Re$ize").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedReference { position: 9, reason: Malformed::UnexpectedCharacter('$'), .. }
        ));
    }

    #[test]
    fn bare_backtick_without_digits_is_rejected() {
        assert!(matches!(
            tokenize("`x").unwrap_err(),
            Error::MalformedReference { reason: Malformed::UnexpectedCharacter('`'), .. }
        ));
    }

    #[test]
    fn unclosed_rank_bracket_is_rejected() {
        assert!(matches!(
            tokenize("Int32[0:,0:").unwrap_err(),
            Error::MalformedReference { position: 5, reason: Malformed::UnexpectedCharacter('['), .. }
        ));
    }

    #[test]
    fn leading_digit_is_not_an_identifier() {
        assert!(tokenize("1abc").is_err());
    }
}
