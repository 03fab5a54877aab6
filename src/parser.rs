//! Recursive-descent parser for reference text.
//!
//! ```text
//! reference   := member ( '(' paramList? ')' ( '~' type )? )?
//! member      := NAME ('.' NAME)*
//! paramList   := type (',' type)*
//! type        := ( genericRef | typeChain ) ARRAY* ( '@' | '*' )?
//! typeChain   := nameWithArgs ('.' nameWithArgs)*
//! nameWithArgs:= NAME ( '{' type (',' type)* '}' )?
//! ```

use crate::ast::{Node, Reference};
use crate::error::{Error, Malformed};
use crate::lexer::{self, Token, TokenKind};
use crate::types::SymbolKind;

/// Parser state over a fully lexed token list.
struct Parser<'src> {
    /// Index of the current token.
    cursor: usize,
    /// Open `(` / `{` groups with their offsets, innermost last.
    groups: Vec<(char, usize)>,
    /// Original text, for error reporting.
    input: &'src str,
    /// Tokens, always terminated by `EndOfInput`.
    tokens: Vec<Token>,
}

impl Parser<'_> {
    /// Consume the current token. Never moves past `EndOfInput`.
    fn bump(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if kind != TokenKind::EndOfInput {
            self.cursor = self.cursor.saturating_add(1);
        }
        return kind;
    }

    /// Close the innermost group with `closer`.
    ///
    /// # Errors
    ///
    /// Returns `UnterminatedGroup` at end of input, `UnexpectedToken` otherwise.
    fn close_group(&mut self, closer: &TokenKind, expected: &'static str) -> Result<(), Error> {
        if self.peek() == closer {
            self.bump();
            self.groups.pop();
            return Ok(());
        }
        return Err(self.unexpected(expected));
    }

    /// Build an error at the current token.
    fn error(&self, reason: Malformed) -> Error {
        return Error::MalformedReference {
            input: self.input.to_string(),
            position: self.offset(),
            reason,
        };
    }

    /// Require end of input after a complete production.
    ///
    /// # Errors
    ///
    /// Returns `TrailingInput` naming the first extra token.
    fn expect_end(&self) -> Result<(), Error> {
        if *self.peek() == TokenKind::EndOfInput {
            return Ok(());
        }
        return Err(self.error(Malformed::TrailingInput { found: self.peek().to_string() }));
    }

    /// Consume a `Name` token and return its text.
    ///
    /// # Errors
    ///
    /// Returns a malformed-reference error if the current token is not a name.
    fn expect_name(&mut self) -> Result<String, Error> {
        if let TokenKind::Name(text) = self.peek() {
            let text = text.clone();
            self.bump();
            return Ok(text);
        }
        return Err(self.unexpected("a name"));
    }

    /// Byte offset of the current token.
    fn offset(&self) -> usize {
        return self.tokens.get(self.cursor).map_or(self.input.len(), |t| return t.offset);
    }

    /// Open a group at the current token and consume its opener.
    fn open_group(&mut self, opener: char) {
        self.groups.push((opener, self.offset()));
        self.bump();
    }

    /// `member := NAME ('.' NAME)*`
    ///
    /// # Errors
    ///
    /// Returns a malformed-reference error on a missing segment.
    fn parse_member(&mut self) -> Result<Node, Error> {
        let mut node = Node::Name { parent: None, text: self.expect_name()? };
        while *self.peek() == TokenKind::Dot {
            self.bump();
            let text = self.expect_name()?;
            node = Node::Name { parent: Some(Box::new(node)), text };
        }
        return Ok(node);
    }

    /// `nameWithArgs := NAME ( '{' type (',' type)* '}' )?`
    ///
    /// # Errors
    ///
    /// Returns a malformed-reference error on a bad argument list.
    fn parse_name_with_args(&mut self, parent: Option<Node>) -> Result<Node, Error> {
        let text = self.expect_name()?;
        let node = Node::Name { parent: parent.map(Box::new), text };
        if *self.peek() != TokenKind::OpenBrace {
            return Ok(node);
        }

        self.open_group('{');
        let arguments = self.parse_type_list()?;
        self.close_group(&TokenKind::CloseBrace, "`,` or `}`")?;
        return Ok(Node::GenericInstantiation { arguments, parent: Box::new(node) });
    }

    /// `reference := member ( '(' paramList? ')' ( '~' type )? )?`
    ///
    /// # Errors
    ///
    /// Returns a malformed-reference error if the grammar is violated.
    fn parse_reference(&mut self) -> Result<Node, Error> {
        let member = self.parse_member()?;
        if *self.peek() != TokenKind::OpenParen {
            return Ok(member);
        }

        self.open_group('(');
        let parameters = if *self.peek() == TokenKind::CloseParen {
            Vec::new()
        } else {
            self.parse_type_list()?
        };
        self.close_group(&TokenKind::CloseParen, "`,` or `)`")?;

        let return_type = if *self.peek() == TokenKind::Tilde {
            self.bump();
            Some(Box::new(self.parse_type()?))
        } else {
            None
        };

        return Ok(Node::MethodReference { member: Box::new(member), parameters, return_type });
    }

    /// `type := ( genericRef | typeChain ) ARRAY* ( '@' | '*' )?`
    ///
    /// # Errors
    ///
    /// Returns a malformed-reference error if no type starts here.
    fn parse_type(&mut self) -> Result<Node, Error> {
        let mut node = match self.peek() {
            TokenKind::MethodGenericRef(position) => {
                let position = *position;
                self.bump();
                Node::MethodGenericParam { position }
            },
            TokenKind::Name(_) => self.parse_type_chain()?,
            TokenKind::TypeGenericRef(position) => {
                let position = *position;
                self.bump();
                Node::TypeGenericParam { position }
            },
            _ => return Err(self.unexpected("a type")),
        };

        while let TokenKind::ArraySuffix(rank) = self.peek() {
            let rank = *rank;
            self.bump();
            node = Node::ArrayOf { inner: Box::new(node), rank };
        }

        match self.peek() {
            TokenKind::At => {
                self.bump();
                node = Node::ByRefOf { inner: Box::new(node) };
            },
            TokenKind::Star => {
                self.bump();
                node = Node::PointerOf { inner: Box::new(node) };
            },
            _ => {},
        }

        return Ok(node);
    }

    /// `typeChain := nameWithArgs ('.' nameWithArgs)*`
    ///
    /// # Errors
    ///
    /// Returns a malformed-reference error on a missing segment.
    fn parse_type_chain(&mut self) -> Result<Node, Error> {
        let mut node = self.parse_name_with_args(None)?;
        while *self.peek() == TokenKind::Dot {
            self.bump();
            node = self.parse_name_with_args(Some(node))?;
        }
        return Ok(node);
    }

    /// `type (',' type)*`
    ///
    /// # Errors
    ///
    /// Returns a malformed-reference error on a bad element.
    fn parse_type_list(&mut self) -> Result<Vec<Node>, Error> {
        let mut types = vec![self.parse_type()?];
        while *self.peek() == TokenKind::Comma {
            self.bump();
            types.push(self.parse_type()?);
        }
        return Ok(types);
    }

    /// The current token.
    fn peek(&self) -> &TokenKind {
        return self.tokens.get(self.cursor).map_or(&TokenKind::EndOfInput, |t| return &t.kind);
    }

    /// Error for a token the grammar does not allow here. Running out of input
    /// inside a group reports the group instead.
    fn unexpected(&self, expected: &'static str) -> Error {
        if *self.peek() == TokenKind::EndOfInput
            && let Some(&(opener, position)) = self.groups.last()
        {
            return Error::MalformedReference {
                input: self.input.to_string(),
                position,
                reason: Malformed::UnterminatedGroup { opener },
            };
        }
        return self.error(Malformed::UnexpectedToken { expected, found: self.peek().to_string() });
    }
}

/// Parse a reference or canonical ID, with an optional `X:` kind prefix.
///
/// # Errors
///
/// Returns `Error::MalformedReference` if the text violates the grammar,
/// including any input left over after a complete reference.
pub fn parse(input: &str) -> Result<Reference, Error> {
    let (kind, start) = split_kind_prefix(input)?;
    let mut parser = start_parser(input, start)?;

    let node = parser.parse_reference()?;
    parser.expect_end()?;
    return Ok(Reference { kind, node });
}

/// Parse a lone type expression such as `System.Int32[]@` or ``` ``0 ```.
///
/// # Errors
///
/// Returns `Error::MalformedReference` if the text is not exactly one type.
pub fn parse_type(input: &str) -> Result<Node, Error> {
    let mut parser = start_parser(input, 0)?;
    let node = parser.parse_type()?;
    parser.expect_end()?;
    return Ok(node);
}

/// Split an optional `X:` prefix off the input, returning the kind and where the body starts.
/// Leading whitespace before the prefix is skipped; offsets stay relative to `input`.
///
/// # Errors
///
/// Returns `UnexpectedCharacter` for a prefix letter that names no symbol kind.
fn split_kind_prefix(input: &str) -> Result<(Option<SymbolKind>, usize), Error> {
    let body = input.trim_start();
    let skipped = input.len().saturating_sub(body.len());
    let mut chars = body.chars();
    let (Some(letter), Some(':')) = (chars.next(), chars.next()) else {
        return Ok((None, skipped));
    };
    let Some(kind) = SymbolKind::from_prefix(letter) else {
        return Err(Error::MalformedReference {
            input: input.to_string(),
            position: skipped,
            reason: Malformed::UnexpectedCharacter(letter),
        });
    };
    return Ok((Some(kind), skipped.saturating_add(letter.len_utf8()).saturating_add(1)));
}

/// Lex the input from `start` and set up a parser over it.
///
/// # Errors
///
/// Returns lexical errors from the tokenizer.
fn start_parser(input: &str, start: usize) -> Result<Parser<'_>, Error> {
    let tokens = lexer::tokenize_from(input, start)?;
    return Ok(Parser { cursor: 0, groups: Vec::new(), input, tokens });
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    fn reason(input: &str) -> Malformed {
        let Err(Error::MalformedReference { reason, .. }) = parse(input) else {
            panic!("expected malformed reference for {input}");
        };
        return reason;
    }

    #[test]
    fn plain_member_chain() {
        let reference = parse("Demo.Widget.Resize").unwrap();
        assert_eq!(reference.kind, None);
        assert_eq!(reference.node, Node::name("Demo").child("Widget").child("Resize"));
    }

    #[test]
    fn method_reference_with_parameters() {
        let reference = parse("M:Widget.Resize(System.Int32,System.Int32)").unwrap();
        assert_eq!(reference.kind, Some(SymbolKind::Method));
        let int32 = Node::name("System").child("Int32");
        assert_eq!(
            reference.node,
            Node::MethodReference {
                member: Box::new(Node::name("Widget").child("Resize")),
                parameters: vec![int32.clone(), int32],
                return_type: None,
            }
        );
    }

    #[test]
    fn zero_parameter_call_is_distinct_from_bare_name() {
        let reference = parse("Box`1.Map``1()").unwrap();
        let Node::MethodReference { member, parameters, .. } = reference.node else {
            panic!("expected method reference");
        };
        assert!(parameters.is_empty());
        assert_eq!(*member, Node::name("Box`1").child("Map``1"));
    }

    #[test]
    fn generic_instantiation_wraps_preceding_chain() {
        let node = parse_type("Outer{`0}.Inner{``1,System.String}").unwrap();
        let outer = Node::GenericInstantiation {
            arguments: vec![Node::TypeGenericParam { position: 0 }],
            parent: Box::new(Node::name("Outer")),
        };
        assert_eq!(
            node,
            Node::GenericInstantiation {
                arguments: vec![
                    Node::MethodGenericParam { position: 1 },
                    Node::name("System").child("String"),
                ],
                parent: Box::new(Node::Name { parent: Some(Box::new(outer)), text: "Inner".to_string() }),
            }
        );
    }

    #[test]
    fn array_suffixes_apply_before_by_ref() {
        let node = parse_type("System.Int32[][0:,0:]@").unwrap();
        let int32 = Node::name("System").child("Int32");
        let jagged = Node::ArrayOf {
            inner: Box::new(Node::ArrayOf { inner: Box::new(int32), rank: 1 }),
            rank: 2,
        };
        assert_eq!(node, Node::ByRefOf { inner: Box::new(jagged) });
    }

    #[test]
    fn array_of_by_ref_is_rejected() {
        assert!(matches!(
            parse_type("System.Int32@[]"),
            Err(Error::MalformedReference { reason: Malformed::TrailingInput { .. }, .. })
        ));
    }

    #[test]
    fn backreferences_take_suffixes() {
        assert_eq!(
            parse_type("``0[]").unwrap(),
            Node::ArrayOf { inner: Box::new(Node::MethodGenericParam { position: 0 }), rank: 1 }
        );
        assert_eq!(
            parse_type("`1*").unwrap(),
            Node::PointerOf { inner: Box::new(Node::TypeGenericParam { position: 1 }) }
        );
    }

    #[test]
    fn backreference_is_not_a_chain_segment() {
        assert!(matches!(reason("Widget.`0"), Malformed::UnexpectedToken { expected: "a name", .. }));
    }

    #[test]
    fn conversion_suffix_after_parameters() {
        let reference = parse("Widget.op_Implicit(Widget)~System.Int32").unwrap();
        let Node::MethodReference { return_type: Some(ret), .. } = reference.node else {
            panic!("expected return type");
        };
        assert_eq!(*ret, Node::name("System").child("Int32"));
    }

    #[test]
    fn double_dot_is_unexpected_token() {
        assert!(matches!(reason("Widget..Resize("), Malformed::UnexpectedToken { .. }));
    }

    #[test]
    fn open_paren_at_end_is_unterminated() {
        assert_eq!(reason("Widget.Resize("), Malformed::UnterminatedGroup { opener: '(' });
        assert_eq!(reason("Widget.Resize(System.Int32"), Malformed::UnterminatedGroup { opener: '(' });
        assert_eq!(reason("Use(List{System.Int32"), Malformed::UnterminatedGroup { opener: '{' });
    }

    #[test]
    fn unterminated_group_points_at_opener() {
        let Err(Error::MalformedReference { position, .. }) = parse("Widget.Resize(System.Int32,") else {
            panic!("expected error");
        };
        assert_eq!(position, 13);
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(matches!(reason("Widget.Resize() Widget"), Malformed::TrailingInput { .. }));
        assert!(matches!(reason("Widget~System.Int32"), Malformed::TrailingInput { .. }));
    }

    #[test]
    fn unknown_kind_prefix_is_rejected() {
        assert_eq!(reason("X:Widget"), Malformed::UnexpectedCharacter('X'));
    }

    #[test]
    fn leading_whitespace_before_kind_prefix_is_skipped() {
        let reference = parse("  T:Demo.Widget").unwrap();
        assert_eq!(reference.kind, Some(SymbolKind::Type));
        assert_eq!(reference.node, Node::name("Demo").child("Widget"));

        let Err(Error::MalformedReference { position, .. }) = parse("  M:Widget.Resize(System.Int32,") else {
            panic!("expected error");
        };
        assert_eq!(position, 17);
        let Err(Error::MalformedReference { position, .. }) = parse(" X:Widget") else {
            panic!("expected error");
        };
        assert_eq!(position, 1);
    }

    #[test]
    fn display_round_trips_canonical_text() {
        for text in [
            "M:Demo.Widget.Resize(System.Int32,System.Int32)",
            "M:System.Collections.Generic.Dictionary`2.KeyCollection.CopyTo(`0[],System.Int32)",
            "M:Demo.Widget.op_Implicit(Demo.Widget)~System.Int32",
            "T:Demo.Box`1",
        ] {
            assert_eq!(parse(text).unwrap().to_string(), text);
        }
    }
}
