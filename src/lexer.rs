//! A lexer for the `sap` language.
//!
//! Hand-written, single pass, one character of lookahead. On unrecognized
//! input it emits an [`TokenKind::Unknown`] token and keeps scanning so that
//! later diagnostics remain usable; the token stream always ends with an
//! explicit [`TokenKind::Eof`].

use std::str::Chars;

use crate::files::FileId;
use crate::reporting::{LexerMessage, Message};
use crate::source::{BytePos, ByteRange, FileRange};
use crate::{Interner, Symbol};

/// Tokens that will be produced during lexing.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifiers
    Ident(Symbol),
    /// String literals, with escapes already processed
    Str(String),
    /// Integer literals (optionally negative)
    Int(i64),

    /// Open curly brace: `{`
    LBrace,
    /// Close curly brace: `}`
    RBrace,
    /// Open parenthesis: `(`
    LParen,
    /// Close parenthesis: `)`
    RParen,
    /// Open bracket: `[`
    LBracket,
    /// Close bracket: `]`
    RBracket,
    Comma,
    Dot,
    Equals,
    Colon,
    Semi,
    Star,
    Lt,
    Gt,

    KeywordModule,
    KeywordImport,
    KeywordStruct,
    KeywordUnion,
    KeywordEnum,
    KeywordAttribute,
    KeywordTypename,
    KeywordConst,
    KeywordUsing,
    KeywordNamespace,
    KeywordUse,
    KeywordTrue,
    KeywordFalse,
    KeywordNull,

    /// Unrecognized input; always accompanied by a lexical error.
    Unknown,
    /// Explicit end-of-file marker, always the last token.
    Eof,
}

impl TokenKind {
    pub fn description(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::Str(_) => "string literal",
            TokenKind::Int(_) => "integer literal",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Equals => "`=`",
            TokenKind::Colon => "`:`",
            TokenKind::Semi => "`;`",
            TokenKind::Star => "`*`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::KeywordModule => "`module`",
            TokenKind::KeywordImport => "`import`",
            TokenKind::KeywordStruct => "`struct`",
            TokenKind::KeywordUnion => "`union`",
            TokenKind::KeywordEnum => "`enum`",
            TokenKind::KeywordAttribute => "`attribute`",
            TokenKind::KeywordTypename => "`typename`",
            TokenKind::KeywordConst => "`const`",
            TokenKind::KeywordUsing => "`using`",
            TokenKind::KeywordNamespace => "`namespace`",
            TokenKind::KeywordUse => "`use`",
            TokenKind::KeywordTrue => "`true`",
            TokenKind::KeywordFalse => "`false`",
            TokenKind::KeywordNull => "`null`",
            TokenKind::Unknown => "unrecognized input",
            TokenKind::Eof => "end of file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub range: FileRange,
}

/// Reserved-word lookup. Applied only to a fully lexed identifier, so a
/// keyword is never matched as a prefix of a longer name.
fn keyword(ident: &str) -> Option<TokenKind> {
    match ident {
        "module" => Some(TokenKind::KeywordModule),
        "import" => Some(TokenKind::KeywordImport),
        "struct" => Some(TokenKind::KeywordStruct),
        "union" => Some(TokenKind::KeywordUnion),
        "enum" => Some(TokenKind::KeywordEnum),
        "attribute" => Some(TokenKind::KeywordAttribute),
        "typename" => Some(TokenKind::KeywordTypename),
        "const" => Some(TokenKind::KeywordConst),
        "using" => Some(TokenKind::KeywordUsing),
        "namespace" => Some(TokenKind::KeywordNamespace),
        "use" => Some(TokenKind::KeywordUse),
        "true" => Some(TokenKind::KeywordTrue),
        "false" => Some(TokenKind::KeywordFalse),
        "null" => Some(TokenKind::KeywordNull),
        _ => None,
    }
}

fn is_ident_start(ch: char) -> bool {
    matches!(ch, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

struct Lexer<'src, 'out> {
    file_id: FileId,
    /// An iterator of characters to consume.
    chars: Chars<'src>,
    /// One character of lookahead.
    peeked: Option<char>,
    /// The start of the token being lexed.
    token_start: BytePos,
    /// The position just past the last consumed character.
    token_end: BytePos,
    interner: &'out mut Interner,
    messages: &'out mut Vec<Message>,
    tokens: Vec<Token>,
}

/// Lex a whole file. Always returns a token stream ending in `Eof`; lexical
/// errors are reported through `messages` and leave `Unknown` tokens behind.
pub fn tokenize(
    source: &str,
    file_id: FileId,
    interner: &mut Interner,
    messages: &mut Vec<Message>,
) -> Vec<Token> {
    assert!(
        source.len() <= u32::MAX as usize,
        "source must be less than 4GiB in length"
    );

    let mut chars = source.chars();
    let peeked = chars.next();
    let mut lexer = Lexer {
        file_id,
        chars,
        peeked,
        token_start: 0,
        token_end: 0,
        interner,
        messages,
        tokens: Vec::new(),
    };
    lexer.run();
    lexer.tokens
}

impl<'src, 'out> Lexer<'src, 'out> {
    fn peek(&self) -> Option<char> {
        self.peeked
    }

    /// Consume the current character and load the next one.
    fn advance(&mut self) -> Option<char> {
        let current = std::mem::replace(&mut self.peeked, self.chars.next());
        if let Some(ch) = current {
            self.token_end += ch.len_utf8() as BytePos;
        }
        current
    }

    fn token_range(&self) -> FileRange {
        FileRange::new(
            self.file_id,
            ByteRange::new(self.token_start, self.token_end),
        )
    }

    fn emit(&mut self, kind: TokenKind) {
        let range = self.token_range();
        self.tokens.push(Token { kind, range });
    }

    fn error(&mut self, message: LexerMessage) {
        self.messages.push(message.into());
    }

    fn run(&mut self) {
        loop {
            self.token_start = self.token_end;
            let Some(ch) = self.advance() else {
                self.emit(TokenKind::Eof);
                return;
            };
            match ch {
                ch if is_whitespace(ch) => {}
                '#' => self.line_comment(),
                '/' => match self.peek() {
                    Some('/') => {
                        self.advance();
                        self.line_comment();
                    }
                    Some('*') => {
                        self.advance();
                        self.block_comment();
                    }
                    _ => {
                        self.error(LexerMessage::UnexpectedCharacter {
                            range: self.token_range(),
                        });
                        self.emit(TokenKind::Unknown);
                    }
                },
                '{' => self.emit(TokenKind::LBrace),
                '}' => self.emit(TokenKind::RBrace),
                '(' => self.emit(TokenKind::LParen),
                ')' => self.emit(TokenKind::RParen),
                '[' => self.emit(TokenKind::LBracket),
                ']' => self.emit(TokenKind::RBracket),
                ',' => self.emit(TokenKind::Comma),
                '.' => self.emit(TokenKind::Dot),
                '=' => self.emit(TokenKind::Equals),
                ':' => self.emit(TokenKind::Colon),
                ';' => self.emit(TokenKind::Semi),
                '*' => self.emit(TokenKind::Star),
                '<' => self.emit(TokenKind::Lt),
                '>' => self.emit(TokenKind::Gt),
                '"' => self.string_literal(),
                '-' => self.number(None),
                ch if ch.is_ascii_digit() => self.number(Some(ch)),
                ch if is_ident_start(ch) => self.identifier(ch),
                _ => {
                    self.error(LexerMessage::UnexpectedCharacter {
                        range: self.token_range(),
                    });
                    self.emit(TokenKind::Unknown);
                }
            }
        }
    }

    fn line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn block_comment(&mut self) {
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return;
                }
                Some(_) => {}
                None => {
                    self.error(LexerMessage::UnterminatedComment {
                        range: self.token_range(),
                    });
                    return;
                }
            }
        }
    }

    fn string_literal(&mut self) {
        let mut text = String::new();
        let mut bad_escape = false;
        loop {
            match self.advance() {
                None => {
                    self.error(LexerMessage::UnterminatedString {
                        range: self.token_range(),
                    });
                    self.emit(TokenKind::Unknown);
                    return;
                }
                Some('"') => break,
                Some('\\') => {
                    let escape_start = self.token_end - 1;
                    match self.advance() {
                        Some('n') => text.push('\n'),
                        Some('\\') => text.push('\\'),
                        Some(_) => {
                            self.error(LexerMessage::InvalidEscape {
                                range: FileRange::new(
                                    self.file_id,
                                    ByteRange::new(escape_start, self.token_end),
                                ),
                            });
                            bad_escape = true;
                        }
                        None => {
                            self.error(LexerMessage::UnterminatedString {
                                range: self.token_range(),
                            });
                            self.emit(TokenKind::Unknown);
                            return;
                        }
                    }
                }
                Some(ch) => text.push(ch),
            }
        }
        if bad_escape {
            self.emit(TokenKind::Unknown);
        } else {
            self.emit(TokenKind::Str(text));
        }
    }

    fn number(&mut self, first_digit: Option<char>) {
        let mut digits = String::new();
        match first_digit {
            Some(digit) => digits.push(digit),
            None => {
                // entered on `-`
                if !matches!(self.peek(), Some('0'..='9')) {
                    self.error(LexerMessage::BareMinus {
                        range: self.token_range(),
                    });
                    self.emit(TokenKind::Unknown);
                    return;
                }
                digits.push('-');
            }
        }
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            digits.push(ch);
            self.advance();
        }
        match digits.parse::<i64>() {
            Ok(value) => self.emit(TokenKind::Int(value)),
            Err(_) => {
                self.error(LexerMessage::IntegerOverflow {
                    range: self.token_range(),
                });
                self.emit(TokenKind::Unknown);
            }
        }
    }

    fn identifier(&mut self, first: char) {
        let mut ident = String::new();
        ident.push(first);
        while let Some(ch) = self.peek() {
            if !is_ident_continue(ch) {
                break;
            }
            ident.push(ch);
            self.advance();
        }
        match keyword(&ident) {
            Some(kind) => self.emit(kind),
            None => {
                let symbol = self.interner.get_or_intern(&ident);
                self.emit(TokenKind::Ident(symbol));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::Files;

    fn lex(source: &str) -> (Vec<Token>, Vec<Message>, Interner) {
        let mut files = Files::new();
        let file_id = files.add("test.sap".into(), source.into());
        let mut interner = Interner::new();
        let mut messages = Vec::new();
        let tokens = tokenize(source, file_id, &mut interner, &mut messages);
        (tokens, messages, interner)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|token| token.kind.clone()).collect()
    }

    #[test]
    fn punctuation_and_keywords() {
        let (tokens, messages, _) = lex("module m; struct S : T { int* a[8]; }");
        assert!(messages.is_empty());
        let kinds = kinds(&tokens);
        assert!(matches!(kinds[0], TokenKind::KeywordModule));
        assert!(matches!(kinds[1], TokenKind::Ident(_)));
        assert!(matches!(kinds[2], TokenKind::Semi));
        assert!(matches!(kinds[3], TokenKind::KeywordStruct));
        assert!(matches!(kinds.last(), Some(TokenKind::Eof)));
        assert!(kinds.contains(&TokenKind::Star));
        assert!(kinds.contains(&TokenKind::LBracket));
        assert!(kinds.contains(&TokenKind::Int(8)));
    }

    #[test]
    fn keyword_is_not_matched_as_prefix() {
        let (tokens, messages, interner) = lex("modules structx");
        assert!(messages.is_empty());
        match (&tokens[0].kind, &tokens[1].kind) {
            (TokenKind::Ident(a), TokenKind::Ident(b)) => {
                assert_eq!(interner.resolve(*a), Some("modules"));
                assert_eq!(interner.resolve(*b), Some("structx"));
            }
            other => panic!("expected two identifiers, got {other:?}"),
        }
    }

    #[test]
    fn comments_are_skipped() {
        let (tokens, messages, _) = lex("# hash\n// slashes\n/* block\nstill */ ;");
        assert!(messages.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Semi, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment_reports() {
        let (tokens, messages, _) = lex("/* never closed");
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            Message::Lexer(LexerMessage::UnterminatedComment { .. })
        ));
        assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
    }

    #[test]
    fn string_escapes() {
        let (tokens, messages, _) = lex(r#""a\nb\\c""#);
        assert!(messages.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Str("a\nb\\c".into()));
    }

    #[test]
    fn bad_escape_is_an_error() {
        let (tokens, messages, _) = lex(r#""a\tb""#);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            Message::Lexer(LexerMessage::InvalidEscape { .. })
        ));
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
    }

    #[test]
    fn negative_numbers_and_bare_minus() {
        let (tokens, messages, _) = lex("-12");
        assert!(messages.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Int(-12));

        let (tokens, messages, _) = lex("- 12");
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            Message::Lexer(LexerMessage::BareMinus { .. })
        ));
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[1].kind, TokenKind::Int(12));
    }

    #[test]
    fn unknown_byte_recovers_and_continues() {
        let (tokens, messages, _) = lex("@ module");
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            Message::Lexer(LexerMessage::UnexpectedCharacter { .. })
        ));
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Unknown, TokenKind::KeywordModule, TokenKind::Eof]
        );
    }

    #[test]
    fn token_ranges_cover_the_lexeme() {
        let (tokens, _, _) = lex("module abc;");
        assert_eq!(tokens[0].range.start(), 0);
        assert_eq!(tokens[0].range.end(), 6);
        assert_eq!(tokens[1].range.start(), 7);
        assert_eq!(tokens[1].range.end(), 10);
    }
}
