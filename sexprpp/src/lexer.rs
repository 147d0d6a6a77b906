use logos::{Lexer, Logos};

#[derive(Debug, Clone, Copy, PartialEq, Logos)]
pub(crate) enum LexerToken<'s> {
    #[token("(")]
    OpenList,
    #[token(")")]
    CloseList,
    // One character at a time, so that an atom directly after the marker
    // consumes exactly the character that terminates it.
    #[regex(r"[ \t\n\r\x0B\x0C]")]
    Whitespace,
    #[regex(r"#[^\n]*\n?")]
    Comment,
    #[regex(r#"[^ \t\n\r\x0B\x0C\(\)"\{#]+"#)]
    BareAtom,
    #[regex(r#""[^"]*"?"#)]
    QuotedAtom,
    #[token("{", brace_block)]
    BraceBlock(&'s str),
}

/// Consumes a brace block up to the `}` that balances the opening `{`.
///
/// Nested braces are kept in the returned text, the outermost pair is not.
/// An unterminated block runs to the end of the input.
fn brace_block<'s>(lex: &mut Lexer<'s, LexerToken<'s>>) -> &'s str {
    let rest = lex.remainder();
    let mut depth = 1usize;

    for (index, byte) in rest.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(index + 1);
                    return trim_space(&rest[..index]);
                }
            }
            _ => {}
        }
    }

    lex.bump(rest.len());
    trim_space(rest)
}

/// Whether `c` is one of the characters matched by [`LexerToken::Whitespace`].
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0B'
}

fn trim_space(text: &str) -> &str {
    text.trim_matches(is_space)
}

/// A lexical item as seen by the parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Token<'s> {
    Open,
    Close,
    Space,
    /// A fragment of atom text. Adjacent fragments belong to the same atom.
    Text(&'s str),
}

/// Lex `source` into parser tokens, dropping comments.
pub(crate) fn tokens(source: &str) -> Tokens<'_> {
    Tokens {
        lexer: LexerToken::lexer(source),
    }
}

/// Streaming token iterator that remembers how much input it has consumed.
pub(crate) struct Tokens<'s> {
    lexer: Lexer<'s, LexerToken<'s>>,
}

impl<'s> Tokens<'s> {
    /// Byte offset just past the last consumed token.
    #[inline]
    pub fn offset(&self) -> usize {
        self.lexer.span().end
    }

    /// Byte offset where the last consumed token starts.
    #[inline]
    pub fn start(&self) -> usize {
        self.lexer.span().start
    }

    /// Source text of the last consumed token, delimiters included.
    #[inline]
    pub fn slice(&self) -> &'s str {
        self.lexer.slice()
    }
}

impl<'s> Iterator for Tokens<'s> {
    type Item = Token<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let token = match self.lexer.next()? {
                Ok(LexerToken::OpenList) => Token::Open,
                Ok(LexerToken::CloseList) => Token::Close,
                Ok(LexerToken::Whitespace) => Token::Space,
                Ok(LexerToken::Comment) => continue,
                Ok(LexerToken::BareAtom) | Ok(LexerToken::QuotedAtom) => {
                    Token::Text(self.lexer.slice())
                }
                Ok(LexerToken::BraceBlock(text)) => Token::Text(text),
                // Every character is covered by some token; keep anything
                // else as text rather than dropping it.
                Err(()) => Token::Text(self.lexer.slice()),
            };
            return Some(token);
        }
    }
}

#[cfg(test)]
mod test {
    use super::{tokens, Token};
    use rstest::rstest;

    #[rstest]
    #[case("{outer {inner} text}", "outer {inner} text")]
    #[case("{ int n }", "int n")]
    #[case("{a \"(b\" c}", "a \"(b\" c")]
    #[case("{unterminated {x}", "unterminated {x}")]
    #[case("{}", "")]
    #[case("{\x0B\tx\r\n}", "x")]
    #[case("{\u{a0}x\u{2003}}", "\u{a0}x\u{2003}")]
    fn test_brace_block(#[case] source: &str, #[case] expected: &str) {
        let lexed: Vec<_> = tokens(source).collect();
        assert_eq!(vec![Token::Text(expected)], lexed);
    }

    #[rstest]
    #[case(r#""hello (world)""#)]
    #[case(r#""a # not a comment""#)]
    #[case(r#""{ not a block""#)]
    #[case(r#""unterminated ( "#)]
    fn test_quoted_atom(#[case] source: &str) {
        let lexed: Vec<_> = tokens(source).collect();
        assert_eq!(vec![Token::Text(source)], lexed);
    }

    #[test]
    fn test_comment_skipped() {
        let lexed: Vec<_> = tokens("a # comment ( \"\nb").collect();
        assert_eq!(vec![Token::Text("a"), Token::Space, Token::Text("b")], lexed);
    }

    #[test]
    fn test_whitespace_is_single_character() {
        let mut lexed = tokens("  x");
        assert_eq!(Some(Token::Space), lexed.next());
        assert_eq!(1, lexed.offset());
    }

    #[test]
    fn test_slice_keeps_delimiters() {
        let mut lexed = tokens("{ a } b");
        assert_eq!(Some(Token::Text("a")), lexed.next());
        assert_eq!("{ a }", lexed.slice());
        assert_eq!(0, lexed.start());
        assert_eq!(5, lexed.offset());
    }

    #[test]
    fn test_stray_close_brace_is_text() {
        let lexed: Vec<_> = tokens("a}b").collect();
        assert_eq!(vec![Token::Text("a}b")], lexed);
    }
}
