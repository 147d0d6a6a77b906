//! Parse expression trees from s-expressions.
//!
//! Parsing never fails. Input that ends inside a list, a quoted atom or a
//! brace block produces whatever was read up to that point.
//!
//! Lists nest at most [`MAX_DEPTH`] levels deep. A parenthesized group that
//! would open a deeper list is kept as atom text instead, exactly as it
//! appears in the source (comments excepted).
use crate::expr::Expr;
use crate::lexer::{tokens, Token, Tokens};
use smol_str::SmolStr;

/// Deepest list nesting the parser builds.
pub const MAX_DEPTH: usize = 256;

/// The result of parsing a prefix of some input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub expr: Expr,
    /// Number of bytes of the input that were consumed.
    pub consumed: usize,
}

/// A parser stepping through the tokens of a source string.
pub struct Parser<'a> {
    tokens: Tokens<'a>,
    consumed: usize,
}

impl<'a> Parser<'a> {
    #[inline]
    pub fn new(source: &'a str) -> Self {
        Self {
            tokens: tokens(source),
            consumed: 0,
        }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.consumed
    }

    /// Parses the contents of a list whose opening `(` has already been
    /// consumed, up to and including the closing `)`.
    ///
    /// With `max_args`, parsing stops as soon as that many children have been
    /// read, without looking for the closing `)`. A `(` that follows an atom
    /// completing the list is left unconsumed.
    pub fn parse_list(&mut self, max_args: Option<usize>) -> Vec<Expr> {
        let mut list = ListBuilder::new(max_args);
        let mut open_stack: Vec<ListBuilder> = Vec::new();
        // Nesting of parentheses kept as text beyond `MAX_DEPTH`.
        let mut raw_depth = 0usize;

        while let Some(token) = self.tokens.next() {
            if raw_depth > 0 {
                list.push_text(self.tokens.slice());
                match token {
                    Token::Open => raw_depth += 1,
                    Token::Close => raw_depth -= 1,
                    _ => {}
                }
                self.consumed = self.tokens.offset();
                continue;
            }

            match token {
                Token::Text(text) => list.push_text(text),
                Token::Space => list.flush(),
                Token::Open => {
                    list.flush();
                    if list.is_full() {
                        self.consumed = self.tokens.start();
                        break;
                    }
                    if open_stack.len() >= MAX_DEPTH {
                        list.push_text(self.tokens.slice());
                        raw_depth = 1;
                    } else {
                        let parent = std::mem::replace(&mut list, ListBuilder::new(None));
                        open_stack.push(parent);
                    }
                }
                Token::Close => match open_stack.pop() {
                    Some(parent) => {
                        let child = std::mem::replace(&mut list, parent).finish();
                        list.push(Expr::List(child));
                    }
                    None => {
                        list.flush();
                        self.consumed = self.tokens.offset();
                        break;
                    }
                },
            }

            self.consumed = self.tokens.offset();
            if list.is_full() {
                break;
            }
        }

        // Close whatever the input left open.
        while let Some(parent) = open_stack.pop() {
            let child = std::mem::replace(&mut list, parent).finish();
            list.push(Expr::List(child));
        }

        list.finish()
    }
}

/// Accumulates the children of a list and the atom currently being read.
struct ListBuilder {
    children: Vec<Expr>,
    atom: String,
    max_args: Option<usize>,
}

impl ListBuilder {
    fn new(max_args: Option<usize>) -> Self {
        Self {
            children: Vec::new(),
            atom: String::new(),
            max_args,
        }
    }

    fn push_text(&mut self, text: &str) {
        self.atom.push_str(text);
    }

    fn push(&mut self, expr: Expr) {
        self.children.push(expr);
    }

    /// Moves a pending atom into the list.
    fn flush(&mut self) {
        if !self.atom.is_empty() {
            let atom = SmolStr::from(std::mem::take(&mut self.atom));
            self.children.push(Expr::Atom(atom));
        }
    }

    fn is_full(&self) -> bool {
        self.max_args
            .is_some_and(|max_args| self.children.len() >= max_args)
    }

    fn finish(mut self) -> Vec<Expr> {
        // Input ended in the middle of an atom.
        if !self.is_full() {
            self.flush();
        }
        self.children
    }
}

/// Parses the argument list that follows the marker.
///
/// The list is implicit: no opening `(` is expected, and parsing stops after
/// the first complete child. The child is the expression to rewrite; it is
/// absent if the input ends or a stray `)` is found first.
pub fn parse_invocation(source: &str) -> Parsed {
    let mut parser = Parser::new(source);
    let children = parser.parse_list(Some(1));
    Parsed {
        expr: Expr::List(children),
        consumed: parser.offset(),
    }
}

/// Parses the first expression in `source`.
///
/// Leading whitespace and comments are skipped. For input that holds no
/// expression at all, the result is an empty list.
pub fn parse(source: &str) -> Parsed {
    let Parsed { expr, consumed } = parse_invocation(source);
    let expr = match expr {
        Expr::List(mut children) if !children.is_empty() => children.swap_remove(0),
        _ => Expr::List(Vec::new()),
    };
    Parsed { expr, consumed }
}
