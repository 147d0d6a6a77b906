use crate::printer::{Print, Printer};
use smol_str::SmolStr;
use std::fmt::Display;

/// An s-expression represented as a recursive enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A bare symbol, a quoted string including its quotes, or the
    /// contents of a brace block.
    Atom(SmolStr),
    List(Vec<Expr>),
}

impl Expr {
    /// Creates an atom.
    pub fn atom(text: impl Into<SmolStr>) -> Self {
        Self::Atom(text.into())
    }

    /// The text of an atom.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Expr::Atom(text) => Some(text.as_str()),
            Expr::List(_) => None,
        }
    }

    /// The children of a list.
    pub fn as_list(&self) -> Option<&[Expr]> {
        match self {
            Expr::List(items) => Some(items),
            Expr::Atom(_) => None,
        }
    }

    /// The head symbol of a list, if it is an atom.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }

    /// Text of an atom, or of a list that holds nothing but one atom.
    ///
    /// `x` and `(x)` both have the text `x`.
    pub fn text(&self) -> Option<&str> {
        match self {
            Expr::Atom(text) => Some(text.as_str()),
            Expr::List(items) => match items.as_slice() {
                [Expr::Atom(text)] => Some(text.as_str()),
                _ => None,
            },
        }
    }
}

impl Print for Expr {
    fn print<P: Printer>(&self, printer: &mut P) -> Result<(), P::Error> {
        match self {
            Expr::List(items) => printer.list(|printer| printer.print(items)),
            Expr::Atom(atom) => printer.atom(atom),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::printer::to_string(self))
    }
}

impl From<SmolStr> for Expr {
    fn from(value: SmolStr) -> Self {
        Self::Atom(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Atom(value.into())
    }
}

impl From<Vec<Expr>> for Expr {
    fn from(value: Vec<Expr>) -> Self {
        Self::List(value)
    }
}
