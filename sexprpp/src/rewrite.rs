//! Render expression trees as call expressions.
//!
//! A list `(head arg1 arg2)` is written as `head (arg1, arg2)`, and a list
//! holding only a head, `(head)`, as the bare `head`. Atoms are written as
//! they are.
//!
//! Where special forms are allowed, a list headed by a [`SpecialForm`]
//! keyword is written by that form's rule instead:
//!
//! | Expression                   | Output                  |
//! |------------------------------|-------------------------|
//! | `(var SIGNATURE INIT)`       | `SIGNATURE (INIT);`     |
//! | `(func SIGNATURE BODY)`      | `SIGNATURE{BODY;}`      |
//! | `(code EXPR)`                | `EXPR;`                 |
//! | `(__sexpr EXPR)`             | `EXPR`, special forms allowed |
//!
//! Special forms are allowed at the outermost position of an expansion and
//! directly inside a marker form. Arguments and bodies are rendered with
//! special forms disallowed; the marker form itself is recognized everywhere,
//! so wrapping an argument in it allows special forms there again.
use crate::expr::Expr;
use crate::form::SpecialForm;
use std::io::{self, Write};

/// An error while rewriting an expression.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("`{form}` form is missing its argument {index}")]
    MissingChild { form: SpecialForm, index: usize },
    #[error("failed to write rewritten expression")]
    Io(#[from] io::Error),
}

/// Shorthand for a result specialised to rewrite errors.
pub type Result<T, E = RewriteError> = std::result::Result<T, E>;

/// Writes the call-expression rendering of expressions into an output stream.
pub struct Rewriter<W> {
    out: W,
}

impl<W: Write> Rewriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Mutable reference to the output stream.
    pub fn output(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes `expr`, applying special form rules only if `allow_special` is set.
    pub fn emit(&mut self, expr: &Expr, allow_special: bool) -> Result<()> {
        let items = match expr {
            Expr::Atom(text) => return self.write(text),
            Expr::List(items) => items,
        };

        let Some((head, args)) = items.split_first() else {
            log::warn!("empty list produces no output");
            return Ok(());
        };

        let Some(head) = head.as_atom() else {
            log::warn!("list headed by a list produces no output: {expr}");
            return Ok(());
        };

        match SpecialForm::from_symbol(head) {
            Some(form) if allow_special || form == SpecialForm::Marker => {
                return self.emit_special(form, args);
            }
            _ => {}
        }

        self.emit_call(head, args)
    }

    fn emit_call(&mut self, head: &str, args: &[Expr]) -> Result<()> {
        self.write(head)?;
        if args.is_empty() {
            return Ok(());
        }

        self.write(" (")?;
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                self.write(", ")?;
            }
            self.emit(arg, false)?;
        }
        self.write(")")
    }

    fn emit_special(&mut self, form: SpecialForm, args: &[Expr]) -> Result<()> {
        // Child indices in errors count the head as 0.
        let arg = |index: usize| {
            args.get(index - 1)
                .ok_or(RewriteError::MissingChild { form, index })
        };

        match form {
            SpecialForm::Var => {
                let (signature, init) = (arg(1)?, arg(2)?);
                self.emit_signature(signature)?;
                self.write(" (")?;
                self.emit(init, false)?;
                self.write(");")
            }
            SpecialForm::Func => {
                let (signature, body) = (arg(1)?, arg(2)?);
                self.emit_signature(signature)?;
                self.write("{")?;
                self.emit(body, false)?;
                self.write(";}")
            }
            SpecialForm::Code => {
                self.emit(arg(1)?, false)?;
                self.write(";")
            }
            SpecialForm::Marker => self.emit(arg(1)?, true),
        }
    }

    /// Writes the literal text of a declaration signature.
    fn emit_signature(&mut self, signature: &Expr) -> Result<()> {
        match signature.text() {
            Some(text) => self.write(text),
            None => self.emit(signature, false),
        }
    }

    #[inline]
    fn write(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Renders `expr` into a string with special forms allowed at the top.
pub fn to_call_string(expr: &Expr) -> Result<String> {
    let mut rewriter = Rewriter::new(Vec::new());
    rewriter.emit(expr, true)?;
    Ok(String::from_utf8_lossy(&rewriter.into_inner()).into_owned())
}
