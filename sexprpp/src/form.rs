//! Reserved head symbols that rewrite into statements.
use std::fmt::Display;

macro_rules! special_forms {
    ($($(#[$meta:meta])* $name:ident => $keyword:expr),* $(,)?) => {
        /// Head symbol of a list that is rewritten by a dedicated rule
        /// instead of generic call emission.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SpecialForm {
            $($(#[$meta])* $name,)*
        }

        impl SpecialForm {
            /// The symbol that introduces this form.
            pub fn keyword(self) -> &'static str {
                match self {
                    $(SpecialForm::$name => $keyword,)*
                }
            }

            /// Looks up the form introduced by `symbol`.
            pub fn from_symbol(symbol: &str) -> Option<Self> {
                match symbol {
                    $(s if s == $keyword => Some(SpecialForm::$name),)*
                    _ => None,
                }
            }
        }
    };
}

special_forms! {
    /// `(var SIGNATURE INIT)` renders as `SIGNATURE (INIT);`.
    Var => "var",
    /// `(func SIGNATURE BODY)` renders as `SIGNATURE{BODY;}`.
    Func => "func",
    /// `(code EXPR)` renders as `EXPR;`.
    Code => "code",
    /// `(__sexpr EXPR)` renders `EXPR` with special forms enabled again.
    Marker => crate::scanner::MARKER,
}

impl Display for SpecialForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}
