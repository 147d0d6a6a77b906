use logos::Logos;

use crate::lexer::LexerToken;

/// Renders an atom so that it lexes back as a single atom.
///
/// Bare symbols and complete quoted strings are printed as they are. Anything
/// else is wrapped into a brace block.
pub fn escape_atom(atom: &str) -> String {
    let mut lexer = LexerToken::lexer(atom);
    match [lexer.next(), lexer.next()] {
        [Some(Ok(LexerToken::BareAtom)), None] => return atom.to_string(),
        [Some(Ok(LexerToken::QuotedAtom)), None] if is_closed_quote(atom) => {
            return atom.to_string()
        }
        _ => {}
    }

    let mut output = String::with_capacity(atom.len() + 2);
    output.push('{');
    output.push_str(atom);
    output.push('}');
    output
}

fn is_closed_quote(atom: &str) -> bool {
    atom.len() >= 2 && atom.ends_with('"')
}
