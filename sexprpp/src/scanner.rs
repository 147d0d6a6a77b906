//! Find the marker in a byte stream and expand the expression that follows it.
use crate::parser::parse_invocation;
use crate::printer::{to_string, to_string_pretty};
use crate::rewrite::{RewriteError, Rewriter};
use delegate::delegate;
use std::io::{self, Write};

/// The identifier that introduces an expression to expand.
pub const MARKER: &str = "__sexpr";

/// Width used when logging parsed expressions.
const LOG_WIDTH: usize = 100;

/// An error while preprocessing.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to write output")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Statistics about a completed preprocessing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of marker occurrences that were expanded.
    pub expansions: usize,
}

/// Copies input to an output stream, expanding every marked expression.
///
/// Bytes that might still turn out to be the start of the marker are held
/// back until they either complete the marker or are known to be ordinary
/// text. The held back bytes are always a prefix of [`MARKER`], so only
/// their length is stored.
pub struct Scanner<W> {
    rewriter: Rewriter<W>,
    marker: &'static [u8],
    /// For every prefix length `n`, the length of the longest proper prefix
    /// of the marker that is also a suffix of `marker[..n]`.
    fallback: Vec<usize>,
    matched: usize,
    summary: Summary,
}

impl<W: Write> Scanner<W> {
    pub fn new(out: W) -> Self {
        Self::with_marker(MARKER, out)
    }

    pub(crate) fn with_marker(marker: &'static str, out: W) -> Self {
        let marker = marker.as_bytes();
        Self {
            rewriter: Rewriter::new(out),
            marker,
            fallback: fallback_table(marker),
            matched: 0,
            summary: Summary::default(),
        }
    }

    delegate! {
        to self.rewriter {
            fn output(&mut self) -> &mut W;
        }
    }

    /// Scans all of `input`, then flushes any held back partial match.
    pub fn run(mut self, input: &[u8]) -> Result<(Summary, W), ScanError> {
        let mut window = Utf8Window::default();
        let mut position = 0;

        while let Some(&byte) = input.get(position) {
            position += 1;
            if self.feed(byte)? {
                let source = window.source_at(input, position);
                position += self.expand(source, input.len() - position, position)?;
            }
        }

        self.finish()
    }

    /// Advances the match by one byte, writing out whatever can no longer be
    /// part of the marker. Returns whether the marker is now complete.
    fn feed(&mut self, byte: u8) -> io::Result<bool> {
        let marker = self.marker;

        loop {
            if marker[self.matched] == byte {
                self.matched += 1;
                break;
            }

            if self.matched == 0 {
                self.output().write_all(&[byte])?;
                break;
            }

            // Retry the byte against the longest shorter partial match.
            let fallback = self.fallback[self.matched];
            let emitted = self.matched - fallback;
            self.output().write_all(&marker[..emitted])?;
            self.matched = fallback;
        }

        if self.matched == marker.len() {
            self.matched = 0;
            return Ok(true);
        }
        Ok(false)
    }

    /// Parses and rewrites the expression at the start of `source`, the valid
    /// UTF-8 part of the `remaining` bytes of input.
    ///
    /// Returns the number of bytes consumed.
    fn expand(
        &mut self,
        source: &str,
        remaining: usize,
        offset: usize,
    ) -> Result<usize, ScanError> {
        let parsed = parse_invocation(source);

        if parsed.consumed == source.len() && source.len() < remaining {
            log::warn!("expression at byte {offset} ends at invalid UTF-8");
        }

        log::debug!(
            "expanding expression at byte {offset}: {}",
            to_string(&parsed.expr)
        );
        log::trace!("{}", to_string_pretty(&parsed.expr, LOG_WIDTH));

        match parsed.expr.as_list().and_then(|args| args.first()) {
            Some(expr) => self.rewriter.emit(expr, true)?,
            None => log::warn!("marker at byte {offset} is not followed by an expression"),
        }

        self.summary.expansions += 1;
        Ok(parsed.consumed)
    }

    fn finish(mut self) -> Result<(Summary, W), ScanError> {
        let marker = self.marker;
        let matched = self.matched;
        self.output().write_all(&marker[..matched])?;
        Ok((self.summary, self.rewriter.into_inner()))
    }
}

/// Computes the fallback lengths used when a partial match breaks.
fn fallback_table(marker: &[u8]) -> Vec<usize> {
    let mut table = vec![0; marker.len() + 1];
    let mut border = 0;

    for length in 2..=marker.len() {
        let byte = marker[length - 1];
        while border > 0 && marker[border] != byte {
            border = table[border];
        }
        if marker[border] == byte {
            border += 1;
        }
        table[length] = border;
    }

    table
}

/// A run of valid UTF-8 in the input, kept between expansions so that each
/// stretch of input is validated once rather than once per marker.
#[derive(Default)]
struct Utf8Window<'a> {
    start: usize,
    text: &'a str,
    /// Bytes validated so far.
    checked: usize,
}

impl<'a> Utf8Window<'a> {
    /// The valid UTF-8 text of `input` from `position` up to the first
    /// invalid byte or the end of input.
    fn source_at(&mut self, input: &'a [u8], position: usize) -> &'a str {
        if let Some(offset) = position.checked_sub(self.start) {
            if offset <= self.text.len() && self.text.is_char_boundary(offset) {
                return &self.text[offset..];
            }
        }

        self.start = position;
        self.text = utf8_prefix(&input[position..]);
        self.checked += self.text.len();
        self.text
    }
}

/// The longest prefix of `bytes` that is valid UTF-8.
fn utf8_prefix(bytes: &[u8]) -> &str {
    match std::str::from_utf8(bytes) {
        Ok(source) => source,
        Err(err) => std::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default(),
    }
}

/// Copies `input` to `output`, expanding every expression introduced by [`MARKER`].
pub fn preprocess<W: Write>(input: &[u8], output: W) -> Result<Summary, ScanError> {
    let (summary, _) = Scanner::new(output).run(input)?;
    Ok(summary)
}

/// Preprocesses a string.
pub fn preprocess_str(input: &str) -> Result<String, ScanError> {
    let (_, output) = Scanner::new(Vec::new()).run(input.as_bytes())?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

#[cfg(test)]
mod test {
    use super::{
        fallback_table, preprocess, preprocess_str, utf8_prefix, Scanner, Utf8Window, MARKER,
    };
    use crate::rewrite::RewriteError;
    use crate::ScanError;
    use proptest::prelude::*;
    use rstest::rstest;

    fn scan_with(marker: &'static str, input: &[u8]) -> (usize, Vec<u8>) {
        let (summary, output) = Scanner::with_marker(marker, Vec::new())
            .run(input)
            .unwrap();
        (summary.expansions, output)
    }

    #[test]
    fn test_end_to_end() {
        let output =
            preprocess_str("prefix __sexpr (var { int n } (plus (a) (b))) suffix").unwrap();
        assert_eq!("prefix int n (plus (a, b)); suffix", output);
    }

    #[test]
    fn test_multiple_markers() {
        let input = "a __sexpr (code (f x))\nb __sexpr (g (y) z)\n";
        assert_eq!("a f (x);\nb g (y, z)\n", preprocess_str(input).unwrap());
    }

    #[rstest]
    #[case("text ending in __sex")]
    #[case("text ending in _")]
    #[case("__sexp__sex_")]
    #[case("__SEXPR (code x)")]
    fn test_partial_marker_passes_through(#[case] input: &str) {
        assert_eq!(input, preprocess_str(input).unwrap());
    }

    #[test]
    fn test_partial_marker_prefix_at_end() {
        let (expansions, output) = scan_with("abcdefg", b"...abc");
        assert_eq!(0, expansions);
        assert_eq!(b"...abc", output.as_slice());
    }

    #[rstest]
    #[case("aab", "aaab (f x)", "af (x)")]
    #[case("aab", "aaaab x", "aax")]
    #[case("abab", "abaabab (g)", "abag")]
    #[case("aab", "aac aab (h)", "aac h")]
    fn test_overlapping_false_starts(
        #[case] marker: &'static str,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        let (expansions, output) = scan_with(marker, input.as_bytes());
        assert_eq!(1, expansions);
        assert_eq!(expected, String::from_utf8(output).unwrap());
    }

    #[test]
    fn test_repeated_underscore_before_marker() {
        assert_eq!("_f (x)", preprocess_str("___sexpr (f x)").unwrap());
    }

    #[test]
    fn test_fallback_table() {
        assert_eq!(vec![0, 0, 1, 0], fallback_table(b"aab"));
        assert_eq!(vec![0, 0, 0, 1, 2], fallback_table(b"abab"));
        assert_eq!(vec![0, 0, 1, 0, 0, 0, 0, 0], fallback_table(MARKER.as_bytes()));
    }

    #[test]
    fn test_invalid_utf8_passes_through() {
        let input = b"\xff\xfe __sexpr (f x) \xc3\x28 end";
        let mut output = Vec::new();
        let summary = preprocess(input, &mut output).unwrap();
        assert_eq!(1, summary.expansions);
        assert_eq!(b"\xff\xfe f (x) \xc3\x28 end".as_slice(), output.as_slice());
    }

    #[test]
    fn test_expression_cut_by_invalid_utf8() {
        let input = b"__sexpr (f x \xff y)";
        let mut output = Vec::new();
        preprocess(input, &mut output).unwrap();
        assert_eq!(b"f (x)\xff y)".as_slice(), output.as_slice());
    }

    #[test]
    fn test_marker_without_expression() {
        assert_eq!(" rest", preprocess_str("__sexpr) rest").unwrap());
        assert_eq!("", preprocess_str("__sexpr").unwrap());
    }

    #[test]
    fn test_unterminated_expression_consumes_rest() {
        assert_eq!("x f (a, b)", preprocess_str("x __sexpr (f a (b").unwrap());
    }

    #[test]
    fn test_missing_child_is_reported() {
        let err = preprocess_str("__sexpr (var {int n})").unwrap_err();
        assert!(matches!(
            err,
            ScanError::Rewrite(RewriteError::MissingChild { index: 2, .. })
        ));
    }

    #[test]
    fn test_utf8_window_validates_each_byte_once() {
        let input = "<td>__sexpr (f x)</td>\n".repeat(1000).into_bytes();
        let mut window = Utf8Window::default();
        let mut markers = 0;

        for (index, chunk) in input.windows(MARKER.len()).enumerate() {
            if chunk == MARKER.as_bytes() {
                let position = index + MARKER.len();
                let source = window.source_at(&input, position);
                assert_eq!(utf8_prefix(&input[position..]), source);
                markers += 1;
            }
        }

        assert_eq!(1000, markers);
        assert!(window.checked <= input.len());
    }

    #[test]
    fn test_utf8_window_restarts_after_invalid_byte() {
        let input = b"__sexpr a \xff __sexpr b \xfe __sexpr c";
        let mut window = Utf8Window::default();

        assert_eq!(" a ", window.source_at(input, 7));
        assert_eq!(" ", window.source_at(input, 9));
        assert_eq!(" b ", window.source_at(input, 19));
        assert_eq!(" c", window.source_at(input, 31));
        // Three runs of three, three and two bytes.
        assert_eq!(8, window.checked);
    }

    #[test]
    fn test_deeply_nested_expression() {
        let input = format!("a __sexpr {} b", "(".repeat(200_000));
        assert_eq!("a ", preprocess_str(&input).unwrap());
    }

    #[test]
    fn test_open_paren_after_atom_passes_through() {
        assert_eq!("name(rest)", preprocess_str("__sexpr name(rest)").unwrap());
    }

    proptest! {
        #[test]
        fn marker_free_input_is_unchanged(input in proptest::collection::vec(any::<u8>(), 0..256)) {
            prop_assume!(!input.windows(MARKER.len()).any(|window| window == MARKER.as_bytes()));
            let mut output = Vec::new();
            let summary = preprocess(&input, &mut output).unwrap();
            prop_assert_eq!(0, summary.expansions);
            prop_assert_eq!(input, output);
        }

        #[test]
        fn marker_prefixes_are_unchanged(parts in proptest::collection::vec(0..MARKER.len(), 0..16)) {
            // Concatenated strict prefixes of the marker, which never contain it.
            let input = parts
                .iter()
                .map(|&len| &MARKER[..len])
                .collect::<Vec<_>>()
                .join("|");
            prop_assert_eq!(&input, &preprocess_str(&input).unwrap());
        }
    }
}
