use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

/// A parsed tag search filter.
///
/// A `TagExpression` is built from a raw query string (typically the `tags`
/// URL parameter, or the text a user has typed into a search box) and holds
/// three disjoint sets of lowercase tag names:
///
/// - `include` — tags that count toward relevance but are not mandatory
/// - `require` (`+` prefix) — tags every matching link must carry
/// - `exclude` (`-` prefix) — tags no matching link may carry
///
/// Expressions are constructed fresh per request and never persisted.
///
/// # Examples
///
/// ```
/// use linkstash::TagExpression;
///
/// let expr = TagExpression::parse("rust +work -archive");
/// assert!(expr.include().contains("rust"));
/// assert!(expr.require().contains("work"));
/// assert!(expr.exclude().contains("archive"));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagExpression {
    include: BTreeSet<String>,
    require: BTreeSet<String>,
    exclude: BTreeSet<String>,
}

impl TagExpression {
    /// Creates an empty expression (matches everything, ranked by recency).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an expression directly from its three sets.
    ///
    /// A name appearing in more than one input set keeps only its strongest
    /// interpretation, applied in the order include, require, exclude.
    pub fn from_parts<I, S>(include: I, require: I, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut expr = Self::new();
        for name in include {
            expr.add_include(name.into());
        }
        for name in require {
            expr.add_require(name.into());
        }
        for name in exclude {
            expr.add_exclude(name.into());
        }
        expr
    }

    /// Parses a raw query string into an expression.
    ///
    /// Never fails: an empty or absent string yields the empty expression,
    /// and malformed percent-escapes are kept as literal text. The same
    /// rules apply to a committed query string and to a half-typed input
    /// buffer, so callers can parse on every keystroke or only on submit.
    ///
    /// Tokenization splits on runs of space and comma. The `+` character is
    /// overloaded as both separator and require-prefix; it binds to the
    /// following token as a prefix only where it cannot be read as a
    /// separator: at the start of a chunk, or directly after another `+`.
    /// So `a+b` is two plain tokens, `+a` requires `a`, and `a++b` is `a`
    /// plus required `b`. A leading `-` is the exclude prefix and is never
    /// a separator, leaving names like `low-priority` intact.
    ///
    /// Tokens are percent-decoded, lowercased, deduplicated, and sorted
    /// before classification; when the same name appears under different
    /// qualifiers, the last one applied wins.
    pub fn parse(raw: &str) -> Self {
        let mut expr = Self::new();
        for token in tokenize(raw) {
            if let Some(name) = token.strip_prefix('-') {
                if !name.is_empty() {
                    expr.add_exclude(name.to_string());
                }
            } else if let Some(name) = token.strip_prefix('+') {
                if !name.is_empty() {
                    expr.add_require(name.to_string());
                }
            } else {
                expr.add_include(token);
            }
        }
        expr
    }

    /// Serializes the expression to its canonical query-string form.
    ///
    /// Tokens carry their qualifier prefix, are sorted lexicographically,
    /// percent-encoded (a `+` prefix becomes `%2B`, so it survives the
    /// round-trip), and joined with single spaces. The output is stable for
    /// a given filter regardless of the order tags were entered in, which
    /// makes encoded expressions comparable for equality and safe to place
    /// in a URL.
    pub fn encode(&self) -> String {
        let mut tokens: Vec<String> = self
            .include
            .iter()
            .cloned()
            .chain(self.require.iter().map(|name| format!("+{name}")))
            .chain(self.exclude.iter().map(|name| format!("-{name}")))
            .collect();
        tokens.sort();

        tokens
            .iter()
            .map(|token| urlencoding::encode(token).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns true when no tags are selected at all.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.require.is_empty() && self.exclude.is_empty()
    }

    /// Tags that count toward ranking without being mandatory.
    pub fn include(&self) -> &BTreeSet<String> {
        &self.include
    }

    /// Tags every matching link must carry.
    pub fn require(&self) -> &BTreeSet<String> {
        &self.require
    }

    /// Tags no matching link may carry.
    pub fn exclude(&self) -> &BTreeSet<String> {
        &self.exclude
    }

    /// The effective include pool: `include ∪ require`.
    ///
    /// Required tags count toward relevance ranking too, so the search
    /// engine matches against this pool rather than `include` alone.
    pub fn positive_pool(&self) -> BTreeSet<String> {
        self.include.union(&self.require).cloned().collect()
    }

    /// Every tag name mentioned anywhere in the expression.
    ///
    /// Tag discovery uses this to avoid suggesting tags the user has
    /// already selected.
    pub fn selected(&self) -> BTreeSet<String> {
        self.include
            .iter()
            .chain(self.require.iter())
            .chain(self.exclude.iter())
            .cloned()
            .collect()
    }

    fn add_include(&mut self, name: String) {
        self.require.remove(&name);
        self.exclude.remove(&name);
        self.include.insert(name);
    }

    fn add_require(&mut self, name: String) {
        self.include.remove(&name);
        self.exclude.remove(&name);
        self.require.insert(name);
    }

    fn add_exclude(&mut self, name: String) {
        self.include.remove(&name);
        self.require.remove(&name);
        self.exclude.insert(name);
    }
}

impl fmt::Display for TagExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Splits a raw query string into normalized tag tokens.
///
/// Tokens keep their `+`/`-` qualifier prefix where one applies. The result
/// is percent-decoded, lowercased, deduplicated, and sorted.
fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens: Vec<String> = raw
        .split([' ', ','])
        .filter(|chunk| !chunk.is_empty())
        .map(decode_chunk)
        .flat_map(|chunk| split_plus(&chunk))
        .collect();

    tokens.sort();
    tokens.dedup();
    tokens
}

/// Percent-decodes a chunk and lowercases it.
///
/// Malformed escape sequences leave the chunk as typed; tokenization never
/// rejects input.
fn decode_chunk(chunk: &str) -> String {
    urlencoding::decode(chunk)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| chunk.to_string())
        .to_lowercase()
}

/// Splits one chunk on `+`, resolving the separator/prefix overload.
///
/// A run of non-`+` characters keeps a `+` prefix only when the `+`
/// directly before it starts the chunk or follows another `+`; every other
/// `+` acts as a separator and is dropped.
fn split_plus(chunk: &str) -> Vec<String> {
    let chars: Vec<char> = chunk.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '+' {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i] != '+' {
            i += 1;
        }
        let run: String = chars[start..i].iter().collect();

        let prefixed =
            start >= 1 && chars[start - 1] == '+' && (start == 1 || chars[start - 2] == '+');
        if prefixed {
            tokens.push(format!("+{run}"));
        } else {
            tokens.push(run);
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn parse_empty_string_yields_empty_expression() {
        let expr = TagExpression::parse("");
        assert!(expr.is_empty());
        assert_eq!(expr, TagExpression::new());
    }

    #[test]
    fn parse_whitespace_and_commas_only_yields_empty_expression() {
        let expr = TagExpression::parse("  , ,,  ");
        assert!(expr.is_empty());
    }

    #[test]
    fn parse_plain_tokens_become_include_tags() {
        let expr = TagExpression::parse("rust work");
        assert_eq!(names(expr.include()), vec!["rust", "work"]);
        assert!(expr.require().is_empty());
        assert!(expr.exclude().is_empty());
    }

    #[test]
    fn parse_comma_and_space_are_equivalent_separators() {
        assert_eq!(
            TagExpression::parse("a,b c"),
            TagExpression::parse("a b,c")
        );
    }

    #[test]
    fn parse_leading_plus_marks_require() {
        let expr = TagExpression::parse("+work rust");
        assert_eq!(names(expr.include()), vec!["rust"]);
        assert_eq!(names(expr.require()), vec!["work"]);
    }

    #[test]
    fn parse_leading_minus_marks_exclude() {
        let expr = TagExpression::parse("-archive rust");
        assert_eq!(names(expr.include()), vec!["rust"]);
        assert_eq!(names(expr.exclude()), vec!["archive"]);
    }

    #[test]
    fn parse_interior_plus_is_a_separator() {
        let expr = TagExpression::parse("a+b");
        assert_eq!(names(expr.include()), vec!["a", "b"]);
        assert!(expr.require().is_empty());
    }

    #[test]
    fn parse_double_plus_prefixes_the_next_token() {
        let expr = TagExpression::parse("a++b");
        assert_eq!(names(expr.include()), vec!["a"]);
        assert_eq!(names(expr.require()), vec!["b"]);
    }

    #[test]
    fn parse_plus_after_space_is_a_prefix() {
        // The chunk boundary resets the separator context.
        let expr = TagExpression::parse("a +b");
        assert_eq!(names(expr.include()), vec!["a"]);
        assert_eq!(names(expr.require()), vec!["b"]);
    }

    #[test]
    fn parse_minus_inside_a_name_is_not_a_separator() {
        let expr = TagExpression::parse("-low-priority work");
        assert_eq!(names(expr.include()), vec!["work"]);
        assert_eq!(names(expr.exclude()), vec!["low-priority"]);
    }

    #[test]
    fn parse_bare_qualifiers_are_dropped() {
        let expr = TagExpression::parse("- + rust");
        assert_eq!(names(expr.include()), vec!["rust"]);
        assert!(expr.require().is_empty());
        assert!(expr.exclude().is_empty());
    }

    #[test]
    fn parse_lowercases_tokens() {
        let expr = TagExpression::parse("Rust WORK");
        assert_eq!(names(expr.include()), vec!["rust", "work"]);
    }

    #[test]
    fn parse_percent_decodes_tokens() {
        let expr = TagExpression::parse("caf%C3%A9 %2Bwork");
        assert_eq!(names(expr.include()), vec!["café"]);
        assert_eq!(names(expr.require()), vec!["work"]);
    }

    #[test]
    fn parse_malformed_escape_is_kept_literally() {
        let expr = TagExpression::parse("caf%ZZ");
        assert_eq!(names(expr.include()), vec!["caf%zz"]);
    }

    #[test]
    fn parse_deduplicates_tokens() {
        let expr = TagExpression::parse("rust rust,rust");
        assert_eq!(names(expr.include()), vec!["rust"]);
    }

    #[test]
    fn parse_same_name_under_different_qualifiers_keeps_one() {
        // Tokens sort "+a" < "-a" < "a"; the last applied wins, so the
        // plain include ends up holding the name.
        let expr = TagExpression::parse("+a -a a");
        assert_eq!(names(expr.include()), vec!["a"]);
        assert!(expr.require().is_empty());
        assert!(expr.exclude().is_empty());
    }

    #[test]
    fn encode_is_sorted_and_prefixed() {
        let expr = TagExpression::from_parts(vec!["zebra", "apple"], vec!["work"], vec!["old"]);
        assert_eq!(expr.encode(), "%2Bwork -old apple zebra");
    }

    #[test]
    fn encode_is_canonical_regardless_of_entry_order() {
        let a = TagExpression::parse("b a c");
        let b = TagExpression::parse("c,b,a");
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn encode_percent_encodes_names() {
        let expr = TagExpression::from_parts(vec!["café"], vec![], vec![]);
        assert_eq!(expr.encode(), "caf%C3%A9");
    }

    #[test]
    fn round_trip_preserves_all_three_sets() {
        let expr = TagExpression::from_parts(
            vec!["rust", "cli"],
            vec!["work"],
            vec!["archive", "low-priority"],
        );
        assert_eq!(TagExpression::parse(&expr.encode()), expr);
    }

    #[test]
    fn round_trip_with_encoded_require_prefix() {
        // "+work" encodes to "%2Bwork"; decoding restores the prefix before
        // plus-splitting, so the qualifier survives.
        let expr = TagExpression::from_parts(vec![], vec!["work"], vec![]);
        let encoded = expr.encode();
        assert_eq!(encoded, "%2Bwork");
        assert_eq!(TagExpression::parse(&encoded), expr);
    }

    #[test]
    fn positive_pool_unions_include_and_require() {
        let expr = TagExpression::parse("rust +work");
        assert_eq!(
            expr.positive_pool().into_iter().collect::<Vec<_>>(),
            vec!["rust".to_string(), "work".to_string()]
        );
    }

    #[test]
    fn selected_covers_all_sets() {
        let expr = TagExpression::parse("a +b -c");
        assert_eq!(
            expr.selected().into_iter().collect::<Vec<_>>(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn display_matches_encode() {
        let expr = TagExpression::parse("rust +work");
        assert_eq!(expr.to_string(), expr.encode());
    }
}
