//! Glob → regex compilation with positional captures.
//!
//! Supported syntax:
//!
//! | Glob          | Meaning                                              |
//! |---------------|------------------------------------------------------|
//! | `*`           | any characters within one path segment               |
//! | `**`          | zero or more whole segments (only as a full segment) |
//! | `?`           | one character other than `/`                         |
//! | `{a,b}`       | alternation                                          |
//! | `[a-z]`       | character class (`[!a]` negates)                     |
//! | `@(a\|b)`     | exactly one of the alternatives                      |
//! | `?(a)` `*(a)` `+(a)` | zero-or-one, zero-or-more, one-or-more        |
//! | `!(a)`        | a segment part that is not one of the alternatives   |
//! | `!pattern`    | negates the whole pattern (boolean queries only)     |
//! | `\x`          | literal `x`                                          |
//!
//! Every `*`, `**`, brace group and extglob opens a capture, numbered left to
//! right. Optional groups that did not participate capture `""`.

use regex::Regex;

/// Errors raised while compiling a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// The pattern is empty.
    #[error("pattern must not be empty")]
    Empty,

    /// A brace, bracket or extglob group is never closed.
    #[error("invalid pattern `{pattern}`: unclosed `{delimiter}`")]
    Unclosed {
        /// The offending pattern.
        pattern: String,
        /// The opening delimiter.
        delimiter: char,
    },

    /// The generated regex was rejected.
    #[error("invalid pattern `{pattern}`: {reason}")]
    Regex {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    raw: String,
    regex: Regex,
    negated: bool,
    /// `(group index, forbidden text)` pairs produced by `!(...)`.
    exclusions: Vec<(usize, Regex)>,
}

impl CompiledPattern {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty or malformed.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let (negated, body) = match pattern.strip_prefix('!') {
            Some(rest) if !rest.starts_with('(') => (true, rest),
            _ => (false, pattern),
        };
        if body.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut compiler = Compiler::new(pattern, body);
        let source = compiler.sequence(&[])?;
        let regex = build_regex(pattern, &format!("^{source}$"))?;
        let exclusions = compiler
            .exclusions
            .into_iter()
            .map(|(group, alternatives)| {
                build_regex(pattern, &format!("^(?:{alternatives})$")).map(|re| (group, re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(pattern, regex = %regex, "compiled glob");

        Ok(Self {
            raw: pattern.to_string(),
            regex,
            negated,
            exclusions,
        })
    }

    /// Returns the original glob text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if this pattern starts with `!` (whole-pattern negation).
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Number of positional captures the pattern produces.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Tests whether `path` matches the pattern.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.positive_captures(path).is_some() != self.negated
    }

    /// Matches `path` and returns the captured substrings, left to right.
    ///
    /// Negated patterns never capture; they yield an empty list when the
    /// path does not match the inner pattern.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        match (self.positive_captures(path), self.negated) {
            (Some(values), false) => Some(values),
            (None, true) => Some(Vec::new()),
            _ => None,
        }
    }

    fn positive_captures(&self, path: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(path)?;
        for (group, forbidden) in &self.exclusions {
            let text = caps.get(*group).map_or("", |m| m.as_str());
            if forbidden.is_match(text) {
                return None;
            }
        }
        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }
}

/// Escapes glob syntax in `literal` so it only matches itself.
///
/// Path separators are kept as they are.
#[must_use]
pub fn escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(
            c,
            '\\' | '*' | '?' | '[' | ']' | '{' | '}' | '(' | ')' | '!' | '@' | '+' | '|' | ','
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn build_regex(pattern: &str, source: &str) -> Result<Regex, PatternError> {
    Regex::new(source).map_err(|e| PatternError::Regex {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Recursive-descent translator from glob text to regex source.
struct Compiler<'a> {
    pattern: &'a str,
    chars: Vec<char>,
    pos: usize,
    groups: usize,
    exclusions: Vec<(usize, String)>,
}

impl<'a> Compiler<'a> {
    fn new(pattern: &'a str, body: &str) -> Self {
        Self {
            pattern,
            chars: body.chars().collect(),
            pos: 0,
            groups: 0,
            exclusions: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_boundary(&self, index: usize, terminators: &[char]) -> bool {
        match self.chars.get(index) {
            None => true,
            Some(c) => *c == '/' || terminators.contains(c),
        }
    }

    fn at_segment_start(&self) -> bool {
        self.pos == 0
            || matches!(
                self.chars.get(self.pos - 1),
                Some('/' | '{' | ',' | '(' | '|')
            )
    }

    fn open_group(&mut self) -> usize {
        self.groups += 1;
        self.groups
    }

    /// Translates until one of `terminators` (left unconsumed) or the end.
    fn sequence(&mut self, terminators: &[char]) -> Result<String, PatternError> {
        let mut out = String::new();

        while let Some(c) = self.peek(0) {
            if terminators.contains(&c) {
                break;
            }
            match c {
                '\\' => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek(0) {
                        out.push_str(&regex::escape(&escaped.to_string()));
                        self.pos += 1;
                    }
                }
                '/' if self.peek(1) == Some('*')
                    && self.peek(2) == Some('*')
                    && self.at_boundary(self.pos + 3, terminators)
                    && self.peek(3) != Some('/') =>
                {
                    // trailing `/**` also matches the directory itself
                    self.open_group();
                    out.push_str("(?:/(.*))?");
                    self.pos += 3;
                }
                '*' if self.peek(1) == Some('(') => {
                    self.pos += 2;
                    out.push_str(&self.extglob('*')?);
                }
                '*' => out.push_str(&self.star(terminators)),
                '?' if self.peek(1) == Some('(') => {
                    self.pos += 2;
                    out.push_str(&self.extglob('?')?);
                }
                '@' | '+' | '!' if self.peek(1) == Some('(') => {
                    self.pos += 2;
                    out.push_str(&self.extglob(c)?);
                }
                '?' => {
                    self.pos += 1;
                    out.push_str("[^/]");
                }
                '{' => {
                    self.pos += 1;
                    out.push_str(&self.braces()?);
                }
                '[' => {
                    self.pos += 1;
                    out.push_str(&self.class()?);
                }
                _ => {
                    self.pos += 1;
                    out.push_str(&regex::escape(&c.to_string()));
                }
            }
        }

        Ok(out)
    }

    fn star(&mut self, terminators: &[char]) -> String {
        let start = self.pos;
        let segment_start = self.at_segment_start();
        while self.peek(0) == Some('*') {
            self.pos += 1;
        }
        let stars = self.pos - start;
        let segment_end = self.at_boundary(self.pos, terminators);
        self.open_group();

        if stars >= 2 && segment_start && segment_end {
            if self.peek(0) == Some('/') {
                self.pos += 1;
                return "(?:(.*)/)?".to_string();
            }
            return "(.*)".to_string();
        }
        if segment_start && segment_end {
            "([^/]+?)".to_string()
        } else {
            "([^/]*?)".to_string()
        }
    }

    fn braces(&mut self) -> Result<String, PatternError> {
        self.open_group();
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.sequence(&[',', '}'])?);
            match self.peek(0) {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unclosed('{')),
            }
        }
        Ok(format!("({})", alternatives.join("|")))
    }

    fn extglob(&mut self, kind: char) -> Result<String, PatternError> {
        let group = self.open_group();

        // Negated alternatives are checked by a separate regex, so their own
        // groups must not shift the numbering of the main one.
        let saved_groups = self.groups;
        let saved_exclusions = self.exclusions.len();

        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.sequence(&['|', ')'])?);
            match self.peek(0) {
                Some('|') => self.pos += 1,
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unclosed('(')),
            }
        }
        let joined = alternatives.join("|");

        Ok(match kind {
            '?' => format!("((?:{joined})?)"),
            '*' => format!("((?:{joined})*)"),
            '+' => format!("((?:{joined})+)"),
            '!' => {
                self.groups = saved_groups;
                self.exclusions.truncate(saved_exclusions);
                self.exclusions.push((group, joined));
                "([^/]*?)".to_string()
            }
            _ => format!("({joined})"),
        })
    }

    fn class(&mut self) -> Result<String, PatternError> {
        let mut out = String::from("[");
        if matches!(self.peek(0), Some('!' | '^')) {
            out.push('^');
            self.pos += 1;
        }
        let mut first = true;
        loop {
            match self.peek(0) {
                None => return Err(self.unclosed('[')),
                Some(']') if !first => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek(0) {
                        out.push_str(&regex::escape(&escaped.to_string()));
                        self.pos += 1;
                    }
                }
                Some('-') => {
                    out.push('-');
                    self.pos += 1;
                }
                Some(c) => {
                    out.push_str(&regex::escape(&c.to_string()));
                    self.pos += 1;
                }
            }
            first = false;
        }
        out.push(']');
        Ok(out)
    }

    fn unclosed(&self, delimiter: char) -> PatternError {
        PatternError::Unclosed {
            pattern: self.pattern.to_string(),
            delimiter,
        }
    }
}
