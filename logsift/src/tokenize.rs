use regex::Regex;

/// Delimiters used by [`Tokenizer::delimiter_preserving`] when none are given.
pub const DEFAULT_DELIMITERS: &str = "=,:;[]{}()";

/// Splits a raw line into an ordered token sequence. Deterministic and pure;
/// empty or whitespace-only input always yields an empty sequence.
#[derive(Debug, Clone)]
pub enum Tokenizer {
    /// Split on runs of Unicode whitespace.
    Whitespace,
    /// Emit non-delimiter runs and each delimiter character as its own token.
    /// Good for structured logs with key=value pairs:
    /// `action=insert user=tom` -> `["action", "=", "insert", "user", "=", "tom"]`
    DelimiterPreserving { delimiters: String, matcher: Regex },
    /// Emit every non-overlapping match of the pattern.
    Pattern { matcher: Regex },
    /// Key/value extraction for `{...}` object lines; anything else falls back
    /// to whitespace splitting.
    Json,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::delimiter_preserving(DEFAULT_DELIMITERS)
    }
}

impl Tokenizer {
    pub fn whitespace() -> Self {
        Tokenizer::Whitespace
    }

    pub fn delimiter_preserving(delimiters: &str) -> Self {
        // Single delimiter characters win over runs; runs stop at whitespace
        // and at any delimiter. Each char is escaped, so regex specials in the
        // delimiter set are taken literally.
        let class: String = delimiters
            .chars()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        let expr = if class.is_empty() {
            r"\S+".to_string()
        } else {
            format!(r"[{class}]|[^{class}\s]+")
        };
        let matcher = Regex::new(&expr).expect("escaped delimiter class always compiles");
        Tokenizer::DelimiterPreserving {
            delimiters: delimiters.to_string(),
            matcher,
        }
    }

    pub fn pattern(expr: &str) -> Result<Self, regex::Error> {
        Ok(Tokenizer::Pattern {
            matcher: Regex::new(expr)?,
        })
    }

    /// Pattern tokenizer over runs of non-whitespace.
    pub fn pattern_default() -> Self {
        Tokenizer::Pattern {
            matcher: Regex::new(r"\S+").expect("default token pattern compiles"),
        }
    }

    pub fn json() -> Self {
        Tokenizer::Json
    }

    pub fn tokenize(&self, input: &str) -> Vec<String> {
        match self {
            Tokenizer::Whitespace => input.split_whitespace().map(str::to_owned).collect(),
            Tokenizer::DelimiterPreserving { matcher, .. } => matcher
                .find_iter(input)
                .map(|m| m.as_str().to_owned())
                .filter(|t| !t.trim().is_empty())
                .collect(),
            Tokenizer::Pattern { matcher } => matcher
                .find_iter(input)
                .map(|m| m.as_str().to_owned())
                .collect(),
            Tokenizer::Json => tokenize_json(input),
        }
    }
}

fn tokenize_json(input: &str) -> Vec<String> {
    let trimmed = input.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return input.split_whitespace().map(str::to_owned).collect();
    }

    let body = &trimmed[1..trimmed.len() - 1];
    let mut tokens = vec!["{".to_owned()];
    let mut first = true;
    for pair in split_outside_quotes(body, ',') {
        if pair.trim().is_empty() {
            continue;
        }
        let kv = split_outside_quotes(&pair, ':');
        if kv.len() < 2 {
            continue;
        }
        if !first {
            tokens.push(",".to_owned());
        }
        first = false;
        tokens.push(strip_quotes(kv[0].trim()).to_owned());
        tokens.push(":".to_owned());
        tokens.push(strip_quotes(kv[1].trim()).to_owned());
    }
    tokens.push("}".to_owned());
    tokens
}

// Splits on the delimiter, ignoring occurrences inside `"`-quoted spans.
// A quote preceded by a backslash does not toggle the quoted state.
fn split_outside_quotes(s: &str, delimiter: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev = '\0';
    for c in s.chars() {
        if c == '"' && prev != '\\' {
            in_quotes = !in_quotes;
            current.push(c);
        } else if c == delimiter && !in_quotes {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        prev = c;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}
