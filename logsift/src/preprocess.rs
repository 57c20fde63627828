use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::EngineConfig;

static RE_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    // ISO 8601 (optional fractional seconds and timezone), syslog, common log,
    // 10-digit unix epoch, bracketed ISO, and plain `date time` forms.
    Regex::new(
        r"(?x)
          \d{4}-\d{2}-\d{2}[T\ ]\d{2}:\d{2}:\d{2}(?:\.\d{3,9})?(?:Z|[+-]\d{2}:\d{2})?
        | [A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}
        | \d{2}/[A-Z][a-z]{2}/\d{4}:\d{2}:\d{2}:\d{2}\s+[+-]\d{4}
        | \b1[67]\d{8}\b
        | \[\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}(?:\.\d{3,9})?\]
        | \d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}(?:\.\d{3,9})?
    ",
    )
    .unwrap()
});

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:https?|ftp)://[^\s/$.?#][^\s]*\b").unwrap());

static RE_PATH: Lazy<Regex> = Lazy::new(|| {
    // Unix paths need two or more directory segments so single-level tokens
    // like `INFO/DEBUG` survive; Windows paths need a drive letter.
    Regex::new(
        r#"(?x)
          /(?:[a-zA-Z0-9_.-]+/){2,}[a-zA-Z0-9_.-]*
        | [A-Z]:\\(?:[^\\/:*?"<>|\r\n]+\\)+[^\\/:*?"<>|\r\n]*
    "#,
    )
    .unwrap()
});

static RE_IPV6: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
          \b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b
        | \b(?:[0-9a-fA-F]{1,4}:){1,7}:\b
        | \b::(?:[0-9a-fA-F]{1,4}:){0,6}[0-9a-fA-F]{1,4}\b
    ",
    )
    .unwrap()
});

static RE_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
    )
    .unwrap()
});

// Conservative: word-bounded runs of 4+ digits and decimals only. HTTP codes,
// ports under four digits and embedded numbers (`user123`) are preserved.
static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4,}\b|\b\d+\.\d+\b").unwrap());

/// Normalizes variable surface forms (timestamps, URLs, paths, IPs, numbers)
/// to fixed placeholders before tokenization, so lines that differ only in
/// those values cluster together.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    timestamps: bool,
    urls: bool,
    paths: bool,
    ips: bool,
    numbers: bool,
    lowercase: bool,
}

impl Preprocessor {
    /// Returns `None` when no normalization is enabled, so callers can skip
    /// the pass entirely.
    pub fn from_config(config: &EngineConfig) -> Option<Preprocessor> {
        let p = Preprocessor {
            timestamps: config.normalize_timestamps(),
            urls: config.normalize_urls(),
            paths: config.normalize_paths(),
            ips: config.normalize_ips(),
            numbers: config.normalize_numbers(),
            lowercase: !config.case_sensitive(),
        };
        if p.timestamps || p.urls || p.paths || p.ips || p.numbers || p.lowercase {
            Some(p)
        } else {
            None
        }
    }

    /// Applies the enabled substitutions in a fixed order: timestamps, URLs
    /// (before paths), paths, IPv6 then IPv4, numbers, then case folding.
    pub fn preprocess(&self, raw: &str) -> String {
        let mut s = raw.to_string();
        if self.timestamps {
            s = RE_TIMESTAMP.replace_all(&s, "TIMESTAMP").into_owned();
        }
        if self.urls {
            s = RE_URL.replace_all(&s, "URL").into_owned();
        }
        if self.paths {
            s = RE_PATH.replace_all(&s, "PATH").into_owned();
        }
        if self.ips {
            s = RE_IPV6.replace_all(&s, "IP_ADDR").into_owned();
            s = RE_IPV4.replace_all(&s, "IP_ADDR").into_owned();
        }
        if self.numbers {
            s = RE_NUMBER.replace_all(&s, "NUM").into_owned();
        }
        if self.lowercase {
            s = s.to_lowercase();
        }
        s
    }
}
