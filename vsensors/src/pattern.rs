//! Glob pattern search over `family/label` with range pruning (spec
//! §4.6).
//!
//! No `fnmatch` binding exists anywhere in this workspace's dependency
//! stack, so wildcards are translated into an anchored `regex::Regex`
//! instead (`regex` is already pulled in by several sibling crates in the
//! retrieval pack this project draws its ambient stack from). Translating
//! once at `Pattern::parse` time and reusing the compiled regex for every
//! candidate is also simply faster than calling into libc `fnmatch` per
//! descriptor.

use bitflags::bitflags;
use regex::{escape, RegexBuilder};

use crate::error::SensorError;
use crate::index::ProbeKey;

bitflags! {
    /// Flags controlling pattern search (spec §6).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SearchFlags: u32 {
        /// Case-insensitive matching. On by default.
        const CASEFOLD = 1 << 0;
        /// Bypass glob matching; compare literally. Requires a `/`.
        const NOPATTERN = 1 << 1;
        /// Acquire the writer lock instead of the reader lock.
        const LOCK_WRITE = 1 << 2;
    }
}

impl Default for SearchFlags {
    fn default() -> Self {
        SearchFlags::CASEFOLD
    }
}

/// A compiled `family/label` search pattern.
pub struct Pattern {
    raw: String,
    family_prefix: String,
    label_prefix: Option<String>,
    matcher: Matcher,
    casefold: bool,
}

enum Matcher {
    Glob(regex::Regex),
    Literal(String),
}

impl Pattern {
    /// Parse `text` under `flags`. Errors if `NOPATTERN` is set and no
    /// `/` appears.
    pub fn parse(text: &str, flags: SearchFlags) -> Result<Pattern, SensorError> {
        let casefold = flags.contains(SearchFlags::CASEFOLD);
        let nopattern = flags.contains(SearchFlags::NOPATTERN);

        if nopattern && !text.contains('/') {
            return Err(SensorError::InvalidPattern {
                pattern: text.to_string(),
                reason: "NOPATTERN requires a '/' separator".to_string(),
            });
        }

        let meta_pos = text.find(['*', '?', '[']);
        let slash_pos = text.find('/');

        let (family_prefix, label_prefix) = match (slash_pos, meta_pos) {
            (Some(slash), meta) if meta.map(|m| slash < m).unwrap_or(true) => {
                let after_slash = &text[slash + 1..];
                let label_meta = after_slash.find(['*', '?', '[']);
                let label_prefix = match label_meta {
                    Some(m) => after_slash[..m].to_string(),
                    None => after_slash.to_string(),
                };
                (text[..slash].to_string(), Some(label_prefix))
            }
            (_, Some(m)) => (text[..m].to_string(), None),
            (_, None) => (text.to_string(), None),
        };

        let matcher = if nopattern {
            Matcher::Literal(text.to_string())
        } else {
            Matcher::Glob(glob_to_regex(text, casefold)?)
        };

        Ok(Pattern {
            raw: text.to_string(),
            family_prefix,
            label_prefix,
            matcher,
            casefold,
        })
    }

    /// The original pattern text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Inclusive `[lo, hi]` probe-key bounds a range scan may use without
    /// missing a possible match (spec §4.6 "Range pruning").
    pub fn probe_bounds(&self) -> (ProbeKey, ProbeKey) {
        match &self.label_prefix {
            Some(label_prefix) => (
                ProbeKey::lower_bound(&self.family_prefix, label_prefix),
                ProbeKey::upper_bound(&self.family_prefix, label_prefix),
            ),
            None => (
                ProbeKey::lower_bound(&self.family_prefix, ""),
                ProbeKey::upper_bound(&self.family_prefix, "\u{10FFFF}"),
            ),
        }
    }

    /// Could a sensor in `family` possibly satisfy this pattern? Used to
    /// decide which loading placeholders a `watch_add` call is relevant
    /// to, using the same prefix computed for range pruning rather than a
    /// full glob match (a family name never contains wildcards of its
    /// own, so prefix comparison is exact whenever the pattern's family
    /// segment is itself literal, and a safe over-approximation
    /// otherwise).
    pub fn family_could_match(&self, family: &str) -> bool {
        let family = if self.casefold { family.to_lowercase() } else { family.to_string() };
        let prefix = if self.casefold {
            self.family_prefix.to_lowercase()
        } else {
            self.family_prefix.clone()
        };
        family.starts_with(&prefix)
    }

    /// Does `family/label` match this pattern?
    pub fn matches(&self, family: &str, label: &str) -> bool {
        let candidate = format!("{family}/{label}");
        match &self.matcher {
            Matcher::Glob(re) => re.is_match(&candidate),
            Matcher::Literal(lit) => {
                if self.casefold {
                    candidate.eq_ignore_ascii_case(lit)
                } else {
                    candidate == *lit
                }
            }
        }
    }
}

/// Inverted match used for loading placeholders (spec §3): the
/// placeholder's own stored pattern is the glob, and `subject` (a new
/// caller pattern being considered for reuse) is the text tested against
/// it.
pub fn placeholder_matches(stored_pattern: &str, subject: &str, casefold: bool) -> bool {
    match glob_to_regex(stored_pattern, casefold) {
        Ok(re) => re.is_match(subject),
        Err(_) => false,
    }
}

fn glob_to_regex(glob: &str, casefold: bool) -> Result<regex::Regex, SensorError> {
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                out.push('[');
                if let Some(&next) = chars.peek() {
                    if next == '!' {
                        out.push('^');
                        chars.next();
                    }
                }
                let mut closed = false;
                for c2 in chars.by_ref() {
                    if c2 == ']' {
                        closed = true;
                        break;
                    }
                    out.push(c2);
                }
                if !closed {
                    return Err(SensorError::InvalidPattern {
                        pattern: glob.to_string(),
                        reason: "unterminated '[' character class".to_string(),
                    });
                }
                out.push(']');
            }
            other => out.push_str(&escape(&other.to_string())),
        }
    }
    out.push('$');
    RegexBuilder::new(&out)
        .case_insensitive(casefold)
        .build()
        .map_err(|e| SensorError::InvalidPattern {
            pattern: glob.to_string(),
            reason: e.to_string(),
        })
}
