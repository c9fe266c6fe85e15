//! Name validation and normalization: charset rules, denylist, multi-word and
//! hyphen policies, transliteration, Title-casing.
//! Rejections are per-record and never abort a run; callers count them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::data::record::NameRecord;

/// What to do with names containing whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiWordPolicy {
    Reject,
    /// Keep only the first whitespace-delimited token.
    #[default]
    FirstToken,
}

/// What to do with hyphenated names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HyphenPolicy {
    Reject,
    /// Replace the record with one derived record per hyphen-delimited token,
    /// each carrying a `splitFrom` back reference to the original form.
    #[default]
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    Denylisted,
    SingleLetter,
    MultiWord,
    Hyphenated,
    InvalidChars,
    /// Non-Latin characters remained after table lookup and mark stripping.
    Untransliterable,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Denylisted => "denylisted",
            Self::SingleLetter => "single-letter",
            Self::MultiWord => "multi-word",
            Self::Hyphenated => "hyphenated",
            Self::InvalidChars => "invalid-chars",
            Self::Untransliterable => "untransliterable",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of normalizing one raw record.
#[derive(Debug, Clone)]
pub enum Outcome {
    Accepted(NameRecord),
    /// Hyphen split: the original record is replaced by these derived records.
    Split(Vec<NameRecord>),
    Rejected { name: String, reason: RejectReason },
}

/// Single letters accepted as standalone names.
const SINGLE_LETTER_ALLOWLIST: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'R', 'S', 'T', 'V', 'W', 'X',
    'Y', 'Z',
];

/// Known-bad literal entries seen in source data (abbreviations, junk rows).
pub fn default_denylist() -> Vec<String> {
    ["A.", "B.", "C.", "A.franko", "A-drian", "A-j", "A-jay", "A-kay"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Direct transliterations for names the mark-stripping fallback cannot handle.
pub fn default_transliterations() -> HashMap<String, String> {
    [
        ("محمد", "Mohammed"),
        ("أحمد", "Ahmed"),
        ("احمد", "Ahmed"),
        ("علي", "Ali"),
        ("عمر", "Omar"),
        ("يوسف", "Youssef"),
        ("إبراهيم", "Ibrahim"),
        ("فاطمة", "Fatima"),
        ("عائشة", "Aisha"),
        ("مريم", "Maryam"),
        ("ليلى", "Layla"),
        ("سارة", "Sara"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Clone)]
pub struct NormalizePolicy {
    pub multi_word: MultiWordPolicy,
    pub hyphen: HyphenPolicy,
    /// Accept apostrophes on input (stripped during cleaning) instead of rejecting.
    pub allow_apostrophe: bool,
    pub denylist: Vec<String>,
    pub transliterations: HashMap<String, String>,
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        NormalizePolicy {
            multi_word: MultiWordPolicy::default(),
            hyphen: HyphenPolicy::default(),
            allow_apostrophe: true,
            denylist: default_denylist(),
            transliterations: default_transliterations(),
        }
    }
}

/// Normalize one raw record: returns the cleaned record, derived split records,
/// or a rejection with its reason.
pub fn normalize_record(mut record: NameRecord, policy: &NormalizePolicy) -> Outcome {
    let raw = record.name.trim().to_string();
    if raw.is_empty() {
        return Outcome::Rejected {
            name: record.name,
            reason: RejectReason::Empty,
        };
    }

    if policy.denylist.iter().any(|entry| entry == &raw) {
        return Outcome::Rejected {
            name: raw,
            reason: RejectReason::Denylisted,
        };
    }

    let latin = match to_latin(&raw, &policy.transliterations) {
        Ok(latin) => latin,
        Err(reason) => {
            return Outcome::Rejected { name: raw, reason };
        }
    };

    if let Some(reason) = charset_violation(&latin, policy.allow_apostrophe) {
        return Outcome::Rejected { name: raw, reason };
    }

    let single = match policy.multi_word {
        _ if !latin.contains(char::is_whitespace) => latin,
        MultiWordPolicy::Reject => {
            return Outcome::Rejected {
                name: raw,
                reason: RejectReason::MultiWord,
            };
        }
        MultiWordPolicy::FirstToken => match latin.split_whitespace().next() {
            Some(token) => token.to_string(),
            None => {
                return Outcome::Rejected {
                    name: raw,
                    reason: RejectReason::Empty,
                };
            }
        },
    };

    if single.contains('-') {
        match policy.hyphen {
            HyphenPolicy::Reject => {
                return Outcome::Rejected {
                    name: raw,
                    reason: RejectReason::Hyphenated,
                };
            }
            HyphenPolicy::Split => {
                let parent = single.clone();
                let derived: Vec<NameRecord> = single
                    .split('-')
                    .filter_map(|token| finish_name(token))
                    .map(|name| {
                        let mut child = record.clone();
                        child.name = name;
                        child.split_from = Some(parent.clone());
                        child
                    })
                    .collect();
                if derived.is_empty() {
                    return Outcome::Rejected {
                        name: raw,
                        reason: RejectReason::Hyphenated,
                    };
                }
                return Outcome::Split(derived);
            }
        }
    }

    match finish_name(&single) {
        Some(name) => {
            record.name = name;
            Outcome::Accepted(record)
        }
        None => Outcome::Rejected {
            name: raw,
            reason: RejectReason::SingleLetter,
        },
    }
}

/// Apostrophe stripping, single-letter check, Title-casing. Returns None when
/// the cleaned token is empty or a disallowed single letter.
fn finish_name(token: &str) -> Option<String> {
    let cleaned = strip_punctuation(token);
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.chars().count() == 1 {
        let letter = cleaned.chars().next()?.to_ascii_uppercase();
        if !SINGLE_LETTER_ALLOWLIST.contains(&letter) {
            return None;
        }
        return Some(letter.to_string());
    }
    Some(title_case(&cleaned))
}

fn strip_punctuation(value: &str) -> String {
    value.chars().filter(|ch| ch.is_ascii_alphabetic()).collect()
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Best-effort Latin form: direct table lookup first, then NFD decomposition
/// with combining marks dropped. Errors when non-ASCII residue remains.
fn to_latin(raw: &str, table: &HashMap<String, String>) -> Result<String, RejectReason> {
    if let Some(mapped) = table.get(raw) {
        return Ok(mapped.clone());
    }
    if raw.is_ascii() {
        return Ok(raw.to_string());
    }
    let stripped: String = raw.nfd().filter(|ch| !is_combining_mark(*ch)).collect();
    if stripped.is_ascii() {
        return Ok(stripped);
    }
    Err(RejectReason::Untransliterable)
}

fn charset_violation(value: &str, allow_apostrophe: bool) -> Option<RejectReason> {
    for ch in value.chars() {
        let ok = ch.is_ascii_alphabetic()
            || ch.is_whitespace()
            || ch == '-'
            || (allow_apostrophe && ch == '\'');
        if !ok {
            return Some(RejectReason::InvalidChars);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(name: &str, policy: &NormalizePolicy) -> String {
        match normalize_record(NameRecord::new(name), policy) {
            Outcome::Accepted(rec) => rec.name,
            other => panic!("expected acceptance for '{name}', got {other:?}"),
        }
    }

    fn reject_reason(name: &str, policy: &NormalizePolicy) -> RejectReason {
        match normalize_record(NameRecord::new(name), policy) {
            Outcome::Rejected { reason, .. } => reason,
            other => panic!("expected rejection for '{name}', got {other:?}"),
        }
    }

    #[test]
    fn title_cases_and_trims() {
        let policy = NormalizePolicy::default();
        assert_eq!(accept("  nOAH ", &policy), "Noah");
        assert_eq!(accept("EMMA", &policy), "Emma");
    }

    #[test]
    fn first_token_policy_keeps_first_word() {
        let policy = NormalizePolicy::default();
        assert_eq!(accept("Anne Marie", &policy), "Anne");
    }

    #[test]
    fn reject_policy_drops_multi_word() {
        let policy = NormalizePolicy {
            multi_word: MultiWordPolicy::Reject,
            ..NormalizePolicy::default()
        };
        assert_eq!(reject_reason("Anne Marie", &policy), RejectReason::MultiWord);
    }

    #[test]
    fn denylist_rejects_known_bad_entries() {
        let policy = NormalizePolicy::default();
        assert_eq!(reject_reason("A.franko", &policy), RejectReason::Denylisted);
    }

    #[test]
    fn accent_stripping_without_table_entry() {
        let policy = NormalizePolicy::default();
        assert_eq!(accept("José", &policy), "Jose");
        assert_eq!(accept("Zoë", &policy), "Zoe");
    }

    #[test]
    fn direct_table_wins_over_stripping() {
        let policy = NormalizePolicy::default();
        assert_eq!(accept("محمد", &policy), "Mohammed");
    }

    #[test]
    fn untransliterable_script_is_rejected() {
        let policy = NormalizePolicy::default();
        assert_eq!(reject_reason("美咲", &policy), RejectReason::Untransliterable);
    }

    #[test]
    fn hyphen_split_derives_records_with_back_reference() {
        let policy = NormalizePolicy::default();
        let mut record = NameRecord::new("Anne-Marie");
        record.countries.insert("FR".to_string(), 5);
        match normalize_record(record, &policy) {
            Outcome::Split(derived) => {
                let names: Vec<&str> = derived.iter().map(|r| r.name.as_str()).collect();
                assert_eq!(names, vec!["Anne", "Marie"]);
                for child in &derived {
                    assert_eq!(child.split_from.as_deref(), Some("Anne-Marie"));
                    assert_eq!(child.countries.get("FR"), Some(&5));
                }
            }
            other => panic!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn hyphen_reject_policy() {
        let policy = NormalizePolicy {
            hyphen: HyphenPolicy::Reject,
            ..NormalizePolicy::default()
        };
        assert_eq!(reject_reason("Anne-Marie", &policy), RejectReason::Hyphenated);
    }

    #[test]
    fn apostrophes_are_stripped_when_allowed() {
        let policy = NormalizePolicy::default();
        assert_eq!(accept("O'brien", &policy), "Obrien");
    }

    #[test]
    fn apostrophes_reject_when_disallowed() {
        let policy = NormalizePolicy {
            allow_apostrophe: false,
            ..NormalizePolicy::default()
        };
        assert_eq!(reject_reason("O'brien", &policy), RejectReason::InvalidChars);
    }

    #[test]
    fn single_letters_follow_allowlist() {
        let policy = NormalizePolicy::default();
        assert_eq!(accept("j", &policy), "J");
        assert_eq!(reject_reason("q", &policy), RejectReason::SingleLetter);
    }

    #[test]
    fn digits_are_invalid() {
        let policy = NormalizePolicy::default();
        assert_eq!(reject_reason("N4omi", &policy), RejectReason::InvalidChars);
    }

    #[test]
    fn empty_name_is_rejected() {
        let policy = NormalizePolicy::default();
        assert_eq!(reject_reason("   ", &policy), RejectReason::Empty);
    }
}
