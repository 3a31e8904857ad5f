//! CLP-style pattern extraction: split a string into a pattern template
//! plus a small set of named, extracted variables.
//!
//! Ported in behavior from `original_source/joedb/clp.py`, generalized
//! into the teacher's preference for `regex::Regex` (the teacher takes
//! `regex` as a core dependency; see `src/html/grammar.rs` and friends for
//! precedent of regex-driven tokenizers in this style).

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Hard cap on the number of variables extracted from a single string,
/// matching `clp.py`'s `total_vars >= 10` guard.
const MAX_VARS: usize = 10;

const KINDS: [&str; 4] = ["number", "time", "hex", "ip"];

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z?\b").unwrap()
    })
}

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(\s+|[{}\[\](),;:"'=\-.])"#).unwrap())
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").unwrap())
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+s$").unwrap())
}

fn hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0x)?[0-9a-fA-F]+$").unwrap())
}

fn ip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}$").unwrap())
}

fn kind_re(kind: &str) -> &'static Regex {
    match kind {
        "number" => number_re(),
        "time" => time_re(),
        "hex" => hex_re(),
        "ip" => ip_re(),
        _ => unreachable!(),
    }
}

/// Result of [`extract_pattern`]: the template and the literals it peeled
/// off, keyed by synthetic variable name `var_{root}_{n}_{kind}`.
pub struct Extracted {
    pub pattern: String,
    pub variables: BTreeMap<String, String>,
}

/// Split `s` into a pattern template and extracted variables, per
/// spec.md §4.A. `root` names the column the string came from, and is
/// embedded in every synthetic variable name.
pub fn extract_pattern(s: &str, root: &str) -> Extracted {
    let mut variables = BTreeMap::new();
    let mut counts: BTreeMap<&str, usize> = KINDS.iter().map(|k| (*k, 0)).collect();
    let mut total = 0usize;

    // Step 1: pull out ISO-8601-like timestamps before tokenizing.
    let mut after_ts = String::new();
    let mut last = 0;
    for m in timestamp_re().find_iter(s) {
        if total >= MAX_VARS {
            break;
        }
        after_ts.push_str(&s[last..m.start()]);
        let n = *counts.get("timestamp").unwrap_or(&0);
        let name = format!("var_{}_{}_timestamp", root, n);
        variables.insert(name.clone(), m.as_str().to_string());
        counts.insert("timestamp", n + 1);
        total += 1;
        after_ts.push('{');
        after_ts.push_str(&name);
        after_ts.push('}');
        last = m.end();
    }
    after_ts.push_str(&s[last..]);

    // Step 2: tokenize on whitespace runs and the separator charset,
    // retaining separators as their own tokens.
    let tokens = split_retaining(&after_ts);

    // Step 3: test each non-whitespace token against the remaining kinds
    // in fixed order; on a full match, substitute with `{name}`.
    let mut pattern = String::new();
    for tok in tokens {
        if tok.trim().is_empty() {
            pattern.push_str(tok);
            continue;
        }
        let mut matched = false;
        if total < MAX_VARS {
            for kind in KINDS {
                if kind_re(kind).is_match(tok) {
                    let n = *counts.get(kind).unwrap_or(&0);
                    let name = format!("var_{}_{}_{}", root, n, kind);
                    variables.insert(name.clone(), tok.to_string());
                    counts.insert(kind, n + 1);
                    total += 1;
                    pattern.push('{');
                    pattern.push_str(&name);
                    pattern.push('}');
                    matched = true;
                    break;
                }
            }
        }
        if !matched {
            pattern.push_str(tok);
        }
    }

    Extracted { pattern, variables }
}

/// Split `s` into tokens, keeping every run matched by [`separator_re`]
/// as its own token (mirrors Python's `re.split` with a capturing group).
fn split_retaining(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in separator_re().find_iter(s) {
        if m.start() > last {
            out.push(&s[last..m.start()]);
        }
        out.push(m.as_str());
        last = m.end();
    }
    if last < s.len() {
        out.push(&s[last..]);
    }
    out
}

/// Substitute every `{name}` placeholder in `pattern` by its literal
/// in `variables`. Inverse of [`extract_pattern`] (spec.md §4.A guarantee).
pub fn rehydrate(pattern: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = pattern.to_string();
    for (name, lit) in variables {
        out = out.replace(&format!("{{{}}}", name), lit);
    }
    out
}
