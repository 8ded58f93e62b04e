use std::collections::HashMap;
use std::sync::OnceLock;

use parrot_core::similarity;
use regex::Regex;

/// Filler openers that read as a tic when repeated.
pub const OVERUSED_STARTERS: &[&str] = &["ah", "fr", "tbh", "ngl"];

const EMOJI_BLOCKS: &str = r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}]";

struct EmojiPatterns {
    detect: Regex,
    strip: Regex,
}

fn build_emoji_patterns() -> Option<EmojiPatterns> {
    let detect = Regex::new(EMOJI_BLOCKS).ok()?;
    let strip = Regex::new(r"\p{Extended_Pictographic}")
        .or_else(|_| Regex::new(EMOJI_BLOCKS))
        .ok()?;
    Some(EmojiPatterns { detect, strip })
}

fn emoji_patterns() -> Option<&'static EmojiPatterns> {
    static PATTERNS: OnceLock<Option<EmojiPatterns>> = OnceLock::new();
    PATTERNS.get_or_init(build_emoji_patterns).as_ref()
}

/// Whether the text uses emoji from the emoticon, symbol or transport blocks.
pub fn contains_emoji(text: &str) -> bool {
    emoji_patterns().is_some_and(|p| p.detect.is_match(text))
}

pub fn strip_pictographs(text: &str) -> String {
    match emoji_patterns() {
        Some(p) => p.strip.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

fn first_word(text: &str) -> &str {
    text.split(' ').next().unwrap_or_default()
}

/// Drop candidates opening with a filler word already used `limit` times
/// among `recent_outputs`.
pub fn drop_overused_starters(
    candidates: Vec<String>,
    recent_outputs: &[&str],
    limit: usize,
) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for output in recent_outputs {
        let lowered = output.to_lowercase();
        let word = first_word(&lowered);
        if OVERUSED_STARTERS.contains(&word) {
            *counts.entry(word.to_string()).or_default() += 1;
        }
    }

    candidates
        .into_iter()
        .filter(|candidate| {
            let lowered = candidate.to_lowercase();
            let word = first_word(&lowered);
            let overused = OVERUSED_STARTERS.contains(&word)
                && counts.get(word).copied().unwrap_or_default() >= limit;
            if overused {
                tracing::debug!(starter = word, "dropping candidate with overused starter");
            }
            !overused
        })
        .collect()
}

/// Greedy keep-list: a candidate survives only if it is at most `threshold`
/// similar (case-insensitive) to everything kept before it.
pub fn dedup_near_duplicates(candidates: Vec<String>, threshold: f64) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(candidates.len());
    let mut kept_lower: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let lowered = candidate.to_lowercase();
        if kept_lower
            .iter()
            .any(|existing| similarity(existing, &lowered) > threshold)
        {
            continue;
        }
        kept_lower.push(lowered);
        kept.push(candidate);
    }
    kept
}

/// Pick the candidate with the lowest summed `1 - similarity` against the
/// recent outputs; the first candidate wins ties.
///
/// Minimizing this sum favours the candidate closest to recent history, not
/// the most novel one. This is the long-standing behaviour and is kept as is.
pub fn pick_novel_candidate<'a>(candidates: &'a [String], recent_outputs: &[&str]) -> Option<&'a str> {
    let recent: Vec<String> = recent_outputs.iter().map(|r| r.to_lowercase()).collect();
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let lowered = candidate.to_lowercase();
        let score: f64 = recent
            .iter()
            .map(|previous| 1.0 - similarity(&lowered, previous))
            .sum();
        if best.is_none_or(|(_, best_score)| score < best_score) {
            best = Some((candidate.as_str(), score));
        }
    }
    best.map(|(candidate, _)| candidate)
}
