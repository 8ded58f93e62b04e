use std::sync::OnceLock;

use parrot_core::RandomSource;
use regex::Regex;

const HEDGES: &[&str] = &["honestly,", "tbh,", "i think", "fwiw,"];

/// Replies that say nothing; treated as no reply at all.
const WEAK_REPLIES: &[&str] = &["i dont know"];

struct StylePatterns {
    dashes: Regex,
    whitespace: Regex,
    space_before_punct: Regex,
    trailing_bang_or_dot: Regex,
}

fn build_style_patterns() -> Option<StylePatterns> {
    Some(StylePatterns {
        dashes: Regex::new(r"[–—]").ok()?,
        whitespace: Regex::new(r"\s+").ok()?,
        space_before_punct: Regex::new(r" +([,?])").ok()?,
        trailing_bang_or_dot: Regex::new(r"[!.]+$").ok()?,
    })
}

fn style_patterns() -> Option<&'static StylePatterns> {
    static PATTERNS: OnceLock<Option<StylePatterns>> = OnceLock::new();
    PATTERNS.get_or_init(build_style_patterns).as_ref()
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Tidy spacing and, with probability `hedge_probability`, open a text longer
/// than `hedge_min_chars` with a casual hedge.
pub fn humanize(
    text: &str,
    rng: &mut dyn RandomSource,
    hedge_probability: f64,
    hedge_min_chars: usize,
) -> String {
    let Some(p) = style_patterns() else {
        return text.trim().to_string();
    };
    let out = p.dashes.replace_all(text.trim(), ",");
    let out = p.whitespace.replace_all(&out, " ");
    let out = p.space_before_punct.replace_all(&out, "$1").into_owned();

    if rng.next_f64() < hedge_probability && out.chars().count() > hedge_min_chars {
        let hedge = HEDGES[rng.pick_index(HEDGES.len())];
        return format!("{hedge} {}", lowercase_first(&out));
    }
    out
}

/// Cap at `max_words` words and drop trailing `!`/`.` runs.
pub fn enforce_shortness(text: &str, max_words: usize) -> String {
    let Some(p) = style_patterns() else {
        return text.trim().to_string();
    };
    let mut clean = p.dashes.replace_all(text, ",").into_owned();
    let words: Vec<&str> = clean.split_whitespace().collect();
    if words.len() > max_words {
        clean = words[..max_words].join(" ");
    }
    p.trailing_bang_or_dot
        .replace(&clean, "")
        .trim()
        .to_string()
}

/// Final register: commas for dashes, single spaces, no apostrophes,
/// lowercase, no trailing `!`/`.`.
pub fn sanitize_final(text: &str) -> String {
    let Some(p) = style_patterns() else {
        return text.trim().to_lowercase();
    };
    let out = p.dashes.replace_all(text.trim(), ",");
    let out = p.whitespace.replace_all(&out, " ");
    let out: String = out.chars().filter(|c| !matches!(c, '\'' | '’')).collect();
    let out = out.to_lowercase();
    p.trailing_bang_or_dot.replace(&out, "").trim().to_string()
}

pub fn is_weak_reply(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    normalized.is_empty() || WEAK_REPLIES.contains(&normalized.as_str())
}
