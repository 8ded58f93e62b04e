use std::sync::OnceLock;

use parrot_core::RandomSource;
use regex::Regex;

/// Stock deflections used when someone asks for insider knowledge.
pub const DENIAL_REPLIES: &[&str] = &[
    "no clue tbh",
    "not sure honestly",
    "wish i knew",
    "havent heard anything",
    "no idea bout that",
];

/// Team-voice to community-voice substitutions, applied in order.
const PERSPECTIVE_RULES: &[(&str, &str)] = &[
    (r"(?i)\bour team\b", "the team"),
    (r"(?i)\bwe are\b", "they are"),
    (r"(?i)\bwe were\b", "they were"),
    (r"(?i)\bwe will\b", "they will"),
    (r"(?i)\bwe do\b", "they do"),
    (r"(?i)\bwe\b", "they"),
    (r"(?i)\bours\b", "theirs"),
    (r"(?i)\bour\b", "their"),
    (r"(?i)\bi (know|confirm|guarantee)\b", "from what i know"),
];

const INSIDER_PATTERNS: &[&str] = &[
    r"(?i)\b(hire|hiring|recruit|application|apply for|job opening|position available)\b",
    r"(?i)\b(roadmap|timeline|release date|launch date|when will.*release)\b",
    r"(?i)\b(are you (staff|team|admin|mod)|team member|official response)\b",
    r"(?i)\b(partnership with|funding round|investor|vc)\b",
    r"(?i)\b(whitelist spot|airdrop allocation|insider.*info)\b",
];

const DENIAL_PATTERN: &str =
    r"(?i)\b(dont know|no clue|not sure|cant say|no idea|wish i knew|haven.*heard)\b";

struct RewritePatterns {
    perspective: Vec<(Regex, &'static str)>,
    insider: Vec<Regex>,
    denial: Regex,
}

fn build_rewrite_patterns() -> Option<RewritePatterns> {
    let perspective = PERSPECTIVE_RULES
        .iter()
        .map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, *replacement)))
        .collect::<Option<Vec<_>>>()?;
    let insider = INSIDER_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).ok())
        .collect::<Option<Vec<_>>>()?;
    Some(RewritePatterns {
        perspective,
        insider,
        denial: Regex::new(DENIAL_PATTERN).ok()?,
    })
}

fn rewrite_patterns() -> Option<&'static RewritePatterns> {
    static PATTERNS: OnceLock<Option<RewritePatterns>> = OnceLock::new();
    PATTERNS.get_or_init(build_rewrite_patterns).as_ref()
}

/// Speak about the project as a community member, not as its team.
pub fn enforce_community_perspective(text: &str) -> String {
    let Some(patterns) = rewrite_patterns() else {
        return text.to_string();
    };
    patterns
        .perspective
        .iter()
        .fold(text.to_string(), |out, (re, replacement)| {
            re.replace_all(&out, *replacement).into_owned()
        })
}

pub fn is_insider_question(input: &str) -> bool {
    let lowered = input.to_lowercase();
    rewrite_patterns().is_some_and(|p| p.insider.iter().any(|re| re.is_match(&lowered)))
}

/// Replace the reply with a stock denial when the input fishes for insider
/// information, unless the reply already denies knowing.
pub fn override_if_insider(input: &str, reply: &str, rng: &mut dyn RandomSource) -> String {
    if !is_insider_question(input) {
        return reply.to_string();
    }
    if rewrite_patterns().is_some_and(|p| p.denial.is_match(reply)) {
        return reply.to_string();
    }
    let denial = DENIAL_REPLIES[rng.pick_index(DENIAL_REPLIES.len())];
    tracing::debug!(denial, "insider question, replacing reply with denial");
    denial.to_string()
}
