//! Intent classification predicates
//!
//! Heuristic, regex-based routing signals over compiled pattern sets. Each
//! predicate is a whole-message or keyword test used by the pipeline's
//! routing cascade; they are deliberately simple pattern matches rather than
//! a learned classifier.

use regex::Regex;
use std::sync::OnceLock;

use super::Mode;

fn mode_command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^/mode\s+(auto|docs|chat)\s*$").expect("mode command pattern")
    })
}

fn small_talk_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(hi|hello|hey|sup|yo|hola|namaste|hii+|good (morning|afternoon|evening)|how (are|r) (you|u)|who are you|help|what can you do|thanks|thank you)\W*$",
        )
        .expect("small talk pattern")
    })
}

fn file_hint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\.(pdf|md|txt)\b|p\d+\b|\bfile:?|document\b").expect("file hint pattern")
    })
}

/// Keywords that explicitly ask for a cited, document-grounded answer
const CITATION_KEYWORDS: [&str; 6] = [
    "cite",
    "citation",
    "according to",
    "from the pdf",
    "from the document",
    "source:",
];

/// Parse a `/mode auto|docs|chat` command; None when the message is not one
pub fn parse_mode_command(query: &str) -> Option<Mode> {
    let captures = mode_command_pattern().captures(query.trim())?;
    captures[1].to_lowercase().parse().ok()
}

/// Whole-message small-talk match (greetings, thanks, "who are you", "help")
pub fn is_small_talk(query: &str) -> bool {
    small_talk_pattern().is_match(query)
}

/// Query mentions a filename, page reference, or file/document wording
pub fn has_file_hint(query: &str) -> bool {
    file_hint_pattern().is_match(query)
}

/// Query explicitly asks for citations or quotes a source
pub fn wants_citations(query: &str) -> bool {
    let lower = query.to_lowercase();
    CITATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_commands_parse_case_insensitively() {
        assert_eq!(parse_mode_command("/mode docs"), Some(Mode::Docs));
        assert_eq!(parse_mode_command("  /MODE Chat  "), Some(Mode::Chat));
        assert_eq!(parse_mode_command("/mode auto"), Some(Mode::Auto));
    }

    #[test]
    fn non_commands_are_rejected() {
        assert_eq!(parse_mode_command("/mode"), None);
        assert_eq!(parse_mode_command("/mode turbo"), None);
        assert_eq!(parse_mode_command("tell me about /mode docs"), None);
        assert_eq!(parse_mode_command("/mode docs please"), None);
    }

    #[test]
    fn small_talk_matches_whole_message_only() {
        assert!(is_small_talk("hello"));
        assert!(is_small_talk("  Hey!  "));
        assert!(is_small_talk("good morning"));
        assert!(is_small_talk("who are you?"));
        assert!(is_small_talk("thanks"));
        assert!(is_small_talk("hiii"));

        assert!(!is_small_talk("hello, what does the report say?"));
        assert!(!is_small_talk("help me configure the deployment"));
    }

    #[test]
    fn file_hints_cover_extensions_pages_and_wording() {
        assert!(has_file_hint("what does report.pdf say about deployment"));
        assert!(has_file_hint("summarize notes.md"));
        assert!(has_file_hint("see p12 for details"));
        assert!(has_file_hint("which file mentions the budget"));
        assert!(has_file_hint("check the document"));

        assert!(!has_file_hint("how do plants grow"));
    }

    #[test]
    fn citation_requests_are_detected() {
        assert!(wants_citations("answer with citations"));
        assert!(wants_citations("According to the notes, what changed?"));
        assert!(wants_citations("what is the figure from the pdf"));

        assert!(!wants_citations("what is the capital of France"));
    }
}
