//! Retrieval-and-routing pipeline
//!
//! The orchestrator behind every query: interprets mode-switch commands,
//! classifies small talk, decides between document-grounded answering and
//! general chat, assembles a bounded context from retrieved chunks, invokes
//! the completion provider, and appends a synthesized follow-up question.
//!
//! Routing is a conservative heuristic cascade — compiled patterns plus a
//! single cosine-similarity confidence threshold — because the corpus is
//! small and user-controlled.

pub mod intent;
pub mod prompts;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::completion::CompletionProvider;
use crate::config::{ChunkingConfig, Config};
use crate::error::Result;
use crate::store::{Source, VectorStore};

/// Pipeline routing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Smart routing between documents and chat (default)
    #[default]
    Auto,
    /// Force document-grounded answers with citations
    Docs,
    /// Force open-domain chat, no retrieval
    Chat,
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Mode::Auto),
            "docs" => Ok(Mode::Docs),
            "chat" => Ok(Mode::Chat),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Auto => write!(f, "auto"),
            Mode::Docs => write!(f, "docs"),
            Mode::Chat => write!(f, "chat"),
        }
    }
}

/// Tunable routing parameters, lifted from [`Config`]
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Chunks retrieved per query when the caller does not override
    pub top_k: usize,
    /// Minimum best-chunk similarity for auto-routing to documents
    pub confidence_threshold: f32,
    /// Character budget for the assembled context
    pub max_context_chars: usize,
    /// When false, the pipeline never falls back to open-domain chat
    pub allow_general_chat: bool,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            confidence_threshold: config.retrieval.confidence_threshold,
            max_context_chars: config.retrieval.max_context_chars,
            allow_general_chat: config.pipeline.allow_general_chat,
        }
    }
}

/// Longest excerpt returned by the extractive fallback, in characters
const EXTRACTIVE_ANSWER_CHARS: usize = 800;
/// Accepted length range for a synthesized follow-up question
const FOLLOW_UP_CHARS: std::ops::RangeInclusive<usize> = 3..=180;

/// The retrieval-and-routing pipeline
///
/// Stateless across calls except for [`Mode`], which is owned here (not
/// global) so multiple pipeline instances never interfere.
pub struct RagPipeline {
    store: VectorStore,
    llm: Arc<dyn CompletionProvider>,
    options: PipelineOptions,
    mode: Mode,
}

impl RagPipeline {
    pub fn new(
        store: VectorStore,
        llm: Arc<dyn CompletionProvider>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            llm,
            options,
            mode: Mode::Auto,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        tracing::debug!("Pipeline mode set to {}", mode);
        self.mode = mode;
    }

    /// Rebuild the underlying index from `src_dir` and persist it
    pub fn rebuild_index(&mut self, src_dir: &Path, chunking: &ChunkingConfig) -> Result<usize> {
        Ok(self.store.rebuild(src_dir, chunking)?)
    }

    /// Re-read the persisted index so a long-lived instance picks up an
    /// external rebuild without restart
    pub fn reload_index(&mut self) -> Result<()> {
        self.store.reload()?;
        Ok(())
    }

    /// Number of indexed chunks
    pub fn index_len(&self) -> usize {
        self.store.len()
    }

    /// Answer one query. Returns the answer text and the source list
    /// (empty for every non-grounded branch).
    pub async fn answer(&mut self, query: &str, top_k: usize) -> Result<(String, Vec<Source>)> {
        // 1. Mode-switch command
        if let Some(mode) = intent::parse_mode_command(query) {
            self.set_mode(mode);
            let ack = format!(
                "Switched to **{}** mode. {}",
                mode,
                prompts::WELCOME_MESSAGE
            );
            return Ok((ack, Vec::new()));
        }

        let query = query.trim();

        // 2. Empty query or small talk: guidance, never retrieval
        if query.is_empty() || intent::is_small_talk(query) {
            tracing::debug!("Routing to small-talk guidance");
            let prompt = format!("{}\n\nUser: {}\n\nAssistant:", prompts::SMALLTALK_PROMPT, query);
            let guide = self.llm.complete(&prompt).await.unwrap_or_default();
            let message = format!("{}\n\n{}", guide.trim(), prompts::WELCOME_MESSAGE)
                .trim()
                .to_string();
            return Ok((message, Vec::new()));
        }

        // 3. Forced general chat
        if self.mode == Mode::Chat && self.options.allow_general_chat {
            tracing::debug!("Routing to forced general chat");
            let out = self
                .general_chat(query)
                .await
                .unwrap_or_else(|| "I'm here to chat! Ask me anything.".to_string());
            let answer = self.append_follow_up(query, out.trim()).await;
            return Ok((answer, Vec::new()));
        }

        // 4. Retrieval (docs or auto)
        let docs = self.store.search(query, top_k)?;
        let best_score = docs.first().map(|d| d.score).unwrap_or(0.0);
        let context = format_context(&docs, self.options.max_context_chars);

        // 5. Nothing retrievable
        if context.trim().is_empty() {
            if self.mode == Mode::Docs || !self.options.allow_general_chat {
                return Ok((prompts::EMPTY_INDEX_MESSAGE.to_string(), Vec::new()));
            }
            tracing::debug!("Index empty, falling back to general chat");
            let out = self
                .general_chat(query)
                .await
                .unwrap_or_else(|| "Sure, I can help in general. What would you like to discuss?".to_string());
            let message = format!(
                "{}\n\n{}\n\nReply with `/mode chat` or `/mode docs`.",
                prompts::NO_DOCUMENTS_PREAMBLE,
                out.trim()
            );
            return Ok((message, Vec::new()));
        }

        // 6. Auto-mode ambiguity gate: not confident the user wants docs,
        //    so answer generally and offer the choice; retrieved chunks are
        //    discarded for this turn
        if self.mode == Mode::Auto
            && self.options.allow_general_chat
            && !self.wants_docs(query, best_score)
        {
            tracing::debug!(best_score, "Ambiguity gate: offering mode choice");
            let out = self
                .general_chat(query)
                .await
                .unwrap_or_else(|| "I can help in general. What would you like to explore?".to_string());
            let combined = format!("{}\n\n{}", out.trim(), prompts::MODE_CHOICE_MESSAGE);
            let answer = self.append_follow_up(query, &combined).await;
            return Ok((answer, Vec::new()));
        }

        // 7. Document-grounded answer
        tracing::debug!(best_score, results = docs.len(), "Routing to grounded answer");
        let prompt = format!(
            "{}\n\n{}\n\n# Question\n{}\n\n# Context\n{}\n\n# Your Answer",
            prompts::QA_PROMPT,
            prompts::style_directive(query),
            query,
            context
        );

        match self.llm.complete(&prompt).await {
            Some(out) => {
                let answer = self.append_follow_up(query, out.trim()).await;
                Ok((answer, docs))
            }
            None => {
                // Extractive fallback: best excerpt, no follow-up since no
                // generative step occurred
                let text = docs.first().map(|d| d.text.as_str()).unwrap_or("");
                let answer = if text.is_empty() {
                    "No context found.".to_string()
                } else {
                    truncate_chars(text, EXTRACTIVE_ANSWER_CHARS)
                };
                Ok((answer, docs))
            }
        }
    }

    /// Whether the query should commit to document grounding
    fn wants_docs(&self, query: &str, best_score: f32) -> bool {
        intent::wants_citations(query)
            || intent::has_file_hint(query)
            || best_score >= self.options.confidence_threshold
    }

    async fn general_chat(&self, query: &str) -> Option<String> {
        let prompt = format!(
            "{}\n\nUser: {}\n\nAssistant:",
            prompts::GENERAL_CHAT_PROMPT,
            query
        );
        self.llm.complete(&prompt).await
    }

    /// Append exactly one follow-up question to `answer`
    ///
    /// Synthesis failures of any kind degrade to the fixed generic follow-up;
    /// this step never fails the overall answer.
    async fn append_follow_up(&self, query: &str, answer: &str) -> String {
        let prompt = format!(
            "{}\n\nUser message:\n{}\n\nAssistant answer:\n{}\n\nFollow-up question:",
            prompts::FOLLOW_UP_PROMPT,
            query,
            answer
        );

        if let Some(next) = self.llm.complete(&prompt).await {
            let question = next.trim();
            if FOLLOW_UP_CHARS.contains(&question.chars().count()) {
                return format!("{}\n\n{}", answer, question);
            }
            tracing::debug!(
                length = question.chars().count(),
                "Discarding out-of-range follow-up"
            );
        }
        format!("{}\n\n{}", answer, prompts::GENERIC_FOLLOW_UP)
    }
}

/// Concatenate `[filename:pPAGE]\n{chunk}` blocks in descending-score order,
/// stopping before the budget is crossed. The first block is always kept so
/// a single oversized chunk still yields usable context.
fn format_context(docs: &[Source], max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut total = 0usize;

    for doc in docs {
        let name = doc
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        let page_tag = doc.page.map(|p| format!(":p{}", p)).unwrap_or_default();
        let text = doc.text.trim();
        if text.is_empty() {
            continue;
        }
        let block = format!("[{}{}]\n{}", name, page_tag, text);
        if total + block.len() > max_chars && !parts.is_empty() {
            break;
        }
        total += block.len();
        parts.push(block);
    }

    parts.join("\n\n---\n\n")
}

/// Truncate to `max_chars` characters, marking the cut with an ellipsis
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(name: &str, page: Option<u32>, text: &str, score: f32) -> Source {
        Source {
            path: PathBuf::from(format!("/docs/{}", name)),
            page,
            text: text.to_string(),
            score,
        }
    }

    #[test]
    fn context_blocks_carry_filename_and_page_tags() {
        let docs = vec![
            source("report.pdf", Some(12), "page twelve text", 0.9),
            source("notes.txt", None, "plain notes", 0.5),
        ];
        let context = format_context(&docs, 10_000);
        assert!(context.starts_with("[report.pdf:p12]\npage twelve text"));
        assert!(context.contains("\n\n---\n\n[notes.txt]\nplain notes"));
    }

    #[test]
    fn context_respects_character_budget() {
        let docs = vec![
            source("a.txt", None, &"x".repeat(50), 0.9),
            source("b.txt", None, &"y".repeat(50), 0.8),
            source("c.txt", None, &"z".repeat(50), 0.7),
        ];
        // Budget fits roughly two blocks
        let context = format_context(&docs, 120);
        assert!(context.contains("a.txt"));
        assert!(context.contains("b.txt"));
        assert!(!context.contains("c.txt"));
    }

    #[test]
    fn first_block_is_kept_even_over_budget() {
        let docs = vec![source("huge.txt", None, &"x".repeat(500), 0.9)];
        let context = format_context(&docs, 100);
        assert!(context.contains("huge.txt"));
    }

    #[test]
    fn truncation_appends_ellipsis_only_when_needed() {
        assert_eq!(truncate_chars("short", 800), "short");
        let long = "a".repeat(900);
        let cut = truncate_chars(&long, 800);
        assert_eq!(cut.chars().count(), 803);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn mode_parses_and_displays() {
        assert_eq!("docs".parse::<Mode>(), Ok(Mode::Docs));
        assert_eq!(" AUTO ".parse::<Mode>(), Ok(Mode::Auto));
        assert!("other".parse::<Mode>().is_err());
        assert_eq!(Mode::Chat.to_string(), "chat");
        assert_eq!(Mode::default(), Mode::Auto);
    }
}
