//! Prompt constants and answer-style selection

/// System prompt for document-grounded answers
pub const QA_PROMPT: &str = r#"You are a careful, helpful assistant that answers using the provided context ONLY.
Write clearly and naturally:
- Summarize and synthesize; do NOT copy long raw lines from the PDF.
- Prefer short paragraphs and bullet points. Use steps for procedures.
- If the context only partially answers, say what is known and what is not.
- Never invent facts. If it's not present, say: "I couldn't find that in the indexed notes."
- When you use a fact, cite inline with [source: FILENAME:pPAGE] when page is known or [source: FILENAME] if page is not present.
- End with a compact "Sources:" list (unique items).

Output format (adapt as needed):
1) Direct answer (1-3 sentences).
2) Key points or steps (bullets).
3) Sources:
"#;

/// Guidance prompt for greetings and empty queries
pub const SMALLTALK_PROMPT: &str = r#"You are a friendly guide for a local document Q&A app. Greet the user briefly and explain how to use the app:
- Add PDFs, Markdown (.md), or text (.txt) into the data folder.
- Rebuild the index to pick up new files.
- Ask questions about documents; you will cite sources like file.pdf:p12.
Keep it short, warm, and helpful. Do not mention internal code or implementation details.
"#;

/// System prompt for open-domain chat
pub const GENERAL_CHAT_PROMPT: &str = r#"You are a helpful, up-to-date, general-purpose assistant.
- Answer naturally with clear, concise language.
- Use short paragraphs and bullets when helpful.
- If asked for opinions, be balanced and pragmatic.
- Do not fabricate citations. If the user wants document-based answers, say you can switch to "docs mode".
"#;

/// Prompt for synthesizing a single follow-up question
pub const FOLLOW_UP_PROMPT: &str = r#"You are a friendly chatbot. After the assistant's answer, ask ONE short, natural follow-up
question that helps the user go deeper or clarify their goal. Keep it specific and helpful.
Avoid repeating the previous answer. Output only the question.
"#;

/// Fixed follow-up used whenever synthesis fails or produces garbage
pub const GENERIC_FOLLOW_UP: &str =
    "Would you like to continue with this, or switch modes with `/mode docs` or `/mode chat`?";

/// Instructional reply when docs mode is forced but the index has no data
pub const EMPTY_INDEX_MESSAGE: &str = "Your index is empty. Put PDFs/.md/.txt inside the data folder and rebuild the index. Then ask questions about your documents.";

/// Startup / guidance message that explicitly asks the user's preference
pub const WELCOME_MESSAGE: &str = "Hi! I can work in two ways:\n1) **Chat with your documents** — grounded answers with citations from your indexed files.\n2) **Generalized chat** — open conversation without citations.\n\nWhat would you like to do? (You can also type `/mode docs`, `/mode chat`, or `/mode auto` anytime.)";

/// Explicit two-way choice offered by the auto-mode ambiguity gate
pub const MODE_CHOICE_MESSAGE: &str = "Do you want to **chat with your documents** (with citations) or have a **generalized chat**?\nYou can also switch anytime with `/mode docs` or `/mode chat`.";

/// Preamble when retrieval came up empty but general chat is allowed
pub const NO_DOCUMENTS_PREAMBLE: &str = "I don't see any indexed documents yet. Would you like **generalized chat** for now, or add files and choose **chat with documents**?";

/// Pick an answer-style directive from the query's surface form
pub fn style_directive(query: &str) -> &'static str {
    let lower = query.to_lowercase();
    let lower = lower.trim();
    const STEP_PREFIXES: [&str; 6] = ["how ", "steps", "procedure", "implement", "configure", "setup"];
    const LIST_KEYWORDS: [&str; 7] = ["list", "types", "pros", "cons", "benefits", "drawbacks", "features"];

    if STEP_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return "Preferred style: numbered steps.";
    }
    if LIST_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return "Preferred style: bullet list.";
    }
    "Preferred style: short paragraph followed by 3-6 bullets."
}
