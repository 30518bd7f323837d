//! Prompt construction and answer formatting.
//!
//! Every user-visible string of the fallback chain lives here so the answer
//! text always states which path produced it.

use crate::retrieval::RetrievedDocument;

pub const INITIALIZATION_FAILED: &str =
    "**❌ System Initialization Failed**\n\nPlease check your setup and try again.";

pub const UNAVAILABLE: &str =
    "**⚠️ System Temporarily Unavailable**\n\nPlease try again in a moment.";

pub const GENERAL_KNOWLEDGE_NOTE: &str =
    "**💡 Note:** This answer is generated using general legal knowledge. \
For specific document references, ensure relevant content is available in the legal database.";

const SOURCE_NAME: &str = "Pinecone Legal Database";
const MAX_CITED_PAGES: usize = 5;
const DIGEST_SUMMARY_CHARS: usize = 150;

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps at most `budget` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(budget).collect();
    truncated.push_str("...");
    truncated
}

/// Context block listing each document with its ordinal and page.
pub fn build_context(docs: &[RetrievedDocument], char_budget: usize) -> String {
    let mut parts = vec!["**RELEVANT LEGAL DOCUMENTS FROM DATABASE:**\n".to_string()];

    for (i, doc) in docs.iter().enumerate() {
        let content = truncate_chars(&normalize_whitespace(&doc.content), char_budget);
        parts.push(format!(
            "**Document {}** (Page {}): {}",
            i + 1,
            doc.page_label(),
            content
        ));
    }

    parts.join("\n\n")
}

pub fn rag_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an expert legal assistant for Indian Constitution and IPC.

**LEGAL DOCUMENTS CONTEXT:**
{context}

**USER QUESTION:**
{question}

**INSTRUCTIONS:**
Answer the question using the legal documents provided above. Provide a comprehensive legal analysis with proper citations.

**ANSWER:**
"
    )
}

pub fn direct_prompt(question: &str) -> String {
    format!(
        "You are an expert legal assistant specializing in Indian Constitution and Indian Penal Code (IPC).

**USER QUESTION:**
{question}

**INSTRUCTIONS:**
Provide a comprehensive, accurate answer about Indian Constitution or IPC. Use your knowledge of:

- Indian Constitution (Fundamental Rights, Directive Principles, Constitutional Provisions)
- Indian Penal Code (Sections, Punishments, Legal Definitions)
- Important legal doctrines and principles
- Recent legal developments if relevant

Structure your answer with:
1. Clear definition/explanation
2. Key legal provisions (mention specific Articles/Sections)
3. Important aspects and implications
4. Practical significance

Use Markdown formatting for better readability.

**ANSWER:**
"
    )
}

/// Distinct page labels in ascending order; unpaged documents sort last.
pub fn cited_pages(docs: &[RetrievedDocument]) -> Vec<String> {
    let mut pages: Vec<Option<u32>> = docs.iter().map(|d| d.page).collect();
    pages.sort_by(|a, b| match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    pages.dedup();
    pages
        .into_iter()
        .map(|p| p.map(|n| n.to_string()).unwrap_or_else(|| "N/A".to_string()))
        .collect()
}

pub fn rag_answer(answer: &str, docs: &[RetrievedDocument]) -> String {
    let pages = cited_pages(docs);
    let shown: Vec<&str> = pages
        .iter()
        .take(MAX_CITED_PAGES)
        .map(String::as_str)
        .collect();

    let mut formatted = format!("{}\n\n", answer);
    formatted.push_str("---\n");
    formatted.push_str("**📚 Source Information:**\n");
    formatted.push_str(&format!("• **Source:** {}\n", SOURCE_NAME));
    formatted.push_str(&format!("• **Relevant Pages:** {}\n", shown.join(", ")));
    formatted.push_str(&format!("• **Documents Analyzed:** {}\n", docs.len()));
    formatted
}

pub fn direct_answer(answer: &str) -> String {
    format!("{}\n\n---\n{}\n", answer, GENERAL_KNOWLEDGE_NOTE)
}

/// Shortens `content` to whole sentences that fit under `max_chars`.
///
/// Content already within the cap is returned untouched. Otherwise sentences
/// are accumulated while the running length stays below the cap and the
/// result is closed with an ellipsis; words are never cut.
pub fn summarize(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let mut summary = String::new();
    for piece in content.split('.') {
        let sentence = piece.trim();
        if sentence.is_empty() || summary.chars().count() + piece.chars().count() >= max_chars {
            break;
        }
        summary.push_str(sentence);
        summary.push_str(". ");
    }

    let mut summary = summary.trim_end().to_string();
    summary.push_str(if summary.ends_with('.') { ".." } else { "..." });
    summary
}

pub fn digest_answer(question: &str, docs: &[RetrievedDocument]) -> String {
    let mut parts = vec!["**🔍 Legal Document References:**\n".to_string()];
    for doc in docs {
        parts.push(format!(
            "• **Page {}:** {}",
            doc.page_label(),
            summarize(&doc.content, DIGEST_SUMMARY_CHARS)
        ));
    }
    parts.push(format!("\n**Question:** {}", question));
    parts.push(
        "\n*Please review the above document references for relevant information.*".to_string(),
    );
    parts.join("\n")
}

pub fn no_documents_answer(question: &str) -> String {
    format!(
        "**🤖 Legal Assistant**\n\nI understand you're asking about: \"{}\"\n\n\
While I couldn't find specific documents in the database, this appears to be a question about Indian law. \
Please ensure your question relates to Indian Constitution or IPC, rephrase it, and try again.",
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str, page: Option<u32>) -> RetrievedDocument {
        RetrievedDocument::new(content, page, 0.5)
    }

    #[test]
    fn whitespace_is_collapsed_and_trimmed() {
        assert_eq!(
            normalize_whitespace("  Article\n\n14 \t Equality  "),
            "Article 14 Equality"
        );
        assert_eq!(normalize_whitespace(" \n "), "");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "अनुच्छेद".repeat(10);
        let cut = truncate_chars(&text, 5);
        assert_eq!(cut.chars().count(), 8);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_chars("short", 400), "short");
    }

    #[test]
    fn context_labels_documents_with_page_and_ordinal() {
        let long = "x".repeat(500);
        let docs = vec![doc("Equality\nbefore   law", Some(3)), doc(&long, None)];
        let context = build_context(&docs, 400);

        assert!(context.starts_with("**RELEVANT LEGAL DOCUMENTS FROM DATABASE:**"));
        assert!(context.contains("**Document 1** (Page 3): Equality before law"));
        assert!(context.contains("**Document 2** (Page N/A): "));
        assert!(context.contains(&format!("{}...", "x".repeat(400))));
        assert!(!context.contains(&"x".repeat(401)));
    }

    #[test]
    fn prompts_embed_question_and_context() {
        let rag = rag_prompt("What is Article 14?", "CTX");
        assert!(rag.contains("**LEGAL DOCUMENTS CONTEXT:**\nCTX"));
        assert!(rag.contains("**USER QUESTION:**\nWhat is Article 14?"));
        assert!(rag.contains("proper citations"));

        let direct = direct_prompt("Explain habeas corpus");
        assert!(direct.contains("Explain habeas corpus"));
        assert!(!direct.contains("LEGAL DOCUMENTS CONTEXT"));
    }

    #[test]
    fn cited_pages_are_distinct_sorted_and_unpaged_last() {
        let docs = vec![
            doc("a", Some(12)),
            doc("b", None),
            doc("c", Some(3)),
            doc("d", Some(12)),
            doc("e", Some(7)),
        ];
        assert_eq!(cited_pages(&docs), vec!["3", "7", "12", "N/A"]);
    }

    #[test]
    fn rag_footer_caps_pages_and_counts_documents() {
        let docs: Vec<_> = (1..=6).rev().map(|p| doc("t", Some(p))).collect();
        let answer = rag_answer("Body.", &docs);

        assert!(answer.starts_with("Body.\n\n---\n"));
        assert!(answer.contains("• **Relevant Pages:** 1, 2, 3, 4, 5\n"));
        assert!(answer.ends_with("• **Documents Analyzed:** 6\n"));
    }

    #[test]
    fn direct_answer_carries_disclaimer() {
        let answer = direct_answer("Habeas corpus means...");
        assert!(answer.starts_with("Habeas corpus means..."));
        assert!(answer.contains("general legal knowledge"));
    }

    #[test]
    fn summarize_keeps_whole_sentences() {
        let summary = summarize("A. B. C. D.", 5);
        assert_eq!(summary, "A...");
        assert!(!summary.contains('B'));
    }

    #[test]
    fn summarize_returns_short_content_unchanged() {
        assert_eq!(summarize("Short. Text.", 150), "Short. Text.");
    }

    #[test]
    fn summarize_never_cuts_mid_word() {
        let content = "The State shall not deny to any person equality before the law. \
                       Nothing in this article shall prevent the State from making special provision.";
        let summary = summarize(content, 80);
        assert_eq!(
            summary,
            "The State shall not deny to any person equality before the law..."
        );

        let first_too_long = summarize(&"word ".repeat(60), 20);
        assert_eq!(first_too_long, "...");
    }

    #[test]
    fn digest_lists_pages_and_echoes_question() {
        let docs = vec![doc("Punishment for murder. Death or imprisonment.", Some(150))];
        let digest = digest_answer("What is Section 302?", &docs);

        assert!(digest.starts_with("**🔍 Legal Document References:**"));
        assert!(digest.contains("• **Page 150:** Punishment for murder. Death or imprisonment."));
        assert!(digest.contains("**Question:** What is Section 302?"));
    }

    #[test]
    fn no_documents_answer_asks_to_rephrase() {
        let answer = no_documents_answer("foo");
        assert!(answer.contains("\"foo\""));
        assert!(answer.contains("rephrase"));
    }
}
