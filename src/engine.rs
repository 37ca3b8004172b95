//! Retrieval-answer engine: rephrase a follow-up question against session
//! history, retrieve the top-k chunks, compose a bounded grounded prompt,
//! and return the generated answer with its citations.

use uuid::Uuid;

use crate::config::LlmConfig;
use crate::error::QueryError;
use crate::index::ScoredChunk;
use crate::llm::{embeddings, generate, sanitize_for_prompt};
use crate::models::{ChatTurn, Citation, QueryResponse, Span};
use crate::session::SessionRegistry;

/// Deterministic answer when retrieval yields nothing; generation is not
/// invoked in that case.
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "Could not find an answer: no relevant content was retrieved from this repository.";

const MAX_QUESTION_CHARS: usize = 2_000;
/// Bound on the retrieved-context portion of the prompt.
const MAX_CONTEXT_CHARS: usize = 24_000;

/// Answer `question` against a ready session. Errors are per-request and
/// never touch the session's index.
pub async fn answer_question(
    client: &reqwest::Client,
    llm: &LlmConfig,
    registry: &SessionRegistry,
    session_id: Uuid,
    question: &str,
    top_k: usize,
) -> Result<QueryResponse, QueryError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(QueryError::EmptyQuestion);
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(QueryError::ContextTooLarge);
    }
    let question = sanitize_for_prompt(question);

    // Status gate: NotFound / NotReady surface here, before any model call.
    let index = registry.ready_index(session_id)?;

    // Rewrite a follow-up into a self-contained question using the session's
    // history. Degrades to the raw question if the model call fails.
    let history = registry.history(session_id);
    let retrieval_question = if history.is_empty() {
        question.clone()
    } else {
        match generate::complete(client, llm, rephrase_messages(&history, &question)).await {
            Ok(rephrased) if !rephrased.trim().is_empty() => rephrased.trim().to_string(),
            Ok(_) => question.clone(),
            Err(e) => {
                tracing::warn!("Follow-up rephrasing failed, using raw question: {e:#}");
                question.clone()
            }
        }
    };

    // Same embedding model as indexing, so dimensions line up.
    let query_embedding = embeddings::embed_single(client, llm, &retrieval_question)
        .await
        .map_err(|e| QueryError::GenerationUnavailable(format!("{e:#}")))?;
    if query_embedding.len() != index.dim() {
        return Err(QueryError::GenerationUnavailable(format!(
            "query embedding dimension {} does not match index dimension {}",
            query_embedding.len(),
            index.dim()
        )));
    }

    let hits = index.search(&query_embedding, top_k);
    if hits.is_empty() {
        return Ok(empty_retrieval_response(
            registry,
            session_id,
            &retrieval_question,
        ));
    }

    let (context_block, sources) = build_context_block(&hits, MAX_CONTEXT_CHARS);
    let messages = answer_messages(&context_block, &question);

    let answer = generate::complete(client, llm, messages)
        .await
        .map_err(|e| QueryError::GenerationUnavailable(format!("{e:#}")))?;

    registry.append_exchange(session_id, &retrieval_question, &answer);

    Ok(QueryResponse { answer, sources })
}

/// Deterministic response when retrieval yields no chunks. Generation is not
/// invoked; the exchange is still recorded so follow-ups see it.
fn empty_retrieval_response(
    registry: &SessionRegistry,
    session_id: Uuid,
    question: &str,
) -> QueryResponse {
    let answer = INSUFFICIENT_CONTEXT_ANSWER.to_string();
    registry.append_exchange(session_id, question, &answer);
    QueryResponse {
        answer,
        sources: Vec::new(),
    }
}

/// Render retrieved chunks into a prompt block, each tagged with its path
/// and line span, stopping at the character budget. Returns the block and
/// the citations for exactly the chunks that made it in.
fn build_context_block(hits: &[ScoredChunk], budget_chars: usize) -> (String, Vec<Citation>) {
    let mut block = String::new();
    let mut citations = Vec::new();

    for hit in hits {
        let text = sanitize_for_prompt(&hit.chunk.text);
        let entry = format!(
            "--- {} (lines {}-{}) [{}] ---\n{}\n\n",
            hit.chunk.file_path,
            hit.chunk.start_line,
            hit.chunk.end_line,
            hit.chunk.language,
            text
        );
        if !block.is_empty() && block.len() + entry.len() > budget_chars {
            break;
        }
        block.push_str(&entry);
        citations.push(Citation {
            path: hit.chunk.file_path.clone(),
            span: Span {
                start_line: hit.chunk.start_line,
                end_line: hit.chunk.end_line,
            },
        });
    }

    (block, citations)
}

fn rephrase_messages(history: &[ChatTurn], question: &str) -> Vec<ChatTurn> {
    let mut rendered = String::new();
    for turn in history {
        rendered.push_str(&format!("{}: {}\n", turn.role, turn.content));
    }

    vec![ChatTurn {
        role: "user".to_string(),
        content: format!(
            "You are a question-rewriting assistant. Turn a possibly ambiguous \
             follow-up question into a fully self-contained, specific question, \
             keeping any file names, line numbers, or code element names it \
             refers to. If the question is already self-contained, return it \
             verbatim.\n\n\
             Conversation history:\n{rendered}\n\
             Latest question:\n{question}\n\n\
             Respond with only the rewritten question, no commentary."
        ),
    }]
}

fn answer_messages(context_block: &str, question: &str) -> Vec<ChatTurn> {
    vec![
        ChatTurn {
            role: "system".to_string(),
            content: "You are a code explainer assistant. You are given source \
                      code snippets retrieved from one repository, each tagged \
                      with its file path and line range.\n\
                      Answer ONLY from the provided snippets; never use outside \
                      knowledge. Explain how the code works in plain English and \
                      answer the question directly, citing file paths and line \
                      numbers where helpful. If the snippets do not answer the \
                      question, say \"Could not find an answer\"."
                .to_string(),
        },
        ChatTurn {
            role: "user".to_string(),
            content: format!(
                "Source code from the repository:\n\n{context_block}---\nQuestion: {question}"
            ),
        },
    ]
}
