//! External model collaborators behind a narrow contract:
//! batched text → vector ([`embeddings`]) and messages → text ([`generate`]).

pub mod embeddings;
pub mod generate;

/// Strip special chat-template tokens from text that ends up inside a
/// prompt, so repository content cannot smuggle in role switches.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("<|im_start|>", "")
        .replace("<|im_end|>", "")
        .replace("<|endoftext|>", "")
}
