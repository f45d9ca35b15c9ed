//! Whole-corpus text built from accepted comments.

use tunesense_core::Comment;

/// What to append after `text` so the corpus reads as separate sentences.
pub fn sentence_terminator(text: &str) -> &'static str {
    if text.ends_with(['.', '!', '?']) {
        " "
    } else {
        ". "
    }
}

/// Concatenate comments into one document for corpus-level analysis.
pub fn build_corpus(comments: &[Comment]) -> String {
    let mut corpus = String::with_capacity(comments.iter().map(|c| c.text.len() + 2).sum());
    for comment in comments {
        corpus.push_str(&comment.text);
        corpus.push_str(sentence_terminator(&comment.text));
    }
    corpus
}
