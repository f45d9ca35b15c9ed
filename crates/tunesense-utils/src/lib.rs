pub mod corpus;
pub mod normalize;

pub use corpus::{build_corpus, sentence_terminator};
pub use normalize::{is_blacklisted, normalize_comment, normalize_comments, normalize_text};
