use std::fmt::{Display, Formatter};

/// An error from evaluating a MarkdQL expression.
///
/// These are the only two ways a query can fail. Everything else (out-of-range indexes, tokens
/// that match nothing, indexing past a leaf) yields an empty or clamped result instead, which is
/// a normal outcome rather than an error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryError {
    /// The tokenizer couldn't match the next step. Carries the original query expression.
    UnrecognizedQuery(String),

    /// A `/…/` token failed to compile. Carries the pattern as it was handed to the regex
    /// engine (escapes already resolved).
    InvalidRegex(String),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::UnrecognizedQuery(query) => write!(f, "unrecognized query: {query:?}"),
            QueryError::InvalidRegex(pattern) => write!(f, "invalid regex in query: /{pattern}/"),
        }
    }
}

impl std::error::Error for QueryError {}
