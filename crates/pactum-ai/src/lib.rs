//! External AI collaborators: text generation and knowledge retrieval.

mod generate;
mod http;
mod library;
mod retrieve;

pub use generate::{GenerateError, TextGenerator};
pub use http::ChatGenerator;
pub use library::{StaticClauseLibrary, fallback_exemplars};
pub use retrieve::{Exemplar, KnowledgeRetriever, RetrieveError};
