pub mod backends;
pub mod builder;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod normalizer;
pub mod prompt;
pub mod schema;

pub use backends::{
    CompletionClient, CoreferenceResolver, EntityExtractor, Mention, RelationExtractor,
    TripleCandidate,
};
pub use builder::GraphBuilder;
pub use error::ExtractError;
pub use extractor::{AliasCorefResolver, HeuristicEntityExtractor, LlmRelationExtractor};
pub use llm::{OllamaClient, complete_json_with_retry};
pub use normalizer::EntityNormalizer;
pub use schema::{Entity, Span, Triple, fold_relation};
