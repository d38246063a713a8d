pub mod client;
pub mod cohere;
pub mod concept_map;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod prompts;
pub mod provider;

pub use client::EnrichmentClient;
pub use cohere::CohereGenerator;
pub use concept_map::{ConceptEdge, ConceptMap, ConceptNode, NodeKind};
pub use error::EnrichmentError;
pub use provider::TextGenerator;
