//! Client for the generative-content collaborator.

mod genkit;

pub use genkit::{GeneratedContent, GeneratorClient, GeneratorError};
