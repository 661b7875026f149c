//! Compiled condition and vectorizer traits

use std::collections::HashMap;

use async_trait::async_trait;
use ontoquery_core::DataProperty;
use serde_json::Value;

pub use crate::error::{ConditionError, ConditionResult as Result};

/// A validated condition ready to render for a backend
#[async_trait]
pub trait Condition: Send + Sync + std::fmt::Debug {
    /// Search DSL fragment
    async fn convert(&self) -> Result<Value>;

    /// SQL predicate; empty when the condition has no relational form
    fn convert_to_sql(&self) -> Result<String>;
}

/// Turns query text into an embedding for a vector property
#[async_trait]
pub trait Vectorizer: Send + Sync {
    async fn vectorize(&self, property: &DataProperty, text: &str) -> Result<Vec<f32>>;
}

/// Vectorizer for deployments without an embedding service
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVectorizer;

#[async_trait]
impl Vectorizer for NoVectorizer {
    async fn vectorize(&self, property: &DataProperty, _text: &str) -> Result<Vec<f32>> {
        Err(ConditionError::Vectorizer(format!(
            "no vectorizer configured for {}",
            property.name
        )))
    }
}

/// Precomputed embeddings keyed by query text
#[derive(Debug, Clone, Default)]
pub struct StaticVectorizer {
    vectors: HashMap<String, Vec<f32>>,
}

impl StaticVectorizer {
    pub fn new(vectors: HashMap<String, Vec<f32>>) -> Self {
        Self { vectors }
    }

    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl Vectorizer for StaticVectorizer {
    async fn vectorize(&self, _property: &DataProperty, text: &str) -> Result<Vec<f32>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| ConditionError::Vectorizer(format!("no embedding for '{}'", text)))
    }
}
