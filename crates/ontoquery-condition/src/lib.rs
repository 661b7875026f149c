//! Ontoquery Condition - CondCfg compiler
//!
//! Validates abstract filter expressions against an object type's schema and
//! renders them as search DSL fragments and SQL predicates.

pub mod comparison;
pub mod compiler;
pub mod compound;
pub mod error;
pub mod exist;
pub mod fulltext;
pub mod knn;
pub mod pattern;
pub mod property;
pub mod range;
pub mod set;
pub mod sql;
pub mod traits;
pub mod tree;

pub use compiler::ConditionCompiler;
pub use error::{ConditionError, ConditionResult};
pub use property::PropertyResolver;
pub use traits::{Condition, NoVectorizer, StaticVectorizer, Vectorizer};
pub use tree::{render, ConditionTree, RenderedCondition};
