//! Squash engine: builder, tick driver, and error taxonomy.

pub mod builder;
pub mod error;
pub mod squash;

pub use builder::EngineBuilder;
pub use error::EngineError;
pub use squash::SquashEngine;
