//! Trait abstractions for dependency injection.
//!
//! These traits define the boundaries between the auction engine and its
//! external collaborators, enabling the engine to be tested with mock
//! implementations.

pub mod notifier;
pub mod random;

pub use notifier::Notifier;
pub use random::{shuffle, RandomSource, ThreadRngSource};
