//! Code generation from analysed models through language profiles.

pub mod expression;
pub mod generator;
pub mod profile;

pub use expression::ExpressionRenderer;
pub use generator::{generate_code, Generator, GeneratorError};
pub use profile::{GeneratorProfile, ProfileError, ProfileKind};
