pub mod error;
pub mod lot;
pub mod merger;
pub mod plan;
pub mod term;
