pub mod container;
pub mod converter;
pub mod detect;
pub mod error;
pub mod hints;
