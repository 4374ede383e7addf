pub mod corpus;
pub mod engine;
pub mod letters;
pub mod likelihood;
pub mod puzzle;
pub mod selector;
pub mod types;
