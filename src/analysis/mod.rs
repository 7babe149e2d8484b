pub mod token;
pub mod tokenizer;
pub mod filter;
pub mod analyzer;
