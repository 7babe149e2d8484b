pub mod ast;
pub mod filter;
pub mod evaluator;
pub mod sort;
pub mod validator;
pub mod cache;
