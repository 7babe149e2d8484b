use crate::analysis::filter::{LowercaseFilter, TokenFilter};
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};

/// Tokenizer followed by its filter chain. Documents and query strings
/// go through the same analyzer so their terms line up.
pub struct Analyzer {
    tokenizer: Box<dyn Tokenizer>,
    filters: Vec<Box<dyn TokenFilter>>,
}

impl Analyzer {
    /// Unicode word split, then lowercasing
    pub fn standard() -> Self {
        Analyzer {
            tokenizer: Box::new(StandardTokenizer::default()),
            filters: vec![Box::new(LowercaseFilter)],
        }
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        self.filters
            .iter()
            .fold(self.tokenizer.tokenize(text), |tokens, filter| filter.filter(tokens))
    }

    /// Query terms in query order. Repeats are kept: every occurrence
    /// contributes to the match score.
    pub fn query_terms(&self, text: &str) -> Vec<String> {
        self.analyze(text).into_iter().map(|token| token.text).collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::standard()
    }
}
