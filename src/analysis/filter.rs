use crate::analysis::token::Token;

/// Rewrites a token stream after tokenization
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;
}

/// Unicode lowercasing; positions and offsets are left untouched
pub struct LowercaseFilter;

impl TokenFilter for LowercaseFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        for token in tokens.iter_mut().filter(|t| t.text.chars().any(char::is_uppercase)) {
            token.text = token.text.to_lowercase();
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_mixed_case_tokens() {
        let tokens = vec![
            Token::new("Running".into(), 0, 0),
            Token::new("SHOES".into(), 1, 8),
            Token::new("ÉTÉ".into(), 2, 14),
        ];
        let out = LowercaseFilter.filter(tokens);
        let texts: Vec<&str> = out.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["running", "shoes", "été"]);
        assert_eq!(out[1].offset, 8);
        assert_eq!(out[2].position, 2);
    }
}
