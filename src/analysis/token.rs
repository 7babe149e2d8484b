use serde::{Serialize, Deserialize};

/// Token representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,      // The token text
    pub position: u32,     // Position within the analysed value
    pub offset: usize,     // Byte offset in original text
}

impl Token {
    pub fn new(text: String, position: u32, offset: usize) -> Self {
        Token {
            text,
            position,
            offset,
        }
    }
}
