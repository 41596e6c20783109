use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The salt/length/alphabet combination cannot build an encoder
    #[error("Invalid hashid configuration: {0}")]
    InvalidConfig(String),

    /// The input is not an encoding produced under the active configuration
    #[error("Invalid hashid: {0}")]
    InvalidEncoding(String),

    /// Keys below zero are outside the encodable domain
    #[error("Cannot encode negative key {0}")]
    NegativeId(i64),
}
