use std::fmt;

use harsh::Harsh;
use log::{debug, trace};

use crate::config::HashidConfig;
use crate::errors::CodecError;

type Result<T> = std::result::Result<T, CodecError>;

/// Encodes numeric keys as hashids and back.
///
/// Building the underlying `Harsh` shuffles the alphabet with the salt, so a codec is
/// built once per configuration and shared (it is immutable and `Send + Sync`).
pub struct HashidCodec {
    harsh: Harsh,
    alphabet: Vec<u8>,
    min_length: usize,
    /// Longest string any single `u64` encodes to under this configuration
    max_length: usize,
}

impl fmt::Debug for HashidCodec {
    // the salt stays out of logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashidCodec")
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("alphabet_len", &self.alphabet.len())
            .finish()
    }
}

impl HashidCodec {
    pub fn new(config: &HashidConfig) -> Result<Self> {
        let harsh = Harsh::builder()
            .salt(config.salt.as_bytes())
            .length(config.min_length)
            .alphabet(config.alphabet.as_bytes())
            .build()
            .map_err(|err| CodecError::InvalidConfig(format!("{err}")))?;

        let max_length = harsh.encode(&[u64::MAX]).len().max(config.min_length);
        debug!(
            "Built hashid codec: min_length={}, max_length={}, alphabet_len={}",
            config.min_length,
            max_length,
            config.alphabet.len()
        );

        Ok(Self {
            harsh,
            alphabet: config.alphabet.as_bytes().to_vec(),
            min_length: config.min_length,
            max_length,
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn encode(&self, id: u64) -> String {
        self.harsh.encode(&[id])
    }

    /// Encodes a primary key. Keys are never negative, so one is a caller bug.
    pub fn encode_key(&self, key: i64) -> Result<String> {
        let id = u64::try_from(key).map_err(|_| CodecError::NegativeId(key))?;
        Ok(self.encode(id))
    }

    /// Decodes a hashid produced by this configuration.
    ///
    /// Any other input, including the empty string, foreign characters, payloads holding
    /// several numbers and encodings made with another salt, yields `InvalidEncoding`.
    pub fn decode(&self, value: &str) -> Result<u64> {
        if value.is_empty() || value.len() > self.max_length {
            return Err(CodecError::InvalidEncoding(value.to_string()));
        }
        if !value.bytes().all(|b| self.alphabet.contains(&b)) {
            return Err(CodecError::InvalidEncoding(value.to_string()));
        }

        let numbers = self.harsh.decode(value).map_err(|err| {
            trace!("Rejected hashid '{}': {}", value, err);
            CodecError::InvalidEncoding(value.to_string())
        })?;

        match numbers.as_slice() {
            [id] if self.encode(*id) == value => Ok(*id),
            _ => Err(CodecError::InvalidEncoding(value.to_string())),
        }
    }

    /// Decodes a hashid into the signed key domain used by entities.
    pub fn decode_key(&self, value: &str) -> Result<i64> {
        let id = self.decode(value)?;
        i64::try_from(id).map_err(|_| CodecError::InvalidEncoding(value.to_string()))
    }

    /// Like `decode_key`, for callers that treat bad input as "no such record".
    pub fn decode_opt(&self, value: &str) -> Option<i64> {
        self.decode_key(value).ok()
    }
}
