// src/models/shortened_url.rs - Pure data structures
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::hashid::HasHashid;
use crate::validations::{validate_hashid_alias, validate_url};

// DTO for creating a new shortened URL
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateShortenedUrlDto {
    #[validate(custom(function = "validate_url"))]
    pub original_url: String,

    /// Caller-chosen short code; kept as-is instead of the generated hashid
    #[validate(custom(function = "validate_hashid_alias"))]
    pub hashid: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

/// Represents a shortened URL in the system
#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ShortenedUrl {
    /// Sequential primary key, never exposed publicly
    #[serde(skip_serializing)]
    pub id: Option<i64>,

    /// Public short code, the hashid of `id` unless chosen by the creator
    pub hashid: Option<String>,

    /// The original, long URL that was shortened
    pub original_url: String,

    /// When this shortened URL was created
    pub created_at: DateTime<Utc>,

    /// When this shortened URL was last accessed
    pub last_accessed: Option<DateTime<Utc>>,

    /// Number of times this shortened URL has been accessed
    pub access_count: i64,

    /// When this shortened URL expires (None means it never expires)
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShortenedUrl {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            created_at: Utc::now(),
            ..Default::default()
        }
    }

    /// Checks if the shortened URL has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expiry) => Utc::now() > expiry,
            None => false,
        }
    }

    /// Records one more visit
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_accessed = Some(Utc::now());
    }
}

impl HasHashid for ShortenedUrl {
    fn key(&self) -> Option<i64> {
        self.id
    }

    fn hashid(&self) -> Option<&str> {
        self.hashid.as_deref()
    }

    fn set_hashid(&mut self, hashid: String) {
        self.hashid = Some(hashid);
    }
}

impl From<CreateShortenedUrlDto> for ShortenedUrl {
    fn from(dto: CreateShortenedUrlDto) -> Self {
        ShortenedUrl {
            hashid: dto.hashid.filter(|code| !code.trim().is_empty()),
            expires_at: dto.expires_at,
            ..ShortenedUrl::new(dto.original_url)
        }
    }
}

/// Filters accepted by the search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortenedUrlQueryParams {
    pub hashid: Option<String>,
    pub original_url: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// DTO for response with shortened URL details
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenedUrlResponseDto {
    pub hashid: Option<String>,
    pub original_url: String,
    pub access_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ShortenedUrl> for ShortenedUrlResponseDto {
    fn from(url: ShortenedUrl) -> Self {
        ShortenedUrlResponseDto {
            hashid: url.hashid,
            original_url: url.original_url,
            access_count: url.access_count,
            created_at: url.created_at,
            expires_at: url.expires_at,
        }
    }
}
