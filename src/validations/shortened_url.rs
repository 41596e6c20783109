use url::Url;

use validator::ValidationError;

/// Validates that a URL string is properly formatted and uses http/https
pub fn validate_url(url_str: &str) -> Result<(), ValidationError> {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme().is_empty() || url.host().is_none() {
                return Err(ValidationError::new("URL must have a scheme and host"));
            }

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ValidationError::new("URL scheme must be http or https"));
            }

            Ok(())
        }
        Err(_) => Err(ValidationError::new("Invalid URL format")),
    }
}

/// Validates a caller-chosen hashid:
/// - Between 1-32 characters
/// - Only contains URL-safe characters
///
/// It is stored verbatim and never has to decode.
pub fn validate_hashid_alias(alias: &str) -> Result<(), ValidationError> {
    if alias.is_empty() || alias.len() > 32 {
        let mut err = ValidationError::new("hashid_length");
        err.message = Some("Hashid must be between 1 and 32 characters".into());
        return Err(err);
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("hashid_charset");
        err.message = Some(
            "Hashid can only contain alphanumeric characters, hyphens, and underscores".into(),
        );
        return Err(err);
    }

    Ok(())
}
