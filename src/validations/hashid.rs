use std::collections::HashSet;

use validator::ValidationError;

/// Smallest alphabet Hashids can build separators and guards from
pub const MIN_ALPHABET_LENGTH: usize = 16;

/// Validates that an alphabet is printable ASCII, whitespace free and has
/// at least 16 distinct characters
pub fn validate_alphabet(alphabet: &str) -> Result<(), ValidationError> {
    if !alphabet.is_ascii() || alphabet.chars().any(|c| c.is_ascii_whitespace() || c.is_ascii_control()) {
        let mut err = ValidationError::new("alphabet_charset");
        err.message = Some("Alphabet must contain printable ASCII characters only".into());
        return Err(err);
    }

    let unique: HashSet<char> = alphabet.chars().collect();
    if unique.len() < MIN_ALPHABET_LENGTH {
        let mut err = ValidationError::new("alphabet_length");
        err.message = Some(
            format!(
                "Alphabet must contain at least {} unique characters",
                MIN_ALPHABET_LENGTH
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a column name is a bare SQL identifier, since it is
/// interpolated into queries rather than bound
pub fn validate_column_name(column: &str) -> Result<(), ValidationError> {
    let mut chars = column.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid || column.len() > 63 {
        let mut err = ValidationError::new("column_name");
        err.message = Some("Column name must match [A-Za-z_][A-Za-z0-9_]*".into());
        return Err(err);
    }

    Ok(())
}
