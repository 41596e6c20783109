mod hashid;
mod shortened_url;

pub use hashid::{validate_alphabet, validate_column_name};
pub use shortened_url::{validate_hashid_alias, validate_url};
