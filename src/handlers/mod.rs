mod shortened_url;

pub use shortened_url::{create_handler, get_by_hashid_handler, redirect_handler, search_handler};
