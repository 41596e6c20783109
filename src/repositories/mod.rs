mod entity;
mod shortened_url;

pub use entity::EntityRepository;
pub use shortened_url::ShortenedUrlRepository;
