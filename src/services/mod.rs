use std::sync::Arc;

use actix_web::web;

mod hashid;

pub use hashid::HashidService;

use crate::{db::Database, hashid::HashidCodec, repositories::ShortenedUrlRepository};

pub type ShortenedUrlService = HashidService<ShortenedUrlRepository>;

/// Service Register
pub fn register(db: Database, codec: Arc<HashidCodec>, field: &str, cfg: &mut web::ServiceConfig) {
    let shortened_url_repository = ShortenedUrlRepository::new(db, field);
    let shortened_url_service =
        ShortenedUrlService::new(Arc::new(shortened_url_repository), codec, field);
    cfg.app_data(web::Data::new(shortened_url_service));
}
