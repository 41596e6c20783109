use actix_web::web;

use crate::handlers::{create_handler, get_by_hashid_handler, redirect_handler, search_handler};

// Configure shortened URL routes; the catch-all redirect must be registered last
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/urls")
            .route("", web::post().to(create_handler))
            .route("/search", web::get().to(search_handler))
            .route("/{hashid}", web::get().to(get_by_hashid_handler)),
    );
    cfg.route("/{hashid}", web::get().to(redirect_handler));
}
