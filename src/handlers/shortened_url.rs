use actix_web::{http::header::LOCATION, web, HttpResponse, Responder};
use log::{debug, info, warn};
use serde_json::json;
use validator::Validate;

use crate::{
    errors::AppError,
    models::{CreateShortenedUrlDto, ShortenedUrl, ShortenedUrlQueryParams, ShortenedUrlResponseDto},
    services::ShortenedUrlService,
    types::Result,
};

/// Create shortened URL route handler
pub async fn create_handler(
    dto: web::Json<CreateShortenedUrlDto>,
    service: web::Data<ShortenedUrlService>,
) -> Result<impl Responder> {
    let dto = dto.into_inner();
    dto.validate()?;

    let url = service.create(ShortenedUrl::from(dto)).await?;
    Ok(HttpResponse::Created().json(json!({
        "data": ShortenedUrlResponseDto::from(url),
        "message": "Successfully created URL",
    })))
}

/// Get URL by hashid route handler, decoding the hashid to its key
pub async fn get_by_hashid_handler(
    hashid: web::Path<String>,
    service: web::Data<ShortenedUrlService>,
) -> Result<impl Responder> {
    let url = service.find_by_hashid_or_fail(&hashid.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "data": ShortenedUrlResponseDto::from(url),
        "message": "Successfully retrieved URL",
    })))
}

/// Search URLs route handler, matching stored hashids literally
pub async fn search_handler(
    query: web::Query<ShortenedUrlQueryParams>,
    service: web::Data<ShortenedUrlService>,
) -> Result<impl Responder> {
    let urls = service
        .repository()
        .search(&query.into_inner())
        .await?
        .into_iter()
        .map(ShortenedUrlResponseDto::from)
        .collect::<Vec<_>>();

    Ok(HttpResponse::Ok().json(json!({
        "data": urls,
        "message": "Successfully retrieved URLs",
    })))
}

/// Redirect route handler
pub async fn redirect_handler(
    path: web::Path<String>,
    service: web::Data<ShortenedUrlService>,
) -> Result<impl Responder> {
    let code = path.into_inner();
    debug!(
        "Redirect requested for {} '{}'",
        service.route_key_name(),
        code
    );

    let url = service
        .resolve_route_key(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No URL for '{}'", code)))?;

    if url.is_expired() {
        info!("URL with code '{}' has expired", code);
        return Err(AppError::NotFound(format!(
            "URL with code '{}' has expired",
            code
        )));
    }

    let target = url.original_url.clone();

    // A failed counter update must not block the redirect
    match url.id {
        Some(id) => {
            if let Err(e) = service.repository().record_visit(id).await {
                warn!("Failed to record visit for '{}': {}", code, e);
            }
        }
        None => warn!("Resolved URL '{}' has no key", code),
    }

    info!("Redirecting '{}' to '{}'", code, target);

    Ok(HttpResponse::TemporaryRedirect()
        .insert_header((LOCATION, target))
        .finish())
}
