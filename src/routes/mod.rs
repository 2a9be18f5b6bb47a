use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod auth;
pub mod bookings;
pub mod doctors;
pub mod health;
pub mod meetings;
pub mod reports;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let opd_routes = Router::new()
        .route(
            "/bookings",
            get(reports::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/:id/disposition",
            patch(bookings::update_disposition),
        )
        .route("/portfolio", get(reports::doctor_portfolio))
        .route(
            "/meetings",
            get(reports::list_meetings).post(meetings::log_meeting),
        )
        .route("/matrix", get(reports::dashboard_matrix));

    let doctor_routes = Router::new().route("/by-phone/:phone", get(doctors::get_doctor_by_phone));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/opd", opd_routes)
        .nest("/api/doctors", doctor_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
