pub mod admin;
pub mod bookings;
pub mod calendar;
pub mod health;
pub mod holidays;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::Router;
use chrono::NaiveDateTime;
use tower_http::trace::TraceLayer;

use crate::errors::{AppError, AppResult};
use crate::models::ViewerContext;
use crate::state::AppState;

/// Resolves the caller from `X-User-Id`, plus admin rights from a bearer
/// token matching the configured admin token.
pub fn viewer_from_headers(headers: &HeaderMap, admin_token: &str) -> AppResult<ViewerContext> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or(AppError::Unauthorized)?;

    let is_admin = match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        None => false,
        Some(auth) => {
            let token = auth.strip_prefix("Bearer ").unwrap_or("");
            if token.is_empty() || token != admin_token {
                return Err(AppError::Unauthorized);
            }
            true
        }
    };

    Ok(ViewerContext { user_id, is_admin })
}

pub(crate) fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/calendar/classify", get(calendar::classify))
        .route("/api/calendar/slots", get(calendar::slots))
        .route("/api/rules", get(calendar::rules_for_date))
        .route(
            "/api/holidays",
            get(holidays::list_holidays).post(holidays::create_holiday),
        )
        .route(
            "/api/holidays/:id",
            put(holidays::update_holiday).delete(holidays::delete_holiday),
        )
        .route(
            "/api/dogs/:dog_id/availability",
            get(calendar::availability),
        )
        .route("/api/dogs/:dog_id/occupancy", get(calendar::occupancy))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/mine", get(bookings::my_bookings))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/admin/approvals", get(admin::list_approvals))
        .route(
            "/api/admin/bookings/:id/approve",
            post(admin::approve_booking),
        )
        .route(
            "/api/admin/bookings/:id/reject",
            post(admin::reject_booking),
        )
        .route(
            "/api/admin/rules",
            get(admin::list_rules).post(admin::create_rule),
        )
        .route(
            "/api/admin/rules/:id",
            put(admin::update_rule).delete(admin::delete_rule),
        )
        .route(
            "/api/admin/rules/day-type/:day_type",
            put(admin::replace_rules),
        )
        .route(
            "/api/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route(
            "/api/admin/blocked-dates",
            get(admin::list_blocked_dates).post(admin::create_blocked_date),
        )
        .route(
            "/api/admin/blocked-dates/:id",
            axum::routing::delete(admin::delete_blocked_date),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn test_viewer_requires_user_id() {
        assert!(matches!(
            viewer_from_headers(&headers(&[]), "secret"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            viewer_from_headers(&headers(&[("x-user-id", "abc")]), "secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_viewer_admin_token() {
        let user = viewer_from_headers(&headers(&[("x-user-id", "4")]), "secret").unwrap();
        assert_eq!(user, ViewerContext::user(4));

        let admin = viewer_from_headers(
            &headers(&[("x-user-id", "1"), ("authorization", "Bearer secret")]),
            "secret",
        )
        .unwrap();
        assert_eq!(admin, ViewerContext::admin(1));

        assert!(matches!(
            viewer_from_headers(
                &headers(&[("x-user-id", "1"), ("authorization", "Bearer wrong")]),
                "secret"
            ),
            Err(AppError::Unauthorized)
        ));
    }
}
