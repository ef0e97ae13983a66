//! Cart extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::services::Cart;
use crate::state::AppState;

/// The visitor's cart, loaded from their session under the configured key.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(SessionCart(cart): SessionCart) -> String {
///     format!("{} items", cart.len())
/// }
/// ```
pub struct SessionCart(pub Cart<Session>);

impl FromRequestParts<AppState> for SessionCart {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let cart = Cart::load(session, state.config().cart_session_key.as_str()).await?;
        Ok(Self(cart))
    }
}
