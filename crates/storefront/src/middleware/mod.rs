//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (`http_request` span with status and latency)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. Security headers
//! 5. Session layer (tower-sessions; `PostgreSQL` store in production)
//!
//! [`SessionCart`] is an extractor, not a layer: it loads the cart from the
//! session for the handlers that need it.

pub mod cart;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use cart::SessionCart;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
