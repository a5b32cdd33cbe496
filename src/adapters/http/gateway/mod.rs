//! HTTP adapter for the webhook gateway.
//!
//! - `GET /webhook` - Subscription handshake
//! - `POST /webhook` - Inbound notifications, acknowledged immediately
//! - `POST /trigger` - Business-initiated template send
//! - `GET /privacy` - Privacy policy page
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, HealthResponse, TriggerRequest, TriggerResponse};
pub use handlers::{GatewayError, GatewayState};
pub use routes::{gateway_router, gateway_routes};
