//! HTTP layer: the `/chat` WebSocket endpoint and `/health`.

pub mod error;
pub mod handlers;
pub mod router;
