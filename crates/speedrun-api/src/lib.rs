//! # Speedrun API
//!
//! The Read API Surface (§4.G): an `axum::Router` exposing intent/fulfillment
//! queries plus health endpoints, grounded in the teacher's
//! `solver_service::api` module.

mod dto;
mod error;
mod handlers;
mod router;
mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
