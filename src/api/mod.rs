pub mod client;
pub mod models;
pub mod payload;

pub use client::{ApiError, XdmClient};
pub use models::{ApiConfig, DEFAULT_XDM_HOST};
pub use payload::OutboundPayload;
