pub mod error;
pub mod model;

pub use error::RelayError;
pub use model::{
    Cookie, Delivery, Exchange, Header, ServiceStatus, SyncState, ToolbarState, TrackedRequest,
    NO_TAB,
};
