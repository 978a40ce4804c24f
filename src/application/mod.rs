pub mod classifier;
pub mod collaborators;
pub mod correlator;
pub mod dispatcher;
pub mod events;
pub mod relay;
pub mod sync;

pub use collaborators::{CookieStore, PreferenceStore, TabLookup};
pub use dispatcher::Controller;
pub use events::{BrowserEvent, Reply};
