pub mod error;
mod identity;
mod manager;
mod redirect;
mod store;

pub use error::Error;
pub use identity::{Identity, Session};
pub use manager::{RehydrateOutcome, SessionStore};
pub use redirect::{Location, MemoryLocation, RedirectPayload, take_redirect_payload};
