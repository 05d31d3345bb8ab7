pub mod auth;
pub mod composer;
pub mod delivery;
pub mod error;
pub mod events;
pub mod inbox;
pub mod presentation;
pub mod read_state;

pub use error::NotifyError;
