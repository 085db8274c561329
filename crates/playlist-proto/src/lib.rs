//! Now-playing page generation and recent-songs history.
//!
//! One invocation reads the automation system's XML export, renders the
//! "now playing" fragment, and (when the track changed since the previous
//! run) appends to the play history and renders the "latest five" fragment.

pub mod config;
pub mod error;
pub mod feed;
pub mod history;
pub mod pipeline;
pub mod platform;
pub mod recent;
pub mod render;
pub mod window;

pub use error::{PlaylistError, Result};
