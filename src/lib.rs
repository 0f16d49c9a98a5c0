pub use client::VolleynetClient;
pub use config::{ClientConfig, SyncConfig};
pub use error::{Result, VolleynetError};
pub use model::*;
pub use session::{LoginData, Session};

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod sync;
pub(crate) mod volleynet;
