pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod retry;

pub use api::{PlatformApi, Workspace};
pub use client::{Client, ClientEvent};
