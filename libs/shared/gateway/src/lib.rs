pub mod client;
pub mod error;

pub use client::{ApiClient, NoToken, TokenSource};
pub use error::ApiError;
