pub mod client;

pub use client::{HttpConfig, HttpError, RateLimitedHttpClient, RequestBody};
