pub mod client;
pub mod errors;
pub mod types;

pub use client::{CrucibleClient, ReviewSystem};
pub use errors::CrucibleError;
pub use types::{Review, ReviewAction};

#[cfg(any(test, feature = "testing"))]
pub use client::MockReviewSystem;
