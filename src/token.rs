//! Partner access-token lifecycle.
//!
//! [`TokenCache`] owns the single cached [`AccessToken`] and refreshes it through a
//! [`TokenSource`] when the token is absent or inside the refresh margin. Refreshes are
//! serialized so concurrent callers share one exchange.

mod cache;
mod metrics;
mod record;
mod secret;

pub use cache::*;
pub use metrics::*;
pub use record::*;
pub use secret::*;
