//! # Limiter Crate
//!
//! Throttles outbound requests so review sites don't start rejecting us.
//!
//! ## Components
//!
//! - **limiter**: `ConcurrencyLimiter`, a FIFO gate allowing at most N
//!   operations in flight
//! - **limited**: `Limited<F>` and `limit()`, an async function wrapped by a limiter
//! - **error**: Error types for building limiters
//!
//! ## Example Usage
//!
//! ```ignore
//! use limiter::{ConcurrencyLimiter, limit};
//!
//! // One limiter per site, shared by every request to it
//! let imdb = ConcurrencyLimiter::new("imdb", 1)?;
//! let page = imdb.run(|| fetcher.fetch(&url)).await?;
//!
//! // Or wrap a function once and call it many times
//! let fetch = limit(4, |url: String| async move { client.get(url).send().await })?;
//! let response = fetch.call(url).await?;
//! ```
//!
//! Calls beyond the bound wait in arrival order. Completion order is not
//! guaranteed: a later call with faster I/O may finish first.

pub mod error;
pub mod limited;
pub mod limiter;

pub use error::{LimiterError, Result};
pub use limited::{Limited, limit};
pub use limiter::ConcurrencyLimiter;
