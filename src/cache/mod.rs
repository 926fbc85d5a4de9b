//! Response cache
//!
//! Upstream responses are cached in one JSON file shared by every process
//! on the host. Entries are keyed by endpoint and quantized coordinates and
//! expire by age, checked on read.
//!
//! # File format
//!
//! ```json
//! {
//!   "forecast|-34.16|-118.1": { "data": { ... }, "time": 1718000000.25 }
//! }
//! ```

pub mod key;
pub mod store;

pub use key::{quantize, CacheKey, KEY_SEPARATOR, SIGNIFICANT_DIGITS};
pub use store::{unix_now, CacheEntry, CacheFile, CacheStore, CACHE_FILE_NAME, DEFAULT_TTL};
