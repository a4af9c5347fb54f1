//! Durable storage for the activity collection. The whole collection is
//! saved as one JSON document on every mutation; there is no incremental or
//! per-day storage.

pub mod activity_store;
