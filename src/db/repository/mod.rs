//! Database repositories
//!
//! One module per relation. Write paths take a connection so callers can
//! group several batches under one transaction.

pub mod channels;
pub mod episodes;
pub mod movies;
pub mod seasons;
pub mod series;
pub mod sync_cache;
