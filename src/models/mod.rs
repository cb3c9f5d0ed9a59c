pub mod catalog;
pub mod channel;
pub mod sync;

pub use catalog::{
    CatalogItem, EpisodeRecord, MediaKind, MovieRecord, SeasonRecord, SeriesRecord,
};
pub use channel::{ChannelRecord, LogoUpdate, LogoUpdateReport};
pub use sync::{SyncCacheEntry, SyncOutcome, SyncPhase, SyncReport};
