pub mod channel_import;
pub mod m3u_parser;
pub mod metrics;
pub mod normalize;
pub mod playlist_reader;
pub mod reconciler;
pub mod redis;
pub mod scheduler;
pub mod sync_cache;
pub mod synchronizer;
pub mod tmdb;
