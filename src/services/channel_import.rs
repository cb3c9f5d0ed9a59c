//! Playlist channel import
//!
//! Reader -> parser -> reconciler on the `channels` relation, plus the logo
//! refresh pass over channels that already exist.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::db::CatalogStore;
use crate::errors::ImportError;
use crate::models::{ChannelRecord, LogoUpdate, LogoUpdateReport};
use crate::services::m3u_parser::{M3UParser, ParseStats};
use crate::services::metrics;
use crate::services::playlist_reader::PlaylistReader;
use crate::services::reconciler::{dedupe_last_wins, BatchReconciler};

/// Outcome of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub stats: ParseStats,
    pub channels_written: usize,
}

pub struct ChannelImporter {
    reader: PlaylistReader,
    parser: M3UParser,
    store: Arc<dyn CatalogStore>,
    reconciler: BatchReconciler<dyn CatalogStore>,
}

impl ChannelImporter {
    pub fn new(reader: PlaylistReader, parser: M3UParser, store: Arc<dyn CatalogStore>) -> Self {
        Self {
            reader,
            parser,
            reconciler: BatchReconciler::new(Arc::clone(&store)),
            store,
        }
    }

    /// Import the channels of a playlist
    ///
    /// The whole file is decoded before anything is written, so a decode
    /// failure never leaves a partial channel list behind.
    pub async fn import(&self, path: impl AsRef<Path>) -> Result<ImportReport, ImportError> {
        let path = path.as_ref();
        let lines = match self.reader.read(path).await {
            Ok(lines) => lines,
            Err(e) => {
                metrics::record_import("read_error");
                return Err(e.into());
            }
        };

        let (records, stats) = self.parse(&lines);

        if records.is_empty() {
            warn!(
                "No channels found in {} ({} entries seen, {} filtered out)",
                path.display(),
                stats.entries_seen,
                stats.filtered_out
            );
            metrics::record_import("empty");
            return Ok(ImportReport {
                stats,
                channels_written: 0,
            });
        }

        let channels_written = match self.reconciler.upsert_batch(records).await {
            Ok(n) => n,
            Err(e) => {
                metrics::record_import("store_error");
                return Err(e.into());
            }
        };

        metrics::record_import("completed");
        info!(
            "Imported {} channels from {} ({} filtered out, {} abandoned, {} unnamed)",
            channels_written,
            path.display(),
            stats.filtered_out,
            stats.abandoned,
            stats.unnamed
        );

        Ok(ImportReport {
            stats,
            channels_written,
        })
    }

    /// Update logos of already-stored channels from a playlist
    ///
    /// Every metadata entry is considered regardless of its group or a
    /// following stream line. Channels are matched by name and never inserted.
    pub async fn refresh_logos(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<LogoUpdateReport, ImportError> {
        let path = path.as_ref();
        let lines = self.reader.read(path).await?;

        // Repeated names collapse to their last entry, logo or not
        let entries = dedupe_last_wins(M3UParser::unfiltered().entries(&lines));

        let mut skipped_no_logo = 0;
        let updates: Vec<LogoUpdate> = entries
            .into_iter()
            .filter_map(|channel| match channel.logo_url {
                Some(logo_url) => Some(LogoUpdate {
                    name: channel.name,
                    logo_url,
                }),
                None => {
                    skipped_no_logo += 1;
                    None
                }
            })
            .collect();

        let mut report = if updates.is_empty() {
            LogoUpdateReport::default()
        } else {
            self.store.update_channel_logos(&updates).await?
        };
        report.skipped_no_logo = skipped_no_logo;

        info!(
            "Logo refresh from {}: {} updated, {} not found, {} without logo",
            path.display(),
            report.updated,
            report.not_found,
            report.skipped_no_logo
        );

        Ok(report)
    }

    fn parse(&self, lines: &[String]) -> (Vec<ChannelRecord>, ParseStats) {
        let mut channels = self.parser.parse(lines);
        let records: Vec<ChannelRecord> = channels.by_ref().collect();
        (records, channels.stats().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::errors::ReadError;
    use crate::services::playlist_reader::TextEncoding;

    const PLAYLIST: &str = r#"#EXTM3U
#EXTINF:-1 tvg-name="Globo SP" tvg-logo="http://logos/globo.png" group-title="CANAIS ABERTOS",Globo SP
http://stream/globo
#EXTINF:-1 tvg-name="Filme X" tvg-logo="http://logos/x.png" group-title="FILMES",Filme X
http://stream/x
#EXTINF:-1 tvg-logo="" group-title="CANAIS ESPORTE",ESPN
http://stream/espn
"#;

    async fn write_temp(contents: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("import-{}.m3u", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    fn importer(store: Arc<MemoryStore>, encodings: Vec<TextEncoding>) -> ChannelImporter {
        ChannelImporter::new(
            PlaylistReader::new(encodings),
            M3UParser::with_group_marker("CANAIS"),
            store,
        )
    }

    #[tokio::test]
    async fn test_import_filters_and_upserts() {
        let path = write_temp(PLAYLIST.as_bytes()).await;
        let store = Arc::new(MemoryStore::new());
        let report = importer(store.clone(), vec![TextEncoding::Utf8])
            .import(&path)
            .await
            .unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(report.channels_written, 2);
        assert_eq!(report.stats.entries_seen, 3);
        assert_eq!(report.stats.filtered_out, 1);

        let tables = store.snapshot();
        assert_eq!(tables.channels.len(), 2);
        assert_eq!(tables.channels["ESPN"].logo_url, None);
        assert_eq!(
            tables.channels["Globo SP"].category.as_deref(),
            Some("CANAIS ABERTOS")
        );
    }

    #[tokio::test]
    async fn test_empty_result_writes_nothing() {
        let path = write_temp(b"#EXTM3U\n#EXTINF:-1 group-title=\"FILMES\",A\nhttp://a\n").await;
        let store = Arc::new(MemoryStore::new());
        let report = importer(store.clone(), vec![TextEncoding::Utf8])
            .import(&path)
            .await
            .unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(report.channels_written, 0);
        assert!(store.batches().is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_writes_nothing() {
        let mut bytes = PLAYLIST.as_bytes().to_vec();
        bytes.push(0xE9);
        let path = write_temp(&bytes).await;
        let store = Arc::new(MemoryStore::new());

        let err = importer(store.clone(), vec![TextEncoding::Utf8, TextEncoding::Ascii])
            .import(&path)
            .await
            .unwrap_err();
        let _ = tokio::fs::remove_file(&path).await;

        assert!(matches!(err, ImportError::Read(ReadError::Decode { .. })));
        assert!(store.snapshot().channels.is_empty());
    }

    #[tokio::test]
    async fn test_latin1_playlist_imports() {
        // "Canal São" in ISO-8859-1
        let mut bytes = b"#EXTINF:-1 group-title=\"CANAIS\",Canal S".to_vec();
        bytes.push(0xE3);
        bytes.extend_from_slice(b"o\nhttp://s\n");
        let path = write_temp(&bytes).await;
        let store = Arc::new(MemoryStore::new());

        importer(store.clone(), vec![TextEncoding::Utf8, TextEncoding::Latin1])
            .import(&path)
            .await
            .unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert!(store.snapshot().channels.contains_key("Canal São"));
    }

    #[tokio::test]
    async fn test_missing_playlist() {
        let err = importer(Arc::new(MemoryStore::new()), vec![TextEncoding::Utf8])
            .import("/no/such/playlist.m3u")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Read(ReadError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_refresh_logos_only_updates_existing() {
        let store = Arc::new(MemoryStore::new());
        let seed = write_temp(PLAYLIST.as_bytes()).await;
        let importer = importer(store.clone(), vec![TextEncoding::Utf8]);
        importer.import(&seed).await.unwrap();
        let _ = tokio::fs::remove_file(&seed).await;

        let logos = r#"#EXTM3U
#EXTINF:-1 tvg-name="Globo SP" tvg-logo="http://logos/globo-hd.png" group-title="OUTROS",Globo SP
http://a
#EXTINF:-1 tvg-name="Unknown" tvg-logo="http://logos/u.png",Unknown
http://b
#EXTINF:-1 tvg-name="ESPN" group-title="CANAIS ESPORTE",ESPN
http://c
"#;
        let path = write_temp(logos.as_bytes()).await;
        let report = importer.refresh_logos(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(
            report,
            LogoUpdateReport {
                updated: 1,
                not_found: 1,
                skipped_no_logo: 1,
            }
        );
        let tables = store.snapshot();
        assert_eq!(tables.channels.len(), 2);
        assert_eq!(
            tables.channels["Globo SP"].logo_url.as_deref(),
            Some("http://logos/globo-hd.png")
        );
        assert!(!tables.channels.contains_key("Unknown"));
    }

    #[tokio::test]
    async fn test_refresh_logos_counts_each_name_once() {
        let store = Arc::new(MemoryStore::new());
        let seed = write_temp(PLAYLIST.as_bytes()).await;
        let importer = importer(store.clone(), vec![TextEncoding::Utf8]);
        importer.import(&seed).await.unwrap();
        let _ = tokio::fs::remove_file(&seed).await;

        let logos = r#"#EXTM3U
#EXTINF:-1 tvg-name="Globo SP" tvg-logo="http://logos/old.png",Globo SP
http://a
#EXTINF:-1 tvg-name="Globo SP" tvg-logo="http://logos/new.png",Globo SP
#EXTINF:-1 tvg-name="Missing" tvg-logo="http://logos/m1.png",Missing
#EXTINF:-1 tvg-name="Missing" tvg-logo="http://logos/m2.png",Missing
#EXTINF:-1 tvg-name="ESPN" tvg-logo="http://logos/espn.png",ESPN
#EXTINF:-1 tvg-name="ESPN" tvg-logo="",ESPN
"#;
        let path = write_temp(logos.as_bytes()).await;
        let report = importer.refresh_logos(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(
            report,
            LogoUpdateReport {
                updated: 1,
                not_found: 1,
                skipped_no_logo: 1,
            }
        );
        let tables = store.snapshot();
        assert_eq!(
            tables.channels["Globo SP"].logo_url.as_deref(),
            Some("http://logos/new.png")
        );
        assert_eq!(tables.channels["ESPN"].logo_url, None);
    }
}
