use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::ChannelRecord;

/// Prefix of a channel metadata line
const EXTINF_PREFIX: &str = "#EXTINF:";

lazy_static! {
    /// Regex to parse EXTINF attributes (tvg-name="...", group-title="...", etc)
    static ref ATTR_REGEX: Regex = Regex::new(r#"(\w+(?:-\w+)*)="([^"]*)""#).unwrap();
}

/// Attributes extracted from one EXTINF line
#[derive(Debug, Default)]
struct ExtinfData {
    attributes: HashMap<String, String>,
    /// Text after the last comma, trimmed
    trailing_title: Option<String>,
}

/// Parse an EXTINF line
/// Format: #EXTINF:duration tvg-id="..." tvg-name="..." tvg-logo="..." group-title="...",Title
fn parse_extinf(line: &str) -> Option<ExtinfData> {
    if !line.starts_with(EXTINF_PREFIX) {
        return None;
    }

    // First occurrence of each attribute wins
    let mut attributes = HashMap::new();
    for caps in ATTR_REGEX.captures_iter(line) {
        let key = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        let value = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        attributes.entry(key).or_insert(value);
    }

    let trailing_title = line
        .rfind(',')
        .map(|idx| line[idx + 1..].trim().to_string())
        .filter(|title| !title.is_empty());

    Some(ExtinfData {
        attributes,
        trailing_title,
    })
}

/// Channel being assembled between its EXTINF line and its stream line
#[derive(Debug, Clone, PartialEq)]
struct PendingChannel {
    name: Option<String>,
    logo_url: Option<String>,
    category: Option<String>,
}

/// Parser state: waiting for metadata, or holding one entry until its stream line
#[derive(Debug, Clone, PartialEq)]
enum ParserState {
    Idle,
    Pending(PendingChannel),
}

/// Counters collected while parsing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    pub entries_seen: usize,
    pub filtered_out: usize,
    pub abandoned: usize,
    pub unnamed: usize,
    pub emitted: usize,
}

/// Playlist parser configuration
#[derive(Debug, Clone)]
pub struct M3UParser {
    /// Entries whose group-title does not contain this marker are skipped.
    /// `None` accepts every entry, including those without a group-title.
    group_marker: Option<String>,
}

impl M3UParser {
    /// Parser that keeps only groups containing `marker`
    pub fn with_group_marker(marker: impl Into<String>) -> Self {
        Self {
            group_marker: Some(marker.into()),
        }
    }

    /// Parser that keeps every entry
    pub fn unfiltered() -> Self {
        Self { group_marker: None }
    }

    /// Parse a line sequence into channel records, lazily and in source order
    pub fn parse<I, S>(&self, lines: I) -> Channels<'_, I::IntoIter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Channels {
            parser: self,
            lines: lines.into_iter(),
            state: ParserState::Idle,
            stats: ParseStats::default(),
        }
    }

    /// Every named metadata entry in source order, whether or not a stream
    /// line follows it
    pub fn entries<I, S>(&self, lines: I) -> Vec<ChannelRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|raw| {
                let pending = parse_extinf(raw.as_ref().trim())
                    .and_then(|extinf| self.start_channel(extinf))?;
                Some(ChannelRecord {
                    name: pending.name?,
                    logo_url: pending.logo_url,
                    category: pending.category,
                })
            })
            .collect()
    }

    /// Build the pending record for a metadata line, or `None` when filtered out
    fn start_channel(&self, extinf: ExtinfData) -> Option<PendingChannel> {
        let category = extinf
            .attributes
            .get("group-title")
            .map(|g| g.trim().to_string());

        if let Some(marker) = &self.group_marker {
            match &category {
                Some(group) if group.contains(marker.as_str()) => {}
                _ => return None,
            }
        }

        let name = match extinf.attributes.get("tvg-name") {
            Some(name) => Some(name.trim().to_string()),
            None => extinf.trailing_title,
        }
        .filter(|name| !name.is_empty());

        let logo_url = extinf
            .attributes
            .get("tvg-logo")
            .map(|logo| logo.trim().to_string())
            .filter(|logo| !logo.is_empty());

        Some(PendingChannel {
            name,
            logo_url,
            category,
        })
    }
}

/// Iterator over parsed channels; single pass
pub struct Channels<'a, I> {
    parser: &'a M3UParser,
    lines: I,
    state: ParserState,
    stats: ParseStats,
}

impl<'a, I> Channels<'a, I> {
    /// Counters so far (complete once the iterator is exhausted)
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }
}

impl<'a, I, S> Iterator for Channels<'a, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = ChannelRecord;

    fn next(&mut self) -> Option<ChannelRecord> {
        while let Some(raw) = self.lines.next() {
            let line = raw.as_ref().trim();

            if line.is_empty() {
                continue;
            }

            if line.starts_with(EXTINF_PREFIX) {
                self.stats.entries_seen += 1;

                let previous = std::mem::replace(&mut self.state, ParserState::Idle);
                if matches!(previous, ParserState::Pending(_)) {
                    self.stats.abandoned += 1;
                }

                match parse_extinf(line).and_then(|extinf| self.parser.start_channel(extinf)) {
                    Some(pending) => self.state = ParserState::Pending(pending),
                    None => self.stats.filtered_out += 1,
                }
                continue;
            }

            // Other comments (#EXTM3U, #EXTGRP, ...) leave the state alone
            if line.starts_with('#') {
                continue;
            }

            // Stream line: commits the pending entry; the URL itself is not kept
            if let ParserState::Pending(pending) =
                std::mem::replace(&mut self.state, ParserState::Idle)
            {
                match pending.name {
                    Some(name) => {
                        self.stats.emitted += 1;
                        return Some(ChannelRecord {
                            name,
                            logo_url: pending.logo_url,
                            category: pending.category,
                        });
                    }
                    None => self.stats.unnamed += 1,
                }
            }
        }

        if matches!(self.state, ParserState::Pending(_)) {
            self.state = ParserState::Idle;
            self.stats.abandoned += 1;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(parser: &M3UParser, lines: &[&str]) -> (Vec<ChannelRecord>, ParseStats) {
        let mut channels = parser.parse(lines.iter().copied());
        let records: Vec<ChannelRecord> = channels.by_ref().collect();
        (records, channels.stats().clone())
    }

    #[test]
    fn test_parse_extinf() {
        let line = r#"#EXTINF:-1 tvg-id="globo" tvg-name="Globo HD" tvg-logo="http://logo.com/globo.png" group-title="TV",Globo HD"#;
        let extinf = parse_extinf(line).unwrap();

        assert_eq!(extinf.trailing_title.as_deref(), Some("Globo HD"));
        assert_eq!(extinf.attributes.get("tvg-id"), Some(&"globo".to_string()));
        assert_eq!(extinf.attributes.get("group-title"), Some(&"TV".to_string()));
    }

    #[test]
    fn test_parse_extinf_minimal() {
        let extinf = parse_extinf("#EXTINF:-1,Canal Teste").unwrap();

        assert_eq!(extinf.trailing_title.as_deref(), Some("Canal Teste"));
        assert!(extinf.attributes.is_empty());
        assert!(parse_extinf("#EXTM3U").is_none());
    }

    #[test]
    fn test_marked_group_is_emitted() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, stats) = parse_all(
            &parser,
            &[
                "#EXTM3U",
                r#"#EXTINF:-1 tvg-name=" Globo HD " tvg-logo="http://l/globo.png" group-title=" CANAIS | ABERTOS ",Globo"#,
                "http://stream/1.ts",
            ],
        );

        assert_eq!(
            records,
            vec![ChannelRecord {
                name: "Globo HD".to_string(),
                logo_url: Some("http://l/globo.png".to_string()),
                category: Some("CANAIS | ABERTOS".to_string()),
            }]
        );
        assert_eq!(stats.emitted, 1);
    }

    #[test]
    fn test_unmarked_group_is_filtered_even_with_stream_line() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, stats) = parse_all(
            &parser,
            &[
                r#"#EXTINF:-1 tvg-name="Matrix" group-title="FILMES | ACAO",Matrix"#,
                "http://stream/movie.mp4",
                r#"#EXTINF:-1 tvg-name="No Group",No Group"#,
                "http://stream/2.ts",
            ],
        );

        assert!(records.is_empty());
        assert_eq!(stats.entries_seen, 2);
        assert_eq!(stats.filtered_out, 2);
    }

    #[test]
    fn test_stale_pending_is_abandoned() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, stats) = parse_all(
            &parser,
            &[
                r#"#EXTINF:-1 tvg-name="A" group-title="CANAIS",A"#,
                r#"#EXTINF:-1 tvg-name="B" group-title="CANAIS",B"#,
                "http://stream/b.ts",
            ],
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "B");
        assert_eq!(stats.abandoned, 1);
    }

    #[test]
    fn test_filtered_entry_clears_pending() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, _) = parse_all(
            &parser,
            &[
                r#"#EXTINF:-1 tvg-name="A" group-title="CANAIS",A"#,
                r#"#EXTINF:-1 tvg-name="Film" group-title="FILMES",Film"#,
                "http://stream/film.mp4",
            ],
        );

        assert!(records.is_empty());
    }

    #[test]
    fn test_empty_and_missing_logo_are_both_absent() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, _) = parse_all(
            &parser,
            &[
                r#"#EXTINF:-1 tvg-name="A" tvg-logo="" group-title="CANAIS",A"#,
                "http://stream/a.ts",
                r#"#EXTINF:-1 tvg-name="B" group-title="CANAIS",B"#,
                "http://stream/b.ts",
            ],
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].logo_url, None);
        assert_eq!(records[1].logo_url, None);
    }

    #[test]
    fn test_name_falls_back_to_last_comma() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, _) = parse_all(
            &parser,
            &[
                r#"#EXTINF:-1 tvg-logo="x.png" group-title="X CANAIS",Some, Thing,Channel 7"#,
                "http://stream/7.ts",
            ],
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Channel 7");
    }

    #[test]
    fn test_unnamed_entry_is_dropped() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, stats) = parse_all(
            &parser,
            &[
                r#"#EXTINF:-1 group-title="CANAIS""#,
                "http://stream/1.ts",
                r#"#EXTINF:-1 tvg-name="" group-title="CANAIS",Fallback Ignored"#,
                "http://stream/2.ts",
            ],
        );

        assert!(records.is_empty());
        assert_eq!(stats.unnamed, 2);
    }

    #[test]
    fn test_stream_line_without_metadata_is_noop() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, stats) = parse_all(
            &parser,
            &[
                "http://orphan/stream.ts",
                "",
                "#EXTVLCOPT:http-user-agent=VLC",
                r#"#EXTINF:-1 tvg-name="A" group-title="CANAIS",A"#,
                "#EXTGRP:ignored",
                "   ",
                "http://stream/a.ts",
                "http://stream/a-backup.ts",
            ],
        );

        assert_eq!(records.len(), 1);
        assert_eq!(stats.emitted, 1);
    }

    #[test]
    fn test_trailing_pending_is_not_emitted() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, stats) = parse_all(
            &parser,
            &[r#"#EXTINF:-1 tvg-name="A" group-title="CANAIS",A"#],
        );

        assert!(records.is_empty());
        assert_eq!(stats.abandoned, 1);
    }

    #[test]
    fn test_unfiltered_keeps_ungrouped_entries() {
        let parser = M3UParser::unfiltered();
        let (records, _) = parse_all(
            &parser,
            &["#EXTINF:-1,Radio Uno", "http://stream/radio.mp3"],
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Radio Uno");
        assert_eq!(records[0].category, None);
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let parser = M3UParser::with_group_marker("CANAIS");
        let (records, _) = parse_all(
            &parser,
            &[r#"#EXTINF:-1 tvg-name="A" group-title="canais",A"#, "http://s/a"],
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_entries_do_not_need_stream_lines() {
        let entries = M3UParser::unfiltered().entries([
            "#EXTM3U",
            r#"#EXTINF:-1 tvg-name="A" tvg-logo="a.png",A"#,
            r#"#EXTINF:-1 tvg-logo="b.png",B"#,
            "http://s/b",
            r#"#EXTINF:-1 tvg-name="" tvg-logo="c.png",C"#,
        ]);

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(entries[0].logo_url.as_deref(), Some("a.png"));
    }
}
