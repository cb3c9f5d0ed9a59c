use serde::{Deserialize, Serialize};

/// Live-TV channel extracted from a playlist
///
/// Identity is `name` (case-sensitive, already trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Logo assignment for an already-stored channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoUpdate {
    pub name: String,
    pub logo_url: String,
}

/// Outcome of a logo refresh pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoUpdateReport {
    pub updated: usize,
    pub not_found: usize,
    pub skipped_no_logo: usize,
}
