//! Peer backend wire types and the grouping shapes built from them.

use serde::{Deserialize, Serialize};

/// Body of `POST /searches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub id: String,
    pub search_text: String,
    pub search_timeout: u64,
    pub file_limit: u32,
    pub filter_responses: bool,
    pub response_limit: u32,
    pub minimum_response_file_count: u32,
}

impl SearchRequest {
    pub const DEFAULT_FILE_LIMIT: u32 = 10_000;
    pub const DEFAULT_RESPONSE_LIMIT: u32 = 100;

    pub fn new(id: impl Into<String>, search_text: impl Into<String>, search_timeout_ms: u64) -> Self {
        Self {
            id: id.into(),
            search_text: search_text.into(),
            search_timeout: search_timeout_ms,
            file_limit: Self::DEFAULT_FILE_LIMIT,
            filter_responses: true,
            response_limit: Self::DEFAULT_RESPONSE_LIMIT,
            minimum_response_file_count: 1,
        }
    }
}

/// A search as reported by the backend. One per acquisition; never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSession {
    /// Missing when the backend rejected the search without saying why.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub response_count: u32,
}

impl SearchSession {
    /// Complete by flag or by a `Completed, ...` state.
    pub fn is_finished(&self) -> bool {
        self.is_complete
            || self
                .state
                .as_deref()
                .is_some_and(|s| s.starts_with("Completed"))
    }
}

/// One peer's answer to a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerResponse {
    pub username: String,
    #[serde(default)]
    pub files: Vec<SearchFile>,
    #[serde(default)]
    pub has_free_upload_slot: bool,
    #[serde(default)]
    pub queue_length: u64,
    #[serde(default)]
    pub upload_speed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFile {
    /// Full path on the peer, usually with `\` separators.
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    /// Extension without the dot. Often blank, in which case the filename
    /// decides.
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u32>,
}

/// Files from one peer sharing a parent directory. The peer backend's
/// stand-in for an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryGroup {
    /// Parent path with `/` separators.
    pub directory: String,
    pub files: Vec<SearchFile>,
}

/// A peer with at least one usable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerCandidate {
    pub username: String,
    pub has_free_upload_slot: bool,
    pub dirs: Vec<DirectoryGroup>,
}

impl PeerCandidate {
    pub fn total_files(&self) -> usize {
        self.dirs.iter().map(|d| d.files.len()).sum()
    }

    /// Directory with the most files; the first one wins ties.
    pub fn best_directory(&self) -> Option<&DirectoryGroup> {
        self.dirs.iter().fold(None, |best: Option<&DirectoryGroup>, dir| match best {
            Some(b) if b.files.len() >= dir.files.len() => Some(b),
            _ => Some(dir),
        })
    }
}

/// One entry of the `POST /transfers/downloads/{username}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub filename: String,
    pub size: u64,
}

impl From<&SearchFile> for DownloadRequest {
    fn from(file: &SearchFile) -> Self {
        Self {
            filename: file.filename.clone(),
            size: file.size,
        }
    }
}

/// `GET /transfers/downloads/` groups transfers by user, then directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTransfers {
    pub username: String,
    #[serde(default)]
    pub directories: Vec<TransferDirectory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDirectory {
    pub directory: String,
    #[serde(default)]
    pub files: Vec<Transfer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    #[serde(default)]
    pub id: String,
    pub filename: String,
    /// Comma-separated flags, e.g. `"Queued, Remotely"` or
    /// `"Completed, Succeeded"`.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub bytes_transferred: u64,
    #[serde(default)]
    pub bytes_remaining: u64,
    #[serde(default)]
    pub percent_complete: f64,
}
