//! Filtering, grouping and ranking of peer search responses.
//!
//! Everything here is pure so the selection rules can be tested without a
//! backend.

use std::cmp::Reverse;

use serde::Serialize;

use super::types::{DirectoryGroup, PeerCandidate, PeerResponse, SearchFile};

/// Extensions accepted when none are configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["flac", "mp3"];

/// What to download: one directory from one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadSelection {
    pub username: String,
    pub directory: DirectoryGroup,
}

/// Lowercased extension from the `extension` field, or from the filename
/// when that is blank.
pub fn file_extension(file: &SearchFile) -> String {
    let ext = file.extension.trim().trim_start_matches('.');
    if !ext.is_empty() {
        return ext.to_lowercase();
    }
    let path = normalize_path(&file.filename);
    match file_name(&path).rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Unlocked and of an allowed extension.
pub fn is_usable(file: &SearchFile, allowed_extensions: &[String]) -> bool {
    if file.is_locked {
        return false;
    }
    let ext = file_extension(file);
    allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
}

/// Peer paths use `\`; grouping works on `/`.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Parent part of a normalized path. Empty for bare filenames.
pub fn parent_directory(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Last segment of a normalized path.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// Group files by parent directory, keeping first-seen directory order and
/// the files' original names.
pub fn group_by_directory<'a>(files: impl IntoIterator<Item = &'a SearchFile>) -> Vec<DirectoryGroup> {
    let mut groups: Vec<DirectoryGroup> = Vec::new();
    for file in files {
        let path = normalize_path(&file.filename);
        let directory = parent_directory(&path);
        match groups.iter_mut().find(|g| g.directory == directory) {
            Some(group) => group.files.push(file.clone()),
            None => groups.push(DirectoryGroup {
                directory: directory.to_string(),
                files: vec![file.clone()],
            }),
        }
    }
    groups
}

/// One candidate per peer with at least one usable file.
pub fn build_candidates(
    responses: &[PeerResponse],
    allowed_extensions: &[String],
) -> Vec<PeerCandidate> {
    responses
        .iter()
        .filter_map(|response| {
            let dirs = group_by_directory(
                response
                    .files
                    .iter()
                    .filter(|f| is_usable(f, allowed_extensions)),
            );
            if dirs.is_empty() {
                return None;
            }
            Some(PeerCandidate {
                username: response.username.clone(),
                has_free_upload_slot: response.has_free_upload_slot,
                dirs,
            })
        })
        .collect()
}

/// Free upload slot first, then most usable files. Stable, so response order
/// breaks remaining ties.
pub fn rank_candidates(candidates: &mut [PeerCandidate]) {
    candidates.sort_by_key(|c| (!c.has_free_upload_slot, Reverse(c.total_files())));
}

/// Pick the best directory of the best-ranked peer.
pub fn select_download(
    responses: &[PeerResponse],
    allowed_extensions: &[String],
) -> Option<DownloadSelection> {
    let mut candidates = build_candidates(responses, allowed_extensions);
    rank_candidates(&mut candidates);
    let top = candidates.into_iter().next()?;
    let directory = top.best_directory()?.clone();
    Some(DownloadSelection {
        username: top.username,
        directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn allowed() -> Vec<String> {
        DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extension_falls_back_to_filename() {
        let mut file = fixtures::search_file("Music\\Low\\Album\\01 Track.FLAC", 10);
        file.extension = String::new();
        assert_eq!(file_extension(&file), "flac");

        file.extension = "MP3".to_string();
        assert_eq!(file_extension(&file), "mp3");

        let hidden = fixtures::search_file("Music\\.flac", 10);
        assert_eq!(file_extension(&hidden), "");

        let dotted_dir = fixtures::search_file("Music\\Low.2021\\cover", 10);
        assert_eq!(file_extension(&dotted_dir), "");
    }

    #[test]
    fn test_locked_and_foreign_extensions_are_unusable() {
        let allowed = allowed();
        let mut locked = fixtures::search_file("a\\b.flac", 1);
        locked.is_locked = true;
        assert!(!is_usable(&locked, &allowed));
        assert!(!is_usable(&fixtures::search_file("a\\b.wav", 1), &allowed));
        assert!(is_usable(&fixtures::search_file("a\\b.mp3", 1), &allowed));
    }

    #[test]
    fn test_group_by_directory_normalizes_separators() {
        let files = vec![
            fixtures::search_file("Music\\Low\\Album\\01.flac", 1),
            fixtures::search_file("Music/Low/Album/02.flac", 1),
            fixtures::search_file("Music\\Low\\Other\\01.flac", 1),
            fixtures::search_file("loose.flac", 1),
        ];
        let groups = group_by_directory(&files);
        let dirs: Vec<_> = groups.iter().map(|g| g.directory.as_str()).collect();
        assert_eq!(dirs, vec!["Music/Low/Album", "Music/Low/Other", ""]);
        assert_eq!(groups[0].files.len(), 2);
        // Original names are kept for the enqueue call.
        assert_eq!(groups[0].files[0].filename, "Music\\Low\\Album\\01.flac");
    }

    #[test]
    fn test_free_slot_beats_file_count() {
        let responses = vec![
            fixtures::peer_response("A", false, "X", 5),
            fixtures::peer_response("B", true, "Y", 2),
        ];
        let selection = select_download(&responses, &allowed()).unwrap();
        assert_eq!(selection.username, "B");
        assert_eq!(selection.directory.directory, "Y");
        assert_eq!(selection.directory.files.len(), 2);
    }

    #[test]
    fn test_ties_broken_by_file_count_then_order() {
        let mut candidates = build_candidates(
            &[
                fixtures::peer_response("small", true, "S", 2),
                fixtures::peer_response("big", true, "B", 6),
                fixtures::peer_response("also_big", true, "C", 6),
                fixtures::peer_response("busy", false, "D", 9),
            ],
            &allowed(),
        );
        rank_candidates(&mut candidates);
        let order: Vec<_> = candidates.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(order, vec!["big", "also_big", "small", "busy"]);
    }

    #[test]
    fn test_peer_without_usable_files_is_dropped() {
        let mut wav = fixtures::peer_response("wav_only", true, "W", 3);
        for file in wav.files.iter_mut() {
            file.filename = file.filename.replace(".flac", ".wav");
            file.extension = "wav".to_string();
        }
        let mut locked = fixtures::search_file("W\\bonus.flac", 1);
        locked.is_locked = true;
        wav.files.push(locked);

        let candidates = build_candidates(&[wav], &allowed());
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_best_directory_within_peer() {
        let mut response = fixtures::peer_response("A", true, "Disc 1", 3);
        response
            .files
            .extend(fixtures::peer_response("A", true, "Disc 2", 5).files);
        let selection = select_download(&[response], &allowed()).unwrap();
        assert_eq!(selection.directory.directory, "Disc 2");
    }

    #[test]
    fn test_no_responses_selects_nothing() {
        assert!(select_download(&[], &allowed()).is_none());
    }
}
