//! Captured-audio file naming.
//!
//! ```text
//! <root>/<speaker>/<exercise>_<level>_sesion<n>_<YYYY-MM-DD>.wav
//! <root>/<speaker>/audio_<speaker>_<exercise id>_<YYYYMMDD_HHMMSS>.wav   (no exercise metadata)
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::models::capture::CorrelationTags;

/// Replace characters that are unsafe in a file name segment with `_`.
///
/// Letters (including accented ones), digits, `-` and `.` are kept; runs of
/// replaced characters collapse into one underscore. Empty input becomes
/// `sin_nombre`.
pub fn sanitize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '.' {
            out.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_matches(|c| c == '_' || c == '.');
    if trimmed.is_empty() {
        "sin_nombre".to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name for a recording, without directory.
pub fn artifact_file_name(tags: &CorrelationTags, now: NaiveDateTime) -> String {
    match (&tags.exercise_name, &tags.level, tags.session_number) {
        (Some(exercise), Some(level), Some(session)) => format!(
            "{}_{}_sesion{}_{}.wav",
            sanitize_segment(exercise),
            sanitize_segment(level),
            session,
            now.format("%Y-%m-%d")
        ),
        _ => format!(
            "audio_{}_{}_{}.wav",
            sanitize_segment(&tags.speaker_id),
            sanitize_segment(tags.exercise_id.as_deref().unwrap_or("libre")),
            now.format("%Y%m%d_%H%M%S")
        ),
    }
}

/// Per-speaker directory below `root`.
pub fn speaker_dir(root: &Path, tags: &CorrelationTags) -> PathBuf {
    root.join(sanitize_segment(&tags.speaker_id))
}

/// Full path for a new recording. An existing file is never overwritten:
/// `_2`, `_3`, ... is appended to the stem until the name is free.
pub fn artifact_path(root: &Path, tags: &CorrelationTags, now: NaiveDateTime) -> PathBuf {
    let dir = speaker_dir(root, tags);
    let file_name = artifact_file_name(tags, now);
    let candidate = dir.join(&file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name.trim_end_matches(".wav");
    (2u32..)
        .map(|n| dir.join(format!("{}_{}.wav", stem, n)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
