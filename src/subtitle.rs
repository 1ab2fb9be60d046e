use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, KikitoriError};
use crate::transcribe::Segment;

/// Length given to segments whose end does not come after their start
const DEGENERATE_DURATION: f64 = 0.5;

/// Slack for float subtraction when comparing against the minimum duration
const DURATION_EPSILON: f64 = 1e-9;

/// A numbered, time-ranged subtitle block
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Filter recognized segments into subtitle entries.
///
/// Segments are visited in order. Blank text is dropped before the repeat
/// check, so it never counts as the last kept entry. Text identical to the
/// last kept entry is skipped (only adjacent repeats). A segment whose end is not
/// after its start is stretched to half a second; otherwise segments shorter
/// than `min_duration` are dropped.
pub fn build_entries(segments: &[Segment], min_duration: f64) -> Vec<SubtitleEntry> {
    let mut entries: Vec<SubtitleEntry> = Vec::new();

    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }
        if entries.last().is_some_and(|last| last.text == text) {
            debug!("Skipping repeated segment at {:.2}s", segment.start);
            continue;
        }

        let start = segment.start;
        let end = if segment.end <= start {
            start + DEGENERATE_DURATION
        } else if segment.end - start + DURATION_EPSILON < min_duration {
            debug!("Skipping short segment at {:.2}s", segment.start);
            continue;
        } else {
            segment.end
        };

        entries.push(SubtitleEntry {
            index: entries.len() + 1,
            start,
            end,
            text: text.to_string(),
        });
    }

    entries
}

/// Render entries as SRT: index, time range, text, blank line
pub fn render_srt(entries: &[SubtitleEntry]) -> String {
    let mut srt_content = String::new();

    for entry in entries {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            entry.index,
            format_timestamp(entry.start),
            format_timestamp(entry.end),
            entry.text
        ));
    }

    srt_content
}

/// Render entries as a plain transcript, one line per entry
pub fn render_txt(entries: &[SubtitleEntry]) -> String {
    entries.iter().map(|entry| format!("{}\n", entry.text)).collect()
}

/// Write the SRT file and, when requested, the plain-text transcript
pub async fn write_outputs(
    entries: &[SubtitleEntry],
    srt_path: &Path,
    txt_path: Option<&Path>,
) -> Result<()> {
    info!("Saving subtitles to {}...", srt_path.display());
    write_file(srt_path, render_srt(entries)).await?;

    if let Some(txt_path) = txt_path {
        info!("Saving transcript to {}...", txt_path.display());
        write_file(txt_path, render_txt(entries)).await?;
    }

    Ok(())
}

async fn write_file(path: &Path, content: String) -> Result<()> {
    fs::write(path, content)
        .await
        .map_err(|e| KikitoriError::OutputWrite(format!("{}: {}", path.display(), e)))
}

/// Format elapsed seconds as an SRT timestamp (HH:MM:SS,mmm).
///
/// Rounds to the nearest millisecond before splitting, so 59.9996 becomes
/// `00:01:00,000` rather than `00:00:59,1000`.
pub fn format_timestamp(seconds: f64) -> String {
    let total_milliseconds = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(entries: &[SubtitleEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(65.123), "00:01:05,123");
        assert_eq!(format_timestamp(3661.5), "01:01:01,500");
        assert_eq!(format_timestamp(36000.0), "10:00:00,000");
    }

    #[test]
    fn test_format_timestamp_carries_rounding() {
        assert_eq!(format_timestamp(59.999), "00:00:59,999");
        assert_eq!(format_timestamp(59.9996), "00:01:00,000");
        assert_eq!(format_timestamp(3599.9999), "01:00:00,000");
    }

    #[test]
    fn test_format_timestamp_clamps_invalid() {
        assert_eq!(format_timestamp(-1.0), "00:00:00,000");
        assert_eq!(format_timestamp(f64::NAN), "00:00:00,000");
    }

    #[test]
    fn test_min_duration_boundary() {
        let segments = vec![
            Segment::new(1.2, 1.7, "ちょうど"),
            Segment::new(3.0, 3.499, "短い"),
        ];

        let entries = build_entries(&segments, 0.5);
        assert_eq!(texts(&entries), vec!["ちょうど"]);
    }

    #[test]
    fn test_adjacent_duplicates_removed() {
        let segments = vec![
            Segment::new(0.0, 1.0, " はい"),
            Segment::new(1.0, 2.0, "はい "),
            Segment::new(2.0, 3.0, "いいえ"),
            Segment::new(3.0, 4.0, "はい"),
        ];

        let entries = build_entries(&segments, 0.5);
        assert_eq!(texts(&entries), vec!["はい", "いいえ", "はい"]);
        assert_eq!(entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_dropped_segment_does_not_reset_dedup() {
        let segments = vec![
            Segment::new(0.0, 1.0, "はい"),
            Segment::new(1.0, 1.1, "えっと"),
            Segment::new(1.1, 2.0, "はい"),
        ];

        let entries = build_entries(&segments, 0.5);
        assert_eq!(texts(&entries), vec!["はい"]);
    }

    #[test]
    fn test_degenerate_interval_is_stretched() {
        let segments = vec![
            Segment::new(5.0, 5.0, "一瞬"),
            Segment::new(8.0, 7.5, "逆転"),
        ];

        let entries = build_entries(&segments, 0.5);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].start, 5.0);
        assert_eq!(entries[0].end, 5.5);
        assert_eq!(entries[1].end, 8.5);
    }

    #[test]
    fn test_blank_text_skipped() {
        let segments = vec![
            Segment::new(0.0, 2.0, "   "),
            Segment::new(2.0, 4.0, "本文"),
        ];

        let entries = build_entries(&segments, 0.5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, 1);
    }

    #[test]
    fn test_blank_text_does_not_break_repeat_run() {
        let segments = vec![
            Segment::new(0.0, 1.0, "はい"),
            Segment::new(1.0, 2.0, ""),
            Segment::new(2.0, 3.0, "はい"),
        ];

        let entries = build_entries(&segments, 0.5);
        assert_eq!(texts(&entries), vec!["はい"]);
    }

    #[test]
    fn test_render_srt() {
        let entries = build_entries(
            &[
                Segment::new(0.0, 2.5, "こんにちは"),
                Segment::new(3661.5, 3663.0, "またね"),
            ],
            0.5,
        );

        assert_eq!(
            render_srt(&entries),
            "1\n00:00:00,000 --> 00:00:02,500\nこんにちは\n\n\
             2\n01:01:01,500 --> 01:01:03,000\nまたね\n\n"
        );
        assert_eq!(render_txt(&entries), "こんにちは\nまたね\n");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_srt(&[]), "");
        assert_eq!(render_txt(&[]), "");
    }

    #[tokio::test]
    async fn test_write_outputs() {
        let dir = assert_fs::TempDir::new().unwrap();
        let srt = dir.path().join("talk_ja.srt");
        let txt = dir.path().join("talk_ja.txt");
        let entries = build_entries(&[Segment::new(1.0, 2.0, "テスト")], 0.5);

        write_outputs(&entries, &srt, Some(&txt)).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&srt).unwrap(),
            "1\n00:00:01,000 --> 00:00:02,000\nテスト\n\n"
        );
        assert_eq!(std::fs::read_to_string(&txt).unwrap(), "テスト\n");
    }

    #[tokio::test]
    async fn test_write_outputs_failure() {
        let dir = assert_fs::TempDir::new().unwrap();
        let srt = dir.path().join("no_such_dir").join("talk_ja.srt");

        let err = write_outputs(&[], &srt, None).await.unwrap_err();
        assert!(matches!(err, KikitoriError::OutputWrite(_)));
    }
}
