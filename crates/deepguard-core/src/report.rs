//! Verification report log, filtering, and CSV export.
//!
//! Completed media items become [`ReportRecord`]s. [`ReportFilter`] applies
//! the reports view's search box and drop-downs: a case-insensitive
//! substring match on the file name plus equality on type, verdict and
//! source. Unset criteria match everything.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::mean_confidence;
use crate::error::Result;
use crate::logging::ROW_COUNT;
use crate::models::{format_size, MediaItem, MediaType, MediaVerdict};

/// CSV header, in column order.
pub const CSV_HEADER: &str = "Filename,Type,Verdict,Confidence,Date,Processing Time,File Size,Source";

/// Where a report's media came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    Upload,
    Browser,
}

impl ReportSource {
    pub fn label(&self) -> &'static str {
        match self {
            ReportSource::Upload => "Upload",
            ReportSource::Browser => "Browser",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upload" => Some(ReportSource::Upload),
            "browser" => Some(ReportSource::Browser),
            _ => None,
        }
    }
}

/// Anything the report filter and confidence mean can be applied to.
pub trait Reportable {
    fn filename(&self) -> &str;
    fn media_type(&self) -> MediaType;
    fn verdict(&self) -> Option<MediaVerdict>;
    fn source(&self) -> ReportSource;
    fn confidence(&self) -> Option<u8>;
}

/// One row of the verification report log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub filename: String,
    pub media_type: MediaType,
    pub verdict: MediaVerdict,
    pub confidence: u8,
    pub date: NaiveDate,
    pub processing_time_secs: f64,
    pub size_bytes: u64,
    pub source: ReportSource,
}

impl ReportRecord {
    /// Build a record from a completed media item; `None` while pending.
    pub fn from_media(item: &MediaItem) -> Option<Self> {
        let assessment = item.assessment?;
        let completed_at = item.completed_at?;
        let elapsed_ms = (completed_at - item.created_at).num_milliseconds().max(0);
        Some(Self {
            filename: item.name.clone(),
            media_type: item.media_type,
            verdict: assessment.verdict,
            confidence: assessment.confidence,
            date: completed_at.date_naive(),
            processing_time_secs: elapsed_ms as f64 / 1000.0,
            size_bytes: item.size_bytes,
            source: ReportSource::Upload,
        })
    }

    /// Render as one CSV row matching [`CSV_HEADER`].
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{}%,{},{:.1}s,{},{}",
            self.filename,
            self.media_type.label(),
            self.verdict.label(),
            self.confidence,
            self.date.format("%Y-%m-%d"),
            self.processing_time_secs,
            format_size(self.size_bytes),
            self.source.label(),
        )
    }
}

impl Reportable for ReportRecord {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn media_type(&self) -> MediaType {
        self.media_type
    }

    fn verdict(&self) -> Option<MediaVerdict> {
        Some(self.verdict)
    }

    fn source(&self) -> ReportSource {
        self.source
    }

    fn confidence(&self) -> Option<u8> {
        Some(self.confidence)
    }
}

impl Reportable for MediaItem {
    fn filename(&self) -> &str {
        &self.name
    }

    fn media_type(&self) -> MediaType {
        self.media_type
    }

    fn verdict(&self) -> Option<MediaVerdict> {
        MediaItem::verdict(self)
    }

    fn source(&self) -> ReportSource {
        ReportSource::Upload
    }

    fn confidence(&self) -> Option<u8> {
        MediaItem::confidence(self)
    }
}

/// Filter criteria from the reports view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<MediaVerdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ReportSource>,
}

impl ReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub fn with_verdict(mut self, verdict: MediaVerdict) -> Self {
        self.verdict = Some(verdict);
        self
    }

    pub fn with_source(mut self, source: ReportSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn matches<R: Reportable + ?Sized>(&self, item: &R) -> bool {
        let matches_search = match &self.search {
            Some(term) => item
                .filename()
                .to_lowercase()
                .contains(&term.to_lowercase()),
            None => true,
        };
        let matches_type = self.media_type.map_or(true, |t| item.media_type() == t);
        let matches_verdict = self.verdict.map_or(true, |v| item.verdict() == Some(v));
        let matches_source = self.source.map_or(true, |s| item.source() == s);

        matches_search && matches_type && matches_verdict && matches_source
    }

    /// Apply to a slice, keeping order.
    pub fn apply<'a, R: Reportable>(&self, items: &'a [R]) -> Vec<&'a R> {
        items.iter().filter(|r| self.matches(*r)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub fake: usize,
    pub real: usize,
    pub mean_confidence: f64,
}

/// Summary cards for the reports view over the filtered subset.
pub fn summarize_reports(records: &[ReportRecord], filter: &ReportFilter) -> ReportSummary {
    let filtered = filter.apply(records);
    ReportSummary {
        total: filtered.len(),
        fake: filtered
            .iter()
            .filter(|r| r.verdict == MediaVerdict::Fake)
            .count(),
        real: filtered
            .iter()
            .filter(|r| r.verdict == MediaVerdict::Real)
            .count(),
        mean_confidence: mean_confidence(filtered.iter().map(|r| r.confidence)),
    }
}

/// Render the header plus one row per record, joined by `\n`.
pub fn export_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a ReportRecord>,
{
    std::iter::once(CSV_HEADER.to_string())
        .chain(records.into_iter().map(ReportRecord::to_csv_row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the filtered report CSV to `path`; returns the row count.
pub fn write_csv(path: &Path, records: &[ReportRecord], filter: &ReportFilter) -> Result<usize> {
    let filtered = filter.apply(records);
    let csv = export_csv(filtered.iter().copied());
    std::fs::write(path, csv)?;
    info!({ ROW_COUNT } = filtered.len(), path = %path.display(), "Report CSV exported");
    Ok(filtered.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        filename: &str,
        media_type: MediaType,
        verdict: MediaVerdict,
        confidence: u8,
        source: ReportSource,
    ) -> ReportRecord {
        ReportRecord {
            filename: filename.to_string(),
            media_type,
            verdict,
            confidence,
            date: NaiveDate::from_ymd_opt(2025, 8, 25).unwrap(),
            processing_time_secs: 2.3,
            size_bytes: 15_938_355,
            source,
        }
    }

    fn sample() -> Vec<ReportRecord> {
        vec![
            record(
                "suspicious_video.mp4",
                MediaType::Video,
                MediaVerdict::Fake,
                92,
                ReportSource::Upload,
            ),
            record(
                "profile_photo.jpg",
                MediaType::Image,
                MediaVerdict::Real,
                87,
                ReportSource::Upload,
            ),
            record(
                "news_clip.mp4",
                MediaType::Video,
                MediaVerdict::Real,
                89,
                ReportSource::Upload,
            ),
            record(
                "manipulated_image.png",
                MediaType::Image,
                MediaVerdict::Fake,
                96,
                ReportSource::Browser,
            ),
        ]
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let records = sample();
        assert_eq!(ReportFilter::new().apply(&records).len(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let records = sample();
        let hits = ReportFilter::new().with_search("CLIP").apply(&records);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "news_clip.mp4");
    }

    #[test]
    fn test_combined_filters() {
        let records = sample();
        let filter = ReportFilter::new()
            .with_media_type(MediaType::Image)
            .with_verdict(MediaVerdict::Fake)
            .with_source(ReportSource::Browser);
        let hits = filter.apply(&records);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "manipulated_image.png");
    }

    #[test]
    fn test_summarize_reports() {
        let records = sample();
        let summary = summarize_reports(&records, &ReportFilter::new());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.fake, 2);
        assert_eq!(summary.real, 2);
        assert_eq!(summary.mean_confidence, 91.0);
    }

    #[test]
    fn test_summarize_reports_empty_subset() {
        let records = sample();
        let filter = ReportFilter::new().with_search("missing");
        let summary = summarize_reports(&records, &filter);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mean_confidence, 0.0);
    }

    #[test]
    fn test_csv_row_format() {
        let r = record(
            "suspicious_video.mp4",
            MediaType::Video,
            MediaVerdict::Fake,
            92,
            ReportSource::Upload,
        );
        assert_eq!(
            r.to_csv_row(),
            "suspicious_video.mp4,Video,Fake,92%,2025-08-25,2.3s,15.2 MB,Upload"
        );
    }

    #[test]
    fn test_export_csv_header_only_when_empty() {
        let csv = export_csv(std::iter::empty());
        assert_eq!(csv, CSV_HEADER);
    }

    #[test]
    fn test_export_csv_rows() {
        let records = sample();
        let csv = export_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[4].starts_with("manipulated_image.png,Image,Fake,96%"));
        assert!(lines[4].ends_with(",Browser"));
    }

    #[test]
    fn test_from_pending_media_is_none() {
        let item = MediaItem::new(&crate::models::MediaFile::new("a.mp4", 1, "video/mp4"));
        assert!(ReportRecord::from_media(&item).is_none());
    }

    #[test]
    fn test_from_completed_media() {
        let mut item = MediaItem::new(&crate::models::MediaFile::new(
            "voice_message.wav",
            2 * 1024 * 1024,
            "audio/wav",
        ));
        item.begin_analysis();
        item.complete(MediaVerdict::Fake, 84);
        let record = ReportRecord::from_media(&item).unwrap();
        assert_eq!(record.filename, "voice_message.wav");
        assert_eq!(record.media_type, MediaType::Audio);
        assert_eq!(record.verdict, MediaVerdict::Fake);
        assert_eq!(record.confidence, 84);
        assert_eq!(record.source, ReportSource::Upload);
        assert!(record.processing_time_secs >= 0.0);
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(ReportSource::parse("Upload"), Some(ReportSource::Upload));
        assert_eq!(ReportSource::parse("browser"), Some(ReportSource::Browser));
        assert_eq!(ReportSource::parse("all"), None);
    }
}
