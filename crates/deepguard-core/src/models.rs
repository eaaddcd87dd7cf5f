//! Work item types for the three simulated pipelines.
//!
//! State changes are plain methods returning `bool`: `true` when the item
//! changed, `false` when the request did not apply to its current phase.
//! None of them can fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::{advance, Assessment, ItemKind, LifecyclePhase, WorkItem};

// =============================================================================
// MEDIA VERIFICATION
// =============================================================================

/// Top-level media category. Only this part of a MIME type is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Image,
    Audio,
}

impl MediaType {
    /// Classify a MIME type by its top-level category.
    ///
    /// Anything that is neither `video/*` nor `image/*` is treated as audio,
    /// matching the upload form which only accepts those three families.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("video") {
            MediaType::Video
        } else if mime.starts_with("image") {
            MediaType::Image
        } else {
            MediaType::Audio
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Image => "image",
            MediaType::Audio => "audio",
        }
    }

    /// Capitalized label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Video => "Video",
            MediaType::Image => "Image",
            MediaType::Audio => "Audio",
        }
    }

    /// Parse a filter value (`"video"`, `"Image"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Some(MediaType::Video),
            "image" => Some(MediaType::Image),
            "audio" => Some(MediaType::Audio),
            _ => None,
        }
    }
}

/// A file handed to the media pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Format a byte count as mebibytes with one decimal (`"10.0 MB"`).
pub fn format_size(size_bytes: u64) -> String {
    format!("{:.1} MB", size_bytes as f64 / 1024.0 / 1024.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPhase {
    Uploading,
    Analyzing,
    Completed,
}

impl LifecyclePhase for MediaPhase {
    fn rank(self) -> u8 {
        match self {
            MediaPhase::Uploading => 0,
            MediaPhase::Analyzing => 1,
            MediaPhase::Completed => 2,
        }
    }

    fn is_terminal(self) -> bool {
        self == MediaPhase::Completed
    }

    fn as_str(self) -> &'static str {
        match self {
            MediaPhase::Uploading => "uploading",
            MediaPhase::Analyzing => "analyzing",
            MediaPhase::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaVerdict {
    Real,
    Fake,
}

impl MediaVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaVerdict::Real => "real",
            MediaVerdict::Fake => "fake",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaVerdict::Real => "Real",
            MediaVerdict::Fake => "Fake",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "real" => Some(MediaVerdict::Real),
            "fake" => Some(MediaVerdict::Fake),
            _ => None,
        }
    }
}

/// A file going through simulated deepfake verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub name: String,
    pub media_type: MediaType,
    pub size_bytes: u64,
    /// Human-readable size, fixed at submission.
    pub size_display: String,
    pub phase: MediaPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment<MediaVerdict>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl MediaItem {
    /// Create an item in `uploading` from a submitted file.
    pub fn new(file: &MediaFile) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: file.name.clone(),
            media_type: MediaType::from_mime(&file.mime_type),
            size_bytes: file.size_bytes,
            size_display: format_size(file.size_bytes),
            phase: MediaPhase::Uploading,
            assessment: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// `uploading → analyzing`.
    pub fn begin_analysis(&mut self) -> bool {
        if self.phase != MediaPhase::Uploading {
            return false;
        }
        advance(&mut self.phase, MediaPhase::Analyzing)
    }

    /// `analyzing → completed`, recording the verdict.
    pub fn complete(&mut self, verdict: MediaVerdict, confidence: u8) -> bool {
        if self.phase != MediaPhase::Analyzing {
            return false;
        }
        advance(&mut self.phase, MediaPhase::Completed);
        self.assessment = Some(Assessment::new(verdict, confidence));
        self.completed_at = Some(Utc::now());
        true
    }

    pub fn verdict(&self) -> Option<MediaVerdict> {
        self.assessment.map(|a| a.verdict)
    }

    pub fn confidence(&self) -> Option<u8> {
        self.assessment.map(|a| a.confidence)
    }
}

impl WorkItem for MediaItem {
    type Phase = MediaPhase;

    const KIND: ItemKind = ItemKind::Media;

    fn id(&self) -> Uuid {
        self.id
    }

    fn phase(&self) -> MediaPhase {
        self.phase
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// SECURE BROWSER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Loading,
    Active,
    Blocked,
    Completed,
}

impl LifecyclePhase for SessionPhase {
    fn rank(self) -> u8 {
        match self {
            SessionPhase::Loading => 0,
            SessionPhase::Active | SessionPhase::Blocked => 1,
            SessionPhase::Completed => 2,
        }
    }

    fn is_terminal(self) -> bool {
        self == SessionPhase::Completed
    }

    fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Loading => "loading",
            SessionPhase::Active => "active",
            SessionPhase::Blocked => "blocked",
            SessionPhase::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionVerdict {
    Safe,
    Blocked,
}

impl SessionVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionVerdict::Safe => "safe",
            SessionVerdict::Blocked => "blocked",
        }
    }
}

/// A URL opened in the simulated sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseSession {
    pub id: Uuid,
    pub url: String,
    pub phase: SessionPhase,
    /// Outcome of the security check, drawn at creation and revealed only
    /// when loading finishes.
    #[serde(skip)]
    secure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment<SessionVerdict>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl BrowseSession {
    /// Create a session in `loading`.
    ///
    /// Returns `None` for a URL that is blank after trimming.
    pub fn new(url: &str, secure: bool) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::now_v7(),
            url: url.to_string(),
            phase: SessionPhase::Loading,
            secure,
            threat_count: None,
            duration_minutes: None,
            assessment: None,
            created_at: Utc::now(),
            completed_at: None,
        })
    }

    /// Result of the creation-time security check.
    pub fn passed_security_check(&self) -> bool {
        self.secure
    }

    /// `loading → active | blocked`.
    ///
    /// `threats` is only recorded for blocked sessions; secure sessions
    /// always report zero.
    pub fn finish_loading(&mut self, threats: u8) -> bool {
        let next = if self.secure {
            SessionPhase::Active
        } else {
            SessionPhase::Blocked
        };
        if self.phase != SessionPhase::Loading || !advance(&mut self.phase, next) {
            return false;
        }
        self.threat_count = Some(if self.secure { 0 } else { threats });
        true
    }

    /// Whether the user may close the session now.
    pub fn can_close(&self) -> bool {
        matches!(self.phase, SessionPhase::Active | SessionPhase::Blocked)
    }

    /// `active | blocked → completed`.
    pub fn close(&mut self, duration_minutes: u32, confidence: u8) -> bool {
        if !self.can_close() {
            return false;
        }
        let verdict = if self.phase == SessionPhase::Active {
            SessionVerdict::Safe
        } else {
            SessionVerdict::Blocked
        };
        advance(&mut self.phase, SessionPhase::Completed);
        self.duration_minutes = Some(duration_minutes);
        self.assessment = Some(Assessment::new(verdict, confidence));
        self.completed_at = Some(Utc::now());
        true
    }

    pub fn verdict(&self) -> Option<SessionVerdict> {
        self.assessment.map(|a| a.verdict)
    }
}

impl WorkItem for BrowseSession {
    type Phase = SessionPhase;

    const KIND: ItemKind = ItemKind::BrowseSession;

    fn id(&self) -> Uuid {
        self.id
    }

    fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn display_name(&self) -> &str {
        &self.url
    }
}

// =============================================================================
// ALERTS
// =============================================================================

/// Alert severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// User-driven triage state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }
}

/// Alerts have no timed phases; they exist in a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPhase {
    Active,
}

impl LifecyclePhase for AlertPhase {
    fn rank(self) -> u8 {
        0
    }

    fn is_terminal(self) -> bool {
        true
    }

    fn as_str(self) -> &'static str {
        "active"
    }
}

/// A synthetic monitoring alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub message: String,
    pub source: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub phase: AlertPhase,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_changed_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(message: impl Into<String>, source: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::now_v7(),
            message: message.into(),
            source: source.into(),
            severity,
            status: AlertStatus::Active,
            phase: AlertPhase::Active,
            created_at: Utc::now(),
            status_changed_at: None,
        }
    }

    /// `active → acknowledged`.
    pub fn acknowledge(&mut self) -> bool {
        self.transition(AlertStatus::Acknowledged)
    }

    /// `active → resolved`.
    pub fn resolve(&mut self) -> bool {
        self.transition(AlertStatus::Resolved)
    }

    fn transition(&mut self, next: AlertStatus) -> bool {
        if self.status != AlertStatus::Active {
            return false;
        }
        self.status = next;
        self.status_changed_at = Some(Utc::now());
        true
    }

    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}

impl WorkItem for Alert {
    type Phase = AlertPhase;

    const KIND: ItemKind = ItemKind::Alert;

    fn id(&self) -> Uuid {
        self.id
    }

    fn phase(&self) -> AlertPhase {
        self.phase
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn display_name(&self) -> &str {
        &self.message
    }
}
