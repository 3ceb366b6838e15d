use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque job identifier assigned by the backend.
pub type JobId = String;

/// Lifecycle tag reported by the backend for a job or one of its steps.
///
/// Unrecognized tags land in [`JobStatus::Other`] and are never terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    #[default]
    Pending,
    Initializing,
    Processing,
    GeneratingScript,
    ScriptGenerated,
    GeneratingAssets,
    AssetsGenerated,
    Animating,
    AnimationCreated,
    Rendering,
    Completed,
    Error,
    Failed,
    Cancelled,
    Other(String),
}

impl JobStatus {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "initializing" => Self::Initializing,
            "processing" => Self::Processing,
            "generating_script" => Self::GeneratingScript,
            "script_generated" => Self::ScriptGenerated,
            "generating_assets" => Self::GeneratingAssets,
            "assets_generated" => Self::AssetsGenerated,
            "animating" => Self::Animating,
            "animation_created" => Self::AnimationCreated,
            "rendering" => Self::Rendering,
            "completed" => Self::Completed,
            "error" => Self::Error,
            "failed" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(tag.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Initializing => "initializing",
            Self::Processing => "processing",
            Self::GeneratingScript => "generating_script",
            Self::ScriptGenerated => "script_generated",
            Self::GeneratingAssets => "generating_assets",
            Self::AssetsGenerated => "assets_generated",
            Self::Animating => "animating",
            Self::AnimationCreated => "animation_created",
            Self::Rendering => "rendering",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Other(tag) => tag,
        }
    }

    /// True once the backend will no longer change this job.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Completed | Self::Error | Self::Failed | Self::Cancelled => true,
            Self::Pending
            | Self::Initializing
            | Self::Processing
            | Self::GeneratingScript
            | Self::ScriptGenerated
            | Self::GeneratingAssets
            | Self::AssetsGenerated
            | Self::Animating
            | Self::AnimationCreated
            | Self::Rendering
            | Self::Other(_) => false,
        }
    }
}

impl From<String> for JobStatus {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<&str> for JobStatus {
    fn from(tag: &str) -> Self {
        Self::from_tag(tag)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_tag().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Summary row returned by the job list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Stored records key the id as `id`.
    #[serde(alias = "id")]
    pub job_id: JobId,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: JobStatus,
    /// Seconds since the Unix epoch.
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: f64,
    #[serde(default)]
    pub completed_at: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_ready: bool,
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Point-in-time view of one job. Each applied poll replaces the previous one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobStatusSnapshot {
    /// The backend may send `null`; the client fills it from the request.
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_id: JobId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: f64,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: f64,
    #[serde(default)]
    pub updated_at: Option<f64>,
    #[serde(default)]
    pub completed_at: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_ready: bool,
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub output: Option<JobOutput>,
}

impl JobStatusSnapshot {
    /// Progress clamped to 0..=100. Non-finite values read as zero.
    pub fn progress_percent(&self) -> u8 {
        clamp_percent(self.progress)
    }

    pub fn has_script(&self) -> bool {
        self.output
            .as_ref()
            .is_some_and(|output| output.script.is_some())
    }

    pub fn asset_paths(&self) -> &[String] {
        self.output
            .as_ref()
            .map(|output| output.assets.as_slice())
            .unwrap_or(&[])
    }

    /// Server-relative URL of the rendered video, if one is resolvable.
    pub fn video_url(&self, job_id: &str) -> Option<String> {
        if let Some(url) = self
            .output
            .as_ref()
            .and_then(|output| output.video_url.as_deref())
            .filter(|url| !url.is_empty())
        {
            return Some(url.to_string());
        }
        self.video_ready.then(|| format!("/api/video/{job_id}"))
    }
}

pub(crate) fn clamp_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}

/// One phase of the backend pipeline, in server-assigned display order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
}

impl Step {
    pub fn progress_percent(&self) -> u8 {
        clamp_percent(self.progress)
    }
}

/// Output bundle nested in a status snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobOutput {
    #[serde(default)]
    pub script: Option<ScriptRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Reads an explicit `null` as the field's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The backend either inlines the script or points at the file it wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptRef {
    Inline(Script),
    Path(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

impl Script {
    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|scene| scene.duration).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub description: String,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default, alias = "animation_notes")]
    pub camera: Option<String>,
    #[serde(default)]
    pub effects: Option<String>,
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default)]
    pub visuals: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Images,
    Audio,
    Models,
    Videos,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::Images,
        AssetCategory::Audio,
        AssetCategory::Models,
        AssetCategory::Videos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetCategory::Images => "images",
            AssetCategory::Audio => "audio",
            AssetCategory::Models => "models",
            AssetCategory::Videos => "videos",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "images" | "image" => Some(AssetCategory::Images),
            "audio" => Some(AssetCategory::Audio),
            "models" | "model" => Some(AssetCategory::Models),
            "videos" | "video" => Some(AssetCategory::Videos),
            _ => None,
        }
    }

    /// Infers the category from a path's extension, case-insensitively.
    pub fn from_path(path: &str) -> Option<Self> {
        let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let (_, ext) = file.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Some(AssetCategory::Images),
            "mp3" | "wav" | "ogg" | "m4a" => Some(AssetCategory::Audio),
            "glb" | "gltf" | "obj" | "fbx" => Some(AssetCategory::Models),
            "mp4" | "webm" | "mov" => Some(AssetCategory::Videos),
            _ => None,
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset paths grouped by category, each group in server order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetBundle {
    groups: BTreeMap<AssetCategory, Vec<String>>,
}

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups a flat path list by extension. Unrecognized files are dropped.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bundle = Self::new();
        for path in paths {
            let path = path.into();
            if let Some(category) = AssetCategory::from_path(&path) {
                bundle.push(category, path);
            }
        }
        bundle
    }

    pub fn push(&mut self, category: AssetCategory, path: impl Into<String>) {
        self.groups.entry(category).or_default().push(path.into());
    }

    pub fn get(&self, category: AssetCategory) -> &[String] {
        self.groups
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Categories holding at least one asset, in display order.
    pub fn categories(&self) -> Vec<AssetCategory> {
        AssetCategory::ALL
            .into_iter()
            .filter(|category| !self.get(*category).is_empty())
            .collect()
    }
}

/// Body of a job creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}
