use farmline_common::PipelineKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Path of the SQLite database. Defaults to `farmline.db` next to the
    /// config file.
    #[serde(default)]
    pub database: Option<PathBuf>,

    #[serde(default)]
    pub farm: FarmConfig,

    #[serde(default)]
    pub pipelines: Vec<PipelineSettings>,
}

impl Config {
    /// Find a pipeline by display name or collection name.
    pub fn pipeline(&self, name: &str) -> Option<&PipelineSettings> {
        self.pipelines
            .iter()
            .find(|p| p.name == name || p.collection() == name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FarmConfig {
    #[serde(default = "default_farm_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub enabled: bool,
}

fn default_farm_url() -> String {
    "http://localhost:8082".to_string()
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            url: default_farm_url(),
            api_key: String::new(),
            enabled: false,
        }
    }
}

/// Per-pipeline environment settings.
///
/// Everything the sync and submission paths need for one pipeline: folders,
/// naming templates, farm placement, perspectives, row-skip rules, the
/// persisted submitter order, and custom tasks. Free-form `extra` keys are
/// visible to naming templates alongside the typed fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineSettings {
    /// Display name; the collection name is this with whitespace stripped.
    pub name: String,

    /// Pipeline kind, decides scene format and render plugin.
    pub kind: PipelineKind,

    /// Root folder for everything the pipeline writes.
    pub output_root: PathBuf,

    /// Scene file folder (default: `<output_root>/scenes`).
    #[serde(default)]
    pub scene_folder: Option<PathBuf>,

    /// Preview output folder (default: `<output_root>/previews`).
    #[serde(default)]
    pub preview_folder: Option<PathBuf>,

    /// Delivery folder (default: `<output_root>/delivery`).
    #[serde(default)]
    pub delivery_folder: Option<PathBuf>,

    /// Template for the document identity. Empty or absent falls back to the
    /// content hash.
    #[serde(default)]
    pub sid_template: Option<String>,

    /// Template for the rendering output name. Empty or absent falls back to
    /// the sid.
    #[serde(default)]
    pub rendering_template: Option<String>,

    /// Template for the preview name. Empty or absent falls back to the sid.
    #[serde(default)]
    pub preview_template: Option<String>,

    /// Template for the farm batch name. Empty or absent falls back to the
    /// collection name.
    #[serde(default)]
    pub batch_template: Option<String>,

    /// Base farm priority; stage offsets are added on top.
    #[serde(default = "default_base_priority")]
    pub base_priority: u8,

    #[serde(default)]
    pub pool: String,

    #[serde(default)]
    pub secondary_pool: Option<String>,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default = "default_initial_status")]
    pub initial_status: String,

    /// Configured perspective codes. Empty means one pass with the empty
    /// perspective.
    #[serde(default)]
    pub perspectives: Vec<String>,

    /// Table column that pins a row to a single perspective.
    #[serde(default = "default_perspective_column")]
    pub perspective_column: String,

    /// Rendering output extensions, one output pair per entry.
    #[serde(default = "default_render_extensions")]
    pub render_extensions: Vec<String>,

    /// Preview file extension.
    #[serde(default = "default_preview_extension")]
    pub preview_extension: String,

    #[serde(default)]
    pub task_timeout_minutes: Option<u32>,

    /// Farm nodes the jobs are restricted to.
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Farm nodes the jobs must avoid.
    #[serde(default)]
    pub blacklist: Vec<String>,

    #[serde(default)]
    pub skip_rules: Vec<SkipRule>,

    /// Persisted submitter order. Rehydrated and self-healed by the order
    /// resolver; edits are written back section-wise.
    #[serde(default)]
    pub submitters: Vec<SubmitterEntry>,

    #[serde(default)]
    pub custom_tasks: Vec<CustomTaskConfig>,

    /// Per-stage overrides keyed by stage name.
    #[serde(default)]
    pub stages: BTreeMap<String, StageSettings>,

    /// Free-form keys exposed to naming templates.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,

    /// Perspective-scoped overrides: perspective code -> key -> value.
    /// Flattened to `<key>_<perspective>` in the settings view.
    #[serde(default)]
    pub perspective_overrides: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_base_priority() -> u8 {
    50
}
fn default_initial_status() -> String {
    "Active".to_string()
}
fn default_perspective_column() -> String {
    "Perspective".to_string()
}
fn default_render_extensions() -> Vec<String> {
    vec!["exr".to_string()]
}
fn default_preview_extension() -> String {
    "mov".to_string()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: PipelineKind::Max,
            output_root: PathBuf::new(),
            scene_folder: None,
            preview_folder: None,
            delivery_folder: None,
            sid_template: None,
            rendering_template: None,
            preview_template: None,
            batch_template: None,
            base_priority: default_base_priority(),
            pool: String::new(),
            secondary_pool: None,
            group: None,
            initial_status: default_initial_status(),
            perspectives: Vec::new(),
            perspective_column: default_perspective_column(),
            render_extensions: default_render_extensions(),
            preview_extension: default_preview_extension(),
            task_timeout_minutes: None,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            skip_rules: Vec::new(),
            submitters: Vec::new(),
            custom_tasks: Vec::new(),
            stages: BTreeMap::new(),
            extra: BTreeMap::new(),
            perspective_overrides: BTreeMap::new(),
        }
    }
}

impl PipelineSettings {
    /// Collection name derived from the display name.
    pub fn collection(&self) -> String {
        farmline_common::collection_name(&self.name)
    }

    /// Scene file folder with the default applied.
    pub fn scene_dir(&self) -> PathBuf {
        self.scene_folder
            .clone()
            .unwrap_or_else(|| self.output_root.join("scenes"))
    }

    /// Preview folder with the default applied.
    pub fn preview_dir(&self) -> PathBuf {
        self.preview_folder
            .clone()
            .unwrap_or_else(|| self.output_root.join("previews"))
    }

    /// Delivery folder with the default applied.
    pub fn delivery_dir(&self) -> PathBuf {
        self.delivery_folder
            .clone()
            .unwrap_or_else(|| self.output_root.join("delivery"))
    }

    /// Folder rendered frames land in.
    pub fn renders_dir(&self) -> PathBuf {
        self.output_root.join("renders")
    }
}

/// One persisted submitter order entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubmitterEntry {
    pub name: String,
    pub class_name: String,
}

/// A user-defined task appended to the submission chain.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CustomTaskConfig {
    /// Action identifier handed to the command-line farm plugin.
    pub action_id: String,

    pub name: String,

    /// Naming templates for the files the task produces.
    #[serde(default)]
    pub output_filenames: Vec<String>,
}

/// Per-stage overrides of farm placement.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StageSettings {
    #[serde(default)]
    pub pool: Option<String>,

    #[serde(default)]
    pub secondary_pool: Option<String>,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub task_timeout_minutes: Option<u32>,

    #[serde(default)]
    pub whitelist: Vec<String>,

    #[serde(default)]
    pub blacklist: Vec<String>,
}

/// Row-skip predicate applied before a row is processed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkipRule {
    /// Table column the predicate reads.
    pub column: String,

    pub op: SkipOp,

    /// Comparison value; unused for `is_empty`.
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipOp {
    Equals,
    Contains,
    Matches,
    IsEmpty,
}
