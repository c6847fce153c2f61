//! Job submitters, one per pipeline stage.
//!
//! A submitter turns one document plus the pipeline settings into a farm job
//! description. The stage set is closed: the five built-in stages plus
//! user-defined custom tasks behind the command-line plugin.

use anyhow::Result;
use farmline_db::models::Document;
use std::path::PathBuf;
use tracing::warn;

use crate::config::{CompiledSettings, CustomTaskConfig, StageSettings};
use crate::farm::types::{JobInfo, OutputPair, PluginInfo};
use crate::naming::{self, MergedView};

/// The built-in stages plus the custom task wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    InputScene,
    RenderScene,
    Rendering,
    Compositing,
    DeliveryCopy,
    CustomTask,
}

impl StageKind {
    /// Class name persisted in the submitter order.
    pub fn class_name(&self) -> &'static str {
        match self {
            StageKind::InputScene => "InputSceneSubmitter",
            StageKind::RenderScene => "RenderSceneSubmitter",
            StageKind::Rendering => "RenderingSubmitter",
            StageKind::Compositing => "CompositingSubmitter",
            StageKind::DeliveryCopy => "DeliveryCopySubmitter",
            StageKind::CustomTask => "CustomTaskSubmitter",
        }
    }

    /// Stage name used for job naming and per-stage setting lookup.
    pub fn stage_name(&self) -> &'static str {
        match self {
            StageKind::InputScene => "input_scene",
            StageKind::RenderScene => "render_scene",
            StageKind::Rendering => "rendering",
            StageKind::Compositing => "compositing",
            StageKind::DeliveryCopy => "delivery_copy",
            StageKind::CustomTask => "custom_task",
        }
    }

    /// Priority on top of the pipeline base: earlier stages run at higher
    /// priority so a chain drains front to back under farm contention.
    pub fn priority_offset(&self) -> i16 {
        match self {
            StageKind::InputScene => 6,
            StageKind::RenderScene => 4,
            StageKind::Rendering => 2,
            StageKind::Compositing => 1,
            StageKind::DeliveryCopy | StageKind::CustomTask => 0,
        }
    }

    /// Whether this stage is skipped for documents mapped to a duplicate.
    ///
    /// Render-type stages produce files another document already produces;
    /// delivery and custom tasks run per document regardless.
    pub fn skips_mapped(&self) -> bool {
        matches!(
            self,
            StageKind::InputScene
                | StageKind::RenderScene
                | StageKind::Rendering
                | StageKind::Compositing
        )
    }

    pub fn from_class_name(class_name: &str) -> Option<Self> {
        match class_name {
            "InputSceneSubmitter" => Some(StageKind::InputScene),
            "RenderSceneSubmitter" => Some(StageKind::RenderScene),
            "RenderingSubmitter" => Some(StageKind::Rendering),
            "CompositingSubmitter" => Some(StageKind::Compositing),
            "DeliveryCopySubmitter" => Some(StageKind::DeliveryCopy),
            "CustomTaskSubmitter" => Some(StageKind::CustomTask),
            _ => None,
        }
    }
}

/// One entry of the resolved submission chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitter {
    pub name: String,
    pub kind: StageKind,
    pub custom_task: Option<CustomTaskConfig>,
}

impl Submitter {
    /// Built-in stage submitter.
    pub fn stage(kind: StageKind) -> Self {
        Self {
            name: kind.stage_name().to_string(),
            kind,
            custom_task: None,
        }
    }

    /// Submitter for a user-defined task.
    pub fn custom(task: CustomTaskConfig) -> Self {
        Self {
            name: task.name.clone(),
            kind: StageKind::CustomTask,
            custom_task: Some(task),
        }
    }

    /// Build the farm job for one document, or `None` when this stage does
    /// not apply (mapped duplicate on a render-type stage).
    ///
    /// Output directories are created here so the farm nodes can write into
    /// them; creation failures are logged and left for the job to surface.
    pub fn build_job(
        &self,
        document: &Document,
        compiled: &CompiledSettings,
    ) -> Result<Option<(JobInfo, PluginInfo)>> {
        if self.kind.skips_mapped() && document.mapping.is_some() {
            return Ok(None);
        }

        let settings = &compiled.settings;
        let perspective = document.perspective.as_str();
        let stage = settings.stages.get(self.kind.stage_name());

        let priority = (settings.base_priority as i16 + self.kind.priority_offset())
            .clamp(0, 100) as u8;

        let batch_name = {
            let view = MergedView::new(&document.fields, compiled.view());
            compiled
                .template_for("batch_template", perspective)
                .map(|t| t.render_folded(&view))
                .filter(|rendered| !rendered.is_empty())
                .unwrap_or_else(|| compiled.collection.clone())
        };

        let (outputs, plugin, plugin_info) = self.stage_payload(document, compiled)?;
        for output in &outputs {
            if let Err(err) = std::fs::create_dir_all(&output.directory) {
                warn!(
                    directory = %output.directory.display(),
                    error = %err,
                    "could not create output directory"
                );
            }
        }

        let job = JobInfo {
            plugin,
            name: format!("{} - {}", document.sid, self.name),
            batch_name,
            priority,
            pool: pick(stage, |s| s.pool.clone(), || settings.pool.clone()),
            secondary_pool: stage
                .and_then(|s| s.secondary_pool.clone())
                .or_else(|| settings.secondary_pool.clone()),
            group: stage
                .and_then(|s| s.group.clone())
                .or_else(|| settings.group.clone()),
            initial_status: settings.initial_status.clone(),
            dependencies: Vec::new(),
            outputs,
            task_timeout_minutes: stage
                .and_then(|s| s.task_timeout_minutes)
                .or(settings.task_timeout_minutes),
            whitelist: pick_list(stage, |s| &s.whitelist, &settings.whitelist),
            blacklist: pick_list(stage, |s| &s.blacklist, &settings.blacklist),
        };

        Ok(Some((job, plugin_info)))
    }

    /// Outputs, farm plugin name and plugin parameters for this stage.
    fn stage_payload(
        &self,
        document: &Document,
        compiled: &CompiledSettings,
    ) -> Result<(Vec<OutputPair>, String, PluginInfo)> {
        let settings = &compiled.settings;
        let sid = document.sid.as_str();
        let perspective = document.perspective.as_str();
        let scene_plugin = match settings.kind {
            farmline_common::PipelineKind::Max => "3dsmax",
            farmline_common::PipelineKind::Maya => "MayaBatch",
        };
        let scene_ext = settings.kind.scene_extension();
        let input_scene = settings
            .scene_dir()
            .join(format!("{}_input.{}", sid, scene_ext));
        let render_scene = settings
            .scene_dir()
            .join(format!("{}_render.{}", sid, scene_ext));

        let preview = document
            .preview
            .clone()
            .unwrap_or_else(|| naming::preview_name(compiled, &document.fields, perspective));
        let preview_file = format!("{}.{}", preview, settings.preview_extension);

        match self.kind {
            StageKind::InputScene => {
                let mut info = PluginInfo::new();
                info.set("SceneFile", input_scene.to_string_lossy());
                Ok((
                    vec![OutputPair {
                        directory: settings.scene_dir(),
                        filename: format!("{}_input.{}", sid, scene_ext),
                    }],
                    scene_plugin.to_string(),
                    info,
                ))
            }
            StageKind::RenderScene => {
                let mut info = PluginInfo::new();
                info.set("SceneFile", input_scene.to_string_lossy());
                Ok((
                    vec![OutputPair {
                        directory: settings.scene_dir(),
                        filename: format!("{}_render.{}", sid, scene_ext),
                    }],
                    scene_plugin.to_string(),
                    info,
                ))
            }
            StageKind::Rendering => {
                let rendering = naming::rendering_name(compiled, &document.fields, perspective);
                let directory = settings.renders_dir().join(&rendering);
                let outputs = settings
                    .render_extensions
                    .iter()
                    .map(|ext| OutputPair {
                        directory: directory.clone(),
                        filename: format!("{}.{}", rendering, ext),
                    })
                    .collect();
                let mut info = PluginInfo::new();
                info.set("SceneFile", render_scene.to_string_lossy());
                Ok((outputs, scene_plugin.to_string(), info))
            }
            StageKind::Compositing => {
                let mut info = PluginInfo::new();
                info.set(
                    "SceneFile",
                    settings
                        .preview_dir()
                        .join(format!("{}.nk", preview))
                        .to_string_lossy(),
                );
                Ok((
                    vec![OutputPair {
                        directory: settings.preview_dir(),
                        filename: preview_file,
                    }],
                    "Nuke".to_string(),
                    info,
                ))
            }
            StageKind::DeliveryCopy => {
                let mut info = PluginInfo::new();
                info.set(
                    "Source",
                    settings.preview_dir().join(&preview_file).to_string_lossy(),
                );
                info.set("Destination", settings.delivery_dir().to_string_lossy());
                Ok((
                    vec![OutputPair {
                        directory: settings.delivery_dir(),
                        filename: preview_file,
                    }],
                    "FileTransfer".to_string(),
                    info,
                ))
            }
            StageKind::CustomTask => {
                let task = self.custom_task.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("custom task submitter '{}' has no task settings", self.name)
                })?;
                let directory: PathBuf = settings.output_root.join(&task.name);
                let view = MergedView::new(&document.fields, compiled.view());
                let outputs = compiled
                    .task_templates(&task.name)
                    .iter()
                    .map(|template| template.render_folded(&view))
                    .filter(|filename| !filename.is_empty())
                    .map(|filename| OutputPair {
                        directory: directory.clone(),
                        filename,
                    })
                    .collect();
                let mut info = PluginInfo::new();
                info.set("Command", task.action_id.clone());
                info.set("Arguments", sid);
                Ok((outputs, "CommandLine".to_string(), info))
            }
        }
    }
}

fn pick(
    stage: Option<&StageSettings>,
    field: impl Fn(&StageSettings) -> Option<String>,
    fallback: impl Fn() -> String,
) -> String {
    stage.and_then(field).unwrap_or_else(fallback)
}

fn pick_list(
    stage: Option<&StageSettings>,
    field: impl Fn(&StageSettings) -> &Vec<String>,
    fallback: &[String],
) -> Vec<String> {
    match stage.map(field).filter(|list| !list.is_empty()) {
        Some(list) => list.clone(),
        None => fallback.to_vec(),
    }
}
