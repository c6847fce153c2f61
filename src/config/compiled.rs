//! Compiled pipeline settings.
//!
//! Raw `PipelineSettings` are what TOML gives us; compilation flattens them
//! into the ordered string view templates and perspective resolution read,
//! parses every naming template strictly, and compiles row-skip regexes.
//! All malformed input is rejected here, at load time, so the sync and
//! submission paths never see a template or predicate that can fail.

use anyhow::{Context, Result};
use farmline_common::FieldMap;
use farmline_template::Template;
use regex::Regex;
use std::collections::BTreeMap;

use super::types::{PipelineSettings, SkipOp, SkipRule};

/// Settings keys that hold naming templates. Perspective-scoped overrides of
/// these (`<key>_<perspective>`) are compiled too.
const TEMPLATE_KEYS: &[&str] = &[
    "sid_template",
    "rendering_template",
    "preview_template",
    "batch_template",
];

/// A pipeline's settings, flattened and parsed for the hot paths.
#[derive(Debug, Clone)]
pub struct CompiledSettings {
    pub settings: PipelineSettings,
    pub collection: String,
    view: BTreeMap<String, String>,
    templates: BTreeMap<String, Template>,
    task_templates: BTreeMap<String, Vec<Template>>,
    skip_rules: Vec<CompiledSkipRule>,
}

#[derive(Debug, Clone)]
struct CompiledSkipRule {
    rule: SkipRule,
    regex: Option<Regex>,
}

impl CompiledSettings {
    /// Flatten, parse, and validate one pipeline's settings.
    pub fn compile(settings: PipelineSettings) -> Result<Self> {
        let collection = settings.collection();
        if collection.is_empty() {
            anyhow::bail!("pipeline has an empty name");
        }
        if settings.base_priority > 100 {
            anyhow::bail!(
                "pipeline '{}': base_priority {} exceeds the farm range 0-100",
                settings.name,
                settings.base_priority
            );
        }
        for perspective in &settings.perspectives {
            if perspective.trim().is_empty() {
                anyhow::bail!(
                    "pipeline '{}': perspective codes must be non-empty",
                    settings.name
                );
            }
        }

        let view = settings_view(&settings, &collection);

        // Parse every template-bearing view key strictly
        let mut templates = BTreeMap::new();
        for (key, value) in &view {
            if !is_template_key(key) || value.is_empty() {
                continue;
            }
            let template = Template::parse(value).with_context(|| {
                format!("pipeline '{}': invalid template '{}'", settings.name, key)
            })?;
            templates.insert(key.clone(), template);
        }

        let mut task_templates = BTreeMap::new();
        for task in &settings.custom_tasks {
            let mut parsed = Vec::with_capacity(task.output_filenames.len());
            for raw in &task.output_filenames {
                let template = Template::parse(raw).with_context(|| {
                    format!(
                        "pipeline '{}': custom task '{}' has an invalid output template",
                        settings.name, task.name
                    )
                })?;
                parsed.push(template);
            }
            task_templates.insert(task.name.clone(), parsed);
        }

        let mut skip_rules = Vec::with_capacity(settings.skip_rules.len());
        for rule in &settings.skip_rules {
            let regex = match rule.op {
                SkipOp::Matches => Some(Regex::new(&rule.value).with_context(|| {
                    format!(
                        "pipeline '{}': invalid skip rule regex for column '{}'",
                        settings.name, rule.column
                    )
                })?),
                _ => None,
            };
            skip_rules.push(CompiledSkipRule {
                rule: rule.clone(),
                regex,
            });
        }

        Ok(Self {
            settings,
            collection,
            view,
            templates,
            task_templates,
            skip_rules,
        })
    }

    /// The flattened key -> value view templates render against.
    pub fn view(&self) -> &BTreeMap<String, String> {
        &self.view
    }

    /// Look up a compiled template by base key, preferring the
    /// perspective-scoped variant when one exists.
    ///
    /// Returns `None` when neither variant carries a usable template, which
    /// callers treat as "fall back to the document identity".
    pub fn template_for(&self, base: &str, perspective: &str) -> Option<&Template> {
        if !perspective.is_empty() {
            let scoped = format!("{}_{}", base, perspective);
            if let Some(template) = self.templates.get(&scoped) {
                if !template.is_empty() {
                    return Some(template);
                }
            }
        }
        self.templates.get(base).filter(|t| !t.is_empty())
    }

    /// Compiled output filename templates of a custom task.
    pub fn task_templates(&self, task_name: &str) -> &[Template] {
        self.task_templates
            .get(task_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check a raw row against the configured skip predicates.
    ///
    /// Returns a description of the first matching rule, `None` when the row
    /// should be processed.
    pub fn matches_skip_rule(&self, fields: &FieldMap) -> Option<String> {
        for compiled in &self.skip_rules {
            let rule = &compiled.rule;
            let value = fields
                .get(&rule.column)
                .and_then(|v| v.as_deref())
                .unwrap_or("");

            let hit = match rule.op {
                SkipOp::Equals => value.eq_ignore_ascii_case(&rule.value),
                SkipOp::Contains => value
                    .to_lowercase()
                    .contains(&rule.value.to_lowercase()),
                SkipOp::Matches => compiled
                    .regex
                    .as_ref()
                    .map(|re| re.is_match(value))
                    .unwrap_or(false),
                SkipOp::IsEmpty => value.trim().is_empty(),
            };

            if hit {
                return Some(format!("{} {:?} '{}'", rule.column, rule.op, rule.value));
            }
        }
        None
    }
}

fn is_template_key(key: &str) -> bool {
    TEMPLATE_KEYS
        .iter()
        .any(|base| key == *base || key.starts_with(&format!("{}_", base)))
}

/// Flatten typed settings into the ordered string view.
///
/// `extra` keys go in first so the typed fields stay authoritative;
/// perspective overrides land as `<key>_<perspective>`.
fn settings_view(settings: &PipelineSettings, collection: &str) -> BTreeMap<String, String> {
    let mut view = BTreeMap::new();

    for (key, value) in &settings.extra {
        view.insert(key.clone(), value.clone());
    }

    view.insert("name".to_string(), settings.name.clone());
    view.insert("collection".to_string(), collection.to_string());
    view.insert("kind".to_string(), settings.kind.to_string());
    view.insert(
        "output_root".to_string(),
        settings.output_root.display().to_string(),
    );
    view.insert(
        "scene_folder".to_string(),
        settings.scene_dir().display().to_string(),
    );
    view.insert(
        "preview_folder".to_string(),
        settings.preview_dir().display().to_string(),
    );
    view.insert(
        "delivery_folder".to_string(),
        settings.delivery_dir().display().to_string(),
    );
    view.insert("pool".to_string(), settings.pool.clone());
    view.insert(
        "base_priority".to_string(),
        settings.base_priority.to_string(),
    );
    view.insert(
        "initial_status".to_string(),
        settings.initial_status.clone(),
    );
    view.insert(
        "render_extensions".to_string(),
        settings.render_extensions.join(","),
    );
    view.insert(
        "preview_extension".to_string(),
        settings.preview_extension.clone(),
    );
    if let Some(ref secondary) = settings.secondary_pool {
        view.insert("secondary_pool".to_string(), secondary.clone());
    }
    if let Some(ref group) = settings.group {
        view.insert("group".to_string(), group.clone());
    }
    if let Some(timeout) = settings.task_timeout_minutes {
        view.insert("task_timeout_minutes".to_string(), timeout.to_string());
    }
    if let Some(ref template) = settings.sid_template {
        view.insert("sid_template".to_string(), template.clone());
    }
    if let Some(ref template) = settings.rendering_template {
        view.insert("rendering_template".to_string(), template.clone());
    }
    if let Some(ref template) = settings.preview_template {
        view.insert("preview_template".to_string(), template.clone());
    }
    if let Some(ref template) = settings.batch_template {
        view.insert("batch_template".to_string(), template.clone());
    }

    for (perspective, overrides) in &settings.perspective_overrides {
        for (key, value) in overrides {
            view.insert(format!("{}_{}", key, perspective), value.clone());
        }
    }

    view
}
