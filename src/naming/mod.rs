//! Name resolution: merged template views, perspective-scoped lookups, and
//! content-derived document identities.

pub mod identity;
pub mod perspective;

use farmline_common::FieldMap;
use farmline_template::TemplateView;
use std::collections::BTreeMap;

use crate::config::CompiledSettings;

/// Template view that layers a document's fields over the pipeline settings
/// view. The document wins; a present-but-blank cell reads as the empty
/// string rather than falling through to the settings value.
pub struct MergedView<'a> {
    fields: &'a FieldMap,
    settings: &'a BTreeMap<String, String>,
}

impl<'a> MergedView<'a> {
    pub fn new(fields: &'a FieldMap, settings: &'a BTreeMap<String, String>) -> Self {
        Self { fields, settings }
    }
}

impl TemplateView for MergedView<'_> {
    fn lookup(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.fields.get(key) {
            return Some(value.as_deref().unwrap_or(""));
        }
        self.settings.get(key).map(String::as_str)
    }
}

/// Resolve the rendering output name of a document.
///
/// Perspective-aware template render with German folding; a missing or
/// empty-rendering template falls back to the sid. Deterministic, so the
/// sync pass and the submitters agree on the name without persisting it.
pub fn rendering_name(compiled: &CompiledSettings, fields: &FieldMap, perspective: &str) -> String {
    resolve_name(compiled, fields, perspective, "rendering_template")
}

/// Resolve the preview name of a document. Same fallback rule as
/// [`rendering_name`].
pub fn preview_name(compiled: &CompiledSettings, fields: &FieldMap, perspective: &str) -> String {
    resolve_name(compiled, fields, perspective, "preview_template")
}

fn resolve_name(
    compiled: &CompiledSettings,
    fields: &FieldMap,
    perspective: &str,
    template_key: &str,
) -> String {
    let view = MergedView::new(fields, compiled.view());
    let rendered = compiled
        .template_for(template_key, perspective)
        .map(|t| t.render_folded(&view))
        .unwrap_or_default();

    if rendered.is_empty() {
        fields
            .get("sid")
            .and_then(|v| v.clone())
            .unwrap_or_default()
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineSettings;
    use farmline_common::PipelineKind;
    use std::path::PathBuf;

    fn compiled(mutate: impl FnOnce(&mut PipelineSettings)) -> CompiledSettings {
        let mut settings = PipelineSettings {
            name: "Spots".to_string(),
            kind: PipelineKind::Max,
            output_root: PathBuf::from("/mnt/spots"),
            ..Default::default()
        };
        mutate(&mut settings);
        CompiledSettings::compile(settings).unwrap()
    }

    fn fields(pairs: &[(&str, Option<&str>)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_merged_view_document_wins() {
        let compiled = compiled(|s| {
            s.extra.insert("client".into(), "acme".into());
        });
        let fields = fields(&[("client", Some("other")), ("Notes", None)]);
        let view = MergedView::new(&fields, compiled.view());

        assert_eq!(view.lookup("client"), Some("other"));
        // Present-but-blank shadows the settings value instead of exposing it
        assert_eq!(view.lookup("Notes"), Some(""));
        assert_eq!(view.lookup("pool"), Some(""));
        assert_eq!(view.lookup("missing"), None);
    }

    #[test]
    fn test_rendering_name_from_template() {
        let compiled = compiled(|s| {
            s.rendering_template = Some("[Name]_beauty".into());
        });
        let fields = fields(&[("Name", Some("sp010")), ("sid", Some("sp010_Spots"))]);

        assert_eq!(rendering_name(&compiled, &fields, ""), "sp010_beauty");
    }

    #[test]
    fn test_rendering_name_folds_german() {
        let compiled = compiled(|s| {
            s.rendering_template = Some("[Name]".into());
        });
        let fields = fields(&[("Name", Some("Tür")), ("sid", Some("x_Spots"))]);

        assert_eq!(rendering_name(&compiled, &fields, ""), "Tuer");
    }

    #[test]
    fn test_rendering_name_falls_back_to_sid() {
        let compiled = compiled(|_| {});
        let fields = fields(&[("sid", Some("ab12_Spots"))]);

        assert_eq!(rendering_name(&compiled, &fields, ""), "ab12_Spots");
    }

    #[test]
    fn test_preview_name_scoped_template() {
        let compiled = compiled(|s| {
            s.preview_template = Some("[Name]_prev".into());
            s.perspective_overrides.insert(
                "top".into(),
                std::collections::BTreeMap::from([(
                    "preview_template".to_string(),
                    "[Name]_top_prev".to_string(),
                )]),
            );
        });
        let fields = fields(&[("Name", Some("sp010")), ("sid", Some("sp010_Spots"))]);

        assert_eq!(preview_name(&compiled, &fields, "top"), "sp010_top_prev");
        assert_eq!(preview_name(&compiled, &fields, ""), "sp010_prev");
    }
}
