//! Pipeline-kind extension hooks.
//!
//! Each pipeline kind gets two interception points in the row processor: one
//! on the raw fields before perspectives fan out, one on the assembled
//! document after the sid is stamped. Rejections skip the row (pre) or the
//! perspective (post) without failing the pass.

use farmline_common::{FieldMap, PipelineKind};
use farmline_db::models::Document;

/// Longest sid the Max scene tooling accepts; scene files get stage suffixes
/// appended and still have to fit a Windows filename component.
const MAX_SCENE_NAME_LIMIT: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    Accept,
    Reject(String),
}

pub trait PipelineHooks: Send + Sync {
    /// Runs on the raw row fields before perspectives fan out.
    fn pre_process(&self, fields: &mut FieldMap) -> HookDecision {
        let _ = fields;
        HookDecision::Accept
    }

    /// Runs on the assembled document after the sid is stamped.
    fn post_process(&self, document: &mut Document) -> HookDecision {
        let _ = document;
        HookDecision::Accept
    }
}

/// Hooks for a pipeline kind.
pub fn hooks_for(kind: PipelineKind) -> Box<dyn PipelineHooks> {
    match kind {
        PipelineKind::Max => Box::new(MaxHooks),
        PipelineKind::Maya => Box::new(MayaHooks),
    }
}

/// 3ds Max: backslash path separators, Windows name length limits.
pub struct MaxHooks;

impl PipelineHooks for MaxHooks {
    fn pre_process(&self, fields: &mut FieldMap) -> HookDecision {
        for (key, value) in fields.iter_mut() {
            if is_path_column(key) {
                if let Some(v) = value {
                    *v = v.replace('/', "\\");
                }
            }
        }
        HookDecision::Accept
    }

    fn post_process(&self, document: &mut Document) -> HookDecision {
        if document.sid.len() > MAX_SCENE_NAME_LIMIT {
            return HookDecision::Reject(format!(
                "sid of {} chars exceeds the Max scene name limit",
                document.sid.len()
            ));
        }
        HookDecision::Accept
    }
}

/// Maya: forward slashes everywhere, even on Windows nodes.
pub struct MayaHooks;

impl PipelineHooks for MayaHooks {
    fn pre_process(&self, fields: &mut FieldMap) -> HookDecision {
        for (key, value) in fields.iter_mut() {
            if is_path_column(key) {
                if let Some(v) = value {
                    *v = v.replace('\\', "/");
                }
            }
        }
        HookDecision::Accept
    }
}

fn is_path_column(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.ends_with("path") || lower.ends_with("folder") || lower.ends_with("dir")
}
