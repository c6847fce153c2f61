//! Perspective-scoped settings lookup.

use farmline_template::TemplateView;

/// Resolve a settings key for a perspective.
///
/// A non-empty perspective first tries `<base>_<perspective>`; a present,
/// non-empty scoped value wins. Otherwise the base key answers. Empty values
/// read as absent so a blank override cannot mask the base setting.
pub fn resolve<'a>(view: &'a dyn TemplateView, base: &str, perspective: &str) -> Option<&'a str> {
    if !perspective.is_empty() {
        let scoped = format!("{}_{}", base, perspective);
        if let Some(value) = view.lookup(&scoped) {
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    view.lookup(base).filter(|value| !value.is_empty())
}
