//! # farmline-template
//!
//! Naming-template engine for farmline. A template is a string mixing literal
//! text with `[key]` placeholders; rendering evaluates the placeholders
//! against a key→value view and never fails: a key the view does not know
//! renders as the empty string.
//!
//! Templates are parsed up front into literal/placeholder nodes. The strict
//! parser supports `[[` / `]]` escapes and rejects malformed bracket nesting,
//! which lets configuration loading surface template typos early. The lenient
//! parser reproduces the historical scanner behavior where an unterminated
//! `[` captures to the end of the string.
//!
//! ## Quick start
//!
//! ```
//! use farmline_template::Template;
//! use std::collections::BTreeMap;
//!
//! let template = Template::parse("[shot]_v[version]").unwrap();
//!
//! let mut view = BTreeMap::new();
//! view.insert("shot".to_string(), "sh010".to_string());
//! view.insert("version".to_string(), "003".to_string());
//!
//! assert_eq!(template.render(&view), "sh010_v003");
//! ```

mod ast;
mod fold;
mod scan;

pub use ast::TemplateView;
pub use fold::fold_german;
pub use scan::TemplateError;

use ast::Node;

/// A parsed naming template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse a template strictly.
    ///
    /// `[[` and `]]` escape literal brackets; an unterminated placeholder or
    /// a stray `]` is an error. Use this for templates coming out of
    /// persisted configuration so mistakes are caught at load time.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            source: source.to_string(),
            nodes: scan::scan(source, scan::Mode::Strict)?,
        })
    }

    /// Parse a template leniently.
    ///
    /// No escaping: every `[` opens a placeholder that captures everything up
    /// to the next `]`, or to the end of the string when no `]` follows. A
    /// `]` outside a placeholder is literal text. This mirrors the historical
    /// character scanner and cannot fail.
    pub fn parse_lenient(source: &str) -> Self {
        let nodes = scan::scan(source, scan::Mode::Lenient)
            .expect("lenient template scan is infallible");
        Self {
            source: source.to_string(),
            nodes,
        }
    }

    /// The original template string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the template has no content at all.
    ///
    /// Callers treat an empty template as "not configured" and fall back to
    /// their own default (typically the document identity), never to the
    /// empty string a render would produce.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render the template against a view.
    ///
    /// Placeholders the view cannot resolve become empty strings; rendering
    /// never fails.
    pub fn render(&self, view: &dyn TemplateView) -> String {
        let mut out = String::with_capacity(self.source.len());
        for node in &self.nodes {
            match node {
                Node::Literal(text) => out.push_str(text),
                Node::Placeholder(key) => {
                    if let Some(value) = view.lookup(key) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }

    /// Render the template and fold German special characters
    /// (ö→oe, ß→ss, …) in the result.
    pub fn render_folded(&self, view: &dyn TemplateView) -> String {
        fold_german(&self.render(view))
    }
}
