//! Namespace layout and final emission.
//!
//! Top-level declarations and namespaced declarations cannot share a file in
//! the host language, so the table is split into two: a top-level file
//! (header, `default_factory` helper, root declarations) and a namespaced
//! file of recursive `namespace { … }` blocks. Both are formatted
//! best-effort and joined with multi-file markers when both have content.

use std::collections::BTreeMap;

use tracing::{info, trace, warn};

use crate::names;
use crate::provider::Formatter;
use crate::synth::DeclTable;

#[derive(Debug, Default)]
struct NsTree {
    subnamespaces: BTreeMap<String, NsTree>,
    decls: Vec<String>,
}

impl NsTree {
    fn descend(&mut self, path: &[&str]) -> &mut NsTree {
        let mut node = self;
        for seg in path {
            node = node.subnamespaces.entry((*seg).to_string()).or_default();
        }
        node
    }

    fn is_empty(&self) -> bool {
        self.subnamespaces.is_empty() && self.decls.is_empty()
    }

    fn render(&self, out: &mut String) {
        for decl in &self.decls {
            out.push_str(decl);
            out.push('\n');
        }
        for (name, sub) in &self.subnamespaces {
            out.push_str(&format!("namespace {name} {{\n"));
            sub.render(out);
            out.push_str("}\n");
        }
    }
}

/// The one helper every generated file may reference: an initializer of any
/// declared type, by virtue of never returning.
fn default_factory_decl() -> String {
    format!(
        "function {}(): nothing {{ throw new \\Exception(); }}",
        names::DEFAULT_FACTORY
    )
}

/// Lays the declaration table out into source text.
pub fn emit(formatter: &dyn Formatter, table: &DeclTable) -> String {
    let mut toplevel: Vec<String> = vec![default_factory_decl()];
    let mut root = NsTree::default();

    for (name, texts) in table {
        let segs = names::segments(name);
        // Builtins were filtered during collection; the check is retained
        // defensively.
        if segs.first() == Some(&names::BUILTIN_ROOT) {
            trace!(name = %name, "dropping builtin-rooted declaration");
            continue;
        }
        match segs.split_last() {
            None => continue,
            Some((_, [])) => toplevel.extend(texts.iter().cloned()),
            Some((_, path)) => {
                root.descend(path).decls.extend(texts.iter().cloned());
            }
        }
    }

    let toplevel_text = format!("{}\n{}", names::FILE_HEADER, toplevel.join("\n"));
    let toplevel_text = format_or_raw(formatter, toplevel_text);

    if root.is_empty() {
        info!(bytes = toplevel_text.len(), "emitted single file");
        return toplevel_text;
    }

    let mut ns_body = String::new();
    root.render(&mut ns_body);
    let ns_text = format!("{}\n{}", names::FILE_HEADER, ns_body);
    let ns_text = format_or_raw(formatter, ns_text);

    info!(
        toplevel_bytes = toplevel_text.len(),
        namespaced_bytes = ns_text.len(),
        "emitted multi-file output"
    );
    format!(
        "{}\n{}\n{}\n{}",
        names::TOPLEVEL_MARKER,
        toplevel_text,
        names::NAMESPACES_MARKER,
        ns_text
    )
}

fn format_or_raw(formatter: &dyn Formatter, text: String) -> String {
    match formatter.format(&text) {
        Ok(formatted) => formatted,
        Err(err) => {
            warn!(error = %err, "formatter failed, using raw text");
            text
        }
    }
}
