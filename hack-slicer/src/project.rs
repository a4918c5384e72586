//! In-memory project database.
//!
//! A `Program` is a JSON-serializable description of a Hack project: source
//! files, declarations, and the dependency edges the type-checker would
//! record while checking each declaration. `ProgramDb` indexes one and
//! implements every collaborator trait, which makes it the backing store
//! for the CLI and the integration tests. Its checker replays the recorded
//! edges; the real type-checker stays out of scope.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::dep::Dep;
use crate::printer::DisplayPrinter;
use crate::provider::{DeclProvider, Formatter, Services, SourceReader, TypeChecker};
use crate::ty::{ClassDecl, FunDecl, GConstDecl, TypedefDecl};

/// One recorded edge of a class check: the class-bound source member and
/// the dependency it touches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassEdge {
    pub source: Dep,
    pub target: Dep,
}

/// A whole project, ready to be serialized to or from JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Program {
    /// Path → full source text.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub typedefs: Vec<TypedefDecl>,
    #[serde(default)]
    pub funs: Vec<FunDecl>,
    #[serde(default)]
    pub gconsts: Vec<GConstDecl>,
    /// Edges recorded while checking a function, keyed by function name.
    #[serde(default)]
    pub fun_edges: BTreeMap<String, Vec<Dep>>,
    /// Edges recorded while checking a whole class, keyed by class name.
    #[serde(default)]
    pub class_edges: BTreeMap<String, Vec<ClassEdge>>,
}

/// An indexed `Program` implementing the collaborator traits.
pub struct ProgramDb {
    program: Program,
    classes: BTreeMap<String, usize>,
    typedefs: BTreeMap<String, usize>,
    funs: BTreeMap<String, usize>,
    gconsts: BTreeMap<String, usize>,
}

impl ProgramDb {
    pub fn new(program: Program) -> Self {
        let classes =
            program.classes.iter().enumerate().map(|(i, c)| (c.name.clone(), i)).collect();
        let typedefs =
            program.typedefs.iter().enumerate().map(|(i, t)| (t.name.clone(), i)).collect();
        let funs = program.funs.iter().enumerate().map(|(i, f)| (f.name.clone(), i)).collect();
        let gconsts =
            program.gconsts.iter().enumerate().map(|(i, c)| (c.name.clone(), i)).collect();
        ProgramDb { program, classes, typedefs, funs, gconsts }
    }

    /// Loads a JSON program description from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read program file {}", path.display()))?;
        let program: Program = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse program file {}", path.display()))?;
        Ok(ProgramDb::new(program))
    }

    /// The collaborator bundle backed by this database.
    pub fn services(&self) -> Services<'_> {
        Services {
            decls: self,
            checker: self,
            source: self,
            printer: &DisplayPrinter,
            formatter: self,
        }
    }
}

impl DeclProvider for ProgramDb {
    fn get_class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.get(name).map(|&i| &self.program.classes[i])
    }

    fn get_typedef(&self, name: &str) -> Option<&TypedefDecl> {
        self.typedefs.get(name).map(|&i| &self.program.typedefs[i])
    }

    fn get_fun(&self, name: &str) -> Option<&FunDecl> {
        self.funs.get(name).map(|&i| &self.program.funs[i])
    }

    fn get_gconst(&self, name: &str) -> Option<&GConstDecl> {
        self.gconsts.get(name).map(|&i| &self.program.gconsts[i])
    }
}

impl TypeChecker for ProgramDb {
    fn type_fun(&self, _file: &str, name: &str, on_edge: &mut dyn FnMut(&Dep, &Dep)) {
        let source = Dep::Fun(name.to_string());
        if let Some(targets) = self.program.fun_edges.get(name) {
            for target in targets {
                on_edge(&source, target);
            }
        }
    }

    fn type_class(&self, _file: &str, name: &str, on_edge: &mut dyn FnMut(&Dep, &Dep)) {
        if let Some(edges) = self.program.class_edges.get(name) {
            for edge in edges {
                on_edge(&edge.source, &edge.target);
            }
        }
    }
}

impl SourceReader for ProgramDb {
    fn read(&self, file: &str) -> Option<String> {
        self.program.files.get(file).cloned()
    }
}

impl Formatter for ProgramDb {
    /// Brace-depth reindentation, enough to keep generated text readable.
    fn format(&self, text: &str) -> anyhow::Result<String> {
        Ok(reindent(text))
    }
}

fn reindent(text: &str) -> String {
    let mut out = String::new();
    let mut depth: usize = 0;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push('\n');
            continue;
        }
        let delta =
            trimmed.matches('{').count() as i32 - trimmed.matches('}').count() as i32;
        let indent = if trimmed.starts_with('}') { depth.saturating_sub(1) } else { depth };
        out.push_str(&"  ".repeat(indent));
        out.push_str(trimmed);
        out.push('\n');
        depth = (depth as i32 + delta).max(0) as usize;
    }
    out
}
