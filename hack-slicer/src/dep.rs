//! Dependency-graph nodes and their classification.
//!
//! A `Dep` identifies one element of the program's dependency graph, either
//! globally (a whole class, a function, a constant) or bound to an owning
//! class (a member, a constructor, the member/extends drivers). Nodes carry
//! string names; the decl provider is the authority for what they resolve
//! to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One element of the dependency graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dep {
    // Global nodes, identified by a fully qualified name.
    Class(String),
    Fun(String),
    FunName(String),
    GConst(String),
    GConstName(String),
    RecordDef(String),
    // Class-bound nodes carrying their owning class.
    Method { class: String, name: String },
    SMethod { class: String, name: String },
    Prop { class: String, name: String },
    SProp { class: String, name: String },
    Const { class: String, name: String },
    Cstr(String),
    AllMembers(String),
    Extends(String),
}

impl Dep {
    /// True for every variant that carries an owning class.
    pub fn is_class_bound(&self) -> bool {
        self.owner().is_some()
    }

    /// True iff the node concerns a class: every class-bound variant plus
    /// `Class` itself.
    pub fn is_class_dependency(&self) -> bool {
        matches!(self, Dep::Class(_)) || self.is_class_bound()
    }

    /// The owning class of a class-bound node, if any.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Dep::Method { class, .. }
            | Dep::SMethod { class, .. }
            | Dep::Prop { class, .. }
            | Dep::SProp { class, .. }
            | Dep::Const { class, .. } => Some(class),
            Dep::Cstr(class) | Dep::AllMembers(class) | Dep::Extends(class) => Some(class),
            _ => None,
        }
    }

    /// The owning class of a class-bound node. Calling this on a global
    /// node is a bug in the closure.
    pub fn owner_class(&self) -> Result<&str> {
        self.owner()
            .ok_or_else(|| Error::unexpected(format!("owner class of global node {self}")))
    }

    /// The fully qualified name of a global node. Calling this on a
    /// class-bound node is a bug in the closure.
    pub fn global_name(&self) -> Result<&str> {
        match self {
            Dep::Class(n)
            | Dep::Fun(n)
            | Dep::FunName(n)
            | Dep::GConst(n)
            | Dep::GConstName(n)
            | Dep::RecordDef(n) => Ok(n),
            _ => Err(Error::unexpected(format!("global name of member node {self}"))),
        }
    }

    /// The member name of a member-bound node, if any.
    pub fn member_name(&self) -> Option<&str> {
        match self {
            Dep::Method { name, .. }
            | Dep::SMethod { name, .. }
            | Dep::Prop { name, .. }
            | Dep::SProp { name, .. }
            | Dep::Const { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dep::Class(n) | Dep::Fun(n) | Dep::FunName(n) | Dep::GConst(n)
            | Dep::GConstName(n) | Dep::RecordDef(n) => write!(f, "{n}"),
            Dep::Method { class, name } | Dep::SMethod { class, name }
            | Dep::Const { class, name } => write!(f, "{class}::{name}"),
            Dep::Prop { class, name } | Dep::SProp { class, name } => {
                write!(f, "{class}::${name}")
            }
            Dep::Cstr(class) => write!(f, "{class}::__construct"),
            Dep::AllMembers(class) => write!(f, "{class}::*"),
            Dep::Extends(class) => write!(f, "extends {class}"),
        }
    }
}

/// A member selector inside an entry-point request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Method(String),
    /// Recognized during parsing so it can be rejected as unsupported
    /// rather than malformed-at-a-distance.
    Property(String),
}

/// What the user asked to extract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryPoint {
    Function(String),
    Member(String, MemberKind),
}

impl EntryPoint {
    /// Parses `\Ns\fun` or `\Ns\Cls::meth`. Names are normalized to carry a
    /// leading backslash.
    pub fn parse(request: &str) -> Result<EntryPoint> {
        let request = request.trim();
        if request.is_empty() || request.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput);
        }
        match request.split_once("::") {
            None => Ok(EntryPoint::Function(qualify(request)?)),
            Some((class, member)) => {
                if member.contains("::") {
                    return Err(Error::InvalidInput);
                }
                let class = qualify(class)?;
                let kind = match member.strip_prefix('$') {
                    Some(prop) if !prop.is_empty() => MemberKind::Property(prop.to_string()),
                    Some(_) => return Err(Error::InvalidInput),
                    None if !member.is_empty() => MemberKind::Method(member.to_string()),
                    None => return Err(Error::InvalidInput),
                };
                Ok(EntryPoint::Member(class, kind))
            }
        }
    }

    /// The graph nodes that denote the entry point itself. These are
    /// removed from the collected set; the literal body is inlined instead.
    pub fn own_nodes(&self) -> Vec<Dep> {
        match self {
            EntryPoint::Function(f) => {
                vec![Dep::Fun(f.clone()), Dep::FunName(f.clone())]
            }
            EntryPoint::Member(class, MemberKind::Method(m)) => vec![
                Dep::Method { class: class.clone(), name: m.clone() },
                Dep::SMethod { class: class.clone(), name: m.clone() },
            ],
            EntryPoint::Member(..) => Vec::new(),
        }
    }
}

fn qualify(name: &str) -> Result<String> {
    let bare = name.trim_start_matches('\\');
    if bare.is_empty() || bare.split('\\').any(str::is_empty) {
        return Err(Error::InvalidInput);
    }
    Ok(format!("\\{bare}"))
}

/// Filter applied when the type-checker reports an edge `source → target`:
/// does the edge originate at the entry point?
///
/// Edges for a method entry are recorded at class granularity, so any
/// class-bound source on the owning class is accepted.
pub fn is_relevant(entry: &EntryPoint, source: &Dep) -> bool {
    match entry {
        EntryPoint::Function(f) => {
            matches!(source, Dep::Fun(n) | Dep::FunName(n) if n == f)
        }
        EntryPoint::Member(class, MemberKind::Method(_)) => {
            source.owner() == Some(class.as_str())
        }
        EntryPoint::Member(_, MemberKind::Property(_)) => false,
    }
}
