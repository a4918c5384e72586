//! Stub synthesis — one textual declaration per collected dependency.
//!
//! Types are preserved exactly as the printer renders them; bodies become
//! `throw new \Exception();`, value positions become synthesized defaults.
//! The entry point is never stubbed: its literal source text is inlined, at
//! the top level for functions or inside the owning class for methods.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::collect::CollectedDeps;
use crate::dep::{Dep, EntryPoint, MemberKind};
use crate::error::{Error, Result};
use crate::init::initial_value;
use crate::names;
use crate::provider::Services;
use crate::ty::{Ancestor, ClassDecl, ClassKind, FunTy, MethodDecl, PropDecl, Ty};

/// Fully qualified name → synthesized declaration texts. A key can carry
/// several entries (a class stub and an inlined entry body, say); layout
/// keeps them all.
pub type DeclTable = BTreeMap<String, Vec<String>>;

/// Synthesizes every collected dependency into declaration text.
pub fn synthesize(
    services: Services<'_>,
    entry: &EntryPoint,
    collected: &CollectedDeps,
) -> Result<DeclTable> {
    let synth = Synthesizer { services, entry };
    let mut table = DeclTable::new();

    for dep in &collected.globals {
        let (name, text) = match dep {
            Dep::Fun(name) => (name, synth.make_fun(name)?),
            Dep::GConst(name) => (name, synth.make_gconst(name)?),
            Dep::Class(name) => (name, synth.make_typedef(name)?),
            other => {
                return Err(Error::unexpected(format!("global node {other} in synthesis")));
            }
        };
        debug!(name = %name, "synthesized global");
        table.entry(name.clone()).or_default().push(text);
    }

    for (name, members) in &collected.types {
        let text = synth.make_class(name, members)?;
        debug!(name = %name, members = members.len(), "synthesized type");
        table.entry(name.clone()).or_default().push(text);
    }

    if let EntryPoint::Function(name) = entry {
        table.entry(name.clone()).or_default().push(synth.entry_fun_text(name)?);
    }

    Ok(table)
}

struct Synthesizer<'a> {
    services: Services<'a>,
    entry: &'a EntryPoint,
}

impl<'a> Synthesizer<'a> {
    fn print(&self, ty: &Ty) -> String {
        self.services.printer.full_decl(ty)
    }

    fn class_decl(&self, name: &str) -> Result<&'a ClassDecl> {
        self.services
            .decls
            .get_class(name)
            .ok_or_else(|| Error::DependencyNotFound(name.to_string()))
    }

    // ----------------------------------------------------------------
    // Globals
    // ----------------------------------------------------------------

    fn entry_fun_text(&self, name: &str) -> Result<String> {
        let decl = self.services.decls.get_fun(name).ok_or(Error::NotFound)?;
        self.services
            .source
            .text_at(&decl.pos)
            .ok_or_else(|| Error::DependencyNotFound(format!("source of {name}")))
    }

    fn make_fun(&self, name: &str) -> Result<String> {
        let decl = self
            .services
            .decls
            .get_fun(name)
            .ok_or_else(|| Error::DependencyNotFound(name.to_string()))?;
        Ok(format!(
            "function {}{}({}){} {{ throw new \\Exception(); }}",
            names::strip_ns(name),
            tparam_list(&decl.ty.tparams),
            self.param_list(&decl.ty),
            self.ret_annotation(&decl.ty.ret),
        ))
    }

    fn make_gconst(&self, name: &str) -> Result<String> {
        let decl = self
            .services
            .decls
            .get_gconst(name)
            .ok_or_else(|| Error::DependencyNotFound(name.to_string()))?;
        Ok(format!(
            "const {} {} = {};",
            self.print(&decl.ty),
            names::strip_ns(name),
            initial_value(self.services.decls, &decl.ty)?,
        ))
    }

    fn make_typedef(&self, name: &str) -> Result<String> {
        let decl = self
            .services
            .decls
            .get_typedef(name)
            .ok_or_else(|| Error::DependencyNotFound(name.to_string()))?;
        let keyword = if decl.transparent { "type" } else { "newtype" };
        Ok(format!(
            "{keyword} {}{} = {};",
            names::strip_ns(name),
            tparam_list(&decl.tparams),
            self.print(&decl.ty),
        ))
    }

    // ----------------------------------------------------------------
    // Classes
    // ----------------------------------------------------------------

    fn make_class(&self, name: &str, members: &BTreeSet<Dep>) -> Result<String> {
        let cls = self.class_decl(name)?;
        if cls.is_enum() {
            return self.make_enum(name, cls, members);
        }

        let groups = self.partition_ancestors(cls)?;
        let mut header = format!(
            "{} {}{}",
            kind_keyword(cls.kind),
            names::strip_ns(name),
            tparam_list(&cls.tparams),
        );
        if !groups.extends.is_empty() {
            header.push_str(&format!(" extends {}", groups.extends.join(", ")));
        }
        if !groups.implements.is_empty() {
            header.push_str(&format!(" implements {}", groups.implements.join(", ")));
        }

        let mut body: Vec<String> = Vec::new();
        for r in &groups.req_extends {
            body.push(format!("require extends {r};"));
        }
        for r in &groups.req_implements {
            body.push(format!("require implements {r};"));
        }
        for u in &groups.uses {
            body.push(format!("use {u};"));
        }

        for dep in members {
            match dep {
                Dep::Const { name: member, .. } => {
                    body.push(self.make_class_const(name, cls, member)?);
                }
                Dep::Prop { name: member, .. } => {
                    let prop = cls.prop(member).ok_or_else(|| {
                        Error::DependencyNotFound(format!("{name}::${member}"))
                    })?;
                    body.push(self.make_prop(prop, false)?);
                }
                Dep::SProp { name: member, .. } => {
                    let prop = cls.sprop(member).ok_or_else(|| {
                        Error::DependencyNotFound(format!("{name}::${member}"))
                    })?;
                    body.push(self.make_prop(prop, true)?);
                }
                Dep::Method { name: member, .. } => {
                    let method = cls.method(member).ok_or_else(|| {
                        Error::DependencyNotFound(format!("{name}::{member}"))
                    })?;
                    body.push(self.make_method(cls, method, false));
                }
                Dep::SMethod { name: member, .. } => {
                    let method = cls.smethod(member).ok_or_else(|| {
                        Error::DependencyNotFound(format!("{name}::{member}"))
                    })?;
                    body.push(self.make_method(cls, method, true));
                }
                Dep::Cstr(_) => {} // handled below, together with properties
                other => {
                    return Err(Error::unexpected(format!(
                        "member node {other} grouped under {name}"
                    )));
                }
            }
        }

        if let Some(ctor) = self.make_constructor(cls, members)? {
            body.push(ctor);
        }

        if let EntryPoint::Member(class, MemberKind::Method(method)) = self.entry
            && class.as_str() == name
        {
            body.push(self.entry_method_text(name, cls, method)?);
        }

        if body.is_empty() {
            Ok(format!("{header} {{}}"))
        } else {
            Ok(format!("{header} {{\n{}\n}}", body.join("\n")))
        }
    }

    fn entry_method_text(&self, name: &str, cls: &ClassDecl, method: &str) -> Result<String> {
        let decl = cls
            .method(method)
            .or_else(|| cls.smethod(method))
            .ok_or(Error::NotFound)?;
        let pos = decl
            .pos
            .as_ref()
            .ok_or_else(|| Error::DependencyNotFound(format!("source of {name}::{method}")))?;
        self.services
            .source
            .text_at(pos)
            .ok_or_else(|| Error::DependencyNotFound(format!("source of {name}::{method}")))
    }

    fn make_enum(&self, name: &str, cls: &ClassDecl, members: &BTreeSet<Dep>) -> Result<String> {
        let enum_ty = cls
            .enum_ty
            .as_ref()
            .ok_or_else(|| Error::unsupported(format!("enum {name} without a base type")))?;
        let mut header = format!(
            "enum {}: {}",
            names::strip_ns(name),
            self.print(&enum_ty.base)
        );
        if let Some(constraint) = &enum_ty.constraint {
            header.push_str(&format!(" as {}", self.print(constraint)));
        }

        // Entries use the base type's default, not the enum type.
        let mut entries: Vec<String> = Vec::new();
        for dep in members {
            if let Dep::Const { name: member, .. } = dep
                && member.as_str() != names::CLASS_CONST
            {
                entries.push(format!(
                    "{member} = {};",
                    initial_value(self.services.decls, &enum_ty.base)?
                ));
            }
        }

        if entries.is_empty() {
            Ok(format!("{header} {{}}"))
        } else {
            Ok(format!("{header} {{\n{}\n}}", entries.join("\n")))
        }
    }

    // ----------------------------------------------------------------
    // Members
    // ----------------------------------------------------------------

    fn make_class_const(&self, class: &str, cls: &ClassDecl, member: &str) -> Result<String> {
        if let Some(tc) = cls.typeconst(member) {
            let mut text = String::new();
            if tc.is_abstract {
                text.push_str("abstract ");
            }
            text.push_str(&format!("const type {member}"));
            if let Some(constraint) = &tc.constraint {
                text.push_str(&format!(" as {}", self.print(constraint)));
            }
            if let Some(ty) = &tc.ty {
                text.push_str(&format!(" = {}", self.print(ty)));
            }
            text.push(';');
            return Ok(text);
        }

        let decl = cls
            .const_(member)
            .ok_or_else(|| Error::DependencyNotFound(format!("{class}::{member}")))?;
        if decl.is_abstract {
            Ok(format!("abstract const {} {member};", self.print(&decl.ty)))
        } else {
            Ok(format!(
                "const {} {member} = {};",
                self.print(&decl.ty),
                initial_value(self.services.decls, &decl.ty)?
            ))
        }
    }

    fn make_prop(&self, prop: &PropDecl, is_static: bool) -> Result<String> {
        let mut text = format!("{} ", prop.visibility.keyword());
        if is_static {
            text.push_str("static ");
        }
        if prop.ty != Ty::Any {
            text.push_str(&format!("{} ", self.print(&prop.ty)));
        }
        text.push_str(&format!("${}", prop.name));
        // Only static, non-abstract properties carry an initializer; the
        // constructor covers instance properties.
        if is_static && !prop.is_abstract {
            text.push_str(&format!(" = {}", initial_value(self.services.decls, &prop.ty)?));
        }
        text.push(';');
        Ok(text)
    }

    fn make_method(&self, cls: &ClassDecl, method: &MethodDecl, is_static: bool) -> String {
        let mut text = String::new();
        // Interface members are implicitly abstract.
        if method.is_abstract && !cls.is_interface() {
            text.push_str("abstract ");
        }
        text.push_str(method.visibility.keyword());
        text.push(' ');
        if is_static {
            text.push_str("static ");
        }
        text.push_str(&format!(
            "function {}{}({}){}",
            method.name,
            tparam_list(&method.ty.tparams),
            self.param_list(&method.ty),
            self.ret_annotation(&method.ty.ret),
        ));
        if method.is_abstract || cls.is_interface() {
            text.push(';');
        } else {
            text.push_str(" { throw new \\Exception(); }");
        }
        text
    }

    /// A constructor is emitted when the dependency set contains the
    /// constructor itself or any instance property of the class; collected
    /// properties are assigned through the `default_factory` helper.
    fn make_constructor(&self, cls: &ClassDecl, members: &BTreeSet<Dep>) -> Result<Option<String>> {
        let prop_names: Vec<&str> = members
            .iter()
            .filter_map(|d| match d {
                Dep::Prop { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        let has_cstr = members.iter().any(|d| matches!(d, Dep::Cstr(_)));
        if prop_names.is_empty() && !has_cstr {
            return Ok(None);
        }

        let assignments: Vec<String> = prop_names
            .iter()
            .map(|p| format!("$this->{p} = {}();", names::DEFAULT_FACTORY))
            .collect();
        let body = if assignments.is_empty() {
            " { throw new \\Exception(); }".to_string()
        } else {
            format!(" {{\n{}\n}}", assignments.join("\n"))
        };

        let text = match &cls.constructor {
            Some(ctor) => format!(
                "{} function __construct({}){body}",
                ctor.visibility.keyword(),
                self.param_list(&ctor.ty),
            ),
            None => format!("public function __construct(){body}"),
        };
        Ok(Some(text))
    }

    // ----------------------------------------------------------------
    // Signatures
    // ----------------------------------------------------------------

    fn param_list(&self, ft: &FunTy) -> String {
        let mut parts: Vec<String> = Vec::new();
        for (i, p) in ft.params.iter().enumerate() {
            let mut s = String::new();
            if p.inout {
                s.push_str("inout ");
            }
            if p.ty != Ty::Any {
                s.push_str(&format!("{} ", self.print(&p.ty)));
            }
            s.push_str(&format!("${}", p.name));
            if i >= ft.required_arity() {
                s.push_str(&format!(" = {}()", names::DEFAULT_FACTORY));
            }
            parts.push(s);
        }
        if let Some(v) = &ft.variadic {
            parts.push(format!("{} ...${}", self.print(&v.ty), v.name));
        }
        parts.join(", ")
    }

    fn ret_annotation(&self, ret: &Ty) -> String {
        if *ret == Ty::Any {
            String::new()
        } else {
            format!(": {}", self.print(ret))
        }
    }

    // ----------------------------------------------------------------
    // Ancestors
    // ----------------------------------------------------------------

    fn partition_ancestors(&self, cls: &ClassDecl) -> Result<AncestorGroups> {
        let mut groups = AncestorGroups::default();
        for a in self.direct_of(&cls.ancestors) {
            let printed = self.print(&a.ty);
            match self.ancestor_kind(&a.name)? {
                ClassKind::Trait => groups.uses.push(printed),
                ClassKind::Interface if !cls.is_interface() => groups.implements.push(printed),
                _ => groups.extends.push(printed),
            }
        }
        for r in self.direct_of(&cls.req_extends) {
            groups.req_extends.push(self.print(&r.ty));
        }
        for r in self.direct_of(&cls.req_implements) {
            groups.req_implements.push(self.print(&r.ty));
        }
        Ok(groups)
    }

    /// Transitive reduction: an ancestor already reachable through another
    /// ancestor is not a direct one.
    fn direct_of<'x>(&self, ancestors: &'x [Ancestor]) -> Vec<&'x Ancestor> {
        let mut indirect: BTreeSet<&str> = BTreeSet::new();
        for a in ancestors {
            if let Some(decl) = self.services.decls.get_class(&a.name) {
                for b in &decl.ancestors {
                    indirect.insert(b.name.as_str());
                }
            }
        }
        ancestors
            .iter()
            .filter(|a| !indirect.contains(a.name.as_str()))
            .collect()
    }

    fn ancestor_kind(&self, name: &str) -> Result<ClassKind> {
        Ok(self.class_decl(name)?.kind)
    }
}

#[derive(Debug, Default)]
struct AncestorGroups {
    extends: Vec<String>,
    implements: Vec<String>,
    uses: Vec<String>,
    req_extends: Vec<String>,
    req_implements: Vec<String>,
}

fn kind_keyword(kind: ClassKind) -> &'static str {
    match kind {
        ClassKind::Class => "class",
        ClassKind::AbstractClass => "abstract class",
        ClassKind::Interface => "interface",
        ClassKind::Trait => "trait",
        ClassKind::Enum => "enum",
    }
}

fn tparam_list(tparams: &[String]) -> String {
    if tparams.is_empty() {
        String::new()
    } else {
        format!("<{}>", tparams.join(", "))
    }
}
