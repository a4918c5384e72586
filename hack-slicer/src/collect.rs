//! Dependency collection.
//!
//! Phase one drives the external type-checker over the entry point and
//! captures every relevant dependency edge. Phase two closes the captured
//! set under signature walks with a worklist (the recursive source idiom,
//! flattened so pathological graphs cannot overflow the stack). The result
//! is grouped into per-class member sets and global nodes, ready for
//! synthesis.

use std::collections::VecDeque;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, trace};

use crate::dep::{Dep, EntryPoint, MemberKind, is_relevant};
use crate::error::{Error, Result};
use crate::names;
use crate::provider::{Services, is_builtin};
use crate::ty::{ClassDecl, FunTy, Ty, origin_or};

/// The closed dependency set, partitioned for synthesis.
#[derive(Debug, Default)]
pub struct CollectedDeps {
    /// Class name → class-bound nodes whose origin is that class.
    pub types: BTreeMap<String, BTreeSet<Dep>>,
    /// Global nodes (functions, constants, typedef references).
    pub globals: BTreeSet<Dep>,
}

/// Collects and closes the dependency set of `entry`.
pub fn collect(services: Services<'_>, entry: &EntryPoint) -> Result<CollectedDeps> {
    let mut collector = Collector {
        services,
        deps: BTreeSet::new(),
        worklist: VecDeque::new(),
    };

    collector.record_entry_edges(entry)?;

    // The entry point itself is not a dependency; its literal body is
    // inlined during synthesis.
    collector.discard(&entry.own_nodes());

    while let Some(dep) = collector.worklist.pop_front() {
        collector.walk_dep(&dep)?;
    }

    // Interface-method forcing can rediscover a method entry on its own
    // class; drop it again so no stub shadows the inlined body.
    collector.discard(&entry.own_nodes());

    let grouped = collector.group()?;
    info!(
        classes = grouped.types.len(),
        globals = grouped.globals.len(),
        "dependency closure complete"
    );
    Ok(grouped)
}

/// Signature-walk context. `this` names the class `this` is currently bound
/// to; `needs_value` marks value positions, where meeting a class collects a
/// representative constant so a concrete value of the type can be named.
#[derive(Clone, Debug)]
struct WalkCtx {
    this: Option<String>,
    needs_value: bool,
    alias_depth: u32,
}

/// Bail out of typedef expansion past this depth; legal programs cannot
/// alias this deep, so hitting it means a cycle.
const MAX_ALIAS_DEPTH: u32 = 32;

impl WalkCtx {
    fn value(this: Option<String>) -> Self {
        WalkCtx { this, needs_value: true, alias_depth: 0 }
    }

    fn with_value(&self, needs_value: bool) -> Self {
        WalkCtx { needs_value, ..self.clone() }
    }
}

struct Collector<'a> {
    services: Services<'a>,
    deps: BTreeSet<Dep>,
    worklist: VecDeque<Dep>,
}

impl<'a> Collector<'a> {
    // ----------------------------------------------------------------
    // Collection phase
    // ----------------------------------------------------------------

    fn record_entry_edges(&mut self, entry: &EntryPoint) -> Result<()> {
        let decls = self.services.decls;
        let mut captured: Vec<Dep> = Vec::new();
        {
            let mut on_edge = |source: &Dep, target: &Dep| {
                if is_relevant(entry, source) {
                    trace!(source = %source, target = %target, "edge");
                    captured.push(target.clone());
                }
            };
            match entry {
                EntryPoint::Function(name) => {
                    let decl = decls.get_fun(name).ok_or(Error::NotFound)?;
                    self.services.checker.type_fun(&decl.pos.file, name, &mut on_edge);
                }
                EntryPoint::Member(class, MemberKind::Method(_)) => {
                    let decl = decls.get_class(class).ok_or(Error::NotFound)?;
                    self.services.checker.type_class(&decl.pos.file, class, &mut on_edge);
                }
                EntryPoint::Member(..) => return Err(Error::InvalidInput),
            }
        }
        debug!(edges = captured.len(), "collection phase complete");

        // A dependency-free method still needs its owning class emitted
        // around the inlined body.
        if let EntryPoint::Member(class, MemberKind::Method(_)) = entry {
            self.add_dep(Dep::Class(class.clone()))?;
        }
        for target in captured {
            self.add_dep(target)?;
        }
        Ok(())
    }

    fn discard(&mut self, nodes: &[Dep]) {
        for node in nodes {
            self.deps.remove(node);
        }
        self.worklist.retain(|d| !nodes.contains(d));
    }

    // ----------------------------------------------------------------
    // Closure phase
    // ----------------------------------------------------------------

    /// Inserts a node unless it is a builtin, keeping the owning class and
    /// the worklist in step.
    fn add_dep(&mut self, dep: Dep) -> Result<()> {
        if self.deps.contains(&dep) {
            return Ok(());
        }
        if is_builtin(self.services.decls, &dep)? {
            trace!(dep = %dep, "skipping builtin");
            return Ok(());
        }
        debug!(dep = %dep, "collected");
        self.deps.insert(dep.clone());
        if let Some(owner) = dep.owner() {
            self.add_dep(Dep::Class(owner.to_string()))?;
        }
        self.worklist.push_back(dep);
        Ok(())
    }

    fn walk_dep(&mut self, dep: &Dep) -> Result<()> {
        let decls = self.services.decls;
        match dep {
            Dep::Class(name) => {
                if let Some(cls) = decls.get_class(name) {
                    self.walk_class(name, cls)
                } else if let Some(td) = decls.get_typedef(name) {
                    self.walk_ty(&td.ty, &WalkCtx { this: None, needs_value: false, alias_depth: 0 })
                } else {
                    Err(Error::DependencyNotFound(name.clone()))
                }
            }
            Dep::Fun(name) | Dep::FunName(name) => {
                let decl = decls
                    .get_fun(name)
                    .ok_or_else(|| Error::DependencyNotFound(name.clone()))?;
                self.walk_fun_ty(&decl.ty, WalkCtx::value(None))
            }
            Dep::GConst(name) | Dep::GConstName(name) => {
                let decl = decls
                    .get_gconst(name)
                    .ok_or_else(|| Error::DependencyNotFound(name.clone()))?;
                self.walk_ty(&decl.ty, &WalkCtx::value(None))
            }
            Dep::Method { class, name } => {
                let cls = self.class(class)?;
                let method = cls
                    .method(name)
                    .ok_or_else(|| Error::DependencyNotFound(format!("{class}::{name}")))?;
                self.walk_fun_ty(&method.ty, WalkCtx::value(Some(class.clone())))
            }
            Dep::SMethod { class, name } => {
                let cls = self.class(class)?;
                match cls.smethod(name) {
                    Some(method) => {
                        self.walk_fun_ty(&method.ty, WalkCtx::value(Some(class.clone())))
                    }
                    // A static reference resolving to an instance method is
                    // an inheritance quirk of the source language; rewrite
                    // the node in place.
                    None if cls.method(name).is_some() => {
                        debug!(class = %class, method = %name, "rewriting static reference to instance method");
                        self.deps.remove(dep);
                        self.add_dep(Dep::Method { class: class.clone(), name: name.clone() })
                    }
                    None => Err(Error::DependencyNotFound(format!("{class}::{name}"))),
                }
            }
            Dep::Prop { class, name } | Dep::SProp { class, name } => {
                let cls = self.class(class)?;
                let prop = match dep {
                    Dep::Prop { .. } => cls.prop(name),
                    _ => cls.sprop(name),
                }
                .ok_or_else(|| Error::DependencyNotFound(format!("{class}::${name}")))?;
                self.walk_ty(&prop.ty, &WalkCtx::value(Some(class.clone())))?;
                // The constructor participates whenever a property does.
                self.add_dep(Dep::Cstr(class.clone()))
            }
            Dep::Const { class, name } => {
                if name == names::CLASS_CONST {
                    return Ok(());
                }
                let cls = self.class(class)?;
                if let Some(tc) = cls.typeconst(name) {
                    let ctx = WalkCtx { this: Some(class.clone()), needs_value: false, alias_depth: 0 };
                    if let Some(c) = &tc.constraint {
                        self.walk_ty(c, &ctx)?;
                    }
                    if let Some(t) = &tc.ty {
                        self.walk_ty(t, &ctx)?;
                    }
                    Ok(())
                } else if let Some(c) = cls.const_(name) {
                    self.walk_ty(&c.ty, &WalkCtx::value(Some(class.clone())))
                } else {
                    Err(Error::DependencyNotFound(format!("{class}::{name}")))
                }
            }
            Dep::Cstr(class) => {
                let cls = self.class(class)?;
                match &cls.constructor {
                    Some(ctor) => {
                        self.walk_fun_ty(&ctor.ty, WalkCtx::value(Some(class.clone())))
                    }
                    None => Ok(()),
                }
            }
            Dep::AllMembers(class) => self.walk_all_members(class),
            Dep::Extends(class) => self.add_dep(Dep::Class(class.clone())),
            // add_dep rejects record definitions before they can be queued.
            Dep::RecordDef(_) => unreachable!("record definitions are rejected at insertion"),
        }
    }

    fn class(&self, name: &str) -> Result<&'a ClassDecl> {
        self.services
            .decls
            .get_class(name)
            .ok_or_else(|| Error::DependencyNotFound(name.to_string()))
    }

    fn walk_class(&mut self, name: &str, cls: &'a ClassDecl) -> Result<()> {
        let ctx = WalkCtx { this: Some(name.to_string()), needs_value: false, alias_depth: 0 };
        for a in &cls.ancestors {
            self.walk_ty(&a.ty, &ctx)?;
        }
        for r in cls.req_extends.iter().chain(&cls.req_implements) {
            self.walk_ty(&r.ty, &ctx)?;
        }
        if let Some(et) = &cls.enum_ty {
            self.walk_ty(&et.base, &ctx)?;
            if let Some(c) = &et.constraint {
                self.walk_ty(c, &ctx)?;
            }
        }
        // An enum that participates in the slice needs at least one entry,
        // so any expression of the enum type can name a concrete value.
        if cls.is_enum()
            && let Some(rc) = cls.representative_const()
        {
            self.add_dep(Dep::Const { class: name.to_string(), name: rc.name.clone() })?;
        }

        // Any interface in the ancestor closure forces the methods the
        // class itself provides for it, so the generated class still
        // satisfies the interface.
        for a in &cls.ancestors {
            let Some(anc) = self.services.decls.get_class(&a.name) else {
                continue;
            };
            if !anc.is_interface() || is_builtin(self.services.decls, &Dep::Class(a.name.clone()))? {
                continue;
            }
            for m in &anc.methods {
                if origin_or(&m.origin, &anc.name) != anc.name {
                    continue;
                }
                if let Some(own) = cls.method(&m.name)
                    && origin_or(&own.origin, name) == name
                {
                    self.add_dep(Dep::Method { class: name.to_string(), name: m.name.clone() })?;
                }
            }
            for m in &anc.smethods {
                if origin_or(&m.origin, &anc.name) != anc.name {
                    continue;
                }
                if let Some(own) = cls.smethod(&m.name)
                    && origin_or(&own.origin, name) == name
                {
                    self.add_dep(Dep::SMethod { class: name.to_string(), name: m.name.clone() })?;
                }
            }
        }
        Ok(())
    }

    fn walk_all_members(&mut self, class: &str) -> Result<()> {
        let cls = self.class(class)?;
        let mut members: Vec<Dep> = Vec::new();
        for c in &cls.consts {
            members.push(Dep::Const { class: class.to_string(), name: c.name.clone() });
        }
        for tc in &cls.typeconsts {
            members.push(Dep::Const { class: class.to_string(), name: tc.name.clone() });
        }
        for p in &cls.props {
            members.push(Dep::Prop { class: class.to_string(), name: p.name.clone() });
        }
        for p in &cls.sprops {
            members.push(Dep::SProp { class: class.to_string(), name: p.name.clone() });
        }
        for m in &cls.methods {
            members.push(Dep::Method { class: class.to_string(), name: m.name.clone() });
        }
        for m in &cls.smethods {
            members.push(Dep::SMethod { class: class.to_string(), name: m.name.clone() });
        }
        if cls.constructor.is_some() {
            members.push(Dep::Cstr(class.to_string()));
        }
        for member in members {
            self.add_dep(member)?;
        }
        Ok(())
    }

    fn walk_fun_ty(&mut self, ft: &FunTy, ctx: WalkCtx) -> Result<()> {
        for p in &ft.params {
            self.walk_ty(&p.ty, &ctx)?;
        }
        if let Some(v) = &ft.variadic {
            self.walk_ty(&v.ty, &ctx)?;
        }
        self.walk_ty(&ft.ret, &ctx)
    }

    fn walk_ty(&mut self, ty: &Ty, ctx: &WalkCtx) -> Result<()> {
        match ty {
            Ty::Prim(_)
            | Ty::Generic(_)
            | Ty::This
            | Ty::Mixed
            | Ty::Nonnull
            | Ty::Dynamic
            | Ty::Nothing
            | Ty::Any => Ok(()),
            Ty::Option(t) => self.walk_ty(t, ctx),
            // Dense array kinds have empty literals; their element types are
            // never materialized.
            Ty::Varray(t) | Ty::VarrayOrDarray(t) => self.walk_ty(t, &ctx.with_value(false)),
            Ty::Darray(k, v) => {
                self.walk_ty(k, &ctx.with_value(false))?;
                self.walk_ty(v, &ctx.with_value(false))
            }
            Ty::Tuple(tys) => {
                for t in tys {
                    self.walk_ty(t, ctx)?;
                }
                Ok(())
            }
            Ty::Shape { fields, .. } => {
                for f in fields {
                    // Optional fields are omitted from default values.
                    self.walk_ty(&f.ty, &ctx.with_value(ctx.needs_value && !f.optional))?;
                }
                Ok(())
            }
            Ty::Fun(ft) => self.walk_fun_ty(ft, ctx.with_value(false)),
            Ty::Apply { name, args } => self.walk_apply(name, args, ctx),
            Ty::Access { .. } => self.walk_access(ty, ctx).map(|_| ()),
        }
    }

    fn walk_apply(&mut self, name: &str, args: &[Ty], ctx: &WalkCtx) -> Result<()> {
        let decls = self.services.decls;
        self.add_dep(Dep::Class(name.to_string()))?;

        if ctx.needs_value {
            if let Some(cls) = decls.get_class(name) {
                // A concrete value of this type will be spelled
                // `Name::Const`; collect the constant it will name.
                if let Some(rc) = cls.representative_const() {
                    let const_name = rc.name.clone();
                    self.add_dep(Dep::Const { class: name.to_string(), name: const_name })?;
                }
            } else if let Some(td) = decls.get_typedef(name) {
                if ctx.alias_depth >= MAX_ALIAS_DEPTH {
                    return Err(Error::unsupported(format!("cyclic typedef {name}")));
                }
                // The value requirement survives alias expansion.
                let expanded =
                    WalkCtx { alias_depth: ctx.alias_depth + 1, ..ctx.with_value(true) };
                self.walk_ty(&td.ty, &expanded)?;
            }
        }

        // Generic arguments are not value positions, with the one exception
        // of Pair, whose default constructs a value of each argument.
        let arg_ctx = ctx.with_value(ctx.needs_value && name == names::PAIR);
        for a in args {
            self.walk_ty(a, &arg_ctx)?;
        }
        Ok(())
    }

    /// Walks a type access `Root::Name`, collecting one constant per hop,
    /// and returns the type the access resolves to together with the
    /// rebound `this`.
    fn walk_access(&mut self, ty: &Ty, ctx: &WalkCtx) -> Result<Option<(Ty, Option<String>)>> {
        let Ty::Access { root, name } = ty else {
            return Err(Error::unexpected(format!("type access walk over {ty:?}")));
        };

        let class_name = match root.as_ref() {
            Ty::This => ctx.this.clone(),
            Ty::Access { .. } => match self.walk_access(root, ctx)? {
                Some((resolved, this)) => {
                    let hop_ctx = WalkCtx { this, needs_value: false, alias_depth: 0 };
                    self.applied_class(&resolved, &hop_ctx)?
                }
                None => None,
            },
            other => {
                self.walk_ty(other, &ctx.with_value(false))?;
                self.applied_class(other, ctx)?
            }
        };
        let Some(class_name) = class_name else {
            return Err(Error::DependencyNotFound(format!("type constant {name}")));
        };

        let cls = self.class(&class_name)?;
        let tc = cls
            .typeconst(name)
            .ok_or_else(|| Error::DependencyNotFound(format!("{class_name}::{name}")))?;
        let owner = origin_or(&tc.origin, &class_name).to_string();
        let resolved = tc.ty.clone().or_else(|| tc.constraint.clone());
        self.add_dep(Dep::Const { class: owner, name: name.clone() })?;

        Ok(resolved.map(|t| {
            let this = t.apply_name().map(str::to_string);
            (t, this)
        }))
    }

    /// The class a type denotes, following typedef aliases.
    fn applied_class(&self, ty: &Ty, ctx: &WalkCtx) -> Result<Option<String>> {
        let decls = self.services.decls;
        match ty {
            Ty::This => Ok(ctx.this.clone()),
            Ty::Apply { name, .. } => {
                let mut name = name.clone();
                let mut fuel = 32u32;
                loop {
                    if decls.get_class(&name).is_some() {
                        return Ok(Some(name));
                    }
                    let Some(td) = decls.get_typedef(&name) else {
                        return Err(Error::DependencyNotFound(name));
                    };
                    match (td.ty.apply_name(), fuel) {
                        (Some(next), 1..) => {
                            name = next.to_string();
                            fuel -= 1;
                        }
                        _ => return Ok(None),
                    }
                }
            }
            _ => Ok(None),
        }
    }

    // ----------------------------------------------------------------
    // Grouping
    // ----------------------------------------------------------------

    /// Partitions the closed set: class-bound nodes keyed by owner (only
    /// those the owner itself declares), globals on their own. The
    /// `AllMembers`/`Extends` drivers are dropped.
    fn group(self) -> Result<CollectedDeps> {
        let decls = self.services.decls;
        let mut out = CollectedDeps::default();
        for dep in &self.deps {
            match dep {
                Dep::Class(name) => {
                    if decls.get_class(name).is_some() {
                        out.types.entry(name.clone()).or_default();
                    } else if decls.get_typedef(name).is_some() {
                        out.globals.insert(dep.clone());
                    } else {
                        return Err(Error::DependencyNotFound(name.clone()));
                    }
                }
                // `AllMembers`/`Extends` were only drivers for the closure;
                // `RecordDef` cannot be present, add_dep rejects it.
                Dep::AllMembers(_) | Dep::Extends(_) | Dep::RecordDef(_) => {}
                Dep::Fun(name) | Dep::FunName(name) => {
                    out.globals.insert(Dep::Fun(name.clone()));
                }
                Dep::GConst(name) | Dep::GConstName(name) => {
                    out.globals.insert(Dep::GConst(name.clone()));
                }
                Dep::Cstr(class) => {
                    let cls = self.class(class)?;
                    let declared = match &cls.constructor {
                        Some(ctor) => origin_or(&ctor.origin, class) == class,
                        // A synthesized constructor assigning collected
                        // properties still belongs to the class.
                        None => true,
                    };
                    if declared {
                        out.types.entry(class.clone()).or_default().insert(dep.clone());
                    }
                }
                Dep::Method { class, name }
                | Dep::SMethod { class, name }
                | Dep::Prop { class, name }
                | Dep::SProp { class, name }
                | Dep::Const { class, name } => {
                    // The implicit `class` constant is declared by no one
                    // and every class satisfies it; drop it, as the walk
                    // does.
                    if matches!(dep, Dep::Const { .. }) && name == names::CLASS_CONST {
                        continue;
                    }
                    let cls = self.class(class)?;
                    let origin = match dep {
                        Dep::Method { .. } => cls.method(name).map(|m| origin_or(&m.origin, class)),
                        Dep::SMethod { .. } => {
                            cls.smethod(name).map(|m| origin_or(&m.origin, class))
                        }
                        Dep::Prop { .. } => cls.prop(name).map(|p| origin_or(&p.origin, class)),
                        Dep::SProp { .. } => cls.sprop(name).map(|p| origin_or(&p.origin, class)),
                        Dep::Const { .. } => cls
                            .const_(name)
                            .map(|c| origin_or(&c.origin, class))
                            .or_else(|| cls.typeconst(name).map(|c| origin_or(&c.origin, class))),
                        _ => unreachable!(),
                    };
                    let Some(origin) = origin else {
                        return Err(Error::DependencyNotFound(format!("{dep}")));
                    };
                    // Inherited without override: the origin emits it.
                    if origin == class {
                        out.types.entry(class.clone()).or_default().insert(dep.clone());
                    }
                }
            }
        }
        Ok(out)
    }
}
