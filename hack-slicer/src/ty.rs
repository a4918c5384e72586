//! Declared-type model and declaration reflection.
//!
//! `Ty` mirrors the decl-side type representation of the host language:
//! enough structure for signature walks, stub synthesis and default-value
//! generation, nothing more. The reflection structs (`ClassDecl` and
//! friends) are the shape a decl provider hands back; members carry the
//! *origin* class that first declared them, so inherited, non-overridden
//! members can be told apart from a class's own.
//!
//! Everything derives serde so whole projects can be described in JSON (see
//! `project`).

use serde::{Deserialize, Serialize};

/// Primitive type kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prim {
    Null,
    Void,
    Int,
    Bool,
    Float,
    String,
    Resource,
    Num,
    Arraykey,
    Noreturn,
}

/// A declared type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ty {
    Prim(Prim),
    /// Nullable type `?T`.
    Option(Box<Ty>),
    /// A named type applied to arguments: class, interface, trait, enum or
    /// typedef reference. The name is fully qualified.
    Apply {
        name: String,
        #[serde(default)]
        args: Vec<Ty>,
    },
    /// A method- or class-level type parameter, by name.
    Generic(String),
    Tuple(Vec<Ty>),
    Shape {
        #[serde(default)]
        open: bool,
        #[serde(default)]
        fields: Vec<ShapeField>,
    },
    Fun(Box<FunTy>),
    /// Type access `Root::Name`. Chains nest in the root.
    Access { root: Box<Ty>, name: String },
    Varray(Box<Ty>),
    Darray(Box<Ty>, Box<Ty>),
    VarrayOrDarray(Box<Ty>),
    This,
    Mixed,
    Nonnull,
    Dynamic,
    Nothing,
    /// The unknown type. Return annotations of this kind are omitted.
    Any,
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Prim(Prim::Int)
    }

    pub fn string() -> Ty {
        Ty::Prim(Prim::String)
    }

    pub fn void() -> Ty {
        Ty::Prim(Prim::Void)
    }

    /// A named type with no arguments.
    pub fn apply(name: impl Into<String>) -> Ty {
        Ty::Apply { name: name.into(), args: Vec::new() }
    }

    pub fn option(inner: Ty) -> Ty {
        Ty::Option(Box::new(inner))
    }

    /// The applied name, if this is an `Apply`.
    pub fn apply_name(&self) -> Option<&str> {
        match self {
            Ty::Apply { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// One field of a shape type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeField {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    pub ty: Ty,
}

/// A function or method signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunTy {
    #[serde(default)]
    pub tparams: Vec<String>,
    #[serde(default)]
    pub params: Vec<FunParam>,
    #[serde(default)]
    pub variadic: Option<Box<FunParam>>,
    pub ret: Ty,
    /// Number of parameters without a default in the original source.
    /// Parameters at or beyond this index get a synthesized default.
    /// Defaults to all parameters being required.
    #[serde(default)]
    pub min_arity: Option<usize>,
}

impl FunTy {
    pub fn required_arity(&self) -> usize {
        self.min_arity.unwrap_or(self.params.len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunParam {
    pub name: String,
    pub ty: Ty,
    #[serde(default)]
    pub inout: bool,
}

/// Source position of a declaration: file plus byte span. The span is used
/// to slice the literal text of the entry point out of its file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    pub file: String,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    AbstractClass,
    Interface,
    Trait,
    Enum,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// An entry in a class's ancestor closure: the ancestor's name plus its
/// resolved (instantiated) type as seen from the class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestor {
    pub name: String,
    pub ty: Ty,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: String,
    pub ty: Ty,
    #[serde(default)]
    pub is_abstract: bool,
    /// Class that first declared this constant; `None` means the owner.
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConstDecl {
    pub name: String,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub constraint: Option<Ty>,
    #[serde(default)]
    pub ty: Option<Ty>,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropDecl {
    pub name: String,
    pub ty: Ty,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub ty: FunTy,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub origin: Option<String>,
    /// Span of the full method text; present when the method can serve as
    /// an entry point.
    #[serde(default)]
    pub pos: Option<Pos>,
}

/// The enum-ness of a class: base type plus optional `as` constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumTy {
    pub base: Ty,
    #[serde(default)]
    pub constraint: Option<Ty>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub kind: ClassKind,
    pub pos: Pos,
    #[serde(default)]
    pub tparams: Vec<String>,
    /// Transitive ancestor closure (extends, implements and uses combined),
    /// each with its resolved type.
    #[serde(default)]
    pub ancestors: Vec<Ancestor>,
    #[serde(default)]
    pub req_extends: Vec<Ancestor>,
    #[serde(default)]
    pub req_implements: Vec<Ancestor>,
    #[serde(default)]
    pub consts: Vec<ConstDecl>,
    #[serde(default)]
    pub typeconsts: Vec<TypeConstDecl>,
    #[serde(default)]
    pub props: Vec<PropDecl>,
    #[serde(default)]
    pub sprops: Vec<PropDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub smethods: Vec<MethodDecl>,
    #[serde(default)]
    pub constructor: Option<MethodDecl>,
    #[serde(default)]
    pub enum_ty: Option<EnumTy>,
}

impl ClassDecl {
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_enum(&self) -> bool {
        self.enum_ty.is_some() || self.kind == ClassKind::Enum
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn smethod(&self, name: &str) -> Option<&MethodDecl> {
        self.smethods.iter().find(|m| m.name == name)
    }

    pub fn prop(&self, name: &str) -> Option<&PropDecl> {
        self.props.iter().find(|p| p.name == name)
    }

    pub fn sprop(&self, name: &str) -> Option<&PropDecl> {
        self.sprops.iter().find(|p| p.name == name)
    }

    pub fn const_(&self, name: &str) -> Option<&ConstDecl> {
        self.consts.iter().find(|c| c.name == name)
    }

    pub fn typeconst(&self, name: &str) -> Option<&TypeConstDecl> {
        self.typeconsts.iter().find(|c| c.name == name)
    }

    /// First declared constant other than the reserved `class` identifier.
    pub fn representative_const(&self) -> Option<&ConstDecl> {
        self.consts
            .iter()
            .find(|c| c.name != crate::names::CLASS_CONST)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunDecl {
    pub name: String,
    pub ty: FunTy,
    pub pos: Pos,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    #[serde(default)]
    pub tparams: Vec<String>,
    pub ty: Ty,
    /// `type` aliases are transparent; `newtype` is opaque outside its file.
    #[serde(default = "default_transparent")]
    pub transparent: bool,
    pub pos: Pos,
}

fn default_transparent() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GConstDecl {
    pub name: String,
    pub ty: Ty,
    pub pos: Pos,
}

/// Resolves a member's origin against its owning class.
pub fn origin_or<'a>(origin: &'a Option<String>, owner: &'a str) -> &'a str {
    origin.as_deref().unwrap_or(owner)
}
