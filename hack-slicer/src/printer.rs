//! Type printing — thin surface over the external type-printing service.
//!
//! `DisplayPrinter` is the default implementation, rendering the declared
//! type model back to Hack type syntax. Standard-library names print in
//! their auto-imported short form.

use crate::names;
use crate::ty::{Prim, Ty};

/// Renders a declared type to source syntax.
pub trait TypePrinter {
    fn full_decl(&self, ty: &Ty) -> String;
}

#[derive(Default)]
pub struct DisplayPrinter;

impl TypePrinter for DisplayPrinter {
    fn full_decl(&self, ty: &Ty) -> String {
        print_ty(ty)
    }
}

fn print_ty(ty: &Ty) -> String {
    match ty {
        Ty::Prim(p) => prim_name(*p).to_string(),
        Ty::Option(inner) => format!("?{}", print_ty(inner)),
        Ty::Apply { name, args } => {
            let head = names::display_name(name);
            if args.is_empty() {
                head.to_string()
            } else {
                format!("{head}<{}>", print_list(args))
            }
        }
        Ty::Generic(name) => name.clone(),
        Ty::Tuple(tys) => format!("({})", print_list(tys)),
        Ty::Shape { open, fields } => {
            let mut parts: Vec<String> = fields
                .iter()
                .map(|f| {
                    let opt = if f.optional { "?" } else { "" };
                    format!("{opt}'{}' => {}", f.name, print_ty(&f.ty))
                })
                .collect();
            if *open {
                parts.push("...".to_string());
            }
            format!("shape({})", parts.join(", "))
        }
        Ty::Fun(ft) => {
            let mut params: Vec<String> = ft
                .params
                .iter()
                .map(|p| {
                    let inout = if p.inout { "inout " } else { "" };
                    format!("{inout}{}", print_ty(&p.ty))
                })
                .collect();
            if let Some(v) = &ft.variadic {
                params.push(format!("{}...", print_ty(&v.ty)));
            }
            format!("(function({}): {})", params.join(", "), print_ty(&ft.ret))
        }
        Ty::Access { root, name } => format!("{}::{name}", print_ty(root)),
        Ty::Varray(t) => format!("varray<{}>", print_ty(t)),
        Ty::Darray(k, v) => format!("darray<{}, {}>", print_ty(k), print_ty(v)),
        Ty::VarrayOrDarray(t) => format!("varray_or_darray<{}>", print_ty(t)),
        Ty::This => "this".to_string(),
        Ty::Mixed => "mixed".to_string(),
        Ty::Nonnull => "nonnull".to_string(),
        Ty::Dynamic => "dynamic".to_string(),
        Ty::Nothing => "nothing".to_string(),
        Ty::Any => "_".to_string(),
    }
}

fn print_list(tys: &[Ty]) -> String {
    tys.iter().map(print_ty).collect::<Vec<_>>().join(", ")
}

fn prim_name(p: Prim) -> &'static str {
    match p {
        Prim::Null => "null",
        Prim::Void => "void",
        Prim::Int => "int",
        Prim::Bool => "bool",
        Prim::Float => "float",
        Prim::String => "string",
        Prim::Resource => "resource",
        Prim::Num => "num",
        Prim::Arraykey => "arraykey",
        Prim::Noreturn => "noreturn",
    }
}
