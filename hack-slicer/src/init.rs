//! Default-value generation.
//!
//! Produces a source-level expression whose static type the host language
//! accepts as an instance of a declared type. Used for global and class
//! constant initializers, enum entries and static property defaults;
//! parameter defaults and constructor assignments go through the
//! `default_factory` helper instead.

use crate::error::{Error, Result};
use crate::names;
use crate::provider::DeclProvider;
use crate::ty::{Prim, Ty};

/// A syntactically valid default expression for `ty`.
pub fn initial_value(decls: &dyn DeclProvider, ty: &Ty) -> Result<String> {
    match ty {
        Ty::Option(_) | Ty::Prim(Prim::Null) => Ok("null".to_string()),
        Ty::Prim(Prim::Int) | Ty::Prim(Prim::Num) => Ok("0".to_string()),
        Ty::Prim(Prim::Bool) => Ok("false".to_string()),
        Ty::Prim(Prim::Float) => Ok("0.0".to_string()),
        Ty::Prim(Prim::String) | Ty::Prim(Prim::Arraykey) => Ok("\"\"".to_string()),
        Ty::Varray(_) | Ty::VarrayOrDarray(_) => Ok("varray[]".to_string()),
        Ty::Darray(..) => Ok("darray[]".to_string()),
        Ty::Tuple(tys) => {
            let parts = tys
                .iter()
                .map(|t| initial_value(decls, t))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("tuple({})", parts.join(", ")))
        }
        Ty::Shape { open, fields } => {
            let mut parts = fields
                .iter()
                .filter(|f| !f.optional)
                .map(|f| Ok(format!("'{}' => {}", f.name, initial_value(decls, &f.ty)?)))
                .collect::<Result<Vec<_>>>()?;
            if *open {
                parts.push("...".to_string());
            }
            Ok(format!("shape({})", parts.join(", ")))
        }
        Ty::Apply { name, args } => apply_value(decls, name, args),
        Ty::Prim(Prim::Void | Prim::Resource | Prim::Noreturn) => {
            Err(Error::unsupported(format!("default value of {ty:?}")))
        }
        _ => Err(Error::unsupported(format!("default value of {ty:?}"))),
    }
}

fn apply_value(decls: &dyn DeclProvider, name: &str, args: &[Ty]) -> Result<String> {
    match name {
        names::VEC => return Ok("vec[]".to_string()),
        names::DICT => return Ok("dict[]".to_string()),
        names::KEYSET => return Ok("keyset[]".to_string()),
        names::PAIR => {
            let [first, second] = args else {
                return Err(Error::unsupported(format!("Pair with {} arguments", args.len())));
            };
            return Ok(format!(
                "Pair {{{}, {}}}",
                initial_value(decls, first)?,
                initial_value(decls, second)?
            ));
        }
        names::CLASSNAME | names::TYPENAME => {
            return match args.first() {
                Some(Ty::Apply { name: cls, .. }) => Ok(format!("{cls}::class")),
                Some(Ty::Generic(g)) => Ok(format!("{g}::class")),
                other => Err(Error::unsupported(format!("classname of {other:?}"))),
            };
        }
        _ if names::COLLECTION_CLASSES.contains(&name) => {
            return Ok(format!("{} {{}}", names::display_name(name)));
        }
        _ => {}
    }

    // Any other named type: a class is treated as an enum and one of its
    // constants becomes the value; a typedef recurses into its target.
    if let Some(cls) = decls.get_class(name) {
        match cls.representative_const() {
            Some(c) => Ok(format!("{name}::{}", c.name)),
            None => Err(Error::unsupported(format!(
                "no usable constant on {name} for a default value"
            ))),
        }
    } else if let Some(td) = decls.get_typedef(name) {
        initial_value(decls, &td.ty)
    } else {
        Err(Error::DependencyNotFound(name.to_string()))
    }
}
