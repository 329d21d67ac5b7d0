//! Type chain computation.
//!
//! The chain lists the types a live digest inspects, most-derived first: the type itself, its
//! superclasses, then every interface those classes implement transitively.

use std::sync::Arc;

use crate::metadata::typesystem::TypeRc;

/// Computes the ordered list of types inspected for `ty`.
///
/// Without inheritance the chain is `[ty]`. Otherwise it is `ty`, followed by its superclasses up
/// to the root, followed by every interface transitively implemented by any class of that prefix.
/// The root type (flagged [`crate::metadata::typesystem::TypeFlags::ROOT`]) is only part of the
/// chain when `include_root` is set or when it is `ty` itself. Types are deduplicated by identity.
#[must_use]
pub fn type_chain(ty: &TypeRc, inherits: bool, include_root: bool) -> Vec<TypeRc> {
    let mut chain = vec![ty.clone()];
    if !inherits {
        return chain;
    }

    let mut current = ty.base();
    while let Some(class) = current {
        if contains(&chain, &class) {
            break;
        }
        current = class.base();
        if class.is_root() && !include_root {
            continue;
        }
        chain.push(class);
    }

    let classes = chain.len();
    for index in 0..classes {
        let class = chain[index].clone();
        collect_interfaces(&class, &mut chain);
    }

    chain
}

fn collect_interfaces(ty: &TypeRc, chain: &mut Vec<TypeRc>) {
    for (_, interface) in ty.interfaces.iter() {
        if contains(chain, interface) {
            continue;
        }
        chain.push(interface.clone());
        collect_interfaces(interface, chain);
    }
}

fn contains(chain: &[TypeRc], ty: &TypeRc) -> bool {
    chain.iter().any(|known| Arc::ptr_eq(known, ty))
}
