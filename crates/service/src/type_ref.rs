use std::fmt;

/// A declared return type, as written on the service method.
///
/// Only the shape matters: the outer name selects the adapter and the inner type selects the
/// converter. [`TypeRef::Param`] and [`TypeRef::Wildcard`] stand for types that are not known
/// at declaration time and are rejected when the method is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Unit,
    Named { name: String, args: Vec<TypeRef> },
    /// A type parameter such as `T`.
    Param(String),
    Wildcard,
}

impl TypeRef {
    pub fn named<S: Into<String>>(name: S) -> Self {
        TypeRef::Named { name: name.into(), args: vec![] }
    }

    pub fn generic<S, I>(name: S, args: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = TypeRef>,
    {
        TypeRef::Named { name: name.into(), args: args.into_iter().collect() }
    }

    pub fn param<S: Into<String>>(name: S) -> Self {
        TypeRef::Param(name.into())
    }

    /// `Call<inner>`
    pub fn call(inner: TypeRef) -> Self {
        TypeRef::generic("Call", [inner])
    }

    /// `Pending<inner>`
    pub fn pending(inner: TypeRef) -> Self {
        TypeRef::generic("Pending", [inner])
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, TypeRef::Unit)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// True if this type or any of its arguments is a type parameter or a wildcard.
    pub fn has_unresolvable(&self) -> bool {
        match self {
            TypeRef::Unit => false,
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::has_unresolvable),
            TypeRef::Param(_) | TypeRef::Wildcard => true,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Unit => f.write_str("()"),
            TypeRef::Param(name) => f.write_str(name),
            TypeRef::Wildcard => f.write_str("?"),
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if let Some((first, rest)) = args.split_first() {
                    write!(f, "<{first}")?;
                    for arg in rest {
                        write!(f, ", {arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}
