use crate::type_ref::TypeRef;

/// How an invocation hands its result back, resolved once from the declared return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// `Call<T>`: return an unexecuted [`ServiceCall`](crate::ServiceCall).
    Call,
    /// `T`: execute in the invoking task and return the value.
    Direct,
    /// `Pending<T>`: enqueue on the dispatcher and return a [`PendingResult`](crate::PendingResult).
    Pending,
}

impl AdapterKind {
    /// Splits a return type into its adapter and the type the response body converts to.
    pub(crate) fn resolve(return_type: &TypeRef) -> Result<(AdapterKind, TypeRef), String> {
        let adapter = match return_type.name() {
            Some("Call") => AdapterKind::Call,
            Some("Pending") => AdapterKind::Pending,
            _ => return Ok((AdapterKind::Direct, return_type.clone())),
        };

        match return_type.args() {
            [response_type] => Ok((adapter, response_type.clone())),
            _ => Err(format!("{adapter} return type must be parameterized as {adapter}<Foo>, found {return_type}")),
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AdapterKind::Call => "Call",
            AdapterKind::Direct => "Direct",
            AdapterKind::Pending => "Pending",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AdapterKind;
    use crate::type_ref::TypeRef;

    #[test]
    fn resolution() {
        let user = TypeRef::named("User");
        assert_eq!(AdapterKind::resolve(&TypeRef::call(user.clone())), Ok((AdapterKind::Call, user.clone())));
        assert_eq!(AdapterKind::resolve(&TypeRef::pending(TypeRef::Unit)), Ok((AdapterKind::Pending, TypeRef::Unit)));
        assert_eq!(AdapterKind::resolve(&user), Ok((AdapterKind::Direct, user.clone())));

        let vec = TypeRef::generic("Vec", [user]);
        assert_eq!(AdapterKind::resolve(&vec), Ok((AdapterKind::Direct, vec.clone())));
    }

    #[test]
    fn wrappers_need_one_argument() {
        assert_eq!(
            AdapterKind::resolve(&TypeRef::named("Call")),
            Err("Call return type must be parameterized as Call<Foo>, found Call".to_string())
        );
        assert!(AdapterKind::resolve(&TypeRef::generic("Pending", [TypeRef::Unit, TypeRef::Unit])).is_err());
    }
}
