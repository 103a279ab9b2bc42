use crate::descriptor::Kind;
use derive_more::Display;

pub type Result<T> = core::result::Result<T, Error>;

/// Failures that escape the engine.
///
/// Missing members and missing containers are never errors; they resolve
/// to defaults where they are met.
#[derive(Debug, Display)]
pub enum Error {
    /// The parser could not produce a node tree from the input.
    #[display(fmt = "malformed document: {}", _0)]
    DocumentMalformed(roxmltree::Error),

    /// A present, non-empty value did not parse as the member's type.
    #[display(fmt = "cannot coerce {:?} into `{}` ({})", raw, member, kind)]
    CoercionFailure {
        member: String,
        raw: String,
        kind: Kind,
    },

    /// A member's type has no coercion or recursion rule.
    #[display(fmt = "member `{}` has unsupported type `{}`", member, type_name)]
    UnsupportedMemberType { member: String, type_name: String },
}

impl Error {
    pub(crate) fn coercion(member: &str, raw: &str, kind: Kind) -> Self {
        Error::CoercionFailure {
            member: member.to_owned(),
            raw: raw.to_owned(),
            kind,
        }
    }

    /// Prefixes the member path of a coercion failure with `parent`.
    pub(crate) fn within(self, parent: &str) -> Self {
        match self {
            Error::CoercionFailure { member, raw, kind } => {
                let member = if member.is_empty() {
                    parent.to_owned()
                } else if member.starts_with('[') {
                    format!("{}{}", parent, member)
                } else {
                    format!("{}.{}", parent, member)
                };
                Error::CoercionFailure { member, raw, kind }
            }
            other => other,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DocumentMalformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::DocumentMalformed(err)
    }
}
