#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! Maps parsed XML onto typed targets.
//!
//! A target type lists its members once through [`FromNode::describe`];
//! each member is then looked up in the document by name (separator and
//! case insensitive, child elements before attributes) and coerced to its
//! kind. Missing members keep their defaults, extra nodes are ignored.
//!
//! Targets known only at runtime go through [`Schema`] and [`Record`].

mod context;
mod de;
mod descriptor;
mod error;
pub mod name;
mod node;
mod record;

pub use crate::context::{Context, DateOrder, Locale};
pub use crate::de::{effective_root, from_element, from_str, Deserializer};
pub use crate::descriptor::{
    descriptor, Collection, Describe, FromNode, Kind, MemberDescriptor, MemberRef, Scalar,
    TypeDescriptor, Value,
};
pub use crate::error::{Error, Result};
pub use crate::node::Element;
pub use crate::record::{Entry, MemberSchema, Record, RecordType, Schema, TypeSchema};
