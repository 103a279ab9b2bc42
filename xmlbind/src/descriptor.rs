use crate::context::Context;
use crate::de;
use crate::error::Result;
use crate::node::Element;
use chrono::NaiveDateTime;
use core::any::{Any, TypeId};
use core::convert::TryFrom;
use derive_more::Display;
use hashbrown::HashMap;
use rust_decimal::Decimal;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use uuid::Uuid;

/// Closed set of member shapes, one coercion or recursion rule each.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    #[display(fmt = "string")]
    String,
    #[display(fmt = "boolean")]
    Boolean,
    #[display(fmt = "integer")]
    Integer,
    #[display(fmt = "floating")]
    Floating,
    #[display(fmt = "decimal")]
    Decimal,
    #[display(fmt = "uuid")]
    Uuid,
    #[display(fmt = "date-time")]
    DateTime,
    #[display(fmt = "object")]
    Object,
    #[display(fmt = "sequence")]
    Sequence,
}

impl Kind {
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(self, Kind::Object | Kind::Sequence)
    }
}

/// A coerced scalar. Integers are held wide and narrowed on assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Boolean(bool),
    Integer(i128),
    Floating(f64),
    Decimal(Decimal),
    Uuid(Uuid),
    DateTime(NaiveDateTime),
}

impl Value {
    /// The value a member of `kind` holds before anything is assigned.
    #[must_use]
    pub fn default_for(kind: Kind, nullable: bool) -> Value {
        if nullable {
            return Value::Null;
        }
        match kind {
            Kind::String => Value::String(String::new()),
            Kind::Boolean => Value::Boolean(false),
            Kind::Integer => Value::Integer(0),
            Kind::Floating => Value::Floating(0.0),
            Kind::Decimal => Value::Decimal(Decimal::ZERO),
            Kind::Uuid => Value::Uuid(Uuid::nil()),
            Kind::DateTime => Value::DateTime(NaiveDateTime::default()),
            Kind::Object | Kind::Sequence => Value::Null,
        }
    }
}

/// A member value type with a coercion rule.
///
/// `Option<S>` is the nullable variant of `S`: empty text assigns `None`
/// instead of leaving the member untouched.
pub trait Scalar: Sized + 'static {
    const KIND: Kind;
    const NULLABLE: bool;

    /// Narrows a coerced value, `None` if it does not fit.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! scalar {
    ($ty:ty, $kind:ident, |$v:ident| $convert:expr) => {
        impl Scalar for $ty {
            const KIND: Kind = Kind::$kind;
            const NULLABLE: bool = false;

            #[inline]
            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$kind($v) => $convert,
                    _ => None,
                }
            }
        }

        impl Scalar for Option<$ty> {
            const KIND: Kind = Kind::$kind;
            const NULLABLE: bool = true;

            #[inline]
            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::Null => Some(None),
                    value => <$ty as Scalar>::from_value(value).map(Some),
                }
            }
        }
    };
}

macro_rules! integers {
    ($($ty:ty),*) => {
        $(scalar!($ty, Integer, |v| <$ty>::try_from(v).ok());)*
    };
}

scalar!(String, String, |v| Some(v));
scalar!(bool, Boolean, |v| Some(v));
integers!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
scalar!(f64, Floating, |v| Some(v));
#[allow(clippy::cast_possible_truncation)]
mod narrow {
    use super::{Kind, Scalar, Value};
    scalar!(f32, Floating, |v| Some(v as f32));
}
scalar!(Decimal, Decimal, |v| Some(v));
scalar!(Uuid, Uuid, |v| Some(v));
scalar!(NaiveDateTime, DateTime, |v| Some(v));

/// A type the engine can populate from an element.
///
/// ```
/// use xmlbind::{Describe, FromNode};
///
/// #[derive(Debug, Default)]
/// struct Friend {
///     name: String,
///     since: Option<i32>,
/// }
///
/// impl FromNode for Friend {
///     fn describe(d: &mut Describe<Self>) {
///         d.field("Name", |f: &mut Friend| &mut f.name);
///         d.field("Since", |f: &mut Friend| &mut f.since);
///     }
/// }
///
/// let friend: Friend = xmlbind::from_str(r#"<friend since="1952"><name>The Fonz</name></friend>"#).unwrap();
/// assert_eq!(friend.name, "The Fonz");
/// assert_eq!(friend.since, Some(1952));
/// ```
pub trait FromNode: Default + 'static {
    fn describe(d: &mut Describe<Self>);
}

/// A sequence with scalar members of its own, read from the container's
/// attributes (`<Foes Team="Yankees"><Foe/>…</Foes>`).
pub trait Collection: FromNode {
    type Item: FromNode;

    fn items_mut(&mut self) -> &mut Vec<Self::Item>;
}

type SetScalar<T> = Box<dyn Fn(&mut T, Value) -> bool + Send + Sync>;
type SetFromNode<T> = Box<dyn Fn(&mut T, &Element, &Context) -> Result<()> + Send + Sync>;

pub(crate) enum Apply<T> {
    Scalar(SetScalar<T>),
    /// Receives the matched child element.
    Object(SetFromNode<T>),
    /// Receives the node holding the container.
    Sequence(SetFromNode<T>),
}

pub struct MemberDescriptor<T> {
    name: String,
    kind: Kind,
    nullable: bool,
    ignored: bool,
    pub(crate) apply: Option<Apply<T>>,
}

impl<T> MemberDescriptor<T> {
    pub(crate) fn new(name: &str, kind: Kind, nullable: bool, apply: Option<Apply<T>>) -> Self {
        MemberDescriptor {
            name: name.to_owned(),
            kind,
            nullable,
            ignored: false,
            apply,
        }
    }

    pub(crate) fn ignore(&mut self) {
        self.ignored = true;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.apply.is_none()
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Only writable, non-ignored members participate in mapping.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        !self.ignored && self.apply.is_some()
    }
}

impl<T> core::fmt::Debug for MemberDescriptor<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("read_only", &self.is_read_only())
            .field("ignored", &self.ignored)
            .finish()
    }
}

#[derive(Debug)]
pub struct TypeDescriptor<T> {
    name: String,
    members: Vec<MemberDescriptor<T>>,
}

impl<T> TypeDescriptor<T> {
    pub(crate) fn new(name: &str) -> Self {
        TypeDescriptor {
            name: name.to_owned(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn members(&self) -> &[MemberDescriptor<T>] {
        &self.members
    }

    pub(crate) fn push(&mut self, member: MemberDescriptor<T>) -> &mut MemberDescriptor<T> {
        self.members.push(member);
        let last = self.members.len() - 1;
        &mut self.members[last]
    }
}

/// Registration surface handed to [`FromNode::describe`].
pub struct Describe<T> {
    descriptor: TypeDescriptor<T>,
}

/// Handle on a just-registered member.
pub struct MemberRef<'a, T>(&'a mut MemberDescriptor<T>);

impl<T> MemberRef<'_, T> {
    /// Excludes the member from mapping; matching nodes never touch it.
    pub fn ignore(self) {
        self.0.ignore();
    }
}

impl<T: 'static> Describe<T> {
    fn new() -> Self {
        Describe {
            descriptor: TypeDescriptor::new(short_type_name::<T>()),
        }
    }

    /// Overrides the type name used to pick items inside containers.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.descriptor.name = name.to_owned();
        self
    }

    fn push(&mut self, member: MemberDescriptor<T>) -> MemberRef<'_, T> {
        MemberRef(self.descriptor.push(member))
    }

    pub fn field<V, F>(&mut self, name: &str, access: F) -> MemberRef<'_, T>
    where
        V: Scalar,
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        let set: SetScalar<T> = Box::new(move |target: &mut T, value: Value| match V::from_value(value) {
            Some(value) => {
                *access(target) = value;
                true
            }
            None => false,
        });
        self.push(MemberDescriptor::new(
            name,
            V::KIND,
            V::NULLABLE,
            Some(Apply::Scalar(set)),
        ))
    }

    /// Nested object; stays `None` unless a matching element exists.
    pub fn object<B, F>(&mut self, name: &str, access: F) -> MemberRef<'_, T>
    where
        B: FromNode,
        F: Fn(&mut T) -> &mut Option<B> + Send + Sync + 'static,
    {
        let set: SetFromNode<T> = Box::new(move |target: &mut T, element: &Element, context: &Context| {
            *access(target) = Some(de::build::<B>(element, context)?);
            Ok(())
        });
        self.push(MemberDescriptor::new(
            name,
            Kind::Object,
            true,
            Some(Apply::Object(set)),
        ))
    }

    /// Sequence of nested objects.
    pub fn list<E, F>(&mut self, name: &str, access: F) -> MemberRef<'_, T>
    where
        E: FromNode,
        F: Fn(&mut T) -> &mut Vec<E> + Send + Sync + 'static,
    {
        let member = name.to_owned();
        let set: SetFromNode<T> = Box::new(move |target: &mut T, node: &Element, context: &Context| {
            *access(target) = de::collection::objects::<E>(node, &member, context)?;
            Ok(())
        });
        self.push(MemberDescriptor::new(
            name,
            Kind::Sequence,
            false,
            Some(Apply::Sequence(set)),
        ))
    }

    /// Sequence of scalars, one per child element of the container.
    pub fn values<S, F>(&mut self, name: &str, access: F) -> MemberRef<'_, T>
    where
        S: Scalar + Default,
        F: Fn(&mut T) -> &mut Vec<S> + Send + Sync + 'static,
    {
        let member = name.to_owned();
        let set: SetFromNode<T> = Box::new(move |target: &mut T, node: &Element, context: &Context| {
            *access(target) = de::collection::values::<S>(node, &member, context)?;
            Ok(())
        });
        self.push(MemberDescriptor::new(
            name,
            Kind::Sequence,
            false,
            Some(Apply::Sequence(set)),
        ))
    }

    /// Sequence wrapper carrying scalar members of its own.
    pub fn collection<C, F>(&mut self, name: &str, access: F) -> MemberRef<'_, T>
    where
        C: Collection,
        F: Fn(&mut T) -> &mut C + Send + Sync + 'static,
    {
        let member = name.to_owned();
        let set: SetFromNode<T> = Box::new(move |target: &mut T, node: &Element, context: &Context| {
            *access(target) = de::collection::wrapper::<C>(node, &member, context)?;
            Ok(())
        });
        self.push(MemberDescriptor::new(
            name,
            Kind::Sequence,
            false,
            Some(Apply::Sequence(set)),
        ))
    }

    /// A member that exists on the type but is never written.
    pub fn read_only(&mut self, name: &str, kind: Kind) -> MemberRef<'_, T> {
        self.push(MemberDescriptor::new(name, kind, false, None))
    }
}

fn short_type_name<T>() -> &'static str {
    let full = core::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

type Registry = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

/// Descriptor of `T`, described on first use and cached by type identity.
#[must_use]
pub fn descriptor<T: FromNode>() -> Arc<TypeDescriptor<T>> {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    let registry = REGISTRY.get_or_init(|| RwLock::new(HashMap::new()));
    let id = TypeId::of::<T>();

    let cached = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();
    if let Some(found) = cached.and_then(|any| any.downcast::<TypeDescriptor<T>>().ok()) {
        return found;
    }

    // describe outside the lock; nested types register themselves lazily
    let mut describe = Describe::<T>::new();
    T::describe(&mut describe);
    let built = Arc::new(describe.descriptor);
    let erased: Arc<dyn Any + Send + Sync> = built.clone();

    let shared = registry
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(id)
        .or_insert(erased)
        .clone();
    shared.downcast::<TypeDescriptor<T>>().unwrap_or(built)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Sample {
        id: Option<u8>,
        label: String,
        tags: Vec<String>,
        hidden: String,
    }

    impl FromNode for Sample {
        fn describe(d: &mut Describe<Self>) {
            d.field("Id", |s: &mut Sample| &mut s.id);
            d.field("Label", |s: &mut Sample| &mut s.label);
            d.values("Tags", |s: &mut Sample| &mut s.tags);
            d.field("Hidden", |s: &mut Sample| &mut s.hidden).ignore();
            d.read_only("Computed", Kind::Integer);
        }
    }

    #[test]
    fn describes_members_in_order() {
        let descriptor = descriptor::<Sample>();
        assert_eq!(descriptor.name(), "Sample");

        let summary: Vec<_> = descriptor
            .members()
            .iter()
            .map(|m| (m.name(), m.kind(), m.is_nullable(), m.is_writable()))
            .collect();
        assert_eq!(
            summary,
            [
                ("Id", Kind::Integer, true, true),
                ("Label", Kind::String, false, true),
                ("Tags", Kind::Sequence, false, true),
                ("Hidden", Kind::String, false, false),
                ("Computed", Kind::Integer, false, false),
            ]
        );
        assert!(descriptor.members()[4].is_read_only());
        assert!(descriptor.members()[3].is_ignored());
    }

    #[test]
    fn cached_by_type() {
        assert!(Arc::ptr_eq(&descriptor::<Sample>(), &descriptor::<Sample>()));
    }

    #[test]
    fn narrows_integers() {
        assert_eq!(u8::from_value(Value::Integer(255)), Some(255));
        assert_eq!(u8::from_value(Value::Integer(256)), None);
        assert_eq!(<Option<u8>>::from_value(Value::Null), Some(None));
        assert_eq!(<Option<u8>>::from_value(Value::Integer(-1)), None);
        assert_eq!(i64::from_value(Value::Integer(i128::from(i64::MAX))), Some(i64::MAX));
        assert_eq!(String::from_value(Value::Integer(1)), None);
    }

    #[test]
    fn short_names() {
        assert_eq!(short_type_name::<Sample>(), "Sample");
        assert_eq!(short_type_name::<Vec<Sample>>(), "Vec");
    }
}
