//! Schema-driven targets.
//!
//! A [`Schema`] describes a type at runtime (usually loaded from JSON);
//! compiling it yields a [`RecordType`] whose descriptor maps documents
//! onto dynamic [`Record`]s with the same rules typed targets follow.

use crate::context::Context;
use core::convert::TryFrom;
use crate::de::coerce::coerce;
use crate::de::{collection, populate, populate_attributes};
use crate::descriptor::{Apply, Kind, MemberDescriptor, TypeDescriptor, Value};
use crate::error::{Error, Result};
use crate::node::Element;
use derive_more::From;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberSchema>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeSchema,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub ignore: bool,
}

/// `"int"`, `{"object": {..}}`, `{"list": "string"}` or
/// `{"collection": {..}, "item": {..}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeSchema {
    Scalar(String),
    Object { object: Schema },
    List { list: Box<TypeSchema> },
    Collection {
        collection: Schema,
        item: Box<TypeSchema>,
    },
}

/// A scalar member type; integers keep the range of their declared width.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct ScalarType {
    kind: Kind,
    range: Option<(i128, i128)>,
}

fn width<T: Into<i128>>(min: T, max: T) -> Option<(i128, i128)> {
    Some((min.into(), max.into()))
}

impl ScalarType {
    fn parse(token: &str) -> Option<Self> {
        let (kind, range) = match token.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => (Kind::String, None),
            "bool" | "boolean" => (Kind::Boolean, None),
            "sbyte" | "i8" => (Kind::Integer, width(i8::MIN, i8::MAX)),
            "byte" | "u8" => (Kind::Integer, width(u8::MIN, u8::MAX)),
            "short" | "i16" => (Kind::Integer, width(i16::MIN, i16::MAX)),
            "ushort" | "u16" => (Kind::Integer, width(u16::MIN, u16::MAX)),
            "int" | "integer" | "i32" => (Kind::Integer, width(i32::MIN, i32::MAX)),
            "uint" | "u32" => (Kind::Integer, width(u32::MIN, u32::MAX)),
            "long" | "i64" => (Kind::Integer, width(i64::MIN, i64::MAX)),
            "ulong" | "u64" => (Kind::Integer, width(u64::MIN, u64::MAX)),
            "float" | "double" | "single" | "f32" | "f64" => (Kind::Floating, None),
            "decimal" | "money" => (Kind::Decimal, None),
            "guid" | "uuid" => (Kind::Uuid, None),
            "datetime" | "date-time" | "date" | "timestamp" => (Kind::DateTime, None),
            _ => return None,
        };
        Some(ScalarType { kind, range })
    }

    /// Whether `value` fits the declared width.
    fn admits(self, value: &Value) -> bool {
        match (value, self.range) {
            (Value::Integer(i), Some((min, max))) => min <= *i && *i <= max,
            _ => true,
        }
    }
}

impl Schema {
    /// # Errors
    ///
    /// `serde_json`'s error for invalid schema JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Checks every member type and builds the descriptor.
    ///
    /// # Errors
    ///
    /// `UnsupportedMemberType` for a member whose type has no rule.
    pub fn compile(&self) -> Result<RecordType> {
        let mut descriptor = TypeDescriptor::new(&self.name);
        let mut defaults = Vec::with_capacity(self.members.len());

        for member in &self.members {
            let (kind, default, apply) = compile_member(member)?;
            defaults.push((member.name.clone(), default));
            let apply = if member.read_only { None } else { Some(apply) };
            let registered =
                descriptor.push(MemberDescriptor::new(&member.name, kind, member.nullable, apply));
            if member.ignore {
                registered.ignore();
            }
        }

        Ok(RecordType {
            name: self.name.clone(),
            defaults,
            descriptor,
        })
    }
}

fn unsupported(member: &str, type_name: &str) -> Error {
    Error::UnsupportedMemberType {
        member: member.to_owned(),
        type_name: type_name.to_owned(),
    }
}

fn compile_member(member: &MemberSchema) -> Result<(Kind, Entry, Apply<Record>)> {
    let name = member.name.clone();
    let compiled = match member.ty {
        TypeSchema::Scalar(ref token) => {
            let scalar = ScalarType::parse(token).ok_or_else(|| unsupported(&name, token))?;
            let default = Entry::Value(Value::default_for(scalar.kind, member.nullable));
            let apply = Apply::Scalar(Box::new(move |record: &mut Record, value: Value| {
                if !scalar.admits(&value) {
                    return false;
                }
                record.set(&name, Entry::Value(value));
                true
            }));
            (scalar.kind, default, apply)
        }
        TypeSchema::Object { ref object } => {
            let nested = Arc::new(object.compile()?);
            let apply = Apply::Object(Box::new(move |record: &mut Record, element: &Element, context: &Context| {
                let mut child = nested.instance();
                populate(&mut child, element, &nested.descriptor, context)?;
                record.set(&name, Entry::Record(child));
                Ok(())
            }));
            (Kind::Object, Entry::Value(Value::Null), apply)
        }
        TypeSchema::List { ref list } => {
            let item = ItemType::compile(&name, list)?;
            let apply = Apply::Sequence(Box::new(move |record: &mut Record, node: &Element, context: &Context| {
                let items = collection::sequence(node, &name, item.name(), context, |element| {
                    item.build(element, context)
                })?;
                record.set(&name, Entry::List(items));
                Ok(())
            }));
            (Kind::Sequence, Entry::List(Vec::new()), apply)
        }
        TypeSchema::Collection {
            collection: ref wrapper_schema,
            ref item,
        } => {
            let wrapper = Arc::new(wrapper_schema.compile()?);
            let item = ItemType::compile(&name, item)?;
            let default = Entry::Record(wrapper.empty_collection());
            let apply = Apply::Sequence(Box::new(move |record: &mut Record, node: &Element, context: &Context| {
                let mut instance = wrapper.empty_collection();
                if let Some(container) = collection::container(node, &name, context) {
                    populate_attributes(&mut instance, container, &wrapper.descriptor, context)
                        .map_err(|e| e.within(&name))?;
                    let items = collection::collect(container, item.name(), context, |element| {
                        item.build(element, context)
                    })
                    .map_err(|e| e.within(&name))?;
                    instance.items = Some(items);
                }
                record.set(&name, Entry::Record(instance));
                Ok(())
            }));
            (Kind::Sequence, default, apply)
        }
    };
    Ok(compiled)
}

enum ItemType {
    Scalar(ScalarType),
    Object(Arc<RecordType>),
}

impl ItemType {
    fn compile(member: &str, ty: &TypeSchema) -> Result<Self> {
        match *ty {
            TypeSchema::Scalar(ref token) => ScalarType::parse(token)
                .map(ItemType::Scalar)
                .ok_or_else(|| unsupported(member, token)),
            TypeSchema::Object { ref object } => Ok(ItemType::Object(Arc::new(object.compile()?))),
            TypeSchema::List { .. } => Err(unsupported(member, "list of list")),
            TypeSchema::Collection { .. } => Err(unsupported(member, "list of collection")),
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            ItemType::Scalar(_) => None,
            ItemType::Object(record_type) => Some(&record_type.name),
        }
    }

    fn build(&self, element: &Element, context: &Context) -> Result<Entry> {
        match self {
            ItemType::Scalar(scalar) => {
                let value = coerce("", element.text(), scalar.kind, false, context)?
                    .unwrap_or_else(|| Value::default_for(scalar.kind, false));
                if !scalar.admits(&value) {
                    return Err(Error::coercion("", element.text(), scalar.kind));
                }
                Ok(Entry::Value(value))
            }
            ItemType::Object(record_type) => {
                let mut child = record_type.instance();
                populate(&mut child, element, &record_type.descriptor, context)?;
                Ok(Entry::Record(child))
            }
        }
    }
}

/// A compiled [`Schema`].
#[derive(Debug)]
pub struct RecordType {
    name: String,
    defaults: Vec<(String, Entry)>,
    descriptor: TypeDescriptor<Record>,
}

impl RecordType {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn descriptor(&self) -> &TypeDescriptor<Record> {
        &self.descriptor
    }

    /// A record with every member at its default.
    #[must_use]
    pub fn instance(&self) -> Record {
        Record {
            name: self.name.clone(),
            fields: self.defaults.clone(),
            items: None,
        }
    }

    fn empty_collection(&self) -> Record {
        Record {
            items: Some(Vec::new()),
            ..self.instance()
        }
    }
}

/// A dynamic instance: fields in declaration order, plus items when the
/// record is a collection wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    fields: Vec<(String, Entry)>,
    items: Option<Vec<Entry>>,
}

impl Record {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, Entry)] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, entry)| entry)
    }

    #[must_use]
    pub fn items(&self) -> Option<&[Entry]> {
        self.items.as_deref()
    }

    fn set(&mut self, name: &str, entry: Entry) {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = entry,
            None => self.fields.push((name.to_owned(), entry)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, From)]
pub enum Entry {
    Value(Value),
    Record(Record),
    List(Vec<Entry>),
}

impl Entry {
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Entry::Record(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Entry]> {
        match self {
            Entry::List(list) => Some(list.as_slice()),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => {
                if let Ok(small) = i64::try_from(*i) {
                    serializer.serialize_i64(small)
                } else if let Ok(large) = u64::try_from(*i) {
                    serializer.serialize_u64(large)
                } else {
                    serializer.collect_str(i)
                }
            }
            Value::Floating(f) => serializer.serialize_f64(*f),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::Uuid(u) => serializer.collect_str(&u.hyphenated()),
            Value::DateTime(dt) => serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl Serialize for Entry {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Entry::Value(value) => value.serialize(serializer),
            Entry::Record(record) => record.serialize(serializer),
            Entry::List(list) => serializer.collect_seq(list),
        }
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        for (name, entry) in &self.fields {
            map.serialize_entry(name, entry)?;
        }
        if let Some(ref items) = self.items {
            map.serialize_entry("items", items)?;
        }
        map.end()
    }
}
