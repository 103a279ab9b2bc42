pub(crate) mod coerce;
pub(crate) mod collection;
pub(crate) mod date;
mod resolve;

use crate::context::{Context, Locale};
use crate::descriptor::{descriptor, Apply, FromNode, TypeDescriptor};
use crate::error::{Error, Result};
use crate::node::Element;
use log::{debug, trace};
use coerce::coerce;
use resolve::{resolve, resolve_attribute, ResolvedSource};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Scope {
    Node,
    /// Container attributes of a collection wrapper: scalars only.
    Attributes,
}

pub(crate) fn build<T: FromNode>(node: &Element, context: &Context) -> Result<T> {
    build_with(node, &descriptor::<T>(), context)
}

pub(crate) fn build_with<T: Default>(
    node: &Element,
    descriptor: &TypeDescriptor<T>,
    context: &Context,
) -> Result<T> {
    let mut target = T::default();
    populate(&mut target, node, descriptor, context)?;
    Ok(target)
}

pub(crate) fn populate<T>(
    target: &mut T,
    node: &Element,
    descriptor: &TypeDescriptor<T>,
    context: &Context,
) -> Result<()> {
    populate_scoped(target, node, descriptor, context, Scope::Node)
}

pub(crate) fn populate_attributes<T>(
    target: &mut T,
    node: &Element,
    descriptor: &TypeDescriptor<T>,
    context: &Context,
) -> Result<()> {
    populate_scoped(target, node, descriptor, context, Scope::Attributes)
}

// Members are visited in declaration order; a failure leaves earlier
// assignments in place.
fn populate_scoped<T>(
    target: &mut T,
    node: &Element,
    descriptor: &TypeDescriptor<T>,
    context: &Context,
    scope: Scope,
) -> Result<()> {
    for member in descriptor.members() {
        let apply = match member.apply {
            Some(ref apply) if !member.is_ignored() => apply,
            _ => continue,
        };

        match apply {
            Apply::Scalar(set) => {
                let source = match scope {
                    Scope::Node => resolve(member.name(), node, context),
                    Scope::Attributes => resolve_attribute(member.name(), node, context),
                };
                trace!("<{}> {} -> {:?}", node.name, member.name(), source);

                let raw = match source.text() {
                    Some(raw) => raw,
                    None => continue,
                };
                let value = coerce(
                    member.name(),
                    raw,
                    member.kind(),
                    member.is_nullable(),
                    context,
                )?;
                if let Some(value) = value {
                    if !set(&mut *target, value) {
                        return Err(Error::coercion(member.name(), raw, member.kind()));
                    }
                }
            }
            Apply::Object(set) if scope == Scope::Node => {
                if let ResolvedSource::Element(element) = resolve(member.name(), node, context) {
                    set(&mut *target, element, context).map_err(|e| e.within(member.name()))?;
                }
            }
            Apply::Sequence(set) if scope == Scope::Node => set(&mut *target, node, context)?,
            Apply::Object(_) | Apply::Sequence(_) => {}
        }
    }
    Ok(())
}

/// The node mapping starts from: the root itself, or the first element
/// named by the context's root element when one matches.
#[must_use]
pub fn effective_root<'n>(root: &'n Element, context: &Context) -> &'n Element {
    let name = match context.root_element {
        Some(ref name) => name,
        None => return root,
    };
    match root.find(name, context.separator) {
        Some(found) => found,
        None => {
            debug!("root element `{}` not found, using <{}>", name, root.name);
            root
        }
    }
}

/// Entry point: owns the per-call configuration.
///
/// Settings are fixed once the deserializer is shared; deserializations
/// with different date formats use different deserializers.
#[derive(Debug, Clone, Default)]
pub struct Deserializer {
    context: Context,
}

impl Deserializer {
    #[must_use]
    pub fn new() -> Self {
        Deserializer::default()
    }

    #[must_use]
    pub fn with_context(context: Context) -> Self {
        Deserializer { context }
    }

    #[must_use]
    pub fn date_format(mut self, pattern: &str) -> Self {
        self.set_date_format(pattern);
        self
    }

    pub fn set_date_format(&mut self, pattern: &str) {
        self.context = self.context.clone().with_date_format(pattern);
    }

    #[must_use]
    pub fn locale(mut self, locale: Locale) -> Self {
        self.context = self.context.with_locale(locale);
        self
    }

    #[must_use]
    pub fn separator(mut self, separator: char) -> Self {
        self.context = self.context.with_separator(separator);
        self
    }

    #[must_use]
    pub fn root_element(mut self, name: &str) -> Self {
        self.context = self.context.with_root_element(name);
        self
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Parses `content` and maps its root onto a new `T`.
    ///
    /// # Errors
    ///
    /// `DocumentMalformed` for unparsable input, `CoercionFailure` for a
    /// value that does not fit its member.
    pub fn deserialize<T: FromNode>(&self, content: &str) -> Result<T> {
        let root = Element::parse(content)?;
        self.deserialize_element(&root)
    }

    /// # Errors
    ///
    /// `CoercionFailure` for a value that does not fit its member.
    pub fn deserialize_element<T: FromNode>(&self, root: &Element) -> Result<T> {
        from_element(root, &self.context)
    }

    /// Maps `content` onto `target` through an explicit descriptor.
    ///
    /// # Errors
    ///
    /// Same as [`Deserializer::deserialize`].
    pub fn deserialize_into<T>(
        &self,
        content: &str,
        mut target: T,
        descriptor: &TypeDescriptor<T>,
    ) -> Result<T> {
        let root = Element::parse(content)?;
        populate(
            &mut target,
            effective_root(&root, &self.context),
            descriptor,
            &self.context,
        )?;
        Ok(target)
    }
}

/// Deserializes with the default context.
///
/// # Errors
///
/// Same as [`Deserializer::deserialize`].
pub fn from_str<T: FromNode>(content: &str) -> Result<T> {
    Deserializer::new().deserialize(content)
}

/// Maps an already parsed root onto a new `T`; the root's own name is not checked.
///
/// # Errors
///
/// `CoercionFailure` for a value that does not fit its member.
pub fn from_element<T: FromNode>(root: &Element, context: &Context) -> Result<T> {
    build(effective_root(root, context), context)
}
