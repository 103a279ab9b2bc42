use super::coerce::coerce;
use super::{build_with, populate_attributes};
use crate::context::Context;
use crate::descriptor::{descriptor, Collection, FromNode, Scalar};
use crate::error::{Error, Result};
use crate::name;
use crate::node::Element;
use log::debug;

/// Child of `node` holding the items of `member`.
pub(crate) fn container<'n>(node: &'n Element, member: &str, context: &Context) -> Option<&'n Element> {
    let found = node.child(member, context.separator);
    if found.is_none() {
        debug!("no container for `{}` under <{}>", member, node.name);
    }
    found
}

/// Children named after the item type, or every child when none is.
fn items<'n>(container: &'n Element, item_name: Option<&str>, context: &Context) -> Vec<&'n Element> {
    if let Some(item_name) = item_name {
        let named: Vec<_> = container
            .children
            .iter()
            .filter(|child| name::matches(item_name, &child.name, context.separator))
            .collect();
        if !named.is_empty() {
            return named;
        }
    }
    container.children.iter().collect()
}

/// Builds one item per child of `container`, in document order.
pub(crate) fn collect<I, F>(
    container: &Element,
    item_name: Option<&str>,
    context: &Context,
    mut build: F,
) -> Result<Vec<I>>
where
    F: FnMut(&Element) -> Result<I>,
{
    items(container, item_name, context)
        .into_iter()
        .enumerate()
        .map(|(index, item)| build(item).map_err(|e| e.within(&format!("[{}]", index))))
        .collect()
}

/// Items of `member` under `node`; empty when the container is absent.
pub(crate) fn sequence<I, F>(
    node: &Element,
    member: &str,
    item_name: Option<&str>,
    context: &Context,
    build: F,
) -> Result<Vec<I>>
where
    F: FnMut(&Element) -> Result<I>,
{
    match container(node, member, context) {
        Some(container) => {
            collect(container, item_name, context, build).map_err(|e| e.within(member))
        }
        None => Ok(Vec::new()),
    }
}

pub(crate) fn objects<E: FromNode>(node: &Element, member: &str, context: &Context) -> Result<Vec<E>> {
    let descriptor = descriptor::<E>();
    sequence(node, member, Some(descriptor.name()), context, |item| {
        build_with(item, &descriptor, context)
    })
}

pub(crate) fn values<S>(node: &Element, member: &str, context: &Context) -> Result<Vec<S>>
where
    S: Scalar + Default,
{
    sequence(node, member, None, context, |item| scalar_item(item, context))
}

/// Empty non-nullable items take the type's default.
pub(crate) fn scalar_item<S>(item: &Element, context: &Context) -> Result<S>
where
    S: Scalar + Default,
{
    match coerce("", item.text(), S::KIND, S::NULLABLE, context)? {
        Some(value) => S::from_value(value).ok_or_else(|| Error::coercion("", item.text(), S::KIND)),
        None => Ok(S::default()),
    }
}

/// The wrapper's own scalars come from the container's attributes, its
/// items from the container's children.
pub(crate) fn wrapper<C: Collection>(node: &Element, member: &str, context: &Context) -> Result<C> {
    let mut wrapper = C::default();
    if let Some(container) = container(node, member, context) {
        populate_attributes(&mut wrapper, container, &descriptor::<C>(), context)
            .map_err(|e| e.within(member))?;
        let item = descriptor::<C::Item>();
        *wrapper.items_mut() = collect(container, Some(item.name()), context, |child| {
            build_with(child, &item, context)
        })
        .map_err(|e| e.within(member))?;
    }
    Ok(wrapper)
}
