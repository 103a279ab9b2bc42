use crate::context::Context;
use crate::node::Element;

/// Where a member's value comes from within one node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ResolvedSource<'n> {
    Element(&'n Element),
    Attribute(&'n str),
    NotFound,
}

impl<'n> ResolvedSource<'n> {
    /// Raw text the source supplies, if found.
    pub(crate) fn text(self) -> Option<&'n str> {
        match self {
            ResolvedSource::Element(element) => Some(element.text()),
            ResolvedSource::Attribute(value) => Some(value),
            ResolvedSource::NotFound => None,
        }
    }
}

/// Child elements first, then attributes; the first canonical match wins.
pub(crate) fn resolve<'n>(member: &str, node: &'n Element, context: &Context) -> ResolvedSource<'n> {
    if let Some(element) = node.child(member, context.separator) {
        return ResolvedSource::Element(element);
    }
    resolve_attribute(member, node, context)
}

pub(crate) fn resolve_attribute<'n>(
    member: &str,
    node: &'n Element,
    context: &Context,
) -> ResolvedSource<'n> {
    match node.attribute(member, context.separator) {
        Some(value) => ResolvedSource::Attribute(value),
        None => ResolvedSource::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Element {
        Element::new("Person")
            .with_attribute("Age", "28")
            .with_attribute("Start_Date", "attribute")
            .with_child(Element::new("startdate").with_text("element"))
            .with_child(Element::new("START_DATE").with_text("duplicate"))
    }

    #[test]
    fn element_wins_over_attribute() {
        let node = person();
        let context = Context::default();
        match resolve("StartDate", &node, &context) {
            ResolvedSource::Element(element) => assert_eq!(element.text(), "element"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            resolve_attribute("StartDate", &node, &context),
            ResolvedSource::Attribute("attribute")
        );
    }

    #[test]
    fn attribute_then_not_found() {
        let node = person();
        let context = Context::default();
        assert_eq!(resolve("age", &node, &context).text(), Some("28"));
        assert_eq!(resolve("Name", &node, &context), ResolvedSource::NotFound);
        assert_eq!(resolve("Name", &node, &context).text(), None);
    }
}
