use crate::error::Result;
use crate::name;

/// One element of a parsed document: local name, attributes, child
/// elements and own text, all owned.
///
/// Comments, processing instructions and namespace information are not
/// kept; names are local names.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    /// Parses `content` and returns its root element.
    ///
    /// # Errors
    ///
    /// `Error::DocumentMalformed` if `content` is not well-formed XML.
    pub fn parse(content: &str) -> Result<Self> {
        let document = roxmltree::Document::parse(content)?;
        Ok(Element::from(document.root_element()))
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Own text, or `""` for an element without text.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// First child whose name canonically matches `name`.
    #[must_use]
    pub fn child(&self, name: &str, separator: char) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| name::matches(name, &child.name, separator))
    }

    /// Value of the first attribute whose name canonically matches `name`.
    #[must_use]
    pub fn attribute(&self, name: &str, separator: char) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attribute, _)| name::matches(name, attribute, separator))
            .map(|(_, value)| value.as_str())
    }

    /// Depth-first, document-order search starting with `self`.
    #[must_use]
    pub fn find(&self, name: &str, separator: char) -> Option<&Element> {
        if name::matches(name, &self.name, separator) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find(name, separator))
    }
}

impl<'a, 'input> From<roxmltree::Node<'a, 'input>> for Element {
    fn from(node: roxmltree::Node<'a, 'input>) -> Self {
        let attributes = node
            .attributes()
            .map(|attribute| (attribute.name().to_owned(), attribute.value().to_owned()))
            .collect();

        let mut children = Vec::new();
        let mut text: Option<String> = None;
        for child in node.children() {
            if child.is_element() {
                children.push(Element::from(child));
            } else if let Some(fragment) = child.text().filter(|_| child.is_text()) {
                text.get_or_insert_with(String::new).push_str(fragment);
            }
        }

        Element {
            name: node.tag_name().name().to_owned(),
            attributes,
            children,
            text,
        }
    }
}
