// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{AsXml, Encoder};
use crate::error::Error;
use crate::xmlstream::{Attribute, Namespaces, QName};

/// A generic element, for content no typed stanza models.
///
/// Besides the parsed tree, a received element keeps its content exactly as
/// it was on the wire in [`Element::inner_xml`]: entity references stay
/// escaped and whitespace is untouched. That markup is only meaningful
/// against the bindings it was received under, which are kept in
/// [`Element::namespaces`].
///
/// When serialised, non-empty `inner_xml` is written back verbatim and the
/// bindings it needs are declared again. Otherwise the element is written
/// from [`Element::text`] followed by [`Element::children`], which is how
/// elements put together with the builder methods are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Qualified name.
    pub name: QName,
    /// Attributes other than namespace declarations.
    pub attrs: Vec<Attribute>,
    /// Child elements.
    pub children: Vec<Element>,
    /// Concatenated character data directly inside this element, with
    /// entity references resolved.
    pub text: String,
    /// Everything between the start and the end tag, verbatim. Empty for
    /// elements which were not received.
    pub inner_xml: String,
    /// Namespace bindings in effect inside the element when it was
    /// received.
    pub namespaces: Namespaces,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: QName) -> Element {
        Element {
            name,
            ..Default::default()
        }
    }

    /// Add an unqualified attribute.
    pub fn with_attr<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Element {
        self.attrs.push(Attribute {
            name: QName::new("", name),
            value: value.into(),
        });
        self
    }

    /// Append character data.
    pub fn with_text(mut self, text: &str) -> Element {
        self.text.push_str(text);
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: Element) -> Element {
        self.children.push(child);
        self
    }

    /// Return true if this element has namespace `ns` and local name
    /// `local`.
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.name.is(ns, local)
    }

    /// Value of the unqualified attribute `local`.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attr_ns("", local)
    }

    /// Value of the attribute `{ns}local`.
    pub fn attr_ns(&self, ns: &str, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name.is(ns, local))
            .map(|attr| attr.value.as_str())
    }

    /// First child named `{ns}local`.
    pub fn get_child(&self, ns: &str, local: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.is(ns, local))
    }

    /// Whether a child named `{ns}local` exists.
    pub fn has_child(&self, ns: &str, local: &str) -> bool {
        self.get_child(ns, local).is_some()
    }

    /// Drop the received markup of this element and all its descendants,
    /// so that it is serialised from the tree.
    pub fn forget_raw(&mut self) {
        self.inner_xml.clear();
        self.namespaces = Namespaces::default();
        for child in &mut self.children {
            child.forget_raw();
        }
    }
}

impl AsXml for Element {
    fn write_xml(&self, w: &mut Encoder) -> Result<(), Error> {
        if self.inner_xml.is_empty() || self.namespaces.is_empty() {
            w.start(&self.name.ns, &self.name.local)?;
        } else {
            w.start_within(&self.name, &self.namespaces)?;
        }
        for attr in &self.attrs {
            w.qualified_attr(&attr.name, &attr.value);
        }
        if self.inner_xml.is_empty() {
            w.text(&self.text)?;
            for child in &self.children {
                child.write_xml(w)?;
            }
        } else {
            w.raw(&self.inner_xml)?;
        }
        w.end()
    }
}
