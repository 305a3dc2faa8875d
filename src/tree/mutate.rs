//! Validated structural mutation.
//!
//! These are the public mutators. Each one checks the tree invariants
//! (single ownership, acyclicity, child-kind rules, one document element)
//! before delegating to the raw linking primitives in the parent module.

use thiserror::Error;
use tracing::debug;

use super::{Document, NodeId, NodeKind};

/// A structural mutation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The node being attached already has a parent. Detach it first.
    #[error("node is already owned by another parent")]
    AlreadyOwned,
    /// The node being attached is the target itself or one of its ancestors.
    #[error("attaching this node would create a cycle")]
    Cycle,
    /// The node kind is not allowed at this position.
    #[error("invalid child: {reason}")]
    InvalidChild {
        /// What rule was violated.
        reason: String,
    },
    /// The target of an attribute operation is not an element.
    #[error("target node is not an element")]
    NotAnElement,
    /// The document already has a document element.
    #[error("document already has a root element")]
    MultipleRoots,
    /// The node kind has no string value to set.
    #[error("node has no settable string value")]
    NoStringValue,
    /// The node kind has no name to set.
    #[error("node has no settable name")]
    NoName,
    /// Renaming would give an element two attributes with the same name.
    #[error("duplicate attribute '{name}'")]
    DuplicateAttribute {
        /// The conflicting qualified name.
        name: String,
    },
    /// A child index was past the end of the child list.
    #[error("child index {index} out of range for {len} children")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of children.
        len: usize,
    },
}

fn reject<T>(err: MutationError) -> Result<T, MutationError> {
    debug!(%err, "rejected mutation");
    Err(err)
}

fn invalid_child<T>(reason: impl Into<String>) -> Result<T, MutationError> {
    reject(MutationError::InvalidChild {
        reason: reason.into(),
    })
}

impl Document {
    /// Checks that `child` may become a child of `parent`.
    fn validate_child(&self, parent: NodeId, child: NodeId) -> Result<(), MutationError> {
        if self.ancestors(parent).any(|id| id == child) {
            return reject(MutationError::Cycle);
        }
        if self.parent(child).is_some() {
            return reject(MutationError::AlreadyOwned);
        }

        let parent_kind = self.kind(parent);
        let child_kind = self.kind(child);
        if parent_kind.is_leaf() {
            return invalid_child(format!("{} nodes cannot have children", parent_kind.label()));
        }
        match child_kind {
            NodeKind::Document | NodeKind::Attribute { .. } => {
                return invalid_child(format!("{} nodes cannot be children", child_kind.label()));
            }
            _ => {}
        }

        if matches!(parent_kind, NodeKind::Document) {
            match child_kind {
                NodeKind::Element { .. } if self.root_element().is_some() => {
                    return reject(MutationError::MultipleRoots);
                }
                NodeKind::DocumentType { .. }
                    if self
                        .children(parent)
                        .any(|c| matches!(self.kind(c), NodeKind::DocumentType { .. })) =>
                {
                    return invalid_child("document already has a document type");
                }
                NodeKind::Text { .. } | NodeKind::CData { .. } => {
                    return invalid_child("character data is not allowed at document level");
                }
                _ => {}
            }
        } else if matches!(child_kind, NodeKind::DocumentType { .. }) {
            return invalid_child("a document type may only appear at document level");
        }
        Ok(())
    }

    /// Appends an unowned node as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails with [`MutationError::Cycle`] if `child` is `parent` or one of its
    /// ancestors, [`MutationError::AlreadyOwned`] if `child` has a parent,
    /// [`MutationError::MultipleRoots`] if a second element is added to the
    /// document node, and [`MutationError::InvalidChild`] for kinds that may
    /// not appear there.
    ///
    /// # Examples
    ///
    /// ```
    /// use jebixml::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.create_element("root");
    /// doc.add_child(doc.root(), root).unwrap();
    /// let child = doc.create_element("child");
    /// doc.add_child(root, child).unwrap();
    /// assert_eq!(doc.parent(child), Some(root));
    /// assert!(doc.add_child(root, child).is_err());
    /// ```
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), MutationError> {
        self.validate_child(parent, child)?;
        self.append_child(parent, child);
        Ok(())
    }

    /// Inserts an unowned node so that it becomes child number `index`.
    ///
    /// `index` may equal the child count, which appends.
    ///
    /// # Errors
    ///
    /// Same as [`Document::add_child`], plus
    /// [`MutationError::IndexOutOfRange`].
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), MutationError> {
        let len = self.child_count(parent);
        if index > len {
            return reject(MutationError::IndexOutOfRange { index, len });
        }
        self.validate_child(parent, child)?;
        let before = self.children(parent).nth(index);
        self.link_child(parent, child, before);
        Ok(())
    }

    /// Detaches child number `index` from `parent` and returns it.
    ///
    /// Returns `None` when there is no such child.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let child = self.children(parent).nth(index)?;
        self.detach(child);
        Some(child)
    }

    /// Detaches a node from its parent.
    ///
    /// The node stays in the arena as the root of an independent fragment
    /// and can be attached elsewhere. Attributes are removed from their
    /// element's attribute list. Detaching a node that has no parent is a
    /// no-op.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.slot(id).parent else {
            return;
        };

        if matches!(self.kind(id), NodeKind::Attribute { .. }) {
            if let NodeKind::Element { attributes, .. } = &mut self.slot_mut(parent).kind {
                attributes.retain(|&a| a != id);
            }
            self.slot_mut(id).parent = None;
            return;
        }

        let prev = self.slot(id).prev;
        let next = self.slot(id).next;

        match prev {
            Some(p) => self.slot_mut(p).next = next,
            None => self.slot_mut(parent).first = next,
        }

        match next {
            Some(n) => self.slot_mut(n).prev = prev,
            None => self.slot_mut(parent).last = prev,
        }

        let node = self.slot_mut(id);
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    /// Adds an unowned attribute node to an element.
    ///
    /// If the element already has an attribute with the same qualified name,
    /// the new node takes its position and the old one is detached and
    /// returned.
    ///
    /// # Errors
    ///
    /// Fails with [`MutationError::NotAnElement`] if `element` is not an
    /// element, [`MutationError::InvalidChild`] if `attr` is not an attribute,
    /// and [`MutationError::AlreadyOwned`] if `attr` already belongs to an
    /// element.
    pub fn add_attribute(
        &mut self,
        element: NodeId,
        attr: NodeId,
    ) -> Result<Option<NodeId>, MutationError> {
        if !matches!(self.kind(element), NodeKind::Element { .. }) {
            return reject(MutationError::NotAnElement);
        }
        let NodeKind::Attribute { name, .. } = self.kind(attr) else {
            return invalid_child("only attribute nodes can be added as attributes");
        };
        if self.parent(attr).is_some() {
            return reject(MutationError::AlreadyOwned);
        }

        let existing = self.attributes(element).iter().position(|&a| {
            matches!(self.kind(a), NodeKind::Attribute { name: other, .. } if other == name)
        });
        let replaced = match existing {
            Some(index) => {
                let old = self.attributes(element)[index];
                if let NodeKind::Element { attributes, .. } = &mut self.slot_mut(element).kind {
                    attributes[index] = attr;
                }
                self.slot_mut(attr).parent = Some(element);
                self.slot_mut(old).parent = None;
                Some(old)
            }
            None => {
                self.push_attribute(element, attr);
                None
            }
        };
        Ok(replaced)
    }

    /// Removes the attribute matching `name` (see [`Document::attribute`]).
    ///
    /// Returns the detached attribute node, or `None` if nothing matched.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> Option<NodeId> {
        let attr = self.attribute(element, name)?;
        self.detach(attr);
        Some(attr)
    }

    /// Replaces the string value of a node.
    ///
    /// On an element this detaches every child and, unless `value` is empty,
    /// appends a single text node holding `value`. Escaping happens at
    /// serialization time, not here.
    ///
    /// # Errors
    ///
    /// Fails with [`MutationError::NoStringValue`] on document and document
    /// type nodes.
    pub fn set_string_value(&mut self, id: NodeId, value: &str) -> Result<(), MutationError> {
        match &mut self.slot_mut(id).kind {
            NodeKind::Element { .. } => {}
            NodeKind::Attribute { value: slot, .. }
            | NodeKind::Text { content: slot }
            | NodeKind::CData { content: slot }
            | NodeKind::Comment { content: slot } => {
                value.clone_into(slot);
                return Ok(());
            }
            NodeKind::ProcessingInstruction { data, .. } => {
                *data = (!value.is_empty()).then(|| value.to_string());
                return Ok(());
            }
            NodeKind::Document | NodeKind::DocumentType { .. } => {
                return reject(MutationError::NoStringValue);
            }
        }

        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
        if !value.is_empty() {
            let text = self.create_text(value);
            self.append_child(id, text);
        }
        Ok(())
    }

    /// Renames an element, attribute, or processing instruction.
    ///
    /// # Errors
    ///
    /// Fails with [`MutationError::NoName`] for unnamed kinds and
    /// [`MutationError::DuplicateAttribute`] if an owned attribute would
    /// collide with a sibling attribute.
    pub fn set_name(&mut self, id: NodeId, new_name: &str) -> Result<(), MutationError> {
        if matches!(self.kind(id), NodeKind::Attribute { .. }) {
            if let Some(owner) = self.parent(id) {
                let collides = self.attributes(owner).iter().any(|&a| {
                    a != id
                        && matches!(self.kind(a), NodeKind::Attribute { name, .. } if name == new_name)
                });
                if collides {
                    return reject(MutationError::DuplicateAttribute {
                        name: new_name.to_string(),
                    });
                }
            }
        }

        match &mut self.slot_mut(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::Attribute { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => {
                new_name.clone_into(name);
                Ok(())
            }
            _ => reject(MutationError::NoName),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .map(|c| doc.node_name(c).unwrap_or("#text").to_string())
            .collect()
    }

    #[test]
    fn test_add_child_rejects_owned_node() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.add_child(a, c).unwrap();
        assert_eq!(doc.add_child(b, c), Err(MutationError::AlreadyOwned));
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.add_child(a, b).unwrap();
        assert_eq!(doc.add_child(b, a), Err(MutationError::Cycle));
        assert_eq!(doc.add_child(a, a), Err(MutationError::Cycle));
    }

    #[test]
    fn test_leaf_cannot_take_children() {
        let mut doc = Document::new();
        let text = doc.create_text("t");
        let e = doc.create_element("e");
        assert!(matches!(
            doc.add_child(text, e),
            Err(MutationError::InvalidChild { .. })
        ));
    }

    #[test]
    fn test_attribute_is_not_a_child() {
        let mut doc = Document::new();
        let e = doc.create_element("e");
        let attr = doc.create_attribute("a", "1");
        assert!(matches!(
            doc.add_child(e, attr),
            Err(MutationError::InvalidChild { .. })
        ));
    }

    #[test]
    fn test_document_accepts_one_root() {
        let mut doc = Document::new();
        let root = doc.root();
        let first = doc.create_element("first");
        let second = doc.create_element("second");
        let comment = doc.create_comment("ok");
        let text = doc.create_text("nope");

        doc.add_child(root, comment).unwrap();
        doc.add_child(root, first).unwrap();
        assert_eq!(doc.add_child(root, second), Err(MutationError::MultipleRoots));
        assert!(doc.add_child(root, text).is_err());
        assert_eq!(doc.root_element(), Some(first));
    }

    #[test]
    fn test_insert_and_remove_child_by_index() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let a = doc.create_element("a");
        let c = doc.create_element("c");
        let b = doc.create_element("b");
        doc.add_child(p, a).unwrap();
        doc.add_child(p, c).unwrap();
        doc.insert_child(p, 1, b).unwrap();
        assert_eq!(names(&doc, p), vec!["a", "b", "c"]);

        let d = doc.create_element("d");
        doc.insert_child(p, 3, d).unwrap();
        let e = doc.create_element("e");
        assert_eq!(
            doc.insert_child(p, 9, e),
            Err(MutationError::IndexOutOfRange { index: 9, len: 4 })
        );

        assert_eq!(doc.remove_child(p, 0), Some(a));
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.remove_child(p, 10), None);
        assert_eq!(names(&doc, p), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.add_child(p, a).unwrap();
        doc.add_child(p, b).unwrap();

        doc.detach(a);
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.first_child(p), Some(b));
        assert_eq!(doc.prev_sibling(b), None);

        doc.detach(a);
        doc.detach(p);
        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_add_then_remove_attribute() {
        let mut doc = Document::new();
        let e = doc.create_element("e");
        let attr = doc.create_attribute("a", "v");
        assert_eq!(doc.add_attribute(e, attr), Ok(None));
        assert_eq!(doc.attribute_value(e, "a"), Some("v"));

        assert_eq!(doc.remove_attribute(e, "a"), Some(attr));
        assert_eq!(doc.attribute(e, "a"), None);
        assert_eq!(doc.parent(attr), None);
        assert_eq!(doc.remove_attribute(e, "a"), None);
    }

    #[test]
    fn test_add_attribute_overwrites_in_place() {
        let mut doc = Document::new();
        let e = doc.create_element("e");
        let first = doc.create_attribute("a", "1");
        let other = doc.create_attribute("b", "2");
        let second = doc.create_attribute("a", "3");
        doc.add_attribute(e, first).unwrap();
        doc.add_attribute(e, other).unwrap();

        assert_eq!(doc.add_attribute(e, second), Ok(Some(first)));
        assert_eq!(doc.attributes(e), &[second, other]);
        assert_eq!(doc.parent(first), None);
    }

    #[test]
    fn test_add_attribute_validates_kinds() {
        let mut doc = Document::new();
        let e = doc.create_element("e");
        let text = doc.create_text("t");
        let attr = doc.create_attribute("a", "1");
        assert_eq!(doc.add_attribute(text, attr), Err(MutationError::NotAnElement));
        assert!(matches!(
            doc.add_attribute(e, text),
            Err(MutationError::InvalidChild { .. })
        ));
        doc.add_attribute(e, attr).unwrap();
        let other = doc.create_element("other");
        assert_eq!(doc.add_attribute(other, attr), Err(MutationError::AlreadyOwned));
    }

    #[test]
    fn test_detach_attribute() {
        let mut doc = Document::new();
        let e = doc.create_element("e");
        let attr = doc.create_attribute("a", "1");
        doc.add_attribute(e, attr).unwrap();
        doc.detach(attr);
        assert!(doc.attributes(e).is_empty());
        assert_eq!(doc.parent(attr), None);
    }

    #[test]
    fn test_set_string_value_replaces_children() {
        let mut doc = Document::parse_str("<a>x<b>y</b>z</a>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_string_value(a, "1 < 2").unwrap();
        assert_eq!(doc.child_count(a), 1);
        assert_eq!(doc.string_value(a).as_deref(), Some("1 < 2"));

        doc.set_string_value(a, "").unwrap();
        assert_eq!(doc.first_child(a), None);

        let root = doc.root();
        assert_eq!(
            doc.set_string_value(root, "x"),
            Err(MutationError::NoStringValue)
        );
    }

    #[test]
    fn test_set_string_value_on_leaves() {
        let mut doc = Document::new();
        let attr = doc.create_attribute("a", "old");
        let pi = doc.create_processing_instruction("t", None);
        doc.set_string_value(attr, "new").unwrap();
        doc.set_string_value(pi, "data").unwrap();
        assert_eq!(doc.string_value(attr).as_deref(), Some("new"));
        assert_eq!(doc.string_value(pi).as_deref(), Some("data"));
    }

    #[test]
    fn test_set_name() {
        let mut doc = Document::new();
        let e = doc.create_element("old");
        let a = doc.create_attribute("a", "1");
        let b = doc.create_attribute("b", "2");
        doc.add_attribute(e, a).unwrap();
        doc.add_attribute(e, b).unwrap();

        doc.set_name(e, "new").unwrap();
        assert_eq!(doc.node_name(e), Some("new"));
        assert_eq!(
            doc.set_name(b, "a"),
            Err(MutationError::DuplicateAttribute {
                name: "a".to_string()
            })
        );
        let text = doc.create_text("t");
        assert_eq!(doc.set_name(text, "x"), Err(MutationError::NoName));
    }
}
