//! Serde projection of node views
//!
//! A node serializes as a struct with `name` and, when present, `value`,
//! `link`, `attrs` (in insertion order) and `children` (in sibling order).

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::view::NodeRef;

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_children = self.child().is_some();
        let len = 1
            + usize::from(self.value().is_some())
            + usize::from(self.link().is_some())
            + usize::from(!self.attrs().is_empty())
            + usize::from(has_children);

        let mut state = serializer.serialize_struct("Node", len)?;
        state.serialize_field("name", self.name())?;
        match self.value() {
            Some(value) => state.serialize_field("value", value)?,
            None => state.skip_field("value")?,
        }
        match self.link() {
            Some(link) => state.serialize_field("link", link)?,
            None => state.skip_field("link")?,
        }
        if self.attrs().is_empty() {
            state.skip_field("attrs")?;
        } else {
            state.serialize_field("attrs", &Attrs(*self))?;
        }
        if has_children {
            state.serialize_field("children", &Children(*self))?;
        } else {
            state.skip_field("children")?;
        }
        state.end()
    }
}

struct Attrs<'t>(NodeRef<'t>);

impl Serialize for Attrs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.attrs().iter())
    }
}

struct Children<'t>(NodeRef<'t>);

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.children())
    }
}
