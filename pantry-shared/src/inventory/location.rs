//! Storage breadcrumbs
//!
//! Storages form a tree through `parent_id`; the root storage may belong to a
//! space. The location of an item is the chain from that space down through
//! every storage to the item itself, rendered both as a `" > "`-joined string
//! and as a list of typed breadcrumbs.
//!
//! The tree is loaded once per request into a [`StorageTree`] arena keyed by
//! storage id. Walks are iterative and stop at the first repeated id, so a
//! corrupted parent chain still yields a finite path.
//!
//! # Example
//!
//! ```
//! use pantry_shared::inventory::{SpaceRef, StorageNode, StorageTree};
//! use uuid::Uuid;
//!
//! let space = SpaceRef { id: Uuid::new_v4(), name: "Kitchen".to_string() };
//! let pantry = StorageNode {
//!     id: Uuid::new_v4(),
//!     name: "Pantry".to_string(),
//!     parent_id: None,
//!     space: Some(space),
//! };
//! let pantry_id = pantry.id;
//!
//! let tree = StorageTree::new(vec![pantry]);
//! let location = tree.locate(pantry_id, Uuid::new_v4(), "Olive Oil");
//! assert_eq!(location.path, "Kitchen > Pantry > Olive Oil");
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator between breadcrumb names in a location path
pub const PATH_SEPARATOR: &str = " > ";

/// The space a root storage sits in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceRef {
    pub id: Uuid,
    pub name: String,
}

/// One storage in the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNode {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub space: Option<SpaceRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbKind {
    Space,
    Storage,
    Item,
}

/// A single step of a location, serialized as `{"type", "id", "name"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    #[serde(rename = "type")]
    pub kind: BreadcrumbKind,
    pub id: Uuid,
    pub name: String,
}

impl Breadcrumb {
    fn new(kind: BreadcrumbKind, id: Uuid, name: &str) -> Self {
        Self {
            kind,
            id,
            name: name.to_string(),
        }
    }
}

/// Location of an item, outermost first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}

impl Location {
    fn from_breadcrumbs(breadcrumbs: Vec<Breadcrumb>) -> Self {
        let path = breadcrumbs
            .iter()
            .map(|crumb| crumb.name.as_str())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR);

        Self { path, breadcrumbs }
    }
}

/// All storages of one user, keyed by id
#[derive(Debug, Clone, Default)]
pub struct StorageTree {
    nodes: HashMap<Uuid, StorageNode>,
}

impl StorageTree {
    pub fn new(nodes: impl IntoIterator<Item = StorageNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|node| (node.id, node)).collect(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&StorageNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Storages from the root down to `storage_id`
    ///
    /// A parent id missing from the arena ends the walk as if the last
    /// storage were the root. A repeated id ends it too, and is logged.
    pub fn ancestry(&self, storage_id: Uuid) -> Vec<&StorageNode> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.nodes.get(&storage_id);

        while let Some(node) = current {
            if !visited.insert(node.id) {
                tracing::warn!(
                    storage_id = %storage_id,
                    repeated_id = %node.id,
                    "Cycle in storage parent chain, truncating location"
                );
                break;
            }
            chain.push(node);
            current = node.parent_id.and_then(|parent| self.nodes.get(&parent));
        }

        chain.reverse();
        chain
    }

    /// Builds the location of an item stored in `storage_id`
    ///
    /// The owning space of the outermost storage comes first, then every
    /// storage, then the item.
    pub fn locate(&self, storage_id: Uuid, item_id: Uuid, item_name: &str) -> Location {
        let mut breadcrumbs = self.storage_breadcrumbs(storage_id);
        breadcrumbs.push(Breadcrumb::new(BreadcrumbKind::Item, item_id, item_name));
        Location::from_breadcrumbs(breadcrumbs)
    }

    /// True when `candidate` is `ancestor` or sits somewhere below it
    ///
    /// Used to reject re-parenting a storage under itself.
    pub fn is_descendant(&self, candidate: Uuid, ancestor: Uuid) -> bool {
        self.ancestry(candidate).iter().any(|node| node.id == ancestor)
    }

    fn storage_breadcrumbs(&self, storage_id: Uuid) -> Vec<Breadcrumb> {
        let chain = self.ancestry(storage_id);
        let mut breadcrumbs = Vec::with_capacity(chain.len() + 2);

        if let Some(space) = chain.first().and_then(|root| root.space.as_ref()) {
            breadcrumbs.push(Breadcrumb::new(BreadcrumbKind::Space, space.id, &space.name));
        }
        breadcrumbs.extend(
            chain
                .iter()
                .map(|node| Breadcrumb::new(BreadcrumbKind::Storage, node.id, &node.name)),
        );

        breadcrumbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, parent_id: Option<Uuid>, space: Option<SpaceRef>) -> StorageNode {
        StorageNode {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id,
            space,
        }
    }

    fn kitchen() -> SpaceRef {
        SpaceRef {
            id: Uuid::new_v4(),
            name: "Kitchen".to_string(),
        }
    }

    #[test]
    fn test_space_storage_item_path() {
        let space = kitchen();
        let pantry = node("Pantry", None, Some(space.clone()));
        let pantry_id = pantry.id;
        let tree = StorageTree::new(vec![pantry]);

        let item_id = Uuid::new_v4();
        let location = tree.locate(pantry_id, item_id, "Olive Oil");

        assert_eq!(location.path, "Kitchen > Pantry > Olive Oil");
        assert_eq!(
            location.breadcrumbs,
            vec![
                Breadcrumb::new(BreadcrumbKind::Space, space.id, "Kitchen"),
                Breadcrumb::new(BreadcrumbKind::Storage, pantry_id, "Pantry"),
                Breadcrumb::new(BreadcrumbKind::Item, item_id, "Olive Oil"),
            ]
        );
    }

    #[test]
    fn test_storage_without_space() {
        let shelf = node("Shelf", None, None);
        let shelf_id = shelf.id;
        let tree = StorageTree::new(vec![shelf]);

        let location = tree.locate(shelf_id, Uuid::new_v4(), "Salt");
        assert_eq!(location.path, "Shelf > Salt");
        assert_eq!(location.breadcrumbs.len(), 2);
    }

    #[test]
    fn test_nested_storages_use_root_space() {
        let root = node("Cabinet", None, Some(kitchen()));
        let middle = node("Top Shelf", Some(root.id), None);
        // a space on an inner storage is not part of the path
        let inner = node("Spice Rack", Some(middle.id), Some(kitchen()));
        let inner_id = inner.id;
        let tree = StorageTree::new(vec![root, middle, inner]);

        let location = tree.locate(inner_id, Uuid::new_v4(), "Paprika");
        assert_eq!(
            location.path,
            "Kitchen > Cabinet > Top Shelf > Spice Rack > Paprika"
        );
    }

    #[test]
    fn test_missing_parent_is_root() {
        let orphan = node("Box", Some(Uuid::new_v4()), None);
        let orphan_id = orphan.id;
        let tree = StorageTree::new(vec![orphan]);

        assert_eq!(tree.locate(orphan_id, Uuid::new_v4(), "Tape").path, "Box > Tape");
    }

    #[test]
    fn test_unknown_storage_yields_item_only() {
        let tree = StorageTree::default();
        let location = tree.locate(Uuid::new_v4(), Uuid::new_v4(), "Salt");
        assert_eq!(location.path, "Salt");
    }

    #[test]
    fn test_cycle_is_truncated() {
        let a_id = Uuid::new_v4();
        let b_id = Uuid::new_v4();
        let a = StorageNode {
            id: a_id,
            name: "A".to_string(),
            parent_id: Some(b_id),
            space: None,
        };
        let b = StorageNode {
            id: b_id,
            name: "B".to_string(),
            parent_id: Some(a_id),
            space: None,
        };
        let tree = StorageTree::new(vec![a, b]);

        let location = tree.locate(a_id, Uuid::new_v4(), "Thing");
        assert_eq!(location.path, "B > A > Thing");
        assert_eq!(tree.ancestry(a_id).len(), 2);
    }

    #[test]
    fn test_self_parent_is_truncated() {
        let id = Uuid::new_v4();
        let tree = StorageTree::new(vec![StorageNode {
            id,
            name: "Loop".to_string(),
            parent_id: Some(id),
            space: None,
        }]);

        assert_eq!(tree.locate(id, Uuid::new_v4(), "Key").path, "Loop > Key");
    }

    #[test]
    fn test_is_descendant() {
        let root = node("Closet", None, None);
        let child = node("Bin", Some(root.id), None);
        let (root_id, child_id) = (root.id, child.id);
        let tree = StorageTree::new(vec![root, child]);

        assert!(tree.is_descendant(child_id, root_id));
        assert!(tree.is_descendant(root_id, root_id));
        assert!(!tree.is_descendant(root_id, child_id));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_breadcrumb_serialization() {
        let id = Uuid::nil();
        let json = serde_json::to_value(Breadcrumb::new(BreadcrumbKind::Storage, id, "Pantry"))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "storage",
                "id": "00000000-0000-0000-0000-000000000000",
                "name": "Pantry"
            })
        );
    }
}
