//! Reconciliation of a product's child collection against a submitted list.

use std::collections::HashSet;
use uuid::Uuid;

use crate::validation::Keyed;

/// Changes that turn the stored collection into the submitted one.
///
/// Apply in field order: deletes, then updates, then inserts, so that a value
/// released by a deleted child (such as a SKU) can be reused in the same write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<T> {
    pub deletes: Vec<Uuid>,
    pub updates: Vec<(Uuid, T)>,
    pub inserts: Vec<T>,
}

/// Match submitted items to `existing` ids.
///
/// - an item whose id is in `existing` updates that child
/// - an item without id, with an unknown id, or repeating an id already
///   matched becomes an insert with a fresh id
/// - existing ids no item matched are deleted
pub fn reconcile<T>(existing: &[Uuid], incoming: Vec<Keyed<T>>) -> Reconciliation<T> {
    let known: HashSet<Uuid> = existing.iter().copied().collect();
    let mut matched = HashSet::new();
    let mut updates = Vec::new();
    let mut inserts = Vec::new();

    for item in incoming {
        match item.id {
            Some(id) if known.contains(&id) && matched.insert(id) => {
                updates.push((id, item.record))
            }
            _ => inserts.push(item.record),
        }
    }

    let deletes = existing
        .iter()
        .copied()
        .filter(|id| !matched.contains(id))
        .collect();

    Reconciliation {
        deletes,
        updates,
        inserts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(id: Option<Uuid>, record: &'static str) -> Keyed<&'static str> {
        Keyed { id, record }
    }

    #[test]
    fn test_update_insert_and_delete() {
        let kept = Uuid::now_v7();
        let dropped = Uuid::now_v7();

        let plan = reconcile(
            &[kept, dropped],
            vec![keyed(Some(kept), "updated"), keyed(None, "new")],
        );

        assert_eq!(plan.updates, vec![(kept, "updated")]);
        assert_eq!(plan.inserts, vec!["new"]);
        assert_eq!(plan.deletes, vec![dropped]);
        // Net collection size equals the submitted list
        assert_eq!(plan.updates.len() + plan.inserts.len(), 2);
    }

    #[test]
    fn test_unknown_id_is_inserted() {
        let existing = Uuid::now_v7();
        let stranger = Uuid::now_v7();

        let plan = reconcile(&[existing], vec![keyed(Some(stranger), "foreign")]);

        assert!(plan.updates.is_empty());
        assert_eq!(plan.inserts, vec!["foreign"]);
        assert_eq!(plan.deletes, vec![existing]);
    }

    #[test]
    fn test_repeated_id_matches_once() {
        let id = Uuid::now_v7();
        let plan = reconcile(&[id], vec![keyed(Some(id), "first"), keyed(Some(id), "second")]);

        assert_eq!(plan.updates, vec![(id, "first")]);
        assert_eq!(plan.inserts, vec!["second"]);
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_empty_list_deletes_everything() {
        let ids = [Uuid::now_v7(), Uuid::now_v7()];
        let plan = reconcile::<&str>(&ids, vec![]);
        assert_eq!(plan.deletes, ids.to_vec());
        assert!(plan.updates.is_empty() && plan.inserts.is_empty());
    }
}
