use crate::model::{Checklist, ChecklistDefinition, ChecklistItem};
use std::collections::HashMap;

/// Applies a child definition on top of its resolved parent.
///
/// Parent items keep their positions; a child item with the same id replaces
/// the parent's content in place. Child items new to the parent are appended
/// in child order. Metadata is the parent's overlaid by the child's.
pub fn inherit(parent: &Checklist, child: ChecklistDefinition) -> Checklist {
    let mut child_items: Vec<Option<ChecklistItem>> = child.items.into_iter().map(Some).collect();
    let index: HashMap<String, usize> = child_items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| item.as_ref().map(|it| (it.id.clone(), i)))
        .collect();

    let mut items = Vec::with_capacity(parent.items.len() + child_items.len());
    for inherited in &parent.items {
        let replacement = index
            .get(&inherited.id)
            .and_then(|&i| child_items[i].take());
        items.push(replacement.unwrap_or_else(|| inherited.clone()));
    }
    items.extend(child_items.into_iter().flatten());

    let mut metadata = parent.metadata.clone();
    metadata.extend(child.metadata);

    Checklist {
        name: child.name,
        category: child.category,
        version: child.version,
        description: child.description.or_else(|| parent.description.clone()),
        items,
        metadata,
    }
}
