// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The live annotation collection.

use hashbrown::HashMap;
use markup_model::{Annotation, AnnotationId};

/// Live annotations keyed by id, with a stable bottom-to-top z-order.
///
/// Commands are the only writers in normal operation; direct mutation is available for
/// interactive previews that are not recorded.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    annotations: HashMap<AnnotationId, Annotation>,
    order: Vec<AnnotationId>,
    next_id: u64,
}

impl AnnotationStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh id, never handed out before by this store.
    pub fn allocate_id(&mut self) -> AnnotationId {
        self.next_id += 1;
        AnnotationId(self.next_id)
    }

    /// Make sure future allocations never collide with `id`.
    pub fn reserve(&mut self, id: AnnotationId) {
        self.next_id = self.next_id.max(id.0);
    }

    /// Number of live annotations.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is live.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: AnnotationId) -> bool {
        self.annotations.contains_key(&id)
    }

    /// Look up a live annotation.
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    /// Look up a live annotation mutably.
    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.get_mut(&id)
    }

    /// Z-order index of `id`, 0 being the bottom.
    pub fn position_of(&self, id: AnnotationId) -> Option<usize> {
        self.order.iter().position(|o| *o == id)
    }

    /// Insert `annotation` at z-order `index` (clamped), replacing any live one with its id.
    pub fn insert_at(&mut self, index: usize, annotation: Annotation) {
        let id = annotation.id();
        self.reserve(id);
        if let Some(old) = self.position_of(id) {
            self.order.remove(old);
        }
        let index = index.min(self.order.len());
        self.order.insert(index, id);
        self.annotations.insert(id, annotation);
    }

    /// Insert `annotation` on top.
    pub fn push(&mut self, annotation: Annotation) {
        self.insert_at(usize::MAX, annotation);
    }

    /// Remove `id`, returning its former z-order index and the annotation.
    pub fn remove(&mut self, id: AnnotationId) -> Option<(usize, Annotation)> {
        let annotation = self.annotations.remove(&id)?;
        let index = self.position_of(id).unwrap_or(self.order.len());
        if index < self.order.len() {
            self.order.remove(index);
        }
        Some((index, annotation))
    }

    /// Live annotations from bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> + '_ {
        self.order.iter().filter_map(|id| self.annotations.get(id))
    }

    /// Live annotations from top to bottom, the order pointer picking wants.
    pub fn iter_top_down(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.iter().rev()
    }

    /// Live ids from bottom to top.
    pub fn ids(&self) -> &[AnnotationId] {
        &self.order
    }

    /// Remove everything. Id allocation keeps counting.
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.order.clear();
    }

    /// Whether both stores hold the same annotations in the same order, within `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.order == other.order
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.approx_eq(b, eps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markup_model::AnnotationKind;

    #[test]
    fn z_order_survives_remove_and_reinsert() {
        let mut store = AnnotationStore::new();
        let ids: Vec<_> = (0..3)
            .map(|_| {
                let id = store.allocate_id();
                store.push(Annotation::new(id, AnnotationKind::Circle));
                id
            })
            .collect();
        let (index, removed) = store.remove(ids[1]).expect("live annotation");
        assert_eq!(index, 1);
        assert_eq!(store.ids(), &[ids[0], ids[2]]);
        store.insert_at(index, removed);
        assert_eq!(store.ids(), ids.as_slice());
        let top: Vec<_> = store.iter_top_down().map(Annotation::id).collect();
        assert_eq!(top, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn reserve_skips_loaded_ids() {
        let mut store = AnnotationStore::new();
        store.push(Annotation::new(AnnotationId(41), AnnotationKind::Text));
        assert_eq!(store.allocate_id(), AnnotationId(42));
        assert!(store.remove(AnnotationId(7)).is_none());
    }
}
