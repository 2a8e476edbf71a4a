//! Rank-ordered collections of cards or lists.

use crate::lexorank;
use crate::types::Rank;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An entity that lives at a ranked position inside a container
pub trait Ranked {
    /// Identifier of the entity
    type Id: PartialEq + fmt::Display;
    /// Identifier of the owning container
    type ContainerId: PartialEq + Clone + fmt::Display;

    fn id(&self) -> &Self::Id;
    fn rank(&self) -> &Rank;
    fn set_rank(&mut self, rank: Rank);
    fn container_id(&self) -> &Self::ContainerId;
    fn set_container_id(&mut self, container: Self::ContainerId);
}

/// A sequence of entities kept sorted ascending by rank.
///
/// Every mutating method re-sorts before returning, so iteration order is always
/// display order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedCollection<T> {
    items: Vec<T>,
}

impl<T> Default for OrderedCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Ranked> OrderedCollection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Find an entity by id
    pub fn find(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Display index of an entity
    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.position(id).is_some()
    }

    pub fn first_rank(&self) -> Option<&Rank> {
        self.items.first().map(Ranked::rank)
    }

    pub fn last_rank(&self) -> Option<&Rank> {
        self.items.last().map(Ranked::rank)
    }

    /// Ranks of the entities that would sit immediately before and after an
    /// entity placed at `index`, ignoring `exclude` if it is already present.
    pub fn neighbors(
        &self,
        index: usize,
        exclude: Option<&T::Id>,
    ) -> (Option<&Rank>, Option<&Rank>) {
        let remaining: Vec<&T> = self
            .items
            .iter()
            .filter(|item| Some(item.id()) != exclude)
            .collect();
        let index = index.min(remaining.len());
        let before = index
            .checked_sub(1)
            .and_then(|i| remaining.get(i))
            .map(|item| item.rank());
        let after = remaining.get(index).map(|item| item.rank());
        (before, after)
    }

    /// Allocate the rank for an entity placed at `index`
    pub fn rank_at(&self, index: usize, exclude: Option<&T::Id>) -> Rank {
        let (before, after) = self.neighbors(index, exclude);
        lexorank::between(before, after)
    }

    /// Insert a new entity at `index`, giving it a rank between its new neighbours.
    ///
    /// Returns the rank that was assigned.
    pub fn insert(&mut self, mut entity: T, index: usize) -> Rank {
        let rank = self.rank_at(index, Some(entity.id()));
        entity.set_rank(rank.clone());
        self.place(entity, index);
        rank
    }

    /// Splice an entity that already carries its rank in at `index`
    pub fn place(&mut self, entity: T, index: usize) {
        let index = index.min(self.items.len());
        self.items.insert(index, entity);
        self.sort();
    }

    /// Add an entity with an authoritative rank
    pub fn add(&mut self, entity: T) {
        self.items.push(entity);
        self.sort();
    }

    /// Remove and return an entity
    pub fn take(&mut self, id: &T::Id) -> Option<T> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    /// Remove an entity; siblings keep their ranks
    pub fn remove(&mut self, id: &T::Id) -> bool {
        self.take(id).is_some()
    }

    /// Mutate one entity in place, then restore rank order
    pub fn modify<R>(&mut self, id: &T::Id, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let item = self.items.iter_mut().find(|item| item.id() == id)?;
        let result = f(item);
        self.sort();
        Some(result)
    }

    /// True when ranks are strictly ascending, which also means unique
    pub fn is_ordered(&self) -> bool {
        self.items.windows(2).all(|w| w[0].rank() < w[1].rank())
    }

    fn sort(&mut self) {
        self.items.sort_by(|a, b| a.rank().cmp(b.rank()));
    }
}

impl<T: Ranked> From<Vec<T>> for OrderedCollection<T> {
    fn from(items: Vec<T>) -> Self {
        let mut collection = Self { items };
        collection.sort();
        collection
    }
}

impl<T: Ranked> FromIterator<T> for OrderedCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a, T> IntoIterator for &'a OrderedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for OrderedCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Ranked + Deserialize<'de>> Deserialize<'de> for OrderedCollection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}
