use std::collections::HashMap;

use itertools::Itertools;

use crate::{
    game::{
        Card,
        History,
        Player,
    },
    info_set::{
        InfoSet,
        InfoSetKey,
    },
};

/// Owns every info set touched during one solving run.
#[derive(Debug, Clone, Default)]
pub struct InfoSetStore {
    info_sets: HashMap<InfoSetKey, InfoSet>,
}

impl InfoSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the info set for `(card, history)`, creating it with a uniform
    /// strategy and empty accumulators on first visit.
    pub fn get_or_create(&mut self, card: Card, history: History) -> &mut InfoSet {
        let key = InfoSetKey::new(card, history);
        self.info_sets.entry(key.clone()).or_insert_with(|| InfoSet::new(key))
    }

    pub fn get(&self, key: &InfoSetKey) -> Option<&InfoSet> {
        self.info_sets.get(key)
    }

    pub fn len(&self) -> usize {
        self.info_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info_sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InfoSet> {
        self.info_sets.values()
    }

    pub fn advance_all(&mut self) {
        for info_set in self.info_sets.values_mut() {
            info_set.advance_iteration();
        }
    }

    /// Info sets ordered by their textual key.
    pub fn sorted(&self) -> Vec<&InfoSet> {
        self.iter().sorted_by_key(|info_set| info_set.key().to_string()).collect()
    }

    pub fn for_player(&self, player: Player) -> Vec<&InfoSet> {
        self.sorted().into_iter().filter(|info_set| info_set.key().player() == player).collect()
    }
}
