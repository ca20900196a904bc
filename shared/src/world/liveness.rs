use std::collections::HashMap;

use crate::world::object_model::ObjectKey;

/// Marker captured when an asynchronous operation is issued on behalf of an
/// object. It stays valid only while that same incarnation of the object lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LivenessToken<O> {
    object: O,
    generation: u64,
}

impl<O: Copy> LivenessToken<O> {
    pub fn object(&self) -> O {
        self.object
    }
}

/// Generation counters for live objects
pub struct ObjectLiveness<O: ObjectKey> {
    live: HashMap<O, u64>,
    next_generation: u64,
}

impl<O: ObjectKey> ObjectLiveness<O> {
    pub fn new() -> Self {
        Self {
            live: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Returns a token for the current incarnation of `object`, marking it
    /// alive if it was not yet known
    pub fn token(&mut self, object: O) -> LivenessToken<O> {
        let next_generation = &mut self.next_generation;
        let generation = *self.live.entry(object).or_insert_with(|| {
            let generation = *next_generation;
            *next_generation += 1;
            generation
        });
        LivenessToken { object, generation }
    }

    /// Ends the current incarnation of `object`; every token issued for it
    /// becomes stale, even if the handle is reused later
    pub fn invalidate(&mut self, object: &O) {
        self.live.remove(object);
    }

    pub fn is_alive(&self, token: &LivenessToken<O>) -> bool {
        self.live.get(&token.object) == Some(&token.generation)
    }
}

impl<O: ObjectKey> Default for ObjectLiveness<O> {
    fn default() -> Self {
        Self::new()
    }
}
