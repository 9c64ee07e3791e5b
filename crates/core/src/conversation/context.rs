use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named flag that stays live for `lifespan` more turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub lifespan: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
}

impl Context {
    pub fn new(name: impl Into<String>, lifespan: u32) -> Self {
        Self { name: name.into(), lifespan, parameters: BTreeMap::new() }
    }

    pub fn is_live(&self) -> bool {
        self.lifespan > 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContextChange {
    Set(Context),
    Clear { name: String },
}

/// Contexts keyed by name. Entries with a zero lifespan are tombstones: every
/// lookup treats them as absent, but they survive until the next
/// [`ContextSet::advance_turn`] so the platform can be told to drop them.
///
/// Contexts written with [`ContextSet::set`] or [`ContextSet::clear`] are
/// marked as changed this turn; [`ContextSet::restore`] records what the
/// platform already holds without marking it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextSet {
    contexts: BTreeMap<String, Context>,
    changed: BTreeSet<String>,
}

impl ContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, context: Context) {
        self.changed.insert(context.name.clone());
        self.contexts.insert(context.name.clone(), context);
    }

    /// Records a context as received from the platform.
    pub fn restore(&mut self, context: Context) {
        self.contexts.insert(context.name.clone(), context);
    }

    pub fn get(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name).filter(|context| context.is_live())
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn clear(&mut self, name: &str) {
        self.changed.insert(name.to_owned());
        self.contexts
            .entry(name.to_owned())
            .and_modify(|context| context.lifespan = 0)
            .or_insert_with(|| Context::new(name, 0));
    }

    /// Consumes one turn from every context and forgets the ones that expire.
    pub fn advance_turn(&mut self) {
        self.changed.clear();
        self.contexts.retain(|_, context| {
            context.lifespan = context.lifespan.saturating_sub(1);
            context.lifespan > 0
        });
    }

    pub fn apply(&mut self, changes: impl IntoIterator<Item = ContextChange>) {
        for change in changes {
            match change {
                ContextChange::Set(context) => self.set(context),
                ContextChange::Clear { name } => self.clear(&name),
            }
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values().filter(|context| context.is_live())
    }

    /// Contexts set or cleared since the last turn advance, tombstones included.
    pub fn changed(&self) -> impl Iterator<Item = &Context> {
        let changed = &self.changed;
        self.contexts.values().filter(move |context| changed.contains(&context.name))
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl FromIterator<Context> for ContextSet {
    fn from_iter<I: IntoIterator<Item = Context>>(iter: I) -> Self {
        let mut set = Self::new();
        for context in iter {
            set.set(context);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, ContextChange, ContextSet};

    #[test]
    fn lifespan_decrements_by_one_per_turn() {
        let mut contexts: ContextSet =
            [Context::new("google_pay", 2), Context::new("merchant_pay", 1)].into_iter().collect();

        contexts.advance_turn();
        assert_eq!(contexts.get("google_pay").map(|context| context.lifespan), Some(1));
        assert!(!contexts.is_active("merchant_pay"));

        contexts.advance_turn();
        assert!(!contexts.is_active("google_pay"));
        assert!(contexts.is_empty());
    }

    #[test]
    fn zero_lifespan_is_treated_as_absent() {
        let contexts: ContextSet = [Context::new("google_pay", 0)].into_iter().collect();

        assert!(contexts.get("google_pay").is_none());
        assert_eq!(contexts.active().count(), 0);
        assert_eq!(contexts.changed().count(), 1);
    }

    #[test]
    fn clear_leaves_tombstone_until_next_turn() {
        let mut contexts = ContextSet::new();
        contexts.apply([
            ContextChange::Set(Context::new("merchant_pay", 5)),
            ContextChange::Clear { name: "merchant_pay".to_owned() },
            ContextChange::Clear { name: "never_set".to_owned() },
        ]);

        assert!(!contexts.is_active("merchant_pay"));
        assert_eq!(contexts.changed().filter(|context| context.lifespan == 0).count(), 2);

        contexts.advance_turn();
        assert!(contexts.is_empty());
    }

    #[test]
    fn restored_contexts_are_not_reported_as_changed() {
        let mut contexts = ContextSet::new();
        contexts.restore(Context::new("actions_capability_screen_output", 1));
        contexts.restore(Context::new("merchant_pay", 3));
        contexts.set(Context::new("google_pay", 5));
        contexts.clear("merchant_pay");

        let changed: Vec<_> = contexts.changed().map(|context| context.name.as_str()).collect();
        assert_eq!(changed, ["google_pay", "merchant_pay"]);
        assert!(contexts.is_active("actions_capability_screen_output"));

        contexts.advance_turn();
        assert_eq!(contexts.changed().count(), 0);
        assert!(contexts.is_active("google_pay"));
    }
}
