//! Flat key/value state with per-key listeners.
//!
//! Entries and listeners live for the whole page; nothing is pruned.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::style::format_number;

type Listener = Box<dyn FnMut(&Value)>;

#[derive(Default)]
pub struct StateStore {
    values: HashMap<String, Value>,
    listeners: HashMap<String, Vec<Listener>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn set(&mut self, id: &str, value: impl Into<Value>) {
        self.values.insert(id.to_string(), value.into());
        self.notify(id);
    }

    /// Flip by truthiness; a missing entry becomes `true`.
    pub fn toggle(&mut self, id: &str) {
        let next = !self.values.get(id).is_some_and(dreamweb_ir::is_truthy);
        self.values.insert(id.to_string(), Value::Bool(next));
        self.notify(id);
    }

    /// Add `amount` with loose addition: missing and falsy entries count as
    /// zero, `true` as one, and a non-empty string gets the amount appended
    /// (`"a"` becomes `"a1"`). Arrays and objects are replaced by `amount`.
    pub fn increment(&mut self, id: &str, amount: f64) {
        let next = match self.values.get(id) {
            Some(Value::Number(n)) => number(n.as_f64().unwrap_or(0.0) + amount),
            Some(Value::Bool(true)) => number(1.0 + amount),
            Some(Value::String(s)) if !s.is_empty() => {
                Value::String(format!("{s}{}", format_number(amount)))
            }
            _ => number(amount),
        };
        self.values.insert(id.to_string(), next);
        self.notify(id);
    }

    /// Call `listener` with the new value after every change to `id`.
    pub fn add_listener(&mut self, id: &str, listener: impl FnMut(&Value) + 'static) {
        self.listeners
            .entry(id.to_string())
            .or_default()
            .push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn notify(&mut self, id: &str) {
        let Some(listeners) = self.listeners.get_mut(id) else {
            return;
        };
        let value = self.values.get(id).cloned().unwrap_or(Value::Null);
        for listener in listeners.iter_mut() {
            listener(&value);
        }
    }
}

/// Whole numbers stay integers so they print as `3`, not `3.0`.
fn number(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("values", &self.values)
            .field("listeners", &self.listeners.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_see_each_new_value() {
        let mut state = StateStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        state.add_listener("count", move |v| sink.borrow_mut().push(v.clone()));

        state.increment("count", 1.0);
        state.increment("count", 2.0);
        state.set("count", "reset");
        state.set("other", 1);

        assert_eq!(*seen.borrow(), vec![json!(1), json!(3), json!("reset")]);
        assert_eq!(state.get("count"), Some(&json!("reset")));
    }

    #[test]
    fn toggle_uses_truthiness() {
        let mut state = StateStore::new();
        state.toggle("open");
        assert_eq!(state.get("open"), Some(&json!(true)));
        state.toggle("open");
        assert_eq!(state.get("open"), Some(&json!(false)));
        state.set("name", "");
        state.toggle("name");
        assert_eq!(state.get("name"), Some(&json!(true)));
    }

    #[test]
    fn increment_fractional_and_missing() {
        let mut state = StateStore::new();
        state.increment("x", 0.5);
        assert_eq!(state.get("x"), Some(&json!(0.5)));
        assert_eq!(state.get("missing"), None);
    }

    #[test]
    fn increment_follows_loose_addition() {
        let mut state = StateStore::new();
        state.set("flag", true);
        state.increment("flag", 1.0);
        assert_eq!(state.get("flag"), Some(&json!(2)));

        state.set("label", "a");
        state.increment("label", 1.0);
        assert_eq!(state.get("label"), Some(&json!("a1")));

        for falsy in [json!(false), json!(""), json!(null), json!(0)] {
            state.set("n", falsy);
            state.increment("n", 2.0);
            assert_eq!(state.get("n"), Some(&json!(2)));
        }
    }
}
