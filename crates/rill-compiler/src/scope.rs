//! Name-to-value binding scopes.

use std::sync::Arc;

use rill_semantic::ExternDeclaration;
use rill_values::Value;
use rustc_hash::FxHashMap;

/// A frame of bindings with an optional shared parent.
///
/// The same type serves as the built-in scope handed to the compiler and as
/// the per-invocation scope evaluators read and write. Only the innermost
/// frame is mutable; parents are shared through `Arc` so closures can
/// capture them cheaply.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    values: FxHashMap<String, Value>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty frame whose lookups fall through to `parent`.
    pub fn nest(parent: Arc<Scope>) -> Self {
        Scope {
            values: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        match self.values.get(name) {
            Some(v) => Some(v),
            None => self.parent.as_ref().and_then(|p| p.lookup(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Freeze the current frame for capture by a closure.
    pub fn snapshot(&self) -> Arc<Scope> {
        Arc::new(self.clone())
    }

    /// Every visible binding, innermost first wins, sorted by name.
    pub fn flatten(&self) -> Vec<(&str, &Value)> {
        let mut seen: FxHashMap<&str, &Value> = FxHashMap::default();
        let mut frame = Some(self);
        while let Some(s) = frame {
            for (k, v) in &s.values {
                seen.entry(k.as_str()).or_insert(v);
            }
            frame = s.parent.as_deref();
        }
        let mut out: Vec<_> = seen.into_iter().collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// External declarations for type inference: one per visible binding,
    /// typed by the bound value.
    pub fn declarations(&self) -> Vec<ExternDeclaration> {
        self.flatten()
            .into_iter()
            .map(|(name, value)| ExternDeclaration {
                name: name.to_string(),
                ty: value.ty(),
            })
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Scope {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            parent: None,
        }
    }
}
