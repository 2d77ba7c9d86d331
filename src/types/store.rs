use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Listener = Arc<dyn Fn(&VariableChange) + Send + Sync>;

/// A single variable mutation, passed to listeners registered with
/// [`VariableStore::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableChange {
    pub name: String,
    pub old: Option<String>,
    pub new: Option<String>,
    pub generation: u64,
}

/// Shared, mutable mapping from variable name to string value.
///
/// Cloning the store clones the handle, not the data: every clone observes
/// the same variables. Each effective mutation bumps a generation counter in
/// the same critical section, which is what evaluation caches key on.
#[derive(Clone, Default)]
pub struct VariableStore {
    inner: Arc<RwLock<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    vars: Arc<HashMap<String, String>>,
    generation: u64,
    listeners: Vec<Listener>,
}

/// Immutable view of the store taken at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot {
    vars: Arc<HashMap<String, String>>,
    generation: u64,
}

impl VariableStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable (builder form).
    #[must_use]
    pub fn with(self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Current value of `name`, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.read().vars.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.read().vars.contains_key(name)
    }

    /// Set `name` to `value`, returning the previous value. Writing the value
    /// a variable already holds is not a change.
    pub fn set(&self, name: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        let (change, listeners) = {
            let mut state = self.write();
            if state.vars.get(name) == Some(&value) {
                return Some(value);
            }
            let old = Arc::make_mut(&mut state.vars).insert(name.to_owned(), value.clone());
            state.generation += 1;
            let change = VariableChange {
                name: name.to_owned(),
                old,
                new: Some(value),
                generation: state.generation,
            };
            (change, state.listeners.clone())
        };
        tracing::trace!(variable = name, generation = change.generation, "variable set");
        notify(&listeners, &change);
        change.old
    }

    /// Remove `name`, returning its value if it was set.
    pub fn remove(&self, name: &str) -> Option<String> {
        let (change, listeners) = {
            let mut state = self.write();
            if !state.vars.contains_key(name) {
                return None;
            }
            let old = Arc::make_mut(&mut state.vars).remove(name);
            state.generation += 1;
            let change = VariableChange {
                name: name.to_owned(),
                old,
                new: None,
                generation: state.generation,
            };
            (change, state.listeners.clone())
        };
        tracing::trace!(variable = name, generation = change.generation, "variable removed");
        notify(&listeners, &change);
        change.old
    }

    /// Copy every process environment variable into the store as
    /// `{prefix}{NAME}`.
    pub fn import_environment(&self, prefix: &str) {
        let mut imported = 0_usize;
        for (key, value) in std::env::vars_os() {
            if let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) {
                self.set(&format!("{prefix}{key}"), value);
                imported += 1;
            }
        }
        tracing::debug!(prefix, imported, "imported environment variables");
    }

    /// Register a listener called after every effective mutation. Listeners
    /// run outside the store lock and may read or write the store.
    pub fn subscribe(&self, listener: impl Fn(&VariableChange) + Send + Sync + 'static) {
        self.write().listeners.push(Arc::new(listener));
    }

    /// A consistent view of all variables. Cheap: the map is shared until the
    /// next mutation copies it.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.read();
        Snapshot {
            vars: Arc::clone(&state.vars),
            generation: state.generation,
        }
    }

    /// Monotonic counter bumped by every effective mutation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().vars.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn notify(listeners: &[Listener], change: &VariableChange) {
    for listener in listeners {
        listener(change);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let vars: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(StoreState {
                vars: Arc::new(vars),
                generation: 0,
                listeners: Vec::new(),
            })),
        }
    }
}

impl fmt::Debug for VariableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("VariableStore")
            .field("variables", &state.vars.len())
            .field("generation", &state.generation)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl Snapshot {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Value of `name`, or `""` when unset.
    #[must_use]
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
