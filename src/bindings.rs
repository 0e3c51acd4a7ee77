//! Live-binding registry for exported names.
//!
//! A module registers one getter per exported name. Importers subscribe to
//! names with the local bindings they populate. When the exporter reports
//! that names changed (the runtime's export and update calls), `publish`
//! reads the getters again and notifies only the subscribers whose value
//! actually differs from what they last saw.

use indexmap::IndexMap;

type Getter<T> = Box<dyn Fn() -> Option<T> + Send + Sync>;
type Callback<T> = Box<dyn FnMut(&T) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

struct Subscriber<T> {
    id: SubscriptionId,
    local_names: Vec<String>,
    last: Option<T>,
    callback: Callback<T>,
}

pub struct LiveBindings<T> {
    getters: IndexMap<String, Getter<T>>,
    subscribers: IndexMap<String, Vec<Subscriber<T>>>,
    initialized: IndexMap<String, bool>,
    next_id: usize,
}

impl<T> std::fmt::Debug for LiveBindings<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveBindings")
            .field("exports", &self.getters.keys().collect::<Vec<_>>())
            .field("subscribed", &self.subscribers.keys().collect::<Vec<_>>())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl<T> Default for LiveBindings<T> {
    fn default() -> Self {
        LiveBindings {
            getters: IndexMap::new(),
            subscribers: IndexMap::new(),
            initialized: IndexMap::new(),
            next_id: 0,
        }
    }
}

impl<T: Clone + PartialEq> LiveBindings<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the getter for an exported name. A getter returning `None`
    /// means the value cannot be read yet.
    pub fn export<F>(&mut self, name: &str, getter: F)
    where
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        self.getters.insert(name.to_string(), Box::new(getter));
    }

    pub fn is_exported(&self, name: &str) -> bool {
        self.getters.contains_key(name)
    }

    pub fn exported_names(&self) -> impl Iterator<Item = &str> {
        self.getters.keys().map(String::as_str)
    }

    pub fn value(&self, name: &str) -> Option<T> {
        self.getters.get(name).and_then(|getter| getter())
    }

    /// Subscribe `local_names` to updates of `name`. The locals start out
    /// uninitialized until the first value is delivered.
    pub fn subscribe<F>(&mut self, name: &str, local_names: &[String], callback: F) -> SubscriptionId
    where
        F: FnMut(&T) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        for local in local_names {
            self.initialized.insert(local.clone(), false);
        }

        self.subscribers
            .entry(name.to_string())
            .or_default()
            .push(Subscriber {
                id,
                local_names: local_names.to_vec(),
                last: None,
                callback: Box::new(callback),
            });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for subscribers in self.subscribers.values_mut() {
            let before = subscribers.len();
            subscribers.retain(|subscriber| subscriber.id != id);
            removed |= subscribers.len() != before;
        }
        removed
    }

    /// Re-read the given exported names (every subscribed name when `None`)
    /// and push changed values to their subscribers. Returns how many
    /// callbacks ran.
    pub fn publish(&mut self, names: Option<&[String]>) -> usize {
        let targets: Vec<String> = match names {
            Some(names) => names.to_vec(),
            None => self.subscribers.keys().cloned().collect(),
        };

        let mut notified = 0;
        for name in targets {
            let Some(value) = self.value(&name) else {
                continue;
            };
            let Some(subscribers) = self.subscribers.get_mut(&name) else {
                continue;
            };

            for subscriber in subscribers.iter_mut() {
                if subscriber.last.as_ref() == Some(&value) {
                    continue;
                }
                (subscriber.callback)(&value);
                subscriber.last = Some(value.clone());
                for local in &subscriber.local_names {
                    self.initialized.insert(local.clone(), true);
                }
                notified += 1;
            }
        }

        if notified > 0 {
            tracing::trace!(notified, "published live bindings");
        }
        notified
    }

    /// Mark locals as initialized without a value change, as the release
    /// call after an export declaration does.
    pub fn mark_initialized(&mut self, local_names: &[String]) {
        for local in local_names {
            self.initialized.insert(local.clone(), true);
        }
    }

    /// Untracked names are treated as initialized.
    pub fn is_initialized(&self, local: &str) -> bool {
        self.initialized.get(local).copied().unwrap_or(true)
    }
}
