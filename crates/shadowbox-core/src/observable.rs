//! Observable values with explicit subscribe/unsubscribe.
//!
//! Shared UI-facing state (the move on display, the "new combos" badge) is
//! held in an [`Observable`] that is passed to whoever needs it instead of
//! living in a process-wide global.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

pub type SubscriptionId = u64;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: T,
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Callback<T>)>,
}

/// A value plus the callbacks interested in it. Clones share state.
pub struct Observable<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // A panicking subscriber must not take the value down with it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Mutate in place and notify every subscriber.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let (value, callbacks) = {
            let mut inner = self.lock();
            f(&mut inner.value);
            let callbacks: Vec<_> = inner.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect();
            (inner.value.clone(), callbacks)
        };
        // Called without the lock so a subscriber may read or unsubscribe.
        for callback in callbacks {
            callback(&value);
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
        inner.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Counter of combos the user has not seen before.
#[derive(Debug, Clone)]
pub struct ComboBadge {
    count: Observable<u32>,
    seen: Arc<Mutex<HashSet<String>>>,
}

impl ComboBadge {
    pub fn new() -> Self {
        Self::with_seen(std::iter::empty::<String>())
    }

    /// Start from a previously persisted set of combo names.
    pub fn with_seen<I, S>(seen: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            count: Observable::new(0),
            seen: Arc::new(Mutex::new(seen.into_iter().map(Into::into).collect())),
        }
    }

    /// Record combo names; bumps the badge once per name never seen before.
    /// Returns how many were new.
    pub fn note_combos<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> u32 {
        let fresh = {
            let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            names
                .into_iter()
                .filter(|name| seen.insert((*name).to_string()))
                .count() as u32
        };
        if fresh > 0 {
            self.count.update(|count| *count += fresh);
        }
        fresh
    }

    pub fn count(&self) -> u32 {
        self.count.get()
    }

    pub fn clear(&self) {
        self.count.set(0);
    }

    /// The observable behind the badge, for subscribing.
    pub fn observable(&self) -> &Observable<u32> {
        &self.count
    }

    /// Every combo name seen so far, sorted.
    pub fn seen(&self) -> Vec<String> {
        let seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<_> = seen.iter().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ComboBadge {
    fn default() -> Self {
        Self::new()
    }
}
