#![doc = include_str!(".crate-docs.md")]
#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    // clippy::missing_docs_in_private_items,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(clippy::option_if_let_else, clippy::module_name_repetitions)]

use std::{
    any::Any,
    error::Error,
    fmt,
    ops::Deref,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Weak,
    },
};

use parking_lot::{Mutex, ReentrantMutex, RwLock, RwLockReadGuard};

/// An error returned by a listener.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

type Callback<T> = dyn Fn(&T, &T) -> Result<(), BoxError> + Send + Sync;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

/// A value wrapper that notifies its listeners after every write.
///
/// Cloning an `Observable` returns another handle to the same value and the
/// same listeners.
pub struct Observable<T> {
    data: Arc<Data<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<T> Default for Observable<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for Observable<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.read())
            .field("version", &self.version())
            .field("listeners", &self.listener_count())
            .field("policy", &self.policy())
            .finish()
    }
}

impl<T> Observable<T> {
    /// Returns a new instance with the initial value provided. Every write
    /// notifies the listeners, even if the written value is equal to the
    /// stored one.
    pub fn new(initial_value: T) -> Self {
        Self::builder(initial_value).build()
    }

    /// Returns a [`Builder`] for an instance with the initial value provided.
    pub fn builder(initial_value: T) -> Builder<T> {
        Builder {
            initial_value,
            unchanged: None,
        }
    }

    /// Returns a guard which can be used to access the value without cloning
    /// it.
    ///
    /// Writing to this instance from the thread holding the guard will
    /// deadlock.
    pub fn read(&self) -> ObservableReadGuard<'_, T> {
        ObservableReadGuard(self.data.value.read())
    }

    /// Returns the currently contained value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.data.value.read().clone()
    }

    /// Stores `new_value` and invokes every listener, in the order they were
    /// subscribed, with the previous and the new value. All listeners have
    /// returned by the time this function returns.
    ///
    /// With [`NotifyPolicy::OnChange`], writing a value equal to the stored
    /// one does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if one or more listeners returned an error or
    /// panicked. The value has been stored and the remaining listeners were
    /// still invoked.
    pub fn set(&self, new_value: T) -> Result<(), NotifyError>
    where
        T: Clone,
    {
        let _writing = self.data.writer.lock();
        let (old_value, new_value) = {
            let mut stored = self.data.value.write();
            if self.data.is_unchanged(&stored, &new_value) {
                return Ok(());
            }
            let old_value = std::mem::replace(&mut *stored, new_value);
            (old_value, stored.clone())
        };
        self.data.version.fetch_add(1, Ordering::AcqRel);
        self.data.notify(&old_value, &new_value)
    }

    /// Applies `modify` to a copy of the stored value, stores the result and
    /// notifies the listeners with the previous and the modified value.
    ///
    /// If `modify` panics, the stored value is left untouched and no listener
    /// is notified.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if one or more listeners returned an error or
    /// panicked. The modification is kept regardless.
    pub fn update<F>(&self, modify: F) -> Result<(), NotifyError>
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let _writing = self.data.writer.lock();
        let mut new_value = self.get();
        modify(&mut new_value);
        let old_value = {
            let mut stored = self.data.value.write();
            if self.data.is_unchanged(&stored, &new_value) {
                return Ok(());
            }
            std::mem::replace(&mut *stored, new_value.clone())
        };
        self.data.version.fetch_add(1, Ordering::AcqRel);
        self.data.notify(&old_value, &new_value)
    }

    /// Appends `listener` to the listeners invoked after each write, and
    /// returns the id to pass to [`Self::unsubscribe()`].
    ///
    /// A listener returns either `()` or a `Result<(), E>`. Returned errors
    /// and panics are collected into the [`NotifyError`] of the write that
    /// triggered them.
    pub fn subscribe<F, R>(&self, listener: F) -> ListenerId
    where
        T: 'static,
        F: Fn(&T, &T) -> R + Send + Sync + 'static,
        R: ListenerOutcome,
    {
        self.data.subscribe(Box::new(move |old_value: &T, new_value: &T| {
            listener(old_value, new_value).into_result()
        }))
    }

    /// Subscribes `listener` like [`Self::subscribe()`], returning a guard
    /// that unsubscribes it when dropped.
    pub fn subscribe_scoped<F, R>(&self, listener: F) -> Subscription<T>
    where
        T: 'static,
        F: Fn(&T, &T) -> R + Send + Sync + 'static,
        R: ListenerOutcome,
    {
        Subscription {
            id: self.subscribe(listener),
            data: Arc::downgrade(&self.data),
        }
    }

    /// Removes the listener identified by `id`. Returns false if it was
    /// already removed or was never subscribed to this instance.
    ///
    /// If a write is notifying listeners, a listener removed before its turn
    /// is skipped.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.data.unsubscribe(id)
    }

    /// Returns true if the listener identified by `id` is subscribed.
    #[must_use]
    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.data.listeners.lock().iter().any(|listener| listener.id == id)
    }

    /// Returns the number of subscribed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.data.listeners.lock().len()
    }

    /// Returns true if there are any subscribed listeners.
    #[must_use]
    pub fn has_listeners(&self) -> bool {
        self.listener_count() > 0
    }

    /// Returns the number of writes that have notified listeners.
    #[must_use]
    pub fn version(&self) -> usize {
        self.data.version.load(Ordering::Acquire)
    }

    /// Returns when this instance notifies its listeners.
    #[must_use]
    pub fn policy(&self) -> NotifyPolicy {
        if self.data.unchanged.is_some() {
            NotifyPolicy::OnChange
        } else {
            NotifyPolicy::Always
        }
    }
}

/// When an [`Observable`] notifies its listeners.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum NotifyPolicy {
    /// Every write notifies, even when the new value equals the old one.
    #[default]
    Always,
    /// Writes of a value equal to the stored one are skipped.
    OnChange,
}

/// Configures a new [`Observable`].
#[must_use]
pub struct Builder<T> {
    initial_value: T,
    unchanged: Option<fn(&T, &T) -> bool>,
}

impl<T> Builder<T> {
    /// Only notify when the written value differs from the stored one.
    pub fn notify_only_on_change(mut self) -> Self
    where
        T: PartialEq,
    {
        self.unchanged = Some(T::eq);
        self
    }

    /// Notify on every write. This is the default.
    pub fn notify_always(mut self) -> Self {
        self.unchanged = None;
        self
    }

    /// Returns the configured [`Observable`].
    pub fn build(self) -> Observable<T> {
        Observable {
            data: Arc::new(Data {
                value: RwLock::new(self.initial_value),
                version: AtomicUsize::new(0),
                listeners: Mutex::new(Vec::new()),
                writer: ReentrantMutex::new(()),
                unchanged: self.unchanged,
            }),
        }
    }
}

impl<T> fmt::Debug for Builder<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("initial_value", &self.initial_value)
            .field("notify_only_on_change", &self.unchanged.is_some())
            .finish()
    }
}

struct Data<T> {
    value: RwLock<T>,
    version: AtomicUsize,
    listeners: Mutex<Vec<Arc<Listener<T>>>>,
    // Serializes notification rounds. Reentrant so listeners can write.
    writer: ReentrantMutex<()>,
    unchanged: Option<fn(&T, &T) -> bool>,
}

impl<T> Data<T> {
    fn is_unchanged(&self, old_value: &T, new_value: &T) -> bool {
        match self.unchanged {
            Some(eq) => eq(old_value, new_value),
            None => false,
        }
    }

    fn subscribe(&self, callback: Box<Callback<T>>) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(Arc::new(Listener {
            id,
            active: AtomicBool::new(true),
            callback,
        }));
        tracing::trace!(listener = %id, "listener subscribed");
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        if let Some(index) = listeners.iter().position(|listener| listener.id == id) {
            let listener = listeners.remove(index);
            listener.active.store(false, Ordering::Release);
            tracing::trace!(listener = %id, "listener unsubscribed");
            true
        } else {
            false
        }
    }

    fn notify(&self, old_value: &T, new_value: &T) -> Result<(), NotifyError> {
        // The lock is released before any listener runs, so listeners are
        // free to subscribe and unsubscribe.
        let listeners = self.listeners.lock().clone();
        tracing::trace!(listeners = listeners.len(), "notifying listeners");

        let mut failures = Vec::new();
        for listener in listeners {
            if !listener.active.load(Ordering::Acquire) {
                continue;
            }
            if let Err(failure) = listener.invoke(old_value, new_value) {
                tracing::warn!(
                    listener = %listener.id,
                    error = %failure,
                    "listener failed, continuing with the remaining listeners"
                );
                failures.push(ListenerInvocationError {
                    listener: listener.id,
                    source: failure,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError { failures })
        }
    }
}

struct Listener<T> {
    id: ListenerId,
    active: AtomicBool,
    callback: Box<Callback<T>>,
}

impl<T> Listener<T> {
    fn invoke(&self, old_value: &T, new_value: &T) -> Result<(), ListenerFailure> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(old_value, new_value))) {
            Ok(result) => result.map_err(ListenerFailure::Returned),
            Err(payload) => Err(ListenerFailure::Panicked(panic_message(&*payload))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}

/// The value a listener returns: either `()` or a `Result<(), E>`.
pub trait ListenerOutcome {
    /// Converts this outcome into a result.
    ///
    /// # Errors
    ///
    /// Returns the listener's error, if any.
    fn into_result(self) -> Result<(), BoxError>;
}

impl ListenerOutcome for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> ListenerOutcome for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// Identifies a subscribed listener. Ids are never reused.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// A guard that unsubscribes its listener when dropped.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription<T> {
    id: ListenerId,
    data: Weak<Data<T>>,
}

impl<T> Subscription<T> {
    /// Returns the id of the guarded listener.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Keeps the listener subscribed after this guard is gone. Returns its
    /// id.
    pub fn detach(mut self) -> ListenerId {
        self.data = Weak::new();
        self.id
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(data) = self.data.upgrade() {
            data.unsubscribe(self.id);
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// A read guard that allows reading the currently stored value in an
/// [`Observable`]. No values can be stored within the source [`Observable`]
/// while this guard exists.
///
/// The inner value is accessible through [`Deref`].
#[must_use]
pub struct ObservableReadGuard<'a, T>(RwLockReadGuard<'a, T>);

impl<'a, T> Deref for ObservableReadGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// How a listener failed.
#[derive(Debug, thiserror::Error)]
pub enum ListenerFailure {
    /// The listener returned an error.
    #[error("returned an error: {0}")]
    Returned(#[source] BoxError),
    /// The listener panicked. Contains the panic message.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// A listener failed while being notified of a write.
#[derive(Debug, thiserror::Error)]
#[error("{listener} {source}")]
pub struct ListenerInvocationError {
    listener: ListenerId,
    source: ListenerFailure,
}

impl ListenerInvocationError {
    /// Returns the id of the listener that failed.
    #[must_use]
    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Returns how the listener failed.
    #[must_use]
    pub fn failure(&self) -> &ListenerFailure {
        &self.source
    }
}

/// One or more listeners failed while being notified of a write. The write
/// itself took effect.
#[derive(Debug, thiserror::Error)]
#[error("{} listener(s) failed during notification", .failures.len())]
pub struct NotifyError {
    failures: Vec<ListenerInvocationError>,
}

impl NotifyError {
    /// Returns the failures in the order the listeners were invoked.
    #[must_use]
    pub fn failures(&self) -> &[ListenerInvocationError] {
        &self.failures
    }

    /// Returns the failures in the order the listeners were invoked.
    #[must_use]
    pub fn into_failures(self) -> Vec<ListenerInvocationError> {
        self.failures
    }
}

#[cfg(test)]
use tracing_test::traced_test;

#[cfg(test)]
type Calls<T> = Arc<Mutex<Vec<(T, T)>>>;

#[cfg(test)]
fn new_calls<T>() -> Calls<T> {
    Arc::new(Mutex::new(Vec::new()))
}

#[cfg(test)]
fn recorder<T: Clone + Send + 'static>(calls: &Calls<T>) -> impl Fn(&T, &T) + Send + Sync {
    let calls = calls.clone();
    move |old_value: &T, new_value: &T| calls.lock().push((old_value.clone(), new_value.clone()))
}

#[test]
fn basics() {
    let observable = Observable::new(3.1_f64);
    assert!(!observable.has_listeners());
    let calls = new_calls();
    observable.subscribe(recorder(&calls));
    assert_eq!(observable.listener_count(), 1);

    observable.set(4.0).unwrap();
    assert_eq!(*calls.lock(), [(3.1, 4.0)]);
    assert!((observable.get() - 4.0).abs() < f64::EPSILON);
    assert_eq!(observable.version(), 1);
}

#[test]
fn reads_latest_write() {
    let observable = Observable::new(String::from("Shahzad"));
    assert_eq!(observable.get(), "Shahzad");
    for name in ["Abbass", "Majeed", "FAST"] {
        observable.set(String::from(name)).unwrap();
        assert_eq!(observable.get(), name);
        assert_eq!(&*observable.read(), name);
    }
    assert_eq!(observable.version(), 3);
}

#[test]
fn delivery_is_in_subscription_order() {
    let observable = Observable::new(0_u32);
    let order = Arc::new(Mutex::new(Vec::new()));
    for name in ["L1", "L2", "L3"] {
        let order = order.clone();
        observable.subscribe(move |_: &u32, _: &u32| order.lock().push(name));
    }

    observable.set(1).unwrap();
    assert_eq!(*order.lock(), ["L1", "L2", "L3"]);
    observable.set(2).unwrap();
    assert_eq!(order.lock().len(), 6);
}

#[test]
fn late_listeners_only_see_later_writes() {
    let observable = Observable::new(0_u32);
    observable.set(1).unwrap();
    observable.set(2).unwrap();

    let calls = new_calls();
    observable.subscribe(recorder(&calls));
    assert!(calls.lock().is_empty());

    observable.set(3).unwrap();
    assert_eq!(*calls.lock(), [(2, 3)]);
}

#[test]
fn equal_writes_notify_by_default() {
    let observable = Observable::new(0_u32);
    assert_eq!(observable.policy(), NotifyPolicy::Always);
    let calls = new_calls();
    observable.subscribe(recorder(&calls));

    observable.set(5).unwrap();
    observable.set(5).unwrap();
    assert_eq!(*calls.lock(), [(0, 5), (5, 5)]);
    assert_eq!(observable.version(), 2);
}

#[test]
fn equal_writes_skipped_on_change_policy() {
    let observable = Observable::builder(0_u32).notify_only_on_change().build();
    assert_eq!(observable.policy(), NotifyPolicy::OnChange);
    let calls = new_calls();
    observable.subscribe(recorder(&calls));

    observable.set(5).unwrap();
    observable.set(5).unwrap();
    observable.update(|value| *value = 5).unwrap();
    assert_eq!(*calls.lock(), [(0, 5)]);
    assert_eq!(observable.version(), 1);

    let always = Observable::builder(0_u32)
        .notify_only_on_change()
        .notify_always()
        .build();
    assert_eq!(always.policy(), NotifyPolicy::Always);
}

#[test]
fn update_passes_snapshot() {
    let observable = Observable::new(vec![1, 2, 3]);
    let calls = new_calls();
    observable.subscribe(recorder(&calls));

    observable.update(|values| values.push(4)).unwrap();
    assert_eq!(*calls.lock(), [(vec![1, 2, 3], vec![1, 2, 3, 4])]);
    assert_eq!(observable.get(), [1, 2, 3, 4]);
}

#[test]
fn panicking_update_keeps_value() {
    let observable = Observable::new(vec![1]);
    let calls = new_calls();
    observable.subscribe(recorder(&calls));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        observable.update(|values| {
            values.push(2);
            panic!("modification failed");
        })
    }));
    assert!(result.is_err());
    assert_eq!(observable.get(), [1]);
    assert_eq!(observable.version(), 0);
    assert!(calls.lock().is_empty());

    // Reading inside the modification doesn't block.
    let reader = observable.clone();
    observable
        .update(|values| {
            assert_eq!(reader.get(), [1]);
            values.push(2);
        })
        .unwrap();
    assert_eq!(*calls.lock(), [(vec![1], vec![1, 2])]);
}

#[test]
fn unsubscribe() {
    let observable = Observable::new(0_u32);
    let calls = new_calls();
    let id = observable.subscribe(recorder(&calls));
    assert!(observable.is_subscribed(id));

    observable.set(1).unwrap();
    assert!(observable.unsubscribe(id));
    assert!(!observable.is_subscribed(id));
    // Removing twice is a no-op.
    assert!(!observable.unsubscribe(id));

    observable.set(2).unwrap();
    assert_eq!(*calls.lock(), [(0, 1)]);
    assert!(!observable.has_listeners());
}

#[test]
fn ids_are_not_shared_between_observables() {
    let first = Observable::new(0_u32);
    let second = Observable::new(0_u32);
    let first_id = first.subscribe(|_: &u32, _: &u32| {});
    let second_id = second.subscribe(|_: &u32, _: &u32| {});
    assert_ne!(first_id, second_id);

    assert!(!second.unsubscribe(first_id));
    assert!(second.is_subscribed(second_id));
    assert!(first.is_subscribed(first_id));
}

#[test]
fn unsubscribe_during_notification() {
    let observable = Observable::new(0_u32);
    let calls = new_calls();
    let victim = Arc::new(Mutex::new(None));

    let unsubscriber = {
        let observable = observable.clone();
        let victim = victim.clone();
        move |_: &u32, _: &u32| {
            if let Some(id) = victim.lock().take() {
                assert!(observable.unsubscribe(id));
            }
        }
    };
    observable.subscribe(unsubscriber);
    *victim.lock() = Some(observable.subscribe(recorder(&calls)));
    let survivor = new_calls();
    observable.subscribe(recorder(&survivor));

    // The second listener is removed before its turn in this very write.
    observable.set(1).unwrap();
    observable.set(2).unwrap();
    assert!(calls.lock().is_empty());
    assert_eq!(*survivor.lock(), [(0, 1), (1, 2)]);
    assert_eq!(observable.listener_count(), 2);
}

#[test]
fn subscribe_during_notification() {
    let observable = Observable::new(0_u32);
    let calls = new_calls();

    let subscriber = {
        let observable = observable.clone();
        let calls = calls.clone();
        move |_: &u32, new_value: &u32| {
            if *new_value == 1 {
                observable.subscribe(recorder(&calls));
            }
        }
    };
    observable.subscribe(subscriber);

    observable.set(1).unwrap();
    assert!(calls.lock().is_empty());
    observable.set(2).unwrap();
    assert_eq!(*calls.lock(), [(1, 2)]);
}

#[test]
fn reentrant_writes() {
    let observable = Observable::new(0_u32);
    let clamp = {
        let observable = observable.clone();
        move |_: &u32, new_value: &u32| {
            if *new_value > 10 {
                observable.set(10)
            } else {
                Ok(())
            }
        }
    };
    observable.subscribe(clamp);
    let calls = new_calls();
    observable.subscribe(recorder(&calls));

    observable.set(42).unwrap();
    assert_eq!(observable.get(), 10);
    // The nested write completes before the outer round continues.
    assert_eq!(*calls.lock(), [(42, 10), (0, 42)]);
}

#[cfg(test)]
#[test]
#[traced_test]
fn failing_listeners_are_isolated() {
    let observable = Observable::new(String::from("Shahzad"));
    let failing = observable.subscribe(|_: &String, new_value: &String| {
        if new_value.is_empty() {
            Err("names cannot be empty")
        } else {
            Ok(())
        }
    });
    let panicking = observable.subscribe(|_: &String, new_value: &String| {
        assert!(!new_value.is_empty(), "listener exploded");
    });
    let calls = new_calls();
    observable.subscribe(recorder(&calls));

    let error = observable.set(String::new()).unwrap_err();
    assert_eq!(observable.get(), "");
    assert_eq!(*calls.lock(), [(String::from("Shahzad"), String::new())]);

    let failures = error.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].listener(), failing);
    assert!(matches!(
        failures[0].failure(),
        ListenerFailure::Returned(source) if source.to_string() == "names cannot be empty"
    ));
    assert_eq!(failures[1].listener(), panicking);
    assert!(matches!(
        failures[1].failure(),
        ListenerFailure::Panicked(message) if message == "listener exploded"
    ));
    assert!(error.to_string().starts_with("2 listener(s) failed"));
    assert!(logs_contain("listener failed"));

    // Failing listeners stay subscribed.
    assert_eq!(observable.listener_count(), 3);
    observable.set(String::from("Abbass")).unwrap();
    assert_eq!(observable.set(String::new()).unwrap_err().into_failures().len(), 2);
}

#[test]
fn scoped_subscriptions() {
    let observable = Observable::new(0_u32);
    let calls = new_calls();
    let subscription = observable.subscribe_scoped(recorder(&calls));
    assert!(observable.is_subscribed(subscription.id()));

    observable.set(1).unwrap();
    drop(subscription);
    observable.set(2).unwrap();
    assert_eq!(*calls.lock(), [(0, 1)]);
    assert!(!observable.has_listeners());

    let id = observable.subscribe_scoped(recorder(&calls)).detach();
    assert!(observable.is_subscribed(id));
    observable.set(3).unwrap();
    assert_eq!(calls.lock().len(), 2);

    // Outliving the observable is harmless.
    let subscription = observable.subscribe_scoped(recorder(&calls));
    drop(observable);
    drop(subscription);
}

#[test]
fn clones_share_state() {
    let observable = Observable::default();
    let cloned = observable.clone();
    let calls = new_calls();
    observable.subscribe(recorder(&calls));

    cloned.set(1_u32).unwrap();
    assert_eq!(observable.get(), 1);
    assert_eq!(observable.version(), 1);
    assert_eq!(*calls.lock(), [(0, 1)]);
}

#[test]
fn concurrent_writers_deliver_whole_rounds() {
    let observable = Observable::new(0_u32);
    let calls = new_calls();
    observable.subscribe(recorder(&calls));

    let workers = (0..8)
        .map(|worker| {
            let observable = observable.clone();
            std::thread::spawn(move || {
                for i in 1..=100 {
                    observable.set(worker * 1000 + i).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for worker in workers {
        worker.join().unwrap();
    }

    let calls = calls.lock();
    assert_eq!(calls.len(), 800);
    assert_eq!(calls[0].0, 0);
    for pair in calls.windows(2) {
        assert_eq!(pair[0].1, pair[1].0);
    }
    assert_eq!(calls[799].1, observable.get());
}

#[test]
fn debug_format() {
    let observable = Observable::builder(42_u32).notify_only_on_change().build();
    observable.subscribe(|_: &u32, _: &u32| {});
    let debug = format!("{observable:?}");
    assert!(debug.contains("Observable"));
    assert!(debug.contains("42"));
    assert!(debug.contains("listeners: 1"));
    assert!(debug.contains("OnChange"));
}
