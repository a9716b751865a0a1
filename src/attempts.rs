//! Attempt-index bindings.
//!
//! A wrapped member can ask to receive the zero-based attempt number in one of its arguments.
//! The association lives in a registry keyed by [`MemberKey`] (owning type + member name) and
//! is looked up before every attempt, so registering or removing a slot takes effect on the next
//! invocation. Members without a binding get their arguments untouched.
//!
//! ```rust
//! use secondwind::attempts::{AttemptArgs, AttemptSlotLookup, AttemptSlotRegistry, MemberKey};
//!
//! struct Client;
//!
//! let registry = AttemptSlotRegistry::default();
//! let key = MemberKey::of::<Client>("fetch");
//! registry.register(key.clone(), 1);
//! assert_eq!(registry.lookup(&key), Some(1));
//!
//! let mut args = ("https://example.com".to_string(), 0usize);
//! assert!(args.inject_attempt(1, 2));
//! assert_eq!(args.1, 2);
//! ```

use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::warn;

/// Identity of a wrapped member: the owning type plus the member name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberKey {
    target: TypeId,
    target_name: &'static str,
    member: Cow<'static, str>,
}

impl MemberKey {
    /// Key for member `member` of type `T`.
    pub fn of<T: ?Sized + 'static>(member: impl Into<Cow<'static, str>>) -> Self {
        Self { target: TypeId::of::<T>(), target_name: type_name::<T>(), member: member.into() }
    }

    /// Owning type id.
    pub fn target(&self) -> TypeId {
        self.target
    }

    /// Owning type name, for diagnostics.
    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    /// Member name.
    pub fn member(&self) -> &str {
        &self.member
    }
}

impl fmt::Debug for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberKey({}::{})", self.target_name, self.member)
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.target_name, self.member)
    }
}

/// Source of attempt-slot bindings consulted by the retry loop.
pub trait AttemptSlotLookup: Send + Sync + fmt::Debug {
    /// Argument position that receives the attempt index, if one was declared.
    fn lookup(&self, key: &MemberKey) -> Option<usize>;
}

/// In-memory binding registry backed by an RwLock. Clones share the same table.
#[derive(Default, Clone, Debug)]
pub struct AttemptSlotRegistry {
    inner: Arc<RwLock<HashMap<MemberKey, usize>>>,
}

static GLOBAL: OnceLock<AttemptSlotRegistry> = OnceLock::new();

impl AttemptSlotRegistry {
    /// Fresh, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by [`Retry::bind_attempts`](crate::Retry::bind_attempts).
    pub fn global() -> &'static AttemptSlotRegistry {
        GLOBAL.get_or_init(AttemptSlotRegistry::default)
    }

    /// Declare that `key` receives the attempt index at argument `position`.
    ///
    /// Re-registering a member replaces the previous position.
    pub fn register(&self, key: MemberKey, position: usize) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = map.insert(key.clone(), position) {
            if previous != position {
                warn!(target: "secondwind::attempts", member = %key, previous, position, "attempt slot replaced; last registration wins");
            }
        }
    }

    /// Remove a binding, returning the position it had.
    pub fn unregister(&self, key: &MemberKey) -> Option<usize> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).remove(key)
    }

    /// Number of bound members.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bindings sorted by member display name.
    pub fn snapshot(&self) -> Vec<(MemberKey, usize)> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(MemberKey, usize)> =
            map.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| a.0.to_string().cmp(&b.0.to_string()));
        entries
    }
}

impl AttemptSlotLookup for AttemptSlotRegistry {
    fn lookup(&self, key: &MemberKey) -> Option<usize> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).get(key).copied()
    }
}

impl<L: AttemptSlotLookup + ?Sized> AttemptSlotLookup for Arc<L> {
    fn lookup(&self, key: &MemberKey) -> Option<usize> {
        (**self).lookup(key)
    }
}

/// Argument lists that can receive the attempt index at a position.
pub trait AttemptArgs {
    /// Write `attempt` into slot `position`. Returns `false` if the slot cannot hold it.
    fn inject_attempt(&mut self, position: usize, attempt: usize) -> bool;
}

/// A single argument that may serve as the attempt slot.
pub trait AttemptArg {
    /// Overwrite with `attempt`; `false` if this type does not carry attempt numbers.
    fn set_attempt(&mut self, attempt: usize) -> bool;
}

macro_rules! integer_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AttemptArg for $ty {
                fn set_attempt(&mut self, attempt: usize) -> bool {
                    match <$ty>::try_from(attempt) {
                        Ok(value) => {
                            *self = value;
                            true
                        }
                        Err(_) => false,
                    }
                }
            }
        )*
    };
}

integer_arg!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

macro_rules! opaque_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AttemptArg for $ty {
                fn set_attempt(&mut self, _attempt: usize) -> bool {
                    false
                }
            }
        )*
    };
}

opaque_arg!(bool, char, f32, f64, String, &str, ());

impl<T: AttemptArg + Default> AttemptArg for Option<T> {
    fn set_attempt(&mut self, attempt: usize) -> bool {
        let mut slot = T::default();
        if slot.set_attempt(attempt) {
            *self = Some(slot);
            true
        } else {
            false
        }
    }
}

#[cfg(feature = "serde")]
impl AttemptArg for serde_json::Value {
    fn set_attempt(&mut self, attempt: usize) -> bool {
        *self = serde_json::Value::from(attempt);
        true
    }
}

/// A single argument is slot 0.
impl<T: AttemptArg> AttemptArgs for T {
    fn inject_attempt(&mut self, position: usize, attempt: usize) -> bool {
        position == 0 && self.set_attempt(attempt)
    }
}

/// Furthest a vector argument is grown past its end to reach the attempt slot.
pub const MAX_SLOT_GROWTH: usize = 1024;

impl<T: AttemptArg + Default> AttemptArgs for Vec<T> {
    /// Positions past the end grow the list with defaults first, up to [`MAX_SLOT_GROWTH`]
    /// extra elements. Anything further is refused.
    fn inject_attempt(&mut self, position: usize, attempt: usize) -> bool {
        if position >= self.len() {
            let Some(len) = position.checked_add(1) else {
                return false;
            };
            if len - self.len() > MAX_SLOT_GROWTH {
                return false;
            }
            self.resize_with(len, T::default);
        }
        self[position].set_attempt(attempt)
    }
}

impl<T: AttemptArg, const N: usize> AttemptArgs for [T; N] {
    fn inject_attempt(&mut self, position: usize, attempt: usize) -> bool {
        self.get_mut(position).is_some_and(|slot| slot.set_attempt(attempt))
    }
}

macro_rules! tuple_args {
    ($(($($idx:tt $name:ident),+)),+ $(,)?) => {
        $(
            impl<$($name: AttemptArg),+> AttemptArgs for ($($name,)+) {
                fn inject_attempt(&mut self, position: usize, attempt: usize) -> bool {
                    match position {
                        $($idx => self.$idx.set_attempt(attempt),)+
                        _ => false,
                    }
                }
            }
        )+
    };
}

tuple_args!(
    (0 A),
    (0 A, 1 B),
    (0 A, 1 B, 2 C),
    (0 A, 1 B, 2 C, 3 D),
    (0 A, 1 B, 2 C, 3 D, 4 E),
    (0 A, 1 B, 2 C, 3 D, 4 E, 5 F),
);

/// Member binding carried by a wrapped operation.
#[derive(Clone, Debug)]
pub(crate) struct SlotBinding {
    pub(crate) key: MemberKey,
    pub(crate) lookup: Arc<dyn AttemptSlotLookup>,
}

impl SlotBinding {
    /// Look the slot up and write `attempt` into `args` if one is declared.
    pub(crate) fn apply<A: AttemptArgs>(&self, args: &mut A, attempt: usize) {
        let Some(position) = self.lookup.lookup(&self.key) else {
            return;
        };
        if !args.inject_attempt(position, attempt) {
            warn!(
                target: "secondwind::attempts",
                member = %self.key,
                position,
                attempt,
                "attempt slot could not receive the attempt index; arguments left unchanged"
            );
        }
    }
}
