use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies which caches have caught up with a directory's last reset.
///
/// A memoized function bound to a directory answers for one tag. By default
/// the tag is derived from the function's key type, so every engine keyed by
/// the same type shares a tag inside a given directory. A caller can pick an
/// explicit name instead with [`KeyTag::named`].
///
/// # Examples
///
/// ```
/// use memogate_core::KeyTag;
///
/// assert_eq!(KeyTag::of::<u64>(), KeyTag::of::<u64>());
/// assert_ne!(KeyTag::of::<u64>(), KeyTag::of::<u32>());
/// assert_ne!(KeyTag::of::<u64>(), KeyTag::named("u64"));
/// assert_eq!(KeyTag::named("users").to_string(), "users");
/// ```
#[derive(Clone, Debug)]
pub enum KeyTag {
    /// Derived from a Rust type.
    Type { id: TypeId, name: &'static str },
    /// Chosen by the caller.
    Named(Cow<'static, str>),
}

impl KeyTag {
    /// The tag for key type `K`.
    pub fn of<K: ?Sized + 'static>() -> Self {
        KeyTag::Type {
            id: TypeId::of::<K>(),
            name: type_name::<K>(),
        }
    }

    /// A caller-chosen tag.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        KeyTag::Named(name.into())
    }

    /// Human readable label, used in logs.
    pub fn label(&self) -> &str {
        match self {
            KeyTag::Type { name, .. } => name,
            KeyTag::Named(name) => name.as_ref(),
        }
    }
}

// Type tags compare by `TypeId` alone.
impl PartialEq for KeyTag {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyTag::Type { id: a, .. }, KeyTag::Type { id: b, .. }) => a == b,
            (KeyTag::Named(a), KeyTag::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyTag {}

impl Hash for KeyTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            KeyTag::Type { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            KeyTag::Named(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Display for KeyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
