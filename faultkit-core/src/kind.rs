//! Fault kind registry
//!
//! A [`FaultKind`] is a flat category tag. Kinds are registered into a
//! [`FaultKindRegistry`] during start-up, after which the registry is
//! installed as process-wide state and never changes again. Until then the
//! process-wide view holds just the built-in kinds. Reads go through a
//! [`OnceLock`] and take no lock.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{CoreError, Result};

/// Names of the built-in kinds, in registration order
const BUILTIN_KINDS: [&str; 11] = [
    "Unclassified",
    "Arithmetic",
    "Bounds",
    "NullReference",
    "Format",
    "Cast",
    "ResourceUnavailable",
    "StateInvalid",
    "UnsupportedOperation",
    "ConcurrencyConflict",
    "Interruption",
];

/// Registry installed by [`FaultKindRegistry::install`]
static GLOBAL: OnceLock<FaultKindRegistry> = OnceLock::new();

/// Built-in registry served until one is installed
static BUILTIN: OnceLock<FaultKindRegistry> = OnceLock::new();

/// Discrete category tag carried by every fault
///
/// Kinds compare by identity only. There is no hierarchy: a handler that
/// wants to treat several kinds alike lists all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaultKind(u32);

impl FaultKind {
    /// Catch-all for failures nothing else classified
    pub const UNCLASSIFIED: FaultKind = FaultKind(0);
    /// Arithmetic failure such as division by zero or overflow
    pub const ARITHMETIC: FaultKind = FaultKind(1);
    /// Index or range outside the valid bounds
    pub const BOUNDS: FaultKind = FaultKind(2);
    /// A required value was absent
    pub const NULL_REFERENCE: FaultKind = FaultKind(3);
    /// Text could not be parsed into the expected shape
    pub const FORMAT: FaultKind = FaultKind(4);
    /// A value could not be converted to the requested type
    pub const CAST: FaultKind = FaultKind(5);
    /// An external resource could not be obtained or used
    pub const RESOURCE_UNAVAILABLE: FaultKind = FaultKind(6);
    /// An operation was invoked in a state that does not permit it
    pub const STATE_INVALID: FaultKind = FaultKind(7);
    /// The operation is not supported by the receiver
    pub const UNSUPPORTED_OPERATION: FaultKind = FaultKind(8);
    /// Conflicting concurrent access to shared state
    pub const CONCURRENCY_CONFLICT: FaultKind = FaultKind(9);
    /// A wait or computation was interrupted by cancellation
    pub const INTERRUPTION: FaultKind = FaultKind(10);

    /// Position of this kind in registration order
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is one of the kinds every registry starts with
    pub const fn is_builtin(self) -> bool {
        self.index() < BUILTIN_KINDS.len()
    }

    /// Name of this kind in the process-wide registry
    pub fn name(self) -> Option<&'static str> {
        global().name(self)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "kind#{}", self.0),
        }
    }
}

/// Append-only table of fault kinds
///
/// Every registry begins with the built-in kinds. Further kinds are added
/// with [`register`](Self::register); nothing is ever removed.
#[derive(Debug, Clone)]
pub struct FaultKindRegistry {
    names: Vec<String>,
}

impl Default for FaultKindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultKindRegistry {
    /// Create a registry holding only the built-in kinds
    pub fn new() -> Self {
        Self {
            names: BUILTIN_KINDS.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Add a new kind, failing if the name is taken
    pub fn register(&mut self, name: &str) -> Result<FaultKind> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::EmptyKindName);
        }
        if self.lookup(name).is_some() {
            return Err(CoreError::DuplicateKind {
                name: name.to_string(),
            });
        }

        let kind = FaultKind(self.names.len() as u32);
        self.names.push(name.to_string());
        tracing::debug!(kind = name, index = kind.0, "registered fault kind");
        Ok(kind)
    }

    /// Find a kind by its exact name
    pub fn lookup(&self, name: &str) -> Option<FaultKind> {
        self.names
            .iter()
            .position(|registered| registered == name)
            .map(|index| FaultKind(index as u32))
    }

    /// Name of a kind, if it belongs to this registry
    pub fn name(&self, kind: FaultKind) -> Option<&str> {
        self.names.get(kind.index()).map(String::as_str)
    }

    /// Whether the kind belongs to this registry
    pub fn contains(&self, kind: FaultKind) -> bool {
        kind.index() < self.names.len()
    }

    /// All kinds in registration order
    ///
    /// The returned iterator can be cloned to restart the walk.
    pub fn all(&self) -> impl ExactSizeIterator<Item = FaultKind> + Clone + '_ {
        (0..self.names.len() as u32).map(FaultKind)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the built-in kinds are present from construction
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Freeze this registry as the process-wide one
    ///
    /// Only one registry can ever be installed.
    pub fn install(self) -> Result<&'static FaultKindRegistry> {
        let count = self.names.len();
        GLOBAL
            .set(self)
            .map_err(|_| CoreError::RegistryInstalled)?;
        tracing::debug!(kinds = count, "installed fault kind registry");
        Ok(global())
    }
}

/// The process-wide registry
///
/// Holds the built-in kinds until a registry is installed.
pub fn global() -> &'static FaultKindRegistry {
    match GLOBAL.get() {
        Some(installed) => installed,
        None => BUILTIN.get_or_init(FaultKindRegistry::new),
    }
}

/// Whether a registry has been installed
pub fn is_installed() -> bool {
    GLOBAL.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds_in_order() {
        let registry = FaultKindRegistry::new();
        let kinds: Vec<_> = registry.all().collect();

        assert_eq!(kinds.len(), 11);
        assert_eq!(kinds[0], FaultKind::UNCLASSIFIED);
        assert_eq!(kinds[1], FaultKind::ARITHMETIC);
        assert_eq!(kinds[10], FaultKind::INTERRUPTION);
        assert_eq!(registry.name(FaultKind::NULL_REFERENCE), Some("NullReference"));
    }

    #[test]
    fn test_register_appends() {
        let mut registry = FaultKindRegistry::new();
        let timeout = registry.register("Timeout").unwrap();
        let quota = registry.register("QuotaExceeded").unwrap();

        assert_eq!(timeout.index(), 11);
        assert_eq!(quota.index(), 12);
        assert!(!timeout.is_builtin());
        assert_eq!(registry.lookup("Timeout"), Some(timeout));
        assert_eq!(registry.all().last(), Some(quota));
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut registry = FaultKindRegistry::new();
        registry.register("Timeout").unwrap();

        let err = registry.register("Timeout").unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateKind {
                name: "Timeout".to_string()
            }
        );

        // Built-in names are taken too
        assert!(matches!(
            registry.register("Arithmetic"),
            Err(CoreError::DuplicateKind { .. })
        ));
        assert_eq!(registry.len(), 12);
    }

    #[test]
    fn test_register_empty_name_fails() {
        let mut registry = FaultKindRegistry::new();
        assert_eq!(registry.register("   "), Err(CoreError::EmptyKindName));
    }

    #[test]
    fn test_all_is_restartable() {
        let registry = FaultKindRegistry::new();
        let walk = registry.all();
        let first: Vec<_> = walk.clone().collect();
        let second: Vec<_> = walk.collect();
        assert_eq!(first, second);
        assert_eq!(registry.all().count(), first.len());
    }

    #[test]
    fn test_contains_and_unknown_name() {
        let registry = FaultKindRegistry::new();
        assert!(registry.contains(FaultKind::CAST));
        assert!(!registry.contains(FaultKind(400)));
        assert_eq!(registry.name(FaultKind(400)), None);
        assert_eq!(registry.lookup("NoSuchKind"), None);
    }

    #[test]
    fn test_builtin_display() {
        assert_eq!(FaultKind::ARITHMETIC.to_string(), "Arithmetic");
        assert_eq!(FaultKind(9_999).to_string(), "kind#9999");
    }
}
