//! Process-wide registry installation
//!
//! Installation is one-shot per process, so everything lives in one test.

use faultkit_core::kind::{self, FaultKindRegistry};
use faultkit_core::{CoreError, Fault, FaultKind};

#[test]
fn test_install_freezes_custom_kinds() {
    // Before installation the global view holds the built-ins
    assert!(!kind::is_installed());
    assert_eq!(kind::global().len(), 11);
    assert_eq!(FaultKind::ARITHMETIC.name(), Some("Arithmetic"));

    let mut registry = FaultKindRegistry::new();
    let timeout = registry.register("Timeout").unwrap();
    let quota = registry.register("QuotaExceeded").unwrap();

    let installed = registry.install().unwrap();
    assert!(kind::is_installed());
    assert_eq!(installed.len(), 13);
    assert_eq!(kind::global().lookup("Timeout"), Some(timeout));
    assert_eq!(timeout.name(), Some("Timeout"));

    let names: Vec<_> = kind::global()
        .all()
        .filter_map(|kind| kind.name())
        .collect();
    assert_eq!(names.first(), Some(&"Unclassified"));
    assert_eq!(names.last(), Some(&"QuotaExceeded"));

    let fault = Fault::new(quota, "monthly quota used up").unwrap();
    assert_eq!(fault.to_string(), "QuotaExceeded: monthly quota used up");

    // A second installation is refused
    let err = FaultKindRegistry::new().install().unwrap_err();
    assert_eq!(err, CoreError::RegistryInstalled);
    assert_eq!(kind::global().len(), 13);
}
