use crate::error::oracle::OracleError;

use log::{trace, warn};

/// The OS-provided "does this process have accessibility permission" query.
///
/// Implementations may fail; callers inside the bridge go through
/// [`query_or_deny`] so a failure is indistinguishable from a denial.
pub trait PermissionOracle: Send + Sync {
    fn query(&self) -> Result<bool, OracleError>;
}

impl<F> PermissionOracle for F
where
    F: Fn() -> Result<bool, OracleError> + Send + Sync,
{
    fn query(&self) -> Result<bool, OracleError> {
        self()
    }
}

/// Query the oracle, mapping any error to `false`.
pub fn query_or_deny(oracle: &dyn PermissionOracle) -> bool {
    match oracle.query() {
        Ok(granted) => {
            trace!("Permission oracle answered granted={granted}");
            granted
        }
        Err(e) => {
            warn!("Permission query failed, treating as not granted: {e}");
            false
        }
    }
}

/// Oracle backed by the platform accessibility API.
///
/// On macOS this is `AXIsProcessTrusted`. Other platforms have no
/// accessibility gate for input monitoring, so the permission is reported
/// as granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOracle;

impl SystemOracle {
    /// Ask the OS to show its own "grant accessibility" prompt if the
    /// process is not yet trusted. Returns the trust state at call time.
    pub fn prompt(&self) -> bool {
        platform::prompt()
    }
}

impl PermissionOracle for SystemOracle {
    fn query(&self) -> Result<bool, OracleError> {
        Ok(platform::is_trusted())
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use core_foundation::base::TCFType;
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
    use core_foundation::string::CFString;

    #[link(name = "ApplicationServices", kind = "framework")]
    unsafe extern "C" {
        fn AXIsProcessTrusted() -> bool;
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    }

    pub(super) fn is_trusted() -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    pub(super) fn prompt() -> bool {
        let prompt_key = CFString::new("AXTrustedCheckOptionPrompt");
        let prompt_value = CFBoolean::true_value();
        let options =
            CFDictionary::from_CFType_pairs(&[(prompt_key.as_CFType(), prompt_value.as_CFType())]);

        unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    pub(super) fn is_trusted() -> bool {
        true
    }

    pub(super) fn prompt() -> bool {
        true
    }
}
