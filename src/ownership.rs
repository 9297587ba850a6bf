//! Ownership tags and the passing-mode policy.
//!
//! A container handle arrives from the host under one of the host's passing
//! conventions. The convention decides who is responsible for the handle
//! once the library function returns:
//!
//! | Passing mode            | Ownership          | Cleanup on drop      |
//! |-------------------------|--------------------|----------------------|
//! | `Automatic`, `Constant` | `HostManaged`      | none                 |
//! | `Manual`                | `CallerOwned`      | destroy              |
//! | `Shared`                | `SharedWithHost`   | relinquish the share |

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Who is responsible for releasing a container handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ownership {
    /// The host owns the resource; the wrapper never releases it.
    #[default]
    HostManaged,
    /// The wrapper is solely responsible for destroying the resource.
    CallerOwned,
    /// The reference count is shared with the host; the wrapper releases its
    /// share and never destroys the resource outright.
    SharedWithHost,
}

impl Ownership {
    /// Initial ownership for a handle received under `mode`.
    ///
    /// `None` means the handle reached this side without any convention, for
    /// example as a value borrowed from another container.
    pub const fn from_passing(mode: Option<PassingMode>) -> Self {
        match mode {
            Some(PassingMode::Manual) => Ownership::CallerOwned,
            Some(PassingMode::Shared) => Ownership::SharedWithHost,
            Some(PassingMode::Automatic) | Some(PassingMode::Constant) | None => {
                Ownership::HostManaged
            }
        }
    }

    /// Check if a wrapper with this tag has a cleanup action to run.
    pub const fn is_owner(self) -> bool {
        !matches!(self, Ownership::HostManaged)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Ownership::HostManaged => "HostManaged",
            Ownership::CallerOwned => "CallerOwned",
            Ownership::SharedWithHost => "SharedWithHost",
        };
        f.write_str(s)
    }
}

/// Convention under which a container is passed between host and library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PassingMode {
    /// The host keeps the container; the library only borrows it.
    #[default]
    Automatic,
    /// Read-only variant of `Automatic`; identical for resource management.
    Constant,
    /// The library receives its own container and must free it.
    Manual,
    /// The container is shared with the host through a reference count.
    Shared,
}

impl PassingMode {
    /// Initial ownership of a handle received in this mode.
    pub const fn initial_ownership(self) -> Ownership {
        Ownership::from_passing(Some(self))
    }

    /// Name of the mode as the host spells it.
    pub const fn as_str(self) -> &'static str {
        match self {
            PassingMode::Automatic => "Automatic",
            PassingMode::Constant => "Constant",
            PassingMode::Manual => "Manual",
            PassingMode::Shared => "Shared",
        }
    }
}

impl From<PassingMode> for Ownership {
    fn from(mode: PassingMode) -> Ownership {
        mode.initial_ownership()
    }
}

impl fmt::Display for PassingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Automatic" => Ok(PassingMode::Automatic),
            "Constant" => Ok(PassingMode::Constant),
            "Manual" => Ok(PassingMode::Manual),
            "Shared" => Ok(PassingMode::Shared),
            other => Err(Error::UnknownPassingMode(other.to_string())),
        }
    }
}
