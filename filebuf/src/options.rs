//! Open options.
//!
//! A handle is opened from a list of [`OpenOption`]s. Exactly one of `Read`
//! and `Write` fixes the handle mode; `Lock` asks for the mutual-exclusion
//! guard; the rest are passed to `open(2)` unchanged.

use std::fmt;
use std::str::FromStr;

use fs_runtime::{Access, OpenFlags};

use crate::error::{Error, Result};

/// Direction of a handle, fixed at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

impl Mode {
    pub(crate) fn access(self) -> Access {
        match self {
            Mode::Read => Access::ReadOnly,
            Mode::Write => Access::WriteOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOption {
    Read,
    Write,
    Append,
    Create,
    Exclusive,
    Truncate,
    Sync,
    Dsync,
    Lock,
}

/// Names accepted by [`OpenOption::from_str`].
pub const OPTION_NAMES: [(&str, OpenOption); 9] = [
    ("read", OpenOption::Read),
    ("write", OpenOption::Write),
    ("append", OpenOption::Append),
    ("create", OpenOption::Create),
    ("exclusive", OpenOption::Exclusive),
    ("truncate", OpenOption::Truncate),
    ("sync", OpenOption::Sync),
    ("dsync", OpenOption::Dsync),
    ("lock", OpenOption::Lock),
];

impl OpenOption {
    #[must_use]
    pub fn name(self) -> &'static str {
        OPTION_NAMES
            .iter()
            .find(|(_, opt)| *opt == self)
            .map_or("unknown", |(name, _)| name)
    }
}

impl FromStr for OpenOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OPTION_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, opt)| *opt)
            .ok_or(Error::InvalidArgument("unknown open option"))
    }
}

impl fmt::Display for OpenOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub mode: Mode,
    pub flags: OpenFlags,
    pub lock: bool,
}

impl OpenOptions {
    /// Read-only, unlocked.
    #[must_use]
    pub fn read() -> Self {
        Self {
            mode: Mode::Read,
            flags: OpenFlags::read_only(),
            lock: false,
        }
    }

    /// Write-only, unlocked; the file must exist unless `create` is set.
    #[must_use]
    pub fn write() -> Self {
        Self {
            mode: Mode::Write,
            flags: OpenFlags::write_only(),
            lock: false,
        }
    }

    #[must_use]
    pub fn create(mut self, on: bool) -> Self {
        self.flags.create = on;
        self
    }

    #[must_use]
    pub fn truncate(mut self, on: bool) -> Self {
        self.flags.truncate = on;
        self
    }

    #[must_use]
    pub fn append(mut self, on: bool) -> Self {
        self.flags.append = on;
        self
    }

    #[must_use]
    pub fn lock(mut self, on: bool) -> Self {
        self.lock = on;
        self
    }

    /// Decode an option list.
    ///
    /// # Errors
    /// `InvalidArgument` unless exactly one of `Read` and `Write` is present.
    pub fn from_list(options: &[OpenOption]) -> Result<Self> {
        let mut mode = None;
        let mut flags = OpenFlags::default();
        let mut lock = false;

        for option in options {
            match option {
                OpenOption::Read | OpenOption::Write => {
                    let wanted = if *option == OpenOption::Read {
                        Mode::Read
                    } else {
                        Mode::Write
                    };
                    if mode.is_some_and(|m| m != wanted) {
                        return Err(Error::InvalidArgument("both read and write requested"));
                    }
                    mode = Some(wanted);
                }
                OpenOption::Append => flags.append = true,
                OpenOption::Create => flags.create = true,
                OpenOption::Exclusive => flags.exclusive = true,
                OpenOption::Truncate => flags.truncate = true,
                OpenOption::Sync => flags.sync = true,
                OpenOption::Dsync => flags.dsync = true,
                OpenOption::Lock => lock = true,
            }
        }

        let mode = mode.ok_or(Error::InvalidArgument("neither read nor write requested"))?;
        flags.access = mode.access();
        Ok(Self { mode, flags, lock })
    }

    /// Decode an option list given by names, e.g. from a configuration file.
    ///
    /// # Errors
    /// `InvalidArgument` on an unknown name or an invalid combination.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let options = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<OpenOption>>>()?;
        Self::from_list(&options)
    }
}
