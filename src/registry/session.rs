use crate::ldap::bind::Override;
use std::fmt;

/// Session operations whose outcome a test can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOperation {
    Bind,
    Unbind,
    Abandon,
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionOperation::Bind => "bind",
            SessionOperation::Unbind => "unbind",
            SessionOperation::Abandon => "abandon",
        })
    }
}

/// Per-target override table. An override stays until it is replaced or
/// cleared.
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    bind: Option<Override>,
    unbind: Option<Override>,
    abandon: Option<Override>,
}

impl SessionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, operation: SessionOperation) -> &mut Option<Override> {
        match operation {
            SessionOperation::Bind => &mut self.bind,
            SessionOperation::Unbind => &mut self.unbind,
            SessionOperation::Abandon => &mut self.abandon,
        }
    }

    pub fn get(&self, operation: SessionOperation) -> Option<&Override> {
        match operation {
            SessionOperation::Bind => self.bind.as_ref(),
            SessionOperation::Unbind => self.unbind.as_ref(),
            SessionOperation::Abandon => self.abandon.as_ref(),
        }
    }

    /// Installs `configured`, returning the override it replaces.
    pub fn set(&mut self, operation: SessionOperation, configured: Override) -> Option<Override> {
        self.slot(operation).replace(configured)
    }

    pub fn clear(&mut self, operation: SessionOperation) -> Option<Override> {
        self.slot(operation).take()
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}
