//! Capability interfaces the reconciler consumes.
//!
//! Implementations own every service-specific detail (auth, addressing,
//! wire format). See `roster-remote` for the HTTP-backed ones and
//! [`crate::memory`] for in-memory ones.

use roster_core::{LoginId, ResourceName, Status, TeamName};

use crate::error::{HostingError, SheetReadError, TransientWriteError};

/// Roster storage.
pub trait SheetGateway {
    /// Every row of the roster, header first, cells in column order.
    fn read_all_rows(&mut self) -> Result<Vec<Vec<String>>, SheetReadError>;

    /// Overwrite the status cell of data row `row_index` (0-based, header excluded).
    ///
    /// Must be idempotent at the cell level.
    fn write_status(&mut self, row_index: usize, status: Status) -> Result<(), TransientWriteError>;
}

/// Hosting service holding one resource per roster entry.
pub trait HostingGateway {
    fn create_resource(
        &mut self,
        login: &LoginId,
        name: &ResourceName,
        team: &TeamName,
    ) -> Result<(), HostingError>;

    /// Failing because the resource does not exist is expected; callers tolerate it.
    fn delete_resource(&mut self, name: &ResourceName, team: &TeamName)
        -> Result<(), HostingError>;

    fn verify_login(&mut self, login: &LoginId) -> Result<(), HostingError>;
}

impl<T: SheetGateway + ?Sized> SheetGateway for &mut T {
    fn read_all_rows(&mut self) -> Result<Vec<Vec<String>>, SheetReadError> {
        (**self).read_all_rows()
    }

    fn write_status(&mut self, row_index: usize, status: Status) -> Result<(), TransientWriteError> {
        (**self).write_status(row_index, status)
    }
}

impl<T: HostingGateway + ?Sized> HostingGateway for &mut T {
    fn create_resource(
        &mut self,
        login: &LoginId,
        name: &ResourceName,
        team: &TeamName,
    ) -> Result<(), HostingError> {
        (**self).create_resource(login, name, team)
    }

    fn delete_resource(
        &mut self,
        name: &ResourceName,
        team: &TeamName,
    ) -> Result<(), HostingError> {
        (**self).delete_resource(name, team)
    }

    fn verify_login(&mut self, login: &LoginId) -> Result<(), HostingError> {
        (**self).verify_login(login)
    }
}
