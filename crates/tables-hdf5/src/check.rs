//! Status checking and handle guards for raw HDF5 calls.

use hdf5_sys::h5::herr_t;
use hdf5_sys::h5i::hid_t;

use crate::error::{Hdf5Error, Hdf5Result};

/// Check the status of a raw call, naming it on failure.
pub(crate) fn h5call(what: &'static str, status: herr_t) -> Hdf5Result<herr_t> {
    if status < 0 {
        Err(Hdf5Error::Call { what })
    } else {
        Ok(status)
    }
}

/// Check an identifier-returning raw call, naming it on failure.
pub(crate) fn h5id(what: &'static str, id: hid_t) -> Hdf5Result<hid_t> {
    if id < 0 {
        Err(Hdf5Error::Call { what })
    } else {
        Ok(id)
    }
}

/// Closes an HDF5 identifier when dropped.  Used for the short-lived
/// dataspace and property-list handles inside codec operations.
pub(crate) struct Closing(pub hid_t, pub unsafe extern "C" fn(hid_t) -> herr_t);

impl Drop for Closing {
    fn drop(&mut self) {
        if self.0 >= 0 {
            // Best effort; a failed close of a transient handle is not
            // actionable by the caller.
            unsafe {
                (self.1)(self.0);
            }
        }
    }
}
