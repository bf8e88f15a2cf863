//! The per-table row codec: compound datatype + extendible dataset.
//!
//! A codec is built at `output_prolog` from the table's flat column list.
//! It owns two raw identifiers for the duration of one output session: the
//! compound datatype describing a row, and the 1-D chunked dataset rows are
//! appended to.  Offsets come from [`RowLayout`], so the compound type's
//! members sit exactly where [`RowLayout::fill`] places the column values.

use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;

use hdf5::globals::{
    H5P_DATASET_CREATE, H5T_C_S1, H5T_NATIVE_DOUBLE, H5T_NATIVE_FLOAT, H5T_NATIVE_INT16,
    H5T_NATIVE_INT32, H5T_NATIVE_INT64, H5T_NATIVE_INT8, H5T_NATIVE_UCHAR, H5T_NATIVE_UINT16,
    H5T_NATIVE_UINT32, H5T_NATIVE_UINT64, H5T_NATIVE_UINT8,
};
use hdf5_sys::h5::hsize_t;
use hdf5_sys::h5d::{
    H5Dclose, H5Dcreate2, H5Dget_space, H5Dget_type, H5Dopen2, H5Dset_extent, H5Dwrite,
};
use hdf5_sys::h5i::hid_t;
use hdf5_sys::h5p::{H5Pclose, H5Pcreate, H5Pset_chunk, H5P_DEFAULT};
use hdf5_sys::h5s::{
    H5Sclose, H5Screate, H5Screate_simple, H5Sget_simple_extent_dims, H5Sselect_hyperslab,
    H5S_class_t, H5S_seloper_t, H5S_UNLIMITED,
};
use hdf5_sys::h5t::{H5Tclose, H5Tcopy, H5Tcreate, H5Tequal, H5Tinsert, H5Tset_size, H5T_class_t};

use tables_core::{Column, ColumnType, RowLayout, ScalarKind};

use crate::check::{h5call, h5id, Closing};
use crate::error::{Hdf5Error, Hdf5Result};

/// Chunk length of created datasets, in rows.
const CHUNK_ROWS: hsize_t = 16;

/// Precomputed row layout plus the open HDF5 handles of one output session.
pub(crate) struct RowCodec {
    layout: RowLayout,
    /// Compound datatype of one row.  Owned.
    ctype: hid_t,
    /// Dataset rows are appended to; `-1` until the dataset is created or
    /// opened.  Owned.
    dset: hid_t,
}

impl RowCodec {
    /// Build the compound datatype for `columns`.
    pub(crate) fn build(columns: &[Column]) -> Hdf5Result<RowCodec> {
        let layout = RowLayout::of(columns);
        let ctype = h5id("H5Tcreate", unsafe {
            H5Tcreate(H5T_class_t::H5T_COMPOUND, layout.size)
        })?;
        let mut codec = RowCodec {
            layout,
            ctype,
            dset: -1,
        };
        for (col, &offset) in columns.iter().zip(&codec.layout.offsets) {
            codec.insert_member(col, offset)?;
        }
        Ok(codec)
    }

    fn insert_member(&self, col: &Column, offset: usize) -> Hdf5Result<()> {
        let name = CString::new(col.name()).map_err(|_| Hdf5Error::BadColumnName(col.name()))?;
        let (member, owned) = member_type(col)?;
        let status = unsafe { H5Tinsert(self.ctype, name.as_ptr(), offset, member) };
        if owned {
            unsafe {
                H5Tclose(member);
            }
        }
        h5call("H5Tinsert", status)?;
        Ok(())
    }

    /// Create a fresh 1-D extendible dataset named `name` at `loc`.
    pub(crate) fn create_dataset(&mut self, loc: hid_t, name: &str) -> Hdf5Result<()> {
        let cname = CString::new(name).map_err(|_| Hdf5Error::BadColumnName(name.to_string()))?;
        let zdim: [hsize_t; 1] = [0];
        let mdim: [hsize_t; 1] = [H5S_UNLIMITED];
        let cdim: [hsize_t; 1] = [CHUNK_ROWS];

        let space = Closing(
            h5id("H5Screate_simple", unsafe {
                H5Screate_simple(1, zdim.as_ptr(), mdim.as_ptr())
            })?,
            H5Sclose,
        );
        let dcpl = Closing(
            h5id("H5Pcreate", unsafe { H5Pcreate(*H5P_DATASET_CREATE) })?,
            H5Pclose,
        );
        h5call("H5Pset_chunk", unsafe {
            H5Pset_chunk(dcpl.0, 1, cdim.as_ptr())
        })?;

        self.dset = h5id("H5Dcreate2", unsafe {
            H5Dcreate2(
                loc,
                cname.as_ptr(),
                self.ctype,
                space.0,
                H5P_DEFAULT,
                dcpl.0,
                H5P_DEFAULT,
            )
        })?;
        Ok(())
    }

    /// Open the existing dataset `name` at `loc` and adopt it, requiring
    /// its element type to equal the freshly computed compound type.  The
    /// existing chunk layout is adopted as-is.
    pub(crate) fn open_existing(&mut self, loc: hid_t, name: &str, table: &str) -> Hdf5Result<()> {
        let cname = CString::new(name).map_err(|_| Hdf5Error::BadColumnName(name.to_string()))?;
        let dset = h5id("H5Dopen2", unsafe {
            H5Dopen2(loc, cname.as_ptr(), H5P_DEFAULT)
        })?;
        let dset = Closing(dset, H5Dclose);

        let dtype = Closing(
            h5id("H5Dget_type", unsafe { H5Dget_type(dset.0) })?,
            H5Tclose,
        );
        let equal = h5call("H5Tequal", unsafe { H5Tequal(dtype.0, self.ctype) })?;
        if equal == 0 {
            return Err(Hdf5Error::TypeMismatch {
                table: table.to_string(),
            });
        }

        self.dset = dset.0;
        std::mem::forget(dset);
        Ok(())
    }

    /// Materialize the current column values and append them as one record:
    /// extend the dataset by one, select the trailing hyperslab, and write
    /// the packed row against a scalar memory space.
    pub(crate) fn append_row(&mut self, columns: &[Column]) -> Hdf5Result<()> {
        let row = self.layout.make_row(columns);

        let mut extent: [hsize_t; 1] = [0];
        {
            let space = Closing(
                h5id("H5Dget_space", unsafe { H5Dget_space(self.dset) })?,
                H5Sclose,
            );
            h5call("H5Sget_simple_extent_dims", unsafe {
                H5Sget_simple_extent_dims(space.0, extent.as_mut_ptr(), ptr::null_mut())
            })?;
        }

        let grown: [hsize_t; 1] = [extent[0] + 1];
        h5call("H5Dset_extent", unsafe {
            H5Dset_extent(self.dset, grown.as_ptr())
        })?;

        let fspace = Closing(
            h5id("H5Dget_space", unsafe { H5Dget_space(self.dset) })?,
            H5Sclose,
        );
        let start: [hsize_t; 1] = [extent[0]];
        let count: [hsize_t; 1] = [1];
        h5call("H5Sselect_hyperslab", unsafe {
            H5Sselect_hyperslab(
                fspace.0,
                H5S_seloper_t::H5S_SELECT_SET,
                start.as_ptr(),
                ptr::null(),
                count.as_ptr(),
                ptr::null(),
            )
        })?;

        let mspace = Closing(
            h5id("H5Screate", unsafe { H5Screate(H5S_class_t::H5S_SCALAR) })?,
            H5Sclose,
        );
        h5call("H5Dwrite", unsafe {
            H5Dwrite(
                self.dset,
                self.ctype,
                mspace.0,
                fspace.0,
                H5P_DEFAULT,
                row.as_ptr() as *const c_void,
            )
        })?;
        Ok(())
    }
}

impl Drop for RowCodec {
    fn drop(&mut self) {
        unsafe {
            if self.dset >= 0 {
                H5Dclose(self.dset);
            }
            if self.ctype >= 0 {
                H5Tclose(self.ctype);
            }
        }
    }
}

/// Map a column type to the HDF5 member type.  Returns the type id and
/// whether the caller owns (and must close) it.
fn member_type(col: &Column) -> Hdf5Result<(hid_t, bool)> {
    match col.column_type() {
        ColumnType::Scalar(kind) => Ok((native_type(kind), false)),
        ColumnType::Text { .. } => {
            let strtype = h5id("H5Tcopy", unsafe { H5Tcopy(*H5T_C_S1) })?;
            let status = unsafe { H5Tset_size(strtype, col.size()) };
            if status < 0 {
                unsafe {
                    H5Tclose(strtype);
                }
                return Err(Hdf5Error::Call {
                    what: "H5Tset_size",
                });
            }
            Ok((strtype, true))
        }
    }
}

fn native_type(kind: ScalarKind) -> hid_t {
    match kind {
        ScalarKind::Bool => *H5T_NATIVE_UCHAR,
        ScalarKind::I8 => *H5T_NATIVE_INT8,
        ScalarKind::I16 => *H5T_NATIVE_INT16,
        ScalarKind::I32 => *H5T_NATIVE_INT32,
        ScalarKind::I64 => *H5T_NATIVE_INT64,
        ScalarKind::U8 => *H5T_NATIVE_UINT8,
        ScalarKind::U16 => *H5T_NATIVE_UINT16,
        ScalarKind::U32 => *H5T_NATIVE_UINT32,
        ScalarKind::U64 => *H5T_NATIVE_UINT64,
        ScalarKind::F32 => *H5T_NATIVE_FLOAT,
        ScalarKind::F64 => *H5T_NATIVE_DOUBLE,
    }
}
