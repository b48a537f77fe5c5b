use {
    crate::utils::oserror::OsError,
    std::{mem, ptr},
    uapi::{c, map_err},
};

pub struct Mmapped {
    ptr: *mut [u8],
}

// SAFETY: The range is owned by this object and only unmapped by `unmap` or `Drop`, both
// of which require exclusive access. Shared references only hand out the pointer.
unsafe impl Send for Mmapped {}
unsafe impl Sync for Mmapped {}

pub fn mmap(
    len: usize,
    prot: c::c_int,
    flags: c::c_int,
    fd: c::c_int,
    offset: c::off_t,
) -> Result<Mmapped, OsError> {
    let res = unsafe { c::mmap(ptr::null_mut(), len, prot, flags, fd, offset) };
    if res == c::MAP_FAILED {
        Err(OsError::default())
    } else {
        Ok(Mmapped {
            ptr: ptr::slice_from_raw_parts_mut(res.cast(), len),
        })
    }
}

impl Mmapped {
    pub fn len(&self) -> usize {
        self.ptr.len()
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.cast()
    }

    /// Unmaps the range and reports the result instead of ignoring it like `Drop` does.
    pub fn unmap(self) -> Result<(), OsError> {
        let res = unsafe { c::munmap(self.as_ptr().cast(), self.len()) };
        mem::forget(self);
        map_err!(res).map(drop).map_err(OsError::from)
    }
}

impl Drop for Mmapped {
    fn drop(&mut self) {
        unsafe {
            c::munmap(self.as_ptr().cast(), self.len());
        }
    }
}
