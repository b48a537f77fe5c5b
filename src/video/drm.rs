mod sys;

pub(crate) use sys::{DRM_COMMAND_BASE, drm_iowr, ioctl};

use {
    crate::{
        utils::{
            mmap::{Mmapped, mmap},
            oserror::OsError,
        },
        video::gem::{GemDevice, GemHandle},
    },
    bstr::BString,
    std::rc::Rc,
    thiserror::Error,
    uapi::{OwnedFd, c},
};

#[derive(Debug, Error)]
pub enum DrmError {
    #[error("Could not open {0}")]
    Open(String, #[source] OsError),
    #[error("Could not stat the drm fd")]
    Stat(#[source] OsError),
    #[error("File descriptor does not refer to a character device")]
    NotACharDevice,
    #[error("Could not determine the drm version")]
    Version(#[source] OsError),
}

#[derive(Debug, Clone)]
pub struct DrmVersion {
    pub version_major: i32,
    pub version_minor: i32,
    pub version_patchlevel: i32,
    pub name: BString,
    pub desc: BString,
}

/// A DRM device node.
///
/// The file descriptor is shared with every backend created for the device. Backends
/// only issue requests on it.
pub struct Drm {
    fd: Rc<OwnedFd>,
    dev: c::dev_t,
}

impl Drm {
    pub fn open(path: &str) -> Result<Self, DrmError> {
        let fd = match uapi::open(path, c::O_RDWR | c::O_CLOEXEC, 0) {
            Ok(fd) => fd,
            Err(e) => return Err(DrmError::Open(path.to_string(), e.into())),
        };
        Self::open_existing(Rc::new(fd))
    }

    pub fn open_existing(fd: Rc<OwnedFd>) -> Result<Self, DrmError> {
        let stat = uapi::fstat(fd.raw()).map_err(|e| DrmError::Stat(e.into()))?;
        if stat.st_mode & c::S_IFMT != c::S_IFCHR {
            return Err(DrmError::NotACharDevice);
        }
        Ok(Self {
            fd,
            dev: stat.st_rdev,
        })
    }

    pub fn dev(&self) -> c::dev_t {
        self.dev
    }

    pub fn fd(&self) -> &Rc<OwnedFd> {
        &self.fd
    }

    pub fn raw(&self) -> c::c_int {
        self.fd.raw()
    }

    pub fn version(&self) -> Result<DrmVersion, DrmError> {
        sys::get_version(self.raw()).map_err(DrmError::Version)
    }
}

impl GemDevice for Drm {
    fn gem_close(&self, handle: GemHandle) -> Result<(), OsError> {
        sys::gem_close(self.raw(), handle.0)
    }

    fn prime_fd_to_handle(&self, fd: c::c_int) -> Result<GemHandle, OsError> {
        sys::prime_fd_to_handle(self.raw(), fd).map(GemHandle)
    }

    fn mmap(&self, len: usize, prot: c::c_int, offset: u64) -> Result<Mmapped, OsError> {
        let offset = c::off_t::try_from(offset).map_err(|_| OsError(c::EOVERFLOW))?;
        mmap(len, prot, c::MAP_SHARED, self.raw(), offset)
    }
}
