use {
    crate::{
        allocator::{
            BackendError, BoMetadata, BufferObject, ErrorKind, ImportData, Mapping, PlaneVec,
            Tiling,
        },
        format::PlaneLayout,
        utils::{errorfmt::ErrorFmt, mmap::Mmapped, oserror::OsError},
        video::LINEAR_MODIFIER,
    },
    std::fmt::{Display, Formatter},
    thiserror::Error,
    uapi::c,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct GemHandle(pub u32);

impl Display for GemHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Requests every GEM-based DRM driver understands.
pub trait GemDevice {
    fn gem_close(&self, handle: GemHandle) -> Result<(), OsError>;

    fn prime_fd_to_handle(&self, fd: c::c_int) -> Result<GemHandle, OsError>;

    /// Maps `len` bytes of the device at the fake offset `offset`.
    fn mmap(&self, len: usize, prot: c::c_int, offset: u64) -> Result<Mmapped, OsError>;
}

#[derive(Debug, Error)]
pub enum GemError {
    #[error("Could not close gem handle {0}")]
    Close(GemHandle, #[source] OsError),
    #[error("Could not convert the prime fd of plane {0} to a gem handle")]
    PrimeImport(usize, #[source] OsError),
    #[error("Could not determine the size of plane {0}")]
    PlaneSize(usize, #[source] OsError),
    #[error("Plane {0} extends past the end of its dmabuf")]
    PlaneBounds(usize),
    #[error("Format {0} has {1} planes but {2} were supplied")]
    PlaneCount(&'static str, usize, usize),
    #[error("Could not unmap the buffer")]
    Unmap(#[source] OsError),
}

impl BackendError for GemError {
    fn kind(&self) -> ErrorKind {
        match self {
            GemError::Close(..) => ErrorKind::DestroyFailure,
            GemError::PrimeImport(..) | GemError::PlaneSize(..) => ErrorKind::ImportFailure,
            GemError::PlaneBounds(..) | GemError::PlaneCount(..) => ErrorKind::InvalidArgument,
            GemError::Unmap(..) => ErrorKind::MapFailure,
        }
    }

    fn os_error(&self) -> Option<c::c_int> {
        match self {
            GemError::Close(_, e)
            | GemError::PrimeImport(_, e)
            | GemError::PlaneSize(_, e)
            | GemError::Unmap(e) => Some(e.0),
            GemError::PlaneBounds(..) | GemError::PlaneCount(..) => None,
        }
    }
}

fn close_handles<D: GemDevice + ?Sized>(dev: &D, handles: &[GemHandle]) -> Result<(), GemError> {
    let mut res = Ok(());
    for (idx, &handle) in handles.iter().enumerate() {
        if handles[..idx].contains(&handle) {
            continue;
        }
        if let Err(e) = dev.gem_close(handle) {
            log::error!("DRM_IOCTL_GEM_CLOSE failed (handle={}): {}", handle, ErrorFmt(e));
            if res.is_ok() {
                res = Err(GemError::Close(handle, e));
            }
        }
    }
    res
}

/// Closes every distinct handle of the buffer.
pub fn gem_bo_destroy<D: GemDevice + ?Sized>(dev: &D, bo: BufferObject) -> Result<(), GemError> {
    close_handles(dev, &bo.handles)
}

/// Imports a buffer from dmabuf file descriptors.
///
/// The size of each plane extends to the start of the next plane or, for the last
/// plane, to the end of its file. The file offsets of the fds are not modified.
pub fn prime_bo_import<D: GemDevice + ?Sized>(
    dev: &D,
    data: &ImportData,
) -> Result<BufferObject, GemError> {
    let format = data.format;
    if data.planes.len() != format.num_planes() {
        return Err(GemError::PlaneCount(
            format.name,
            format.num_planes(),
            data.planes.len(),
        ));
    }
    let mut handles = PlaneVec::new();
    for (idx, plane) in data.planes.iter().enumerate() {
        match dev.prime_fd_to_handle(plane.fd.raw()) {
            Ok(h) => handles.push(h),
            Err(e) => {
                log::error!("DRM_IOCTL_PRIME_FD_TO_HANDLE failed: {}", ErrorFmt(e));
                let _ = close_handles(dev, &handles);
                return Err(GemError::PrimeImport(idx, e));
            }
        }
    }
    let planes = match plane_layouts(data) {
        Ok(p) => p,
        Err(e) => {
            let _ = close_handles(dev, &handles);
            return Err(e);
        }
    };
    let mut meta = BoMetadata {
        width: data.width,
        height: data.height,
        format,
        tiling: Tiling::Linear,
        modifier: data.modifier,
        total_size: planes.iter().map(|p| p.size).sum(),
        planes,
        use_flags: data.use_flags,
    };
    if meta.modifier != LINEAR_MODIFIER {
        meta.tiling = Tiling::MacroTiled;
    }
    Ok(BufferObject { meta, handles })
}

fn plane_layouts(data: &ImportData) -> Result<PlaneVec<PlaneLayout>, GemError> {
    let mut layouts = PlaneVec::new();
    for (idx, plane) in data.planes.iter().enumerate() {
        let stat = uapi::fstat(plane.fd.raw()).map_err(|e| GemError::PlaneSize(idx, e.into()))?;
        let end = stat.st_size as u64;
        let next = data.planes.get(idx + 1).map(|p| p.offset).filter(|&o| o != 0);
        let size = match next {
            Some(next) => next.checked_sub(plane.offset),
            None => end.checked_sub(plane.offset),
        };
        let size = size.ok_or(GemError::PlaneBounds(idx))?;
        match plane.offset.checked_add(size) {
            Some(plane_end) if plane_end <= end => {}
            _ => return Err(GemError::PlaneBounds(idx)),
        }
        layouts.push(PlaneLayout {
            stride: plane.stride,
            size,
            offset: plane.offset,
        });
    }
    Ok(layouts)
}

pub fn bo_munmap(mapping: Mapping<'_>) -> Result<(), GemError> {
    mapping.into_mmapped().unmap().map_err(GemError::Unmap)
}
