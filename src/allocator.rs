
use {
    crate::{
        combination::Combinations,
        format::{BufferLayout, Format, PlaneLayout},
        utils::mmap::Mmapped,
        video::{Modifier, gem::GemHandle},
    },
    arrayvec::ArrayVec,
    std::{
        error::Error,
        fmt::{Debug, Display, Formatter},
        rc::Rc,
        slice,
    },
    uapi::{OwnedFd, c},
};

pub const MAX_PLANES: usize = 4;

pub type PlaneVec<T> = ArrayVec<T, MAX_PLANES>;

bitflags! {
    pub struct BufferUsage(pub u64) {
        pub const BO_USE_SCANOUT = 1 << 0,
        pub const BO_USE_CURSOR = 1 << 1,
        pub const BO_USE_RENDERING = 1 << 2,
        pub const BO_USE_LINEAR = 1 << 4,
        pub const BO_USE_TEXTURE = 1 << 5,
        pub const BO_USE_CAMERA_WRITE = 1 << 6,
        pub const BO_USE_CAMERA_READ = 1 << 7,
        pub const BO_USE_PROTECTED = 1 << 8,
        pub const BO_USE_SW_READ_OFTEN = 1 << 9,
        pub const BO_USE_SW_READ_RARELY = 1 << 10,
        pub const BO_USE_SW_WRITE_OFTEN = 1 << 11,
        pub const BO_USE_SW_WRITE_RARELY = 1 << 12,
        pub const BO_USE_HW_VIDEO_DECODER = 1 << 13,
        pub const BO_USE_HW_VIDEO_ENCODER = 1 << 14,
        pub const BO_USE_RENDERSCRIPT = 1 << 16,
    }
}

pub const BO_USE_SW_MASK: BufferUsage = BufferUsage(
    BO_USE_SW_READ_OFTEN.0
        | BO_USE_SW_READ_RARELY.0
        | BO_USE_SW_WRITE_OFTEN.0
        | BO_USE_SW_WRITE_RARELY.0,
);

pub const BO_USE_TEXTURE_MASK: BufferUsage =
    BufferUsage(BO_USE_LINEAR.0 | BO_USE_RENDERSCRIPT.0 | BO_USE_SW_MASK.0 | BO_USE_TEXTURE.0);

pub const BO_USE_RENDER_MASK: BufferUsage = BufferUsage(BO_USE_TEXTURE_MASK.0 | BO_USE_RENDERING.0);

bitflags! {
    pub struct MapFlags(pub u32) {
        pub const BO_MAP_READ = 1 << 0,
        pub const BO_MAP_WRITE = 1 << 1,
    }
}

pub const BO_MAP_READ_WRITE: MapFlags = MapFlags(BO_MAP_READ.0 | BO_MAP_WRITE.0);

impl MapFlags {
    pub fn prot(self) -> c::c_int {
        let mut prot = c::PROT_NONE;
        if self.contains(BO_MAP_READ) {
            prot |= c::PROT_READ;
        }
        if self.contains(BO_MAP_WRITE) {
            prot |= c::PROT_WRITE;
        }
        prot
    }
}

/// The memory layout a backend chose for a buffer.
///
/// Backends translate these into their own kernel representation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Tiling {
    Linear,
    SmallTiled,
    MacroTiled,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    KernelAllocationFailure,
    KernelConfigFailure,
    MapFailure,
    ImportFailure,
    DestroyFailure,
}

pub trait BackendError: Error + Send + 'static {
    fn kind(&self) -> ErrorKind;

    fn os_error(&self) -> Option<c::c_int> {
        None
    }
}

pub struct AllocatorError(Box<dyn BackendError>);

impl AllocatorError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    pub fn os_error(&self) -> Option<c::c_int> {
        self.0.os_error()
    }
}

impl<E: BackendError> From<E> for AllocatorError {
    fn from(value: E) -> Self {
        Self(Box::new(value))
    }
}

impl Debug for AllocatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AllocatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for AllocatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

#[derive(Clone, Debug)]
pub struct BoMetadata {
    pub width: u32,
    pub height: u32,
    pub format: &'static Format,
    pub tiling: Tiling,
    pub modifier: Modifier,
    pub planes: PlaneVec<PlaneLayout>,
    pub total_size: u64,
    pub use_flags: BufferUsage,
}

impl BoMetadata {
    pub fn new(
        width: u32,
        height: u32,
        format: &'static Format,
        tiling: Tiling,
        modifier: Modifier,
        layout: BufferLayout,
    ) -> Self {
        Self {
            width,
            height,
            format,
            tiling,
            modifier,
            planes: layout.planes,
            total_size: layout.total_size,
            use_flags: BufferUsage::none(),
        }
    }

    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }
}

/// A buffer allocated in the kernel.
///
/// The object does not close its handles when dropped. It must be passed to
/// [`Backend::destroy_bo`].
#[derive(Debug)]
pub struct BufferObject {
    pub meta: BoMetadata,
    pub handles: PlaneVec<GemHandle>,
}

impl BufferObject {
    pub fn modifier(&self) -> Modifier {
        self.meta.modifier
    }

    pub fn stride(&self, plane: usize) -> Option<u32> {
        self.meta.planes.get(plane).map(|p| p.stride)
    }
}

#[derive(Clone)]
pub struct ImportPlane {
    pub fd: Rc<OwnedFd>,
    pub stride: u32,
    pub offset: u64,
}

impl Debug for ImportPlane {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportPlane")
            .field("fd", &self.fd.raw())
            .field("stride", &self.stride)
            .field("offset", &self.offset)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct ImportData {
    pub width: u32,
    pub height: u32,
    pub format: &'static Format,
    pub modifier: Modifier,
    pub planes: PlaneVec<ImportPlane>,
    pub use_flags: BufferUsage,
}

/// A CPU mapping of a [`BufferObject`].
///
/// The mapping borrows the buffer so that the buffer cannot be destroyed while it is
/// mapped. Dropping the mapping unmaps it. An established mapping can be read from
/// several threads at once.
pub struct Mapping<'a> {
    bo: &'a BufferObject,
    map: Mmapped,
    offset: u64,
    flags: MapFlags,
}

impl<'a> Mapping<'a> {
    pub fn new(bo: &'a BufferObject, map: Mmapped, offset: u64, flags: MapFlags) -> Self {
        Self {
            bo,
            map,
            offset,
            flags,
        }
    }

    pub fn bo(&self) -> &'a BufferObject {
        self.bo
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The offset of the mapping in the device address space.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn flags(&self) -> MapFlags {
        self.flags
    }

    pub fn data_ptr(&self) -> *mut u8 {
        self.map.as_ptr()
    }

    /// # Safety
    ///
    /// The GPU might write to the buffer concurrently.
    pub unsafe fn data(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.map.as_ptr(), self.map.len()) }
    }

    /// # Safety
    ///
    /// The mapping must have been created with [`BO_MAP_WRITE`] and the GPU might
    /// access the buffer concurrently.
    pub unsafe fn data_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.map.as_ptr(), self.map.len()) }
    }

    pub(crate) fn into_mmapped(self) -> Mmapped {
        self.map
    }
}

impl Debug for Mapping<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapping")
            .field("offset", &self.offset)
            .field("len", &self.len())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// The operations every device-family backend provides to the [`Driver`](crate::driver::Driver).
pub trait Backend {
    fn name(&self) -> &'static str;

    fn init(&self, combinations: &mut Combinations) -> Result<(), AllocatorError>;

    fn create_bo(
        &self,
        combinations: &Combinations,
        width: u32,
        height: u32,
        format: &'static Format,
        usage: BufferUsage,
    ) -> Result<BufferObject, AllocatorError>;

    fn create_bo_with_modifiers(
        &self,
        width: u32,
        height: u32,
        format: &'static Format,
        modifiers: &[Modifier],
    ) -> Result<BufferObject, AllocatorError>;

    fn import_bo(&self, data: &ImportData) -> Result<BufferObject, AllocatorError>;

    fn destroy_bo(&self, bo: BufferObject) -> Result<(), AllocatorError>;

    fn map_bo<'a>(
        &self,
        bo: &'a BufferObject,
        plane: usize,
        flags: MapFlags,
    ) -> Result<Mapping<'a>, AllocatorError>;

    fn unmap_bo(&self, mapping: Mapping<'_>) -> Result<(), AllocatorError>;
}
