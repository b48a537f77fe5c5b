#[cfg(test)]
pub(crate) mod fake;
mod sys;
pub mod tiling;

use {
    crate::{
        allocator::{
            AllocatorError, BO_USE_HW_VIDEO_DECODER, BO_USE_HW_VIDEO_ENCODER, BO_USE_RENDER_MASK,
            BO_USE_SCANOUT, BO_USE_TEXTURE_MASK, Backend, BackendError, BoMetadata, BufferObject,
            BufferUsage, ErrorKind, ImportData, MapFlags, Mapping, PlaneVec,
        },
        combination::{Combinations, LINEAR_METADATA},
        format::{ARGB8888, Format, NV12, RGB565, XRGB8888, YVU420},
        utils::{errorfmt::ErrorFmt, oserror::OsError},
        video::{
            BROADCOM_VC4_T_TILED_MODIFIER, LINEAR_MODIFIER, Modifier,
            gem::{GemDevice, GemError, GemHandle, bo_munmap, gem_bo_destroy, prime_bo_import},
            pick_modifier,
        },
    },
    std::rc::Rc,
    thiserror::Error,
    uapi::c,
};

static RENDER_TARGET_FORMATS: &[&Format] = &[ARGB8888, RGB565, XRGB8888];

static TEXTURE_ONLY_FORMATS: &[&Format] = &[NV12, YVU420];

/// Richest layout first.
pub const MODIFIER_ORDER: [Modifier; 2] = [BROADCOM_VC4_T_TILED_MODIFIER, LINEAR_MODIFIER];

#[derive(Debug, Error)]
pub enum Vc4Error {
    #[error("Modifier 0x{0:x} is not supported")]
    UnknownModifier(Modifier),
    #[error("Buffers with {0} bytes per pixel cannot be tiled")]
    UnsupportedBpp(u32),
    #[error("Format {0} has more than one plane and cannot be tiled")]
    PlanarTiled(&'static str),
    #[error("Buffers must have a non-zero size")]
    EmptySize,
    #[error("Size calculation overflowed")]
    Overflow,
    #[error("None of the requested modifiers are supported")]
    NoModifier,
    #[error("Format {0} cannot be allocated with usage {1:?}")]
    NoCombination(&'static str, BufferUsage),
    #[error("Buffer has no plane {0}")]
    InvalidPlane(usize),
    #[error("Could not create a buffer of size {0}")]
    CreateBo(u32, #[source] OsError),
    #[error("Could not set the tiling of the buffer")]
    SetTiling(#[source] OsError),
    #[error("Could not retrieve the mmap offset of the buffer")]
    MmapOffset(#[source] OsError),
    #[error("Could not map the buffer")]
    Map(#[source] OsError),
    #[error(transparent)]
    Gem(#[from] GemError),
}

impl BackendError for Vc4Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Vc4Error::UnknownModifier(_)
            | Vc4Error::UnsupportedBpp(_)
            | Vc4Error::PlanarTiled(_)
            | Vc4Error::EmptySize
            | Vc4Error::Overflow
            | Vc4Error::NoModifier
            | Vc4Error::NoCombination(..)
            | Vc4Error::InvalidPlane(_) => ErrorKind::InvalidArgument,
            Vc4Error::CreateBo(..) => ErrorKind::KernelAllocationFailure,
            Vc4Error::SetTiling(_) => ErrorKind::KernelConfigFailure,
            Vc4Error::MmapOffset(_) | Vc4Error::Map(_) => ErrorKind::MapFailure,
            Vc4Error::Gem(e) => e.kind(),
        }
    }

    fn os_error(&self) -> Option<c::c_int> {
        match self {
            Vc4Error::CreateBo(_, e)
            | Vc4Error::SetTiling(e)
            | Vc4Error::MmapOffset(e)
            | Vc4Error::Map(e) => Some(e.0),
            Vc4Error::Gem(e) => e.os_error(),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct CreateBo {
    pub size: u32,
}

#[derive(Copy, Clone, Debug)]
pub struct CreatedBo {
    pub handle: GemHandle,
}

#[derive(Copy, Clone, Debug)]
pub struct SetTiling {
    pub handle: GemHandle,
    pub modifier: Modifier,
}

#[derive(Copy, Clone, Debug)]
pub struct MmapBo {
    pub handle: GemHandle,
}

#[derive(Copy, Clone, Debug)]
pub struct MmapOffset {
    pub offset: u64,
}

/// The VC4-specific requests of the kernel driver.
pub trait Vc4Device: GemDevice {
    fn create_bo(&self, req: CreateBo) -> Result<CreatedBo, OsError>;

    fn set_tiling(&self, req: SetTiling) -> Result<(), OsError>;

    fn mmap_bo(&self, req: MmapBo) -> Result<MmapOffset, OsError>;
}

pub struct Vc4Backend<D> {
    dev: Rc<D>,
}

pub fn pick_vc4_modifier(modifiers: &[Modifier]) -> Result<Modifier, Vc4Error> {
    pick_modifier(modifiers, &MODIFIER_ORDER).ok_or(Vc4Error::NoModifier)
}

impl<D: Vc4Device> Vc4Backend<D> {
    pub fn new(dev: Rc<D>) -> Self {
        Self { dev }
    }

    pub fn create_bo_for_modifier(
        &self,
        width: u32,
        height: u32,
        format: &'static Format,
        modifier: Modifier,
    ) -> Result<BufferObject, Vc4Error> {
        if width == 0 || height == 0 {
            return Err(Vc4Error::EmptySize);
        }
        let (tiling, layout) = tiling::layout_for_modifier(format, width, height, modifier)?;
        let size = u32::try_from(layout.total_size).map_err(|_| Vc4Error::Overflow)?;
        let meta = BoMetadata::new(width, height, format, tiling, modifier, layout);
        let created = match self.dev.create_bo(CreateBo { size }) {
            Ok(c) => c,
            Err(e) => {
                log::error!("DRM_IOCTL_VC4_CREATE_BO failed (size={}): {}", size, ErrorFmt(e));
                return Err(Vc4Error::CreateBo(size, e));
            }
        };
        let handles: PlaneVec<_> = (0..meta.num_planes()).map(|_| created.handle).collect();
        let bo = BufferObject { meta, handles };
        if modifier != LINEAR_MODIFIER {
            let req = SetTiling {
                handle: created.handle,
                modifier,
            };
            if let Err(e) = self.dev.set_tiling(req) {
                log::error!("DRM_IOCTL_VC4_SET_TILING failed: {}", ErrorFmt(e));
                if let Err(e) = gem_bo_destroy(&*self.dev, bo) {
                    log::error!(
                        "Could not destroy buffer after failed tiling configuration: {}",
                        ErrorFmt(e)
                    );
                }
                return Err(Vc4Error::SetTiling(e));
            }
        }
        Ok(bo)
    }

    fn map<'a>(
        &self,
        bo: &'a BufferObject,
        plane: usize,
        flags: MapFlags,
    ) -> Result<Mapping<'a>, Vc4Error> {
        if plane >= bo.handles.len() {
            return Err(Vc4Error::InvalidPlane(plane));
        }
        let req = MmapBo {
            handle: bo.handles[0],
        };
        let offset = match self.dev.mmap_bo(req) {
            Ok(o) => o.offset,
            Err(e) => {
                log::error!("DRM_VC4_MMAP_BO failed: {}", ErrorFmt(e));
                return Err(Vc4Error::MmapOffset(e));
            }
        };
        let len = usize::try_from(bo.meta.total_size).map_err(|_| Vc4Error::Overflow)?;
        let map = self
            .dev
            .mmap(len, flags.prot(), offset)
            .map_err(Vc4Error::Map)?;
        Ok(Mapping::new(bo, map, offset, flags))
    }
}

impl<D: Vc4Device> Backend for Vc4Backend<D> {
    fn name(&self) -> &'static str {
        "vc4"
    }

    fn init(&self, combinations: &mut Combinations) -> Result<(), AllocatorError> {
        combinations.add_combinations(RENDER_TARGET_FORMATS, &LINEAR_METADATA, BO_USE_RENDER_MASK);
        combinations.add_combinations(TEXTURE_ONLY_FORMATS, &LINEAR_METADATA, BO_USE_TEXTURE_MASK);
        // Video encoders read YV12 buffers that were written through a dmabuf mapping.
        combinations.modify_combination(YVU420, &LINEAR_METADATA, BO_USE_HW_VIDEO_ENCODER);
        combinations.modify_combination(
            NV12,
            &LINEAR_METADATA,
            BO_USE_HW_VIDEO_DECODER | BO_USE_SCANOUT | BO_USE_HW_VIDEO_ENCODER,
        );
        combinations.modify_linear_combinations();
        Ok(())
    }

    fn create_bo(
        &self,
        combinations: &Combinations,
        width: u32,
        height: u32,
        format: &'static Format,
        usage: BufferUsage,
    ) -> Result<BufferObject, AllocatorError> {
        let combo = match combinations.get(format, usage) {
            Some(c) => c,
            None => return Err(Vc4Error::NoCombination(format.name, usage).into()),
        };
        let mut bo =
            self.create_bo_for_modifier(width, height, format, combo.metadata.modifier)?;
        bo.meta.use_flags = usage;
        Ok(bo)
    }

    fn create_bo_with_modifiers(
        &self,
        width: u32,
        height: u32,
        format: &'static Format,
        modifiers: &[Modifier],
    ) -> Result<BufferObject, AllocatorError> {
        let modifier = pick_vc4_modifier(modifiers)?;
        Ok(self.create_bo_for_modifier(width, height, format, modifier)?)
    }

    fn import_bo(&self, data: &ImportData) -> Result<BufferObject, AllocatorError> {
        let mut bo = prime_bo_import(&*self.dev, data).map_err(Vc4Error::from)?;
        if bo.meta.modifier == BROADCOM_VC4_T_TILED_MODIFIER {
            let bpp = data.format.bytes_per_pixel(0);
            bo.meta.tiling = tiling::tiling_for_size(data.width, data.height, bpp);
        }
        Ok(bo)
    }

    fn destroy_bo(&self, bo: BufferObject) -> Result<(), AllocatorError> {
        gem_bo_destroy(&*self.dev, bo).map_err(Vc4Error::from)?;
        Ok(())
    }

    fn map_bo<'a>(
        &self,
        bo: &'a BufferObject,
        plane: usize,
        flags: MapFlags,
    ) -> Result<Mapping<'a>, AllocatorError> {
        Ok(self.map(bo, plane, flags)?)
    }

    fn unmap_bo(&self, mapping: Mapping<'_>) -> Result<(), AllocatorError> {
        bo_munmap(mapping).map_err(Vc4Error::from)?;
        Ok(())
    }
}
