#![allow(non_camel_case_types)]

use crate::{
    backends::vc4::{CreateBo, CreatedBo, MmapBo, MmapOffset, SetTiling, Vc4Device},
    utils::oserror::OsError,
    video::{
        drm::{DRM_COMMAND_BASE, Drm, drm_iowr, ioctl},
        gem::GemHandle,
    },
};

const DRM_VC4_CREATE_BO: u64 = 0x03;
const DRM_VC4_MMAP_BO: u64 = 0x04;
const DRM_VC4_SET_TILING: u64 = 0x08;

#[repr(C)]
struct drm_vc4_create_bo {
    size: u32,
    flags: u32,
    handle: u32,
    pad: u32,
}

#[repr(C)]
struct drm_vc4_mmap_bo {
    handle: u32,
    flags: u32,
    offset: u64,
}

#[repr(C)]
struct drm_vc4_set_tiling {
    handle: u32,
    flags: u32,
    modifier: u64,
}

const DRM_IOCTL_VC4_CREATE_BO: u64 =
    drm_iowr::<drm_vc4_create_bo>(DRM_COMMAND_BASE + DRM_VC4_CREATE_BO);
const DRM_IOCTL_VC4_MMAP_BO: u64 = drm_iowr::<drm_vc4_mmap_bo>(DRM_COMMAND_BASE + DRM_VC4_MMAP_BO);
const DRM_IOCTL_VC4_SET_TILING: u64 =
    drm_iowr::<drm_vc4_set_tiling>(DRM_COMMAND_BASE + DRM_VC4_SET_TILING);

impl Vc4Device for Drm {
    fn create_bo(&self, req: CreateBo) -> Result<CreatedBo, OsError> {
        let mut res = drm_vc4_create_bo {
            size: req.size,
            flags: 0,
            handle: 0,
            pad: 0,
        };
        unsafe {
            ioctl(self.raw(), DRM_IOCTL_VC4_CREATE_BO, &mut res)?;
        }
        Ok(CreatedBo {
            handle: GemHandle(res.handle),
        })
    }

    fn set_tiling(&self, req: SetTiling) -> Result<(), OsError> {
        let mut res = drm_vc4_set_tiling {
            handle: req.handle.0,
            flags: 0,
            modifier: req.modifier,
        };
        unsafe {
            ioctl(self.raw(), DRM_IOCTL_VC4_SET_TILING, &mut res)?;
        }
        Ok(())
    }

    fn mmap_bo(&self, req: MmapBo) -> Result<MmapOffset, OsError> {
        let mut res = drm_vc4_mmap_bo {
            handle: req.handle.0,
            flags: 0,
            offset: 0,
        };
        unsafe {
            ioctl(self.raw(), DRM_IOCTL_VC4_MMAP_BO, &mut res)?;
        }
        Ok(MmapOffset { offset: res.offset })
    }
}
