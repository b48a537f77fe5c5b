#[cfg(test)]
mod tests;

use {
    crate::allocator::{MAX_PLANES, PlaneVec},
    ahash::AHashMap,
    std::{
        fmt::{Debug, Write},
        sync::LazyLock,
    },
};

#[derive(Copy, Clone, Debug)]
pub struct PlaneInfo {
    pub bpp: u32,
    pub h_sub: u32,
    pub v_sub: u32,
}

#[derive(Copy, Clone, Debug)]
pub struct Format {
    pub name: &'static str,
    pub drm: u32,
    pub has_alpha: bool,
    pub planes: &'static [PlaneInfo],
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        self.drm == other.drm
    }
}

impl Eq for Format {}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PlaneLayout {
    pub stride: u32,
    pub size: u64,
    pub offset: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BufferLayout {
    pub planes: PlaneVec<PlaneLayout>,
    pub total_size: u64,
}

impl Format {
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    pub fn bytes_per_pixel(&self, plane: usize) -> u32 {
        self.planes.get(plane).map(|p| p.bpp).unwrap_or(0)
    }

    /// The minimal stride of `plane` for an image that is `width` pixels wide.
    pub fn stride_for_width(&self, width: u32, plane: usize) -> Option<u32> {
        let info = self.planes.get(plane)?;
        let bytes = (width as u64 * info.bpp as u64).div_ceil(info.h_sub as u64);
        u32::try_from(bytes).ok()
    }

    fn plane_stride(&self, stride: u32, plane: usize) -> u32 {
        let luma = &self.planes[0];
        let info = &self.planes[plane];
        let stride = stride as u64 * info.bpp as u64;
        stride.div_ceil(luma.bpp as u64 * info.h_sub as u64) as u32
    }

    /// Lays out all planes back to back. `stride` is the stride of plane 0.
    pub fn linear_layout(&self, stride: u32, height: u32) -> Option<BufferLayout> {
        let mut layout = BufferLayout::default();
        let mut offset = 0u64;
        for (idx, info) in self.planes.iter().enumerate() {
            let stride = self.plane_stride(stride, idx);
            let rows = height.div_ceil(info.v_sub) as u64;
            let size = rows.checked_mul(stride as u64)?;
            layout.planes.push(PlaneLayout {
                stride,
                size,
                offset,
            });
            offset = offset.checked_add(size)?;
        }
        layout.total_size = offset;
        Some(layout)
    }
}

static FORMATS_MAP: LazyLock<AHashMap<u32, &'static Format>> = LazyLock::new(|| {
    let mut map = AHashMap::new();
    for format in FORMATS {
        assert!(map.insert(format.drm, *format).is_none());
    }
    map
});

static FORMATS_NAMES: LazyLock<AHashMap<&'static str, &'static Format>> = LazyLock::new(|| {
    let mut map = AHashMap::new();
    for format in FORMATS {
        assert!(format.num_planes() <= MAX_PLANES);
        assert!(map.insert(format.name, *format).is_none());
    }
    map
});

pub fn formats() -> &'static AHashMap<u32, &'static Format> {
    &FORMATS_MAP
}

pub fn named_formats() -> &'static AHashMap<&'static str, &'static Format> {
    &FORMATS_NAMES
}

pub fn ref_formats() -> &'static [&'static Format] {
    FORMATS
}

const fn fourcc_code(a: char, b: char, c: char, d: char) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

pub fn debug(fourcc: u32) -> impl Debug {
    struct Fourcc(u32);
    impl Debug for Fourcc {
        fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            for shift in [0, 8, 16, 24] {
                fmt.write_char((self.0 >> shift) as u8 as char)?;
            }
            Ok(())
        }
    }
    Fourcc(fourcc)
}

const fn packed(bpp: u32) -> &'static [PlaneInfo] {
    match bpp {
        1 => &[PlaneInfo {
            bpp: 1,
            h_sub: 1,
            v_sub: 1,
        }],
        2 => &[PlaneInfo {
            bpp: 2,
            h_sub: 1,
            v_sub: 1,
        }],
        3 => &[PlaneInfo {
            bpp: 3,
            h_sub: 1,
            v_sub: 1,
        }],
        4 => &[PlaneInfo {
            bpp: 4,
            h_sub: 1,
            v_sub: 1,
        }],
        _ => &[PlaneInfo {
            bpp: 8,
            h_sub: 1,
            v_sub: 1,
        }],
    }
}

pub static ARGB8888: &Format = &Format {
    name: "argb8888",
    drm: fourcc_code('A', 'R', '2', '4'),
    has_alpha: true,
    planes: packed(4),
};

pub static XRGB8888: &Format = &Format {
    name: "xrgb8888",
    drm: fourcc_code('X', 'R', '2', '4'),
    has_alpha: false,
    planes: packed(4),
};

pub static ABGR8888: &Format = &Format {
    name: "abgr8888",
    drm: fourcc_code('A', 'B', '2', '4'),
    has_alpha: true,
    planes: packed(4),
};

pub static XBGR8888: &Format = &Format {
    name: "xbgr8888",
    drm: fourcc_code('X', 'B', '2', '4'),
    has_alpha: false,
    planes: packed(4),
};

pub static RGB565: &Format = &Format {
    name: "rgb565",
    drm: fourcc_code('R', 'G', '1', '6'),
    has_alpha: false,
    planes: packed(2),
};

pub static BGR565: &Format = &Format {
    name: "bgr565",
    drm: fourcc_code('B', 'G', '1', '6'),
    has_alpha: false,
    planes: packed(2),
};

pub static R8: &Format = &Format {
    name: "r8",
    drm: fourcc_code('R', '8', ' ', ' '),
    has_alpha: false,
    planes: packed(1),
};

pub static GR88: &Format = &Format {
    name: "gr88",
    drm: fourcc_code('G', 'R', '8', '8'),
    has_alpha: false,
    planes: packed(2),
};

pub static RGB888: &Format = &Format {
    name: "rgb888",
    drm: fourcc_code('R', 'G', '2', '4'),
    has_alpha: false,
    planes: packed(3),
};

pub static BGR888: &Format = &Format {
    name: "bgr888",
    drm: fourcc_code('B', 'G', '2', '4'),
    has_alpha: false,
    planes: packed(3),
};

pub static ABGR16161616F: &Format = &Format {
    name: "abgr16161616f",
    drm: fourcc_code('A', 'B', '4', 'H'),
    has_alpha: true,
    planes: packed(8),
};

pub static XBGR16161616F: &Format = &Format {
    name: "xbgr16161616f",
    drm: fourcc_code('X', 'B', '4', 'H'),
    has_alpha: false,
    planes: packed(8),
};

pub static NV12: &Format = &Format {
    name: "nv12",
    drm: fourcc_code('N', 'V', '1', '2'),
    has_alpha: false,
    planes: &[
        PlaneInfo {
            bpp: 1,
            h_sub: 1,
            v_sub: 1,
        },
        PlaneInfo {
            bpp: 2,
            h_sub: 2,
            v_sub: 2,
        },
    ],
};

pub static YVU420: &Format = &Format {
    name: "yvu420",
    drm: fourcc_code('Y', 'V', '1', '2'),
    has_alpha: false,
    planes: &[
        PlaneInfo {
            bpp: 1,
            h_sub: 1,
            v_sub: 1,
        },
        PlaneInfo {
            bpp: 1,
            h_sub: 2,
            v_sub: 2,
        },
        PlaneInfo {
            bpp: 1,
            h_sub: 2,
            v_sub: 2,
        },
    ],
};

static FORMATS: &[&Format] = &[
    ARGB8888,
    XRGB8888,
    ABGR8888,
    XBGR8888,
    RGB565,
    BGR565,
    R8,
    GR88,
    RGB888,
    BGR888,
    ABGR16161616F,
    XBGR16161616F,
    NV12,
    YVU420,
];
