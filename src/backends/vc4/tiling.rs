use crate::{
    allocator::{PlaneVec, Tiling},
    backends::vc4::Vc4Error,
    format::{BufferLayout, Format, PlaneLayout},
    video::{BROADCOM_VC4_T_TILED_MODIFIER, LINEAR_MODIFIER, Modifier},
};

/// Linear strides are aligned to the ARM L1 cache line size.
pub const LINEAR_STRIDE_ALIGN: u32 = 64;

pub fn utile_width(bpp: u32) -> u32 {
    match bpp {
        1 | 2 => 8,
        4 => 4,
        8 => 2,
        _ => {
            log::warn!("Unknown bytes per pixel: {}", bpp);
            0
        }
    }
}

pub fn utile_height(bpp: u32) -> u32 {
    match bpp {
        1 => 8,
        2 | 4 | 8 => 4,
        _ => {
            log::warn!("Unknown bytes per pixel: {}", bpp);
            0
        }
    }
}

/// Whether a level of this size uses the LT (linear-tile) layout instead of the T layout.
///
/// Either dimension being at most four utiles forces LT.
pub fn size_is_lt(width: u32, height: u32, bpp: u32) -> bool {
    width <= 4 * utile_width(bpp) || height <= 4 * utile_height(bpp)
}

pub fn tiling_for_size(width: u32, height: u32, bpp: u32) -> Tiling {
    if size_is_lt(width, height, bpp) {
        Tiling::SmallTiled
    } else {
        Tiling::MacroTiled
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TiledLayout {
    pub tiling: Tiling,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub size: u64,
}

fn align(v: u32, to: u32) -> Result<u32, Vc4Error> {
    v.checked_next_multiple_of(to).ok_or(Vc4Error::Overflow)
}

pub fn tiled_layout(bpp: u32, width: u32, height: u32) -> Result<TiledLayout, Vc4Error> {
    let utile_width = utile_width(bpp);
    let utile_height = utile_height(bpp);
    if utile_width == 0 || utile_height == 0 {
        return Err(Vc4Error::UnsupportedBpp(bpp));
    }
    let tiling = tiling_for_size(width, height, bpp);
    let (width, height) = match tiling {
        Tiling::MacroTiled => (
            align(width, 4 * 2 * utile_width)?,
            align(height, 4 * 2 * utile_height)?,
        ),
        _ => (align(width, utile_width)?, align(height, utile_height)?),
    };
    let stride = width.checked_mul(bpp).ok_or(Vc4Error::Overflow)?;
    Ok(TiledLayout {
        tiling,
        width,
        height,
        stride,
        size: height as u64 * stride as u64,
    })
}

pub fn linear_stride(format: &Format, width: u32) -> Result<u32, Vc4Error> {
    let stride = format
        .stride_for_width(width, 0)
        .ok_or(Vc4Error::Overflow)?;
    align(stride, LINEAR_STRIDE_ALIGN)
}

pub fn layout_for_modifier(
    format: &Format,
    width: u32,
    height: u32,
    modifier: Modifier,
) -> Result<(Tiling, BufferLayout), Vc4Error> {
    match modifier {
        LINEAR_MODIFIER => {
            let stride = linear_stride(format, width)?;
            let layout = format
                .linear_layout(stride, height)
                .ok_or(Vc4Error::Overflow)?;
            Ok((Tiling::Linear, layout))
        }
        BROADCOM_VC4_T_TILED_MODIFIER => {
            if format.num_planes() != 1 {
                return Err(Vc4Error::PlanarTiled(format.name));
            }
            let tiled = tiled_layout(format.bytes_per_pixel(0), width, height)?;
            let mut planes = PlaneVec::new();
            planes.push(PlaneLayout {
                stride: tiled.stride,
                size: tiled.size,
                offset: 0,
            });
            let layout = BufferLayout {
                planes,
                total_size: tiled.size,
            };
            Ok((tiled.tiling, layout))
        }
        _ => Err(Vc4Error::UnknownModifier(modifier)),
    }
}
