use crate::{
    allocator::BO_MAP_READ_WRITE,
    cli::{AllocArgs, GlobalArgs, open_driver, usage_mask},
    utils::errorfmt::ErrorFmt,
    video::modifier_name,
};

pub fn main(global: &GlobalArgs, args: AllocArgs) {
    let (_drm, driver) = open_driver(global, &args.device);
    let buffer = &args.buffer;
    let usage = usage_mask(&args.usage);
    let res = if args.modifiers.is_empty() {
        driver.create_bo(buffer.width, buffer.height, buffer.format, usage)
    } else {
        driver.create_bo_with_modifiers(
            buffer.width,
            buffer.height,
            buffer.format,
            &args.modifiers,
            usage,
        )
    };
    let bo = match res {
        Ok(bo) => bo,
        Err(e) => fatal!("Could not allocate the buffer: {}", ErrorFmt(e)),
    };
    let meta = &bo.meta;
    println!(
        "{} {}x{} {} {:?}",
        meta.format.name,
        meta.width,
        meta.height,
        modifier_name(meta.modifier).unwrap_or("unknown"),
        meta.tiling,
    );
    for (idx, plane) in meta.planes.iter().enumerate() {
        println!(
            "plane {}: handle {} stride {} size {} offset {}",
            idx, bo.handles[idx], plane.stride, plane.size, plane.offset
        );
    }
    println!("total size: {}", meta.total_size);
    if args.map {
        match driver.map_bo(&bo, 0, BO_MAP_READ_WRITE) {
            Ok(mut mapping) => {
                unsafe {
                    mapping.data_mut().fill(0);
                }
                println!("mapped {} bytes at offset 0x{:x}", mapping.len(), mapping.offset());
                if let Err(e) = driver.unmap_bo(mapping) {
                    log::error!("Could not unmap the buffer: {}", ErrorFmt(e));
                }
            }
            Err(e) => log::error!("Could not map the buffer: {}", ErrorFmt(e)),
        }
    }
    if let Err(e) = driver.destroy_bo(bo) {
        fatal!("Could not destroy the buffer: {}", ErrorFmt(e));
    }
}
