use crate::{
    backends::vc4::tiling::layout_for_modifier,
    cli::LayoutArgs,
    utils::errorfmt::ErrorFmt,
    video::modifier_name,
};

pub fn main(args: LayoutArgs) {
    let buffer = &args.buffer;
    let res = layout_for_modifier(buffer.format, buffer.width, buffer.height, args.modifier);
    let (tiling, layout) = match res {
        Ok(l) => l,
        Err(e) => fatal!("Could not compute the layout: {}", ErrorFmt(e)),
    };
    println!(
        "{} {}x{} {}",
        buffer.format.name,
        buffer.width,
        buffer.height,
        modifier_name(args.modifier).unwrap_or("unknown"),
    );
    println!("tiling: {:?}", tiling);
    for (idx, plane) in layout.planes.iter().enumerate() {
        println!(
            "plane {}: stride {} size {} offset {}",
            idx, plane.stride, plane.size, plane.offset
        );
    }
    println!("total size: {}", layout.total_size);
}
