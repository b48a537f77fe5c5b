use crate::{
    cli::{DeviceArgs, GlobalArgs, open_driver},
    format::debug,
    video::modifier_name,
};

pub fn main(global: &GlobalArgs, args: DeviceArgs) {
    let (_drm, driver) = open_driver(global, &args);
    println!("backend: {}", driver.backend_name());
    for combo in driver.combinations().iter() {
        println!(
            "{:?} ({}): {} {:?}",
            debug(combo.format.drm),
            combo.format.name,
            modifier_name(combo.metadata.modifier).unwrap_or("unknown"),
            combo.usage,
        );
    }
}
