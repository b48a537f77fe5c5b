pub mod vc4;

use {
    crate::{allocator::Backend, backends::vc4::Vc4Backend, video::drm::Drm},
    std::rc::Rc,
};

pub struct BackendInfo {
    pub name: &'static str,
    pub create: fn(&Rc<Drm>) -> Box<dyn Backend>,
}

fn create_vc4(drm: &Rc<Drm>) -> Box<dyn Backend> {
    Box::new(Vc4Backend::new(drm.clone()))
}

pub static BACKENDS: &[BackendInfo] = &[BackendInfo {
    name: "vc4",
    create: create_vc4,
}];

pub fn find_backend(name: &[u8]) -> Option<&'static BackendInfo> {
    BACKENDS.iter().find(|b| b.name.as_bytes() == name)
}
