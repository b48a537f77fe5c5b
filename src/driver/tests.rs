use {
    crate::{
        allocator::{BO_MAP_WRITE, BO_USE_RENDERING, BO_USE_SCANOUT, ErrorKind},
        backends::{find_backend, vc4::{Vc4Backend, fake::FakeVc4}},
        driver::Driver,
        format::{ARGB8888, XRGB8888},
        video::{BROADCOM_VC4_T_TILED_MODIFIER, LINEAR_MODIFIER},
    },
    std::rc::Rc,
};

fn driver() -> (Rc<FakeVc4>, Driver) {
    let dev = Rc::new(FakeVc4::default());
    let driver = Driver::with_backend(Box::new(Vc4Backend::new(dev.clone()))).unwrap();
    (dev, driver)
}

#[test]
fn backend_lookup() {
    assert_eq!(find_backend(b"vc4").map(|b| b.name), Some("vc4"));
    assert!(find_backend(b"i915").is_none());
    assert!(find_backend(b"").is_none());
}

#[test]
fn init_runs_once() {
    let (_dev, driver) = driver();
    assert_eq!(driver.backend_name(), "vc4");
    assert_eq!(driver.combinations().len(), 5);
}

#[test]
fn lifecycle() {
    let (dev, driver) = driver();
    let usage = BO_USE_SCANOUT | BO_USE_RENDERING;
    let bo = driver
        .create_bo_with_modifiers(
            256,
            256,
            ARGB8888,
            &[LINEAR_MODIFIER, BROADCOM_VC4_T_TILED_MODIFIER],
            usage,
        )
        .unwrap();
    assert_eq!(bo.modifier(), BROADCOM_VC4_T_TILED_MODIFIER);
    assert_eq!(bo.meta.use_flags, usage);
    let mapping = driver.map_bo(&bo, 0, BO_MAP_WRITE).unwrap();
    assert_eq!(mapping.len(), 256 * 256 * 4);
    assert_eq!(mapping.bo().handles[0], bo.handles[0]);
    driver.unmap_bo(mapping).unwrap();
    driver.destroy_bo(bo).unwrap();
    assert!(dev.live_handles().is_empty());
}

#[test]
fn double_destroy_is_reported() {
    let (dev, driver) = driver();
    let bo = driver
        .create_bo(64, 64, XRGB8888, BO_USE_RENDERING)
        .unwrap();
    assert_eq!(bo.meta.use_flags, BO_USE_RENDERING);
    let handle = bo.handles[0];
    driver.destroy_bo(bo).unwrap();
    let err = driver
        .create_bo(64, 64, XRGB8888, BO_USE_RENDERING)
        .map(|mut bo| {
            bo.handles[0] = handle;
            driver.destroy_bo(bo)
        })
        .unwrap()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DestroyFailure);
    assert_eq!(dev.live_handles().len(), 1);
}
