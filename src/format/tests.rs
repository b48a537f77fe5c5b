use crate::format::{
    ARGB8888, NV12, PlaneLayout, RGB565, XRGB8888, YVU420, formats, named_formats, ref_formats,
};

#[test]
fn formats_dont_panic() {
    formats();
    named_formats();
    assert_eq!(formats().len(), ref_formats().len());
    assert_eq!(named_formats()["xrgb8888"], XRGB8888);
}

#[test]
fn packed_stride() {
    assert_eq!(ARGB8888.stride_for_width(17, 0), Some(68));
    assert_eq!(RGB565.stride_for_width(17, 0), Some(34));
    assert_eq!(ARGB8888.stride_for_width(17, 1), None);
    assert_eq!(ARGB8888.stride_for_width(u32::MAX, 0), None);
    assert_eq!(ARGB8888.bytes_per_pixel(0), 4);
    assert_eq!(ARGB8888.bytes_per_pixel(1), 0);
}

#[test]
fn nv12_layout() {
    let layout = NV12.linear_layout(64, 33).unwrap();
    assert_eq!(
        &layout.planes[..],
        &[
            PlaneLayout {
                stride: 64,
                size: 64 * 33,
                offset: 0,
            },
            PlaneLayout {
                stride: 64,
                size: 64 * 17,
                offset: 64 * 33,
            },
        ]
    );
    assert_eq!(layout.total_size, 64 * 50);
}

#[test]
fn yvu420_layout() {
    let layout = YVU420.linear_layout(128, 64).unwrap();
    let strides: Vec<_> = layout.planes.iter().map(|p| p.stride).collect();
    let offsets: Vec<_> = layout.planes.iter().map(|p| p.offset).collect();
    assert_eq!(strides, [128, 64, 64]);
    assert_eq!(offsets, [0, 128 * 64, 128 * 64 + 64 * 32]);
    assert_eq!(layout.total_size, 128 * 64 + 2 * 64 * 32);
}
