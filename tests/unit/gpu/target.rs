use super::*;

#[test]
fn align_rounds_up_to_copy_alignment() {
    assert_eq!(align_to(4, 256), 256);
    assert_eq!(align_to(256, 256), 256);
    assert_eq!(align_to(1280, 256), 1280);
    assert_eq!(align_to(1284, 256), 1536);
}

#[test]
fn unpad_drops_row_padding() {
    let padded = [1, 2, 0, 0, 3, 4, 0, 0];
    assert_eq!(unpad_rows(&padded, 2, 4, 2), vec![1, 2, 3, 4]);
}

#[test]
fn pixel_lookup_is_row_major() {
    let frame = FrameRgba {
        width: 2,
        height: 2,
        data: (0u8..16).collect(),
    };
    assert_eq!(frame.pixel(0, 0), Some([0, 1, 2, 3]));
    assert_eq!(frame.pixel(1, 1), Some([12, 13, 14, 15]));
    assert_eq!(frame.pixel(2, 0), None);
}

#[test]
fn into_image_checks_the_buffer_size() {
    let bad = FrameRgba {
        width: 2,
        height: 2,
        data: vec![0; 3],
    };
    assert!(matches!(bad.into_image(), Err(AlphaError::Gpu(_))));
}
