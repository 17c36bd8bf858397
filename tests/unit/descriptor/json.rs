use super::*;

const DESCRIPTOR: &str = r#"{
  "info": {
    "v": 2, "f": 3, "w": 320, "h": 360, "fps": 24,
    "videoW": 640, "videoH": 360,
    "rgbFrame": [0, 0, 320, 360],
    "aFrame": [320, 0, 320, 360]
  },
  "src": [
    { "srcId": "7", "srcType": "img", "srcTag": "[avatar]", "w": 50, "h": 50 },
    { "srcId": "8", "srcType": "txt", "srcTag": "[nickname]" }
  ],
  "frame": [
    { "i": 0, "obj": [
      { "srcId": "7", "z": 0, "frame": [10, 10, 50, 50], "mFrame": [330, 10, 50, 50] },
      { "srcId": "8", "z": 1, "frame": [0, 0, 20, 20], "mFrame": [320, 0, 20, 20] }
    ] },
    { "i": 1, "obj": [] }
  ]
}"#;

fn pixel() -> image::RgbaImage {
    image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]))
}

#[test]
fn prepare_reads_layout_and_timing() {
    let mut src = JsonFrameSource::from_json_str(DESCRIPTOR);
    src.prepare().unwrap();

    let meta = src.metadata().unwrap();
    assert_eq!(meta.layout.video_width, 640);
    assert_eq!(meta.layout.video_height, 360);
    assert_eq!(meta.layout.rgb_region, PixelRect::new(0.0, 0.0, 320.0, 360.0));
    assert_eq!(
        meta.layout.alpha_region,
        PixelRect::new(320.0, 0.0, 320.0, 360.0)
    );
    assert_eq!((meta.display_width, meta.display_height), (320, 360));
    assert_eq!(meta.frame_rate, Some(24.0));
    assert_eq!(meta.frame_count, Some(3));
}

#[test]
fn only_sources_with_supplied_bitmaps_are_registered() {
    let mut src = JsonFrameSource::from_json_str(DESCRIPTOR).with_image("avatar", pixel());
    src.prepare().unwrap();

    let ids: Vec<_> = src.resources().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["7"]);
}

#[test]
fn bitmaps_can_be_keyed_by_source_id() {
    let mut src = JsonFrameSource::from_json_str(DESCRIPTOR)
        .with_image("8", pixel())
        .with_image("7", pixel());
    src.prepare().unwrap();

    let ids: Vec<_> = src.resources().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["7", "8"], "declaration order, not supply order");
}

#[test]
fn placements_keep_descriptor_order() {
    let mut src = JsonFrameSource::from_json_str(DESCRIPTOR);
    src.prepare().unwrap();

    let frame = src.placements_at(FrameIndex(0)).unwrap();
    assert_eq!(frame.placements.len(), 2);
    assert_eq!(frame.placements[0].source_id, "7");
    assert_eq!(
        frame.placements[0].dest_rect,
        PixelRect::new(10.0, 10.0, 50.0, 50.0)
    );
    assert_eq!(
        frame.placements[0].mask_rect,
        PixelRect::new(330.0, 10.0, 50.0, 50.0)
    );
    assert_eq!(frame.placements[1].source_id, "8");
}

#[test]
fn empty_and_missing_frames_have_no_placements() {
    let mut src = JsonFrameSource::from_json_str(DESCRIPTOR);
    src.prepare().unwrap();

    assert!(src.placements_at(FrameIndex(1)).is_none());
    assert!(src.placements_at(FrameIndex(2)).is_none());
    assert!(src.placements_at(FrameIndex(-1)).is_none());
}

#[test]
fn malformed_json_is_a_descriptor_parse_error() {
    let mut src = JsonFrameSource::from_json_str("{ \"info\": ");
    let err = src.prepare().unwrap_err();
    assert!(matches!(err, AlphaError::DescriptorParse(_)), "{err}");
    assert!(src.metadata().is_none());
}

#[test]
fn regions_outside_the_atlas_are_rejected() {
    let doc = DESCRIPTOR.replace("\"aFrame\": [320, 0, 320, 360]", "\"aFrame\": [400, 0, 320, 360]");
    let mut src = JsonFrameSource::from_json_str(doc);
    let err = src.prepare().unwrap_err();
    assert!(err.to_string().contains("alpha region"), "{err}");
}

#[test]
fn missing_descriptor_file_is_a_descriptor_parse_error() {
    let mut src = JsonFrameSource::from_path("/definitely/not/here/descriptor.json");
    assert!(matches!(
        src.prepare(),
        Err(AlphaError::DescriptorParse(_))
    ));
}

#[test]
fn undecodable_bitmap_path_fails_preparation() {
    let mut src =
        JsonFrameSource::from_json_str(DESCRIPTOR).with_image_path("avatar", "/nope/avatar.png");
    assert!(matches!(
        src.prepare(),
        Err(AlphaError::DescriptorParse(_))
    ));
}
