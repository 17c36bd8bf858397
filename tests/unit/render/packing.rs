use super::*;
use crate::foundation::core::PixelRect;

fn layout() -> VideoAtlasLayout {
    VideoAtlasLayout {
        video_width: 640,
        video_height: 360,
        rgb_region: PixelRect::new(0.0, 0.0, 320.0, 360.0),
        alpha_region: PixelRect::new(320.0, 0.0, 320.0, 360.0),
    }
}

fn placement(id: &str, dest: [f64; 4], mask: [f64; 4]) -> Placement {
    Placement {
        source_id: id.to_owned(),
        dest_rect: dest.into(),
        mask_rect: mask.into(),
    }
}

fn units(ids: &[&str]) -> UnitTable {
    let mut table = UnitTable::default();
    table.assign(ids.iter().copied());
    table
}

fn uv(x: f64) -> f32 {
    x as f32
}

#[test]
fn scenario_record_for_source_seven() {
    let frame = FrameDescriptor {
        placements: vec![placement(
            "7",
            [10.0, 10.0, 50.0, 50.0],
            [330.0, 10.0, 50.0, 50.0],
        )],
    };
    let mut packer = PlacementPacker::new(1);
    let records = packer.pack(Some(&frame), &layout(), &units(&["7"]));
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].to_array(),
        [
            1.0,
            uv(10.0 / 640.0),
            uv(60.0 / 640.0),
            uv(300.0 / 360.0),
            uv(350.0 / 360.0),
            uv(330.0 / 640.0),
            uv(380.0 / 640.0),
            uv(300.0 / 360.0),
            uv(350.0 / 360.0),
        ]
    );
}

#[test]
fn destination_is_offset_by_the_rgb_origin() {
    let mut l = layout();
    l.rgb_region = PixelRect::new(320.0, 0.0, 320.0, 360.0);
    l.alpha_region = PixelRect::new(0.0, 0.0, 320.0, 360.0);
    let p = placement("a", [0.0, 0.0, 320.0, 360.0], [0.0, 0.0, 320.0, 360.0]);
    let r = PlacementRecord::encode(&p, &l, 1);
    assert_eq!(r.dest, [0.5, 1.0, 0.0, 1.0]);
    assert_eq!(r.mask, [0.0, 0.5, 0.0, 1.0]);
}

#[test]
fn unknown_sources_are_dropped_without_shifting_others() {
    let frame = FrameDescriptor {
        placements: vec![
            placement("a", [0.0, 0.0, 10.0, 10.0], [320.0, 0.0, 10.0, 10.0]),
            placement("ghost", [0.0, 0.0, 10.0, 10.0], [320.0, 0.0, 10.0, 10.0]),
            placement("b", [20.0, 0.0, 10.0, 10.0], [340.0, 0.0, 10.0, 10.0]),
        ],
    };
    let mut packer = PlacementPacker::new(2);
    let records = packer.pack(Some(&frame), &layout(), &units(&["a", "b"]));
    let unit_ids: Vec<f32> = records.iter().map(|r| r.unit).collect();
    assert_eq!(unit_ids, vec![1.0, 2.0]);
    assert_eq!(records[1].dest[0], uv(20.0 / 640.0));
}

#[test]
fn order_is_preserved() {
    let frame = FrameDescriptor {
        placements: vec![
            placement("b", [0.0, 0.0, 10.0, 10.0], [320.0, 0.0, 10.0, 10.0]),
            placement("a", [0.0, 0.0, 10.0, 10.0], [320.0, 0.0, 10.0, 10.0]),
        ],
    };
    let mut packer = PlacementPacker::new(2);
    let records = packer.pack(Some(&frame), &layout(), &units(&["a", "b"]));
    assert_eq!(records[0].unit, 2.0);
    assert_eq!(records[1].unit, 1.0);
}

#[test]
fn surplus_placements_are_truncated() {
    let p = placement("a", [0.0, 0.0, 10.0, 10.0], [320.0, 0.0, 10.0, 10.0]);
    let frame = FrameDescriptor {
        placements: vec![p.clone(), p.clone(), p],
    };
    let mut packer = PlacementPacker::new(2);
    assert_eq!(packer.pack(Some(&frame), &layout(), &units(&["a", "b"])).len(), 2);
}

#[test]
fn missing_frame_packs_nothing() {
    let mut packer = PlacementPacker::new(1);
    assert!(packer.pack(None, &layout(), &units(&["a"])).is_empty());
}

#[test]
fn shorter_frame_zeroes_the_stale_tail() {
    let frame = |n: usize| FrameDescriptor {
        placements: (0..n)
            .map(|_| placement("a", [0.0, 0.0, 10.0, 10.0], [320.0, 0.0, 10.0, 10.0]))
            .collect(),
    };
    let table = units(&["a", "b", "c"]);
    let mut packer = PlacementPacker::new(3);

    packer.pack(Some(&frame(3)), &layout(), &table);
    let bytes = packer.upload_bytes().unwrap().to_vec();
    let floats: &[f32] = bytemuck::cast_slice(&bytes);
    assert_eq!(floats.len(), placement_slots(3) * 4);
    assert_eq!(floats[18], 1.0);

    packer.pack(Some(&frame(1)), &layout(), &table);
    let bytes = packer.upload_bytes().unwrap().to_vec();
    let floats: &[f32] = bytemuck::cast_slice(&bytes);
    assert_eq!(floats[0], 1.0);
    assert!(floats[PLACEMENT_STRIDE..].iter().all(|&f| f == 0.0));
}

#[test]
fn empty_frames_upload_once_to_clear_then_skip() {
    let table = units(&["a"]);
    let mut packer = PlacementPacker::new(1);

    // fresh packer clears whatever the device buffer held
    packer.pack(None, &layout(), &table);
    assert!(packer.upload_bytes().is_some());
    packer.pack(None, &layout(), &table);
    assert!(packer.upload_bytes().is_none());

    let frame = FrameDescriptor {
        placements: vec![placement("a", [0.0, 0.0, 1.0, 1.0], [320.0, 0.0, 1.0, 1.0])],
    };
    packer.pack(Some(&frame), &layout(), &table);
    assert!(packer.upload_bytes().is_some());

    packer.pack(None, &layout(), &table);
    let cleared = packer.upload_bytes().unwrap();
    assert!(cleared.iter().all(|&b| b == 0));
    packer.pack(None, &layout(), &table);
    assert!(packer.upload_bytes().is_none());
}

#[test]
fn zero_capacity_never_uploads() {
    let mut packer = PlacementPacker::new(0);
    assert_eq!(packer.capacity(), 0);
    assert!(packer.upload_bytes().is_none());
}
