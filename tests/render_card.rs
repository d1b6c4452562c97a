use std::sync::Arc;

use curvecard::assets::PreparedImage;
use curvecard::{AssetStore, Card, Dimensions, Fps, FrameIndex, Theme};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn default_card() -> Card {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Card::new(
        Dimensions::default(),
        Fps::new(60, 1).unwrap(),
        Theme::default(),
    )
    .unwrap()
}

fn solid_image(width: u32, height: u32, premul_px: [u8; 4]) -> PreparedImage {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&premul_px);
    }
    PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(data),
    }
}

#[test]
fn same_frame_digests_identically_across_sessions() {
    let assets = AssetStore::empty();
    let a = default_card().render_frame(FrameIndex(75), &assets).unwrap();
    let b = default_card().render_frame(FrameIndex(75), &assets).unwrap();
    assert_eq!(digest_u64(&a.data), digest_u64(&b.data));
}

#[test]
fn settled_card_repeats_with_the_pulse_cycle() {
    // Every one-shot track has settled well before frame 300; the only
    // animation left is the pulse, which ping-pongs with a 120-frame cycle
    // at 60 fps. Frames one cycle apart must be byte-identical.
    let assets = AssetStore::empty();
    let mut card = default_card();
    let a = card.render_frame(FrameIndex(300), &assets).unwrap();
    let b = card.render_frame(FrameIndex(420), &assets).unwrap();
    assert_eq!(a.data, b.data);

    // Half a cycle apart the pulse is at the other extreme.
    let c = card.render_frame(FrameIndex(360), &assets).unwrap();
    assert_ne!(a.data, c.data);
}

#[test]
fn curves_grow_monotonically_through_the_draw_on() {
    let assets = AssetStore::empty();
    let mut card = default_card();
    // Count pixels that differ from the empty-chart frame as the curves draw
    // on. The pulsing halo breathes in and out, so its neighborhood is
    // excluded from the count; outside it, coverage only grows.
    let marker = card.layout().positive_end();
    let base = card.render_frame(FrameIndex(0), &assets).unwrap();
    let width = base.width as usize;
    let near_marker = |i: usize| {
        let x = (i % width) as f64;
        let y = (i / width) as f64;
        (x - marker.x).abs() < 40.0 && (y - marker.y).abs() < 40.0
    };
    let mut prev_painted = 0usize;
    for f in [15, 45, 90, 120] {
        let frame = card.render_frame(FrameIndex(f), &assets).unwrap();
        let painted = frame
            .data
            .chunks_exact(4)
            .zip(base.data.chunks_exact(4))
            .enumerate()
            .filter(|(i, (a, b))| !near_marker(*i) && a != b)
            .count();
        assert!(painted >= prev_painted, "frame {f}: {painted} < {prev_painted}");
        prev_painted = painted;
    }
    assert!(prev_painted > 0);
}

#[test]
fn larger_canvas_scales_the_layout() {
    let mut card = Card::new(
        Dimensions {
            width: 824.0,
            height: 540.0,
        },
        Fps::new(30, 1).unwrap(),
        Theme::default(),
    )
    .unwrap();
    let frame = card
        .render_frame(FrameIndex(30), &AssetStore::empty())
        .unwrap();
    assert_eq!((frame.width, frame.height), (824, 540));
    assert_eq!(frame.data.len(), 824 * 540 * 4);
}

#[test]
fn arrow_asset_changes_the_settled_frame() {
    let without = AssetStore::empty();
    let with_arrow = AssetStore {
        arrow: Some(solid_image(8, 16, [255, 255, 255, 255])),
        ..AssetStore::empty()
    };
    let mut card = default_card();
    // Frame 300: arrow fully opaque at scale 1.0.
    let a = card.render_frame(FrameIndex(300), &without).unwrap();
    let b = card.render_frame(FrameIndex(300), &with_arrow).unwrap();
    assert_ne!(a.data, b.data);

    // Frame 0: arrow opacity is still zero, so the asset changes nothing.
    let c = card.render_frame(FrameIndex(0), &without).unwrap();
    let d = card.render_frame(FrameIndex(0), &with_arrow).unwrap();
    assert_eq!(c.data, d.data);
}

#[test]
fn theme_recolor_reaches_the_pixels() {
    let mut red_theme = Theme::default();
    red_theme.background = [40, 0, 0, 255];
    let mut a = default_card();
    let mut b = Card::new(Dimensions::default(), Fps::new(60, 1).unwrap(), red_theme).unwrap();
    let fa = a.render_frame(FrameIndex(10), &AssetStore::empty()).unwrap();
    let fb = b.render_frame(FrameIndex(10), &AssetStore::empty()).unwrap();
    assert_ne!(fa.data, fb.data);
}
