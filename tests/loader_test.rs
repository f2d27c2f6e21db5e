//! Tile image markup loader tests

use std::collections::HashMap;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use tilesim::engine::{CityLocation, TileClass, TileGrid, RIVER, ROADS};
use tilesim::graphics::{
    load_tile_image, load_tile_set, DrawContext, LoadError, LoaderContext, Size, SheetContext,
    Sprite, TileCondition, TileImage, TileImageError, TileImageReader, TileSide, TileSpec,
};

fn solid_sheet(color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(64, 64, Rgba(color))
}

/// A context with a default sheet "tiles" and a second sheet "overlay"
fn sheets() -> SheetContext {
    let mut ctx = SheetContext::new(16);
    ctx.add_default_sheet("tiles", solid_sheet([10, 200, 10, 255]));
    ctx.add_sheet("overlay", solid_sheet([200, 10, 10, 255]));
    ctx
}

fn sprite_at(ctx: &SheetContext, sheet: &str, x: i32, y: i32) -> TileImage {
    TileImage::Sprite(Sprite::new(ctx.image(sheet).unwrap()).at(x, y))
}

/// Resolves names from a fixed table, for sheets of differing cell sizes
struct FixedContext {
    images: HashMap<&'static str, Arc<TileImage>>,
}

impl FixedContext {
    fn new() -> Self {
        let mut images = HashMap::new();
        images.insert("small", TileImage::source(Arc::new(solid_sheet([0, 0, 0, 255])), 16));
        images.insert("big", TileImage::source(Arc::new(solid_sheet([0, 0, 0, 255])), 32));
        Self { images }
    }
}

impl LoaderContext for FixedContext {
    fn default_image(&self) -> Result<Arc<TileImage>, LoadError> {
        self.image("small")
    }

    fn image(&self, name: &str) -> Result<Arc<TileImage>, LoadError> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::ImageNotFound(name.to_string()))
    }

    fn parse_frame_spec(&self, spec: &str) -> Result<Arc<TileImage>, LoadError> {
        self.image(spec)
    }
}

#[test]
fn test_simple_image_offset() {
    let ctx = sheets();
    let image = load_tile_image(r#"<image at="3,4"/>"#, &ctx).unwrap();
    assert_eq!(*image, sprite_at(&ctx, "tiles", 3, 4));

    let image = load_tile_image(r#"<image src="overlay" at="16, 32"></image>"#, &ctx).unwrap();
    assert_eq!(*image, sprite_at(&ctx, "overlay", 16, 32));
}

#[test]
fn test_simple_image_rejects_single_coordinate() {
    let ctx = sheets();
    let err = load_tile_image(r#"<image at="3"/>"#, &ctx).unwrap_err();
    assert!(
        matches!(&err, LoadError::InvalidAt { value, .. } if value == "3"),
        "unexpected error: {}",
        err
    );

    let err = load_tile_image(r#"<image at="1,2,3"/>"#, &ctx).unwrap_err();
    assert!(matches!(err, LoadError::InvalidAt { .. }));
}

#[test]
fn test_simple_image_overlap() {
    let ctx = sheets();
    let image = load_tile_image(
        r#"<image at="0,16" overlap-north="8" overlap-east="4"/>"#,
        &ctx,
    )
    .unwrap();

    let TileImage::Sprite(sprite) = &*image else {
        panic!("expected a sprite, got {}", image);
    };
    assert_eq!((sprite.overlap_north, sprite.overlap_east), (8, 4));
    assert_eq!(image.size(), Size::square(16));
    assert_eq!(image.bounds(), Size::new(20, 24));
}

#[test]
fn test_bad_overlap_is_invalid_integer() {
    let ctx = sheets();
    let err = load_tile_image(r#"<image overlap-north="tall"/>"#, &ctx).unwrap_err();
    assert!(matches!(
        &err,
        LoadError::InvalidInteger { attribute, .. } if attribute == "overlap-north"
    ));
}

#[test]
fn test_switch_reads_cases_and_default() {
    let ctx = sheets();
    let xml = r#"
        <switch>
          <case tile-west="road"><image at="16,0"/></case>
          <case tile-north="water" tile-south="road"><image at="32,0"/></case>
          <default><image at="0,0"/></default>
        </switch>"#;
    let image = load_tile_image(xml, &ctx).unwrap();

    let TileImage::Switch(sw) = &*image else {
        panic!("expected a switch, got {}", image);
    };
    assert_eq!(sw.cases().len(), 3);
    assert_eq!(
        sw.cases()[0].condition,
        TileCondition::tile(TileSide::West, TileSpec::Class(TileClass::Road))
    );
    assert_eq!(
        sw.cases()[1].condition,
        TileCondition::and(
            TileCondition::tile(TileSide::North, TileSpec::Class(TileClass::Water)),
            TileCondition::tile(TileSide::South, TileSpec::Class(TileClass::Road)),
        )
    );
    assert!(sw.default_case().condition.is_always());
    assert_eq!(*sw.default_case().image, sprite_at(&ctx, "tiles", 0, 0));
}

#[test]
fn test_switch_realizes_against_grid() {
    let ctx = sheets();
    let xml = r#"
        <switch>
          <case tile-east="2"><image at="16,0"/></case>
          <default><image at="0,0"/></default>
        </switch>"#;
    let image = load_tile_image(xml, &ctx).unwrap();

    let mut grid = TileGrid::new(3, 1);
    grid.set_tile(CityLocation::new(1, 0), RIVER);
    grid.set_tile(CityLocation::new(2, 0), ROADS);

    let dc = DrawContext::new(0, &grid, CityLocation::new(0, 0));
    assert_eq!(*image.realize(&dc), sprite_at(&ctx, "tiles", 16, 0));

    let dc = DrawContext::new(0, &grid, CityLocation::new(1, 0));
    assert_eq!(*image.realize(&dc), sprite_at(&ctx, "tiles", 0, 0));
}

#[test]
fn test_switch_without_default_fails() {
    let ctx = sheets();
    let xml = r#"<switch><case tile="road"><image/></case></switch>"#;
    let err = load_tile_image(xml, &ctx).unwrap_err();
    assert!(matches!(err, LoadError::MissingDefault));
}

#[test]
fn test_case_conditions_are_validated() {
    let ctx = sheets();

    let xml = r#"<switch><case><image/></case><default><image/></default></switch>"#;
    let err = load_tile_image(xml, &ctx).unwrap_err();
    assert!(matches!(err, LoadError::MissingCondition));

    let xml = r#"<switch><case tile="lava"><image/></case><default><image/></default></switch>"#;
    let err = load_tile_image(xml, &ctx).unwrap_err();
    assert!(matches!(
        &err,
        LoadError::InvalidCondition { attribute, value, .. } if attribute == "tile" && value == "lava"
    ));
}

#[test]
fn test_layered_image_stacks_in_order() {
    let ctx = sheets();
    let xml = r#"
        <layered-image>
          <image at="0,0"/>
          <image src="overlay" at="16,0"/>
          <image at="32,0"/>
        </layered-image>"#;
    let image = load_tile_image(xml, &ctx).unwrap();

    let TileImage::Layer(top) = &*image else {
        panic!("expected a layer, got {}", image);
    };
    assert_eq!(*top.above, sprite_at(&ctx, "tiles", 32, 0));
    let TileImage::Layer(bottom) = &*top.below else {
        panic!("expected a nested layer, got {}", top.below);
    };
    assert_eq!(*bottom.below, sprite_at(&ctx, "tiles", 0, 0));
    assert_eq!(*bottom.above, sprite_at(&ctx, "overlay", 16, 0));
}

#[test]
fn test_empty_layered_image_fails() {
    let ctx = sheets();
    let err = load_tile_image("<layered-image></layered-image>", &ctx).unwrap_err();
    assert!(matches!(err, LoadError::EmptyLayer));

    let err = load_tile_image("<layered-image/>", &ctx).unwrap_err();
    assert!(matches!(err, LoadError::EmptyLayer));
}

#[test]
fn test_unknown_children_are_skipped() {
    let ctx = sheets();
    let xml = r#"
        <layered-image>
          <note text="ignored"/>
          <image at="0,16"/>
          <extra><image at="48,48"/><deeper><x/></deeper></extra>
        </layered-image>"#;
    let image = load_tile_image(xml, &ctx).unwrap();
    assert_eq!(*image, sprite_at(&ctx, "tiles", 0, 16));
}

#[test]
fn test_unknown_root_tag_fails() {
    let ctx = sheets();
    let err = load_tile_image("<sprite/>", &ctx).unwrap_err();
    assert!(matches!(&err, LoadError::UnknownTag(tag) if tag == "sprite"));
}

#[test]
fn test_layer_size_mismatch_is_reported() {
    let ctx = FixedContext::new();
    let xml = r#"<layered-image><image src="small"/><image src="big"/></layered-image>"#;
    let err = load_tile_image(xml, &ctx).unwrap_err();

    match err {
        LoadError::Compose { tag, source } => {
            assert_eq!(tag, "layered-image");
            assert_eq!(
                source,
                TileImageError::SizeMismatch {
                    below: Size::square(16),
                    above: Size::square(32),
                }
            );
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_animation_frames() {
    let ctx = sheets();
    let xml = r#"
        <animation>
          <frame duration="2"><image at="0,0"/></frame>
          <frame>overlay@16,0+tiles@0,16</frame>
          <comment/>
        </animation>"#;
    let image = load_tile_image(xml, &ctx).unwrap();

    let TileImage::Animation(anim) = &*image else {
        panic!("expected an animation, got {}", image);
    };
    let durations: Vec<u64> = anim.frames().iter().map(|f| f.duration()).collect();
    assert_eq!(durations, vec![2, 1]);
    assert_eq!(**anim.frames()[0].image(), sprite_at(&ctx, "tiles", 0, 0));

    let TileImage::Layer(layer) = &**anim.frames()[1].image() else {
        panic!("expected a layered frame, got {}", anim.frames()[1].image());
    };
    assert_eq!(*layer.below, sprite_at(&ctx, "overlay", 16, 0));
    assert_eq!(*layer.above, sprite_at(&ctx, "tiles", 0, 16));
}

#[test]
fn test_micropolis_animation_with_default_sheet_frames() {
    let ctx = sheets();
    let xml = r#"<micropolis-animation><frame>@0,0</frame><frame>@16,0</frame></micropolis-animation>"#;
    let image = load_tile_image(xml, &ctx).unwrap();

    let TileImage::Animation(anim) = &*image else {
        panic!("expected an animation, got {}", image);
    };
    assert_eq!(anim.period(), 2);
    assert_eq!(**anim.frames()[1].image(), sprite_at(&ctx, "tiles", 16, 0));
}

#[test]
fn test_empty_animation_and_frame_fail() {
    let ctx = sheets();
    let err = load_tile_image("<animation></animation>", &ctx).unwrap_err();
    assert!(matches!(err, LoadError::EmptyAnimation));

    let err = load_tile_image("<animation><frame/></animation>", &ctx).unwrap_err();
    assert!(matches!(&err, LoadError::MissingImage(tag) if tag == "frame"));

    let err = load_tile_image("<animation><frame>tiles@1</frame></animation>", &ctx).unwrap_err();
    assert!(matches!(err, LoadError::InvalidFrameSpec { .. }));
}

#[test]
fn test_animation_period_overflow_is_reported() {
    let ctx = sheets();
    let xml = r#"
        <animation>
          <frame duration="18446744073709551615">@0,0</frame>
          <frame>@16,0</frame>
        </animation>"#;
    let err = load_tile_image(xml, &ctx).unwrap_err();
    assert!(
        matches!(&err, LoadError::Compose { tag, source: TileImageError::PeriodOverflow } if tag == "animation"),
        "unexpected error: {}",
        err
    );

    let xml = r#"<animation><frame duration="0">@0,0</frame><frame>@16,0</frame></animation>"#;
    let image = load_tile_image(xml, &ctx).unwrap();
    let TileImage::Animation(anim) = &*image else {
        panic!("expected an animation, got {}", image);
    };
    assert_eq!(anim.period(), 2);
}

#[test]
fn test_missing_sheet_fails() {
    let ctx = sheets();
    let err = load_tile_image(r#"<image src="roads"/>"#, &ctx).unwrap_err();
    assert!(matches!(&err, LoadError::ImageNotFound(name) if name == "roads"));

    let bare = SheetContext::new(16);
    let err = load_tile_image("<image/>", &bare).unwrap_err();
    assert!(matches!(err, LoadError::NoDefaultImage));
}

#[test]
fn test_fallback_sheet_resolves_any_name() {
    let mut ctx = SheetContext::new(16);
    ctx.set_fallback_sheet(solid_sheet([1, 2, 3, 255]));

    let image = load_tile_image(r#"<image src="anything" at="16,16"/>"#, &ctx).unwrap();
    assert_eq!(image.size(), Size::square(16));
    assert!(load_tile_image("<image/>", &ctx).is_ok());
}

#[test]
fn test_target_size_rescales_sheets() {
    let mut ctx = SheetContext::new(16).with_target_size(32);
    ctx.add_default_sheet("tiles", solid_sheet([9, 9, 9, 255]));

    let image = load_tile_image(r#"<image at="16,0" overlap-north="8"/>"#, &ctx).unwrap();
    assert_eq!(image.size(), Size::square(32));
    assert_eq!(image.bounds(), Size::new(32, 48));
}

#[test]
fn test_tile_set_reads_named_tiles() {
    let ctx = sheets();
    let xml = r#"
        <micropolis-tiles>
          <tile name="dirt"><image at="0,0"/></tile>
          <tile name="river">
            <animation>
              <frame><image at="0,16"/></frame>
              <frame><image at="16,16"/></frame>
            </animation>
          </tile>
          <credits>nobody</credits>
        </micropolis-tiles>"#;
    let set = load_tile_set(xml, &ctx).unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(**set.get("dirt").unwrap(), sprite_at(&ctx, "tiles", 0, 0));
    assert!(set.get("river").unwrap().is_animated());
    let names: Vec<&str> = set.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["dirt", "river"]);
}

#[test]
fn test_tile_set_requires_names() {
    let ctx = sheets();
    let err = load_tile_set("<tiles><tile><image/></tile></tiles>", &ctx).unwrap_err();
    assert!(matches!(
        &err,
        LoadError::MissingAttribute { attribute, .. } if attribute == "name"
    ));

    let err = load_tile_set(r#"<tiles><tile name="x"></tile></tiles>"#, &ctx).unwrap_err();
    assert!(matches!(&err, LoadError::MissingImage(tag) if tag == "tile"));
}

#[test]
fn test_reader_streams_from_buffered_source() {
    let ctx = sheets();
    let xml = br#"<tiles><tile name="a"><image/></tile></tiles>"#;
    let set = TileImageReader::new(&xml[..], &ctx).read_tile_set().unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_truncated_document_fails() {
    let ctx = sheets();
    let err = load_tile_image("<layered-image><image/>", &ctx).unwrap_err();
    assert!(matches!(err, LoadError::UnexpectedEof | LoadError::Xml(_)));
}
