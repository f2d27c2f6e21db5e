//! Enumeration of every concrete variant of a tile image
//!
//! Each variant is paired with the condition under which it is drawn. The
//! conditions of one enumeration are mutually exclusive and together cover
//! every context, so exactly one variant applies to any draw.

use std::iter;
use std::sync::Arc;

use super::condition::TileCondition;
use super::tile_image::{Layer, TileImage};

/// A condition-free tile image and the condition selecting it
#[derive(Debug, Clone, PartialEq)]
pub struct RealImage {
    pub condition: TileCondition,
    pub image: Arc<TileImage>,
}

impl RealImage {
    pub fn new(condition: TileCondition, image: Arc<TileImage>) -> Self {
        Self { condition, image }
    }
}

/// Lazy sequence of realizations
pub type RealImages = Box<dyn Iterator<Item = RealImage>>;

impl TileImage {
    /// Lazily enumerates every realization of this tree.
    ///
    /// Each call starts a fresh, independent sequence.
    pub fn realize_all(self: &Arc<Self>) -> RealImages {
        match &**self {
            TileImage::Source(_) | TileImage::Scaled(_) => {
                Box::new(iter::once(RealImage::new(TileCondition::Always, Arc::clone(self))))
            }
            TileImage::Sprite(sprite) => {
                let sprite = sprite.clone();
                let inner = sprite.source.realize_all();
                Box::new(inner.map(move |r| {
                    RealImage::new(r.condition, Arc::new(TileImage::Sprite(sprite.with_source(r.image))))
                }))
            }
            TileImage::Layer(layer) => Box::new(LayerCombinations::new(layer)),
            TileImage::Switch(sw) => {
                let mut excluded = TileCondition::Always;
                let mut guarded = Vec::with_capacity(sw.cases().len());
                for case in sw.cases() {
                    guarded.push((
                        TileCondition::and(excluded.clone(), case.condition.clone()),
                        Arc::clone(&case.image),
                    ));
                    excluded =
                        TileCondition::and(excluded, TileCondition::negate(case.condition.clone()));
                }
                Box::new(nested(guarded))
            }
            TileImage::Animation(anim) => {
                let windows = anim
                    .frame_conditions()
                    .into_iter()
                    .zip(anim.frames().iter().map(|f| Arc::clone(f.image())))
                    .collect();
                Box::new(nested(windows))
            }
        }
    }
}

/// Realizes each guarded child in turn, AND'ing its guard into the result
fn nested(guarded: Vec<(TileCondition, Arc<TileImage>)>) -> impl Iterator<Item = RealImage> {
    guarded.into_iter().flat_map(|(guard, image)| {
        image.realize_all().map(move |r| {
            RealImage::new(TileCondition::and(guard.clone(), r.condition), r.image)
        })
    })
}

/// Cross product of the realizations of a layer's children.
///
/// The below child drives the outer loop; the above child's sequence is
/// restarted for every below realization.
struct LayerCombinations {
    above: Arc<TileImage>,
    major: RealImages,
    current: Option<RealImage>,
    minor: Option<RealImages>,
}

impl LayerCombinations {
    fn new(layer: &Layer) -> Self {
        Self {
            above: Arc::clone(&layer.above),
            major: layer.below.realize_all(),
            current: None,
            minor: None,
        }
    }
}

impl Iterator for LayerCombinations {
    type Item = RealImage;

    fn next(&mut self) -> Option<RealImage> {
        loop {
            if let (Some(major), Some(minor)) = (&self.current, &mut self.minor) {
                if let Some(above) = minor.next() {
                    return Some(RealImage::new(
                        TileCondition::and(major.condition.clone(), above.condition),
                        Arc::new(TileImage::Layer(Layer::joined(Arc::clone(&major.image), above.image))),
                    ));
                }
            }
            self.current = Some(self.major.next()?);
            self.minor = Some(self.above.realize_all());
        }
    }
}
