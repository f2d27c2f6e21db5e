//! Normal form: switches and animations hoisted to the root
//!
//! After normalization a tree is either free of conditionals, or a single
//! switch/animation whose variants are free of conditionals. Composing two
//! conditional children takes the cross product of their cases with the
//! conditions AND'ed, so nesting depth multiplies case counts.

use std::sync::Arc;

use super::condition::TileCondition;
use super::switch_image::{Animation, Case, Frame, SwitchImage};
use super::tile_image::{Layer, TileImage};

impl TileImage {
    /// Returns an equivalent tree with all conditional structure at the root
    pub fn normal_form(self: &Arc<Self>) -> Arc<TileImage> {
        match &**self {
            TileImage::Source(_) | TileImage::Scaled(_) => Arc::clone(self),
            TileImage::Sprite(sprite) => {
                let source = sprite.source.normal_form();
                if Arc::ptr_eq(&source, &sprite.source) && !source.is_conditional() {
                    return Arc::clone(self);
                }
                hoist(&source, |img| TileImage::Sprite(sprite.with_source(img)))
            }
            TileImage::Layer(layer) => {
                let below = layer.below.normal_form();
                let above = layer.above.normal_form();
                if Arc::ptr_eq(&below, &layer.below)
                    && Arc::ptr_eq(&above, &layer.above)
                    && !below.is_conditional()
                    && !above.is_conditional()
                {
                    return Arc::clone(self);
                }
                hoist_pair(&below, &above, |b, a| TileImage::Layer(Layer::joined(b, a)))
            }
            TileImage::Switch(sw) => {
                let cases = flatten(sw.cases().iter().map(|c| (c.condition.clone(), &c.image)));
                rebuild_switch(self, sw, cases)
            }
            TileImage::Animation(anim) => {
                let normalized: Vec<Arc<TileImage>> =
                    anim.frames().iter().map(|f| f.image().normal_form()).collect();
                if normalized.iter().any(|img| img.is_conditional()) {
                    let cases = flatten(
                        anim.as_cases()
                            .into_iter()
                            .map(|c| c.condition)
                            .zip(anim.frames().iter().map(|f| f.image())),
                    );
                    return Arc::new(TileImage::Switch(SwitchImage::from_cases(cases)));
                }
                let unchanged = normalized
                    .iter()
                    .zip(anim.frames())
                    .all(|(n, f)| Arc::ptr_eq(n, f.image()));
                if unchanged {
                    return Arc::clone(self);
                }
                let frames = normalized
                    .into_iter()
                    .zip(anim.frames())
                    .map(|(image, f)| Frame::new(f.duration(), image))
                    .collect();
                Arc::new(TileImage::Animation(Animation::from_frames(frames)))
            }
        }
    }

    /// The variants of a conditional node as first-match cases
    fn as_cases(&self) -> Option<Vec<Case>> {
        match self {
            TileImage::Switch(sw) => Some(sw.cases().to_vec()),
            TileImage::Animation(anim) => Some(anim.as_cases()),
            _ => None,
        }
    }
}

fn rebuild_switch(original: &Arc<TileImage>, sw: &SwitchImage, cases: Vec<Case>) -> Arc<TileImage> {
    if cases.as_slice() == sw.cases() {
        return Arc::clone(original);
    }
    Arc::new(TileImage::Switch(SwitchImage::from_cases(cases)))
}

/// Normalizes each case and splices nested conditionals into the case list
fn flatten<'a, I>(cases: I) -> Vec<Case>
where
    I: IntoIterator<Item = (TileCondition, &'a Arc<TileImage>)>,
{
    let mut out = Vec::new();
    for (condition, image) in cases {
        let normalized = image.normal_form();
        match normalized.as_cases() {
            Some(inner) => {
                for case in inner {
                    out.push(Case::new(
                        TileCondition::and(condition.clone(), case.condition),
                        case.image,
                    ));
                }
            }
            None => out.push(Case::new(condition, normalized)),
        }
    }
    out
}

/// Wraps each variant of a normalized child with `wrap`
fn hoist<F>(child: &Arc<TileImage>, wrap: F) -> Arc<TileImage>
where
    F: Fn(Arc<TileImage>) -> TileImage,
{
    match &**child {
        TileImage::Switch(sw) => {
            let cases = sw
                .cases()
                .iter()
                .map(|c| Case::new(c.condition.clone(), Arc::new(wrap(Arc::clone(&c.image)))))
                .collect();
            Arc::new(TileImage::Switch(SwitchImage::from_cases(cases)))
        }
        TileImage::Animation(anim) => {
            let frames = anim
                .frames()
                .iter()
                .map(|f| Frame::new(f.duration(), Arc::new(wrap(Arc::clone(f.image())))))
                .collect();
            Arc::new(TileImage::Animation(Animation::from_frames(frames)))
        }
        _ => Arc::new(wrap(Arc::clone(child))),
    }
}

/// Combines two normalized children, crossing their cases when both are
/// conditional. The `major` child's cases form the outer loop.
fn hoist_pair<F>(major: &Arc<TileImage>, minor: &Arc<TileImage>, wrap: F) -> Arc<TileImage>
where
    F: Fn(Arc<TileImage>, Arc<TileImage>) -> TileImage,
{
    match (major.as_cases(), minor.as_cases()) {
        (Some(major_cases), Some(minor_cases)) => {
            let mut cases = Vec::with_capacity(major_cases.len() * minor_cases.len());
            for m in &major_cases {
                for n in &minor_cases {
                    cases.push(Case::new(
                        TileCondition::and(m.condition.clone(), n.condition.clone()),
                        Arc::new(wrap(Arc::clone(&m.image), Arc::clone(&n.image))),
                    ));
                }
            }
            Arc::new(TileImage::Switch(SwitchImage::from_cases(cases)))
        }
        (Some(_), None) => hoist(major, |img| wrap(img, Arc::clone(minor))),
        (None, Some(_)) => hoist(minor, |img| wrap(Arc::clone(major), img)),
        (None, None) => Arc::new(wrap(Arc::clone(major), Arc::clone(minor))),
    }
}
