//! Switch and animation nodes
//!
//! Both select one of several same-sized variants: a switch by evaluating
//! world-state conditions in order, an animation by the current tick.

use std::sync::Arc;

use super::condition::{DrawContext, TileCondition};
use super::tile_image::{TileImage, TileImageError};

/// One variant of a switch image
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub condition: TileCondition,
    pub image: Arc<TileImage>,
}

impl Case {
    pub fn new(condition: TileCondition, image: Arc<TileImage>) -> Self {
        Self { condition, image }
    }

    pub fn matches(&self, dc: &DrawContext<'_>) -> bool {
        self.condition.matches(dc)
    }
}

/// Variants tried in order; the last case is always the default
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchImage {
    cases: Vec<Case>,
}

impl SwitchImage {
    /// Validates the case list: non-empty, one standard size, and an
    /// always-true final case.
    pub fn new(cases: Vec<Case>) -> Result<Self, TileImageError> {
        let last = cases.last().ok_or(TileImageError::EmptySwitch)?;
        if !last.condition.is_always() {
            return Err(TileImageError::MissingDefault);
        }
        check_sizes(cases.iter().map(|c| &c.image))?;
        Ok(Self { cases })
    }

    /// Builds from cases already known to satisfy the invariants
    pub(crate) fn from_cases(cases: Vec<Case>) -> Self {
        debug_assert!(cases.last().map_or(false, |c| c.condition.is_always()));
        Self { cases }
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn default_case(&self) -> &Case {
        &self.cases[self.cases.len() - 1]
    }

    pub fn default_image(&self) -> &Arc<TileImage> {
        &self.default_case().image
    }

    pub fn has_multiple_cases(&self) -> bool {
        self.cases.len() > 1
    }

    /// The first case whose condition holds
    pub fn select(&self, dc: &DrawContext<'_>) -> &Case {
        self.cases
            .iter()
            .find(|c| c.matches(dc))
            .unwrap_or_else(|| self.default_case())
    }
}

/// Accumulates switch cases while markup is being read
#[derive(Debug, Default)]
pub struct SwitchBuilder {
    cases: Vec<Case>,
}

impl SwitchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_case(&mut self, condition: TileCondition, image: Arc<TileImage>) {
        self.cases.push(Case::new(condition, image));
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Freezes the cases, appending `default` as the final always-true case
    pub fn build(mut self, default: Arc<TileImage>) -> Result<SwitchImage, TileImageError> {
        self.cases.push(Case::new(TileCondition::Always, default));
        SwitchImage::new(self.cases)
    }
}

/// One frame of an animation, shown for `duration` ticks
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    duration: u64,
    image: Arc<TileImage>,
}

impl Frame {
    /// A zero duration is raised to one tick
    pub fn new(duration: u64, image: Arc<TileImage>) -> Self {
        Self {
            duration: duration.max(1),
            image,
        }
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn image(&self) -> &Arc<TileImage> {
        &self.image
    }
}

/// A looping sequence of frames
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frames: Vec<Frame>,
}

impl Animation {
    pub fn new(frames: Vec<Frame>) -> Result<Self, TileImageError> {
        if frames.is_empty() {
            return Err(TileImageError::EmptyAnimation);
        }
        frames
            .iter()
            .try_fold(0u64, |total, f| total.checked_add(f.duration))
            .ok_or(TileImageError::PeriodOverflow)?;
        check_sizes(frames.iter().map(|f| &f.image))?;
        Ok(Self { frames })
    }

    /// Frames whose durations come from an already validated animation
    pub(crate) fn from_frames(frames: Vec<Frame>) -> Self {
        debug_assert!(!frames.is_empty());
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Total ticks before the animation repeats
    pub fn period(&self) -> u64 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    pub fn default_image(&self) -> &Arc<TileImage> {
        &self.frames[self.frames.len() - 1].image
    }

    pub fn frame_at(&self, time: u64) -> &Frame {
        let mut t = time % self.period();
        for frame in &self.frames {
            if t < frame.duration {
                return frame;
            }
            t -= frame.duration;
        }
        &self.frames[self.frames.len() - 1]
    }

    /// The exact time window of each frame, as mutually exclusive conditions
    pub fn frame_conditions(&self) -> Vec<TileCondition> {
        if self.frames.len() == 1 {
            return vec![TileCondition::Always];
        }
        let period = self.period();
        let mut start = 0;
        self.frames
            .iter()
            .map(|frame| {
                let end = start + frame.duration;
                let condition = TileCondition::Frame { period, start, end };
                start = end;
                condition
            })
            .collect()
    }

    /// The frames as first-match switch cases, ending in an always-true case
    pub fn as_cases(&self) -> Vec<Case> {
        let mut conditions = self.frame_conditions();
        if let Some(last) = conditions.last_mut() {
            *last = TileCondition::Always;
        }
        conditions
            .into_iter()
            .zip(&self.frames)
            .map(|(condition, frame)| Case::new(condition, Arc::clone(&frame.image)))
            .collect()
    }
}

fn check_sizes<'a, I>(images: I) -> Result<(), TileImageError>
where
    I: IntoIterator<Item = &'a Arc<TileImage>>,
{
    let mut images = images.into_iter();
    let Some(first) = images.next() else {
        return Ok(());
    };
    let expected = first.size();
    for image in images {
        let found = image.size();
        if found != expected {
            return Err(TileImageError::VariantSizeMismatch { expected, found });
        }
    }
    Ok(())
}
