//! In-memory tile sheets for the loader
//!
//! Frame specs name a sheet and a cell offset, `sheet@x,y`, with an empty
//! name meaning the default sheet. Several parts joined by `+` are layered
//! bottom to top: `terrain@0,0+overlays@16,32`.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;

use super::loader::{parse_offset, LoadError, LoaderContext};
use super::tile_image::{Layer, Sprite, TileImage};

/// Named RGBA sheets, all authored at one basis size
#[derive(Debug, Clone)]
pub struct SheetContext {
    sheets: HashMap<String, Arc<RgbaImage>>,
    default_sheet: Option<String>,
    /// Stands in for any sheet name that was never added
    fallback: Option<Arc<RgbaImage>>,
    basis_size: u32,
    target_size: Option<u32>,
}

impl SheetContext {
    pub fn new(basis_size: u32) -> Self {
        Self {
            sheets: HashMap::new(),
            default_sheet: None,
            fallback: None,
            basis_size,
            target_size: None,
        }
    }

    /// Rescales every sheet to `target_size` pixels per cell when drawn
    pub fn with_target_size(mut self, target_size: u32) -> Self {
        self.target_size = Some(target_size);
        self
    }

    pub fn add_sheet(&mut self, name: impl Into<String>, pixels: RgbaImage) {
        self.sheets.insert(name.into(), Arc::new(pixels));
    }

    /// Adds a sheet and makes it the default for `<image>` without `src`
    pub fn add_default_sheet(&mut self, name: impl Into<String>, pixels: RgbaImage) {
        let name = name.into();
        self.add_sheet(name.clone(), pixels);
        self.default_sheet = Some(name);
    }

    /// Resolves every unknown name, and a missing default, to `pixels`
    pub fn set_fallback_sheet(&mut self, pixels: RgbaImage) {
        self.fallback = Some(Arc::new(pixels));
    }

    fn wrap(&self, pixels: &Arc<RgbaImage>) -> Arc<TileImage> {
        match self.target_size {
            Some(target) if target != self.basis_size => {
                TileImage::scaled(Arc::clone(pixels), self.basis_size, target)
            }
            _ => TileImage::source(Arc::clone(pixels), self.basis_size),
        }
    }

    fn frame_part(&self, spec: &str, part: &str) -> Result<Arc<TileImage>, LoadError> {
        let invalid = |reason: String| LoadError::InvalidFrameSpec {
            spec: spec.to_string(),
            reason,
        };
        let (name, offset) = match part.split_once('@') {
            Some((name, coords)) => {
                let offset = parse_offset(coords)
                    .ok_or_else(|| invalid(format!("bad offset \"{}\"", coords)))?;
                (name.trim(), offset)
            }
            None => (part.trim(), (0, 0)),
        };
        let source = if name.is_empty() {
            self.default_image()?
        } else {
            self.image(name)?
        };
        Ok(Arc::new(TileImage::Sprite(Sprite::new(source).at(offset.0, offset.1))))
    }
}

impl LoaderContext for SheetContext {
    fn default_image(&self) -> Result<Arc<TileImage>, LoadError> {
        match (&self.default_sheet, &self.fallback) {
            (Some(name), _) => self.image(name),
            (None, Some(pixels)) => Ok(self.wrap(pixels)),
            (None, None) => Err(LoadError::NoDefaultImage),
        }
    }

    fn image(&self, name: &str) -> Result<Arc<TileImage>, LoadError> {
        self.sheets
            .get(name)
            .or(self.fallback.as_ref())
            .map(|pixels| self.wrap(pixels))
            .ok_or_else(|| LoadError::ImageNotFound(name.to_string()))
    }

    fn parse_frame_spec(&self, spec: &str) -> Result<Arc<TileImage>, LoadError> {
        let mut result: Option<Arc<TileImage>> = None;
        for part in spec.split('+').filter(|p| !p.trim().is_empty()) {
            let image = self.frame_part(spec, part)?;
            result = Some(match result {
                None => image,
                Some(below) => {
                    let layer = Layer::new(below, image).map_err(|e| LoadError::InvalidFrameSpec {
                        spec: spec.to_string(),
                        reason: e.to_string(),
                    })?;
                    Arc::new(TileImage::Layer(layer))
                }
            });
        }
        result.ok_or_else(|| LoadError::InvalidFrameSpec {
            spec: spec.to_string(),
            reason: "no image parts".to_string(),
        })
    }
}
