//! Streaming reader for tile image markup
//!
//! A recursive-descent reader over a pull parser. Each `read_*` method is
//! entered with the start tag of its element already consumed and returns
//! after consuming the matching end tag.
//!
//! ```xml
//! <layered-image>
//!   <image src="terrain" at="0,32"/>
//!   <switch>
//!     <case tile-west="road"><image at="16,0"/></case>
//!     <default><image at="0,0"/></default>
//!   </switch>
//! </layered-image>
//! ```

use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::Arc;

use log::{debug, info};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::condition::{TileCondition, TileSide, TileSpec};
use super::switch_image::{Animation, Frame, SwitchBuilder};
use super::tile_image::{Layer, Sprite, TileImage, TileImageError};

/// Frame duration, in ticks, when a `<frame>` does not say
pub const DEFAULT_FRAME_DURATION: u64 = 1;

/// Errors raised while reading tile image markup
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("invalid 'at' syntax in <{tag}>: \"{value}\" (expected \"x,y\")")]
    InvalidAt { tag: String, value: String },
    #[error("invalid integer for '{attribute}' in <{tag}>: \"{value}\"")]
    InvalidInteger {
        tag: String,
        attribute: String,
        value: String,
    },
    #[error("invalid condition {attribute}=\"{value}\": {reason}")]
    InvalidCondition {
        attribute: String,
        value: String,
        reason: String,
    },
    #[error("<case> has no condition attribute")]
    MissingCondition,
    #[error("missing attribute '{attribute}' in <{tag}>")]
    MissingAttribute { tag: String, attribute: String },
    #[error("default case is required in switch image")]
    MissingDefault,
    #[error("layer must have at least one image")]
    EmptyLayer,
    #[error("animation must have at least one frame")]
    EmptyAnimation,
    #[error("missing image descriptor in <{0}>")]
    MissingImage(String),
    #[error("unrecognized tag: <{0}>")]
    UnknownTag(String),
    #[error("image source not found: {0}")]
    ImageNotFound(String),
    #[error("no default image configured")]
    NoDefaultImage,
    #[error("invalid frame spec \"{spec}\": {reason}")]
    InvalidFrameSpec { spec: String, reason: String },
    #[error("unexpected end of document")]
    UnexpectedEof,
    #[error("in <{tag}>: {source}")]
    Compose {
        tag: String,
        #[source]
        source: TileImageError,
    },
}

/// Resolves image references found in markup
pub trait LoaderContext {
    /// The sheet used by `<image>` tags without a `src`
    fn default_image(&self) -> Result<Arc<TileImage>, LoadError>;

    /// A named sheet
    fn image(&self, name: &str) -> Result<Arc<TileImage>, LoadError>;

    /// Parses the shorthand text form of an animation frame
    fn parse_frame_spec(&self, spec: &str) -> Result<Arc<TileImage>, LoadError>;
}

/// Parses an `"x,y"` pair of integers
pub(crate) fn parse_offset(text: &str) -> Option<(i32, i32)> {
    let mut parts = text.split(',');
    let x = parts.next()?.trim().parse().ok()?;
    let y = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((x, y))
}

fn is_descriptor(tag: &str) -> bool {
    matches!(
        tag,
        "image" | "animation" | "micropolis-animation" | "switch" | "layered-image"
    )
}

/// A start tag with its attributes copied out of the read buffer
#[derive(Debug, Clone)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    /// Self-closing, so no children and no end tag follow
    empty: bool,
}

impl Element {
    fn read(start: &BytesStart<'_>, empty: bool) -> Result<Self, LoadError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            empty,
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn int_attr<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, LoadError> {
        match self.attr(key) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| LoadError::InvalidInteger {
                    tag: self.name.clone(),
                    attribute: key.to_string(),
                    value: value.to_string(),
                }),
        }
    }
}

enum Token {
    Start(Element),
    Text(String),
    End,
}

/// Named tile images read from a tile-set document
#[derive(Debug, Clone, Default)]
pub struct TileSet {
    tiles: BTreeMap<String, Arc<TileImage>>,
}

impl TileSet {
    pub fn get(&self, name: &str) -> Option<&Arc<TileImage>> {
        self.tiles.get(name)
    }

    pub fn insert(&mut self, name: String, image: Arc<TileImage>) {
        self.tiles.insert(name, image);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<TileImage>)> {
        self.tiles.iter()
    }
}

/// Single-pass reader building tile image trees from markup
pub struct TileImageReader<'c, R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    ctx: &'c dyn LoaderContext,
}

impl<'c, 'x> TileImageReader<'c, &'x [u8]> {
    pub fn from_xml(xml: &'x str, ctx: &'c dyn LoaderContext) -> Self {
        Self::new(xml.as_bytes(), ctx)
    }
}

impl<'c, R: BufRead> TileImageReader<'c, R> {
    pub fn new(source: R, ctx: &'c dyn LoaderContext) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            ctx,
        }
    }

    /// Reads a document whose root element is a single tile image descriptor
    pub fn read_document(&mut self) -> Result<Arc<TileImage>, LoadError> {
        let root = self.root_element()?;
        self.read_tile_image(&root)
    }

    /// Reads a document of `<tile name="...">` entries
    pub fn read_tile_set(&mut self) -> Result<TileSet, LoadError> {
        let root = self.root_element()?;
        let mut set = TileSet::default();
        while let Some(child) = self.next_child(&root)? {
            if child.name != "tile" {
                debug!("skipping <{}> in <{}>", child.name, root.name);
                self.skip(&child)?;
                continue;
            }
            let name = child
                .attr("name")
                .ok_or_else(|| LoadError::MissingAttribute {
                    tag: child.name.clone(),
                    attribute: "name".to_string(),
                })?
                .to_string();
            let image = self.read_tile_image_m(&child)?;
            set.insert(name, image);
        }
        info!("loaded {} tile images from <{}>", set.len(), root.name);
        Ok(set)
    }

    /// Reads the descriptor whose start tag is `el`
    fn read_tile_image(&mut self, el: &Element) -> Result<Arc<TileImage>, LoadError> {
        match el.name.as_str() {
            "image" => self.read_simple_image(el),
            "animation" | "micropolis-animation" => self.read_animation(el),
            "switch" => self.read_switch(el),
            "layered-image" => self.read_layered_image(el),
            _ => Err(LoadError::UnknownTag(el.name.clone())),
        }
    }

    /// Reads the children of a container tag, which must hold one descriptor
    fn read_tile_image_m(&mut self, parent: &Element) -> Result<Arc<TileImage>, LoadError> {
        let mut image = None;
        while let Some(child) = self.next_child(parent)? {
            if is_descriptor(&child.name) {
                image = Some(self.read_tile_image(&child)?);
            } else {
                debug!("skipping <{}> in <{}>", child.name, parent.name);
                self.skip(&child)?;
            }
        }
        image.ok_or_else(|| LoadError::MissingImage(parent.name.clone()))
    }

    fn read_simple_image(&mut self, el: &Element) -> Result<Arc<TileImage>, LoadError> {
        let source = match el.attr("src") {
            Some(name) => self.ctx.image(name)?,
            None => self.ctx.default_image()?,
        };
        let mut sprite = Sprite::new(source);

        if let Some(at) = el.attr("at") {
            let (x, y) = parse_offset(at).ok_or_else(|| LoadError::InvalidAt {
                tag: el.name.clone(),
                value: at.to_string(),
            })?;
            sprite = sprite.at(x, y);
        }

        let overlap_north = el.int_attr("overlap-north")?.unwrap_or(0);
        let overlap_east = el.int_attr("overlap-east")?.unwrap_or(0);

        self.skip(el)?;
        Ok(Arc::new(TileImage::Sprite(
            sprite.with_overlap(overlap_north, overlap_east),
        )))
    }

    fn read_switch(&mut self, el: &Element) -> Result<Arc<TileImage>, LoadError> {
        let mut builder = SwitchBuilder::new();
        let mut default = None;

        while let Some(child) = self.next_child(el)? {
            match child.name.as_str() {
                "case" => {
                    let condition = read_condition(&child)?;
                    let image = self.read_tile_image_m(&child)?;
                    builder.add_case(condition, image);
                }
                "default" => default = Some(self.read_tile_image_m(&child)?),
                _ => {
                    debug!("skipping <{}> in <{}>", child.name, el.name);
                    self.skip(&child)?;
                }
            }
        }

        let default = default.ok_or(LoadError::MissingDefault)?;
        let switch = builder.build(default).map_err(|source| LoadError::Compose {
            tag: el.name.clone(),
            source,
        })?;
        Ok(Arc::new(TileImage::Switch(switch)))
    }

    fn read_layered_image(&mut self, el: &Element) -> Result<Arc<TileImage>, LoadError> {
        let mut result: Option<Arc<TileImage>> = None;

        while let Some(child) = self.next_child(el)? {
            if !is_descriptor(&child.name) {
                debug!("skipping <{}> in <{}>", child.name, el.name);
                self.skip(&child)?;
                continue;
            }
            let image = self.read_tile_image(&child)?;
            result = Some(match result {
                None => image,
                Some(below) => {
                    let layer = Layer::new(below, image).map_err(|source| LoadError::Compose {
                        tag: el.name.clone(),
                        source,
                    })?;
                    Arc::new(TileImage::Layer(layer))
                }
            });
        }

        result.ok_or(LoadError::EmptyLayer)
    }

    fn read_animation(&mut self, el: &Element) -> Result<Arc<TileImage>, LoadError> {
        let mut frames = Vec::new();
        while let Some(child) = self.next_child(el)? {
            if child.name == "frame" {
                frames.push(self.read_frame(&child)?);
            } else {
                debug!("skipping <{}> in <{}>", child.name, el.name);
                self.skip(&child)?;
            }
        }
        if frames.is_empty() {
            return Err(LoadError::EmptyAnimation);
        }
        let animation = Animation::new(frames).map_err(|source| LoadError::Compose {
            tag: el.name.clone(),
            source,
        })?;
        Ok(Arc::new(TileImage::Animation(animation)))
    }

    /// A frame holds either a nested descriptor or frame-spec text
    fn read_frame(&mut self, el: &Element) -> Result<Frame, LoadError> {
        let duration = el.int_attr("duration")?.unwrap_or(DEFAULT_FRAME_DURATION);
        let mut image = None;
        let mut text = String::new();

        if !el.empty {
            loop {
                match self.next_token()? {
                    Token::Start(child) if is_descriptor(&child.name) => {
                        image = Some(self.read_tile_image(&child)?);
                    }
                    Token::Start(child) => self.skip(&child)?,
                    Token::Text(t) => text.push_str(&t),
                    Token::End => break,
                }
            }
        }

        let image = match image {
            Some(image) => image,
            None if !text.trim().is_empty() => self.ctx.parse_frame_spec(text.trim())?,
            None => return Err(LoadError::MissingImage(el.name.clone())),
        };
        Ok(Frame::new(duration, image))
    }

    fn root_element(&mut self) -> Result<Element, LoadError> {
        loop {
            match self.next_token()? {
                Token::Start(el) => return Ok(el),
                Token::Text(_) => continue,
                Token::End => return Err(LoadError::UnexpectedEof),
            }
        }
    }

    /// Next child element of `parent`, or `None` once its end tag is read
    fn next_child(&mut self, parent: &Element) -> Result<Option<Element>, LoadError> {
        if parent.empty {
            return Ok(None);
        }
        loop {
            match self.next_token()? {
                Token::Start(el) => return Ok(Some(el)),
                Token::Text(_) => continue,
                Token::End => return Ok(None),
            }
        }
    }

    /// Consumes everything up to and including the end tag of `el`
    fn skip(&mut self, el: &Element) -> Result<(), LoadError> {
        if el.empty {
            return Ok(());
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token()? {
                Token::Start(child) if !child.empty => depth += 1,
                Token::End => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token, LoadError> {
        loop {
            self.buf.clear();
            let token = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => Token::Start(Element::read(&e, false)?),
                Event::Empty(e) => Token::Start(Element::read(&e, true)?),
                Event::Text(t) => Token::Text(t.unescape()?.into_owned()),
                Event::CData(c) => Token::Text(String::from_utf8_lossy(&c.into_inner()).into_owned()),
                Event::End(_) => Token::End,
                Event::Eof => return Err(LoadError::UnexpectedEof),
                _ => continue,
            };
            return Ok(token);
        }
    }
}

/// Every condition attribute on a `<case>`, AND'ed together
fn read_condition(el: &Element) -> Result<TileCondition, LoadError> {
    let mut condition: Option<TileCondition> = None;
    for side in TileSide::all() {
        let attribute = side.attribute();
        let Some(value) = el.attr(attribute) else {
            continue;
        };
        let spec: TileSpec = value.parse().map_err(|reason| LoadError::InvalidCondition {
            attribute: attribute.to_string(),
            value: value.to_string(),
            reason,
        })?;
        let c = TileCondition::tile(side, spec);
        condition = Some(match condition {
            None => c,
            Some(prev) => TileCondition::and(prev, c),
        });
    }
    condition.ok_or(LoadError::MissingCondition)
}

/// Reads a single tile image descriptor from a markup string
pub fn load_tile_image(xml: &str, ctx: &dyn LoaderContext) -> Result<Arc<TileImage>, LoadError> {
    TileImageReader::from_xml(xml, ctx).read_document()
}

/// Reads a tile-set document from a markup string
pub fn load_tile_set(xml: &str, ctx: &dyn LoaderContext) -> Result<TileSet, LoadError> {
    TileImageReader::from_xml(xml, ctx).read_tile_set()
}
