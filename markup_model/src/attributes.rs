// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat attribute mapping used by the persistence collaborator.
//!
//! Every annotation serializes to a `key → value` map of strings. Points are written as
//! `x,y`, point lists as `x,y;x,y;…`, sizes as `w,h`, and numbers use Rust's shortest
//! round-tripping float format, so a save/load cycle reproduces identical values.

use std::collections::BTreeMap;

use kurbo::{Point, Size};
use thiserror::Error;

use crate::{Annotation, AnnotationId, AnnotationKind, LayerId, StyleAttr, strategy_for};

/// Flat attribute mapping of one annotation.
pub type AttributeMap = BTreeMap<String, String>;

/// Failure to reconstruct an annotation from its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// A required attribute is absent.
    #[error("missing attribute `{0}`")]
    Missing(&'static str),
    /// An attribute is present but cannot be parsed.
    #[error("invalid value {value:?} for attribute `{key}`")]
    Invalid {
        /// Attribute key.
        key: String,
        /// Offending value.
        value: String,
    },
    /// The `kind` attribute names no known kind.
    #[error("unknown annotation kind {0:?}")]
    UnknownKind(String),
}

/// Keys shared by every kind.
pub mod keys {
    /// Annotation id.
    pub const ID: &str = "id";
    /// Kind name.
    pub const KIND: &str = "kind";
    /// Center anchor.
    pub const POSITION: &str = "position";
    /// Extents.
    pub const SIZE: &str = "size";
    /// Rotation in radians.
    pub const ROTATION: &str = "rotation";
    /// Layer name.
    pub const LAYER: &str = "layer";
    /// Anchor-relative point list.
    pub const POINTS: &str = "points";
    /// Whether a vertex list is closed.
    pub const CLOSED: &str = "closed";
    /// Text content.
    pub const TEXT: &str = "text";
    /// Segment head in annotation space.
    pub const HEAD: &str = "head";
    /// Segment tail in annotation space.
    pub const TAIL: &str = "tail";
}

pub(crate) fn format_point(p: Point) -> String {
    format!("{},{}", p.x, p.y)
}

pub(crate) fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format_point(*p))
        .collect::<Vec<_>>()
        .join(";")
}

fn invalid(key: &str, value: &str) -> AttributeError {
    AttributeError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_pair(key: &str, value: &str) -> Result<(f64, f64), AttributeError> {
    let (x, y) = value.split_once(',').ok_or_else(|| invalid(key, value))?;
    let x = x.trim().parse::<f64>().map_err(|_| invalid(key, value))?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid(key, value))?;
    if x.is_finite() && y.is_finite() {
        Ok((x, y))
    } else {
        Err(invalid(key, value))
    }
}

/// Look up a required attribute.
pub fn required<'a>(map: &'a AttributeMap, key: &'static str) -> Result<&'a str, AttributeError> {
    map.get(key)
        .map(String::as_str)
        .ok_or(AttributeError::Missing(key))
}

/// Parse a required `x,y` attribute.
pub fn point_attr(map: &AttributeMap, key: &'static str) -> Result<Point, AttributeError> {
    let (x, y) = parse_pair(key, required(map, key)?)?;
    Ok(Point::new(x, y))
}

/// Parse a required `w,h` attribute.
pub fn size_attr(map: &AttributeMap, key: &'static str) -> Result<Size, AttributeError> {
    let (w, h) = parse_pair(key, required(map, key)?)?;
    Ok(Size::new(w, h))
}

/// Parse an optional numeric attribute, defaulting to `default` when absent.
pub fn number_attr(
    map: &AttributeMap,
    key: &'static str,
    default: f64,
) -> Result<f64, AttributeError> {
    match map.get(key) {
        None => Ok(default),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| invalid(key, v)),
    }
}

/// Parse a required `x,y;x,y;…` attribute. An empty string is an empty list.
pub fn points_attr(map: &AttributeMap, key: &'static str) -> Result<Vec<Point>, AttributeError> {
    let value = required(map, key)?;
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(';')
        .map(|pair| parse_pair(key, pair).map(|(x, y)| Point::new(x, y)))
        .collect()
}

/// Write the attributes shared by every kind.
pub(crate) fn write_common(annotation: &Annotation, map: &mut AttributeMap) {
    map.insert(keys::ID.into(), annotation.id().0.to_string());
    map.insert(keys::KIND.into(), annotation.kind().name().into());
    map.insert(keys::POSITION.into(), format_point(annotation.position()));
    let size = annotation.size();
    map.insert(keys::SIZE.into(), format!("{},{}", size.width, size.height));
    map.insert(keys::ROTATION.into(), annotation.rotation().to_string());
    map.insert(keys::LAYER.into(), annotation.layer().0.clone());
    for (attr, value) in annotation.style().iter() {
        map.insert(attr.name().into(), value.to_string());
    }
}

/// Read the attributes shared by every kind into `annotation`.
pub(crate) fn read_common(
    annotation: &mut Annotation,
    map: &AttributeMap,
) -> Result<(), AttributeError> {
    let position = point_attr(map, keys::POSITION)?;
    let size = size_attr(map, keys::SIZE)?;
    let rotation = number_attr(map, keys::ROTATION, 0.0)?;
    if let Some(layer) = map.get(keys::LAYER) {
        annotation.set_layer(LayerId(layer.clone()));
    }
    for attr in StyleAttr::ALL {
        if let Some(text) = map.get(attr.name()) {
            let value = attr
                .parse_value(text)
                .ok_or_else(|| invalid(attr.name(), text))?;
            annotation.update_style(attr, value);
        }
    }
    annotation.set_rotation(rotation);
    annotation.set_size(position, size.width, size.height);
    Ok(())
}

impl Annotation {
    /// Serialize to a flat attribute map.
    pub fn to_attributes(&self) -> AttributeMap {
        strategy_for(self.kind()).metadata(self)
    }

    /// Reconstruct from a flat attribute map.
    pub fn from_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
        let id = required(map, keys::ID)?;
        let id = id
            .parse::<u64>()
            .map(AnnotationId)
            .map_err(|_| invalid(keys::ID, id))?;
        let kind_name = required(map, keys::KIND)?;
        let kind = AnnotationKind::from_name(kind_name)
            .ok_or_else(|| AttributeError::UnknownKind(kind_name.to_string()))?;
        let mut annotation = Self::new(id, kind);
        strategy_for(kind).set_metadata(&mut annotation, map)?;
        Ok(annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EPSILON, PointFrame, Segment, StyleValue};

    #[test]
    fn arrow_metadata_round_trips() {
        let mut arrow = Annotation::new(AnnotationId(3), AnnotationKind::Arrow);
        arrow.set_segment(Segment::new((0.0, 0.0), (100.0, -50.0)));
        let map = arrow.to_attributes();
        assert_eq!(map.get(keys::TAIL).map(String::as_str), Some("0,0"));
        assert_eq!(map.get(keys::HEAD).map(String::as_str), Some("100,-50"));

        let back = Annotation::from_attributes(&map).expect("valid arrow metadata");
        let seg = back.segment().expect("arrow is a segment kind");
        let orig = arrow.segment().expect("arrow is a segment kind");
        assert_eq!(back.rotation(), arrow.rotation());
        assert!(seg.approx_eq(&orig, EPSILON));
        assert!(back.approx_eq(&arrow, EPSILON));
    }

    #[test]
    fn polyline_metadata_round_trips() {
        let mut poly = Annotation::new(AnnotationId(4), AnnotationKind::Polyline);
        poly.set_point_frame(PointFrame::from_absolute(&[
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 15.5),
        ]));
        poly.set_closed(true);
        poly.update_style(StyleAttr::FillOpacity, StyleValue::Number(0.25));
        let back = Annotation::from_attributes(&poly.to_attributes()).expect("valid metadata");
        assert_eq!(back, poly);
    }

    #[test]
    fn text_metadata_round_trips() {
        let mut text = Annotation::new(AnnotationId(9), AnnotationKind::Text);
        text.set_size(Point::new(10.0, 10.0), 80.0, 20.0);
        text.set_text(Some(String::from("line one\nline two")));
        let back = Annotation::from_attributes(&text.to_attributes()).expect("valid metadata");
        assert_eq!(back, text);
    }

    #[test]
    fn missing_required_attribute_is_reported() {
        let mut map = Annotation::new(AnnotationId(1), AnnotationKind::Circle).to_attributes();
        map.remove(keys::SIZE);
        assert_eq!(
            Annotation::from_attributes(&map),
            Err(AttributeError::Missing(keys::SIZE))
        );
    }

    #[test]
    fn unknown_kind_and_bad_values_are_reported() {
        let mut map = Annotation::new(AnnotationId(1), AnnotationKind::Circle).to_attributes();
        map.insert(keys::POSITION.into(), "1;2".into());
        assert!(matches!(
            Annotation::from_attributes(&map),
            Err(AttributeError::Invalid { .. })
        ));
        map.insert(keys::KIND.into(), "balloon".into());
        assert_eq!(
            Annotation::from_attributes(&map),
            Err(AttributeError::UnknownKind("balloon".into()))
        );
    }
}
