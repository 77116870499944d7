// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual style attributes and the fixed attribute set each kind accepts.

use core::fmt;
use std::collections::BTreeMap;

use crate::AnnotationKind;

/// An sRGB color with 8-bit channels.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::opaque(0xff, 0xff, 0xff);
    /// Opaque red, the default markup stroke.
    pub const RED: Self = Self::opaque(0xff, 0, 0);
    /// Opaque yellow, the default highlighter stroke.
    pub const YELLOW: Self = Self::opaque(0xff, 0xff, 0);

    /// Build an opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::opaque(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xff {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

/// A named visual attribute.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum StyleAttr {
    /// Outline color.
    StrokeColor,
    /// Outline opacity in `0..=1`.
    StrokeOpacity,
    /// Outline width in annotation units.
    StrokeWidth,
    /// Interior color.
    FillColor,
    /// Interior opacity in `0..=1`.
    FillOpacity,
    /// Font family name.
    FontFamily,
    /// Font size in annotation units.
    FontSize,
    /// `normal` or `italic`.
    FontStyle,
    /// `normal` or `bold`.
    FontWeight,
}

impl StyleAttr {
    /// Every attribute, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::StrokeColor,
        Self::StrokeOpacity,
        Self::StrokeWidth,
        Self::FillColor,
        Self::FillOpacity,
        Self::FontFamily,
        Self::FontSize,
        Self::FontStyle,
        Self::FontWeight,
    ];

    /// Metadata key of this attribute.
    pub const fn name(self) -> &'static str {
        match self {
            Self::StrokeColor => "stroke-color",
            Self::StrokeOpacity => "stroke-opacity",
            Self::StrokeWidth => "stroke-width",
            Self::FillColor => "fill-color",
            Self::FillOpacity => "fill-opacity",
            Self::FontFamily => "font-family",
            Self::FontSize => "font-size",
            Self::FontStyle => "font-style",
            Self::FontWeight => "font-weight",
        }
    }

    /// Parse a metadata key.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }

    /// The mask bit of this attribute.
    pub const fn mask(self) -> StyleMask {
        match self {
            Self::StrokeColor => StyleMask::STROKE_COLOR,
            Self::StrokeOpacity => StyleMask::STROKE_OPACITY,
            Self::StrokeWidth => StyleMask::STROKE_WIDTH,
            Self::FillColor => StyleMask::FILL_COLOR,
            Self::FillOpacity => StyleMask::FILL_OPACITY,
            Self::FontFamily => StyleMask::FONT_FAMILY,
            Self::FontSize => StyleMask::FONT_SIZE,
            Self::FontStyle => StyleMask::FONT_STYLE,
            Self::FontWeight => StyleMask::FONT_WEIGHT,
        }
    }

    /// Parse the textual form of a value for this attribute.
    pub fn parse_value(self, text: &str) -> Option<StyleValue> {
        match self {
            Self::StrokeColor | Self::FillColor => Rgba::from_hex(text).map(StyleValue::Color),
            Self::StrokeOpacity | Self::StrokeWidth | Self::FillOpacity | Self::FontSize => {
                text.parse::<f64>().ok().map(StyleValue::Number)
            }
            Self::FontFamily | Self::FontStyle | Self::FontWeight => {
                Some(StyleValue::Text(text.to_string()))
            }
        }
    }
}

bitflags::bitflags! {
    /// A set of [`StyleAttr`]s.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StyleMask: u16 {
        /// [`StyleAttr::StrokeColor`].
        const STROKE_COLOR = 1 << 0;
        /// [`StyleAttr::StrokeOpacity`].
        const STROKE_OPACITY = 1 << 1;
        /// [`StyleAttr::StrokeWidth`].
        const STROKE_WIDTH = 1 << 2;
        /// [`StyleAttr::FillColor`].
        const FILL_COLOR = 1 << 3;
        /// [`StyleAttr::FillOpacity`].
        const FILL_OPACITY = 1 << 4;
        /// [`StyleAttr::FontFamily`].
        const FONT_FAMILY = 1 << 5;
        /// [`StyleAttr::FontSize`].
        const FONT_SIZE = 1 << 6;
        /// [`StyleAttr::FontStyle`].
        const FONT_STYLE = 1 << 7;
        /// [`StyleAttr::FontWeight`].
        const FONT_WEIGHT = 1 << 8;

        /// All stroke attributes.
        const STROKE = Self::STROKE_COLOR.bits() | Self::STROKE_OPACITY.bits() | Self::STROKE_WIDTH.bits();
        /// All fill attributes.
        const FILL = Self::FILL_COLOR.bits() | Self::FILL_OPACITY.bits();
        /// All font attributes.
        const FONT = Self::FONT_FAMILY.bits() | Self::FONT_SIZE.bits() | Self::FONT_STYLE.bits() | Self::FONT_WEIGHT.bits();
    }
}

impl AnnotationKind {
    /// The fixed set of style attributes this kind accepts.
    pub const fn style_mask(self) -> StyleMask {
        match self {
            Self::Arrow | Self::Freehand | Self::Highlight => StyleMask::STROKE,
            Self::Circle | Self::Cloud | Self::Polyline | Self::Polycloud | Self::Rectangle => {
                StyleMask::STROKE.union(StyleMask::FILL)
            }
            Self::Dimension => StyleMask::STROKE.union(StyleMask::FONT),
            Self::Text | Self::Stamp | Self::Callout => StyleMask::STROKE
                .union(StyleMask::FILL)
                .union(StyleMask::FONT),
        }
    }
}

/// Value of a style attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    /// A color.
    Color(Rgba),
    /// A number (width, size, or opacity).
    Number(f64),
    /// A textual token (font family, style, or weight).
    Text(String),
}

impl StyleValue {
    /// The numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The color payload, if any.
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => (a - b).abs() <= eps,
            _ => self == other,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(c) => c.fmt(f),
            Self::Number(n) => n.fmt(f),
            Self::Text(t) => f.write_str(t),
        }
    }
}

/// Mapping of style attributes to values, closed over the owning kind's [`StyleMask`].
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    mask: StyleMask,
    values: BTreeMap<StyleAttr, StyleValue>,
}

impl Style {
    /// An empty style accepting the attributes in `mask`.
    pub fn empty(mask: StyleMask) -> Self {
        Self {
            mask,
            values: BTreeMap::new(),
        }
    }

    /// The default style of `kind`.
    pub fn kind_default(kind: AnnotationKind) -> Self {
        let mut style = Self::empty(kind.style_mask());
        let stroke = match kind {
            AnnotationKind::Highlight => Rgba::YELLOW,
            AnnotationKind::Text => Rgba::BLACK,
            _ => Rgba::RED,
        };
        let width = match kind {
            AnnotationKind::Highlight => 12.0,
            AnnotationKind::Text => 0.0,
            _ => 2.0,
        };
        let opacity = if kind == AnnotationKind::Highlight { 0.4 } else { 1.0 };
        style.set(StyleAttr::StrokeColor, StyleValue::Color(stroke));
        style.set(StyleAttr::StrokeWidth, StyleValue::Number(width));
        style.set(StyleAttr::StrokeOpacity, StyleValue::Number(opacity));
        style.set(StyleAttr::FillColor, StyleValue::Color(Rgba::WHITE));
        style.set(StyleAttr::FillOpacity, StyleValue::Number(0.0));
        style.set(
            StyleAttr::FontFamily,
            StyleValue::Text(String::from("Arial")),
        );
        style.set(StyleAttr::FontSize, StyleValue::Number(16.0));
        style.set(StyleAttr::FontStyle, StyleValue::Text(String::from("normal")));
        style.set(StyleAttr::FontWeight, StyleValue::Text(String::from("normal")));
        style
    }

    /// The attributes this style accepts.
    pub fn mask(&self) -> StyleMask {
        self.mask
    }

    /// Set `attr` to `value`.
    ///
    /// Returns `false` and leaves the style untouched when `attr` is outside the mask.
    pub fn set(&mut self, attr: StyleAttr, value: StyleValue) -> bool {
        if !self.mask.contains(attr.mask()) {
            return false;
        }
        self.values.insert(attr, value);
        true
    }

    /// The value of `attr`, if set.
    pub fn get(&self, attr: StyleAttr) -> Option<&StyleValue> {
        self.values.get(&attr)
    }

    /// Stroke width, or zero when unset.
    pub fn stroke_width(&self) -> f64 {
        self.get(StyleAttr::StrokeWidth)
            .and_then(StyleValue::as_number)
            .unwrap_or(0.0)
    }

    /// Copy every attribute of `other` that this style accepts.
    pub fn merge_from(&mut self, other: &Self) {
        for (attr, value) in &other.values {
            self.set(*attr, value.clone());
        }
    }

    /// Iterate attributes in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleAttr, &StyleValue)> {
        self.values.iter().map(|(attr, value)| (*attr, value))
    }

    /// Compare two styles, allowing `eps` slack on numeric values.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.values.len() == other.values.len()
            && self.values.iter().all(|(attr, value)| {
                other
                    .values
                    .get(attr)
                    .is_some_and(|o| value.approx_eq(o, eps))
            })
    }
}
