//! String-keyed property storage shared by slideshows, slides and elements.
//!
//! Lookups never fail: an unset key (or a value of another type) yields the
//! default of the requested type. Every `set` notifies the subscribed
//! listeners synchronously, which is how an external property editor keeps
//! itself in sync.

use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An RGBA colour.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

/// Width and height in canvas pixels.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// A position on the canvas, origin at the top-left corner.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A single property value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Color(Color),
    Size(Size),
    Point(Point),
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self { PropertyValue::String(v.to_string()) }
}
impl From<String> for PropertyValue {
    fn from(v: String) -> Self { PropertyValue::String(v) }
}
impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self { PropertyValue::Int(v) }
}
impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self { PropertyValue::Int(v as i64) }
}
impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self { PropertyValue::Float(v) }
}
impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self { PropertyValue::Bool(v) }
}
impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self { PropertyValue::Color(v) }
}
impl From<Size> for PropertyValue {
    fn from(v: Size) -> Self { PropertyValue::Size(v) }
}
impl From<Point> for PropertyValue {
    fn from(v: Point) -> Self { PropertyValue::Point(v) }
}

/// Handle returned by [`PropertyStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&str, &PropertyValue)>;

/// Key/value properties with change listeners.
#[derive(Default)]
pub struct PropertyStore {
    values: BTreeMap<String, PropertyValue>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyStore")
            .field("values", &self.values)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from persisted values. No listener is notified.
    pub fn from_values(values: BTreeMap<String, PropertyValue>) -> Self {
        Self { values, ..Self::default() }
    }

    pub fn values(&self) -> &BTreeMap<String, PropertyValue> {
        &self.values
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Stores `value` under `key` and notifies every listener.
    pub fn set(&mut self, key: &str, value: impl Into<PropertyValue>) {
        let value = value.into();
        trace!("Property '{}' set to {:?}", key, value);
        for (_, listener) in self.listeners.iter_mut() {
            listener(key, &value);
        }
        self.values.insert(key.to_string(), value);
    }

    /// Stores `value` only when `key` has no value yet. Listeners are not notified.
    pub fn set_default(&mut self, key: &str, value: impl Into<PropertyValue>) {
        self.values.entry(key.to_string()).or_insert_with(|| value.into());
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&str, &PropertyValue) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if no listener was registered under `id`.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.listeners.len()
    }

    pub fn string(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(PropertyValue::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn int(&self, key: &str) -> i64 {
        self.int_or(key, 0)
    }

    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(PropertyValue::Int(v)) => *v,
            Some(PropertyValue::Float(v)) => *v as i64,
            Some(PropertyValue::Bool(v)) => *v as i64,
            _ => default,
        }
    }

    pub fn float(&self, key: &str) -> f64 {
        match self.values.get(key) {
            Some(PropertyValue::Float(v)) => *v,
            Some(PropertyValue::Int(v)) => *v as f64,
            _ => 0.0,
        }
    }

    pub fn bool(&self, key: &str) -> bool {
        self.bool_or(key, false)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(PropertyValue::Bool(v)) => *v,
            Some(PropertyValue::Int(v)) => *v != 0,
            _ => default,
        }
    }

    pub fn color(&self, key: &str) -> Color {
        match self.values.get(key) {
            Some(PropertyValue::Color(c)) => *c,
            Some(PropertyValue::String(s)) => Color::from_hex(s).unwrap_or(Color::BLACK),
            _ => Color::BLACK,
        }
    }

    /// Like [`PropertyStore::color`], but `None` when the key is unset.
    pub fn optional_color(&self, key: &str) -> Option<Color> {
        self.values.get(key).map(|_| self.color(key))
    }

    pub fn size(&self, key: &str) -> Size {
        match self.values.get(key) {
            Some(PropertyValue::Size(s)) => *s,
            _ => Size::default(),
        }
    }

    pub fn point(&self, key: &str) -> Point {
        match self.values.get(key) {
            Some(PropertyValue::Point(p)) => *p,
            _ => Point::default(),
        }
    }
}
