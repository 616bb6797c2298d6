//! Shared types for scopelog
//!
//! This crate contains the severity model, filter targets and filter state
//! used across the engine and the terminal panel.

use ratatui::style::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

// ============================================================================
// Severity Types
// ============================================================================

/// Log severity, one bit per level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warn,
    Info,
    Debug,
}

impl Severity {
    /// Canonical display and check order
    pub const ALL_LEVELS: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    /// Bit weight of this level inside a [`SeverityMask`]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Error => 1,
            Self::Warn => 2,
            Self::Info => 4,
            Self::Debug => 8,
        }
    }

    /// Position in [`Severity::ALL_LEVELS`]
    pub const fn index(self) -> usize {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warn => 2,
            Self::Error => 3,
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warn => "WRN",
            Self::Error => "ERR",
        }
    }

    /// Lowercase name, as accepted by [`FromStr`]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Text colour applied to the argument segment of a decorated line
    pub fn text_color(&self) -> Rgb {
        match self {
            Self::Debug => Rgb::new(0x88, 0x88, 0x88),
            Self::Info => Rgb::new(0x00, 0x00, 0x00),
            Self::Warn => Rgb::new(0xcc, 0x8f, 0x27),
            Self::Error => Rgb::new(0xff, 0x00, 0x00),
        }
    }

    /// Get display color for this level in the terminal panel
    pub fn color(&self) -> Color {
        match self {
            Self::Debug => Color::DarkGray,
            Self::Info => Color::Gray,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a severity name is not recognised
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSeverityError(pub String);

impl fmt::Display for ParseSeverityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown severity '{}', expected one of: debug, info, warn, error",
            self.0
        )
    }
}

impl std::error::Error for ParseSeverityError {}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Ok(Self::Error),
            "warn" | "warning" | "wrn" => Ok(Self::Warn),
            "info" | "inf" => Ok(Self::Info),
            "debug" | "dbg" => Ok(Self::Debug),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// A combination of severity bits
///
/// Any value built through the public API is a subset of [`SeverityMask::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SeverityMask(u8);

impl SeverityMask {
    pub const NONE: SeverityMask = SeverityMask(0);
    pub const ERROR: SeverityMask = SeverityMask(Severity::Error.bit());
    pub const WARN: SeverityMask = SeverityMask(Severity::Warn.bit());
    pub const INFO: SeverityMask = SeverityMask(Severity::Info.bit());
    pub const DEBUG: SeverityMask = SeverityMask(Severity::Debug.bit());
    pub const ALL: SeverityMask = SeverityMask(
        Severity::Error.bit() | Severity::Warn.bit() | Severity::Info.bit() | Severity::Debug.bit(),
    );

    /// Build a mask from raw bits, rejecting anything outside [`SeverityMask::ALL`]
    pub fn from_bits(bits: u8) -> Option<Self> {
        if SeverityMask(bits).is_valid() {
            Some(SeverityMask(bits))
        } else {
            None
        }
    }

    /// Subset of [`SeverityMask::ALL`]
    pub const fn is_valid(self) -> bool {
        Self::ALL.has_flag(self)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `(mask & flags) == flags`
    pub const fn has_flag(self, flags: SeverityMask) -> bool {
        self.0 & flags.0 == flags.0
    }

    pub const fn contains(self, severity: Severity) -> bool {
        self.has_flag(SeverityMask(severity.bit()))
    }

    pub const fn with(self, severity: Severity) -> Self {
        SeverityMask(self.0 | severity.bit())
    }

    pub const fn without(self, severity: Severity) -> Self {
        SeverityMask(self.0 & !severity.bit())
    }

    /// Flip a single level, leaving the others alone
    pub const fn toggled(self, severity: Severity) -> Self {
        SeverityMask(self.0 ^ severity.bit())
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_all(self) -> bool {
        self == Self::ALL
    }

    /// Levels present in this mask, in display order
    pub fn levels(self) -> impl Iterator<Item = Severity> {
        Severity::ALL_LEVELS
            .into_iter()
            .filter(move |level| self.contains(*level))
    }
}

impl From<Severity> for SeverityMask {
    fn from(severity: Severity) -> Self {
        SeverityMask(severity.bit())
    }
}

impl BitOr for SeverityMask {
    type Output = SeverityMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        SeverityMask(self.0 | rhs.0)
    }
}

impl BitOr<Severity> for SeverityMask {
    type Output = SeverityMask;

    fn bitor(self, rhs: Severity) -> Self::Output {
        self.with(rhs)
    }
}

impl fmt::Display for SeverityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        if self.is_all() {
            return f.write_str("all");
        }
        let names: Vec<&str> = self.levels().map(|level| level.name()).collect();
        f.write_str(&names.join("|"))
    }
}

impl Serialize for SeverityMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for SeverityMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bits(u64),
            Name(String),
            Names(Vec<String>),
        }

        let mask = match Repr::deserialize(deserializer)? {
            Repr::Bits(bits) => u8::try_from(bits).ok().and_then(SeverityMask::from_bits),
            Repr::Name(name) => parse_mask_names(std::iter::once(name.as_str())),
            Repr::Names(names) => parse_mask_names(names.iter().map(String::as_str)),
        };
        mask.ok_or_else(|| serde::de::Error::custom("invalid severity mask"))
    }
}

/// Parse "all", "none" or a list of severity names into a mask
fn parse_mask_names<'a>(names: impl Iterator<Item = &'a str>) -> Option<SeverityMask> {
    let mut mask = SeverityMask::NONE;
    for name in names {
        match name.trim().to_lowercase().as_str() {
            "all" => mask = mask | SeverityMask::ALL,
            "none" => {}
            other => mask = mask.with(other.parse().ok()?),
        }
    }
    Some(mask)
}

impl FromStr for SeverityMask {
    type Err = ParseSeverityError;

    /// Accepts raw bits ("3"), "all", "none" or names joined by `,` or `|`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(bits) = s.trim().parse::<u8>() {
            return SeverityMask::from_bits(bits).ok_or_else(|| ParseSeverityError(s.to_string()));
        }
        parse_mask_names(s.split([',', '|'])).ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

// ============================================================================
// Toggle Targets
// ============================================================================

/// Row selector for a toggle: one namespace or the whole column
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Namespace(String),
    AllNamespaces,
}

impl Target {
    pub fn namespace(name: impl Into<String>) -> Self {
        Self::Namespace(name.into())
    }
}

/// Column selector for a toggle: one level or the whole row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeveritySelector {
    Level(Severity),
    All,
}

impl From<Severity> for SeveritySelector {
    fn from(severity: Severity) -> Self {
        Self::Level(severity)
    }
}

// ============================================================================
// Filter State
// ============================================================================

/// Current severity mask per known namespace
///
/// Serializes as a flat JSON object `{ "namespace": bits }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    masks: BTreeMap<String, SeverityMask>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded mask for a namespace, if any
    pub fn get(&self, namespace: &str) -> Option<SeverityMask> {
        self.masks.get(namespace).copied()
    }

    /// Recorded mask, or NONE for unknown namespaces
    pub fn mask(&self, namespace: &str) -> SeverityMask {
        self.get(namespace).unwrap_or(SeverityMask::NONE)
    }

    pub fn set(&mut self, namespace: impl Into<String>, mask: SeverityMask) {
        self.masks.insert(namespace.into(), mask);
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.masks.contains_key(namespace)
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SeverityMask)> {
        self.masks.iter().map(|(ns, mask)| (ns.as_str(), *mask))
    }

    /// Iterate masks mutably (used by column and global toggles)
    pub fn masks_mut(&mut self) -> impl Iterator<Item = &mut SeverityMask> {
        self.masks.values_mut()
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Change notifications published by the engine; none carry a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notification {
    FilterStateChanged,
    ShowPanel,
    HidePanel,
}

// ============================================================================
// Colours
// ============================================================================

/// 24-bit colour used for namespace and severity decoration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex form, e.g. `#cc8f27`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb.r, rgb.g, rgb.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_union_of_levels() {
        let union = Severity::ALL_LEVELS
            .into_iter()
            .fold(SeverityMask::NONE, |acc, level| acc | level);
        assert_eq!(union, SeverityMask::ALL);
        assert_eq!(SeverityMask::ALL.bits(), 15);
    }

    #[test]
    fn test_has_flag() {
        let mask = SeverityMask::ERROR | SeverityMask::WARN;
        assert!(mask.has_flag(SeverityMask::ERROR));
        assert!(mask.has_flag(SeverityMask::ERROR | SeverityMask::WARN));
        assert!(!mask.has_flag(SeverityMask::ALL));
        assert!(mask.has_flag(SeverityMask::NONE));
    }

    #[test]
    fn test_from_bits_rejects_out_of_range() {
        assert_eq!(SeverityMask::from_bits(15), Some(SeverityMask::ALL));
        assert_eq!(SeverityMask::from_bits(0), Some(SeverityMask::NONE));
        assert_eq!(SeverityMask::from_bits(16), None);
        assert_eq!(SeverityMask::from_bits(99), None);
    }

    #[test]
    fn test_toggle_is_self_inverse() {
        let mask = SeverityMask::ERROR | SeverityMask::INFO;
        for level in Severity::ALL_LEVELS {
            assert_eq!(mask.toggled(level).toggled(level), mask);
        }
    }

    #[test]
    fn test_severity_parse_aliases() {
        assert_eq!("ERR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warn));
        assert_eq!("dbg".parse::<Severity>(), Ok(Severity::Debug));
        assert!("trace".parse::<Severity>().is_err());
    }

    #[test]
    fn test_mask_from_str() {
        assert_eq!("3".parse::<SeverityMask>(), Ok(SeverityMask::from_bits(3).unwrap()));
        assert_eq!("all".parse::<SeverityMask>(), Ok(SeverityMask::ALL));
        assert_eq!(
            "error|warn".parse::<SeverityMask>(),
            Ok(SeverityMask::ERROR | SeverityMask::WARN)
        );
        assert!("42".parse::<SeverityMask>().is_err());
    }

    #[test]
    fn test_mask_deserialize_forms() {
        let bits: SeverityMask = serde_json::from_str("5").unwrap();
        assert_eq!(bits, SeverityMask::ERROR | SeverityMask::INFO);

        let names: SeverityMask = serde_json::from_str(r#"["warn", "debug"]"#).unwrap();
        assert_eq!(names, SeverityMask::WARN | SeverityMask::DEBUG);

        assert!(serde_json::from_str::<SeverityMask>("99").is_err());
    }

    #[test]
    fn test_filter_state_serializes_flat() {
        let mut state = FilterState::new();
        state.set("net", SeverityMask::from_bits(3).unwrap());
        state.set("ui", SeverityMask::ERROR);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"net":3,"ui":1}"#);
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Severity::Warn.text_color().hex(), "#cc8f27");
        assert_eq!(Severity::Debug.text_color().hex(), "#888888");
    }
}
