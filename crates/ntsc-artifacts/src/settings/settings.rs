//! Introspectable description of every knob in [`NtscConfig`](super::NtscConfig). Front-ends walk the descriptor
//! list to build their controls, and the same list drives reading and writing JSON presets.

use std::{collections::HashMap, error::Error, fmt::Display, ops::RangeInclusive, slice};

use num_traits::{FromPrimitive, ToPrimitive};
pub use sval;
pub use sval_json;
use tinyjson::{InnerAsRef, JsonParseError, JsonValue};

/// Discriminant of a settings enum, as stored in presets.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnumValue(pub u32);

/// A setting value with its type erased.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnySetting {
    Enum(EnumValue),
    Int(i32),
    Float(f64),
    Bool(bool),
    Seed(u32),
}

impl AnySetting {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Enum(_) => "enum",
            Self::Int(_) => "i32",
            Self::Float(_) => "f64",
            Self::Bool(_) => "bool",
            Self::Seed(_) => "u32",
        }
    }
}

/// Recover a concrete value from an [`AnySetting`], if the variant matches.
pub trait Downcast: Sized {
    fn downcast(value: &AnySetting) -> Option<Self>;
}

macro_rules! setting_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Downcast for $ty {
                fn downcast(value: &AnySetting) -> Option<Self> {
                    match value {
                        AnySetting::$variant(inner) => Some(*inner),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for AnySetting {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

setting_value!(
    i32 => Int,
    u32 => Seed,
    f64 => Float,
    bool => Bool,
    EnumValue => Enum,
);

/// Marker for enums that are stored in settings as their integer discriminant.
pub trait SettingsEnum {}

impl<T: SettingsEnum + FromPrimitive> Downcast for T {
    fn downcast(value: &AnySetting) -> Option<Self> {
        EnumValue::downcast(value).and_then(|e| T::from_u32(e.0))
    }
}

impl<T: SettingsEnum + ToPrimitive> From<T> for AnySetting {
    fn from(value: T) -> Self {
        Self::Enum(EnumValue(value.to_u32().unwrap_or_default()))
    }
}

/// Stable handle to one field of a settings struct. Once published, an id and its name are never reused, since
/// presets refer to settings by name.
#[derive(Debug, Clone)]
pub struct SettingID<T: Settings> {
    pub id: u32,
    pub name: &'static str,
    pub get: fn(settings: &T) -> AnySetting,
    pub set: fn(settings: &mut T, value: AnySetting) -> Result<(), GetSetFieldError>,
}

// Manual impls: deriving would demand `T: PartialEq`/`T: Hash`.
impl<T: Settings> PartialEq for SettingID<T> {
    fn eq(&self, other: &Self) -> bool {
        (self.id, self.name) == (other.id, other.name)
    }
}

impl<T: Settings> Eq for SettingID<T> {}

impl<T: Settings> std::hash::Hash for SettingID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.id, self.name).hash(state);
    }
}

impl<T: Settings> SettingID<T> {
    pub const fn new(
        id: u32,
        name: &'static str,
        get: fn(settings: &T) -> AnySetting,
        set: fn(settings: &mut T, value: AnySetting) -> Result<(), GetSetFieldError>,
    ) -> Self {
        Self { id, name, get, set }
    }
}

/// Build a [`SettingID`] whose accessors read and write the named field.
#[macro_export]
macro_rules! setting_id {
    ($id:expr, $name:expr, $($field:ident).+) => {
        $crate::settings::SettingID::new(
            $id,
            $name,
            |settings| settings.$($field).+.into(),
            |settings, value| {
                settings.$($field).+ = $crate::settings::Downcast::downcast(&value).ok_or_else(|| {
                    $crate::settings::GetSetFieldError::TypeMismatch {
                        actual_type: value.type_name(),
                        requested_type: std::any::type_name_of_val(&settings.$($field).+),
                    }
                })?;
                Ok(())
            },
        )
    };
}

/// One choice of a [`SettingKind::Enumeration`].
#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: &'static str,
    pub description: Option<&'static str>,
    pub index: u32,
}

#[derive(Debug, Clone)]
pub enum SettingKind<T: Settings> {
    /// One of a fixed list of options, in display order.
    Enumeration { options: Vec<MenuItem> },
    /// Integer within an inclusive range.
    IntRange { range: RangeInclusive<i32> },
    /// Float within an inclusive range.
    FloatRange { range: RangeInclusive<f64> },
    Boolean,
    /// Any 32-bit unsigned value.
    Seed,
    /// A boolean that switches a set of child settings on or off.
    Group { children: Vec<SettingDescriptor<T>> },
}

#[derive(Clone, Copy, Debug)]
pub enum GetSetFieldError {
    TypeMismatch {
        actual_type: &'static str,
        requested_type: &'static str,
    },
    NoSuchID(&'static str),
}

impl Display for GetSetFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch {
                actual_type,
                requested_type,
            } => write!(
                f,
                "setting holds a {actual_type}, but a {requested_type} was requested"
            ),
            Self::NoSuchID(id) => write!(f, "no setting named {id}"),
        }
    }
}

impl Error for GetSetFieldError {}

pub trait Settings: Default {
    fn get_field<T: 'static + Downcast>(
        &self,
        id: &SettingID<Self>,
    ) -> Result<T, GetSetFieldError> {
        let value = (id.get)(self);
        T::downcast(&value).ok_or(GetSetFieldError::TypeMismatch {
            actual_type: value.type_name(),
            requested_type: std::any::type_name::<T>(),
        })
    }

    fn set_field<T: 'static + Into<AnySetting>>(
        &mut self,
        id: &SettingID<Self>,
        value: T,
    ) -> Result<(), GetSetFieldError> {
        (id.set)(self, value.into())
    }

    fn setting_descriptors() -> Box<[SettingDescriptor<Self>]>;
}

/// Label, optional tooltip and id of a setting, plus its kind-specific data.
#[derive(Debug, Clone)]
pub struct SettingDescriptor<T: Settings> {
    pub label: &'static str,
    pub description: Option<&'static str>,
    pub kind: SettingKind<T>,
    pub id: SettingID<T>,
}

#[derive(Debug)]
pub enum ParseSettingsError {
    InvalidJSON(JsonParseError),
    MissingField { field: &'static str },
    UnsupportedVersion { version: f64 },
    InvalidSettingType { key: String, expected: &'static str },
    GetSetField(GetSetFieldError),
}

impl Display for ParseSettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJSON(e) => write!(f, "invalid JSON: {e}"),
            Self::MissingField { field } => write!(f, "missing field \"{field}\""),
            Self::UnsupportedVersion { version } => {
                write!(f, "unsupported settings version {version}")
            }
            Self::InvalidSettingType { key, expected } => {
                write!(f, "setting \"{key}\" should be of type {expected}")
            }
            Self::GetSetField(e) => e.fmt(f),
        }
    }
}

impl Error for ParseSettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::GetSetField(e) => Some(e),
            _ => None,
        }
    }
}

impl From<JsonParseError> for ParseSettingsError {
    fn from(err: JsonParseError) -> Self {
        Self::InvalidJSON(err)
    }
}

impl From<GetSetFieldError> for ParseSettingsError {
    fn from(err: GetSetFieldError) -> Self {
        Self::GetSetField(err)
    }
}

/// Typed lookup into a parsed JSON object. Absent keys are `Ok(None)`; present keys of the wrong type are errors.
pub(super) trait GetAndExpect {
    fn get_and_expect<T: InnerAsRef + Clone>(
        &self,
        key: &str,
    ) -> Result<Option<T>, ParseSettingsError>;
}

impl GetAndExpect for HashMap<String, JsonValue> {
    fn get_and_expect<T: InnerAsRef + Clone>(
        &self,
        key: &str,
    ) -> Result<Option<T>, ParseSettingsError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value
            .get::<T>()
            .cloned()
            .map(Some)
            .ok_or_else(|| ParseSettingsError::InvalidSettingType {
                key: key.to_owned(),
                expected: std::any::type_name::<T>(),
            })
    }
}

/// The full, nested list of settings for a settings struct.
#[derive(Debug, Clone)]
pub struct SettingsList<T: Settings> {
    pub setting_descriptors: Box<[SettingDescriptor<T>]>,
}

impl<T: Settings> Default for SettingsList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Streams one settings struct as a flat JSON object, followed by the format version.
struct JsonPreset<'a, T: Settings> {
    settings: &'a T,
    list: &'a SettingsList<T>,
}

fn stream_str<'sval, S: sval::Stream<'sval> + ?Sized>(
    stream: &mut S,
    text: &'static str,
) -> sval::Result {
    stream.text_begin(Some(text.len()))?;
    stream.text_fragment(text)?;
    stream.text_end()
}

impl<T: Settings> sval::Value for JsonPreset<'_, T> {
    fn stream<'sval, S: sval::Stream<'sval> + ?Sized>(&'sval self, stream: &mut S) -> sval::Result {
        fn read<U: 'static + Downcast, T: Settings>(
            settings: &T,
            id: &SettingID<T>,
        ) -> Result<U, sval::Error> {
            settings.get_field::<U>(id).map_err(|_| sval::Error::new())
        }

        stream.map_begin(None)?;
        for descriptor in self.list.all_descriptors() {
            let id = &descriptor.id;
            stream.map_key_begin()?;
            stream_str(stream, id.name)?;
            stream.map_key_end()?;

            stream.map_value_begin()?;
            match descriptor.kind {
                SettingKind::Enumeration { .. } => {
                    stream.u32(read::<EnumValue, T>(self.settings, id)?.0)?
                }
                SettingKind::FloatRange { .. } => stream.f64(read(self.settings, id)?)?,
                SettingKind::IntRange { .. } => stream.i32(read(self.settings, id)?)?,
                SettingKind::Seed => stream.u32(read(self.settings, id)?)?,
                SettingKind::Boolean | SettingKind::Group { .. } => {
                    stream.bool(read(self.settings, id)?)?
                }
            };
            stream.map_value_end()?;
        }

        stream.map_key_begin()?;
        stream_str(stream, "version")?;
        stream.map_key_end()?;
        stream.map_value_begin()?;
        stream.u32(1)?;
        stream.map_value_end()?;

        stream.map_end()
    }
}

impl<T: Settings> SettingsList<T> {
    pub fn new() -> Self {
        Self {
            setting_descriptors: T::setting_descriptors(),
        }
    }

    /// Write `settings` as a version 1 JSON preset.
    pub fn write_json(
        &self,
        settings: &T,
        dest: impl std::fmt::Write,
    ) -> Result<(), sval_json::Error> {
        sval_json::stream_to_fmt_write(
            dest,
            JsonPreset {
                settings,
                list: self,
            },
        )
    }

    pub fn to_json_string(&self, settings: &T) -> Result<String, sval_json::Error> {
        let mut out = String::new();
        self.write_json(settings, &mut out)?;
        Ok(out)
    }

    /// Apply every key of `json` that names a setting in `descriptors` (recursing into groups) to `settings`. Numbers
    /// are clamped into the setting's range, and enum indices that name no option become the setting's default. Keys
    /// that are absent leave the current value alone.
    pub(super) fn settings_from_json(
        json: &HashMap<String, JsonValue>,
        descriptors: &[SettingDescriptor<T>],
        settings: &mut T,
    ) -> Result<(), ParseSettingsError> {
        for descriptor in descriptors {
            let (id, key) = (&descriptor.id, descriptor.id.name);
            match &descriptor.kind {
                SettingKind::Enumeration { options } => {
                    if let Some(n) = json.get_and_expect::<f64>(key)? {
                        let index = n as u32;
                        let known = n >= 0.0
                            && n.fract() == 0.0
                            && options.iter().any(|option| option.index == index);
                        // Unknown choices become the default.
                        let value = if known {
                            AnySetting::Enum(EnumValue(index))
                        } else {
                            (id.get)(&T::default())
                        };
                        (id.set)(settings, value)?;
                    }
                }
                SettingKind::FloatRange { range } => {
                    if let Some(n) = json.get_and_expect::<f64>(key)? {
                        settings.set_field(id, n.clamp(*range.start(), *range.end()))?;
                    }
                }
                SettingKind::IntRange { range } => {
                    if let Some(n) = json.get_and_expect::<f64>(key)? {
                        settings.set_field(id, (n as i32).clamp(*range.start(), *range.end()))?;
                    }
                }
                SettingKind::Seed => {
                    if let Some(n) = json.get_and_expect::<f64>(key)? {
                        settings.set_field(id, n as u32)?;
                    }
                }
                SettingKind::Boolean => {
                    if let Some(b) = json.get_and_expect::<bool>(key)? {
                        settings.set_field(id, b)?;
                    }
                }
                SettingKind::Group { children } => {
                    if let Some(b) = json.get_and_expect::<bool>(key)? {
                        settings.set_field(id, b)?;
                    }
                    Self::settings_from_json(json, children, settings)?;
                }
            }
        }

        Ok(())
    }

    /// Find a descriptor, nested or not, by its stable name.
    pub fn descriptor_by_name(&self, name: &str) -> Option<&SettingDescriptor<T>> {
        self.all_descriptors().find(|descriptor| descriptor.id.name == name)
    }

    /// Every descriptor in depth-first order. A group is yielded before its children.
    pub fn all_descriptors(&self) -> SettingDescriptors<'_, T> {
        SettingDescriptors {
            stack: vec![self.setting_descriptors.iter()],
        }
    }
}

pub struct SettingDescriptors<'a, T: Settings> {
    stack: Vec<slice::Iter<'a, SettingDescriptor<T>>>,
}

impl<'a, T: Settings> Iterator for SettingDescriptors<'a, T> {
    type Item = &'a SettingDescriptor<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(descriptor) = self.stack.last_mut()?.next() else {
                self.stack.pop();
                continue;
            };
            if let SettingKind::Group { children } = &descriptor.kind {
                self.stack.push(children.iter());
            }
            return Some(descriptor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{NtscConfig, RingingAlgorithm, setting_id};

    #[test]
    fn groups_come_before_their_children() {
        let list = SettingsList::<NtscConfig>::new();
        let names = list
            .all_descriptors()
            .map(|d| d.id.name)
            .collect::<Vec<_>>();
        let group = names.iter().position(|n| *n == "emulating_vhs").unwrap();
        let child = names
            .iter()
            .position(|n| *n == "output_vhs_tape_speed")
            .unwrap();
        assert_eq!(child, group + 1);
        assert_eq!(names.len(), list.all_descriptors().count());
    }

    #[test]
    fn finds_nested_descriptor() {
        let list = SettingsList::<NtscConfig>::new();
        let descriptor = list.descriptor_by_name("head_switching_speed").unwrap();
        assert_eq!(descriptor.id, setting_id::HEAD_SWITCHING_SPEED);
        assert!(matches!(descriptor.kind, SettingKind::IntRange { .. }));
        assert!(list.descriptor_by_name("no_such_setting").is_none());
    }

    #[test]
    fn enums_round_trip_through_any_setting() {
        let value = AnySetting::from(RingingAlgorithm::Spectral);
        assert_eq!(value, AnySetting::Enum(EnumValue(1)));
        assert_eq!(
            RingingAlgorithm::downcast(&value),
            Some(RingingAlgorithm::Spectral)
        );
        assert_eq!(RingingAlgorithm::downcast(&AnySetting::Enum(EnumValue(9))), None);
        assert_eq!(bool::downcast(&value), None);
    }

    #[test]
    fn wrong_json_type_is_reported_with_key() {
        let json = r#"{"a": 1, "b": true}"#.parse::<JsonValue>().unwrap();
        let map = json.get::<HashMap<_, _>>().unwrap();
        assert_eq!(map.get_and_expect::<f64>("a").unwrap(), Some(1.0));
        assert_eq!(map.get_and_expect::<f64>("missing").unwrap(), None);
        match map.get_and_expect::<f64>("b") {
            Err(ParseSettingsError::InvalidSettingType { key, .. }) => assert_eq!(key, "b"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
