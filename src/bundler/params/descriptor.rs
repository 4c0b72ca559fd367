//! Typed parameter descriptors and the erased values they resolve to.

use super::{ParamStore, parse};
use crate::bundler::error::{Error, Result};
use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::PathBuf,
    sync::Arc,
};

/// Semantic type tag of a parameter value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ValueType {
    String,
    Boolean,
    Integer,
    Path,
    List,
    Map,
    Object,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "a string",
            Self::Boolean => "a boolean",
            Self::Integer => "an integer",
            Self::Path => "a path",
            Self::List => "a list of strings",
            Self::Map => "a string map",
            Self::Object => "an object",
        };
        f.write_str(name)
    }
}

/// Erased value held by a [`ParamStore`].
#[derive(Clone)]
pub enum ParamValue {
    /// Derived "nothing". Stored so the deriver is not re-run.
    Null,
    Str(String),
    Bool(bool),
    Int(i64),
    Path(PathBuf),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
    Object(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::List(l) => f.debug_tuple("List").field(l).finish(),
            Self::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl ParamValue {
    /// Name of the stored shape, for type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Str(_) => "a string",
            Self::Bool(_) => "a boolean",
            Self::Int(_) => "an integer",
            Self::Path(_) => "a path",
            Self::List(_) => "a list of strings",
            Self::Map(_) => "a string map",
            Self::Object(_) => "an object",
        }
    }

    /// Combines a newly supplied value with an existing override.
    ///
    /// Lists append, maps merge with the newer entry winning, text joins with a
    /// newline. Any other pairing replaces the old value.
    pub fn accumulate(self, incoming: ParamValue) -> ParamValue {
        match (self, incoming) {
            (Self::List(mut old), Self::List(new)) => {
                old.extend(new);
                Self::List(old)
            }
            (Self::Map(mut old), Self::Map(new)) => {
                old.extend(new);
                Self::Map(old)
            }
            (Self::Str(old), Self::Str(new)) => Self::Str(format!("{old}\n{new}")),
            (_, new) => new,
        }
    }

    /// Parses raw text according to a value type when a descriptor has no parser.
    pub fn parse_as(value_type: ValueType, id: &str, raw: &str) -> Result<ParamValue> {
        Ok(match value_type {
            ValueType::String => Self::Str(raw.to_string()),
            ValueType::Boolean => Self::Bool(parse::parse_bool(id, raw)?),
            ValueType::Integer => Self::Int(raw.trim().parse().map_err(|e| Error::ParamParse {
                id: id.to_string(),
                value: raw.to_string(),
                reason: format!("{e}"),
            })?),
            ValueType::Path => Self::Path(PathBuf::from(raw)),
            ValueType::List => Self::List(parse::split_whitespace(raw)),
            ValueType::Map => Self::Map(parse::parse_properties(raw)),
            ValueType::Object => {
                return Err(Error::ParamParse {
                    id: id.to_string(),
                    value: raw.to_string(),
                    reason: "value cannot be given as text".to_string(),
                });
            }
        })
    }
}

/// Conversion between a concrete Rust type and [`ParamValue`].
pub trait ParamType: Clone + Send + Sync + Sized + 'static {
    fn into_value(self) -> ParamValue;
    fn from_value(value: &ParamValue) -> Option<Self>;
}

impl ParamType for String {
    fn into_value(self) -> ParamValue {
        ParamValue::Str(self)
    }
    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl ParamType for bool {
    fn into_value(self) -> ParamValue {
        ParamValue::Bool(self)
    }
    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl ParamType for i64 {
    fn into_value(self) -> ParamValue {
        ParamValue::Int(self)
    }
    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl ParamType for PathBuf {
    fn into_value(self) -> ParamValue {
        ParamValue::Path(self)
    }
    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Path(p) => Some(p.clone()),
            _ => None,
        }
    }
}

impl ParamType for Vec<String> {
    fn into_value(self) -> ParamValue {
        ParamValue::List(self)
    }
    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::List(l) => Some(l.clone()),
            _ => None,
        }
    }
}

impl ParamType for BTreeSet<String> {
    fn into_value(self) -> ParamValue {
        ParamValue::List(self.into_iter().collect())
    }
    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::List(l) => Some(l.iter().cloned().collect()),
            _ => None,
        }
    }
}

impl ParamType for BTreeMap<String, String> {
    fn into_value(self) -> ParamValue {
        ParamValue::Map(self)
    }
    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Map(m) => Some(m.clone()),
            _ => None,
        }
    }
}

impl<T: ParamType> ParamType for Option<T> {
    fn into_value(self) -> ParamValue {
        match self {
            Some(v) => v.into_value(),
            None => ParamValue::Null,
        }
    }
    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Implements [`ParamType`] for a type stored as [`ParamValue::Object`].
#[macro_export]
macro_rules! object_param_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::bundler::params::ParamType for $ty {
                fn into_value(self) -> $crate::bundler::params::ParamValue {
                    $crate::bundler::params::ParamValue::Object(::std::sync::Arc::new(self))
                }
                fn from_value(value: &$crate::bundler::params::ParamValue) -> Option<Self> {
                    match value {
                        $crate::bundler::params::ParamValue::Object(obj) => {
                            obj.downcast_ref::<$ty>().cloned()
                        }
                        _ => None,
                    }
                }
            }
        )+
    };
}

object_param_type!(Vec<PathBuf>);

/// Derives a default value from the rest of the store.
pub type Deriver<T> = fn(&mut ParamStore) -> Result<T>;

/// Turns override text into a value.
pub type Parser<T> = fn(&str, &mut ParamStore) -> Result<T>;

/// Immutable description of one configuration key.
///
/// Descriptors hold no state and are normally declared as `static` items, so
/// any number of stores can share them.
pub struct ParamDescriptor<T: ParamType> {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub value_type: ValueType,
    pub deriver: Deriver<T>,
    pub parser: Option<Parser<T>>,
}

impl<T: ParamType> ParamDescriptor<T> {
    /// Parses override text with the descriptor's parser, or by value type.
    pub fn parse(&self, raw: &str, store: &mut ParamStore) -> Result<T> {
        if let Some(parser) = self.parser {
            return parser(raw, store);
        }
        let value = ParamValue::parse_as(self.value_type, self.id, raw)?;
        T::from_value(&value).ok_or_else(|| Error::ParamType {
            id: self.id.to_string(),
            expected: self.value_type.to_string(),
            found: value.type_name().to_string(),
        })
    }
}

impl<T: ParamType> fmt::Debug for ParamDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamDescriptor")
            .field("id", &self.id)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// Type-erased view of a descriptor, used for registries and raw overrides.
pub trait ParamInfo: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn value_type(&self) -> ValueType;
    fn parse_value(&self, raw: &str, store: &mut ParamStore) -> Result<ParamValue>;
}

impl<T: ParamType> ParamInfo for ParamDescriptor<T> {
    fn id(&self) -> &'static str {
        self.id
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn description(&self) -> &'static str {
        self.description
    }
    fn value_type(&self) -> ValueType {
        self.value_type
    }
    fn parse_value(&self, raw: &str, store: &mut ParamStore) -> Result<ParamValue> {
        self.parse(raw, store).map(ParamType::into_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_shapes() {
        let list = ParamValue::List(vec!["-Xmx1g".into()])
            .accumulate(ParamValue::List(vec!["-Dx=1".into()]));
        assert_eq!(
            Vec::<String>::from_value(&list),
            Some(vec!["-Xmx1g".to_string(), "-Dx=1".to_string()])
        );

        let mut first = BTreeMap::new();
        first.insert("a".to_string(), "1".to_string());
        let mut second = BTreeMap::new();
        second.insert("a".to_string(), "2".to_string());
        second.insert("b".to_string(), "3".to_string());
        let map = ParamValue::Map(first).accumulate(ParamValue::Map(second));
        let map = BTreeMap::<String, String>::from_value(&map).unwrap();
        assert_eq!(map["a"], "2");
        assert_eq!(map["b"], "3");

        let text = ParamValue::Str("one".into()).accumulate(ParamValue::Str("two".into()));
        assert_eq!(String::from_value(&text).as_deref(), Some("one\ntwo"));

        let replaced = ParamValue::Bool(true).accumulate(ParamValue::Bool(false));
        assert_eq!(bool::from_value(&replaced), Some(false));
    }

    #[test]
    fn test_option_null_round_trip() {
        assert_eq!(Option::<String>::from_value(&ParamValue::Null), Some(None));
        assert_eq!(
            Option::<String>::from_value(&ParamValue::Str("x".into())),
            Some(Some("x".to_string()))
        );
        assert_eq!(Option::<String>::from_value(&ParamValue::Bool(true)), None);
    }

    #[test]
    fn test_parse_as_object_is_rejected() {
        assert!(ParamValue::parse_as(ValueType::Object, "appResources", "x").is_err());
    }
}
