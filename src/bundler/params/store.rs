//! Per-run parameter store with memoizing default derivation.

use super::descriptor::{ParamDescriptor, ParamInfo, ParamType, ParamValue, ValueType};
use crate::bundler::error::{Error, Result};
use std::collections::HashMap;

/// How an entry got into the store.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Origin {
    /// Computed by the descriptor's deriver.
    Defaulted,
    /// Supplied by a caller.
    Overridden,
}

/// Tri-state of a parameter id in a store.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamState {
    Unset,
    Defaulted,
    Overridden,
}

#[derive(Clone, Debug)]
struct Entry {
    value: ParamValue,
    origin: Origin,
}

/// Mutable map from parameter id to value, owned by one packaging run.
///
/// [`fetch`](Self::fetch) derives missing values on first use and memoizes
/// them, including empty results, so each deriver runs at most once per store.
#[derive(Default)]
pub struct ParamStore {
    entries: HashMap<String, Entry>,
    resolving: Vec<&'static str>,
    registry: HashMap<&'static str, &'static dyn ParamInfo>,
}

impl std::fmt::Debug for ParamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamStore")
            .field("entries", &self.entries)
            .field("registered", &self.registry.len())
            .finish()
    }
}

impl ParamStore {
    /// Empty store with no registered descriptors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with every standard descriptor registered.
    pub fn standard() -> Self {
        let mut store = Self::new();
        store.register_all(super::standard::all());
        store
    }

    /// Makes a descriptor known for [`supply_raw`](Self::supply_raw).
    pub fn register(&mut self, info: &'static dyn ParamInfo) {
        self.registry.insert(info.id(), info);
    }

    pub fn register_all(&mut self, infos: impl IntoIterator<Item = &'static dyn ParamInfo>) {
        for info in infos {
            self.register(info);
        }
    }

    /// Registered descriptor for an id.
    pub fn descriptor(&self, id: &str) -> Option<&'static dyn ParamInfo> {
        self.registry.get(id).copied()
    }

    /// Returns the stored value, deriving and memoizing it first if absent.
    ///
    /// Raw text stored under an id before its descriptor was known is parsed
    /// here and replaced by the typed value, keeping its origin.
    pub fn fetch<T: ParamType>(&mut self, desc: &'static ParamDescriptor<T>) -> Result<T> {
        if let Some(entry) = self.entries.get(desc.id) {
            if let Some(value) = T::from_value(&entry.value) {
                return Ok(value);
            }
            let origin = entry.origin;
            let raw = match &entry.value {
                ParamValue::Str(raw) if desc.value_type != ValueType::String => raw.clone(),
                other => return Err(type_error(desc, other)),
            };
            let value = desc.parse(&raw, self)?;
            self.entries.insert(
                desc.id.to_string(),
                Entry {
                    value: value.clone().into_value(),
                    origin,
                },
            );
            return Ok(value);
        }

        if self.resolving.contains(&desc.id) {
            let mut chain: Vec<String> = self.resolving.iter().map(|s| s.to_string()).collect();
            chain.push(desc.id.to_string());
            return Err(Error::DerivationCycle { chain });
        }

        self.resolving.push(desc.id);
        let derived = (desc.deriver)(self);
        self.resolving.pop();
        let value = derived?;

        log::trace!("derived default for `{}`", desc.id);
        self.entries.insert(
            desc.id.to_string(),
            Entry {
                value: value.clone().into_value(),
                origin: Origin::Defaulted,
            },
        );
        Ok(value)
    }

    /// Reads an existing entry without deriving it.
    pub fn get<T: ParamType>(&self, desc: &'static ParamDescriptor<T>) -> Result<Option<T>> {
        match self.entries.get(desc.id) {
            None => Ok(None),
            Some(entry) => T::from_value(&entry.value)
                .map(Some)
                .ok_or_else(|| type_error(desc, &entry.value)),
        }
    }

    /// Overrides a parameter with a typed value.
    pub fn set<T: ParamType>(&mut self, desc: &'static ParamDescriptor<T>, value: T) {
        self.set_raw(desc.id, value.into_value());
    }

    /// Overrides a parameter by id with an erased value.
    pub fn set_raw(&mut self, id: impl Into<String>, value: ParamValue) {
        self.entries.insert(
            id.into(),
            Entry {
                value,
                origin: Origin::Overridden,
            },
        );
    }

    /// Supplies override text for a descriptor.
    ///
    /// When the parameter is already overridden the parsed value accumulates
    /// onto it (see [`ParamValue::accumulate`]).
    pub fn supply<T: ParamType>(&mut self, desc: &'static ParamDescriptor<T>, raw: &str) -> Result<()> {
        let value = desc.parse(raw, self)?.into_value();
        self.accumulate(desc.id, value);
        Ok(())
    }

    /// Supplies override text by id, using the registered descriptor's parser.
    ///
    /// Unknown ids keep the raw text; a later typed fetch parses it.
    pub fn supply_raw(&mut self, id: &str, raw: &str) -> Result<()> {
        let value = match self.descriptor(id) {
            Some(info) => info.parse_value(raw, self)?,
            None => ParamValue::Str(raw.to_string()),
        };
        self.accumulate(id, value);
        Ok(())
    }

    /// Accumulates an erased value onto an existing override, or sets it.
    pub fn accumulate(&mut self, id: &str, value: ParamValue) {
        let value = match self.entries.remove(id) {
            Some(Entry {
                value: existing,
                origin: Origin::Overridden,
            }) => existing.accumulate(value),
            _ => value,
        };
        self.set_raw(id, value);
    }

    /// Tri-state of an id.
    pub fn state(&self, id: &str) -> ParamState {
        match self.entries.get(id).map(|e| e.origin) {
            None => ParamState::Unset,
            Some(Origin::Defaulted) => ParamState::Defaulted,
            Some(Origin::Overridden) => ParamState::Overridden,
        }
    }

    /// True when a caller supplied the parameter.
    pub fn is_overridden<T: ParamType>(&self, desc: &'static ParamDescriptor<T>) -> bool {
        self.state(desc.id) == ParamState::Overridden
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Drops an entry so the next fetch derives it again.
    pub fn remove(&mut self, id: &str) -> Option<ParamValue> {
        self.entries.remove(id).map(|e| e.value)
    }

    /// Ids currently present, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// New store that keeps this store's overrides, plus extra overrides.
    ///
    /// Derived entries are not carried over, so defaults that depend on the
    /// extra overrides are recomputed in the overlay.
    pub fn overlay(&self, overrides: impl IntoIterator<Item = (String, ParamValue)>) -> ParamStore {
        let mut store = ParamStore {
            entries: self
                .entries
                .iter()
                .filter(|(_, e)| e.origin == Origin::Overridden)
                .map(|(k, e)| (k.clone(), e.clone()))
                .collect(),
            resolving: Vec::new(),
            registry: self.registry.clone(),
        };
        for (id, value) in overrides {
            store.set_raw(id, value);
        }
        store
    }
}

fn type_error<T: ParamType>(desc: &ParamDescriptor<T>, found: &ParamValue) -> Error {
    Error::ParamType {
        id: desc.id.to_string(),
        expected: desc.value_type.to_string(),
        found: found.type_name().to_string(),
    }
}
