//! Name to location lookup for direct uniform setters.

use std::collections::HashMap;

use crate::config;
use crate::error::{ProgramError, ProgramResult};
use crate::resources::{ResourceTable, UniformEntry};

#[derive(Debug, Clone)]
struct LastLookup {
    name: String,
    location: Option<u32>,
}

/// Resolves uniform names to driver locations.
///
/// Setters are usually called with the same name many times in a row, so
/// the last lookup is memoized in front of the name table. Block members
/// have no location and are never found.
///
/// Without an explicit strictness the process-wide flag is read on every
/// [`resolve`](Self::resolve).
#[derive(Debug, Clone, Default)]
pub struct UniformLocator {
    locations: HashMap<String, u32>,
    last: Option<LastLookup>,
    strict: Option<bool>,
}

impl UniformLocator {
    pub fn new(uniforms: &ResourceTable<UniformEntry>, strict: Option<bool>) -> Self {
        let locations = uniforms
            .iter()
            .filter_map(|uniform| Some((uniform.name.clone(), uniform.location?)))
            .collect();
        Self {
            locations,
            last: None,
            strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict.unwrap_or_else(config::strict_checks)
    }

    /// Location of `name`, or `None` if the program has no such direct uniform.
    pub fn locate(&mut self, name: &str) -> Option<u32> {
        if let Some(last) = &self.last {
            if last.name == name {
                return last.location;
            }
        }
        let location = self.locations.get(name).copied();
        self.last = Some(LastLookup {
            name: name.to_string(),
            location,
        });
        location
    }

    /// Location of `name` for a setter call.
    ///
    /// A miss is an error in strict mode. In lenient mode it is `Ok(None)`
    /// and the caller drops the call.
    pub fn resolve(&mut self, name: &str) -> ProgramResult<Option<u32>> {
        match self.locate(name) {
            Some(location) => Ok(Some(location)),
            None if self.is_strict() => Err(ProgramError::UniformNotFound(name.to_string())),
            None => {
                log::trace!("Uniform not found: {}, setter call ignored", name);
                Ok(None)
            }
        }
    }
}
