//! Keyed program variants built on demand.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use crate::config::ProgramConfig;
use crate::device::DeviceCommands;
use crate::error::{ProgramError, ProgramResult};
use crate::program::{ShaderProgram, ShaderSource};

type VariantFactory<K> = Box<dyn Fn(&K) -> (Vec<ShaderSource>, ProgramConfig)>;

/// Programs that differ by a key, typically a set of preprocessor defines.
///
/// A variant is compiled the first time its key is requested, from the
/// sources the factory produces for that key.
pub struct ProgramVariants<K> {
    programs: HashMap<K, ShaderProgram>,
    factory: VariantFactory<K>,
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> ProgramVariants<K> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&K) -> (Vec<ShaderSource>, ProgramConfig) + 'static,
    {
        Self {
            programs: HashMap::new(),
            factory: Box::new(factory),
        }
    }

    /// The program for `key`, building it first if needed.
    pub fn get_or_build<D>(&mut self, device: &mut D, key: &K) -> ProgramResult<&mut ShaderProgram>
    where
        D: DeviceCommands + ?Sized,
    {
        match self.programs.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let (sources, config) = (self.factory)(entry.key());
                log::debug!("Building program variant {:?}", entry.key());
                let program = ShaderProgram::build(device, sources, config)?;
                Ok(entry.insert(program))
            }
        }
    }

    /// An already built variant.
    pub fn get(&self, key: &K) -> Option<&ShaderProgram> {
        self.programs.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut ShaderProgram> {
        self.programs.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Reload every built variant.
    ///
    /// All variants are attempted; the first failure is returned.
    pub fn reload_all<D>(&mut self, device: &mut D) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        let mut first_error: Option<ProgramError> = None;
        for (key, program) in &mut self.programs {
            if let Err(err) = program.reload(device) {
                log::error!("Failed to reload program variant {:?}: {}", key, err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Destroy and forget one variant.
    pub fn remove<D>(&mut self, device: &mut D, key: &K)
    where
        D: DeviceCommands + ?Sized,
    {
        if let Some(mut program) = self.programs.remove(key) {
            program.destroy(device);
        }
    }

    /// Destroy and forget every variant.
    pub fn destroy_all<D>(&mut self, device: &mut D)
    where
        D: DeviceCommands + ?Sized,
    {
        for (_, mut program) in self.programs.drain() {
            program.destroy(device);
        }
    }
}
