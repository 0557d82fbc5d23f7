//! Shader programs
//!
//! A [`ShaderProgram`] owns one linked program object together with
//! everything derived from it at link time: the introspected resource
//! tables, the binding slot tables and the uniform locator. All of it is
//! rebuilt by [`ShaderProgram::reload`].

pub mod compiler;
pub mod locator;
pub mod source;
pub mod uniforms;
pub mod variants;

pub use compiler::compile_program;
pub use locator::UniformLocator;
pub use source::{stages_of, ShaderSource};
pub use variants::ProgramVariants;

use crate::binding::{BindingApplier, BindingAllocator, BindingSpec, BindingSpecBuilder, SlotTables};
use crate::config::ProgramConfig;
use crate::device::{DeviceCommands, ProgramId, StageSet};
use crate::error::{BindingResult, ProgramError, ProgramResult};
use crate::resources::{ProgramResources, ResourceIntrospector};

/// A linked shader program and its binding state.
///
/// Every call takes the device the program was built on. Slot tables are
/// only valid for the current link; callers must not cache them across
/// [`reload`](Self::reload).
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    sources: Vec<ShaderSource>,
    stages: StageSet,
    config: ProgramConfig,
    resources: ProgramResources,
    slots: SlotTables,
    locator: UniformLocator,
}

impl ShaderProgram {
    /// Compile, link and introspect a program from `sources`.
    pub fn build<D>(
        device: &mut D,
        sources: Vec<ShaderSource>,
        config: ProgramConfig,
    ) -> ProgramResult<Self>
    where
        D: DeviceCommands + ?Sized,
    {
        let mut program = Self {
            id: ProgramId::NONE,
            stages: stages_of(&sources),
            sources,
            config,
            resources: ProgramResources::default(),
            slots: SlotTables::default(),
            locator: UniformLocator::default(),
        };
        program.initialize(device)?;
        Ok(program)
    }

    fn initialize<D>(&mut self, device: &mut D) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        let id = compile_program(device, &self.sources, self.config.label.as_deref())?;
        let mut resources = ResourceIntrospector::new(&*device, id).introspect(self.stages);
        let slots = BindingAllocator::new(id).allocate(device, &mut resources);

        self.locator = UniformLocator::new(resources.uniforms(), self.config.strict_checks);
        self.resources = resources;
        self.slots = slots;
        self.id = id;

        log::info!(
            "Built shader program {} ({:?}): {} uniforms, {} uniform blocks, {} storage blocks",
            self.label(),
            self.stages,
            self.resources.uniforms().len(),
            self.resources.uniform_blocks().len(),
            self.resources.storage_blocks().len()
        );
        Ok(())
    }

    /// Destroy the program object and build it again from the same sources.
    ///
    /// On failure the program stays destroyed and the error is returned;
    /// a later `reload` may try again.
    pub fn reload<D>(&mut self, device: &mut D) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.destroy(device);
        self.initialize(device)
    }

    /// Replace the sources and reload.
    pub fn reload_with<D>(&mut self, device: &mut D, sources: Vec<ShaderSource>) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        self.stages = stages_of(&sources);
        self.sources = sources;
        self.reload(device)
    }

    /// Delete the program object and drop every table derived from it.
    pub fn destroy<D>(&mut self, device: &mut D)
    where
        D: DeviceCommands + ?Sized,
    {
        if self.id.is_none() {
            return;
        }
        device.delete_program(self.id);
        self.id = ProgramId::NONE;
        self.resources = ProgramResources::default();
        self.slots = SlotTables::default();
        self.locator = UniformLocator::default();
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.id.is_none()
    }

    pub fn stages(&self) -> StageSet {
        self.stages
    }

    pub fn sources(&self) -> &[ShaderSource] {
        &self.sources
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Label for log messages.
    pub fn label(&self) -> String {
        match &self.config.label {
            Some(label) => format!("'{}'", label),
            None => self.id.to_string(),
        }
    }

    fn live_id(&self) -> ProgramResult<ProgramId> {
        if self.id.is_none() {
            Err(ProgramError::Destroyed)
        } else {
            Ok(self.id)
        }
    }

    /// Make this the current program.
    pub fn bind<D>(&self, device: &mut D) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        device.use_program(Some(self.live_id()?));
        Ok(())
    }

    /// Clear the current program.
    pub fn unbind<D>(&self, device: &mut D)
    where
        D: DeviceCommands + ?Sized,
    {
        device.use_program(None);
    }

    /// Set the debug label, now and for every future link.
    ///
    /// `None` or an empty label clears it.
    pub fn set_label<D>(&mut self, device: &mut D, label: Option<&str>) -> ProgramResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        let id = self.live_id()?;
        let label = label.filter(|label| !label.is_empty());
        device.label_program(id, label);
        self.config.label = label.map(str::to_string);
        Ok(())
    }

    /// Introspected resources of the current link.
    pub fn resources(&self) -> &ProgramResources {
        &self.resources
    }

    /// Binding slots of the current link.
    pub fn slot_tables(&self) -> &SlotTables {
        &self.slots
    }

    /// Driver location of a direct uniform, `None` if there is none.
    pub fn uniform_location(&mut self, name: &str) -> Option<u32> {
        self.locator.locate(name)
    }

    /// Validate `spec` against this program's slots and bind it.
    ///
    /// Nothing is bound if any declaration is missing or invalid.
    pub fn try_apply_binding<D>(&self, device: &mut D, spec: &BindingSpec<'_>) -> BindingResult<()>
    where
        D: DeviceCommands + ?Sized,
    {
        BindingApplier::new(&self.slots).apply(device, spec)
    }

    /// Bind `spec`, logging instead of returning a failure.
    ///
    /// A failed apply leaves the previous bindings in place.
    pub fn apply_binding<D>(&self, device: &mut D, spec: &BindingSpec<'_>)
    where
        D: DeviceCommands + ?Sized,
    {
        if let Err(err) = self.try_apply_binding(device, spec) {
            log::error!("Failed to apply bindings to program {}: {}", self.label(), err);
        }
    }

    /// Build a spec with `declare` and apply it.
    ///
    /// Declaration errors are returned; apply errors are logged as in
    /// [`apply_binding`](Self::apply_binding).
    pub fn apply_binding_with<'a, D, F>(&self, device: &mut D, declare: F) -> BindingResult<()>
    where
        D: DeviceCommands + ?Sized,
        F: FnOnce(&mut BindingSpecBuilder<'a>) -> BindingResult<()>,
    {
        let spec = BindingSpec::of(declare)?;
        self.apply_binding(device, &spec);
        Ok(())
    }
}
