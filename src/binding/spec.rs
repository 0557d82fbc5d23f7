//! Binding specifications and their builder.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use crate::binding::{BindingKind, BufferView};
use crate::device::{BufferTarget, SamplerId, TextureId};
use crate::error::{BindingError, BindingResult};

/// A texture bound to a sampler unit, optionally with a sampler state object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerBinding {
    pub name: String,
    pub texture: TextureId,
    /// `None` keeps the texture's own sampling state.
    pub sampler: Option<SamplerId>,
}

impl SamplerBinding {
    pub fn new(name: impl Into<String>, texture: impl Into<TextureId>) -> Self {
        Self {
            name: name.into(),
            texture: texture.into(),
            sampler: None,
        }
    }

    /// Use a sampler state object with this texture.
    pub fn with_sampler(mut self, sampler: impl Into<SamplerId>) -> Self {
        self.sampler = Some(sampler.into());
        self
    }
}

impl fmt::Display for SamplerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sampler {
            Some(sampler) => write!(f, "{} -> {} with {}", self.name, self.texture, sampler),
            None => write!(f, "{} -> {}", self.name, self.texture),
        }
    }
}

/// A texture bound to an image unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBinding {
    pub name: String,
    pub texture: TextureId,
}

impl ImageBinding {
    pub fn new(name: impl Into<String>, texture: impl Into<TextureId>) -> Self {
        Self {
            name: name.into(),
            texture: texture.into(),
        }
    }
}

impl fmt::Display for ImageBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.name, self.texture)
    }
}

/// A buffer range bound to a uniform or shader storage block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBinding<'a> {
    pub name: &'a str,
    pub view: BufferView<'a>,
    pub target: BufferTarget,
}

impl<'a> BufferBinding<'a> {
    pub fn new(name: &'a str, view: impl Into<BufferView<'a>>, target: BufferTarget) -> Self {
        Self {
            name,
            view: view.into(),
            target,
        }
    }

    /// Bind `view` to the uniform block `name`.
    pub fn uniform(name: &'a str, view: impl Into<BufferView<'a>>) -> Self {
        Self::new(name, view, BufferTarget::Uniform)
    }

    /// Bind `view` to the shader storage block `name`.
    pub fn storage(name: &'a str, view: impl Into<BufferView<'a>>) -> Self {
        Self::new(name, view, BufferTarget::ShaderStorage)
    }
}

impl fmt::Display for BufferBinding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.name, self.view)
    }
}

/// An immutable set of binding declarations, keyed by resource name.
///
/// Names are unique per category and, for buffers, per target. Built with
/// [`BindingSpecBuilder`] or [`BindingSpec::of`]; the spec borrows the
/// buffers its views refer to.
#[derive(Debug, Clone, Default)]
pub struct BindingSpec<'a> {
    samplers: HashMap<String, SamplerBinding>,
    images: HashMap<String, ImageBinding>,
    buffers: HashMap<BufferTarget, HashMap<&'a str, BufferBinding<'a>>>,
}

static_assertions::assert_impl_all!(BindingSpec<'static>: Send, Sync);

impl<'a> BindingSpec<'a> {
    /// An empty spec, for programs without opaque resources or blocks.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a spec within a single construction closure.
    ///
    /// ```ignore
    /// let spec = BindingSpec::of(|b| {
    ///     b.sampler("albedo", albedo_texture)?
    ///         .buffer(BufferBinding::uniform("Camera", &camera_buffer))?;
    ///     Ok(())
    /// })?;
    /// ```
    pub fn of<F>(declare: F) -> BindingResult<Self>
    where
        F: FnOnce(&mut BindingSpecBuilder<'a>) -> BindingResult<()>,
    {
        let mut builder = BindingSpecBuilder::new();
        declare(&mut builder)?;
        Ok(builder.build())
    }

    pub fn sampler(&self, name: &str) -> Option<&SamplerBinding> {
        self.samplers.get(name)
    }

    pub fn image(&self, name: &str) -> Option<&ImageBinding> {
        self.images.get(name)
    }

    pub fn buffer(&self, target: BufferTarget, name: &str) -> Option<&BufferBinding<'a>> {
        self.buffers.get(&target)?.get(name)
    }

    /// Buffer declarations of one target, `None` if the spec declares none.
    pub fn buffers(&self, target: BufferTarget) -> Option<&HashMap<&'a str, BufferBinding<'a>>> {
        self.buffers.get(&target)
    }

    pub fn samplers(&self) -> impl Iterator<Item = &SamplerBinding> {
        self.samplers.values()
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageBinding> {
        self.images.values()
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty() && self.images.is_empty() && self.buffers.is_empty()
    }
}

/// Accumulates binding declarations, rejecting duplicate names.
///
/// Every insertion fails immediately when the name is already declared in
/// the same category (and target, for buffers). [`build`](Self::build)
/// consumes the builder.
#[derive(Debug, Default)]
pub struct BindingSpecBuilder<'a> {
    spec: BindingSpec<'a>,
}

impl<'a> BindingSpecBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `texture` to the sampler uniform `name`.
    pub fn sampler(
        &mut self,
        name: impl Into<String>,
        texture: impl Into<TextureId>,
    ) -> BindingResult<&mut Self> {
        self.add_sampler(SamplerBinding::new(name, texture))
    }

    /// Bind `texture` with sampler state `sampler` to the sampler uniform `name`.
    pub fn sampler_with(
        &mut self,
        name: impl Into<String>,
        texture: impl Into<TextureId>,
        sampler: impl Into<SamplerId>,
    ) -> BindingResult<&mut Self> {
        self.add_sampler(SamplerBinding::new(name, texture).with_sampler(sampler))
    }

    /// Bind `texture` to the image uniform `name`.
    pub fn image(
        &mut self,
        name: impl Into<String>,
        texture: impl Into<TextureId>,
    ) -> BindingResult<&mut Self> {
        self.add_image(ImageBinding::new(name, texture))
    }

    /// Bind a buffer range to a uniform or storage block.
    pub fn buffer(&mut self, binding: BufferBinding<'a>) -> BindingResult<&mut Self> {
        let declared = self.spec.buffers.entry(binding.target).or_default();
        if let Some(existing) = declared.get(binding.name) {
            return Err(BindingError::Duplicate {
                kind: BindingKind::Buffer(binding.target),
                name: binding.name.to_string(),
                existing: existing.to_string(),
                new: binding.to_string(),
            });
        }
        declared.insert(binding.name, binding);
        Ok(self)
    }

    pub fn add_sampler(&mut self, binding: SamplerBinding) -> BindingResult<&mut Self> {
        insert_unique(&mut self.spec.samplers, BindingKind::Sampler, binding.name.clone(), binding)?;
        Ok(self)
    }

    pub fn add_image(&mut self, binding: ImageBinding) -> BindingResult<&mut Self> {
        insert_unique(&mut self.spec.images, BindingKind::Image, binding.name.clone(), binding)?;
        Ok(self)
    }

    pub fn samplers(
        &mut self,
        bindings: impl IntoIterator<Item = SamplerBinding>,
    ) -> BindingResult<&mut Self> {
        for binding in bindings {
            self.add_sampler(binding)?;
        }
        Ok(self)
    }

    /// Declare every binding with the same sampler state object, replacing
    /// whatever state they carried.
    pub fn sampler_with_state(
        &mut self,
        bindings: impl IntoIterator<Item = SamplerBinding>,
        sampler: impl Into<SamplerId>,
    ) -> BindingResult<&mut Self> {
        let sampler = sampler.into();
        for binding in bindings {
            self.add_sampler(SamplerBinding {
                sampler: Some(sampler),
                ..binding
            })?;
        }
        Ok(self)
    }

    pub fn images(
        &mut self,
        bindings: impl IntoIterator<Item = ImageBinding>,
    ) -> BindingResult<&mut Self> {
        for binding in bindings {
            self.add_image(binding)?;
        }
        Ok(self)
    }

    pub fn buffers(
        &mut self,
        bindings: impl IntoIterator<Item = BufferBinding<'a>>,
    ) -> BindingResult<&mut Self> {
        for binding in bindings {
            self.buffer(binding)?;
        }
        Ok(self)
    }

    /// Finish the spec.
    pub fn build(self) -> BindingSpec<'a> {
        self.spec
    }
}

fn insert_unique<T: fmt::Display>(
    map: &mut HashMap<String, T>,
    kind: BindingKind,
    name: String,
    binding: T,
) -> BindingResult<()> {
    match map.entry(name) {
        Entry::Occupied(existing) => Err(BindingError::Duplicate {
            kind,
            name: existing.key().clone(),
            existing: existing.get().to_string(),
            new: binding.to_string(),
        }),
        Entry::Vacant(slot) => {
            slot.insert(binding);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Buffer;
    use crate::device::BufferId;

    #[test]
    fn test_duplicate_sampler_rejected() {
        let mut builder = BindingSpecBuilder::new();
        builder.sampler("albedo", TextureId(1)).unwrap();
        let err = builder.sampler("albedo", TextureId(2)).unwrap_err();
        assert_eq!(
            err,
            BindingError::Duplicate {
                kind: BindingKind::Sampler,
                name: "albedo".to_string(),
                existing: "albedo -> TextureId(1)".to_string(),
                new: "albedo -> TextureId(2)".to_string(),
            }
        );
        assert!(err.to_string().starts_with("Duplicated sampler unit name: albedo"));
    }

    #[test]
    fn test_distinct_names_retrievable() {
        let spec = BindingSpec::of(|b| {
            b.sampler("tex0", TextureId(1))?
                .sampler_with("tex1", TextureId(2), SamplerId(7))?
                .image("out", TextureId(3))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(spec.sampler("tex0").map(|s| s.texture), Some(TextureId(1)));
        assert_eq!(spec.sampler("tex1").and_then(|s| s.sampler), Some(SamplerId(7)));
        assert_eq!(spec.image("out").map(|i| i.texture), Some(TextureId(3)));
        assert_eq!(spec.samplers().count(), 2);
    }

    #[test]
    fn test_same_name_different_categories() {
        let spec = BindingSpec::of(|b| {
            b.sampler("shared", TextureId(1))?
                .image("shared", TextureId(2))?;
            Ok(())
        });
        assert!(spec.is_ok());
    }

    #[test]
    fn test_buffer_duplicates_are_per_target() {
        let buffer = Buffer::allocated(BufferId(5), 256);
        let mut builder = BindingSpecBuilder::new();
        builder
            .buffer(BufferBinding::uniform("Data", &buffer))
            .unwrap()
            .buffer(BufferBinding::storage("Data", buffer.create_view_from(64)))
            .unwrap();

        let err = builder
            .buffer(BufferBinding::uniform("Data", buffer.create_view(0, 16)))
            .unwrap_err();
        assert!(matches!(
            err,
            BindingError::Duplicate {
                kind: BindingKind::Buffer(BufferTarget::Uniform),
                ..
            }
        ));

        let spec = builder.build();
        assert_eq!(
            spec.buffer(BufferTarget::ShaderStorage, "Data").map(|b| b.view.offset()),
            Some(64)
        );
    }

    #[test]
    fn test_sampler_with_state_overrides() {
        let spec = BindingSpec::of(|b| {
            b.sampler_with_state(
                [
                    SamplerBinding::new("a", TextureId(1)),
                    SamplerBinding::new("b", TextureId(2)).with_sampler(SamplerId(3)),
                ],
                SamplerId(9),
            )?;
            Ok(())
        })
        .unwrap();
        assert!(spec.samplers().all(|s| s.sampler == Some(SamplerId(9))));
    }

    #[test]
    fn test_batch_stops_at_duplicate() {
        let result = BindingSpec::of(|b| {
            b.images([
                ImageBinding::new("a", TextureId(1)),
                ImageBinding::new("a", TextureId(2)),
            ])?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(BindingError::Duplicate {
                kind: BindingKind::Image,
                ..
            })
        ));
    }
}
