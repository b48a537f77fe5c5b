#[cfg(test)]
mod tests;

use {
    crate::{
        allocator::{
            AllocatorError, Backend, BufferObject, BufferUsage, ImportData, MapFlags, Mapping,
        },
        backends::find_backend,
        combination::Combinations,
        format::Format,
        utils::errorfmt::ErrorFmt,
        video::{
            Modifier,
            drm::{Drm, DrmError},
        },
    },
    bstr::{BString, ByteSlice},
    std::rc::Rc,
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("The drm subsystem returned an error")]
    Drm(#[from] DrmError),
    #[error("There is no backend for the `{0}` driver")]
    NoBackend(BString),
    #[error("Could not initialize the {0} backend")]
    Init(&'static str, #[source] AllocatorError),
}

#[derive(Clone, Debug, Default)]
pub struct DriverConfig {
    /// Use this backend instead of the one matching the kernel driver.
    pub backend: Option<String>,
}

/// Dispatches buffer operations to the backend of one device.
pub struct Driver {
    backend: Box<dyn Backend>,
    combinations: Combinations,
}

impl Driver {
    pub fn new(drm: &Rc<Drm>, config: &DriverConfig) -> Result<Self, DriverError> {
        let name: BString = match &config.backend {
            Some(name) => name.as_str().into(),
            None => drm.version()?.name,
        };
        let info = match find_backend(&name) {
            Some(info) => info,
            None => return Err(DriverError::NoBackend(name)),
        };
        log::info!("Using the {} backend for driver `{}`", info.name, name.as_bstr());
        Self::with_backend((info.create)(drm))
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Result<Self, DriverError> {
        let mut combinations = Combinations::default();
        if let Err(e) = backend.init(&mut combinations) {
            log::error!("Could not initialize the {} backend: {}", backend.name(), ErrorFmt(&e));
            return Err(DriverError::Init(backend.name(), e));
        }
        Ok(Self {
            backend,
            combinations,
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn combinations(&self) -> &Combinations {
        &self.combinations
    }

    pub fn create_bo(
        &self,
        width: u32,
        height: u32,
        format: &'static Format,
        usage: BufferUsage,
    ) -> Result<BufferObject, AllocatorError> {
        self.backend
            .create_bo(&self.combinations, width, height, format, usage)
    }

    pub fn create_bo_with_modifiers(
        &self,
        width: u32,
        height: u32,
        format: &'static Format,
        modifiers: &[Modifier],
        usage: BufferUsage,
    ) -> Result<BufferObject, AllocatorError> {
        let mut bo = self
            .backend
            .create_bo_with_modifiers(width, height, format, modifiers)?;
        bo.meta.use_flags = usage;
        Ok(bo)
    }

    pub fn import_bo(&self, data: &ImportData) -> Result<BufferObject, AllocatorError> {
        self.backend.import_bo(data)
    }

    pub fn destroy_bo(&self, bo: BufferObject) -> Result<(), AllocatorError> {
        self.backend.destroy_bo(bo)
    }

    pub fn map_bo<'a>(
        &self,
        bo: &'a BufferObject,
        plane: usize,
        flags: MapFlags,
    ) -> Result<Mapping<'a>, AllocatorError> {
        self.backend.map_bo(bo, plane, flags)
    }

    pub fn unmap_bo(&self, mapping: Mapping<'_>) -> Result<(), AllocatorError> {
        self.backend.unmap_bo(mapping)
    }
}
