//! Registrars that fill a metadata store before compilation.

use std::fmt;
use std::sync::Arc;

use hermes_metadata::MetadataArgsStorage;

type Registrar = Arc<dyn Fn(&mut MetadataArgsStorage) + Send + Sync>;

/// An ordered list of functions that declare controllers, middlewares and
/// error handlers.
///
/// Each application module exposes a registrar; the facade runs them
/// against the store, in the order they were added, right before the
/// executor compiles it.
///
/// ```rust,ignore
/// fn questions(storage: &mut MetadataArgsStorage) {
///     storage.json_controller::<QuestionController>("/questions") /* ... */;
/// }
///
/// let declarations = Declarations::new().with(questions).with(answers);
/// ```
#[derive(Clone, Default)]
pub struct Declarations {
    registrars: Vec<Registrar>,
}

impl Declarations {
    /// No registrars.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registrar.
    #[must_use]
    pub fn with<F>(mut self, registrar: F) -> Self
    where
        F: Fn(&mut MetadataArgsStorage) + Send + Sync + 'static,
    {
        self.push(registrar);
        self
    }

    /// Appends a registrar in place.
    pub fn push<F>(&mut self, registrar: F)
    where
        F: Fn(&mut MetadataArgsStorage) + Send + Sync + 'static,
    {
        self.registrars.push(Arc::new(registrar));
    }

    /// Number of registrars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrars.len()
    }

    /// `true` without registrars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrars.is_empty()
    }

    /// Runs every registrar against `storage`.
    pub fn apply(&self, storage: &mut MetadataArgsStorage) {
        for registrar in &self.registrars {
            registrar(storage);
        }
    }

    /// A fresh store holding everything the registrars declare.
    #[must_use]
    pub fn to_storage(&self) -> MetadataArgsStorage {
        let mut storage = MetadataArgsStorage::new();
        self.apply(&mut storage);
        storage
    }
}

impl fmt::Debug for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declarations")
            .field("registrars", &self.registrars.len())
            .finish()
    }
}
