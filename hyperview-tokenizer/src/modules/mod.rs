//! Pluggable element modules and the registry that resolves tags against them.

pub mod appkit;
pub mod base;
pub mod uikit;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::elements::ElementFactory;
use crate::error::ModuleError;
use crate::properties::PropertyDescription;
use crate::types::RuntimePlatform;

/// Builds the factory for a tag no module knows, treating it as a component name.
pub type ReferenceFactoryProvider = fn(&str, RuntimePlatform) -> ElementFactory;

/// Tags that describe the component itself rather than an element
pub const RESERVED_TAGS: &[&str] = &[
    "styles",
    "templates",
    "overrides",
    "state",
    "navigationItem",
    "rx:disposeBags",
];

#[derive(Debug, Clone)]
pub struct RuntimeModule {
    pub name: String,
    pub platforms: Vec<RuntimePlatform>,
    pub elements: BTreeMap<RuntimePlatform, Vec<ElementFactory>>,
    pub reference_provider: Option<ReferenceFactoryProvider>,
}

impl RuntimeModule {
    pub fn new(name: &str, platforms: &[RuntimePlatform]) -> Self {
        Self {
            name: name.to_string(),
            platforms: platforms.to_vec(),
            elements: BTreeMap::new(),
            reference_provider: None,
        }
    }

    pub fn with_elements(mut self, platform: RuntimePlatform, elements: Vec<ElementFactory>) -> Self {
        self.elements.entry(platform).or_default().extend(elements);
        self
    }

    pub fn with_reference_provider(mut self, provider: ReferenceFactoryProvider) -> Self {
        self.reference_provider = Some(provider);
        self
    }

    pub fn supports(&self, platform: RuntimePlatform) -> bool {
        self.platforms.contains(&platform)
    }

    pub fn elements(&self, platform: RuntimePlatform) -> &[ElementFactory] {
        self.elements.get(&platform).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The modules shipped with the crate: `base`, `uikit` and `appkit`
pub fn default_modules() -> Vec<RuntimeModule> {
    vec![base::module(), uikit::module(), appkit::module()]
}

/// Properties every view accepts on `platform`, including component references
pub fn view_properties(platform: RuntimePlatform) -> Vec<PropertyDescription> {
    if platform.is_uikit() {
        uikit::view_properties()
    } else {
        appkit::view_properties()
    }
}

/// Tag lookup for one platform.
///
/// Reference factories for unknown tags are created on first use and memoized;
/// the memo is behind a mutex so a built registry can be shared between threads.
#[derive(Debug)]
pub struct ModuleRegistry {
    platform: RuntimePlatform,
    factories: HashMap<String, Arc<ElementFactory>>,
    reference_provider: ReferenceFactoryProvider,
    references: Mutex<HashMap<String, Arc<ElementFactory>>>,
}

impl ModuleRegistry {
    pub fn new(modules: &[RuntimeModule], platform: RuntimePlatform) -> Result<Self, ModuleError> {
        let active: Vec<&RuntimeModule> = modules.iter().filter(|m| m.supports(platform)).collect();

        let providers: Vec<(&str, ReferenceFactoryProvider)> = active
            .iter()
            .filter_map(|m| m.reference_provider.map(|p| (m.name.as_str(), p)))
            .collect();
        let reference_provider = match providers.as_slice() {
            [] => return Err(ModuleError::MissingReferenceFactoryProvider { platform }),
            [(_, provider)] => *provider,
            many => {
                return Err(ModuleError::DuplicateReferenceFactoryProvider {
                    platform,
                    modules: many.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", "),
                })
            }
        };

        let mut factories = HashMap::new();
        for module in &active {
            for factory in module.elements(platform) {
                if factories
                    .insert(factory.tag.clone(), Arc::new(factory.clone()))
                    .is_some()
                {
                    tracing::debug!(tag = %factory.tag, module = %module.name, "element factory overridden");
                }
            }
        }
        tracing::debug!(%platform, modules = active.len(), elements = factories.len(), "module registry built");

        Ok(Self {
            platform,
            factories,
            reference_provider,
            references: Mutex::new(HashMap::new()),
        })
    }

    /// Registry over [`default_modules`]
    pub fn with_default_modules(platform: RuntimePlatform) -> Result<Self, ModuleError> {
        Self::new(&default_modules(), platform)
    }

    pub fn platform(&self) -> RuntimePlatform {
        self.platform
    }

    pub fn is_reserved(tag: &str) -> bool {
        RESERVED_TAGS.contains(&tag) || tag.starts_with("state:")
    }

    /// Factory for `tag`; `None` for reserved tags, a component reference for unknown ones.
    pub fn factory(&self, tag: &str) -> Option<Arc<ElementFactory>> {
        if Self::is_reserved(tag) {
            return None;
        }
        match self.factories.get(tag) {
            Some(factory) => Some(Arc::clone(factory)),
            None => Some(self.reference_factory(tag)),
        }
    }

    /// Module-provided factory only, without the reference fallback
    pub fn element_factory(&self, tag: &str) -> Option<Arc<ElementFactory>> {
        self.factories.get(tag).cloned()
    }

    pub fn reference_factory(&self, tag: &str) -> Arc<ElementFactory> {
        let mut references = self.references.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(references.entry(tag.to_string()).or_insert_with(|| {
            tracing::debug!(tag, "creating component reference factory");
            Arc::new((self.reference_provider)(tag, self.platform))
        }))
    }
}
