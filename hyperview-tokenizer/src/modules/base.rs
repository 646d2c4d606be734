//! Component composition, available on every platform.

use super::RuntimeModule;
use crate::elements::{ElementFactory, ElementKind};
use crate::types::{RuntimePlatform, RuntimeType};

pub fn module() -> RuntimeModule {
    let mut module = RuntimeModule::new("base", &RuntimePlatform::ALL).with_reference_provider(reference_factory);
    for platform in RuntimePlatform::ALL {
        module = module.with_elements(platform, vec![explicit_reference(platform)]);
    }
    module
}

/// `<ProfileCard/>` for a tag no module provides
pub fn reference_factory(tag: &str, platform: RuntimePlatform) -> ElementFactory {
    ElementFactory {
        tag: tag.to_string(),
        kind: ElementKind::ComponentReference {
            type_name: Some(tag.to_string()),
        },
        runtime_type: RuntimeType::named(tag),
        properties: super::view_properties(platform),
        actions: Vec::new(),
    }
}

/// `<ComponentReference type="ProfileCard"/>`
fn explicit_reference(platform: RuntimePlatform) -> ElementFactory {
    ElementFactory {
        tag: "ComponentReference".to_string(),
        kind: ElementKind::ComponentReference { type_name: None },
        runtime_type: RuntimeType::Unsupported,
        properties: super::view_properties(platform),
        actions: Vec::new(),
    }
}
