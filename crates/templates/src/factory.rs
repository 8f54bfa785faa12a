use thiserror::Error;
use tracing::debug;

use crate::area::Area;
use crate::behavior::{BehaviorManager, ScriptListener};
use crate::definition::Definition;
use crate::entity::{EntityInstance, InstantiateError};
use crate::merge::{MergePolicy, DEFAULT_POLICY};
use crate::reference::EntityReference;
use crate::registry::{DefinitionError, DefinitionRegistry};

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("no entity definition found for '{reference}'")]
    DefinitionNotFound { reference: EntityReference },
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error("failed to instantiate '{reference}': {source}")]
    Instantiate {
        reference: EntityReference,
        #[source]
        source: InstantiateError,
    },
    #[error("{factory} has no create implementation")]
    NotImplemented { factory: &'static str },
}

/// Definition storage plus script listeners for one entity kind, and the
/// generic construction path shared by every concrete factory.
#[derive(Debug, Default, Clone)]
pub struct EntityFactory {
    definitions: DefinitionRegistry,
    behaviors: BehaviorManager,
}

impl EntityFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_entity_ref(&self, area: &str, id: u32) -> EntityReference {
        EntityReference::new(area, id)
    }

    pub fn definitions(&self) -> &DefinitionRegistry {
        &self.definitions
    }

    pub fn behaviors(&self) -> &BehaviorManager {
        &self.behaviors
    }

    pub fn set_definition(&mut self, reference: EntityReference, definition: Definition) {
        self.definitions.set_definition(reference, definition);
    }

    pub fn get_definition(
        &self,
        reference: &EntityReference,
        policy: &MergePolicy,
    ) -> Result<Option<Definition>, DefinitionError> {
        self.definitions.resolve(reference, policy)
    }

    pub fn add_script_listener(
        &mut self,
        reference: EntityReference,
        event: impl Into<String>,
        listener: ScriptListener,
    ) {
        self.behaviors.add_listener(reference, event, listener);
    }

    /// Resolves `reference` under `policy`, builds a `T` from it and attaches
    /// the listeners registered for exactly that reference.
    pub fn create_by_type<T: EntityInstance>(
        &self,
        area: &Area,
        reference: &EntityReference,
        policy: &MergePolicy,
    ) -> Result<T, FactoryError> {
        let definition = self.definitions.resolve(reference, policy)?.ok_or_else(|| {
            FactoryError::DefinitionNotFound {
                reference: reference.clone(),
            }
        })?;
        let mut entity = T::from_definition(area, reference, definition).map_err(|source| {
            FactoryError::Instantiate {
                reference: reference.clone(),
                source,
            }
        })?;

        let listeners_attached = self.behaviors.has_listeners(reference);
        if listeners_attached {
            self.behaviors.attach(reference, &mut entity);
        }
        debug!(
            entity_reference = %reference,
            area = area.name(),
            merge_policy = policy.name(),
            listeners_attached,
            "entity_created"
        );
        Ok(entity)
    }
}

/// Capability implemented by each entity-kind factory.
///
/// Implementors supply the shared [`EntityFactory`], a merge policy, and
/// `create`. The provided `create` fails with [`FactoryError::NotImplemented`].
pub trait Factory {
    type Entity: EntityInstance;

    fn core(&self) -> &EntityFactory;

    fn core_mut(&mut self) -> &mut EntityFactory;

    fn merge_policy(&self) -> &MergePolicy {
        &DEFAULT_POLICY
    }

    fn create(
        &self,
        _area: &Area,
        _reference: &EntityReference,
    ) -> Result<Self::Entity, FactoryError> {
        Err(FactoryError::NotImplemented {
            factory: std::any::type_name::<Self>(),
        })
    }

    fn create_entity_ref(&self, area: &str, id: u32) -> EntityReference {
        self.core().create_entity_ref(area, id)
    }

    fn set_definition(&mut self, reference: EntityReference, definition: Definition) {
        self.core_mut().set_definition(reference, definition);
    }

    fn get_definition(
        &self,
        reference: &EntityReference,
    ) -> Result<Option<Definition>, DefinitionError> {
        self.core().get_definition(reference, self.merge_policy())
    }

    fn merge_definitions(&self, def: &Definition, base: &Definition) -> Definition {
        self.merge_policy().merge(def, base)
    }

    fn add_script_listener(
        &mut self,
        reference: EntityReference,
        event: impl Into<String>,
        listener: ScriptListener,
    ) {
        self.core_mut().add_script_listener(reference, event, listener);
    }

    /// Builds a fresh instance from the current template of `entity`.
    /// Runtime state of `entity` is not copied.
    fn clone_entity(&self, entity: &Self::Entity) -> Result<Self::Entity, FactoryError> {
        self.create(entity.area(), entity.entity_reference())
    }
}
