use super::{Effect, SonanceWorld, logged};
use crate::backend::AuxSlotHandle;
use crate::effects::{EffectHooks, EffectId, EffectParams, NoHooks};
use crate::error::{Result, SonanceError};
use std::collections::BTreeSet;

impl SonanceWorld {
    /// Creates a built-in effect with default hooks.
    pub fn create_builtin_effect(&mut self, params: impl Into<EffectParams>) -> Result<EffectId> {
        self.create_effect(params, NoHooks)
    }

    /// Creates an effect object and its auxiliary slot, loaded with `params`.
    ///
    /// `hooks` receive the transport requests and notifications of every
    /// source bound to the effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the hardware cannot allocate the effect or the
    /// slot. Nothing is leaked on failure.
    pub fn create_effect(
        &mut self,
        params: impl Into<EffectParams>,
        hooks: impl EffectHooks + 'static,
    ) -> Result<EffectId> {
        let params = params.into();
        let backend = self.hardware.get_mut();

        let handle = backend
            .create_effect()
            .map_err(|e| SonanceError::backend("create_effect", e))?;
        let slot = match backend.create_aux_slot() {
            Ok(slot) => slot,
            Err(e) => {
                logged("delete_effect", backend.delete_effect(handle));
                return Err(SonanceError::backend("create_aux_slot", e));
            }
        };

        logged("set_effect_kind", backend.set_effect_kind(handle, params.kind()));
        logged("set_effect_params", backend.set_effect_params(handle, &params));
        logged("attach_effect", backend.attach_effect(slot, handle));

        let id = EffectId(self.allocate_id());
        log::debug!("Created {} ({:?})", id, params.kind());
        self.effects.insert(
            id,
            Effect {
                handle,
                slot,
                params,
                hooks: Box::new(hooks),
                sources: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    /// Destroys an effect. Every bound source is disconnected first, then
    /// the effect object and its slot are deleted.
    pub fn destroy_effect(&mut self, id: EffectId) -> bool {
        if !self.effects.contains_key(&id) {
            return false;
        }
        self.unbind_all_sources(id);

        if let Some(effect) = self.effects.remove(&id) {
            let backend = self.hardware.get_mut();
            logged("delete_effect", backend.delete_effect(effect.handle));
            logged("delete_aux_slot", backend.delete_aux_slot(effect.slot));
        }
        log::debug!("Destroyed {}", id);
        true
    }

    /// Overwrites the parameter block of an effect. Switching to another
    /// kind re-initializes the hardware effect type first.
    ///
    /// The change is heard once [`apply_effect`](Self::apply_effect) loads
    /// it into the effect's slot.
    pub fn set_effect_param(&mut self, id: EffectId, params: impl Into<EffectParams>) -> bool {
        let params = params.into();
        let Self {
            effects, hardware, ..
        } = self;
        let Some(effect) = effects.get_mut(&id) else {
            return false;
        };

        let backend = hardware.get_mut();
        if effect.params.kind() != params.kind() {
            log::debug!(
                "{} changes kind {:?} -> {:?}",
                id,
                effect.params.kind(),
                params.kind()
            );
            if logged("set_effect_kind", backend.set_effect_kind(effect.handle, params.kind()))
                .is_none()
            {
                return false;
            }
        }
        if logged(
            "set_effect_params",
            backend.set_effect_params(effect.handle, &params),
        )
        .is_none()
        {
            return false;
        }
        effect.params = params;
        true
    }

    /// Loads the effect's current parameters into its auxiliary slot.
    pub fn apply_effect(&mut self, id: EffectId) -> bool {
        let Some(effect) = self.effects.get(&id) else {
            return false;
        };
        let (slot, handle) = (effect.slot, effect.handle);
        logged(
            "attach_effect",
            self.hardware.get_mut().attach_effect(slot, handle),
        )
        .is_some()
    }

    pub fn effect_params(&self, id: EffectId) -> Option<&EffectParams> {
        self.effects.get(&id).map(|e| &e.params)
    }

    /// Auxiliary slot sources are routed into when bound to the effect.
    pub fn effect_slot(&self, id: EffectId) -> Option<AuxSlotHandle> {
        self.effects.get(&id).map(|e| e.slot)
    }

    pub fn has_effect(&self, id: EffectId) -> bool {
        self.effects.contains_key(&id)
    }
}
