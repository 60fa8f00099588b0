//! Binding set - one binding per configured mapping entry

use crate::binding::{BindingOptions, ControlBinding};
use crate::error::BindingError;
use crate::handles::{ControlSurface, ParameterSource};
use rasm_params::{ParameterId, ParameterRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// One row of the declarative control -> parameter table
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub control: String,
    /// Registry key, also used to resolve the engine parameter (name, then id)
    pub parameter: ParameterId,
    pub options: BindingOptions,
}

/// Everything a binding set needs from the outside world
///
/// Constructed once after the engine is up and passed explicitly; no
/// binding reaches for global state.
#[derive(Clone)]
pub struct SyncContext {
    registry: Arc<ParameterRegistry>,
    source: Arc<dyn ParameterSource>,
}

impl SyncContext {
    pub fn new(registry: Arc<ParameterRegistry>, source: Arc<dyn ParameterSource>) -> Self {
        Self { registry, source }
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn source(&self) -> &Arc<dyn ParameterSource> {
        &self.source
    }
}

/// A mapping entry that did not produce a binding
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBinding {
    pub control: String,
    pub parameter: ParameterId,
    pub reason: BindingError,
}

/// All live bindings for one control surface
pub struct BindingSet {
    bindings: Vec<ControlBinding>,
    skipped: Vec<SkippedBinding>,
    source: Arc<dyn ParameterSource>,
}

impl BindingSet {
    /// Create a binding for every entry whose endpoints both exist
    ///
    /// Failures are logged and recorded; they never stop the other entries.
    pub fn build(ctx: &SyncContext, surface: &dyn ControlSurface, entries: &[MappingEntry]) -> Self {
        let mut bindings = Vec::with_capacity(entries.len());
        let mut skipped = Vec::new();

        for entry in entries {
            match Self::bind_entry(ctx, surface, entry) {
                Ok(binding) => bindings.push(binding),
                Err(reason) => {
                    warn!(
                        control = %entry.control,
                        parameter = %entry.parameter,
                        error = %reason,
                        "skipping binding"
                    );
                    skipped.push(SkippedBinding {
                        control: entry.control.clone(),
                        parameter: entry.parameter.clone(),
                        reason,
                    });
                }
            }
        }

        info!(bound = bindings.len(), skipped = skipped.len(), "binding set ready");
        Self {
            bindings,
            skipped,
            source: ctx.source.clone(),
        }
    }

    fn bind_entry(
        ctx: &SyncContext,
        surface: &dyn ControlSurface,
        entry: &MappingEntry,
    ) -> Result<ControlBinding, BindingError> {
        let spec = ctx.registry.lookup(&entry.parameter)?;
        entry.options.validate()?;
        let control = surface
            .control(&entry.control)
            .ok_or_else(|| BindingError::ControlNotFound(entry.control.clone()))?;
        let parameter = ctx
            .source
            .resolve(&entry.parameter)
            .ok_or_else(|| BindingError::ParameterNotFound(entry.parameter.clone()))?;
        ControlBinding::bind(control, parameter, spec, entry.options)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControlBinding> {
        self.bindings.iter()
    }

    /// Binding for a control id
    pub fn get(&self, control: &str) -> Option<&ControlBinding> {
        self.bindings.iter().find(|b| b.control_id() == control)
    }

    /// Entries that were not bound, with the reason
    pub fn skipped(&self) -> &[SkippedBinding] {
        &self.skipped
    }

    /// Run one poll step on every binding whose sync mode polls
    ///
    /// Push-only bindings are left alone. Returns the number polled.
    pub fn poll_all(&self) -> usize {
        let mut polled = 0;
        for binding in self.bindings.iter().filter(|b| b.options().sync.uses_poll()) {
            binding.poll_now();
            polled += 1;
        }
        polled
    }

    /// Tear down bindings whose control or parameter has disappeared
    ///
    /// Returns the number of bindings removed.
    pub fn prune(&mut self, surface: &dyn ControlSurface) -> usize {
        let parameters = self.source.parameters();
        let before = self.bindings.len();
        self.bindings.retain_mut(|binding| {
            let has_control = surface.control(binding.control_id()).is_some();
            let has_parameter = parameters.iter().any(|p| p.id() == binding.parameter_id());
            if has_control && has_parameter {
                return true;
            }
            warn!(
                control = %binding.control_id(),
                parameter = %binding.parameter_id(),
                has_control,
                has_parameter,
                "endpoint disappeared, removing binding"
            );
            binding.teardown();
            false
        });
        before - self.bindings.len()
    }

    /// Tear down every binding
    pub fn teardown(&mut self) {
        for binding in &mut self.bindings {
            binding.teardown();
        }
        self.bindings.clear();
    }
}

impl Drop for BindingSet {
    fn drop(&mut self) {
        self.teardown();
    }
}
