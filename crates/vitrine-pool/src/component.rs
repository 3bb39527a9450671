//! Capability contracts and registration bundles for pooled components.
//!
//! A pooled component may implement neither, either, or both capabilities.
//! Capability handles are attached when the component is built, so the pool
//! never inspects concrete types; new component kinds participate in the
//! lifecycle sweeps without any pool change.

use std::any::Any;
use std::sync::Arc;

use vitrine_types::VitrineError;

/// Capability for components that drive a worker thread or timer
/// (simulation engines, animated viewers).
///
/// Sweeps invoke these methods while holding the pool's registry lock, so
/// implementations must return promptly and must not call back into the
/// pool.
pub trait Engine: Send + Sync {
    /// Interrupts any running worker now, fire-and-forget.
    /// Must be safe to call when nothing is running.
    fn stop_immediately(&self);

    /// Restores the component to its default configuration.
    ///
    /// Only called on stopped, non-showing instances; behavior while the
    /// worker is still running is unspecified.
    fn reset(&self) -> Result<(), VitrineError>;

    /// Whether this component's view is currently attached to a visible
    /// window. Showing instances are never stopped or reset by the
    /// reset sweep.
    fn is_showing(&self) -> bool;
}

/// Capability for components that execute scripted command sequences in
/// the background, interruptible independent of [`Engine`] state.
pub trait ScriptedModel: Send + Sync {
    /// Cancels any in-progress scripted command sequence.
    ///
    /// Both sweeps call this, including while the instance is leased,
    /// so it must be idempotent and safe under a live lease.
    fn halt_script(&self);
}

/// Shared handle to the untyped component instance the document host
/// embeds. Hosts downcast to the concrete type they registered.
pub type InstanceHandle = Arc<dyn Any + Send + Sync>;

/// Builds one pooled component on demand.
///
/// Factories replace reflective construction: they take no arguments and
/// are retried exactly once by the pool on failure.
pub type ComponentFactory = Arc<dyn Fn() -> Result<PooledComponent, VitrineError> + Send + Sync>;

/// A freshly built component together with its capability handles.
pub struct PooledComponent {
    instance: InstanceHandle,
    engine: Option<Arc<dyn Engine>>,
    model: Option<Arc<dyn ScriptedModel>>,
}

impl PooledComponent {
    /// Wraps an instance with no capabilities attached.
    ///
    /// Such components are tracked and reused by the pool but never
    /// touched by the lifecycle sweeps.
    pub fn new(instance: InstanceHandle) -> Self {
        Self {
            instance,
            engine: None,
            model: None,
        }
    }

    /// Attaches the [`Engine`] capability handle.
    pub fn with_engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Attaches the [`ScriptedModel`] capability handle.
    pub fn with_model(mut self, model: Arc<dyn ScriptedModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        InstanceHandle,
        Option<Arc<dyn Engine>>,
        Option<Arc<dyn ScriptedModel>>,
    ) {
        (self.instance, self.engine, self.model)
    }
}
