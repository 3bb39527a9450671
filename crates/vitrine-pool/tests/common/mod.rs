//! Shared fakes for vitrine-pool integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use vitrine_pool::{ComponentFactory, Engine, PooledComponent, ScriptedModel};
use vitrine_types::{ComponentKind, VitrineError};

// ---------------------------------------------------------------------------
// Fake components
// ---------------------------------------------------------------------------

/// Simulation fake with both capabilities and observable lifecycle flags.
#[derive(Default)]
pub struct DiffusionSim {
    stopped: AtomicBool,
    resets: AtomicUsize,
    halted: AtomicBool,
    showing: AtomicBool,
    fail_resets: AtomicBool,
}

impl DiffusionSim {
    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn was_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    pub fn set_showing(&self, showing: bool) {
        self.showing.store(showing, Ordering::SeqCst);
    }

    /// Makes every subsequent `reset` call fail.
    pub fn fail_resets(&self) {
        self.fail_resets.store(true, Ordering::SeqCst);
    }
}

impl Engine for DiffusionSim {
    fn stop_immediately(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn reset(&self) -> Result<(), VitrineError> {
        if self.fail_resets.load(Ordering::SeqCst) {
            return Err(VitrineError::internal("solver state corrupted"));
        }
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_showing(&self) -> bool {
        self.showing.load(Ordering::SeqCst)
    }
}

impl ScriptedModel for DiffusionSim {
    fn halt_script(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }
}

/// Viewer fake with only the engine capability.
#[derive(Default)]
pub struct StructureViewer {
    stopped: AtomicBool,
    resets: AtomicUsize,
}

impl StructureViewer {
    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Engine for StructureViewer {
    fn stop_immediately(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn reset(&self) -> Result<(), VitrineError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_showing(&self) -> bool {
        false
    }
}

/// Passive component with no capabilities at all.
pub struct Notepad {
    pub text: String,
}

// ---------------------------------------------------------------------------
// Kinds and factories
// ---------------------------------------------------------------------------

pub fn sim_kind() -> ComponentKind {
    ComponentKind::new("sim.diffusion2d").expect("kind")
}

pub fn viewer_kind() -> ComponentKind {
    ComponentKind::new("viewer.structure3d").expect("kind")
}

pub fn notepad_kind() -> ComponentKind {
    ComponentKind::new("ui.notepad").expect("kind")
}

pub fn sim_factory() -> ComponentFactory {
    Arc::new(|| {
        let sim = Arc::new(DiffusionSim::default());
        Ok(PooledComponent::new(sim.clone())
            .with_engine(sim.clone())
            .with_model(sim))
    })
}

pub fn viewer_factory() -> ComponentFactory {
    Arc::new(|| {
        let viewer = Arc::new(StructureViewer::default());
        Ok(PooledComponent::new(viewer.clone()).with_engine(viewer))
    })
}

pub fn notepad_factory() -> ComponentFactory {
    Arc::new(|| {
        Ok(PooledComponent::new(Arc::new(Notepad {
            text: String::new(),
        })))
    })
}

/// Factory that fails `failures` times before building normally.
pub fn flaky_sim_factory(failures: usize) -> ComponentFactory {
    let remaining = Arc::new(AtomicUsize::new(failures));
    Arc::new(move || {
        if remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(VitrineError::internal("native solver library unavailable"));
        }
        let sim = Arc::new(DiffusionSim::default());
        Ok(PooledComponent::new(sim.clone())
            .with_engine(sim.clone())
            .with_model(sim))
    })
}
