//! Process Lifecycle Module
//!
//! Collects shutdown hooks from components and runs them once when the
//! process terminates.

use parking_lot::Mutex;
use tracing::{debug, info};

type Hook = Box<dyn FnOnce() + Send + 'static>;

struct ShutdownHook {
    name: String,
    hook: Hook,
}

#[derive(Default)]
struct HookRegistry {
    hooks: Vec<ShutdownHook>,
    shut_down: bool,
}

/// Registry of shutdown hooks passed explicitly to components.
///
/// # Example
/// ```
/// use cache_engine::Lifecycle;
///
/// let lifecycle = Lifecycle::new();
/// lifecycle.register_shutdown_hook("flush", || println!("flushing"));
/// assert_eq!(lifecycle.shutdown(), 1);
/// assert_eq!(lifecycle.shutdown(), 0);
/// ```
#[derive(Default)]
pub struct Lifecycle {
    registry: Mutex<HookRegistry>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook to run during shutdown.
    ///
    /// Hooks registered after shutdown has begun run immediately.
    pub fn register_shutdown_hook<F>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let mut registry = self.registry.lock();
        if registry.shut_down {
            drop(registry);
            debug!("Running late shutdown hook '{}'", name);
            hook();
            return;
        }
        debug!("Registered shutdown hook '{}'", name);
        registry.hooks.push(ShutdownHook {
            name,
            hook: Box::new(hook),
        });
    }

    /// Runs every registered hook once, in registration order.
    ///
    /// Returns the number of hooks run; later calls run nothing.
    pub fn shutdown(&self) -> usize {
        let hooks = {
            let mut registry = self.registry.lock();
            registry.shut_down = true;
            std::mem::take(&mut registry.hooks)
        };

        let count = hooks.len();
        for ShutdownHook { name, hook } in hooks {
            info!("Running shutdown hook '{}'", name);
            hook();
        }
        count
    }

    pub fn is_shut_down(&self) -> bool {
        self.registry.lock().shut_down
    }

    pub fn hook_count(&self) -> usize {
        self.registry.lock().hooks.len()
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("Lifecycle")
            .field("hooks", &registry.hooks.iter().map(|h| &h.name).collect::<Vec<_>>())
            .field("shut_down", &registry.shut_down)
            .finish()
    }
}
