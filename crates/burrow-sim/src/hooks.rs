use std::any::Any;
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use burrow_chunk::VoxelHandle;
use hashbrown::HashMap;

use crate::world::WorldContext;

pub type HookResult = Result<(), Box<dyn Error + Send + Sync>>;

type Hook = Arc<dyn Fn(&VoxelHandle, &dyn WorldContext) -> HookResult + Send + Sync>;

/// Named per-voxel update callbacks, registered by mods at load time.
///
/// A voxel type names its hook in the library; the update tick looks the name up here.
/// A hook that fails or panics is logged and skipped for that voxel only.
#[derive(Default)]
pub struct VoxelUpdateHooks {
    hooks: RwLock<HashMap<String, Hook>>,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

impl VoxelUpdateHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `name`. Returns `true` when an earlier hook was replaced.
    pub fn register_voxel_update_hook<F>(&self, name: impl Into<String>, callback: F) -> bool
    where
        F: Fn(&VoxelHandle, &dyn WorldContext) -> HookResult + Send + Sync + 'static,
    {
        let name = name.into();
        log::debug!("registered voxel update hook '{}'", name);
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(callback))
            .is_some()
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.hooks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the hook named `name` on `voxel`. Returns whether a hook ran to completion.
    pub fn try_invoke(&self, name: &str, voxel: &VoxelHandle, world: &dyn WorldContext) -> bool {
        let hook = {
            let hooks = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
            match hooks.get(name) {
                Some(h) => Arc::clone(h),
                None => return false,
            }
        };
        match catch_unwind(AssertUnwindSafe(|| hook(voxel, world))) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                log::warn!("voxel update hook '{}' failed at {:?}: {}", name, voxel.coordinate(), e);
                false
            }
            Err(payload) => {
                log::warn!(
                    "voxel update hook '{}' panicked at {:?}: {}",
                    name,
                    voxel.coordinate(),
                    panic_message(payload.as_ref())
                );
                false
            }
        }
    }
}

impl core::fmt::Debug for VoxelUpdateHooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let hooks = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_set().entries(hooks.keys()).finish()
    }
}
