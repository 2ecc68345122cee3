//! External image store seam.
//!
//! The core treats photo url/handle pairs as opaque. The only call it ever
//! makes back into the image layer is releasing a handle when an owner
//! deletes a pending complaint.

use crate::error::CoreResult;
use std::sync::Mutex;

pub trait ImageStore: Send + Sync {
    fn delete(&self, handle: &str) -> CoreResult<()>;
}

/// Default wiring when no image layer is attached (demo runner, tests that
/// don't care about asset cleanup).
pub struct NoopImageStore;

impl ImageStore for NoopImageStore {
    fn delete(&self, handle: &str) -> CoreResult<()> {
        log::debug!("image delete skipped (noop store): {handle}");
        Ok(())
    }
}

/// Records deleted handles; used by the integration tests to assert that an
/// owner delete releases the photo asset.
#[derive(Default)]
pub struct RecordingImageStore {
    deleted: Mutex<Vec<String>>,
}

impl RecordingImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deleted_handles(&self) -> Vec<String> {
        self.deleted.lock().expect("image store lock poisoned").clone()
    }
}

impl ImageStore for RecordingImageStore {
    fn delete(&self, handle: &str) -> CoreResult<()> {
        self.deleted.lock().expect("image store lock poisoned").push(handle.to_string());
        Ok(())
    }
}
