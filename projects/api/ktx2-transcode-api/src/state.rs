//! Per-thread scratch decode state.

use crate::error::{TranscodeError, TranscodeResult};
use ktx2_transcode_bridge::{Bridge, TranscodeStateId};
use tracing::warn;

/// Scratch state that lets several threads transcode slices of the same
/// container without sharing the engine's internal decode buffers.
///
/// Each thread creates and owns its own state. It is destroyed on drop.
pub struct TranscodeState<'t> {
    bridge: &'t Bridge,
    id: Option<TranscodeStateId>,
}

impl<'t> TranscodeState<'t> {
    pub(crate) fn create(bridge: &'t Bridge) -> TranscodeResult<Self> {
        let id = bridge
            .create_transcode_state()?
            .ok_or(TranscodeError::StateCreationFailed)?;
        Ok(Self {
            bridge,
            id: Some(id),
        })
    }

    pub(crate) fn id(&self) -> Option<&TranscodeStateId> {
        self.id.as_ref()
    }

    /// Destroys the state, reporting failure.
    pub fn destroy(mut self) -> TranscodeResult<()> {
        match self.id.take() {
            Some(id) => Ok(self.bridge.destroy_transcode_state(id)?),
            None => Ok(()),
        }
    }
}

impl Drop for TranscodeState<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            if let Err(e) = self.bridge.destroy_transcode_state(id) {
                warn!(error = %e, "failed to destroy transcode state");
            }
        }
    }
}

impl core::fmt::Debug for TranscodeState<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TranscodeState")
            .field("live", &self.id.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_prelude::*;

    #[test]
    fn states_are_destroyed_on_drop_and_destroy() {
        let engine = ReferenceEngine::new();
        let transcoder = Transcoder::new(Bridge::new(engine.clone()));

        let first = transcoder.create_state().unwrap();
        let second = transcoder.create_state().unwrap();
        assert_eq!(engine.live_states(), 2);

        first.destroy().unwrap();
        assert_eq!(engine.live_states(), 1);
        drop(second);
        assert_eq!(engine.live_states(), 0);
    }
}
