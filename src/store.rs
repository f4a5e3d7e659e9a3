use std::sync::{Arc, RwLock};

/// Lifecycle of the processing worker as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineStatus {
    pub state: PipelineState,
    pub person_count: usize,
    pub frames_processed: u64,
}

struct Inner {
    state: PipelineState,
    frame_jpeg: Option<Vec<u8>>,
    person_count: usize,
    frames_processed: u64,
}

/// Latest annotated frame plus run status, shared between the worker thread
/// and the HTTP handlers. The browser polls; only the newest frame matters.
#[derive(Clone)]
pub struct FrameStore {
    inner: Arc<RwLock<Inner>>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state: PipelineState::Idle,
                frame_jpeg: None,
                person_count: 0,
                frames_processed: 0,
            })),
        }
    }

    /// Reset counters and enter the running state for a fresh video.
    pub fn begin(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.state = PipelineState::Running;
        inner.frame_jpeg = None;
        inner.person_count = 0;
        inner.frames_processed = 0;
    }

    pub fn publish(&self, frame_jpeg: Vec<u8>, person_count: usize) {
        let mut inner = self.inner.write().unwrap();
        inner.frame_jpeg = Some(frame_jpeg);
        inner.person_count = person_count;
        inner.frames_processed += 1;
    }

    pub fn set_state(&self, state: PipelineState) {
        self.inner.write().unwrap().state = state;
    }

    pub fn latest_frame(&self) -> Option<Vec<u8>> {
        self.inner.read().unwrap().frame_jpeg.clone()
    }

    pub fn status(&self) -> PipelineStatus {
        let inner = self.inner.read().unwrap();
        PipelineStatus {
            state: inner.state,
            person_count: inner.person_count,
            frames_processed: inner.frames_processed,
        }
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_with_no_frame() {
        let store = FrameStore::new();
        assert_eq!(store.status().state, PipelineState::Idle);
        assert!(store.latest_frame().is_none());
    }

    #[test]
    fn publish_updates_counters_and_frame() {
        let store = FrameStore::new();
        store.begin();
        store.publish(vec![1, 2, 3], 2);
        store.publish(vec![4, 5], 1);

        let status = store.status();
        assert_eq!(status.state, PipelineState::Running);
        assert_eq!(status.person_count, 1);
        assert_eq!(status.frames_processed, 2);
        assert_eq!(store.latest_frame(), Some(vec![4, 5]));
    }

    #[test]
    fn begin_resets_a_previous_run() {
        let store = FrameStore::new();
        store.begin();
        store.publish(vec![1], 3);
        store.set_state(PipelineState::Stopped);

        store.begin();
        let status = store.status();
        assert_eq!(status.state, PipelineState::Running);
        assert_eq!(status.frames_processed, 0);
        assert_eq!(status.person_count, 0);
        assert!(store.latest_frame().is_none());
    }
}
