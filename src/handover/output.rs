use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::BufferError;
use crate::models::AudioChunk;
use crate::player::PlayerSinks;
use super::slot::SlotId;

/// Consumer of the active slot's decoded audio
pub type AudioSink = Arc<dyn Fn(AudioChunk) + Send + Sync>;

/// RGBA frame storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameImage {
    /// Black frame of the given geometry. Allocation failure is reported, not aborted on.
    pub fn allocate(width: u32, height: u32) -> Result<Self, BufferError> {
        let bytes = width as usize * height as usize * 4;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| BufferError::FrameAllocationFailed { width, height })?;
        data.resize(bytes, 0);
        Ok(Self { width, height, data })
    }

    pub fn has_geometry(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height && !self.data.is_empty()
    }

    pub fn fill_black(&mut self) {
        self.data.iter_mut().for_each(|b| *b = 0);
    }

    pub fn is_black(&self) -> bool {
        self.data.iter().all(|b| *b == 0)
    }

    fn copy_from(&mut self, src: &[u8]) {
        let n = src.len().min(self.data.len());
        self.data[..n].copy_from_slice(&src[..n]);
    }
}

/// State shared between the orchestrator and player callbacks. A role swap
/// changes `active` under this lock, so a callback either lands entirely
/// before or entirely after the swap.
pub(crate) struct OutputState {
    pub(crate) active: SlotId,
    /// Frames are accepted only while playback is running
    pub(crate) presenting: bool,
    pub(crate) frame: FrameImage,
    pub(crate) frame_updated: bool,
    pub(crate) preview: FrameImage,
    pub(crate) preview_updated: bool,
    pub(crate) audio_sink: Option<AudioSink>,
    pub(crate) stale_callbacks: u64,
}

/// Cloneable handle to an orchestrator's output. This is what the node
/// registry publishes and what an audio tap binds to.
#[derive(Clone)]
pub struct OutputHandle {
    state: Arc<Mutex<OutputState>>,
}

impl OutputHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(OutputState {
                active: SlotId::First,
                presenting: false,
                frame: FrameImage::default(),
                frame_updated: false,
                preview: FrameImage::default(),
                preview_updated: false,
                audio_sink: None,
                stale_callbacks: 0,
            })),
        }
    }

    /// Install or remove the receiver of the active slot's audio
    pub fn set_audio_sink(&self, sink: Option<AudioSink>) {
        self.lock().audio_sink = sink;
    }

    pub fn has_audio_sink(&self) -> bool {
        self.lock().audio_sink.is_some()
    }

    pub fn active_slot(&self) -> SlotId {
        self.lock().active
    }

    /// Callbacks that arrived from a slot that was not active
    pub fn stale_callbacks(&self) -> u64 {
        self.lock().stale_callbacks
    }

    pub fn same_output(&self, other: &OutputHandle) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, OutputState> {
        self.state.lock().unwrap()
    }

    /// Callbacks for the player in `slot`. They act only while `slot` is active.
    pub(crate) fn sinks_for(&self, slot: SlotId) -> PlayerSinks {
        let frame_state = self.state.clone();
        let audio_state = self.state.clone();
        PlayerSinks {
            on_frame: Arc::new(move |data: &[u8]| {
                let mut state = frame_state.lock().unwrap();
                if state.active != slot {
                    state.stale_callbacks += 1;
                    return;
                }
                if state.presenting && !state.frame.data.is_empty() {
                    state.frame.copy_from(data);
                    state.frame_updated = true;
                }
            }),
            on_audio: Arc::new(move |chunk: AudioChunk| {
                let mut state = audio_state.lock().unwrap();
                if state.active != slot {
                    state.stale_callbacks += 1;
                    return;
                }
                // Delivered under the lock so a swap cannot interleave
                if let Some(sink) = &state.audio_sink {
                    sink(chunk);
                }
            }),
        }
    }

    /// Callbacks for the preview player. Its audio is discarded.
    pub(crate) fn preview_sinks(&self) -> PlayerSinks {
        let state = self.state.clone();
        PlayerSinks {
            on_frame: Arc::new(move |data: &[u8]| {
                let mut state = state.lock().unwrap();
                if !state.preview.data.is_empty() {
                    state.preview.copy_from(data);
                    state.preview_updated = true;
                }
            }),
            on_audio: Arc::new(|_| {}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn chunk() -> AudioChunk {
        AudioChunk::from_i16(1000, 1, Duration::ZERO, &[1, 2])
    }

    #[test]
    fn test_frame_image_allocate() {
        let frame = FrameImage::allocate(4, 2).unwrap();
        assert_eq!(frame.data.len(), 32);
        assert!(frame.is_black());
        assert!(frame.has_geometry(4, 2));
        assert!(!frame.has_geometry(2, 4));
    }

    #[test]
    fn test_frames_only_from_active_presenting_slot() {
        let handle = OutputHandle::new();
        {
            let mut state = handle.lock();
            state.frame = FrameImage::allocate(1, 1).unwrap();
        }
        let first = handle.sinks_for(SlotId::First);
        let second = handle.sinks_for(SlotId::Second);

        // Not presenting yet
        (first.on_frame)(&[9, 9, 9, 9]);
        assert!(!handle.lock().frame_updated);

        handle.lock().presenting = true;
        (second.on_frame)(&[7, 7, 7, 7]);
        assert!(!handle.lock().frame_updated);
        assert_eq!(handle.stale_callbacks(), 1);

        (first.on_frame)(&[9, 9, 9, 9]);
        let state = handle.lock();
        assert!(state.frame_updated);
        assert_eq!(state.frame.data, vec![9, 9, 9, 9]);
    }

    #[test]
    fn test_audio_follows_active_slot() {
        let handle = OutputHandle::new();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = received.clone();
        handle.set_audio_sink(Some(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));
        assert!(handle.has_audio_sink());

        let first = handle.sinks_for(SlotId::First);
        let second = handle.sinks_for(SlotId::Second);
        (first.on_audio)(chunk());
        (second.on_audio)(chunk());
        assert_eq!(received.load(Ordering::SeqCst), 1);

        handle.lock().active = SlotId::Second;
        (first.on_audio)(chunk());
        (second.on_audio)(chunk());
        assert_eq!(received.load(Ordering::SeqCst), 2);
        assert_eq!(handle.active_slot(), SlotId::Second);
    }

    #[test]
    fn test_same_output_identity() {
        let a = OutputHandle::new();
        let b = OutputHandle::new();
        assert!(a.same_output(&a.clone()));
        assert!(!a.same_output(&b));
    }

    #[test]
    fn test_preview_frames_need_allocation() {
        let handle = OutputHandle::new();
        let sinks = handle.preview_sinks();
        (sinks.on_frame)(&[1, 2, 3, 4]);
        assert!(!handle.lock().preview_updated);

        handle.lock().preview = FrameImage::allocate(1, 1).unwrap();
        (sinks.on_frame)(&[1, 2, 3, 4]);
        assert_eq!(handle.lock().preview.data, vec![1, 2, 3, 4]);
    }
}
