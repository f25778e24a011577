//! Render contexts
//!
//! A render context stands in for the audio device: it fixes the rendering
//! sample rate and channel count for one mix and occupies one of a limited
//! number of slots while it is alive. Slots are returned on `close()` and
//! on drop, so a failed mix never leaks one.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::engine::buffer::{DecodedBuffer, OUTPUT_CHANNELS};
use crate::engine::decode::{AudioDecoder, SniffingDecoder};
use crate::error::{MixError, Result};
use crate::mix::RawAudioInput;

/// Lowest rendering rate a context accepts
pub const MIN_CONTEXT_SAMPLE_RATE: u32 = 3000;

/// Highest rendering rate a context accepts
pub const MAX_CONTEXT_SAMPLE_RATE: u32 = 768_000;

#[derive(Debug, Default)]
struct PoolState {
    active: AtomicUsize,
    next_id: AtomicU64,
}

/// Hands out render contexts at a fixed sample rate
#[derive(Debug, Clone)]
pub struct ContextPool {
    sample_rate: u32,
    max_active: usize,
    state: Arc<PoolState>,
}

impl ContextPool {
    /// Create a pool rendering at `sample_rate` with up to `max_active`
    /// simultaneously open contexts
    pub fn new(sample_rate: u32, max_active: usize) -> Self {
        Self {
            sample_rate,
            max_active,
            state: Arc::new(PoolState::default()),
        }
    }

    /// The rate every context from this pool renders at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of contexts currently open
    pub fn active_count(&self) -> usize {
        self.state.active.load(Ordering::Acquire)
    }

    /// Open a context
    ///
    /// # Errors
    /// * `ContextUnavailable` - rate out of range or every slot is taken
    pub fn acquire(&self) -> Result<RenderContext> {
        if !(MIN_CONTEXT_SAMPLE_RATE..=MAX_CONTEXT_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(MixError::ContextUnavailable {
                reason: format!(
                    "sample rate {} Hz outside {}..={} Hz",
                    self.sample_rate, MIN_CONTEXT_SAMPLE_RATE, MAX_CONTEXT_SAMPLE_RATE
                ),
            });
        }

        self.state
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                (active < self.max_active).then_some(active + 1)
            })
            .map_err(|active| MixError::ContextUnavailable {
                reason: format!("{} of {} render contexts in use", active, self.max_active),
            })?;

        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, sample_rate = self.sample_rate, "render context acquired");

        Ok(RenderContext {
            id,
            sample_rate: self.sample_rate,
            state: Arc::clone(&self.state),
        })
    }
}

/// Scoped handle on one render slot
///
/// Not `Clone`: exactly one owner releases the slot.
#[derive(Debug)]
pub struct RenderContext {
    id: u64,
    sample_rate: u32,
    state: Arc<PoolState>,
}

impl RenderContext {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Rendering sample rate, authoritative for the whole mix
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Rendering channel count (always stereo)
    pub fn channels(&self) -> usize {
        OUTPUT_CHANNELS
    }

    /// Release the slot now
    pub fn close(self) {
        debug!(id = self.id, "closing render context");
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::AcqRel);
        debug!(id = self.id, "render context released");
    }
}

/// Platform seam: decoding plus render-context acquisition
///
/// Swapping the backend changes where samples and contexts come from
/// without touching the renderer or encoder.
pub trait AudioBackend: Send + Sync {
    /// Decode one input into samples
    fn decode(&self, input: &RawAudioInput<'_>) -> Result<DecodedBuffer>;

    /// Open a scoped render context
    fn acquire_context(&self) -> Result<RenderContext>;
}

/// Default backend: sniffing decoder + in-process context pool
#[derive(Debug, Clone)]
pub struct NativeBackend<D = SniffingDecoder> {
    decoder: D,
    contexts: ContextPool,
}

impl NativeBackend<SniffingDecoder> {
    pub fn new(sample_rate: u32, max_active_contexts: usize) -> Self {
        Self::with_decoder(SniffingDecoder::new(), ContextPool::new(sample_rate, max_active_contexts))
    }
}

impl<D: AudioDecoder> NativeBackend<D> {
    pub fn with_decoder(decoder: D, contexts: ContextPool) -> Self {
        Self { decoder, contexts }
    }

    /// The pool contexts are drawn from
    pub fn contexts(&self) -> &ContextPool {
        &self.contexts
    }
}

impl<D: AudioDecoder> AudioBackend for NativeBackend<D> {
    fn decode(&self, input: &RawAudioInput<'_>) -> Result<DecodedBuffer> {
        debug!(role = %input.role, decoder = self.decoder.name(), bytes = input.as_bytes().len(), "decoding input");
        self.decoder.decode(input)
    }

    fn acquire_context(&self) -> Result<RenderContext> {
        self.contexts.acquire()
    }
}
