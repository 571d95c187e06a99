//! A deterministic engine that runs in-process.
//!
//! It implements the full engine ABI against a simulated heap, answers the
//! format helpers from the tables in `ktx2-transcode-common`, and understands
//! its own trivial container format ([`ReferenceContainer`]). Transcoding to
//! RGBA32 copies the stored pixels; every other target produces a
//! deterministic byte pattern of the correct size.
//!
//! Cloning the engine shares its state, which lets tests keep a handle for
//! inspecting leaks after moving the engine into a [`Bridge`](crate::Bridge).

mod container;
mod heap;

pub use container::ReferenceContainer;

use crate::engine::{
    BackendKind, ContainerQuery, SliceQuery, SourceFormatQuery, TargetFormatQuery, TranscodeCall,
    TranscoderEngine,
};
use crate::error::{BridgeError, BridgeResult};
use container::ParsedContainer;
use heap::SimulatedHeap;
use ktx2_transcode_common::{SliceIndex, SourceBlockFormat, TargetFormat};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Version number reported by [`ReferenceEngine`].
pub const REFERENCE_ENGINE_VERSION: u32 = 0x0200;

const DEFAULT_HEAP_CAPACITY: usize = 16 * 1024 * 1024;

/// How long a call holds the built-in decode state before doing its work.
const SHARED_STATE_HOLD: Duration = Duration::from_micros(200);

struct OpenContainer {
    parsed: ParsedContainer,
    started: bool,
}

struct ReferenceState {
    heap: SimulatedHeap,
    containers: BTreeMap<u64, OpenContainer>,
    states: BTreeSet<u64>,
    next_handle: u64,
    invalid_frees: usize,
    invalid_closes: usize,
    transcode_calls: usize,
    debug_printf: bool,
    fail_transcodes: bool,
}

impl ReferenceState {
    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Watches calls that use a container's built-in decode state.
///
/// The real engine does not guard that state, so two such calls on one
/// container running at once is a data race there. Here it is only counted.
#[derive(Default)]
struct SharedStateTracker {
    in_flight: Mutex<BTreeMap<u64, usize>>,
    overlaps: AtomicUsize,
}

struct SharedStateGuard<'a> {
    tracker: &'a SharedStateTracker,
    handle: u64,
}

impl SharedStateTracker {
    fn enter(&self, handle: u64) -> SharedStateGuard<'_> {
        {
            let mut in_flight = self.in_flight.lock();
            let count = in_flight.entry(handle).or_insert(0);
            if *count > 0 {
                self.overlaps.fetch_add(1, Ordering::Relaxed);
            }
            *count += 1;
        }
        std::thread::sleep(SHARED_STATE_HOLD);
        SharedStateGuard {
            tracker: self,
            handle,
        }
    }
}

impl Drop for SharedStateGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.tracker.in_flight.lock();
        if let Some(count) = in_flight.get_mut(&self.handle) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(&self.handle);
            }
        }
    }
}

/// In-process engine with a simulated heap.
#[derive(Clone)]
pub struct ReferenceEngine {
    state: Arc<Mutex<ReferenceState>>,
    shared: Arc<SharedStateTracker>,
}

impl ReferenceEngine {
    /// Engine with a 16 MiB heap.
    pub fn new() -> Self {
        Self::with_heap_capacity(DEFAULT_HEAP_CAPACITY)
    }

    /// Engine with a heap of `capacity` bytes.
    pub fn with_heap_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ReferenceState {
                heap: SimulatedHeap::new(capacity),
                containers: BTreeMap::new(),
                states: BTreeSet::new(),
                next_handle: 0,
                invalid_frees: 0,
                invalid_closes: 0,
                transcode_calls: 0,
                debug_printf: false,
                fail_transcodes: false,
            })),
            shared: Arc::default(),
        }
    }

    /// Makes every subsequent transcode report failure, after writing nothing.
    pub fn set_fail_transcodes(&self, fail: bool) {
        self.state.lock().fail_transcodes = fail;
    }

    /// Allocations not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.state.lock().heap.live_allocations()
    }

    /// Frees of addresses that were not live allocations.
    pub fn invalid_frees(&self) -> usize {
        self.state.lock().invalid_frees
    }

    /// Closes of handles that were not open.
    pub fn invalid_closes(&self) -> usize {
        self.state.lock().invalid_closes
    }

    /// Containers not yet closed.
    pub fn open_containers(&self) -> usize {
        self.state.lock().containers.len()
    }

    /// Transcode states not yet destroyed.
    pub fn live_states(&self) -> usize {
        self.state.lock().states.len()
    }

    /// Number of transcode calls made, successful or not.
    pub fn transcode_calls(&self) -> usize {
        self.state.lock().transcode_calls
    }

    /// Times a start or a transcode without scratch state began while another
    /// one on the same container was still running.
    pub fn shared_state_overlaps(&self) -> usize {
        self.shared.overlaps.load(Ordering::Relaxed)
    }

    /// Whether debug printing was last enabled.
    pub fn debug_printf_enabled(&self) -> bool {
        self.state.lock().debug_printf
    }

    fn with_container<R>(&self, handle: u64, f: impl FnOnce(&ParsedContainer) -> R) -> Option<R> {
        self.state
            .lock()
            .containers
            .get(&handle)
            .map(|open| f(&open.parsed))
    }
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ReferenceEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ReferenceEngine")
            .field("heap_capacity", &state.heap.capacity())
            .field("live_allocations", &state.heap.live_allocations())
            .field("open_containers", &state.containers.len())
            .finish_non_exhaustive()
    }
}

/// Whether the reference engine can produce `target` from `source`.
///
/// HDR sources only feed HDR targets and LDR sources only LDR targets. ASTC
/// targets additionally need the source's exact block size.
fn supports(target: TargetFormat, source: SourceBlockFormat) -> bool {
    if target.is_hdr() != source.is_hdr() {
        return false;
    }
    if target.is_astc() {
        return target.block_dims() == Some(source.block_dims());
    }
    true
}

fn bool_u32(value: bool) -> u32 {
    u32::from(value)
}

fn oob(offset: u64, len: usize, capacity: usize) -> BridgeError {
    BridgeError::OutOfBounds {
        offset: usize::try_from(offset).unwrap_or(usize::MAX),
        len,
        capacity,
    }
}

/// Deterministic stand-in for encoded block data.
fn synthetic_bytes(out: &mut [u8], target: TargetFormat, slice: SliceIndex, seed: &[u8]) {
    let salt = target.as_raw() as u8 ^ (slice.level as u8).rotate_left(4) ^ slice.face as u8;
    for (i, byte) in out.iter_mut().enumerate() {
        let source = seed.get(i % seed.len().max(1)).copied().unwrap_or(0);
        *byte = source ^ salt ^ (i as u8);
    }
}

impl TranscoderEngine for ReferenceEngine {
    fn backend(&self) -> BackendKind {
        BackendKind::Reference
    }

    fn alloc(&self, size: u64) -> BridgeResult<u64> {
        let Ok(size) = usize::try_from(size) else {
            return Ok(0);
        };
        Ok(self.state.lock().heap.allocate(size).map_or(0, |a| a as u64))
    }

    fn free(&self, address: u64) -> BridgeResult<()> {
        let mut state = self.state.lock();
        let freed = usize::try_from(address).is_ok_and(|a| state.heap.free(a));
        if !freed {
            state.invalid_frees += 1;
        }
        Ok(())
    }

    unsafe fn write_memory(&self, address: u64, data: &[u8]) -> BridgeResult<()> {
        let mut state = self.state.lock();
        let capacity = state.heap.capacity();
        let target = usize::try_from(address)
            .ok()
            .and_then(|a| state.heap.bytes_mut(a, data.len()))
            .ok_or_else(|| oob(address, data.len(), capacity))?;
        target.copy_from_slice(data);
        Ok(())
    }

    unsafe fn read_memory(&self, address: u64, out: &mut [u8]) -> BridgeResult<()> {
        let state = self.state.lock();
        let source = usize::try_from(address)
            .ok()
            .and_then(|a| state.heap.bytes(a, out.len()))
            .ok_or_else(|| oob(address, out.len(), state.heap.capacity()))?;
        out.copy_from_slice(source);
        Ok(())
    }

    fn version(&self) -> BridgeResult<u32> {
        Ok(REFERENCE_ENGINE_VERSION)
    }

    fn enable_debug_printf(&self, enabled: bool) -> BridgeResult<()> {
        self.state.lock().debug_printf = enabled;
        Ok(())
    }

    fn source_format_query(&self, query: SourceFormatQuery, format: u32) -> BridgeResult<u32> {
        let Ok(format) = SourceBlockFormat::try_from(format) else {
            return Ok(0);
        };
        Ok(match query {
            SourceFormatQuery::IsXuastcLdr => bool_u32(format.is_xuastc_ldr()),
            SourceFormatQuery::IsAstcLdr => bool_u32(format.is_astc_ldr()),
            SourceFormatQuery::BlockWidth => format.block_width(),
            SourceFormatQuery::BlockHeight => format.block_height(),
            SourceFormatQuery::IsHdr => bool_u32(format.is_hdr()),
            SourceFormatQuery::IsLdr => bool_u32(format.is_ldr()),
        })
    }

    fn target_format_query(&self, query: TargetFormatQuery, format: u32) -> BridgeResult<u32> {
        let Ok(format) = TargetFormat::try_from(format) else {
            return Ok(0);
        };
        Ok(match query {
            TargetFormatQuery::BytesPerBlockOrPixel => format.bytes_per_block_or_pixel(),
            TargetFormatQuery::HasAlpha => bool_u32(format.has_alpha()),
            TargetFormatQuery::IsHdr => bool_u32(format.is_hdr()),
            TargetFormatQuery::IsLdr => bool_u32(format.is_ldr()),
            TargetFormatQuery::IsAstc => bool_u32(format.is_astc()),
            TargetFormatQuery::IsUncompressed => bool_u32(format.is_uncompressed()),
            TargetFormatQuery::UncompressedBytesPerPixel => format.uncompressed_bytes_per_pixel(),
            TargetFormatQuery::BlockWidth => format.block_width(),
            TargetFormatQuery::BlockHeight => format.block_height(),
        })
    }

    fn matching_target(&self, source_format: u32) -> BridgeResult<u32> {
        Ok(SourceBlockFormat::try_from(source_format)
            .map_or(u32::MAX, |format| format.matching_target().as_raw()))
    }

    fn is_format_supported(&self, target_format: u32, source_format: u32) -> BridgeResult<u32> {
        let (Ok(target), Ok(source)) = (
            TargetFormat::try_from(target_format),
            SourceBlockFormat::try_from(source_format),
        ) else {
            return Ok(0);
        };
        Ok(bool_u32(supports(target, source)))
    }

    fn transcoded_size(&self, target_format: u32, width: u32, height: u32) -> BridgeResult<u32> {
        Ok(TargetFormat::try_from(target_format)
            .map_or(0, |format| format.transcoded_size_in_bytes(width, height)))
    }

    fn ktx2_open(&self, address: u64, len: u32) -> BridgeResult<u64> {
        let mut state = self.state.lock();
        let parsed = usize::try_from(address)
            .ok()
            .and_then(|a| state.heap.bytes(a, len as usize))
            .and_then(ParsedContainer::parse);
        let Some(parsed) = parsed else {
            return Ok(0);
        };

        let handle = state.next_handle();
        state.containers.insert(
            handle,
            OpenContainer {
                parsed,
                started: false,
            },
        );
        Ok(handle)
    }

    fn ktx2_close(&self, handle: u64) -> BridgeResult<()> {
        let mut state = self.state.lock();
        if state.containers.remove(&handle).is_none() {
            state.invalid_closes += 1;
        }
        Ok(())
    }

    fn container_query(&self, query: ContainerQuery, handle: u64) -> BridgeResult<u32> {
        Ok(self
            .with_container(handle, |c| {
                let source = c.source_format;
                match query {
                    ContainerQuery::Width => c.width,
                    ContainerQuery::Height => c.height,
                    ContainerQuery::Levels => c.levels,
                    ContainerQuery::Faces => c.faces,
                    ContainerQuery::Layers => c.layers,
                    ContainerQuery::SourceFormat => source.as_raw(),
                    ContainerQuery::BlockWidth => source.block_width(),
                    ContainerQuery::BlockHeight => source.block_height(),
                    ContainerQuery::IsEtc1s => bool_u32(source == SourceBlockFormat::Etc1s),
                    ContainerQuery::IsUastcLdr4x4 => {
                        bool_u32(source == SourceBlockFormat::UastcLdr4x4)
                    }
                    ContainerQuery::IsHdr => bool_u32(source.is_hdr()),
                    ContainerQuery::IsHdr4x4 => bool_u32(source == SourceBlockFormat::UastcHdr4x4),
                    ContainerQuery::IsHdr6x6 => bool_u32(matches!(
                        source,
                        SourceBlockFormat::AstcHdr6x6 | SourceBlockFormat::UastcHdr6x6
                    )),
                    ContainerQuery::IsLdr => bool_u32(source.is_ldr()),
                    ContainerQuery::IsAstcLdr => bool_u32(source.is_astc_ldr()),
                    ContainerQuery::IsXuastcLdr => bool_u32(source.is_xuastc_ldr()),
                    ContainerQuery::HasAlpha => bool_u32(c.alpha),
                    ContainerQuery::IsSrgb => bool_u32(c.srgb),
                    ContainerQuery::IsVideo => bool_u32(c.video),
                    ContainerQuery::DfdColorModel => c.dfd[0],
                    ContainerQuery::DfdColorPrimaries => c.dfd[1],
                    ContainerQuery::DfdTransferFunction => c.dfd[2],
                    ContainerQuery::DfdFlags => c.dfd[3],
                    ContainerQuery::DfdTotalSamples => c.dfd[4],
                    ContainerQuery::DfdChannelId0 => c.dfd[5],
                    ContainerQuery::DfdChannelId1 => c.dfd[6],
                }
            })
            .unwrap_or(0))
    }

    fn nit_multiplier(&self, handle: u64) -> BridgeResult<f32> {
        Ok(self
            .with_container(handle, |c| c.nit_multiplier)
            .unwrap_or(0.0))
    }

    fn slice_query(
        &self,
        query: SliceQuery,
        handle: u64,
        level: u32,
        layer: u32,
        face: u32,
    ) -> BridgeResult<u32> {
        let slice = SliceIndex::new(level, layer, face);
        Ok(self
            .with_container(handle, |c| {
                if !c.contains(slice) {
                    return 0;
                }

                let (width, height) = c.level_dims(level);
                let (block_width, block_height) = c.source_format.block_dims();
                let blocks_x = width.div_ceil(block_width);
                let blocks_y = height.div_ceil(block_height);
                match query {
                    SliceQuery::OrigWidth => width,
                    SliceQuery::OrigHeight => height,
                    SliceQuery::ActualWidth => blocks_x * block_width,
                    SliceQuery::ActualHeight => blocks_y * block_height,
                    SliceQuery::NumBlocksX => blocks_x,
                    SliceQuery::NumBlocksY => blocks_y,
                    SliceQuery::TotalBlocks => blocks_x * blocks_y,
                    SliceQuery::AlphaFlag => bool_u32(c.alpha),
                    SliceQuery::IFrameFlag => bool_u32(c.video && layer == 0),
                }
            })
            .unwrap_or(0))
    }

    fn start_transcoding(&self, handle: u64) -> BridgeResult<u32> {
        let _shared = self.shared.enter(handle);
        let mut state = self.state.lock();
        Ok(match state.containers.get_mut(&handle) {
            Some(open) => {
                open.started = true;
                1
            }
            None => 0,
        })
    }

    fn create_transcode_state(&self) -> BridgeResult<u64> {
        let mut state = self.state.lock();
        let handle = state.next_handle();
        state.states.insert(handle);
        Ok(handle)
    }

    fn destroy_transcode_state(&self, handle: u64) -> BridgeResult<()> {
        self.state.lock().states.remove(&handle);
        Ok(())
    }

    fn transcode_image_level(&self, call: &TranscodeCall) -> BridgeResult<u32> {
        let _shared = (call.state == 0).then(|| self.shared.enter(call.handle));
        let mut state = self.state.lock();
        state.transcode_calls += 1;
        if state.fail_transcodes || (call.state != 0 && !state.states.contains(&call.state)) {
            return Ok(0);
        }

        let slice = SliceIndex::new(call.level, call.layer, call.face);
        let Ok(target) = TargetFormat::try_from(call.target_format) else {
            return Ok(0);
        };
        let Some(open) = state.containers.get(&call.handle) else {
            return Ok(0);
        };
        let container = &open.parsed;
        if !open.started || !supports(target, container.source_format) {
            return Ok(0);
        }
        let Some(pixels) = container.slice_pixels(slice) else {
            return Ok(0);
        };

        let (width, height) = container.level_dims(call.level);
        let size = target.transcoded_size_in_bytes(width, height) as usize;
        let unit = target.bytes_per_block_or_pixel().max(1) as usize;
        if (call.output_blocks_or_pixels as usize) * unit < size {
            return Ok(0);
        }

        // Copy out before touching the heap mutably.
        let mut output = vec![0u8; size];
        if target == TargetFormat::Rgba32 {
            output.copy_from_slice(pixels);
        } else {
            synthetic_bytes(&mut output, target, slice, pixels);
        }

        let capacity = state.heap.capacity();
        let destination = usize::try_from(call.output)
            .ok()
            .filter(|&a| state.heap.allocation_len(a).is_some_and(|len| len >= size))
            .and_then(|a| state.heap.bytes_mut(a, size))
            .ok_or_else(|| oob(call.output, size, capacity))?;
        destination.copy_from_slice(&output);
        Ok(1)
    }
}
