use windows::{
    core::Interface,
    Win32::{
        Foundation::{CloseHandle, E_NOINTERFACE, HANDLE},
        Graphics::{
            Direct3D::D3D_FEATURE_LEVEL_11_0,
            Direct3D12::{
                D3D12CreateDevice, D3D12GetDebugInterface, ID3D12CommandAllocator,
                ID3D12CommandList, ID3D12CommandQueue, ID3D12Debug, ID3D12DescriptorHeap,
                ID3D12Device, ID3D12Fence, ID3D12GraphicsCommandList, ID3D12InfoQueue,
                ID3D12PipelineState, ID3D12Resource, D3D12_COMMAND_LIST_TYPE_DIRECT,
                D3D12_COMMAND_QUEUE_DESC, D3D12_CPU_DESCRIPTOR_HANDLE,
                D3D12_DESCRIPTOR_HEAP_DESC, D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                D3D12_FENCE_FLAG_NONE, D3D12_GRAPHICS_PIPELINE_STATE_DESC,
                D3D12_INFO_QUEUE_FILTER, D3D12_INFO_QUEUE_FILTER_DESC,
                D3D12_MESSAGE_ID_CLEARRENDERTARGETVIEW_MISMATCHINGCLEARVALUE,
                D3D12_MESSAGE_SEVERITY_CORRUPTION, D3D12_MESSAGE_SEVERITY_ERROR,
                D3D12_MESSAGE_SEVERITY_INFO, D3D12_RESOURCE_BARRIER, D3D12_RESOURCE_BARRIER_0,
                D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES, D3D12_RESOURCE_BARRIER_FLAG_NONE,
                D3D12_RESOURCE_BARRIER_TYPE_TRANSITION, D3D12_RESOURCE_STATES,
                D3D12_RESOURCE_STATE_PRESENT, D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_TRANSITION_BARRIER,
            },
            Dxgi::{
                DXGIGetDebugInterface1, IDXGIAdapter1, IDXGIDebug1, IDXGIFactory4,
                IDXGISwapChain3, DXGI_ADAPTER_FLAG, DXGI_ADAPTER_FLAG_NONE,
                DXGI_ADAPTER_FLAG_SOFTWARE, DXGI_CREATE_FACTORY_DEBUG, DXGI_CREATE_FACTORY_FLAGS,
                DXGI_DEBUG_ALL, DXGI_DEBUG_RLO_DETAIL, DXGI_DEBUG_RLO_IGNORE_INTERNAL,
                DXGI_ERROR_NOT_FOUND,
            },
        },
        System::Threading::{CreateEventA, WaitForSingleObject, INFINITE},
    },
};

use crate::{
    config::{ClearColor, CommandLine},
    probe::{probe_feature_levels, FeatureLevel},
    Error, Result,
};

pub fn transition_barrier(
    resource: &ID3D12Resource,
    state_before: D3D12_RESOURCE_STATES,
    state_after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: std::mem::ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                StateBefore: state_before,
                StateAfter: state_after,
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
            }),
        },
    }
}

/// Turns on the D3D12 debug layer and DXGI leak tracking. Must run before the
/// factory and device are created.
pub fn enable_debug_layer(command_line: &CommandLine) {
    if !command_line.debug_layer_enabled() {
        return;
    }

    unsafe {
        let mut debug: Option<ID3D12Debug> = None;
        if let Some(debug) = D3D12GetDebugInterface(&mut debug).ok().and(debug) {
            debug.EnableDebugLayer();
            log::debug!("D3D12 debug layer enabled");

            if let Ok(dxgi_debug) = DXGIGetDebugInterface1::<IDXGIDebug1>(0) {
                dxgi_debug.EnableLeakTrackingForThread();
            }
        } else {
            log::warn!("D3D12 debug layer requested but not installed");
        }
    }
}

pub fn factory_flags(command_line: &CommandLine) -> DXGI_CREATE_FACTORY_FLAGS {
    if command_line.debug_layer_enabled() {
        DXGI_CREATE_FACTORY_DEBUG
    } else {
        DXGI_CREATE_FACTORY_FLAGS(0)
    }
}

/// First hardware adapter that can create a D3D12 device, or WARP on request.
pub fn select_adapter(
    factory: &IDXGIFactory4,
    command_line: &CommandLine,
) -> Result<IDXGIAdapter1> {
    if command_line.use_warp_device {
        log::info!("using WARP adapter");
        return Ok(unsafe { factory.EnumWarpAdapter() }?);
    }

    for i in 0.. {
        let adapter = match unsafe { factory.EnumAdapters1(i) } {
            Ok(adapter) => adapter,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => return Err(e.into()),
        };

        if is_hardware_adapter(&adapter)? && supports_d3d12(&adapter) {
            return Ok(adapter);
        }
    }

    Err(Error::NoAdapter)
}

pub fn is_hardware_adapter(adapter: &IDXGIAdapter1) -> Result<bool> {
    let desc = unsafe { adapter.GetDesc1() }?;

    // Skip the Basic Render Driver. Pass "-warp" for a software adapter.
    let software = (DXGI_ADAPTER_FLAG(desc.Flags as _) & DXGI_ADAPTER_FLAG_SOFTWARE)
        != DXGI_ADAPTER_FLAG_NONE;

    if !software {
        let len = desc
            .Description
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(desc.Description.len());
        log::debug!(
            "found adapter {}",
            String::from_utf16_lossy(&desc.Description[..len])
        );
    }

    Ok(!software)
}

/// Checks that the adapter supports D3D12 without creating the device.
pub fn supports_d3d12(adapter: &IDXGIAdapter1) -> bool {
    unsafe {
        D3D12CreateDevice(
            adapter,
            D3D_FEATURE_LEVEL_11_0,
            std::ptr::null_mut::<Option<ID3D12Device>>(),
        )
    }
    .is_ok()
}

/// Creates a device at the highest feature level the adapter supports,
/// falling back from 12_1 down to 11_0.
pub fn create_device<D: Interface>(adapter: &IDXGIAdapter1) -> Result<(FeatureLevel, D)> {
    probe_feature_levels(&FeatureLevel::DESCENDING, |level| {
        let mut device: Option<D> = None;
        unsafe { D3D12CreateDevice(adapter, level.into(), &mut device) }?;
        device.ok_or_else(|| windows::core::Error::from(E_NOINTERFACE))
    })
}

/// Breaks into the debugger on corruption and errors and drops noisy messages.
pub fn configure_info_queue(device: &ID3D12Device, command_line: &CommandLine) -> Result<()> {
    if !command_line.debug_layer_enabled() {
        return Ok(());
    }

    // No info queue without the debug layer installed.
    let Ok(info_queue) = device.cast::<ID3D12InfoQueue>() else {
        return Ok(());
    };

    unsafe {
        info_queue.SetBreakOnSeverity(D3D12_MESSAGE_SEVERITY_CORRUPTION, true)?;
        info_queue.SetBreakOnSeverity(D3D12_MESSAGE_SEVERITY_ERROR, true)?;

        let mut severities = [D3D12_MESSAGE_SEVERITY_INFO];
        let mut deny_ids = [D3D12_MESSAGE_ID_CLEARRENDERTARGETVIEW_MISMATCHINGCLEARVALUE];

        let filter = D3D12_INFO_QUEUE_FILTER {
            DenyList: D3D12_INFO_QUEUE_FILTER_DESC {
                NumSeverities: severities.len() as u32,
                pSeverityList: severities.as_mut_ptr(),
                NumIDs: deny_ids.len() as u32,
                pIDList: deny_ids.as_mut_ptr(),
                ..Default::default()
            },
            ..Default::default()
        };

        info_queue.PushStorageFilter(&filter)?;
    }

    Ok(())
}

pub fn report_live_objects() {
    if !cfg!(debug_assertions) {
        return;
    }

    unsafe {
        if let Ok(dxgi_debug) = DXGIGetDebugInterface1::<IDXGIDebug1>(0) {
            let _ = dxgi_debug.ReportLiveObjects(
                DXGI_DEBUG_ALL,
                DXGI_DEBUG_RLO_DETAIL | DXGI_DEBUG_RLO_IGNORE_INTERNAL,
            );
        }
    }
}

pub fn create_direct_queue(device: &ID3D12Device) -> Result<ID3D12CommandQueue> {
    let queue = unsafe {
        device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
            Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
            ..Default::default()
        })
    }?;

    Ok(queue)
}

pub struct RenderTargets {
    pub heap: ID3D12DescriptorHeap,
    pub descriptor_size: usize,
    pub buffers: Vec<ID3D12Resource>,
}

impl RenderTargets {
    /// Creates an RTV heap with one descriptor per back buffer and a view for
    /// each buffer.
    pub fn new(device: &ID3D12Device, swapchain: &IDXGISwapChain3, count: u32) -> Result<Self> {
        let heap: ID3D12DescriptorHeap = unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                NumDescriptors: count,
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                ..Default::default()
            })
        }?;

        let descriptor_size =
            unsafe { device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) }
                as usize;

        let start = unsafe { heap.GetCPUDescriptorHandleForHeapStart() };

        let buffers = (0..count)
            .map(|i| -> Result<ID3D12Resource> {
                let buffer: ID3D12Resource = unsafe { swapchain.GetBuffer(i) }?;
                unsafe {
                    device.CreateRenderTargetView(
                        &buffer,
                        None,
                        offset_handle(start, i as usize, descriptor_size),
                    )
                };
                Ok(buffer)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            heap,
            descriptor_size,
            buffers,
        })
    }

    pub fn rtv_handle(&self, index: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let start = unsafe { self.heap.GetCPUDescriptorHandleForHeapStart() };
        offset_handle(start, index as usize, self.descriptor_size)
    }
}

fn offset_handle(
    start: D3D12_CPU_DESCRIPTOR_HANDLE,
    index: usize,
    descriptor_size: usize,
) -> D3D12_CPU_DESCRIPTOR_HANDLE {
    D3D12_CPU_DESCRIPTOR_HANDLE {
        ptr: start.ptr + index * descriptor_size,
    }
}

/// Tries to build a pipeline state from an empty description. Drivers reject
/// that, in which case command lists start without one.
pub fn create_empty_pipeline_state(device: &ID3D12Device) -> Option<ID3D12PipelineState> {
    let desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC::default();
    match unsafe { device.CreateGraphicsPipelineState::<ID3D12PipelineState>(&desc) } {
        Ok(pipeline_state) => Some(pipeline_state),
        Err(e) => {
            log::warn!("empty pipeline state rejected, recording without one: {e}");
            None
        }
    }
}

/// Records "clear this back buffer" into a closed command list and closes it
/// again, ready for submission.
pub fn record_clear(
    command_list: &ID3D12GraphicsCommandList,
    command_allocator: &ID3D12CommandAllocator,
    pipeline_state: Option<&ID3D12PipelineState>,
    render_target: &ID3D12Resource,
    rtv_handle: D3D12_CPU_DESCRIPTOR_HANDLE,
    clear_color: &ClearColor,
) -> Result<()> {
    // Allocators can only be reset once the GPU is done with them, which the
    // frame fence guarantees.
    unsafe { command_allocator.Reset() }?;
    unsafe { command_list.Reset(command_allocator, pipeline_state) }?;

    unsafe {
        command_list.ResourceBarrier(&[transition_barrier(
            render_target,
            D3D12_RESOURCE_STATE_PRESENT,
            D3D12_RESOURCE_STATE_RENDER_TARGET,
        )]);

        command_list.OMSetRenderTargets(1, Some(&rtv_handle), false, None);
        command_list.ClearRenderTargetView(rtv_handle, clear_color.as_array(), None);

        command_list.ResourceBarrier(&[transition_barrier(
            render_target,
            D3D12_RESOURCE_STATE_RENDER_TARGET,
            D3D12_RESOURCE_STATE_PRESENT,
        )]);
    }

    unsafe { command_list.Close() }?;

    Ok(())
}

pub fn execute(queue: &ID3D12CommandQueue, command_list: &ID3D12GraphicsCommandList) -> Result<()> {
    let command_list = command_list.cast::<ID3D12CommandList>()?;
    unsafe { queue.ExecuteCommandLists(&[Some(command_list)]) };
    Ok(())
}

/// Fence used to wait for the GPU at the end of every frame and before
/// teardown.
pub struct FrameFence {
    fence: ID3D12Fence,
    value: u64,
    event: HANDLE,
}

impl FrameFence {
    pub fn new(device: &ID3D12Device) -> Result<Self> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }?;
        let event = unsafe { CreateEventA(None, false, false, None) }?;

        Ok(Self {
            fence,
            value: 1,
            event,
        })
    }

    /// Signals the queue and blocks until the GPU reaches the signal.
    pub fn wait_for_gpu(&mut self, queue: &ID3D12CommandQueue) -> Result<()> {
        let current = self.value;
        unsafe { queue.Signal(&self.fence, current) }?;
        self.value += 1;

        if unsafe { self.fence.GetCompletedValue() } < current {
            unsafe { self.fence.SetEventOnCompletion(current, self.event) }?;
            unsafe { WaitForSingleObject(self.event, INFINITE) };
        }

        Ok(())
    }
}

impl Drop for FrameFence {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.event) } {
            log::warn!("failed to close fence event {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_step_by_descriptor_size() {
        let start = D3D12_CPU_DESCRIPTOR_HANDLE { ptr: 0x1000 };
        assert_eq!(offset_handle(start, 0, 32).ptr, 0x1000);
        assert_eq!(offset_handle(start, 1, 32).ptr, 0x1020);
    }
}
