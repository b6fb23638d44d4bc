#![cfg_attr(windows, windows_subsystem = "windows")]

#[cfg(windows)]
mod probe {
    use common::{
        config::{build_command_line, CommandLine, SampleConfig},
        frame::settle_frame,
        gfx::{self, FrameFence, RenderTargets},
        logging::{init_logging, LoggingConfig},
        os::{show_error_box, App, Window},
        Error,
    };
    use windows::{
        core::Interface,
        Win32::{
            Graphics::{
                Direct3D12::{
                    ID3D12CommandAllocator, ID3D12CommandQueue, ID3D12Device4,
                    ID3D12GraphicsCommandList4, ID3D12PipelineState,
                    D3D12_COMMAND_LIST_FLAG_NONE, D3D12_COMMAND_LIST_TYPE_DIRECT,
                },
                Dxgi::{
                    Common::{DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_SAMPLE_DESC},
                    CreateDXGIFactory2, IDXGIAdapter1, IDXGIFactory6, IDXGISwapChain4,
                    DXGI_ERROR_NOT_FOUND, DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE,
                    DXGI_MWA_NO_ALT_ENTER, DXGI_PRESENT, DXGI_PRESENT_PARAMETERS,
                    DXGI_SWAP_CHAIN_DESC1, DXGI_SWAP_EFFECT_FLIP_DISCARD,
                    DXGI_USAGE_RENDER_TARGET_OUTPUT,
                },
            },
        },
    };

    // Dropped top to bottom: command list first, factory last.
    struct GpuResources {
        frame_fence: FrameFence,
        command_list: ID3D12GraphicsCommandList4,
        pipeline_state: Option<ID3D12PipelineState>,
        command_allocator: ID3D12CommandAllocator,
        render_targets: RenderTargets,
        swapchain: IDXGISwapChain4,
        command_queue: ID3D12CommandQueue,
        #[allow(unused)]
        device: ID3D12Device4,
        #[allow(unused)]
        dxgi_factory: IDXGIFactory6,
        frame_index: u32,
    }

    impl Drop for GpuResources {
        fn drop(&mut self) {
            if let Err(e) = self.frame_fence.wait_for_gpu(&self.command_queue) {
                log::error!("failed to wait for the GPU before teardown {e}");
            }
        }
    }

    /// Walks adapters fastest first, so laptops pick the discrete GPU.
    fn select_high_performance_adapter(
        factory: &IDXGIFactory6,
        command_line: &CommandLine,
    ) -> common::Result<IDXGIAdapter1> {
        if command_line.use_warp_device {
            return gfx::select_adapter(factory, command_line);
        }

        for i in 0.. {
            let adapter: IDXGIAdapter1 = match unsafe {
                factory.EnumAdapterByGpuPreference(i, DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE)
            } {
                Ok(adapter) => adapter,
                Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
                Err(e) => return Err(e.into()),
            };

            if gfx::is_hardware_adapter(&adapter)? && gfx::supports_d3d12(&adapter) {
                return Ok(adapter);
            }
        }

        Err(Error::NoAdapter)
    }

    fn init(config: &SampleConfig, window: &Window) -> common::Result<GpuResources> {
        let command_line = &config.command_line;

        gfx::enable_debug_layer(command_line);

        let dxgi_factory: IDXGIFactory6 =
            unsafe { CreateDXGIFactory2(gfx::factory_flags(command_line)) }?;
        let adapter = select_high_performance_adapter(&dxgi_factory, command_line)?;
        let (feature_level, device): (_, ID3D12Device4) = gfx::create_device(&adapter)?;
        log::info!("ID3D12Device4 ready at feature level {feature_level}");
        gfx::configure_info_queue(&device, command_line)?;

        let command_queue = gfx::create_direct_queue(&device)?;

        let (width, height) = window.get_physical_size();

        let swapchain_desc = DXGI_SWAP_CHAIN_DESC1 {
            BufferCount: config.buffer_count,
            Width: width as u32,
            Height: height as u32,
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                ..Default::default()
            },
            ..Default::default()
        };

        let swapchain: IDXGISwapChain4 = unsafe {
            dxgi_factory.CreateSwapChainForHwnd(
                &command_queue,
                window.get_handle(),
                &swapchain_desc,
                None,
                None,
            )
        }?
        .cast()?;

        unsafe { dxgi_factory.MakeWindowAssociation(window.get_handle(), DXGI_MWA_NO_ALT_ENTER) }?;

        let frame_index = unsafe { swapchain.GetCurrentBackBufferIndex() };
        let render_targets = RenderTargets::new(&device, &swapchain, config.buffer_count)?;

        let command_allocator: ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }?;

        let pipeline_state = gfx::create_empty_pipeline_state(&device);

        // CreateCommandList1 hands back a closed list with no allocator bound, so
        // the first frame's reset is also its first use.
        let command_list: ID3D12GraphicsCommandList4 = unsafe {
            device.CreateCommandList1(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                D3D12_COMMAND_LIST_FLAG_NONE,
            )
        }?;

        let frame_fence = FrameFence::new(&device)?;

        Ok(GpuResources {
            frame_fence,
            command_list,
            pipeline_state,
            command_allocator,
            render_targets,
            swapchain,
            command_queue,
            device,
            dxgi_factory,
            frame_index,
        })
    }

    fn render(resources: &mut GpuResources, config: &SampleConfig) -> common::Result<()> {
        let index = resources.frame_index;

        gfx::record_clear(
            &resources.command_list,
            &resources.command_allocator,
            resources.pipeline_state.as_ref(),
            &resources.render_targets.buffers[index as usize],
            resources.render_targets.rtv_handle(index),
            &config.clear_color,
        )?;

        gfx::execute(&resources.command_queue, &resources.command_list)?;

        let parameters = DXGI_PRESENT_PARAMETERS::default();
        let presented = unsafe {
            resources
                .swapchain
                .Present1(config.sync_interval, DXGI_PRESENT(0), &parameters)
        }
        .ok();

        settle_frame(presented, || {
            resources.frame_fence.wait_for_gpu(&resources.command_queue)?;
            resources.frame_index = unsafe { resources.swapchain.GetCurrentBackBufferIndex() };
            Ok(())
        })
    }

    pub fn main() -> Result<(), Box<dyn std::error::Error>> {
        init_logging(LoggingConfig::default());

        let config = SampleConfig::from_command_line("Probe Command List 1", build_command_line());
        let (mut app, window) = App::init(&config)?;

        let mut resources = match init(&config, &window) {
            Ok(resources) => resources,
            Err(e) => {
                if let Some(message) = e.fatal_message() {
                    log::error!("{e}");
                    show_error_box("Error", &message);
                    std::process::exit(-1);
                }

                log::error!("initialization failed {e}");
                return Err(e.into());
            }
        };

        while app.run() {
            if let Err(e) = render(&mut resources, &config) {
                log::error!("failed to render frame {e}");
            }
        }

        std::mem::drop(resources);

        gfx::report_live_objects();

        log::info!("exiting with code {}", app.exit_code());
        if app.exit_code() != 0 {
            std::process::exit(app.exit_code());
        }

        Ok(())
    }
}

#[cfg(windows)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    probe::main()
}

#[cfg(not(windows))]
fn main() {
    common::logging::init_logging(common::logging::LoggingConfig::default());
    log::error!("probe_command_list1 needs Direct3D 12 and only runs on Windows");
    std::process::exit(1);
}
