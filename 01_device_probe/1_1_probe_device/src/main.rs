#![cfg_attr(windows, windows_subsystem = "windows")]

#[cfg(windows)]
mod probe {
    use common::{
        config::{build_command_line, SampleConfig},
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
                    ID3D12CommandAllocator, ID3D12CommandQueue, ID3D12Device,
                    ID3D12GraphicsCommandList, ID3D12PipelineState,
                    D3D12_COMMAND_LIST_TYPE_DIRECT,
                },
                Dxgi::{
                    Common::{DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_MODE_DESC, DXGI_SAMPLE_DESC},
                    CreateDXGIFactory1, IDXGIFactory4, IDXGISwapChain, IDXGISwapChain3,
                    DXGI_MWA_NO_ALT_ENTER, DXGI_PRESENT, DXGI_PRESENT_PARAMETERS,
                    DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_EFFECT_FLIP_DISCARD,
                    DXGI_USAGE_RENDER_TARGET_OUTPUT,
                },
            },
        },
    };

    // Dropped top to bottom: command list first, factory last.
    struct GpuResources {
        frame_fence: FrameFence,
        command_list: ID3D12GraphicsCommandList,
        pipeline_state: Option<ID3D12PipelineState>,
        command_allocator: ID3D12CommandAllocator,
        render_targets: RenderTargets,
        swapchain: IDXGISwapChain3,
        command_queue: ID3D12CommandQueue,
        #[allow(unused)]
        device: ID3D12Device,
        #[allow(unused)]
        dxgi_factory: IDXGIFactory4,
        frame_index: u32,
    }

    impl Drop for GpuResources {
        fn drop(&mut self) {
            if let Err(e) = self.frame_fence.wait_for_gpu(&self.command_queue) {
                log::error!("failed to wait for the GPU before teardown {e}");
            }
        }
    }

    fn init(config: &SampleConfig, window: &Window) -> common::Result<GpuResources> {
        let command_line = &config.command_line;

        gfx::enable_debug_layer(command_line);

        let dxgi_factory: IDXGIFactory4 = unsafe { CreateDXGIFactory1() }?;
        let adapter = gfx::select_adapter(&dxgi_factory, command_line)?;
        let (_, device): (_, ID3D12Device) = gfx::create_device(&adapter)?;
        gfx::configure_info_queue(&device, command_line)?;

        let command_queue = gfx::create_direct_queue(&device)?;

        let (width, height) = window.get_physical_size();

        let swapchain_desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: width as u32,
                Height: height as u32,
                Format: DXGI_FORMAT_R8G8B8A8_UNORM,
                ..Default::default()
            },
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                ..Default::default()
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: config.buffer_count,
            OutputWindow: window.get_handle(),
            Windowed: true.into(),
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            ..Default::default()
        };

        let mut swapchain: Option<IDXGISwapChain> = None;
        unsafe { dxgi_factory.CreateSwapChain(&command_queue, &swapchain_desc, &mut swapchain) }
            .ok()?;
        let swapchain: IDXGISwapChain3 = swapchain
            .ok_or(Error::MissingObject("CreateSwapChain"))?
            .cast()?;

        unsafe { dxgi_factory.MakeWindowAssociation(window.get_handle(), DXGI_MWA_NO_ALT_ENTER) }?;

        let frame_index = unsafe { swapchain.GetCurrentBackBufferIndex() };
        let render_targets = RenderTargets::new(&device, &swapchain, config.buffer_count)?;

        let command_allocator: ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }?;

        let pipeline_state = gfx::create_empty_pipeline_state(&device);

        let command_list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                &command_allocator,
                pipeline_state.as_ref(),
            )
        }?;
        // Lists are created open; every frame starts with a reset.
        unsafe { command_list.Close() }?;

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

        let config = SampleConfig::from_command_line("Probe Device", build_command_line());
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
    log::error!("probe_device needs Direct3D 12 and only runs on Windows");
    std::process::exit(1);
}
