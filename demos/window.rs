use ash::vk;
use vulkan_bringup::{
    logging::{init_logging, LoggingConfig},
    Config, Context, ValidationConfig,
};
use winit::{
    dpi::PhysicalSize,
    event::{Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

const TITLE: &str = "Vulkan Engine";
const WIDTH: u32 = 960;
const HEIGHT: u32 = 540;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(TITLE)
        .with_inner_size(PhysicalSize::new(WIDTH, HEIGHT))
        .with_resizable(false)
        .build(&event_loop)?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let config = Config::default().with_validation(ValidationConfig::from_env());
    let size = window.inner_size();
    let framebuffer = vk::Extent2D {
        width: size.width,
        height: size.height,
    };
    let context = Context::new(&window, framebuffer, &config)?;

    let device = &context.device;
    tracing::info!(
        "running on {} with graphics queue family {}",
        device.physical_device.name,
        device.graphics_queue.family_index
    );
    if let Some(swapchain_config) = context.swapchain_config() {
        tracing::info!("swapchain configuration: {:?}", swapchain_config);
    }
    let mut context = Some(context);

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        }
        | Event::WindowEvent {
            event:
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                    ..
                },
            ..
        } => {
            elwt.exit();
        }
        Event::LoopExiting => {
            // Release Vulkan objects while the window still exists.
            context.take();
        }
        _ => (),
    })?;

    Ok(())
}
