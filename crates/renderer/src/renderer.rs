//! The Vulkan renderer.
//!
//! [`Renderer`] owns every GPU resource and implements the draw loop's
//! [`FrameBackend`] on top of them.
//!
//! # Resource Destruction Order
//!
//! Fields of the GPU context are declared in destruction order:
//! 1. Frame ring (command buffers, semaphores, fences, uniform buffers)
//! 2. Swapchain resources (framebuffers, depth buffer, swapchain)
//! 3. Pipeline, pipeline layout, render pass
//! 4. Descriptor pool and layout
//! 5. Mesh, texture, command pools
//! 6. Device, surface, instance

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info, warn};

use vkengine_core::RendererConfig;
use vkengine_platform::{Surface, Window};
use vkengine_rhi::command::{CommandPool, full_scissor, full_viewport};
use vkengine_rhi::descriptor::{self, DescriptorPool, DescriptorSetLayout};
use vkengine_rhi::device::Device;
use vkengine_rhi::instance::Instance;
use vkengine_rhi::physical_device::select_physical_device;
use vkengine_rhi::pipeline::{
    CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline, PipelineLayout,
};
use vkengine_rhi::render_pass::{Framebuffer, RenderPass, clear_values};
use vkengine_rhi::shader::{Shader, ShaderStage};
use vkengine_rhi::swapchain::{AcquireResult, Swapchain};
use vkengine_rhi::vertex::Vertex;
use vkengine_rhi::{RhiError, RhiResult};
use vkengine_scene::{Camera, CameraUbo, ObjectUbo, RenderObject};

use crate::depth_buffer::{DepthBuffer, find_depth_format};
use crate::draw_loop::{DrawLoop, FrameBackend, FrameOutcome, FrameScene};
use crate::frame_manager::{FrameData, FrameRing, InFlight};
use crate::mesh::{GpuMesh, MeshData};
use crate::swapchain_controller::{SurfaceExtentSource, SwapchainTarget};
use crate::texture::{Texture, TextureData};
use crate::uniform::DynamicUniformLayout;

const CAMERA_BINDING: u32 = 0;
const TEXTURE_BINDING: u32 = 1;
const OBJECT_BINDING: u32 = 2;

impl SurfaceExtentSource for Window {
    fn current_extent(&self) -> vk::Extent2D {
        self.framebuffer_extent()
    }

    /// winit cannot be pumped from inside its own callbacks, so a minimized
    /// window defers recreation to a later frame.
    fn wait_for_events(&self) -> bool {
        false
    }
}

/// Everything that is rebuilt when the swapchain is recreated.
struct SwapchainResources {
    framebuffers: Vec<Framebuffer>,
    _depth_buffer: DepthBuffer,
    swapchain: Swapchain,
}

impl SwapchainResources {
    fn new(
        device: &Arc<Device>,
        swapchain: Swapchain,
        render_pass: &RenderPass,
        depth_format: vk::Format,
    ) -> RhiResult<Self> {
        if swapchain.format() != render_pass.color_format() {
            return Err(RhiError::SwapchainError(format!(
                "Surface format changed from {:?} to {:?}",
                render_pass.color_format(),
                swapchain.format()
            )));
        }

        let extent = swapchain.extent();
        let depth_buffer = DepthBuffer::new(device.clone(), extent, depth_format)?;
        let framebuffers = swapchain
            .image_views()
            .iter()
            .map(|&view| {
                Framebuffer::new(
                    device.clone(),
                    render_pass,
                    &[view, depth_buffer.view()],
                    extent,
                )
            })
            .collect::<RhiResult<Vec<_>>>()?;

        debug!("Created {} framebuffers", framebuffers.len());

        Ok(Self {
            framebuffers,
            _depth_buffer: depth_buffer,
            swapchain,
        })
    }
}

/// GPU state driven by the draw loop.
struct GpuContext {
    frames: FrameRing<FrameData>,
    /// `None` between destroy and create during recreation.
    swapchain: Option<SwapchainResources>,
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
    render_pass: RenderPass,
    _descriptor_pool: DescriptorPool,
    _descriptor_set_layout: DescriptorSetLayout,
    mesh: GpuMesh,
    _texture: Texture,
    _command_pool: CommandPool,
    _transfer_pool: CommandPool,
    object_layout: DynamicUniformLayout,
    depth_format: vk::Format,
    /// Objects recorded into the current slot's command buffer.
    drawn_objects: usize,
    overflow_warned: bool,
    device: Arc<Device>,
    surface: Surface,
    instance: Instance,
}

impl GpuContext {
    fn swapchain(&self) -> RhiResult<&SwapchainResources> {
        self.swapchain.as_ref().ok_or_else(|| {
            RhiError::SwapchainError("Swapchain resources are not available".to_string())
        })
    }
}

impl SwapchainTarget for GpuContext {
    type Error = RhiError;

    fn wait_idle(&mut self) -> RhiResult<()> {
        self.device.wait_idle()
    }

    fn destroy_resources(&mut self) {
        self.swapchain = None;
    }

    fn create_resources(&mut self, extent: vk::Extent2D) -> RhiResult<()> {
        let swapchain = Swapchain::new(
            &self.instance,
            self.device.clone(),
            self.surface.handle(),
            extent.width,
            extent.height,
        )?;
        self.swapchain = Some(SwapchainResources::new(
            &self.device,
            swapchain,
            &self.render_pass,
            self.depth_format,
        )?);
        Ok(())
    }
}

impl FrameBackend for GpuContext {
    fn wait_for_frame(&mut self) -> RhiResult<()> {
        self.frames.wait_current()
    }

    fn acquire_next_image(&mut self) -> RhiResult<AcquireResult> {
        let semaphore = self.frames.current().present_semaphore().handle();
        self.swapchain()?.swapchain.acquire_next_image(semaphore)
    }

    fn update_uniforms(&mut self, scene: &FrameScene<'_>) -> RhiResult<()> {
        let frame = self.frames.current();
        frame
            .camera_buffer()
            .write(0, &scene.camera.uniform_buffer_object())?;

        let capacity = self.object_layout.capacity();
        if scene.objects.len() > capacity && !self.overflow_warned {
            warn!(
                "{} objects exceed the instance capacity of {}; the rest are skipped",
                scene.objects.len(),
                capacity
            );
            self.overflow_warned = true;
        }

        let mut drawn = 0;
        for (index, object) in scene.objects.iter().enumerate() {
            let Some(offset) = self.object_layout.offset(index) else {
                break;
            };
            frame
                .object_buffer()
                .write(u64::from(offset), &object.uniform_buffer_object())?;
            drawn += 1;
        }
        self.drawn_objects = drawn;
        Ok(())
    }

    fn reset_frame(&mut self) -> RhiResult<()> {
        self.frames.reset_current()?;
        self.frames.current().command_buffer().reset()
    }

    fn record_commands(&mut self, image_index: u32, _scene: &FrameScene<'_>) -> RhiResult<()> {
        let resources = self.swapchain()?;
        let frame = self.frames.current();
        let cmd = frame.command_buffer();
        let extent = resources.swapchain.extent();
        let framebuffer = resources
            .framebuffers
            .get(image_index as usize)
            .ok_or_else(|| {
                RhiError::SwapchainError(format!("No framebuffer for image {}", image_index))
            })?;

        cmd.begin()?;
        cmd.begin_render_pass(
            self.render_pass.handle(),
            framebuffer.handle(),
            extent,
            &clear_values(),
        );
        cmd.set_viewport(&full_viewport(extent));
        cmd.set_scissor(&full_scissor(extent));
        cmd.bind_graphics_pipeline(self.pipeline.handle());
        self.mesh.bind(cmd);

        self.object_layout
            .draw_objects(self.drawn_objects, |offset| {
                cmd.bind_descriptor_sets(
                    self.pipeline_layout.handle(),
                    0,
                    &[frame.descriptor_set()],
                    &[offset],
                );
                cmd.draw_indexed(self.mesh.index_count(), 1, 0, 0, 0);
                Ok::<_, RhiError>(())
            })?;

        cmd.end_render_pass();
        cmd.end()
    }

    fn submit(&mut self) -> RhiResult<()> {
        let frame = self.frames.current();
        let wait_semaphores = [frame.present_semaphore().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [frame.render_semaphore().handle()];
        let command_buffers = [frame.command_buffer().handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer was ended in record_commands and the
        // fence was reset after its last wait.
        unsafe {
            self.device
                .submit_graphics(&[submit_info], frame.in_flight_fence().handle())
        }
    }

    fn present(&mut self, image_index: u32) -> RhiResult<bool> {
        let semaphore = self.frames.current().render_semaphore().handle();
        self.swapchain()?
            .swapchain
            .present(self.device.present_queue(), image_index, semaphore)
    }

    fn advance_frame(&mut self) {
        self.frames.advance();
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during renderer drop: {:?}", e);
        }
        debug!("Releasing renderer resources");
    }
}

/// Vulkan renderer for one window.
pub struct Renderer {
    draw_loop: DrawLoop,
    context: GpuContext,
    window: Window,
}

impl Renderer {
    /// Creates every GPU resource for `window`.
    ///
    /// # Errors
    ///
    /// Any failure is fatal: missing Vulkan support, no suitable GPU, shader
    /// files that cannot be read, or a failed allocation.
    pub fn new(window: &Window, config: &RendererConfig) -> RhiResult<Self> {
        let extent = window.framebuffer_extent();
        info!(
            "Initializing Vulkan renderer ({}x{})",
            extent.width, extent.height
        );

        let surface_extensions = window
            .required_extensions()
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;
        let instance = Instance::new(c"vkengine", &surface_extensions, config.enable_validation)?;
        let surface = window
            .create_surface(&instance)
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device_info)?;

        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            extent.width,
            extent.height,
        )?;
        let depth_format = find_depth_format(&instance, &device)?;
        let render_pass = RenderPass::new(device.clone(), swapchain.format(), depth_format)?;
        let swapchain = SwapchainResources::new(&device, swapchain, &render_pass, depth_format)?;

        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or(RhiError::NoSuitableGpu)?;
        let transfer_family = device
            .queue_families()
            .transfer_family
            .unwrap_or(graphics_family);
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let transfer_pool = CommandPool::new_transient(device.clone(), transfer_family)?;

        let bindings = [
            descriptor::uniform_buffer_binding(CAMERA_BINDING, vk::ShaderStageFlags::VERTEX),
            descriptor::combined_image_sampler_binding(
                TEXTURE_BINDING,
                vk::ShaderStageFlags::FRAGMENT,
            ),
            descriptor::uniform_buffer_dynamic_binding(OBJECT_BINDING, vk::ShaderStageFlags::VERTEX),
        ];
        let descriptor_set_layout = DescriptorSetLayout::new(device.clone(), &bindings)?;

        let (pipeline, pipeline_layout) =
            create_pipeline(&device, config, &descriptor_set_layout, &render_pass)?;

        let mesh = GpuMesh::upload(device.clone(), &transfer_pool, &MeshData::cube())?;
        let texture = Texture::upload(
            device.clone(),
            &command_pool,
            &TextureData::checkerboard(256, 32, [235, 235, 235, 255], [40, 40, 48, 255]),
        )?;

        let frame_count = config.max_frames_in_flight.max(1);
        let object_layout = DynamicUniformLayout::new(
            ObjectUbo::SIZE,
            device.min_uniform_buffer_offset_alignment(),
            config.max_instance_count,
        );
        let descriptor_pool =
            DescriptorPool::for_layout(device.clone(), &bindings, frame_count as u32)?;
        let descriptor_sets =
            descriptor_pool.allocate(&vec![descriptor_set_layout.handle(); frame_count])?;
        let frames = FrameRing::try_from_fn(frame_count, |i| {
            FrameData::new(
                device.clone(),
                &command_pool,
                descriptor_sets[i],
                &object_layout,
            )
        })?;
        for frame in frames.iter() {
            write_frame_descriptors(&device, frame, &texture, &object_layout);
        }

        info!(
            "Renderer initialized: {} swapchain images, {} frames in flight, {} byte object stride, validation {}",
            swapchain.swapchain.image_count(),
            frame_count,
            object_layout.stride(),
            if instance.has_validation() { "on" } else { "off" }
        );

        Ok(Self {
            draw_loop: DrawLoop::new(),
            context: GpuContext {
                frames,
                swapchain: Some(swapchain),
                pipeline,
                pipeline_layout,
                render_pass,
                _descriptor_pool: descriptor_pool,
                _descriptor_set_layout: descriptor_set_layout,
                mesh,
                _texture: texture,
                _command_pool: command_pool,
                _transfer_pool: transfer_pool,
                object_layout,
                depth_format,
                drawn_objects: 0,
                overflow_warned: false,
                device,
                surface,
                instance,
            },
            window: window.clone(),
        })
    }

    /// Draws `objects` as seen from `camera`.
    ///
    /// At most `max_instance_count` objects are drawn. Out-of-date and
    /// suboptimal swapchains are recreated inline.
    pub fn draw_frame(
        &mut self,
        camera: &Camera,
        objects: &[RenderObject],
    ) -> RhiResult<FrameOutcome> {
        let scene = FrameScene { camera, objects };
        self.draw_loop
            .draw_frame(&mut self.context, &self.window, &scene)
    }

    /// Requests swapchain recreation after the next present.
    pub fn set_framebuffer_resized(&mut self, resized: bool) {
        self.draw_loop.set_framebuffer_resized(resized);
    }

    pub fn wait_idle(&self) -> RhiResult<()> {
        self.context.device.wait_idle()
    }

    /// Width over height of the current swapchain.
    pub fn swapchain_aspect_ratio(&self) -> Option<f32> {
        self.context
            .swapchain
            .as_ref()
            .map(|resources| resources.swapchain.aspect_ratio())
    }
}

fn create_pipeline(
    device: &Arc<Device>,
    config: &RendererConfig,
    descriptor_set_layout: &DescriptorSetLayout,
    render_pass: &RenderPass,
) -> RhiResult<(Pipeline, PipelineLayout)> {
    let vertex_shader = Shader::from_spirv_file(
        device.clone(),
        Path::new(&config.vertex_shader),
        ShaderStage::Vertex,
    )?;
    let fragment_shader = Shader::from_spirv_file(
        device.clone(),
        Path::new(&config.fragment_shader),
        ShaderStage::Fragment,
    )?;

    let pipeline_layout = PipelineLayout::new(device.clone(), &[descriptor_set_layout.handle()])?;
    let pipeline = GraphicsPipelineBuilder::new()
        .vertex_shader(&vertex_shader)
        .fragment_shader(&fragment_shader)
        .vertex_binding(Vertex::binding_description())
        .vertex_attributes(&Vertex::attribute_descriptions())
        .cull_mode(CullMode::Back)
        .front_face(FrontFace::CounterClockwise)
        .depth_test_enable(true)
        .render_pass(render_pass, 0)
        .build(device.clone(), &pipeline_layout)?;

    Ok((pipeline, pipeline_layout))
}

fn write_frame_descriptors(
    device: &Device,
    frame: &FrameData,
    texture: &Texture,
    object_layout: &DynamicUniformLayout,
) {
    let camera_info = [descriptor::buffer_info(
        frame.camera_buffer().handle(),
        0,
        CameraUbo::SIZE as vk::DeviceSize,
    )];
    let texture_info = [texture.descriptor_info()];
    let object_info = [descriptor::buffer_info(
        frame.object_buffer().handle(),
        0,
        object_layout.stride(),
    )];

    let writes = [
        vk::WriteDescriptorSet::default()
            .dst_set(frame.descriptor_set())
            .dst_binding(CAMERA_BINDING)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&camera_info),
        vk::WriteDescriptorSet::default()
            .dst_set(frame.descriptor_set())
            .dst_binding(TEXTURE_BINDING)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&texture_info),
        vk::WriteDescriptorSet::default()
            .dst_set(frame.descriptor_set())
            .dst_binding(OBJECT_BINDING)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
            .buffer_info(&object_info),
    ];
    descriptor::update_descriptor_sets(device, &writes);
}
