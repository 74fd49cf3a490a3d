//! Pixel-art post-processing pass.
//!
//! Full-screen pass after tonemapping that snaps UVs to a coarse grid,
//! producing the retro presentation style. Settings live as a component on
//! the camera and are extracted into the render world each frame; the pass
//! is a no-op while disabled.

use bevy::{
    core_pipeline::{
        core_3d::graph::{Core3d, Node3d},
        fullscreen_vertex_shader::fullscreen_shader_vertex_state,
    },
    ecs::query::QueryItem,
    prelude::*,
    render::{
        RenderApp,
        extract_component::{
            ComponentUniforms, DynamicUniformIndex, ExtractComponent, ExtractComponentPlugin,
            UniformComponentPlugin,
        },
        render_graph::{
            NodeRunError, RenderGraphApp, RenderGraphContext, RenderLabel, ViewNode,
            ViewNodeRunner,
        },
        render_resource::{
            binding_types::{sampler, texture_2d, uniform_buffer},
            *,
        },
        renderer::{RenderContext, RenderDevice},
        view::ViewTarget,
    },
};
use constants::render_settings::DEFAULT_PIXELATION_SIZE;

const PIXELATE_SHADER_PATH: &str = "shaders/pixelate.wgsl";

/// RPC-facing toggle; `pixel_size = None` keeps the current size.
#[derive(Event)]
pub struct SetPixelationEvent {
    pub enabled: bool,
    pub pixel_size: Option<f32>,
}

#[derive(Component, Clone, Copy, ExtractComponent, ShaderType)]
pub struct PixelateSettings {
    pub pixel_size: f32,
    /// 1.0 enables the pass; uniforms have no bool.
    pub enabled: f32,
    pub _padding: Vec2,
}

impl Default for PixelateSettings {
    fn default() -> Self {
        Self {
            pixel_size: DEFAULT_PIXELATION_SIZE,
            enabled: 0.0,
            _padding: Vec2::ZERO,
        }
    }
}

pub fn apply_pixelation_events(
    mut events: EventReader<SetPixelationEvent>,
    mut settings: Query<&mut PixelateSettings>,
) {
    for event in events.read() {
        for mut setting in &mut settings {
            setting.enabled = if event.enabled { 1.0 } else { 0.0 };
            if let Some(size) = event.pixel_size {
                setting.pixel_size = size.max(1.0);
            }
        }
    }
}

pub struct PixelatePostProcessPlugin;

impl Plugin for PixelatePostProcessPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SetPixelationEvent>()
            .add_systems(Update, apply_pixelation_events)
            .add_plugins((
                ExtractComponentPlugin::<PixelateSettings>::default(),
                UniformComponentPlugin::<PixelateSettings>::default(),
            ));

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app
            .add_render_graph_node::<ViewNodeRunner<PixelatePostProcessNode>>(
                Core3d,
                PixelatePostProcessLabel,
            )
            .add_render_graph_edges(
                Core3d,
                (
                    Node3d::Tonemapping,
                    PixelatePostProcessLabel,
                    Node3d::EndMainPassPostProcessing,
                ),
            );
    }

    fn finish(&self, app: &mut App) {
        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };
        render_app.init_resource::<PixelatePostProcessPipeline>();
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
struct PixelatePostProcessLabel;

#[derive(Default)]
struct PixelatePostProcessNode;

impl ViewNode for PixelatePostProcessNode {
    type ViewQuery = (
        &'static ViewTarget,
        &'static PixelateSettings,
        &'static DynamicUniformIndex<PixelateSettings>,
    );

    fn run(
        &self,
        _graph: &mut RenderGraphContext,
        render_context: &mut RenderContext,
        (view_target, _settings, settings_index): QueryItem<Self::ViewQuery>,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let pixelate_pipeline = world.resource::<PixelatePostProcessPipeline>();
        let pipeline_cache = world.resource::<PipelineCache>();

        let Some(pipeline) = pipeline_cache.get_render_pipeline(pixelate_pipeline.pipeline_id)
        else {
            return Ok(());
        };

        let settings_uniforms = world.resource::<ComponentUniforms<PixelateSettings>>();
        let Some(settings_binding) = settings_uniforms.uniforms().binding() else {
            return Ok(());
        };

        let post_process = view_target.post_process_write();

        let bind_group = render_context.render_device().create_bind_group(
            "pixelate_post_process_bind_group",
            &pixelate_pipeline.layout,
            &BindGroupEntries::sequential((
                post_process.source,
                &pixelate_pipeline.sampler,
                settings_binding.clone(),
            )),
        );

        let mut render_pass = render_context.begin_tracked_render_pass(RenderPassDescriptor {
            label: Some("pixelate_post_process_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: post_process.destination,
                resolve_target: None,
                ops: Operations::default(),
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_render_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[settings_index.index()]);
        render_pass.draw(0..3, 0..1);

        Ok(())
    }
}

#[derive(Resource)]
struct PixelatePostProcessPipeline {
    layout: BindGroupLayout,
    sampler: Sampler,
    pipeline_id: CachedRenderPipelineId,
}

impl FromWorld for PixelatePostProcessPipeline {
    fn from_world(world: &mut World) -> Self {
        let render_device = world.resource::<RenderDevice>();

        let layout = render_device.create_bind_group_layout(
            "pixelate_post_process_bind_group_layout",
            &BindGroupLayoutEntries::sequential(
                ShaderStages::FRAGMENT,
                (
                    texture_2d(TextureSampleType::Float { filterable: false }),
                    sampler(SamplerBindingType::NonFiltering),
                    uniform_buffer::<PixelateSettings>(true),
                ),
            ),
        );

        let sampler = render_device.create_sampler(&SamplerDescriptor {
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..default()
        });

        let shader = world.load_asset(PIXELATE_SHADER_PATH);

        let pipeline_id =
            world
                .resource_mut::<PipelineCache>()
                .queue_render_pipeline(RenderPipelineDescriptor {
                    label: Some("pixelate_post_process_pipeline".into()),
                    layout: vec![layout.clone()],
                    vertex: fullscreen_shader_vertex_state(),
                    fragment: Some(FragmentState {
                        shader,
                        shader_defs: vec![],
                        entry_point: "fragment".into(),
                        targets: vec![Some(ColorTargetState {
                            format: TextureFormat::bevy_default(),
                            blend: None,
                            write_mask: ColorWrites::ALL,
                        })],
                    }),
                    primitive: PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: MultisampleState::default(),
                    push_constant_ranges: vec![],
                    zero_initialize_workgroup_memory: false,
                });

        Self {
            layout,
            sampler,
            pipeline_id,
        }
    }
}
