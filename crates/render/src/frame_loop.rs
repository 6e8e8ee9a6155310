use glam::{Mat4, Vec3};
use std::time::Duration;
use triview_assets::ShaderSources;
use triview_common::{DemoConfig, DemoKind, ModelTransform, ViewTransform};
use triview_input::{FirstPersonControls, InputSource};
use triview_kernel::{Scene, TrianglePair};
use triview_tools::FrameRateCounter;

use crate::mesh::{GpuMesh, TriangleMesh};
use crate::surface::{GpuSurface, ProgramId, RenderError, UniformLocation};
use crate::uniforms::{MODEL, PROJECTION, VIEW};

/// Maps clip depth in [-1, 1] onto [0, 1], leaving x and y untouched.
///
/// Used as the projection for demos that bake their transforms into vertex
/// data and expect the wider depth range.
pub fn depth_remap() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, 0.5))
        * Mat4::from_scale(Vec3::new(1.0, 1.0, 0.5))
}

/// Lifecycle of a [`RenderLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed; GPU resources not created yet.
    Init,
    /// Resources live; frames may be drawn.
    Running,
    /// Quit requested; resources still live until shutdown.
    ShuttingDown,
    /// Resources released.
    Terminated,
}

/// Per-variant state the loop advances every frame.
#[derive(Debug, Clone)]
enum Demo {
    Still(Scene),
    Spinning(Scene),
    Pair(TrianglePair),
    Flythrough {
        scene: Scene,
        controls: FirstPersonControls,
    },
}

impl Demo {
    fn new(config: &DemoConfig) -> Self {
        match config.demo {
            DemoKind::Static => Demo::Still(Scene::facing()),
            DemoKind::Spin => Demo::Spinning(Scene::facing()),
            DemoKind::Pair => Demo::Pair(TrianglePair::new()),
            DemoKind::Flythrough => Demo::Flythrough {
                scene: Scene::first_person(),
                controls: FirstPersonControls::new(config.width, config.height),
            },
        }
    }

    fn meshes(&self) -> Vec<TriangleMesh> {
        match self {
            Demo::Pair(_) => vec![TriangleMesh::upright(), TriangleMesh::inverted()],
            _ => vec![TriangleMesh::upright()],
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct UniformSlots {
    model: Option<UniformLocation>,
    view: Option<UniformLocation>,
    projection: Option<UniformLocation>,
}

/// The per-frame update/render loop for one demo.
///
/// Owns the scene and every GPU resource it creates; the surface and input
/// collaborators are borrowed per call. Drive it with [`RenderLoop::init`]
/// once, [`RenderLoop::frame`] until it leaves `Running`, then
/// [`RenderLoop::shutdown`].
pub struct RenderLoop {
    config: DemoConfig,
    state: LoopState,
    demo: Demo,
    program: Option<ProgramId>,
    uniforms: UniformSlots,
    meshes: Vec<GpuMesh>,
    counter: Option<FrameRateCounter>,
    frames: u64,
}

impl RenderLoop {
    pub fn new(config: DemoConfig) -> Self {
        let demo = Demo::new(&config);
        Self {
            config,
            state: LoopState::Init,
            demo,
            program: None,
            uniforms: UniformSlots::default(),
            meshes: Vec::new(),
            counter: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The scene, for every variant except the triangle pair.
    pub fn scene(&self) -> Option<&Scene> {
        match &self.demo {
            Demo::Still(scene) | Demo::Spinning(scene) => Some(scene),
            Demo::Flythrough { scene, .. } => Some(scene),
            Demo::Pair(_) => None,
        }
    }

    pub fn pair(&self) -> Option<&TrianglePair> {
        match &self.demo {
            Demo::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    /// Current motion rate: last measured frame time over the nominal one.
    pub fn rate(&self) -> f32 {
        self.counter
            .as_ref()
            .map(FrameRateCounter::rate)
            .unwrap_or_else(|| {
                FrameRateCounter::new(self.config.target_fps, Duration::ZERO).rate()
            })
    }

    fn expect_state(&self, expected: LoopState) -> Result<(), RenderError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RenderError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn projection(&self) -> Mat4 {
        match self.config.fov_degrees() {
            Some(fov) => Mat4::perspective_rh(
                fov.to_radians(),
                self.config.aspect(),
                self.config.near,
                self.config.far,
            ),
            None => depth_remap(),
        }
    }

    fn set_uniform(
        surface: &mut dyn GpuSurface,
        program: ProgramId,
        location: Option<UniformLocation>,
        value: &Mat4,
    ) -> Result<(), RenderError> {
        match location {
            Some(location) => surface.set_uniform_mat4(program, location, value),
            None => Ok(()),
        }
    }

    /// One-time setup: compile the program, upload static uniforms and the
    /// meshes. Fails if called twice.
    pub fn init(
        &mut self,
        surface: &mut dyn GpuSurface,
        shaders: &ShaderSources,
    ) -> Result<(), RenderError> {
        self.expect_state(LoopState::Init)?;

        let program = surface.compile_program(&shaders.vertex, &shaders.fragment)?;
        self.program = Some(program);

        let uniforms = UniformSlots {
            model: surface.uniform_location(program, MODEL),
            view: surface.uniform_location(program, VIEW),
            projection: surface.uniform_location(program, PROJECTION),
        };
        for (name, slot) in [
            (MODEL, uniforms.model),
            (VIEW, uniforms.view),
            (PROJECTION, uniforms.projection),
        ] {
            if slot.is_none() {
                tracing::warn!("program has no '{name}' uniform; it will not be set");
            }
        }
        self.uniforms = uniforms;

        let projection = self.projection();
        Self::set_uniform(surface, program, uniforms.projection, &projection)?;
        Self::set_uniform(surface, program, uniforms.view, &Mat4::IDENTITY)?;
        Self::set_uniform(surface, program, uniforms.model, &Mat4::IDENTITY)?;

        for mesh in self.demo.meshes() {
            let gpu = GpuMesh::upload(surface, mesh)?;
            self.meshes.push(gpu);
        }

        self.state = LoopState::Running;
        tracing::info!(
            demo = %self.config.demo,
            meshes = self.meshes.len(),
            "render loop initialized"
        );
        Ok(())
    }

    /// Ask the loop to stop after the current frame.
    pub fn request_quit(&mut self) {
        if self.state == LoopState::Running {
            tracing::info!("quit requested");
            self.state = LoopState::ShuttingDown;
        }
    }

    /// Run one frame: input, update, clear, uniforms, draws, present, timing.
    ///
    /// Returns the state after the frame; `ShuttingDown` means the caller
    /// should stop calling `frame` and call [`RenderLoop::shutdown`].
    pub fn frame(
        &mut self,
        surface: &mut dyn GpuSurface,
        input: &mut dyn InputSource,
    ) -> Result<LoopState, RenderError> {
        self.expect_state(LoopState::Running)?;
        let Some(program) = self.program else {
            return Err(RenderError::InvalidState {
                expected: LoopState::Running,
                actual: LoopState::Init,
            });
        };

        let target_fps = self.config.target_fps;
        let counter = self
            .counter
            .get_or_insert_with(|| FrameRateCounter::new(target_fps, input.elapsed()));
        let rate = counter.rate();

        if FirstPersonControls::quit_requested(input) {
            self.request_quit();
            return Ok(self.state);
        }

        let (view, model) = match &mut self.demo {
            Demo::Still(scene) => (Mat4::IDENTITY, scene.subject.model_transform()),
            Demo::Spinning(scene) => {
                scene.update(rate);
                (Mat4::IDENTITY, scene.subject.model_transform())
            }
            Demo::Flythrough { scene, controls } => {
                for action in controls.poll(input, scene.camera.pose.yaw(), rate) {
                    if !scene.apply(action) {
                        self.state = LoopState::ShuttingDown;
                        return Ok(self.state);
                    }
                }
                scene.update(rate);
                (
                    scene.camera.view_transform(),
                    scene.subject.model_transform(),
                )
            }
            Demo::Pair(pair) => {
                pair.update(rate);
                for (mesh, transform) in self.meshes.iter_mut().zip(pair.transforms()) {
                    mesh.rebuild(surface, &transform)?;
                }
                (Mat4::IDENTITY, Mat4::IDENTITY)
            }
        };

        surface.clear(self.config.clear_color);
        Self::set_uniform(surface, program, self.uniforms.view, &view)?;
        Self::set_uniform(surface, program, self.uniforms.model, &model)?;
        for mesh in &self.meshes {
            mesh.draw(surface, program)?;
        }
        surface.present()?;
        self.frames += 1;

        if let Some(report) = self.counter.as_mut().and_then(|c| c.tick(input.elapsed())) {
            input.set_title(&report.title());
        }

        Ok(self.state)
    }

    /// Release every GPU resource exactly once and move to `Terminated`.
    pub fn shutdown(&mut self, surface: &mut dyn GpuSurface) -> Result<(), RenderError> {
        if self.state == LoopState::Terminated {
            return Err(RenderError::InvalidState {
                expected: LoopState::ShuttingDown,
                actual: self.state,
            });
        }

        let meshes = self.meshes.len();
        for mesh in self.meshes.drain(..) {
            mesh.destroy(surface);
        }
        if let Some(program) = self.program.take() {
            surface.delete_program(program);
        }

        self.state = LoopState::Terminated;
        tracing::info!(frames = self.frames, meshes, "render loop terminated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{GpuCommand, RecordingSurface};
    use triview_input::{Key, ScriptedInput};

    fn started(kind: DemoKind) -> (RenderLoop, RecordingSurface, ScriptedInput) {
        let config = DemoConfig::for_demo(kind);
        let (cx, cy) = (config.width as f64 / 2.0, config.height as f64 / 2.0);
        let mut render_loop = RenderLoop::new(config);
        let mut surface = RecordingSurface::new();
        render_loop
            .init(&mut surface, &ShaderSources::builtin())
            .unwrap();
        (render_loop, surface, ScriptedInput::with_cursor(cx, cy))
    }

    fn step(render_loop: &mut RenderLoop, surface: &mut RecordingSurface, input: &mut ScriptedInput) -> LoopState {
        input.advance(Duration::from_millis(7));
        render_loop.frame(surface, input).unwrap()
    }

    #[test]
    fn init_moves_to_running_and_sets_projection() {
        let (render_loop, surface, _) = started(DemoKind::Spin);
        assert_eq!(render_loop.state(), LoopState::Running);
        let program = ProgramId(1);
        let expected = Mat4::perspective_rh(90f32.to_radians(), 640.0 / 480.0, 0.1, 10.0);
        assert_eq!(surface.uniform(program, PROJECTION), Some(expected));
    }

    #[test]
    fn init_is_not_repeatable() {
        let (mut render_loop, mut surface, _) = started(DemoKind::Static);
        let err = render_loop
            .init(&mut surface, &ShaderSources::builtin())
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidState {
                expected: LoopState::Init,
                actual: LoopState::Running
            }
        ));
    }

    #[test]
    fn frame_before_init_fails() {
        let mut render_loop = RenderLoop::new(DemoConfig::default());
        let mut surface = RecordingSurface::new();
        let mut input = ScriptedInput::new();
        assert!(render_loop.frame(&mut surface, &mut input).is_err());
    }

    #[test]
    fn bad_shader_fails_init_and_stays_in_init() {
        let mut render_loop = RenderLoop::new(DemoConfig::default());
        let mut surface = RecordingSurface::new();
        let shaders = ShaderSources::new("garbage", "garbage");
        assert!(matches!(
            render_loop.init(&mut surface, &shaders),
            Err(RenderError::ShaderCompile(_))
        ));
        assert_eq!(render_loop.state(), LoopState::Init);
    }

    #[test]
    fn frame_clears_draws_and_presents_in_order() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Spin);
        surface.take_commands();
        step(&mut render_loop, &mut surface, &mut input);

        let cmds = surface.take_commands();
        let kinds: Vec<&str> = cmds
            .iter()
            .map(|c| match c {
                GpuCommand::Clear(_) => "clear",
                GpuCommand::SetUniform { .. } => "uniform",
                GpuCommand::Draw { .. } => "draw",
                GpuCommand::Present => "present",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["clear", "uniform", "uniform", "draw", "present"]);
        assert!(matches!(
            cmds[3],
            GpuCommand::Draw {
                vertex_count: 3,
                ..
            }
        ));
    }

    #[test]
    fn spin_demo_advances_subject() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Spin);
        for _ in 0..10 {
            step(&mut render_loop, &mut surface, &mut input);
        }
        let yaw = render_loop.scene().unwrap().subject.pose.yaw();
        assert!(yaw > 0.0);
        let model = surface.uniform(ProgramId(1), MODEL).unwrap();
        assert_eq!(model, render_loop.scene().unwrap().subject.model_transform());
    }

    #[test]
    fn static_demo_never_moves() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Static);
        for _ in 0..10 {
            step(&mut render_loop, &mut surface, &mut input);
        }
        assert_eq!(render_loop.scene().unwrap().subject.pose.yaw(), 0.0);
        assert_eq!(render_loop.frames(), 10);
    }

    #[test]
    fn escape_moves_to_shutting_down() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Spin);
        step(&mut render_loop, &mut surface, &mut input);
        input.press(Key::Escape);
        assert_eq!(
            step(&mut render_loop, &mut surface, &mut input),
            LoopState::ShuttingDown
        );
        assert_eq!(surface.frames_presented(), 1);
        assert!(render_loop.frame(&mut surface, &mut input).is_err());
    }

    #[test]
    fn close_request_moves_to_shutting_down() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Flythrough);
        input.request_close();
        assert_eq!(
            step(&mut render_loop, &mut surface, &mut input),
            LoopState::ShuttingDown
        );
    }

    #[test]
    fn shutdown_releases_everything_once() {
        for kind in DemoKind::ALL {
            let (mut render_loop, mut surface, mut input) = started(kind);
            step(&mut render_loop, &mut surface, &mut input);
            render_loop.request_quit();
            render_loop.shutdown(&mut surface).unwrap();
            assert_eq!(render_loop.state(), LoopState::Terminated);
            assert_eq!(surface.live_resources(), 0, "{kind} leaked resources");
            assert_eq!(surface.stale_deletes(), 0);
            assert!(render_loop.shutdown(&mut surface).is_err());
            assert_eq!(surface.stale_deletes(), 0);
        }
    }

    #[test]
    fn flythrough_walks_and_looks() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Flythrough);
        input.press(Key::W);
        step(&mut render_loop, &mut surface, &mut input);
        let scene = render_loop.scene().unwrap();
        assert!(scene.camera.pose.position.x > 0.0);
        assert_eq!(scene.camera.pose.position.y, 0.0);

        input.release(Key::W);
        input.move_cursor(300.0, 240.0);
        step(&mut render_loop, &mut surface, &mut input);
        let scene = render_loop.scene().unwrap();
        assert!(scene.camera.pose.yaw() > 0.0);
        assert_eq!(input.cursor_position(), (320.0, 240.0));

        let view = surface.uniform(ProgramId(1), VIEW).unwrap();
        assert_eq!(view, scene.camera.view_transform());
    }

    #[test]
    fn flythrough_opposing_keys_leave_camera_in_place() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Flythrough);
        input.press(Key::W);
        input.press(Key::S);
        step(&mut render_loop, &mut surface, &mut input);
        assert_eq!(
            render_loop.scene().unwrap().camera.pose.position,
            Vec3::ZERO
        );
    }

    #[test]
    fn pair_demo_rebakes_both_meshes() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Pair);
        surface.take_commands();
        step(&mut render_loop, &mut surface, &mut input);

        let cmds = surface.take_commands();
        let uploads = cmds
            .iter()
            .filter(|c| matches!(c, GpuCommand::Upload { bytes: 72, .. }))
            .count();
        let draws = cmds
            .iter()
            .filter(|c| matches!(c, GpuCommand::Draw { .. }))
            .count();
        assert_eq!(uploads, 2);
        assert_eq!(draws, 2);
        assert!(render_loop.pair().unwrap().angle() > 0.0);
        assert_eq!(surface.uniform(ProgramId(1), PROJECTION), Some(depth_remap()));
    }

    #[test]
    fn pair_demo_depth_stays_in_clip_range() {
        let projection = depth_remap();
        let mut pair = TrianglePair::new();
        let mut meshes = [TriangleMesh::upright(), TriangleMesh::inverted()];
        for _ in 0..1440 {
            pair.update(1.0);
            for (mesh, transform) in meshes.iter_mut().zip(pair.transforms()) {
                mesh.build_vertices(&transform);
                for v in mesh.vertices() {
                    let clip = projection * Vec3::from_array(v.position).extend(1.0);
                    let z = clip.z / clip.w;
                    assert!(
                        (0.0..=1.0).contains(&z),
                        "z {z} out of range at angle {}",
                        pair.angle()
                    );
                    assert_eq!(clip.x, v.position[0]);
                    assert_eq!(clip.y, v.position[1]);
                }
            }
        }
    }

    #[test]
    fn title_reports_frame_rate_after_a_second() {
        let (mut render_loop, mut surface, mut input) = started(DemoKind::Spin);
        for _ in 0..200 {
            step(&mut render_loop, &mut surface, &mut input);
        }
        let title = input.title().expect("title set after one second");
        assert!(title.starts_with("Running at "), "{title}");
        assert!(title.ends_with(" fps."), "{title}");
    }
}
