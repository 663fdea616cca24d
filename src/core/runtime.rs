//! Window-independent frame loop

use std::time::Duration;

use glam::Vec2;

use super::config::EngineConfig;
use super::engine::Game;
use super::error::EngineError;
use super::stats::FrameStats;
use super::time::Time;
use crate::assets::ImageCache;
use crate::ecs::{Registry, Scene, SceneManager};
use crate::input::Input;
use crate::render::{Blit, LayerError, Presenter, RenderBatch, Surface};

/// Everything one tick touches
///
/// A tick runs, in order: entity updates, the deletion sweep, the draw
/// pass, collision detection, surface fill and composite, presentation,
/// the end of the input frame and finally any scene switch requested
/// during the tick.
pub struct Runtime {
    config: EngineConfig,
    scenes: SceneManager,
    batch: RenderBatch,
    images: ImageCache,
    surface: Surface,
    presenter: Box<dyn Presenter>,
    time: Time,
    input: Input,
    stats: FrameStats,
    last_blits: Vec<Blit>,
    should_quit: bool,
}

impl Runtime {
    #[must_use]
    pub fn new(config: EngineConfig, registry: Registry, presenter: Box<dyn Presenter>) -> Self {
        let (width, height) = presenter.surface_size();
        Self {
            config,
            scenes: SceneManager::new(registry),
            batch: RenderBatch::new(),
            images: ImageCache::new(),
            surface: Surface::new(width, height),
            presenter,
            time: Time::new(),
            input: Input::new(),
            stats: FrameStats::new(),
            last_blits: Vec::new(),
            should_quit: false,
        }
    }

    /// Runtime for `game`, with its kinds registered and its content loaded
    ///
    /// # Errors
    ///
    /// Whatever [`Game::load_content`] fails with
    pub fn start_game<G: Game>(
        game: &mut G,
        config: EngineConfig,
        presenter: Box<dyn Presenter>,
    ) -> Result<Self, EngineError> {
        let mut registry = Registry::with_builtins();
        game.register(&mut registry);
        let mut runtime = Self::new(config, registry, presenter);
        game.load_content(&mut runtime)?;
        log::info!("Content loaded for {}", runtime.config.title);
        Ok(runtime)
    }

    /// Declare a render layer above the existing ones
    ///
    /// # Errors
    ///
    /// [`LayerError::DuplicateLayer`] if the name is taken
    pub fn declare_layer(&mut self, name: &str) -> Result<(), LayerError> {
        self.batch.declare_layer(name)
    }

    /// Load the main snapshot and make it current
    ///
    /// # Errors
    ///
    /// Fails if no snapshot is marked main or its images cannot be loaded
    pub fn load_main(&mut self) -> Result<(), EngineError> {
        self.scenes.load_main()?;
        self.enter_current()
    }

    /// Make an in-memory scene current
    ///
    /// # Errors
    ///
    /// Fails if an image the scene refers to cannot be loaded
    pub fn set_scene(&mut self, scene: Scene) -> Result<(), EngineError> {
        self.scenes.set_current(scene);
        self.enter_current()
    }

    /// Load the snapshot registered as `name` and make it current
    ///
    /// # Errors
    ///
    /// Fails for unknown names, broken snapshots or missing images; the
    /// current scene is kept if the snapshot cannot be loaded
    pub fn switch_scene(&mut self, name: &str) -> Result<(), EngineError> {
        self.scenes.switch_scene(name)?;
        self.enter_current()
    }

    fn enter_current(&mut self) -> Result<(), EngineError> {
        let scene = self.scenes.current().ok_or(EngineError::NoScene)?;
        self.batch.clear_records();
        let paths = scene.resource_paths();
        let loaded = self.images.preload(&paths)?;
        log::info!(
            "Entered scene {} ({} entities, {loaded} images loaded)",
            scene.name(),
            scene.len()
        );
        Ok(())
    }

    /// Run one tick timed by the wall clock
    ///
    /// # Errors
    ///
    /// See [`Runtime::step`]
    pub fn frame(&mut self) -> Result<(), EngineError> {
        self.time.update();
        self.tick()
    }

    /// Run one tick `delta` after the previous one
    ///
    /// # Errors
    ///
    /// Fails without a current scene, when a structural change queued by a
    /// component is invalid, when a sprite names an undeclared layer, when
    /// presentation fails, or when a requested scene cannot be loaded
    pub fn step(&mut self, delta: Duration) -> Result<(), EngineError> {
        self.time.advance(delta);
        self.tick()
    }

    fn tick(&mut self) -> Result<(), EngineError> {
        let scene = self.scenes.current_mut().ok_or(EngineError::NoScene)?;

        scene.update_entities(&self.time, &self.input)?;
        scene.sweep(&mut self.batch);
        scene.draw_entities(&mut self.batch)?;
        self.batch.detect_collisions(scene);

        let (width, height) = self.presenter.surface_size();
        self.surface.resize(width, height);
        self.surface.fill(self.config.clear_color);
        let viewpoint = scene
            .camera_position()
            .unwrap_or_else(|| Vec2::new(width as f32, height as f32) / 2.0);
        self.last_blits = self
            .batch
            .composite(scene, viewpoint, &mut self.surface, &self.images);
        self.presenter.present(&self.surface)?;

        self.input.end_frame();
        self.stats.record_frame(self.time.delta());

        if let Some(next) = scene.take_switch_request() {
            self.switch_scene(&next)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.scenes.current()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scenes.current_mut()
    }

    #[must_use]
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    #[must_use]
    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    #[must_use]
    pub fn batch(&self) -> &RenderBatch {
        &self.batch
    }

    #[must_use]
    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    #[must_use]
    pub fn time(&self) -> &Time {
        &self.time
    }

    #[must_use]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn presenter_mut(&mut self) -> &mut dyn Presenter {
        self.presenter.as_mut()
    }

    /// Ask the frame driver to stop after the current tick
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Blits performed by the last composite, in drawing order
    #[must_use]
    pub fn last_blits(&self) -> &[Blit] {
        &self.last_blits
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::ecs::{
        Component, ComponentInit, ComponentState, SceneBuilder, SpriteRenderer, StoreError,
        Transform, UpdateContext,
    };
    use crate::input::{ElementState, KeyCode};
    use crate::render::{Color, HeadlessPresenter};
    use crate::value::{Mapping, Persist, Value, ValueError};

    const STEP: Duration = Duration::from_millis(16);

    /// Requests a switch to `second` when Enter goes down
    #[derive(Default)]
    struct Exit {
        state: ComponentState,
    }

    impl Persist for Exit {
        fn save(&self, _fields: &mut Mapping) {}

        fn load(&mut self, field: &str, _value: Value) -> Result<(), ValueError> {
            Err(ValueError::unknown_field(Self::KIND, field))
        }
    }

    impl Component for Exit {
        const KIND: &'static str = "Exit";

        fn initialize(_init: &mut ComponentInit<'_>) -> Result<Self, StoreError> {
            Ok(Self::default())
        }

        fn state(&self) -> &ComponentState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut ComponentState {
            &mut self.state
        }

        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            if ctx.input().is_key_just_pressed(KeyCode::Enter) {
                ctx.commands().switch_scene("second");
            }
        }
    }

    fn runtime() -> Runtime {
        let config = EngineConfig::default().with_clear_color(Color::WHITE);
        let mut runtime = Runtime::new(
            config,
            Registry::with_builtins(),
            Box::new(HeadlessPresenter::new(8, 8)),
        );
        runtime.declare_layer("world").unwrap();
        runtime
            .images_mut()
            .insert("mem/dot.png", RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255])));
        runtime
    }

    /// Loads every snapshot in `dir`, optionally serving its sprite from memory
    struct SnapshotGame {
        dir: PathBuf,
        with_images: bool,
    }

    impl Game for SnapshotGame {
        fn register(&mut self, registry: &mut Registry) {
            registry.register::<Exit>();
        }

        fn load_content(&mut self, runtime: &mut Runtime) -> Result<(), EngineError> {
            if self.with_images {
                runtime
                    .images_mut()
                    .insert("mem/dot.png", RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255])));
            }
            runtime.declare_layer("world")?;
            runtime.scenes_mut().discover(&self.dir)?;
            runtime.load_main()
        }
    }

    fn first_scene() -> Scene {
        let mut scene = Scene::new("first", true);
        populate(&mut scene);
        scene
    }

    fn populate(scene: &mut Scene) {
        scene.add_entity("dot", None).unwrap();
        scene
            .get_component_mut::<Transform>("dot")
            .unwrap()
            .move_to(Vec2::new(2.0, 3.0));
        {
            let mut renderer = scene.add_component::<SpriteRenderer>("dot").unwrap();
            renderer.set_sprite_path(Some("mem/dot.png".into()));
            renderer.set_layer("world");
        }
        scene.add_component::<Exit>("dot").unwrap();
    }

    #[test]
    fn test_start_game_loads_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = SceneBuilder::new();
        populate(builder.create_scene("first", true).unwrap());
        builder.save_all(dir.path()).unwrap();

        let mut bare = SnapshotGame {
            dir: dir.path().to_path_buf(),
            with_images: false,
        };
        let Err(err) = Runtime::start_game(&mut bare, EngineConfig::default(), Box::new(HeadlessPresenter::new(8, 8)))
        else {
            panic!("sprite was neither inserted nor on disk");
        };
        assert!(matches!(err, EngineError::Resource(_)));

        let mut game = SnapshotGame {
            dir: dir.path().to_path_buf(),
            with_images: true,
        };
        let mut runtime =
            Runtime::start_game(&mut game, EngineConfig::default(), Box::new(HeadlessPresenter::new(8, 8))).unwrap();
        assert_eq!(runtime.scene().unwrap().name(), "first");
        assert!(runtime.scene().unwrap().has_component::<Exit>("dot"));

        runtime.step(STEP).unwrap();
        assert_eq!(runtime.last_blits().len(), 1);
    }

    #[test]
    fn test_tick_without_scene() {
        let mut runtime = runtime();
        assert!(matches!(runtime.step(STEP), Err(EngineError::NoScene)));
    }

    #[test]
    fn test_tick_composites_and_presents() {
        let mut runtime = runtime();
        runtime.set_scene(first_scene()).unwrap();
        runtime.step(STEP).unwrap();
        runtime.step(STEP).unwrap();

        assert_eq!(runtime.stats().total_frames(), 2);
        assert_eq!(runtime.time().frame_count(), 2);
        assert_eq!(runtime.batch().len(), 1);
        assert_eq!(runtime.last_blits().len(), 1);
        assert_eq!(runtime.surface().pixel(2, 3), Some(Color::rgb(255, 0, 0)));
        assert_eq!(runtime.surface().pixel(0, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_camera_centres_view() {
        let mut runtime = runtime();
        let mut scene = first_scene();
        scene.set_camera("dot").unwrap();
        runtime.set_scene(scene).unwrap();
        runtime.step(STEP).unwrap();

        assert_eq!(runtime.last_blits()[0].position, Vec2::new(4.0, 4.0));
    }

    #[test]
    fn test_deleted_entity_leaves_batch() {
        let mut runtime = runtime();
        runtime.set_scene(first_scene()).unwrap();
        runtime.step(STEP).unwrap();

        runtime.scene_mut().unwrap().delete("dot").unwrap();
        runtime.step(STEP).unwrap();

        assert!(runtime.batch().is_empty());
        assert!(runtime.last_blits().is_empty());
        assert!(runtime.scene().unwrap().is_empty());
    }

    #[test]
    fn test_input_edges_cleared_after_tick() {
        let mut runtime = runtime();
        runtime.set_scene(Scene::new("empty", true)).unwrap();
        runtime
            .input_mut()
            .process_keyboard(KeyCode::Space, ElementState::Pressed);
        runtime.step(STEP).unwrap();

        assert!(runtime.input().is_key_pressed(KeyCode::Space));
        assert!(!runtime.input().is_key_just_pressed(KeyCode::Space));
    }

    #[test]
    fn test_switch_requested_during_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = SceneBuilder::new();
        builder.create_scene("second", false).unwrap().add_entity("rock", None).unwrap();
        builder.save_all(dir.path()).unwrap();

        let mut runtime = runtime();
        runtime.scenes_mut().discover(dir.path()).unwrap();
        runtime.set_scene(first_scene()).unwrap();
        runtime.step(STEP).unwrap();
        assert_eq!(runtime.batch().len(), 1);

        runtime
            .input_mut()
            .process_keyboard(KeyCode::Enter, ElementState::Pressed);
        runtime.step(STEP).unwrap();

        let scene = runtime.scene().unwrap();
        assert_eq!(scene.name(), "second");
        assert!(scene.contains("rock"));
        assert!(runtime.batch().is_empty());
        assert!(runtime.batch().has_layer("world"));
    }

    #[test]
    fn test_switch_to_unknown_scene() {
        let mut runtime = runtime();
        runtime.set_scene(first_scene()).unwrap();
        let err = runtime.switch_scene("nowhere").unwrap_err();
        assert!(matches!(err, EngineError::Scene(crate::ecs::ManagerError::SceneNotFound(_))));
        assert_eq!(runtime.scene().unwrap().name(), "first");
    }
}
