//! Example game demonstrating engine features
//!
//! Builds two scenes, writes them as snapshots and plays them back. Runs
//! headless by default; pass `--window` to play it in a window with the
//! arrow keys.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use kestrel::input::ElementState;
use kestrel::prelude::*;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;
const STEP: Duration = Duration::from_millis(16);
const MAX_STEPS: usize = 600;
const COIN_PREFIX: &str = "coin";

/// Walks back and forth around where it started
#[derive(Debug, Default)]
struct Patrol {
    state: ComponentState,
    speed: f32,
    range: f32,
    origin: f32,
    direction: f32,
}

impl Persist for Patrol {
    fn save(&self, fields: &mut Mapping) {
        fields.insert("speed".into(), self.speed.to_value());
        fields.insert("range".into(), self.range.to_value());
    }

    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "speed" => assign(&mut self.speed, value),
            "range" => assign(&mut self.range, value),
            _ => Err(ValueError::unknown_field(Self::KIND, field)),
        }
    }
}

impl Component for Patrol {
    const KIND: &'static str = "Patrol";

    fn initialize(init: &mut ComponentInit<'_>) -> Result<Self, StoreError> {
        init.require::<SpriteRenderer>()?;
        Ok(Self::default())
    }

    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn start(&mut self, ctx: &mut UpdateContext<'_>) {
        self.origin = ctx.component::<Transform>().map_or(0.0, |t| t.position.x);
        self.direction = 1.0;
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let dx = self.direction * self.speed * ctx.delta_seconds();
        let Some(mut transform) = ctx.component_mut::<Transform>() else {
            return;
        };
        transform.translate(Vec2::new(dx, 0.0));
        let offset = transform.position.x - self.origin;
        drop(transform);

        if offset.abs() >= self.range && offset.signum() == self.direction {
            self.direction = -self.direction;
            if let Some(mut renderer) = ctx.component_mut::<SpriteRenderer>() {
                renderer.flip_x = self.direction < 0.0;
            }
        }
    }
}

/// Player-controlled walker that picks up coins
#[derive(Debug, Default)]
struct Collector {
    state: ComponentState,
    speed: f32,
    goal: i64,
    collected: i64,
}

impl Persist for Collector {
    fn save(&self, fields: &mut Mapping) {
        fields.insert("speed".into(), self.speed.to_value());
        fields.insert("goal".into(), self.goal.to_value());
        fields.insert("collected".into(), self.collected.to_value());
    }

    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "speed" => assign(&mut self.speed, value),
            "goal" => assign(&mut self.goal, value),
            "collected" => assign(&mut self.collected, value),
            _ => Err(ValueError::unknown_field(Self::KIND, field)),
        }
    }
}

impl Component for Collector {
    const KIND: &'static str = "Collector";

    fn initialize(init: &mut ComponentInit<'_>) -> Result<Self, StoreError> {
        init.require::<SpriteCollider>()?;
        Ok(Self::default())
    }

    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let input = ctx.input();
        let direction = Vec2::new(
            input.axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
            input.axis(KeyCode::ArrowUp, KeyCode::ArrowDown),
        );
        if let Some(mut transform) = ctx.component_mut::<Transform>() {
            transform.translate(direction * self.speed * ctx.delta_seconds());
        }

        let coins: Vec<String> = ctx
            .component::<SpriteCollider>()
            .map(|c| {
                c.contacts()
                    .iter()
                    .filter(|name| name.starts_with(COIN_PREFIX))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if coins.is_empty() {
            return;
        }

        for coin in coins {
            log::info!("{} picked up {coin}", ctx.name());
            ctx.commands().delete(coin);
            self.collected += 1;
        }
        if self.collected >= self.goal {
            ctx.commands().switch_scene("ending");
        }
    }
}

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Register every sprite the demo uses, generated in memory
fn insert_demo_images(images: &mut ImageCache) {
    images.insert("sprites/grass.png", solid(WIDTH, 16, [60, 140, 60, 255]));
    images.insert("sprites/hero.png", solid(8, 8, [40, 80, 220, 255]));
    images.insert("sprites/coin.png", solid(4, 4, [240, 200, 40, 255]));
    images.insert("sprites/guard_0.png", solid(8, 8, [200, 40, 40, 255]));
    images.insert("sprites/guard_1.png", solid(8, 8, [150, 30, 30, 255]));
    images.insert("sprites/banner.png", solid(48, 12, [250, 250, 250, 255]));
}

fn add_sprite(
    scene: &mut Scene,
    images: &mut ImageCache,
    name: &str,
    position: Vec2,
    sprite: &str,
    layer: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    scene.add_entity(name, None)?;
    scene
        .get_component_mut::<Transform>(name)
        .ok_or("missing transform")?
        .move_to(position);
    let mut renderer = scene.add_component::<SpriteRenderer>(name)?;
    renderer.set_sprite(sprite, images)?;
    renderer.set_layer(layer);
    Ok(())
}

/// Write the meadow and ending snapshots into `dir`
fn build_scenes(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut images = ImageCache::new();
    insert_demo_images(&mut images);
    let mut builder = SceneBuilder::new();

    let meadow = builder.create_scene("meadow", true)?;
    add_sprite(meadow, &mut images, "grass", Vec2::new(0.0, 70.0), "sprites/grass.png", "ground")?;
    add_sprite(meadow, &mut images, "hero", Vec2::new(0.0, 60.0), "sprites/hero.png", "world")?;
    {
        let mut collector = meadow.add_component::<Collector>("hero")?;
        collector.speed = 90.0;
        collector.goal = 3;
    }
    meadow
        .get_component_mut::<SpriteCollider>("hero")
        .ok_or("missing collider")?
        .size = Vec2::splat(8.0);
    meadow.set_camera("hero")?;

    for (i, x) in [40.0, 80.0, 120.0].into_iter().enumerate() {
        let name = format!("{COIN_PREFIX}_{i}");
        add_sprite(meadow, &mut images, &name, Vec2::new(x, 62.0), "sprites/coin.png", "world")?;
        meadow.add_component::<SpriteCollider>(&name)?.size = Vec2::splat(4.0);
    }

    add_sprite(meadow, &mut images, "guard", Vec2::new(60.0, 40.0), "sprites/guard_0.png", "world")?;
    {
        let mut patrol = meadow.add_component::<Patrol>("guard")?;
        patrol.speed = 30.0;
        patrol.range = 20.0;
    }
    {
        let mut animator = meadow.add_component::<SpriteAnimator>("guard")?;
        animator.add_animation(
            "walk",
            4.0,
            ["sprites/guard_0.png", "sprites/guard_1.png"],
            &mut images,
        )?;
        animator.switch_animation("walk", true)?;
    }

    let ending = builder.create_scene("ending", false)?;
    add_sprite(ending, &mut images, "banner", Vec2::new(56.0, 54.0), "sprites/banner.png", "world")?;
    ending
        .add_component::<Properties>("banner")?
        .set("message", "All coins collected");

    Ok(builder.save_all(dir)?)
}

/// The demo as a [`Game`]
struct Meadow {
    scene_dir: PathBuf,
}

impl Game for Meadow {
    fn register(&mut self, registry: &mut Registry) {
        registry.register::<Patrol>();
        registry.register::<Collector>();
    }

    fn load_content(&mut self, runtime: &mut Runtime) -> Result<(), EngineError> {
        insert_demo_images(runtime.images_mut());
        runtime.declare_layer("ground")?;
        runtime.declare_layer("world")?;
        let found = runtime.scenes_mut().discover(&self.scene_dir)?;
        log::info!("Found {found} scene snapshot(s) in {}", self.scene_dir.display());
        runtime.load_main()
    }

    fn update(&mut self, runtime: &mut Runtime) {
        let finished = runtime.scene().is_some_and(|s| s.name() == "ending");
        if finished || runtime.input().is_key_just_pressed(KeyCode::Escape) {
            runtime.quit();
        }
    }
}

fn run_headless(mut game: Meadow, config: EngineConfig) -> Result<(), EngineError> {
    let presenter = HeadlessPresenter::new(config.width, config.height);
    let mut runtime = Runtime::start_game(&mut game, config, Box::new(presenter))?;

    runtime
        .input_mut()
        .process_keyboard(KeyCode::ArrowRight, ElementState::Pressed);
    for _ in 0..MAX_STEPS {
        game.update(&mut runtime);
        if runtime.should_quit() {
            break;
        }
        runtime.step(STEP)?;
    }

    if let Some(scene) = runtime.scene() {
        let message = scene
            .get_component::<Properties>("banner")
            .and_then(|p| p.get("message").cloned());
        log::info!("Finished in scene {} ({message:?})", scene.name());
    }
    log::info!(
        "{} frames, {} blits in the last one | {}",
        runtime.time().frame_count(),
        runtime.last_blits().len(),
        runtime.stats().format_stats()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let windowed = std::env::args().any(|arg| arg == "--window");
    let config = EngineConfig::default()
        .with_title("Kestrel Meadow")
        .with_size(WIDTH, HEIGHT)
        .with_scene_dir(std::env::temp_dir().join("kestrel-demo"))
        .with_clear_color(Color::rgb(20, 24, 32));
    let game = Meadow {
        scene_dir: config.scene_dir.clone(),
    };

    if !windowed {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    build_scenes(&config.scene_dir)?;

    if windowed {
        Engine::new(config, game).run()?;
    } else {
        run_headless(game, config)?;
    }
    Ok(())
}
