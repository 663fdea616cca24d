//! Layered render records
//!
//! Records are registered once by their sprite renderer and stay live: the
//! position, scale and image of each record are read from the owning
//! entity's components when the batch is composited.

use std::borrow::Cow;

use glam::Vec2;
use hecs::Entity;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use indexmap::IndexMap;

use super::surface::Surface;
use crate::assets::ImageCache;
use crate::ecs::{Component, Scene, SpriteCollider, SpriteRenderer, Transform};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    #[error("layer `{0}` already declared")]
    DuplicateLayer(String),

    #[error("layer `{0}` not declared")]
    UnknownLayer(String),
}

/// A drawable entity within one layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRecord {
    pub entity: Entity,
    pub name: String,
    pub layer: String,
}

impl RenderRecord {
    #[must_use]
    pub fn new(entity: Entity, name: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            entity,
            name: name.into(),
            layer: layer.into(),
        }
    }
}

/// One image placed on the surface by [`RenderBatch::composite`]
#[derive(Debug, Clone, PartialEq)]
pub struct Blit {
    pub entity: Entity,
    pub name: String,
    pub layer: String,
    /// Top-left corner in surface pixels
    pub position: Vec2,
}

#[derive(Debug, Default)]
struct Layer {
    records: Vec<RenderRecord>,
    colliders: Vec<String>,
}

impl Layer {
    fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name == name)
    }
}

/// Render records grouped into ordered layers
///
/// Layers composite in declaration order, so the first declared layer is
/// the bottom one.
#[derive(Debug, Default)]
pub struct RenderBatch {
    layers: IndexMap<String, Layer>,
}

impl RenderBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty layer on top of the existing ones
    ///
    /// # Errors
    ///
    /// [`LayerError::DuplicateLayer`] if the name is taken
    pub fn declare_layer(&mut self, name: impl Into<String>) -> Result<(), LayerError> {
        let name = name.into();
        if self.layers.contains_key(&name) {
            return Err(LayerError::DuplicateLayer(name));
        }
        log::debug!("Declared render layer {name}");
        self.layers.insert(name, Layer::default());
        Ok(())
    }

    #[must_use]
    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Append a record to its layer
    ///
    /// Registering an entity already present in the layer does nothing.
    ///
    /// # Errors
    ///
    /// [`LayerError::UnknownLayer`] if the record's layer was never declared
    pub fn register(&mut self, record: RenderRecord) -> Result<(), LayerError> {
        let layer = self.layer_mut(&record.layer)?;
        if layer.position(&record.name).is_none() {
            log::debug!("Registered {} in layer {}", record.name, record.layer);
            layer.records.push(record);
        }
        Ok(())
    }

    /// Remove an entity's record from `layer`, along with its collider entry
    ///
    /// Returns whether a record was removed.
    pub fn deregister(&mut self, layer: &str, name: &str) -> bool {
        let Some(layer) = self.layers.get_mut(layer) else {
            return false;
        };
        layer.colliders.retain(|c| c != name);
        match layer.position(name) {
            Some(index) => {
                layer.records.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove an entity from every layer
    pub fn deregister_entity(&mut self, name: &str) {
        for layer in self.layers.values_mut() {
            layer.records.retain(|r| r.name != name);
            layer.colliders.retain(|c| c != name);
        }
    }

    /// Mark a registered entity as a collision candidate
    ///
    /// # Errors
    ///
    /// [`LayerError::UnknownLayer`] if `layer` was never declared
    pub fn register_collider(&mut self, layer: &str, name: &str) -> Result<(), LayerError> {
        let layer = self.layer_mut(layer)?;
        if !layer.colliders.iter().any(|c| c == name) {
            layer.colliders.push(name.to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, layer: &str, name: &str) -> bool {
        self.layers
            .get(layer)
            .is_some_and(|l| l.position(name).is_some())
    }

    #[must_use]
    pub fn is_collider(&self, layer: &str, name: &str) -> bool {
        self.layers
            .get(layer)
            .is_some_and(|l| l.colliders.iter().any(|c| c == name))
    }

    #[must_use]
    pub fn records(&self, layer: &str) -> Option<&[RenderRecord]> {
        self.layers.get(layer).map(|l| l.records.as_slice())
    }

    #[must_use]
    pub fn colliders(&self, layer: &str) -> Option<&[String]> {
        self.layers.get(layer).map(|l| l.colliders.as_slice())
    }

    /// Total number of records across all layers
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.values().map(|l| l.records.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record, keeping the declared layers
    pub fn clear_records(&mut self) {
        for layer in self.layers.values_mut() {
            layer.records.clear();
            layer.colliders.clear();
        }
    }

    /// Refresh the contact lists of every collider
    ///
    /// Only colliders in the same layer touch; inactive entities have their
    /// contacts cleared and touch nothing.
    pub fn detect_collisions(&self, scene: &Scene) {
        for layer in self.layers.values() {
            let mut boxes = Vec::with_capacity(layer.colliders.len());
            for name in &layer.colliders {
                if !scene.is_hierarchy_active(name) {
                    continue;
                }
                let (Some(collider), Some(transform)) = (
                    scene.get_component::<SpriteCollider>(name),
                    scene.get_component::<Transform>(name),
                ) else {
                    continue;
                };
                if !collider.state().is_active || collider.size.x <= 0.0 || collider.size.y <= 0.0 {
                    continue;
                }
                let (min, max) = collider.bounds(&transform);
                boxes.push((name.as_str(), min.min(max), min.max(max)));
            }

            for name in &layer.colliders {
                let Some(mut collider) = scene.get_component_mut::<SpriteCollider>(name) else {
                    continue;
                };
                let contacts = collider.contacts_mut();
                contacts.clear();

                let Some(&(_, min, max)) = boxes.iter().find(|(n, ..)| *n == name.as_str()) else {
                    continue;
                };
                contacts.extend(
                    boxes
                        .iter()
                        .filter(|(other, ..)| *other != name.as_str())
                        .filter(|(_, other_min, other_max)| {
                            min.x < other_max.x
                                && other_min.x < max.x
                                && min.y < other_max.y
                                && other_min.y < max.y
                        })
                        .map(|(other, ..)| (*other).to_string()),
                );
            }
        }
    }

    /// Draw every visible record onto `surface`
    ///
    /// `viewpoint` is the world position shown at the centre of the
    /// surface. Within a layer, records with a smaller Y are drawn first.
    /// Returns the blits in the order they were performed.
    pub fn composite(
        &self,
        scene: &Scene,
        viewpoint: Vec2,
        surface: &mut Surface,
        images: &ImageCache,
    ) -> Vec<Blit> {
        let (width, height) = surface.size();
        let offset = viewpoint - Vec2::new(width as f32, height as f32) / 2.0;
        let mut blits = Vec::new();

        for (layer_name, layer) in &self.layers {
            let mut ordered: Vec<_> = layer
                .records
                .iter()
                .filter(|r| scene.is_hierarchy_active(&r.name) && scene.is_hierarchy_visible(&r.name))
                .filter_map(|r| {
                    let transform = scene.get_component::<Transform>(&r.name)?;
                    Some((r, transform.position, transform.scale))
                })
                .collect();
            ordered.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));

            for (record, position, scale) in ordered {
                let Some(renderer) = scene.get_component::<SpriteRenderer>(&record.name) else {
                    continue;
                };
                if !renderer.state().is_active {
                    continue;
                }
                let Some(path) = renderer.sprite() else {
                    continue;
                };
                let Some(handle) = images.get(path) else {
                    log::warn!("Image {path} for {} was never loaded", record.name);
                    continue;
                };
                let Some(size) = scaled_size(handle.size(), scale) else {
                    log::warn!("{} scaled by {scale} exceeds the sprite size limit", record.name);
                    continue;
                };
                let Some(image) = prepare(handle.get(), size, renderer.flip_x, renderer.flip_y) else {
                    continue;
                };

                let screen = (position - offset).round();
                surface.blit(&image, screen.x as i64, screen.y as i64);
                blits.push(Blit {
                    entity: record.entity,
                    name: record.name.clone(),
                    layer: layer_name.clone(),
                    position: screen,
                });
            }
        }
        blits
    }

    fn layer_mut(&mut self, name: &str) -> Result<&mut Layer, LayerError> {
        self.layers
            .get_mut(name)
            .ok_or_else(|| LayerError::UnknownLayer(name.to_string()))
    }
}

/// Largest width or height a sprite may be scaled to
pub const MAX_SPRITE_SIDE: u32 = 8192;

/// Pixel size of an image after scaling; `None` past [`MAX_SPRITE_SIDE`]
fn scaled_size((width, height): (u32, u32), scale: Vec2) -> Option<(u32, u32)> {
    let scaled = (Vec2::new(width as f32, height as f32) * scale.abs()).round();
    let limit = MAX_SPRITE_SIDE as f32;
    // NaN fails both comparisons
    if !(scaled.x <= limit && scaled.y <= limit) {
        return None;
    }
    Some((scaled.x as u32, scaled.y as u32))
}

/// Resize (nearest neighbour) and flip an image; `None` when scaled to nothing
fn prepare(
    image: &RgbaImage,
    (width, height): (u32, u32),
    flip_x: bool,
    flip_y: bool,
) -> Option<Cow<'_, RgbaImage>> {
    if width == 0 || height == 0 {
        return None;
    }
    let mut image = Cow::Borrowed(image);
    if image.dimensions() != (width, height) {
        image = Cow::Owned(imageops::resize(&*image, width, height, FilterType::Nearest));
    }
    if flip_x {
        imageops::flip_horizontal_in_place(image.to_mut());
    }
    if flip_y {
        imageops::flip_vertical_in_place(image.to_mut());
    }
    Some(image)
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::render::Color;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn add_sprite(scene: &mut Scene, name: &str, position: Vec2, sprite: &str) {
        scene.add_entity(name, None).unwrap();
        scene
            .get_component_mut::<Transform>(name)
            .unwrap()
            .move_to(position);
        let mut renderer = scene.add_component::<SpriteRenderer>(name).unwrap();
        renderer.set_sprite_path(Some(sprite.into()));
        renderer.set_layer("world");
    }

    fn world_batch() -> RenderBatch {
        let mut batch = RenderBatch::new();
        batch.declare_layer("world").unwrap();
        batch
    }

    fn images() -> ImageCache {
        let mut images = ImageCache::new();
        let mut two_tone = RgbaImage::from_pixel(2, 1, RED);
        two_tone.put_pixel(1, 0, BLUE);
        images.insert("mem/two_tone.png", two_tone);
        images.insert("mem/dot.png", RgbaImage::from_pixel(1, 1, RED));
        images
    }

    fn record(scene: &Scene, name: &str) -> RenderRecord {
        RenderRecord::new(scene.entity(name).unwrap().handle(), name, "world")
    }

    #[test]
    fn test_declare_layer_twice() {
        let mut batch = world_batch();
        assert_eq!(
            batch.declare_layer("world"),
            Err(LayerError::DuplicateLayer("world".into()))
        );
        assert_eq!(batch.layer_names().collect::<Vec<_>>(), ["world"]);
    }

    #[test]
    fn test_register_and_deregister() {
        let mut scene = Scene::new("level", true);
        add_sprite(&mut scene, "a", Vec2::ZERO, "mem/dot.png");
        let mut batch = world_batch();

        batch.register(record(&scene, "a")).unwrap();
        batch.register(record(&scene, "a")).unwrap();
        batch.register_collider("world", "a").unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.is_registered("world", "a"));

        let mut stray = record(&scene, "a");
        stray.layer = "sky".into();
        assert_eq!(batch.register(stray), Err(LayerError::UnknownLayer("sky".into())));

        assert!(batch.deregister("world", "a"));
        assert!(!batch.is_collider("world", "a"));
        assert!(!batch.deregister("world", "a"));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_clear_records_keeps_layers() {
        let mut scene = Scene::new("level", true);
        add_sprite(&mut scene, "a", Vec2::ZERO, "mem/dot.png");
        let mut batch = world_batch();
        batch.register(record(&scene, "a")).unwrap();

        batch.clear_records();
        assert!(batch.is_empty());
        assert!(batch.has_layer("world"));
    }

    #[test]
    fn test_composite_orders_by_y() {
        let mut scene = Scene::new("level", true);
        add_sprite(&mut scene, "low", Vec2::new(0.0, 5.0), "mem/dot.png");
        add_sprite(&mut scene, "high", Vec2::new(0.0, 1.0), "mem/dot.png");
        add_sprite(&mut scene, "mid", Vec2::new(0.0, 3.0), "mem/dot.png");
        let mut batch = world_batch();
        scene.draw_entities(&mut batch).unwrap();

        let mut surface = Surface::new(8, 8);
        let blits = batch.composite(&scene, Vec2::new(4.0, 4.0), &mut surface, &images());
        let names: Vec<_> = blits.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["high", "mid", "low"]);
        assert_eq!(blits[0].position, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_composite_centres_viewpoint() {
        let mut scene = Scene::new("level", true);
        add_sprite(&mut scene, "a", Vec2::new(10.0, 20.0), "mem/dot.png");
        let mut batch = world_batch();
        scene.draw_entities(&mut batch).unwrap();

        let mut surface = Surface::new(8, 6);
        let blits = batch.composite(&scene, Vec2::new(10.0, 20.0), &mut surface, &images());
        assert_eq!(blits[0].position, Vec2::new(4.0, 3.0));
        assert_eq!(surface.pixel(4, 3), Some(Color::from(RED)));
    }

    #[test]
    fn test_composite_skips_inactive_and_hidden() {
        let mut scene = Scene::new("level", true);
        add_sprite(&mut scene, "a", Vec2::ZERO, "mem/dot.png");
        add_sprite(&mut scene, "b", Vec2::ZERO, "mem/dot.png");
        add_sprite(&mut scene, "c", Vec2::ZERO, "mem/dot.png");
        let mut batch = world_batch();
        scene.draw_entities(&mut batch).unwrap();

        scene.set_active("a", false).unwrap();
        scene.set_visible("b", false).unwrap();
        let mut surface = Surface::new(4, 4);
        let blits = batch.composite(&scene, Vec2::ZERO, &mut surface, &images());
        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].name, "c");
    }

    #[test]
    fn test_composite_skips_missing_image() {
        let mut scene = Scene::new("level", true);
        add_sprite(&mut scene, "ghost", Vec2::ZERO, "mem/nowhere.png");
        let mut batch = world_batch();
        scene.draw_entities(&mut batch).unwrap();

        let mut surface = Surface::new(4, 4);
        assert!(batch.composite(&scene, Vec2::ZERO, &mut surface, &images()).is_empty());
    }

    #[test]
    fn test_composite_applies_flip_and_scale() {
        let mut scene = Scene::new("level", true);
        add_sprite(&mut scene, "a", Vec2::ZERO, "mem/two_tone.png");
        scene
            .get_component_mut::<SpriteRenderer>("a")
            .unwrap()
            .flip(true, false);
        scene
            .get_component_mut::<Transform>("a")
            .unwrap()
            .set_scale(Vec2::splat(2.0));
        let mut batch = world_batch();
        scene.draw_entities(&mut batch).unwrap();

        let mut surface = Surface::new(8, 8);
        surface.fill(Color::WHITE);
        batch.composite(&scene, Vec2::new(4.0, 4.0), &mut surface, &images());

        assert_eq!(surface.pixel(0, 0), Some(Color::from(BLUE)));
        assert_eq!(surface.pixel(1, 1), Some(Color::from(BLUE)));
        assert_eq!(surface.pixel(2, 0), Some(Color::from(RED)));
        assert_eq!(surface.pixel(3, 1), Some(Color::from(RED)));
        assert_eq!(surface.pixel(4, 0), Some(Color::WHITE));
        assert_eq!(surface.pixel(0, 2), Some(Color::WHITE));
    }

    #[test]
    fn test_composite_skips_oversized_scale() {
        let mut scene = Scene::new("level", true);
        add_sprite(&mut scene, "giant", Vec2::ZERO, "mem/dot.png");
        add_sprite(&mut scene, "odd", Vec2::ZERO, "mem/dot.png");
        add_sprite(&mut scene, "tall", Vec2::ZERO, "mem/dot.png");
        for (name, scale) in [
            ("giant", Vec2::splat(1e9)),
            ("odd", Vec2::new(f32::NAN, 1.0)),
            ("tall", Vec2::new(1.0, 3.0)),
        ] {
            scene.get_component_mut::<Transform>(name).unwrap().set_scale(scale);
        }
        let mut batch = world_batch();
        scene.draw_entities(&mut batch).unwrap();

        let mut surface = Surface::new(4, 4);
        let blits = batch.composite(&scene, Vec2::ZERO, &mut surface, &images());
        let names: Vec<_> = blits.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["tall"]);
    }

    #[test]
    fn test_scaled_size() {
        assert_eq!(scaled_size((2, 3), Vec2::new(-2.0, 0.5)), Some((4, 2)));
        assert_eq!(scaled_size((2, 3), Vec2::ZERO), Some((0, 0)));
        assert_eq!(scaled_size((2, 3), Vec2::splat(f32::INFINITY)), None);
        assert_eq!(scaled_size((1, 1), Vec2::splat(MAX_SPRITE_SIDE as f32)), Some((MAX_SPRITE_SIDE, MAX_SPRITE_SIDE)));
        assert_eq!(scaled_size((1, 1), Vec2::new(1.0, MAX_SPRITE_SIDE as f32 + 1.0)), None);
    }

    #[test]
    fn test_detect_collisions() {
        let mut scene = Scene::new("level", true);
        for (name, x) in [("a", 0.0), ("b", 3.0), ("c", 10.0)] {
            add_sprite(&mut scene, name, Vec2::new(x, 0.0), "mem/dot.png");
            scene.add_component::<SpriteCollider>(name).unwrap().size = Vec2::splat(4.0);
        }
        let mut batch = world_batch();
        scene.draw_entities(&mut batch).unwrap();

        batch.detect_collisions(&scene);
        assert_eq!(scene.get_component::<SpriteCollider>("a").unwrap().contacts(), ["b"]);
        assert_eq!(scene.get_component::<SpriteCollider>("b").unwrap().contacts(), ["a"]);
        assert!(scene.get_component::<SpriteCollider>("c").unwrap().contacts().is_empty());

        scene.set_active("b", false).unwrap();
        batch.detect_collisions(&scene);
        assert!(scene.get_component::<SpriteCollider>("a").unwrap().contacts().is_empty());
        assert!(scene.get_component::<SpriteCollider>("b").unwrap().contacts().is_empty());
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let mut scene = Scene::new("level", true);
        for (name, x) in [("a", 0.0), ("b", 4.0)] {
            add_sprite(&mut scene, name, Vec2::new(x, 0.0), "mem/dot.png");
            scene.add_component::<SpriteCollider>(name).unwrap().size = Vec2::splat(4.0);
        }
        let mut batch = world_batch();
        scene.draw_entities(&mut batch).unwrap();

        batch.detect_collisions(&scene);
        assert!(!scene.get_component::<SpriteCollider>("a").unwrap().is_touching("b"));
    }
}
