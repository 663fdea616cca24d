//! Scene snapshot reader
//!
//! Single pass over the non-blank lines, recursive descent over nested
//! blocks. Every closing marker is checked against the attribute, key or
//! type name that opened it.

use super::SceneLoadError;
use super::literal::{self, LiteralError};
use super::tags::{self, COMPONENT_CLOSE, COMPONENT_OPEN, ENTITY_CLOSE, ENTITY_OPEN, SCENE_CLOSE, SCENE_OPEN};
use crate::ecs::{Registry, Scene, StoreError};
use crate::value::{Mapping, Value, ValueError};

/// Build a scene from snapshot text
///
/// Component kinds and nested object types are resolved through `registry`.
/// Nothing is returned unless the whole snapshot was read.
///
/// # Errors
///
/// Any malformed block, unknown kind or type, unresolved parent or camera
pub fn read_scene(text: &str, registry: &Registry) -> Result<Scene, SceneLoadError> {
    Reader {
        lines: Lines::new(text),
        registry,
    }
    .scene()
}

/// Trimmed non-blank lines with their 1-based line numbers
struct Lines<'a> {
    lines: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text
                .lines()
                .enumerate()
                .map(|(index, line)| (index + 1, line.trim()))
                .filter(|(_, line)| !line.is_empty())
                .collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<(usize, &'a str)> {
        self.lines.get(self.pos).copied()
    }

    fn next(&mut self, expected: &str) -> Result<(usize, &'a str), SceneLoadError> {
        let line = self.peek().ok_or_else(|| SceneLoadError::UnexpectedEnd {
            expected: expected.to_string(),
        })?;
        self.pos += 1;
        Ok(line)
    }

    fn expect(&mut self, marker: &str) -> Result<usize, SceneLoadError> {
        let (number, line) = self.next(marker)?;
        if line != marker {
            return Err(malformed(number, format!("expected `{marker}`, found `{line}`")));
        }
        Ok(number)
    }

    /// Next `key=value` header line, if the block header continues
    fn header(&mut self) -> Result<Option<(usize, &'a str, &'a str)>, SceneLoadError> {
        match self.peek() {
            Some((number, line)) if !line.starts_with('[') => {
                self.pos += 1;
                let (key, value) = attribute(number, line)?;
                Ok(Some((number, key, value)))
            }
            _ => Ok(None),
        }
    }
}

struct Reader<'a> {
    lines: Lines<'a>,
    registry: &'a Registry,
}

impl Reader<'_> {
    fn scene(mut self) -> Result<Scene, SceneLoadError> {
        let open = self.lines.expect(SCENE_OPEN)?;

        let mut name = None;
        let mut camera = None;
        let mut is_main = false;
        while let Some((number, key, text)) = self.lines.header()? {
            match key {
                "name" => name = Some(decode_string(number, text)?),
                "camera" => camera = decode_name(number, text)?,
                "is_main" => is_main = decode_bool(number, text)?,
                other => return Err(malformed(number, format!("unknown scene attribute `{other}`"))),
            }
        }
        let name = name.ok_or_else(|| malformed(open, "scene has no name"))?;
        let mut scene = Scene::new(name, is_main);

        loop {
            let (number, line) = self.lines.next(SCENE_CLOSE)?;
            match line {
                ENTITY_OPEN => self.entity(&mut scene, number)?,
                SCENE_CLOSE => break,
                other => return Err(malformed(number, format!("expected `{ENTITY_OPEN}`, found `{other}`"))),
            }
        }
        if let Some((number, line)) = self.lines.peek() {
            return Err(malformed(number, format!("unexpected `{line}` after `{SCENE_CLOSE}`")));
        }

        if let Some(camera) = camera {
            scene
                .set_camera(&camera)
                .map_err(|_| SceneLoadError::UnresolvedCamera(camera))?;
        }
        Ok(scene)
    }

    fn entity(&mut self, scene: &mut Scene, open: usize) -> Result<(), SceneLoadError> {
        let mut name = None;
        let mut parent = None;
        let mut is_active = true;
        let mut is_visible = true;
        while let Some((number, key, text)) = self.lines.header()? {
            match key {
                "name" => name = Some(decode_string(number, text)?),
                "parent" => parent = decode_name(number, text)?,
                "is_active" => is_active = decode_bool(number, text)?,
                "is_visible" => is_visible = decode_bool(number, text)?,
                other => return Err(malformed(number, format!("unknown entity attribute `{other}`"))),
            }
        }
        let name = name.ok_or_else(|| malformed(open, "entity has no name"))?;

        let store = |source| SceneLoadError::Store { line: open, source };
        scene.add_entity(&name, parent.as_deref()).map_err(store)?;
        scene.set_active(&name, is_active).map_err(store)?;
        scene.set_visible(&name, is_visible).map_err(store)?;

        let mut read_kinds = Vec::new();
        loop {
            let (number, line) = self.lines.next(ENTITY_CLOSE)?;
            match line {
                COMPONENT_OPEN => self.component(scene, &name, number, &mut read_kinds)?,
                ENTITY_CLOSE => return Ok(()),
                other => {
                    return Err(malformed(number, format!("expected `{COMPONENT_OPEN}`, found `{other}`")));
                }
            }
        }
    }

    /// One component block; `read_kinds` holds the kinds this entity's earlier blocks named
    fn component(
        &mut self,
        scene: &mut Scene,
        entity: &str,
        open: usize,
        read_kinds: &mut Vec<&'static str>,
    ) -> Result<(), SceneLoadError> {
        let (number, line) = self.lines.next("type=")?;
        let kind = line
            .strip_prefix("type=")
            .ok_or_else(|| malformed(number, "component block must start with `type=`"))?;

        let store = |source: StoreError| SceneLoadError::Store { line: number, source };
        let kind = self
            .registry
            .component(kind)
            .ok_or_else(|| store(StoreError::UnknownComponentKind(kind.to_string())))?
            .kind();
        if read_kinds.contains(&kind) {
            return Err(store(StoreError::DuplicateComponent {
                entity: entity.to_string(),
                kind,
            }));
        }
        read_kinds.push(kind);

        // Kinds added implicitly (Transform, required prerequisites) are reused once
        if !scene.has_kind(entity, kind) {
            scene.add_component_kind(self.registry, entity, kind).map_err(store)?;
        }

        let mut fields = Mapping::new();
        loop {
            let (number, line) = self.lines.next(COMPONENT_CLOSE)?;
            if line == COMPONENT_CLOSE {
                break;
            }
            let (attr, text) = attribute(number, line)?;
            let value = self.value(number, text, attr)?;
            fields.insert(attr.to_string(), value);
        }

        scene
            .load_component_fields(entity, kind, fields)
            .map_err(|source| SceneLoadError::Store { line: open, source })
    }

    /// Decode the value text of an attribute or entry; nested blocks close with `tag`
    fn value(&mut self, number: usize, text: &str, tag: &str) -> Result<Value, SceneLoadError> {
        if text == tags::MAP_OPEN {
            return self.mapping(tag).map(Value::Map);
        }
        if text == tags::SEQ_OPEN {
            return self.sequence(tag);
        }
        if let Some(type_name) = tags::parse_object_open(text) {
            return self.object(number, type_name);
        }
        literal::decode_scalar(text).map_err(|e| literal_error(number, &e))
    }

    fn mapping(&mut self, tag: &str) -> Result<Mapping, SceneLoadError> {
        let close = format!("{}{tag}", tags::MAP_CLOSE);
        let mut map = Mapping::new();
        loop {
            let (number, line) = self.lines.next(&close)?;
            if let Some(found) = line.strip_prefix(tags::MAP_CLOSE) {
                check_tag(number, tag, found)?;
                return Ok(map);
            }
            let (key, value) = self.entry(number, line)?;
            map.insert(key, value);
        }
    }

    fn sequence(&mut self, tag: &str) -> Result<Value, SceneLoadError> {
        let close = format!("{}{tag}", tags::SEQ_CLOSE);
        let mut items = Vec::new();
        loop {
            let (number, line) = self.lines.next(&close)?;
            if let Some(found) = line.strip_prefix(tags::SEQ_CLOSE) {
                check_tag(number, tag, found)?;
                return Ok(Value::Seq(items));
            }
            items.push(self.value(number, line, tag)?);
        }
    }

    fn object(&mut self, open: usize, type_name: &str) -> Result<Value, SceneLoadError> {
        let registry = self.registry;
        let types = registry.types();
        if !types.contains(type_name) {
            return Err(SceneLoadError::TypeNotRegistered {
                line: open,
                name: type_name.to_string(),
            });
        }

        let close = tags::object_close(type_name);
        let mut fields = Mapping::new();
        loop {
            let (number, line) = self.lines.next(&close)?;
            if line.starts_with(tags::OBJECT_CLOSE_PREFIX) {
                if line != close {
                    return Err(SceneLoadError::MismatchedTag {
                        line: number,
                        expected: close,
                        found: line.to_string(),
                    });
                }
                break;
            }
            let (key, value) = self.entry(number, line)?;
            fields.insert(key, value);
        }

        types
            .construct(type_name, fields)
            .map(Value::Object)
            .map_err(|source| match source {
                ValueError::TypeNotRegistered(name) => SceneLoadError::TypeNotRegistered { line: open, name },
                source => SceneLoadError::Value { line: open, source },
            })
    }

    /// A `key:value` line inside a mapping or object block
    fn entry(&mut self, number: usize, line: &str) -> Result<(String, Value), SceneLoadError> {
        let (raw_key, key, text) = literal::split_entry(line).map_err(|e| literal_error(number, &e))?;
        let value = self.value(number, text, raw_key)?;
        Ok((key, value))
    }
}

fn attribute(number: usize, line: &str) -> Result<(&str, &str), SceneLoadError> {
    line.split_once('=')
        .ok_or_else(|| malformed(number, format!("expected `name=value`, found `{line}`")))
}

fn check_tag(number: usize, expected: &str, found: &str) -> Result<(), SceneLoadError> {
    if expected == found {
        Ok(())
    } else {
        Err(SceneLoadError::MismatchedTag {
            line: number,
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

fn decode_string(number: usize, text: &str) -> Result<String, SceneLoadError> {
    match literal::decode_scalar(text).map_err(|e| literal_error(number, &e))? {
        Value::Str(s) => Ok(s),
        other => Err(malformed(number, format!("expected a name, found {}", other.kind_name()))),
    }
}

fn decode_name(number: usize, text: &str) -> Result<Option<String>, SceneLoadError> {
    match literal::decode_scalar(text).map_err(|e| literal_error(number, &e))? {
        Value::Null => Ok(None),
        Value::Str(s) => Ok(Some(s)),
        other => Err(malformed(number, format!("expected a name or None, found {}", other.kind_name()))),
    }
}

fn decode_bool(number: usize, text: &str) -> Result<bool, SceneLoadError> {
    match literal::decode_scalar(text).map_err(|e| literal_error(number, &e))? {
        Value::Bool(b) => Ok(b),
        other => Err(malformed(number, format!("expected True or False, found {}", other.kind_name()))),
    }
}

fn malformed(line: usize, message: impl Into<String>) -> SceneLoadError {
    SceneLoadError::Malformed {
        line,
        message: message.into(),
    }
}

fn literal_error(line: usize, error: &LiteralError) -> SceneLoadError {
    malformed(line, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Properties, Transform};

    fn read(text: &str) -> Result<Scene, SceneLoadError> {
        read_scene(text, &Registry::with_builtins())
    }

    #[test]
    fn test_minimal_scene() {
        let scene = read("[scene]\n\tname=empty\n\tcamera=None\n[/scene]\n").unwrap();
        assert_eq!(scene.name(), "empty");
        assert!(!scene.is_main());
        assert!(scene.is_empty());
        assert_eq!(scene.camera(), None);
    }

    #[test]
    fn test_blank_lines_and_indentation_ignored() {
        let text = "\n[scene]\n\n  name=level\nis_main=True\n[entity]\nname=a\n\n[/entity]\n[/scene]\n\n";
        let scene = read(text).unwrap();
        assert!(scene.is_main());
        assert!(scene.has_component::<Transform>("a"));
    }

    #[test]
    fn test_child_before_parent_fails() {
        let text = "\
[scene]
name=level
[entity]
name=child
parent=root
[/entity]
[entity]
name=root
[/entity]
[/scene]
";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            SceneLoadError::Store { line: 3, source: StoreError::EntityNotFound(name) } if name == "root"
        ));
    }

    #[test]
    fn test_unresolved_camera() {
        let err = read("[scene]\nname=level\ncamera=ghost\n[/scene]\n").unwrap_err();
        assert!(matches!(err, SceneLoadError::UnresolvedCamera(name) if name == "ghost"));
    }

    #[test]
    fn test_unknown_component_kind() {
        let text = "[scene]\nname=l\n[entity]\nname=a\n[component]\ntype=Rigidbody\n[/component]\n[/entity]\n[/scene]\n";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            SceneLoadError::Store { line: 6, source: StoreError::UnknownComponentKind(_) }
        ));
    }

    #[test]
    fn test_repeated_component_block_rejected() {
        let text = "\
[scene]
name=l
[entity]
name=a
[component]
type=Properties
values={
x:1
}values
[/component]
[component]
type=Properties
values={
y:2
}values
[/component]
[/entity]
[/scene]
";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            SceneLoadError::Store {
                line: 12,
                source: StoreError::DuplicateComponent { kind: "Properties", entity }
            } if entity == "a"
        ));
    }

    #[test]
    fn test_implicit_components_reused_once() {
        let text = "\
[scene]
name=l
[entity]
name=a
[component]
type=Transform
position=(3.0, 4.0)
[/component]
[component]
type=Properties
[/component]
[component]
type=Transform
position=(9.0, 9.0)
[/component]
[/entity]
[/scene]
";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            SceneLoadError::Store { line: 13, source: StoreError::DuplicateComponent { kind: "Transform", .. } }
        ));

        let text = "\
[scene]
name=l
[entity]
name=a
[component]
type=Transform
position=(3.0, 4.0)
[/component]
[component]
type=Properties
[/component]
[/entity]
[/scene]
";
        let scene = read(text).unwrap();
        let position = scene.get_component::<Transform>("a").unwrap().position;
        assert!((position.x - 3.0).abs() < f32::EPSILON);
        assert!(scene.has_component::<Properties>("a"));
    }

    #[test]
    fn test_unregistered_object_type() {
        let text = "\
[scene]
name=l
[entity]
name=a
[component]
type=Properties
values={
boss:[Dragon]
hp:100
[/Dragon]
}values
[/component]
[/entity]
[/scene]
";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            SceneLoadError::TypeNotRegistered { line: 8, name } if name == "Dragon"
        ));
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let text = "\
[scene]
name=l
[entity]
name=a
[component]
type=Properties
values={
loot:[
1
]gold
}values
[/component]
[/entity]
[/scene]
";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            SceneLoadError::MismatchedTag { line: 10, expected, found } if expected == "loot" && found == "gold"
        ));
    }

    #[test]
    fn test_truncated_snapshot() {
        let err = read("[scene]\nname=l\n[entity]\nname=a\n").unwrap_err();
        assert!(matches!(err, SceneLoadError::UnexpectedEnd { expected } if expected == ENTITY_CLOSE));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let text = "[scene]\nname=l\n[entity]\nname=a\n[component]\ntype=Transform\nvelocity=(1.0, 0.0)\n[/component]\n[/entity]\n[/scene]\n";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            SceneLoadError::Store { line: 5, source: StoreError::Value { .. } }
        ));
    }

    #[test]
    fn test_trailing_content_rejected() {
        let err = read("[scene]\nname=l\n[/scene]\n[scene]\n").unwrap_err();
        assert!(matches!(err, SceneLoadError::Malformed { line: 4, .. }));
    }
}
