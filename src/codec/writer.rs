//! Scene snapshot writer

use super::literal::{self, FALSE, NULL, TRUE};
use super::tags;
use crate::ecs::Scene;
use crate::value::Value;

/// Render a scene as snapshot text
#[must_use]
pub fn write_scene(scene: &Scene) -> String {
    let mut out = Writer::default();

    out.line(0, tags::SCENE_OPEN);
    out.line(1, format!("name={}", literal::encode_str(scene.name())));
    out.line(1, format!("camera={}", encode_name(scene.camera())));
    out.line(1, format!("is_main={}", encode_bool(scene.is_main())));

    for (name, record) in scene.entities() {
        out.line(1, tags::ENTITY_OPEN);
        out.line(2, format!("name={}", literal::encode_str(name)));
        out.line(2, format!("is_active={}", encode_bool(record.is_active)));
        out.line(2, format!("is_visible={}", encode_bool(record.is_visible)));
        out.line(2, format!("parent={}", encode_name(record.parent())));

        for kind in record.component_kinds() {
            let Some(fields) = scene.component_fields(name, kind) else {
                continue;
            };
            out.line(2, tags::COMPONENT_OPEN);
            out.line(3, format!("type={kind}"));
            for (attr, value) in &fields {
                out.value(3, &format!("{attr}="), value, attr);
            }
            out.line(2, tags::COMPONENT_CLOSE);
        }

        out.line(1, tags::ENTITY_CLOSE);
    }

    out.line(0, tags::SCENE_CLOSE);
    out.finish()
}

fn encode_bool(value: bool) -> &'static str {
    if value { TRUE } else { FALSE }
}

fn encode_name(name: Option<&str>) -> String {
    name.map_or_else(|| NULL.to_string(), literal::encode_str)
}

#[derive(Default)]
struct Writer {
    out: String,
}

impl Writer {
    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        for _ in 0..depth {
            self.out.push('\t');
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Write `prefix` followed by `value`, nesting blocks closed with `tag`
    fn value(&mut self, depth: usize, prefix: &str, value: &Value, tag: &str) {
        match value {
            Value::Map(map) => {
                self.line(depth, format!("{prefix}{}", tags::MAP_OPEN));
                for (key, item) in map {
                    let key = literal::encode_key(key);
                    self.value(depth + 1, &format!("{key}:"), item, &key);
                }
                self.line(depth, format!("{}{tag}", tags::MAP_CLOSE));
            }
            Value::Seq(items) => {
                self.line(depth, format!("{prefix}{}", tags::SEQ_OPEN));
                for item in items {
                    self.value(depth + 1, "", item, tag);
                }
                self.line(depth, format!("{}{tag}", tags::SEQ_CLOSE));
            }
            Value::Object(object) => {
                self.line(depth, format!("{prefix}{}", tags::object_open(&object.type_name)));
                for (key, item) in &object.fields {
                    let key = literal::encode_key(key);
                    self.value(depth + 1, &format!("{key}:"), item, &key);
                }
                self.line(depth, tags::object_close(&object.type_name));
            }
            scalar => {
                let text = literal::encode_scalar(scalar).unwrap_or_default();
                self.line(depth, format!("{prefix}{text}"));
            }
        }
    }

    fn finish(self) -> String {
        self.out
    }
}
