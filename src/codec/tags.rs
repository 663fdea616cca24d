//! Structural markers of the snapshot format

pub const SCENE_OPEN: &str = "[scene]";
pub const SCENE_CLOSE: &str = "[/scene]";
pub const ENTITY_OPEN: &str = "[entity]";
pub const ENTITY_CLOSE: &str = "[/entity]";
pub const COMPONENT_OPEN: &str = "[component]";
pub const COMPONENT_CLOSE: &str = "[/component]";

pub const MAP_OPEN: &str = "{";
pub const MAP_CLOSE: &str = "}";
pub const SEQ_OPEN: &str = "[";
pub const SEQ_CLOSE: &str = "]";

/// Prefix of an object closing marker
pub const OBJECT_CLOSE_PREFIX: &str = "[/";

pub fn object_open(type_name: &str) -> String {
    format!("[{type_name}]")
}

pub fn object_close(type_name: &str) -> String {
    format!("{OBJECT_CLOSE_PREFIX}{type_name}]")
}

/// Type name of an object opening marker such as `[Animation]`
pub fn parse_object_open(text: &str) -> Option<&str> {
    let name = text.strip_prefix('[')?.strip_suffix(']')?;
    (!name.is_empty() && !name.starts_with('/')).then_some(name)
}
