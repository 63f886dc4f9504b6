//! Generic property binding over a markup tree.
//!
//! A [`ConfigNode`] is an element with a tag, text attributes and child
//! elements. A [`PropertyRegistry`] maps each attribute or child name to a
//! typed setter for one target type and applies a node to a value of that
//! type. Names the registry does not know are rejected.

use super::ConfigError;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use trajex_core::SessionContext;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<ConfigNode>,
}

impl ConfigNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    /// Reads a JSON value as an element named `tag`.
    ///
    /// Scalar members become attributes, object members child elements and
    /// arrays of objects one child element per entry. `null` members are skipped.
    pub fn from_json(tag: &str, value: &serde_json::Value) -> Result<Self, ConfigError> {
        use serde_json::Value;

        let Value::Object(members) = value else {
            return Err(ConfigError::Structure {
                element: tag.to_string(),
                reason: "expected an object".into(),
            });
        };
        let mut node = ConfigNode::new(tag);
        for (name, member) in members {
            match member {
                Value::Null => {}
                Value::Bool(b) => {
                    node.attributes.insert(name.clone(), b.to_string());
                }
                Value::Number(n) => {
                    node.attributes.insert(name.clone(), n.to_string());
                }
                Value::String(s) => {
                    node.attributes.insert(name.clone(), s.clone());
                }
                Value::Object(_) => node.children.push(Self::from_json(name, member)?),
                Value::Array(items) => {
                    for item in items {
                        node.children.push(Self::from_json(name, item)?);
                    }
                }
            }
        }
        Ok(node)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Session-wide inputs setters may need.
#[derive(Debug, Clone, Default)]
pub struct LoadContext {
    pub session: SessionContext,
    /// Directory relative paths in the configuration are resolved against.
    pub base_dir: PathBuf,
}

impl LoadContext {
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }
}

type AttrSetter<T> = Box<dyn Fn(&mut T, &str, &LoadContext) -> Result<(), String>>;
type ElementSetter<T> = Box<dyn Fn(&mut T, &ConfigNode, &LoadContext) -> Result<(), ConfigError>>;

/// Name → setter table for one configurable type, built once.
pub struct PropertyRegistry<T> {
    type_name: &'static str,
    attributes: HashMap<&'static str, AttrSetter<T>>,
    elements: HashMap<&'static str, ElementSetter<T>>,
    /// Attributes consumed elsewhere (e.g. by a factory) and skipped here.
    ignored: Vec<&'static str>,
}

impl<T> PropertyRegistry<T> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            attributes: HashMap::new(),
            elements: HashMap::new(),
            ignored: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn attr(
        mut self,
        name: &'static str,
        setter: impl Fn(&mut T, &str, &LoadContext) -> Result<(), String> + 'static,
    ) -> Self {
        self.attributes.insert(name, Box::new(setter));
        self
    }

    pub fn element(
        mut self,
        name: &'static str,
        setter: impl Fn(&mut T, &ConfigNode, &LoadContext) -> Result<(), ConfigError> + 'static,
    ) -> Self {
        self.elements.insert(name, Box::new(setter));
        self
    }

    pub fn ignore(mut self, name: &'static str) -> Self {
        self.ignored.push(name);
        self
    }

    pub fn knows(&self, name: &str) -> bool {
        self.attributes.contains_key(name) || self.elements.contains_key(name) || self.ignored.contains(&name)
    }

    /// Applies every attribute and child of `node` to `target`.
    pub fn apply(&self, target: &mut T, node: &ConfigNode, cx: &LoadContext) -> Result<(), ConfigError> {
        for (name, value) in &node.attributes {
            if self.ignored.contains(&name.as_str()) {
                continue;
            }
            let setter = self.attributes.get(name.as_str()).ok_or_else(|| ConfigError::UnknownProperty {
                type_name: self.type_name,
                property: name.clone(),
            })?;
            setter(target, value, cx).map_err(|reason| ConfigError::InvalidValue {
                type_name: self.type_name,
                property: name.clone(),
                value: value.clone(),
                reason,
            })?;
        }
        for child in &node.children {
            let setter = self.elements.get(child.tag.as_str()).ok_or_else(|| ConfigError::UnknownProperty {
                type_name: self.type_name,
                property: child.tag.clone(),
            })?;
            setter(target, child, cx)?;
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for PropertyRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.attributes.keys().chain(self.elements.keys()).collect();
        names.sort();
        f.debug_struct("PropertyRegistry")
            .field("type_name", &self.type_name)
            .field("properties", &names)
            .finish()
    }
}

/// Converters shared by the registries.
pub mod convert {
    pub fn number(text: &str) -> Result<f64, String> {
        let v: f64 = text.trim().parse().map_err(|_| format!("{text:?} is not a number"))?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(format!("{text:?} is not a finite number"))
        }
    }

    pub fn non_negative(text: &str) -> Result<f64, String> {
        let v = number(text)?;
        if v < 0.0 {
            return Err(format!("{v} must not be negative"));
        }
        Ok(v)
    }

    /// A number, or `none` for no value.
    pub fn optional_number(text: &str) -> Result<Option<f64>, String> {
        if text.trim().eq_ignore_ascii_case("none") {
            Ok(None)
        } else {
            number(text).map(Some)
        }
    }

    pub fn count(text: &str) -> Result<usize, String> {
        text.trim().parse().map_err(|_| format!("{text:?} is not a non-negative integer"))
    }

    pub fn flag(text: &str) -> Result<bool, String> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(format!("{text:?} is not a boolean")),
        }
    }

    /// `#rrggbb` or `rrggbb` into a packed colour.
    pub fn color(text: &str) -> Result<u32, String> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(format!("{text:?} is not a #rrggbb colour"));
        }
        u32::from_str_radix(hex, 16).map_err(|_| format!("{text:?} is not a #rrggbb colour"))
    }

    /// Comma-separated colours.
    pub fn colors(text: &str) -> Result<Vec<u32>, String> {
        text.split(',').filter(|s| !s.trim().is_empty()).map(color).collect()
    }

    /// `t:p` pairs separated by commas.
    pub fn pairs(text: &str) -> Result<Vec<(f64, f64)>, String> {
        text.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|pair| {
                let (a, b) = pair
                    .split_once(':')
                    .ok_or_else(|| format!("{pair:?} is not a time:value pair"))?;
                Ok((number(a)?, number(b)?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Probe {
        speed: f64,
        enabled: bool,
        tags: Vec<String>,
    }

    fn registry() -> PropertyRegistry<Probe> {
        PropertyRegistry::<Probe>::new("Probe")
            .attr("speed", |p, v, _| {
                p.speed = convert::number(v)?;
                Ok(())
            })
            .attr("enabled", |p, v, _| {
                p.enabled = convert::flag(v)?;
                Ok(())
            })
            .element("tag", |p, node, _| {
                p.tags.push(node.attr("name").unwrap_or_default().to_string());
                Ok(())
            })
    }

    #[test]
    fn json_tree_shape() {
        let node = ConfigNode::from_json(
            "probe",
            &json!({"speed": 2.5, "enabled": true, "tag": [{"name": "a"}, {"name": "b"}], "skip": null}),
        )
        .unwrap();
        assert_eq!(node.attr("speed"), Some("2.5"));
        assert_eq!(node.attr("enabled"), Some("true"));
        assert_eq!(node.children.len(), 2);
        assert!(node.attr("skip").is_none());
    }

    #[test]
    fn applies_attributes_and_children() {
        let node = ConfigNode::new("probe")
            .with_attr("speed", 3)
            .with_attr("enabled", "yes")
            .with_child(ConfigNode::new("tag").with_attr("name", "x"));
        let mut probe = Probe::default();
        registry().apply(&mut probe, &node, &LoadContext::default()).unwrap();
        assert_eq!(
            probe,
            Probe {
                speed: 3.0,
                enabled: true,
                tags: vec!["x".into()]
            }
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        let node = ConfigNode::new("probe").with_attr("sped", 3);
        let err = registry()
            .apply(&mut Probe::default(), &node, &LoadContext::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownProperty { type_name: "Probe", ref property } if property == "sped"
        ));
    }

    #[test]
    fn unconvertible_value_names_type_and_attribute() {
        let node = ConfigNode::new("probe").with_attr("speed", "fast");
        let err = registry()
            .apply(&mut Probe::default(), &node, &LoadContext::default())
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Probe"), "{text}");
        assert!(text.contains("speed"), "{text}");
    }

    #[test]
    fn converters() {
        assert_eq!(convert::optional_number("None"), Ok(None));
        assert_eq!(convert::color("#ff0080"), Ok(0xff0080));
        assert!(convert::color("#ff00").is_err());
        assert_eq!(convert::pairs("0.5:0.2, 0.8:0.6"), Ok(vec![(0.5, 0.2), (0.8, 0.6)]));
        assert!(convert::non_negative("-1").is_err());
    }
}
