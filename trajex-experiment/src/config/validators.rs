//! Builds validators from the `validators` markup element.
//!
//! Each child element's tag selects the validator type; its attributes are
//! applied through that type's property registry. Every type also accepts
//! `name`, `enabled` and `log_level`.

use super::ConfigError;
use super::registry::{ConfigNode, LoadContext, PropertyRegistry, convert};
use trajex_core::{Circle, LogLevel, Point, Rectangle, Sector, Shape};
use trajex_validation::{
    Axis, Channel, ClassificationMap, CurvesValidator, FingerLiftedValidator, GlobalSpeedValidator, GradientValidator,
    LocationValidator, Milestone, MovementAngleValidator, RegionValidator, SpeedValidator, TrialDurationValidator,
    Validator, ValidatorChain,
};

fn axis(text: &str) -> Result<Axis, String> {
    Axis::parse(text).ok_or_else(|| format!("{text:?} is not one of x, y, xy"))
}

fn core_props<T: Validator>(registry: PropertyRegistry<T>) -> PropertyRegistry<T> {
    registry
        .attr("name", |v, s, _| {
            v.core_mut().name = s.trim().to_string();
            Ok(())
        })
        .attr("enabled", |v, s, _| {
            v.set_enabled(convert::flag(s)?);
            Ok(())
        })
        .attr("log_level", |v, s, _| {
            v.core_mut().log_level = LogLevel::parse(s).ok_or_else(|| format!("{s:?} is not a log level"))?;
            Ok(())
        })
}

fn load_map(path: &str, cx: &LoadContext) -> Result<ClassificationMap, String> {
    ClassificationMap::load(cx.resolve(path), Point::ORIGIN).map_err(|e| e.to_string())
}

/// `x` and `y` place the map's centre. Attributes apply in name order, so
/// `image` is loaded before either is set.
fn map_props<T: Validator + 'static>(
    registry: PropertyRegistry<T>,
    map: fn(&mut T) -> &mut ClassificationMap,
) -> PropertyRegistry<T> {
    registry
        .attr("x", move |v, s, _| {
            map(v).center_mut().x = convert::number(s)?;
            Ok(())
        })
        .attr("y", move |v, s, _| {
            map(v).center_mut().y = convert::number(s)?;
            Ok(())
        })
}

fn speed_registry() -> PropertyRegistry<SpeedValidator> {
    core_props(PropertyRegistry::<SpeedValidator>::new("SpeedValidator"))
        .attr("axis", |v, s, _| {
            v.axis = axis(s)?;
            Ok(())
        })
        .attr("min_speed", |v, s, _| {
            v.min_speed = convert::optional_number(s)?;
            Ok(())
        })
        .attr("max_speed", |v, s, _| {
            v.max_speed = convert::optional_number(s)?;
            Ok(())
        })
        .attr("grace_period", |v, s, _| {
            v.grace_period = convert::non_negative(s)?;
            Ok(())
        })
        .attr("calculation_interval", |v, s, _| {
            v.calculation_interval = convert::non_negative(s)?;
            Ok(())
        })
}

fn global_speed_registry() -> PropertyRegistry<GlobalSpeedValidator> {
    core_props(PropertyRegistry::<GlobalSpeedValidator>::new("GlobalSpeedValidator"))
        .attr("axis", |v, s, _| {
            v.axis = axis(s)?;
            Ok(())
        })
        .attr("origin_coord", |v, s, _| {
            v.origin_coord = convert::number(s)?;
            Ok(())
        })
        .attr("end_coord", |v, s, _| {
            v.end_coord = convert::number(s)?;
            Ok(())
        })
        .attr("max_movement_time", |v, s, _| {
            v.max_movement_time = convert::non_negative(s)?;
            Ok(())
        })
        .attr("grace_period", |v, s, _| {
            v.grace_period = convert::non_negative(s)?;
            Ok(())
        })
        .attr("milestones", |v, s, _| {
            let milestones = convert::pairs(s)?
                .into_iter()
                .map(|(time_fraction, progress)| Milestone {
                    time_fraction,
                    progress,
                })
                .collect();
            v.set_milestones(milestones).map_err(|e| e.to_string())
        })
}

fn curves_registry() -> PropertyRegistry<CurvesValidator> {
    core_props(PropertyRegistry::<CurvesValidator>::new("CurvesValidator"))
        .attr("max_curves", |v, s, _| {
            v.max_curves = convert::count(s)?;
            Ok(())
        })
        .attr("min_angle_change", |v, s, _| {
            v.min_angle_change = convert::non_negative(s)?;
            Ok(())
        })
        .attr("min_distance", |v, s, _| {
            v.min_distance = convert::non_negative(s)?;
            Ok(())
        })
}

fn movement_angle_registry() -> PropertyRegistry<MovementAngleValidator> {
    core_props(PropertyRegistry::<MovementAngleValidator>::new("MovementAngleValidator"))
        .attr("min_angle", |v, s, _| {
            v.min_angle = convert::number(s)?;
            Ok(())
        })
        .attr("max_angle", |v, s, _| {
            v.max_angle = convert::number(s)?;
            Ok(())
        })
        .attr("calc_distance", |v, s, _| {
            v.calc_distance = convert::non_negative(s)?;
            Ok(())
        })
        .attr("grace_period", |v, s, _| {
            v.grace_period = convert::non_negative(s)?;
            Ok(())
        })
}

fn trial_duration_registry() -> PropertyRegistry<TrialDurationValidator> {
    core_props(PropertyRegistry::<TrialDurationValidator>::new("TrialDurationValidator"))
        .attr("max_trial_duration", |v, s, _| {
            v.max_trial_duration = convert::non_negative(s)?;
            Ok(())
        })
}

/// Switches the region's shape, keeping its centre.
fn reshape(region: &mut Shape, kind: &str) -> Result<(), String> {
    let center = *region.center_mut();
    *region = match kind.trim().to_ascii_lowercase().as_str() {
        "rectangle" => Shape::Rectangle(Rectangle::new(center, 0.0, 0.0)),
        "circle" => Shape::Circle(Circle::new(center, 0.0)),
        "sector" => Shape::Sector(Sector::new(center, 0.0, 0.0, 360.0)),
        _ => return Err(format!("{kind:?} is not one of rectangle, circle, sector")),
    };
    Ok(())
}

fn region_registry() -> PropertyRegistry<RegionValidator> {
    fn wrong_shape(property: &str) -> String {
        format!("{property} does not apply to this shape")
    }
    // `shape` is applied by the factory before the other attributes
    core_props(PropertyRegistry::<RegionValidator>::new("RegionValidator"))
        .ignore("shape")
        .attr("x", |v, s, _| {
            v.region.center_mut().x = convert::number(s)?;
            Ok(())
        })
        .attr("y", |v, s, _| {
            v.region.center_mut().y = convert::number(s)?;
            Ok(())
        })
        .attr("width", |v, s, _| match &mut v.region {
            Shape::Rectangle(r) => {
                r.width = convert::non_negative(s)?;
                Ok(())
            }
            _ => Err(wrong_shape("width")),
        })
        .attr("height", |v, s, _| match &mut v.region {
            Shape::Rectangle(r) => {
                r.height = convert::non_negative(s)?;
                Ok(())
            }
            _ => Err(wrong_shape("height")),
        })
        .attr("rotation", |v, s, _| match &mut v.region {
            Shape::Rectangle(r) => {
                r.rotation = convert::number(s)?;
                Ok(())
            }
            _ => Err(wrong_shape("rotation")),
        })
        .attr("radius", |v, s, _| match &mut v.region {
            Shape::Circle(c) => {
                c.radius = convert::non_negative(s)?;
                Ok(())
            }
            Shape::Sector(sec) => {
                sec.radius = convert::non_negative(s)?;
                Ok(())
            }
            Shape::Rectangle(_) => Err(wrong_shape("radius")),
        })
        .attr("inner_radius", |v, s, _| match &mut v.region {
            Shape::Sector(sec) => {
                sec.inner_radius = convert::non_negative(s)?;
                Ok(())
            }
            _ => Err(wrong_shape("inner_radius")),
        })
        .attr("from_angle", |v, s, _| match &mut v.region {
            Shape::Sector(sec) => {
                sec.from_angle = convert::number(s)?;
                Ok(())
            }
            _ => Err(wrong_shape("from_angle")),
        })
        .attr("to_angle", |v, s, _| match &mut v.region {
            Shape::Sector(sec) => {
                sec.to_angle = convert::number(s)?;
                Ok(())
            }
            _ => Err(wrong_shape("to_angle")),
        })
        .attr("inside", |v, s, _| {
            v.must_be_inside = convert::flag(s)?;
            Ok(())
        })
}

fn location_registry() -> PropertyRegistry<LocationValidator> {
    map_props(
        core_props(PropertyRegistry::<LocationValidator>::new("LocationValidator")),
        LocationValidator::map_mut,
    )
        .attr("image", |v, s, cx| {
            v.set_map(load_map(s, cx)?);
            Ok(())
        })
        .attr("valid_colors", |v, s, _| {
            v.valid_colors = convert::colors(s)?.into_iter().collect();
            Ok(())
        })
        .attr("default_valid", |v, s, _| {
            v.default_valid = convert::flag(s)?;
            Ok(())
        })
        .attr("grace_period", |v, s, _| {
            v.grace_period = convert::non_negative(s)?;
            Ok(())
        })
}

fn gradient_registry() -> PropertyRegistry<GradientValidator> {
    map_props(
        core_props(PropertyRegistry::<GradientValidator>::new("GradientValidator")),
        GradientValidator::map_mut,
    )
    .attr("channel", |v, s, _| {
        let channel = Channel::parse(s).ok_or_else(|| format!("{s:?} is not one of red, green, blue, rgb"))?;
        v.set_channel(channel);
        Ok(())
    })
    .attr("image", |v, s, cx| {
        v.set_map(load_map(s, cx)?);
        Ok(())
    })
    .attr("default_valid", |v, s, _| {
        v.default_valid = convert::flag(s)?;
        Ok(())
    })
    .attr("ascending", |v, s, _| {
        v.ascending = convert::flag(s)?;
        Ok(())
    })
    .attr("max_valid_back_movement", |v, s, _| {
        v.max_valid_back_movement = convert::non_negative(s)?;
        Ok(())
    })
    .attr("cyclic", |v, s, _| {
        v.cyclic = convert::flag(s)?;
        Ok(())
    })
    .attr("period", |v, s, _| {
        let period = convert::non_negative(s)?;
        if period == 0.0 {
            return Err("the period must be positive".into());
        }
        v.period = Some(period);
        Ok(())
    })
    .attr("grace_period", |v, s, _| {
        v.grace_period = convert::non_negative(s)?;
        Ok(())
    })
}

fn finger_registry() -> PropertyRegistry<FingerLiftedValidator> {
    PropertyRegistry::<FingerLiftedValidator>::new("FingerLiftedValidator")
        .attr("max_offscreen_duration", |v, s, _| {
            v.max_offscreen_duration = convert::non_negative(s)?;
            Ok(())
        })
        .attr("enabled", |v, s, _| {
            v.core_mut().enabled = convert::flag(s)?;
            Ok(())
        })
        .attr("log_level", |v, s, _| {
            v.core_mut().log_level = LogLevel::parse(s).ok_or_else(|| format!("{s:?} is not a log level"))?;
            Ok(())
        })
}

fn configure<T: Validator + 'static>(
    mut validator: T,
    registry: PropertyRegistry<T>,
    node: &ConfigNode,
    cx: &LoadContext,
) -> Result<Box<dyn Validator>, ConfigError> {
    registry.apply(&mut validator, node, cx)?;
    Ok(Box::new(validator))
}

/// Builds one validator from its element.
pub fn build_validator(node: &ConfigNode, cx: &LoadContext) -> Result<Box<dyn Validator>, ConfigError> {
    let ctx = &cx.session;
    match node.tag.as_str() {
        "speed" => configure(SpeedValidator::new(ctx), speed_registry(), node, cx),
        "global_speed" => configure(GlobalSpeedValidator::new(ctx), global_speed_registry(), node, cx),
        "curves" => configure(CurvesValidator::new(ctx), curves_registry(), node, cx),
        "movement_angle" => configure(MovementAngleValidator::new(ctx), movement_angle_registry(), node, cx),
        "trial_duration" => configure(TrialDurationValidator::new(f64::INFINITY, ctx), trial_duration_registry(), node, cx),
        "region" => {
            let mut region = Shape::Rectangle(Rectangle::new(Point::ORIGIN, 0.0, 0.0));
            if let Some(kind) = node.attr("shape") {
                reshape(&mut region, kind).map_err(|reason| ConfigError::InvalidValue {
                    type_name: "RegionValidator",
                    property: "shape".into(),
                    value: kind.to_string(),
                    reason,
                })?;
            }
            configure(RegionValidator::new(region, ctx), region_registry(), node, cx)
        }
        "location" => configure(
            LocationValidator::new(ClassificationMap::default(), ctx),
            location_registry(),
            node,
            cx,
        ),
        "gradient" => configure(
            GradientValidator::new(ClassificationMap::default(), ctx),
            gradient_registry(),
            node,
            cx,
        ),
        other => Err(ConfigError::UnknownValidator(other.to_string())),
    }
}

/// Applies the `validators` element: chain members in document order, plus
/// the optional `finger_lifted` element configuring the driver's lift detector.
pub fn build_validators(
    node: &ConfigNode,
    cx: &LoadContext,
    finger: &mut FingerLiftedValidator,
) -> Result<ValidatorChain, ConfigError> {
    if let Some(name) = node.attributes.keys().next() {
        return Err(ConfigError::UnknownProperty {
            type_name: "validators",
            property: name.clone(),
        });
    }
    let mut chain = ValidatorChain::new();
    let finger_props = finger_registry();
    for child in &node.children {
        if child.tag == "finger_lifted" {
            finger_props.apply(finger, child, cx)?;
            continue;
        }
        let validator = build_validator(child, cx)?;
        tracing::debug!(validator = validator.name(), "configured validator");
        chain.add_boxed(validator);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trajex_core::{ErrorCode, SessionContext};

    fn tree(value: serde_json::Value) -> ConfigNode {
        ConfigNode::from_json("validators", &value).unwrap()
    }

    #[test]
    fn builds_chain_in_document_order() {
        let node = tree(json!({
            "speed": {"axis": "y", "min_speed": 1, "grace_period": 0},
            "trial_duration": {"max_trial_duration": 3},
            "finger_lifted": {"max_offscreen_duration": 0.25}
        }));
        let mut finger = FingerLiftedValidator::new(&SessionContext::default());
        let mut chain = build_validators(&node, &LoadContext::default(), &mut finger).unwrap();
        assert_eq!(finger.max_offscreen_duration, 0.25);

        let names: Vec<_> = chain.iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, vec!["speed", "trial_duration"]);

        chain.reset(0.0);
        chain.evaluate(Point::new(0.0, 0.0), 0.0).unwrap();
        chain.evaluate(Point::new(0.0, 1.0), 1.0).unwrap();
        let err = chain.evaluate(Point::new(0.0, 1.5), 2.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooSlow);
    }

    #[test]
    fn repeated_elements_and_custom_names() {
        let node = tree(json!({
            "region": [
                {"name": "corridor", "shape": "rectangle", "width": 200, "height": 800},
                {"name": "hole", "shape": "circle", "x": 50, "radius": 10, "inside": false}
            ]
        }));
        let mut finger = FingerLiftedValidator::new(&SessionContext::default());
        let mut chain = build_validators(&node, &LoadContext::default(), &mut finger).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.get("hole").is_some());

        chain.reset(0.0);
        assert!(chain.evaluate(Point::new(0.0, 0.0), 0.0).is_ok());
        let err = chain.evaluate(Point::new(50.0, 5.0), 0.1).unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfRegion);
    }

    #[test]
    fn unknown_validator_and_property() {
        let cx = LoadContext::default();
        let mut finger = FingerLiftedValidator::new(&SessionContext::default());
        let err = build_validators(&tree(json!({"telepathy": {}})), &cx, &mut finger).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownValidator(ref t) if t == "telepathy"));

        let err = build_validators(&tree(json!({"speed": {"min_sped": 3}})), &cx, &mut finger).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownProperty { type_name: "SpeedValidator", ref property } if property == "min_sped"
        ));
    }

    #[test]
    fn shape_specific_attributes_are_checked() {
        let cx = LoadContext::default();
        let node = ConfigNode::new("region").with_attr("shape", "circle").with_attr("width", 3);
        let err = build_validator(&node, &cx).err().unwrap();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn gradient_channel_and_milestones() {
        let cx = LoadContext::default();
        let node = ConfigNode::new("gradient")
            .with_attr("channel", "green")
            .with_attr("cyclic", true)
            .with_attr("max_valid_back_movement", 2);
        let v = build_validator(&node, &cx).unwrap();
        assert_eq!(v.name(), "gradient");

        let node = ConfigNode::new("global_speed").with_attr("milestones", "0.5:0.75,0.25:0.1");
        assert!(build_validator(&node, &cx).is_err());
    }

    #[test]
    fn gradient_image_is_placed_and_cycles_over_its_range() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::from_fn(100, 1, |x, _| image::Rgb([x as u8, 0, 0]))
            .save(dir.path().join("gradient.png"))
            .unwrap();
        let cx = LoadContext {
            base_dir: dir.path().to_path_buf(),
            ..LoadContext::default()
        };
        let node = ConfigNode::new("gradient")
            .with_attr("image", "gradient.png")
            .with_attr("cyclic", true)
            .with_attr("x", 50);
        let mut v = build_validator(&node, &cx).unwrap();

        v.reset(0.0);
        for (i, step) in [80.0, 90.0, 5.0].into_iter().enumerate() {
            assert!(v.check_xyt(Point::new(step + 0.5, 0.0), i as f64 * 0.1).is_ok(), "step {step}");
        }
        // the map now spans x in [0, 100)
        let err = v.check_xyt(Point::new(-0.5, 0.0), 0.3).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidLocation);
    }

    #[test]
    fn zero_gradient_period_is_rejected() {
        let node = ConfigNode::new("gradient").with_attr("period", 0);
        let err = build_validator(&node, &LoadContext::default()).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidValue { ref property, .. } if property == "period"));
    }

    #[test]
    fn missing_image_is_a_config_error() {
        let cx = LoadContext::default();
        let node = ConfigNode::new("location").with_attr("image", "/definitely/not/here.png");
        let err = build_validator(&node, &cx).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidValue { ref property, .. } if property == "image"));
    }
}
