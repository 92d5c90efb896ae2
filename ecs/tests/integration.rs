use quasar_core::math::Vec3;
use quasar_ecs::{
    Component, ComponentField, FieldError, FieldKind, FieldMap, FieldValue, Registry,
};

// ---------------------------------------------------------------------------
// Derived components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Shape {
    #[default]
    Cube,
    Sphere,
}

impl ComponentField for Shape {
    const KIND: FieldKind = FieldKind::Enum;

    fn to_field_value(&self) -> FieldValue {
        let name = match self {
            Shape::Cube => "Cube",
            Shape::Sphere => "Sphere",
        };
        FieldValue::Enum(name.to_string())
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Enum(name) if name == "Cube" => Some(Shape::Cube),
            FieldValue::Enum(name) if name == "Sphere" => Some(Shape::Sphere),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Component)]
struct Collider {
    shape: Shape,
    size: Vec3,
    layers: Vec<String>,
    #[runtime]
    cached_volume: Option<f32>,
}

#[derive(Debug, Default, Component)]
struct Marker;

#[test]
fn derive_lists_persistent_fields_only() {
    let names: Vec<_> = Collider::field_infos().iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["shape", "size", "layers"]);
    assert_eq!(Collider::field_infos()[0].kind, FieldKind::Enum);
    assert_eq!(Collider::field_infos()[1].kind, FieldKind::Vec3);
    assert_eq!(Collider::NAME, "Collider");
    assert!(Marker::field_infos().is_empty());
}

#[test]
fn derive_reads_and_writes_fields() {
    let mut collider = Collider::default();
    collider
        .set_field("size", FieldValue::Vec3([1.0, 2.0, 3.0]))
        .unwrap();
    collider
        .set_field("shape", FieldValue::Enum("Sphere".into()))
        .unwrap();

    assert_eq!(collider.size, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(collider.shape, Shape::Sphere);
    assert_eq!(
        collider.field("shape"),
        Some(FieldValue::Enum("Sphere".into()))
    );
}

#[test]
fn derive_rejects_runtime_and_unknown_fields() {
    let mut collider = Collider::default();
    assert!(collider.field("cached_volume").is_none());
    assert!(matches!(
        collider.set_field("cached_volume", FieldValue::F32(1.0)),
        Err(FieldError::UnknownField { .. })
    ));
}

#[test]
fn derive_rejects_invalid_enum_variant() {
    let mut collider = Collider::default();
    let err = collider
        .set_field("shape", FieldValue::Enum("Capsule".into()))
        .unwrap_err();
    assert_eq!(
        err,
        FieldError::TypeMismatch {
            component: "Collider",
            field: "shape",
            expected: FieldKind::Enum,
            found: FieldKind::Enum,
        }
    );
}

// ---------------------------------------------------------------------------
// Registry + reflection
// ---------------------------------------------------------------------------

#[test]
fn reflected_copy_skips_runtime_state() {
    let mut registry = Registry::new();
    registry.register_reflected::<Collider>();

    let source = registry.create_entity();
    registry.add_component(
        source,
        Collider {
            shape: Shape::Sphere,
            size: Vec3::new(2.0, 2.0, 2.0),
            layers: vec!["props".into()],
            cached_volume: Some(8.0),
        },
    );

    let copy = registry.create_entity();
    for name in registry.reflected_components_of(source) {
        let fields = registry.save_by_name(source, name).unwrap();
        registry.restore_by_name(copy, name, &fields).unwrap();
    }

    let copied = registry.get_component::<Collider>(copy);
    assert_eq!(copied.shape, Shape::Sphere);
    assert_eq!(copied.layers, vec!["props".to_string()]);
    assert!(copied.cached_volume.is_none());
}

#[test]
fn saved_fields_survive_text_serialization() {
    let collider = Collider {
        shape: Shape::Cube,
        size: Vec3::new(0.5, 1.0, 1.5),
        layers: Vec::new(),
        cached_volume: None,
    };
    let saved = collider.save_fields();

    let text = ron::to_string(&saved).unwrap();
    let loaded: FieldMap = ron::from_str(&text).unwrap();
    assert_eq!(loaded, saved);

    let mut restored = Collider::default();
    restored.restore_fields(&loaded).unwrap();
    assert_eq!(restored.size, Vec3::new(0.5, 1.0, 1.5));
}

#[test]
fn change_ticks_follow_frames() {
    let mut registry = Registry::new();
    let e = registry.create_entity();
    registry.add_component(e, Collider::default());

    let last_sync = registry.current_tick();
    registry.advance_tick();
    assert!(!registry.changed_since::<Collider>(e, last_sync));

    registry.get_component_mut::<Collider>(e).size.x = 4.0;
    assert!(registry.changed_since::<Collider>(e, last_sync));
}
