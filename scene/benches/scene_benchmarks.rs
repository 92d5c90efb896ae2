use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use quasar_core::math::Vec3;
use quasar_scene::Scene;
use quasar_scene::components::{BodyType, BoxCollider, RigidBody, SphereCollider, Transform};

const DT: f32 = 1.0 / 60.0;

/// A static floor with `count` dynamic bodies stacked in columns above it.
fn scene_with_bodies(count: usize) -> Scene {
    let mut scene = Scene::new("Bench");
    let floor = scene.create_entity("Floor");
    scene.get_component_mut::<Transform>(floor).scale = Vec3::new(100.0, 1.0, 100.0);
    scene.add_component(floor, BoxCollider::default());
    scene.add_component(floor, RigidBody::new(BodyType::Static));

    for i in 0..count {
        let e = scene.create_entity("Body");
        let column = (i % 20) as f32;
        let row = (i / 20) as f32;
        scene.get_component_mut::<Transform>(e).position =
            Vec3::new(column * 1.5 - 15.0, 2.0 + row * 1.1, 0.0);
        if i % 2 == 0 {
            scene.add_component(e, BoxCollider::default());
        } else {
            scene.add_component(e, SphereCollider::default());
        }
        scene.add_component(e, RigidBody::default());
    }
    scene
}

// ---------------------------------------------------------------------------
// Frame loop
// ---------------------------------------------------------------------------

fn bench_register_500_bodies(c: &mut Criterion) {
    c.bench_function("register_500_bodies", |b| {
        b.iter_batched(
            || scene_with_bodies(500),
            |mut scene| {
                scene.on_update(DT);
                black_box(scene.physics().body_count());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_update_500_bodies(c: &mut Criterion) {
    let mut scene = scene_with_bodies(500);
    scene.on_update(DT);
    c.bench_function("update_500_bodies", |b| {
        b.iter(|| scene.on_update(DT));
    });
}

fn bench_moving_kinematic_100(c: &mut Criterion) {
    let mut scene = Scene::new("Kinematic");
    let platforms: Vec<_> = (0..100)
        .map(|i| {
            let e = scene.create_entity("Platform");
            scene.get_component_mut::<Transform>(e).position = Vec3::new(i as f32 * 2.0, 0.0, 0.0);
            scene.add_component(e, BoxCollider::default());
            scene.add_component(e, RigidBody::new(BodyType::Kinematic));
            e
        })
        .collect();
    scene.on_update(DT);

    let mut t = 0.0f32;
    c.bench_function("moving_kinematic_100", |b| {
        b.iter(|| {
            t += DT;
            for e in &platforms {
                scene.get_component_mut::<Transform>(*e).position.y = t.sin();
            }
            scene.on_update(DT);
        });
    });
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

fn bench_save_load_500(c: &mut Criterion) {
    let scene = scene_with_bodies(500);
    c.bench_function("save_load_500", |b| {
        b.iter(|| {
            let snapshot = scene.save();
            black_box(Scene::load(&snapshot).entity_count())
        });
    });
}

criterion_group!(
    benches,
    bench_register_500_bodies,
    bench_update_500_bodies,
    bench_moving_kinematic_100,
    bench_save_load_500,
);
criterion_main!(benches);
