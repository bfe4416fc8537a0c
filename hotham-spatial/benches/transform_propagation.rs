use criterion::{criterion_group, criterion_main, Criterion};
use hotham_spatial::{
    components::{Aabb, Transform},
    glam::{Affine3A, Vec3},
    hecs::{Entity, World},
    hierarchy::add_child,
    SpatialContext,
};

fn spawn(world: &mut World, spatial_context: &mut SpatialContext) -> Entity {
    let entity = world.spawn(());
    spatial_context
        .attach_transform(
            world,
            entity,
            Transform::default().with_local_aabb(Aabb::unit_cube()),
        )
        .unwrap();
    entity
}

/// A root with `width` children, each with `width` children of their own.
fn wide_scene(width: usize) -> (World, SpatialContext, Entity) {
    let mut world = World::new();
    let mut spatial_context = SpatialContext::default();
    let root = spawn(&mut world, &mut spatial_context);
    for _ in 0..width {
        let child = spawn(&mut world, &mut spatial_context);
        add_child(&mut world, &mut spatial_context, root, child).unwrap();
        for _ in 0..width {
            let grandchild = spawn(&mut world, &mut spatial_context);
            add_child(&mut world, &mut spatial_context, child, grandchild).unwrap();
        }
    }
    (world, spatial_context, root)
}

/// A single chain `depth` objects long.
fn deep_scene(depth: usize) -> (World, SpatialContext, Entity) {
    let mut world = World::new();
    let mut spatial_context = SpatialContext::default();
    let root = spawn(&mut world, &mut spatial_context);
    let mut parent = root;
    for _ in 0..depth {
        let child = spawn(&mut world, &mut spatial_context);
        add_child(&mut world, &mut spatial_context, parent, child).unwrap();
        parent = child;
    }
    (world, spatial_context, root)
}

fn propagate(c: &mut Criterion) {
    let mut x = 0.0;
    let (mut world, mut spatial_context, root) = wide_scene(32);
    c.bench_function("Propagate wide", |b| {
        b.iter(|| {
            x += 1.0;
            spatial_context
                .set_world_matrix(
                    &mut world,
                    root,
                    Affine3A::from_translation(Vec3::new(x, 0.0, 0.0)),
                    None,
                )
                .unwrap()
        })
    });

    let (mut world, mut spatial_context, root) = deep_scene(1024);
    c.bench_function("Propagate deep", |b| {
        b.iter(|| {
            x += 1.0;
            spatial_context
                .set_world_matrix(
                    &mut world,
                    root,
                    Affine3A::from_translation(Vec3::new(x, 0.0, 0.0)),
                    None,
                )
                .unwrap()
        })
    });
}

criterion_group!(benches, propagate);
criterion_main!(benches);
