// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lookup Benchmark
//!
//! Measures the read path once types are registered:
//! - cached `get_type` (lock-free hit)
//! - property lookup by index and by name, own and inherited
//! - typed get/set through a property handle
//! - cold registration of a small type tree

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mirror::{Accessibility, AccessFilter, Reflect, Registry};

#[derive(Reflect, Default)]
#[reflect(name = "Pose")]
struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

#[derive(Reflect, Default)]
#[reflect(name = "Robot")]
struct Robot {
    #[reflect(base = 0)]
    pose: Pose,
    pub id: u32,
    pub(crate) battery: f32,
    name: String,
}

fn bench_cached_get_type(c: &mut Criterion) {
    let registry = Registry::new();
    registry.get_type::<Robot>().expect("register");

    c.bench_function("get_type_cached", |b| {
        b.iter(|| black_box(registry.get_type::<Robot>().expect("cached")));
    });
    c.bench_function("get_by_name", |b| {
        b.iter(|| black_box(registry.get_by_name(black_box("Robot"))));
    });
}

fn bench_property_lookup(c: &mut Criterion) {
    let registry = Registry::new();
    let robot = registry.get_type::<Robot>().expect("register");
    let props = robot.properties().expect("class");

    c.bench_function("property_by_index_own", |b| {
        b.iter(|| black_box(props.get_by_index(black_box(1))));
    });
    c.bench_function("property_by_name_inherited", |b| {
        b.iter(|| black_box(props.get_by_name(black_box("theta"))));
    });
    c.bench_function("get_all_by_access", |b| {
        b.iter(|| black_box(props.get_all_by_access(Accessibility::Protected, AccessFilter::DownTo)));
    });
}

fn bench_typed_access(c: &mut Criterion) {
    let registry = Registry::new();
    let robot = registry.get_type::<Robot>().expect("register");
    let props = robot.properties().expect("class");
    let id = props.require_name("id").expect("id");
    let x = props.require_name("x").expect("x");
    let mut value = Robot::default();

    c.bench_function("set_get_own", |b| {
        b.iter(|| {
            id.set(&mut value, black_box(7u32)).expect("set");
            black_box(*id.get::<u32, _>(&value).expect("get"))
        });
    });
    c.bench_function("set_get_inherited", |b| {
        b.iter(|| {
            x.set(&mut value, black_box(1.5f64)).expect("set");
            black_box(*x.get::<f64, _>(&value).expect("get"))
        });
    });
    black_box(&value.name);
}

fn bench_cold_registration(c: &mut Criterion) {
    c.bench_function("register_robot_cold", |b| {
        b.iter(|| {
            let registry = Registry::new();
            black_box(registry.get_type::<Robot>().expect("register"))
        });
    });
}

criterion_group!(
    benches,
    bench_cached_get_type,
    bench_property_lookup,
    bench_typed_access,
    bench_cold_registration
);
criterion_main!(benches);
