//! Benchmarks for signature resolution.
//!
//! Measures the cost of the operations a catalog performs over large obfuscated modules:
//! - Single-match method search across every method of a module
//! - Type search by member shape
//! - A full catalog run including the string-literal scanner

extern crate dotrename;

use criterion::{criterion_group, criterion_main, Criterion};
use dotrename::{
    assembly::OpCode,
    deobfuscation::{
        find, CatalogRegistry, MatchContext, MethodMatcher, RenameConfig, RenameEngine, Rule,
        Scope, Step, TypeMatcher,
    },
    metadata::{
        builder::{IlOperand, MethodBuilder, ModuleBuilder, TypeBuilder},
        method::MethodDef,
        module::Module,
        typesystem::TypeDef,
    },
};
use std::hint::black_box;

/// Builds `count` obfuscated types with a handful of members each and one needle type.
fn wide_module(count: usize) -> Module {
    let mut builder = ModuleBuilder::new("Assembly-CSharp");
    for index in 0..count {
        builder = builder.add_type(
            TypeBuilder::new("", &format!("t{index}"))
                .public()
                .method(MethodBuilder::new("a").public().returns("int"))
                .method(MethodBuilder::new("b").param("x", "int").returns("bool"))
                .method(
                    MethodBuilder::new("c")
                        .public()
                        .returns("string")
                        .instr(OpCode::Ldstr, IlOperand::String(format!("value{index}")))
                        .instr(OpCode::Ret, IlOperand::None),
                ),
        );
    }
    builder
        .add_type(
            TypeBuilder::new("", "needle")
                .public()
                .method(MethodBuilder::new("n").public().static_().returns("bool")),
        )
        .build()
        .unwrap()
}

/// Benchmark a single-match method search over every method of the module.
fn bench_find_method(c: &mut Criterion) {
    let module = wide_module(2000);
    let scope = Scope::new();
    let matcher = MethodMatcher::new().public().static_().returns("System.Boolean");

    c.bench_function("find_method_2000_types", |b| {
        b.iter(|| {
            let ctx = MatchContext::new(&module, &scope);
            let candidates = module.methods().iter().map(|m| m.token);
            black_box(find::<MethodDef, _>(&ctx, candidates, &matcher))
        });
    });
}

/// Benchmark a type search by member shape.
fn bench_find_type(c: &mut Criterion) {
    let module = wide_module(2000);
    let scope = Scope::new();
    let matcher = TypeMatcher::new().with_methods(MethodMatcher::new().static_(), 1);

    c.bench_function("find_type_2000_types", |b| {
        b.iter(|| {
            let ctx = MatchContext::new(&module, &scope);
            let candidates = module.types().iter().map(|t| t.token);
            black_box(find::<TypeDef, _>(&ctx, candidates, &matcher))
        });
    });
}

/// Benchmark an ad-hoc rule list that renames and scans.
fn bench_run_steps(c: &mut Criterion) {
    let template = wide_module(500);
    let steps: Vec<Box<dyn Step>> = vec![Box::new(
        Rule::types("Needle")
            .matching(TypeMatcher::new().with_methods(MethodMatcher::new().static_(), 1))
            .rename("Needle"),
    )];
    let engine = RenameEngine::new(RenameConfig::lenient());

    c.bench_function("run_steps_500_types", |b| {
        b.iter_batched(
            || template.clone(),
            |mut module| black_box(engine.run_steps(&mut module, "bench", &steps)),
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark the built-in catalog over a module it cannot resolve.
fn bench_catalog_unresolved(c: &mut Criterion) {
    let template = wide_module(500);
    let registry = CatalogRegistry::new();
    let catalog = registry.get("sdtd").unwrap();
    let engine = RenameEngine::default();

    c.bench_function("sdtd_catalog_unresolved", |b| {
        b.iter_batched(
            || template.clone(),
            |mut module| black_box(engine.run(&mut module, &**catalog)),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_find_method,
    bench_find_type,
    bench_run_steps,
    bench_catalog_unresolved
);
criterion_main!(benches);
