//! Import resolution and module instantiation.
//!
//! The [`RootResolver`] answers each import of a module by trying, in
//! order:
//! 1. the [`IntrinsicRegistry`],
//! 2. a named sub-resolver registered for the import's module name,
//! 3. a synthesized stub that traps when called (function imports only).
//!
//! The first tier that answers wins. When a sub-resolver claims a module
//! name its answer is final, even when it has nothing to offer: stubs only
//! stand in for modules nobody registered.

use std::collections::HashMap;

use wasmtime::{Extern, Func, Instance, Memory};

use crate::Engine;
use crate::error::{Error, Result, UnresolvedImport};
use crate::intrinsics::IntrinsicRegistry;
use crate::module::Module;
use crate::store::Store;
use crate::stub::{STUB_EXPORT, make_stub};
use crate::value::{FuncSig, ObjectType};

/// A single import lookup.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionRequest<'a> {
    pub module: &'a str,
    pub name: &'a str,
    pub ty: &'a ObjectType,
}

/// Anything that can satisfy imports.
pub trait Resolver {
    fn resolve(&mut self, store: &mut Store, request: &ResolutionRequest<'_>) -> Option<Extern>;
}

/// Resolves imports against the exports of an instantiated module.
pub struct InstanceResolver {
    instance: Instance,
}

impl InstanceResolver {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }
}

impl Resolver for InstanceResolver {
    fn resolve(&mut self, store: &mut Store, request: &ResolutionRequest<'_>) -> Option<Extern> {
        let export = self.instance.get_export(&mut *store, request.name)?;
        extern_matches(store, &export, request.ty).then_some(export)
    }
}

/// Check that an export can stand in for an import of type `ty`.
///
/// Functions must match signatures exactly. Other kinds only need to agree
/// on the kind; limits are checked again by the runtime at instantiation.
fn extern_matches(store: &Store, export: &Extern, ty: &ObjectType) -> bool {
    match (export, ty) {
        (Extern::Func(func), ObjectType::Function(sig)) => {
            FuncSig::from_wasm(&func.ty(store)).is_ok_and(|actual| actual == *sig)
        }
        (Extern::Memory(_), ObjectType::Memory { .. }) => true,
        (Extern::Table(_), ObjectType::Table { .. }) => true,
        (Extern::Global(_), ObjectType::Global { .. }) => true,
        _ => false,
    }
}

/// A function import replaced by a trapping stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubRecord {
    pub module: String,
    pub name: String,
    pub signature: FuncSig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Intrinsic,
    NamedModule,
    Stub,
}

const TIERS: [Tier; 3] = [Tier::Intrinsic, Tier::NamedModule, Tier::Stub];

enum Step {
    Resolved(Extern),
    Failed,
    Continue,
}

/// The resolver chain used to link a module.
pub struct RootResolver<'a> {
    engine: &'a Engine,
    intrinsics: &'a IntrinsicRegistry,
    named: HashMap<String, Box<dyn Resolver + 'a>>,
    stubs: Vec<StubRecord>,
}

impl<'a> RootResolver<'a> {
    pub fn new(engine: &'a Engine, intrinsics: &'a IntrinsicRegistry) -> Self {
        Self {
            engine,
            intrinsics,
            named: HashMap::new(),
            stubs: Vec::new(),
        }
    }

    /// Register a sub-resolver for every import from `module`.
    pub fn register(&mut self, module: &str, resolver: impl Resolver + 'a) {
        self.named.insert(module.to_string(), Box::new(resolver));
    }

    /// Check whether a module name is already claimed by a sub-resolver.
    pub fn has(&self, module: &str) -> bool {
        self.named.contains_key(module)
    }

    /// Function imports that were stubbed so far.
    pub fn stubs(&self) -> &[StubRecord] {
        &self.stubs
    }

    fn try_tier(&mut self, tier: Tier, store: &mut Store, request: &ResolutionRequest<'_>) -> Step {
        match tier {
            Tier::Intrinsic => match self.intrinsics.lookup(request.module, request.name, request.ty) {
                Some(intrinsic) => Step::Resolved(Extern::Func(intrinsic.instantiate(store))),
                None => Step::Continue,
            },
            Tier::NamedModule => match self.named.get_mut(request.module) {
                Some(resolver) => match resolver.resolve(store, request) {
                    Some(export) => Step::Resolved(export),
                    None => Step::Failed,
                },
                None => Step::Continue,
            },
            Tier::Stub => match request.ty {
                ObjectType::Function(sig) => {
                    let func = instantiate_stub(self.engine, store, request.module, request.name, sig);
                    self.stubs.push(StubRecord {
                        module: request.module.to_string(),
                        name: request.name.to_string(),
                        signature: sig.clone(),
                    });
                    Step::Resolved(Extern::Func(func))
                }
                _ => Step::Failed,
            },
        }
    }
}

impl Resolver for RootResolver<'_> {
    fn resolve(&mut self, store: &mut Store, request: &ResolutionRequest<'_>) -> Option<Extern> {
        for tier in TIERS {
            match self.try_tier(tier, store, request) {
                Step::Resolved(export) => {
                    tracing::trace!(
                        module = request.module,
                        name = request.name,
                        ?tier,
                        "resolved import"
                    );
                    return Some(export);
                }
                Step::Failed => return None,
                Step::Continue => {}
            }
        }
        None
    }
}

/// Synthesize, validate and instantiate a stub for a missing function
/// import, returning its only export.
///
/// # Panics
///
/// Panics if the stub fails validation or instantiation. Stubs are valid by
/// construction, so either is a bug in [`make_stub`].
fn instantiate_stub(
    engine: &Engine,
    store: &mut Store,
    module: &str,
    name: &str,
    sig: &FuncSig,
) -> Func {
    let stub = make_stub(module, name, sig);
    if let Err(e) = engine.validate(&stub.bytes) {
        panic!("generated stub for {} is invalid: {e}", stub.description);
    }
    let compiled = wasmtime::Module::new(engine.runtime(), &stub.bytes)
        .unwrap_or_else(|e| panic!("failed to compile stub for {}: {e:#}", stub.description));
    let instance = Instance::new(&mut *store, &compiled, &[])
        .unwrap_or_else(|e| panic!("failed to instantiate stub for {}: {e:#}", stub.description));
    store.data_mut().track_object();
    let func = instance
        .get_func(&mut *store, STUB_EXPORT)
        .unwrap_or_else(|| panic!("stub for {} has no '{STUB_EXPORT}' export", stub.description));

    tracing::warn!("Generated stub for missing function import {}", stub.description);
    func
}

/// An instantiated module together with its default memory.
pub struct LinkedInstance {
    pub instance: Instance,
    imported_memory: Option<Memory>,
}

impl LinkedInstance {
    /// The memory that argument strings are written into: the first
    /// imported memory, else the export named `memory`, else the first
    /// exported memory.
    pub fn default_memory(&self, store: &mut Store) -> Option<Memory> {
        if let Some(memory) = self.imported_memory {
            return Some(memory);
        }
        if let Some(memory) = self.instance.get_memory(&mut *store, "memory") {
            return Some(memory);
        }
        self.instance
            .exports(&mut *store)
            .find_map(|export| export.into_memory())
    }
}

/// Resolve every import of `module` through `resolver` and instantiate it.
///
/// All unresolved imports are reported together; instantiation is not
/// attempted when any are missing.
pub fn link_and_instantiate(
    store: &mut Store,
    module: &Module,
    resolver: &mut dyn Resolver,
) -> Result<LinkedInstance> {
    let mut externs = Vec::new();
    let mut missing = Vec::new();
    let mut imported_memory = None;

    for (import_module, import_name, extern_type) in module.imports() {
        let ty = match ObjectType::from_extern(&extern_type) {
            Ok(ty) => ty,
            Err(e) => {
                tracing::debug!(module = import_module, name = import_name, "{e}");
                missing.push(UnresolvedImport {
                    module: import_module.to_string(),
                    name: import_name.to_string(),
                    ty: None,
                });
                continue;
            }
        };
        let request = ResolutionRequest {
            module: import_module,
            name: import_name,
            ty: &ty,
        };
        match resolver.resolve(store, &request) {
            Some(export) => {
                if let (Extern::Memory(memory), None) = (&export, imported_memory) {
                    imported_memory = Some(*memory);
                }
                externs.push(export);
            }
            None => missing.push(UnresolvedImport {
                module: import_module.to_string(),
                name: import_name.to_string(),
                ty: Some(ty),
            }),
        }
    }

    if !missing.is_empty() {
        return Err(Error::Link(missing));
    }

    let instance = Instance::new(&mut *store, &module.compiled, &externs)
        .map_err(|e| Error::Instantiate(format!("{e:#}")))?;
    store.data_mut().track_object();
    tracing::debug!(module = module.name(), imports = externs.len(), "instantiated module");
    Ok(LinkedInstance {
        instance,
        imported_memory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Runtime;
    use crate::value::ValKind;

    fn print_i32() -> ObjectType {
        ObjectType::Function(FuncSig::new([ValKind::I32], None))
    }

    #[test]
    fn intrinsic_wins_over_stub() {
        let engine = Engine::default();
        let mut runtime = Runtime::new(&engine);
        let intrinsics = IntrinsicRegistry::standard();
        let mut resolver = RootResolver::new(&engine, &intrinsics);
        let ty = print_i32();
        let request = ResolutionRequest {
            module: "spectest",
            name: "print_i32",
            ty: &ty,
        };
        assert!(resolver.resolve(runtime.store_mut(), &request).is_some());
        assert!(resolver.stubs().is_empty());
    }

    #[test]
    fn unknown_function_import_is_stubbed() {
        let engine = Engine::default();
        let mut runtime = Runtime::new(&engine);
        let intrinsics = IntrinsicRegistry::empty();
        let mut resolver = RootResolver::new(&engine, &intrinsics);
        let ty = print_i32();
        let request = ResolutionRequest {
            module: "env",
            name: "missing",
            ty: &ty,
        };
        assert!(matches!(
            resolver.resolve(runtime.store_mut(), &request),
            Some(Extern::Func(_))
        ));
        assert_eq!(
            resolver.stubs(),
            &[StubRecord {
                module: "env".into(),
                name: "missing".into(),
                signature: FuncSig::new([ValKind::I32], None),
            }]
        );
    }

    #[test]
    fn unknown_memory_import_is_not_found() {
        let engine = Engine::default();
        let mut runtime = Runtime::new(&engine);
        let intrinsics = IntrinsicRegistry::empty();
        let mut resolver = RootResolver::new(&engine, &intrinsics);
        let ty = ObjectType::Memory {
            minimum: 1,
            maximum: None,
        };
        let request = ResolutionRequest {
            module: "env",
            name: "memory",
            ty: &ty,
        };
        assert!(resolver.resolve(runtime.store_mut(), &request).is_none());
        assert!(resolver.stubs().is_empty());
    }

    struct Refuses;

    impl Resolver for Refuses {
        fn resolve(&mut self, _: &mut Store, _: &ResolutionRequest<'_>) -> Option<Extern> {
            None
        }
    }

    #[test]
    fn claimed_module_does_not_fall_back_to_stub() {
        let engine = Engine::default();
        let mut runtime = Runtime::new(&engine);
        let intrinsics = IntrinsicRegistry::empty();
        let mut resolver = RootResolver::new(&engine, &intrinsics);
        resolver.register("dep", Refuses);
        assert!(resolver.has("dep"));
        let ty = print_i32();
        let request = ResolutionRequest {
            module: "dep",
            name: "f",
            ty: &ty,
        };
        assert!(resolver.resolve(runtime.store_mut(), &request).is_none());
        assert!(resolver.stubs().is_empty());
    }

    #[test]
    fn intrinsic_wins_over_named_module() {
        let engine = Engine::default();
        let mut runtime = Runtime::new(&engine);
        let intrinsics = IntrinsicRegistry::standard();
        let mut resolver = RootResolver::new(&engine, &intrinsics);
        resolver.register("spectest", Refuses);
        let ty = print_i32();
        let request = ResolutionRequest {
            module: "spectest",
            name: "print_i32",
            ty: &ty,
        };
        assert!(matches!(
            resolver.resolve(runtime.store_mut(), &request),
            Some(Extern::Func(_))
        ));
        assert!(resolver.stubs().is_empty());
    }

    #[test]
    fn link_reports_every_missing_import() -> Result<(), anyhow::Error> {
        let engine = Engine::default();
        let mut runtime = Runtime::new(&engine);
        let module = Module::new(
            &engine,
            r#"
            (module
                (import "env" "memory" (memory 1))
                (import "env" "table" (table 1 funcref))
                (import "env" "f" (func (param i32)))
            )
        "#,
        )?;
        let intrinsics = IntrinsicRegistry::empty();
        let mut resolver = RootResolver::new(&engine, &intrinsics);
        let err = link_and_instantiate(runtime.store_mut(), &module, &mut resolver)
            .err()
            .ok_or_else(|| anyhow::anyhow!("link should fail"))?;
        let Error::Link(missing) = &err else {
            anyhow::bail!("expected a link error, got {err}");
        };
        let names: Vec<&str> = missing.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["memory", "table"]);
        Ok(())
    }
}
