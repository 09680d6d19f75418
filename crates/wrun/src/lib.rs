mod emulation;
mod engine;
mod entry;
mod error;
mod intrinsics;
mod invoke;
mod linker;
mod logging;
mod marshal;
mod module;
mod runner;
mod store;
mod stub;
mod value;

pub use emulation::prepare_argv;
pub use engine::Engine;
pub use entry::{DEFAULT_ENTRY_NAMES, EntryPoint, select_entry};
pub use error::{Error, Result, UnresolvedImport};
pub use intrinsics::{Intrinsic, IntrinsicRegistry, IntrinsicRegistryBuilder};
pub use invoke::{ExitOutcome, TRAP_EXIT_CODE, TrapReport, invoke};
pub use linker::{
    InstanceResolver, LinkedInstance, ResolutionRequest, Resolver, RootResolver, StubRecord,
    link_and_instantiate,
};
pub use logging::init_logging;
pub use marshal::{CallingConvention, DefaultEntryShape, Invocation, marshal, parse_explicit_args};
pub use module::Module;
pub use runner::{FAILURE_EXIT_CODE, FUZZ_ITERATIONS, Harness, Preload, RunOptions, Runner};
pub use store::{HostState, Runtime, Store};
pub use stub::{STUB_EXPORT, StubModule, make_stub};
pub use value::{FuncSig, ObjectType, Val, ValKind};
