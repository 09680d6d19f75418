//! Trapping stand-ins for function imports nothing else provides.
//!
//! A stub is an ordinary module: one type, one function whose body is
//! `unreachable`, one export. It goes through the same validator as any user
//! module.

use wasm_encoder::{
    CodeSection, ExportKind, ExportSection, Function, FunctionSection, Instruction, NameMap,
    NameSection, TypeSection,
};

use crate::value::FuncSig;

/// Export name of the stub function inside a stub module.
pub const STUB_EXPORT: &str = "importStub";

/// An encoded stub module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubModule {
    pub bytes: Vec<u8>,
    /// `module.export : signature`, for diagnostics.
    pub description: String,
}

/// Build a module exporting one function of `signature` that traps when
/// called.
///
/// The output depends only on the arguments.
pub fn make_stub(module: &str, export: &str, signature: &FuncSig) -> StubModule {
    let mut types = TypeSection::new();
    types.function(
        signature.params.iter().map(|k| k.to_encoder()),
        signature.result.map(|k| k.to_encoder()),
    );

    let mut functions = FunctionSection::new();
    functions.function(0);

    let mut exports = ExportSection::new();
    exports.export(STUB_EXPORT, ExportKind::Func, 0);

    let mut body = Function::new([]);
    body.instruction(&Instruction::Unreachable);
    body.instruction(&Instruction::End);
    let mut code = CodeSection::new();
    code.function(&body);

    let mut function_names = NameMap::new();
    function_names.append(0, &format!("{module}.{export}"));
    let mut names = NameSection::new();
    names.functions(&function_names);

    let mut encoded = wasm_encoder::Module::new();
    encoded
        .section(&types)
        .section(&functions)
        .section(&exports)
        .section(&code)
        .section(&names);

    StubModule {
        bytes: encoded.finish(),
        description: format!("{module}.{export} : {signature}"),
    }
}
