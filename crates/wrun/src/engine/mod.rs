use wasmparser::{Validator, WasmFeatures};

/// Shared compilation configuration.
///
/// Modules are validated with wasmparser before wasmtime compiles them, so
/// validation failures are reported the same way for user modules and for
/// synthesized stubs.
#[derive(Clone)]
pub struct Engine {
    features: WasmFeatures,
    runtime: wasmtime::Engine,
}

impl Engine {
    /// Create a new validator with the engine's features.
    pub fn new_validator(&self) -> Validator {
        Validator::new_with_features(self.features)
    }

    /// Validate a binary module.
    pub fn validate(&self, bytes: &[u8]) -> Result<(), wasmparser::BinaryReaderError> {
        self.new_validator().validate_all(bytes).map(|_| ())
    }

    /// The wasmtime engine that compiles and runs modules.
    pub fn runtime(&self) -> &wasmtime::Engine {
        &self.runtime
    }
}

impl Default for Engine {
    fn default() -> Self {
        let mut features = WasmFeatures::default();
        // wasmtime does not run these proposals; reject them at validation.
        features.set(WasmFeatures::COMPONENT_MODEL, false);
        features.set(WasmFeatures::EXCEPTIONS, false);
        Self {
            features,
            runtime: wasmtime::Engine::default(),
        }
    }
}
