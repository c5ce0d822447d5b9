//! Sandbox runtime — Wasmtime engine, module compilation, instantiation and
//! export invocation.
//!
//! A `Sandbox` holds one validated, compiled guest module. Each call to
//! [`Sandbox::instance`] produces an independent [`Instance`] that moves
//! through `Unresolved → Instantiated` or `Unresolved → Failed`. The
//! instance is an owned value; every invocation goes through `&mut` access
//! to it, so one call is in flight at a time.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};
use wasmtime::{Config, Engine, Linker, Module, Store, TypedFunc};

use hostlink_hostapi::{HostBinding, HostCallFailure};

use crate::binary::decode_module;
use crate::config::SandboxConfig;
use crate::definition::{ModuleDefinition, ModuleId};
use crate::error::{InvocationError, SandboxError};
use crate::host_impl::{HostState, ResolvedImport};
use crate::linker::register_host_functions;
use crate::validation::{validate_definition, validate_module};

/// A validated, compiled guest module.
pub struct Sandbox {
    engine: Engine,
    module: Module,
    definition: ModuleDefinition,
    id: ModuleId,
}

impl Sandbox {
    /// Validate and compile a module definition.
    pub fn new(definition: ModuleDefinition, config: SandboxConfig) -> Result<Self, SandboxError> {
        validate_definition(&definition)?;
        let wasm = wat::parse_str(definition.to_wat()).map_err(anyhow::Error::from)?;
        if decode_module(&wasm)? != definition {
            return Err(SandboxError::ValidationError(
                "rendered module does not decode to its definition".into(),
            ));
        }
        Self::compile(definition, &wasm, &config)
    }

    /// Load a definition from its JSON form.
    pub fn from_json(json: &str, config: SandboxConfig) -> Result<Self, SandboxError> {
        Self::new(ModuleDefinition::from_json(json)?, config)
    }

    /// Load a definition from a JSON file.
    pub fn from_file(path: &Path, config: SandboxConfig) -> Result<Self, SandboxError> {
        let json = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading guest definition");
        Self::from_json(&json, config)
    }

    /// Load a compiled WebAssembly binary.
    ///
    /// The binary is decoded into a [`ModuleDefinition`] and held to the
    /// same contract as a definition passed to [`Sandbox::new`]. Sections
    /// with no counterpart in a definition (memory, table, global, tag,
    /// start, element, data) are rejected.
    pub fn from_wasm(wasm: &[u8], config: SandboxConfig) -> Result<Self, SandboxError> {
        let definition = decode_module(wasm)?;
        validate_definition(&definition)?;
        Self::compile(definition, wasm, &config)
    }

    /// Load a compiled WebAssembly binary from a file.
    pub fn from_wasm_file(path: &Path, config: SandboxConfig) -> Result<Self, SandboxError> {
        let wasm = std::fs::read(path)?;
        debug!(path = %path.display(), bytes = wasm.len(), "loading guest binary");
        Self::from_wasm(&wasm, config)
    }

    fn compile(
        definition: ModuleDefinition,
        wasm: &[u8],
        config: &SandboxConfig,
    ) -> Result<Self, SandboxError> {
        let engine = create_engine(config)?;
        let module = Module::new(&engine, wasm)?;
        validate_module(&module, &definition)?;
        let id = definition.id();
        info!(module_id = %id, "compiled guest module");
        Ok(Self {
            engine,
            module,
            definition,
            id,
        })
    }

    pub fn definition(&self) -> &ModuleDefinition {
        &self.definition
    }

    /// Content address of the loaded definition. A binary shares its id
    /// with the definition it decodes to.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Create a fresh, unresolved instance of this module.
    pub fn instance(&self) -> Instance<'_> {
        Instance {
            sandbox: self,
            state: State::Unresolved,
        }
    }

    /// Create an instance and instantiate it against `host`.
    pub fn instantiate(&self, host: &dyn HostBinding) -> Result<Instance<'_>, SandboxError> {
        let mut instance = self.instance();
        instance.instantiate(host)?;
        Ok(instance)
    }
}

/// Observable lifecycle state of an [`Instance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Defined, import not yet bound.
    Unresolved,
    /// Import bound; exports callable.
    Instantiated,
    /// Import resolution (or linking) failed. Terminal.
    Failed,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unresolved => "unresolved",
            Self::Instantiated => "instantiated",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Live engine state of an instantiated module.
struct Live {
    store: Store<HostState>,
    /// Export name → typed entry point, resolved once at instantiation.
    exports: BTreeMap<String, TypedFunc<(), i32>>,
}

enum State {
    Unresolved,
    Instantiated(Live),
    Failed,
}

/// One instance of a guest module, exclusively owned by its creator.
pub struct Instance<'s> {
    sandbox: &'s Sandbox,
    state: State,
}

impl<'s> Instance<'s> {
    pub fn state(&self) -> InstanceState {
        match self.state {
            State::Unresolved => InstanceState::Unresolved,
            State::Instantiated(_) => InstanceState::Instantiated,
            State::Failed => InstanceState::Failed,
        }
    }

    /// Bind every declared import through `host` and instantiate.
    ///
    /// Valid only on an `Unresolved` instance. On failure the instance moves
    /// to `Failed` and never becomes callable.
    pub fn instantiate(&mut self, host: &dyn HostBinding) -> Result<(), SandboxError> {
        if !matches!(self.state, State::Unresolved) {
            return Err(SandboxError::AlreadyInstantiated(self.state()));
        }
        match self.link(host) {
            Ok(live) => {
                info!(module_id = %self.sandbox.id, "instance ready");
                self.state = State::Instantiated(live);
                Ok(())
            }
            Err(e) => {
                debug!(module_id = %self.sandbox.id, error = %e, "instance failed");
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn link(&self, host: &dyn HostBinding) -> Result<Live, SandboxError> {
        let sandbox = self.sandbox;

        let mut imports = Vec::with_capacity(sandbox.definition.imports.len());
        for decl in &sandbox.definition.imports {
            let func = host.resolve(&decl.name, &decl.signature).map_err(|e| {
                warn!(import = %e.name(), error = %e, "import resolution failed");
                e
            })?;
            debug!(import = %decl.name, "resolved import");
            imports.push(ResolvedImport {
                name: decl.name.clone(),
                func,
            });
        }

        let mut linker = Linker::new(&sandbox.engine);
        register_host_functions(&mut linker, &imports)?;

        let mut store = Store::new(&sandbox.engine, HostState::new(imports));
        let instance = linker.instantiate(&mut store, &sandbox.module)?;

        let mut exports = BTreeMap::new();
        for decl in &sandbox.definition.exports {
            let func = instance.get_typed_func::<(), i32>(&mut store, &decl.name)?;
            exports.insert(decl.name.clone(), func);
        }

        Ok(Live { store, exports })
    }

    /// Invoke an export by name.
    ///
    /// The name is checked before any guest code runs, so an unknown name
    /// never reaches the host binding. Host failures come back as
    /// [`InvocationError::HostCall`] with the host's error intact.
    pub fn invoke_export(&mut self, name: &str, args: &[i32]) -> Result<i32, InvocationError> {
        let state = self.state();
        let live = match &mut self.state {
            State::Instantiated(live) => live,
            _ => return Err(InvocationError::NotInstantiated { state }),
        };

        let func = match live.exports.get(name) {
            Some(f) => f.clone(),
            None => {
                return Err(InvocationError::UnknownExport {
                    name: name.to_string(),
                })
            }
        };
        if !args.is_empty() {
            return Err(InvocationError::ArityMismatch {
                name: name.to_string(),
                expected: 0,
                got: args.len(),
            });
        }

        let result = func.call(&mut live.store, ()).map_err(classify_failure)?;
        debug!(export = name, result, "export returned");
        Ok(result)
    }

    /// Host calls made through this instance so far. Zero unless
    /// instantiated.
    pub fn host_calls(&self) -> u64 {
        match &self.state {
            State::Instantiated(live) => live.store.data().host_calls,
            _ => 0,
        }
    }
}

impl fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("module_id", &self.sandbox.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Create a Wasmtime engine with deterministic configuration.
fn create_engine(config: &SandboxConfig) -> Result<Engine, SandboxError> {
    let mut wasm_config = Config::new();

    // Determinism enforcement
    wasm_config.wasm_threads(false);
    wasm_config.wasm_simd(false);
    wasm_config.wasm_relaxed_simd(false);
    wasm_config.wasm_multi_memory(false);
    wasm_config.cranelift_nan_canonicalization(true);

    wasm_config.max_wasm_stack(config.max_wasm_stack);

    Ok(Engine::new(&wasm_config)?)
}

/// Separate host callable failures from other engine errors.
fn classify_failure(err: anyhow::Error) -> InvocationError {
    match err.downcast::<HostCallFailure>() {
        Ok(failure) => InvocationError::HostCall(failure),
        Err(other) => InvocationError::Trapped(other),
    }
}
