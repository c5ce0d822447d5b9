//! Guest contract validation.
//!
//! Two passes, both run before a `Sandbox` is handed out. Binaries have
//! already been through [`decode_module`](crate::binary::decode_module),
//! which rejects memory, table, global and tag sections.
//!
//! 1. [`validate_definition`] checks the static definition: one import of
//!    shape `() -> i32`, `() -> i32` functions whose bodies type-check,
//!    one export pointing at a defined function, unique export names.
//! 2. [`validate_module`] checks that the compiled Wasmtime module exposes
//!    exactly the import and export surface the definition declares and
//!    requires no linear memory or table.

use std::collections::BTreeSet;

use wasmtime::{ExternType, FuncType, Module, ValType};

use crate::definition::{FunctionDef, Instruction, ModuleDefinition};
use crate::error::SandboxError;

fn invalid(msg: impl Into<String>) -> SandboxError {
    SandboxError::ValidationError(msg.into())
}

/// Validate a module definition against the guest contract.
pub fn validate_definition(def: &ModuleDefinition) -> Result<(), SandboxError> {
    validate_imports(def)?;
    validate_functions(def)?;
    validate_exports(def)?;
    Ok(())
}

fn validate_imports(def: &ModuleDefinition) -> Result<(), SandboxError> {
    if def.imports.len() != 1 {
        return Err(invalid(format!(
            "module must declare exactly one import, found {}",
            def.imports.len()
        )));
    }
    let import = &def.imports[0];
    if !import.name.is_valid() {
        return Err(invalid(format!(
            "import `{}` must have a non-empty namespace and symbol",
            import.name
        )));
    }
    if !import.signature.is_nullary_i32() {
        return Err(invalid(format!(
            "import `{}` must have signature () -> (i32), found {}",
            import.name, import.signature
        )));
    }
    Ok(())
}

fn validate_functions(def: &ModuleDefinition) -> Result<(), SandboxError> {
    if def.functions.is_empty() {
        return Err(invalid("module must define at least one function"));
    }
    let first_defined = def.imports.len();
    for (i, func) in def.functions.iter().enumerate() {
        let index = first_defined + i;
        if !func.signature.is_nullary_i32() {
            return Err(invalid(format!(
                "function {} must have signature () -> (i32), found {}",
                index, func.signature
            )));
        }
        check_body(index, func, def.imports.len())?;
    }
    Ok(())
}

/// Type-check a body on an all-i32 operand stack.
///
/// Calls may only target imports, which rules out recursion and any path
/// from the import back into the module's own functions.
fn check_body(index: usize, func: &FunctionDef, import_count: usize) -> Result<(), SandboxError> {
    let mut depth: usize = 0;
    for (pc, instruction) in func.body.iter().enumerate() {
        match *instruction {
            Instruction::Call(target) => {
                if target as usize >= import_count {
                    return Err(invalid(format!(
                        "function {} instruction {}: call target {} is not an import",
                        index, pc, target
                    )));
                }
                depth += 1;
            }
            Instruction::I32Const(_) => depth += 1,
            Instruction::I32Add | Instruction::I32Sub | Instruction::I32Mul => {
                if depth < 2 {
                    return Err(invalid(format!(
                        "function {} instruction {}: `{}` needs two operands, stack has {}",
                        index, pc, instruction, depth
                    )));
                }
                depth -= 1;
            }
        }
    }
    if depth != func.signature.results.len() {
        return Err(invalid(format!(
            "function {} leaves {} values on the stack, expected {}",
            index,
            depth,
            func.signature.results.len()
        )));
    }
    Ok(())
}

fn validate_exports(def: &ModuleDefinition) -> Result<(), SandboxError> {
    if def.exports.len() != 1 {
        return Err(invalid(format!(
            "module must declare exactly one export, found {}",
            def.exports.len()
        )));
    }
    let first_defined = def.imports.len();
    let end = first_defined + def.functions.len();
    let mut seen = BTreeSet::new();
    for export in &def.exports {
        if export.name.is_empty() {
            return Err(invalid("export name must be non-empty"));
        }
        if !seen.insert(export.name.as_str()) {
            return Err(invalid(format!("duplicate export name `{}`", export.name)));
        }
        let target = export.func_index as usize;
        if target < first_defined {
            return Err(invalid(format!(
                "export `{}` refers to import {}; exports must name a defined function",
                export.name, target
            )));
        }
        if target >= end {
            return Err(invalid(format!(
                "export `{}` refers to function {}, module defines {}..{}",
                export.name, target, first_defined, end
            )));
        }
    }
    Ok(())
}

/// Check if a FuncType is exactly `() -> i32`.
fn is_nullary_i32(ft: &FuncType) -> bool {
    let params: Vec<ValType> = ft.params().collect();
    let results: Vec<ValType> = ft.results().collect();
    params.is_empty() && results.len() == 1 && matches!(results[0], ValType::I32)
}

/// Validate the compiled module's import and export surface against its
/// definition.
pub fn validate_module(module: &Module, def: &ModuleDefinition) -> Result<(), SandboxError> {
    let resources = module.resources_required();
    if resources.num_memories != 0 || resources.num_tables != 0 {
        return Err(invalid(format!(
            "compiled module requires {} memories and {} tables, expected none",
            resources.num_memories, resources.num_tables
        )));
    }

    let imports: Vec<_> = module.imports().collect();
    if imports.len() != def.imports.len() {
        return Err(invalid(format!(
            "compiled module has {} imports, definition declares {}",
            imports.len(),
            def.imports.len()
        )));
    }
    for (import, decl) in imports.iter().zip(&def.imports) {
        if import.module() != decl.name.namespace || import.name() != decl.name.symbol {
            return Err(invalid(format!(
                "compiled import {}::{} does not match declared `{}`",
                import.module(),
                import.name(),
                decl.name
            )));
        }
        match import.ty() {
            ExternType::Func(ft) if is_nullary_i32(&ft) => {}
            _ => {
                return Err(invalid(format!(
                    "compiled import `{}` is not a () -> i32 function",
                    decl.name
                )));
            }
        }
    }

    let mut export_count = 0;
    for export in module.exports() {
        export_count += 1;
        if def.export(export.name()).is_none() {
            return Err(invalid(format!(
                "compiled module exports undeclared `{}`",
                export.name()
            )));
        }
        match export.ty() {
            ExternType::Func(ft) if is_nullary_i32(&ft) => {}
            ExternType::Func(_) => {
                return Err(invalid(format!(
                    "export `{}` is not a () -> i32 function",
                    export.name()
                )));
            }
            _ => {
                return Err(invalid(format!(
                    "export `{}` must be a function",
                    export.name()
                )));
            }
        }
    }
    if export_count != def.exports.len() {
        return Err(invalid(format!(
            "compiled module has {} exports, definition declares {}",
            export_count,
            def.exports.len()
        )));
    }

    Ok(())
}
