//! Decoding of compiled WebAssembly binaries into a [`ModuleDefinition`].
//!
//! A binary is accepted only if every section it carries has a place in a
//! definition: types, function imports, defined functions, function
//! exports, code, and custom sections. Memory, table, global, tag, start,
//! element and data sections are rejected outright, whether or not they
//! are exported. Bodies may only use the instructions [`Instruction`]
//! models and may not declare locals.

use wasmparser::{
    Encoding, ExternalKind, FuncType, FunctionBody, Operator, Parser, Payload, TypeRef,
};

use hostlink_hostapi::{ImportName, Signature, ValType};

use crate::definition::{ExportDecl, FunctionDef, ImportDecl, Instruction, ModuleDefinition};
use crate::error::SandboxError;

fn invalid(msg: impl Into<String>) -> SandboxError {
    SandboxError::ValidationError(msg.into())
}

fn forbidden(section: &str) -> SandboxError {
    invalid(format!("module must not contain a {} section", section))
}

/// Decode a core WebAssembly binary into its module definition.
///
/// The result is structurally decoded only; callers run
/// [`validate_definition`](crate::validation::validate_definition) on it.
pub fn decode_module(wasm: &[u8]) -> Result<ModuleDefinition, SandboxError> {
    let mut types: Vec<Signature> = Vec::new();
    let mut imports = Vec::new();
    let mut function_types: Vec<u32> = Vec::new();
    let mut bodies = Vec::new();
    let mut exports = Vec::new();

    for payload in Parser::new(0).parse_all(wasm) {
        match payload? {
            Payload::Version { encoding, .. } => {
                if encoding != Encoding::Module {
                    return Err(invalid("components are not supported, expected a core module"));
                }
            }
            Payload::TypeSection(reader) => {
                for ty in reader.into_iter_err_on_gc_types() {
                    types.push(signature(&ty?)?);
                }
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import?;
                    let name = ImportName::new(import.module, import.name);
                    match import.ty {
                        TypeRef::Func(ty) => imports.push(ImportDecl {
                            signature: lookup_type(&types, ty)?,
                            name,
                        }),
                        _ => {
                            return Err(invalid(format!(
                                "import `{}` must be a function",
                                name
                            )));
                        }
                    }
                }
            }
            Payload::FunctionSection(reader) => {
                for ty in reader {
                    function_types.push(ty?);
                }
            }
            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export?;
                    if export.kind != ExternalKind::Func {
                        return Err(invalid(format!(
                            "export `{}` must be a function",
                            export.name
                        )));
                    }
                    exports.push(ExportDecl {
                        name: export.name.to_string(),
                        func_index: export.index,
                    });
                }
            }
            Payload::CodeSectionEntry(body) => {
                let index = imports.len() + bodies.len();
                bodies.push(decode_body(&body, index)?);
            }
            Payload::MemorySection(_) => return Err(forbidden("memory")),
            Payload::TableSection(_) => return Err(forbidden("table")),
            Payload::GlobalSection(_) => return Err(forbidden("global")),
            Payload::TagSection(_) => return Err(forbidden("tag")),
            Payload::StartSection { .. } => return Err(forbidden("start")),
            Payload::ElementSection(_) => return Err(forbidden("element")),
            Payload::DataSection(_) | Payload::DataCountSection { .. } => {
                return Err(forbidden("data"))
            }
            _ => {}
        }
    }

    if function_types.len() != bodies.len() {
        return Err(invalid(format!(
            "module declares {} functions but has {} bodies",
            function_types.len(),
            bodies.len()
        )));
    }
    let functions = function_types
        .into_iter()
        .zip(bodies)
        .map(|(ty, body)| {
            Ok(FunctionDef {
                signature: lookup_type(&types, ty)?,
                body,
            })
        })
        .collect::<Result<Vec<_>, SandboxError>>()?;

    Ok(ModuleDefinition {
        imports,
        functions,
        exports,
    })
}

fn decode_body(body: &FunctionBody<'_>, index: usize) -> Result<Vec<Instruction>, SandboxError> {
    if body.get_locals_reader()?.get_count() != 0 {
        return Err(invalid(format!("function {} must not declare locals", index)));
    }
    let mut instructions = Vec::new();
    for op in body.get_operators_reader()? {
        let instruction = match op? {
            Operator::Call { function_index } => Instruction::Call(function_index),
            Operator::I32Const { value } => Instruction::I32Const(value),
            Operator::I32Add => Instruction::I32Add,
            Operator::I32Sub => Instruction::I32Sub,
            Operator::I32Mul => Instruction::I32Mul,
            // Without blocks the only `end` closes the body.
            Operator::End => continue,
            other => {
                return Err(invalid(format!(
                    "function {}: unsupported instruction {:?}",
                    index, other
                )));
            }
        };
        instructions.push(instruction);
    }
    Ok(instructions)
}

fn lookup_type(types: &[Signature], index: u32) -> Result<Signature, SandboxError> {
    types
        .get(index as usize)
        .cloned()
        .ok_or_else(|| invalid(format!("type index {} out of range", index)))
}

fn signature(ty: &FuncType) -> Result<Signature, SandboxError> {
    let params = ty.params().iter().map(val_type).collect::<Result<_, _>>()?;
    let results = ty.results().iter().map(val_type).collect::<Result<_, _>>()?;
    Ok(Signature::new(params, results))
}

fn val_type(ty: &wasmparser::ValType) -> Result<ValType, SandboxError> {
    match ty {
        wasmparser::ValType::I32 => Ok(ValType::I32),
        wasmparser::ValType::I64 => Ok(ValType::I64),
        wasmparser::ValType::F32 => Ok(ValType::F32),
        wasmparser::ValType::F64 => Ok(ValType::F64),
        other => Err(invalid(format!("unsupported value type {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADD_FIVE: &str = r#"
        (module
            (import "env" "get_number" (func (result i32)))
            (func (export "add_five_to_imported") (result i32)
                call 0
                i32.const 5
                i32.add)
        )
    "#;

    fn decode(text: &str) -> Result<ModuleDefinition, SandboxError> {
        decode_module(&wat::parse_str(text).unwrap())
    }

    fn assert_forbidden(text: &str, section: &str) {
        match decode(text) {
            Err(SandboxError::ValidationError(msg)) => {
                assert!(msg.contains(section), "error should mention {:?}: {}", section, msg);
            }
            other => panic!("expected ValidationError, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_decode_canonical_module() {
        let def = decode(ADD_FIVE).unwrap();
        assert_eq!(def, ModuleDefinition::add_five_to_imported());
    }

    #[test]
    fn test_rendered_definition_decodes_to_itself() {
        let def = ModuleDefinition::add_five_to_imported();
        assert_eq!(decode(&def.to_wat()).unwrap(), def);
    }

    #[test]
    fn test_reject_unexported_memory_table_global() {
        let text = r#"
            (module
                (import "env" "get_number" (func (result i32)))
                (memory 1)
                (global (mut i32) (i32.const 0))
                (table 1 funcref)
                (func (export "add_five_to_imported") (result i32)
                    call 0
                    i32.const 5
                    i32.add)
            )
        "#;
        assert!(matches!(decode(text), Err(SandboxError::ValidationError(_))));
    }

    #[test]
    fn test_reject_memory() {
        assert_forbidden(
            r#"(module (memory 1) (func (export "f") (result i32) i32.const 1))"#,
            "memory",
        );
    }

    #[test]
    fn test_reject_table() {
        assert_forbidden(
            r#"(module (table 1 funcref) (func (export "f") (result i32) i32.const 1))"#,
            "table",
        );
    }

    #[test]
    fn test_reject_global() {
        assert_forbidden(
            r#"(module (global i32 (i32.const 7)) (func (export "f") (result i32) i32.const 1))"#,
            "global",
        );
    }

    #[test]
    fn test_reject_start_function() {
        assert_forbidden(
            r#"(module (func $init) (start $init) (func (export "f") (result i32) i32.const 1))"#,
            "start",
        );
    }

    #[test]
    fn test_reject_locals() {
        let text = r#"
            (module
                (import "env" "get_number" (func (result i32)))
                (func (export "add_five_to_imported") (result i32) (local i32)
                    call 0)
            )
        "#;
        assert!(matches!(decode(text), Err(SandboxError::ValidationError(_))));
    }

    #[test]
    fn test_reject_unsupported_instruction() {
        let text = r#"
            (module
                (import "env" "get_number" (func (result i32)))
                (func (export "add_five_to_imported") (result i32)
                    call 0
                    i32.const 5
                    i32.div_s)
            )
        "#;
        assert_forbidden(text, "unsupported instruction");
    }

    #[test]
    fn test_reject_non_function_import() {
        let text = r#"
            (module
                (import "env" "counter" (global i32))
                (func (export "f") (result i32) i32.const 1)
            )
        "#;
        assert_forbidden(text, "must be a function");
    }

    #[test]
    fn test_reject_garbage() {
        let result = decode_module(b"\0asm\x01\0\0\0\xff");
        assert!(matches!(result, Err(SandboxError::Malformed(_))));
    }
}
