//! Guest module definitions.
//!
//! A `ModuleDefinition` is the static description of a guest: its import
//! list, its function bodies and its export list. It has no runtime-mutable
//! fields. It serializes to JSON for storage and renders to WebAssembly text
//! for compilation; the BLAKE3 digest of that text is the module's content
//! address.
//!
//! Function indices follow the WebAssembly index space: imported functions
//! first, then defined functions in declaration order.

use std::fmt;

use serde::{Deserialize, Serialize};

use hostlink_hostapi::{ImportName, Signature, ValType};

use crate::error::SandboxError;

/// Namespace of the canonical guest's import.
pub const IMPORT_NAMESPACE: &str = "env";
/// Symbol of the canonical guest's import.
pub const IMPORT_SYMBOL: &str = "get_number";
/// Public name of the canonical guest's export.
pub const EXPORT_NAME: &str = "add_five_to_imported";
/// Constant the canonical guest adds to the host's value.
pub const ADDEND: i32 = 5;

/// A stack instruction in a function body. All arithmetic is 32-bit
/// two's-complement with wraparound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg", rename_all = "snake_case")]
pub enum Instruction {
    /// Call the function at this index.
    Call(u32),
    I32Const(i32),
    I32Add,
    I32Sub,
    I32Mul,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call(index) => write!(f, "call {}", index),
            Self::I32Const(value) => write!(f, "i32.const {}", value),
            Self::I32Add => f.write_str("i32.add"),
            Self::I32Sub => f.write_str("i32.sub"),
            Self::I32Mul => f.write_str("i32.mul"),
        }
    }
}

/// A function the module requires from its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub name: ImportName,
    pub signature: Signature,
}

/// A function defined inside the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub signature: Signature,
    pub body: Vec<Instruction>,
}

/// A public name bound to a function index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDecl {
    pub name: String,
    pub func_index: u32,
}

/// Static description of a guest module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub imports: Vec<ImportDecl>,
    pub functions: Vec<FunctionDef>,
    pub exports: Vec<ExportDecl>,
}

impl ModuleDefinition {
    /// The canonical guest: imports `env::get_number: () -> i32`, defines
    /// `call 0; i32.const 5; i32.add`, and exports it as
    /// `add_five_to_imported`.
    pub fn add_five_to_imported() -> Self {
        Self {
            imports: vec![ImportDecl {
                name: ImportName::new(IMPORT_NAMESPACE, IMPORT_SYMBOL),
                signature: Signature::nullary_i32(),
            }],
            functions: vec![FunctionDef {
                signature: Signature::nullary_i32(),
                body: vec![
                    Instruction::Call(0),
                    Instruction::I32Const(ADDEND),
                    Instruction::I32Add,
                ],
            }],
            exports: vec![ExportDecl {
                name: EXPORT_NAME.to_string(),
                func_index: 1,
            }],
        }
    }

    /// Parse a definition from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, SandboxError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SandboxError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find an export by public name.
    pub fn export(&self, name: &str) -> Option<&ExportDecl> {
        self.exports.iter().find(|e| e.name == name)
    }

    /// Render as WebAssembly text.
    pub fn to_wat(&self) -> String {
        let mut out = String::from("(module\n");
        for (i, import) in self.imports.iter().enumerate() {
            out.push_str(&format!(
                "  (import {} {} (func $import{}{}))\n",
                wat_string(&import.name.namespace),
                wat_string(&import.name.symbol),
                i,
                wat_signature(&import.signature),
            ));
        }
        let first_defined = self.imports.len();
        for (i, func) in self.functions.iter().enumerate() {
            out.push_str(&format!(
                "  (func $func{}{}\n",
                first_defined + i,
                wat_signature(&func.signature)
            ));
            for instruction in &func.body {
                out.push_str(&format!("    {}\n", instruction));
            }
            out.push_str("  )\n");
        }
        for export in &self.exports {
            out.push_str(&format!(
                "  (export {} (func {}))\n",
                wat_string(&export.name),
                export.func_index
            ));
        }
        out.push(')');
        out
    }

    /// Content address of this definition: BLAKE3 over the rendered text.
    pub fn id(&self) -> ModuleId {
        ModuleId(*blake3::hash(self.to_wat().as_bytes()).as_bytes())
    }
}

/// BLAKE3 content address of a module definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub [u8; 32]);

impl ModuleId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

fn wat_type(ty: ValType) -> &'static str {
    match ty {
        ValType::I32 => "i32",
        ValType::I64 => "i64",
        ValType::F32 => "f32",
        ValType::F64 => "f64",
    }
}

/// ` (param ..) (result ..)` clauses, empty ones omitted.
fn wat_signature(sig: &Signature) -> String {
    let mut out = String::new();
    if !sig.params.is_empty() {
        out.push_str(" (param");
        for ty in &sig.params {
            out.push(' ');
            out.push_str(wat_type(*ty));
        }
        out.push(')');
    }
    if !sig.results.is_empty() {
        out.push_str(" (result");
        for ty in &sig.results {
            out.push(' ');
            out.push_str(wat_type(*ty));
        }
        out.push(')');
    }
    out
}

/// Quote a name as a WAT string literal. Bytes outside printable ASCII,
/// quotes and backslashes are hex-escaped.
fn wat_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for &b in s.as_bytes() {
        match b {
            b'"' | b'\\' => out.push_str(&format!("\\{:02x}", b)),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{:02x}", b)),
        }
    }
    out.push('"');
    out
}
