use std::fmt;

use wasmtime::{ExternType, FuncType, Mutability, ValType};

use crate::error::{Error, Result};

/// The value kinds that can cross the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValKind {
    I32,
    I64,
    F32,
    F64,
}

impl ValKind {
    pub fn from_wasm(ty: &ValType) -> Option<Self> {
        match ty {
            ValType::I32 => Some(ValKind::I32),
            ValType::I64 => Some(ValKind::I64),
            ValType::F32 => Some(ValKind::F32),
            ValType::F64 => Some(ValKind::F64),
            ValType::V128 | ValType::Ref(_) => None,
        }
    }

    pub fn to_wasm(self) -> ValType {
        match self {
            ValKind::I32 => ValType::I32,
            ValKind::I64 => ValType::I64,
            ValKind::F32 => ValType::F32,
            ValKind::F64 => ValType::F64,
        }
    }

    pub(crate) fn to_encoder(self) -> wasm_encoder::ValType {
        match self {
            ValKind::I32 => wasm_encoder::ValType::I32,
            ValKind::I64 => wasm_encoder::ValType::I64,
            ValKind::F32 => wasm_encoder::ValType::F32,
            ValKind::F64 => wasm_encoder::ValType::F64,
        }
    }

    /// Parse command-line text as a value of this kind.
    ///
    /// Integers accept the signed and unsigned range of their width; the
    /// unsigned form is reinterpreted as two's complement.
    pub fn parse(self, text: &str) -> Option<Val> {
        match self {
            ValKind::I32 => text
                .parse::<i32>()
                .ok()
                .or_else(|| text.parse::<u32>().ok().map(|v| v as i32))
                .map(Val::I32),
            ValKind::I64 => text
                .parse::<i64>()
                .ok()
                .or_else(|| text.parse::<u64>().ok().map(|v| v as i64))
                .map(Val::I64),
            ValKind::F32 => text.parse::<f32>().ok().map(Val::F32),
            ValKind::F64 => text.parse::<f64>().ok().map(Val::F64),
        }
    }
}

impl fmt::Display for ValKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValKind::I32 => "i32",
            ValKind::I64 => "i64",
            ValKind::F32 => "f32",
            ValKind::F64 => "f64",
        })
    }
}

/// A typed call argument or result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Val {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Val {
    pub fn kind(&self) -> ValKind {
        match self {
            Val::I32(_) => ValKind::I32,
            Val::I64(_) => ValKind::I64,
            Val::F32(_) => ValKind::F32,
            Val::F64(_) => ValKind::F64,
        }
    }

    pub fn from_wasm(val: &wasmtime::Val) -> Option<Self> {
        match val {
            wasmtime::Val::I32(v) => Some(Val::I32(*v)),
            wasmtime::Val::I64(v) => Some(Val::I64(*v)),
            wasmtime::Val::F32(bits) => Some(Val::F32(f32::from_bits(*bits))),
            wasmtime::Val::F64(bits) => Some(Val::F64(f64::from_bits(*bits))),
            _ => None,
        }
    }
}

impl From<Val> for wasmtime::Val {
    fn from(val: Val) -> Self {
        match val {
            Val::I32(v) => wasmtime::Val::I32(v),
            Val::I64(v) => wasmtime::Val::I64(v),
            Val::F32(v) => wasmtime::Val::F32(v.to_bits()),
            Val::F64(v) => wasmtime::Val::F64(v.to_bits()),
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::I32(v) => write!(f, "i32({v})"),
            Val::I64(v) => write!(f, "i64({v})"),
            Val::F32(v) => write!(f, "f32({v})"),
            Val::F64(v) => write!(f, "f64({v})"),
        }
    }
}

/// Parameter kinds plus at most one result kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncSig {
    pub params: Vec<ValKind>,
    pub result: Option<ValKind>,
}

impl FuncSig {
    pub fn new(params: impl IntoIterator<Item = ValKind>, result: Option<ValKind>) -> Self {
        Self {
            params: params.into_iter().collect(),
            result,
        }
    }

    pub fn from_wasm(ty: &FuncType) -> Result<Self> {
        let unsupported = || Error::UnsupportedSignature(format_func_type(ty));
        let params = ty
            .params()
            .map(|p| ValKind::from_wasm(&p).ok_or_else(unsupported))
            .collect::<Result<Vec<_>>>()?;
        let mut results = ty.results();
        let result = match (results.next(), results.next()) {
            (None, _) => None,
            (Some(r), None) => Some(ValKind::from_wasm(&r).ok_or_else(unsupported)?),
            (Some(_), Some(_)) => return Err(unsupported()),
        };
        Ok(Self { params, result })
    }

    pub fn to_wasm(&self, engine: &wasmtime::Engine) -> FuncType {
        FuncType::new(
            engine,
            self.params.iter().map(|k| k.to_wasm()),
            self.result.map(|k| k.to_wasm()),
        )
    }
}

impl fmt::Display for FuncSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        match self.result {
            Some(r) => write!(f, ") -> {r}"),
            None => write!(f, ") -> ()"),
        }
    }
}

fn format_func_type(ty: &FuncType) -> String {
    let params: Vec<String> = ty.params().map(|p| p.to_string()).collect();
    let results: Vec<String> = ty.results().map(|r| r.to_string()).collect();
    format!("({}) -> ({})", params.join(", "), results.join(", "))
}

/// The type of an importable or exportable entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectType {
    Function(FuncSig),
    Table { minimum: u64, maximum: Option<u64> },
    Memory { minimum: u64, maximum: Option<u64> },
    /// `content` is `None` for globals of a type outside [`ValKind`].
    Global { content: Option<ValKind>, mutable: bool },
}

impl ObjectType {
    pub fn from_extern(ty: &ExternType) -> Result<Self> {
        Ok(match ty {
            ExternType::Func(func) => ObjectType::Function(FuncSig::from_wasm(func)?),
            ExternType::Table(table) => ObjectType::Table {
                minimum: u64::from(table.minimum()),
                maximum: table.maximum().map(u64::from),
            },
            ExternType::Memory(memory) => ObjectType::Memory {
                minimum: memory.minimum(),
                maximum: memory.maximum(),
            },
            ExternType::Global(global) => ObjectType::Global {
                content: ValKind::from_wasm(global.content()),
                mutable: global.mutability() == Mutability::Var,
            },
            #[allow(unreachable_patterns)]
            other => return Err(Error::UnsupportedSignature(format!("{other:?}"))),
        })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Function(sig) => write!(f, "func {sig}"),
            ObjectType::Table { minimum, maximum } => {
                write!(f, "table {minimum}")?;
                maximum.map_or(Ok(()), |m| write!(f, " {m}"))
            }
            ObjectType::Memory { minimum, maximum } => {
                write!(f, "memory {minimum}")?;
                maximum.map_or(Ok(()), |m| write!(f, " {m}"))
            }
            ObjectType::Global { content, mutable } => {
                let content = content.map_or("<ref>".to_string(), |k| k.to_string());
                if *mutable {
                    write!(f, "global mut {content}")
                } else {
                    write!(f, "global {content}")
                }
            }
        }
    }
}
