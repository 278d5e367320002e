//! Function-type synthesis for injected parameters.
//!
//! A kept-argument call shape maps onto the standard delegate families:
//! `Action`/`Action<T1..Tn>` for void targets and `Func<T1..Tn, TResult>`
//! for value-returning ones, with the result type in the last slot. Both
//! families stop at six parameters.

use thiserror::Error;

pub const MAX_ARITY: usize = 6;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no function type takes {arity} parameters (at most {MAX_ARITY} are supported)")]
pub struct UnsupportedArity {
    pub arity: usize,
}

/// A synthesized delegate type, kept structured so callers can render it or
/// inspect its slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateType {
    pub name: &'static str,
    pub type_args: Vec<String>,
}

impl DelegateType {
    /// Render as type text, e.g. `Action`, `Action<int>` or
    /// `Func<int, string>`.
    #[must_use]
    pub fn render(&self) -> String {
        if self.type_args.is_empty() {
            return self.name.to_string();
        }
        let mut out = String::from(self.name);
        out.push('<');
        for (i, arg) in self.type_args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(arg);
        }
        out.push('>');
        out
    }
}

/// Synthesize the delegate type for a call that keeps the given parameter
/// types and has the given return type (`None` for void).
pub fn synthesize(
    param_types: &[String],
    return_ty: Option<&str>,
) -> Result<DelegateType, UnsupportedArity> {
    if param_types.len() > MAX_ARITY {
        return Err(UnsupportedArity {
            arity: param_types.len(),
        });
    }
    let mut type_args: Vec<String> = param_types.to_vec();
    let name = match return_ty {
        None => "Action",
        Some(result) => {
            type_args.push(result.to_string());
            "Func"
        }
    };
    Ok(DelegateType { name, type_args })
}
