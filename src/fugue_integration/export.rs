//! Conversion between fugue-gen traces and fugue traces
//!
//! A fugue trace is a flat map from string addresses to choices. Hierarchical
//! addresses flatten to their `/`-joined form (`m3/p`, `xs/0`), and each
//! choice carries the log density of its primitive sub-trace.

use fugue::{addr, ChoiceValue};

use crate::datatypes::address::Address;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::{GenError, GenResult};
use crate::generative::trace::Trace;
use crate::generative::traits::GenerativeFunction;

/// Convert a scalar value into a fugue choice value
pub fn to_choice_value(value: &Value) -> GenResult<ChoiceValue> {
    match value {
        Value::Bool(b) => Ok(ChoiceValue::Bool(*b)),
        Value::Int(i) => Ok(ChoiceValue::I64(*i)),
        Value::Real(r) => Ok(ChoiceValue::F64(r.value())),
        other => Err(GenError::TypeMismatch {
            expected: "bool, int or real",
            actual: other.kind().to_string(),
        }),
    }
}

/// Convert a fugue choice value back into a value
pub fn from_choice_value(value: &ChoiceValue) -> GenResult<Value> {
    match value {
        ChoiceValue::Bool(b) => Ok(Value::Bool(*b)),
        ChoiceValue::I64(i) => Ok(Value::Int(*i)),
        ChoiceValue::F64(x) => Ok(Value::real(*x)),
        ChoiceValue::Usize(u) => i64::try_from(*u)
            .map(Value::Int)
            .map_err(|e| GenError::InvalidParameter(e.to_string())),
        other => Err(GenError::TypeMismatch {
            expected: "bool, int or real",
            actual: format!("{:?}", other),
        }),
    }
}

/// Flatten a trace into a fugue trace.
///
/// A trace of a primitive distribution has its single choice at the root;
/// it is stored under the distribution's name.
pub fn to_fugue_trace(trace: &Trace) -> GenResult<fugue::Trace> {
    let mut out = fugue::Trace::default();
    for (path, leaf) in trace.leaf_traces() {
        let name = if path.is_empty() {
            trace.get_gen_fn().name().to_string()
        } else {
            path.to_string()
        };
        let value = to_choice_value(leaf.get_retval())?;
        out.insert_choice(addr!(name), value, leaf.get_score());
    }
    tracing::debug!(choices = out.choices.len(), "exported trace");
    Ok(out)
}

/// Read the values at `addresses` out of a fugue trace, e.g. to constrain a
/// model with values produced by fugue's own inference
pub fn choices_from_fugue<I>(trace: &fugue::Trace, addresses: I) -> GenResult<ChoiceMap>
where
    I: IntoIterator<Item = Address>,
{
    addresses.into_iter().try_fold(ChoiceMap::Empty, |map, address| {
        let choice = trace
            .choices
            .get(&addr!(address.to_string()))
            .ok_or_else(|| GenError::AddressNotFound(address.clone()))?;
        map.insert(address, from_choice_value(&choice.value)?)
    })
}
