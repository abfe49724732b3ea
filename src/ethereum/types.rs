use alloy::{
    dyn_abi::DynSolValue,
    json_abi::{self, EventParam, Param, StateMutability},
    primitives::{keccak256, Address, Selector, B256},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::wire::{StorageType, WireType};

/// One typed argument of an event or method, with the column type used to persist it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub wire_type: WireType,
    pub indexed: bool,
    pub storage_type: StorageType,
}

impl Field {
    pub fn new(name: impl Into<String>, wire_type: WireType, indexed: bool) -> Self {
        let storage_type = wire_type.storage_type();
        Self {
            name: name.into(),
            wire_type,
            indexed,
            storage_type,
        }
    }

    pub fn from_param(param: &Param) -> Self {
        Self::new(&param.name, WireType::from_param(param), false)
    }

    pub fn from_event_param(param: &EventParam) -> Self {
        Self::new(
            &param.name,
            WireType::parse(&param.ty, &param.components),
            param.indexed,
        )
    }

    /// Column name, `arg{position}` when the ABI leaves the argument unnamed
    pub fn column_name(&self, position: usize) -> String {
        if self.name.is_empty() {
            format!("arg{}", position)
        } else {
            self.name.clone()
        }
    }
}

/// Decoded occurrence of an event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub id: i64,
    pub values: BTreeMap<String, String>,
    pub block: i64,
    pub tx: String,
}

impl Log {
    pub fn new(id: i64, block: i64, tx: impl Into<String>) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
            block,
            tx: tx.into(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_decoded(self, name: impl Into<String>, value: &DynSolValue) -> Self {
        self.with_value(name, value_to_string(value))
    }
}

/// Render a decoded value as text. Arrays use the PostgreSQL array literal form.
pub fn value_to_string(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(addr) => format!("0x{:x}", addr),
        DynSolValue::Uint(num, _) => num.to_string(),
        DynSolValue::Int(num, _) => num.to_string(),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::FixedBytes(word, size) => {
            format!("0x{}", hex::encode(&word[..(*size).min(32)]))
        }
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let items: Vec<String> = items.iter().map(value_to_string).collect();
            format!("{{{}}}", items.join(","))
        }
        DynSolValue::Tuple(items) => {
            let items: Vec<String> = items.iter().map(value_to_string).collect();
            format!("({})", items.join(","))
        }
        other => format!("{:?}", other),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub name: String,
    pub anonymous: bool,
    pub fields: Vec<Field>,
    /// Decoded logs keyed by log id
    pub logs: BTreeMap<i64, Log>,
}

impl Event {
    pub fn from_abi(event: &json_abi::Event) -> Self {
        let fields: Vec<Field> = event.inputs.iter().map(Field::from_event_param).collect();
        debug!("Mapped event {} with {} fields", event.name, fields.len());

        Self {
            name: event.name.clone(),
            anonymous: event.anonymous,
            fields,
            logs: BTreeMap::new(),
        }
    }

    /// `Name(type1,type2,...)` over the fields in declaration order
    pub fn sig(&self) -> String {
        signature(&self.name, &self.fields)
    }

    /// Topic0 of a non-anonymous log emitted by this event
    pub fn topic(&self) -> B256 {
        keccak256(self.sig().as_bytes())
    }

    pub fn columns(&self) -> Vec<(String, StorageType)> {
        columns(&self.fields)
    }

    /// Insert a decoded log, replacing any earlier log recorded under the same id
    pub fn record_log(&mut self, id: i64, log: Log) {
        if self.logs.insert(id, log).is_some() {
            debug!("Overwrote log {} of event {}", id, self.name);
        }
    }
}

/// Outputs of a method called with one fixed input tuple, tracked across blocks
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    /// Arguments the method was called with; only addresses identify the result
    pub inputs: Vec<DynSolValue>,
    pub outputs: BTreeMap<i64, DynSolValue>,
    pub storage_type: StorageType,
}

impl CallResult {
    pub fn new(inputs: Vec<DynSolValue>, storage_type: StorageType) -> Self {
        Self {
            inputs,
            outputs: BTreeMap::new(),
            storage_type,
        }
    }

    pub fn addresses(&self) -> Vec<Address> {
        addresses(&self.inputs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    pub is_constant: bool,
    pub inputs: Vec<Field>,
    pub outputs: Vec<Field>,
    #[serde(skip)]
    pub results: Vec<CallResult>,
}

impl Method {
    pub fn from_abi(function: &json_abi::Function) -> Self {
        let inputs: Vec<Field> = function.inputs.iter().map(Field::from_param).collect();
        let outputs: Vec<Field> = function.outputs.iter().map(Field::from_param).collect();
        debug!(
            "Mapped method {} with {} inputs and {} outputs",
            function.name,
            inputs.len(),
            outputs.len()
        );

        Self {
            name: function.name.clone(),
            is_constant: matches!(
                function.state_mutability,
                StateMutability::View | StateMutability::Pure
            ),
            inputs,
            outputs,
            results: Vec::new(),
        }
    }

    /// `Name(type1,type2,...)` over the inputs in declaration order
    pub fn sig(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    pub fn selector(&self) -> Selector {
        Selector::from_slice(&keccak256(self.sig().as_bytes())[..4])
    }

    pub fn input_columns(&self) -> Vec<(String, StorageType)> {
        columns(&self.inputs)
    }

    pub fn output_columns(&self) -> Vec<(String, StorageType)> {
        columns(&self.outputs)
    }

    /// Storage type of the first output, TEXT for methods without outputs
    pub fn output_storage_type(&self) -> StorageType {
        self.outputs
            .first()
            .map(|field| field.storage_type)
            .unwrap_or(StorageType::Text)
    }

    /// Record the output observed at `height` for a call made with `inputs`.
    ///
    /// Results are matched on the address arguments of the call; a new result
    /// is started when no existing one has the same addresses.
    pub fn record_call_result(
        &mut self,
        inputs: Vec<DynSolValue>,
        height: i64,
        output: DynSolValue,
    ) {
        let key = addresses(&inputs);
        let index = match self.results.iter().position(|r| r.addresses() == key) {
            Some(index) => index,
            None => {
                debug!("Tracking new input set for method {}: {:?}", self.name, key);
                let storage_type = self.output_storage_type();
                self.results.push(CallResult::new(inputs, storage_type));
                self.results.len() - 1
            }
        };

        self.results[index].outputs.insert(height, output);
    }

    pub fn result_for(&self, inputs: &[DynSolValue]) -> Option<&CallResult> {
        let key = addresses(inputs);
        self.results.iter().find(|r| r.addresses() == key)
    }
}

fn signature(name: &str, fields: &[Field]) -> String {
    let types: Vec<&str> = fields.iter().map(|f| f.wire_type.as_str()).collect();
    format!("{}({})", name, types.join(","))
}

fn columns(fields: &[Field]) -> Vec<(String, StorageType)> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| (field.column_name(i), field.storage_type))
        .collect()
}

fn addresses(values: &[DynSolValue]) -> Vec<Address> {
    values.iter().filter_map(DynSolValue::as_address).collect()
}
