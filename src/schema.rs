use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::error::BlockError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match *self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub description: &'static str,
}

impl FieldDescriptor {
    pub const fn required(
        name: &'static str,
        field_type: FieldType,
        description: &'static str,
    ) -> Self {
        FieldDescriptor {
            name,
            field_type,
            required: true,
            description,
        }
    }

    pub const fn optional(
        name: &'static str,
        field_type: FieldType,
        description: &'static str,
    ) -> Self {
        FieldDescriptor {
            name,
            field_type,
            required: false,
            description,
        }
    }
}

/// Static metadata the host needs to register an operation as a block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub service: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub input_fields: &'static [FieldDescriptor],
    pub output_schema: Value,
    pub needs_serialization: bool,
}

impl OperationDescriptor {
    /// Checks presence of required fields and the JSON kind of every supplied field.
    ///
    /// A `null` value counts as absent. Fields not declared here are passed through.
    pub fn validate(&self, payload: &Map<String, Value>) -> Result<(), BlockError> {
        for field in self.input_fields {
            match payload.get(field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(BlockError::MissingField(field.name.to_string()));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.field_type.accepts(value) => {
                    return Err(BlockError::InvalidFieldType {
                        field: field.name.to_string(),
                        expected: field.field_type,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Builds an output schema that tolerates members added by later API versions.
pub fn object_schema(properties: Value) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": true,
    })
}
