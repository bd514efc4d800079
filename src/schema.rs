//! Instruction schema - a description of an instruction table.
//!
//! Both halves of a link can describe the table they were built with: the
//! sender lists the codes it assigned, the receiver lists its dispatch table.
//! Comparing the two is the only way to catch a reordered or missing
//! instruction, since the wire itself carries nothing but positional codes.
//!
//! The schema never travels on the instruction stream. Export it as JSON at
//! build time, log it at startup, or check it in a test.
//!
//! # Example
//!
//! ```
//! use serialwire::schema::InstructionSchema;
//!
//! let mut host = InstructionSchema::new(1);
//! host.add("set_led", Some(2));
//! host.add("reset", Some(0));
//!
//! let mut device = InstructionSchema::new(1);
//! device.add("set_led", Some(2));
//! device.add("reset", None);
//!
//! host.ensure_compatible(&device).unwrap();
//! assert_eq!(host.code_of("reset"), Some(1));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SerialwireError};

/// Schema format version.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// One instruction in a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionEntry {
    /// Assigned code (position in the table).
    pub code: usize,
    /// Registration name. Empty for a slot that was never filled.
    pub name: String,
    /// Encoded argument width in bytes, when the registration declared a
    /// [`Wire`](crate::codec::Wire) argument type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_width: Option<usize>,
}

/// Ordered description of an instruction table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionSchema {
    /// Schema format version.
    pub version: String,
    /// Width of the instruction code in bytes.
    pub code_width: usize,
    /// Instructions ordered by code.
    pub instructions: Vec<InstructionEntry>,
}

impl InstructionSchema {
    /// Create an empty schema for codes of `code_width` bytes.
    pub fn new(code_width: usize) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            code_width,
            instructions: Vec::new(),
        }
    }

    /// Append an instruction; its code is the current length.
    pub fn add(&mut self, name: &str, argument_width: Option<usize>) -> usize {
        let code = self.instructions.len();
        self.instructions.push(InstructionEntry {
            code,
            name: name.to_string(),
            argument_width,
        });
        code
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the schema has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Entry for a code.
    pub fn get(&self, code: usize) -> Option<&InstructionEntry> {
        self.instructions.get(code)
    }

    /// Code assigned to a name.
    pub fn code_of(&self, name: &str) -> Option<usize> {
        self.instructions
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.code)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check that `peer` describes the same ordered table.
    ///
    /// Fails with [`SerialwireError::SchemaMismatch`] on the first difference:
    /// schema version, code width, table length, the name at any code, or the
    /// argument width at any code where both sides declare one.
    pub fn ensure_compatible(&self, peer: &InstructionSchema) -> Result<()> {
        if self.version != peer.version {
            return Err(mismatch(format!(
                "schema version {} vs {}",
                self.version, peer.version
            )));
        }

        if self.code_width != peer.code_width {
            return Err(mismatch(format!(
                "code width {} vs {} bytes",
                self.code_width, peer.code_width
            )));
        }

        if self.len() != peer.len() {
            return Err(mismatch(format!(
                "{} instructions vs {}",
                self.len(),
                peer.len()
            )));
        }

        for (ours, theirs) in self.instructions.iter().zip(&peer.instructions) {
            if ours.name != theirs.name {
                return Err(mismatch(format!(
                    "code {} is '{}' vs '{}'",
                    ours.code, ours.name, theirs.name
                )));
            }

            if let (Some(a), Some(b)) = (ours.argument_width, theirs.argument_width) {
                if a != b {
                    return Err(mismatch(format!(
                        "'{}' arguments are {} bytes vs {}",
                        ours.name, a, b
                    )));
                }
            }
        }

        Ok(())
    }
}

fn mismatch(detail: String) -> SerialwireError {
    SerialwireError::SchemaMismatch(detail)
}
