use crate::error::ShopError;
use serde::Serialize;
use serde_json::Value;

/// Structural limits applied to JSON documents accepted at the boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentLimits {
    pub max_bytes: usize,
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_bytes: 16 * 1024,
            max_depth: 8,
            max_nodes: 1024,
        }
    }
}

/// Shape of an accepted document.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct DocumentSummary {
    /// Top-level keys, sorted.
    pub fields: Vec<String>,
    pub depth: usize,
    pub nodes: usize,
}

impl DocumentLimits {
    /// Decodes `body` and checks it against the limits.
    ///
    /// The size check runs before decoding; depth and node counts are
    /// measured on the decoded value.
    pub fn inspect(&self, body: &[u8]) -> Result<DocumentSummary, ShopError> {
        if body.len() > self.max_bytes {
            return Err(ShopError::PayloadTooLarge {
                limit: self.max_bytes,
            });
        }
        let value: Value = serde_json::from_slice(body)?;
        let Value::Object(fields) = &value else {
            return Err(ShopError::ValidationError(
                "Document must be a JSON object".to_string(),
            ));
        };

        let mut nodes = 0;
        let depth = self.measure(&value, 1, &mut nodes)?;

        let mut keys: Vec<String> = fields.keys().cloned().collect();
        keys.sort();
        Ok(DocumentSummary {
            fields: keys,
            depth,
            nodes,
        })
    }

    fn measure(&self, value: &Value, depth: usize, nodes: &mut usize) -> Result<usize, ShopError> {
        *nodes += 1;
        if *nodes > self.max_nodes {
            return Err(ShopError::ValidationError(format!(
                "Document has more than {} values",
                self.max_nodes
            )));
        }
        if depth > self.max_depth {
            return Err(ShopError::ValidationError(format!(
                "Document nesting exceeds {} levels",
                self.max_depth
            )));
        }
        let children: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => return Ok(depth),
        };
        let mut deepest = depth;
        for child in children {
            deepest = deepest.max(self.measure(child, depth + 1, nodes)?);
        }
        Ok(deepest)
    }
}
