//! Naming convention for generated indexes.
//!
//! The template uses `{table}` and `{column}` placeholders.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingConvention {
    pub index: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            index: "{table}_{column}_idx".to_string(),
        }
    }
}

impl NamingConvention {
    pub fn index_name(&self, table: &str, column: &str) -> String {
        self.index
            .replace("{table}", table)
            .replace("{column}", column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_index_template() {
        let naming = NamingConvention::default();
        assert_eq!(naming.index_name("messages", "inputs"), "messages_inputs_idx");
    }

    #[test]
    fn custom_index_template() {
        let naming = NamingConvention {
            index: "ix_{table}_{column}".to_string(),
        };
        assert_eq!(naming.index_name("t", "c"), "ix_t_c");
    }
}
