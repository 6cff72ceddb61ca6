use crate::core::{DictError, Result};

/// Run configuration for the pipeline.
///
/// Builder-style setters consume and return `self`.
#[derive(Debug, Clone)]
pub struct DictConfig {
    /// Solution unique names to collect.
    pub solutions: Vec<String>,

    /// Maximum writes per submitted batch.
    pub batch_size: usize,

    /// Store table receiving one row per correlated attribute.
    pub field_table: String,

    /// Store table receiving one row per field modification.
    pub modification_table: String,

    /// Store table receiving one row per scanned web resource.
    pub script_table: String,

    /// Store table receiving web-resource dependency links.
    pub dependency_table: String,

    /// Alternate-key field name shared by all four tables.
    pub key_field: String,
}

impl Default for DictConfig {
    fn default() -> Self {
        Self {
            solutions: Vec::new(),
            batch_size: 1000,
            field_table: "datadict_field".to_string(),
            modification_table: "datadict_fieldmodification".to_string(),
            script_table: "datadict_script".to_string(),
            dependency_table: "datadict_scriptdependency".to_string(),
            key_field: "dd_alternatekey".to_string(),
        }
    }
}

impl DictConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the solutions to collect.
    pub fn solutions<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.solutions = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the field row table name.
    pub fn field_table(mut self, table: &str) -> Self {
        self.field_table = table.to_string();
        self
    }

    /// Set the modification row table name.
    pub fn modification_table(mut self, table: &str) -> Self {
        self.modification_table = table.to_string();
        self
    }

    /// Set the script row table name.
    pub fn script_table(mut self, table: &str) -> Self {
        self.script_table = table.to_string();
        self
    }

    /// Set the dependency row table name.
    pub fn dependency_table(mut self, table: &str) -> Self {
        self.dependency_table = table.to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.solutions.is_empty() {
            return Err(DictError::Config(
                "at least one solution unique name is required".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(DictError::Config("batch size must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = DictConfig::new()
            .solutions(["sales", "service"])
            .batch_size(100)
            .field_table("custom_field");

        assert_eq!(config.solutions, vec!["sales", "service"]);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.field_table, "custom_field");
        assert_eq!(config.key_field, "dd_alternatekey");
    }

    #[test]
    fn test_validate_rejects_empty_runs() {
        assert!(DictConfig::new().validate().is_err());
        assert!(DictConfig::new().solutions(["s"]).batch_size(0).validate().is_err());
        assert!(DictConfig::new().solutions(["s"]).validate().is_ok());
    }
}
