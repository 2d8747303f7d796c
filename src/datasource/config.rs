use crate::config::DriverParams;
use crate::filter::split_filter;
use crate::model::ColumnLoadScope;

/// Facade configuration of one data source.
#[derive(Debug, Clone, Default)]
pub struct DataSourceConfig {
    /// Display name; also names the flat container
    pub name: String,
    /// LIKE patterns catalogs must match (empty = all)
    pub catalog_filter: Vec<String>,
    /// LIKE patterns schemas must match (empty = all)
    pub schema_filter: Vec<String>,
    pub column_load: ColumnLoadScope,
    pub params: DriverParams,
}

impl DataSourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the catalog filter from a comma-separated pattern list.
    pub fn with_catalog_filter(mut self, filter: &str) -> Self {
        self.catalog_filter = split_filter(filter);
        self
    }

    /// Set the schema filter from a comma-separated pattern list.
    pub fn with_schema_filter(mut self, filter: &str) -> Self {
        self.schema_filter = split_filter(filter);
        self
    }

    pub fn with_column_load(mut self, scope: ColumnLoadScope) -> Self {
        self.column_load = scope;
        self
    }

    pub fn with_params(mut self, params: DriverParams) -> Self {
        self.params = params;
        self
    }
}
