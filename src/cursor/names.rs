//! Result-set column labels and numeric codes used by metadata rows.
//!
//! Labels follow the JDBC `DatabaseMetaData` conventions; vendor extension
//! requests (unique keys, triggers) reuse the `information_schema` names.

pub const TABLE_CAT: &str = "TABLE_CAT";
pub const TABLE_CATALOG: &str = "TABLE_CATALOG";
pub const TABLE_QUALIFIER: &str = "TABLE_QUALIFIER";
pub const TABLE_SCHEM: &str = "TABLE_SCHEM";
pub const TABLE_OWNER: &str = "TABLE_OWNER";
pub const TABLE_NAME: &str = "TABLE_NAME";
pub const TABLE_TYPE: &str = "TABLE_TYPE";
pub const REMARKS: &str = "REMARKS";
pub const TYPE_CAT: &str = "TYPE_CAT";
pub const TYPE_SCHEM: &str = "TYPE_SCHEM";
pub const TYPE_NAME: &str = "TYPE_NAME";

pub const COLUMN_NAME: &str = "COLUMN_NAME";
pub const DATA_TYPE: &str = "DATA_TYPE";
pub const COLUMN_SIZE: &str = "COLUMN_SIZE";
pub const DECIMAL_DIGITS: &str = "DECIMAL_DIGITS";
pub const NULLABLE: &str = "NULLABLE";
pub const IS_NULLABLE: &str = "IS_NULLABLE";
pub const COLUMN_DEF: &str = "COLUMN_DEF";
pub const ORDINAL_POSITION: &str = "ORDINAL_POSITION";
pub const IS_AUTOINCREMENT: &str = "IS_AUTOINCREMENT";

pub const PK_NAME: &str = "PK_NAME";
pub const KEY_SEQ: &str = "KEY_SEQ";
pub const PKTABLE_CAT: &str = "PKTABLE_CAT";
pub const PKTABLE_SCHEM: &str = "PKTABLE_SCHEM";
pub const PKTABLE_NAME: &str = "PKTABLE_NAME";
pub const PKCOLUMN_NAME: &str = "PKCOLUMN_NAME";
pub const FKTABLE_CAT: &str = "FKTABLE_CAT";
pub const FKTABLE_SCHEM: &str = "FKTABLE_SCHEM";
pub const FKTABLE_NAME: &str = "FKTABLE_NAME";
pub const FKCOLUMN_NAME: &str = "FKCOLUMN_NAME";
pub const FK_NAME: &str = "FK_NAME";
pub const UPDATE_RULE: &str = "UPDATE_RULE";
pub const DELETE_RULE: &str = "DELETE_RULE";
pub const DEFERRABILITY: &str = "DEFERRABILITY";

pub const INDEX_NAME: &str = "INDEX_NAME";
pub const NON_UNIQUE: &str = "NON_UNIQUE";
pub const INDEX_QUALIFIER: &str = "INDEX_QUALIFIER";
pub const TYPE: &str = "TYPE";
pub const ASC_OR_DESC: &str = "ASC_OR_DESC";

pub const CONSTRAINT_NAME: &str = "CONSTRAINT_NAME";
pub const CONSTRAINT_TYPE: &str = "CONSTRAINT_TYPE";

pub const TRIGGER_SCHEMA: &str = "TRIGGER_SCHEMA";
pub const TRIGGER_NAME: &str = "TRIGGER_NAME";
pub const EVENT_OBJECT_TABLE: &str = "EVENT_OBJECT_TABLE";
pub const EVENT_MANIPULATION: &str = "EVENT_MANIPULATION";
pub const ACTION_TIMING: &str = "ACTION_TIMING";
pub const ACTION_STATEMENT: &str = "ACTION_STATEMENT";

// MySQL table descriptor extras
pub const ENGINE: &str = "ENGINE";
pub const TABLE_ROWS: &str = "TABLE_ROWS";
pub const AUTO_INCREMENT: &str = "AUTO_INCREMENT";
pub const TABLE_COMMENT: &str = "TABLE_COMMENT";

/// Referential action codes (`UPDATE_RULE` / `DELETE_RULE`).
pub mod rule {
    pub const CASCADE: i32 = 0;
    pub const RESTRICT: i32 = 1;
    pub const SET_NULL: i32 = 2;
    pub const NO_ACTION: i32 = 3;
    pub const SET_DEFAULT: i32 = 4;
}

/// Deferrability codes (`DEFERRABILITY`).
pub mod deferrability {
    pub const INITIALLY_DEFERRED: i32 = 5;
    pub const INITIALLY_IMMEDIATE: i32 = 6;
    pub const NOT_DEFERRABLE: i32 = 7;
}

/// Index type codes (`TYPE` in index info rows).
pub mod index_type {
    pub const STATISTIC: i32 = 0;
    pub const CLUSTERED: i32 = 1;
    pub const HASHED: i32 = 2;
    pub const OTHER: i32 = 3;
}

/// Nullability codes (`NULLABLE`).
pub mod nullable {
    pub const NO_NULLS: i32 = 0;
    pub const NULLABLE: i32 = 1;
    pub const UNKNOWN: i32 = 2;
}
