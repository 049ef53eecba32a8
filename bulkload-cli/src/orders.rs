//! The fixed target table for order status change events.
//!
//! Column order here is the binding contract between the conversion
//! pipeline and the sink: the insert parameter list matches the CSV field
//! order position by position.

use bulkload_core::schema::{Column, KeyColumn};
use bulkload_core::{DataType, InsertStatement, TableSchema};

/// Keyspace name
pub const KEYSPACE: &str = "test";
/// Table name
pub const TABLE: &str = "orders";

fn column(name: &str, data_type: DataType, nullable: bool, static_column: bool) -> Column {
    Column {
        name: name.to_string(),
        data_type,
        nullable,
        static_column,
    }
}

/// Schema for the bulk loading table.
///
/// `sender_order_id` and `sender_id` are static: shared across all rows of a
/// partition rather than per-clustering-row.
pub fn schema() -> TableSchema {
    TableSchema {
        keyspace: KEYSPACE.to_string(),
        table: TABLE.to_string(),
        partition_keys: vec![KeyColumn {
            name: "order_id".to_string(),
            data_type: DataType::Uuid,
            position: 0,
        }],
        clustering_keys: vec![KeyColumn {
            name: "id".to_string(),
            data_type: DataType::Uuid,
            position: 0,
        }],
        columns: vec![
            column("id", DataType::Uuid, false, false),
            column("order_id", DataType::Uuid, false, false),
            column("status", DataType::Text, true, false),
            column("change_date", DataType::Timestamp, true, false),
            column("changer_id", DataType::Text, true, false),
            column("execution_status", DataType::Text, true, false),
            column("status_change_reason_desc", DataType::Text, true, false),
            column("location_id", DataType::Uuid, true, false),
            column("mile_type", DataType::Text, true, false),
            column("sender_order_id", DataType::Text, true, true),
            column("sender_id", DataType::Uuid, true, true),
        ],
    }
}

/// Insert statement binding the CSV field order to the table columns
pub fn insert() -> InsertStatement {
    InsertStatement::new([
        "id",
        "order_id",
        "status",
        "change_date",
        "changer_id",
        "execution_status",
        "status_change_reason_desc",
        "location_id",
        "mile_type",
        "sender_order_id",
        "sender_id",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_valid() {
        schema().validate().unwrap();
    }

    #[test]
    fn test_insert_binds_all_columns_in_order() {
        let schema = schema();
        let specs = insert().bind(&schema).unwrap();
        assert_eq!(specs.len(), 11);
        assert_eq!(specs[0].name, "id");
        assert_eq!(specs[3].name, "change_date");
        assert_eq!(specs[3].data_type, DataType::Timestamp);
        assert_eq!(specs[7].name, "location_id");
        assert!(specs[7].nullable);
        assert_eq!(specs[10].name, "sender_id");
        for (i, spec) in specs.iter().enumerate() {
            assert_eq!(spec.index, i);
        }
    }

    #[test]
    fn test_primary_key_structure() {
        let schema = schema();
        assert_eq!(schema.partition_keys[0].name, "order_id");
        assert_eq!(schema.clustering_keys[0].name, "id");
        assert_eq!(schema.qualified_name(), "test.orders");
    }
}
