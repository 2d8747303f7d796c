#[path = "../common/mod.rs"]
mod common;

#[cfg(test)]
mod tests {
    use super::common::*;
    use genmeta::cursor::names::{self, rule};
    use genmeta::cursor::MetaRow;
    use genmeta::prelude::*;
    use genmeta::sources::Snapshot;
    use std::sync::Arc;

    fn table(ds: &Arc<DataSource>, name: &str) -> Arc<Table> {
        ds.find_table(&NullMonitor, None, Some("sales"), name)
            .unwrap()
            .unwrap_or_else(|| panic!("table {} missing", name))
    }

    /// Shop plus `regions` (no primary key) referenced by `stores` and
    /// `depots` through unnamed composite keys.
    fn regions_snapshot() -> Snapshot {
        let mut snapshot = shop_snapshot();
        for name in ["regions", "stores", "depots"] {
            snapshot.tables.push(table_row("sales", name, "TABLE"));
        }
        snapshot.columns.extend([
            column_row("sales", "regions", "code", 1),
            column_row("sales", "regions", "zone", 2),
            column_row("sales", "stores", "id", 1),
            column_row("sales", "stores", "region_code", 2),
            column_row("sales", "stores", "region_zone", 3),
            column_row("sales", "depots", "id", 1),
            column_row("sales", "depots", "region_code", 2),
            column_row("sales", "depots", "region_zone", 3),
        ]);
        snapshot.foreign_keys.extend([
            // Arrives out of key order
            fk_row(
                ("sales", "regions", "zone"),
                ("sales", "stores", "region_zone"),
                None,
                None,
                2,
            ),
            fk_row(
                ("sales", "regions", "code"),
                ("sales", "stores", "region_code"),
                None,
                None,
                1,
            ),
            fk_row(
                ("sales", "regions", "code"),
                ("sales", "depots", "region_code"),
                None,
                None,
                1,
            ),
            fk_row(
                ("sales", "regions", "zone"),
                ("sales", "depots", "region_zone"),
                None,
                None,
                2,
            ),
        ]);
        snapshot
    }

    #[test]
    fn test_imported_key_resolves_named_primary_key() {
        let (ds, _) = data_source(shop_snapshot());
        let orders = table(&ds, "orders");
        let customers = table(&ds, "customers");

        let keys = orders.foreign_keys(&NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
        let fk = &keys[0];

        assert_eq!(fk.name.as_deref(), Some("fk_orders_customer"));
        assert!(Arc::ptr_eq(&fk.table().unwrap(), &orders));
        assert!(Arc::ptr_eq(&fk.referenced_table().unwrap(), &customers));

        let pk = customers.primary_key(&NullMonitor).unwrap().unwrap();
        assert!(Arc::ptr_eq(&fk.referenced_key, &pk));
        assert!(!fk.referenced_key.is_synthetic());

        assert_eq!(fk.delete_rule, CascadeRule::Cascade);
        assert_eq!(fk.update_rule, CascadeRule::NoAction);
        assert_eq!(fk.deferrability, Deferrability::NotDeferrable);

        assert_eq!(fk.columns.len(), 1);
        assert!(Arc::ptr_eq(
            &fk.columns[0].column,
            &orders.column(&NullMonitor, "customer_id").unwrap().unwrap()
        ));
        assert!(Arc::ptr_eq(
            &fk.columns[0].referenced_column,
            &customers.column(&NullMonitor, "id").unwrap().unwrap()
        ));

        let by_name = orders
            .foreign_key(&NullMonitor, "fk_orders_customer")
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&by_name, fk));
    }

    #[test]
    fn test_rules_are_decoded_per_key() {
        let (ds, _) = data_source(shop_snapshot());
        let lines = table(&ds, "order_lines");

        let keys = lines.foreign_keys(&NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].delete_rule, CascadeRule::SetNull);
        assert_eq!(keys[0].update_rule, CascadeRule::Restrict);
    }

    #[test]
    fn test_composite_key_columns_follow_key_sequence() {
        let mut snapshot = shop_snapshot();
        snapshot.tables.push(table_row("sales", "shipments", "TABLE"));
        snapshot.columns.extend([
            column_row("sales", "shipments", "id", 1),
            column_row("sales", "shipments", "line_no", 2),
            column_row("sales", "shipments", "order_id", 3),
        ]);
        snapshot.foreign_keys.extend([
            fk_row(
                ("sales", "order_lines", "line_no"),
                ("sales", "shipments", "line_no"),
                Some("fk_shipments_line"),
                Some("pk_order_lines"),
                2,
            ),
            fk_row(
                ("sales", "order_lines", "order_id"),
                ("sales", "shipments", "order_id"),
                Some("fk_shipments_line"),
                Some("pk_order_lines"),
                1,
            ),
        ]);
        let (ds, _) = data_source(snapshot);
        let shipments = table(&ds, "shipments");
        let lines = table(&ds, "order_lines");

        let keys = shipments.foreign_keys(&NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
        let fk = &keys[0];

        let local: Vec<&str> = fk.columns.iter().map(|c| c.column.name.as_str()).collect();
        let remote: Vec<&str> = fk
            .columns
            .iter()
            .map(|c| c.referenced_column.name.as_str())
            .collect();
        assert_eq!(local, vec!["order_id", "line_no"]);
        assert_eq!(remote, vec!["order_id", "line_no"]);
        assert_eq!(fk.columns[0].key_seq, 1);

        let pk = lines.primary_key(&NullMonitor).unwrap().unwrap();
        assert!(Arc::ptr_eq(&fk.referenced_key, &pk));
        assert_eq!(pk.column_names(), vec!["order_id", "line_no"]);
    }

    #[test]
    fn test_missing_primary_key_is_fabricated_once_per_scan() {
        let (ds, _) = data_source(regions_snapshot());
        let regions = table(&ds, "regions");
        let stores = table(&ds, "stores");
        let depots = table(&ds, "depots");

        let references = regions.references(&NullMonitor).unwrap();
        assert_eq!(references.len(), 2);
        assert!(Arc::ptr_eq(&references[0].table().unwrap(), &stores));
        assert!(Arc::ptr_eq(&references[1].table().unwrap(), &depots));

        let key = &references[0].referenced_key;
        assert!(Arc::ptr_eq(key, &references[1].referenced_key));
        assert!(key.is_synthetic());
        assert_eq!(key.kind, ConstraintKind::PrimaryKey);
        assert_eq!(key.name, None);
        assert_eq!(key.column_names(), vec!["code", "zone"]);
        assert!(Arc::ptr_eq(&key.table().unwrap(), &regions));

        // Never leaks into the table's own keys
        assert!(regions.primary_key(&NullMonitor).unwrap().is_none());
        assert!(regions.constraints(&NullMonitor).unwrap().is_empty());
    }

    #[test]
    fn test_missing_named_primary_key_is_shared_within_scan() {
        let mut snapshot = shop_snapshot();
        for name in ["warehouses", "transfers"] {
            snapshot.tables.push(table_row("sales", name, "TABLE"));
        }
        snapshot.columns.extend([
            column_row("sales", "warehouses", "code", 1),
            column_row("sales", "transfers", "id", 1),
            column_row("sales", "transfers", "from_code", 2),
            column_row("sales", "transfers", "to_code", 3),
        ]);
        // `pk_gone` is named by both keys but absent from the key listing
        snapshot.foreign_keys.extend([
            fk_row(
                ("sales", "warehouses", "code"),
                ("sales", "transfers", "from_code"),
                Some("fk_transfers_from"),
                Some("pk_gone"),
                1,
            ),
            fk_row(
                ("sales", "warehouses", "code"),
                ("sales", "transfers", "to_code"),
                Some("fk_transfers_to"),
                Some("pk_gone"),
                1,
            ),
        ]);
        let (ds, _) = data_source(snapshot);
        let warehouses = table(&ds, "warehouses");
        let transfers = table(&ds, "transfers");

        let keys = transfers.foreign_keys(&NullMonitor).unwrap();
        let names: Vec<Option<&str>> = keys.iter().map(|k| k.name.as_deref()).collect();
        assert_eq!(names, vec![Some("fk_transfers_from"), Some("fk_transfers_to")]);

        let key = &keys[0].referenced_key;
        assert!(Arc::ptr_eq(key, &keys[1].referenced_key));
        assert!(key.is_synthetic());
        assert_eq!(key.name.as_deref(), Some("pk_gone"));
        assert_eq!(key.column_names(), vec!["code"]);
        assert!(Arc::ptr_eq(&key.table().unwrap(), &warehouses));

        assert!(warehouses.constraints(&NullMonitor).unwrap().is_empty());
        assert!(warehouses
            .constraint(&NullMonitor, "pk_gone")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unnamed_keys_split_by_table() {
        let (ds, _) = data_source(regions_snapshot());
        let stores = table(&ds, "stores");

        let keys = stores.foreign_keys(&NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
        let fk = &keys[0];
        assert_eq!(fk.name, None);
        let local: Vec<&str> = fk.columns.iter().map(|c| c.column.name.as_str()).collect();
        assert_eq!(local, vec!["region_code", "region_zone"]);
        assert!(fk.referenced_key.is_synthetic());
    }

    #[test]
    fn test_exported_scan_reuses_owned_keys() {
        let (ds, provider) = data_source(shop_snapshot());
        let orders = table(&ds, "orders");
        let customers = table(&ds, "customers");

        let references = customers.references(&NullMonitor).unwrap();
        assert_eq!(references.len(), 1);
        let owned = orders.foreign_keys(&NullMonitor).unwrap();
        assert!(Arc::ptr_eq(&references[0], &owned[0]));

        // References are not cached, the owned keys are
        let again = customers.references(&NullMonitor).unwrap();
        assert!(Arc::ptr_eq(&again[0], &owned[0]));
        assert_eq!(provider.requests("exported_keys"), 2);
        assert_eq!(provider.requests("imported_keys"), 1);
    }

    #[test]
    fn test_unresolvable_rows_are_skipped() {
        let mut snapshot = shop_snapshot();
        snapshot.foreign_keys.extend([
            fk_row(
                ("sales", "ghosts", "id"),
                ("sales", "orders", "customer_id"),
                Some("fk_orders_ghost"),
                None,
                1,
            ),
            fk_row(
                ("sales", "customers", "no_such_column"),
                ("sales", "orders", "customer_id"),
                Some("fk_orders_bad_pk_column"),
                None,
                1,
            ),
            fk_row(
                ("sales", "customers", "id"),
                ("sales", "orders", "no_such_column"),
                Some("fk_orders_bad_fk_column"),
                None,
                1,
            ),
            fk_row(
                ("archive", "customers", "id"),
                ("sales", "orders", "customer_id"),
                Some("fk_orders_archive"),
                None,
                1,
            ),
        ]);
        let (ds, _) = data_source(snapshot);
        let orders = table(&ds, "orders");

        let keys = orders.foreign_keys(&NullMonitor).unwrap();
        let names: Vec<Option<&str>> = keys.iter().map(|k| k.name.as_deref()).collect();
        assert_eq!(names, vec![Some("fk_orders_customer")]);
    }

    #[test]
    fn test_stale_key_name_falls_back_to_key_holding_column() {
        let mut snapshot = shop_snapshot();
        snapshot.foreign_keys[0].set(names::PK_NAME, "pk_customers_old");
        let (ds, _) = data_source(snapshot);
        let orders = table(&ds, "orders");
        let customers = table(&ds, "customers");

        let keys = orders.foreign_keys(&NullMonitor).unwrap();
        let pk = customers.primary_key(&NullMonitor).unwrap().unwrap();
        assert!(Arc::ptr_eq(&keys[0].referenced_key, &pk));
        assert!(!keys[0].referenced_key.is_synthetic());
    }

    #[test]
    fn test_cancelled_scan_is_reloaded() {
        let (ds, provider) = data_source(shop_snapshot());
        let orders = table(&ds, "orders");

        let partial = orders.foreign_keys(&CancelAfter::new(0)).unwrap();
        assert!(partial.is_empty());
        assert!(!orders.foreign_keys_loaded());

        assert_eq!(orders.foreign_keys(&NullMonitor).unwrap().len(), 1);
        assert_eq!(provider.requests("imported_keys"), 2);
    }

    #[test]
    fn test_cancelled_column_lookup_keeps_key_scan_uncached() {
        let (ds, provider) = data_source(shop_snapshot());
        let orders = table(&ds, "orders");
        let customers = table(&ds, "customers");

        // The scan reads its only row; the cancellation lands in the
        // columns load of `customers` needed to resolve it
        let partial = orders.foreign_keys(&CancelAfter::new(1)).unwrap();
        assert!(partial.is_empty());
        assert!(!orders.foreign_keys_loaded());
        assert!(!customers.columns_loaded());

        let keys = orders.foreign_keys(&NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name.as_deref(), Some("fk_orders_customer"));
        assert_eq!(provider.requests("imported_keys"), 2);
    }

    #[test]
    fn test_cancelled_column_lookup_keeps_unique_keys_uncached() {
        let (ds, _) = data_source(shop_snapshot());
        let customers = table(&ds, "customers");

        let partial = customers.constraints(&CancelAfter::new(1)).unwrap();
        assert_eq!(partial.len(), 1);
        assert!(partial[0].columns.is_empty());
        assert!(!customers.constraints_loaded());

        let pk = customers.primary_key(&NullMonitor).unwrap().unwrap();
        assert_eq!(pk.column_names(), vec!["id"]);
        assert!(customers.constraints_loaded());
    }

    #[test]
    fn test_cancelled_column_load_keeps_indexes_uncached() {
        let (ds, _) = data_source(shop_snapshot());
        let orders = table(&ds, "orders");

        // One column row is read before the cancellation
        orders.indexes(&CancelAfter::new(1)).unwrap();
        assert!(!orders.indexes_loaded());
        assert!(!orders.columns_loaded());

        let indexes = orders.indexes(&NullMonitor).unwrap();
        assert_eq!(indexes[0].column_names(), vec!["customer_id", "id"]);
        assert!(orders.indexes_loaded());
    }

    #[test]
    fn test_indexes_link_table_columns() {
        let mut snapshot = shop_snapshot();
        snapshot.index_info.extend([
            // Table statistics row
            MetaRow::new()
                .with(names::TABLE_SCHEM, "sales")
                .with(names::TABLE_NAME, "orders")
                .with(names::TYPE, 0),
            index_row("sales", "orders", "pk_orders_idx", "id", 1)
                .with(names::NON_UNIQUE, false)
                .with(names::ASC_OR_DESC, "D")
                .with(names::INDEX_QUALIFIER, "sales"),
            index_row("sales", "orders", "pk_orders_idx", "dropped_column", 2),
        ]);
        let (ds, _) = data_source(snapshot);
        let orders = table(&ds, "orders");

        let indexes = orders.indexes(&NullMonitor).unwrap();
        assert_eq!(indexes.len(), 2);

        let by_customer = orders
            .index(&NullMonitor, "idx_orders_customer")
            .unwrap()
            .unwrap();
        assert!(!by_customer.unique);
        assert_eq!(by_customer.index_type, IndexType::Other);
        assert_eq!(by_customer.column_names(), vec!["customer_id", "id"]);
        assert!(by_customer.columns.iter().all(|c| c.ascending));
        assert_eq!(by_customer.qualifier, None);

        let pk_index = &indexes[1];
        assert_eq!(pk_index.name, "pk_orders_idx");
        assert!(pk_index.unique);
        assert_eq!(pk_index.qualifier.as_deref(), Some("sales"));
        assert_eq!(pk_index.column_names(), vec!["id"]);
        assert!(!pk_index.columns[0].ascending);

        let id = orders.column(&NullMonitor, "id").unwrap().unwrap();
        assert!(Arc::ptr_eq(&pk_index.columns[0].column, &id));
    }

    #[test]
    fn test_primary_key_columns_and_lookup() {
        let (ds, _) = data_source(shop_snapshot());
        let lines = table(&ds, "order_lines");

        let keys = lines.constraints(&NullMonitor).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].kind, ConstraintKind::PrimaryKey);
        assert_eq!(keys[0].column_names(), vec!["order_id", "line_no"]);
        let seqs: Vec<i32> = keys[0].columns.iter().map(|c| c.key_seq).collect();
        assert_eq!(seqs, vec![1, 2]);

        let by_name = lines.constraint(&NullMonitor, "pk_order_lines").unwrap();
        assert!(Arc::ptr_eq(&by_name.unwrap(), &keys[0]));
        assert!(lines.constraint(&NullMonitor, "missing").unwrap().is_none());
    }

    #[test]
    fn test_mysql_unique_keys_keep_primary_and_unique() {
        let unique_row = |name: &str, kind: &str, column: &str, position: i32| {
            MetaRow::new()
                .with(names::TABLE_SCHEM, "sales")
                .with(names::TABLE_NAME, "customers")
                .with(names::CONSTRAINT_NAME, name)
                .with(names::CONSTRAINT_TYPE, kind)
                .with(names::COLUMN_NAME, column)
                .with(names::ORDINAL_POSITION, position)
        };
        let mut snapshot = shop_snapshot();
        snapshot.unique_keys = vec![
            unique_row("PRIMARY", "PRIMARY KEY", "id", 1),
            unique_row("uq_customers_email", "UNIQUE", "email", 1),
            unique_row("fk_customers_region", "FOREIGN KEY", "email", 1),
        ];
        snapshot.foreign_keys[0].set(names::PK_NAME, "PRIMARY");
        snapshot.foreign_keys[0].set(names::DELETE_RULE, rule::RESTRICT);
        let (ds, _) = data_source_with(
            DataSourceConfig::new("shop"),
            snapshot,
            Arc::new(MySqlDialect),
        );
        let customers = table(&ds, "customers");
        let orders = table(&ds, "orders");

        let keys = customers.constraints(&NullMonitor).unwrap();
        let kinds: Vec<(Option<&str>, ConstraintKind)> = keys
            .iter()
            .map(|k| (k.name.as_deref(), k.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (Some("PRIMARY"), ConstraintKind::PrimaryKey),
                (Some("uq_customers_email"), ConstraintKind::UniqueKey),
            ]
        );

        let fk = &orders.foreign_keys(&NullMonitor).unwrap()[0];
        assert!(Arc::ptr_eq(&fk.referenced_key, &keys[0]));
        assert_eq!(fk.delete_rule, CascadeRule::Restrict);
    }
}
