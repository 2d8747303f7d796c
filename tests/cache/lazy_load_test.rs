#[path = "../common/mod.rs"]
mod common;

#[cfg(test)]
mod tests {
    use super::common::*;
    use genmeta::model::CacheScope;
    use genmeta::prelude::*;
    use genmeta::sources::SnapshotSource;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn orders(ds: &Arc<DataSource>) -> Arc<Table> {
        ds.find_table(&NullMonitor, None, Some("sales"), "orders")
            .unwrap()
            .expect("orders table")
    }

    #[test]
    fn test_repeated_access_loads_once() {
        let (ds, provider) = data_source(shop_snapshot());
        let orders = orders(&ds);
        assert!(!orders.columns_loaded());

        let first = orders.columns(&NullMonitor).unwrap();
        let second = orders.columns(&NullMonitor).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
        assert!(orders.columns_loaded());
        assert_eq!(provider.requests("columns"), 1);
    }

    #[test]
    fn test_concurrent_loads_share_one_scan() {
        let (ds, provider) = data_source(shop_snapshot());
        let orders = orders(&ds);
        provider.set_delay(Duration::from_millis(30));

        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| orders.indexes(&NullMonitor).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(provider.requests("index_info"), 1);
        assert_eq!(provider.requests("columns"), 1);
        for indexes in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], indexes));
        }
    }

    #[test]
    fn test_cancelled_load_is_not_cached() {
        let (ds, provider) = data_source(shop_snapshot());
        let orders = orders(&ds);

        // First row is read, the second poll cancels
        let partial = orders.columns(&CancelAfter::new(1)).unwrap();
        assert_eq!(partial.len(), 1);
        assert!(!orders.columns_loaded());

        let complete = orders.columns(&NullMonitor).unwrap();
        assert_eq!(complete.len(), 2);
        assert!(orders.columns_loaded());
        assert_eq!(provider.requests("columns"), 2);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let source = Arc::new(SnapshotSource::new(shop_snapshot()));
        let provider = Arc::new(CountingProvider::new(source.clone()));
        let ds = DataSource::new(
            DataSourceConfig::new("shop"),
            provider.clone(),
            Arc::new(GenericDialect),
        );
        ds.initialize(&NullMonitor).unwrap();
        let orders = orders(&ds);

        source.fail_with("connection reset");
        let err = orders.columns(&NullMonitor).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(!orders.columns_loaded());

        source.recover();
        assert_eq!(orders.columns(&NullMonitor).unwrap().len(), 2);
        assert_eq!(provider.opened(), provider.closed());
    }

    #[test]
    fn test_refresh_reloads() {
        let (ds, provider) = data_source(shop_snapshot());
        let orders = orders(&ds);

        let before = orders.columns(&NullMonitor).unwrap();
        orders.refresh();
        assert!(!orders.columns_loaded());
        let after = orders.columns(&NullMonitor).unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.len(), after.len());
        assert_eq!(provider.requests("columns"), 2);
    }

    #[test]
    fn test_container_column_scan_fills_every_table() {
        let (ds, provider) = data_source_with(
            DataSourceConfig::new("shop").with_column_load(ColumnLoadScope::Container),
            shop_snapshot(),
            Arc::new(GenericDialect),
        );
        let schema = ds.schema("sales").unwrap().unwrap();
        let customers = schema.table(&NullMonitor, "customers").unwrap().unwrap();
        let orders = orders(&ds);

        let columns = orders.columns(&NullMonitor).unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "customer_id"]);

        assert!(customers.columns_loaded());
        assert_eq!(customers.columns(&NullMonitor).unwrap().len(), 2);
        assert_eq!(provider.requests("columns"), 1);
    }

    #[test]
    fn test_cache_structure_warms_every_table() {
        let (ds, provider) = data_source(shop_snapshot());
        ds.cache_structure(&NullMonitor, CacheScope::ALL).unwrap();

        let schema = ds.schema("sales").unwrap().unwrap();
        for table in schema.tables(&NullMonitor).unwrap().iter() {
            assert!(table.columns_loaded());
            assert!(table.indexes_loaded());
            assert!(table.constraints_loaded());
            assert!(table.foreign_keys_loaded());
        }

        let scans = provider.requests("imported_keys");
        let orders = orders(&ds);
        orders.foreign_keys(&NullMonitor).unwrap();
        assert_eq!(provider.requests("imported_keys"), scans);
    }

    #[test]
    fn test_every_context_is_closed() {
        let (ds, provider) = data_source(shop_snapshot());
        let orders = orders(&ds);
        orders.columns(&NullMonitor).unwrap();
        orders.indexes(&NullMonitor).unwrap();
        orders.foreign_keys(&NullMonitor).unwrap();
        orders.references(&NullMonitor).unwrap();

        assert!(provider.opened() > 0);
        assert_eq!(provider.opened(), provider.closed());
    }
}
