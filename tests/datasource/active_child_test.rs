#[path = "../common/mod.rs"]
mod common;

#[cfg(test)]
mod tests {
    use super::common::*;
    use genmeta::cursor::names;
    use genmeta::prelude::*;
    use genmeta::sources::{Snapshot, SnapshotSource};
    use std::sync::Arc;

    const GET_ACTIVE: &str = "SELECT DATABASE()";

    fn catalogs_snapshot() -> Snapshot {
        let mut snapshot = shop_snapshot();
        snapshot.catalogs = vec![catalog_row("shop"), catalog_row("corp")];
        snapshot.schemas = vec![schema_row(Some("shop"), "sales")];
        for row in snapshot.tables.iter_mut() {
            row.set(names::TABLE_CAT, "shop");
        }
        snapshot
    }

    /// Data source that keeps a handle on its snapshot source.
    fn open(
        snapshot: Snapshot,
        params: DriverParams,
    ) -> (Arc<DataSource>, Arc<SnapshotSource>, Arc<CountingProvider>) {
        let source = Arc::new(SnapshotSource::new(snapshot));
        let provider = Arc::new(CountingProvider::new(source.clone()));
        let ds = DataSource::new(
            DataSourceConfig::new("shop").with_params(params),
            provider.clone(),
            Arc::new(GenericDialect),
        );
        ds.initialize(&NullMonitor).unwrap();
        (ds, source, provider)
    }

    fn switchable() -> DriverParams {
        DriverParams::new()
            .with("query-get-active-db", GET_ACTIVE)
            .with("query-set-active-db", "USE ?")
    }

    #[test]
    fn test_active_child_from_query() {
        let mut snapshot = catalogs_snapshot();
        snapshot.queries.insert(GET_ACTIVE.into(), Some("corp".into()));
        let (ds, _, provider) = open(snapshot, switchable());

        let active = ds.active_child(&NullMonitor).unwrap().unwrap();
        assert!(Arc::ptr_eq(&active, &ds.catalog("corp").unwrap().unwrap()));

        // Remembered until refresh
        let opened = provider.opened();
        let again = ds.active_child(&NullMonitor).unwrap().unwrap();
        assert!(Arc::ptr_eq(&active, &again));
        assert_eq!(provider.opened(), opened);
    }

    #[test]
    fn test_active_child_from_current_catalog() {
        let mut snapshot = catalogs_snapshot();
        snapshot.current_catalog = Some("shop".into());
        let (ds, _, _) = open(snapshot, DriverParams::new());

        let active = ds.active_child(&NullMonitor).unwrap().unwrap();
        assert_eq!(active.name(), "shop");
        assert_eq!(active.kind(), ContainerKind::Catalog);
    }

    #[test]
    fn test_failed_probe_yields_none() {
        // No recorded answer for the configured query
        let (ds, _, _) = open(catalogs_snapshot(), switchable());
        assert!(ds.active_child(&NullMonitor).unwrap().is_none());
    }

    #[test]
    fn test_unknown_active_name_yields_none() {
        let mut snapshot = catalogs_snapshot();
        snapshot.queries.insert(GET_ACTIVE.into(), Some("archive".into()));
        let (ds, _, _) = open(snapshot, switchable());
        assert!(ds.active_child(&NullMonitor).unwrap().is_none());
    }

    #[test]
    fn test_flat_source_has_no_active_child() {
        let snapshot = Snapshot {
            current_catalog: Some("shop".into()),
            tables: vec![table_row("", "orders", "TABLE")],
            ..Default::default()
        };
        let (ds, _, provider) = open(snapshot, DriverParams::new());
        assert!(ds.topology().unwrap().is_flat());

        let opened = provider.opened();
        assert!(ds.active_child(&NullMonitor).unwrap().is_none());
        assert_eq!(provider.opened(), opened);
    }

    #[test]
    fn test_set_active_child_runs_statement() {
        let mut snapshot = catalogs_snapshot();
        snapshot.queries.insert(GET_ACTIVE.into(), Some("shop".into()));
        let (ds, source, _) = open(snapshot, switchable());
        assert!(ds.supports_active_child_change());

        let corp = ds.catalog("corp").unwrap().unwrap();
        ds.set_active_child(&NullMonitor, &corp).unwrap();

        assert_eq!(source.executed(), vec!["USE corp".to_string()]);
        let active = ds.active_child(&NullMonitor).unwrap().unwrap();
        assert!(Arc::ptr_eq(&active, &corp));

        // Already active: nothing to run
        ds.set_active_child(&NullMonitor, &corp).unwrap();
        assert_eq!(source.executed().len(), 1);
    }

    #[test]
    fn test_set_active_child_without_statement() {
        let (ds, source, _) = open(catalogs_snapshot(), DriverParams::new());
        assert!(!ds.supports_active_child_change());

        let corp = ds.catalog("corp").unwrap().unwrap();
        let err = ds.set_active_child(&NullMonitor, &corp).unwrap_err();
        assert!(err.is_capability());
        assert!(source.executed().is_empty());
    }

    #[test]
    fn test_set_active_child_rejects_non_child() {
        let (ds, source, _) = open(catalogs_snapshot(), switchable());

        // A schema inside a catalog is not a direct child
        let shop = ds.catalog("shop").unwrap().unwrap();
        let sales = shop.schema_named(&NullMonitor, "sales").unwrap().unwrap();
        let err = ds.set_active_child(&NullMonitor, &sales).unwrap_err();

        assert!(err.is_capability());
        assert!(err.to_string().contains("sales"));
        assert!(source.executed().is_empty());
    }

    #[test]
    fn test_refresh_forgets_active_child() {
        let mut snapshot = catalogs_snapshot();
        snapshot.queries.insert(GET_ACTIVE.into(), Some("shop".into()));
        let (ds, _, _) = open(snapshot, switchable());

        let before = ds.active_child(&NullMonitor).unwrap().unwrap();
        ds.refresh(&NullMonitor).unwrap();
        let after = ds.active_child(&NullMonitor).unwrap().unwrap();

        assert_eq!(after.name(), "shop");
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
