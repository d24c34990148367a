//! Tests for read scoping of bound entity types.

use std::sync::Arc;

use serde_json::json;

use helios_multitenant::context::{unit_of_work, unit_of_work_sync, WithTenantOptions, WorkOrigin};
use helios_multitenant::policy::{ReadScope, UnfilteredReason};
use helios_multitenant::tenant::{TenantHandle, TenantId};
use helios_multitenant::types::{Entity, Record};
use helios_multitenant::{IsolationConfig, ScopeError, Tenancy, TenancyError};

use crate::common::*;

fn names(records: &[Record]) -> Vec<String> {
    let mut names: Vec<String> = records
        .iter()
        .filter_map(|r| r.field("name").and_then(|v| v.as_str()).map(String::from))
        .collect();
    names.sort();
    names
}

// ============================================================================
// Tenant Filtering
// ============================================================================

#[test]
fn test_reads_return_exactly_the_current_tenants_rows() {
    let tenancy = create_tenancy(RecordingSink::default());

    // Deterministic A/B interleavings of several sizes
    for n in [0usize, 1, 2, 7, 32] {
        let store = MemoryStore::new(Arc::new(tenancy.clone()));
        let mut expected_a = Vec::new();
        for i in 0..n {
            let owner = if (i * 7 + n) % 3 == 0 { "b" } else { "a" };
            store.seed([item(&format!("item-{i}"), owner)]);
            if owner == "a" {
                expected_a.push(format!("item-{i}"));
            }
        }
        expected_a.sort();

        unit_of_work_sync(WorkOrigin::interactive(), || {
            tenancy.with_tenant_sync(Some(tenant("a")), WithTenantOptions::new(), || {
                let visible = store.all("Item").unwrap();
                assert_eq!(names(&visible), expected_a, "n = {n}");
                assert!(
                    visible
                        .iter()
                        .all(|r| r.tenant_key("tenant_id") == Some(TenantId::new("a")))
                );
            });
        });
        assert_eq!(store.raw_len(), n);
    }
}

#[test]
fn test_numeric_foreign_keys_match() {
    let tenancy = create_tenancy(RecordingSink::default());
    let store = MemoryStore::new(Arc::new(tenancy.clone()));
    store.seed([
        Record::new("User").with_field("name", json!("bob")).with_field("company_id", json!(1)),
        Record::new("User").with_field("name", json!("eve")).with_field("company_id", json!(2)),
    ]);

    let acme = Company::new("1", "Acme");
    unit_of_work_sync(WorkOrigin::interactive(), || {
        tenancy.with_tenant_sync(Some(acme as TenantHandle), WithTenantOptions::new(), || {
            assert_eq!(names(&store.all("User").unwrap()), vec!["bob"]);
        });
    });
}

#[test]
fn test_find_hides_other_tenants_rows() {
    let tenancy = create_tenancy(RecordingSink::default());
    let store = MemoryStore::new(Arc::new(tenancy.clone()));
    let theirs = item("secret", "b");
    let id = theirs.id().to_string();
    store.seed([theirs]);

    unit_of_work_sync(WorkOrigin::interactive(), || {
        tenancy.with_tenant_sync(Some(tenant("a")), WithTenantOptions::new(), || {
            assert_eq!(store.find("Item", &id).unwrap(), None);
        });
        tenancy.with_tenant_sync(Some(tenant("b")), WithTenantOptions::new(), || {
            assert!(store.find("Item", &id).unwrap().is_some());
        });
    });
}

#[test]
fn test_extra_ids_return_union() {
    let tenancy = create_tenancy(RecordingSink::default());
    let store = MemoryStore::new(Arc::new(tenancy.clone()));
    store.seed([item("a1", "a"), item("b1", "b"), item("c1", "c"), item("a2", "a")]);

    unit_of_work_sync(WorkOrigin::interactive(), || {
        let options = WithTenantOptions::new().extra_tenant_ids(["b"]);
        tenancy.with_tenant_sync(Some(tenant("a")), options, || {
            assert_eq!(names(&store.all("Item").unwrap()), vec!["a1", "a2", "b1"]);

            let scope = tenancy.read_scope("Item").unwrap();
            let predicate = scope.filter().unwrap().to_sql(Some("items"), 1);
            assert_eq!(predicate.clause, "items.tenant_id IN ($1, $2)");
            assert_eq!(predicate.params, vec![TenantId::new("a"), TenantId::new("b")]);
        });

        // Outside the block only the active tenant's rows are visible again
        tenancy.with_tenant_sync(Some(tenant("a")), WithTenantOptions::new(), || {
            assert_eq!(names(&store.all("Item").unwrap()), vec!["a1", "a2"]);
        });
    });
}

#[test]
fn test_unbound_types_are_never_filtered() {
    let sink = RecordingSink::default();
    let tenancy = create_tenancy(sink.clone());
    let store = MemoryStore::new(Arc::new(tenancy.clone()));
    store.seed([Record::new("Plan").with_field("name", json!("gold"))]);

    unit_of_work_sync(WorkOrigin::background_job("billing"), || {
        assert_eq!(store.all("Plan").unwrap().len(), 1);
        assert_eq!(
            tenancy.read_scope("Plan").unwrap(),
            ReadScope::Unfiltered(UnfilteredReason::NotBound)
        );
    });
    assert!(sink.reports().is_empty());
}

// ============================================================================
// Unscoped Reads
// ============================================================================

#[test]
fn test_unscoped_interactive_read_is_tolerated_and_reported() {
    let sink = RecordingSink::default();
    let tenancy = create_tenancy(sink.clone());
    let store = MemoryStore::new(Arc::new(tenancy.clone()));
    store.seed([item("a1", "a"), item("b1", "b")]);

    unit_of_work_sync(WorkOrigin::request("req-9"), || {
        assert_eq!(store.all("Item").unwrap().len(), 2);
    });

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].entity_type, "Item");
    assert_eq!(reports[0].origin, WorkOrigin::request("req-9"));
    assert!(!reports[0].denied);
}

#[tokio::test]
async fn test_unscoped_background_read_is_denied() {
    let sink = RecordingSink::default();
    let tenancy = create_tenancy(sink.clone());
    let store = MemoryStore::new(Arc::new(tenancy.clone()));
    store.seed([item("a1", "a")]);

    let origin = WorkOrigin::background_job("exports").with_job_id("job-17");
    let err = unit_of_work(origin, async { store.all("Item") })
        .await
        .unwrap_err();

    assert!(err.is_unscoped_background_operation());
    assert!(matches!(
        err,
        TenancyError::Scope(ScopeError::UnscopedBackgroundOperation { ref queue, .. }) if queue == "exports"
    ));
    assert!(err.to_string().contains("exports"));

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].denied);
}

#[tokio::test]
async fn test_background_read_with_tenant_is_scoped() {
    let tenancy = create_tenancy(RecordingSink::default());
    let store = MemoryStore::new(Arc::new(tenancy.clone()));
    store.seed([item("a1", "a"), item("b1", "b")]);

    let visible = unit_of_work(WorkOrigin::background_job("exports"), async {
        tenancy
            .with_tenant(Some(tenant("b")), WithTenantOptions::new(), async {
                store.all("Item")
            })
            .await
    })
    .await
    .unwrap();

    assert_eq!(names(&visible), vec!["b1"]);
}

#[test]
fn test_broken_sink_never_changes_the_outcome() {
    let tenancy = Tenancy::builder()
        .with_config(IsolationConfig::for_testing())
        .with_sink(BrokenSink)
        .build();
    tenancy.bind(item_schema()).unwrap();

    unit_of_work_sync(WorkOrigin::interactive(), || {
        assert_eq!(
            tenancy.read_scope("Item").unwrap(),
            ReadScope::Unfiltered(UnfilteredReason::NoActiveTenant)
        );
    });

    let err = unit_of_work_sync(WorkOrigin::background_job("q"), || tenancy.read_scope("Item"))
        .unwrap_err();
    assert!(err.is_unscoped_background_operation());
}

#[test]
fn test_sampling_disabled_still_tolerates() {
    let sink = RecordingSink::default();
    let tenancy = Tenancy::builder()
        .with_config(IsolationConfig {
            unscoped_read_sample_every: 0,
            ..IsolationConfig::for_testing()
        })
        .with_sink(sink.clone())
        .build();
    tenancy.bind(item_schema()).unwrap();

    unit_of_work_sync(WorkOrigin::interactive(), || {
        for _ in 0..3 {
            assert!(tenancy.read_scope("Item").unwrap().filter().is_none());
        }
    });
    assert!(sink.reports().is_empty());
}
