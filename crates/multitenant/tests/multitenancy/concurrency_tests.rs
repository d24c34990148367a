//! Tests that concurrent units of work never observe each other's tenant.

use std::sync::Arc;

use tokio::sync::Barrier;

use helios_multitenant::context::{self, unit_of_work, WithTenantOptions, WorkOrigin};

use crate::common::*;

fn current() -> Option<String> {
    context::current_tenant_id().map(|id| id.as_str().to_string())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_units_of_work_are_isolated() {
    const UNITS: usize = 16;
    let tenancy = create_tenancy(RecordingSink::default());
    let barrier = Arc::new(Barrier::new(UNITS));

    let mut handles = Vec::new();
    for n in 0..UNITS {
        let tenancy = tenancy.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(unit_of_work(
            WorkOrigin::request(format!("req-{n}")),
            async move {
                let id = format!("tenant-{n}");
                tenancy
                    .with_tenant(Some(tenant(&id)), WithTenantOptions::new(), async {
                        barrier.wait().await;
                        for _ in 0..50 {
                            assert_eq!(current().as_deref(), Some(id.as_str()));
                            tokio::task::yield_now().await;
                        }
                    })
                    .await;
                assert_eq!(current(), None);
            },
        )));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads_see_only_their_tenant() {
    let tenancy = create_tenancy(RecordingSink::default());
    let store = Arc::new(MemoryStore::new(Arc::new(tenancy.clone())));
    for n in 0..8 {
        store.seed((0..5).map(|i| item(&format!("{n}-{i}"), &format!("t{n}"))));
    }

    let mut handles = Vec::new();
    for n in 0..8 {
        let tenancy = tenancy.clone();
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(unit_of_work(WorkOrigin::interactive(), async move {
            let own = format!("t{n}");
            tenancy
                .with_tenant(Some(tenant(&own)), WithTenantOptions::new(), async {
                    for _ in 0..20 {
                        let rows = store.all("Item").unwrap();
                        assert_eq!(rows.len(), 5);
                        tokio::task::yield_now().await;
                    }
                })
                .await;
        })));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_joined_blocks_in_one_task_are_isolated() {
    let tenancy = create_tenancy(RecordingSink::default());

    unit_of_work(WorkOrigin::request("req-join"), async {
        tenancy.activate_tenant(tenant("outer")).unwrap();

        let left = tenancy.with_tenant(Some(tenant("a")), WithTenantOptions::new(), async {
            for _ in 0..10 {
                assert_eq!(current().as_deref(), Some("a"));
                tokio::task::yield_now().await;
            }
        });
        let right = tenancy.with_tenant(Some(tenant("b")), WithTenantOptions::new(), async {
            for _ in 0..10 {
                assert_eq!(current().as_deref(), Some("b"));
                tokio::task::yield_now().await;
            }
        });
        let outer = async {
            for _ in 0..10 {
                assert_eq!(current().as_deref(), Some("outer"));
                tokio::task::yield_now().await;
            }
        };

        tokio::join!(left, right, outer);
        assert_eq!(current().as_deref(), Some("outer"));
    })
    .await;
}

#[tokio::test]
async fn test_spawned_tasks_do_not_inherit_tenant() {
    let tenancy = create_tenancy(RecordingSink::default());

    unit_of_work(WorkOrigin::interactive(), async {
        tenancy
            .with_tenant(Some(tenant("a")), WithTenantOptions::new(), async {
                let child = tokio::spawn(async { context::current_tenant_id() });
                assert_eq!(child.await.unwrap(), None);

                // Explicit hand-off
                let tenancy = tenancy.clone();
                let handed = context::current_tenant();
                let child = tokio::spawn(unit_of_work(WorkOrigin::interactive(), async move {
                    tenancy
                        .with_tenant(handed, WithTenantOptions::new(), async { current() })
                        .await
                }));
                assert_eq!(child.await.unwrap().as_deref(), Some("a"));
            })
            .await;
    })
    .await;
}

#[tokio::test(flavor = "current_thread")]
async fn test_activation_outside_unit_of_work_cannot_leak_to_sibling_tasks() {
    let tenancy = create_tenancy(RecordingSink::default());
    let (activated_tx, activated_rx) = tokio::sync::oneshot::channel();

    // Both tasks run on this one worker thread
    let writer = {
        let tenancy = tenancy.clone();
        tokio::spawn(async move {
            let result = tenancy.activate_tenant(tenant("a"));
            activated_tx.send(()).unwrap();
            tokio::task::yield_now().await;
            result
        })
    };
    let reader = tokio::spawn(async move {
        activated_rx.await.unwrap();
        current()
    });

    let err = writer.await.unwrap().unwrap_err();
    assert!(err.is_detached_context());
    assert_eq!(reader.await.unwrap(), None);
    assert_eq!(current(), None);

    assert!(tenancy.clear_current_tenant().unwrap_err().is_detached_context());

    // The same call inside a unit of work is fine
    unit_of_work(WorkOrigin::interactive(), async {
        tenancy.activate_tenant(tenant("a")).unwrap();
        assert_eq!(current().as_deref(), Some("a"));
    })
    .await;
    assert_eq!(current(), None);
}

#[test]
fn test_threads_outside_units_of_work_are_isolated() {
    let tenancy = create_tenancy(RecordingSink::default());

    let threads: Vec<_> = (0..4)
        .map(|n| {
            let tenancy = tenancy.clone();
            std::thread::spawn(move || {
                let id = format!("thread-{n}");
                tenancy.activate_tenant(tenant(&id)).unwrap();
                for _ in 0..100 {
                    assert_eq!(current().as_deref(), Some(id.as_str()));
                    std::thread::yield_now();
                }
                context::reset();
                assert_eq!(current(), None);
            })
        })
        .collect();

    for thread in threads {
        thread.join().unwrap();
    }
}
