//! Integration tests for bed allocation.
//!
//! These tests validate:
//! 1. Capacity is never over- or under-subscribed under concurrency
//! 2. Fallback follows the fixed category order and skips the preferred one
//! 3. Exhaustion leaves every pool untouched
//! 4. Occupancy reports stay consistent with live assignments

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use ward_admission::core::{
    AcquisitionTimeouts, AdmissionError, AuditAction, BedCategory, FirstSelection,
    InMemoryAuditSink, Patient, Protocol, RandomSelection, ResourceManager, SelectionPolicy,
    Shift, StaffRoster,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn roster() -> StaffRoster {
    StaffRoster {
        physicians: BTreeMap::from([
            (Shift::Morning, vec!["Dr. Esquivel".to_string(), "Dr. Uriostegui".to_string()]),
            (Shift::Evening, vec!["Dr. Connor".to_string(), "Dr. Sanchez".to_string()]),
            (Shift::Night, vec!["Dr. Gamez".to_string(), "Dr. Herrera".to_string()]),
        ]),
        residents: vec!["Resident Garcia".to_string(), "Resident Lerin".to_string()],
    }
}

fn uniform(n: u32) -> BTreeMap<BedCategory, u32> {
    BedCategory::ALL.into_iter().map(|c| (c, n)).collect()
}

fn timeouts() -> AcquisitionTimeouts {
    AcquisitionTimeouts {
        primary: Duration::from_millis(40),
        secondary: Duration::from_millis(15),
    }
}

fn manager_with(
    capacities: &BTreeMap<BedCategory, u32>,
    selection: Arc<dyn SelectionPolicy>,
) -> Arc<ResourceManager> {
    Arc::new(
        ResourceManager::new(capacities, roster(), timeouts(), selection)
            .unwrap()
            .with_audit(Box::new(InMemoryAuditSink::new(1024))),
    )
}

fn patient(id: u32, protocol: Protocol) -> Patient {
    let mut p = Patient::new(id, format!("Patient {id}"), 30, vec![], Shift::Morning);
    p.protocol = protocol;
    p
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_protocol_preferred_categories() {
    let manager = manager_with(&uniform(2), Arc::new(FirstSelection));

    let mut fetal = patient(1, Protocol::FetalLoss);
    let mut critical = patient(2, Protocol::MaternalCritical);
    let mut routine = patient(3, Protocol::Routine);

    let a = manager.assign_resources(&mut fetal).await.unwrap();
    let b = manager.assign_resources(&mut critical).await.unwrap();
    let c = manager.assign_resources(&mut routine).await.unwrap();

    assert_eq!(a.category(), BedCategory::Bereavement);
    assert_eq!(b.category(), BedCategory::IntensiveCare);
    assert_eq!(c.category(), BedCategory::Obstetric);
    assert_eq!(fetal.physician.as_deref(), Some("Dr. Esquivel"));
    assert_eq!(manager.occupancy_report().total_held(), 3);

    a.release().unwrap();
    b.release().unwrap();
    c.release().unwrap();
    assert_eq!(manager.occupancy_report().total_held(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fallback_follows_enumeration_order() {
    let manager = manager_with(&uniform(1), Arc::new(FirstSelection));

    // Saturate OBSTETRIC (preferred) and GYNECOLOGICAL (first alternate).
    let mut holder_ob = patient(1, Protocol::Routine);
    let _ob = manager.assign_resources(&mut holder_ob).await.unwrap();
    let mut holder_gyn = patient(2, Protocol::Routine);
    let _gyn = manager.assign_resources(&mut holder_gyn).await.unwrap();
    assert_eq!(holder_gyn.bed, Some(BedCategory::Gynecological));

    let started = Instant::now();
    let mut late = patient(3, Protocol::Routine);
    let assignment = manager.assign_resources(&mut late).await.unwrap();

    assert_eq!(assignment.category(), BedCategory::IntensiveCare);
    assert_eq!(late.bed, Some(BedCategory::IntensiveCare));
    assert!(started.elapsed() >= timeouts().primary + timeouts().secondary);

    let fallbacks: Vec<_> = manager
        .audit_events()
        .into_iter()
        .filter(|e| e.patient_id == Some(3))
        .map(|e| (e.action, e.category))
        .collect();
    assert_eq!(
        fallbacks,
        vec![
            (AuditAction::Fallback, Some(BedCategory::Obstetric)),
            (AuditAction::Assign, Some(BedCategory::IntensiveCare)),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fallback_never_retries_preferred() {
    let manager = manager_with(&uniform(1), Arc::new(FirstSelection));

    let mut holder = patient(1, Protocol::FetalLoss);
    let held = manager.assign_resources(&mut holder).await.unwrap();
    assert_eq!(held.category(), BedCategory::Bereavement);

    // Preferred BEREAVEMENT is full; the first alternate in order is OBSTETRIC.
    let mut second = patient(2, Protocol::FetalLoss);
    let assignment = manager.assign_resources(&mut second).await.unwrap();
    assert_eq!(assignment.category(), BedCategory::Obstetric);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exhaustion_leaves_pools_untouched() {
    let manager = manager_with(&uniform(1), Arc::new(FirstSelection));

    let mut holders = Vec::new();
    for (id, protocol) in [
        (1, Protocol::Routine),
        (2, Protocol::MaternalCritical),
        (3, Protocol::FetalLoss),
    ] {
        let mut p = patient(id, protocol);
        holders.push(manager.assign_resources(&mut p).await.unwrap());
    }
    let mut gyn = patient(4, Protocol::Routine);
    holders.push(manager.assign_resources(&mut gyn).await.unwrap());
    assert_eq!(gyn.bed, Some(BedCategory::Gynecological));

    let before = manager.occupancy_report();
    let mut unlucky = patient(5, Protocol::Routine);
    let err = manager.assign_resources(&mut unlucky).await.unwrap_err();

    assert_eq!(
        err,
        AdmissionError::ResourceExhausted {
            patient: "Patient 5".to_string()
        }
    );
    assert_eq!(unlucky.bed, None);
    assert_eq!(unlucky.physician, None);
    assert_eq!(manager.occupancy_report(), before);
    for category in BedCategory::ALL {
        assert_eq!(manager.pool_held(category).unwrap(), 1);
    }
    assert!(manager
        .audit_events()
        .iter()
        .any(|e| e.patient_id == Some(5) && e.action == AuditAction::Exhausted));

    drop(holders);
    assert_eq!(manager.occupancy_report().total_held(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_four_routine_patients_fill_four_single_beds() {
    for selection in [
        Arc::new(FirstSelection) as Arc<dyn SelectionPolicy>,
        Arc::new(RandomSelection),
    ] {
        let manager = manager_with(&uniform(1), selection);

        let results = join_all((1..=4).map(|id| {
            let manager = Arc::clone(&manager);
            async move {
                let mut p = patient(id, Protocol::Routine);
                let assignment = manager.assign_resources(&mut p).await;
                (p, assignment)
            }
        }))
        .await;

        let mut categories = BTreeSet::new();
        let mut held = Vec::new();
        for (p, assignment) in results {
            let assignment = assignment.expect("every routine patient gets a bed");
            assert_eq!(p.bed, Some(assignment.category()));
            categories.insert(assignment.category());
            held.push(assignment);
        }
        assert_eq!(categories.len(), 4, "no two patients share one bed");
        assert_eq!(manager.occupancy_report().total_held(), 4);

        for assignment in held {
            assignment.release().unwrap();
        }
        assert_eq!(manager.occupancy_report().total_held(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_churn_respects_capacity() {
    let capacities = BTreeMap::from([
        (BedCategory::Obstetric, 2),
        (BedCategory::Gynecological, 1),
        (BedCategory::IntensiveCare, 1),
        (BedCategory::Bereavement, 1),
    ]);
    let manager = manager_with(&capacities, Arc::new(RandomSelection));
    let done = Arc::new(AtomicBool::new(false));

    let sampler = {
        let manager = Arc::clone(&manager);
        let done = Arc::clone(&done);
        tokio::spawn(async move {
            let mut samples = 0;
            while !done.load(Ordering::Acquire) {
                let report = manager.occupancy_report();
                for entry in &report.categories {
                    assert!(entry.held <= entry.capacity);
                    assert_eq!(entry.held + entry.remaining, entry.capacity);
                    assert!(manager.pool_held(entry.category).unwrap() <= entry.capacity);
                }
                samples += 1;
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            samples
        })
    };

    let protocols = [Protocol::Routine, Protocol::MaternalCritical, Protocol::FetalLoss];
    let workers = join_all((0..24u32).map(|id| {
        let manager = Arc::clone(&manager);
        let protocol = protocols[(id % 3) as usize];
        async move {
            let mut granted = 0;
            for _ in 0..3 {
                let mut p = patient(id, protocol);
                if let Ok(assignment) = manager.assign_resources(&mut p).await {
                    granted += 1;
                    tokio::time::sleep(Duration::from_millis(3)).await;
                    assignment.release().unwrap();
                }
            }
            granted
        }
    }))
    .await;

    done.store(true, Ordering::Release);
    let samples = sampler.await.unwrap();
    assert!(samples > 0);
    assert!(workers.iter().sum::<u32>() > 0);

    let report = manager.occupancy_report();
    assert_eq!(report.total_held(), 0);
    for category in BedCategory::ALL {
        assert_eq!(manager.pool_held(category).unwrap(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_double_release_is_reported() {
    let manager = manager_with(&uniform(1), Arc::new(FirstSelection));
    let mut p = patient(1, Protocol::Routine);
    let assignment = manager.assign_resources(&mut p).await.unwrap();
    let category = assignment.category();
    assignment.release().unwrap();

    let err = manager.release_resource(category).unwrap_err();
    assert!(matches!(err, AdmissionError::InvariantViolation(_)));
    assert_eq!(manager.occupancy_report().held(category), 0);
    assert_eq!(manager.pool_held(category).unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pool_counters_track_occupancy_report() {
    let manager = manager_with(&uniform(1), Arc::new(FirstSelection));

    let mut first = patient(1, Protocol::Routine);
    let a = manager.assign_resources(&mut first).await.unwrap();
    let mut second = patient(2, Protocol::Routine);
    let b = manager.assign_resources(&mut second).await.unwrap();

    // A single OBSTETRIC bed can only be held once.
    assert_eq!(a.category(), BedCategory::Obstetric);
    assert_eq!(b.category(), BedCategory::Gynecological);
    let report = manager.occupancy_report();
    for category in BedCategory::ALL {
        assert_eq!(manager.pool_held(category).unwrap(), report.held(category));
        assert!(report.held(category) <= report.get(category).unwrap().capacity);
    }

    a.release().unwrap();
    b.release().unwrap();
    let report = manager.occupancy_report();
    for category in BedCategory::ALL {
        assert_eq!(manager.pool_held(category).unwrap(), 0);
        assert_eq!(report.held(category), 0);
    }
}

#[test]
fn test_runtime_shutdown_not_held_by_parked_waiter() {
    let manager = Arc::new(
        ResourceManager::new(
            &uniform(1),
            roster(),
            AcquisitionTimeouts {
                primary: Duration::from_secs(10),
                secondary: Duration::from_secs(10),
            },
            Arc::new(FirstSelection),
        )
        .unwrap(),
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let holder = runtime.block_on({
        let manager = Arc::clone(&manager);
        async move {
            let mut p = patient(1, Protocol::Routine);
            manager.assign_resources(&mut p).await.unwrap()
        }
    });
    let waiter = runtime.spawn({
        let manager = Arc::clone(&manager);
        async move {
            let mut p = patient(2, Protocol::Routine);
            manager.assign_resources(&mut p).await.map(|a| a.category())
        }
    });
    std::thread::sleep(Duration::from_millis(50));
    waiter.abort();

    let started = Instant::now();
    runtime.shutdown_timeout(Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_secs(2));

    // The parked waiter still owns nothing committed.
    assert_eq!(manager.occupancy_report().total_held(), 1);
    holder.release().unwrap();
    assert_eq!(manager.occupancy_report().total_held(), 0);
}
