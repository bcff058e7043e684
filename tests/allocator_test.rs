//! Thompson allocation behaviour over live experiments.

mod common;

use common::{seeded_service, versions_with_counts};
use promptbandit::DomainError;
use std::collections::HashMap;
use uuid::Uuid;

#[tokio::test]
async fn test_allocation_favours_the_stronger_posterior() {
    let service = seeded_service(21);
    let agent = Uuid::new_v4();
    let versions = versions_with_counts(&service, agent, &[(60, 100), (20, 100)]).await;

    let mut served: HashMap<Uuid, u32> = HashMap::new();
    for _ in 0..500 {
        let id = service.select_version(agent).await.unwrap();
        *served.entry(id).or_default() += 1;
    }

    let strong = served.get(&versions[0].version_id).copied().unwrap_or(0);
    let weak = served.get(&versions[1].version_id).copied().unwrap_or(0);
    assert_eq!(strong + weak, 500);
    assert!(strong > 490, "strong arm served {strong} of 500");
}

#[tokio::test]
async fn test_uninformed_arms_share_traffic() {
    let service = seeded_service(22);
    let agent = Uuid::new_v4();
    let versions = versions_with_counts(&service, agent, &[(0, 0), (0, 0)]).await;

    let mut first = 0;
    for _ in 0..2_000 {
        if service.select_version(agent).await.unwrap() == versions[0].version_id {
            first += 1;
        }
    }
    assert!((800..1_200).contains(&first), "first arm served {first} of 2000");
}

#[tokio::test]
async fn test_single_active_version_is_always_served() {
    let service = seeded_service(23);
    let agent = Uuid::new_v4();
    let versions = versions_with_counts(&service, agent, &[(0, 10), (9, 10)]).await;
    service.pause(versions[1].version_id).await.unwrap();

    for _ in 0..50 {
        assert_eq!(
            service.select_version(agent).await.unwrap(),
            versions[0].version_id
        );
    }
}

#[tokio::test]
async fn test_no_active_version() {
    let service = seeded_service(24);
    let agent = Uuid::new_v4();
    let versions = versions_with_counts(&service, agent, &[(1, 1)]).await;
    service.pause(versions[0].version_id).await.unwrap();

    assert!(matches!(
        service.select_version(agent).await.unwrap_err(),
        DomainError::NoActiveVersion(id) if id == agent
    ));
}

#[tokio::test]
async fn test_seeded_allocation_is_reproducible() {
    let agent_a = Uuid::new_v4();
    let agent_b = Uuid::new_v4();
    let first = seeded_service(25);
    let second = seeded_service(25);
    let a = versions_with_counts(&first, agent_a, &[(4, 10), (5, 10), (6, 10)]).await;
    let b = versions_with_counts(&second, agent_b, &[(4, 10), (5, 10), (6, 10)]).await;

    for _ in 0..100 {
        let pick_a = first.select_version(agent_a).await.unwrap();
        let pick_b = second.select_version(agent_b).await.unwrap();
        let index_a = a.iter().position(|v| v.version_id == pick_a);
        let index_b = b.iter().position(|v| v.version_id == pick_b);
        assert_eq!(index_a, index_b);
    }
}
