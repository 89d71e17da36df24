// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cabinet create/join protocol against the in-memory store.

use chrono::Utc;
use mandato360::db::{DocumentStore, MemoryStore};
use mandato360::error::AppError;
use mandato360::models::cabinet::{BLUE, MAGENTA, TEAL};
use mandato360::onboarding::{Onboarding, OnboardingDriver, Screen};
use mandato360::services::membership::JOIN_CODE_LEN;
use mandato360::services::{MembershipService, MemoryLoginMarker, RoleSelection};
use std::sync::Arc;

mod common;
use common::{cabinet, user};

fn join(role: &str, code: &str) -> RoleSelection {
    RoleSelection {
        role: role.to_string(),
        team_code: Some(code.to_string()),
        create_new: false,
        primary_color: TEAL,
        secondary_color: BLUE,
    }
}

fn create(role: &str, code: Option<&str>) -> RoleSelection {
    RoleSelection {
        role: role.to_string(),
        team_code: code.map(str::to_string),
        create_new: true,
        primary_color: MAGENTA,
        secondary_color: TEAL,
    }
}

#[tokio::test]
async fn joining_twice_lists_member_once() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(user("u1", "Ana"));
    store.insert_cabinet(cabinet("ABC123", "Prefeito", &["owner"]));
    let service = MembershipService::new(store.clone());

    service
        .commit("u1", &join("Assessor Parlamentar", "ABC123"), Utc::now())
        .await
        .unwrap();
    service
        .commit("u1", &join("Assessor Parlamentar", "abc123"), Utc::now())
        .await
        .unwrap();

    let stored = store.get_cabinet("ABC123").await.unwrap().unwrap();
    assert_eq!(stored.members, vec!["owner".to_string(), "u1".to_string()]);

    let linked = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(linked.cabinet_code.as_deref(), Some("ABC123"));
    assert_eq!(linked.role.as_deref(), Some("Assessor Parlamentar"));
}

#[tokio::test]
async fn join_returns_cabinet_identity() {
    let store = Arc::new(MemoryStore::new());
    store.insert_cabinet(cabinet("T1", "Senador", &[]));
    let service = MembershipService::new(store.clone());

    let joined = service
        .commit("u1", &join("Outros", "T1"), Utc::now())
        .await
        .unwrap();

    // Identity comes from the cabinet, not from the joiner's form
    assert_eq!(joined.role, "Senador");
    assert_eq!(joined.primary_color, TEAL);
    assert_eq!(joined.members, vec!["u1".to_string()]);
}

#[tokio::test]
async fn joining_unknown_code_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(user("u1", "Ana"));
    let service = MembershipService::new(store.clone());

    let err = service
        .commit("u1", &join("Vereador", "NOPE42"), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CabinetNotFound(code) if code == "NOPE42"));
    assert_eq!(store.write_count(), 0);
    assert!(store.get_cabinet("NOPE42").await.unwrap().is_none());
}

#[tokio::test]
async fn empty_role_makes_no_store_calls() {
    let store = Arc::new(MemoryStore::new());
    store.insert_cabinet(cabinet("ABC123", "Prefeito", &[]));
    let service = MembershipService::new(store.clone());

    let err = service
        .commit("u1", &join("  ", "ABC123"), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn create_with_blank_code_generates_one() {
    let store = Arc::new(MemoryStore::new());
    let service = MembershipService::new(store.clone());

    let created = service
        .commit("u1", &create("Deputado Federal", Some("")), Utc::now())
        .await
        .unwrap();

    assert_eq!(created.code.len(), JOIN_CODE_LEN);
    let stored = store.get_cabinet(&created.code).await.unwrap().unwrap();
    assert_eq!(stored.role, "Deputado Federal");
    assert_eq!(stored.primary_color, MAGENTA);
    assert_eq!(stored.members, vec!["u1".to_string()]);
}

#[tokio::test]
async fn recreating_existing_code_joins_it() {
    let store = Arc::new(MemoryStore::new());
    store.insert_cabinet(cabinet("GAB-01", "Vereador", &["u0"]));
    let service = MembershipService::new(store.clone());

    let joined = service
        .commit("u1", &create("Prefeito", Some("gab-01")), Utc::now())
        .await
        .unwrap();
    assert_eq!(joined.role, "Vereador");
    assert_eq!(joined.primary_color, TEAL);

    let stored = store.get_cabinet("GAB-01").await.unwrap().unwrap();
    assert_eq!(stored.role, "Vereador");
    assert_eq!(stored.primary_color, TEAL);
    assert_eq!(stored.secondary_color, BLUE);
    assert_eq!(stored.members, vec!["u0".to_string(), "u1".to_string()]);

    // The joining user's own role is still recorded on their profile
    let u1 = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(u1.role.as_deref(), Some("Prefeito"));
    assert_eq!(u1.cabinet_code.as_deref(), Some("GAB-01"));
}

#[tokio::test]
async fn cabinet_is_created_only_by_first_creator() {
    let store = Arc::new(MemoryStore::new());
    let service = MembershipService::new(store.clone());

    let first = RoleSelection {
        role: "Prefeito".to_string(),
        team_code: Some("ABC123".to_string()),
        create_new: true,
        primary_color: TEAL,
        secondary_color: BLUE,
    };
    let second = RoleSelection {
        role: "Senador".to_string(),
        team_code: Some("abc123".to_string()),
        create_new: true,
        primary_color: MAGENTA,
        secondary_color: TEAL,
    };

    service.commit("u1", &first, Utc::now()).await.unwrap();
    let seen_by_u2 = service.commit("u2", &second, Utc::now()).await.unwrap();
    // Repeating the second create changes nothing
    service.commit("u2", &second, Utc::now()).await.unwrap();

    assert_eq!(seen_by_u2.role, "Prefeito");
    assert_eq!(seen_by_u2.primary_color, TEAL);

    let stored = store.get_cabinet("ABC123").await.unwrap().unwrap();
    assert_eq!(stored.role, "Prefeito");
    assert_eq!(stored.primary_color, TEAL);
    assert_eq!(stored.secondary_color, BLUE);
    assert_eq!(stored.members, vec!["u1".to_string(), "u2".to_string()]);
}

#[tokio::test]
async fn short_codes_are_accepted() {
    let store = Arc::new(MemoryStore::new());
    store.insert_cabinet(cabinet("T1", "Mayor", &[]));
    let service = MembershipService::new(store.clone());

    let joined = service
        .commit("u1", &join("Outros", "t1"), Utc::now())
        .await
        .unwrap();

    assert_eq!(joined.code, "T1");
    assert_eq!(joined.role, "Mayor");
}

#[tokio::test]
async fn concurrent_joins_lose_no_members() {
    let store = Arc::new(MemoryStore::new());
    store.insert_cabinet(cabinet("TEAM", "Prefeito", &[]));
    let service = MembershipService::new(store.clone());

    let joins = (0..20).map(|i| {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .commit(&format!("u{}", i), &join("Outros", "TEAM"), Utc::now())
                .await
        })
    });

    for handle in joins.collect::<Vec<_>>() {
        handle.await.unwrap().unwrap();
    }

    let stored = store.get_cabinet("TEAM").await.unwrap().unwrap();
    assert_eq!(stored.members.len(), 20);
    for i in 0..20 {
        assert!(stored.members.contains(&format!("u{}", i)));
    }
}

#[tokio::test]
async fn write_failure_is_surfaced() {
    let store = Arc::new(MemoryStore::new());
    store.insert_cabinet(cabinet("T1", "Senador", &[]));
    store.set_fail_writes(true);
    let service = MembershipService::new(store.clone());

    let err = service
        .commit("u1", &join("Outros", "T1"), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::StoreWrite(_)));
    assert!(store.get_user("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn half_finished_join_is_repaired_by_resubmitting() {
    let store = Arc::new(MemoryStore::new());
    store.insert_cabinet(cabinet("T1", "Senador", &[]));
    let service = MembershipService::new(store.clone());

    // Cabinet lists the user but the user record was never linked
    store.add_cabinet_member("T1", "u1").await.unwrap();
    assert!(store.get_user("u1").await.unwrap().is_none());

    service
        .commit("u1", &join("Outros", "T1"), Utc::now())
        .await
        .unwrap();

    let stored = store.get_cabinet("T1").await.unwrap().unwrap();
    assert_eq!(stored.members, vec!["u1".to_string()]);
    let linked = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(linked.cabinet_code.as_deref(), Some("T1"));
}

#[tokio::test]
async fn committed_membership_moves_session_to_dashboard() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(user("u1", "Ana"));
    store.insert_cabinet(cabinet("T1", "Senador", &[]));
    let marker = Arc::new(MemoryLoginMarker::new(Some(Utc::now())));
    let driver = OnboardingDriver::new(store.clone(), marker);

    let out = driver
        .launch(Onboarding::new(), Some("u1".to_string()))
        .await;
    assert_eq!(out.machine.screen(), Screen::RoleSelection);

    let out = driver
        .submit_role_selection(out.machine, &join("Outros", "t1"))
        .await
        .unwrap();

    assert_eq!(out.machine.screen(), Screen::Dashboard);
    assert_eq!(out.machine.session().role, "Senador");
    assert_eq!(out.machine.session().generated_team_code, "T1");
}

#[tokio::test]
async fn failed_membership_leaves_session_on_role_selection() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(user("u1", "Ana"));
    let marker = Arc::new(MemoryLoginMarker::new(Some(Utc::now())));
    let driver = OnboardingDriver::new(store.clone(), marker);

    let out = driver
        .launch(Onboarding::new(), Some("u1".to_string()))
        .await;
    let machine = out.machine;

    let err = driver
        .submit_role_selection(machine.clone(), &join("Outros", "MISSING"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CabinetNotFound(_)));
    assert!(!err.is_store_failure());
    assert_eq!(machine.screen(), Screen::RoleSelection);

    store.insert_cabinet(cabinet("T1", "Prefeito", &[]));
    store.set_fail_writes(true);
    let err = driver
        .submit_role_selection(machine.clone(), &join("Outros", "T1"))
        .await
        .unwrap_err();
    assert!(err.is_store_failure());
    assert!(store.get_cabinet("T1").await.unwrap().unwrap().members.is_empty());
}
