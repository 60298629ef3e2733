//! Shared helpers for the HTTP integration tests: an in-memory plan store
//! and constructors for resolvers pointed at a stub completion server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use warp::{Filter, Rejection, Reply};

use fitplan_backend::api;
use fitplan_backend::coach::{PlanResolver, PlanSource};
use fitplan_backend::config::{PersistencePolicy, DEFAULT_ALLOWED_ORIGINS};
use fitplan_backend::models::UserProfile;
use fitplan_backend::openai_client::OpenAiClient;
use fitplan_backend::storage::{PlanStore, Storage};

pub const TEST_API_KEY: &str = "sk-test";

/// Plan store that mirrors the Postgres tables in memory.
pub struct MemoryStore {
    pub users: Mutex<HashMap<String, UserProfile>>,
    pub plans: Mutex<Vec<(String, String)>>,
    pub write_calls: AtomicUsize,
    pub reachable: AtomicBool,
    pub fail_user_upsert: AtomicBool,
    pub fail_plan_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(HashMap::new()),
            plans: Mutex::new(Vec::new()),
            write_calls: AtomicUsize::new(0),
            reachable: AtomicBool::new(true),
            fail_user_upsert: AtomicBool::new(false),
            fail_plan_insert: AtomicBool::new(false),
        })
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn plan_count(&self) -> usize {
        self.plans.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn apply_upsert(users: &mut HashMap<String, UserProfile>, profile: &UserProfile) {
        users
            .entry(profile.user_id.clone())
            .and_modify(|existing| {
                existing.name = profile.name.clone();
                existing.age = profile.age;
                existing.weight = profile.weight;
                existing.target_weight = profile.target_weight;
                existing.activity_level = profile.activity_level.clone();
                existing.pledge_days = profile.pledge_days;
            })
            .or_insert_with(|| profile.clone());
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            anyhow::bail!("connection refused")
        }
    }

    async fn ensure_schema(&self) {}

    async fn upsert_user(&self, profile: &UserProfile) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_user_upsert.load(Ordering::SeqCst) {
            anyhow::bail!("users table is locked");
        }
        Self::apply_upsert(&mut self.users.lock().unwrap(), profile);
        Ok(())
    }

    async fn insert_plan(&self, user_id: &str, plan_json: &str) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_plan_insert.load(Ordering::SeqCst) {
            anyhow::bail!("fitness_plans table is locked");
        }
        if !self.users.lock().unwrap().contains_key(user_id) {
            anyhow::bail!("foreign key violation: unknown user {}", user_id);
        }
        self.plans
            .lock()
            .unwrap()
            .push((user_id.to_string(), plan_json.to_string()));
        Ok(())
    }

    async fn save_plan(&self, profile: &UserProfile, plan_json: &str) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_user_upsert.load(Ordering::SeqCst) || self.fail_plan_insert.load(Ordering::SeqCst) {
            anyhow::bail!("transaction rolled back");
        }
        let mut users = self.users.lock().unwrap();
        Self::apply_upsert(&mut users, profile);
        self.plans
            .lock()
            .unwrap()
            .push((profile.user_id.clone(), plan_json.to_string()));
        Ok(())
    }
}

pub fn mock_resolver(storage: Storage) -> Arc<PlanResolver> {
    Arc::new(PlanResolver::new(
        PlanSource::Mock,
        Arc::new(storage),
        PersistencePolicy::BestEffort,
    ))
}

pub fn live_resolver(base_url: &str, storage: Storage, policy: PersistencePolicy) -> Arc<PlanResolver> {
    live_resolver_with_timeout(base_url, storage, policy, Duration::from_secs(10))
}

pub fn live_resolver_with_timeout(
    base_url: &str,
    storage: Storage,
    policy: PersistencePolicy,
    timeout: Duration,
) -> Arc<PlanResolver> {
    let client = OpenAiClient::new(base_url, TEST_API_KEY, "gpt-4o-mini", timeout)
        .expect("failed to build completion client");
    Arc::new(PlanResolver::new(PlanSource::Live(client), Arc::new(storage), policy))
}

pub fn app(
    resolver: Arc<PlanResolver>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone + 'static {
    let origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect();
    api::service(resolver, CancellationToken::new(), &origins)
}

pub fn sample_profile(user_id: &str) -> Value {
    json!({
        "userId": user_id,
        "name": "Jordan",
        "selectedGoals": ["Lose Weight", "Build Muscle"],
        "gender": "male",
        "age": 29,
        "height": 180,
        "weight": 88,
        "targetWeight": 80,
        "weeklyRate": "0.5kg",
        "habits": ["late snacks"],
        "activityLevel": "moderately active",
        "barriers": ["time", "stress"],
        "pledgeDays": 5
    })
}

pub fn completion_with(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

pub const PLAN_JSON: &str = r#"{"calories":2000,"protein":160,"carbs":190,"fat":62,"message":"Small steps, big results.","goalSummary":"Steady Cut"}"#;

pub fn fenced_plan() -> String {
    format!("```json\n{}\n```", PLAN_JSON)
}
