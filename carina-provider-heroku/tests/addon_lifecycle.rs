//! End-to-end add-on lifecycle through the engine-facing traits

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use carina_core::provider::{DataSource, Provider};
use carina_core::resource::{Resource, ResourceId, Value};
use carina_provider_heroku::api::{
    AddOn, AddOnCreateOpts, AddOnUpdateOpts, ApiResult, AppRef, ConfigVar, ListRange, PlanRef,
};
use carina_provider_heroku::{AddOnApi, AddOnState, ApiError, CreationGate, HerokuProvider};
use tokio::time::Instant;

/// Every add-on reports `provisioning` twice before it is ready
#[derive(Default)]
struct Platform {
    addons: Mutex<HashMap<String, (AddOn, VecDeque<AddOnState>)>>,
    log: Mutex<Vec<String>>,
}

impl Platform {
    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn lookup(&self, id: &str) -> ApiResult<AddOn> {
        let mut addons = self.addons.lock().unwrap();
        let (addon, states) = addons
            .values_mut()
            .find(|(a, _)| a.id == id || a.name == id)
            .ok_or_else(|| ApiError::platform("not_found", "Couldn't find that add-on."))?;
        if let Some(state) = states.pop_front() {
            addon.state = state;
        }
        self.log.lock().unwrap().push(format!("info {}", addon.app.name));
        Ok(addon.clone())
    }
}

#[async_trait]
impl AddOnApi for Platform {
    async fn create_addon(&self, app: &str, opts: AddOnCreateOpts) -> ApiResult<AddOn> {
        self.log.lock().unwrap().push(format!("create {}", app));
        let mut addons = self.addons.lock().unwrap();
        let n = addons.len() + 1;
        let addon = AddOn {
            id: format!("0000000{}-aaaa-bbbb-cccc-dddddddddddd", n),
            name: format!("addon-{}-{}", app, n),
            app: AppRef {
                id: format!("app-{}", n),
                name: app.to_string(),
            },
            plan: PlanRef {
                id: format!("plan-{}", n),
                name: opts.plan,
            },
            provider_id: format!("resource{}@heroku.com", n),
            state: AddOnState::Provisioning,
        };
        let states = VecDeque::from(vec![
            AddOnState::Provisioning,
            AddOnState::Provisioning,
            AddOnState::Provisioned,
        ]);
        addons.insert(addon.id.clone(), (addon.clone(), states));
        Ok(addon)
    }

    async fn addon_info(&self, id: &str) -> ApiResult<AddOn> {
        self.lookup(id)
    }

    async fn addon_info_by_app(&self, _app: &str, id: &str) -> ApiResult<AddOn> {
        self.lookup(id)
    }

    async fn update_addon(
        &self,
        _app: &str,
        id: &str,
        _opts: AddOnUpdateOpts,
    ) -> ApiResult<AddOn> {
        Err(ApiError::platform("not_found", format!("no add-on {}", id)))
    }

    async fn delete_addon(&self, _app: &str, id: &str) -> ApiResult<AddOn> {
        let (addon, _) = self
            .addons
            .lock()
            .unwrap()
            .remove(id)
            .ok_or_else(|| ApiError::platform("not_found", "Couldn't find that add-on."))?;
        Ok(addon)
    }

    async fn list_addon_config(&self, _id: &str, _range: ListRange) -> ApiResult<Vec<ConfigVar>> {
        Ok(vec![
            ConfigVar {
                name: "DATABASE_URL".to_string(),
                value: Some("postgres://u:p@host:5432/db".to_string()),
            },
            ConfigVar {
                name: "HEROKU_POSTGRESQL_ONYX_URL".to_string(),
                value: None,
            },
        ])
    }
}

fn addon(name: &str, app: &str, plan: &str) -> Resource {
    Resource::new("addon", name)
        .with_attribute("app", Value::String(app.to_string()))
        .with_attribute("plan", Value::String(plan.to_string()))
}

#[tokio::test(start_paused = true)]
async fn create_read_config_and_delete() {
    let platform = Arc::new(Platform::default());
    let provider = HerokuProvider::new(platform.clone());

    let start = Instant::now();
    let state = provider
        .create(&addon("db", "myapp", "heroku-postgresql:hobby-dev"))
        .await
        .unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(15));

    let identifier = state.identifier.clone().unwrap();
    assert!(matches!(state.attributes.get("provider_id"), Some(Value::String(s)) if !s.is_empty()));
    let Some(Value::Map(config_vars)) = state.attributes.get("config_vars") else {
        panic!("config_vars missing");
    };
    assert_eq!(config_vars.len(), 1);
    assert!(config_vars.contains_key("DATABASE_URL"));

    let lookup = Resource::new("addon_config", "db")
        .with_attribute("name", Value::String("addon-myapp-1".to_string()))
        .with_read_only(true);
    let view = provider.read_data(&lookup).await.unwrap();
    assert_eq!(view.identifier.as_deref(), Some(identifier.as_str()));

    let id = ResourceId::new("addon", "db");
    let refreshed = provider
        .read(&id, Some(identifier.as_str()), Some(&state))
        .await
        .unwrap();
    assert_eq!(refreshed, state);

    assert!(provider.exists(&id, &identifier).await.unwrap());
    provider.delete(&id, &identifier, &state).await.unwrap();
    assert!(!provider.exists(&id, &identifier).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn providers_sharing_a_gate_create_one_at_a_time() {
    let platform = Arc::new(Platform::default());
    let gate = Arc::new(CreationGate::new());
    let first = HerokuProvider::new(platform.clone()).with_gate(gate.clone());
    let second = HerokuProvider::new(platform.clone()).with_gate(gate);

    let (a, b) = tokio::join!(
        first.create(&addon("db", "app1", "heroku-postgresql:hobby-dev")),
        second.create(&addon("cache", "app2", "memcachier:dev")),
    );
    a.unwrap();
    b.unwrap();

    let log = platform.log();
    let first_app = log[0].strip_prefix("create ").unwrap().to_string();
    let second_create = log.iter().rposition(|l| l.starts_with("create ")).unwrap();
    let last_of_first = log
        .iter()
        .rposition(|l| l.ends_with(&first_app))
        .unwrap();
    assert!(second_create > last_of_first, "{:?}", log);
}
