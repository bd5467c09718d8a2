//! Scripted in-memory platform used by unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{
    AddOn, AddOnApi, AddOnCreateOpts, AddOnUpdateOpts, ApiError, ApiResult, AppRef, ConfigVar,
    ListRange, PlanRef,
};
use crate::lifecycle::AddOnState;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One API round trip, attributed to the app owning the add-on
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub op: &'static str,
    pub app: String,
}

impl Call {
    pub fn new(op: &'static str, app: &str) -> Self {
        Self {
            op,
            app: app.to_string(),
        }
    }
}

struct Record {
    addon: AddOn,
    /// States reported by successive lookups; the last one repeats
    states: VecDeque<AddOnState>,
    config: Vec<ConfigVar>,
}

impl Record {
    fn observe(&mut self) -> AddOn {
        let state = if self.states.len() > 1 {
            self.states.pop_front()
        } else {
            self.states.front().cloned()
        };
        let mut addon = self.addon.clone();
        if let Some(state) = state {
            addon.state = state;
        }
        addon
    }
}

struct Script {
    states: Vec<AddOnState>,
    config: Vec<ConfigVar>,
}

#[derive(Default)]
struct Inner {
    records: Vec<Record>,
    scripts: HashMap<String, VecDeque<Script>>,
    failures: HashMap<&'static str, ApiError>,
    calls: Vec<Call>,
    create_opts: Vec<AddOnCreateOpts>,
    next_id: u32,
}

impl Inner {
    fn find(&mut self, id: &str) -> Option<&mut Record> {
        self.records
            .iter_mut()
            .find(|r| r.addon.id == id || r.addon.name == id)
    }

    fn record_call(&mut self, op: &'static str, id: &str) {
        let app = self
            .find(id)
            .map(|r| r.addon.app.name.clone())
            .unwrap_or_default();
        self.calls.push(Call::new(op, &app));
    }

    fn take_failure(&mut self, op: &'static str) -> ApiResult<()> {
        match self.failures.remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn insert(
        &mut self,
        app: &str,
        plan: &str,
        states: Vec<AddOnState>,
        config: Vec<ConfigVar>,
    ) -> AddOn {
        let n = self.next_id();
        let service = plan.split(':').next().unwrap_or(plan);
        let addon = AddOn {
            id: format!("addon-{}", n),
            name: format!("{}-{}", service, n),
            app: AppRef {
                id: format!("app-{}", app),
                name: app.to_string(),
            },
            plan: PlanRef {
                id: format!("plan-{}", plan),
                name: plan.to_string(),
            },
            provider_id: format!("resource{}@heroku.com", n),
            state: AddOnState::Provisioning,
        };
        self.records.push(Record {
            addon: addon.clone(),
            states: states.into(),
            config,
        });
        addon
    }

    fn not_found(id: &str) -> ApiError {
        ApiError::platform("not_found", format!("Couldn't find that add-on: {}", id))
    }
}

pub(crate) struct FakeApi {
    inner: Mutex<Inner>,
}

impl FakeApi {
    pub fn new() -> Self {
        init_logger();
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Add an existing add-on; returns its id
    pub fn seed(
        &self,
        app: &str,
        plan: &str,
        state: AddOnState,
        config: Vec<ConfigVar>,
    ) -> String {
        self.seed_with_states(app, plan, vec![state], config)
    }

    pub fn seed_with_states(
        &self,
        app: &str,
        plan: &str,
        states: Vec<AddOnState>,
        config: Vec<ConfigVar>,
    ) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.insert(app, plan, states, config).id
    }

    /// States and config the next add-on created for `app` will report
    pub fn script_create(&self, app: &str, states: Vec<AddOnState>, config: Vec<ConfigVar>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .scripts
            .entry(app.to_string())
            .or_default()
            .push_back(Script { states, config });
    }

    /// Make the next call of `op` fail with `err`
    pub fn fail_next(&self, op: &'static str, err: ApiError) {
        self.inner.lock().unwrap().failures.insert(op, err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn calls_of(&self, op: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    pub fn create_opts(&self) -> Vec<AddOnCreateOpts> {
        self.inner.lock().unwrap().create_opts.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().unwrap().find(id).is_some()
    }
}

#[async_trait]
impl AddOnApi for FakeApi {
    async fn create_addon(&self, app: &str, opts: AddOnCreateOpts) -> ApiResult<AddOn> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::new("create_addon", app));
        inner.create_opts.push(opts.clone());
        inner.take_failure("create_addon")?;

        let script = inner
            .scripts
            .get_mut(app)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Script {
                states: vec![AddOnState::Provisioned],
                config: Vec::new(),
            });
        // a bare service resolves to its default plan
        let plan = if opts.plan.contains(':') {
            opts.plan.clone()
        } else {
            format!("{}:basic", opts.plan)
        };
        Ok(inner.insert(app, &plan, script.states, script.config))
    }

    async fn addon_info(&self, id: &str) -> ApiResult<AddOn> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_call("addon_info", id);
        inner.take_failure("addon_info")?;
        inner
            .find(id)
            .map(Record::observe)
            .ok_or_else(|| Inner::not_found(id))
    }

    async fn addon_info_by_app(&self, app: &str, id: &str) -> ApiResult<AddOn> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::new("addon_info_by_app", app));
        inner.take_failure("addon_info_by_app")?;
        inner
            .find(id)
            .filter(|r| r.addon.app.name == app)
            .map(Record::observe)
            .ok_or_else(|| Inner::not_found(id))
    }

    async fn update_addon(
        &self,
        app: &str,
        id: &str,
        opts: AddOnUpdateOpts,
    ) -> ApiResult<AddOn> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::new("update_addon", app));
        inner.take_failure("update_addon")?;

        let n = inner.next_id();
        let record = inner.find(id).ok_or_else(|| Inner::not_found(id))?;
        record.addon.id = format!("addon-{}", n);
        record.addon.plan.name = opts.plan;
        Ok(record.addon.clone())
    }

    async fn delete_addon(&self, app: &str, id: &str) -> ApiResult<AddOn> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::new("delete_addon", app));
        inner.take_failure("delete_addon")?;

        let index = inner
            .records
            .iter()
            .position(|r| r.addon.id == id && r.addon.app.name == app)
            .ok_or_else(|| Inner::not_found(id))?;
        Ok(inner.records.remove(index).addon)
    }

    async fn list_addon_config(&self, id: &str, range: ListRange) -> ApiResult<Vec<ConfigVar>> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_call("list_addon_config", id);
        assert!(range.descending, "config is always listed descending");
        inner.take_failure("list_addon_config")?;
        inner
            .find(id)
            .map(|r| r.config.clone())
            .ok_or_else(|| Inner::not_found(id))
    }
}
