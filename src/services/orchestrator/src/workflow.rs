//! Workflow Engine Module
//!
//! Executes named DAGs of provider operations. Scheduling is wave-based:
//! every step whose dependencies have reached terminal success is
//! dispatched concurrently, in declaration order, and the engine waits for
//! the wave to drain before scheduling the next. A step failure halts
//! dispatch; in-flight siblings run to completion but their results are
//! discarded. Pause drains the current wave and parks; cancel propagates
//! through the operation engine's cancellation tokens.

use crate::{
    events::EventLog,
    operations::OperationEngine,
    registry::ProviderRegistry,
    template::{self, Scope},
    OrchestratorError, Result,
};
use conductor_shared::types::{
    OperationState, OrchestratorEvent, Step, StepState, Workflow, WorkflowStatus,
};
use dashmap::DashMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-run control block shared with pause/cancel callers
struct WorkflowControl {
    pause: AtomicBool,
    token: tokio_util::sync::CancellationToken,
    inputs: parking_lot::RwLock<Scope>,
}

impl WorkflowControl {
    fn new(inputs: Scope) -> Self {
        Self {
            pause: AtomicBool::new(false),
            token: tokio_util::sync::CancellationToken::new(),
            inputs: parking_lot::RwLock::new(inputs),
        }
    }
}

enum RunOutcome {
    Completed,
    Failed(String),
    Cancelled,
    Paused,
}

/// Workflow DAG engine
pub struct WorkflowEngine {
    /// Stored workflows, draft through terminal
    workflows: RwLock<HashMap<Uuid, Workflow>>,

    /// Control blocks for workflows that are running or paused
    controls: DashMap<Uuid, Arc<WorkflowControl>>,

    /// Step dispatch goes through the operation engine
    operations: Arc<OperationEngine>,

    /// Registry, consulted for provider existence at execute time
    registry: Arc<ProviderRegistry>,

    /// Lifecycle event sink
    events: Arc<EventLog>,
}

impl WorkflowEngine {
    /// Create a new engine
    pub fn new(
        operations: Arc<OperationEngine>,
        registry: Arc<ProviderRegistry>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            controls: DashMap::new(),
            operations,
            registry,
            events,
        }
    }

    /// Create a workflow in `draft` state
    ///
    /// The step graph is validated structurally (non-empty, unique ids, no
    /// dangling dependencies, acyclic) before the workflow is stored.
    pub async fn create(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        steps: Vec<Step>,
    ) -> Result<Uuid> {
        let workflow = Workflow::new(name, description, steps);
        Self::validate_graph(&workflow)?;

        let id = workflow.id;
        info!(workflow_id = %id, name = %workflow.name, "Workflow created");
        self.workflows.write().await.insert(id, workflow);
        Ok(id)
    }

    /// Validate a stored workflow without executing it
    ///
    /// Runs the structural checks plus provider existence and enablement,
    /// the same gate `execute` applies. The workflow's status is untouched,
    /// so callers can vet a draft before committing to a run.
    pub async fn validate(&self, workflow_id: Uuid) -> Result<()> {
        let workflow = self.get(workflow_id).await.ok_or_else(|| {
            OrchestratorError::ValidationFailure(format!("unknown workflow {}", workflow_id))
        })?;
        Self::validate_graph(&workflow)?;
        self.validate_providers(&workflow).await
    }

    /// Look up a workflow by id
    pub async fn get(&self, workflow_id: Uuid) -> Option<Workflow> {
        self.workflows.read().await.get(&workflow_id).cloned()
    }

    /// List all workflows
    pub async fn list(&self) -> Vec<Workflow> {
        self.workflows.read().await.values().cloned().collect()
    }

    /// Delete a workflow; a running workflow must be cancelled first
    pub async fn delete(&self, workflow_id: Uuid) -> Result<()> {
        let mut workflows = self.workflows.write().await;
        match workflows.get(&workflow_id) {
            None => Ok(()),
            Some(wf) if wf.status == WorkflowStatus::Running => {
                Err(OrchestratorError::ValidationFailure(format!(
                    "workflow {} is running",
                    workflow_id
                )))
            }
            Some(_) => {
                workflows.remove(&workflow_id);
                self.controls.remove(&workflow_id);
                info!(workflow_id = %workflow_id, "Workflow deleted");
                Ok(())
            }
        }
    }

    /// Execute a workflow to completion (or pause), returning the final
    /// snapshot
    ///
    /// Validation runs again here, including provider existence and
    /// enablement; a rejected workflow stays in `draft`. A workflow that
    /// already reached a terminal status is re-run from scratch.
    pub async fn execute(
        &self,
        workflow_id: Uuid,
        inputs: HashMap<String, Value>,
    ) -> Result<Workflow> {
        let control = Arc::new(WorkflowControl::new(inputs));

        // Status check, validation, and the running transition happen
        // under one write-lock hold so two racing execute calls cannot
        // both observe a startable status.
        let workflow = {
            let mut workflows = self.workflows.write().await;
            let stored = workflows.get_mut(&workflow_id).ok_or_else(|| {
                OrchestratorError::ValidationFailure(format!("unknown workflow {}", workflow_id))
            })?;

            match stored.status {
                WorkflowStatus::Running => {
                    return Err(OrchestratorError::ValidationFailure(format!(
                        "workflow {} is already running",
                        workflow_id
                    )))
                }
                WorkflowStatus::Paused => {
                    return Err(OrchestratorError::ValidationFailure(format!(
                        "workflow {} is paused; resume it instead",
                        workflow_id
                    )))
                }
                _ => {}
            }

            Self::validate_graph(stored)?;
            self.validate_providers(stored).await?;

            for step in &mut stored.steps {
                step.state = StepState::Pending;
            }
            stored.results.clear();
            stored.error = None;

            self.controls.insert(workflow_id, control.clone());

            let from = stored.status;
            stored.status = WorkflowStatus::Running;
            stored.updated_at = chrono::Utc::now();
            self.events.emit(OrchestratorEvent::WorkflowStatusChanged {
                workflow_id,
                from,
                to: WorkflowStatus::Running,
            });
            stored.clone()
        };

        self.run(workflow, control).await
    }

    /// Request a pause; the current wave drains, then the workflow parks
    pub async fn pause(&self, workflow_id: Uuid) -> Result<()> {
        let workflow = self.get(workflow_id).await.ok_or_else(|| {
            OrchestratorError::ValidationFailure(format!("unknown workflow {}", workflow_id))
        })?;
        if workflow.status != WorkflowStatus::Running {
            return Err(OrchestratorError::ValidationFailure(format!(
                "workflow {} is not running",
                workflow_id
            )));
        }
        if let Some(control) = self.controls.get(&workflow_id) {
            control.pause.store(true, Ordering::SeqCst);
            info!(workflow_id = %workflow_id, "Workflow pause requested");
        }
        Ok(())
    }

    /// Resume a paused workflow, running it to completion (or the next
    /// pause)
    pub async fn resume(&self, workflow_id: Uuid) -> Result<Workflow> {
        let mut workflow = self.get(workflow_id).await.ok_or_else(|| {
            OrchestratorError::ValidationFailure(format!("unknown workflow {}", workflow_id))
        })?;
        if workflow.status != WorkflowStatus::Paused {
            return Err(OrchestratorError::ValidationFailure(format!(
                "workflow {} is not paused",
                workflow_id
            )));
        }
        let control = self
            .controls
            .get(&workflow_id)
            .map(|c| c.clone())
            .ok_or_else(|| {
                OrchestratorError::Internal(format!(
                    "paused workflow {} has no control block",
                    workflow_id
                ))
            })?;
        control.pause.store(false, Ordering::SeqCst);

        self.transition(&mut workflow, WorkflowStatus::Running).await;
        self.run(workflow, control).await
    }

    /// Cancel a workflow, forcing `failed` from any non-terminal status
    ///
    /// A running workflow is cancelled through its token, which propagates
    /// into in-flight operations; a draft or paused workflow fails
    /// immediately. Cancelling an already-terminal workflow is rejected.
    pub async fn cancel(&self, workflow_id: Uuid) -> Result<()> {
        let mut workflow = self.get(workflow_id).await.ok_or_else(|| {
            OrchestratorError::ValidationFailure(format!("unknown workflow {}", workflow_id))
        })?;
        match workflow.status {
            WorkflowStatus::Running => {
                if let Some(control) = self.controls.get(&workflow_id) {
                    control.token.cancel();
                }
                info!(workflow_id = %workflow_id, "Workflow cancellation requested");
                Ok(())
            }
            WorkflowStatus::Draft | WorkflowStatus::Paused => {
                workflow.error = Some("cancelled".to_string());
                self.transition(&mut workflow, WorkflowStatus::Failed).await;
                self.controls.remove(&workflow_id);
                Ok(())
            }
            status => Err(OrchestratorError::ValidationFailure(format!(
                "workflow {} is {}",
                workflow_id, status
            ))),
        }
    }

    // Wave loop. Consumes the snapshot, persisting progress after every
    // wave so observers see step states and accumulated results.
    async fn run(&self, mut workflow: Workflow, control: Arc<WorkflowControl>) -> Result<Workflow> {
        let workflow_id = workflow.id;
        let mut scope: Scope = control.inputs.read().clone();
        for (step_id, value) in &workflow.results {
            scope.insert(step_id.clone(), value.clone());
        }

        let outcome = loop {
            if control.token.is_cancelled() {
                break RunOutcome::Cancelled;
            }
            if control.pause.load(Ordering::SeqCst) {
                break RunOutcome::Paused;
            }

            // Conditions are evaluated as steps become ready; a skip can
            // unblock further skips, so re-scan until stable.
            loop {
                let mut skipped = false;
                for index in 0..workflow.steps.len() {
                    if workflow.steps[index].state != StepState::Pending
                        || !Self::deps_satisfied(&workflow, &workflow.steps[index])
                    {
                        continue;
                    }
                    if let Some(condition) = workflow.steps[index].condition.clone() {
                        if !template::evaluate_condition(&condition, &scope) {
                            debug!(
                                workflow_id = %workflow_id,
                                step_id = %workflow.steps[index].id,
                                "Step condition falsy, skipping"
                            );
                            workflow.steps[index].state = StepState::Skipped;
                            skipped = true;
                        }
                    }
                }
                if !skipped {
                    break;
                }
            }

            let ready: Vec<Step> = workflow
                .steps
                .iter()
                .filter(|step| {
                    step.state == StepState::Pending && Self::deps_satisfied(&workflow, step)
                })
                .cloned()
                .collect();

            if ready.is_empty() {
                break if workflow.all_steps_succeeded() {
                    RunOutcome::Completed
                } else {
                    RunOutcome::Failed("workflow has unreachable steps".to_string())
                };
            }

            for step in &ready {
                Self::set_step_state(&mut workflow, &step.id, StepState::Running);
            }
            self.persist(&workflow).await;

            let mut wave = JoinSet::new();
            for step in ready {
                let operations = self.operations.clone();
                let token = control.token.clone();
                let params = template::resolve(&step.params, &scope);
                let cache_ttl = step.cache_ttl_ms.map(Duration::from_millis);
                debug!(
                    workflow_id = %workflow_id,
                    step_id = %step.id,
                    provider_id = %step.provider_id,
                    "Dispatching step"
                );
                wave.spawn(async move {
                    let outcome = operations
                        .execute(step.provider_id, &step.kind, params, cache_ttl, Some(&token))
                        .await;
                    (step.id, outcome)
                });
            }

            let mut wave_error: Option<String> = None;
            while let Some(joined) = wave.join_next().await {
                let (step_id, outcome) = match joined {
                    Ok(pair) => pair,
                    Err(e) => {
                        wave_error.get_or_insert_with(|| format!("step task panicked: {}", e));
                        continue;
                    }
                };
                match outcome {
                    Ok(op) if op.state == OperationState::Completed => {
                        Self::set_step_state(&mut workflow, &step_id, StepState::Completed);
                        if wave_error.is_some() {
                            // Sibling finished after the wave already
                            // failed; its result is discarded.
                            continue;
                        }
                        let value = op.result.unwrap_or(Value::Null);
                        scope.insert(step_id.clone(), value.clone());
                        workflow.results.insert(step_id, value);
                    }
                    Ok(op) => {
                        Self::set_step_state(&mut workflow, &step_id, StepState::Failed);
                        let error = op
                            .error
                            .unwrap_or_else(|| "operation did not complete".to_string());
                        warn!(
                            workflow_id = %workflow_id,
                            step_id = %step_id,
                            error = %error,
                            "Step failed"
                        );
                        wave_error.get_or_insert(error);
                    }
                    Err(e) => {
                        Self::set_step_state(&mut workflow, &step_id, StepState::Failed);
                        wave_error.get_or_insert_with(|| e.to_string());
                    }
                }
            }

            self.persist(&workflow).await;

            if let Some(error) = wave_error {
                break if control.token.is_cancelled() {
                    RunOutcome::Cancelled
                } else {
                    RunOutcome::Failed(error)
                };
            }
        };

        match outcome {
            RunOutcome::Completed => {
                self.transition(&mut workflow, WorkflowStatus::Completed).await;
                self.controls.remove(&workflow_id);
                info!(workflow_id = %workflow_id, "Workflow completed");
            }
            RunOutcome::Failed(error) => {
                workflow.error = Some(error);
                self.transition(&mut workflow, WorkflowStatus::Failed).await;
                self.controls.remove(&workflow_id);
            }
            RunOutcome::Cancelled => {
                workflow.error = Some("cancelled".to_string());
                self.transition(&mut workflow, WorkflowStatus::Failed).await;
                self.controls.remove(&workflow_id);
                info!(workflow_id = %workflow_id, "Workflow cancelled");
            }
            RunOutcome::Paused => {
                self.transition(&mut workflow, WorkflowStatus::Paused).await;
                info!(workflow_id = %workflow_id, "Workflow paused");
            }
        }

        Ok(workflow)
    }

    // Structural validation: non-empty, unique step ids, resolvable
    // dependencies, acyclic.
    fn validate_graph(workflow: &Workflow) -> Result<()> {
        if workflow.name.trim().is_empty() {
            return Err(OrchestratorError::ValidationFailure(
                "workflow name must not be empty".to_string(),
            ));
        }
        if workflow.steps.is_empty() {
            return Err(OrchestratorError::ValidationFailure(
                "workflow must have at least one step".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for step in &workflow.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(OrchestratorError::ValidationFailure(format!(
                    "duplicate step id '{}'",
                    step.id
                )));
            }
        }
        for step in &workflow.steps {
            for dep in &step.depends_on {
                if !seen.contains(dep.as_str()) {
                    return Err(OrchestratorError::DanglingDependency {
                        step: step.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        // DFS with an explicit recursion stack.
        let mut visited: HashSet<&str> = HashSet::new();
        let mut in_stack: HashSet<&str> = HashSet::new();
        for step in &workflow.steps {
            Self::visit(workflow, &step.id, &mut visited, &mut in_stack)?;
        }
        Ok(())
    }

    fn visit<'a>(
        workflow: &'a Workflow,
        step_id: &'a str,
        visited: &mut HashSet<&'a str>,
        in_stack: &mut HashSet<&'a str>,
    ) -> Result<()> {
        if visited.contains(step_id) {
            return Ok(());
        }
        if !in_stack.insert(step_id) {
            return Err(OrchestratorError::CyclicDependency(step_id.to_string()));
        }
        if let Some(step) = workflow.step(step_id) {
            for dep in &step.depends_on {
                Self::visit(workflow, dep, visited, in_stack)?;
            }
        }
        in_stack.remove(step_id);
        visited.insert(step_id);
        Ok(())
    }

    async fn validate_providers(&self, workflow: &Workflow) -> Result<()> {
        for step in &workflow.steps {
            let provider = self
                .registry
                .get(step.provider_id)
                .await
                .ok_or(OrchestratorError::ProviderUnavailable(step.provider_id))?;
            if !provider.is_enabled() {
                return Err(OrchestratorError::DisabledProvider(step.provider_id));
            }
        }
        Ok(())
    }

    fn deps_satisfied(workflow: &Workflow, step: &Step) -> bool {
        step.depends_on.iter().all(|dep| {
            workflow
                .step(dep)
                .map(|s| s.state.is_terminal_success())
                .unwrap_or(false)
        })
    }

    fn set_step_state(workflow: &mut Workflow, step_id: &str, state: StepState) {
        if let Some(step) = workflow.steps.iter_mut().find(|s| s.id == step_id) {
            step.state = state;
        }
    }

    async fn transition(&self, workflow: &mut Workflow, to: WorkflowStatus) {
        let from = workflow.status;
        workflow.status = to;
        workflow.updated_at = chrono::Utc::now();
        self.events.emit(OrchestratorEvent::WorkflowStatusChanged {
            workflow_id: workflow.id,
            from,
            to,
        });
        self.persist(workflow).await;
    }

    async fn persist(&self, workflow: &Workflow) {
        self.workflows
            .write()
            .await
            .insert(workflow.id, workflow.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResultCache;
    use crate::executor::{ExecutorOutcome, ProviderExecutor};
    use async_trait::async_trait;
    use conductor_shared::types::ProviderConfig;
    use serde_json::json;

    // Echoes the kind plus resolved params so ordering and substitution
    // are observable from results.
    struct EchoExecutor;

    #[async_trait]
    impl ProviderExecutor for EchoExecutor {
        async fn invoke(
            &self,
            _provider_id: Uuid,
            kind: &str,
            params: &Value,
            _deadline: Duration,
        ) -> Result<ExecutorOutcome> {
            if kind == "fail" {
                return Err(OrchestratorError::ExecutorFailure("scripted failure".into()));
            }
            Ok(ExecutorOutcome::of(json!({
                "kind": kind,
                "params": params,
            })))
        }

        async fn probe(&self, _provider_id: Uuid, _deadline: Duration) -> Result<()> {
            Ok(())
        }
    }

    struct Harness {
        engine: WorkflowEngine,
        provider_id: Uuid,
    }

    async fn harness() -> Harness {
        let executor = Arc::new(EchoExecutor);
        let events = Arc::new(EventLog::new(64));
        let registry = Arc::new(ProviderRegistry::new(
            executor.clone(),
            events.clone(),
            100,
            Duration::from_millis(200),
        ));
        let provider_id = registry
            .register(ProviderConfig {
                name: "echo".to_string(),
                capability: "test".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let operations = Arc::new(OperationEngine::new(
            registry.clone(),
            executor,
            Arc::new(ResultCache::new()),
            events.clone(),
            64,
            Duration::from_secs(30),
        ));
        let engine = WorkflowEngine::new(operations, registry, events);
        Harness {
            engine,
            provider_id,
        }
    }

    #[tokio::test]
    async fn cycle_is_rejected_at_create() {
        let h = harness().await;
        let steps = vec![
            Step::new("a", h.provider_id, "op", json!({})).depends_on(&["b"]),
            Step::new("b", h.provider_id, "op", json!({})).depends_on(&["a"]),
        ];
        let err = h.engine.create("cyclic", None, steps).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::CyclicDependency(_)));
    }

    #[tokio::test]
    async fn dangling_dependency_is_rejected() {
        let h = harness().await;
        let steps = vec![Step::new("a", h.provider_id, "op", json!({})).depends_on(&["ghost"])];
        let err = h.engine.create("dangling", None, steps).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::DanglingDependency { .. }));
    }

    #[tokio::test]
    async fn linear_chain_threads_results_downstream() {
        let h = harness().await;
        let steps = vec![
            Step::new("s1", h.provider_id, "first", json!({"seed": "{{topic}}"})),
            Step::new("s2", h.provider_id, "second", json!({"from": "{{s1.kind}}"}))
                .depends_on(&["s1"]),
        ];
        let id = h.engine.create("chain", None, steps).await.unwrap();

        let mut inputs = HashMap::new();
        inputs.insert("topic".to_string(), json!("rust"));
        let finished = h.engine.execute(id, inputs).await.unwrap();

        assert_eq!(finished.status, WorkflowStatus::Completed);
        assert_eq!(finished.results["s1"]["params"]["seed"], json!("rust"));
        assert_eq!(finished.results["s2"]["params"]["from"], json!("first"));
    }

    #[tokio::test]
    async fn falsy_condition_skips_step_and_unblocks_dependents() {
        let h = harness().await;
        let steps = vec![
            Step::new("gate", h.provider_id, "op", json!({})).when("{{enabled}}"),
            Step::new("after", h.provider_id, "op", json!({})).depends_on(&["gate"]),
        ];
        let id = h.engine.create("gated", None, steps).await.unwrap();

        let mut inputs = HashMap::new();
        inputs.insert("enabled".to_string(), json!(false));
        let finished = h.engine.execute(id, inputs).await.unwrap();

        assert_eq!(finished.status, WorkflowStatus::Completed);
        assert_eq!(finished.step("gate").unwrap().state, StepState::Skipped);
        assert_eq!(finished.step("after").unwrap().state, StepState::Completed);
        assert!(!finished.results.contains_key("gate"));
    }

    #[tokio::test]
    async fn step_failure_fails_workflow_and_halts_downstream() {
        let h = harness().await;
        let steps = vec![
            Step::new("bad", h.provider_id, "fail", json!({})),
            Step::new("after", h.provider_id, "op", json!({})).depends_on(&["bad"]),
        ];
        let id = h.engine.create("failing", None, steps).await.unwrap();

        let finished = h.engine.execute(id, HashMap::new()).await.unwrap();
        assert_eq!(finished.status, WorkflowStatus::Failed);
        assert!(finished.error.is_some());
        assert_eq!(finished.step("after").unwrap().state, StepState::Pending);
    }

    #[tokio::test]
    async fn unknown_provider_rejects_execute_and_stays_draft() {
        let h = harness().await;
        let steps = vec![Step::new("a", Uuid::new_v4(), "op", json!({}))];
        let id = h.engine.create("ghost", None, steps).await.unwrap();

        let err = h.engine.execute(id, HashMap::new()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ProviderUnavailable(_)));
        assert_eq!(
            h.engine.get(id).await.unwrap().status,
            WorkflowStatus::Draft
        );
    }

    #[tokio::test]
    async fn cancel_of_draft_workflow_forces_failed() {
        let h = harness().await;
        let steps = vec![Step::new("a", h.provider_id, "op", json!({}))];
        let id = h.engine.create("never-ran", None, steps).await.unwrap();

        h.engine.cancel(id).await.unwrap();

        let wf = h.engine.get(id).await.unwrap();
        assert_eq!(wf.status, WorkflowStatus::Failed);
        assert_eq!(wf.error.as_deref(), Some("cancelled"));
    }

    #[tokio::test]
    async fn cancel_of_terminal_workflow_is_rejected() {
        let h = harness().await;
        let steps = vec![Step::new("a", h.provider_id, "op", json!({}))];
        let id = h.engine.create("done", None, steps).await.unwrap();
        h.engine.execute(id, HashMap::new()).await.unwrap();

        let err = h.engine.cancel(id).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ValidationFailure(_)));
        assert_eq!(
            h.engine.get(id).await.unwrap().status,
            WorkflowStatus::Completed
        );
    }

    #[tokio::test]
    async fn validate_vets_a_draft_without_running_it() {
        let h = harness().await;
        let good = h
            .engine
            .create("vetted", None, vec![Step::new("a", h.provider_id, "op", json!({}))])
            .await
            .unwrap();
        h.engine.validate(good).await.unwrap();
        assert_eq!(
            h.engine.get(good).await.unwrap().status,
            WorkflowStatus::Draft
        );

        let ghost = h
            .engine
            .create("unvetted", None, vec![Step::new("a", Uuid::new_v4(), "op", json!({}))])
            .await
            .unwrap();
        let err = h.engine.validate(ghost).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ProviderUnavailable(_)));
        assert_eq!(
            h.engine.get(ghost).await.unwrap().status,
            WorkflowStatus::Draft
        );
    }

    #[tokio::test]
    async fn delete_rejects_nothing_but_running() {
        let h = harness().await;
        let steps = vec![Step::new("a", h.provider_id, "op", json!({}))];
        let id = h.engine.create("to-delete", None, steps).await.unwrap();
        h.engine.delete(id).await.unwrap();
        assert!(h.engine.get(id).await.is_none());
        // deleting an unknown id stays silent
        h.engine.delete(Uuid::new_v4()).await.unwrap();
    }
}
