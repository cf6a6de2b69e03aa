use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::agent::{AgentRegistry, ParamMap};
use crate::config::{effective_timeout_secs, ExecutorConfig};
use crate::error::EngineError;
use crate::persist::{HistoryReader, ReportSink};
use crate::plan::{validate, ExecutionPlan, TaskSpec};

use super::cancel::CancelToken;
use super::context::ExecutionContext;
use super::graph::TaskGraph;
use super::scheduler::run_bounded;
use super::template::resolve_parameters;
use super::traits::{OutputRenderer, RenderEvent, RetryStrategy};
use super::types::{
    ExecutionReport, OverallStatus, SkipReason, TaskResult, TaskStatus,
};

/// Drives a validated plan through staged, bounded-parallel execution.
///
/// A stage only starts once every task in the prior stage has settled, so
/// parameter resolution always reads fully-settled results. Individual task
/// failures never abort the run; only settlement-invariant breaches
/// (`EngineError::Internal`) do.
pub struct ExecutionEngine {
    registry: Arc<AgentRegistry>,
    config: ExecutorConfig,
    retry: Option<Arc<dyn RetryStrategy>>,
    renderer: Option<Arc<dyn OutputRenderer>>,
    sink: Option<Arc<dyn ReportSink>>,
    history: Option<Arc<dyn HistoryReader>>,
}

pub struct ExecutionEngineBuilder {
    registry: Arc<AgentRegistry>,
    config: ExecutorConfig,
    retry: Option<Arc<dyn RetryStrategy>>,
    renderer: Option<Arc<dyn OutputRenderer>>,
    sink: Option<Arc<dyn ReportSink>>,
    history: Option<Arc<dyn HistoryReader>>,
}

impl ExecutionEngineBuilder {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            config: ExecutorConfig::default(),
            retry: None,
            renderer: None,
            sink: None,
            history: None,
        }
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategy>) -> Self {
        self.retry = Some(strategy);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryReader>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            registry: self.registry,
            config: self.config,
            retry: self.retry,
            renderer: self.renderer,
            sink: self.sink,
            history: self.history,
        }
    }
}

impl ExecutionEngine {
    pub fn builder(registry: Arc<AgentRegistry>) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(registry)
    }

    pub async fn execute(&self, plan: &ExecutionPlan) -> Result<ExecutionReport, EngineError> {
        self.execute_with_cancel(plan, CancelToken::never()).await
    }

    pub async fn execute_with_cancel(
        &self,
        plan: &ExecutionPlan,
        cancel: CancelToken,
    ) -> Result<ExecutionReport, EngineError> {
        validate(plan, &self.registry)?;
        let graph = TaskGraph::from_plan(plan)?;
        let stages = graph.stages()?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!(
            %run_id,
            plan_id = %plan.plan_id,
            tasks = graph.len(),
            stages = stages.len(),
            "executing plan"
        );

        self.emit(RenderEvent::RunStart {
            run_id: run_id.clone(),
            plan_id: plan.plan_id.clone(),
            total_tasks: graph.len(),
            total_stages: stages.len(),
        });
        self.emit(RenderEvent::Plan {
            run_id: run_id.clone(),
            stages: stages.clone(),
        });

        let mut ctx = match &self.history {
            Some(history) => ExecutionContext::with_history(history.clone()),
            None => ExecutionContext::new(),
        };

        let mut cancelled = false;
        for (stage_id, task_ids) in stages.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                tracing::info!(%run_id, stage_id, "run cancelled; later stages not started");
                break;
            }

            self.emit(RenderEvent::StageStart {
                run_id: run_id.clone(),
                stage_id,
                task_ids: task_ids.clone(),
            });

            let mut dispatched = Vec::new();
            for task_id in task_ids {
                let task = graph.node(task_id).ok_or_else(|| {
                    EngineError::Internal(format!("scheduled task '{task_id}' missing from graph"))
                })?;
                match self.prepare(task, &ctx)? {
                    Ok(parameters) => {
                        dispatched.push(self.run_task(&run_id, stage_id, task.clone(), parameters));
                    }
                    Err(reason) => {
                        tracing::warn!(%run_id, %task_id, %reason, "task skipped");
                        let result = TaskResult::skipped(task_id.clone(), reason);
                        self.emit(RenderEvent::TaskSettled {
                            run_id: run_id.clone(),
                            stage_id,
                            result: result.clone(),
                        });
                        ctx.record(result)?;
                    }
                }
            }

            for result in run_bounded(dispatched, self.config.max_in_flight).await {
                ctx.record(result)?;
            }

            self.emit(RenderEvent::StageEnd {
                run_id: run_id.clone(),
                stage_id,
            });
        }

        let results = ctx.into_results();
        let overall = overall_status(cancelled, results.values().map(|r| r.status));
        let report = ExecutionReport {
            run_id: run_id.clone(),
            plan_id: plan.plan_id.clone(),
            overall,
            results,
            stages,
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
        };
        tracing::info!(
            %run_id,
            overall = ?report.overall,
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            skipped = report.skipped_count(),
            duration_ms = report.duration_ms,
            "plan finished"
        );

        self.emit(RenderEvent::RunEnd {
            run_id,
            report: report.clone(),
        });

        if let Some(sink) = &self.sink {
            if let Err(err) = sink.save_report(&plan.plan_id, &report).await {
                tracing::warn!(plan_id = %plan.plan_id, error = %err, "failed to persist report");
            }
        }

        Ok(report)
    }

    /// Decide a task's fate before dispatch: skip it when an upstream task
    /// did not succeed or its parameters cannot be resolved, otherwise hand
    /// back the fully-resolved parameter map.
    ///
    /// An unsettled dependency here means the stage barrier was violated,
    /// which aborts the run.
    fn prepare(
        &self,
        task: &TaskSpec,
        ctx: &ExecutionContext,
    ) -> Result<Result<ParamMap, SkipReason>, EngineError> {
        for dep in task.effective_dependencies() {
            match ctx.result(&dep).map(|r| r.status) {
                Some(TaskStatus::Succeeded) => {}
                Some(TaskStatus::Failed) => {
                    return Ok(Err(SkipReason::DependencyFailed { task: dep }))
                }
                Some(TaskStatus::Skipped) => {
                    return Ok(Err(SkipReason::DependencySkipped { task: dep }))
                }
                Some(status) => {
                    return Err(EngineError::Internal(format!(
                        "dependency '{dep}' of task '{}' recorded non-terminal status {status:?}",
                        task.id
                    )))
                }
                None => {
                    return Err(EngineError::Internal(format!(
                        "dependency '{dep}' of task '{}' is not settled",
                        task.id
                    )))
                }
            }
        }

        match resolve_parameters(task, ctx) {
            Ok(parameters) => Ok(Ok(parameters)),
            Err(err) => Ok(Err(SkipReason::Template {
                detail: err.to_string(),
            })),
        }
    }

    async fn run_task(
        &self,
        run_id: &str,
        stage_id: usize,
        task: TaskSpec,
        parameters: ParamMap,
    ) -> TaskResult {
        self.emit(RenderEvent::TaskStart {
            run_id: run_id.to_string(),
            stage_id,
            task_id: task.id.clone(),
            agent_key: task.agent_key.clone(),
            mode: task.mode.clone(),
        });

        let result = self.dispatch(&task, parameters).await;

        match result.status {
            TaskStatus::Succeeded => {
                tracing::info!(%run_id, task_id = %task.id, attempts = result.attempts, duration_ms = result.duration_ms, "task succeeded");
            }
            _ => {
                tracing::warn!(%run_id, task_id = %task.id, attempts = result.attempts, error = ?result.error, "task failed");
            }
        }

        self.emit(RenderEvent::TaskSettled {
            run_id: run_id.to_string(),
            stage_id,
            result: result.clone(),
        });
        result
    }

    async fn dispatch(&self, task: &TaskSpec, parameters: ParamMap) -> TaskResult {
        let Some(agent) = self.registry.agent(&task.agent_key) else {
            // validate() guarantees registration; a miss here is a bug but
            // fails only this task
            let err = crate::agent::AgentError::Permanent(format!(
                "agent '{}' not registered",
                task.agent_key
            ));
            return TaskResult::failed(&task.id, &err, Utc::now(), 0, 0);
        };

        let timeout_secs = effective_timeout_secs(self.config.task_timeout_secs);
        let timeout = Duration::from_secs(timeout_secs);
        let max_attempts = self
            .retry
            .as_ref()
            .map(|s| s.max_attempts().max(1))
            .unwrap_or(1);

        let started_at = Utc::now();
        let clock = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let invocation = agent.invoke(&task.mode, parameters.clone());
            match tokio::time::timeout(timeout, invocation).await {
                Ok(Ok(data)) => {
                    return TaskResult::succeeded(
                        &task.id,
                        data,
                        started_at,
                        clock.elapsed().as_millis() as u64,
                        attempt,
                    );
                }
                Ok(Err(err)) => {
                    if err.retryable() && attempt < max_attempts {
                        if let Some(delay) = self.retry_delay(attempt, err.retry_after()) {
                            tracing::debug!(
                                task_id = %task.id,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "retrying task"
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    return TaskResult::failed(
                        &task.id,
                        &err,
                        started_at,
                        clock.elapsed().as_millis() as u64,
                        attempt,
                    );
                }
                Err(_) => {
                    return TaskResult::timed_out(
                        &task.id,
                        timeout_secs,
                        started_at,
                        clock.elapsed().as_millis() as u64,
                        attempt,
                    );
                }
            }
        }
    }

    /// Strategy delay for the attempt just finished, raised to any
    /// server-provided retry-after hint.
    fn retry_delay(&self, attempt: u32, hint: Option<Duration>) -> Option<Duration> {
        let strategy = self.retry.as_ref()?;
        let delay = strategy.next_delay(attempt)?;
        Some(match hint {
            Some(hint) => delay.max(hint),
            None => delay,
        })
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }
}

fn overall_status(
    cancelled: bool,
    statuses: impl Iterator<Item = TaskStatus>,
) -> OverallStatus {
    if cancelled {
        return OverallStatus::Cancelled;
    }
    let mut total = 0usize;
    let mut succeeded = 0usize;
    for status in statuses {
        total += 1;
        if status == TaskStatus::Succeeded {
            succeeded += 1;
        }
    }
    if succeeded == total {
        OverallStatus::Succeeded
    } else if succeeded == 0 {
        OverallStatus::Failed
    } else {
        OverallStatus::PartiallySucceeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TenMillis;

    impl RetryStrategy for TenMillis {
        fn name(&self) -> &str {
            "ten-millis"
        }

        fn max_attempts(&self) -> u32 {
            3
        }

        fn next_delay(&self, _attempt: u32) -> Option<Duration> {
            Some(Duration::from_millis(10))
        }
    }

    #[test]
    fn retry_hint_raises_but_never_lowers_the_delay() {
        let engine = ExecutionEngine::builder(Arc::new(AgentRegistry::new()))
            .retry_strategy(Arc::new(TenMillis))
            .build();
        assert_eq!(engine.retry_delay(1, None), Some(Duration::from_millis(10)));
        assert_eq!(
            engine.retry_delay(1, Some(Duration::from_millis(50))),
            Some(Duration::from_millis(50))
        );
        assert_eq!(
            engine.retry_delay(1, Some(Duration::from_millis(5))),
            Some(Duration::from_millis(10))
        );
    }

    #[test]
    fn no_strategy_means_no_delay_even_with_a_hint() {
        let engine = ExecutionEngine::builder(Arc::new(AgentRegistry::new())).build();
        assert_eq!(engine.retry_delay(1, Some(Duration::from_millis(50))), None);
    }

    #[test]
    fn overall_status_covers_every_mix() {
        use TaskStatus::*;
        assert_eq!(
            overall_status(false, [Succeeded, Succeeded].into_iter()),
            OverallStatus::Succeeded
        );
        assert_eq!(
            overall_status(false, [Succeeded, Failed, Skipped].into_iter()),
            OverallStatus::PartiallySucceeded
        );
        assert_eq!(
            overall_status(false, [Failed, Skipped].into_iter()),
            OverallStatus::Failed
        );
        assert_eq!(
            overall_status(true, [Succeeded].into_iter()),
            OverallStatus::Cancelled
        );
    }
}
