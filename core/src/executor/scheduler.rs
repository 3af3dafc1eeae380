use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;

use futures::future::poll_fn;

use crate::error::ExecutorError;

use super::artifacts::ArtifactCollector;
use super::context::ExecutionContext;
use super::output::SharedOutput;
use super::traits::{ExecutionEvent, ExecutionObserver};
use super::types::{BuildResult, Target, TargetId};

type UnitFuture = Pin<Box<dyn Future<Output = BuildResult> + Send>>;

/// One target's in-flight action. Polling it resumes the action until its
/// next suspension point.
struct RunningUnit {
    key: String,
    id: TargetId,
    future: UnitFuture,
}

/// Recorded outcome of a target, together with the sink it wrote to.
#[derive(Clone)]
pub struct TargetRecord {
    pub result: BuildResult,
    pub output: SharedOutput,
}

/// Cooperative, concurrency-bounded target scheduler.
///
/// All state lives in this value and is only touched from its own `async`
/// methods, so a build runs on one logical thread. Units are resumed in
/// insertion order; true parallelism comes from the subprocesses they drive.
///
/// A target is never executed twice, and a result is never overwritten.
pub struct TargetExecutor {
    max_parallelism: usize,
    artifacts: ArtifactCollector,
    observers: Vec<Arc<dyn ExecutionObserver>>,
    running: Vec<RunningUnit>,
    running_outputs: HashMap<String, SharedOutput>,
    results: HashMap<String, TargetRecord>,
    peak_running: usize,
}

impl TargetExecutor {
    pub fn new(max_parallelism: usize, artifacts: ArtifactCollector) -> Self {
        Self {
            max_parallelism: max_parallelism.max(1),
            artifacts,
            observers: Vec::new(),
            running: Vec::new(),
            running_outputs: HashMap::new(),
            results: HashMap::new(),
            peak_running: 0,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Highest number of simultaneously running units seen so far.
    pub fn peak_running(&self) -> usize {
        self.peak_running
    }

    pub fn result(&self, id: &TargetId) -> Option<&BuildResult> {
        self.results.get(&id.to_string()).map(|r| &r.result)
    }

    fn is_running(&self, key: &str) -> bool {
        self.running_outputs.contains_key(key)
    }

    /// Admit a target.
    ///
    /// Waits for every dependency to resolve first, driving other running
    /// targets meanwhile. If a dependency did not succeed the target is
    /// recorded as [`BuildResult::DependencyFailed`] without running its
    /// action. Returns once a concurrency slot is free again.
    pub async fn add_target(
        &mut self,
        id: TargetId,
        target: &Target,
        output: SharedOutput,
        context: ExecutionContext,
    ) -> Result<(), ExecutorError> {
        let key = id.to_string();
        if self.results.contains_key(&key) || self.is_running(&key) {
            tracing::debug!(target_id = %key, "target already scheduled; ignoring");
            return Ok(());
        }

        for dependency in target.dependencies() {
            let dep_key = dependency.to_string();
            if !self.results.contains_key(&dep_key) {
                self.wait_for(dependency)
                    .await
                    .map_err(|_| ExecutorError::UnknownDependency {
                        target: key.clone(),
                        dependency: dep_key.clone(),
                    })?;
            }

            let succeeded = self
                .results
                .get(&dep_key)
                .is_some_and(|record| record.result.has_succeeded());
            if !succeeded {
                let result = BuildResult::dependency_failed(dependency.clone());
                output.finalize(&result);
                tracing::warn!(
                    target_id = %key,
                    dependency = %dep_key,
                    "Skipping target, dependency did not succeed"
                );
                self.notify(&ExecutionEvent::Skipped {
                    id: &id,
                    result: &result,
                });
                self.results.insert(key, TargetRecord { result, output });
                return Ok(());
            }
        }

        let action = Arc::clone(target.action());
        let unit_output = Arc::clone(&output);
        let working_directory = id.path().to_path_buf();
        let future: UnitFuture = Box::pin(async move {
            action
                .execute(unit_output.as_ref(), &context, &working_directory)
                .await
                .unwrap_or_else(|e| BuildResult::failed(e.to_string()))
        });

        tracing::info!(target_id = %key, "Started executing target");
        self.notify(&ExecutionEvent::Started { id: &id });

        self.running_outputs.insert(key.clone(), output);
        self.running.push(RunningUnit { key, id, future });
        self.peak_running = self.peak_running.max(self.running.len());

        while self.running.len() >= self.max_parallelism {
            self.wait_for_any().await;
        }

        Ok(())
    }

    /// Resume running units until exactly one completes, and record it.
    ///
    /// Each pass resumes every unit once, in insertion order; if none
    /// completes, the next pass starts when any unit is woken. Returns `None`
    /// immediately when nothing is running.
    pub async fn wait_for_any(&mut self) -> Option<TargetId> {
        if self.running.is_empty() {
            return None;
        }

        let running = &mut self.running;
        let (index, result) = poll_fn(|cx| {
            for (index, unit) in running.iter_mut().enumerate() {
                if let Poll::Ready(result) = unit.future.as_mut().poll(cx) {
                    return Poll::Ready((index, result));
                }
            }
            Poll::Pending
        })
        .await;

        let unit = self.running.remove(index);
        self.complete(unit.key, &unit.id, result);
        Some(unit.id)
    }

    fn complete(&mut self, key: String, id: &TargetId, result: BuildResult) {
        let Some(output) = self.running_outputs.remove(&key) else {
            tracing::error!(target_id = %key, "completed unit has no registered output");
            return;
        };

        output.finalize(&result);
        for artifact in result.artifacts() {
            if let Err(e) = self.artifacts.collect(id, artifact.clone()) {
                tracing::warn!(target_id = %key, error = %e, "artifact dropped");
            }
        }

        let stdout = output.collected_stdout();
        let stderr = output.collected_stderr();
        match &result {
            BuildResult::Success { artifacts } => tracing::info!(
                target_id = %key,
                artifacts = artifacts.len(),
                "Target execution finished"
            ),
            _ => tracing::info!(
                target_id = %key,
                reason = %result.message().unwrap_or_default(),
                "Target execution failed"
            ),
        }
        tracing::debug!(target_id = %key, stdout = %stdout, stderr = %stderr, "Target output");

        self.notify(&ExecutionEvent::Finished {
            id,
            result: &result,
            stdout: &stdout,
            stderr: &stderr,
        });

        self.results.insert(key, TargetRecord { result, output });
    }

    /// Drive the scheduler until `id` has a result.
    ///
    /// Fails instead of blocking forever when `id` is neither running nor
    /// resolved.
    pub async fn wait_for(&mut self, id: &TargetId) -> Result<(), ExecutorError> {
        let key = id.to_string();
        if self.results.contains_key(&key) {
            return Ok(());
        }
        if !self.is_running(&key) {
            return Err(ExecutorError::NotScheduled(key));
        }

        while !self.results.contains_key(&key) {
            if self.wait_for_any().await.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Drain every running unit and return all recorded results.
    pub async fn wait_for_all(&mut self) -> &HashMap<String, TargetRecord> {
        while self.wait_for_any().await.is_some() {}
        &self.results
    }

    pub fn into_results(self) -> HashMap<String, TargetRecord> {
        self.results
    }

    fn notify(&self, event: &ExecutionEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::ActionError;
    use crate::executor::output::{CollectedOutput, TargetOutput};
    use crate::executor::types::{Artifact, BuildFacts};

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl crate::executor::traits::Action for Counting {
        async fn execute(
            &self,
            output: &dyn TargetOutput,
            _context: &ExecutionContext,
            _working_directory: &Path,
        ) -> Result<BuildResult, ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            output.push_output("ran");
            tokio::task::yield_now().await;
            Ok(BuildResult::ok(vec![Artifact::new("k", "v")]))
        }
    }

    fn context(artifacts: &ArtifactCollector) -> ExecutionContext {
        ExecutionContext::new(artifacts.clone(), BuildFacts::default())
    }

    #[tokio::test]
    async fn wait_for_any_is_noop_when_idle() {
        let mut executor = TargetExecutor::new(2, ArtifactCollector::new());
        assert!(executor.wait_for_any().await.is_none());
        assert!(executor.wait_for_all().await.is_empty());
    }

    #[tokio::test]
    async fn readding_a_target_does_not_run_it_twice() {
        let artifacts = ArtifactCollector::new();
        let mut executor = TargetExecutor::new(4, artifacts.clone());
        let action = Arc::new(Counting::default());
        let target = Target::new("a", action.clone(), vec![]);
        let id = TargetId::new("/repo", "a");

        executor
            .add_target(id.clone(), &target, CollectedOutput::shared(), context(&artifacts))
            .await
            .unwrap();
        executor
            .add_target(id.clone(), &target, CollectedOutput::shared(), context(&artifacts))
            .await
            .unwrap();
        executor.wait_for_all().await;
        executor
            .add_target(id.clone(), &target, CollectedOutput::shared(), context(&artifacts))
            .await
            .unwrap();

        assert_eq!(action.calls.load(Ordering::SeqCst), 1);
        assert_eq!(executor.wait_for_all().await.len(), 1);
        assert_eq!(artifacts.get(&id, "k").unwrap().value, "v");
    }

    #[tokio::test]
    async fn wait_for_unknown_target_errors() {
        let mut executor = TargetExecutor::new(1, ArtifactCollector::new());
        let err = executor
            .wait_for(&TargetId::new("/repo", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::NotScheduled(ref k) if k == "/repo:ghost"));
    }

    #[tokio::test]
    async fn action_error_is_recorded_as_failure() {
        #[derive(Debug)]
        struct Broken;

        #[async_trait]
        impl crate::executor::traits::Action for Broken {
            async fn execute(
                &self,
                _output: &dyn TargetOutput,
                _context: &ExecutionContext,
                _working_directory: &Path,
            ) -> Result<BuildResult, ActionError> {
                Err(ActionError::InvalidTemplate("unterminated".into()))
            }
        }

        let artifacts = ArtifactCollector::new();
        let mut executor = TargetExecutor::new(1, artifacts.clone());
        let id = TargetId::new("/repo", "broken");
        let output = CollectedOutput::shared();
        executor
            .add_target(
                id.clone(),
                &Target::new("broken", Arc::new(Broken), vec![]),
                output.clone(),
                context(&artifacts),
            )
            .await
            .unwrap();

        assert_eq!(
            executor.result(&id),
            Some(&BuildResult::failed("invalid template: unterminated"))
        );
        assert_eq!(output.final_result(), executor.result(&id).cloned());
    }
}
