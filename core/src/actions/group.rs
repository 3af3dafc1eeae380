use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::executor::{Action, BuildResult, ExecutionContext, TargetOutput};

/// Runs several actions one after another inside a single target.
///
/// Stops at the first sub-action that does not succeed and returns its
/// result; otherwise succeeds with the artifacts of all sub-actions.
#[derive(Debug, Clone)]
pub struct Group {
    actions: Vec<Arc<dyn Action>>,
}

impl Group {
    pub fn new(actions: Vec<Arc<dyn Action>>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl Action for Group {
    async fn execute(
        &self,
        output: &dyn TargetOutput,
        context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let mut artifacts = Vec::new();
        for action in &self.actions {
            let result = action.execute(output, context, working_directory).await?;
            if !result.has_succeeded() {
                return Ok(result);
            }
            artifacts.extend_from_slice(result.artifacts());
        }
        Ok(BuildResult::ok(artifacts))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::executor::{Artifact, ArtifactCollector, BuildFacts, CollectedOutput};

    #[derive(Debug)]
    struct Fixed {
        result: BuildResult,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(result: BuildResult) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Action for Fixed {
        async fn execute(
            &self,
            _output: &dyn TargetOutput,
            _context: &ExecutionContext,
            _working_directory: &Path,
        ) -> Result<BuildResult, ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    fn context() -> ExecutionContext {
        ExecutionContext::new(ArtifactCollector::new(), BuildFacts::default())
    }

    #[tokio::test]
    async fn concatenates_artifacts_of_all_steps() {
        let group = Group::new(vec![
            Fixed::new(BuildResult::ok(vec![Artifact::new("a", "1")])),
            Fixed::new(BuildResult::ok(vec![Artifact::new("b", "2")])),
        ]);

        let result = group
            .execute(&CollectedOutput::new(), &context(), Path::new("/repo"))
            .await
            .unwrap();
        assert_eq!(
            result,
            BuildResult::ok(vec![Artifact::new("a", "1"), Artifact::new("b", "2")])
        );
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let last = Fixed::new(BuildResult::ok(vec![]));
        let group = Group::new(vec![
            Fixed::new(BuildResult::ok(vec![Artifact::new("a", "1")])),
            Fixed::new(BuildResult::failed("step two")),
            last.clone(),
        ]);

        let result = group
            .execute(&CollectedOutput::new(), &context(), Path::new("/repo"))
            .await
            .unwrap();
        assert_eq!(result, BuildResult::failed("step two"));
        assert_eq!(last.calls.load(Ordering::SeqCst), 0);
    }
}
