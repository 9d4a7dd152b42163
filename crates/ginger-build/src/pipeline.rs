//! Bounded-parallelism build pipeline

use crate::compiler::{BuildUnit, Compiler};
use crate::error::BuildError;
use ginger_types::Function;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument};

/// Maximum number of compile tasks running at once
pub const DEFAULT_MAX_PARALLEL: usize = 5;

/// Per-function outcome of one pipeline run
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Function name to artifact path
    pub artifacts: BTreeMap<String, PathBuf>,
    /// Function name to the reason it did not build
    pub failures: BTreeMap<String, BuildError>,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn artifact(&self, function: &str) -> Option<&PathBuf> {
        self.artifacts.get(function)
    }
}

/// Compiles functions with at most `max_parallel` compiles in flight.
///
/// Workers are released as soon as a compile finishes, so a slow unit never
/// holds back units queued behind it.
pub struct BuildPipeline {
    compiler: Arc<dyn Compiler>,
    source_root: PathBuf,
    output_dir: PathBuf,
    max_parallel: usize,
}

impl BuildPipeline {
    /// `source_root` holds one directory per function; artifacts land in
    /// `output_dir/<name>`
    pub fn new(
        compiler: Arc<dyn Compiler>,
        source_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler,
            source_root: source_root.into(),
            output_dir: output_dir.into(),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    fn unit(&self, function: &Function) -> BuildUnit {
        BuildUnit {
            name: function.name.clone(),
            source_dir: self.source_root.join(&function.name),
            output_path: self.output_dir.join(&function.name),
        }
    }

    /// Build every function. Never fails as a whole.
    #[instrument(skip(self, functions), fields(count = functions.len()))]
    pub async fn build(&self, functions: &[Function]) -> BuildReport {
        let mut report = BuildReport::default();
        if functions.is_empty() {
            return report;
        }

        let permits = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = Vec::with_capacity(functions.len());

        for function in functions {
            let unit = self.unit(function);
            let compiler = Arc::clone(&self.compiler);
            let permits = Arc::clone(&permits);
            let name = unit.name.clone();
            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.map_err(|e| BuildError::Aborted {
                    function: unit.name.clone(),
                    reason: e.to_string(),
                })?;
                compiler.compile(&unit).await
            });
            tasks.push((name, handle));
        }

        for (name, handle) in tasks {
            let outcome = handle.await.unwrap_or_else(|e| {
                Err(BuildError::Aborted {
                    function: name.clone(),
                    reason: e.to_string(),
                })
            });
            match outcome {
                Ok(artifact) => {
                    info!(function = %name, artifact = %artifact.display(), "Build succeeded");
                    report.artifacts.insert(name, artifact);
                }
                Err(e) => {
                    error!(function = %name, error = %e, "Build failed");
                    report.failures.insert(name, e);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fails any unit whose name starts with "bad", tracks peak concurrency
    #[derive(Default)]
    struct FakeCompiler {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Compiler for FakeCompiler {
        async fn compile(&self, unit: &BuildUnit) -> Result<PathBuf> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            if unit.name.starts_with("bad") {
                return Err(BuildError::CompileFailed {
                    function: unit.name.clone(),
                    diagnostics: "undefined: foo".into(),
                });
            }
            Ok(unit.output_path.clone())
        }
    }

    fn functions(names: &[String]) -> Vec<Function> {
        names.iter().map(Function::new).collect()
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_report() {
        let pipeline = BuildPipeline::new(Arc::new(FakeCompiler::default()), "src", "out");
        let report = pipeline.build(&[]).await;
        assert!(report.artifacts.is_empty());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_failures_do_not_cancel_siblings() {
        let compiler = Arc::new(FakeCompiler::default());
        let pipeline = BuildPipeline::new(compiler.clone(), "src", "out");
        let names: Vec<String> = ["ok1", "bad1", "ok2", "ok3", "bad2", "ok4", "ok5", "ok6"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = pipeline.build(&functions(&names)).await;
        assert_eq!(report.artifacts.len(), 6);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.artifact("ok1"), Some(&PathBuf::from("out/ok1")));
        assert!(matches!(
            report.failures.get("bad2"),
            Some(BuildError::CompileFailed { .. })
        ));
        assert!(compiler.peak.load(Ordering::SeqCst) <= DEFAULT_MAX_PARALLEL);
    }

    #[tokio::test]
    async fn test_parallelism_is_bounded() {
        let compiler = Arc::new(FakeCompiler::default());
        let pipeline = BuildPipeline::new(compiler.clone(), "src", "out").with_max_parallel(2);
        let names: Vec<String> = (0..10).map(|i| format!("f{}", i)).collect();
        let report = pipeline.build(&functions(&names)).await;
        assert_eq!(report.artifacts.len(), 10);
        assert!(compiler.peak.load(Ordering::SeqCst) <= 2);
    }

    fn name_strategy() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::btree_set("(ok|bad)[a-z]{1,4}", 0..16)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn property_result_set_is_n_minus_k(names in name_strategy()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");

            let report = rt.block_on(async {
                let pipeline = BuildPipeline::new(Arc::new(FakeCompiler::default()), "src", "out");
                pipeline.build(&functions(&names)).await
            });

            let expected: BTreeSet<String> =
                names.iter().filter(|n| !n.starts_with("bad")).cloned().collect();
            let built: BTreeSet<String> = report.artifacts.keys().cloned().collect();
            let failed = names.len() - expected.len();
            prop_assert_eq!(built, expected);
            prop_assert_eq!(report.failures.len(), failed);
        }
    }
}
