use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use monobuild_core::api::{ExecutionEvent, ExecutionObserver};

/// Interactive progress display for a build.
///
/// An overall bar counts resolved targets; each running target gets a
/// spinner that is replaced by a result line when it finishes. Output of
/// failed targets is printed above the bars.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    target_bars: Mutex<HashMap<String, (ProgressBar, Instant)>>,
}

impl ProgressMonitor {
    /// `enabled = false` keeps the bookkeeping but draws nothing, for when
    /// stderr is not a terminal.
    pub fn new(total_targets: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
                overall: ProgressBar::hidden(),
                target_bars: Mutex::new(HashMap::new()),
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_targets as u64));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} targets {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            target_bars: Mutex::new(HashMap::new()),
        }
    }

    fn start_target(&self, id: &str) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(id.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        self.bars().insert(id.to_string(), (bar, Instant::now()));
        self.overall.set_message(id.to_string());
    }

    fn finish_target(&self, id: &str, success: bool) {
        if let Some((bar, started)) = self.bars().remove(id) {
            let icon = if success { "✅" } else { "❌" };
            bar.finish_with_message(format!(
                "{icon} {id} ({}ms)",
                started.elapsed().as_millis()
            ));
        }
        self.overall.inc(1);
    }

    fn bars(&self) -> std::sync::MutexGuard<'_, HashMap<String, (ProgressBar, Instant)>> {
        self.target_bars.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn print_above(&self, text: &str) {
        if self.overall.is_hidden() {
            return;
        }
        if let Err(e) = self.multi.println(text) {
            tracing::debug!(error = %e, "progress println failed");
        }
    }

    pub fn finish(&self, success: bool) {
        let msg = if success {
            "✅ All targets succeeded"
        } else {
            "❌ Build failed"
        };
        self.overall.finish_with_message(msg);
    }
}

impl ExecutionObserver for ProgressMonitor {
    fn on_event(&self, event: &ExecutionEvent<'_>) {
        match event {
            ExecutionEvent::Started { id } => self.start_target(&id.to_string()),
            ExecutionEvent::Skipped { id, result } => {
                self.overall.inc(1);
                self.print_above(&format!("⏭  {id}: {result}"));
            }
            ExecutionEvent::Finished {
                id,
                result,
                stdout,
                stderr,
            } => {
                let key = id.to_string();
                self.finish_target(&key, result.has_succeeded());
                if !result.has_succeeded() {
                    self.print_above(&format!("--- {key} {result}"));
                    for captured in [stdout, stderr] {
                        if !captured.trim().is_empty() {
                            self.print_above(captured.trim_end());
                        }
                    }
                }
            }
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, (bar, _)) in self.bars().drain() {
            bar.finish_and_clear();
        }
    }
}
