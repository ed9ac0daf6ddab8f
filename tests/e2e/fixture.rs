//! E2E fixture: an isolated `VIBE_ROOT` with a seeded catalog, step logging
//! and a report of every CLI invocation.

use std::process::Command;
use std::time::{Duration, Instant};

use vibe_search::config::Config;
use vibe_search::search::{SearchExecutor, ServiceContext};
use vibe_search::storage::ProductRecord;
use vibe_search::test_utils::fixtures::CatalogFixture;

/// Dimensions the default hash backend uses.
pub const TEXT_DIMS: usize = 384;
pub const IMAGE_DIMS: usize = 512;

/// Step result for report generation.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub duration: Duration,
    pub output_summary: String,
}

pub struct E2EFixture {
    pub scenario_name: String,
    pub catalog: CatalogFixture,
    start_time: Instant,
    step_count: usize,
    step_results: Vec<StepResult>,
}

impl E2EFixture {
    pub fn new(scenario_name: &str) -> Self {
        let catalog = CatalogFixture::new();

        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E SCENARIO: {}", scenario_name);
        println!("{}", "█".repeat(70));
        println!("[E2E] Root: {:?}", catalog.root);
        println!("[E2E] Catalog: {:?}", catalog.db_path);

        Self {
            scenario_name: scenario_name.to_string(),
            catalog,
            start_time: Instant::now(),
            step_count: 0,
            step_results: Vec::new(),
        }
    }

    /// Fixture with the sample catalog already loaded.
    pub fn seeded(scenario_name: &str) -> Self {
        let fixture = Self::new(scenario_name);
        fixture.catalog.seed_sample_catalog(TEXT_DIMS, IMAGE_DIMS);
        fixture
    }

    pub fn log_step(&mut self, description: &str) {
        self.step_count += 1;
        println!();
        println!("┌{}", "─".repeat(68));
        println!("│ STEP {}: {}", self.step_count, description);
        println!("│ Time: {:?}", self.start_time.elapsed());
        println!("└{}", "─".repeat(68));
    }

    pub fn insert(&self, product: &ProductRecord) {
        self.catalog.insert(product);
        println!("[E2E] Upserted {}", product.product_id);
    }

    /// Run the `vibe` binary against this fixture's root.
    pub fn run_vibe(&mut self, args: &[&str]) -> CommandOutput {
        self.run_vibe_with_env(args, &[])
    }

    pub fn run_vibe_with_env(&mut self, args: &[&str], envs: &[(&str, &str)]) -> CommandOutput {
        let step_name = format!("vibe {}", args.join(" "));
        let start = Instant::now();
        println!();
        println!("[CMD] {}", step_name);

        let mut command = Command::new(env!("CARGO_BIN_EXE_vibe"));
        command
            .args(args)
            .env("HOME", &self.catalog.root)
            .env("XDG_CONFIG_HOME", self.catalog.root.join("xdg"))
            .env("VIBE_ROOT", &self.catalog.root)
            .env_remove("VIBE_CONFIG")
            .env_remove("RUST_LOG");
        for (key, value) in envs {
            command.env(key, value);
        }
        let output = command.output().expect("Failed to execute vibe command");

        let result = CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            elapsed: start.elapsed(),
        };

        println!("[CMD] Exit: {} ({:?})", result.exit_code, result.elapsed);
        if !result.stdout.is_empty() {
            println!("[STDOUT] {}", truncate(&result.stdout, 500));
        }
        if !result.stderr.is_empty() {
            println!("[STDERR] {}", truncate(&result.stderr, 500));
        }

        let output_summary = if result.success {
            format!("OK ({})", truncate(&result.stdout, 50))
        } else {
            format!("FAIL: {}", truncate(&result.stderr, 100))
        };
        self.step_results.push(StepResult {
            name: step_name,
            success: result.success,
            duration: result.elapsed,
            output_summary,
        });

        result
    }

    /// Library-level services over the same catalog, default config.
    pub fn services(&self, config: &Config) -> (ServiceContext, SearchExecutor) {
        let services = ServiceContext::new(
            &config.embedding,
            &config.catalog,
            self.catalog.db_path.clone(),
        );
        (services, SearchExecutor::new(&config.search))
    }

    pub fn assert_success(&self, output: &CommandOutput, operation: &str) {
        assert!(
            output.success,
            "[E2E] {} failed with exit code {}: {}",
            operation, output.exit_code, output.stderr
        );
        println!("[ASSERT] {} - SUCCESS", operation);
    }

    pub fn assert_failure(&self, output: &CommandOutput, operation: &str) {
        assert!(
            !output.success,
            "[E2E] {} unexpectedly succeeded: {}",
            operation,
            truncate(&output.stdout, 200)
        );
        println!("[ASSERT] {} - FAILED AS EXPECTED", operation);
    }

    pub fn generate_report(&self) {
        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E REPORT: {}", self.scenario_name);
        println!("{}", "█".repeat(70));
        println!("Total Steps: {}", self.step_count);
        println!("Total Time:  {:?}", self.start_time.elapsed());
        println!();
        for (i, step) in self.step_results.iter().enumerate() {
            let status = if step.success { "✓" } else { "✗" };
            println!("{:2}. {} {} ({:?})", i + 1, status, step.name, step.duration);
            if !step.success {
                println!("     └─ {}", step.output_summary);
            }
        }
        println!("{}", "█".repeat(70));
    }
}

impl Drop for E2EFixture {
    fn drop(&mut self) {
        println!();
        println!("█ E2E CLEANUP: {} ({:?})", self.scenario_name, self.start_time.elapsed());
    }
}

pub struct CommandOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl CommandOutput {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("stdout should be valid JSON")
    }
}

/// Product ids of a `results` array, in rank order.
pub fn product_ids(results: &serde_json::Value) -> Vec<String> {
    results
        .as_array()
        .expect("results array")
        .iter()
        .map(|r| r["product_id"].as_str().expect("product_id").to_string())
        .collect()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let head: String = s.chars().take(max_len).collect();
    format!("{head}...")
}
