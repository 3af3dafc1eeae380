use serde::{Deserialize, Serialize};

use super::spec::{ActionSpec, TargetSpec};

/// Name of the target that aggregates the generated build targets.
pub const BUILD_TARGET: &str = "build";

/// Produces the standard targets of one language toolchain.
pub trait TargetGenerator {
    fn targets(&self) -> Vec<TargetSpec>;

    /// Targets that `build` must depend on.
    fn build_target_names(&self) -> Vec<String>;
}

/// The `[generators]` table of a `build.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorsSpec {
    #[serde(default)]
    pub rust: Option<RustTargets>,

    #[serde(default)]
    pub php: Option<PhpTargets>,
}

impl GeneratorsSpec {
    pub fn enabled(&self) -> Vec<&dyn TargetGenerator> {
        let mut generators: Vec<&dyn TargetGenerator> = Vec::new();
        if let Some(rust) = &self.rust {
            generators.push(rust);
        }
        if let Some(php) = &self.php {
            generators.push(php);
        }
        generators
    }
}

/// Cargo targets: `cargo-build`, `cargo-test`, `cargo-clippy`, `cargo-fmt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RustTargets {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TargetGenerator for RustTargets {
    fn targets(&self) -> Vec<TargetSpec> {
        [
            ("cargo-build", &["cargo", "build"][..]),
            ("cargo-test", &["cargo", "test"][..]),
            ("cargo-clippy", &["cargo", "clippy", "--", "-D", "warnings"][..]),
            ("cargo-fmt", &["cargo", "fmt", "--check"][..]),
        ]
        .into_iter()
        .map(|(name, command)| command_target(name, command, &[], self.timeout_secs))
        .collect()
    }

    fn build_target_names(&self) -> Vec<String> {
        self.targets().into_iter().map(|t| t.name).collect()
    }
}

/// Composer targets: `composer-install` plus the checks that need it, and
/// `infection` when a mutation score threshold is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhpTargets {
    #[serde(default)]
    pub min_msi: Option<u32>,

    #[serde(default)]
    pub min_covered_msi: Option<u32>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

const COMPOSER_INSTALL: &str = "composer-install";

impl TargetGenerator for PhpTargets {
    fn targets(&self) -> Vec<TargetSpec> {
        let install = [COMPOSER_INSTALL];
        let mut targets = vec![
            command_target(
                COMPOSER_INSTALL,
                &["composer", "install", "--no-interaction"],
                &[],
                self.timeout_secs,
            ),
            command_target("phpunit", &["vendor/bin/phpunit"], &install, self.timeout_secs),
            command_target(
                "phpstan",
                &["vendor/bin/phpstan", "analyse", "--no-progress"],
                &install,
                self.timeout_secs,
            ),
            command_target("php-cs", &["vendor/bin/phpcs"], &install, self.timeout_secs),
        ];

        if self.min_msi.is_some() || self.min_covered_msi.is_some() {
            let mut command = vec![
                "vendor/bin/infection".to_string(),
                "--no-progress".to_string(),
            ];
            if let Some(msi) = self.min_msi {
                command.push(format!("--min-msi={msi}"));
            }
            if let Some(msi) = self.min_covered_msi {
                command.push(format!("--min-covered-msi={msi}"));
            }
            targets.push(TargetSpec {
                name: "infection".to_string(),
                dependencies: vec![COMPOSER_INSTALL.to_string()],
                action: ActionSpec::Command {
                    command,
                    timeout_secs: self.timeout_secs,
                    env: Default::default(),
                },
            });
        }

        targets
    }

    fn build_target_names(&self) -> Vec<String> {
        self.targets()
            .into_iter()
            .map(|t| t.name)
            .filter(|name| name != COMPOSER_INSTALL)
            .collect()
    }
}

fn command_target(
    name: &str,
    command: &[&str],
    dependencies: &[&str],
    timeout_secs: Option<u64>,
) -> TargetSpec {
    TargetSpec {
        name: name.to_string(),
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        action: ActionSpec::Command {
            command: command.iter().map(|c| c.to_string()).collect(),
            timeout_secs,
            env: Default::default(),
        },
    }
}
