//! Per-platform command policies.
//!
//! Each target class implements [`TargetPolicy`]. The [`CommandComposer`]
//! selects one policy per matrix pair and assembles its pieces around the
//! user's command:
//!
//! ```text
//! build: [setup] [redirect] [user] [fixup + collect]
//! test:  [redirect] [install] [user]        (or an unsupported notice)
//! ```
//!
//! Composition is pure: nothing here runs a process.

mod linux;
mod macos;
mod windows;

pub use linux::{ForeignLinuxPolicy, NativeLinuxPolicy};
pub use macos::MacOsPolicy;
pub use windows::WindowsPolicy;

use crate::builder::plan::{wheelhouse_dir, CommandPlan, Phase, Stage, StageKind, Step, WRAPPER_DIR};
use crate::builder::toolchain::LinuxCompiler;
use crate::core::{MinorVersion, NonNativeMode, PlatformClass, TargetPlatform};

/// Host interpreter install inside every level-3 image.
pub const HOST_PYTHON: &str = "/python";

/// Cross interpreter install: runs on the host, reports the target platform.
pub const CROSS_PYTHON: &str = "/python_cross";

/// Build-time knowledge for one target class.
pub trait TargetPolicy {
    /// Compiler and environment exports run before anything else.
    fn build_setup(&self, minor: MinorVersion) -> Vec<Step>;

    /// Interpreter/installer redirection for the build.
    fn build_redirect(&self, minor: MinorVersion) -> Vec<Step>;

    /// Artifact rewriting after the user's build. Collection into the
    /// wheelhouse is appended by the composer.
    fn post_fixup(&self, minor: MinorVersion) -> Vec<Step>;

    /// Interpreter/installer redirection for tests, or `None` when the
    /// target cannot be tested.
    fn test_redirect(&self, minor: MinorVersion) -> Option<Vec<Step>>;

    fn supports_test(&self) -> bool {
        self.test_redirect(MinorVersion::new(0)).is_some()
    }
}

/// Settings that change how plans are composed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    pub compiler: LinuxCompiler,
    pub non_native: NonNativeMode,
}

/// Composes build and test plans for matrix pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandComposer {
    options: ComposeOptions,
}

impl CommandComposer {
    pub fn new(options: ComposeOptions) -> Self {
        CommandComposer { options }
    }

    /// Select the policy for a target.
    pub fn policy(&self, target: TargetPlatform) -> Box<dyn TargetPolicy> {
        match target.class() {
            PlatformClass::NativeLinux => {
                Box::new(NativeLinuxPolicy::new(target, self.options.compiler))
            }
            PlatformClass::ForeignLinux(arch) => Box::new(ForeignLinuxPolicy::new(
                target,
                arch,
                self.options.non_native,
            )),
            PlatformClass::Windows => Box::new(WindowsPolicy),
            PlatformClass::MacOs(arch) => Box::new(MacOsPolicy::new(target, arch)),
        }
    }

    /// Build plan for one pair.
    pub fn compose_build(
        &self,
        target: TargetPlatform,
        minor: MinorVersion,
        user_cmd: &str,
    ) -> CommandPlan {
        let policy = self.policy(target);

        let mut fixup = policy.post_fixup(minor);
        fixup.push(Step::Collect {
            minor,
            tag: target.distribution_tag().to_string(),
            dir: wheelhouse_dir(target, minor),
        });

        CommandPlan::pipeline([
            Stage::new(StageKind::Setup, policy.build_setup(minor)),
            Stage::new(StageKind::Redirect, policy.build_redirect(minor)),
            Stage::user(user_cmd),
            Stage::new(StageKind::Fixup, fixup),
        ])
    }

    /// Test plan for one pair.
    pub fn compose_test(
        &self,
        target: TargetPlatform,
        minor: MinorVersion,
        user_cmd: &str,
    ) -> CommandPlan {
        let policy = self.policy(target);

        let Some(redirect) = policy.test_redirect(minor) else {
            return CommandPlan::Unsupported {
                target,
                phase: Phase::Test,
            };
        };

        let abi = minor.cp_tag();
        let install = Step::Install {
            wheel: format!(
                "{}/*-{abi}-{abi}*-{tag}.whl",
                wheelhouse_dir(target, minor),
                abi = abi,
                tag = target.distribution_tag()
            ),
        };

        CommandPlan::pipeline([
            Stage::new(StageKind::Redirect, redirect),
            Stage::new(StageKind::Install, vec![install]),
            Stage::user(user_cmd),
        ])
    }

    /// Plan for either phase.
    pub fn compose(
        &self,
        phase: Phase,
        target: TargetPlatform,
        minor: MinorVersion,
        user_cmd: &str,
    ) -> CommandPlan {
        match phase {
            Phase::Build => self.compose_build(target, minor, user_cmd),
            Phase::Test => self.compose_test(target, minor, user_cmd),
        }
    }
}

/// Shims sending `python3`/`python` to `python` and `pip3`/`pip` to `pip`,
/// then putting the shim directory first on `PATH`.
pub(crate) fn redirect_interpreter(python: &str, pip: &str) -> Vec<Step> {
    vec![
        Step::forward("python3", python),
        Step::forward("python", python),
        Step::forward("pip3", pip),
        Step::forward("pip", pip),
        Step::export("PATH", format!("{}:$PATH", WRAPPER_DIR)),
    ]
}
