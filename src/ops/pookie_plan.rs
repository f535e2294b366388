//! Implementation of `pookie plan`.
//!
//! Composes the same command plans `pookie run` would execute, without
//! resolving versions or touching docker.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::builder::image::runtime_image_name;
use crate::builder::plan::{CommandPlan, Phase};
use crate::builder::policy::{CommandComposer, ComposeOptions};
use crate::core::{MinorVersion, TargetPlatform};

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub targets: Vec<TargetPlatform>,
    pub python_versions: Vec<MinorVersion>,
    pub build: Option<String>,
    pub test: Option<String>,
    pub compose: ComposeOptions,
}

/// One composed phase of one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPhase {
    pub target: TargetPlatform,
    pub python: MinorVersion,
    pub phase: Phase,
    pub image: String,
    pub plan: CommandPlan,
    /// Rendered command; absent for unsupported plans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Compose every phase of the matrix, in run order.
pub fn plan_matrix(opts: &PlanOptions) -> Result<Vec<PlannedPhase>> {
    if opts.build.is_none() && opts.test.is_none() {
        bail!("nothing to plan: pass a build command, a test command, or both");
    }
    if opts.python_versions.is_empty() {
        bail!("no Python versions to plan for");
    }

    let composer = CommandComposer::new(opts.compose);
    let mut minors = opts.python_versions.clone();
    minors.sort();
    minors.dedup();

    let mut targets: Vec<TargetPlatform> = Vec::with_capacity(opts.targets.len());
    for target in &opts.targets {
        if !targets.contains(target) {
            targets.push(*target);
        }
    }

    let phases = [
        (Phase::Build, opts.build.as_deref()),
        (Phase::Test, opts.test.as_deref()),
    ];

    let mut planned = Vec::new();
    for target in targets {
        for minor in &minors {
            for (phase, cmd) in phases {
                let Some(cmd) = cmd else { continue };
                let plan = composer.compose(phase, target, *minor, cmd);
                planned.push(PlannedPhase {
                    target,
                    python: *minor,
                    phase,
                    image: runtime_image_name(target, *minor),
                    command: plan.render().ok(),
                    plan,
                });
            }
        }
    }

    Ok(planned)
}

/// Human-readable listing of planned phases.
pub fn format_plan(planned: &[PlannedPhase]) -> String {
    let mut out = String::new();
    for p in planned {
        out.push_str(&format!(
            "# {} {} / Python {} ({})\n",
            p.phase,
            p.target,
            p.python.dotted(),
            p.image
        ));
        match (&p.command, p.plan.notice()) {
            (Some(command), _) => out.push_str(command),
            (None, Some(notice)) => out.push_str(&notice),
            (None, None) => {}
        }
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> PlanOptions {
        PlanOptions {
            targets: vec![TargetPlatform::WinAmd64, TargetPlatform::WinAmd64],
            python_versions: vec![MinorVersion::new(12), MinorVersion::new(11)],
            build: Some("python3 -m build".to_string()),
            test: Some("pytest".to_string()),
            compose: ComposeOptions::default(),
        }
    }

    #[test]
    fn test_plan_order_and_support() {
        let planned = plan_matrix(&opts()).unwrap();
        let order: Vec<(u32, Phase, bool)> = planned
            .iter()
            .map(|p| (p.python.get(), p.phase, p.command.is_some()))
            .collect();

        assert_eq!(
            order,
            vec![
                (11, Phase::Build, true),
                (11, Phase::Test, false),
                (12, Phase::Build, true),
                (12, Phase::Test, false),
            ]
        );
        assert_eq!(planned[0].image, "win-macosx-pookie-lvl3-cp311-win_amd64");
    }

    #[test]
    fn test_plan_requires_a_command() {
        let err = plan_matrix(&PlanOptions {
            build: None,
            test: None,
            ..opts()
        })
        .unwrap_err();
        assert!(err.to_string().contains("nothing to plan"));
    }

    #[test]
    fn test_format_shows_notice() {
        let planned = plan_matrix(&PlanOptions {
            build: None,
            python_versions: vec![MinorVersion::new(12)],
            ..opts()
        })
        .unwrap();

        let text = format_plan(&planned);
        assert!(text.starts_with("# test win_amd64 / Python 3.12 (win-macosx-pookie-lvl3-cp312-win_amd64)\n"));
        assert!(text.contains("test is not supported yet for win_amd64"));
    }

    #[test]
    fn test_plan_serializes_with_command() {
        let planned = plan_matrix(&PlanOptions {
            targets: vec![TargetPlatform::ManylinuxX86_64],
            python_versions: vec![MinorVersion::new(12)],
            test: None,
            ..opts()
        })
        .unwrap();

        let json = serde_json::to_value(&planned).unwrap();
        assert_eq!(json[0]["phase"], "build");
        assert_eq!(json[0]["plan"]["type"], "pipeline");
        assert!(json[0]["command"]
            .as_str()
            .unwrap()
            .contains("python3 -m build"));
    }
}
