//! Command plan generation.
//!
//! A CommandPlan describes everything one container runs for one phase of
//! one matrix pair, as typed stages. It becomes a shell string only when
//! rendered for `/bin/bash -c`, so composition can be inspected and tested
//! without starting anything.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::{MinorVersion, TargetPlatform};

/// Directory inside the container that redirect shims are written to.
pub const WRAPPER_DIR: &str = "/wrapper";

/// Directory user builds are expected to leave wheels in.
pub const DIST_DIR: &str = "dist";

/// Root of the per-pair artifact directories.
pub const WHEELHOUSE_DIR: &str = "wheelhouse";

/// Which half of a matrix pair a plan is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Build,
    Test,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Build => write!(f, "build"),
            Phase::Test => write!(f, "test"),
        }
    }
}

/// Role of a stage within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Compiler selection and environment exports.
    Setup,
    /// Interpreter and installer shims.
    Redirect,
    /// Installing the pair's wheel before a test.
    Install,
    /// The user's command, verbatim.
    User,
    /// Artifact rewriting and collection after a build.
    Fixup,
}

/// A single shell step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum Step {
    /// `export NAME="value"`. The value is double-quoted, so `$VAR`
    /// references expand.
    Export { name: String, value: String },
    /// An executable script at `/wrapper/<name>` made of `lines`, after a
    /// bash shebang.
    Shim { name: String, lines: Vec<String> },
    /// A plain file written line by line.
    WriteFile { path: String, lines: Vec<String> },
    /// Suffix-anchored rename of the pair's wheels in `dist/`.
    Rename(Rename),
    /// Rewrite host-tagged wheels into macOS wheels.
    DarwinRetag { minor: MinorVersion, tag: String },
    /// Move the pair's wheels out of `dist/` into its wheelhouse directory.
    Collect {
        minor: MinorVersion,
        tag: String,
        dir: String,
    },
    /// Install the pair's wheel from its wheelhouse directory.
    Install { wheel: String },
    /// Passed through verbatim.
    Shell { command: String },
}

impl Step {
    pub fn export(name: impl Into<String>, value: impl Into<String>) -> Self {
        Step::Export {
            name: name.into(),
            value: value.into(),
        }
    }

    /// A shim that forwards every argument to `invocation`.
    pub fn forward(name: impl Into<String>, invocation: &str) -> Self {
        Step::Shim {
            name: name.into(),
            lines: vec![format!("exec {} \"$@\"", invocation)],
        }
    }

    /// Render this step as a shell command.
    pub fn render(&self) -> String {
        match self {
            Step::Export { name, value } => format!("export {}=\"{}\"", name, value),
            Step::Shim { name, lines } => {
                let path = format!("{}/{}", WRAPPER_DIR, name);
                let mut script = vec!["#!/bin/bash".to_string()];
                script.extend(lines.iter().cloned());
                format!(
                    "mkdir -p {} && {} > {} && chmod +x {}",
                    WRAPPER_DIR,
                    printf_lines(&script),
                    path,
                    path
                )
            }
            Step::WriteFile { path, lines } => {
                format!("{} > {}", printf_lines(lines), quote(path))
            }
            Step::Rename(rename) => rename.render(),
            Step::DarwinRetag { minor, tag } => render_darwin_retag(*minor, tag),
            Step::Collect { minor, tag, dir } => format!(
                "mkdir -p {dir} && mv -f {glob} {dir}/",
                dir = dir,
                glob = pair_wheels(*minor, tag)
            ),
            Step::Install { wheel } => {
                format!("python3 -m pip install --quiet --force-reinstall {}", wheel)
            }
            Step::Shell { command } => command.clone(),
        }
    }
}

/// Glob for the wheels one pair leaves in `dist/`: the interpreter tag
/// pins the minor so leftovers from other minors are never picked up.
pub fn pair_wheels(minor: MinorVersion, tag: &str) -> String {
    format!("{}/*-{}-*-{}.whl", DIST_DIR, minor.cp_tag(), tag)
}

/// Rename the pair's `dist/*-cp3X-*-{from}.whl` to `*-{to}.whl`, touching
/// only the trailing platform tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub minor: MinorVersion,
    pub from: String,
    pub to: String,
}

impl Rename {
    pub fn new(minor: MinorVersion, from: impl Into<String>, to: impl Into<String>) -> Self {
        Rename {
            minor,
            from: from.into(),
            to: to.into(),
        }
    }

    /// The rename applied to one file name, if it is one of the pair's
    /// wheels and carries the `from` suffix.
    pub fn apply(&self, file_name: &str) -> Option<String> {
        let suffix = format!("-{}.whl", self.from);
        let interpreter = format!("-{}-", self.minor.cp_tag());
        file_name
            .strip_suffix(&suffix)
            .filter(|stem| stem.contains(&interpreter))
            .map(|stem| format!("{}-{}.whl", stem, self.to))
    }

    /// Shell loop equivalent of [`Rename::apply`]. Glob order decides the
    /// order of moves when several wheels match.
    pub fn render(&self) -> String {
        format!(
            "for f in {glob}; do [ -e \"$f\" ] || continue; mv -f \"$f\" \"${{f%-{from}.whl}}-{to}.whl\"; done",
            glob = pair_wheels(self.minor, &self.from),
            from = self.from,
            to = self.to
        )
    }
}

fn render_darwin_retag(minor: MinorVersion, tag: &str) -> String {
    let abi = minor.nodot();
    let host_wheels = format!("*-cp{abi}-cp{abi}-linux_x86_64.whl", abi = abi);
    let retag = [
        "rm -rf tmp".to_string(),
        "unzip -o \"$orig_whl\" -d tmp".to_string(),
        "cd tmp".to_string(),
        format!(
            "find . -type f -name '*.cpython-{abi}-x86_64-linux-gnu.so' -exec bash -c 'mv \"$0\" \"${{0/-x86_64-linux-gnu/-darwin}}\"' {{}} \\;",
            abi = abi
        ),
        format!("sed -i 's/linux_x86_64/{}/g' *.dist-info/WHEEL", tag),
        "sed -i 's/x86_64-linux-gnu/darwin/g' *.dist-info/RECORD".to_string(),
        format!("zip -qr \"../${{orig_whl/-linux_x86_64/-{}}}\" .", tag),
        "cd ..".to_string(),
        "rm -rf \"$orig_whl\" tmp".to_string(),
    ]
    .join(" && ");

    // A failed retag must fail the container, not just this iteration
    format!(
        "cd {dist} && for orig_whl in {wheels}; do [ -e \"$orig_whl\" ] || continue; {retag} || exit 1; done && cd ..",
        dist = DIST_DIR,
        wheels = host_wheels,
        retag = retag
    )
}

/// A group of steps with one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub kind: StageKind,
    pub steps: Vec<Step>,
}

impl Stage {
    pub fn new(kind: StageKind, steps: Vec<Step>) -> Self {
        Stage { kind, steps }
    }

    pub fn user(command: impl Into<String>) -> Self {
        Stage {
            kind: StageKind::User,
            steps: vec![Step::Shell {
                command: command.into(),
            }],
        }
    }

    pub fn render(&self) -> String {
        self.steps
            .iter()
            .map(Step::render)
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("{phase} is not supported for {target}")]
    Unsupported {
        target: TargetPlatform,
        phase: Phase,
    },
}

/// Everything one container runs, or a notice that nothing should run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CommandPlan {
    Pipeline { stages: Vec<Stage> },
    Unsupported {
        target: TargetPlatform,
        phase: Phase,
    },
}

impl CommandPlan {
    /// Build a pipeline, dropping empty stages.
    pub fn pipeline(stages: impl IntoIterator<Item = Stage>) -> Self {
        CommandPlan::Pipeline {
            stages: stages.into_iter().filter(|s| !s.steps.is_empty()).collect(),
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, CommandPlan::Pipeline { .. })
    }

    pub fn stages(&self) -> &[Stage] {
        match self {
            CommandPlan::Pipeline { stages } => stages,
            CommandPlan::Unsupported { .. } => &[],
        }
    }

    /// Index of the first stage of a kind.
    pub fn position(&self, kind: StageKind) -> Option<usize> {
        self.stages().iter().position(|s| s.kind == kind)
    }

    /// The notice shown instead of running an unsupported plan.
    pub fn notice(&self) -> Option<String> {
        match self {
            CommandPlan::Unsupported { target, phase } => {
                Some(format!("{} is not supported yet for {}", phase, target))
            }
            CommandPlan::Pipeline { .. } => None,
        }
    }

    /// Render to a single `bash -c` command.
    pub fn render(&self) -> Result<String, PlanError> {
        match self {
            CommandPlan::Pipeline { stages } => Ok(stages
                .iter()
                .map(Stage::render)
                .collect::<Vec<_>>()
                .join(" && ")),
            CommandPlan::Unsupported { target, phase } => Err(PlanError::Unsupported {
                target: *target,
                phase: *phase,
            }),
        }
    }
}

/// Per-pair artifact directory, relative to the workspace.
pub fn wheelhouse_dir(target: TargetPlatform, minor: MinorVersion) -> String {
    format!("{}/{}-{}", WHEELHOUSE_DIR, minor.cp_tag(), target)
}

/// Single-quote a string for bash.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn printf_lines(lines: &[String]) -> String {
    let mut out = String::from("printf '%s\\n'");
    for line in lines {
        out.push(' ');
        out.push_str(&quote(line));
    }
    out
}
