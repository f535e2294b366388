//! `pookie targets` command

use anyhow::Result;
use serde_json::json;

use crate::GlobalOptions;
use pookie::core::{NonNativeMode, TargetPlatform};

pub fn execute(global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    if shell.is_json() {
        let targets: Vec<_> = TargetPlatform::ALL
            .iter()
            .map(|t| {
                json!({
                    "id": t.as_str(),
                    "tree": t.tree().as_str(),
                    "toolchain": t.toolchain(),
                    "tag": t.distribution_tag(),
                    "triple": t.upstream_triple(),
                })
            })
            .collect();
        shell.json(&json!(targets));
        return Ok(());
    }

    println!(
        "{:<24} {:<18} {:<26} {:<16} {}",
        "TARGET", "TREE", "TOOLCHAIN", "MODE", "TAG"
    );
    for t in TargetPlatform::ALL {
        let cross = t.build_mode(NonNativeMode::Cross);
        let emulate = t.build_mode(NonNativeMode::Emulate);
        let mode = if cross == emulate {
            cross.to_string()
        } else {
            format!("{}/{}", cross, emulate)
        };
        println!(
            "{:<24} {:<18} {:<26} {:<16} {}",
            t.as_str(),
            t.tree().as_str(),
            t.toolchain(),
            mode,
            t.distribution_tag()
        );
    }

    Ok(())
}
