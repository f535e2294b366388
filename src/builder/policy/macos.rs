//! macOS (osxcross) policy.

use crate::builder::plan::{Step, WRAPPER_DIR};
use crate::builder::policy::{redirect_interpreter, TargetPolicy, CROSS_PYTHON, HOST_PYTHON};
use crate::core::{MacArch, MinorVersion, TargetPlatform};

/// SDK shipped in the osxcross toolchain image.
pub const MACOS_SDK: &str = "/osxcross/target/SDK/MacOSX11.1.sdk";

const OSXCROSS_BIN: &str = "/osxcross/target/bin";
const CLANG_WRAPPER: &str = "macos-clang";

#[derive(Debug, Clone, Copy)]
pub struct MacOsPolicy {
    target: TargetPlatform,
    arch: MacArch,
}

impl MacOsPolicy {
    pub fn new(target: TargetPlatform, arch: MacArch) -> Self {
        MacOsPolicy { target, arch }
    }

    fn tool(&self, name: &str) -> String {
        format!("{}-{}", self.arch.tool_prefix(), name)
    }
}

impl TargetPolicy for MacOsPolicy {
    fn build_setup(&self, minor: MinorVersion) -> Vec<Step> {
        let wrapper = format!("{}/{}", WRAPPER_DIR, CLANG_WRAPPER);
        let version = minor.dotted();

        vec![
            Step::forward(
                CLANG_WRAPPER,
                &format!(
                    "{} -fuse-ld={}/{}",
                    self.arch.clang(),
                    OSXCROSS_BIN,
                    self.tool("ld")
                ),
            ),
            Step::export("CC", &wrapper),
            Step::export("CXX", &wrapper),
            Step::export("LDSHARED", format!("{} -shared", wrapper)),
            Step::export("AR", self.tool("ar")),
            Step::export("RANLIB", self.tool("ranlib")),
            Step::export("STRIP", self.tool("strip")),
            Step::export(
                "CFLAGS",
                format!(
                    "--target={} -isysroot {} -I{}/include/python{}",
                    self.arch.clang_target(),
                    MACOS_SDK,
                    HOST_PYTHON,
                    version
                ),
            ),
            Step::export(
                "LDFLAGS",
                format!(
                    "-isysroot {sdk} -Wl,-syslibroot,{sdk} -L{py}/lib -lpython{v}",
                    sdk = MACOS_SDK,
                    py = HOST_PYTHON,
                    v = version
                ),
            ),
        ]
    }

    fn build_redirect(&self, _minor: MinorVersion) -> Vec<Step> {
        redirect_interpreter(
            &format!("{}/bin/python3", CROSS_PYTHON),
            &format!("{}/bin/pip3", CROSS_PYTHON),
        )
    }

    fn post_fixup(&self, minor: MinorVersion) -> Vec<Step> {
        vec![Step::DarwinRetag {
            minor,
            tag: self.target.distribution_tag().to_string(),
        }]
    }

    fn test_redirect(&self, _minor: MinorVersion) -> Option<Vec<Step>> {
        None
    }
}
