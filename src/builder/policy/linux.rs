//! Linux policies.

use crate::builder::plan::{Rename, Step};
use crate::builder::policy::{redirect_interpreter, TargetPolicy, CROSS_PYTHON, HOST_PYTHON};
use crate::builder::toolchain::LinuxCompiler;
use crate::core::{LinuxArch, MinorVersion, NonNativeMode, TargetPlatform, HOST_WHEEL_TAG};

/// x86_64 glibc and musl targets: the image's own interpreter builds and
/// tests directly.
#[derive(Debug, Clone, Copy)]
pub struct NativeLinuxPolicy {
    target: TargetPlatform,
    compiler: LinuxCompiler,
}

impl NativeLinuxPolicy {
    pub fn new(target: TargetPlatform, compiler: LinuxCompiler) -> Self {
        NativeLinuxPolicy { target, compiler }
    }

    fn redirect(&self) -> Vec<Step> {
        redirect_interpreter(
            &format!("{}/bin/python3", HOST_PYTHON),
            &format!("{}/bin/pip3", HOST_PYTHON),
        )
    }
}

impl TargetPolicy for NativeLinuxPolicy {
    fn build_setup(&self, _minor: MinorVersion) -> Vec<Step> {
        vec![
            Step::export("CC", self.compiler.cc()),
            Step::export("CXX", self.compiler.cxx()),
        ]
    }

    fn build_redirect(&self, _minor: MinorVersion) -> Vec<Step> {
        self.redirect()
    }

    fn post_fixup(&self, minor: MinorVersion) -> Vec<Step> {
        vec![Step::Rename(Rename::new(
            minor,
            HOST_WHEEL_TAG,
            self.target.distribution_tag(),
        ))]
    }

    fn test_redirect(&self, _minor: MinorVersion) -> Option<Vec<Step>> {
        Some(self.redirect())
    }
}

/// aarch64, armv7l, ppc64le, riscv64 and s390x glibc targets.
///
/// In cross mode the build runs on the host-side cross interpreter with the
/// layer's cross toolchain. In emulate mode the target interpreter itself
/// runs under qemu. Tests always run the target interpreter under qemu.
#[derive(Debug, Clone, Copy)]
pub struct ForeignLinuxPolicy {
    target: TargetPlatform,
    arch: LinuxArch,
    mode: NonNativeMode,
}

impl ForeignLinuxPolicy {
    pub fn new(target: TargetPlatform, arch: LinuxArch, mode: NonNativeMode) -> Self {
        ForeignLinuxPolicy { target, arch, mode }
    }

    /// Prefix that runs a target binary on the host.
    fn emulator(&self) -> String {
        format!(
            "env LD_LIBRARY_PATH={}/lib {} -L {}",
            HOST_PYTHON,
            self.arch.qemu(),
            self.arch.sysroot()
        )
    }

    fn emulated_redirect(&self) -> Vec<Step> {
        let python = format!("{} {}/bin/python3", self.emulator(), HOST_PYTHON);
        // pip's entry script has a host shebang, so go through the module
        let pip = format!("{} -m pip", python);
        redirect_interpreter(&python, &pip)
    }

    /// Platform tag the build interpreter stamps on wheels.
    fn produced_tag(&self) -> &'static str {
        match self.mode {
            NonNativeMode::Cross => HOST_WHEEL_TAG,
            NonNativeMode::Emulate => self.arch.emulated_wheel_tag(),
        }
    }
}

impl TargetPolicy for ForeignLinuxPolicy {
    fn build_setup(&self, _minor: MinorVersion) -> Vec<Step> {
        Vec::new()
    }

    fn build_redirect(&self, _minor: MinorVersion) -> Vec<Step> {
        match self.mode {
            NonNativeMode::Cross => redirect_interpreter(
                &format!("{}/bin/python3", CROSS_PYTHON),
                &format!("{}/bin/pip3", CROSS_PYTHON),
            ),
            NonNativeMode::Emulate => self.emulated_redirect(),
        }
    }

    fn post_fixup(&self, minor: MinorVersion) -> Vec<Step> {
        vec![Step::Rename(Rename::new(
            minor,
            self.produced_tag(),
            self.target.distribution_tag(),
        ))]
    }

    fn test_redirect(&self, _minor: MinorVersion) -> Option<Vec<Step>> {
        Some(self.emulated_redirect())
    }
}
