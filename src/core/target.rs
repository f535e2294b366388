//! Target platforms - what gets built for.
//!
//! A [`TargetPlatform`] is one OS/architecture/libc combination a wheel is
//! produced for. Each platform carries the static knowledge the rest of the
//! crate needs: which image tree it belongs to, which toolchain layer it
//! builds on, the upstream runtime triple, and the distribution tag that ends
//! up in wheel filenames.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wheel platform tag produced by the build host's own interpreter.
///
/// Every image runs on an x86_64 glibc host, so anything built by a host
/// interpreter comes out tagged like this and has to be renamed.
pub const HOST_WHEEL_TAG: &str = "linux_x86_64";

/// A supported target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetPlatform {
    #[serde(rename = "manylinux_2_17_x86_64")]
    ManylinuxX86_64,
    #[serde(rename = "manylinux_2_17_aarch64")]
    ManylinuxAarch64,
    #[serde(rename = "manylinux_2_17_armv7l")]
    ManylinuxArmv7l,
    #[serde(rename = "manylinux_2_17_ppc64le")]
    ManylinuxPpc64le,
    #[serde(rename = "manylinux_2_17_riscv64")]
    ManylinuxRiscv64,
    #[serde(rename = "manylinux_2_17_s390x")]
    ManylinuxS390x,
    #[serde(rename = "musllinux_1_2_x86_64")]
    MusllinuxX86_64,
    #[serde(rename = "win_amd64")]
    WinAmd64,
    #[serde(rename = "macosx_11_0_x86_64")]
    MacosX86_64,
    #[serde(rename = "macosx_11_0_arm64")]
    MacosArm64,
}

impl TargetPlatform {
    /// Every supported target, in the default matrix order.
    pub const ALL: [TargetPlatform; 10] = [
        TargetPlatform::ManylinuxX86_64,
        TargetPlatform::ManylinuxAarch64,
        TargetPlatform::ManylinuxArmv7l,
        TargetPlatform::ManylinuxPpc64le,
        TargetPlatform::ManylinuxRiscv64,
        TargetPlatform::ManylinuxS390x,
        TargetPlatform::MusllinuxX86_64,
        TargetPlatform::WinAmd64,
        TargetPlatform::MacosX86_64,
        TargetPlatform::MacosArm64,
    ];

    /// The identifier used on the command line and in image names.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TargetPlatform::ManylinuxX86_64 => "manylinux_2_17_x86_64",
            TargetPlatform::ManylinuxAarch64 => "manylinux_2_17_aarch64",
            TargetPlatform::ManylinuxArmv7l => "manylinux_2_17_armv7l",
            TargetPlatform::ManylinuxPpc64le => "manylinux_2_17_ppc64le",
            TargetPlatform::ManylinuxRiscv64 => "manylinux_2_17_riscv64",
            TargetPlatform::ManylinuxS390x => "manylinux_2_17_s390x",
            TargetPlatform::MusllinuxX86_64 => "musllinux_1_2_x86_64",
            TargetPlatform::WinAmd64 => "win_amd64",
            TargetPlatform::MacosX86_64 => "macosx_11_0_x86_64",
            TargetPlatform::MacosArm64 => "macosx_11_0_arm64",
        }
    }

    /// Platform identifier used by python-build-standalone asset names.
    pub const fn upstream_triple(&self) -> &'static str {
        match self {
            TargetPlatform::ManylinuxX86_64 => "x86_64-unknown-linux-gnu",
            TargetPlatform::ManylinuxAarch64 => "aarch64-unknown-linux-gnu",
            TargetPlatform::ManylinuxArmv7l => "armv7-unknown-linux-gnueabihf",
            TargetPlatform::ManylinuxPpc64le => "ppc64le-unknown-linux-gnu",
            TargetPlatform::ManylinuxRiscv64 => "riscv64-unknown-linux-gnu",
            TargetPlatform::ManylinuxS390x => "s390x-unknown-linux-gnu",
            TargetPlatform::MusllinuxX86_64 => "x86_64-unknown-linux-musl",
            TargetPlatform::WinAmd64 => "x86_64-pc-windows-msvc",
            TargetPlatform::MacosX86_64 => "x86_64-apple-darwin",
            TargetPlatform::MacosArm64 => "aarch64-apple-darwin",
        }
    }

    /// Image tree this target's layers live in.
    pub const fn tree(&self) -> Tree {
        match self {
            TargetPlatform::MusllinuxX86_64 => Tree::Musllinux,
            TargetPlatform::WinAmd64 | TargetPlatform::MacosX86_64 | TargetPlatform::MacosArm64 => {
                Tree::WinMacosx
            }
            _ => Tree::Manylinux,
        }
    }

    /// Name of the level-2 toolchain layer, without the tree prefix.
    pub const fn toolchain(&self) -> &'static str {
        match self {
            TargetPlatform::ManylinuxX86_64 => "gnu-gcc-clang",
            TargetPlatform::ManylinuxAarch64 => "gcc-aarch64-linux-gnu",
            TargetPlatform::ManylinuxArmv7l => "gcc-arm-linux-gnueabihf",
            TargetPlatform::ManylinuxPpc64le => "gcc-powerpc64le-linux-gnu",
            TargetPlatform::ManylinuxRiscv64 => "gcc-riscv64-linux-gnu",
            TargetPlatform::ManylinuxS390x => "gcc-s390x-linux-gnu",
            TargetPlatform::MusllinuxX86_64 => "musl-gcc-clang",
            TargetPlatform::WinAmd64 => "msvc-mingw64",
            TargetPlatform::MacosX86_64 | TargetPlatform::MacosArm64 => "osxcross",
        }
    }

    /// Platform tag written into produced wheel filenames.
    pub const fn distribution_tag(&self) -> &'static str {
        match self {
            TargetPlatform::ManylinuxX86_64 => "manylinux_2_17_x86_64.manylinux2014_x86_64",
            TargetPlatform::ManylinuxAarch64 => "manylinux_2_17_aarch64.manylinux2014_aarch64",
            TargetPlatform::ManylinuxArmv7l => "manylinux_2_17_armv7l.manylinux2014_armv7l",
            TargetPlatform::ManylinuxPpc64le => "manylinux_2_17_ppc64le.manylinux2014_ppc64le",
            // riscv64 postdates manylinux2014, so there is no legacy alias.
            TargetPlatform::ManylinuxRiscv64 => "manylinux_2_17_riscv64",
            TargetPlatform::ManylinuxS390x => "manylinux_2_17_s390x.manylinux2014_s390x",
            TargetPlatform::MusllinuxX86_64 => "musllinux_1_2_x86_64",
            TargetPlatform::WinAmd64 => "win_amd64",
            TargetPlatform::MacosX86_64 => "macosx_11_0_x86_64",
            TargetPlatform::MacosArm64 => "macosx_11_0_arm64",
        }
    }

    /// Coarse platform class used to pick a command policy.
    pub const fn class(&self) -> PlatformClass {
        match self {
            TargetPlatform::ManylinuxX86_64 | TargetPlatform::MusllinuxX86_64 => {
                PlatformClass::NativeLinux
            }
            TargetPlatform::ManylinuxAarch64 => PlatformClass::ForeignLinux(LinuxArch::Aarch64),
            TargetPlatform::ManylinuxArmv7l => PlatformClass::ForeignLinux(LinuxArch::Armv7l),
            TargetPlatform::ManylinuxPpc64le => PlatformClass::ForeignLinux(LinuxArch::Ppc64le),
            TargetPlatform::ManylinuxRiscv64 => PlatformClass::ForeignLinux(LinuxArch::Riscv64),
            TargetPlatform::ManylinuxS390x => PlatformClass::ForeignLinux(LinuxArch::S390x),
            TargetPlatform::WinAmd64 => PlatformClass::Windows,
            TargetPlatform::MacosX86_64 => PlatformClass::MacOs(MacArch::X86_64),
            TargetPlatform::MacosArm64 => PlatformClass::MacOs(MacArch::Arm64),
        }
    }

    /// Effective build mode given the configured mode for non-native Linux.
    pub const fn build_mode(&self, non_native: NonNativeMode) -> BuildMode {
        match self.class() {
            PlatformClass::NativeLinux => BuildMode::Native,
            PlatformClass::ForeignLinux(_) => match non_native {
                NonNativeMode::Cross => BuildMode::Cross,
                NonNativeMode::Emulate => BuildMode::Emulate,
            },
            PlatformClass::Windows | PlatformClass::MacOs(_) => BuildMode::Cross,
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing one of the string-valued platform settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}'; expected one of: {expected}")]
pub struct ParseSettingError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

impl FromStr for TargetPlatform {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetPlatform::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseSettingError {
                kind: "target",
                value: s.to_string(),
                expected: TargetPlatform::ALL
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// A group of targets sharing one level-1 base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tree {
    Manylinux,
    Musllinux,
    #[serde(rename = "win-macosx-pookie")]
    WinMacosx,
}

impl Tree {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tree::Manylinux => "manylinux",
            Tree::Musllinux => "musllinux",
            Tree::WinMacosx => "win-macosx-pookie",
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a target's code is produced on the x86_64 build host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Host and target match.
    Native,
    /// A cross toolchain builds target code without running it.
    Cross,
    /// Target binaries run under qemu user-mode emulation.
    Emulate,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Native => write!(f, "native"),
            BuildMode::Cross => write!(f, "cross"),
            BuildMode::Emulate => write!(f, "emulate"),
        }
    }
}

/// Configured strategy for non-native Linux targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonNativeMode {
    #[default]
    Cross,
    Emulate,
}

impl fmt::Display for NonNativeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonNativeMode::Cross => write!(f, "cross"),
            NonNativeMode::Emulate => write!(f, "emulate"),
        }
    }
}

impl FromStr for NonNativeMode {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cross" => Ok(NonNativeMode::Cross),
            "emulate" => Ok(NonNativeMode::Emulate),
            _ => Err(ParseSettingError {
                kind: "non-native mode",
                value: s.to_string(),
                expected: "cross, emulate".to_string(),
            }),
        }
    }
}

/// Coarse class of a target, one per command policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformClass {
    NativeLinux,
    ForeignLinux(LinuxArch),
    Windows,
    MacOs(MacArch),
}

/// Non-native Linux architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinuxArch {
    Aarch64,
    Armv7l,
    Ppc64le,
    Riscv64,
    S390x,
}

impl LinuxArch {
    /// qemu user-mode binary able to run this architecture.
    pub const fn qemu(&self) -> &'static str {
        match self {
            LinuxArch::Aarch64 => "qemu-aarch64",
            LinuxArch::Armv7l => "qemu-arm",
            LinuxArch::Ppc64le => "qemu-ppc64le",
            LinuxArch::Riscv64 => "qemu-riscv64",
            LinuxArch::S390x => "qemu-s390x",
        }
    }

    /// Sysroot holding the architecture's dynamic loader and libc.
    pub const fn sysroot(&self) -> &'static str {
        match self {
            LinuxArch::Aarch64 => "/usr/aarch64-linux-gnu",
            LinuxArch::Armv7l => "/usr/arm-linux-gnueabihf",
            LinuxArch::Ppc64le => "/usr/powerpc64le-linux-gnu",
            LinuxArch::Riscv64 => "/usr/riscv64-linux-gnu",
            LinuxArch::S390x => "/usr/s390x-linux-gnu",
        }
    }

    /// Wheel tag an interpreter reports when it runs under emulation.
    ///
    /// armv7 interpreters report the kernel machine name, `armv7l`, rather
    /// than the triple's `armv7`.
    pub const fn emulated_wheel_tag(&self) -> &'static str {
        match self {
            LinuxArch::Aarch64 => "linux_aarch64",
            LinuxArch::Armv7l => "linux_armv7l",
            LinuxArch::Ppc64le => "linux_ppc64le",
            LinuxArch::Riscv64 => "linux_riscv64",
            LinuxArch::S390x => "linux_s390x",
        }
    }
}

/// macOS architectures supported through osxcross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacArch {
    X86_64,
    Arm64,
}

impl MacArch {
    /// osxcross tool prefix, e.g. `x86_64-apple-darwin20.2`.
    pub const fn tool_prefix(&self) -> &'static str {
        match self {
            MacArch::X86_64 => "x86_64-apple-darwin20.2",
            MacArch::Arm64 => "arm64-apple-darwin20.2",
        }
    }

    /// osxcross clang driver.
    pub const fn clang(&self) -> &'static str {
        match self {
            MacArch::X86_64 => "o64-clang",
            MacArch::Arm64 => "oa64-clang",
        }
    }

    /// Value for clang's `--target`.
    pub const fn clang_target(&self) -> &'static str {
        match self {
            MacArch::X86_64 => "x86_64-apple-darwin",
            MacArch::Arm64 => "arm64-apple-darwin",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            MacArch::X86_64 => "x86_64",
            MacArch::Arm64 => "arm64",
        }
    }
}
