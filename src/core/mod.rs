//! Core data structures for pookie.
//!
//! This module contains the foundational types used throughout pookie:
//! - Target platforms and their static properties
//! - Runtime versions and resolved distributions

pub mod runtime;
pub mod target;

pub use runtime::{MinorVersion, ResolvedVersions, RuntimeDescriptor};
pub use target::{
    BuildMode, LinuxArch, MacArch, NonNativeMode, ParseSettingError, PlatformClass, TargetPlatform,
    Tree, HOST_WHEEL_TAG,
};
