//! Compiler selection for the native Linux images.
//!
//! The level-2 `gnu-gcc-clang` and `musl-gcc-clang` images ship both
//! compilers; the chosen one is exported as `CC`/`CXX` before the user's
//! build command runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ParseSettingError;

/// Compiler family used for native x86_64 Linux builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinuxCompiler {
    #[default]
    Gcc,
    Clang,
}

impl LinuxCompiler {
    /// The C compiler driver.
    pub const fn cc(&self) -> &'static str {
        match self {
            LinuxCompiler::Gcc => "gcc",
            LinuxCompiler::Clang => "clang",
        }
    }

    /// The C++ compiler driver.
    pub const fn cxx(&self) -> &'static str {
        match self {
            LinuxCompiler::Gcc => "g++",
            LinuxCompiler::Clang => "clang++",
        }
    }
}

impl fmt::Display for LinuxCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cc())
    }
}

impl FromStr for LinuxCompiler {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcc" => Ok(LinuxCompiler::Gcc),
            "clang" => Ok(LinuxCompiler::Clang),
            _ => Err(ParseSettingError {
                kind: "compiler",
                value: s.to_string(),
                expected: "gcc, clang".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drivers() {
        assert_eq!(LinuxCompiler::Gcc.cc(), "gcc");
        assert_eq!(LinuxCompiler::Gcc.cxx(), "g++");
        assert_eq!(LinuxCompiler::Clang.cc(), "clang");
        assert_eq!(LinuxCompiler::Clang.cxx(), "clang++");
    }

    #[test]
    fn test_parse() {
        assert_eq!("gcc".parse::<LinuxCompiler>().unwrap(), LinuxCompiler::Gcc);
        assert_eq!("Clang".parse::<LinuxCompiler>().unwrap(), LinuxCompiler::Clang);

        let err = "icc".parse::<LinuxCompiler>().unwrap_err();
        assert!(err.to_string().contains("icc"));
    }
}
