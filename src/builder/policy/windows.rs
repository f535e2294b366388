//! Windows (mingw-w64) policy.
//!
//! The cross interpreter cannot tell it is building for Windows, so a
//! `sitecustomize.py` forces the platform, extension suffix and SOABI. The
//! mingw linker resolves libraries left to right, so a wrapper moves the
//! Python import library and `--enable-auto-import` to the very end of the
//! link line.

use crate::builder::plan::{Step, WRAPPER_DIR};
use crate::builder::policy::{redirect_interpreter, TargetPolicy, CROSS_PYTHON, HOST_PYTHON};
use crate::core::MinorVersion;

const MINGW_PREFIX: &str = "x86_64-w64-mingw32";

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPolicy;

impl WindowsPolicy {
    fn compiler_wrapper(&self, name: &str, driver: &str, minor: MinorVersion) -> Step {
        let lib = format!("-lpython{}", minor.nodot());
        Step::Shim {
            name: name.to_string(),
            lines: vec![
                "args=()".to_string(),
                "for a in \"$@\"; do".to_string(),
                "  case \"$a\" in".to_string(),
                "    -lpython3*|-Wl,--enable-auto-import) ;;".to_string(),
                "    *) args+=(\"$a\") ;;".to_string(),
                "  esac".to_string(),
                "done".to_string(),
                format!(
                    "exec {}-{} \"${{args[@]}}\" -L{}/libs {} -Wl,--enable-auto-import",
                    MINGW_PREFIX, driver, HOST_PYTHON, lib
                ),
            ],
        }
    }

    fn sitecustomize(&self, minor: MinorVersion) -> Step {
        let abi = minor.nodot();
        Step::WriteFile {
            path: format!(
                "{}/lib/python{}/site-packages/sitecustomize.py",
                CROSS_PYTHON,
                minor.dotted()
            ),
            lines: vec![
                "import sysconfig".to_string(),
                "_overrides = {".to_string(),
                format!("    \"EXT_SUFFIX\": \".cp{}-win_amd64.pyd\",", abi),
                format!("    \"SOABI\": \"cp{}-win_amd64\",", abi),
                "}".to_string(),
                "_get_config_var = sysconfig.get_config_var".to_string(),
                "_get_config_vars = sysconfig.get_config_vars".to_string(),
                "def get_config_var(name):".to_string(),
                "    return _overrides.get(name, _get_config_var(name))".to_string(),
                "def get_config_vars(*args):".to_string(),
                "    values = _get_config_vars(*args)".to_string(),
                "    if isinstance(values, dict):".to_string(),
                "        values.update(_overrides)".to_string(),
                "    return values".to_string(),
                "sysconfig.get_platform = lambda: \"win-amd64\"".to_string(),
                "sysconfig.get_config_var = get_config_var".to_string(),
                "sysconfig.get_config_vars = get_config_vars".to_string(),
            ],
        }
    }
}

impl TargetPolicy for WindowsPolicy {
    fn build_setup(&self, minor: MinorVersion) -> Vec<Step> {
        vec![
            self.compiler_wrapper("mingw-gcc", "gcc", minor),
            self.compiler_wrapper("mingw-g++", "g++", minor),
            Step::export("CC", format!("{}/mingw-gcc", WRAPPER_DIR)),
            Step::export("CXX", format!("{}/mingw-g++", WRAPPER_DIR)),
            Step::export("LDSHARED", format!("{}/mingw-gcc -shared", WRAPPER_DIR)),
            self.sitecustomize(minor),
        ]
    }

    fn build_redirect(&self, _minor: MinorVersion) -> Vec<Step> {
        redirect_interpreter(
            &format!("{}/bin/python3", CROSS_PYTHON),
            &format!("{}/bin/pip3", CROSS_PYTHON),
        )
    }

    fn post_fixup(&self, _minor: MinorVersion) -> Vec<Step> {
        Vec::new()
    }

    fn test_redirect(&self, _minor: MinorVersion) -> Option<Vec<Step>> {
        None
    }
}
