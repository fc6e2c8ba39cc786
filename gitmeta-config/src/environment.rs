use std::ffi::OsString;
use std::path::PathBuf;

/// A one-time snapshot of the environment variables the config loader consults: `HOME`,
/// `XDG_CONFIG_HOME`, `PROGRAMDATA`, and `PATH`. Captured once by the caller (typically at
/// repository-open time) rather than read ad hoc, so a loader run is reproducible and never
/// observes the environment changing mid-load.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    pub home: Option<PathBuf>,
    pub xdg_config_home: Option<PathBuf>,
    pub programdata: Option<PathBuf>,
    pub path: Option<OsString>,
}

impl Environment {
    /// Read the process environment once. Every field is `None` if its variable is unset or
    /// empty, which downstream code treats the same as "tier not available" rather than as
    /// an error.
    pub fn capture() -> Self {
        Environment {
            home: non_empty_var("HOME").map(PathBuf::from),
            xdg_config_home: non_empty_var("XDG_CONFIG_HOME").map(PathBuf::from),
            programdata: non_empty_var("PROGRAMDATA").map(PathBuf::from),
            path: std::env::var_os("PATH").filter(|v| !v.is_empty()),
        }
    }

    /// The directory `git config`'s XDG tier reads from: `$XDG_CONFIG_HOME/git` if set,
    /// otherwise `$HOME/.config/git`.
    pub fn xdg_config_git_dir(&self) -> Option<PathBuf> {
        if let Some(xdg) = &self.xdg_config_home {
            Some(xdg.join("git"))
        } else {
            self.home.as_ref().map(|home| home.join(".config").join("git"))
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_dir_falls_back_to_home_dot_config() {
        let env = Environment {
            home: Some(PathBuf::from("/home/me")),
            xdg_config_home: None,
            programdata: None,
            path: None,
        };
        assert_eq!(env.xdg_config_git_dir(), Some(PathBuf::from("/home/me/.config/git")));
    }

    #[test]
    fn xdg_config_home_takes_precedence() {
        let env = Environment {
            home: Some(PathBuf::from("/home/me")),
            xdg_config_home: Some(PathBuf::from("/custom/xdg")),
            programdata: None,
            path: None,
        };
        assert_eq!(env.xdg_config_git_dir(), Some(PathBuf::from("/custom/xdg/git")));
    }

    #[test]
    fn missing_home_and_xdg_yields_none() {
        let env = Environment::default();
        assert_eq!(env.xdg_config_git_dir(), None);
    }
}
