//! Interactive vs plain output detection

use std::io::IsTerminal;

/// Environment variables that mark a non-interactive run
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "KIOSK_CACHE_PLAIN",
];

#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    /// `--yes`: approve prompts without asking
    auto_yes: bool,
}

impl UiContext {
    /// Interactive only with a TTY on both stdin and stdout and no CI marker
    pub fn detect() -> Self {
        let tty = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();
        let ci = CI_VARS.iter().any(|var| std::env::var_os(var).is_some());
        Self {
            interactive: tty && !ci,
            auto_yes: false,
        }
    }

    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Spinners, frames and colors
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}
