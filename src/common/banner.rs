const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

macro_rules! env_or {
    ($key:literal, $default:literal) => {
        option_env!($key).unwrap_or($default)
    };
}

pub struct BannerInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub commit: &'static str,
    pub profile: &'static str,
}

impl Default for BannerInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            branch: env_or!("GIT_BRANCH", "unknown"),
            commit: env_or!("GIT_COMMIT", "unknown"),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }
}

pub fn print_banner(info: &BannerInfo) {
    let commit_short = if info.commit.len() >= 8 {
        &info.commit[..8]
    } else {
        info.commit
    };

    crate::log_println!();
    crate::log_println!("{GREEN}              __                    _           __{RESET}");
    crate::log_println!("{GREEN}   _______  _/ /_  ________ _      __(_)___  ____/ /{RESET}");
    crate::log_println!("{GREEN}  / ___/ / / / __ \\/ ___/ _ \\ | /| / / / __ \\/ __  /{RESET}");
    crate::log_println!("{GREEN} (__  ) /_/ / /_/ / /  /  __/ |/ |/ / / / / / /_/ /{RESET}");
    crate::log_println!("{GREEN}/____/\\__,_/_.___/_/   \\___/|__/|__/_/_/ /_/\\__,_/{RESET}");
    crate::log_println!("{DIM}==================================================={RESET}");
    crate::log_println!(
        " {BOLD}version{RESET} {CYAN}{}{RESET}  {BOLD}commit{RESET} {}@{}  {BOLD}profile{RESET} {}",
        info.version,
        commit_short,
        info.branch,
        info.profile
    );
    crate::log_println!();
}
