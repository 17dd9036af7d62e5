use std::fmt;
use once_cell::sync::OnceCell;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}


fn built_time() -> &'static str {
    static INSTANCE: OnceCell<String> = OnceCell::new();
    INSTANCE.get_or_init(|| {
        built::util::strptime(built_info::BUILT_TIME_UTC)
            .with_timezone(&built::chrono::offset::Local)
            .to_string()
    })
    .as_str()
}


const LOGO_STR: &str = r"
+--------------------------------------------------+
|                                                  |
|    __  __ _____  _______  _    ____  _____       |
|   |  \/  |_ _\ \/ /_   _|/ \  |  _ \| ____|      |
|   | |\/| || | \  /  | | / _ \ | |_) |  _|        |
|   | |  | || | /  \  | |/ ___ \|  __/| |___       |
|   |_|  |_|___/_/\_\ |_/_/   \_\_|   |_____|      |
|                                                  |
|        featurization of MD trajectories          |
+--------------------------------------------------+";

const TRAJECTORY_FORMATS: &[&str] = &["pdb", "gro", "xyz", "xtc"];
const FEATURIZERS: &[&str] = &["dihedral", "atom-pairs", "superpose", "drid", "contact"];


/// Build information shown by `--help` and `--version`. The alternate form (`{:#}`) adds the
/// details of the toolchain and the supported inputs.
#[derive(Debug, Clone, Copy)]
pub struct Version {
    name:      &'static str,
    version:   &'static str,
    authors:   &'static str,
    built_at:  &'static str,
    git_long:  Option<&'static str>,
    git_short: Option<&'static str>,
    git_dirty: Option<bool>,
    profile:   &'static str,
    rustc:     &'static str,
    target:    &'static str,
}


impl Version {
    pub fn new() -> Self {
        Self {
            name:      built_info::PKG_NAME,
            version:   built_info::PKG_VERSION,
            authors:   built_info::PKG_AUTHORS,
            built_at:  built_time(),
            git_long:  built_info::GIT_COMMIT_HASH,
            git_short: built_info::GIT_COMMIT_HASH_SHORT,
            git_dirty: built_info::GIT_DIRTY,
            profile:   built_info::PROFILE,
            rustc:     built_info::RUSTC_VERSION,
            target:    built_info::TARGET,
        }
    }

    fn git_description(&self) -> String {
        match (self.git_short, self.git_dirty) {
            (Some(hash), Some(true)) => format!("{} (dirty)", hash),
            (Some(hash), _) => hash.to_string(),
            (None, _) => "unknown".to_string(),
        }
    }
}


impl Default for Version {
    fn default() -> Self { Self::new() }
}


impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", LOGO_STR.trim_start_matches('\n'))?;
        writeln!(f)?;
        writeln!(f, "{} v{} ({}), built {}", self.name, self.version, self.git_description(), self.built_at)?;
        writeln!(f, "    {:<14} {}", "authors", self.authors)?;

        if !f.alternate() {
            return Ok(());
        }

        writeln!(f, "    {:<14} {}", "commit", self.git_long.unwrap_or("unknown"))?;
        writeln!(f, "    {:<14} {} / {}", "build", self.profile, self.target)?;
        writeln!(f, "    {:<14} {}", "rustc", self.rustc)?;
        writeln!(f, "    {:<14} {} (optionally gzipped)", "inputs", TRAJECTORY_FORMATS.join(", "))?;
        writeln!(f, "    {:<14} {}", "featurizers", FEATURIZERS.join(", "))?;
        Ok(())
    }
}
